//! Answer index connector
//!
//! Aggregations read answers through the `AnswerIndex` trait: one document per answer,
//! keyed by field code, product/button, answer text, intention and creation date.
//! `PgAnswerIndex` serves it straight from the `answer` table written by the review path.

use crate::connectors::ConnectorError;
use crate::models::AnswerIntention;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[cfg(test)]
pub mod mock;
pub mod postgres;

#[cfg(test)]
pub use mock::InMemoryAnswerIndex;
pub use postgres::PgAnswerIndex;

/// Filter shared by every aggregation. `start` is inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerQuery {
    pub field_code: String,
    pub product_id: i32,
    pub button_id: Option<i32>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Count of answers sharing the same text and intention.
#[derive(Debug, Clone, PartialEq)]
pub struct TermBucket {
    pub answer_text: String,
    pub intention: AnswerIntention,
    /// Label of the bucket's most recent answer
    pub field_label: String,
    pub latest_at: DateTime<Utc>,
    pub doc_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    /// First day of the month
    pub month: NaiveDate,
    pub terms: Vec<TermBucket>,
}

#[async_trait]
pub trait AnswerIndex: Send + Sync {
    /// Number of answers matching the query
    async fn count(&self, query: &AnswerQuery) -> Result<i64, ConnectorError>;

    /// Buckets by (answer_text, intention), most frequent first
    async fn term_buckets(&self, query: &AnswerQuery) -> Result<Vec<TermBucket>, ConnectorError>;

    /// Term buckets per calendar month, oldest month first. Months without answers are omitted.
    async fn monthly_term_buckets(
        &self,
        query: &AnswerQuery,
    ) -> Result<Vec<MonthBucket>, ConnectorError>;
}
