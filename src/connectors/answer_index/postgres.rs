use super::{AnswerIndex, AnswerQuery, MonthBucket, TermBucket};
use crate::connectors::ConnectorError;
use crate::models::AnswerIntention;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::Instrument;

pub struct PgAnswerIndex {
    pool: PgPool,
}

impl PgAnswerIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TermRow {
    answer_text: String,
    intention: AnswerIntention,
    field_label: String,
    latest_at: DateTime<Utc>,
    doc_count: i64,
}

#[derive(sqlx::FromRow)]
struct MonthTermRow {
    month: DateTime<Utc>,
    answer_text: String,
    intention: AnswerIntention,
    field_label: String,
    latest_at: DateTime<Utc>,
    doc_count: i64,
}

impl From<TermRow> for TermBucket {
    fn from(row: TermRow) -> Self {
        TermBucket {
            answer_text: row.answer_text,
            intention: row.intention,
            field_label: row.field_label,
            latest_at: row.latest_at,
            doc_count: row.doc_count,
        }
    }
}

// The most recent label wins when a block was relabelled inside the range.
const MATCH_ANSWERS: &str = r#"
    FROM answer
    WHERE field_code = $1
    AND product_id = $2
    AND ($3::INTEGER IS NULL OR button_id = $3)
    AND created_at >= $4
    AND created_at < $5
"#;

#[async_trait]
impl AnswerIndex for PgAnswerIndex {
    #[tracing::instrument(name = "Count answers by field code", skip(self))]
    async fn count(&self, query: &AnswerQuery) -> Result<i64, ConnectorError> {
        let query_span = tracing::info_span!("Counting answers");
        let sql = format!("SELECT COUNT(*) {}", MATCH_ANSWERS);
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(&query.field_code)
            .bind(query.product_id)
            .bind(query.button_id)
            .bind(query.start)
            .bind(query.end)
            .fetch_one(&self.pool)
            .instrument(query_span)
            .await
            .map_err(|err| {
                tracing::error!("Failed to count answers: {:?}", err);
                ConnectorError::from(err)
            })
    }

    #[tracing::instrument(name = "Answer buckets by field code", skip(self))]
    async fn term_buckets(&self, query: &AnswerQuery) -> Result<Vec<TermBucket>, ConnectorError> {
        let query_span = tracing::info_span!("Grouping answers by text and intention");
        let sql = format!(
            r#"
            SELECT
                COALESCE(answer_text, '') AS answer_text,
                intention,
                (ARRAY_AGG(field_label ORDER BY created_at DESC))[1] AS field_label,
                MAX(created_at) AS latest_at,
                COUNT(*) AS doc_count
            {}
            GROUP BY COALESCE(answer_text, ''), intention
            ORDER BY doc_count DESC, answer_text ASC
            "#,
            MATCH_ANSWERS
        );
        sqlx::query_as::<_, TermRow>(&sql)
            .bind(&query.field_code)
            .bind(query.product_id)
            .bind(query.button_id)
            .bind(query.start)
            .bind(query.end)
            .fetch_all(&self.pool)
            .instrument(query_span)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(|err| {
                tracing::error!("Failed to aggregate answers: {:?}", err);
                ConnectorError::from(err)
            })
    }

    #[tracing::instrument(name = "Monthly answer buckets by field code", skip(self))]
    async fn monthly_term_buckets(
        &self,
        query: &AnswerQuery,
    ) -> Result<Vec<MonthBucket>, ConnectorError> {
        let query_span = tracing::info_span!("Grouping answers by month, text and intention");
        let sql = format!(
            r#"
            SELECT
                DATE_TRUNC('month', created_at, 'UTC') AS month,
                COALESCE(answer_text, '') AS answer_text,
                intention,
                (ARRAY_AGG(field_label ORDER BY created_at DESC))[1] AS field_label,
                MAX(created_at) AS latest_at,
                COUNT(*) AS doc_count
            {}
            GROUP BY DATE_TRUNC('month', created_at, 'UTC'), COALESCE(answer_text, ''), intention
            ORDER BY month ASC, doc_count DESC, answer_text ASC
            "#,
            MATCH_ANSWERS
        );
        let rows = sqlx::query_as::<_, MonthTermRow>(&sql)
            .bind(&query.field_code)
            .bind(query.product_id)
            .bind(query.button_id)
            .bind(query.start)
            .bind(query.end)
            .fetch_all(&self.pool)
            .instrument(query_span)
            .await
            .map_err(|err| {
                tracing::error!("Failed to aggregate answers per month: {:?}", err);
                ConnectorError::from(err)
            })?;

        let mut months: Vec<MonthBucket> = vec![];
        for row in rows {
            let month: NaiveDate = row.month.date_naive();
            let bucket = TermBucket {
                answer_text: row.answer_text,
                intention: row.intention,
                field_label: row.field_label,
                latest_at: row.latest_at,
                doc_count: row.doc_count,
            };
            match months.last_mut() {
                Some(last) if last.month == month => last.terms.push(bucket),
                _ => months.push(MonthBucket {
                    month,
                    terms: vec![bucket],
                }),
            }
        }

        Ok(months)
    }
}
