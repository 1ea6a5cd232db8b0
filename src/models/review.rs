use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment attached to an answer. Drives dashboard colouring and the score average.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnswerIntention {
    Good,
    Medium,
    Bad,
    #[default]
    Neutral,
}

impl AnswerIntention {
    pub fn score(&self) -> i64 {
        match self {
            AnswerIntention::Good => 10,
            AnswerIntention::Medium => 5,
            AnswerIntention::Bad | AnswerIntention::Neutral => 0,
        }
    }

    /// Display order on dashboards: good first, neutral last.
    pub fn rank(&self) -> u8 {
        match self {
            AnswerIntention::Good => 0,
            AnswerIntention::Medium => 1,
            AnswerIntention::Bad => 2,
            AnswerIntention::Neutral => 3,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i32,
    pub product_id: i32,
    pub form_id: Option<i32>,
    pub button_id: Option<i32>,
    pub form_config_id: Option<i32>, // config the respondent saw, none for the raw template
    pub form_config_version: i32,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub answers: Vec<Answer>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Answer {
    pub id: i32,
    pub review_id: i32,
    pub block_id: i32,
    pub answer_item_id: Option<i32>,
    pub answer_text: Option<String>,
    pub intention: AnswerIntention,
    pub field_code: Option<String>,
    pub field_label: String,
    // copied from the review so one row is one searchable document
    pub product_id: i32,
    pub button_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}
