use crate::connectors::AnswerQuery;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Dashboard filter. Both dates are inclusive calendar days (UTC).
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct AggregateQuery {
    pub product_id: i32,
    pub button_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AggregateQuery {
    pub fn to_answer_query(&self, field_code: &str) -> Result<AnswerQuery, String> {
        if self.end_date < self.start_date {
            return Err("end_date is before start_date".to_string());
        }
        let end = self
            .end_date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| "end_date is out of range".to_string())?;

        Ok(AnswerQuery {
            field_code: field_code.to_string(),
            product_id: self.product_id,
            button_id: self.button_id,
            start: self.start_date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
            end: end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        })
    }
}
