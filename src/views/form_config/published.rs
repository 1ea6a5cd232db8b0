use crate::models;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::From;

#[derive(Debug, Serialize, Default)]
pub struct Published {
    pub id: i32,
    pub product_id: i32,
    pub form_id: Option<i32>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub displays: Vec<models::DisplayOverride>,
    pub labels: Vec<models::LabelOverride>,
}

impl From<models::FormConfig> for Published {
    fn from(config: models::FormConfig) -> Self {
        let overlay = config.overlay();
        Self {
            id: config.id,
            product_id: config.product_id,
            form_id: config.form_id,
            version: config.version,
            created_at: config.created_at,
            displays: overlay.displays,
            labels: overlay.labels,
        }
    }
}
