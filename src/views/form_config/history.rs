use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry of a product's config history. Version 0 is the raw template, valid from the
/// product's creation until the first published version.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConfigVersion {
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>, // none for the version still in force
}
