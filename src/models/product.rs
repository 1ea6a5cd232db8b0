use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Product, button and form rows are owned by the back-office. This service only reads them
// to scope configs and reviews and to substitute the product title.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Button {
    pub id: i32,
    pub product_id: i32,
    pub title: String,
}

/// Ties a product to a non-root template.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Form {
    pub id: i32,
    pub product_id: i32,
    pub form_template_id: i32,
    pub title: Option<String>,
}
