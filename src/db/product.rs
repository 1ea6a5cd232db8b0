use crate::models;
use sqlx::PgPool;
use tracing::Instrument;

pub async fn fetch(pool: &PgPool, id: i32) -> Result<Option<models::Product>, String> {
    let query_span = tracing::info_span!("Fetch product by id.");
    sqlx::query_as::<_, models::Product>(
        r#"SELECT id, title, created_at FROM product WHERE id = $1 LIMIT 1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch product: {:?}", err);
        "Could not fetch product".to_string()
    })
}

/// Form row, only when it belongs to `product_id`.
pub async fn fetch_form(
    pool: &PgPool,
    product_id: i32,
    form_id: i32,
) -> Result<Option<models::Form>, String> {
    let query_span = tracing::info_span!("Fetch product form.");
    sqlx::query_as::<_, models::Form>(
        r#"
        SELECT id, product_id, form_template_id, title
        FROM form
        WHERE id = $1 AND product_id = $2
        LIMIT 1
        "#,
    )
    .bind(form_id)
    .bind(product_id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch form: {:?}", err);
        "Could not fetch form".to_string()
    })
}

/// Button row, only when it belongs to `product_id`.
pub async fn fetch_button(
    pool: &PgPool,
    product_id: i32,
    button_id: i32,
) -> Result<Option<models::Button>, String> {
    let query_span = tracing::info_span!("Fetch product button.");
    sqlx::query_as::<_, models::Button>(
        r#"SELECT id, product_id, title FROM button WHERE id = $1 AND product_id = $2 LIMIT 1"#,
    )
    .bind(button_id)
    .bind(product_id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch button: {:?}", err);
        "Could not fetch button".to_string()
    })
}
