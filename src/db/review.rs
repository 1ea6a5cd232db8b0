use crate::models;
use sqlx::PgPool;

/// Stores a review with its answers. Answers get the review's id, product, button and
/// timestamp so they can be aggregated without a join.
#[tracing::instrument(name = "Saving new review into the database", skip(pool, review), fields(product_id = review.product_id))]
pub async fn insert(pool: &PgPool, mut review: models::Review) -> Result<models::Review, String> {
    let mut tx = pool.begin().await.map_err(|err| {
        tracing::error!("Failed to begin transaction: {:?}", err);
        "Could not start transaction".to_string()
    })?;

    let (id, created_at) = sqlx::query_as::<_, (i32, chrono::DateTime<chrono::Utc>)>(
        r#"
        INSERT INTO review (product_id, form_id, button_id, form_config_id, form_config_version, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id, created_at
        "#,
    )
    .bind(review.product_id)
    .bind(review.form_id)
    .bind(review.button_id)
    .bind(review.form_config_id)
    .bind(review.form_config_version)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert review: {:?}", err);
        "Failed to insert".to_string()
    })?;
    review.id = id;
    review.created_at = created_at;

    for answer in review.answers.iter_mut() {
        answer.review_id = review.id;
        answer.product_id = review.product_id;
        answer.button_id = review.button_id;
        answer.created_at = review.created_at;

        answer.id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO answer
                (review_id, block_id, answer_item_id, answer_text, intention, field_code,
                 field_label, product_id, button_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(answer.review_id)
        .bind(answer.block_id)
        .bind(answer.answer_item_id)
        .bind(&answer.answer_text)
        .bind(answer.intention)
        .bind(&answer.field_code)
        .bind(&answer.field_label)
        .bind(answer.product_id)
        .bind(answer.button_id)
        .bind(answer.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert answer for block {}: {:?}", answer.block_id, err);
            "Failed to insert".to_string()
        })?;
    }

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit review: {:?}", err);
        "Failed to insert".to_string()
    })?;

    tracing::info!("Review {} saved with {} answers", review.id, review.answers.len());
    Ok(review)
}

pub async fn fetch(pool: &PgPool, id: i32) -> Result<Option<models::Review>, String> {
    let review = sqlx::query_as::<_, models::Review>(
        r#"
        SELECT id, product_id, form_id, button_id, form_config_id, form_config_version, created_at
        FROM review
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch review: {:?}", err);
        "Could not fetch review".to_string()
    })?;

    let mut review = match review {
        Some(review) => review,
        None => return Ok(None),
    };
    review.answers = sqlx::query_as::<_, models::Answer>(
        r#"
        SELECT id, review_id, block_id, answer_item_id, answer_text, intention, field_code,
               field_label, product_id, button_id, created_at
        FROM answer
        WHERE review_id = $1
        ORDER BY id
        "#,
    )
    .bind(review.id)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch answers: {:?}", err);
        "Could not fetch answers".to_string()
    })?;

    Ok(Some(review))
}
