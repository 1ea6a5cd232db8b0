use crate::models;
use sqlx::PgPool;
use tracing::Instrument;

const CONFIG_COLUMNS: &str = "id, product_id, form_id, version, status, created_at";

/// Version in force now: latest `created_at` not in the future, highest version on ties.
#[tracing::instrument(name = "Fetch current form config.", skip(pool))]
pub async fn fetch_current(
    pool: &PgPool,
    product_id: i32,
    form_id: Option<i32>,
) -> Result<Option<models::FormConfig>, String> {
    let sql = format!(
        r#"
        SELECT {}
        FROM form_config
        WHERE product_id = $1
        AND form_id IS NOT DISTINCT FROM $2
        AND created_at <= NOW()
        ORDER BY created_at DESC, version DESC
        LIMIT 1
        "#,
        CONFIG_COLUMNS
    );
    let config = sqlx::query_as::<_, models::FormConfig>(&sql)
        .bind(product_id)
        .bind(form_id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch current config: {:?}", err);
            "Could not fetch form config".to_string()
        })?;

    match config {
        Some(config) => with_overrides(pool, vec![config]).await.map(|mut c| c.pop()),
        None => Ok(None),
    }
}

#[tracing::instrument(name = "Fetch form config by version.", skip(pool))]
pub async fn fetch_by_version(
    pool: &PgPool,
    product_id: i32,
    form_id: Option<i32>,
    version: i32,
) -> Result<Option<models::FormConfig>, String> {
    let sql = format!(
        r#"
        SELECT {}
        FROM form_config
        WHERE product_id = $1
        AND form_id IS NOT DISTINCT FROM $2
        AND version = $3
        "#,
        CONFIG_COLUMNS
    );
    let config = sqlx::query_as::<_, models::FormConfig>(&sql)
        .bind(product_id)
        .bind(form_id)
        .bind(version)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch config version: {:?}", err);
            "Could not fetch form config".to_string()
        })?;

    match config {
        Some(config) => with_overrides(pool, vec![config]).await.map(|mut c| c.pop()),
        None => Ok(None),
    }
}

/// Every published version, oldest first, without overrides.
pub async fn fetch_all(
    pool: &PgPool,
    product_id: i32,
    form_id: Option<i32>,
) -> Result<Vec<models::FormConfig>, String> {
    let query_span = tracing::info_span!("Fetch form config history.");
    let sql = format!(
        r#"
        SELECT {}
        FROM form_config
        WHERE product_id = $1
        AND form_id IS NOT DISTINCT FROM $2
        ORDER BY version
        "#,
        CONFIG_COLUMNS
    );
    sqlx::query_as::<_, models::FormConfig>(&sql)
        .bind(product_id)
        .bind(form_id)
        .fetch_all(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch config history: {:?}", err);
            "Could not fetch form configs".to_string()
        })
}

async fn with_overrides(
    pool: &PgPool,
    mut configs: Vec<models::FormConfig>,
) -> Result<Vec<models::FormConfig>, String> {
    let query_span = tracing::info_span!("Load config overrides.");
    let ids: Vec<i32> = configs.iter().map(|config| config.id).collect();

    let displays = sqlx::query_as::<_, models::FormConfigDisplay>(
        r#"
        SELECT id, form_config_id, kind, parent_id, hidden
        FROM form_config_display
        WHERE form_config_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .instrument(query_span.clone())
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch config displays: {:?}", err);
        "Could not fetch config displays".to_string()
    })?;

    let labels = sqlx::query_as::<_, models::FormConfigLabel>(
        r#"
        SELECT id, form_config_id, kind, parent_id, label
        FROM form_config_label
        WHERE form_config_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch config labels: {:?}", err);
        "Could not fetch config labels".to_string()
    })?;

    for config in configs.iter_mut() {
        config.displays = displays
            .iter()
            .filter(|display| display.form_config_id == config.id)
            .cloned()
            .collect();
        config.labels = labels
            .iter()
            .filter(|label| label.form_config_id == config.id)
            .cloned()
            .collect();
    }

    Ok(configs)
}

/// Appends the next version for (product, form) with the given overlay.
///
/// `Ok(None)` when another writer took the same version number first. `created_at` never
/// goes below the previous version's, so "current" follows version order.
#[tracing::instrument(name = "Insert form config version.", skip(pool, overlay))]
pub async fn insert(
    pool: &PgPool,
    product_id: i32,
    form_id: Option<i32>,
    overlay: &models::ConfigOverlay,
) -> Result<Option<models::FormConfig>, String> {
    let mut tx = pool.begin().await.map_err(|err| {
        tracing::error!("Failed to begin transaction: {:?}", err);
        "Could not start transaction".to_string()
    })?;

    let sql = format!(
        r#"
        INSERT INTO form_config (product_id, form_id, version, status, created_at)
        SELECT $1, $2, COALESCE(MAX(version), 0) + 1, $3, GREATEST(NOW(), MAX(created_at))
        FROM form_config
        WHERE product_id = $1 AND form_id IS NOT DISTINCT FROM $2
        RETURNING {}
        "#,
        CONFIG_COLUMNS
    );
    let inserted = sqlx::query_as::<_, models::FormConfig>(&sql)
        .bind(product_id)
        .bind(form_id)
        .bind(models::ConfigStatus::Published)
        .fetch_one(&mut *tx)
        .await;

    let mut config = match inserted {
        Ok(config) => config,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            tracing::warn!("Config version already taken for product {}", product_id);
            return Ok(None);
        }
        Err(err) => {
            tracing::error!("Failed to insert form config: {:?}", err);
            return Err("Could not insert form config".to_string());
        }
    };

    for display in overlay.displays.iter() {
        let row = sqlx::query_as::<_, models::FormConfigDisplay>(
            r#"
            INSERT INTO form_config_display (form_config_id, kind, parent_id, hidden)
            VALUES ($1, $2, $3, $4)
            RETURNING id, form_config_id, kind, parent_id, hidden
            "#,
        )
        .bind(config.id)
        .bind(display.kind)
        .bind(display.parent_id)
        .bind(display.hidden)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert config display: {:?}", err);
            "Could not insert config display".to_string()
        })?;
        config.displays.push(row);
    }

    for label in overlay.labels.iter() {
        let row = sqlx::query_as::<_, models::FormConfigLabel>(
            r#"
            INSERT INTO form_config_label (form_config_id, kind, parent_id, label)
            VALUES ($1, $2, $3, $4)
            RETURNING id, form_config_id, kind, parent_id, label
            "#,
        )
        .bind(config.id)
        .bind(label.kind)
        .bind(label.parent_id)
        .bind(&label.label)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert config label: {:?}", err);
            "Could not insert config label".to_string()
        })?;
        config.labels.push(row);
    }

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit form config: {:?}", err);
        "Could not commit form config".to_string()
    })?;

    tracing::info!(
        "Form config version {} published for product {}",
        config.version,
        product_id
    );
    Ok(Some(config))
}
