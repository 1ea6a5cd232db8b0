use crate::models;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::Instrument;

// First key of pg_advisory_xact_lock, the second one is the parent id.
const STEP_BLOCKS_LOCK: i32 = 1;
const BLOCK_OPTIONS_LOCK: i32 = 2;

const TEMPLATE_COLUMNS: &str = "id, slug, title, active, created_at, updated_at";
const BLOCK_COLUMNS: &str = "id, step_id, type_bloc, label, alias, field_code, is_required, \
                             is_main_block, position, content";

#[tracing::instrument(name = "Fetch form template by id.", skip(pool))]
pub async fn fetch(pool: &PgPool, id: i32) -> Result<Option<models::FormTemplate>, String> {
    let sql = format!("SELECT {} FROM form_template WHERE id = $1", TEMPLATE_COLUMNS);
    let template = sqlx::query_as::<_, models::FormTemplate>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch template: {:?}", err);
            "Could not fetch template".to_string()
        })?;

    match template {
        Some(template) => with_steps(pool, template).await.map(Some),
        None => Ok(None),
    }
}

#[tracing::instrument(name = "Fetch form template by slug.", skip(pool))]
pub async fn fetch_by_slug(pool: &PgPool, slug: &str) -> Result<Option<models::FormTemplate>, String> {
    let sql = format!("SELECT {} FROM form_template WHERE slug = $1", TEMPLATE_COLUMNS);
    let template = sqlx::query_as::<_, models::FormTemplate>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch template: {:?}", err);
            "Could not fetch template".to_string()
        })?;

    match template {
        Some(template) => with_steps(pool, template).await.map(Some),
        None => Ok(None),
    }
}

/// Loads steps, blocks and options of `template`, each level in position order.
async fn with_steps(
    pool: &PgPool,
    mut template: models::FormTemplate,
) -> Result<models::FormTemplate, String> {
    let query_span = tracing::info_span!("Load template tree.", template_id = template.id);

    let mut steps = sqlx::query_as::<_, models::FormTemplateStep>(
        r#"
        SELECT id, template_id, title, description, position, is_hideable
        FROM form_template_step
        WHERE template_id = $1
        ORDER BY position
        "#,
    )
    .bind(template.id)
    .fetch_all(pool)
    .instrument(query_span.clone())
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch steps: {:?}", err);
        "Could not fetch template steps".to_string()
    })?;

    let step_ids: Vec<i32> = steps.iter().map(|step| step.id).collect();
    let sql = format!(
        "SELECT {} FROM form_template_block WHERE step_id = ANY($1) ORDER BY step_id, position",
        BLOCK_COLUMNS
    );
    let mut blocks = sqlx::query_as::<_, models::FormTemplateBlock>(&sql)
        .bind(&step_ids)
        .fetch_all(pool)
        .instrument(query_span.clone())
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch blocks: {:?}", err);
            "Could not fetch template blocks".to_string()
        })?;

    let block_ids: Vec<i32> = blocks.iter().map(|block| block.id).collect();
    let options = sqlx::query_as::<_, models::FormTemplateBlockOption>(
        r#"
        SELECT id, block_id, label, value, position, intention
        FROM form_template_block_option
        WHERE block_id = ANY($1)
        ORDER BY block_id, position
        "#,
    )
    .bind(&block_ids)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch options: {:?}", err);
        "Could not fetch block options".to_string()
    })?;

    for option in options {
        if let Some(block) = blocks.iter_mut().find(|block| block.id == option.block_id) {
            block.options.push(option);
        }
    }
    for block in blocks {
        if let Some(step) = steps.iter_mut().find(|step| step.id == block.step_id) {
            step.blocks.push(block);
        }
    }
    template.steps = steps;

    Ok(template)
}

pub async fn fetch_step(pool: &PgPool, id: i32) -> Result<Option<models::FormTemplateStep>, String> {
    let query_span = tracing::info_span!("Fetch template step.");
    sqlx::query_as::<_, models::FormTemplateStep>(
        r#"
        SELECT id, template_id, title, description, position, is_hideable
        FROM form_template_step
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch step: {:?}", err);
        "Could not fetch step".to_string()
    })
}

pub async fn fetch_block(pool: &PgPool, id: i32) -> Result<Option<models::FormTemplateBlock>, String> {
    let query_span = tracing::info_span!("Fetch template block.");
    let sql = format!("SELECT {} FROM form_template_block WHERE id = $1", BLOCK_COLUMNS);
    sqlx::query_as::<_, models::FormTemplateBlock>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch block: {:?}", err);
            "Could not fetch block".to_string()
        })
}

async fn begin(pool: &PgPool) -> Result<Transaction<'static, Postgres>, String> {
    pool.begin().await.map_err(|err| {
        tracing::error!("Failed to begin transaction: {:?}", err);
        "Could not start transaction".to_string()
    })
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), String> {
    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit transaction: {:?}", err);
        "Could not commit transaction".to_string()
    })
}

/// Serializes position changes of one parent until the transaction ends.
async fn lock_parent(tx: &mut Transaction<'_, Postgres>, namespace: i32, parent_id: i32) -> Result<(), String> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(namespace)
        .bind(parent_id)
        .execute(&mut **tx)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!("Failed to take position lock: {:?}", err);
            "Could not lock positions".to_string()
        })
}

/// Adds `delta` to every sibling position at or after `from`.
async fn shift_positions(
    tx: &mut Transaction<'_, Postgres>,
    table: &'static str,
    parent_column: &'static str,
    parent_id: i32,
    from: i32,
    delta: i32,
) -> Result<(), String> {
    let sql = format!(
        "UPDATE {} SET position = position + $3 WHERE {} = $1 AND position >= $2",
        table, parent_column
    );
    sqlx::query(&sql)
        .bind(parent_id)
        .bind(from)
        .bind(delta)
        .execute(&mut **tx)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!("Failed to shift {} positions: {:?}", table, err);
            "Could not shift positions".to_string()
        })
}

async fn sibling_count(
    tx: &mut Transaction<'_, Postgres>,
    table: &'static str,
    parent_column: &'static str,
    parent_id: i32,
) -> Result<i32, String> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, parent_column);
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(parent_id)
        .fetch_one(&mut **tx)
        .await
        .map(|count| count as i32)
        .map_err(|err| {
            tracing::error!("Failed to count {} rows: {:?}", table, err);
            "Could not count siblings".to_string()
        })
}

/// Inserts `block` at its position within the step, pushing later blocks down.
/// A position past the end is appended.
#[tracing::instrument(name = "Insert template block.", skip(pool, block), fields(step_id = block.step_id))]
pub async fn insert_block(
    pool: &PgPool,
    mut block: models::FormTemplateBlock,
) -> Result<models::FormTemplateBlock, String> {
    let mut tx = begin(pool).await?;
    lock_parent(&mut tx, STEP_BLOCKS_LOCK, block.step_id).await?;

    let count = sibling_count(&mut tx, "form_template_block", "step_id", block.step_id).await?;
    block.position = block.position.clamp(0, count);
    shift_positions(&mut tx, "form_template_block", "step_id", block.step_id, block.position, 1).await?;

    block.id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO form_template_block
            (step_id, type_bloc, label, alias, field_code, is_required, is_main_block, position, content)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(block.step_id)
    .bind(block.type_bloc)
    .bind(&block.label)
    .bind(&block.alias)
    .bind(&block.field_code)
    .bind(block.is_required)
    .bind(block.is_main_block)
    .bind(block.position)
    .bind(&block.content)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert block: {:?}", err);
        "Could not insert block".to_string()
    })?;

    for option in block.options.iter_mut() {
        option.block_id = block.id;
        option.id = insert_option_row(&mut tx, option).await?;
    }

    commit(tx).await?;
    tracing::info!("Block {} inserted at position {}", block.id, block.position);
    Ok(block)
}

/// Deletes a block with its options and closes the gap. `Ok(false)` when it does not exist.
#[tracing::instrument(name = "Delete template block.", skip(pool))]
pub async fn delete_block(pool: &PgPool, id: i32) -> Result<bool, String> {
    let step_id = match fetch_block(pool, id).await? {
        Some(block) => block.step_id,
        None => return Ok(false),
    };

    let mut tx = begin(pool).await?;
    lock_parent(&mut tx, STEP_BLOCKS_LOCK, step_id).await?;

    // position is read again under the lock, a concurrent shift may have moved it
    let position = sqlx::query_scalar::<_, i32>(
        "DELETE FROM form_template_block WHERE id = $1 RETURNING position",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to delete block: {:?}", err);
        "Could not delete block".to_string()
    })?;

    let position = match position {
        Some(position) => position,
        None => return Ok(false),
    };
    shift_positions(&mut tx, "form_template_block", "step_id", step_id, position + 1, -1).await?;
    commit(tx).await?;

    Ok(true)
}

async fn insert_option_row(
    tx: &mut Transaction<'_, Postgres>,
    option: &models::FormTemplateBlockOption,
) -> Result<i32, String> {
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO form_template_block_option (block_id, label, value, position, intention)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(option.block_id)
    .bind(&option.label)
    .bind(&option.value)
    .bind(option.position)
    .bind(option.intention)
    .fetch_one(&mut **tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert option: {:?}", err);
        "Could not insert option".to_string()
    })
}

#[tracing::instrument(name = "Insert block option.", skip(pool, option), fields(block_id = option.block_id))]
pub async fn insert_option(
    pool: &PgPool,
    mut option: models::FormTemplateBlockOption,
) -> Result<models::FormTemplateBlockOption, String> {
    let mut tx = begin(pool).await?;
    lock_parent(&mut tx, BLOCK_OPTIONS_LOCK, option.block_id).await?;

    let count = sibling_count(&mut tx, "form_template_block_option", "block_id", option.block_id).await?;
    option.position = option.position.clamp(0, count);
    shift_positions(
        &mut tx,
        "form_template_block_option",
        "block_id",
        option.block_id,
        option.position,
        1,
    )
    .await?;
    option.id = insert_option_row(&mut tx, &option).await?;

    commit(tx).await?;
    Ok(option)
}

#[tracing::instrument(name = "Delete block option.", skip(pool))]
pub async fn delete_option(pool: &PgPool, id: i32) -> Result<bool, String> {
    let query_span = tracing::info_span!("Find option parent.");
    let block_id = sqlx::query_scalar::<_, i32>(
        "SELECT block_id FROM form_template_block_option WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch option: {:?}", err);
        "Could not fetch option".to_string()
    })?;
    let block_id = match block_id {
        Some(block_id) => block_id,
        None => return Ok(false),
    };

    let mut tx = begin(pool).await?;
    lock_parent(&mut tx, BLOCK_OPTIONS_LOCK, block_id).await?;

    let position = sqlx::query_scalar::<_, i32>(
        "DELETE FROM form_template_block_option WHERE id = $1 RETURNING position",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to delete option: {:?}", err);
        "Could not delete option".to_string()
    })?;

    let position = match position {
        Some(position) => position,
        None => return Ok(false),
    };
    shift_positions(&mut tx, "form_template_block_option", "block_id", block_id, position + 1, -1).await?;
    commit(tx).await?;

    Ok(true)
}

/// Writes a whole template tree in one transaction. Positions are taken as given.
#[tracing::instrument(name = "Import form template.", skip(pool, template), fields(slug = %template.slug))]
pub async fn insert_template(
    pool: &PgPool,
    mut template: models::FormTemplate,
) -> Result<models::FormTemplate, String> {
    let mut tx = begin(pool).await?;

    template.id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO form_template (slug, title, active, created_at, updated_at)
        VALUES ($1, $2, $3, NOW() at time zone 'utc', NOW() at time zone 'utc')
        RETURNING id
        "#,
    )
    .bind(&template.slug)
    .bind(&template.title)
    .bind(template.active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert template: {:?}", err);
        "Could not insert template".to_string()
    })?;

    for step in template.steps.iter_mut() {
        step.template_id = template.id;
        step.id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO form_template_step (template_id, title, description, position, is_hideable)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(step.template_id)
        .bind(&step.title)
        .bind(&step.description)
        .bind(step.position)
        .bind(step.is_hideable)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert step: {:?}", err);
            "Could not insert step".to_string()
        })?;

        for block in step.blocks.iter_mut() {
            block.step_id = step.id;
            block.id = sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO form_template_block
                    (step_id, type_bloc, label, alias, field_code, is_required, is_main_block, position, content)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                "#,
            )
            .bind(block.step_id)
            .bind(block.type_bloc)
            .bind(&block.label)
            .bind(&block.alias)
            .bind(&block.field_code)
            .bind(block.is_required)
            .bind(block.is_main_block)
            .bind(block.position)
            .bind(&block.content)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| {
                tracing::error!("Failed to insert block: {:?}", err);
                "Could not insert block".to_string()
            })?;

            for option in block.options.iter_mut() {
                option.block_id = block.id;
                option.id = insert_option_row(&mut tx, option).await?;
            }
        }
    }

    commit(tx).await?;
    tracing::info!("Template {} imported with id {}", template.slug, template.id);
    Ok(template)
}
