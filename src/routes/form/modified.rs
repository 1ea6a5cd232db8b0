use crate::configuration::Settings;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::middleware::authentication::admin_user;
use crate::models;
use crate::services::{form_config, modification};
use actix_web::{get, post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;

/// `{step_id: modified}` for the config currently in force.
#[tracing::instrument(name = "Get modified steps.", skip(pg_pool, settings))]
#[get("/{template_id}/modified-steps")]
pub async fn modified_steps_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    query: web::Query<forms::ProductScope>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    let (template_id,) = path.into_inner();

    let template = form_config::load_template(pg_pool.get_ref(), template_id).await?;
    let scope =
        form_config::load_scope(pg_pool.get_ref(), &template, query.product_id, query.form_id)
            .await?;
    let overlay = form_config::select_config(pg_pool.get_ref(), &scope, query.version)
        .await?
        .map(|config| config.overlay())
        .unwrap_or_default();

    let flags =
        modification::step_modification_flags(&template.steps, &overlay, &scope.product.title);
    Ok(JsonResponse::build().set_item(flags).ok("OK"))
}

/// Same flags for an overlay the builder has not saved yet.
#[tracing::instrument(name = "Preview modified steps.", skip(pg_pool, settings))]
#[post("/{template_id}/modified-steps")]
pub async fn preview_modified_steps_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    query: web::Query<forms::ProductScope>,
    form: web::Json<forms::Overlay>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<()>::build().form_error(errors.to_string()));
    }
    let (template_id,) = path.into_inner();

    let template = form_config::load_template(pg_pool.get_ref(), template_id).await?;
    let product = form_config::load_scope(pg_pool.get_ref(), &template, query.product_id, query.form_id)
        .await?
        .product;
    let overlay: models::ConfigOverlay = form.into_inner().into();

    let flags = modification::step_modification_flags(&template.steps, &overlay, &product.title);
    Ok(JsonResponse::build().set_item(flags).ok("OK"))
}
