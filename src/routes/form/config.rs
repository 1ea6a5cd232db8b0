use crate::configuration::Settings;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::middleware::authentication::admin_user;
use crate::models;
use crate::services::form_config;
use crate::views;
use actix_web::{get, post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;

#[tracing::instrument(name = "Publish form config.", skip(pg_pool, settings))]
#[post("/{template_id}/config")]
pub async fn publish_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    form: web::Json<forms::PublishConfig>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    let user = admin_user(user, settings.get_ref())?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<views::form_config::Published>::build()
            .form_error(errors.to_string()));
    }
    let (template_id,) = path.into_inner();
    let form = form.into_inner();

    let template = form_config::load_template(pg_pool.get_ref(), template_id).await?;
    let scope =
        form_config::load_scope(pg_pool.get_ref(), &template, form.product_id, form.form_id)
            .await?;

    let config =
        form_config::publish(pg_pool.get_ref(), &template, &scope, form.overlay.into()).await?;
    tracing::info!(
        "User {} published version {} for product {}",
        user.id,
        config.version,
        config.product_id
    );

    Ok(JsonResponse::build()
        .set_id(config.id)
        .set_item(views::form_config::Published::from(config))
        .ok("Published"))
}

/// Version history with validity windows, version 0 first.
#[tracing::instrument(name = "List form config versions.", skip(pg_pool, settings))]
#[get("/{template_id}/config")]
pub async fn list_handler(
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
    let versions = form_config::list_versions(pg_pool.get_ref(), &scope).await?;

    Ok(JsonResponse::build().set_list(versions).ok("OK"))
}
