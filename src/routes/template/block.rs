use crate::configuration::Settings;
use crate::db;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::middleware::authentication::admin_user;
use crate::models;
use actix_web::{delete, post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;

#[tracing::instrument(name = "Add template block.", skip(pg_pool, settings))]
#[post("/step/{step_id}/block")]
pub async fn add_block_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    form: web::Json<forms::AddBlock>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::FormTemplateBlock>::build().form_error(errors.to_string()));
    }
    let (step_id,) = path.into_inner();

    db::form_template::fetch_step(pg_pool.get_ref(), step_id)
        .await
        .map_err(|err| JsonResponse::<models::FormTemplateBlock>::build().internal_server_error(err))?
        .ok_or_else(|| JsonResponse::<models::FormTemplateBlock>::build().not_found("step not found"))?;

    db::form_template::insert_block(pg_pool.get_ref(), form.into_inner().into_block(step_id))
        .await
        .map(|block| JsonResponse::build().set_id(block.id).set_item(block).ok("Saved"))
        .map_err(|err| JsonResponse::<models::FormTemplateBlock>::build().internal_server_error(err))
}

#[tracing::instrument(name = "Delete template block.", skip(pg_pool, settings))]
#[delete("/block/{id}")]
pub async fn delete_block_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    let (id,) = path.into_inner();

    match db::form_template::delete_block(pg_pool.get_ref(), id).await {
        Ok(true) => Ok(JsonResponse::<()>::build().set_id(id).ok("Deleted")),
        Ok(false) => Err(JsonResponse::<()>::build().not_found("block not found")),
        Err(err) => Err(JsonResponse::<()>::build().internal_server_error(err)),
    }
}
