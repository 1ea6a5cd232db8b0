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

#[tracing::instrument(name = "Add block option.", skip(pg_pool, settings))]
#[post("/block/{block_id}/option")]
pub async fn add_option_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    form: web::Json<forms::AddOption>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::FormTemplateBlockOption>::build()
            .form_error(errors.to_string()));
    }
    let (block_id,) = path.into_inner();

    let block = db::form_template::fetch_block(pg_pool.get_ref(), block_id)
        .await
        .map_err(|err| JsonResponse::<()>::build().internal_server_error(err))?
        .ok_or_else(|| JsonResponse::<()>::build().not_found("block not found"))?;
    if !block.type_bloc.is_choice() {
        return Err(JsonResponse::<()>::build()
            .form_error(format!("{} blocks have no options", block.type_bloc)));
    }

    db::form_template::insert_option(pg_pool.get_ref(), form.into_inner().into_option(block_id))
        .await
        .map(|option| JsonResponse::build().set_id(option.id).set_item(option).ok("Saved"))
        .map_err(|err| JsonResponse::<()>::build().internal_server_error(err))
}

#[tracing::instrument(name = "Delete block option.", skip(pg_pool, settings))]
#[delete("/option/{id}")]
pub async fn delete_option_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(i32,)>,
    pg_pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    let (id,) = path.into_inner();

    match db::form_template::delete_option(pg_pool.get_ref(), id).await {
        Ok(true) => Ok(JsonResponse::<()>::build().set_id(id).ok("Deleted")),
        Ok(false) => Err(JsonResponse::<()>::build().not_found("option not found")),
        Err(err) => Err(JsonResponse::<()>::build().internal_server_error(err)),
    }
}
