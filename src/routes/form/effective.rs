use crate::forms;
use crate::helpers::JsonResponse;
use crate::services::{self, form_config};
use actix_web::{get, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;

/// The form a respondent sees for a product: current config unless `version` pins one.
#[tracing::instrument(name = "Get effective form.", skip(pg_pool))]
#[get("/{template_id}/effective")]
pub async fn effective_handler(
    path: web::Path<(i32,)>,
    query: web::Query<forms::ProductScope>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    if let Err(errors) = query.validate() {
        return Err(JsonResponse::<()>::build().form_error(errors.to_string()));
    }
    let (template_id,) = path.into_inner();

    let template = form_config::load_template(pg_pool.get_ref(), template_id).await?;
    let scope =
        form_config::load_scope(pg_pool.get_ref(), &template, query.product_id, query.form_id)
            .await?;
    let config = form_config::select_config(pg_pool.get_ref(), &scope, query.version).await?;

    let form = services::resolve(&template, config.as_ref(), &scope.product, scope.form_id());
    Ok(JsonResponse::build().set_item(form).ok("OK"))
}
