use crate::db;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::services::{self, form_config, response_collector, FormError};
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;

/// Records a respondent's answers against the config version their form was rendered with.
#[tracing::instrument(name = "Add review.", skip(pg_pool, form), fields(product_id = form.product_id))]
#[post("")]
pub async fn add_handler(
    form: web::Json<forms::SubmitReview>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<()>::build().form_error(errors.to_string()));
    }
    let form = form.into_inner();

    let template = form_config::load_template(pg_pool.get_ref(), form.template_id).await?;
    let scope = form_config::load_scope(
        pg_pool.get_ref(),
        &template,
        form.product_id,
        form.form_id,
    )
    .await?;

    if let Some(button_id) = form.button_id {
        db::product::fetch_button(pg_pool.get_ref(), form.product_id, button_id)
            .await
            .map_err(FormError::Transaction)?
            .ok_or_else(|| FormError::NotFound(format!("button {}", button_id)))?;
    }

    let config =
        form_config::select_config(pg_pool.get_ref(), &scope, Some(form.form_config_version))
            .await?;
    let effective = services::resolve(&template, config.as_ref(), &scope.product, scope.form_id());

    let review = response_collector::submit_review(
        pg_pool.get_ref(),
        &effective,
        form.button_id,
        &form.answers,
    )
    .await?;

    Ok(JsonResponse::<()>::build().set_id(review.id).ok("Saved"))
}
