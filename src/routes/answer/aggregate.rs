use crate::configuration::Settings;
use crate::connectors::AnswerIndex;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::middleware::authentication::admin_user;
use crate::models;
use crate::services::aggregation;
use actix_web::{get, web, Responder, Result};
use std::sync::Arc;

fn answer_query(
    field_code: &str,
    query: &forms::AggregateQuery,
) -> Result<crate::connectors::AnswerQuery> {
    query
        .to_answer_query(field_code)
        .map_err(|err| JsonResponse::<()>::build().bad_request(err))
}

#[tracing::instrument(name = "Aggregate answers by field code.", skip(index, settings))]
#[get("/{field_code}")]
pub async fn aggregate_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(String,)>,
    query: web::Query<forms::AggregateQuery>,
    index: web::Data<Arc<dyn AnswerIndex>>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    let (field_code,) = path.into_inner();
    let query = answer_query(&field_code, &query)?;

    let result = aggregation::aggregate_by_field_code(index.get_ref().as_ref(), &query).await?;
    Ok(JsonResponse::build().set_item(result).ok("OK"))
}

#[tracing::instrument(name = "Aggregate answers per month.", skip(index, settings))]
#[get("/{field_code}/interval")]
pub async fn interval_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(String,)>,
    query: web::Query<forms::AggregateQuery>,
    index: web::Data<Arc<dyn AnswerIndex>>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    let (field_code,) = path.into_inner();
    let query = answer_query(&field_code, &query)?;

    let result =
        aggregation::aggregate_by_field_code_interval(index.get_ref().as_ref(), &query).await?;
    Ok(JsonResponse::build().set_item(result).ok("OK"))
}

#[tracing::instrument(name = "Average answer score per month.", skip(index, settings))]
#[get("/{field_code}/interval-average")]
pub async fn interval_average_handler(
    user: Option<web::ReqData<Arc<models::User>>>,
    path: web::Path<(String,)>,
    query: web::Query<forms::AggregateQuery>,
    index: web::Data<Arc<dyn AnswerIndex>>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    admin_user(user, settings.get_ref())?;
    let (field_code,) = path.into_inner();
    let query = answer_query(&field_code, &query)?;

    let result =
        aggregation::aggregate_by_field_code_interval_average(index.get_ref().as_ref(), &query)
            .await?;
    Ok(JsonResponse::build().set_item(result).ok("OK"))
}
