use crate::health::HealthChecker;
use actix_web::{get, web, HttpResponse};
use std::sync::Arc;

#[tracing::instrument(name = "Health check.", skip(checker))]
#[get("")]
pub async fn health_check(checker: web::Data<Arc<HealthChecker>>) -> HttpResponse {
    let health = checker.check_all().await;

    if health.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(health)
    } else {
        HttpResponse::Ok().json(health)
    }
}
