use crate::configuration::Settings;
use crate::connectors::{AnswerIndex, PgAnswerIndex};
use crate::health::HealthChecker;
use crate::middleware;
use crate::routes;
use actix_cors::Cors;
use actix_web::{dev::Server, error, http, web, App, HttpServer};
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub async fn run(
    listener: TcpListener,
    pg_pool: Pool<Postgres>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let answer_index: Arc<dyn AnswerIndex> = Arc::new(PgAnswerIndex::new(pg_pool.clone()));
    let answer_index = web::Data::new(answer_index);

    let health_checker = web::Data::new(Arc::new(HealthChecker::new(pg_pool.clone())));

    let settings = web::Data::new(settings);
    let pg_pool = web::Data::new(pg_pool);

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let msg: String = match err {
            error::JsonPayloadError::Deserialize(err) => format!(
                "{{\"kind\":\"deserialize\",\"line\":{}, \"column\":{}, \"msg\":\"{}\"}}",
                err.line(),
                err.column(),
                err
            ),
            _ => format!("{{\"kind\":\"other\",\"msg\":\"{}\"}}", err),
        };
        error::InternalError::new(msg, http::StatusCode::BAD_REQUEST).into()
    });

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(middleware::authentication::Manager::new())
            .wrap(actix_web::middleware::Compress::default())
            .wrap(Cors::permissive())
            .app_data(health_checker.clone())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(web::scope("/form").service(routes::form::effective_handler))
            .service(web::scope("/review").service(routes::review::add_handler))
            .service(
                web::scope("/admin")
                    .service(
                        web::scope("/form")
                            .service(routes::form::publish_handler)
                            .service(routes::form::list_handler)
                            .service(routes::form::modified_steps_handler)
                            .service(routes::form::preview_modified_steps_handler),
                    )
                    .service(
                        web::scope("/template")
                            .service(routes::template::add_block_handler)
                            .service(routes::template::delete_block_handler)
                            .service(routes::template::add_option_handler)
                            .service(routes::template::delete_option_handler),
                    )
                    .service(
                        web::scope("/answer")
                            .service(routes::answer::interval_average_handler)
                            .service(routes::answer::interval_handler)
                            .service(routes::answer::aggregate_handler),
                    ),
            )
            .app_data(json_config.clone())
            .app_data(pg_pool.clone())
            .app_data(settings.clone())
            .app_data(answer_index.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
