use super::models::{ComponentHealth, HealthCheckResponse};
use sqlx::PgPool;
use std::time::{Duration, Instant};
use tokio::time::timeout;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const SLOW_RESPONSE_THRESHOLD_MS: u64 = 1000;

pub struct HealthChecker {
    pg_pool: PgPool,
}

impl HealthChecker {
    pub fn new(pg_pool: PgPool) -> Self {
        Self { pg_pool }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut response = HealthCheckResponse::new(env!("CARGO_PKG_VERSION").to_string());

        let (db_result, migrations_result) = tokio::join!(
            timeout(CHECK_TIMEOUT, self.check_database()),
            timeout(CHECK_TIMEOUT, self.check_migrations()),
        );

        response.add_component(
            "database",
            db_result.unwrap_or_else(|_| ComponentHealth::unhealthy("Timeout".to_string())),
        );
        response.add_component(
            "migrations",
            migrations_result.unwrap_or_else(|_| ComponentHealth::unhealthy("Timeout".to_string())),
        );

        response
    }

    #[tracing::instrument(name = "Check database health", skip(self))]
    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();

        match sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pg_pool)
            .await
        {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                let health = if elapsed > SLOW_RESPONSE_THRESHOLD_MS {
                    ComponentHealth::degraded("Database responding slowly".to_string(), elapsed)
                } else {
                    ComponentHealth::healthy(elapsed)
                };

                let pool_size = self.pg_pool.size();
                let idle_connections = self.pg_pool.num_idle();
                health
                    .detail("pool_size", serde_json::json!(pool_size))
                    .detail("idle_connections", serde_json::json!(idle_connections))
            }
            Err(e) => {
                tracing::error!("Database health check failed: {:?}", e);
                ComponentHealth::unhealthy(format!("Database error: {}", e))
            }
        }
    }

    /// Latest applied schema migration.
    #[tracing::instrument(name = "Check migrations", skip(self))]
    async fn check_migrations(&self) -> ComponentHealth {
        let start = Instant::now();

        match sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(version) FROM _sqlx_migrations WHERE success",
        )
        .fetch_one(&self.pg_pool)
        .await
        {
            Ok(Some(version)) => ComponentHealth::healthy(start.elapsed().as_millis() as u64)
                .detail("version", serde_json::json!(version)),
            Ok(None) => ComponentHealth::unhealthy("No migration applied".to_string()),
            Err(e) => {
                tracing::error!("Migration check failed: {:?}", e);
                ComponentHealth::unhealthy(format!("Migration table error: {}", e))
            }
        }
    }
}
