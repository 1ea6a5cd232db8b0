use chrono::Utc;
use jdma_forms::configuration::{get_configuration, DatabaseSettings, Settings};
use jdma_forms::forms::TemplateImport;
use jdma_forms::middleware::authentication::jwt::{encode_jwt, JwtClaims};
use jdma_forms::models;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::atomic::{AtomicUsize, Ordering};

static DATABASE_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const SEED_TEMPLATE: &str = r#"
slug: root
title: Formulaire
steps:
  - title: Satisfaction
    blocks:
      - type_bloc: paragraph
        content: "<p>Votre avis sur {{title}}</p>"
      - type_bloc: smiley_input
        label: Comment s'est passée cette démarche ?
        field_code: satisfaction
        is_required: true
        options:
          - label: Mauvaise
            intention: bad
          - label: Moyenne
            intention: medium
          - label: Bonne
            intention: good
  - title: Details
    is_hideable: true
    blocks:
      - type_bloc: input_text_area
        label: Pourquoi ?
        field_code: verbatim
"#;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub settings: Settings,
    pub product_id: i32,
    pub button_id: i32,
    pub template: models::FormTemplate,
}

impl TestApp {
    pub fn token(&self, role: &str) -> String {
        let claims = JwtClaims {
            sub: "42".to_string(),
            role: role.to_string(),
            email: "builder@example.com".to_string(),
            exp: Utc::now().timestamp() + 600,
        };
        encode_jwt(&claims, self.settings.auth.jwt_secret.as_bytes())
            .expect("Failed to sign token")
    }

    pub fn admin_token(&self) -> String {
        self.token("admin")
    }

    /// Block of the seed template with the given field code.
    pub fn block(&self, field_code: &str) -> &models::FormTemplateBlock {
        self.template
            .blocks()
            .find(|block| block.field_code.as_deref() == Some(field_code))
            .expect("seed block missing")
    }

    pub fn option(&self, field_code: &str, label: &str) -> &models::FormTemplateBlockOption {
        self.block(field_code)
            .options
            .iter()
            .find(|option| option.label == label)
            .expect("seed option missing")
    }
}

/// Starts the server on a fresh database seeded with one product, one button and the root
/// template. `None` when PostgreSQL is not reachable so the suite can run without it.
pub async fn spawn_app() -> Option<TestApp> {
    let mut configuration = get_configuration().expect("Failed to get configuration");

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    configuration.database.database_name = format!(
        "jdma_test_{}_{}_{}",
        std::process::id(),
        Utc::now().timestamp_micros(),
        DATABASE_COUNTER.fetch_add(1, Ordering::SeqCst)
    );

    let connection_pool = match configure_database(&configuration.database).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Skipping tests: failed to connect to postgres: {}", err);
            return None;
        }
    };

    let (product_id, button_id) = seed_product(&connection_pool, "Demande de RSA").await;
    let import: TemplateImport =
        serde_yaml::from_str(SEED_TEMPLATE).expect("Failed to parse seed template");
    let template = jdma_forms::db::form_template::insert_template(
        &connection_pool,
        import.into_template(),
    )
    .await
    .expect("Failed to seed template");

    let server =
        jdma_forms::startup::run(listener, connection_pool.clone(), configuration.clone())
            .await
            .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    Some(TestApp {
        address,
        db_pool: connection_pool,
        settings: configuration,
        product_id,
        button_id,
        template,
    })
}

pub async fn configure_database(config: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection = PgConnection::connect(&config.connection_string_without_db()).await?;

    connection
        .execute(format!(r#"CREATE DATABASE "{}""#, config.database_name).as_str())
        .await?;

    let connection_pool = PgPool::connect(&config.connection_string()).await?;

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await?;

    Ok(connection_pool)
}

pub async fn seed_product(pool: &PgPool, title: &str) -> (i32, i32) {
    let product_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO product (title, created_at) VALUES ($1, NOW() - INTERVAL '1 day') RETURNING id",
    )
    .bind(title)
    .fetch_one(pool)
    .await
    .expect("Failed to seed product");

    let button_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO button (product_id, title) VALUES ($1, 'Bouton principal') RETURNING id",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await
    .expect("Failed to seed button");

    (product_id, button_id)
}
