use crate::configuration::get_configuration;
use crate::services::form_config;
use actix_web::rt;
use anyhow::Context;
use sqlx::PgPool;

/// Prints a product's config history with validity windows.
pub struct VersionsCommand {
    template_id: i32,
    product_id: i32,
    form_id: Option<i32>,
}

impl VersionsCommand {
    pub fn new(template_id: i32, product_id: i32, form_id: Option<i32>) -> Self {
        Self {
            template_id,
            product_id,
            form_id,
        }
    }
}

impl crate::console::commands::CallableTrait for VersionsCommand {
    fn call(&self) -> Result<(), Box<dyn std::error::Error>> {
        rt::System::new().block_on(async {
            let settings = get_configuration()?;
            let db_pool = PgPool::connect(&settings.database.connection_string())
                .await
                .context("Failed to connect to database.")?;

            let template = form_config::load_template(&db_pool, self.template_id).await?;
            let scope =
                form_config::load_scope(&db_pool, &template, self.product_id, self.form_id)
                    .await?;
            for version in form_config::list_versions(&db_pool, &scope).await? {
                let until = version
                    .valid_until
                    .map(|until| until.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "v{}\t{}\t{}",
                    version.version,
                    version.valid_from.to_rfc3339(),
                    until
                );
            }

            Ok::<(), Box<dyn std::error::Error>>(())
        })
    }
}
