use crate::configuration::get_configuration;
use crate::db;
use crate::forms::TemplateImport;
use actix_web::rt;
use anyhow::Context;
use serde_valid::Validate;
use sqlx::PgPool;
use std::path::PathBuf;

/// Seeds a form template from a YAML file.
pub struct ImportCommand {
    file: PathBuf,
}

impl ImportCommand {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }

    fn read(&self) -> anyhow::Result<TemplateImport> {
        let content = std::fs::read_to_string(&self.file)
            .with_context(|| format!("cannot read {}", self.file.display()))?;
        let import: TemplateImport = serde_yaml::from_str(&content)
            .with_context(|| format!("{} is not a valid template", self.file.display()))?;
        import
            .validate()
            .map_err(|errors| anyhow::anyhow!("invalid template: {}", errors))?;
        Ok(import)
    }
}

impl crate::console::commands::CallableTrait for ImportCommand {
    fn call(&self) -> Result<(), Box<dyn std::error::Error>> {
        let import = self.read()?;

        rt::System::new().block_on(async {
            let settings = get_configuration()?;
            let db_pool = PgPool::connect(&settings.database.connection_string())
                .await
                .context("Failed to connect to database.")?;

            if db::form_template::fetch_by_slug(&db_pool, &import.slug)
                .await?
                .is_some()
            {
                return Err(anyhow::anyhow!("template {} already exists", import.slug).into());
            }

            let template = db::form_template::insert_template(&db_pool, import.into_template()).await?;
            println!(
                "template {} imported with id {} ({} steps, {} blocks)",
                template.slug,
                template.id,
                template.steps.len(),
                template.blocks().count()
            );

            Ok::<(), Box<dyn std::error::Error>>(())
        })
    }
}
