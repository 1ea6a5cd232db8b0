use crate::db;
use crate::models::{self, ConfigKind, ConfigOverlay, FormTemplate};
use crate::services::errors::FormError;
use crate::views::form_config::ConfigVersion;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub async fn load_template(pool: &PgPool, template_id: i32) -> Result<FormTemplate, FormError> {
    db::form_template::fetch(pool, template_id)
        .await
        .map_err(FormError::Transaction)?
        .ok_or_else(|| FormError::NotFound(format!("template {}", template_id)))
}

/// Product and optional form a config is scoped to, checked against the database.
pub struct ConfigScope {
    pub product: models::Product,
    pub form: Option<models::Form>,
}

impl ConfigScope {
    pub fn form_id(&self) -> Option<i32> {
        self.form.as_ref().map(|form| form.id)
    }
}

/// Loads the product and, when given, the form. The form must belong to the product and be
/// built on `template`. Without a form the product uses the root template, so any other
/// template has no config chain for it.
pub async fn load_scope(
    pool: &PgPool,
    template: &FormTemplate,
    product_id: i32,
    form_id: Option<i32>,
) -> Result<ConfigScope, FormError> {
    let product = db::product::fetch(pool, product_id)
        .await
        .map_err(FormError::Transaction)?
        .ok_or_else(|| FormError::NotFound(format!("product {}", product_id)))?;

    let form = match form_id {
        Some(form_id) => {
            let form = db::product::fetch_form(pool, product_id, form_id)
                .await
                .map_err(FormError::Transaction)?
                .filter(|form| form.form_template_id == template.id)
                .ok_or_else(|| FormError::NotFound(format!("form {}", form_id)))?;
            Some(form)
        }
        None if template.is_root() => None,
        None => {
            return Err(FormError::NotFound(format!(
                "form of product {} on template {}",
                product_id, template.id
            )))
        }
    };

    Ok(ConfigScope { product, form })
}

/// Config to resolve with: a pinned version, or the current one. Version 0 is the raw
/// template and never hits the database.
pub async fn select_config(
    pool: &PgPool,
    scope: &ConfigScope,
    version: Option<i32>,
) -> Result<Option<models::FormConfig>, FormError> {
    match version {
        Some(0) => Ok(None),
        Some(version) => db::form_config::fetch_by_version(pool, scope.product.id, scope.form_id(), version)
            .await
            .map_err(FormError::Transaction)?
            .map(Some)
            .ok_or_else(|| FormError::NotFound(format!("config version {}", version))),
        None => db::form_config::fetch_current(pool, scope.product.id, scope.form_id())
            .await
            .map_err(FormError::Transaction),
    }
}

/// Every override must point at a block or option of `template`.
pub fn check_targets(template: &FormTemplate, overlay: &ConfigOverlay) -> Result<(), FormError> {
    let targets = overlay
        .displays
        .iter()
        .map(|d| (d.kind, d.parent_id))
        .chain(overlay.labels.iter().map(|l| (l.kind, l.parent_id)));

    for (kind, parent_id) in targets {
        let exists = match kind {
            ConfigKind::Block => template.find_block(parent_id).is_some(),
            ConfigKind::BlockOption => template.find_option(parent_id).is_some(),
        };
        if !exists {
            let name = match kind {
                ConfigKind::Block => "block",
                ConfigKind::BlockOption => "option",
            };
            return Err(FormError::NotFound(format!("{} {}", name, parent_id)));
        }
    }

    Ok(())
}

/// Publishes `overlay` as the next config version of the scope. A concurrent publish taking
/// the same version is retried once, then reported as a conflict.
#[tracing::instrument(name = "Publish form config", skip(pool, template, scope, overlay), fields(product_id = scope.product.id))]
pub async fn publish(
    pool: &PgPool,
    template: &FormTemplate,
    scope: &ConfigScope,
    overlay: ConfigOverlay,
) -> Result<models::FormConfig, FormError> {
    let overlay = overlay.hidden_only();
    check_targets(template, &overlay)?;

    let current = db::form_config::fetch_current(pool, scope.product.id, scope.form_id()).await;
    if let Some(version) = repeated_version(current, &overlay) {
        tracing::info!("Publishing an overlay identical to version {}", version);
    }

    for attempt in 0..2 {
        match db::form_config::insert(pool, scope.product.id, scope.form_id(), &overlay).await {
            Ok(Some(config)) => return Ok(config),
            Ok(None) => tracing::warn!("Config version collision, attempt {}", attempt + 1),
            Err(err) => return Err(FormError::Transaction(err)),
        }
    }

    Err(FormError::Conflict(format!(
        "config version for product {}",
        scope.product.id
    )))
}

/// Version whose overlay equals `overlay`, if the current one does. The lookup only feeds a log
/// line, so a failed read is logged and does not block the publish.
fn repeated_version(
    current: Result<Option<models::FormConfig>, String>,
    overlay: &ConfigOverlay,
) -> Option<i32> {
    match current {
        Ok(Some(current)) if !current.overlay().differs_from(overlay) => Some(current.version),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("Could not compare with the current config: {}", err);
            None
        }
    }
}

/// Validity windows of every version, starting with the virtual version 0.
pub fn version_history(
    product_created_at: DateTime<Utc>,
    configs: &[models::FormConfig],
) -> Vec<ConfigVersion> {
    let mut history = vec![ConfigVersion {
        version: 0,
        created_at: product_created_at,
        valid_from: product_created_at,
        valid_until: configs.first().map(|config| config.created_at),
    }];

    history.extend(configs.iter().enumerate().map(|(i, config)| ConfigVersion {
        version: config.version,
        created_at: config.created_at,
        valid_from: config.created_at,
        valid_until: configs.get(i + 1).map(|next| next.created_at),
    }));

    history
}

pub async fn list_versions(pool: &PgPool, scope: &ConfigScope) -> Result<Vec<ConfigVersion>, FormError> {
    let configs = db::form_config::fetch_all(pool, scope.product.id, scope.form_id())
        .await
        .map_err(FormError::Transaction)?;
    Ok(version_history(scope.product.created_at, &configs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayOverride, LabelOverride};
    use crate::services::effective_form::tests::sample_template;
    use chrono::TimeZone;

    fn config_at(version: i32, day: u32) -> models::FormConfig {
        models::FormConfig {
            id: version,
            product_id: 5,
            version,
            created_at: Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn history_starts_with_the_raw_template() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history = version_history(created, &[config_at(1, 3), config_at(2, 9)]);

        assert_eq!(vec![0, 1, 2], history.iter().map(|v| v.version).collect::<Vec<_>>());
        assert_eq!(created, history[0].valid_from);
        assert_eq!(Some(history[1].valid_from), history[0].valid_until);
        assert_eq!(Some(history[2].valid_from), history[1].valid_until);
        assert_eq!(None, history[2].valid_until);
    }

    #[test]
    fn history_without_configs_is_open_ended() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history = version_history(created, &[]);
        assert_eq!(1, history.len());
        assert_eq!(None, history[0].valid_until);
    }

    #[test]
    fn failed_current_lookup_does_not_match() {
        let overlay = ConfigOverlay::default();
        assert_eq!(Some(3), repeated_version(Ok(Some(config_at(3, 2))), &overlay));
        assert_eq!(None, repeated_version(Ok(None), &overlay));
        assert_eq!(None, repeated_version(Err("pool timed out".to_string()), &overlay));
    }

    #[test]
    fn overrides_must_target_the_template() {
        let template = sample_template();
        let valid = ConfigOverlay {
            displays: vec![DisplayOverride {
                kind: ConfigKind::BlockOption,
                parent_id: 111,
                hidden: true,
            }],
            labels: vec![LabelOverride {
                kind: ConfigKind::Block,
                parent_id: 10,
                label: "x".to_string(),
            }],
        };
        assert!(check_targets(&template, &valid).is_ok());

        // 11 is a block, not an option
        let wrong_kind = ConfigOverlay {
            displays: vec![DisplayOverride {
                kind: ConfigKind::BlockOption,
                parent_id: 11,
                hidden: true,
            }],
            ..Default::default()
        };
        match check_targets(&template, &wrong_kind) {
            Err(FormError::NotFound(what)) => assert_eq!("option 11", what),
            other => panic!("unexpected {:?}", other),
        }
    }
}
