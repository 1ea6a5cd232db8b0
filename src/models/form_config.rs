use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a display or label override points at.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[sqlx(type_name = "varchar")]
pub enum ConfigKind {
    #[default]
    #[sqlx(rename = "block")]
    #[serde(rename = "block")]
    Block,
    #[sqlx(rename = "blockOption")]
    #[serde(rename = "blockOption")]
    BlockOption,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    #[default]
    Published,
}

/// One immutable version of a product's overrides on top of a template.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormConfig {
    pub id: i32,
    pub product_id: i32,
    pub form_id: Option<i32>,
    pub version: i32,
    pub status: ConfigStatus,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub displays: Vec<FormConfigDisplay>,
    #[sqlx(skip)]
    pub labels: Vec<FormConfigLabel>,
}

impl FormConfig {
    pub fn overlay(&self) -> ConfigOverlay {
        ConfigOverlay::from(self)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormConfigDisplay {
    pub id: i32,
    pub form_config_id: i32,
    pub kind: ConfigKind,
    pub parent_id: i32,
    pub hidden: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormConfigLabel {
    pub id: i32,
    pub form_config_id: i32,
    pub kind: ConfigKind,
    pub parent_id: i32,
    pub label: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct DisplayOverride {
    pub kind: ConfigKind,
    pub parent_id: i32,
    pub hidden: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct LabelOverride {
    pub kind: ConfigKind,
    pub parent_id: i32,
    pub label: String,
}

/// The overrides of a config without their storage ids. Empty means the raw template.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverlay {
    #[serde(default)]
    pub displays: Vec<DisplayOverride>,
    #[serde(default)]
    pub labels: Vec<LabelOverride>,
}

impl ConfigOverlay {
    pub fn is_hidden(&self, kind: ConfigKind, parent_id: i32) -> bool {
        self.displays
            .iter()
            .any(|d| d.kind == kind && d.parent_id == parent_id && d.hidden)
    }

    /// Last matching override wins when a caller supplied duplicates.
    pub fn label_for(&self, kind: ConfigKind, parent_id: i32) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|l| l.kind == kind && l.parent_id == parent_id)
            .map(|l| l.label.as_str())
    }

    /// Drops "shown" display entries: absence of an entry already means visible.
    pub fn hidden_only(mut self) -> Self {
        self.displays.retain(|d| d.hidden);
        self
    }

    fn sorted(&self) -> (Vec<DisplayOverride>, Vec<LabelOverride>) {
        let mut displays = self.displays.clone();
        displays.sort();
        let mut labels = self.labels.clone();
        labels.sort();
        (displays, labels)
    }

    /// Order-insensitive comparison of two overlays.
    pub fn differs_from(&self, other: &ConfigOverlay) -> bool {
        self.sorted() != other.sorted()
    }
}

impl From<&FormConfig> for ConfigOverlay {
    fn from(config: &FormConfig) -> Self {
        ConfigOverlay {
            displays: config
                .displays
                .iter()
                .map(|d| DisplayOverride {
                    kind: d.kind,
                    parent_id: d.parent_id,
                    hidden: d.hidden,
                })
                .collect(),
            labels: config
                .labels
                .iter()
                .map(|l| LabelOverride {
                    kind: l.kind,
                    parent_id: l.parent_id,
                    label: l.label.clone(),
                })
                .collect(),
        }
    }
}
