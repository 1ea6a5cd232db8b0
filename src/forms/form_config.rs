use crate::models;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct Label {
    pub kind: models::ConfigKind,
    pub parent_id: i32,
    #[validate(max_length = 15000)]
    pub label: String,
}

/// The complete set of overrides wanted from now on, not a diff against the current version.
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct Overlay {
    #[serde(default)]
    #[validate(max_items = 2000)]
    pub displays: Vec<models::DisplayOverride>,
    #[serde(default)]
    #[validate(max_items = 2000)]
    #[validate]
    pub labels: Vec<Label>,
}

impl From<Overlay> for models::ConfigOverlay {
    fn from(form: Overlay) -> Self {
        models::ConfigOverlay {
            displays: form.displays,
            labels: form
                .labels
                .into_iter()
                .map(|l| models::LabelOverride {
                    kind: l.kind,
                    parent_id: l.parent_id,
                    label: l.label,
                })
                .collect(),
        }
        .hidden_only()
    }
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct PublishConfig {
    pub product_id: i32,
    pub form_id: Option<i32>,
    #[serde(flatten)]
    #[validate]
    pub overlay: Overlay,
}

/// Query string selecting a product's use of a template, optionally pinned to one version.
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct ProductScope {
    pub product_id: i32,
    pub form_id: Option<i32>,
    #[validate(minimum = 0)]
    pub version: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_payload_flattens_overlay_and_drops_shown_entries() {
        let form: PublishConfig = serde_json::from_str(
            r#"{
                "product_id": 3,
                "displays": [
                    {"kind": "blockOption", "parent_id": 7, "hidden": true},
                    {"kind": "block", "parent_id": 8, "hidden": false}
                ],
                "labels": [{"kind": "block", "parent_id": 9, "label": "Merci"}]
            }"#,
        )
        .unwrap();
        assert!(form.validate().is_ok());
        assert_eq!(None, form.form_id);

        let overlay: models::ConfigOverlay = form.overlay.into();
        assert_eq!(1, overlay.displays.len());
        assert_eq!(models::ConfigKind::BlockOption, overlay.displays[0].kind);
        assert_eq!(Some("Merci"), overlay.label_for(models::ConfigKind::Block, 9));
    }

    #[test]
    fn negative_version_is_rejected() {
        let scope = ProductScope {
            product_id: 1,
            form_id: None,
            version: Some(-1),
        };
        assert!(scope.validate().is_err());
    }
}
