use crate::models;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct AddBlock {
    pub type_bloc: models::TypeBloc,
    #[validate(max_length = 1000)]
    pub label: String,
    #[validate(max_length = 255)]
    pub alias: Option<String>,
    #[validate(max_length = 255)]
    pub field_code: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_main_block: bool,
    #[validate(minimum = 0)]
    pub position: i32,
    #[validate(max_length = 15000)]
    pub content: Option<String>,
}

impl AddBlock {
    pub fn into_block(self, step_id: i32) -> models::FormTemplateBlock {
        models::FormTemplateBlock {
            step_id,
            type_bloc: self.type_bloc,
            label: self.label,
            alias: self.alias,
            field_code: self.field_code,
            is_required: self.is_required,
            is_main_block: self.is_main_block,
            position: self.position,
            content: self.content,
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct AddOption {
    #[validate(max_length = 255)]
    pub label: String,
    #[validate(max_length = 255)]
    pub value: Option<String>,
    #[validate(minimum = 0)]
    pub position: i32,
    pub intention: Option<models::AnswerIntention>,
}

impl AddOption {
    pub fn into_option(self, block_id: i32) -> models::FormTemplateBlockOption {
        models::FormTemplateBlockOption {
            block_id,
            label: self.label,
            value: self.value,
            position: self.position,
            intention: self.intention,
            ..Default::default()
        }
    }
}

/// Template tree read from a YAML seed file. Positions follow list order.
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct TemplateImport {
    #[validate(min_length = 1)]
    #[validate(max_length = 255)]
    pub slug: String,
    #[validate(max_length = 255)]
    pub title: String,
    #[serde(default)]
    #[validate]
    pub steps: Vec<StepImport>,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct StepImport {
    #[validate(max_length = 255)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_hideable: bool,
    #[serde(default)]
    #[validate]
    pub blocks: Vec<BlockImport>,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct BlockImport {
    pub type_bloc: models::TypeBloc,
    #[serde(default)]
    #[validate(max_length = 1000)]
    pub label: String,
    pub alias: Option<String>,
    pub field_code: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_main_block: bool,
    pub content: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionImport>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OptionImport {
    pub label: String,
    pub value: Option<String>,
    pub intention: Option<models::AnswerIntention>,
}

impl TemplateImport {
    pub fn into_template(self) -> models::FormTemplate {
        models::FormTemplate {
            slug: self.slug,
            title: self.title,
            active: true,
            steps: self
                .steps
                .into_iter()
                .zip(0..)
                .map(|(step, position)| models::FormTemplateStep {
                    title: step.title,
                    description: step.description,
                    position,
                    is_hideable: step.is_hideable,
                    blocks: step
                        .blocks
                        .into_iter()
                        .zip(0..)
                        .map(|(block, position)| models::FormTemplateBlock {
                            type_bloc: block.type_bloc,
                            label: block.label,
                            alias: block.alias,
                            field_code: block.field_code,
                            is_required: block.is_required,
                            is_main_block: block.is_main_block,
                            position,
                            content: block.content,
                            options: block
                                .options
                                .into_iter()
                                .zip(0..)
                                .map(|(option, position)| models::FormTemplateBlockOption {
                                    label: option.label,
                                    value: option.value,
                                    position,
                                    intention: option.intention,
                                    ..Default::default()
                                })
                                .collect(),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
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
          - label: Bonne
            intention: good
  - title: Details
    is_hideable: true
    blocks:
      - type_bloc: input_text_area
        label: Pourquoi ?
        field_code: verbatim
"#;

    #[test]
    fn yaml_seed_becomes_an_ordered_tree() {
        let import: TemplateImport = serde_yaml::from_str(SEED).unwrap();
        assert!(import.validate().is_ok());

        let template = import.into_template();
        assert!(template.is_root());
        assert_eq!(2, template.steps.len());
        assert_eq!(1, template.steps[1].position);
        assert!(template.steps[1].is_hideable);

        let smiley = &template.steps[0].blocks[1];
        assert_eq!(models::TypeBloc::SmileyInput, smiley.type_bloc);
        assert_eq!(1, smiley.position);
        assert_eq!(
            vec![Some(models::AnswerIntention::Bad), Some(models::AnswerIntention::Good)],
            smiley.options.iter().map(|o| o.intention).collect::<Vec<_>>()
        );
        assert_eq!(1, smiley.options[1].position);
    }

    #[test]
    fn add_block_keeps_the_requested_position() {
        let form: AddBlock = serde_json::from_str(
            r#"{"type_bloc": "checkbox", "label": "Canaux", "position": 3}"#,
        )
        .unwrap();
        assert!(form.validate().is_ok());

        let block = form.into_block(7);
        assert_eq!(7, block.step_id);
        assert_eq!(3, block.position);
        assert!(!block.is_required);
    }

    #[test]
    fn negative_position_is_rejected() {
        let form: AddOption =
            serde_json::from_str(r#"{"label": "Oui", "position": -1}"#).unwrap();
        assert!(form.validate().is_err());
    }
}
