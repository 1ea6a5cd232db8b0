//! Merges a template with one config version into the form a respondent actually sees.
//!
//! Overlays only remove blocks/options or replace texts; step and block order always come
//! from the template, so the same (template, config, product) always resolves identically.

use crate::models::{
    substitute_title, ConfigKind, ConfigOverlay, FormConfig, FormTemplate, FormTemplateBlock,
    FormTemplateBlockOption, FormTemplateStep, Product, TypeBloc,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveForm {
    pub template_id: i32,
    pub product_id: i32,
    pub form_id: Option<i32>,
    /// 0 when no config applies
    pub config_version: i32,
    pub form_config_id: Option<i32>,
    pub steps: Vec<EffectiveStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStep {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub is_hideable: bool,
    pub blocks: Vec<EffectiveBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveBlock {
    pub id: i32,
    pub type_bloc: TypeBloc,
    pub label: String,
    pub alias: Option<String>,
    pub content: Option<String>,
    pub field_code: Option<String>,
    pub is_required: bool,
    pub is_main_block: bool,
    pub position: i32,
    pub options: Vec<EffectiveOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveOption {
    pub id: i32,
    pub label: String,
    pub value: Option<String>,
    pub position: i32,
    #[serde(skip)]
    pub intention: Option<crate::models::AnswerIntention>,
}

impl EffectiveForm {
    pub fn blocks(&self) -> impl Iterator<Item = &EffectiveBlock> {
        self.steps.iter().flat_map(|step| step.blocks.iter())
    }

    pub fn find_block(&self, block_id: i32) -> Option<&EffectiveBlock> {
        self.blocks().find(|block| block.id == block_id)
    }
}

impl EffectiveBlock {
    pub fn find_option(&self, option_id: i32) -> Option<&EffectiveOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Label used for aggregation and tabular views.
    pub fn display_label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.label)
    }
}

/// Resolves `template` under `config`. `None`, or a config with version 0, yields the raw
/// template with only the `{{title}}` substitution applied.
pub fn resolve(
    template: &FormTemplate,
    config: Option<&FormConfig>,
    product: &Product,
    form_id: Option<i32>,
) -> EffectiveForm {
    let config = config.filter(|config| config.version > 0);
    let overlay = config.map(ConfigOverlay::from).unwrap_or_default();

    let mut steps: Vec<&FormTemplateStep> = template.steps.iter().collect();
    steps.sort_by_key(|step| step.position);

    EffectiveForm {
        template_id: template.id,
        product_id: product.id,
        form_id,
        config_version: config.map_or(0, |config| config.version),
        form_config_id: config.map(|config| config.id),
        steps: steps
            .into_iter()
            .map(|step| resolve_step(step, &overlay, &product.title))
            .collect(),
    }
}

fn resolve_step(step: &FormTemplateStep, overlay: &ConfigOverlay, title: &str) -> EffectiveStep {
    let mut blocks: Vec<&FormTemplateBlock> = step
        .blocks
        .iter()
        .filter(|block| !overlay.is_hidden(ConfigKind::Block, block.id))
        .collect();
    blocks.sort_by_key(|block| block.position);

    EffectiveStep {
        id: step.id,
        title: step.title.clone(),
        description: step.description.clone(),
        position: step.position,
        is_hideable: step.is_hideable,
        blocks: blocks
            .into_iter()
            .map(|block| resolve_block(block, overlay, title))
            .collect(),
    }
}

fn resolve_block(block: &FormTemplateBlock, overlay: &ConfigOverlay, title: &str) -> EffectiveBlock {
    let override_text = overlay
        .label_for(ConfigKind::Block, block.id)
        .map(|label| substitute_title(label, title));

    let template_content = block
        .content
        .as_deref()
        .map(|content| substitute_title(content, title));

    // content blocks display their content, every other block its label
    let (label, content) = match override_text {
        Some(text) if block.type_bloc.is_content() => (block.label.clone(), Some(text)),
        Some(text) => (text, template_content),
        None => (substitute_title(&block.label, title), template_content),
    };

    let mut options: Vec<&FormTemplateBlockOption> = if block.type_bloc.is_choice() {
        block
            .options
            .iter()
            .filter(|option| !overlay.is_hidden(ConfigKind::BlockOption, option.id))
            .collect()
    } else {
        vec![]
    };
    options.sort_by_key(|option| option.position);

    EffectiveBlock {
        id: block.id,
        type_bloc: block.type_bloc,
        label,
        alias: block.alias.clone(),
        content,
        field_code: block.field_code.clone(),
        is_required: block.is_required,
        is_main_block: block.is_main_block,
        position: block.position,
        options: options
            .into_iter()
            .map(|option| EffectiveOption {
                id: option.id,
                label: option.label.clone(),
                value: option.value.clone(),
                position: option.position,
                intention: option.intention,
            })
            .collect(),
    }
}
