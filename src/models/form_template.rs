use crate::models::AnswerIntention;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROOT_TEMPLATE_SLUG: &str = "root";
pub const TITLE_PLACEHOLDER: &str = "{{title}}";

pub const INPUT_TEXT_MAX_LENGTH: usize = 250;
pub const INPUT_TEXT_AREA_MAX_LENGTH: usize = 15_000;

/// Kind of a template block. Choice blocks are answered with an option id,
/// text blocks with free text, content blocks are never answered.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TypeBloc {
    SmileyInput,
    MarkInput,
    #[default]
    Radio,
    Checkbox,
    Select,
    InputText,
    InputTextArea,
    Paragraph,
    #[sqlx(rename = "heading_1")]
    #[serde(rename = "heading_1")]
    Heading1,
    #[sqlx(rename = "heading_2")]
    #[serde(rename = "heading_2")]
    Heading2,
    #[sqlx(rename = "heading_3")]
    #[serde(rename = "heading_3")]
    Heading3,
    Divider,
}

impl TypeBloc {
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            TypeBloc::SmileyInput
                | TypeBloc::MarkInput
                | TypeBloc::Radio
                | TypeBloc::Checkbox
                | TypeBloc::Select
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, TypeBloc::InputText | TypeBloc::InputTextArea)
    }

    /// Paragraphs, headings and dividers: rendered, never answered.
    pub fn is_content(&self) -> bool {
        !self.is_choice() && !self.is_text()
    }

    /// Checkbox is the only kind accepting several answers for one block.
    pub fn accepts_many(&self) -> bool {
        matches!(self, TypeBloc::Checkbox)
    }

    pub fn max_length(&self) -> Option<usize> {
        match self {
            TypeBloc::InputText => Some(INPUT_TEXT_MAX_LENGTH),
            TypeBloc::InputTextArea => Some(INPUT_TEXT_AREA_MAX_LENGTH),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeBloc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeBloc::SmileyInput => "smiley_input",
            TypeBloc::MarkInput => "mark_input",
            TypeBloc::Radio => "radio",
            TypeBloc::Checkbox => "checkbox",
            TypeBloc::Select => "select",
            TypeBloc::InputText => "input_text",
            TypeBloc::InputTextArea => "input_text_area",
            TypeBloc::Paragraph => "paragraph",
            TypeBloc::Heading1 => "heading_1",
            TypeBloc::Heading2 => "heading_2",
            TypeBloc::Heading3 => "heading_3",
            TypeBloc::Divider => "divider",
        };
        write!(f, "{}", name)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormTemplate {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub steps: Vec<FormTemplateStep>,
}

impl FormTemplate {
    pub fn is_root(&self) -> bool {
        self.slug == ROOT_TEMPLATE_SLUG
    }

    pub fn blocks(&self) -> impl Iterator<Item = &FormTemplateBlock> {
        self.steps.iter().flat_map(|step| step.blocks.iter())
    }

    pub fn find_block(&self, block_id: i32) -> Option<&FormTemplateBlock> {
        self.blocks().find(|block| block.id == block_id)
    }

    pub fn find_option(&self, option_id: i32) -> Option<&FormTemplateBlockOption> {
        self.blocks()
            .flat_map(|block| block.options.iter())
            .find(|option| option.id == option_id)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormTemplateStep {
    pub id: i32,
    pub template_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub is_hideable: bool,
    #[sqlx(skip)]
    pub blocks: Vec<FormTemplateBlock>,
}

impl FormTemplateStep {
    pub fn option_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.options.iter().map(|option| option.id))
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormTemplateBlock {
    pub id: i32,
    pub step_id: i32,
    pub type_bloc: TypeBloc,
    pub label: String,
    pub alias: Option<String>,
    pub field_code: Option<String>,
    pub is_required: bool,
    pub is_main_block: bool,
    pub position: i32,
    pub content: Option<String>,
    #[sqlx(skip)]
    pub options: Vec<FormTemplateBlockOption>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormTemplateBlockOption {
    pub id: i32,
    pub block_id: i32,
    pub label: String,
    pub value: Option<String>,
    pub position: i32,
    pub intention: Option<AnswerIntention>,
}

/// Replaces every `{{title}}` occurrence with the product title.
pub fn substitute_title(text: &str, product_title: &str) -> String {
    text.replace(TITLE_PLACEHOLDER, product_title)
}
