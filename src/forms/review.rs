use serde::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct AnswerInput {
    pub block_id: i32,
    pub answer_item_id: Option<i32>, // chosen option for choice blocks
    pub answer_text: Option<String>, // free text for input blocks
}

/// A respondent's submission. `form_config_version` is the version the form was rendered with,
/// 0 for the raw template.
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct SubmitReview {
    pub template_id: i32,
    pub product_id: i32,
    pub form_id: Option<i32>,
    pub button_id: Option<i32>,
    #[serde(default)]
    #[validate(minimum = 0)]
    pub form_config_version: i32,
    #[validate(max_items = 500)]
    pub answers: Vec<AnswerInput>,
}
