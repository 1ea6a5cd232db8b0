pub mod answer;
pub mod form_config;
pub mod review;
pub mod template;

pub use answer::AggregateQuery;
pub use form_config::{Overlay, ProductScope, PublishConfig};
pub use review::{AnswerInput, SubmitReview};
pub use template::{AddBlock, AddOption, TemplateImport};
