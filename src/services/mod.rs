pub mod aggregation;
pub mod effective_form;
pub mod errors;
pub mod form_config;
pub mod modification;
pub mod response_collector;

pub use effective_form::{resolve, EffectiveForm};
pub use errors::{FormError, ValidationError};
