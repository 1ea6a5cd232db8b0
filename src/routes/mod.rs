pub mod answer;
pub mod form;
pub mod health_checks;
pub mod review;
pub mod template;

pub use health_checks::*;
