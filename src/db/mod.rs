pub mod form_config;
pub mod form_template;
pub mod product;
pub mod review;
