mod form_config;
mod form_template;
mod product;
mod review;
pub mod user;

pub use form_config::*;
pub use form_template::*;
pub use product::*;
pub use review::*;
pub use user::*;
