mod callable;
pub mod config;
pub mod debug;
pub mod template;

pub use callable::*;
