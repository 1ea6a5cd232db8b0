mod json;
mod token;

pub use json::JsonCommand;
pub use token::TokenCommand;
