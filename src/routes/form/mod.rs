mod config;
mod effective;
mod modified;

pub use config::*;
pub use effective::*;
pub use modified::*;
