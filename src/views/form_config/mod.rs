mod history;
mod published;

pub use history::ConfigVersion;
pub use published::Published;
