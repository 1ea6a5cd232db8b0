mod versions;

pub use versions::VersionsCommand;
