// Configuration loading

pub mod settings;
pub mod source;

pub use settings::Settings;
pub use source::DirectorySource;
