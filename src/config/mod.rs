//! Configuration: project settings file and master key source.

pub mod key_source;
pub mod settings;

pub use key_source::KeySource;
pub use settings::Settings;
