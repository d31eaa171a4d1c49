//! Configuration management for focus-veil
//!
//! - **settings**: the persisted settings document and its defaults overlay
//! - **store**: blob storage keyed by plugin identity and the settings store on top

pub mod settings;
pub mod store;

pub use settings::Settings;
pub use store::{JsonFileStore, SettingsStore};
