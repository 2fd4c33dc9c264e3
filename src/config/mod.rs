//! Persisted project settings

pub mod build_settings;

pub use build_settings::{Settings, SettingsStore, SETTINGS_FILE_NAME};
