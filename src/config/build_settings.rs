//! buildsettings.json parsing
//!
//! The settings file is a flat JSON object with two fixed keys:
//!
//! ```json
//! {
//!   "ProjectHome": ".",
//!   "BuildDirectory": "build"
//! }
//! ```
//!
//! It is loaded fresh on every run and never edited by the tool. To change
//! it, edit it by hand or delete it and create the template again.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BuilderError;
use crate::utils::paths::check_contained;

/// File name of the settings document
pub const SETTINGS_FILE_NAME: &str = "buildsettings.json";

/// Project settings read from buildsettings.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory containing the top-level CMakeLists.txt
    #[serde(rename = "ProjectHome")]
    pub project_home: String,

    /// Build output directory, relative to the project home
    #[serde(rename = "BuildDirectory")]
    pub build_directory: String,
}

impl Settings {
    /// Values written by [`SettingsStore::create`]
    pub fn template() -> Self {
        Self {
            project_home: ".".to_string(),
            build_directory: "build".to_string(),
        }
    }

    /// Parse settings from a JSON string
    ///
    /// `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, BuilderError> {
        let settings: Self = serde_json::from_str(content)
            .map_err(|e| BuilderError::parse(path, e.to_string()))?;

        if settings.project_home.is_empty() {
            return Err(BuilderError::parse(path, "ProjectHome must not be empty"));
        }
        if settings.build_directory.is_empty() {
            return Err(BuilderError::parse(path, "BuildDirectory must not be empty"));
        }
        if let Err(reason) = check_contained(Path::new(&settings.build_directory)) {
            return Err(BuilderError::parse(
                path,
                format!("BuildDirectory {reason}, got '{}'", settings.build_directory),
            ));
        }

        Ok(settings)
    }
}

/// Loads and creates the settings file at a fixed location
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store for the settings file at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `buildsettings.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    /// Store for the settings file beside the running executable
    pub fn beside_executable() -> Result<Self, BuilderError> {
        let exe = std::env::current_exe()
            .map_err(|e| BuilderError::io("Failed to locate the running executable", e))?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::in_dir(dir))
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings file
    pub fn load(&self) -> Result<Settings, BuilderError> {
        if !self.path.exists() {
            return Err(BuilderError::not_found(SETTINGS_FILE_NAME, &self.path));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            BuilderError::io(format!("Failed to read {}", self.path.display()), e)
        })?;
        let settings = Settings::parse(&content, &self.path)?;

        debug!(
            "loaded {}: ProjectHome='{}' BuildDirectory='{}'",
            self.path.display(),
            settings.project_home,
            settings.build_directory
        );
        Ok(settings)
    }

    /// Write the template settings file unless one already exists
    ///
    /// Returns `true` when a file was written.
    pub fn create(&self) -> Result<bool, BuilderError> {
        if self.path.exists() {
            debug!("{} already exists, leaving it untouched", self.path.display());
            return Ok(false);
        }

        let content = serde_json::to_string_pretty(&Settings::template())
            .map_err(|e| BuilderError::parse(&self.path, e.to_string()))?;
        std::fs::write(&self.path, content + "\n").map_err(|e| {
            BuilderError::io(format!("Failed to write {}", self.path.display()), e)
        })?;

        debug!("created {}", self.path.display());
        Ok(true)
    }
}
