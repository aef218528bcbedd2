//! # Config Loader
//!
//! Settings loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON settings files
//! - Validate settings legality
//! - Produce a checked `PllSettings`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("framelock.toml")).unwrap();
//! println!("nominal period: {}us", settings.nominal_period_us);
//! ```

mod parser;
mod validator;

pub use contracts::PllSettings;
pub use parser::ConfigFormat;

use contracts::PllError;
use std::path::Path;

/// Settings loader
///
/// Provides static methods to load settings from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a file path
    ///
    /// Automatically detects format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<PllSettings, PllError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<PllSettings, PllError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Serialize settings to a TOML string
    pub fn to_toml(settings: &PllSettings) -> Result<String, PllError> {
        toml::to_string_pretty(settings)
            .map_err(|e| PllError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize settings to a JSON string
    pub fn to_json(settings: &PllSettings) -> Result<String, PllError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| PllError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer format from the file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, PllError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            PllError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| PllError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read the settings file content
    fn read_file(path: &Path) -> Result<String, PllError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
