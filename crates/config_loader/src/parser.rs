//! Settings parsing.
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{PllError, PllSettings};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML settings
pub fn parse_toml(content: &str) -> Result<PllSettings, PllError> {
    toml::from_str(content).map_err(|e| PllError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON settings
pub fn parse_json(content: &str) -> Result<PllSettings, PllError> {
    serde_json::from_str(content).map_err(|e| PllError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse settings in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<PllSettings, PllError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
nominal_period_us = 33333.0

[lock]
lock_tolerance_us = 500
lock_confirm_count = 3
unlock_hysteresis = 2
period_smoothing = 0.1
max_period_deviation = 0.25
fault_discontinuity_limit = 3
watchdog_cycles = 5
min_period_us = 1000.0
max_period_us = 1000000.0

[probe]
max_probes = 64
target_error_us = 50
best_k = 4
campaign_timeout_ms = 250

[trigger]
enabled = true
lead_time_us = -1500
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let settings = result.unwrap();
        assert_eq!(settings.nominal_period_us, 33_333.0);
        assert_eq!(settings.trigger.lead_time_us, -1_500);
    }

    #[test]
    fn test_parse_toml_sections_default() {
        // Only the top-level field; all sections fall back to defaults
        let settings = parse_toml("nominal_period_us = 16667.0").unwrap();
        assert_eq!(settings.nominal_period_us, 16_667.0);
        assert_eq!(settings.lock.lock_confirm_count, 3);
        assert_eq!(settings.probe.target_error_us, 50);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "nominal_period_us": 33333.0,
            "trigger": { "enabled": true, "lead_time_us": 0 }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(PllError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
