//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    enabled: bool,
    nominal_period_us: f64,
    frame_rate_hz: f64,
    lock_tolerance_us: i64,
    lock_confirm_count: u32,
    trigger_enabled: bool,
    lead_time_us: i64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating settings");

    let result = validate_settings(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Settings validation failed")
    }
}

fn validate_settings(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(settings) => {
            let warnings = collect_warnings(&settings);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(SettingsSummary {
                    enabled: settings.enabled,
                    nominal_period_us: settings.nominal_period_us,
                    frame_rate_hz: 1_000_000.0 / settings.nominal_period_us,
                    lock_tolerance_us: settings.lock.lock_tolerance_us,
                    lock_confirm_count: settings.lock.lock_confirm_count,
                    trigger_enabled: settings.trigger.enabled,
                    lead_time_us: settings.trigger.lead_time_us,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect settings warnings (non-fatal issues)
fn collect_warnings(settings: &contracts::PllSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    if !settings.enabled {
        warnings.push("Loop is disabled - start() will refuse to run".to_string());
    }

    if !settings.trigger.enabled {
        warnings.push("Trigger scheduling disabled - no deadlines will be produced".to_string());
    }

    if settings.trigger.lead_time_us > 0 {
        warnings.push(format!(
            "Positive lead time ({}us) fires after the predicted exposure",
            settings.trigger.lead_time_us
        ));
    }

    if (settings.lock.lock_tolerance_us as f64) > settings.nominal_period_us / 4.0 {
        warnings.push(format!(
            "Lock tolerance ({}us) is large relative to the nominal period ({:.0}us)",
            settings.lock.lock_tolerance_us, settings.nominal_period_us
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!(
                "  nominal period: {:.1}us ({:.2} fps)",
                summary.nominal_period_us, summary.frame_rate_hz
            );
            println!(
                "  lock: ±{}us, confirm {}",
                summary.lock_tolerance_us, summary.lock_confirm_count
            );
            println!(
                "  trigger: {} (lead {}us)",
                if summary.trigger_enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                summary.lead_time_us
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  ⚠ {}", warning);
            }
        }
    } else {
        println!("✗ Settings are invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("  {}", error);
        }
    }
}
