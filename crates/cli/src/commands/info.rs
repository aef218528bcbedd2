//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::PllSettings;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Settings info for JSON output
#[derive(Serialize)]
struct SettingsInfo {
    source: String,
    enabled: bool,
    nominal_period_us: f64,
    frame_rate_hz: f64,
    lock: LockInfo,
    probe: ProbeInfo,
    trigger: TriggerInfo,
}

#[derive(Serialize)]
struct LockInfo {
    lock_tolerance_us: i64,
    lock_confirm_count: u32,
    unlock_hysteresis: u32,
    period_smoothing: f64,
    max_period_deviation: f64,
    fault_discontinuity_limit: u32,
    watchdog_cycles: u32,
    min_period_us: f64,
    max_period_us: f64,
}

#[derive(Serialize)]
struct ProbeInfo {
    max_probes: u32,
    target_error_us: u64,
    best_k: usize,
    campaign_timeout_ms: u64,
}

#[derive(Serialize)]
struct TriggerInfo {
    enabled: bool,
    lead_time_us: i64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let (settings, source) = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading settings info");
            if !path.exists() {
                anyhow::bail!("Settings file not found: {}", path.display());
            }
            let settings = config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            (settings, path.display().to_string())
        }
        None => (PllSettings::default(), "<built-in defaults>".to_string()),
    };

    if args.json {
        let info = build_settings_info(&settings, &source);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize settings info")?;
        println!("{}", json);
    } else {
        print_settings_info(&settings, &source);
    }

    Ok(())
}

fn build_settings_info(settings: &PllSettings, source: &str) -> SettingsInfo {
    SettingsInfo {
        source: source.to_string(),
        enabled: settings.enabled,
        nominal_period_us: settings.nominal_period_us,
        frame_rate_hz: 1_000_000.0 / settings.nominal_period_us,
        lock: LockInfo {
            lock_tolerance_us: settings.lock.lock_tolerance_us,
            lock_confirm_count: settings.lock.lock_confirm_count,
            unlock_hysteresis: settings.lock.unlock_hysteresis,
            period_smoothing: settings.lock.period_smoothing,
            max_period_deviation: settings.lock.max_period_deviation,
            fault_discontinuity_limit: settings.lock.fault_discontinuity_limit,
            watchdog_cycles: settings.lock.watchdog_cycles,
            min_period_us: settings.lock.min_period_us,
            max_period_us: settings.lock.max_period_us,
        },
        probe: ProbeInfo {
            max_probes: settings.probe.max_probes,
            target_error_us: settings.probe.target_error_us,
            best_k: settings.probe.best_k,
            campaign_timeout_ms: settings.probe.campaign_timeout_ms,
        },
        trigger: TriggerInfo {
            enabled: settings.trigger.enabled,
            lead_time_us: settings.trigger.lead_time_us,
        },
    }
}

fn print_settings_info(settings: &PllSettings, source: &str) {
    println!("\n=== Framelock Settings ===\n");
    println!("Source: {}", source);
    println!("Enabled: {}", settings.enabled);
    println!(
        "Nominal period: {:.1}us ({:.2} fps)",
        settings.nominal_period_us,
        1_000_000.0 / settings.nominal_period_us
    );

    println!("\nLock controller:");
    println!("  Tolerance: ±{}us", settings.lock.lock_tolerance_us);
    println!(
        "  Lock confirm / unlock hysteresis: {} / {}",
        settings.lock.lock_confirm_count, settings.lock.unlock_hysteresis
    );
    println!("  Period smoothing: {}", settings.lock.period_smoothing);
    println!(
        "  Max period deviation: {:.0}%",
        settings.lock.max_period_deviation * 100.0
    );
    println!(
        "  Fault after {} discontinuities, watchdog {} periods",
        settings.lock.fault_discontinuity_limit, settings.lock.watchdog_cycles
    );
    println!(
        "  Plausible period: [{:.0}, {:.0}]us",
        settings.lock.min_period_us, settings.lock.max_period_us
    );

    println!("\nOffset probe:");
    println!("  Max probes: {}", settings.probe.max_probes);
    println!("  Target error: {}us", settings.probe.target_error_us);
    println!("  Best-k average: {}", settings.probe.best_k);
    println!("  Campaign timeout: {}ms", settings.probe.campaign_timeout_ms);

    println!("\nTrigger:");
    println!("  Enabled: {}", settings.trigger.enabled);
    println!("  Lead time: {}us", settings.trigger.lead_time_us);

    println!();
}
