//! `run` command implementation.

use anyhow::{Context, Result};
use capture::MockCameraConfig;
use contracts::PllSettings;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    // Load settings, or fall back to built-in defaults
    let mut settings = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading settings");
            if !path.exists() {
                anyhow::bail!("Settings file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => {
            info!("No settings file given, using built-in defaults");
            PllSettings::default()
        }
    };

    // Apply CLI overrides
    if args.frame_rate <= 0.0 {
        anyhow::bail!("--frame-rate must be positive, got {}", args.frame_rate);
    }
    let nominal_period_us = 1_000_000.0 / args.frame_rate;
    if (nominal_period_us - settings.nominal_period_us).abs() > 1.0 {
        info!(
            frame_rate_hz = args.frame_rate,
            nominal_period_us, "Overriding nominal period from --frame-rate"
        );
        settings.nominal_period_us = nominal_period_us;
    }
    if let Some(lead) = args.lead_time_us {
        info!(lead_time_us = lead, "Overriding trigger lead time from CLI");
        settings.trigger.lead_time_us = lead;
    }

    info!(
        nominal_period_us = settings.nominal_period_us,
        lock_tolerance_us = settings.lock.lock_tolerance_us,
        lead_time_us = settings.trigger.lead_time_us,
        "Settings loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - settings are valid, exiting");
        print_settings_summary(&settings);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        settings,
        camera: MockCameraConfig {
            frequency_hz: args.frame_rate,
            device_minus_host_us: args.device_skew_us,
            jitter_us: args.jitter_us,
            drop_every: if args.drop_every == 0 {
                None
            } else {
                Some(args.drop_every)
            },
        },
        max_events: if args.max_events == 0 {
            None
        } else {
            Some(args.max_events)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting lock loop...");

    // Run loop with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        events = stats.events_received,
                        triggers = stats.triggers_scheduled,
                        duration_secs = stats.duration.as_secs_f64(),
                        event_rate_hz = format!("{:.2}", stats.event_rate_hz()),
                        "Lock loop completed"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Lock loop execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping loop...");
        }
    }

    info!("Framelock finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print settings summary for dry-run mode
fn print_settings_summary(settings: &PllSettings) {
    println!("\n=== Settings Summary ===\n");
    println!("Loop:");
    println!("  Enabled: {}", settings.enabled);
    println!(
        "  Nominal period: {:.1}us ({:.2} fps)",
        settings.nominal_period_us,
        1_000_000.0 / settings.nominal_period_us
    );

    println!("\nLock:");
    println!("  Tolerance: {}us", settings.lock.lock_tolerance_us);
    println!(
        "  Confirm / hysteresis: {} / {}",
        settings.lock.lock_confirm_count, settings.lock.unlock_hysteresis
    );
    println!("  Watchdog: {} periods", settings.lock.watchdog_cycles);

    println!("\nProbe:");
    println!(
        "  Budget: {} probes, target {}us, best {} averaged",
        settings.probe.max_probes, settings.probe.target_error_us, settings.probe.best_k
    );

    println!("\nTrigger:");
    println!("  Enabled: {}", settings.trigger.enabled);
    println!("  Lead time: {}us", settings.trigger.lead_time_us);

    println!();
}
