// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Configuration loading for CLI runs.

use anyhow::{Context, Result};
use fluxion_offgrid_core::AnalysisConfig;
use tracing::{debug, info};

use crate::cli::args::BatteryOverrides;

/// Load the analysis configuration, falling back to defaults without a path.
///
/// The result is validated; advisories are logged but do not fail the load.
pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(path) => {
            let config = AnalysisConfig::from_file(path)
                .with_context(|| format!("Failed to load config file: {path}"))?;
            info!("Loaded configuration from {}", path);
            config
        }
        None => {
            debug!("No configuration file given, using defaults");
            AnalysisConfig::default()
        }
    };
    let source = path.unwrap_or("defaults");
    config
        .validate()
        .with_context(|| format!("Invalid configuration ({source})"))?;
    Ok(config)
}

/// Apply command-line battery overrides on top of the configuration
pub fn apply_battery_overrides(
    config: &mut AnalysisConfig,
    overrides: &BatteryOverrides,
) -> Result<()> {
    if let Some(voltage) = overrides.system_voltage {
        config.battery.system_voltage_v = voltage;
    }
    if let Some(dod) = overrides.dod {
        config.battery.depth_of_discharge = dod;
    }
    if let Some(voltage) = overrides.unit_voltage {
        config.battery.unit_voltage_v = voltage;
    }
    if let Some(capacity) = overrides.unit_capacity {
        config.battery.unit_capacity_ah = capacity;
    }
    config.validate().context("Invalid battery parameters")?;
    Ok(())
}
