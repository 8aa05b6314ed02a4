// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Off-grid PV models for FluxION
//!
//! Models for judging the solar resource of a site from a Typical
//! Meteorological Year and sizing the battery bank of an off-grid system.
//!
//! # Features
//!
//! - **Clear-sky model**: theoretical horizontal irradiance and tilted-plane transposition
//! - **Clearness classification**: daily Clear / Partly cloudy / Very cloudy labels
//! - **Run analysis**: consecutive cloudy days and the autonomy they call for
//! - **Bank sizing**: series/parallel battery counts from daily energy and autonomy days
//! - **SOC simulation**: hour-by-hour stored energy with efficiency losses and clamping
//!
//! # Example
//!
//! ```ignore
//! use fluxion_offgrid_core::{BatteryConfig, SimulationSettings, simulate, size_bank};
//!
//! let battery = BatteryConfig::default();
//! let sizing = size_bank(&battery.sizing_input(7.5, 3))?;
//!
//! let sim = simulate(&generation, &consumption, sizing.realized_capacity_wh(), &SimulationSettings::default())?;
//! println!("min SOC {:.2}", sim.summary.min_soc);
//! ```

pub mod autonomy;
pub mod battery;
pub mod clearness;
pub mod config;
pub mod energy;
pub mod error;
pub mod pv;
pub mod runs;
pub mod soc;
pub mod solar;
pub mod types;

// Re-exports for convenience
pub use autonomy::{
    AutonomyChoice, AutonomyComparison, AutonomyOption, EfficiencyGrade, EvaluationThresholds,
    Scenario, ScenarioResult, SystemRating, compare_autonomy, design_daily_energy_kwh,
};
pub use battery::{
    BankSizing, BankSizingInput, BatteryConfig, BatteryUnit, CountRounding, estimate_capacity_kwh,
    size_bank,
};
pub use clearness::{
    ClassifierThresholds, ConditionShare, DailyClassification, DayDetail, ExtremeDays,
    HourlyClearness, REFERENCE_YEAR, SeasonalBreakdown, SkyCondition, analyze_day, classify_days,
    clearness_index, clearness_series, condition_distribution, extreme_days, seasonal_breakdown,
};
pub use config::{AnalysisConfig, SiteConfig};
pub use energy::{EnergyBalance, integrate_wh, interpolate_linear, timestep_from_hours};
pub use error::{OffgridError, Result};
pub use pv::PvArray;
pub use runs::{
    AutonomyRecommendation, DatedRun, Run, RunSet, RunStatistics, find_runs,
};
pub use soc::{
    SimulationSettings, SocSimulation, SocSimulator, SocStep, SocSummary, simulate,
    simulate_repeated,
};
pub use solar::{ClearSkyModel, Season, TiltedPlane};
pub use types::{DaylightTemperature, IrradianceSample, MeasuredTilted, TmyDataset};
