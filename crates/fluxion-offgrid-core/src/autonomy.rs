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

//! Comparison of candidate autonomy days across seasonal scenarios.
//!
//! Every candidate is sized from the same design daily energy, then each
//! scenario profile is simulated against the realized bank.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battery::{BankSizing, BatteryConfig, size_bank};
use crate::energy::integrate_wh;
use crate::error::{OffgridError, Result};
use crate::soc::{SimulationSettings, SocSimulator, SocSummary};

/// One daily generation/consumption profile, e.g. a winter or summer day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub generation_w: Vec<f64>,
    pub consumption_w: Vec<f64>,
}

impl Scenario {
    #[must_use]
    pub fn new(name: impl Into<String>, generation_w: Vec<f64>, consumption_w: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            generation_w,
            consumption_w,
        }
    }

    #[must_use]
    pub fn daily_consumption_kwh(&self, timestep_hours: f64) -> f64 {
        integrate_wh(&self.consumption_w, timestep_hours) / 1000.0
    }
}

/// Acceptance thresholds for simulated systems (`[evaluation]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationThresholds {
    /// Most critical steps a usable system may have
    #[serde(default = "default_max_critical_steps")]
    pub max_critical_steps: usize,

    /// Critical steps still rated good
    #[serde(default = "default_good_critical_steps")]
    pub good_critical_steps: usize,

    #[serde(default = "default_optimal_efficiency")]
    pub optimal_efficiency: f64,

    #[serde(default = "default_min_efficiency")]
    pub min_efficiency: f64,
}

fn default_max_critical_steps() -> usize {
    6
}

fn default_good_critical_steps() -> usize {
    2
}

fn default_optimal_efficiency() -> f64 {
    0.85
}

fn default_min_efficiency() -> f64 {
    0.70
}

impl Default for EvaluationThresholds {
    fn default() -> Self {
        Self {
            max_critical_steps: default_max_critical_steps(),
            good_critical_steps: default_good_critical_steps(),
            optimal_efficiency: default_optimal_efficiency(),
            min_efficiency: default_min_efficiency(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemRating {
    Excellent,
    Good,
    Acceptable,
    Insufficient,
}

impl SystemRating {
    #[must_use]
    pub fn from_critical_steps(critical_steps: usize, thresholds: &EvaluationThresholds) -> Self {
        if critical_steps == 0 {
            Self::Excellent
        } else if critical_steps <= thresholds.good_critical_steps {
            Self::Good
        } else if critical_steps <= thresholds.max_critical_steps {
            Self::Acceptable
        } else {
            Self::Insufficient
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Acceptable => "Acceptable",
            Self::Insufficient => "Insufficient",
        }
    }
}

impl std::fmt::Display for SystemRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EfficiencyGrade {
    Optimal,
    Acceptable,
    Low,
}

impl EfficiencyGrade {
    #[must_use]
    pub fn grade(efficiency: f64, thresholds: &EvaluationThresholds) -> Self {
        if efficiency >= thresholds.optimal_efficiency {
            Self::Optimal
        } else if efficiency >= thresholds.min_efficiency {
            Self::Acceptable
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub summary: SocSummary,
    pub efficiency_grade: EfficiencyGrade,
}

/// Outcome for one autonomy-days candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomyOption {
    pub autonomy_days: u32,
    pub sizing: BankSizing,
    pub scenarios: Vec<ScenarioResult>,
    pub worst_critical_steps: usize,
    pub rating: SystemRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutonomyChoice {
    /// Smallest candidate without critical steps in any scenario
    Recommended { autonomy_days: u32 },
    /// No candidate was free of critical steps
    IncreaseCapacity { suggested_days: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomyComparison {
    pub design_daily_energy_kwh: f64,
    pub options: Vec<AutonomyOption>,
    pub choice: AutonomyChoice,
}

/// Design daily energy: the largest daily consumption among scenarios
#[must_use]
pub fn design_daily_energy_kwh(scenarios: &[Scenario], timestep_hours: f64) -> f64 {
    scenarios
        .iter()
        .map(|s| s.daily_consumption_kwh(timestep_hours))
        .fold(0.0, f64::max)
}

pub fn compare_autonomy(
    scenarios: &[Scenario],
    candidate_days: &[u32],
    battery: &BatteryConfig,
    settings: &SimulationSettings,
    thresholds: &EvaluationThresholds,
) -> Result<AutonomyComparison> {
    if scenarios.is_empty() {
        return Err(OffgridError::EmptySeries("scenarios"));
    }
    if candidate_days.is_empty() {
        return Err(OffgridError::EmptySeries("autonomy day candidates"));
    }

    let design_daily_energy_kwh = design_daily_energy_kwh(scenarios, settings.timestep_hours);
    if design_daily_energy_kwh <= 0.0 {
        return Err(OffgridError::InvalidParameter {
            name: "design_daily_energy_kwh",
            value: design_daily_energy_kwh,
            reason: "scenarios carry no consumption to size for",
        });
    }
    info!(
        "Comparing {} autonomy options over {} scenarios, design load {:.2} kWh/day",
        candidate_days.len(),
        scenarios.len(),
        design_daily_energy_kwh
    );

    let mut candidates = candidate_days.to_vec();
    candidates.sort_unstable();
    candidates.dedup();

    let mut options = Vec::with_capacity(candidates.len());
    for days in candidates {
        let sizing = size_bank(&battery.sizing_input(design_daily_energy_kwh, days))?;
        let simulator = SocSimulator::new(sizing.realized_capacity_wh(), *settings)?;

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let sim = simulator.run(&scenario.generation_w, &scenario.consumption_w)?;
            results.push(ScenarioResult {
                scenario: scenario.name.clone(),
                efficiency_grade: EfficiencyGrade::grade(sim.summary.efficiency, thresholds),
                summary: sim.summary,
            });
        }

        let worst_critical_steps = results
            .iter()
            .map(|r| r.summary.critical_steps)
            .max()
            .unwrap_or(0);
        let rating = SystemRating::from_critical_steps(worst_critical_steps, thresholds);
        debug!(
            "{} days: {} batteries, {:.1} kWh, worst critical {}, {}",
            days, sizing.total_batteries, sizing.realized_capacity_kwh, worst_critical_steps, rating
        );

        options.push(AutonomyOption {
            autonomy_days: days,
            sizing,
            scenarios: results,
            worst_critical_steps,
            rating,
        });
    }

    let choice = options
        .iter()
        .find(|o| o.worst_critical_steps == 0)
        .map_or_else(
            || AutonomyChoice::IncreaseCapacity {
                suggested_days: options
                    .iter()
                    .map(|o| o.autonomy_days)
                    .max()
                    .unwrap_or(0)
                    + 1,
            },
            |o| AutonomyChoice::Recommended {
                autonomy_days: o.autonomy_days,
            },
        );

    Ok(AutonomyComparison {
        design_daily_energy_kwh,
        options,
        choice,
    })
}
