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

//! State-of-charge simulation of a single aggregate battery pool.
//!
//! The pool holds one scalar, the stored energy in Wh. Each step adds the
//! surplus times the charge efficiency or removes the deficit divided by the
//! discharge efficiency, then clamps to `[min_soc * capacity, capacity]`.
//! Energy cut off by the clamp is not tracked.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{
    OffgridError, Result, ensure_fraction, ensure_positive, ensure_unit_open_closed,
};

/// Simulation parameters independent of the bank size (`[simulation]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// SOC at the start of the run (0.0 - 1.0)
    #[serde(default = "default_initial_soc")]
    pub initial_soc: f64,

    /// Floor the pool is never drained below (0.0 - 1.0)
    #[serde(default = "default_min_soc")]
    pub min_soc: f64,

    #[serde(default = "default_efficiency")]
    pub charge_efficiency: f64,

    #[serde(default = "default_efficiency")]
    pub discharge_efficiency: f64,

    /// Steps with SOC strictly below this count as critical
    #[serde(default = "default_critical_soc")]
    pub critical_soc: f64,

    /// Length of one step of the input series (hours)
    #[serde(default = "default_timestep_hours")]
    pub timestep_hours: f64,
}

fn default_initial_soc() -> f64 {
    1.0
}

fn default_min_soc() -> f64 {
    0.2
}

fn default_efficiency() -> f64 {
    0.9
}

fn default_critical_soc() -> f64 {
    0.3
}

fn default_timestep_hours() -> f64 {
    1.0
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_soc: default_initial_soc(),
            min_soc: default_min_soc(),
            charge_efficiency: default_efficiency(),
            discharge_efficiency: default_efficiency(),
            critical_soc: default_critical_soc(),
            timestep_hours: default_timestep_hours(),
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<()> {
        ensure_fraction("initial_soc", self.initial_soc)?;
        ensure_fraction("min_soc", self.min_soc)?;
        if self.min_soc > self.initial_soc {
            return Err(OffgridError::InvalidParameter {
                name: "min_soc",
                value: self.min_soc,
                reason: "must not exceed initial_soc",
            });
        }
        ensure_unit_open_closed("charge_efficiency", self.charge_efficiency)?;
        ensure_unit_open_closed("discharge_efficiency", self.discharge_efficiency)?;
        ensure_fraction("critical_soc", self.critical_soc)?;
        ensure_positive("timestep_hours", self.timestep_hours)
    }
}

/// One simulated timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocStep {
    pub generation_w: f64,
    pub consumption_w: f64,
    /// Generation minus consumption (W)
    pub balance_w: f64,
    /// Stored energy after clamping (Wh)
    pub stored_wh: f64,
    pub soc: f64,
    /// Energy credited to the pool before clamping (Wh)
    pub charged_wh: f64,
    /// Energy drawn from the pool before clamping (Wh)
    pub discharged_wh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocSummary {
    pub min_soc: f64,
    pub max_soc: f64,
    pub mean_soc: f64,
    pub final_soc: f64,
    pub critical_steps: usize,
    pub charged_kwh: f64,
    pub discharged_kwh: f64,
    /// Discharged over charged; 0 when nothing was charged.
    /// Informational only, the clamp discards energy.
    pub efficiency: f64,
}

/// Full trace plus aggregates of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocSimulation {
    pub capacity_wh: f64,
    pub steps: Vec<SocStep>,
    pub summary: SocSummary,
}

/// Battery pool with validated parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocSimulator {
    capacity_wh: f64,
    settings: SimulationSettings,
}

impl SocSimulator {
    pub fn new(capacity_wh: f64, settings: SimulationSettings) -> Result<Self> {
        ensure_positive("capacity_wh", capacity_wh)?;
        settings.validate()?;
        Ok(Self {
            capacity_wh,
            settings,
        })
    }

    #[must_use]
    pub fn capacity_wh(&self) -> f64 {
        self.capacity_wh
    }

    #[must_use]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Advance the pool through paired series, strictly in order
    pub fn run(&self, generation_w: &[f64], consumption_w: &[f64]) -> Result<SocSimulation> {
        if generation_w.len() != consumption_w.len() {
            return Err(OffgridError::LengthMismatch {
                generation: generation_w.len(),
                consumption: consumption_w.len(),
            });
        }
        if generation_w.is_empty() {
            return Err(OffgridError::EmptySeries("generation/consumption"));
        }

        let s = &self.settings;
        let floor_wh = s.min_soc * self.capacity_wh;
        let mut stored_wh = s.initial_soc * self.capacity_wh;
        let mut steps = Vec::with_capacity(generation_w.len());

        for (&generation, &consumption) in generation_w.iter().zip(consumption_w) {
            let balance_w = generation - consumption;
            let energy_wh = balance_w * s.timestep_hours;

            let (charged_wh, discharged_wh) = if energy_wh > 0.0 {
                (energy_wh * s.charge_efficiency, 0.0)
            } else {
                (0.0, energy_wh.abs() / s.discharge_efficiency)
            };
            stored_wh = (stored_wh + charged_wh - discharged_wh).clamp(floor_wh, self.capacity_wh);

            steps.push(SocStep {
                generation_w: generation,
                consumption_w: consumption,
                balance_w,
                stored_wh,
                soc: stored_wh / self.capacity_wh,
                charged_wh,
                discharged_wh,
            });
        }

        let summary = summarize(&steps, s.critical_soc);
        debug!(
            "SOC run over {} steps: min {:.3}, final {:.3}, {} critical",
            steps.len(),
            summary.min_soc,
            summary.final_soc,
            summary.critical_steps
        );

        Ok(SocSimulation {
            capacity_wh: self.capacity_wh,
            steps,
            summary,
        })
    }

    /// Repeat a one-day profile `days` times; state carries over between days
    pub fn run_repeated(
        &self,
        generation_day_w: &[f64],
        consumption_day_w: &[f64],
        days: usize,
    ) -> Result<SocSimulation> {
        if days == 0 {
            return Err(OffgridError::InvalidParameter {
                name: "days",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        self.run(
            &generation_day_w.repeat(days),
            &consumption_day_w.repeat(days),
        )
    }
}

fn summarize(steps: &[SocStep], critical_soc: f64) -> SocSummary {
    let mut min_soc = f64::INFINITY;
    let mut max_soc = f64::NEG_INFINITY;
    let mut soc_sum = 0.0;
    let mut critical_steps = 0;
    let mut charged_wh = 0.0;
    let mut discharged_wh = 0.0;

    for step in steps {
        min_soc = min_soc.min(step.soc);
        max_soc = max_soc.max(step.soc);
        soc_sum += step.soc;
        if step.soc < critical_soc {
            critical_steps += 1;
        }
        charged_wh += step.charged_wh;
        discharged_wh += step.discharged_wh;
    }

    SocSummary {
        min_soc,
        max_soc,
        mean_soc: soc_sum / steps.len() as f64,
        final_soc: steps.last().map_or(0.0, |s| s.soc),
        critical_steps,
        charged_kwh: charged_wh / 1000.0,
        discharged_kwh: discharged_wh / 1000.0,
        efficiency: if charged_wh > 0.0 {
            discharged_wh / charged_wh
        } else {
            0.0
        },
    }
}

pub fn simulate(
    generation_w: &[f64],
    consumption_w: &[f64],
    capacity_wh: f64,
    settings: &SimulationSettings,
) -> Result<SocSimulation> {
    SocSimulator::new(capacity_wh, *settings)?.run(generation_w, consumption_w)
}

pub fn simulate_repeated(
    generation_day_w: &[f64],
    consumption_day_w: &[f64],
    days: usize,
    capacity_wh: f64,
    settings: &SimulationSettings,
) -> Result<SocSimulation> {
    SocSimulator::new(capacity_wh, *settings)?.run_repeated(
        generation_day_w,
        consumption_day_w,
        days,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_discharge_clamps_to_floor() {
        let sim = simulate(&[0.0], &[2000.0], 1000.0, &SimulationSettings::default()).unwrap();
        let step = sim.steps[0];
        assert!((step.discharged_wh - 2222.222).abs() < 1e-2);
        assert!((step.stored_wh - 200.0).abs() < 1e-9);
        assert!((step.soc - 0.2).abs() < 1e-9);
        assert_eq!(sim.summary.critical_steps, 1);
    }

    #[test]
    fn test_overcharge_clamps_to_capacity() {
        let settings = SimulationSettings {
            initial_soc: 0.5,
            ..Default::default()
        };
        let sim = simulate(&[5000.0], &[0.0], 1000.0, &settings).unwrap();
        assert!((sim.steps[0].charged_wh - 4500.0).abs() < 1e-9);
        assert!((sim.steps[0].soc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficiencies_applied_per_direction() {
        let settings = SimulationSettings {
            initial_soc: 0.5,
            charge_efficiency: 0.8,
            discharge_efficiency: 0.5,
            ..Default::default()
        };
        let sim = simulate(&[100.0, 0.0], &[0.0, 100.0], 10_000.0, &settings).unwrap();
        assert!((sim.steps[0].stored_wh - 5080.0).abs() < 1e-9);
        assert!((sim.steps[1].stored_wh - 4880.0).abs() < 1e-9);
        assert!((sim.summary.charged_kwh - 0.08).abs() < 1e-12);
        assert!((sim.summary.discharged_kwh - 0.2).abs() < 1e-12);
        assert!((sim.summary.efficiency - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_timestep_scales_energy() {
        let settings = SimulationSettings {
            initial_soc: 0.5,
            charge_efficiency: 1.0,
            timestep_hours: 0.5,
            ..Default::default()
        };
        let sim = simulate(&[200.0], &[0.0], 1000.0, &settings).unwrap();
        assert!((sim.steps[0].stored_wh - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_soc_bounded_under_extreme_imbalance() {
        let generation: Vec<f64> = (0..200)
            .map(|i| if i % 7 < 3 { 1.0e6 } else { 0.0 })
            .collect();
        let consumption: Vec<f64> = (0..200)
            .map(|i| if i % 5 < 2 { 5.0e5 } else { 10.0 })
            .collect();
        let settings = SimulationSettings::default();

        let sim = simulate(&generation, &consumption, 2400.0, &settings).unwrap();
        for step in &sim.steps {
            assert!(step.soc >= settings.min_soc - 1e-12 && step.soc <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_no_charge_gives_zero_efficiency() {
        let sim = simulate(&[0.0; 3], &[10.0; 3], 1000.0, &SimulationSettings::default()).unwrap();
        assert_eq!(sim.summary.efficiency, 0.0);
        assert_eq!(sim.summary.charged_kwh, 0.0);
    }

    #[test]
    fn test_summary_statistics() {
        let settings = SimulationSettings {
            charge_efficiency: 1.0,
            discharge_efficiency: 1.0,
            ..Default::default()
        };
        let sim = simulate(&[0.0, 0.0, 400.0], &[300.0, 300.0, 0.0], 1000.0, &settings).unwrap();
        let socs: Vec<f64> = sim.steps.iter().map(|s| s.soc).collect();
        assert!((socs[0] - 0.7).abs() < 1e-9);
        assert!((socs[1] - 0.4).abs() < 1e-9);
        assert!((socs[2] - 0.8).abs() < 1e-9);

        let summary = sim.summary;
        assert!((summary.min_soc - 0.4).abs() < 1e-9);
        assert!((summary.max_soc - 0.8).abs() < 1e-9);
        assert!((summary.mean_soc - (0.7 + 0.4 + 0.8) / 3.0).abs() < 1e-9);
        assert!((summary.final_soc - 0.8).abs() < 1e-9);
        assert_eq!(summary.critical_steps, 0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let settings = SimulationSettings::default();
        assert!(matches!(
            simulate(&[0.0, 1.0], &[0.0], 1000.0, &settings),
            Err(OffgridError::LengthMismatch {
                generation: 2,
                consumption: 1
            })
        ));
        assert!(matches!(
            simulate(&[], &[], 1000.0, &settings),
            Err(OffgridError::EmptySeries(_))
        ));
        assert!(simulate(&[0.0], &[0.0], 0.0, &settings).is_err());

        let inverted = SimulationSettings {
            initial_soc: 0.1,
            min_soc: 0.2,
            ..Default::default()
        };
        assert!(simulate(&[0.0], &[0.0], 1000.0, &inverted).is_err());

        let zero_discharge_efficiency = SimulationSettings {
            discharge_efficiency: 0.0,
            ..Default::default()
        };
        assert!(simulate(&[0.0], &[0.0], 1000.0, &zero_discharge_efficiency).is_err());
    }

    #[test]
    fn test_repeated_days_carry_state() {
        let settings = SimulationSettings {
            charge_efficiency: 1.0,
            discharge_efficiency: 1.0,
            ..Default::default()
        };
        let single = simulate(&[0.0, 0.0], &[100.0, 100.0], 1000.0, &settings).unwrap();
        let repeated =
            simulate_repeated(&[0.0, 0.0], &[100.0, 100.0], 3, 1000.0, &settings).unwrap();

        assert_eq!(repeated.steps.len(), 6);
        assert_eq!(repeated.steps[..2], single.steps[..]);
        assert!((repeated.summary.final_soc - 0.4).abs() < 1e-9);
        assert!(simulate_repeated(&[0.0], &[0.0], 0, 1000.0, &settings).is_err());
    }
}
