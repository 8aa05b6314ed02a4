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

//! Battery bank sizing from daily energy and autonomy days.

use serde::{Deserialize, Serialize};

use crate::error::{OffgridError, Result, ensure_positive, ensure_unit_open_closed};

/// Slack for float noise so exact quotients (48 / 12) are not bumped up
const ROUNDING_EPSILON: f64 = 1e-9;

/// Nameplate of a single battery unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryUnit {
    #[serde(default = "default_unit_voltage")]
    pub voltage_v: f64,

    #[serde(default = "default_unit_capacity")]
    pub capacity_ah: f64,
}

fn default_unit_voltage() -> f64 {
    12.0
}

fn default_unit_capacity() -> f64 {
    200.0
}

impl Default for BatteryUnit {
    fn default() -> Self {
        Self {
            voltage_v: default_unit_voltage(),
            capacity_ah: default_unit_capacity(),
        }
    }
}

impl BatteryUnit {
    #[must_use]
    pub fn energy_kwh(&self) -> f64 {
        self.voltage_v * self.capacity_ah / 1000.0
    }
}

/// How fractional series/parallel counts become whole batteries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountRounding {
    /// Ceiling; the bank is never smaller than required
    #[default]
    Up,
    /// Nearest integer, may undersize by up to half a unit
    Nearest,
}

impl CountRounding {
    fn apply(self, value: f64) -> u32 {
        let rounded = match self {
            Self::Up => (value - ROUNDING_EPSILON).ceil(),
            Self::Nearest => value.round(),
        };
        rounded.max(0.0) as u32
    }
}

/// Bank-level battery configuration (`[battery]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    #[serde(default = "default_system_voltage")]
    pub system_voltage_v: f64,

    #[serde(default = "default_depth_of_discharge")]
    pub depth_of_discharge: f64,

    #[serde(default = "default_unit_voltage")]
    pub unit_voltage_v: f64,

    #[serde(default = "default_unit_capacity")]
    pub unit_capacity_ah: f64,

    #[serde(default)]
    pub count_rounding: CountRounding,
}

fn default_system_voltage() -> f64 {
    48.0
}

fn default_depth_of_discharge() -> f64 {
    0.8
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            system_voltage_v: default_system_voltage(),
            depth_of_discharge: default_depth_of_discharge(),
            unit_voltage_v: default_unit_voltage(),
            unit_capacity_ah: default_unit_capacity(),
            count_rounding: CountRounding::default(),
        }
    }
}

impl BatteryConfig {
    #[must_use]
    pub fn unit(&self) -> BatteryUnit {
        BatteryUnit {
            voltage_v: self.unit_voltage_v,
            capacity_ah: self.unit_capacity_ah,
        }
    }

    #[must_use]
    pub fn sizing_input(&self, daily_energy_kwh: f64, autonomy_days: u32) -> BankSizingInput {
        BankSizingInput {
            daily_energy_kwh,
            autonomy_days,
            system_voltage_v: self.system_voltage_v,
            depth_of_discharge: self.depth_of_discharge,
            unit: self.unit(),
            rounding: self.count_rounding,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("system_voltage_v", self.system_voltage_v)?;
        ensure_unit_open_closed("depth_of_discharge", self.depth_of_discharge)?;
        ensure_positive("unit_voltage_v", self.unit_voltage_v)?;
        ensure_positive("unit_capacity_ah", self.unit_capacity_ah)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankSizingInput {
    pub daily_energy_kwh: f64,
    pub autonomy_days: u32,
    pub system_voltage_v: f64,
    pub depth_of_discharge: f64,
    pub unit: BatteryUnit,
    pub rounding: CountRounding,
}

/// Result of sizing a bank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankSizing {
    /// Usable energy the bank must deliver: daily energy x autonomy days (kWh)
    pub required_energy_kwh: f64,

    /// Charge capacity at system voltage after DoD derating (Ah)
    pub required_ah: f64,

    pub series: u32,
    pub parallel: u32,
    pub total_batteries: u32,

    /// Nameplate energy of the installed units (kWh)
    pub realized_capacity_kwh: f64,
}

impl BankSizing {
    #[must_use]
    pub fn realized_capacity_wh(&self) -> f64 {
        self.realized_capacity_kwh * 1000.0
    }
}

/// Size a bank: required Ah = E[kWh] x 1000 x days / (V x DoD).
///
/// Zero energy is accepted and yields an empty bank. `CountRounding::Nearest`
/// is the literal `round()` of the parallel count; the default `Up` never undersizes.
pub fn size_bank(input: &BankSizingInput) -> Result<BankSizing> {
    if !(input.daily_energy_kwh >= 0.0 && input.daily_energy_kwh.is_finite()) {
        return Err(OffgridError::InvalidParameter {
            name: "daily_energy_kwh",
            value: input.daily_energy_kwh,
            reason: "must be a finite value >= 0",
        });
    }
    if input.autonomy_days == 0 {
        return Err(OffgridError::InvalidParameter {
            name: "autonomy_days",
            value: 0.0,
            reason: "must be at least 1",
        });
    }
    ensure_positive("system_voltage_v", input.system_voltage_v)?;
    ensure_unit_open_closed("depth_of_discharge", input.depth_of_discharge)?;
    ensure_positive("unit_voltage_v", input.unit.voltage_v)?;
    ensure_positive("unit_capacity_ah", input.unit.capacity_ah)?;

    let required_energy_kwh = input.daily_energy_kwh * f64::from(input.autonomy_days);
    let required_ah =
        required_energy_kwh * 1000.0 / (input.system_voltage_v * input.depth_of_discharge);

    let series = input
        .rounding
        .apply(input.system_voltage_v / input.unit.voltage_v);
    let parallel = input.rounding.apply(required_ah / input.unit.capacity_ah);
    let total_batteries = series * parallel;

    Ok(BankSizing {
        required_energy_kwh,
        required_ah,
        series,
        parallel,
        total_batteries,
        realized_capacity_kwh: f64::from(total_batteries) * input.unit.energy_kwh(),
    })
}

/// Nominal capacity able to cover a daily deficit: deficit / (DoD x efficiency)
pub fn estimate_capacity_kwh(
    deficit_kwh: f64,
    depth_of_discharge: f64,
    round_trip_efficiency: f64,
) -> Result<f64> {
    if !(deficit_kwh >= 0.0 && deficit_kwh.is_finite()) {
        return Err(OffgridError::InvalidParameter {
            name: "deficit_kwh",
            value: deficit_kwh,
            reason: "must be a finite value >= 0",
        });
    }
    ensure_unit_open_closed("depth_of_discharge", depth_of_discharge)?;
    ensure_unit_open_closed("round_trip_efficiency", round_trip_efficiency)?;
    Ok(deficit_kwh / (depth_of_discharge * round_trip_efficiency))
}
