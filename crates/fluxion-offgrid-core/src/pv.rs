// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Linear PV array model: plane-of-array irradiance to DC power.

use serde::{Deserialize, Serialize};

use crate::error::{OffgridError, Result, ensure_fraction, ensure_positive, ensure_unit_open_closed};

/// A named PV array variant (`[[pv_arrays]]` entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvArray {
    pub name: String,

    /// Module nameplate power (Wp)
    #[serde(default = "default_module_power")]
    pub module_power_wp: f64,

    #[serde(default = "default_module_efficiency")]
    pub module_efficiency: f64,

    /// Area of one module (m²)
    #[serde(default = "default_module_area")]
    pub module_area_m2: f64,

    #[serde(default = "default_module_count")]
    pub module_count: u32,

    /// System losses as a fraction (wiring, soiling, conversion)
    #[serde(default = "default_losses")]
    pub losses: f64,

    /// Panel tilt towards the equator (degrees)
    #[serde(default = "default_tilt")]
    pub tilt_deg: f64,
}

fn default_module_power() -> f64 {
    300.0
}

fn default_module_efficiency() -> f64 {
    0.18
}

fn default_module_area() -> f64 {
    1.6
}

fn default_module_count() -> u32 {
    10
}

fn default_losses() -> f64 {
    0.04
}

fn default_tilt() -> f64 {
    20.0
}

impl Default for PvArray {
    fn default() -> Self {
        Self {
            name: "base".to_owned(),
            module_power_wp: default_module_power(),
            module_efficiency: default_module_efficiency(),
            module_area_m2: default_module_area(),
            module_count: default_module_count(),
            losses: default_losses(),
            tilt_deg: default_tilt(),
        }
    }
}

impl PvArray {
    /// Array built from a total installed power; the module count is
    /// `total / module` rounded to the nearest whole module.
    pub fn from_capacity(
        name: impl Into<String>,
        total_wp: f64,
        module_power_wp: f64,
        module_efficiency: f64,
        module_area_m2: f64,
        losses: f64,
        tilt_deg: f64,
    ) -> Result<Self> {
        ensure_positive("total_wp", total_wp)?;
        ensure_positive("module_power_wp", module_power_wp)?;
        let module_count = (total_wp / module_power_wp).round().max(1.0) as u32;
        let array = Self {
            name: name.into(),
            module_power_wp,
            module_efficiency,
            module_area_m2,
            module_count,
            losses,
            tilt_deg,
        };
        array.validate()?;
        Ok(array)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("module_power_wp", self.module_power_wp)?;
        ensure_unit_open_closed("module_efficiency", self.module_efficiency)?;
        ensure_positive("module_area_m2", self.module_area_m2)?;
        if self.module_count == 0 {
            return Err(OffgridError::InvalidParameter {
                name: "module_count",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        ensure_fraction("losses", self.losses)?;
        if !(0.0..=90.0).contains(&self.tilt_deg) {
            return Err(OffgridError::InvalidParameter {
                name: "tilt_deg",
                value: self.tilt_deg,
                reason: "must be within [0, 90]",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn peak_power_wp(&self) -> f64 {
        self.module_power_wp * f64::from(self.module_count)
    }

    #[must_use]
    pub fn total_area_m2(&self) -> f64 {
        self.module_area_m2 * f64::from(self.module_count)
    }

    /// DC output for a plane-of-array irradiance (W)
    #[must_use]
    pub fn power_w(&self, irradiance_w_m2: f64) -> f64 {
        irradiance_w_m2.max(0.0) * self.total_area_m2() * self.module_efficiency * (1.0 - self.losses)
    }

    #[must_use]
    pub fn power_series(&self, irradiance_w_m2: &[f64]) -> Vec<f64> {
        irradiance_w_m2.iter().map(|&g| self.power_w(g)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_array_power() {
        let array = PvArray::default();
        assert!(array.validate().is_ok());
        assert!((array.peak_power_wp() - 3000.0).abs() < 1e-9);
        // 1000 W/m² x 16 m² x 0.18 x 0.96
        assert!((array.power_w(1000.0) - 2764.8).abs() < 1e-6);
        assert_eq!(array.power_w(0.0), 0.0);
    }

    #[test]
    fn test_from_capacity() {
        let array = PvArray::from_capacity("roof", 3000.0, 300.0, 0.18, 1.6, 0.04, 20.0).unwrap();
        assert_eq!(array.module_count, 10);
        assert_eq!(array.name, "roof");

        let small = PvArray::from_capacity("tiny", 100.0, 450.0, 0.2, 2.0, 0.0, 10.0).unwrap();
        assert_eq!(small.module_count, 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(PvArray::from_capacity("x", 3000.0, 0.0, 0.18, 1.6, 0.04, 20.0).is_err());
        assert!(PvArray::from_capacity("x", 3000.0, 300.0, 1.5, 1.6, 0.04, 20.0).is_err());
        assert!(PvArray::from_capacity("x", 3000.0, 300.0, 0.18, 1.6, 1.2, 20.0).is_err());
        assert!(PvArray::from_capacity("x", 3000.0, 300.0, 0.18, 1.6, 0.04, 95.0).is_err());
    }

    #[test]
    fn test_power_series() {
        let array = PvArray::default();
        let series = array.power_series(&[0.0, 500.0, 1000.0]);
        assert_eq!(series.len(), 3);
        assert!((series[2] - 2.0 * series[1]).abs() < 1e-9);
    }
}
