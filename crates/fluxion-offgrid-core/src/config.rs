// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! TOML configuration for an off-grid analysis.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::autonomy::EvaluationThresholds;
use crate::battery::BatteryConfig;
use crate::clearness::ClassifierThresholds;
use crate::error::{OffgridError, Result, ensure_positive};
use crate::pv::PvArray;
use crate::soc::SimulationSettings;
use crate::solar::{ClearSkyModel, TiltedPlane};

/// System voltages a bank is conventionally built for
pub const CONVENTIONAL_SYSTEM_VOLTAGES: [f64; 3] = [12.0, 24.0, 48.0];

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Autonomy days compared against each other
    #[serde(default = "default_autonomy_days")]
    pub autonomy_days: Vec<u32>,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub clear_sky: ClearSkyModel,

    #[serde(default)]
    pub classifier: ClassifierThresholds,

    #[serde(default)]
    pub battery: BatteryConfig,

    #[serde(default)]
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub evaluation: EvaluationThresholds,

    /// Named PV array variants
    #[serde(default = "default_pv_arrays")]
    pub pv_arrays: Vec<PvArray>,
}

/// Location of the installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Decimal degrees, negative south of the equator
    #[serde(default = "default_latitude")]
    pub latitude_deg: f64,

    /// Panel tilt used for the tilted-plane irradiance (degrees)
    #[serde(default = "default_tilt")]
    pub tilt_deg: f64,
}

fn default_site_name() -> String {
    "Antofagasta".to_owned()
}

fn default_latitude() -> f64 {
    -23.14
}

fn default_tilt() -> f64 {
    20.0
}

fn default_autonomy_days() -> Vec<u32> {
    vec![1, 2, 3, 5, 7]
}

fn default_pv_arrays() -> Vec<PvArray> {
    vec![PvArray::default()]
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            latitude_deg: default_latitude(),
            tilt_deg: default_tilt(),
        }
    }
}

impl SiteConfig {
    #[must_use]
    pub fn plane(&self) -> TiltedPlane {
        TiltedPlane::new(self.latitude_deg, self.tilt_deg)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            autonomy_days: default_autonomy_days(),
            site: SiteConfig::default(),
            clear_sky: ClearSkyModel::default(),
            classifier: ClassifierThresholds::default(),
            battery: BatteryConfig::default(),
            simulation: SimulationSettings::default(),
            evaluation: EvaluationThresholds::default(),
            pv_arrays: default_pv_arrays(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| OffgridError::Config(e.to_string()))
    }

    /// Look up a PV array variant by name
    #[must_use]
    pub fn pv_array(&self, name: &str) -> Option<&PvArray> {
        self.pv_arrays.iter().find(|a| a.name == name)
    }

    /// Check hard limits, returning advisories for values that are valid
    /// but unusual for an off-grid bank. Advisories are also logged.
    pub fn validate(&self) -> Result<Vec<String>> {
        if !(-90.0..=90.0).contains(&self.site.latitude_deg) {
            return Err(OffgridError::InvalidParameter {
                name: "latitude_deg",
                value: self.site.latitude_deg,
                reason: "must be within [-90, 90]",
            });
        }
        if !(0.0..=90.0).contains(&self.site.tilt_deg) {
            return Err(OffgridError::InvalidParameter {
                name: "tilt_deg",
                value: self.site.tilt_deg,
                reason: "must be within [0, 90]",
            });
        }
        ensure_positive("solar_constant_w_m2", self.clear_sky.solar_constant_w_m2)?;
        ensure_positive("transmittance", self.clear_sky.transmittance)?;
        self.classifier.validate()?;
        self.battery.validate()?;
        self.simulation.validate()?;
        if self.evaluation.good_critical_steps > self.evaluation.max_critical_steps {
            return Err(OffgridError::Config(
                "evaluation.good_critical_steps exceeds max_critical_steps".to_owned(),
            ));
        }
        if self.autonomy_days.is_empty() || self.autonomy_days.contains(&0) {
            return Err(OffgridError::Config(
                "autonomy_days must be a non-empty list of days >= 1".to_owned(),
            ));
        }
        for array in &self.pv_arrays {
            array.validate()?;
        }

        let mut warnings = Vec::new();
        let voltage = self.battery.system_voltage_v;
        if !CONVENTIONAL_SYSTEM_VOLTAGES.contains(&voltage) {
            warnings.push(format!(
                "system voltage {voltage} V is not one of 12, 24 or 48 V"
            ));
        }
        let dod = self.battery.depth_of_discharge;
        if !(0.5..=0.8).contains(&dod) {
            warnings.push(format!("depth of discharge {dod} is outside the usual 0.5-0.8"));
        }
        for (name, value) in [
            ("charge efficiency", self.simulation.charge_efficiency),
            ("discharge efficiency", self.simulation.discharge_efficiency),
        ] {
            if value < 0.8 {
                warnings.push(format!("{name} {value} is below 0.8"));
            }
        }
        if self.simulation.critical_soc < self.simulation.min_soc {
            warnings.push(format!(
                "critical SOC {} is below the minimum SOC {}, no step can be critical",
                self.simulation.critical_soc, self.simulation.min_soc
            ));
        }

        for warning in &warnings {
            warn!("Config: {}", warning);
        }
        Ok(warnings)
    }

    /// Example configuration as TOML
    #[must_use]
    pub fn example_toml() -> String {
        r#"# FluxION Off-grid - Analysis Configuration Example

autonomy_days = [1, 2, 3, 5, 7]

[site]
name = "Antofagasta"
latitude_deg = -23.14     # negative south of the equator
tilt_deg = 20.0

[clear_sky]
solar_constant_w_m2 = 1367.0
transmittance = 0.75
air_mass_coefficient = 0.0001

[classifier]
clear = 0.7               # daily mean index >= clear -> Clear
partly_cloudy = 0.4       # >= partly_cloudy -> Partly cloudy, else Very cloudy
max_index = 1.2

[battery]
system_voltage_v = 48.0   # 12, 24 or 48
depth_of_discharge = 0.8
unit_voltage_v = 12.0
unit_capacity_ah = 200.0
count_rounding = "up"     # up or nearest

[simulation]
initial_soc = 1.0
min_soc = 0.2
charge_efficiency = 0.9
discharge_efficiency = 0.9
critical_soc = 0.3
timestep_hours = 1.0

[evaluation]
max_critical_steps = 6
good_critical_steps = 2
optimal_efficiency = 0.85
min_efficiency = 0.70

[[pv_arrays]]
name = "base"
module_power_wp = 300.0
module_efficiency = 0.18
module_area_m2 = 1.6
module_count = 10
losses = 0.04
tilt_deg = 20.0

[[pv_arrays]]
name = "steep"
module_power_wp = 300.0
module_efficiency = 0.18
module_area_m2 = 1.6
module_count = 10
losses = 0.04
tilt_deg = 35.0
"#
        .to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!((config.site.latitude_deg + 23.14).abs() < 1e-9);
        assert_eq!(config.autonomy_days, vec![1, 2, 3, 5, 7]);
        assert_eq!(config.pv_arrays.len(), 1);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_example_toml_parses() {
        let config = AnalysisConfig::from_toml_str(&AnalysisConfig::example_toml()).unwrap();
        assert_eq!(config.pv_arrays.len(), 2);
        assert!((config.pv_array("steep").unwrap().tilt_deg - 35.0).abs() < 1e-9);
        assert!(config.pv_array("missing").is_none());
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r"
[battery]
system_voltage_v = 24.0
",
        )
        .unwrap();
        assert!((config.battery.system_voltage_v - 24.0).abs() < 1e-9);
        assert!((config.battery.depth_of_discharge - 0.8).abs() < 1e-9);
        assert!((config.simulation.min_soc - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_validate_warnings() {
        let mut config = AnalysisConfig::default();
        config.battery.system_voltage_v = 36.0;
        config.battery.depth_of_discharge = 0.95;
        config.simulation.charge_efficiency = 0.75;
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("36"));
    }

    #[test]
    fn test_validate_hard_errors() {
        let mut config = AnalysisConfig::default();
        config.battery.depth_of_discharge = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.autonomy_days = vec![0, 2];
        assert!(matches!(config.validate(), Err(OffgridError::Config(_))));

        let mut config = AnalysisConfig::default();
        config.site.latitude_deg = -100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("[battery\nsystem_voltage_v = 48"),
            Err(OffgridError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut config = AnalysisConfig::default();
        config.site.name = "Calama".to_owned();
        file.write_all(config.to_toml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.site.name, "Calama");
        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/offgrid.toml"),
            Err(OffgridError::Io(_))
        ));
    }
}
