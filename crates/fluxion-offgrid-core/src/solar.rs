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

//! Solar geometry and the simplified clear-sky irradiance model.
//!
//! All functions take the day of year (1-based) and a fractional local solar
//! hour. Angles in the public API are degrees; everything internal is radians.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::fractional_hour;

/// Below this zenith cosine the tilted transposition factor is forced to zero
const MIN_COS_ZENITH_FOR_TRANSPOSITION: f64 = 0.01;
/// Upper bound of the tilted transposition factor
pub const MAX_TRANSPOSITION_FACTOR: f64 = 3.0;

/// Earth-Sun distance correction factor (4-term Fourier approximation)
#[must_use]
pub fn eccentricity_factor(day_of_year: u32) -> f64 {
    let b = f64::from(day_of_year.saturating_sub(1)) * 2.0 * PI / 365.0;
    1.000110 + 0.034221 * b.cos() + 0.001280 * b.sin() + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin()
}

/// Solar declination in radians (Cooper's equation)
#[must_use]
pub fn declination_rad(day_of_year: u32) -> f64 {
    let angle_deg = (284.0 + f64::from(day_of_year)) * 360.0 / 365.0;
    (23.45 * angle_deg.to_radians().sin()).to_radians()
}

/// Hour angle in radians, zero at solar noon
#[must_use]
pub fn hour_angle_rad(hour: f64) -> f64 {
    (15.0 * (hour - 12.0)).to_radians()
}

/// Cosine of the solar zenith angle, floored at zero when the sun is down
#[must_use]
pub fn cos_zenith(latitude_deg: f64, day_of_year: u32, hour: f64) -> f64 {
    let lat = latitude_deg.to_radians();
    let decl = declination_rad(day_of_year);
    let cos_z = lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle_rad(hour).cos();
    cos_z.max(0.0)
}

/// Parameters of the clear-sky horizontal irradiance approximation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearSkyModel {
    /// Solar constant (W/m²)
    #[serde(default = "default_solar_constant")]
    pub solar_constant_w_m2: f64,

    /// Fixed atmospheric transmittance
    #[serde(default = "default_transmittance")]
    pub transmittance: f64,

    /// Coefficient k of the air-mass term exp(-k * AM)
    #[serde(default = "default_air_mass_coefficient")]
    pub air_mass_coefficient: f64,
}

fn default_solar_constant() -> f64 {
    1367.0
}

fn default_transmittance() -> f64 {
    0.75
}

fn default_air_mass_coefficient() -> f64 {
    0.0001
}

impl Default for ClearSkyModel {
    fn default() -> Self {
        Self {
            solar_constant_w_m2: default_solar_constant(),
            transmittance: default_transmittance(),
            air_mass_coefficient: default_air_mass_coefficient(),
        }
    }
}

impl ClearSkyModel {
    /// Theoretical global horizontal irradiance (W/m²).
    ///
    /// Exactly zero when the sun is at or below the horizon.
    #[must_use]
    pub fn irradiance(&self, latitude_deg: f64, day_of_year: u32, hour: f64) -> f64 {
        let cos_z = cos_zenith(latitude_deg, day_of_year, hour);
        if cos_z <= 0.0 {
            return 0.0;
        }
        let extraterrestrial = self.solar_constant_w_m2 * eccentricity_factor(day_of_year) * cos_z;
        let air_mass = 1.0 / cos_z;
        (extraterrestrial * self.transmittance * (-self.air_mass_coefficient * air_mass).exp())
            .max(0.0)
    }

    #[must_use]
    pub fn irradiance_at(&self, latitude_deg: f64, timestamp: &NaiveDateTime) -> f64 {
        self.irradiance(
            latitude_deg,
            timestamp.ordinal(),
            fractional_hour(timestamp),
        )
    }

    /// Same-length series of theoretical irradiance for the given timestamps
    #[must_use]
    pub fn series(&self, latitude_deg: f64, timestamps: &[NaiveDateTime]) -> Vec<f64> {
        timestamps
            .iter()
            .map(|ts| self.irradiance_at(latitude_deg, ts))
            .collect()
    }
}

/// A fixed panel plane tilted towards the equator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltedPlane {
    pub latitude_deg: f64,
    pub tilt_deg: f64,
}

impl TiltedPlane {
    #[must_use]
    pub fn new(latitude_deg: f64, tilt_deg: f64) -> Self {
        Self {
            latitude_deg,
            tilt_deg,
        }
    }

    /// Cosine of the incidence angle on the plane, clamped to [0, 1].
    ///
    /// An equator-facing plane sees the sun as a horizontal plane would at
    /// latitude shifted by the tilt towards the equator.
    #[must_use]
    pub fn cos_incidence(&self, day_of_year: u32, hour: f64) -> f64 {
        let shifted_lat = if self.latitude_deg < 0.0 {
            self.latitude_deg + self.tilt_deg
        } else {
            self.latitude_deg - self.tilt_deg
        }
        .to_radians();
        let decl = declination_rad(day_of_year);
        let cos_theta = shifted_lat.sin() * decl.sin()
            + shifted_lat.cos() * decl.cos() * hour_angle_rad(hour).cos();
        cos_theta.clamp(0.0, 1.0)
    }

    /// Ratio of plane-of-array to horizontal beam irradiance, in [0, 3]
    #[must_use]
    pub fn transposition_factor(&self, day_of_year: u32, hour: f64) -> f64 {
        let cos_z = cos_zenith(self.latitude_deg, day_of_year, hour);
        if cos_z <= MIN_COS_ZENITH_FOR_TRANSPOSITION {
            return 0.0;
        }
        (self.cos_incidence(day_of_year, hour) / cos_z).clamp(0.0, MAX_TRANSPOSITION_FACTOR)
    }

    /// Transpose an observed horizontal irradiance onto the plane
    #[must_use]
    pub fn tilted_irradiance(&self, ghi_w_m2: f64, timestamp: &NaiveDateTime) -> f64 {
        ghi_w_m2 * self.transposition_factor(timestamp.ordinal(), fractional_hour(timestamp))
    }
}

/// Meteorological season, resolved against the site hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    pub const ALL: [Self; 4] = [Self::Summer, Self::Autumn, Self::Winter, Self::Spring];

    #[must_use]
    pub fn from_month(month: u32, latitude_deg: f64) -> Self {
        // Southern calendar; the northern hemisphere is offset by six months
        let month = if latitude_deg < 0.0 {
            month
        } else {
            (month + 5) % 12 + 1
        };
        match month {
            3..=5 => Self::Autumn,
            6..=8 => Self::Winter,
            9..=11 => Self::Spring,
            _ => Self::Summer,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
            Self::Spring => "Spring",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANTOFAGASTA_LAT: f64 = -23.14;

    #[test]
    fn test_eccentricity_bounds() {
        for day in 1..=366 {
            let e0 = eccentricity_factor(day);
            assert!(e0 > 0.96 && e0 < 1.04, "day {day}: {e0}");
        }
        // Perihelion in early January, aphelion in early July
        assert!(eccentricity_factor(3) > eccentricity_factor(185));
    }

    #[test]
    fn test_declination_at_solstices() {
        assert!((declination_rad(172).to_degrees() - 23.45).abs() < 0.1);
        assert!((declination_rad(355).to_degrees() + 23.45).abs() < 0.1);
    }

    #[test]
    fn test_noon_at_southern_solstice_is_near_zenith() {
        let cos_z = cos_zenith(ANTOFAGASTA_LAT, 355, 12.0);
        assert!(cos_z > 0.999, "cos_z = {cos_z}");

        let ghi = ClearSkyModel::default().irradiance(ANTOFAGASTA_LAT, 355, 12.0);
        assert!(ghi > 1000.0 && ghi < 1100.0, "ghi = {ghi}");
    }

    #[test]
    fn test_clear_sky_zero_at_night() {
        let model = ClearSkyModel::default();
        for hour in [0.0, 2.5, 4.0, 21.0, 23.5] {
            assert!(cos_zenith(ANTOFAGASTA_LAT, 172, hour) <= 0.0);
            assert_eq!(model.irradiance(ANTOFAGASTA_LAT, 172, hour), 0.0);
        }
    }

    #[test]
    fn test_clear_sky_non_negative_everywhere() {
        let model = ClearSkyModel::default();
        for lat in [-80.0, -23.14, 0.0, 45.0, 80.0] {
            for day in (1..=365).step_by(7) {
                for step in 0..48 {
                    let hour = f64::from(step) * 0.5;
                    let ghi = model.irradiance(lat, day, hour);
                    assert!(ghi >= 0.0);
                    if cos_zenith(lat, day, hour) <= 0.0 {
                        assert_eq!(ghi, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_series_matches_length() {
        let start = chrono::NaiveDate::from_ymd_opt(2010, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps: Vec<_> = (0..24).map(|h| start + chrono::Duration::hours(h)).collect();
        let series = ClearSkyModel::default().series(ANTOFAGASTA_LAT, &timestamps);
        assert_eq!(series.len(), 24);
        assert_eq!(series[0], 0.0);
        assert!(series[12] > 900.0);
    }

    #[test]
    fn test_tilt_boosts_winter_noon() {
        let plane = TiltedPlane::new(ANTOFAGASTA_LAT, 20.0);
        let factor = plane.transposition_factor(172, 12.0);
        assert!(factor > 1.1 && factor <= MAX_TRANSPOSITION_FACTOR, "factor = {factor}");
    }

    #[test]
    fn test_zero_tilt_is_identity_in_daylight() {
        let plane = TiltedPlane::new(ANTOFAGASTA_LAT, 0.0);
        let factor = plane.transposition_factor(80, 10.0);
        assert!((factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_transposition_factor_bounded() {
        let plane = TiltedPlane::new(ANTOFAGASTA_LAT, 35.0);
        for day in (1..=365).step_by(5) {
            for step in 0..96 {
                let hour = f64::from(step) * 0.25;
                let factor = plane.transposition_factor(day, hour);
                assert!((0.0..=MAX_TRANSPOSITION_FACTOR).contains(&factor));
            }
        }
        assert_eq!(plane.transposition_factor(172, 0.0), 0.0);
    }

    #[test]
    fn test_seasons_by_hemisphere() {
        assert_eq!(Season::from_month(1, ANTOFAGASTA_LAT), Season::Summer);
        assert_eq!(Season::from_month(7, ANTOFAGASTA_LAT), Season::Winter);
        assert_eq!(Season::from_month(4, ANTOFAGASTA_LAT), Season::Autumn);
        assert_eq!(Season::from_month(10, ANTOFAGASTA_LAT), Season::Spring);

        assert_eq!(Season::from_month(1, 50.0), Season::Winter);
        assert_eq!(Season::from_month(7, 50.0), Season::Summer);
        assert_eq!(Season::from_month(4, 50.0), Season::Spring);
        assert_eq!(Season::from_month(10, 50.0), Season::Autumn);
        assert_eq!(Season::from_month(12, 50.0), Season::Winter);
    }
}
