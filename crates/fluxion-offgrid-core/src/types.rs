// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{OffgridError, Result};

/// Hourly sample counts of a regular and a leap representative year
pub const HOURS_PER_YEAR: usize = 8760;
pub const HOURS_PER_LEAP_YEAR: usize = 8784;

/// One row of an annual irradiance dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrradianceSample {
    pub timestamp: NaiveDateTime,
    /// Global horizontal irradiance (W/m²)
    pub ghi_w_m2: f64,
    /// Irradiance on the tilted module plane, when the source provides it (W/m²)
    #[serde(default)]
    pub tilted_w_m2: Option<f64>,
    /// Ambient temperature (°C)
    #[serde(default)]
    pub temperature_c: Option<f64>,
}

impl IrradianceSample {
    #[must_use]
    pub fn new(timestamp: NaiveDateTime, ghi_w_m2: f64) -> Self {
        Self {
            timestamp,
            ghi_w_m2,
            tilted_w_m2: None,
            temperature_c: None,
        }
    }

    /// Fractional hour of day (14:30 -> 14.5)
    #[must_use]
    pub fn fractional_hour(&self) -> f64 {
        fractional_hour(&self.timestamp)
    }

    #[must_use]
    pub fn is_daylight(&self) -> bool {
        self.ghi_w_m2 > 0.0
    }
}

/// Fractional hour of day of a timestamp
#[must_use]
pub fn fractional_hour(timestamp: &NaiveDateTime) -> f64 {
    f64::from(timestamp.hour())
        + f64::from(timestamp.minute()) / 60.0
        + f64::from(timestamp.second()) / 3600.0
}

/// Ordering key that ignores the calendar year.
///
/// TMY files stitch months from different source years, so only month, day
/// and time of day are expected to increase.
fn representative_key(timestamp: &NaiveDateTime) -> (u32, u32, u32) {
    (
        timestamp.month(),
        timestamp.day(),
        timestamp.num_seconds_from_midnight(),
    )
}

/// An immutable annual irradiance series in chronological order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmyDataset {
    samples: Vec<IrradianceSample>,
    /// Key/value pairs from the source file preamble (site, coordinates, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TmyDataset {
    /// Build a dataset, rejecting empty input, negative irradiance and
    /// timestamps that go backwards within the representative year.
    pub fn new(samples: Vec<IrradianceSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(OffgridError::EmptySeries("irradiance samples"));
        }

        for (index, sample) in samples.iter().enumerate() {
            if !(sample.ghi_w_m2 >= 0.0) {
                return Err(OffgridError::InvalidParameter {
                    name: "ghi_w_m2",
                    value: sample.ghi_w_m2,
                    reason: "irradiance must be >= 0",
                });
            }
            if let Some(tilted) = sample.tilted_w_m2
                && !(tilted >= 0.0)
            {
                return Err(OffgridError::InvalidParameter {
                    name: "tilted_w_m2",
                    value: tilted,
                    reason: "irradiance must be >= 0",
                });
            }
            if index > 0
                && representative_key(&sample.timestamp)
                    < representative_key(&samples[index - 1].timestamp)
            {
                return Err(OffgridError::NonMonotonicTimestamps { index });
            }
        }

        let dataset = Self {
            samples,
            metadata: BTreeMap::new(),
        };

        if !dataset.is_full_year() {
            warn!(
                "Irradiance dataset has {} samples, expected {} or {} for an hourly year",
                dataset.len(),
                HOURS_PER_YEAR,
                HOURS_PER_LEAP_YEAR
            );
        }

        Ok(dataset)
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn samples(&self) -> &[IrradianceSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn is_full_year(&self) -> bool {
        matches!(self.samples.len(), HOURS_PER_YEAR | HOURS_PER_LEAP_YEAR)
    }

    #[must_use]
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    #[must_use]
    pub fn ghi(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ghi_w_m2).collect()
    }

    /// Samples falling on a calendar day of the representative year
    pub fn day(&self, month: u32, day: u32) -> impl Iterator<Item = &IrradianceSample> {
        self.samples
            .iter()
            .filter(move |s| s.timestamp.month() == month && s.timestamp.day() == day)
    }

    /// Temperature statistics over daylight samples, if temperature is present
    #[must_use]
    pub fn daylight_temperature(&self) -> Option<DaylightTemperature> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max: Option<(f64, NaiveDateTime)> = None;
        let mut min: Option<(f64, NaiveDateTime)> = None;

        for sample in self.samples.iter().filter(|s| s.is_daylight()) {
            let Some(temp) = sample.temperature_c else {
                continue;
            };
            count += 1;
            sum += temp;
            if max.is_none_or(|(m, _)| temp > m) {
                max = Some((temp, sample.timestamp));
            }
            if min.is_none_or(|(m, _)| temp < m) {
                min = Some((temp, sample.timestamp));
            }
        }

        let ((max_c, max_at), (min_c, min_at)) = max.zip(min)?;
        Some(DaylightTemperature {
            max_c,
            max_at,
            min_c,
            min_at,
            mean_c: sum / count as f64,
            daylight_hours: count,
        })
    }

    /// Statistics of the measured plane-of-array column, if the source has one.
    /// Samples are taken as hourly, so W/m² sums read directly as Wh/m².
    #[must_use]
    pub fn measured_tilted(&self) -> Option<MeasuredTilted> {
        let values: Vec<f64> = self.samples.iter().filter_map(|s| s.tilted_w_m2).collect();
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        Some(MeasuredTilted {
            present: values.len(),
            missing: self.samples.len() - values.len(),
            max_w_m2: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean_w_m2: sum / values.len() as f64,
            irradiation_kwh_m2: sum / 1000.0,
        })
    }
}

/// Ambient temperature during hours with sunlight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaylightTemperature {
    pub max_c: f64,
    pub max_at: NaiveDateTime,
    pub min_c: f64,
    pub min_at: NaiveDateTime,
    pub mean_c: f64,
    pub daylight_hours: usize,
}

/// Measured irradiance on the tilted plane as delivered by the data source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasuredTilted {
    pub present: usize,
    pub missing: usize,
    pub max_w_m2: f64,
    /// Mean over present samples, night hours included
    pub mean_w_m2: f64,
    /// Sum of present samples (kWh/m²); gaps contribute nothing
    pub irradiation_kwh_m2: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_fractional_hour() {
        let ts = NaiveDate::from_ymd_opt(2010, 6, 20)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert!((fractional_hour(&ts) - 14.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_empty_dataset() {
        assert!(matches!(
            TmyDataset::new(Vec::new()),
            Err(OffgridError::EmptySeries(_))
        ));
    }

    #[test]
    fn test_rejects_negative_irradiance() {
        let samples = vec![IrradianceSample::new(at(2010, 1, 1, 0), -1.0)];
        assert!(TmyDataset::new(samples).is_err());
    }

    #[test]
    fn test_accepts_mixed_source_years() {
        // January from 2005, February from 2011: still ordered within the TMY year
        let samples = vec![
            IrradianceSample::new(at(2005, 1, 31, 23), 0.0),
            IrradianceSample::new(at(2011, 2, 1, 0), 0.0),
        ];
        assert!(TmyDataset::new(samples).is_ok());
    }

    #[test]
    fn test_rejects_backwards_timestamps() {
        let samples = vec![
            IrradianceSample::new(at(2010, 3, 1, 12), 500.0),
            IrradianceSample::new(at(2010, 3, 1, 11), 400.0),
        ];
        assert!(matches!(
            TmyDataset::new(samples),
            Err(OffgridError::NonMonotonicTimestamps { index: 1 })
        ));
    }

    #[test]
    fn test_daylight_temperature_ignores_night() {
        let mut night = IrradianceSample::new(at(2010, 7, 1, 2), 0.0);
        night.temperature_c = Some(5.0);
        let mut noon = IrradianceSample::new(at(2010, 7, 1, 12), 600.0);
        noon.temperature_c = Some(18.0);
        let mut afternoon = IrradianceSample::new(at(2010, 7, 1, 15), 400.0);
        afternoon.temperature_c = Some(20.0);

        let dataset = TmyDataset::new(vec![night, noon, afternoon]).unwrap();
        let stats = dataset.daylight_temperature().unwrap();

        assert_eq!(stats.daylight_hours, 2);
        assert!((stats.max_c - 20.0).abs() < 1e-9);
        assert!((stats.min_c - 18.0).abs() < 1e-9);
        assert!((stats.mean_c - 19.0).abs() < 1e-9);
        assert_eq!(stats.min_at, at(2010, 7, 1, 12));
    }

    #[test]
    fn test_daylight_temperature_absent() {
        let dataset =
            TmyDataset::new(vec![IrradianceSample::new(at(2010, 7, 1, 12), 600.0)]).unwrap();
        assert!(dataset.daylight_temperature().is_none());
    }

    #[test]
    fn test_measured_tilted_counts_gaps() {
        let mut morning = IrradianceSample::new(at(2010, 7, 1, 9), 300.0);
        morning.tilted_w_m2 = Some(400.0);
        let noon = IrradianceSample::new(at(2010, 7, 1, 12), 600.0);
        let mut afternoon = IrradianceSample::new(at(2010, 7, 1, 15), 500.0);
        afternoon.tilted_w_m2 = Some(800.0);

        let dataset = TmyDataset::new(vec![morning, noon, afternoon]).unwrap();
        let stats = dataset.measured_tilted().unwrap();

        assert_eq!(stats.present, 2);
        assert_eq!(stats.missing, 1);
        assert!((stats.max_w_m2 - 800.0).abs() < 1e-9);
        assert!((stats.mean_w_m2 - 600.0).abs() < 1e-9);
        assert!((stats.irradiation_kwh_m2 - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_measured_tilted_absent_without_column() {
        let dataset =
            TmyDataset::new(vec![IrradianceSample::new(at(2010, 7, 1, 12), 600.0)]).unwrap();
        assert!(dataset.measured_tilted().is_none());
    }
}
