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

//! Clearness index and daily sky-condition classification.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{OffgridError, Result, ensure_positive};
use crate::solar::Season;
use crate::types::IrradianceSample;

/// Year used to place (month, day) of a representative year on a calendar.
/// Leap, so that 29 February survives.
pub const REFERENCE_YEAR: i32 = 2000;

/// Daily sky condition label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkyCondition {
    Clear,
    PartlyCloudy,
    VeryCloudy,
}

impl SkyCondition {
    pub const ALL: [Self; 3] = [Self::Clear, Self::PartlyCloudy, Self::VeryCloudy];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::VeryCloudy => "Very cloudy",
        }
    }
}

impl std::fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds applied to the daily mean clearness index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Mean index at or above which a day is clear
    #[serde(default = "default_clear")]
    pub clear: f64,

    /// Mean index at or above which a day is partly cloudy
    #[serde(default = "default_partly_cloudy")]
    pub partly_cloudy: f64,

    /// Upper clamp of the per-sample index (cloud enhancement)
    #[serde(default = "default_max_index")]
    pub max_index: f64,
}

fn default_clear() -> f64 {
    0.7
}

fn default_partly_cloudy() -> f64 {
    0.4
}

fn default_max_index() -> f64 {
    1.2
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            clear: default_clear(),
            partly_cloudy: default_partly_cloudy(),
            max_index: default_max_index(),
        }
    }
}

impl ClassifierThresholds {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("max_index", self.max_index)?;
        if !(self.partly_cloudy >= 0.0 && self.partly_cloudy < self.clear) {
            return Err(OffgridError::InvalidParameter {
                name: "partly_cloudy",
                value: self.partly_cloudy,
                reason: "must be >= 0 and below the clear threshold",
            });
        }
        Ok(())
    }

    /// Label a daily mean index; lower bounds are inclusive.
    #[must_use]
    pub fn classify(&self, mean_index: f64) -> SkyCondition {
        if mean_index >= self.clear {
            SkyCondition::Clear
        } else if mean_index >= self.partly_cloudy {
            SkyCondition::PartlyCloudy
        } else {
            SkyCondition::VeryCloudy
        }
    }
}

/// Observed over theoretical irradiance, 0 when the theoretical value is 0,
/// clamped to `[0, max_index]`.
#[must_use]
pub fn clearness_index(observed: f64, theoretical: f64, max_index: f64) -> f64 {
    if theoretical > 0.0 {
        (observed / theoretical).clamp(0.0, max_index)
    } else {
        0.0
    }
}

fn ensure_aligned(samples: &[IrradianceSample], theoretical: &[f64]) -> Result<()> {
    if samples.len() == theoretical.len() {
        Ok(())
    } else {
        Err(OffgridError::MisalignedSeries {
            what: "theoretical irradiance",
            expected: samples.len(),
            actual: theoretical.len(),
        })
    }
}

/// Per-sample clearness index for paired observed/theoretical series
pub fn clearness_series(
    samples: &[IrradianceSample],
    theoretical: &[f64],
    max_index: f64,
) -> Result<Vec<f64>> {
    ensure_aligned(samples, theoretical)?;
    Ok(samples
        .iter()
        .zip(theoretical)
        .map(|(s, &t)| clearness_index(s.ghi_w_m2, t, max_index))
        .collect())
}

/// Aggregated clearness of one calendar day (daylight samples only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyClassification {
    /// Day placed on [`REFERENCE_YEAR`]
    pub date: NaiveDate,
    pub mean_index: f64,
    pub ghi_mean_w_m2: f64,
    pub ghi_max_w_m2: f64,
    pub ghi_std_w_m2: f64,
    pub theoretical_mean_w_m2: f64,
    pub daylight_samples: usize,
    pub condition: SkyCondition,
}

#[derive(Default)]
struct DayAccumulator {
    index_sum: f64,
    theoretical_sum: f64,
    ghi: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation (n - 1); 0 for fewer than two values
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn reference_date(timestamp: &NaiveDateTime) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(REFERENCE_YEAR, timestamp.month(), timestamp.day())
}

/// Group daylight samples by calendar day and label each day.
///
/// The source year is ignored. Days without any sample with observed
/// irradiance above zero are left out of the result.
pub fn classify_days(
    samples: &[IrradianceSample],
    theoretical: &[f64],
    thresholds: &ClassifierThresholds,
) -> Result<Vec<DailyClassification>> {
    ensure_aligned(samples, theoretical)?;

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for (sample, &theo) in samples.iter().zip(theoretical) {
        if !sample.is_daylight() {
            continue;
        }
        let Some(date) = reference_date(&sample.timestamp) else {
            continue;
        };
        let acc = days.entry(date).or_default();
        acc.index_sum += clearness_index(sample.ghi_w_m2, theo, thresholds.max_index);
        acc.theoretical_sum += theo;
        acc.ghi.push(sample.ghi_w_m2);
    }

    Ok(days
        .into_iter()
        .map(|(date, acc)| {
            let n = acc.ghi.len() as f64;
            let mean_index = acc.index_sum / n;
            DailyClassification {
                date,
                mean_index,
                ghi_mean_w_m2: mean(&acc.ghi),
                ghi_max_w_m2: acc.ghi.iter().copied().fold(0.0, f64::max),
                ghi_std_w_m2: sample_std(&acc.ghi),
                theoretical_mean_w_m2: acc.theoretical_sum / n,
                daylight_samples: acc.ghi.len(),
                condition: thresholds.classify(mean_index),
            }
        })
        .collect())
}

/// Number and share of days carrying one label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionShare {
    pub condition: SkyCondition,
    pub days: usize,
    pub percent: f64,
}

/// Share of each label over the given days, always listing all three labels
#[must_use]
pub fn condition_distribution<'a>(
    days: impl IntoIterator<Item = &'a DailyClassification>,
) -> Vec<ConditionShare> {
    let mut counts = [0usize; 3];
    let mut total = 0usize;
    for day in days {
        counts[day.condition as usize] += 1;
        total += 1;
    }
    SkyCondition::ALL
        .iter()
        .zip(counts)
        .map(|(&condition, days)| ConditionShare {
            condition,
            days,
            percent: if total == 0 {
                0.0
            } else {
                days as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeDays {
    pub cloudiest: DailyClassification,
    pub clearest: DailyClassification,
}

/// Days with the lowest and highest mean index; the earliest wins ties
#[must_use]
pub fn extreme_days(days: &[DailyClassification]) -> Option<ExtremeDays> {
    let first = days.first()?;
    let mut cloudiest = first;
    let mut clearest = first;
    for day in &days[1..] {
        if day.mean_index < cloudiest.mean_index {
            cloudiest = day;
        }
        if day.mean_index > clearest.mean_index {
            clearest = day;
        }
    }
    Some(ExtremeDays {
        cloudiest: cloudiest.clone(),
        clearest: clearest.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBreakdown {
    pub season: Season,
    pub days: usize,
    pub shares: Vec<ConditionShare>,
}

/// Label distribution per season; seasons without classified days are skipped
#[must_use]
pub fn seasonal_breakdown(days: &[DailyClassification], latitude_deg: f64) -> Vec<SeasonalBreakdown> {
    Season::ALL
        .iter()
        .filter_map(|&season| {
            let in_season: Vec<&DailyClassification> = days
                .iter()
                .filter(|d| Season::from_month(d.date.month(), latitude_deg) == season)
                .collect();
            if in_season.is_empty() {
                return None;
            }
            Some(SeasonalBreakdown {
                season,
                days: in_season.len(),
                shares: condition_distribution(in_season),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyClearness {
    pub timestamp: NaiveDateTime,
    pub observed_w_m2: f64,
    pub theoretical_w_m2: f64,
    pub index: f64,
}

/// Hour-by-hour view of a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub hourly: Vec<HourlyClearness>,
    pub mean_index: f64,
    pub condition: SkyCondition,
}

/// Inspect one (month, day). `None` if the day is missing or has no daylight.
pub fn analyze_day(
    samples: &[IrradianceSample],
    theoretical: &[f64],
    month: u32,
    day: u32,
    thresholds: &ClassifierThresholds,
) -> Result<Option<DayDetail>> {
    ensure_aligned(samples, theoretical)?;
    let Some(date) = NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day) else {
        return Ok(None);
    };

    let hourly: Vec<HourlyClearness> = samples
        .iter()
        .zip(theoretical)
        .filter(|(s, _)| s.timestamp.month() == month && s.timestamp.day() == day)
        .map(|(s, &t)| HourlyClearness {
            timestamp: s.timestamp,
            observed_w_m2: s.ghi_w_m2,
            theoretical_w_m2: t,
            index: clearness_index(s.ghi_w_m2, t, thresholds.max_index),
        })
        .collect();

    let daylight: Vec<f64> = hourly
        .iter()
        .filter(|h| h.observed_w_m2 > 0.0)
        .map(|h| h.index)
        .collect();
    if daylight.is_empty() {
        return Ok(None);
    }

    let mean_index = mean(&daylight);
    Ok(Some(DayDetail {
        date,
        hourly,
        mean_index,
        condition: thresholds.classify(mean_index),
    }))
}
