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

//! Analysis pipeline stages.
//!
//! Each stage borrows the previous stage's output and returns a new value:
//!
//! ```text
//! TmyDataset -> ClearSkySeries -> ClearnessAnalysis -> RunAnalysis -> CloudinessReport
//! ```
//!
//! The resource stage turns one day of the TMY record plus an appliance load
//! table into a generation/consumption [`DailyProfile`].

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fluxion_offgrid_core::clearness::REFERENCE_YEAR;
use fluxion_offgrid_core::types::fractional_hour;
use fluxion_offgrid_core::{
    AnalysisConfig, AutonomyComparison, AutonomyRecommendation, ClassifierThresholds,
    ConditionShare, DailyClassification, DatedRun, DaylightTemperature, EnergyBalance,
    ExtremeDays, MeasuredTilted, PvArray, RunSet, RunStatistics, Scenario, SeasonalBreakdown,
    SimulationSettings, SkyCondition, TiltedPlane, TmyDataset, classify_days, clearness_series,
    compare_autonomy, condition_distribution, extreme_days, integrate_wh, interpolate_linear,
    seasonal_breakdown, timestep_from_hours,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::cli::data_loaders::LoadProfile;

/// Theoretical clear-sky irradiance and the observed GHI transposed onto
/// the site's panel plane, aligned with the dataset samples
#[derive(Debug, Clone, PartialEq)]
pub struct ClearSkySeries {
    pub theoretical_w_m2: Vec<f64>,
    pub tilted_w_m2: Vec<f64>,
}

impl ClearSkySeries {
    #[must_use]
    pub fn compute(dataset: &TmyDataset, config: &AnalysisConfig) -> Self {
        let latitude = config.site.latitude_deg;
        let plane = config.site.plane();
        let (theoretical_w_m2, tilted_w_m2): (Vec<f64>, Vec<f64>) = dataset
            .samples()
            .iter()
            .map(|s| {
                (
                    config.clear_sky.irradiance_at(latitude, &s.timestamp),
                    plane.tilted_irradiance(s.ghi_w_m2, &s.timestamp),
                )
            })
            .unzip();
        Self {
            theoretical_w_m2,
            tilted_w_m2,
        }
    }
}

/// Per-sample clearness index and the daily classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClearnessAnalysis {
    pub index: Vec<f64>,
    pub days: Vec<DailyClassification>,
}

impl ClearnessAnalysis {
    pub fn compute(
        dataset: &TmyDataset,
        clear_sky: &ClearSkySeries,
        thresholds: &ClassifierThresholds,
    ) -> Result<Self> {
        let samples = dataset.samples();
        let index = clearness_series(samples, &clear_sky.theoretical_w_m2, thresholds.max_index)
            .context("Failed to compute clearness index")?;
        let days = classify_days(samples, &clear_sky.theoretical_w_m2, thresholds)
            .context("Failed to classify days")?;
        debug!("Classified {} days", days.len());
        Ok(Self { index, days })
    }

    #[must_use]
    pub fn labels(&self) -> Vec<SkyCondition> {
        self.days.iter().map(|d| d.condition).collect()
    }
}

/// Run statistics of one sky condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRuns {
    pub condition: SkyCondition,
    pub statistics: Option<RunStatistics>,
    pub longest: Option<DatedRun>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunAnalysis {
    pub runs: RunSet,
    pub by_condition: Vec<ConditionRuns>,
    pub recommendation: AutonomyRecommendation,
}

impl RunAnalysis {
    #[must_use]
    pub fn compute(clearness: &ClearnessAnalysis) -> Self {
        let runs = RunSet::from_days(&clearness.days);
        let by_condition = SkyCondition::ALL
            .iter()
            .map(|&condition| ConditionRuns {
                condition,
                statistics: runs.statistics(condition),
                longest: runs.longest(condition),
            })
            .collect();
        let recommendation = runs.autonomy_recommendation();
        Self {
            runs,
            by_condition,
            recommendation,
        }
    }

    #[must_use]
    pub fn very_cloudy(&self) -> Option<&ConditionRuns> {
        self.by_condition
            .iter()
            .find(|c| c.condition == SkyCondition::VeryCloudy)
    }
}

/// Summary of a year of sky conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudinessReport {
    pub site: String,
    pub latitude_deg: f64,
    pub samples: usize,
    pub classified_days: usize,
    /// Horizontal irradiation over the record (kWh/m²)
    pub ghi_irradiation_kwh_m2: f64,
    /// Irradiation on the tilted panel plane (kWh/m²)
    pub tilted_irradiation_kwh_m2: f64,
    /// Plane-of-array column shipped with the record, next to the transposed value
    #[serde(default)]
    pub measured_tilted: Option<MeasuredTilted>,
    pub distribution: Vec<ConditionShare>,
    pub extremes: Option<ExtremeDays>,
    pub seasons: Vec<SeasonalBreakdown>,
    pub runs: Vec<ConditionRuns>,
    /// Very cloudy run length -> number of runs
    pub very_cloudy_lengths: BTreeMap<usize, usize>,
    pub recommendation: AutonomyRecommendation,
    pub temperature: Option<DaylightTemperature>,
}

impl CloudinessReport {
    #[must_use]
    pub fn build(
        dataset: &TmyDataset,
        config: &AnalysisConfig,
        clear_sky: &ClearSkySeries,
        clearness: &ClearnessAnalysis,
        runs: &RunAnalysis,
    ) -> Self {
        // TMY records are hourly
        let hourly = 1.0;
        Self {
            site: config.site.name.clone(),
            latitude_deg: config.site.latitude_deg,
            samples: dataset.len(),
            classified_days: clearness.days.len(),
            ghi_irradiation_kwh_m2: integrate_wh(&dataset.ghi(), hourly) / 1000.0,
            tilted_irradiation_kwh_m2: integrate_wh(&clear_sky.tilted_w_m2, hourly) / 1000.0,
            measured_tilted: dataset.measured_tilted(),
            distribution: condition_distribution(&clearness.days),
            extremes: extreme_days(&clearness.days),
            seasons: seasonal_breakdown(&clearness.days, config.site.latitude_deg),
            runs: runs.by_condition.clone(),
            very_cloudy_lengths: runs.runs.length_distribution(SkyCondition::VeryCloudy),
            recommendation: runs.recommendation,
            temperature: dataset.daylight_temperature(),
        }
    }

    #[must_use]
    pub fn share(&self, condition: SkyCondition) -> Option<&ConditionShare> {
        self.distribution.iter().find(|s| s.condition == condition)
    }
}

/// Every stage of the cloudiness analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CloudinessAnalysis {
    pub clear_sky: ClearSkySeries,
    pub clearness: ClearnessAnalysis,
    pub runs: RunAnalysis,
    pub report: CloudinessReport,
}

/// Run all cloudiness stages over a TMY dataset
pub fn analyze_cloudiness(dataset: &TmyDataset, config: &AnalysisConfig) -> Result<CloudinessAnalysis> {
    let clear_sky = ClearSkySeries::compute(dataset, config);
    let clearness = ClearnessAnalysis::compute(dataset, &clear_sky, &config.classifier)?;
    let runs = RunAnalysis::compute(&clearness);
    let report = CloudinessReport::build(dataset, config, &clear_sky, &clearness, &runs);

    info!(
        "{}: {} days classified, recommended autonomy {}",
        report.site, report.classified_days, report.recommendation
    );
    Ok(CloudinessAnalysis {
        clear_sky,
        clearness,
        runs,
        report,
    })
}

/// Generation and consumption of one day at a regular cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProfile {
    pub name: String,
    /// Fractional hours of day
    pub hours: Vec<f64>,
    pub generation_w: Vec<f64>,
    pub consumption_w: Vec<f64>,
}

impl DailyProfile {
    pub fn timestep_hours(&self) -> Result<f64> {
        timestep_from_hours(&self.hours)
            .with_context(|| format!("Profile '{}' has no regular cadence", self.name))
    }

    /// Simulation settings with the timestep taken from this profile
    pub fn settings(&self, base: &SimulationSettings) -> Result<SimulationSettings> {
        Ok(SimulationSettings {
            timestep_hours: self.timestep_hours()?,
            ..*base
        })
    }

    pub fn energy_balance(&self) -> Result<EnergyBalance> {
        EnergyBalance::from_series(&self.generation_w, &self.consumption_w, self.timestep_hours()?)
            .with_context(|| format!("Invalid profile '{}'", self.name))
    }

    #[must_use]
    pub fn to_scenario(&self) -> Scenario {
        Scenario::new(
            self.name.clone(),
            self.generation_w.clone(),
            self.consumption_w.clone(),
        )
    }
}

/// Compare autonomy options over one or more daily profiles.
///
/// All profiles must share the same cadence; the simulation timestep is
/// taken from them.
pub fn compare_profiles(
    profiles: &[DailyProfile],
    candidate_days: &[u32],
    config: &AnalysisConfig,
) -> Result<AutonomyComparison> {
    let Some(first) = profiles.first() else {
        anyhow::bail!("At least one profile is required");
    };
    let timestep = first.timestep_hours()?;
    for profile in &profiles[1..] {
        let step = profile.timestep_hours()?;
        if (step - timestep).abs() > 1e-9 {
            anyhow::bail!(
                "Profile '{}' has a {} h step, '{}' has {} h",
                profile.name,
                step,
                first.name,
                timestep
            );
        }
    }

    let settings = first.settings(&config.simulation)?;
    let scenarios: Vec<Scenario> = profiles.iter().map(DailyProfile::to_scenario).collect();
    compare_autonomy(
        &scenarios,
        candidate_days,
        &config.battery,
        &settings,
        &config.evaluation,
    )
    .context("Autonomy comparison failed")
}

/// One TMY day resampled onto a load profile, with the resulting PV output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDay {
    pub date: NaiveDate,
    pub array: String,
    pub ghi_w_m2: Vec<f64>,
    pub tilted_w_m2: Vec<f64>,
    pub profile: DailyProfile,
}

impl ResourceDay {
    /// Horizontal and tilted irradiation of the day (kWh/m²)
    pub fn irradiation_kwh_m2(&self) -> Result<(f64, f64)> {
        let step = self.profile.timestep_hours()?;
        Ok((
            integrate_wh(&self.ghi_w_m2, step) / 1000.0,
            integrate_wh(&self.tilted_w_m2, step) / 1000.0,
        ))
    }
}

/// Build the generation/consumption profile of one (month, day).
///
/// The observed GHI is transposed onto the array's plane, resampled onto the
/// load profile's hours and converted to PV output.
pub fn build_daily_profile(
    dataset: &TmyDataset,
    load: &LoadProfile,
    month: u32,
    day: u32,
    array: &PvArray,
    latitude_deg: f64,
) -> Result<ResourceDay> {
    let date = NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day)
        .with_context(|| format!("Invalid date {month:02}-{day:02}"))?;

    let plane = TiltedPlane::new(latitude_deg, array.tilt_deg);
    let mut hours = Vec::new();
    let mut ghi = Vec::new();
    let mut tilted = Vec::new();
    for sample in dataset.day(month, day) {
        hours.push(fractional_hour(&sample.timestamp));
        ghi.push(sample.ghi_w_m2);
        tilted.push(plane.tilted_irradiance(sample.ghi_w_m2, &sample.timestamp));
    }
    if hours.is_empty() {
        anyhow::bail!("No TMY samples for {month:02}-{day:02}");
    }

    let ghi_w_m2 = interpolate_linear(&load.hours, &hours, &ghi)
        .with_context(|| format!("Failed to resample GHI for {month:02}-{day:02}"))?;
    let tilted_w_m2 = interpolate_linear(&load.hours, &hours, &tilted)
        .with_context(|| format!("Failed to resample tilted irradiance for {month:02}-{day:02}"))?;
    let generation_w = array.power_series(&tilted_w_m2);

    debug!(
        "Resource day {}: {} TMY samples resampled onto {} load steps",
        date,
        hours.len(),
        load.hours.len()
    );
    Ok(ResourceDay {
        date,
        array: array.name.clone(),
        ghi_w_m2,
        tilted_w_m2,
        profile: DailyProfile {
            name: format!("{}-{month:02}-{day:02}", array.name),
            hours: load.hours.clone(),
            generation_w,
            consumption_w: load.consumption_w.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use fluxion_offgrid_core::{ClearSkyModel, IrradianceSample};

    /// Hourly January days whose GHI is the clear-sky value times a factor
    fn scaled_days(factors: &[f64]) -> TmyDataset {
        let model = ClearSkyModel::default();
        let latitude = AnalysisConfig::default().site.latitude_deg;
        let mut samples = Vec::new();
        for (i, factor) in factors.iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2013, 1, i as u32 + 1).unwrap();
            for hour in 0..24 {
                let ts = date.and_hms_opt(hour, 0, 0).unwrap();
                let ghi = model.irradiance_at(latitude, &ts) * factor;
                let mut sample = IrradianceSample::new(ts, ghi);
                sample.temperature_c = Some(15.0 + f64::from(hour) * 0.5);
                samples.push(sample);
            }
        }
        TmyDataset::new(samples).unwrap()
    }

    #[test]
    fn test_cloudiness_stages() {
        let dataset = scaled_days(&[0.9, 0.2, 0.2, 0.5, 0.9, 0.1]);
        let config = AnalysisConfig::default();
        let analysis = analyze_cloudiness(&dataset, &config).unwrap();

        assert_eq!(analysis.clear_sky.theoretical_w_m2.len(), dataset.len());
        assert_eq!(analysis.clearness.index.len(), dataset.len());
        assert_eq!(
            analysis.clearness.labels(),
            vec![
                SkyCondition::Clear,
                SkyCondition::VeryCloudy,
                SkyCondition::VeryCloudy,
                SkyCondition::PartlyCloudy,
                SkyCondition::Clear,
                SkyCondition::VeryCloudy,
            ]
        );
        assert!((analysis.clearness.days[0].mean_index - 0.9).abs() < 1e-9);

        let very_cloudy = analysis.runs.very_cloudy().unwrap();
        assert_eq!(very_cloudy.statistics.unwrap().count, 2);
        assert_eq!(very_cloudy.longest.unwrap().run.len, 2);
        assert_eq!(analysis.runs.recommendation.design_days(), 3);

        let report = &analysis.report;
        assert_eq!(report.classified_days, 6);
        assert_eq!(report.share(SkyCondition::VeryCloudy).unwrap().days, 3);
        assert!((report.share(SkyCondition::Clear).unwrap().percent - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.very_cloudy_lengths.get(&2), Some(&1));
        assert_eq!(report.very_cloudy_lengths.get(&1), Some(&1));
        let extremes = report.extremes.as_ref().unwrap();
        assert_eq!(extremes.cloudiest.date.day0(), 5);
        assert!(report.temperature.is_some());
        assert!(report.ghi_irradiation_kwh_m2 > 0.0);
        assert!(report.measured_tilted.is_none());
    }

    #[test]
    fn test_report_carries_measured_tilted() {
        let dataset = scaled_days(&[0.9, 0.5]);
        let samples: Vec<IrradianceSample> = dataset
            .samples()
            .iter()
            .map(|s| IrradianceSample {
                tilted_w_m2: (s.timestamp.day() == 1).then_some(s.ghi_w_m2 * 1.1),
                ..*s
            })
            .collect();
        let dataset = TmyDataset::new(samples).unwrap();
        let analysis = analyze_cloudiness(&dataset, &AnalysisConfig::default()).unwrap();

        let measured = analysis.report.measured_tilted.unwrap();
        assert_eq!(measured.present, 24);
        assert_eq!(measured.missing, 24);
        let first_day_ghi: f64 = dataset.day(1, 1).map(|s| s.ghi_w_m2).sum();
        assert!((measured.irradiation_kwh_m2 - first_day_ghi * 1.1 / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let dataset = scaled_days(&[0.9, 0.3]);
        let analysis = analyze_cloudiness(&dataset, &AnalysisConfig::default()).unwrap();
        let json = serde_json::to_string(&analysis.report).unwrap();
        assert!(json.contains("\"site\":\"Antofagasta\""));
        assert!(json.contains("very_cloudy_lengths"));
    }

    #[test]
    fn test_build_daily_profile_half_hour() {
        let dataset = scaled_days(&[0.8]);
        let load = LoadProfile {
            hours: (0..48).map(|i| f64::from(i) * 0.5).collect(),
            consumption_w: vec![100.0; 48],
            appliances: vec!["Refrigerador".to_owned()],
        };
        let array = PvArray::default();
        let resource =
            build_daily_profile(&dataset, &load, 1, 1, &array, -23.14).unwrap();

        assert_eq!(resource.profile.hours.len(), 48);
        assert_eq!(resource.profile.generation_w.len(), 48);
        assert_eq!(resource.profile.name, "base-01-01");
        assert_eq!(resource.profile.generation_w[0], 0.0);
        assert!(resource.profile.generation_w[24] > 0.0);
        assert!(resource.profile.generation_w.iter().all(|g| *g >= 0.0));
        assert!((resource.profile.timestep_hours().unwrap() - 0.5).abs() < 1e-12);

        let (ghi, tilted) = resource.irradiation_kwh_m2().unwrap();
        assert!(ghi > 0.0 && tilted > 0.0);

        let balance = resource.profile.energy_balance().unwrap();
        assert!((balance.consumption_kwh - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_build_daily_profile_missing_day() {
        let dataset = scaled_days(&[0.8]);
        let load = LoadProfile {
            hours: vec![0.0, 1.0],
            consumption_w: vec![100.0, 100.0],
            appliances: Vec::new(),
        };
        let array = PvArray::default();
        assert!(build_daily_profile(&dataset, &load, 6, 21, &array, -23.14).is_err());
        assert!(build_daily_profile(&dataset, &load, 2, 30, &array, -23.14).is_err());
    }

    #[test]
    fn test_compare_profiles_requires_matching_cadence() {
        let hourly = DailyProfile {
            name: "invierno".to_owned(),
            hours: (0..24).map(f64::from).collect(),
            generation_w: vec![0.0; 24],
            consumption_w: vec![500.0; 24],
        };
        let half_hourly = DailyProfile {
            name: "verano".to_owned(),
            hours: (0..48).map(|i| f64::from(i) * 0.5).collect(),
            generation_w: vec![0.0; 48],
            consumption_w: vec![500.0; 48],
        };
        let config = AnalysisConfig::default();
        assert!(compare_profiles(&[hourly.clone(), half_hourly], &[1, 2], &config).is_err());
        assert!(compare_profiles(&[], &[1, 2], &config).is_err());

        let comparison = compare_profiles(&[hourly], &[1, 2], &config).unwrap();
        assert!((comparison.design_daily_energy_kwh - 12.0).abs() < 1e-9);
        assert_eq!(comparison.options.len(), 2);
    }
}
