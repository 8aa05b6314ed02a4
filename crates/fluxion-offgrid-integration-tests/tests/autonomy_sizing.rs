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

//! Battery sizing, SOC simulation and autonomy comparison over seasonal
//! profiles loaded from CSV.

use fluxion_offgrid_core::{
    AnalysisConfig, AutonomyChoice, BatteryConfig, CountRounding, SimulationSettings,
    SystemRating, estimate_capacity_kwh, simulate_repeated, size_bank,
};
use fluxion_offgrid_integration_tests::hourly_profile;
use fluxion_offgrid_sim::{
    CsvFormatter, DailyProfile, DataLoader, ProfileCsvLoader, compare_profiles,
};
use std::path::Path;

fn write_profile(dir: &Path, name: &str, generation_w: f64, consumption_w: f64) -> DailyProfile {
    let (hours, generation, consumption) = hourly_profile(generation_w, 8..17, consumption_w);
    let profile = DailyProfile {
        name: name.to_owned(),
        hours,
        generation_w: generation,
        consumption_w: consumption,
    };
    let path = dir.join(format!("{name}.csv"));
    CsvFormatter::write_profile(&profile, &path).unwrap();
    ProfileCsvLoader::new(&path).load().unwrap()
}

#[test]
fn test_sizing_is_never_undersized() {
    let battery = BatteryConfig::default();
    for daily in [0.5, 3.3, 7.5, 12.0, 19.9, 40.0] {
        for days in [1, 2, 3, 5, 7] {
            let sizing = size_bank(&battery.sizing_input(daily, days)).unwrap();
            // Usable share of the installed bank covers the requirement
            assert!(
                sizing.realized_capacity_kwh * battery.depth_of_discharge + 1e-9
                    >= sizing.required_energy_kwh,
                "{daily} kWh x {days} days undersized"
            );
            assert_eq!(sizing.total_batteries, sizing.series * sizing.parallel);
            assert_eq!(sizing.series, 4);
        }
    }
}

#[test]
fn test_reference_bank_sizes() {
    let battery = BatteryConfig::default();

    // 7.5 kWh x 3 days = 22.5 kWh -> 22 500 / (48 x 0.8) = 585.9 Ah
    let sizing = size_bank(&battery.sizing_input(7.5, 3)).unwrap();
    assert!((sizing.required_energy_kwh - 22.5).abs() < 1e-9);
    assert!((sizing.required_ah - 585.937_5).abs() < 1e-9);
    assert_eq!(sizing.parallel, 3);
    assert_eq!(sizing.total_batteries, 12);
    assert!((sizing.realized_capacity_kwh - 28.8).abs() < 1e-9);

    // 9.984 kWh -> 260 Ah = 1.3 strings: nearest keeps 1, ceiling adds a second
    let nearest = BatteryConfig {
        count_rounding: CountRounding::Nearest,
        ..BatteryConfig::default()
    };
    let rounded = size_bank(&nearest.sizing_input(9.984, 1)).unwrap();
    assert_eq!(rounded.parallel, 1);
    let ceiled = size_bank(&battery.sizing_input(9.984, 1)).unwrap();
    assert_eq!(ceiled.parallel, 2);

    let zero = size_bank(&battery.sizing_input(0.0, 3)).unwrap();
    assert_eq!(zero.total_batteries, 0);
    assert!(size_bank(&battery.sizing_input(-1.0, 3)).is_err());
    assert!(size_bank(&battery.sizing_input(5.0, 0)).is_err());
}

#[test]
fn test_deficit_capacity_estimate() {
    // 10 kWh deficit at 80 % DoD and 90 % round trip
    let capacity = estimate_capacity_kwh(10.0, 0.8, 0.9).unwrap();
    assert!((capacity - 13.888_888_888_888_89).abs() < 1e-9);
    assert!(estimate_capacity_kwh(10.0, 0.0, 0.9).is_err());
}

#[test]
fn test_dark_day_single_day_bank() {
    let dir = tempfile::tempdir().unwrap();
    let dark = write_profile(dir.path(), "oscuro", 0.0, 500.0);
    let balance = dark.energy_balance().unwrap();
    assert!((balance.consumption_kwh - 12.0).abs() < 1e-9);
    assert!((balance.deficit_kwh - 12.0).abs() < 1e-9);

    let sizing = size_bank(&BatteryConfig::default().sizing_input(12.0, 1)).unwrap();
    assert_eq!(sizing.total_batteries, 8);
    assert!((sizing.realized_capacity_kwh - 19.2).abs() < 1e-9);

    let settings = SimulationSettings::default();
    let one_day = simulate_repeated(
        &dark.generation_w,
        &dark.consumption_w,
        1,
        sizing.realized_capacity_wh(),
        &settings,
    )
    .unwrap();
    // 24 x 500 / 0.9 = 13 333 Wh drawn from 19 200 Wh
    assert!((one_day.summary.final_soc - 5_866.666_666_666_667 / 19_200.0).abs() < 1e-9);
    assert_eq!(one_day.summary.critical_steps, 0);

    let three_days = simulate_repeated(
        &dark.generation_w,
        &dark.consumption_w,
        3,
        sizing.realized_capacity_wh(),
        &settings,
    )
    .unwrap();
    assert_eq!(three_days.steps.len(), 72);
    assert!((three_days.summary.min_soc - settings.min_soc).abs() < 1e-9);
    assert!(three_days.summary.critical_steps > 0);
    assert!(three_days.steps.iter().all(|s| s.soc >= settings.min_soc - 1e-12));
}

#[test]
fn test_seasonal_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let winter = write_profile(dir.path(), "invierno", 800.0, 500.0);
    let summer = write_profile(dir.path(), "verano", 2500.0, 350.0);
    let config = AnalysisConfig::default();

    let comparison = compare_profiles(&[winter, summer], &[7, 1, 3, 2, 5, 3], &config).unwrap();

    // Largest daily consumption drives the design
    assert!((comparison.design_daily_energy_kwh - 12.0).abs() < 1e-9);
    let days: Vec<u32> = comparison.options.iter().map(|o| o.autonomy_days).collect();
    assert_eq!(days, vec![1, 2, 3, 5, 7]);

    for pair in comparison.options.windows(2) {
        assert!(pair[1].sizing.realized_capacity_kwh >= pair[0].sizing.realized_capacity_kwh);
    }
    for option in &comparison.options {
        assert_eq!(option.scenarios.len(), 2);
        assert_eq!(option.scenarios[0].scenario, "invierno");
        let worst = option
            .scenarios
            .iter()
            .map(|s| s.summary.critical_steps)
            .max()
            .unwrap();
        assert_eq!(option.worst_critical_steps, worst);
    }

    assert_eq!(
        comparison.choice,
        AutonomyChoice::Recommended { autonomy_days: 1 }
    );
    assert_eq!(comparison.options[0].rating, SystemRating::Excellent);

    let csv_path = dir.path().join("comparison.csv");
    CsvFormatter::write_comparison(&comparison, &csv_path).unwrap();
    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 1 + 5 * 2);
}

#[test]
fn test_comparison_suggests_more_capacity_when_every_option_fails() {
    let dir = tempfile::tempdir().unwrap();
    let dark = write_profile(dir.path(), "oscuro", 0.0, 500.0);

    // Start near the critical level so every bank dips below it
    let config = AnalysisConfig {
        simulation: SimulationSettings {
            initial_soc: 0.32,
            ..SimulationSettings::default()
        },
        ..AnalysisConfig::default()
    };
    let comparison = compare_profiles(&[dark], &[1, 2], &config).unwrap();

    assert_eq!(
        comparison.choice,
        AutonomyChoice::IncreaseCapacity { suggested_days: 3 }
    );
    assert!(
        comparison
            .options
            .iter()
            .all(|o| o.worst_critical_steps > 0)
    );
}
