// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Output formatters for analysis results.

use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use fluxion_offgrid_core::{
    AutonomyChoice, AutonomyComparison, BankSizing, BankSizingInput, DailyClassification,
    EnergyBalance, SkyCondition, SocSimulation, SystemRating,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::pipeline::{CloudinessReport, DailyProfile, ResourceDay};

/// Formatter for pretty terminal tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for CSV export
#[derive(Debug)]
pub struct CsvFormatter;

/// Formatter for JSON export
#[derive(Debug)]
pub struct JsonFormatter;

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(titles));
    table
}

fn condition_color(condition: SkyCondition) -> Color {
    match condition {
        SkyCondition::Clear => Color::Green,
        SkyCondition::PartlyCloudy => Color::Yellow,
        SkyCondition::VeryCloudy => Color::Red,
    }
}

fn rating_color(rating: SystemRating) -> Color {
    match rating {
        SystemRating::Excellent => Color::Green,
        SystemRating::Good => Color::Cyan,
        SystemRating::Acceptable => Color::Yellow,
        SystemRating::Insufficient => Color::Red,
    }
}

impl TableFormatter {
    /// Cloudiness analysis of a TMY year
    pub fn format_cloudiness(report: &CloudinessReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "=== Cloudiness analysis: {} (lat {:.2}) ===\n\n",
            report.site, report.latitude_deg
        ));

        let mut summary = new_table(&["Metric", "Value"]);
        summary.add_row(vec![Cell::new("Samples"), Cell::new(report.samples)]);
        summary.add_row(vec![
            Cell::new("Classified days"),
            Cell::new(report.classified_days),
        ]);
        summary.add_row(vec![
            Cell::new("GHI irradiation (kWh/m²)"),
            Cell::new(format!("{:.1}", report.ghi_irradiation_kwh_m2)),
        ]);
        summary.add_row(vec![
            Cell::new("Tilted irradiation (kWh/m²)"),
            Cell::new(format!("{:.1}", report.tilted_irradiation_kwh_m2)),
        ]);
        if let Some(measured) = &report.measured_tilted {
            summary.add_row(vec![
                Cell::new("Measured tilted (kWh/m²)"),
                Cell::new(format!(
                    "{:.1} (mean {:.1} / max {:.1} W/m², {} missing)",
                    measured.irradiation_kwh_m2,
                    measured.mean_w_m2,
                    measured.max_w_m2,
                    measured.missing
                )),
            ]);
        }
        if let Some(temp) = &report.temperature {
            summary.add_row(vec![
                Cell::new("Daylight temperature (°C)"),
                Cell::new(format!(
                    "min {:.1} / mean {:.1} / max {:.1}",
                    temp.min_c, temp.mean_c, temp.max_c
                )),
            ]);
        }
        output.push_str(&format!("{summary}\n\n"));

        let mut distribution = new_table(&["Condition", "Days", "Share (%)"]);
        for share in &report.distribution {
            distribution.add_row(vec![
                Cell::new(share.condition.label()).fg(condition_color(share.condition)),
                Cell::new(share.days),
                Cell::new(format!("{:.1}", share.percent)),
            ]);
        }
        output.push_str(&format!("{distribution}\n\n"));

        let mut titles = vec!["Season", "Days"];
        titles.extend(SkyCondition::ALL.iter().map(|c| c.label()));
        let mut seasons = new_table(&titles);
        for season in &report.seasons {
            let mut row = vec![Cell::new(season.season.name()), Cell::new(season.days)];
            row.extend(
                season
                    .shares
                    .iter()
                    .map(|s| Cell::new(format!("{:.1} %", s.percent))),
            );
            seasons.add_row(row);
        }
        output.push_str(&format!("{seasons}\n\n"));

        let mut runs = new_table(&[
            "Condition",
            "Runs",
            "Longest",
            "Mean",
            "Median",
            "Longest period",
        ]);
        for entry in &report.runs {
            let Some(stats) = entry.statistics else {
                runs.add_row(vec![
                    Cell::new(entry.condition.label()),
                    Cell::new(0),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
                continue;
            };
            let period = entry.longest.map_or_else(
                || "-".to_owned(),
                |l| {
                    format!(
                        "{} .. {}",
                        l.start_date.format("%d %b"),
                        l.end_date.format("%d %b")
                    )
                },
            );
            runs.add_row(vec![
                Cell::new(entry.condition.label()).fg(condition_color(entry.condition)),
                Cell::new(stats.count),
                Cell::new(stats.max_len),
                Cell::new(format!("{:.2}", stats.mean_len)),
                Cell::new(format!("{:.1}", stats.median_len)),
                Cell::new(period),
            ]);
        }
        output.push_str(&format!("{runs}\n\n"));

        if !report.very_cloudy_lengths.is_empty() {
            let mut lengths = new_table(&["Very cloudy run (days)", "Occurrences"]);
            for (len, count) in &report.very_cloudy_lengths {
                lengths.add_row(vec![Cell::new(len), Cell::new(count)]);
            }
            output.push_str(&format!("{lengths}\n\n"));
        }

        if let Some(extremes) = &report.extremes {
            output.push_str(&format!(
                "Cloudiest day: {} (index {:.3})\nClearest day:  {} (index {:.3})\n\n",
                extremes.cloudiest.date.format("%d %b"),
                extremes.cloudiest.mean_index,
                extremes.clearest.date.format("%d %b"),
                extremes.clearest.mean_index
            ));
        }

        output.push_str(&format!(
            "Recommended battery autonomy: {}\n",
            report.recommendation
        ));
        output
    }

    /// Battery bank sizing
    pub fn format_sizing(input: &BankSizingInput, sizing: &BankSizing) -> String {
        let mut table = new_table(&["Parameter", "Value"]);
        let rows: Vec<(&str, String)> = vec![
            ("Daily energy (kWh)", format!("{:.2}", input.daily_energy_kwh)),
            ("Autonomy (days)", input.autonomy_days.to_string()),
            ("System voltage (V)", format!("{:.0}", input.system_voltage_v)),
            (
                "Depth of discharge",
                format!("{:.0} %", input.depth_of_discharge * 100.0),
            ),
            (
                "Battery unit",
                format!("{:.0} V / {:.0} Ah", input.unit.voltage_v, input.unit.capacity_ah),
            ),
            (
                "Required energy (kWh)",
                format!("{:.2}", sizing.required_energy_kwh),
            ),
            ("Required capacity (Ah)", format!("{:.1}", sizing.required_ah)),
            ("Series", sizing.series.to_string()),
            ("Parallel", sizing.parallel.to_string()),
        ];
        for (name, value) in rows {
            table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }
        table.add_row(vec![
            Cell::new("Total batteries").add_attribute(Attribute::Bold),
            Cell::new(sizing.total_batteries)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Installed capacity (kWh)"),
            Cell::new(format!("{:.2}", sizing.realized_capacity_kwh)),
        ]);
        format!("{table}")
    }

    /// SOC simulation summary
    pub fn format_simulation(name: &str, simulation: &SocSimulation) -> String {
        let summary = &simulation.summary;
        let mut table = new_table(&["Metric", "Value"]);
        table.add_row(vec![Cell::new("Profile"), Cell::new(name)]);
        table.add_row(vec![
            Cell::new("Capacity (kWh)"),
            Cell::new(format!("{:.2}", simulation.capacity_wh / 1000.0)),
        ]);
        table.add_row(vec![Cell::new("Steps"), Cell::new(simulation.steps.len())]);
        table.add_row(vec![
            Cell::new("SOC min / mean / max (%)"),
            Cell::new(format!(
                "{:.1} / {:.1} / {:.1}",
                summary.min_soc * 100.0,
                summary.mean_soc * 100.0,
                summary.max_soc * 100.0
            )),
        ]);
        table.add_row(vec![
            Cell::new("Final SOC (%)"),
            Cell::new(format!("{:.1}", summary.final_soc * 100.0)),
        ]);
        let critical = Cell::new(summary.critical_steps);
        table.add_row(vec![
            Cell::new("Critical steps"),
            if summary.critical_steps > 0 {
                critical.fg(Color::Red).add_attribute(Attribute::Bold)
            } else {
                critical.fg(Color::Green)
            },
        ]);
        table.add_row(vec![
            Cell::new("Charged / discharged (kWh)"),
            Cell::new(format!(
                "{:.2} / {:.2}",
                summary.charged_kwh, summary.discharged_kwh
            )),
        ]);
        table.add_row(vec![
            Cell::new("Efficiency (%)"),
            Cell::new(format!("{:.1}", summary.efficiency * 100.0)),
        ]);
        format!("{table}")
    }

    /// Autonomy options side by side, the recommended one highlighted
    pub fn format_comparison(comparison: &AutonomyComparison) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Design daily energy: {:.2} kWh\n\n",
            comparison.design_daily_energy_kwh
        ));

        let recommended = match comparison.choice {
            AutonomyChoice::Recommended { autonomy_days } => Some(autonomy_days),
            AutonomyChoice::IncreaseCapacity { .. } => None,
        };

        let mut titles = vec![
            "Autonomy\n(days)",
            "Batteries\n(S x P)",
            "Capacity\n(kWh)",
        ];
        let scenario_titles: Vec<String> = comparison
            .options
            .first()
            .map(|o| {
                o.scenarios
                    .iter()
                    .map(|s| format!("{}\nmin SOC / crit", s.scenario))
                    .collect()
            })
            .unwrap_or_default();
        titles.extend(scenario_titles.iter().map(String::as_str));
        titles.push("Rating");
        let mut table = new_table(&titles);

        for option in &comparison.options {
            let days_cell = Cell::new(option.autonomy_days);
            let days_cell = if recommended == Some(option.autonomy_days) {
                days_cell.fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                days_cell
            };
            let mut row = vec![
                days_cell,
                Cell::new(format!(
                    "{} ({} x {})",
                    option.sizing.total_batteries, option.sizing.series, option.sizing.parallel
                )),
                Cell::new(format!("{:.1}", option.sizing.realized_capacity_kwh)),
            ];
            row.extend(option.scenarios.iter().map(|s| {
                Cell::new(format!(
                    "{:.1} % / {}",
                    s.summary.min_soc * 100.0,
                    s.summary.critical_steps
                ))
            }));
            row.push(Cell::new(option.rating.label()).fg(rating_color(option.rating)));
            table.add_row(row);
        }
        output.push_str(&format!("{table}\n\n"));

        match comparison.choice {
            AutonomyChoice::Recommended { autonomy_days } => output.push_str(&format!(
                "Recommended: {autonomy_days} days of autonomy (no critical steps)\n"
            )),
            AutonomyChoice::IncreaseCapacity { suggested_days } => output.push_str(&format!(
                "No option avoids critical steps, consider {suggested_days} days or more\n"
            )),
        }
        output
    }

    /// Resource and load of a single day
    pub fn format_resource(resource: &ResourceDay, balance: &EnergyBalance) -> Result<String> {
        let (ghi, tilted) = resource.irradiation_kwh_m2()?;
        let mut table = new_table(&["Metric", "Value"]);
        table.add_row(vec![
            Cell::new("Day"),
            Cell::new(resource.date.format("%d %B")),
        ]);
        table.add_row(vec![Cell::new("PV array"), Cell::new(&resource.array)]);
        table.add_row(vec![
            Cell::new("GHI (kWh/m²)"),
            Cell::new(format!("{ghi:.2}")),
        ]);
        table.add_row(vec![
            Cell::new("Tilted (kWh/m²)"),
            Cell::new(format!("{tilted:.2}")),
        ]);
        table.add_row(vec![
            Cell::new("PV generation (kWh)"),
            Cell::new(format!("{:.2}", balance.generation_kwh)),
        ]);
        table.add_row(vec![
            Cell::new("Consumption (kWh)"),
            Cell::new(format!("{:.2}", balance.consumption_kwh)),
        ]);
        table.add_row(vec![
            Cell::new("Surplus / deficit (kWh)"),
            Cell::new(format!(
                "{:.2} / {:.2}",
                balance.surplus_kwh, balance.deficit_kwh
            )),
        ]);
        table.add_row(vec![
            Cell::new("Coverage (%)"),
            Cell::new(format!("{:.1}", balance.coverage_percent())),
        ]);
        Ok(format!("{table}"))
    }
}

impl CsvFormatter {
    /// One row per classified day
    pub fn write_daily_classifications(days: &[DailyClassification], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record([
            "date",
            "mean_index",
            "ghi_mean_w_m2",
            "ghi_max_w_m2",
            "ghi_std_w_m2",
            "theoretical_mean_w_m2",
            "daylight_samples",
            "condition",
        ])?;
        for day in days {
            writer.write_record([
                day.date.format("%m-%d").to_string(),
                format!("{:.4}", day.mean_index),
                format!("{:.2}", day.ghi_mean_w_m2),
                format!("{:.2}", day.ghi_max_w_m2),
                format!("{:.2}", day.ghi_std_w_m2),
                format!("{:.2}", day.theoretical_mean_w_m2),
                day.daylight_samples.to_string(),
                day.condition.label().to_owned(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Step-by-step SOC trace; `hours` repeats over multi-day runs
    pub fn write_soc_trace(simulation: &SocSimulation, hours: &[f64], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record([
            "step",
            "Hora",
            "generation_w",
            "consumption_w",
            "balance_w",
            "stored_wh",
            "soc",
            "charged_wh",
            "discharged_wh",
        ])?;
        for (idx, step) in simulation.steps.iter().enumerate() {
            let hour = if hours.is_empty() {
                String::new()
            } else {
                format!("{:.2}", hours[idx % hours.len()])
            };
            writer.write_record([
                idx.to_string(),
                hour,
                format!("{:.2}", step.generation_w),
                format!("{:.2}", step.consumption_w),
                format!("{:.2}", step.balance_w),
                format!("{:.2}", step.stored_wh),
                format!("{:.4}", step.soc),
                format!("{:.2}", step.charged_wh),
                format!("{:.2}", step.discharged_wh),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// One row per (autonomy option, scenario)
    pub fn write_comparison(comparison: &AutonomyComparison, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record([
            "autonomy_days",
            "total_batteries",
            "series",
            "parallel",
            "capacity_kwh",
            "scenario",
            "min_soc",
            "final_soc",
            "critical_steps",
            "efficiency",
            "rating",
        ])?;
        for option in &comparison.options {
            for scenario in &option.scenarios {
                writer.write_record([
                    option.autonomy_days.to_string(),
                    option.sizing.total_batteries.to_string(),
                    option.sizing.series.to_string(),
                    option.sizing.parallel.to_string(),
                    format!("{:.2}", option.sizing.realized_capacity_kwh),
                    scenario.scenario.clone(),
                    format!("{:.4}", scenario.summary.min_soc),
                    format!("{:.4}", scenario.summary.final_soc),
                    scenario.summary.critical_steps.to_string(),
                    format!("{:.4}", scenario.summary.efficiency),
                    option.rating.label().to_owned(),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Daily profile in the `Hora,Generacion_PV,Consumo` layout
    pub fn write_profile(profile: &DailyProfile, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(["Hora", "Generacion_PV", "Consumo"])?;
        for ((hour, generation), consumption) in profile
            .hours
            .iter()
            .zip(&profile.generation_w)
            .zip(&profile.consumption_w)
        {
            writer.write_record([
                hour.to_string(),
                format!("{generation:.3}"),
                format!("{consumption:.3}"),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl JsonFormatter {
    pub fn write<T: Serialize>(value: &T, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), value)
            .with_context(|| format!("Failed to write JSON to {}", path.display()))
    }
}
