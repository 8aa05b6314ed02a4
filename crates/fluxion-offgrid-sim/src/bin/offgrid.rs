// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! CLI entry point for FluxION Off-grid analysis

use anyhow::{Context, Result};
use clap::Parser;
use fluxion_offgrid_core::{AnalysisConfig, SimulationSettings, SocSimulator, size_bank};
use fluxion_offgrid_sim::{
    cli::{
        Cli, CloudinessArgs, Commands, CompareArgs, ConfigArgs, CsvFormatter, DataLoader,
        JsonFormatter, ProfileCsvLoader, ResourceArgs, SimulateArgs, SizeArgs, TableFormatter,
        TmyCsvLoader, apply_battery_overrides, load_config, load_load_profile,
    },
    pipeline::{analyze_cloudiness, build_daily_profile, compare_profiles},
};
use std::path::Path;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Respects RUST_LOG; logs go to stderr so tables on stdout stay clean
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Cloudiness(args) => cloudiness_command(args, config_path),
        Commands::Size(args) => size_command(args, config_path),
        Commands::Simulate(args) => simulate_command(args, config_path),
        Commands::Compare(args) => compare_command(args, config_path),
        Commands::Resource(args) => resource_command(args, config_path),
        Commands::Config(args) => config_command(args),
    }
}

fn cloudiness_command(args: CloudinessArgs, config_path: Option<&str>) -> Result<()> {
    if args.output.wants_csv() && args.output.csv_path.is_none() {
        anyhow::bail!("--csv-path is required when --output is 'csv' or 'both'");
    }
    if args.output.wants_json() && args.output.json_path.is_none() {
        anyhow::bail!("--json-path is required when --output is 'json'");
    }

    let mut config = load_config(config_path)?;
    if let Some(latitude) = args.latitude {
        config.site.latitude_deg = latitude;
        config.validate().context("Invalid --latitude override")?;
    }

    let mut loader = TmyCsvLoader::new(&args.tmy);
    if let Some(skip) = args.skip_rows {
        loader = loader.with_skip_rows(skip);
    }
    let dataset = loader.load()?;
    let analysis = analyze_cloudiness(&dataset, &config)?;

    if args.output.wants_table() {
        println!("{}", TableFormatter::format_cloudiness(&analysis.report));
    }
    if args.output.wants_csv()
        && let Some(csv_path) = &args.output.csv_path
    {
        CsvFormatter::write_daily_classifications(&analysis.clearness.days, Path::new(csv_path))
            .with_context(|| format!("Failed to write CSV to {csv_path}"))?;
        println!("CSV exported to: {csv_path}");
    }
    if args.output.wants_json()
        && let Some(json_path) = &args.output.json_path
    {
        JsonFormatter::write(&analysis.report, Path::new(json_path))?;
        println!("JSON exported to: {json_path}");
    }
    Ok(())
}

fn size_command(args: SizeArgs, config_path: Option<&str>) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_battery_overrides(&mut config, &args.battery)?;

    let input = config
        .battery
        .sizing_input(args.daily_energy, args.autonomy_days);
    let sizing = size_bank(&input).context("Battery sizing failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sizing)?);
    } else {
        println!("{}", TableFormatter::format_sizing(&input, &sizing));
    }
    Ok(())
}

fn simulate_command(args: SimulateArgs, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let profile = ProfileCsvLoader::new(&args.profile).load()?;

    let settings = SimulationSettings {
        initial_soc: args.initial_soc.unwrap_or(config.simulation.initial_soc),
        ..profile.settings(&config.simulation)?
    };

    let capacity_kwh = if let Some(capacity) = args.capacity_kwh {
        capacity
    } else {
        let days = args.autonomy_days.unwrap_or(1);
        let daily_kwh = profile.energy_balance()?.consumption_kwh;
        let sizing = size_bank(&config.battery.sizing_input(daily_kwh, days))
            .context("Battery sizing failed")?;
        info!(
            "Sized {} batteries ({:.2} kWh) for {} days at {:.2} kWh/day",
            sizing.total_batteries, sizing.realized_capacity_kwh, days, daily_kwh
        );
        sizing.realized_capacity_kwh
    };

    let simulator = SocSimulator::new(capacity_kwh * 1000.0, settings)
        .context("Invalid simulation parameters")?;
    let simulation = simulator
        .run_repeated(&profile.generation_w, &profile.consumption_w, args.days)
        .with_context(|| format!("Simulation of '{}' failed", profile.name))?;

    println!(
        "{}",
        TableFormatter::format_simulation(&profile.name, &simulation)
    );

    if let Some(trace_path) = &args.trace_csv {
        CsvFormatter::write_soc_trace(&simulation, &profile.hours, Path::new(trace_path))
            .with_context(|| format!("Failed to write SOC trace to {trace_path}"))?;
        println!("SOC trace exported to: {trace_path}");
    }
    Ok(())
}

fn compare_command(args: CompareArgs, config_path: Option<&str>) -> Result<()> {
    if args.output.wants_csv() && args.output.csv_path.is_none() {
        anyhow::bail!("--csv-path is required when --output is 'csv' or 'both'");
    }
    if args.output.wants_json() && args.output.json_path.is_none() {
        anyhow::bail!("--json-path is required when --output is 'json'");
    }

    let config = load_config(config_path)?;
    let profiles = args
        .profiles
        .iter()
        .map(|path| ProfileCsvLoader::new(path).load())
        .collect::<Result<Vec<_>>>()?;
    let candidate_days = args
        .autonomy_days
        .clone()
        .unwrap_or_else(|| config.autonomy_days.clone());

    let comparison = compare_profiles(&profiles, &candidate_days, &config)?;

    if args.output.wants_table() {
        println!("{}", TableFormatter::format_comparison(&comparison));
    }
    if args.output.wants_csv()
        && let Some(csv_path) = &args.output.csv_path
    {
        CsvFormatter::write_comparison(&comparison, Path::new(csv_path))
            .with_context(|| format!("Failed to write CSV to {csv_path}"))?;
        println!("CSV exported to: {csv_path}");
    }
    if args.output.wants_json()
        && let Some(json_path) = &args.output.json_path
    {
        JsonFormatter::write(&comparison, Path::new(json_path))?;
        println!("JSON exported to: {json_path}");
    }
    Ok(())
}

fn resource_command(args: ResourceArgs, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let array = match &args.array {
        Some(name) => config
            .pv_array(name)
            .with_context(|| format!("PV array '{name}' is not in the configuration"))?,
        None => config
            .pv_arrays
            .first()
            .context("The configuration has no PV arrays")?,
    };

    let dataset = TmyCsvLoader::new(&args.tmy).load()?;
    let load = load_load_profile(Path::new(&args.load))?;
    let resource = build_daily_profile(
        &dataset,
        &load,
        args.month,
        args.day,
        array,
        config.site.latitude_deg,
    )?;
    let balance = resource.profile.energy_balance()?;

    println!("{}", TableFormatter::format_resource(&resource, &balance)?);

    if let Some(profile_path) = &args.profile_csv {
        CsvFormatter::write_profile(&resource.profile, Path::new(profile_path))
            .with_context(|| format!("Failed to write profile to {profile_path}"))?;
        println!("Profile exported to: {profile_path}");
    }
    Ok(())
}

fn config_command(args: ConfigArgs) -> Result<()> {
    if !args.example
        && let Some(path) = &args.validate
    {
        let config = AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {path}"))?;
        let warnings = config
            .validate()
            .with_context(|| format!("Invalid configuration in {path}"))?;
        if warnings.is_empty() {
            println!("{path}: OK");
        } else {
            println!("{path}: valid with {} advisories", warnings.len());
            for warning in &warnings {
                println!("  - {warning}");
            }
        }
        return Ok(());
    }

    print!("{}", AnalysisConfig::example_toml());
    Ok(())
}
