// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "offgrid")]
#[command(author, version, about = "FluxION Off-grid Solar Analysis CLI")]
#[command(
    long_about = "Solar resource and battery autonomy analysis for off-grid PV sites.\n\
    \nReads a Typical Meteorological Year (TMY) export, classifies every day as clear,\n\
    partly cloudy or very cloudy, and sizes and simulates the battery bank.\n\
    \nExamples:\n  \
    offgrid cloudiness --tmy antofagasta.csv\n  \
    offgrid size --daily-energy 7.5 --autonomy-days 3\n  \
    offgrid simulate --profile invierno.csv --autonomy-days 2 --days 3\n  \
    offgrid compare --profile invierno.csv --profile verano.csv\n  \
    offgrid config --example > offgrid.toml"
)]
pub struct Cli {
    /// Analysis configuration file
    #[arg(
        long,
        global = true,
        help = "Path to a TOML analysis configuration (defaults are used otherwise)"
    )]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify the days of a TMY year and derive the autonomy to design for
    #[command(
        long_about = "Compute the clear-sky irradiance for every TMY sample, classify each day\n\
        by its mean clearness index, and analyze runs of consecutive cloudy days.\n\
        \nThe longest run of very cloudy days plus one is the recommended autonomy.\n\
        \nExamples:\n  \
        offgrid cloudiness --tmy antofagasta.csv\n  \
        offgrid cloudiness --tmy tmy.csv --latitude 40.4 --output both --csv-path days.csv"
    )]
    Cloudiness(CloudinessArgs),

    /// Size a battery bank for a daily energy and autonomy
    #[command(
        long_about = "Compute the series/parallel battery counts needed to store the daily\n\
        energy for the requested number of autonomy days within the usable depth of discharge.\n\
        \nExamples:\n  \
        offgrid size --daily-energy 7.5 --autonomy-days 3\n  \
        offgrid size --daily-energy 12 --autonomy-days 2 --system-voltage 24 --dod 0.5"
    )]
    Size(SizeArgs),

    /// Simulate battery state of charge over a daily profile
    #[command(
        long_about = "Run the state-of-charge simulation over a generation/consumption profile\n\
        (columns Hora, Generacion_PV, Consumo), optionally repeated over several days.\n\
        \nThe capacity is given directly or sized from the profile's daily consumption.\n\
        \nExamples:\n  \
        offgrid simulate --profile invierno.csv --capacity-kwh 19.2\n  \
        offgrid simulate --profile invierno.csv --autonomy-days 2 --days 3 --trace-csv soc.csv"
    )]
    Simulate(SimulateArgs),

    /// Compare autonomy options over one or more seasonal profiles
    #[command(
        long_about = "Size a bank for each autonomy option from the largest daily consumption,\n\
        simulate every profile with it and rate the option by its worst critical step count.\n\
        \nExamples:\n  \
        offgrid compare --profile invierno.csv --profile verano.csv\n  \
        offgrid compare --profile invierno.csv --autonomy-days 1,2,3 --output csv --csv-path cmp.csv"
    )]
    Compare(CompareArgs),

    /// Build a generation/consumption profile for one day of the TMY year
    #[command(
        long_about = "Take one day of observed GHI, transpose it onto the panel plane, resample it\n\
        onto the load table's hours and convert it to PV output for a configured array.\n\
        \nExamples:\n  \
        offgrid resource --tmy antofagasta.csv --load cargas.xlsx --month 6 --day 21\n  \
        offgrid resource --tmy tmy.csv --load cargas.csv --month 12 --day 21 --array steep --profile-csv verano.csv"
    )]
    Resource(ResourceArgs),

    /// Print or validate an analysis configuration
    #[command(
        long_about = "Print an example configuration or validate an existing one.\n\
        \nExamples:\n  \
        offgrid config --example\n  \
        offgrid config --validate offgrid.toml"
    )]
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(
        long,
        default_value = "table",
        value_parser = ["table", "csv", "json", "both"],
        help = "Output format: table (terminal), csv, json or both (table + csv)"
    )]
    pub output: String,

    /// CSV export path
    #[arg(long, help = "Path for CSV export (required for csv and both)")]
    pub csv_path: Option<String>,

    /// JSON export path
    #[arg(long, help = "Path for JSON export (required for json)")]
    pub json_path: Option<String>,
}

impl OutputArgs {
    #[must_use]
    pub fn wants_table(&self) -> bool {
        matches!(self.output.as_str(), "table" | "both")
    }

    #[must_use]
    pub fn wants_csv(&self) -> bool {
        matches!(self.output.as_str(), "csv" | "both")
    }

    #[must_use]
    pub fn wants_json(&self) -> bool {
        self.output == "json"
    }
}

#[derive(Parser, Debug)]
pub struct CloudinessArgs {
    /// TMY CSV export
    #[arg(long, help = "TMY CSV file with a 'Fecha/Hora' header row")]
    pub tmy: String,

    /// Site latitude override
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Site latitude in degrees, negative south of the equator"
    )]
    pub latitude: Option<f64>,

    /// Fixed preamble length
    #[arg(
        long,
        help = "Number of preamble lines before the header (searched for by default)"
    )]
    pub skip_rows: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct BatteryOverrides {
    /// Bank voltage
    #[arg(long, help = "System voltage in volts (usually 12, 24 or 48)")]
    pub system_voltage: Option<f64>,

    /// Usable fraction of capacity
    #[arg(long, help = "Depth of discharge, in (0, 1]")]
    pub dod: Option<f64>,

    /// Single battery voltage
    #[arg(long, help = "Nominal voltage of one battery unit")]
    pub unit_voltage: Option<f64>,

    /// Single battery capacity
    #[arg(long, help = "Capacity of one battery unit in Ah")]
    pub unit_capacity: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct SizeArgs {
    /// Daily energy demand in kWh
    #[arg(long, help = "Daily energy the bank must supply (kWh, >= 0)")]
    pub daily_energy: f64,

    /// Autonomy days
    #[arg(long, help = "Days the bank must cover without generation (>= 1)")]
    pub autonomy_days: u32,

    #[command(flatten)]
    pub battery: BatteryOverrides,

    /// Emit the result as JSON instead of a table
    #[arg(long, default_value_t = false, help = "Print the sizing as JSON")]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Daily profile CSV
    #[arg(long, help = "Profile CSV with columns Hora, Generacion_PV, Consumo")]
    pub profile: String,

    /// Bank capacity in kWh
    #[arg(
        long,
        conflicts_with = "autonomy_days",
        help = "Battery capacity in kWh (must be > 0)"
    )]
    pub capacity_kwh: Option<f64>,

    /// Size the bank for this many autonomy days
    #[arg(
        long,
        help = "Size the bank from the profile's daily consumption for this many days",
        long_help = "Size the bank from the profile's daily consumption for this many days.\n\
          \nUsed when --capacity-kwh is not given; defaults to 1 day."
    )]
    pub autonomy_days: Option<u32>,

    /// Number of days to repeat the profile
    #[arg(long, default_value_t = 1, help = "Repeat the daily profile this many days")]
    pub days: usize,

    /// Initial SOC override
    #[arg(long, help = "Starting state of charge as a fraction (0-1)")]
    pub initial_soc: Option<f64>,

    /// SOC trace export
    #[arg(long, help = "Write the step-by-step SOC trace to this CSV file")]
    pub trace_csv: Option<String>,
}

#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Seasonal profiles
    #[arg(
        long = "profile",
        required = true,
        help = "Profile CSV (repeat for several seasons)"
    )]
    pub profiles: Vec<String>,

    /// Autonomy options to compare
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated autonomy days (defaults to the configuration's list)"
    )]
    pub autonomy_days: Option<Vec<u32>>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ResourceArgs {
    /// TMY CSV export
    #[arg(long, help = "TMY CSV file with a 'Fecha/Hora' header row")]
    pub tmy: String,

    /// Appliance load table
    #[arg(long, help = "Load table (.xlsx or .csv) with an 'Hora' column")]
    pub load: String,

    #[arg(long, help = "Month (1-12)")]
    pub month: u32,

    #[arg(long, help = "Day of month")]
    pub day: u32,

    /// Named PV array
    #[arg(
        long,
        help = "PV array name from the configuration (defaults to the first one)"
    )]
    pub array: Option<String>,

    /// Write the resulting profile
    #[arg(
        long,
        help = "Write the day as a Hora,Generacion_PV,Consumo profile CSV"
    )]
    pub profile_csv: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print an example configuration
    #[arg(long, conflicts_with = "validate", help = "Print an example TOML configuration")]
    pub example: bool,

    /// Validate a configuration file
    #[arg(long, help = "Validate a TOML configuration and list advisories")]
    pub validate: Option<String>,
}
