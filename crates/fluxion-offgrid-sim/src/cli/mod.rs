// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! CLI module for the off-grid analysis command-line interface.

pub mod args;
pub mod config;
pub mod data_loaders;
pub mod formatters;

pub use args::{
    Cli, CloudinessArgs, Commands, CompareArgs, ConfigArgs, ResourceArgs, SimulateArgs, SizeArgs,
};
pub use config::{apply_battery_overrides, load_config};
pub use data_loaders::{
    CsvLoadProfileLoader, DataLoader, LoadProfile, ProfileCsvLoader, TmyCsvLoader,
    XlsxLoadProfileLoader, load_load_profile,
};
pub use formatters::{CsvFormatter, JsonFormatter, TableFormatter};
