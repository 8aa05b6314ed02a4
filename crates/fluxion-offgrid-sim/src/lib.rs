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

//! Off-grid Site Analysis for FluxION
//!
//! This crate wires the off-grid models to real input files: TMY exports,
//! seasonal system profiles and appliance load tables. It provides the
//! analysis pipeline and the `offgrid` command-line tool.
//!
//! # Features
//!
//! - **Data Loading**: TMY CSV with metadata preamble, profile CSV, load tables in XLSX or CSV
//! - **Cloudiness Pipeline**: clear-sky series, daily classification, run analysis and report
//! - **Resource Profiles**: one TMY day turned into PV generation against a load table
//! - **Autonomy Comparison**: sizing and simulation over seasonal profiles
//! - **Output**: terminal tables, CSV and JSON export
//!
//! # Example
//!
//! ```ignore
//! use fluxion_offgrid_core::AnalysisConfig;
//! use fluxion_offgrid_sim::{DataLoader, TmyCsvLoader, analyze_cloudiness};
//!
//! let config = AnalysisConfig::default();
//! let dataset = TmyCsvLoader::new("antofagasta.csv").load()?;
//! let analysis = analyze_cloudiness(&dataset, &config)?;
//! println!("{}", analysis.report.recommendation);
//! ```

pub mod cli;
pub mod pipeline;

// Re-exports for convenience
pub use cli::{
    CsvFormatter, CsvLoadProfileLoader, DataLoader, JsonFormatter, LoadProfile, ProfileCsvLoader,
    TableFormatter, TmyCsvLoader, XlsxLoadProfileLoader, load_config, load_load_profile,
};
pub use pipeline::{
    ClearSkySeries, ClearnessAnalysis, CloudinessAnalysis, CloudinessReport, ConditionRuns,
    DailyProfile, ResourceDay, RunAnalysis, analyze_cloudiness, build_daily_profile,
    compare_profiles,
};
