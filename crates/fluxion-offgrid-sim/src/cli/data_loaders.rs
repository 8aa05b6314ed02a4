// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Data loaders for TMY irradiance files, daily system profiles and
//! appliance load tables.

use anyhow::{Context, Result};
use calamine::{Reader, Xlsx};
use chrono::NaiveDateTime;
use fluxion_offgrid_core::{IrradianceSample, TmyDataset};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::pipeline::DailyProfile;

/// Header of the timestamp column in TMY exports
pub const TMY_TIMESTAMP_COLUMN: &str = "Fecha/Hora";

/// Header of the fractional-hour column in profile and load files
pub const HOUR_COLUMN: &str = "Hora";

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Trait for loading one kind of input file
pub trait DataLoader {
    type Output;

    fn load(&self) -> Result<Self::Output>;
}

/// Loader for TMY CSV exports with a metadata preamble
#[derive(Debug)]
pub struct TmyCsvLoader {
    path: PathBuf,
    skip_rows: Option<usize>,
}

impl TmyCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip_rows: None,
        }
    }

    /// Use a fixed number of preamble lines instead of searching for the header
    #[must_use]
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    /// Parse the contents of a TMY file
    pub fn parse(&self, content: &str) -> Result<TmyDataset> {
        let lines: Vec<&str> = content.lines().collect();
        let header_line = match self.skip_rows {
            Some(skip) if skip < lines.len() => skip,
            Some(skip) => anyhow::bail!(
                "skip_rows {} is past the end of the file ({} lines)",
                skip,
                lines.len()
            ),
            None => lines
                .iter()
                .position(|line| line.contains(TMY_TIMESTAMP_COLUMN))
                .with_context(|| format!("No '{TMY_TIMESTAMP_COLUMN}' header row found"))?,
        };

        let metadata = parse_preamble(&lines[..header_line]);
        debug!("TMY preamble: {} metadata entries", metadata.len());

        let body = lines[header_line..].join("\n");
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(body.as_bytes());

        let headers = reader.headers().context("Failed to read TMY header row")?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let time_col = column(TMY_TIMESTAMP_COLUMN)
            .with_context(|| format!("Missing '{TMY_TIMESTAMP_COLUMN}' column"))?;
        let ghi_col = column("ghi").context("Missing 'ghi' column")?;
        let tilted_col = column("glb");
        let temp_col = column("temp");

        let mut samples = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            // header is line header_line + 1, first data row the one after
            let line_no = header_line + idx + 2;
            let record = record.with_context(|| format!("Malformed CSV at line {line_no}"))?;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let raw_time = record.get(time_col).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time)
                .with_context(|| format!("Invalid timestamp '{raw_time}' at line {line_no}"))?;
            let ghi_w_m2 = parse_number(record.get(ghi_col))
                .with_context(|| format!("Invalid 'ghi' value at line {line_no}"))?
                .with_context(|| format!("Missing 'ghi' value at line {line_no}"))?;
            let tilted_w_m2 = match tilted_col {
                Some(col) => parse_number(record.get(col))
                    .with_context(|| format!("Invalid 'glb' value at line {line_no}"))?,
                None => None,
            };
            let temperature_c = match temp_col {
                Some(col) => parse_number(record.get(col))
                    .with_context(|| format!("Invalid 'temp' value at line {line_no}"))?,
                None => None,
            };

            samples.push(IrradianceSample {
                timestamp,
                ghi_w_m2,
                tilted_w_m2,
                temperature_c,
            });
        }

        let dataset = TmyDataset::new(samples).context("Invalid TMY series")?;
        Ok(dataset.with_metadata(metadata))
    }
}

impl DataLoader for TmyCsvLoader {
    type Output = TmyDataset;

    fn load(&self) -> Result<TmyDataset> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read TMY file {}", self.path.display()))?;
        let dataset = self
            .parse(&content)
            .with_context(|| format!("Failed to parse TMY file {}", self.path.display()))?;
        info!(
            "Loaded {} TMY samples from {}",
            dataset.len(),
            self.path.display()
        );
        Ok(dataset)
    }
}

/// `key,value` pairs of the preamble, split on the first comma so values may
/// contain commas. The block ends at the first separator line (`-`); the
/// variable table that follows it is not metadata. Quoted notes are skipped.
fn parse_preamble(lines: &[&str]) -> BTreeMap<String, String> {
    lines
        .iter()
        .map(|line| line.trim())
        .take_while(|line| !line.starts_with('-'))
        .filter(|line| !line.is_empty() && !line.starts_with('"'))
        .filter_map(|line| {
            let (key, value) = line.split_once(',')?;
            Some((key.trim().to_owned(), value.trim().to_owned()))
        })
        .collect()
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .with_context(|| format!("expected one of {TIMESTAMP_FORMATS:?}"))
}

/// Empty or absent field -> `None`
fn parse_number(raw: Option<&str>) -> Result<Option<f64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(value.parse::<f64>().with_context(|| {
            format!("'{value}' is not a number")
        })?)),
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(rename = "Hora")]
    hour: f64,
    #[serde(rename = "Generacion_PV")]
    generation_w: f64,
    #[serde(rename = "Consumo")]
    consumption_w: f64,
}

/// Loader for a daily system profile (`Hora,Generacion_PV,Consumo`)
#[derive(Debug)]
pub struct ProfileCsvLoader {
    path: PathBuf,
}

impl ProfileCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Profile name taken from the file stem
    fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "profile".to_owned())
    }
}

impl DataLoader for ProfileCsvLoader {
    type Output = DailyProfile;

    fn load(&self) -> Result<DailyProfile> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open profile {}", self.path.display()))?;

        let mut hours = Vec::new();
        let mut generation_w = Vec::new();
        let mut consumption_w = Vec::new();
        for (idx, row) in reader.deserialize::<ProfileRow>().enumerate() {
            let row = row.with_context(|| {
                format!("Invalid profile row {} in {}", idx + 1, self.path.display())
            })?;
            hours.push(row.hour);
            generation_w.push(row.generation_w);
            consumption_w.push(row.consumption_w);
        }
        if hours.is_empty() {
            anyhow::bail!("Profile {} has no rows", self.path.display());
        }

        debug!("Loaded profile '{}' with {} steps", self.name(), hours.len());
        Ok(DailyProfile {
            name: self.name(),
            hours,
            generation_w,
            consumption_w,
        })
    }
}

/// Total consumption of a set of appliances by hour of day
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    /// Strictly increasing fractional hours
    pub hours: Vec<f64>,
    /// Sum of all appliance columns (W)
    pub consumption_w: Vec<f64>,
    pub appliances: Vec<String>,
}

impl LoadProfile {
    /// Build from a header row and parsed data rows.
    ///
    /// Rows sharing an hour are summed together; hours come back sorted.
    pub fn from_rows(header: &[String], rows: &[Vec<Option<f64>>]) -> Result<Self> {
        let hour_col = header
            .iter()
            .position(|h| h == HOUR_COLUMN)
            .with_context(|| format!("Missing '{HOUR_COLUMN}' column"))?;
        let appliances: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != hour_col && !h.is_empty())
            .map(|(_, h)| h.clone())
            .collect();

        let mut totals: Vec<(f64, f64)> = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let hour = row
                .get(hour_col)
                .copied()
                .flatten()
                .with_context(|| format!("Missing '{HOUR_COLUMN}' in data row {}", idx + 1))?;
            if !hour.is_finite() {
                anyhow::bail!("Non-finite '{HOUR_COLUMN}' value {hour} in data row {}", idx + 1);
            }
            let total: f64 = row
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != hour_col)
                .filter_map(|(_, v)| *v)
                .sum();
            totals.push((hour, total));
        }
        if totals.is_empty() {
            anyhow::bail!("Load profile has no data rows");
        }

        totals.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut hours: Vec<f64> = Vec::with_capacity(totals.len());
        let mut consumption_w: Vec<f64> = Vec::with_capacity(totals.len());
        for (hour, total) in totals {
            if let (Some(&last_hour), Some(last_total)) = (hours.last(), consumption_w.last_mut())
                && last_hour == hour
            {
                *last_total += total;
            } else {
                hours.push(hour);
                consumption_w.push(total);
            }
        }

        Ok(Self {
            hours,
            consumption_w,
            appliances,
        })
    }

    /// Energy of one day at the profile's own cadence (kWh)
    pub fn daily_energy_kwh(&self) -> Result<f64> {
        let step = fluxion_offgrid_core::timestep_from_hours(&self.hours)?;
        Ok(fluxion_offgrid_core::integrate_wh(&self.consumption_w, step) / 1000.0)
    }
}

/// Loader for appliance load tables in Excel format (first sheet)
#[derive(Debug)]
pub struct XlsxLoadProfileLoader {
    path: PathBuf,
}

impl XlsxLoadProfileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse workbook bytes
    pub fn parse_bytes(bytes: Vec<u8>) -> Result<LoadProfile> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = Xlsx::new(cursor).context("Failed to open Excel workbook")?;

        let sheet_names = workbook.sheet_names().to_vec();
        let Some(first_sheet) = sheet_names.first() else {
            anyhow::bail!("Workbook has no sheets");
        };
        let range = workbook
            .worksheet_range(first_sheet)
            .with_context(|| format!("Failed to read sheet '{first_sheet}'"))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .context("Load sheet is empty")?
            .iter()
            .map(|cell| cell.to_string().trim().to_owned())
            .collect();

        let mut data = Vec::new();
        for (row_idx, row) in rows.enumerate() {
            if row.iter().all(|cell| matches!(cell, calamine::Data::Empty)) {
                continue;
            }
            let values = row
                .iter()
                .map(cell_value)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Invalid cell in sheet row {}", row_idx + 2))?;
            data.push(values);
        }

        LoadProfile::from_rows(&header, &data)
    }
}

fn cell_value(cell: &calamine::Data) -> Result<Option<f64>> {
    match cell {
        calamine::Data::Float(v) => Ok(Some(*v)),
        calamine::Data::Int(v) => Ok(Some(*v as f64)),
        calamine::Data::Bool(v) => Ok(Some(if *v { 1.0 } else { 0.0 })),
        calamine::Data::String(s) => parse_number(Some(s.as_str())),
        calamine::Data::Empty => Ok(None),
        other => anyhow::bail!("unsupported cell value {other:?}"),
    }
}

impl DataLoader for XlsxLoadProfileLoader {
    type Output = LoadProfile;

    fn load(&self) -> Result<LoadProfile> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read workbook {}", self.path.display()))?;
        let profile = Self::parse_bytes(bytes)
            .with_context(|| format!("Failed to parse load profile {}", self.path.display()))?;
        info!(
            "Loaded load profile with {} appliances from {}",
            profile.appliances.len(),
            self.path.display()
        );
        Ok(profile)
    }
}

/// Loader for appliance load tables exported as CSV
#[derive(Debug)]
pub struct CsvLoadProfileLoader {
    path: PathBuf,
}

impl CsvLoadProfileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataLoader for CsvLoadProfileLoader {
    type Output = LoadProfile;

    fn load(&self) -> Result<LoadProfile> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open load profile {}", self.path.display()))?;

        let header: Vec<String> = reader
            .headers()
            .context("Failed to read load profile header")?
            .iter()
            .map(str::to_owned)
            .collect();

        let mut data = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Malformed load row {}", idx + 1))?;
            let values = record
                .iter()
                .map(|field| parse_number(Some(field)))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Invalid value in load row {}", idx + 1))?;
            data.push(values);
        }

        LoadProfile::from_rows(&header, &data)
            .with_context(|| format!("Failed to parse load profile {}", self.path.display()))
    }
}

/// Pick the load profile loader from the file extension
pub fn load_load_profile(path: &Path) -> Result<LoadProfile> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" => XlsxLoadProfileLoader::new(path).load(),
        "csv" => CsvLoadProfileLoader::new(path).load(),
        other => anyhow::bail!(
            "Unsupported load profile format '{}' for {} (expected .xlsx or .csv)",
            other,
            path.display()
        ),
    }
}
