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

//! Fixtures for the off-grid integration tests: a synthetic TMY year and
//! writers for the on-disk formats the loaders read.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use fluxion_offgrid_core::{ClearSkyModel, IrradianceSample};
use std::io::Write;
use std::path::Path;

/// Days whose GHI is scaled down to a given fraction of clear sky
#[derive(Debug, Clone, Copy)]
pub struct CloudySpell {
    /// Day of year of the first cloudy day (1-based)
    pub start_ordinal: u32,
    pub days: u32,
    pub factor: f64,
}

impl CloudySpell {
    fn covers(&self, ordinal: u32) -> bool {
        (self.start_ordinal..self.start_ordinal + self.days).contains(&ordinal)
    }
}

/// Hourly non-leap year where every sample is the clear-sky irradiance
/// times `clear_factor`, or the spell's factor inside a cloudy spell
#[derive(Debug, Clone)]
pub struct SyntheticYear {
    pub year: i32,
    pub latitude_deg: f64,
    pub clear_factor: f64,
    pub spells: Vec<CloudySpell>,
}

impl SyntheticYear {
    #[must_use]
    pub fn new(latitude_deg: f64) -> Self {
        Self {
            year: 2013,
            latitude_deg,
            clear_factor: 0.85,
            spells: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_spell(mut self, start_ordinal: u32, days: u32, factor: f64) -> Self {
        self.spells.push(CloudySpell {
            start_ordinal,
            days,
            factor,
        });
        self
    }

    fn factor(&self, ordinal: u32) -> f64 {
        self.spells
            .iter()
            .find(|s| s.covers(ordinal))
            .map_or(self.clear_factor, |s| s.factor)
    }

    #[must_use]
    pub fn samples(&self) -> Vec<IrradianceSample> {
        let model = ClearSkyModel::default();
        let start = NaiveDate::from_ymd_opt(self.year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        (0..8760)
            .map(|h| {
                let timestamp: NaiveDateTime = start + Duration::hours(h);
                let theoretical = model.irradiance_at(self.latitude_deg, &timestamp);
                let ghi = theoretical * self.factor(timestamp.ordinal());
                let hour = f64::from(timestamp.hour());
                IrradianceSample {
                    timestamp,
                    ghi_w_m2: ghi,
                    tilted_w_m2: Some(ghi * 1.05),
                    temperature_c: Some(14.0 + 8.0 * (hour / 24.0 * std::f64::consts::PI).sin()),
                }
            })
            .collect()
    }
}

/// Write samples in the TMY export layout: metadata preamble, variable
/// table, then the `Fecha/Hora` data block
pub fn write_tmy_csv(samples: &[IrradianceSample], latitude_deg: f64, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writeln!(file, "Sitio,Sintetico")?;
    writeln!(file, "Latitud,{latitude_deg}")?;
    writeln!(file, "Longitud,-70.40")?;
    writeln!(file, "Zona horaria,UTC-4")?;
    writeln!(file, "\"Archivo generado para pruebas\"")?;
    writeln!(file, "----------------------------------------")?;
    writeln!(file, "ghi,W/m2,Irradiancia global horizontal")?;
    writeln!(file, "glb,W/m2,Irradiancia global en plano inclinado")?;
    writeln!(file, "temp,C,Temperatura a 2 m")?;
    writeln!(file, "----------------------------------------")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["Fecha/Hora", "ghi", "glb", "temp"])?;
    for sample in samples {
        writer.write_record([
            sample.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            sample.ghi_w_m2.to_string(),
            sample.tilted_w_m2.map(|v| v.to_string()).unwrap_or_default(),
            sample.temperature_c.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a `Hora,<appliance>...` load table
pub fn write_load_csv(path: &Path, appliances: &[(&str, Vec<f64>)], hours: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut header = vec!["Hora".to_owned()];
    header.extend(appliances.iter().map(|(name, _)| (*name).to_owned()));
    writer.write_record(&header)?;
    for (i, hour) in hours.iter().enumerate() {
        let mut row = vec![hour.to_string()];
        row.extend(appliances.iter().map(|(_, values)| values[i].to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Hourly day with constant load and a rectangular generation window
#[must_use]
pub fn hourly_profile(
    generation_w: f64,
    sun_hours: std::ops::Range<u32>,
    consumption_w: f64,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let hours: Vec<f64> = (0..24).map(f64::from).collect();
    let generation = (0..24)
        .map(|h| if sun_hours.contains(&h) { generation_w } else { 0.0 })
        .collect();
    (hours, generation, vec![consumption_w; 24])
}
