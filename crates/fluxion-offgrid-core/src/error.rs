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

//! Error types for the off-grid models

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OffgridError {
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("series length mismatch: generation has {generation} steps, consumption has {consumption}")]
    LengthMismatch {
        generation: usize,
        consumption: usize,
    },

    #[error("{what} has {actual} values, expected {expected}")]
    MisalignedSeries {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("empty input series: {0}")]
    EmptySeries(&'static str),

    #[error("timestamps go backwards at sample {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OffgridError>;

/// Reject values that are not strictly positive (NaN included).
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(OffgridError::InvalidParameter {
            name,
            value,
            reason: "must be a finite value > 0",
        })
    }
}

/// Reject values outside the closed unit interval.
pub(crate) fn ensure_fraction(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(OffgridError::InvalidParameter {
            name,
            value,
            reason: "must be within [0, 1]",
        })
    }
}

/// Reject values outside (0, 1], the valid range for efficiencies and DoD.
pub(crate) fn ensure_unit_open_closed(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(OffgridError::InvalidParameter {
            name,
            value,
            reason: "must be within (0, 1]",
        })
    }
}
