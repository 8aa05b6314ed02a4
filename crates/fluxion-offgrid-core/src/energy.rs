// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Resampling and energy integration of power series.
//!
//! Integration is rectangular: every sample holds its power for one
//! timestep. This is the same accounting the SOC simulation uses, so energy
//! totals and simulated charge/discharge reconcile.

use serde::{Deserialize, Serialize};

use crate::error::{OffgridError, Result, ensure_positive};

/// Tolerance when comparing the gaps of a fractional-hour series
const CADENCE_TOLERANCE_HOURS: f64 = 1e-6;

fn ensure_finite(name: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(OffgridError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        }),
        None => Ok(()),
    }
}

/// Linear interpolation of `(xp, fp)` at each `x`, holding the edge values
/// outside `[xp[0], xp[last]]`. `xp` must be strictly increasing and every
/// input finite.
pub fn interpolate_linear(x: &[f64], xp: &[f64], fp: &[f64]) -> Result<Vec<f64>> {
    ensure_finite("x", x)?;
    ensure_finite("xp", xp)?;
    ensure_finite("fp", fp)?;
    if xp.len() != fp.len() {
        return Err(OffgridError::MisalignedSeries {
            what: "interpolation values",
            expected: xp.len(),
            actual: fp.len(),
        });
    }
    let (Some(&first_x), Some(&last_x)) = (xp.first(), xp.last()) else {
        return Err(OffgridError::EmptySeries("interpolation points"));
    };
    if let Some(index) = xp.windows(2).position(|w| w[1] <= w[0]) {
        return Err(OffgridError::InvalidParameter {
            name: "xp",
            value: xp[index + 1],
            reason: "interpolation points must be strictly increasing",
        });
    }

    Ok(x.iter()
        .map(|&v| {
            if v <= first_x {
                return fp[0];
            }
            if v >= last_x {
                return fp[fp.len() - 1];
            }
            // First point strictly above v; v > first_x so upper >= 1
            let upper = xp.partition_point(|&p| p <= v);
            let (x0, x1) = (xp[upper - 1], xp[upper]);
            let (y0, y1) = (fp[upper - 1], fp[upper]);
            y0 + (y1 - y0) * (v - x0) / (x1 - x0)
        })
        .collect())
}

/// Energy of a power series (Wh) with a fixed step
#[must_use]
pub fn integrate_wh(power_w: &[f64], timestep_hours: f64) -> f64 {
    power_w.iter().sum::<f64>() * timestep_hours
}

/// Cadence of a regular series of fractional hours.
///
/// Every gap must match the first one; irregular series are rejected.
pub fn timestep_from_hours(hours: &[f64]) -> Result<f64> {
    let [first, second, ..] = hours else {
        return Err(OffgridError::EmptySeries("profile hours"));
    };
    let step = second - first;
    ensure_positive("timestep_hours", step)?;
    if let Some(gap) = hours
        .windows(2)
        .map(|w| w[1] - w[0])
        .find(|gap| !((gap - step).abs() <= CADENCE_TOLERANCE_HOURS))
    {
        return Err(OffgridError::InvalidParameter {
            name: "timestep_hours",
            value: gap,
            reason: "profile hours must be evenly spaced",
        });
    }
    Ok(step)
}

/// Energy totals of paired generation/consumption series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    pub generation_kwh: f64,
    pub consumption_kwh: f64,
    /// Energy available for charging (generation above consumption)
    pub surplus_kwh: f64,
    /// Energy the battery has to supply (consumption above generation)
    pub deficit_kwh: f64,
    pub net_kwh: f64,
}

impl EnergyBalance {
    pub fn from_series(
        generation_w: &[f64],
        consumption_w: &[f64],
        timestep_hours: f64,
    ) -> Result<Self> {
        if generation_w.len() != consumption_w.len() {
            return Err(OffgridError::LengthMismatch {
                generation: generation_w.len(),
                consumption: consumption_w.len(),
            });
        }
        ensure_positive("timestep_hours", timestep_hours)?;

        let mut surplus_wh = 0.0;
        let mut deficit_wh = 0.0;
        for (g, c) in generation_w.iter().zip(consumption_w) {
            let balance = (g - c) * timestep_hours;
            if balance > 0.0 {
                surplus_wh += balance;
            } else {
                deficit_wh -= balance;
            }
        }

        let generation_kwh = integrate_wh(generation_w, timestep_hours) / 1000.0;
        let consumption_kwh = integrate_wh(consumption_w, timestep_hours) / 1000.0;
        Ok(Self {
            generation_kwh,
            consumption_kwh,
            surplus_kwh: surplus_wh / 1000.0,
            deficit_kwh: deficit_wh / 1000.0,
            net_kwh: generation_kwh - consumption_kwh,
        })
    }

    /// Share of consumption covered by generation, capped at 100 %
    #[must_use]
    pub fn coverage_percent(&self) -> f64 {
        if self.consumption_kwh > 0.0 {
            (self.generation_kwh / self.consumption_kwh * 100.0).min(100.0)
        } else {
            100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_inside_and_edges() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 30.0];
        let y = interpolate_linear(&[-1.0, 0.0, 0.5, 1.0, 1.5, 2.0, 5.0], &xp, &fp).unwrap();
        let expected = [0.0, 0.0, 5.0, 10.0, 20.0, 30.0, 30.0];
        for (a, b) in y.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12, "{a} != {b}");
        }
    }

    #[test]
    fn test_interpolate_half_hour_resample() {
        let hours: Vec<f64> = (0..24).map(f64::from).collect();
        let ghi: Vec<f64> = hours.iter().map(|h| if *h == 12.0 { 1000.0 } else { 0.0 }).collect();
        let half_hours: Vec<f64> = (0..48).map(|i| f64::from(i) * 0.5).collect();
        let resampled = interpolate_linear(&half_hours, &hours, &ghi).unwrap();
        assert_eq!(resampled.len(), 48);
        assert!((resampled[23] - 500.0).abs() < 1e-9);
        assert!((resampled[24] - 1000.0).abs() < 1e-9);
        assert_eq!(resampled[47], 0.0);
    }

    #[test]
    fn test_interpolate_rejects_bad_points() {
        assert!(interpolate_linear(&[0.0], &[], &[]).is_err());
        assert!(interpolate_linear(&[0.0], &[0.0, 1.0], &[1.0]).is_err());
        assert!(interpolate_linear(&[0.0], &[1.0, 1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_interpolate_rejects_non_finite_values() {
        let xp = [0.0, 1.0];
        let fp = [0.0, 10.0];
        assert!(matches!(
            interpolate_linear(&[0.0, f64::NAN], &xp, &fp),
            Err(OffgridError::InvalidParameter { name: "x", .. })
        ));
        assert!(matches!(
            interpolate_linear(&[0.5], &[0.0, f64::NAN], &fp),
            Err(OffgridError::InvalidParameter { name: "xp", .. })
        ));
        assert!(matches!(
            interpolate_linear(&[0.5], &xp, &[0.0, f64::INFINITY]),
            Err(OffgridError::InvalidParameter { name: "fp", .. })
        ));
    }

    #[test]
    fn test_energy_balance() {
        let generation = [0.0, 1000.0, 2000.0, 0.0];
        let consumption = [500.0, 500.0, 500.0, 500.0];
        let balance = EnergyBalance::from_series(&generation, &consumption, 0.5).unwrap();
        assert!((balance.generation_kwh - 1.5).abs() < 1e-12);
        assert!((balance.consumption_kwh - 1.0).abs() < 1e-12);
        assert!((balance.surplus_kwh - 1.0).abs() < 1e-12);
        assert!((balance.deficit_kwh - 0.5).abs() < 1e-12);
        assert!((balance.net_kwh - 0.5).abs() < 1e-12);
        assert!((balance.surplus_kwh - balance.deficit_kwh - balance.net_kwh).abs() < 1e-12);
        assert!((balance.coverage_percent() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_energy_balance_length_mismatch() {
        assert!(matches!(
            EnergyBalance::from_series(&[1.0], &[1.0, 2.0], 1.0),
            Err(OffgridError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_timestep_from_hours() {
        assert!((timestep_from_hours(&[0.0, 0.5, 1.0]).unwrap() - 0.5).abs() < 1e-12);
        assert!(timestep_from_hours(&[3.0]).is_err());
        assert!(timestep_from_hours(&[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_timestep_rejects_irregular_hours() {
        assert!(matches!(
            timestep_from_hours(&[0.0, 0.5, 1.5, 2.0]),
            Err(OffgridError::InvalidParameter { name: "timestep_hours", .. })
        ));
        assert!(timestep_from_hours(&[0.0, 0.5, f64::NAN]).is_err());
        let hours: Vec<f64> = (0..48).map(|i| f64::from(i) * 0.5).collect();
        assert!((timestep_from_hours(&hours).unwrap() - 0.5).abs() < 1e-12);
    }
}
