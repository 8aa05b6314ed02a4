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

//! Runs of consecutive days sharing a sky condition.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clearness::{DailyClassification, SkyCondition};

/// Autonomy range suggested when the year has no very cloudy day
pub const DEFAULT_AUTONOMY_DAYS: (u32, u32) = (2, 3);

/// A maximal stretch of consecutive days with the same label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub condition: SkyCondition,
    /// Index of the first day in the classified sequence
    pub start: usize,
    pub len: usize,
}

impl Run {
    /// Index one past the last member day
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[must_use]
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

/// Split a label sequence into maximal runs in a single pass.
///
/// Every position belongs to exactly one run and adjacent runs always differ
/// in label.
#[must_use]
pub fn find_runs(labels: &[SkyCondition]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current: Option<Run> = None;

    for (index, &condition) in labels.iter().enumerate() {
        if let Some(run) = current.as_mut()
            && run.condition == condition
        {
            run.len += 1;
            continue;
        }
        runs.extend(current.replace(Run {
            condition,
            start: index,
            len: 1,
        }));
    }

    runs.extend(current);
    runs
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub count: usize,
    pub max_len: usize,
    pub min_len: usize,
    pub mean_len: f64,
    pub median_len: f64,
}

impl RunStatistics {
    fn from_lengths(mut lengths: Vec<usize>) -> Option<Self> {
        if lengths.is_empty() {
            return None;
        }
        lengths.sort_unstable();
        let count = lengths.len();
        let median_len = if count % 2 == 1 {
            lengths[count / 2] as f64
        } else {
            (lengths[count / 2 - 1] + lengths[count / 2]) as f64 / 2.0
        };
        Some(Self {
            count,
            max_len: lengths[count - 1],
            min_len: lengths[0],
            mean_len: lengths.iter().sum::<usize>() as f64 / count as f64,
            median_len,
        })
    }
}

/// A run resolved against the classified days it spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedRun {
    pub run: Run,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutonomyRecommendation {
    /// Longest very cloudy run plus one day
    FromLongestRun { longest_run_days: usize, days: u32 },
    /// No very cloudy day in the record
    Default { min_days: u32, max_days: u32 },
}

impl AutonomyRecommendation {
    /// Days to size the bank for; the upper end of the default range
    #[must_use]
    pub fn design_days(&self) -> u32 {
        match *self {
            Self::FromLongestRun { days, .. } => days,
            Self::Default { max_days, .. } => max_days,
        }
    }
}

impl std::fmt::Display for AutonomyRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromLongestRun {
                longest_run_days,
                days,
            } => write!(
                f,
                "{days} days (longest very cloudy run {longest_run_days} + 1)"
            ),
            Self::Default { min_days, max_days } => {
                write!(f, "{min_days}-{max_days} days (no very cloudy days)")
            }
        }
    }
}

/// Runs of a classified year with the derived statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSet {
    runs: Vec<Run>,
    dates: Vec<NaiveDate>,
}

impl RunSet {
    #[must_use]
    pub fn from_days(days: &[DailyClassification]) -> Self {
        let labels: Vec<SkyCondition> = days.iter().map(|d| d.condition).collect();
        Self {
            runs: find_runs(&labels),
            dates: days.iter().map(|d| d.date).collect(),
        }
    }

    #[must_use]
    pub fn all(&self) -> &[Run] {
        &self.runs
    }

    pub fn of(&self, condition: SkyCondition) -> impl Iterator<Item = &Run> {
        self.runs.iter().filter(move |r| r.condition == condition)
    }

    /// Number of days covered by all runs
    #[must_use]
    pub fn total_days(&self) -> usize {
        self.runs.iter().map(|r| r.len).sum()
    }

    #[must_use]
    pub fn dated(&self, run: &Run) -> Option<DatedRun> {
        Some(DatedRun {
            run: *run,
            start_date: *self.dates.get(run.start)?,
            end_date: *self.dates.get(run.end().checked_sub(1)?)?,
        })
    }

    /// Longest run of a label; the earliest one on ties
    #[must_use]
    pub fn longest(&self, condition: SkyCondition) -> Option<DatedRun> {
        let mut best: Option<&Run> = None;
        for run in self.of(condition) {
            if best.is_none_or(|b| run.len > b.len) {
                best = Some(run);
            }
        }
        self.dated(best?)
    }

    #[must_use]
    pub fn statistics(&self, condition: SkyCondition) -> Option<RunStatistics> {
        RunStatistics::from_lengths(self.of(condition).map(|r| r.len).collect())
    }

    /// Run count per run length for a label
    #[must_use]
    pub fn length_distribution(&self, condition: SkyCondition) -> BTreeMap<usize, usize> {
        let mut distribution = BTreeMap::new();
        for run in self.of(condition) {
            *distribution.entry(run.len).or_insert(0) += 1;
        }
        distribution
    }

    #[must_use]
    pub fn autonomy_recommendation(&self) -> AutonomyRecommendation {
        match self.longest(SkyCondition::VeryCloudy) {
            Some(longest) => AutonomyRecommendation::FromLongestRun {
                longest_run_days: longest.run.len,
                days: u32::try_from(longest.run.len + 1).unwrap_or(u32::MAX),
            },
            None => AutonomyRecommendation::Default {
                min_days: DEFAULT_AUTONOMY_DAYS.0,
                max_days: DEFAULT_AUTONOMY_DAYS.1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearness::REFERENCE_YEAR;
    use SkyCondition::{Clear, PartlyCloudy, VeryCloudy};

    fn days_from(labels: &[SkyCondition]) -> Vec<DailyClassification> {
        let start = NaiveDate::from_ymd_opt(REFERENCE_YEAR, 1, 1).unwrap();
        labels
            .iter()
            .enumerate()
            .map(|(i, &condition)| DailyClassification {
                date: start + chrono::Days::new(i as u64),
                mean_index: 0.5,
                ghi_mean_w_m2: 0.0,
                ghi_max_w_m2: 0.0,
                ghi_std_w_m2: 0.0,
                theoretical_mean_w_m2: 0.0,
                daylight_samples: 1,
                condition,
            })
            .collect()
    }

    #[test]
    fn test_five_day_example() {
        let set = RunSet::from_days(&days_from(&[
            Clear,
            VeryCloudy,
            VeryCloudy,
            PartlyCloudy,
            VeryCloudy,
        ]));

        let lengths: Vec<usize> = set.of(VeryCloudy).map(|r| r.len).collect();
        assert_eq!(lengths, vec![2, 1]);

        let longest = set.longest(VeryCloudy).unwrap();
        assert_eq!(longest.run.len, 2);
        assert_eq!(longest.start_date, NaiveDate::from_ymd_opt(2000, 1, 2).unwrap());
        assert_eq!(longest.end_date, NaiveDate::from_ymd_opt(2000, 1, 3).unwrap());

        let rec = set.autonomy_recommendation();
        assert_eq!(
            rec,
            AutonomyRecommendation::FromLongestRun {
                longest_run_days: 2,
                days: 3
            }
        );
        assert_eq!(rec.design_days(), 3);
    }

    #[test]
    fn test_runs_partition_the_sequence() {
        let labels = [
            Clear, Clear, PartlyCloudy, VeryCloudy, VeryCloudy, VeryCloudy, Clear, PartlyCloudy,
            PartlyCloudy, Clear,
        ];
        let runs = find_runs(&labels);

        assert_eq!(runs.iter().map(|r| r.len).sum::<usize>(), labels.len());
        for pair in runs.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
            assert_ne!(pair[0].condition, pair[1].condition);
        }
        for run in &runs {
            assert!(run.indices().all(|i| labels[i] == run.condition));
        }
    }

    #[test]
    fn test_empty_sequence() {
        assert!(find_runs(&[]).is_empty());
        let set = RunSet::from_days(&[]);
        assert_eq!(set.total_days(), 0);
        assert!(set.longest(VeryCloudy).is_none());
        assert!(set.statistics(Clear).is_none());
    }

    #[test]
    fn test_no_very_cloudy_days_falls_back() {
        let set = RunSet::from_days(&days_from(&[Clear, PartlyCloudy, Clear]));
        assert_eq!(set.of(VeryCloudy).count(), 0);
        let rec = set.autonomy_recommendation();
        assert_eq!(
            rec,
            AutonomyRecommendation::Default {
                min_days: 2,
                max_days: 3
            }
        );
        assert_eq!(rec.design_days(), 3);
    }

    #[test]
    fn test_statistics_and_distribution() {
        let set = RunSet::from_days(&days_from(&[
            VeryCloudy, Clear, VeryCloudy, VeryCloudy, VeryCloudy, Clear, VeryCloudy, Clear,
            VeryCloudy, VeryCloudy, VeryCloudy,
        ]));

        let stats = set.statistics(VeryCloudy).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.max_len, 3);
        assert_eq!(stats.min_len, 1);
        assert!((stats.mean_len - 2.0).abs() < 1e-9);
        assert!((stats.median_len - 2.0).abs() < 1e-9);

        let dist = set.length_distribution(VeryCloudy);
        assert_eq!(dist.get(&1), Some(&2));
        assert_eq!(dist.get(&3), Some(&2));

        // Ties resolve to the earliest run
        assert_eq!(set.longest(VeryCloudy).unwrap().run.start, 2);
    }
}
