use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::corpus::Difficulty;
use crate::util::rounded_mean;

pub const DASHBOARD_RECENT: usize = 5;
pub const DASHBOARD_CHART_LEN: usize = 10;
pub const PROFILE_CHART_LEN: usize = 20;

/// One completed session as persisted in a user's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub wpm: u32,
    pub accuracy: u8,
    pub difficulty: Difficulty,
    #[serde(rename = "duration")]
    pub duration_secs: u32,
    pub completed_at: DateTime<Utc>,
}

/// Highest wpm in a history, 0 when there is none
pub fn prior_high(records: &[ScoreRecord]) -> u32 {
    records.iter().map(|r| r.wpm).max().unwrap_or(0)
}

pub fn is_new_high_score(wpm: u32, prior_high: u32) -> bool {
    wpm > prior_high
}

pub fn newest_first(records: &[ScoreRecord]) -> Vec<ScoreRecord> {
    records
        .iter()
        .sorted_by(|a, b| b.completed_at.cmp(&a.completed_at))
        .cloned()
        .collect()
}

/// A chart sample: 1-based test number against a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub test: usize,
    pub value: f64,
}

impl From<ChartPoint> for (f64, f64) {
    fn from(p: ChartPoint) -> Self {
        (p.test as f64, p.value)
    }
}

/// The last `n` scores in chronological order, numbered from 1
fn chronological_series<F>(sorted_desc: &[ScoreRecord], n: usize, value: F) -> Vec<ChartPoint>
where
    F: Fn(&ScoreRecord) -> f64,
{
    sorted_desc
        .iter()
        .take(n)
        .rev()
        .enumerate()
        .map(|(i, r)| ChartPoint {
            test: i + 1,
            value: value(r),
        })
        .collect()
}

fn wpm_values(records: &[ScoreRecord]) -> Vec<f64> {
    records.iter().map(|r| r.wpm as f64).collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardSummary {
    pub recent: Vec<ScoreRecord>,
    pub high_score: u32,
    pub average_wpm: u32,
    pub wpm_chart: Vec<ChartPoint>,
}

impl DashboardSummary {
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        let sorted = newest_first(records);
        Self {
            recent: sorted.iter().take(DASHBOARD_RECENT).cloned().collect(),
            high_score: prior_high(&sorted),
            average_wpm: rounded_mean(&wpm_values(&sorted)),
            wpm_chart: chronological_series(&sorted, DASHBOARD_CHART_LEN, |r| r.wpm as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileSummary {
    pub total_tests: usize,
    pub high_score: u32,
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub wpm_series: Vec<ChartPoint>,
    pub accuracy_series: Vec<ChartPoint>,
    pub by_difficulty: Vec<(Difficulty, usize)>,
    /// Full history, newest first
    pub scores: Vec<ScoreRecord>,
}

impl ProfileSummary {
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        let sorted = newest_first(records);
        let accuracies: Vec<f64> = sorted.iter().map(|r| r.accuracy as f64).collect();

        let by_difficulty = Difficulty::ALL
            .iter()
            .map(|&d| (d, sorted.iter().filter(|r| r.difficulty == d).count()))
            .collect();

        Self {
            total_tests: sorted.len(),
            high_score: prior_high(&sorted),
            average_wpm: rounded_mean(&wpm_values(&sorted)),
            average_accuracy: rounded_mean(&accuracies),
            wpm_series: chronological_series(&sorted, PROFILE_CHART_LEN, |r| r.wpm as f64),
            accuracy_series: chronological_series(&sorted, PROFILE_CHART_LEN, |r| {
                r.accuracy as f64
            }),
            by_difficulty,
            scores: sorted,
        }
    }
}

/// Write a history as CSV with a header row, newest first
pub const CSV_HEADER: [&str; 5] = ["wpm", "accuracy", "difficulty", "duration", "completed_at"];

pub fn export_csv<W: Write>(records: &[ScoreRecord], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    // serialize only emits the header with the first row
    if records.is_empty() {
        wtr.write_record(CSV_HEADER)?;
    }
    for record in newest_first(records) {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
