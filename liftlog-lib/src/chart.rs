//src/chart.rs
use crate::models::{DataPoint, ExerciseEntry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a point's `y` value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartMetric {
    #[default]
    Weight,
    /// Epley estimate: weight * (1 + reps / 30).
    #[serde(rename = "estimated-1rm")]
    Estimated1Rm,
    /// Weight * reps for the set.
    Volume,
}

impl ChartMetric {
    pub fn value_for(self, entry: &ExerciseEntry) -> f64 {
        match self {
            Self::Weight => entry.weight,
            Self::Estimated1Rm => calculate_e1rm(entry.weight, entry.reps),
            Self::Volume => entry.weight * f64::from(entry.reps),
        }
    }
}

impl fmt::Display for ChartMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight => write!(f, "weight"),
            Self::Estimated1Rm => write!(f, "estimated-1rm"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

fn calculate_e1rm(weight: f64, reps: u32) -> f64 {
    if reps == 0 || weight <= 0.0 {
        return weight.max(0.0);
    }
    weight * (1.0 + f64::from(reps) / 30.0)
}

/// Converts entries into chart points plotting weight over time.
///
/// One point per entry, ordered by creation time; entries sharing a timestamp
/// keep their input order. Empty input gives an empty output.
pub fn to_chart_points(entries: &[ExerciseEntry]) -> Vec<DataPoint> {
    to_chart_points_with(entries, ChartMetric::Weight)
}

/// Like [`to_chart_points`] with a chosen y metric.
#[allow(clippy::cast_precision_loss)]
pub fn to_chart_points_with(entries: &[ExerciseEntry], metric: ChartMetric) -> Vec<DataPoint> {
    let mut points: Vec<DataPoint> = entries
        .iter()
        .map(|entry| DataPoint {
            x: entry.created_at.timestamp_millis() as f64,
            y: metric.value_for(entry),
            label: entry.id.clone(),
        })
        .collect();
    // sort_by is stable, so ties keep input order
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    points
}
