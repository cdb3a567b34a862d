//src/history.rs
use crate::chart::{to_chart_points_with, ChartMetric};
use crate::error::LogError;
use crate::models::DataPoint;
use crate::store::ExerciseStore;
use tracing::debug;

/// Fetches every entry for `key` and turns them into chart points.
///
/// Pure with respect to view state: applying the result is the caller's job,
/// and only after checking its [`RefreshTicket`].
///
/// # Errors
/// `LogError::Transport` (or `LookupNotFound`) if the store request fails.
pub async fn load_history<S: ExerciseStore + ?Sized>(
    store: &S,
    key: &str,
    metric: ChartMetric,
) -> Result<Vec<DataPoint>, LogError> {
    let entries = store.list_entries_by_name(key).await?;
    let points = to_chart_points_with(&entries, metric);
    debug!("History for '{}': {} points ({})", key, points.len(), metric);
    Ok(points)
}

/// Tag attached to one in-flight refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub key: String,
    pub generation: u64,
}

/// Decides whether a resolved refresh may still replace the displayed points.
///
/// A result is applied only when its key is the selected one at resolution
/// time and nothing newer has been applied already. There is no cancellation;
/// stale results simply fail this check.
#[derive(Debug, Default)]
pub struct RefreshTracker {
    next_generation: u64,
    applied_generation: u64,
    pending: Vec<RefreshTicket>,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, key: &str) -> RefreshTicket {
        self.next_generation += 1;
        let ticket = RefreshTicket {
            key: key.to_string(),
            generation: self.next_generation,
        };
        self.pending.push(ticket.clone());
        ticket
    }

    /// Marks the ticket resolved and reports whether its result should be applied.
    pub fn resolve(&mut self, ticket: &RefreshTicket, selected_key: Option<&str>) -> bool {
        self.pending.retain(|t| t != ticket);
        selected_key == Some(ticket.key.as_str()) && ticket.generation > self.applied_generation
    }

    pub fn mark_applied(&mut self, ticket: &RefreshTicket) {
        self.applied_generation = self.applied_generation.max(ticket.generation);
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.iter().any(|t| t.key == key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_for_other_exercise_is_rejected() {
        let mut tracker = RefreshTracker::new();
        let deadlift = tracker.issue("deadlift");
        let squat = tracker.issue("squat");

        assert!(tracker.resolve(&squat, Some("squat")));
        tracker.mark_applied(&squat);
        assert!(!tracker.resolve(&deadlift, Some("squat")));
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn older_result_for_same_exercise_cannot_overwrite_newer() {
        let mut tracker = RefreshTracker::new();
        let first = tracker.issue("squat");
        let second = tracker.issue("squat");
        assert!(tracker.is_pending("squat"));

        assert!(tracker.resolve(&second, Some("squat")));
        tracker.mark_applied(&second);
        assert!(!tracker.resolve(&first, Some("squat")));
        assert!(!tracker.is_pending("squat"));
    }
}
