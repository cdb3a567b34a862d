//src/entry.rs
use crate::error::LogError;
use crate::models::{CreatedEntry, EntryId, ExerciseEntry, NewExerciseEntry};
use crate::store::ExerciseStore;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Text-field state of the "add entry" form.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    pub weight: String,
    pub reps: String,
    pub notes: String,
    pub date: DateTime<Utc>,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self {
            weight: String::new(),
            reps: String::new(),
            notes: String::new(),
            date: Utc::now(),
        }
    }
}

impl EntryForm {
    /// Back to defaults: fields cleared, date reset to now.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn draft(&self, exercise_key: &str) -> EntryDraft {
        EntryDraft {
            exercise_key: exercise_key.to_string(),
            weight_text: self.weight.clone(),
            reps_text: self.reps.clone(),
            notes_text: self.notes.clone(),
            date: self.date,
        }
    }
}

/// Raw user input for one new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub exercise_key: String,
    pub weight_text: String,
    pub reps_text: String,
    pub notes_text: String,
    pub date: DateTime<Utc>,
}

fn parse_weight(text: &str) -> Result<f64, LogError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LogError::Validation("Weight is required.".to_string()));
    }
    let weight = trimmed
        .parse::<f64>()
        .map_err(|_| LogError::Validation(format!("Weight '{trimmed}' must be a number.")))?;
    if !weight.is_finite() || weight <= 0.0 {
        return Err(LogError::Validation(format!(
            "Weight '{trimmed}' must be a positive number."
        )));
    }
    Ok(weight)
}

fn parse_reps(text: &str) -> Result<u32, LogError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LogError::Validation("Reps are required.".to_string()));
    }
    let reps = trimmed
        .parse::<i64>()
        .map_err(|_| LogError::Validation(format!("Reps '{trimmed}' must be a whole number.")))?;
    u32::try_from(reps)
        .ok()
        .filter(|r| *r > 0)
        .ok_or_else(|| LogError::Validation(format!("Reps '{trimmed}' must be positive.")))
}

/// Checks a draft and builds the create request. No store call happens here.
///
/// # Errors
/// `LogError::Validation` if weight or reps do not parse, or the key is blank.
pub fn validate_draft(draft: &EntryDraft) -> Result<NewExerciseEntry, LogError> {
    if draft.exercise_key.trim().is_empty() {
        return Err(LogError::Validation("Select an exercise first.".to_string()));
    }
    let weight = parse_weight(&draft.weight_text)?;
    let reps = parse_reps(&draft.reps_text)?;
    let notes = Some(draft.notes_text.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(NewExerciseEntry {
        name: draft.exercise_key.clone(),
        weight,
        reps,
        created_at: draft.date,
        notes,
    })
}

/// Interprets a create response. A response without an id is a failure.
///
/// # Errors
/// `LogError::InconsistentResponse` if the store did not assign an id.
pub fn accept_created(created: CreatedEntry) -> Result<ExerciseEntry, LogError> {
    let name = created.name.clone();
    created.into_entry().ok_or_else(|| {
        warn!("Create response for '{}' carried no id", name);
        LogError::InconsistentResponse(format!("an id for the new '{name}' entry"))
    })
}

/// Submits a validated entry and checks the store assigned it an identity.
///
/// # Errors
/// `LogError::Transport` on store failure, `InconsistentResponse` on a missing id.
pub async fn submit_entry<S: ExerciseStore + ?Sized>(
    store: &S,
    new_entry: &NewExerciseEntry,
) -> Result<ExerciseEntry, LogError> {
    let created = store.create_entry(new_entry).await?;
    let entry = accept_created(created)?;
    info!("Added '{}' entry {}", entry.name, entry.id);
    Ok(entry)
}

/// Deletes an entry. On failure the entry is assumed to still exist.
///
/// # Errors
/// `LogError::Transport` or `LookupNotFound` if the store rejects the delete.
pub async fn remove_entry<S: ExerciseStore + ?Sized>(
    store: &S,
    id: &EntryId,
) -> Result<(), LogError> {
    store.delete_entry(id).await?;
    info!("Removed entry {}", id);
    Ok(())
}
