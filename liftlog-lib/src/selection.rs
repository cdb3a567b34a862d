//src/selection.rs
use crate::chart::ChartMetric;
use crate::codec::{to_display_label, ExerciseCatalog};
use crate::entry::{self, EntryForm};
use crate::error::LogError;
use crate::history::{load_history, RefreshTicket, RefreshTracker};
use crate::models::{DataPoint, DropdownItem, EntryId, ExerciseEntry};
use crate::store::ExerciseStore;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// Where the exercise screen currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Viewing,
    Inspecting,
    CreatingExercise,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "no exercise is selected"),
            Self::Viewing => write!(f, "viewing an exercise"),
            Self::Inspecting => write!(f, "inspecting an entry"),
            Self::CreatingExercise => write!(f, "creating an exercise"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    None,
    NewExercise,
    EntryDetail,
}

/// The modal on screen. The inspected entry lives inside `EntryDetail`, so
/// it exists exactly when that modal is shown.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Modal {
    #[default]
    None,
    NewExercise,
    EntryDetail(ExerciseEntry),
}

impl Modal {
    pub const fn kind(&self) -> ModalKind {
        match self {
            Self::None => ModalKind::None,
            Self::NewExercise => ModalKind::NewExercise,
            Self::EntryDetail(_) => ModalKind::EntryDetail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// A transient message for the user (toast / status bar).
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: &'static str,
    pub message: String,
    pub error: Option<LogError>,
    expires_at: Instant,
}

impl Notice {
    fn error(err: &LogError, ttl: Duration) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Whoops!",
            message: err.user_message(),
            error: Some(err.clone()),
            expires_at: Instant::now() + ttl,
        }
    }

    fn info(message: String, ttl: Duration) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: "Done",
            message,
            error: None,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Result of a store call, delivered back to the log for application.
#[derive(Debug)]
pub enum Completion {
    Exercises(Result<Vec<String>, LogError>),
    History {
        ticket: RefreshTicket,
        result: Result<Vec<DataPoint>, LogError>,
    },
    Inspected {
        key: String,
        id: EntryId,
        result: Result<ExerciseEntry, LogError>,
    },
    Created {
        key: String,
        result: Result<ExerciseEntry, LogError>,
    },
    Deleted {
        key: String,
        id: EntryId,
        result: Result<(), LogError>,
    },
}

/// Selection and drill-down state for the exercise history screen.
///
/// User operations update state synchronously and start store calls in the
/// background; their results come back through [`ExerciseLog::next_completion`]
/// and are applied with [`ExerciseLog::apply`]. Between the two the log stays
/// fully usable, so results may arrive after the user has moved on. They are
/// checked against the current state and dropped when stale.
///
/// Operations that start store calls must run inside a Tokio runtime.
pub struct ExerciseLog<S: ExerciseStore + 'static> {
    store: Arc<S>,
    catalog: ExerciseCatalog,
    selected: Option<DropdownItem>,
    points: Vec<DataPoint>,
    modal: Modal,
    form: EntryForm,
    metric: ChartMetric,
    refreshes: RefreshTracker,
    tasks: JoinSet<Completion>,
    notice: Option<Notice>,
    notice_ttl: Duration,
}

impl<S: ExerciseStore + 'static> ExerciseLog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            catalog: ExerciseCatalog::new(),
            selected: None,
            points: Vec::new(),
            modal: Modal::None,
            form: EntryForm::default(),
            metric: ChartMetric::default(),
            refreshes: RefreshTracker::new(),
            tasks: JoinSet::new(),
            notice: None,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    #[must_use]
    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: ChartMetric) -> Self {
        self.metric = metric;
        self
    }

    // --- State ---

    pub fn phase(&self) -> Phase {
        match (&self.modal, &self.selected) {
            (Modal::NewExercise, _) => Phase::CreatingExercise,
            (Modal::EntryDetail(_), _) => Phase::Inspecting,
            (Modal::None, Some(_)) => Phase::Viewing,
            (Modal::None, None) => Phase::Idle,
        }
    }

    pub const fn selected_exercise(&self) -> Option<&DropdownItem> {
        self.selected.as_ref()
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_ref().map(|item| item.value.as_str())
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub const fn modal(&self) -> &Modal {
        &self.modal
    }

    pub const fn modal_kind(&self) -> ModalKind {
        self.modal.kind()
    }

    pub const fn inspected_entry(&self) -> Option<&ExerciseEntry> {
        match &self.modal {
            Modal::EntryDetail(entry) => Some(entry),
            _ => None,
        }
    }

    pub const fn catalog(&self) -> &ExerciseCatalog {
        &self.catalog
    }

    pub fn dropdown_items(&self) -> Vec<DropdownItem> {
        self.catalog.dropdown_items()
    }

    pub const fn form(&self) -> &EntryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntryForm {
        &mut self.form
    }

    pub const fn metric(&self) -> ChartMetric {
        self.metric
    }

    /// True while a refresh for the selected exercise is outstanding.
    pub fn is_loading(&self) -> bool {
        self.selected_key()
            .is_some_and(|key| self.refreshes.is_pending(key))
    }

    pub fn has_pending_work(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// The current notice, unless it has expired.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|n| !n.is_expired_at(Instant::now()))
    }

    pub fn last_error(&self) -> Option<&LogError> {
        self.notice.as_ref().and_then(|n| n.error.as_ref())
    }

    pub fn clear_expired_notice(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.is_expired_at(Instant::now()))
        {
            self.notice = None;
        }
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // --- Operations ---

    /// Starts loading the known exercise names.
    pub fn load_exercises(&mut self) {
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            let result = store
                .list_exercise_names()
                .await
                .map_err(LogError::from);
            Completion::Exercises(result)
        });
    }

    /// Handles a selector change.
    ///
    /// The "new exercise" sentinel opens the creation modal; any other item
    /// becomes the selection and its history is refreshed. Switching to a
    /// different exercise clears the points at once so none from the old one
    /// linger while the new ones load.
    ///
    /// # Errors
    /// `InvalidTransition` while a modal is open, `Validation` for a blank key.
    pub fn select(&mut self, item: DropdownItem) -> Result<(), LogError> {
        let phase = self.phase();
        if !matches!(phase, Phase::Idle | Phase::Viewing) {
            return Err(self.reject("select an exercise", phase));
        }
        if item.is_new_exercise() {
            debug!("New exercise option chosen");
            self.modal = Modal::NewExercise;
            return Ok(());
        }
        if item.value.trim().is_empty() {
            return Err(self.report(LogError::Validation(
                "Exercise has no storage key.".to_string(),
            )));
        }

        if self.selected_key() != Some(item.value.as_str()) {
            self.points.clear();
        }
        info!("Selected exercise '{}'", item.value);
        let key = item.value.clone();
        self.selected = Some(item);
        self.start_refresh(&key);
        Ok(())
    }

    /// Selects an exercise by its storage key, e.g. from a navigation parameter.
    ///
    /// # Errors
    /// Same as [`ExerciseLog::select`].
    pub fn open_exercise(&mut self, key: &str) -> Result<(), LogError> {
        let item = self
            .catalog
            .get(key)
            .cloned()
            .unwrap_or_else(|| DropdownItem::from_key(key));
        self.select(item)
    }

    /// Resolves a clicked point to its full entry and opens the detail modal.
    ///
    /// # Errors
    /// `InvalidTransition` unless an exercise is being viewed with no modal open.
    pub fn click_point(&mut self, point: &DataPoint) -> Result<(), LogError> {
        let phase = self.phase();
        let target = match (&self.modal, &self.selected) {
            (Modal::None, Some(item)) => Some(item.value.clone()),
            _ => None,
        };
        let Some(key) = target else {
            return Err(self.reject("inspect a point", phase));
        };

        let id = point.label.clone();
        debug!("Looking up entry {} for '{}'", id, key);
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            let result = store.get_entry_by_id(&id).await.map_err(LogError::from);
            Completion::Inspected { key, id, result }
        });
        Ok(())
    }

    /// Closes the open modal, going back to viewing (or idle).
    ///
    /// # Errors
    /// `InvalidTransition` if no modal is open.
    pub fn close_modal(&mut self) -> Result<(), LogError> {
        let phase = self.phase();
        if !matches!(phase, Phase::Inspecting | Phase::CreatingExercise) {
            return Err(self.reject("close a dialog", phase));
        }
        self.modal = Modal::None;
        Ok(())
    }

    /// Adds a user-named exercise to the catalog and selects it.
    ///
    /// A brand-new exercise has no history, so no refresh is made and the
    /// points are empty. A name whose key is already known just selects it.
    ///
    /// # Errors
    /// `InvalidTransition` outside the creation modal, `Validation` for a blank name.
    pub fn confirm_new_exercise(&mut self, name: &str) -> Result<(), LogError> {
        let phase = self.phase();
        if phase != Phase::CreatingExercise {
            return Err(self.reject("confirm a new exercise", phase));
        }
        if name.trim().is_empty() {
            return Err(self.report(LogError::Validation(
                "Please enter a valid exercise name.".to_string(),
            )));
        }

        let (item, created) = self.catalog.append(name);
        self.modal = Modal::None;
        if created && self.selected_key() != Some(item.value.as_str()) {
            info!("Created exercise '{}' ({})", item.label, item.value);
            self.points.clear();
            self.selected = Some(item);
            Ok(())
        } else {
            self.select(item)
        }
    }

    /// Validates the form and submits it as a new entry for the selected exercise.
    ///
    /// Invalid input never reaches the store. On success the form is reset and
    /// the history refreshed; on failure the form is left as typed.
    ///
    /// # Errors
    /// `InvalidTransition` unless viewing an exercise, `Validation` for bad input.
    pub fn submit(&mut self) -> Result<(), LogError> {
        let phase = self.phase();
        let target = match (&self.modal, &self.selected) {
            (Modal::None, Some(item)) => Some(item.value.clone()),
            _ => None,
        };
        let Some(key) = target else {
            return Err(self.reject("add an entry", phase));
        };

        let new_entry = match entry::validate_draft(&self.form.draft(&key)) {
            Ok(new_entry) => new_entry,
            Err(err) => return Err(self.report(err)),
        };
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            let result = entry::submit_entry(store.as_ref(), &new_entry).await;
            Completion::Created { key, result }
        });
        Ok(())
    }

    /// Deletes the entry shown in the detail modal.
    ///
    /// # Errors
    /// `InvalidTransition` unless an entry is being inspected.
    pub fn delete_inspected(&mut self) -> Result<(), LogError> {
        let phase = self.phase();
        let target = match (&self.modal, &self.selected) {
            (Modal::EntryDetail(entry), Some(item)) => Some((entry.id.clone(), item.value.clone())),
            _ => None,
        };
        let Some((id, key)) = target else {
            return Err(self.reject("delete an entry", phase));
        };

        let store = Arc::clone(&self.store);
        self.spawn(async move {
            let result = entry::remove_entry(store.as_ref(), &id).await;
            Completion::Deleted { key, id, result }
        });
        Ok(())
    }

    /// Switches the y metric and reloads the selected exercise with it.
    pub fn set_metric(&mut self, metric: ChartMetric) {
        if self.metric == metric {
            return;
        }
        self.metric = metric;
        if let Some(key) = self.selected_key().map(str::to_owned) {
            self.start_refresh(&key);
        }
    }

    // --- Completions ---

    /// Waits for the next store call to resolve. `None` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(completion) => return Some(completion),
                Err(e) => error!("Exercise log task failed: {}", e),
            }
        }
        None
    }

    /// Applies every outstanding result, including refreshes they trigger.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.next_completion().await {
            self.apply(completion);
        }
    }

    /// Applies one resolved store call to the current state.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Exercises(Ok(keys)) => self.catalog.replace_with_keys(keys),
            Completion::Exercises(Err(err)) => {
                self.report(err);
            }
            Completion::History { ticket, result } => self.apply_history(&ticket, result),
            Completion::Inspected { key, id, result } => self.apply_inspected(&key, &id, result),
            Completion::Created { key, result } => self.apply_created(&key, result),
            Completion::Deleted { key, id, result } => self.apply_deleted(&key, &id, result),
        }
    }

    fn apply_history(&mut self, ticket: &RefreshTicket, result: Result<Vec<DataPoint>, LogError>) {
        let selected = self.selected.as_ref().map(|item| item.value.as_str());
        if !self.refreshes.resolve(ticket, selected) {
            debug!(
                "Discarding stale history for '{}' (generation {})",
                ticket.key, ticket.generation
            );
            return;
        }
        match result {
            Ok(points) => {
                self.refreshes.mark_applied(ticket);
                self.points = points;
            }
            // Existing points stay on screen.
            Err(err) => {
                self.report(err);
            }
        }
    }

    fn apply_inspected(&mut self, key: &str, id: &EntryId, result: Result<ExerciseEntry, LogError>) {
        if self.phase() != Phase::Viewing || self.selected_key() != Some(key) {
            debug!("Discarding lookup of entry {} for '{}'", id, key);
            return;
        }
        match result {
            Ok(entry) if entry.name == key => self.modal = Modal::EntryDetail(entry),
            Ok(entry) => {
                warn!("Entry {} belongs to '{}', not '{}'", id, entry.name, key);
                self.report(LogError::LookupNotFound(format!(
                    "entry {id} for {}",
                    to_display_label(key)
                )));
            }
            Err(err) => {
                self.report(err);
            }
        }
    }

    fn apply_created(&mut self, key: &str, result: Result<ExerciseEntry, LogError>) {
        match result {
            Ok(entry) => {
                self.form.reset();
                self.notice = Some(Notice::info(
                    format!("Logged {} x {}.", entry.weight, entry.reps),
                    self.notice_ttl,
                ));
                self.start_refresh(key);
            }
            // Form keeps what the user typed.
            Err(err) => {
                self.report(err);
            }
        }
    }

    fn apply_deleted(&mut self, key: &str, id: &EntryId, result: Result<(), LogError>) {
        match result {
            Ok(()) => {
                if matches!(self.modal, Modal::EntryDetail(_)) {
                    self.modal = Modal::None;
                }
                self.notice = Some(Notice::info(format!("Deleted entry {id}."), self.notice_ttl));
                self.start_refresh(key);
            }
            // Detail stays open; the entry is assumed to still exist.
            Err(err) => {
                self.report(err);
            }
        }
    }

    // --- Helpers ---

    fn start_refresh(&mut self, key: &str) {
        let ticket = self.refreshes.issue(key);
        debug!("Refreshing '{}' (generation {})", ticket.key, ticket.generation);
        let store = Arc::clone(&self.store);
        let metric = self.metric;
        self.spawn(async move {
            let result = load_history(store.as_ref(), &ticket.key, metric).await;
            Completion::History { ticket, result }
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    fn report(&mut self, err: LogError) -> LogError {
        warn!("{}", err);
        self.notice = Some(Notice::error(&err, self.notice_ttl));
        err
    }

    fn reject(&mut self, operation: &'static str, phase: Phase) -> LogError {
        self.report(LogError::InvalidTransition { operation, phase })
    }
}
