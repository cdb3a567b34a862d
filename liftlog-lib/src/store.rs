//src/store.rs
use crate::error::StoreError;
use crate::models::{CreatedEntry, EntryId, ExerciseEntry, NewExerciseEntry};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info};

/// The remote store holding exercise entries.
///
/// It is the single source of truth; nothing here caches its answers.
#[async_trait]
pub trait ExerciseStore: Send + Sync {
    /// Canonical keys of every exercise with at least one entry.
    async fn list_exercise_names(&self) -> Result<Vec<String>, StoreError>;

    async fn list_entries_by_name(&self, key: &str) -> Result<Vec<ExerciseEntry>, StoreError>;

    /// # Errors
    /// `StoreError::NotFound` if no entry has this id.
    async fn get_entry_by_id(&self, id: &EntryId) -> Result<ExerciseEntry, StoreError>;

    /// Returns the stored entry as the store echoes it. The id may be missing
    /// even on success; callers must check.
    async fn create_entry(&self, entry: &NewExerciseEntry) -> Result<CreatedEntry, StoreError>;

    async fn delete_entry(&self, id: &EntryId) -> Result<(), StoreError>;
}

/// `ExerciseStore` over the store's JSON REST API.
pub struct HttpExerciseStore {
    http_client: Client,
    base_url: String,
}

impl HttpExerciseStore {
    /// # Errors
    /// Returns `StoreError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn entries_url(&self) -> String {
        format!("{}/exercises", self.base_url)
    }

    fn entry_url(&self, id: &EntryId) -> String {
        format!("{}/exercises/{}", self.base_url, id)
    }
}

/// Turns a non-success response into a `StoreError`, reading the body for context.
async fn check_status(response: Response, what: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(what.to_string()));
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error body".to_string());
    error!("Store request for {} failed with status {}: {}", what, status, body);
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ExerciseStore for HttpExerciseStore {
    async fn list_exercise_names(&self) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/names", self.entries_url());
        debug!("GET {}", url);
        let response = self.http_client.get(&url).send().await?;
        let names: Vec<String> = check_status(response, "exercise names")
            .await?
            .json()
            .await?;
        info!("Fetched {} exercise names", names.len());
        Ok(names)
    }

    async fn list_entries_by_name(&self, key: &str) -> Result<Vec<ExerciseEntry>, StoreError> {
        let url = self.entries_url();
        debug!("GET {} name={}", url, key);
        let response = self
            .http_client
            .get(&url)
            .query(&[("name", key)])
            .send()
            .await?;
        let entries: Vec<ExerciseEntry> = check_status(response, &format!("entries for '{key}'"))
            .await?
            .json()
            .await?;
        info!("Fetched {} entries for '{}'", entries.len(), key);
        Ok(entries)
    }

    async fn get_entry_by_id(&self, id: &EntryId) -> Result<ExerciseEntry, StoreError> {
        let url = self.entry_url(id);
        debug!("GET {}", url);
        let response = self.http_client.get(&url).send().await?;
        let entry = check_status(response, &format!("entry {id}"))
            .await?
            .json()
            .await?;
        Ok(entry)
    }

    async fn create_entry(&self, entry: &NewExerciseEntry) -> Result<CreatedEntry, StoreError> {
        let url = self.entries_url();
        debug!("POST {} payload: {:?}", url, entry);
        let response = self.http_client.post(&url).json(entry).send().await?;
        let created: CreatedEntry = check_status(response, &format!("new '{}' entry", entry.name))
            .await?
            .json()
            .await?;
        info!("Store accepted '{}' entry, id {:?}", created.name, created.id);
        Ok(created)
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<(), StoreError> {
        let url = self.entry_url(id);
        debug!("DELETE {}", url);
        let response = self.http_client.delete(&url).send().await?;
        check_status(response, &format!("entry {id}")).await?;
        info!("Deleted entry {}", id);
        Ok(())
    }
}
