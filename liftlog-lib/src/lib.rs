// src/lib.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// --- Declare modules ---
pub mod chart;
pub mod codec;
mod config;
pub mod entry;
mod error;
pub mod history;
pub mod models;
pub mod nutrition;
pub mod selection;
pub mod store;

// --- Expose public types ---
pub use chart::{to_chart_points, to_chart_points_with, ChartMetric};
pub use codec::{to_display_label, to_storage_key, ExerciseCatalog};
pub use config::{
    get_config_path as get_config_path_util, load_config as load_config_util, parse_color,
    save_config as save_config_util, validate_url, Config, ConfigError, NutritionConfig,
    StandardColor, Theme, Units,
};
pub use entry::{EntryDraft, EntryForm};
pub use error::{LogError, NutritionError, StoreError};
pub use history::{RefreshTicket, RefreshTracker};
pub use models::{CreatedEntry, DataPoint, DropdownItem, EntryId, ExerciseEntry, NewExerciseEntry};
pub use nutrition::{
    NutritionFacts, NutritionLookup, NutritionixClient, NutritionixCredentials, ProductRecord,
    ServingCalculation,
};
pub use selection::{Completion, ExerciseLog, Modal, ModalKind, Notice, NoticeKind, Phase};
pub use store::{ExerciseStore, HttpExerciseStore};

/// Entry point for front ends: owns the configuration and the HTTP collaborators.
pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    store: Arc<HttpExerciseStore>,
    nutrition: NutritionixClient,
}

impl AppService {
    /// Initializes the application service from the config file.
    /// # Errors
    /// Returns `anyhow::Error` if the config cannot be located, loaded or validated,
    /// or an HTTP client cannot be built.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        Self::with_config(config, config_path)
    }

    /// Builds the service around an already loaded config.
    /// # Errors
    /// Returns `anyhow::Error` if the config is invalid or an HTTP client cannot be built.
    pub fn with_config(config: Config, config_path: PathBuf) -> Result<Self> {
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {config_path:?}"))?;
        let store = Arc::new(build_store(&config)?);
        let nutrition = build_nutrition(&config)?;
        Ok(Self {
            config,
            config_path,
            store,
            nutrition,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// # Errors
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    /// Points the service at another store and persists the choice.
    /// # Errors
    /// Returns `anyhow::Error` for an invalid URL or a failed save.
    pub fn set_store_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        config::validate_url(url)?;
        self.config.store_url = url.to_string();
        self.store = Arc::new(build_store(&self.config)?);
        self.save_config()?;
        info!("Store URL set to {}", url);
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError` if the file cannot be written.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    pub fn store(&self) -> Arc<HttpExerciseStore> {
        Arc::clone(&self.store)
    }

    /// A fresh exercise screen state bound to the configured store.
    pub fn exercise_log(&self) -> ExerciseLog<HttpExerciseStore> {
        ExerciseLog::new(self.store())
            .with_notice_ttl(self.config.notice_ttl())
            .with_metric(self.config.chart_metric)
    }

    /// Nutrition facts for a scanned barcode.
    /// # Errors
    /// `Validation` for a blank code, `LookupNotFound` if the provider knows no
    /// such product, `Transport` on provider failure.
    pub async fn lookup_barcode(&self, upc: &str) -> Result<NutritionFacts, LogError> {
        let upc = upc.trim();
        if upc.is_empty() {
            return Err(LogError::Validation("Barcode is empty.".to_string()));
        }
        self.nutrition
            .lookup_by_barcode(upc)
            .await?
            .map(NutritionFacts::from)
            .ok_or_else(|| LogError::LookupNotFound(format!("a product with barcode {upc}")))
    }

    /// Branded products matching `query`. A blank query returns nothing.
    /// # Errors
    /// `Transport` on provider failure.
    pub async fn search_food(&self, query: &str) -> Result<Vec<ProductRecord>, LogError> {
        Ok(self.nutrition.search_by_text(query).await?)
    }

    /// Foods parsed from a free-text description. A blank query returns nothing.
    /// # Errors
    /// `Transport` on provider failure.
    pub async fn search_food_natural(&self, query: &str) -> Result<Vec<ProductRecord>, LogError> {
        Ok(self.nutrition.search_natural(query).await?)
    }
}

fn build_store(config: &Config) -> Result<HttpExerciseStore> {
    HttpExerciseStore::new(&config.store_url, config.request_timeout())
        .context("Failed to build exercise store client")
}

fn build_nutrition(config: &Config) -> Result<NutritionixClient> {
    let credentials = config
        .nutrition
        .resolved_credentials()
        .map(|(app_id, app_key)| NutritionixCredentials {
            app_id,
            app_key,
            remote_user_id: config.nutrition.remote_user_id.clone(),
        });
    NutritionixClient::new(
        &config.nutrition.base_url,
        credentials,
        config.request_timeout(),
    )
    .context("Failed to build nutrition client")
}
