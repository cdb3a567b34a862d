//src/error.rs
use crate::selection::Phase;
use thiserror::Error;

/// Errors surfaced by the exercise log core.
///
/// Every variant is caught at the boundary of the operation that raised it and
/// turned into a transient notice; none of them leave partially applied state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    LookupNotFound(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Server response is missing {0}")]
    InconsistentResponse(String),
    #[error("'{operation}' is not available while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
}

impl LogError {
    /// Text shown to the user in a notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::LookupNotFound(what) => format!("Could not find {what}."),
            Self::Transport(_) | Self::InconsistentResponse(_) => {
                "Request could not be completed, please try again.".to_string()
            }
            Self::InvalidTransition { operation, .. } => {
                format!("Cannot {operation} right now.")
            }
        }
    }

    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Failures talking to the exercise store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Entry not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for LogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::LookupNotFound(what),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Failures talking to the nutrition provider.
#[derive(Error, Debug)]
pub enum NutritionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Nutrition provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Nutrition provider credentials are not configured. Set NUTRITIONIX_APP_ID and NUTRITIONIX_API_KEY.")]
    MissingCredentials,
}

impl From<NutritionError> for LogError {
    fn from(err: NutritionError) -> Self {
        Self::Transport(err.to_string())
    }
}
