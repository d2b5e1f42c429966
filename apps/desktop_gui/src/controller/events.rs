//! UI/backend events and error modeling for the prediction form.

use shared::{
    domain::InputState,
    error::{PredictionError, PredictionErrorKind},
};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    InputsRestored(InputState),
    PredictionRendered {
        text: String,
        colour: Option<String>,
    },
    SubmissionFailed(UiError),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Network,
    Server,
    Parse,
    Startup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    message: String,
}

impl UiError {
    pub fn from_prediction(error: &PredictionError) -> Self {
        let category = match error.kind() {
            PredictionErrorKind::Network => UiErrorCategory::Network,
            PredictionErrorKind::Server => UiErrorCategory::Server,
            PredictionErrorKind::Parse => UiErrorCategory::Parse,
        };
        Self {
            category,
            message: error.to_string(),
        }
    }

    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Startup,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One line suitable for the status area.
    pub fn summary(&self) -> String {
        let prefix = match self.category() {
            UiErrorCategory::Network => "Could not reach the prediction service",
            UiErrorCategory::Server => "The prediction service rejected the request",
            UiErrorCategory::Parse => "The prediction service sent an unreadable reply",
            UiErrorCategory::Startup => "Backend failed to start",
        };
        format!("{prefix} ({})", self.message())
    }
}
