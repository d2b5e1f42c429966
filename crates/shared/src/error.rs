use thiserror::Error;

/// Failure modes of a single prediction round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered outside the 2xx range.
    #[error("server responded with status {status}")]
    Server { status: u16 },
    /// The body was not JSON or lacked a required field.
    #[error("malformed prediction response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionErrorKind {
    Network,
    Server,
    Parse,
}

impl PredictionError {
    pub fn kind(&self) -> PredictionErrorKind {
        match self {
            Self::Network(_) => PredictionErrorKind::Network,
            Self::Server { .. } => PredictionErrorKind::Server,
            Self::Parse(_) => PredictionErrorKind::Parse,
        }
    }
}
