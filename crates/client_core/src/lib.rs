use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::PredictionError,
    protocol::{PredictionRequest, PredictionResponse},
};
use tracing::debug;
use url::Url;

pub mod controller;
pub mod settings;

pub use controller::{
    format_prediction, render_prediction, RenderedResult, ResultView, SubmissionController,
    SubmissionOutcome,
};
pub use settings::Settings;

pub const DEFAULT_PREDICT_URL: &str = "https://harmenk.pythonanywhere.com/predict";

/// One request, one response. Implementations must not retry.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn send(
        &self,
        request: &PredictionRequest,
    ) -> std::result::Result<PredictionResponse, PredictionError>;
}

pub struct HttpPredictionClient {
    http: Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn with_default_endpoint() -> Result<Self> {
        Self::new(DEFAULT_PREDICT_URL)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn send(
        &self,
        request: &PredictionRequest,
    ) -> std::result::Result<PredictionResponse, PredictionError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| PredictionError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Server {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| PredictionError::Network(err.to_string()))?;
        debug!(bytes = body.len(), endpoint = %self.endpoint, "received prediction response");
        serde_json::from_slice(&body).map_err(|err| PredictionError::Parse(err.to_string()))
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid endpoint '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!(
            "unsupported endpoint scheme '{other}' in '{raw}'; expected http or https"
        )),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
