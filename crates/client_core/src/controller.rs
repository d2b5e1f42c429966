//! Submission flow: persist the form, call the prediction service, render.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use shared::{
    domain::{InputState, PersistedInputs},
    error::PredictionError,
    protocol::{PredictionRequest, PredictionResponse, PredictionValue},
};
use storage::{InputStore, KeyValueStore};
use tracing::{debug, error, info, warn};

use crate::PredictionService;

/// The display surface a controller writes into.
pub trait ResultView: Send + Sync {
    /// Hydrates the form with values from a previous session.
    fn restore_inputs(&self, _inputs: &PersistedInputs) {}

    /// `colour` is `None` when the service did not send one; the surface
    /// keeps whatever colour it already had.
    fn set_result(&self, text: &str, colour: Option<&str>);

    /// Failures are silent unless a surface opts in.
    fn show_failure(&self, _error: &PredictionError) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResult {
    pub text: String,
    pub colour: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Rendered(RenderedResult),
    Failed(PredictionError),
}

pub fn format_prediction(value: &PredictionValue) -> String {
    format!("Prediction: {value} grams")
}

pub fn render_prediction(view: &dyn ResultView, response: &PredictionResponse) -> RenderedResult {
    let rendered = RenderedResult {
        text: format_prediction(&response.prediction),
        colour: response.colour_prediction.clone(),
    };
    view.set_result(&rendered.text, rendered.colour.as_deref());
    rendered
}

#[derive(Clone)]
pub struct SubmissionController {
    inputs: InputStore,
    service: Arc<dyn PredictionService>,
    view: Arc<dyn ResultView>,
    in_flight: Arc<AtomicUsize>,
}

impl SubmissionController {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        service: Arc<dyn PredictionService>,
        view: Arc<dyn ResultView>,
    ) -> Self {
        Self {
            inputs: InputStore::new(store),
            service,
            view,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Loads the last submitted inputs and hands them to the view.
    pub async fn initialize(&self) -> PersistedInputs {
        let persisted = match self.inputs.load().await {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!("failed to load persisted inputs: {err:#}");
                PersistedInputs::default()
            }
        };
        self.view.restore_inputs(&persisted);
        persisted
    }

    /// Handles one activation of the submit control.
    ///
    /// Overlapping calls are allowed; whichever response lands last owns the
    /// display.
    pub async fn submit(&self, inputs: InputState) -> SubmissionOutcome {
        let _guard = InFlightGuard::enter(&self.in_flight);

        if let Err(err) = self.inputs.save_state(&inputs).await {
            warn!("failed to persist form inputs: {err:#}");
        }

        let request = PredictionRequest::from(&inputs);
        debug!(
            domain = %request.domain,
            dataset_size = %request.dataset_size,
            "sending prediction request"
        );

        match self.service.send(&request).await {
            Ok(response) => {
                debug!(?response, "response from prediction service");
                let rendered = render_prediction(self.view.as_ref(), &response);
                info!(text = %rendered.text, colour = ?rendered.colour, "rendered prediction");
                SubmissionOutcome::Rendered(rendered)
            }
            Err(err) => {
                error!(kind = ?err.kind(), "prediction request failed: {err}");
                self.view.show_failure(&err);
                SubmissionOutcome::Failed(err)
            }
        }
    }

    /// Drops the persisted inputs.
    pub async fn forget(&self) -> anyhow::Result<()> {
        self.inputs.clear().await
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
