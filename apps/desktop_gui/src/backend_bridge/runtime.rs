//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use anyhow::{Context, Result};
use client_core::{HttpPredictionClient, ResultView, Settings, SubmissionController};
use crossbeam_channel::{Receiver, Sender};
use shared::{
    domain::{InputState, PersistedInputs},
    error::PredictionError,
};
use storage::Storage;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};

/// Forwards controller output to the UI thread.
pub struct ChannelResultView {
    ui_tx: Sender<UiEvent>,
    defaults: InputState,
}

impl ChannelResultView {
    pub fn new(ui_tx: Sender<UiEvent>, defaults: InputState) -> Self {
        Self { ui_tx, defaults }
    }

    /// Blocks while the UI queue is full so every submission reaches the UI
    /// and its in-flight count. Only a closed UI drops the event.
    fn deliver(&self, event: UiEvent) {
        if let Err(err) = self.ui_tx.send(event) {
            tracing::warn!("ui event queue closed, dropping {:?}", err.into_inner());
        }
    }
}

impl ResultView for ChannelResultView {
    fn restore_inputs(&self, inputs: &PersistedInputs) {
        if inputs.is_empty() {
            return;
        }
        self.deliver(UiEvent::InputsRestored(inputs.apply_to(&self.defaults)));
    }

    fn set_result(&self, text: &str, colour: Option<&str>) {
        self.deliver(UiEvent::PredictionRendered {
            text: text.to_string(),
            colour: colour.map(str::to_string),
        });
    }

    fn show_failure(&self, error: &PredictionError) {
        self.deliver(UiEvent::SubmissionFailed(UiError::from_prediction(error)));
    }
}

async fn build_controller(
    settings: &Settings,
    ui_tx: Sender<UiEvent>,
) -> Result<SubmissionController> {
    let database_url = settings.database_url()?;
    let storage = Storage::new(&database_url, settings.origin.clone())
        .await
        .with_context(|| format!("failed to open input store '{database_url}'"))?;
    let client = HttpPredictionClient::new(&settings.endpoint)?;
    let view = ChannelResultView::new(ui_tx, settings.form_defaults());
    Ok(SubmissionController::new(
        Arc::new(storage),
        Arc::new(client),
        Arc::new(view),
    ))
}

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!(
                    "failed to build runtime: {err}"
                ))));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let controller = match build_controller(&settings, ui_tx.clone()).await {
                Ok(controller) => controller,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!("{err:#}"))));
                    tracing::error!("backend worker startup failure: {err:#}");
                    return;
                }
            };
            controller.initialize().await;
            let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Submit(inputs) => {
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            controller.submit(inputs).await;
                        });
                    }
                    BackendCommand::Forget => match controller.forget().await {
                        Ok(()) => {
                            let _ = ui_tx
                                .try_send(UiEvent::Info("Forgot remembered inputs".to_string()));
                        }
                        Err(err) => {
                            tracing::warn!("failed to clear remembered inputs: {err:#}");
                        }
                    },
                }
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}
