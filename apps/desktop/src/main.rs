use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    HttpPredictionClient, ResultView, Settings, SubmissionController, SubmissionOutcome,
};
use shared::{
    domain::{InputState, PersistedInputs},
    error::PredictionError,
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Submit a domain and dataset size to the prediction service.
///
/// Values left out fall back to the ones from the previous run.
#[derive(Parser, Debug)]
#[command(name = "autoscore")]
struct Args {
    #[arg(long)]
    domain: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    dataset_size: Option<String>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    origin: Option<String>,
    /// Settings file; defaults to ./autoscore.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Clear the remembered inputs and exit.
    #[arg(long)]
    forget: bool,
}

struct TerminalView {
    show_errors: bool,
}

impl ResultView for TerminalView {
    fn restore_inputs(&self, inputs: &PersistedInputs) {
        if !inputs.is_empty() {
            info!(
                domain = ?inputs.domain,
                dataset_size = ?inputs.dataset_size,
                "restored previous inputs"
            );
        }
    }

    fn set_result(&self, text: &str, colour: Option<&str>) {
        println!("{}", terminal_output(text, colour));
    }

    fn show_failure(&self, error: &PredictionError) {
        if self.show_errors {
            eprintln!("Prediction unavailable: {error}");
        }
    }
}

fn terminal_output(text: &str, colour: Option<&str>) -> String {
    match colour {
        Some(colour) => format!("{text}\ncolour: {colour}"),
        None => text.to_string(),
    }
}

/// Flags beat remembered values, remembered values beat form defaults.
fn resolve_inputs(args: &Args, persisted: &PersistedInputs, defaults: &InputState) -> InputState {
    let restored = persisted.apply_to(defaults);
    InputState {
        domain: args.domain.clone().unwrap_or(restored.domain),
        dataset_size: args.dataset_size.clone().unwrap_or(restored.dataset_size),
    }
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(database_url) = &args.database_url {
        settings.database_url = Some(database_url.clone());
    }
    if let Some(origin) = &args.origin {
        settings.origin = origin.clone();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    apply_overrides(&mut settings, &args);

    let database_url = settings.database_url()?;
    let storage = Storage::new(&database_url, settings.origin.clone())
        .await
        .with_context(|| format!("failed to open input store '{database_url}'"))?;
    let client = HttpPredictionClient::new(&settings.endpoint)?;
    let controller = SubmissionController::new(
        Arc::new(storage),
        Arc::new(client),
        Arc::new(TerminalView {
            show_errors: settings.show_errors,
        }),
    );

    if args.forget {
        controller.forget().await?;
        println!("Forgot remembered inputs for origin '{}'", settings.origin);
        return Ok(());
    }

    let persisted = controller.initialize().await;
    let inputs = resolve_inputs(&args, &persisted, &settings.form_defaults());
    info!(domain = %inputs.domain, dataset_size = %inputs.dataset_size, "submitting");

    match controller.submit(inputs).await {
        SubmissionOutcome::Rendered(_) => {}
        SubmissionOutcome::Failed(err) => {
            tracing::debug!("submission finished without a result: {err}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["autoscore"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn flags_take_precedence_over_remembered_values() {
        let persisted = PersistedInputs {
            domain: Some("audio".to_string()),
            dataset_size: Some("50".to_string()),
        };
        let resolved = resolve_inputs(
            &args(&["--dataset-size", "900"]),
            &persisted,
            &InputState::new("nlp", ""),
        );
        assert_eq!(resolved, InputState::new("audio", "900"));
    }

    #[test]
    fn empty_remembered_values_fall_back_to_defaults() {
        let persisted = PersistedInputs {
            domain: Some(String::new()),
            dataset_size: None,
        };
        let resolved = resolve_inputs(&args(&[]), &persisted, &InputState::new("nlp", "10"));
        assert_eq!(resolved, InputState::new("nlp", "10"));
    }

    #[test]
    fn explicit_empty_flag_is_forwarded() {
        let persisted = PersistedInputs {
            domain: Some("audio".to_string()),
            dataset_size: Some("50".to_string()),
        };
        let resolved = resolve_inputs(
            &args(&["--dataset-size", ""]),
            &persisted,
            &InputState::default(),
        );
        assert_eq!(resolved.dataset_size, "");
    }

    #[test]
    fn overrides_replace_settings() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            &args(&["--endpoint", "http://127.0.0.1:1/predict", "--origin", "lab"]),
        );
        assert_eq!(settings.endpoint, "http://127.0.0.1:1/predict");
        assert_eq!(settings.origin, "lab");
        assert_eq!(settings.database_url, None);
    }

    #[test]
    fn terminal_output_includes_colour_when_present() {
        assert_eq!(
            terminal_output("Prediction: 42.5 grams", Some("green")),
            "Prediction: 42.5 grams\ncolour: green"
        );
        assert_eq!(terminal_output("Prediction: 1 grams", None), "Prediction: 1 grams");
    }
}
