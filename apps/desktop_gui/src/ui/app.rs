use std::time::Duration;

use client_core::Settings;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::{Color32, RichText};
use shared::domain::InputState;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{events::UiEvent, orchestration::dispatch_backend_command};
use crate::ui::colour::parse_css_colour;

pub struct PredictionApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    domains: Vec<String>,
    form: InputState,
    result_text: String,
    result_colour: Option<Color32>,
    error_line: Option<String>,
    show_errors: bool,
    pending: usize,
    status: String,
}

impl PredictionApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &Settings,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            domains: settings.domains.clone(),
            form: settings.form_defaults(),
            result_text: String::new(),
            result_colour: None,
            error_line: None,
            show_errors: settings.show_errors,
            pending: 0,
            status: "Starting backend...".to_string(),
        }
    }

    /// Reads the controls and queues a submission. Never blocked by
    /// outstanding requests.
    fn submit(&mut self) {
        let inputs = self.form.clone();
        if dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Submit(inputs),
            &mut self.status,
        ) {
            self.pending += 1;
            self.status = format!("Requests in flight: {}", self.pending);
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::InputsRestored(inputs) => {
                    if !inputs.domain.is_empty() && !self.domains.contains(&inputs.domain) {
                        self.domains.push(inputs.domain.clone());
                    }
                    self.form = inputs;
                }
                UiEvent::PredictionRendered { text, colour } => {
                    self.pending = self.pending.saturating_sub(1);
                    self.result_text = text;
                    self.error_line = None;
                    if let Some(colour) = colour {
                        match parse_css_colour(&colour) {
                            Some(parsed) => self.result_colour = Some(parsed),
                            None => tracing::warn!(%colour, "ignoring unrecognised colour"),
                        }
                    }
                    self.status = format!("Requests in flight: {}", self.pending);
                }
                UiEvent::SubmissionFailed(err) => {
                    self.pending = self.pending.saturating_sub(1);
                    if self.show_errors {
                        self.error_line = Some(err.summary());
                    }
                    self.status = format!("Requests in flight: {}", self.pending);
                }
                UiEvent::Error(err) => {
                    self.status = err.summary();
                }
            }
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("prediction_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Domain");
                egui::ComboBox::from_id_salt("domain_select")
                    .selected_text(self.form.domain.clone())
                    .show_ui(ui, |ui| {
                        for domain in &self.domains {
                            ui.selectable_value(
                                &mut self.form.domain,
                                domain.clone(),
                                domain.as_str(),
                            );
                        }
                    });
                ui.end_row();

                ui.label("Dataset size");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.dataset_size)
                        .hint_text("number of samples"),
                );
                ui.end_row();
            });
    }

    fn show_result(&self, ui: &mut egui::Ui) {
        let text = RichText::new(self.result_text.as_str()).size(18.0);
        match self.result_colour {
            Some(colour) => ui.label(text.color(colour)),
            None => ui.label(text),
        };
        if let Some(error) = &self.error_line {
            ui.colored_label(Color32::LIGHT_RED, error.as_str());
        }
    }
}

impl eframe::App for PredictionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Training emissions estimate");
            ui.add_space(8.0);
            self.show_form(ui);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Submit").clicked() {
                    self.submit();
                }
                if ui.button("Forget inputs").clicked() {
                    dispatch_backend_command(&self.cmd_tx, BackendCommand::Forget, &mut self.status);
                }
            });
            ui.separator();
            self.show_result(ui);
            ui.add_space(8.0);
            ui.small(self.status.as_str());
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
