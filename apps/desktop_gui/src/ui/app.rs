use std::{collections::HashMap, time::Duration};

use client_core::{GalleryState, Settings, UploadForm};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{domain::ImageId, error::Failure};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{UiError, UiErrorContext, UiEvent},
        orchestration::dispatch_backend_command,
    },
    media::PreviewImage,
    ui::{toasts::ToastQueue, upload_modal::LocalPreview},
};

pub(crate) enum CardPreview {
    Loading,
    Decoded(PreviewImage),
    Ready(egui::TextureHandle),
    Failed,
}

pub struct StartupConfig {
    pub settings: Settings,
    pub startup_error: Option<String>,
}

pub struct GalleryApp {
    pub(crate) cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    pub(crate) api_base_url: String,
    pub(crate) gallery: GalleryState,
    pub(crate) form: UploadForm,
    pub(crate) upload_modal_open: bool,
    pub(crate) local_preview: Option<LocalPreview>,
    pub(crate) card_previews: HashMap<ImageId, CardPreview>,
    pub(crate) toasts: ToastQueue,
    pub(crate) status: Option<String>,
    pub(crate) status_banner: Option<UiError>,
    worker_status: String,
}

impl GalleryApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            api_base_url: startup.settings.api_base_url,
            gallery: GalleryState::new(),
            form: UploadForm::new(),
            upload_modal_open: false,
            local_preview: None,
            card_previews: HashMap::new(),
            toasts: ToastQueue::default(),
            status: None,
            status_banner: startup
                .startup_error
                .map(|message| UiError::from_message(UiErrorContext::BackendStartup, message)),
            worker_status: "Backend worker starting...".to_string(),
        };
        app.reload_gallery();
        app
    }

    pub(crate) fn dispatch(&mut self, cmd: BackendCommand) -> bool {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status)
    }

    /// Refetches the first page (and every page loaded so far when the cache
    /// entry is stale). The current grid stays visible until the answer lands.
    pub(crate) fn reload_gallery(&mut self) {
        if !self.dispatch(BackendCommand::LoadGallery) {
            let reason = self.status.clone().unwrap_or_default();
            self.gallery.apply_initial(Err(Failure::fetch(reason)));
        }
    }

    pub(crate) fn request_next_page(&mut self) {
        let Some(cursor) = self.gallery.begin_next_page() else {
            return;
        };
        if !self.dispatch(BackendCommand::LoadMoreImages {
            after: cursor.clone(),
        }) {
            let reason = self.status.clone().unwrap_or_default();
            self.gallery.apply_next_page(cursor, Err(Failure::fetch(reason)));
        }
    }

    pub(crate) fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    tracing::debug!("{message}");
                    self.worker_status = message;
                }
                UiEvent::Error(err) => {
                    tracing::error!(context = ?err.context(), category = ?err.category(), "{}", err.message());
                    self.status_banner = Some(err);
                }
                UiEvent::GalleryLoaded(result) => {
                    if let Err(failure) = &result {
                        self.status_banner =
                            Some(UiError::from_failure(UiErrorContext::Gallery, failure));
                    }
                    self.gallery.apply_initial(result);
                }
                UiEvent::NextPageLoaded { cursor, result } => {
                    self.gallery.apply_next_page(cursor, result);
                }
                UiEvent::GalleryInvalidated => self.reload_gallery(),
                UiEvent::ImageUploaded { ticket, result } => {
                    let failed = result.is_err();
                    if !self.form.finish_upload(ticket, result) {
                        tracing::debug!(?ticket, "ignoring result of a replaced upload");
                    } else if failed {
                        self.local_preview = None;
                    }
                }
                UiEvent::LocalPreviewLoaded { ticket, result } => match result {
                    Ok(image) => {
                        let accepted = self
                            .local_preview
                            .as_mut()
                            .is_some_and(|preview| preview.accept(ticket, image));
                        if !accepted {
                            tracing::debug!(?ticket, "ignoring preview of a replaced file");
                        }
                    }
                    Err(reason) => tracing::debug!(?ticket, "local preview unavailable: {reason}"),
                },
                UiEvent::SubmissionFinished(result) => {
                    let report = self.form.finish_submission(result);
                    if let Some(failure) = &report.failure {
                        tracing::warn!("image registration failed: {failure}");
                    }
                    self.toasts.push(report.toast);
                    self.local_preview = None;
                    if report.close_modal {
                        self.upload_modal_open = false;
                    }
                }
                UiEvent::CardPreviewLoaded { id, image } => {
                    self.card_previews.insert(id, CardPreview::Decoded(image));
                }
                UiEvent::CardPreviewFailed { id, reason } => {
                    tracing::debug!(%id, "card preview unavailable: {reason}");
                    self.card_previews.insert(id, CardPreview::Failed);
                }
            }
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let message = match (&self.status_banner, &self.status) {
            (Some(err), _) => err.banner_text(),
            (None, Some(status)) => status.clone(),
            (None, None) => return,
        };

        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                            self.status = None;
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Gallery");
                ui.separator();
                ui.weak(&self.api_base_url);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("➕ Add image").clicked() {
                        self.upload_modal_open = true;
                    }
                    if ui.button("⟳ Refresh").clicked() {
                        self.reload_gallery();
                    }
                });
            });
        });
    }

    fn show_bottom_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small(&self.worker_status);
                ui.separator();
                ui.small(format!("{} images loaded", self.gallery.records().count()));
            });
        });
    }
}

impl eframe::App for GalleryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_bottom_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            self.show_gallery(ui);
        });
        self.show_upload_modal(ctx);
        self.toasts.show(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
