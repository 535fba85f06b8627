//! "Add image" modal: file picker, local preview, fields with inline errors.

use std::{fs, path::PathBuf};

use client_core::{ImageFile, SubmitBlocked, UploadTicket};
use eframe::egui;
use shared::{domain::FormField, error::Failure};

use crate::{
    backend_bridge::commands::BackendCommand,
    media::{guess_mime_type, human_readable_bytes, PreviewImage},
    ui::app::GalleryApp,
};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Picked file shown in the modal. The thumbnail arrives from the worker.
pub(crate) struct LocalPreview {
    pub filename: String,
    pub size_bytes: u64,
    ticket: UploadTicket,
    image: Option<PreviewImage>,
    texture: Option<egui::TextureHandle>,
}

impl LocalPreview {
    fn pending(ticket: UploadTicket, filename: String, size_bytes: u64) -> Self {
        Self {
            filename,
            size_bytes,
            ticket,
            image: None,
            texture: None,
        }
    }

    /// Returns false when the thumbnail belongs to a file that was replaced.
    pub(crate) fn accept(&mut self, ticket: UploadTicket, image: PreviewImage) -> bool {
        if ticket != self.ticket {
            return false;
        }
        self.image = Some(image);
        self.texture = None;
        true
    }

    pub(crate) fn has_image(&self) -> bool {
        self.image.is_some() || self.texture.is_some()
    }

    fn texture(&mut self, ctx: &egui::Context) -> Option<&egui::TextureHandle> {
        if self.texture.is_none() {
            let image = self.image.take()?;
            self.texture = Some(ctx.load_texture(
                format!("local-preview:{}", self.filename),
                image.to_color_image(),
                egui::TextureOptions::LINEAR,
            ));
        }
        self.texture.as_ref()
    }
}

fn default_upload_dir() -> Option<PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::desktop_dir)
        .or_else(dirs::download_dir)
        .or_else(dirs::home_dir)
}

fn field_error(ui: &mut egui::Ui, message: Option<&str>) {
    if let Some(message) = message {
        ui.colored_label(egui::Color32::from_rgb(229, 62, 62), message);
    }
}

impl GalleryApp {
    pub(crate) fn show_upload_modal(&mut self, ctx: &egui::Context) {
        if !self.upload_modal_open {
            return;
        }

        let mut open = true;
        egui::Window::new("Add image")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| self.upload_form_contents(ui));
        if !open {
            self.close_upload_modal();
        }
    }

    /// Dropping the modal discards the draft, including a finished upload.
    pub(crate) fn close_upload_modal(&mut self) {
        self.upload_modal_open = false;
        self.form.reset();
        self.local_preview = None;
    }

    fn upload_form_contents(&mut self, ui: &mut egui::Ui) {
        ui.set_min_width(360.0);

        ui.label(egui::RichText::new("Image").strong());
        ui.horizontal(|ui| {
            if ui.button("Choose image...").clicked() {
                self.pick_image();
            }
            if let Some(preview) = &self.local_preview {
                ui.label(&preview.filename);
                ui.weak(human_readable_bytes(preview.size_bytes));
            }
        });
        if self.form.is_uploading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Uploading...");
            });
        } else if self.form.uploaded_url().is_some() {
            if let Some(texture) = self
                .local_preview
                .as_mut()
                .and_then(|preview| preview.texture(ui.ctx()))
            {
                let mut size = texture.size_vec2();
                if size.y > 240.0 {
                    size *= 240.0 / size.y;
                }
                ui.add(egui::Image::new(texture).fit_to_exact_size(size));
            }
        }
        field_error(ui, self.form.error(FormField::Image));
        ui.add_space(8.0);

        ui.label(egui::RichText::new("Title").strong());
        let title = ui.add(
            egui::TextEdit::singleline(&mut self.form.title)
                .hint_text("Title")
                .desired_width(f32::INFINITY),
        );
        if title.changed() {
            self.form.revalidate(FormField::Title);
        }
        field_error(ui, self.form.error(FormField::Title));
        ui.add_space(8.0);

        ui.label(egui::RichText::new("Description").strong());
        let description = ui.add(
            egui::TextEdit::multiline(&mut self.form.description)
                .hint_text("Description")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if description.changed() {
            self.form.revalidate(FormField::Description);
        }
        field_error(ui, self.form.error(FormField::Description));
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            let submitting = self.form.is_submitting();
            if ui
                .add_enabled(!submitting, egui::Button::new("Submit"))
                .clicked()
            {
                self.submit_form();
            }
            if submitting {
                ui.spinner();
            }
            if ui.button("Cancel").clicked() {
                self.close_upload_modal();
            }
        });
    }

    fn pick_image(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS);
        if let Some(dir) = default_upload_dir() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.attach_picked_file(path);
        }
    }

    /// Validates the file right away and, when it passes, starts the upload.
    pub(crate) fn attach_picked_file(&mut self, path: PathBuf) {
        self.local_preview = None;
        let size_bytes = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                tracing::warn!(path = %path.display(), "cannot read picked file: {err}");
                self.form.clear_image();
                self.status = Some(format!("Cannot read '{}': {err}", path.display()));
                return;
            }
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime_type = guess_mime_type(&path);

        let ticket = match self.form.select_image(ImageFile {
            filename: filename.clone(),
            size_bytes,
            mime_type: mime_type.clone(),
        }) {
            Ok(ticket) => ticket,
            Err(failure) => {
                tracing::debug!(%filename, "picked file rejected: {failure}");
                return;
            }
        };

        self.local_preview = Some(LocalPreview::pending(ticket, filename.clone(), size_bytes));
        let queued = self.dispatch(BackendCommand::UploadImage {
            ticket,
            path,
            filename,
            mime_type,
        });
        if !queued {
            let reason = self.status.clone().unwrap_or_default();
            self.form.finish_upload(ticket, Err(Failure::upload(reason)));
            self.local_preview = None;
        }
    }

    pub(crate) fn submit_form(&mut self) {
        match self.form.prepare_submission() {
            Ok(image) => {
                if !self.dispatch(BackendCommand::SubmitImage { image }) {
                    self.form.abort_submission();
                }
            }
            Err(SubmitBlocked::UploadPending(toast)) => self.toasts.push(toast),
            Err(SubmitBlocked::Invalid(errors)) => {
                tracing::debug!(fields = errors.len(), "submission blocked by validation");
            }
            Err(SubmitBlocked::InFlight) => {}
        }
    }
}
