//! Gallery grid: loading/error views, image cards, and the "Load more" control.

use arboard::Clipboard;
use chrono::Local;
use client_core::{GalleryView, LoadMore, Toast};
use eframe::egui;
use shared::{domain::ImageId, protocol::ImageRecord};

use crate::{
    backend_bridge::commands::BackendCommand,
    ui::app::{CardPreview, GalleryApp},
};

const CARD_WIDTH: f32 = 220.0;
const CARD_IMAGE_HEIGHT: f32 = 160.0;

enum GridView {
    Loading,
    Error(String),
    Ready {
        cards: Vec<ImageRecord>,
        load_more: Option<LoadMore>,
    },
}

impl GalleryApp {
    pub(crate) fn show_gallery(&mut self, ui: &mut egui::Ui) {
        let view = match self.gallery.view() {
            GalleryView::Loading => GridView::Loading,
            GalleryView::Error(failure) => GridView::Error(failure.message().to_string()),
            GalleryView::Ready { cards, load_more } => GridView::Ready {
                cards: cards.into_iter().cloned().collect(),
                load_more,
            },
        };

        match view {
            GridView::Loading => {
                ui.vertical_centered(|ui| {
                    ui.add_space(48.0);
                    ui.spinner();
                    ui.label("Loading images...");
                });
            }
            GridView::Error(message) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(48.0);
                    ui.colored_label(
                        egui::Color32::from_rgb(220, 110, 110),
                        egui::RichText::new("Could not load the gallery").strong(),
                    );
                    ui.label(message);
                    if ui.button("Retry").clicked() {
                        self.reload_gallery();
                    }
                });
            }
            GridView::Ready { cards, load_more } => {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if cards.is_empty() {
                            ui.weak("No images yet. Use \"Add image\" to upload the first one.");
                        }
                        ui.horizontal_wrapped(|ui| {
                            ui.spacing_mut().item_spacing = egui::vec2(12.0, 12.0);
                            for record in &cards {
                                self.show_card(ui, record);
                            }
                        });
                        if let Some(load_more) = load_more {
                            ui.add_space(12.0);
                            ui.vertical_centered(|ui| self.show_load_more(ui, load_more));
                        }
                    });
            }
        }
    }

    fn show_load_more(&mut self, ui: &mut egui::Ui, load_more: LoadMore) {
        if load_more.busy {
            ui.horizontal(|ui| {
                ui.add_enabled(false, egui::Button::new("Load more"));
                ui.spinner();
            });
        } else if ui.button("Load more").clicked() {
            self.request_next_page();
        }
    }

    fn show_card(&mut self, ui: &mut egui::Ui, record: &ImageRecord) {
        self.ensure_card_preview(record);
        let texture = self.card_texture(ui.ctx(), &record.id);
        let preview_failed = matches!(self.card_previews.get(&record.id), Some(CardPreview::Failed));

        let response = egui::Frame::group(ui.style())
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(8))
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    match &texture {
                        Some(texture) => {
                            let mut size = texture.size_vec2();
                            let scale = (CARD_WIDTH / size.x).min(CARD_IMAGE_HEIGHT / size.y).min(1.0);
                            size *= scale;
                            ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                        }
                        None => {
                            let (rect, _) = ui.allocate_exact_size(
                                egui::vec2(CARD_WIDTH, CARD_IMAGE_HEIGHT),
                                egui::Sense::hover(),
                            );
                            ui.painter().rect_filled(rect, 6.0, egui::Color32::from_gray(40));
                            let hint = if preview_failed { "Preview unavailable" } else { "Loading..." };
                            ui.painter().text(
                                rect.center(),
                                egui::Align2::CENTER_CENTER,
                                hint,
                                egui::FontId::proportional(13.0),
                                egui::Color32::from_gray(160),
                            );
                        }
                    }
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(&record.title).strong());
                    ui.label(&record.description);
                    if let Some(created_at) = record.created_at() {
                        ui.small(
                            created_at
                                .with_timezone(&Local)
                                .format("%Y-%m-%d %H:%M")
                                .to_string(),
                        );
                    }
                });
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_text("Right click for actions");

        response.context_menu(|ui| {
            ui.set_min_width(180.0);
            if ui.button("Copy link").clicked() {
                self.copy_link(&record.url);
                ui.close();
            }
            if ui.button("Copy title").clicked() {
                ui.ctx().copy_text(record.title.clone());
                ui.close();
            }
        });
    }

    /// Queues a thumbnail download the first time a card is drawn.
    fn ensure_card_preview(&mut self, record: &ImageRecord) {
        if self.card_previews.contains_key(&record.id) {
            return;
        }
        let queued = self.dispatch(BackendCommand::FetchCardPreview {
            id: record.id.clone(),
            url: record.url.clone(),
        });
        let state = if queued {
            CardPreview::Loading
        } else {
            CardPreview::Failed
        };
        self.card_previews.insert(record.id.clone(), state);
    }

    fn card_texture(&mut self, ctx: &egui::Context, id: &ImageId) -> Option<egui::TextureHandle> {
        let entry = self.card_previews.get_mut(id)?;
        if let CardPreview::Decoded(image) = entry {
            let texture = ctx.load_texture(
                format!("card-preview:{id}"),
                image.to_color_image(),
                egui::TextureOptions::LINEAR,
            );
            *entry = CardPreview::Ready(texture);
        }
        match entry {
            CardPreview::Ready(texture) => Some(texture.clone()),
            _ => None,
        }
    }

    fn copy_link(&mut self, url: &str) {
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.to_string())) {
            Ok(()) => self.toasts.push(Toast::info("Link copied", url)),
            Err(err) => {
                tracing::warn!("clipboard unavailable: {err}");
                self.toasts
                    .push(Toast::error("Copy failed", format!("Clipboard unavailable: {err}")));
            }
        }
    }
}
