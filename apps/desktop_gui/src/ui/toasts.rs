//! Bottom-right toast stack with per-toast expiry.

use std::time::Instant;

use client_core::{Toast, ToastStatus};
use eframe::egui;

struct ActiveToast {
    id: u64,
    toast: Toast,
    shown_at: Instant,
}

#[derive(Default)]
pub struct ToastQueue {
    entries: Vec<ActiveToast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn push(&mut self, toast: Toast) {
        tracing::debug!(status = ?toast.status, title = %toast.title, "toast shown");
        self.entries.push(ActiveToast {
            id: self.next_id,
            toast,
            shown_at: Instant::now(),
        });
        self.next_id += 1;
    }

    pub fn prune(&mut self, now: Instant) {
        self.entries
            .retain(|entry| now.saturating_duration_since(entry.shown_at) < entry.toast.duration);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.entries.iter().map(|entry| &entry.toast)
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.entries.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toast_stack"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                ui.set_max_width(320.0);
                for entry in &self.entries {
                    let (fill, stroke) = status_colors(entry.toast.status);
                    egui::Frame::NONE
                        .fill(fill)
                        .stroke(egui::Stroke::new(1.0, stroke))
                        .corner_radius(8.0)
                        .inner_margin(egui::Margin::symmetric(10, 8))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.vertical(|ui| {
                                    ui.label(
                                        egui::RichText::new(&entry.toast.title)
                                            .strong()
                                            .color(egui::Color32::WHITE),
                                    );
                                    ui.label(
                                        egui::RichText::new(&entry.toast.description)
                                            .color(egui::Color32::from_gray(230)),
                                    );
                                });
                                if entry.toast.closable {
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::TOP),
                                        |ui| {
                                            if ui.small_button("✕").clicked() {
                                                dismissed = Some(entry.id);
                                            }
                                        },
                                    );
                                }
                            });
                        });
                    ui.add_space(6.0);
                }
            });

        if let Some(id) = dismissed {
            self.entries.retain(|entry| entry.id != id);
        }
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}

fn status_colors(status: ToastStatus) -> (egui::Color32, egui::Color32) {
    match status {
        ToastStatus::Success => (
            egui::Color32::from_rgb(39, 103, 73),
            egui::Color32::from_rgb(72, 187, 120),
        ),
        ToastStatus::Error => (
            egui::Color32::from_rgb(111, 53, 53),
            egui::Color32::from_rgb(175, 96, 96),
        ),
        ToastStatus::Warning => (
            egui::Color32::from_rgb(120, 85, 30),
            egui::Color32::from_rgb(214, 158, 46),
        ),
        ToastStatus::Info => (
            egui::Color32::from_rgb(44, 82, 130),
            egui::Color32::from_rgb(99, 179, 237),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn toasts_expire_after_their_duration() {
        let mut queue = ToastQueue::default();
        queue.push(Toast::success("Image registered", "done"));
        let shown_at = Instant::now();

        queue.prune(shown_at);
        assert_eq!(queue.iter().count(), 1);

        queue.prune(shown_at + Duration::from_millis(5_001));
        assert!(queue.is_empty());
    }

    #[test]
    fn toasts_keep_insertion_order() {
        let mut queue = ToastQueue::default();
        queue.push(Toast::warning("first", ""));
        queue.push(Toast::error("second", ""));
        let titles: Vec<_> = queue.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
