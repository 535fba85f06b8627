//! UI layer for desktop GUI: app shell, gallery grid, upload modal, and toasts.

pub mod app;
pub mod cards;
pub mod toasts;
pub mod upload_modal;

pub use app::{GalleryApp, StartupConfig};
