use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod media;
mod ui;

use clap::Parser;
use client_core::{load_settings, Settings};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::UiEvent,
    ui::{GalleryApp, StartupConfig},
};

#[derive(Parser, Debug)]
#[command(name = "gallery-desktop", about = "Desktop client for the image gallery")]
struct Args {
    /// Gallery REST API base URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Endpoint that accepts raw image uploads.
    #[arg(long)]
    image_host_url: Option<String>,
    #[arg(long)]
    image_host_key: Option<String>,
    /// Path to a TOML settings file (defaults to ./gallery.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn resolve_settings(args: Args) -> (Settings, Option<String>) {
    let mut settings = load_settings(args.config.as_deref());
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(image_host_url) = args.image_host_url {
        settings.image_host_url = image_host_url;
    }
    if args.image_host_key.is_some() {
        settings.image_host_key = args.image_host_key;
    }

    match settings.validated() {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("invalid settings, falling back to defaults: {err:#}");
            (Settings::default(), Some(format!("{err:#}")))
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (settings, startup_error) = resolve_settings(Args::parse());
    tracing::info!(api = %settings.api_base_url, "starting gallery desktop client");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Gallery")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Gallery",
        options,
        Box::new(|_cc| {
            Ok(Box::new(GalleryApp::new(
                cmd_tx,
                ui_rx,
                StartupConfig {
                    settings,
                    startup_error,
                },
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_loaded_settings() {
        let args = Args::parse_from([
            "gallery-desktop",
            "--api-url",
            "http://gallery.test:8080/",
            "--image-host-key",
            "k",
            "--config",
            "/nonexistent/gallery.toml",
        ]);
        let (settings, startup_error) = resolve_settings(args);
        assert!(startup_error.is_none());
        assert_eq!(settings.api_base_url, "http://gallery.test:8080");
        assert_eq!(settings.image_host_key.as_deref(), Some("k"));
    }

    #[test]
    fn invalid_url_falls_back_to_defaults_with_startup_error() {
        let args = Args::parse_from([
            "gallery-desktop",
            "--api-url",
            "ftp://nope",
            "--config",
            "/nonexistent/gallery.toml",
        ]);
        let (settings, startup_error) = resolve_settings(args);
        assert_eq!(settings, Settings::default());
        assert!(startup_error.is_some_and(|e| e.contains("invalid api base url")));
    }
}
