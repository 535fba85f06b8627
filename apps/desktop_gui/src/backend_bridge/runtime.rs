//! Runtime bridge between UI command queue and backend event intake.

use std::{path::Path, sync::Arc, thread};

use client_core::{
    CacheEvent, GalleryApi, GalleryQuery, HttpGalleryClient, HttpImageHost, ImageHost,
    ImageUpload, QueryCache, QueryKey, Settings, UploadTicket,
};
use crossbeam_channel::{Receiver, Sender};
use shared::{
    domain::ImageId,
    error::Failure,
    protocol::{ImagesPage, NewImage},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::media::decode_preview_image;

#[derive(Clone)]
struct Services {
    api: Arc<HttpGalleryClient>,
    host: Arc<dyn ImageHost>,
    cache: Arc<QueryCache<ImagesPage>>,
    gallery: Arc<GalleryQuery>,
}

impl Services {
    fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api = Arc::new(HttpGalleryClient::from_settings(settings)?);
        let host: Arc<dyn ImageHost> = Arc::new(HttpImageHost::from_settings(settings)?);
        let cache = QueryCache::new();
        let gallery = Arc::new(GalleryQuery::new(
            Arc::clone(&api) as Arc<dyn GalleryApi>,
            Arc::clone(&cache),
        ));
        Ok(Self {
            api,
            host,
            cache,
            gallery,
        })
    }
}

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let services = match Services::from_settings(&settings) {
                Ok(services) => services,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("{err:#}"),
                    )));
                    tracing::error!("failed to build http clients: {err:#}");
                    return;
                }
            };
            tracing::info!(
                api = %services.api.base_url(),
                image_host = %settings.image_host_url,
                "backend worker ready"
            );
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            let cache_task = tokio::spawn(forward_cache_events(
                services.cache.subscribe(),
                services.gallery.key().clone(),
                ui_tx.clone(),
            ));

            while let Ok(cmd) = cmd_rx.recv() {
                let services = services.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move { handle_command(services, cmd, ui_tx).await });
            }

            cache_task.abort();
            tracing::info!("ui command channel closed; backend worker stopping");
        });
    });
}

async fn forward_cache_events(
    mut events: tokio::sync::broadcast::Receiver<CacheEvent>,
    key: QueryKey,
    ui_tx: Sender<UiEvent>,
) {
    loop {
        match events.recv().await {
            Ok(CacheEvent::Invalidated(invalidated)) if invalidated == key => {
                let _ = ui_tx.try_send(UiEvent::GalleryInvalidated);
            }
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "cache event subscriber lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn handle_command(services: Services, cmd: BackendCommand, ui_tx: Sender<UiEvent>) {
    match cmd {
        BackendCommand::LoadGallery => {
            let result = services.gallery.fetch_initial().await;
            if let Err(failure) = &result {
                tracing::error!("gallery: initial fetch failed: {failure}");
            }
            let _ = ui_tx.try_send(UiEvent::GalleryLoaded(result));
        }
        BackendCommand::LoadMoreImages { after } => {
            let result = services.gallery.fetch_next_page(&after).await;
            if let Err(failure) = &result {
                tracing::warn!(cursor = %after, "gallery: next page failed: {failure}");
            }
            let _ = ui_tx.try_send(UiEvent::NextPageLoaded {
                cursor: after,
                result,
            });
        }
        BackendCommand::UploadImage {
            ticket,
            path,
            filename,
            mime_type,
        } => {
            let result = match read_picked_file(&path).await {
                Ok(bytes) => {
                    tokio::spawn(decode_local_preview(ticket, bytes.clone(), ui_tx.clone()));
                    upload_bytes(services.host.as_ref(), bytes, filename, mime_type).await
                }
                Err(failure) => Err(failure),
            };
            let _ = ui_tx.try_send(UiEvent::ImageUploaded { ticket, result });
        }
        BackendCommand::SubmitImage { image } => {
            let result = submit_image(&services, &image).await;
            let _ = ui_tx.try_send(UiEvent::SubmissionFinished(result));
        }
        BackendCommand::FetchCardPreview { id, url } => {
            fetch_card_preview(&services, id, url, &ui_tx).await;
        }
    }
}

async fn read_picked_file(path: &Path) -> Result<Vec<u8>, Failure> {
    tokio::fs::read(path).await.map_err(|err| {
        tracing::warn!(path = %path.display(), "upload: failed to read file: {err}");
        Failure::upload(format!("failed to read '{}': {err}", path.display()))
    })
}

async fn decode_local_preview(ticket: UploadTicket, bytes: Vec<u8>, ui_tx: Sender<UiEvent>) {
    let result = tokio::task::spawn_blocking(move || decode_preview_image(&bytes))
        .await
        .map_err(|err| format!("preview decode task failed: {err}"))
        .and_then(|result| result);
    if let Err(reason) = &result {
        tracing::debug!(?ticket, "local preview unavailable: {reason}");
    }
    let _ = ui_tx.try_send(UiEvent::LocalPreviewLoaded { ticket, result });
}

async fn upload_bytes(
    host: &dyn ImageHost,
    bytes: Vec<u8>,
    filename: String,
    mime_type: Option<String>,
) -> Result<String, Failure> {
    let size_bytes = bytes.len();
    tracing::info!(%filename, size_bytes, "upload: sending image to host");
    host.upload_image(ImageUpload {
        filename: filename.clone(),
        mime_type,
        bytes,
    })
    .await
    .map_err(|err| {
        tracing::warn!(%filename, "upload: image host rejected file: {err:#}");
        Failure::upload(format!("{err:#}"))
    })
}

async fn submit_image(services: &Services, image: &NewImage) -> Result<(), Failure> {
    match services.api.create_image(image).await {
        Ok(()) => {
            services.cache.invalidate(services.gallery.key()).await;
            Ok(())
        }
        Err(err) => {
            tracing::error!(title = %image.title, "submit: create image failed: {err:#}");
            Err(Failure::submission(format!("{err:#}")))
        }
    }
}

async fn fetch_card_preview(services: &Services, id: ImageId, url: String, ui_tx: &Sender<UiEvent>) {
    let bytes = match services.api.download_image(&url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(%id, %url, "preview: download failed: {err:#}");
            let _ = ui_tx.try_send(UiEvent::CardPreviewFailed {
                id,
                reason: format!("{err:#}"),
            });
            return;
        }
    };

    let decoded = tokio::task::spawn_blocking(move || decode_preview_image(&bytes))
        .await
        .map_err(|err| format!("preview decode task failed: {err}"))
        .and_then(|result| result);
    let event = match decoded {
        Ok(image) => UiEvent::CardPreviewLoaded { id, image },
        Err(reason) => {
            tracing::debug!(%id, "preview: {reason}");
            UiEvent::CardPreviewFailed { id, reason }
        }
    };
    let _ = ui_tx.try_send(event);
}
