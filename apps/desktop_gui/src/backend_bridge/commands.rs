//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use client_core::UploadTicket;
use shared::{
    domain::{Cursor, ImageId},
    protocol::NewImage,
};

pub enum BackendCommand {
    LoadGallery,
    LoadMoreImages {
        after: Cursor,
    },
    UploadImage {
        ticket: UploadTicket,
        path: PathBuf,
        filename: String,
        mime_type: Option<String>,
    },
    SubmitImage {
        image: NewImage,
    },
    FetchCardPreview {
        id: ImageId,
        url: String,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadGallery => "load_gallery",
            BackendCommand::LoadMoreImages { .. } => "load_more_images",
            BackendCommand::UploadImage { .. } => "upload_image",
            BackendCommand::SubmitImage { .. } => "submit_image",
            BackendCommand::FetchCardPreview { .. } => "fetch_card_preview",
        }
    }
}
