//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{InfiniteData, UploadTicket};
use shared::{
    domain::{Cursor, ImageId},
    error::Failure,
    protocol::ImagesPage,
};

use crate::media::PreviewImage;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    GalleryLoaded(Result<InfiniteData<ImagesPage>, Failure>),
    NextPageLoaded {
        cursor: Cursor,
        result: Result<ImagesPage, Failure>,
    },
    /// The images key went stale; the grid should refetch.
    GalleryInvalidated,
    ImageUploaded {
        ticket: UploadTicket,
        result: Result<String, Failure>,
    },
    /// Thumbnail of the picked file, decoded off the UI thread.
    LocalPreviewLoaded {
        ticket: UploadTicket,
        result: Result<PreviewImage, String>,
    },
    SubmissionFinished(Result<(), Failure>),
    CardPreviewLoaded {
        id: ImageId,
        image: PreviewImage,
    },
    CardPreviewFailed {
        id: ImageId,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Server,
    Validation,
    Decode,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Gallery,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("dns")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("500")
            || message_lower.contains("502")
            || message_lower.contains("503")
            || message_lower.contains("server error")
        {
            UiErrorCategory::Server
        } else if message_lower.contains("decode")
            || message_lower.contains("unsupported image")
            || message_lower.contains("format")
        {
            UiErrorCategory::Decode
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("required")
        {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_failure(context: UiErrorContext, failure: &Failure) -> Self {
        Self::from_message(context, failure.message())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Transport | UiErrorCategory::Server
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn banner_text(&self) -> String {
        let prefix = match self.context {
            UiErrorContext::BackendStartup => "Backend worker startup failure",
            UiErrorContext::Gallery => "Gallery",
        };
        if self.is_retryable() {
            format!("{prefix}: {} (check the server URL/network and retry)", self.message)
        } else {
            format!("{prefix}: {}", self.message)
        }
    }
}
