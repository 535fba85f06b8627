use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FormField;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Failure {
    #[error("invalid {field}: {message}")]
    Validation { field: FormField, message: String },
    #[error("image upload failed: {message}")]
    Upload { message: String },
    #[error("image submission failed: {message}")]
    Submission { message: String },
    #[error("failed to fetch images: {message}")]
    Fetch { message: String },
}

impl Failure {
    pub fn validation(field: FormField, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission {
            message: message.into(),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Failure::Validation { message, .. }
            | Failure::Upload { message }
            | Failure::Submission { message }
            | Failure::Fetch { message } => message,
        }
    }
}
