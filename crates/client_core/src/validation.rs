//! Client-side rules for the upload form.
//!
//! Every rule runs before any network call. Each field reports at most one
//! message: the first rule it fails, in table order.

use std::collections::BTreeMap;

use shared::{domain::FormField, error::Failure};

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 20;
pub const DESCRIPTION_MAX_CHARS: usize = 20;

pub const IMAGE_REQUIRED: &str = "Image is required";
pub const IMAGE_TOO_LARGE: &str = "The file must be at most 10MB";
pub const IMAGE_NOT_AN_IMAGE: &str = "Only image files are allowed";
pub const TITLE_REQUIRED: &str = "You must provide a title";
pub const TITLE_TOO_SHORT: &str = "The title must have at least 2 characters";
pub const TITLE_TOO_LONG: &str = "The title must have at most 20 characters";
pub const DESCRIPTION_REQUIRED: &str = "You must provide a description";
pub const DESCRIPTION_TOO_LONG: &str = "The description must have at most 20 characters";

/// Metadata of a file the user picked; the bytes are read only for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
}

pub type FieldErrors = BTreeMap<FormField, String>;

pub fn validate_image(image: Option<&ImageFile>) -> Result<(), &'static str> {
    let Some(image) = image else {
        return Err(IMAGE_REQUIRED);
    };
    if image.size_bytes > MAX_IMAGE_BYTES {
        return Err(IMAGE_TOO_LARGE);
    }
    let is_image = image
        .mime_type
        .as_deref()
        .is_some_and(|mime| mime.starts_with("image/"));
    if !is_image {
        return Err(IMAGE_NOT_AN_IMAGE);
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.is_empty() {
        return Err(TITLE_REQUIRED);
    }
    let len = title.chars().count();
    if len < TITLE_MIN_CHARS {
        return Err(TITLE_TOO_SHORT);
    }
    if len > TITLE_MAX_CHARS {
        return Err(TITLE_TOO_LONG);
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), &'static str> {
    if description.is_empty() {
        return Err(DESCRIPTION_REQUIRED);
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(DESCRIPTION_TOO_LONG);
    }
    Ok(())
}

pub fn validate_form(image: Option<&ImageFile>, title: &str, description: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in FormField::ALL {
        let result = match field {
            FormField::Image => validate_image(image),
            FormField::Title => validate_title(title),
            FormField::Description => validate_description(description),
        };
        if let Err(message) = result {
            errors.insert(field, message.to_string());
        }
    }
    errors
}

pub fn into_failures(errors: &FieldErrors) -> Vec<Failure> {
    errors
        .iter()
        .map(|(field, message)| Failure::validation(*field, message.clone()))
        .collect()
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
