//! State of the "add image" form: field values, inline errors, the
//! out-of-band image upload, and the submission lifecycle.
//!
//! The synchronous half (`select_image`, `finish_upload`,
//! `prepare_submission`, `finish_submission`) lets a UI thread own the form
//! while a worker performs the requests; `attach_image` and `submit` run the
//! whole sequence in place.

use shared::{
    domain::FormField,
    error::Failure,
    protocol::{ImagesPage, NewImage},
};
use tracing::{info, warn};

use crate::{
    cache::{QueryCache, QueryKey},
    toast::Toast,
    validation::{self, FieldErrors, ImageFile},
    GalleryApi, ImageHost, ImageUpload,
};

/// Identifies one upload so a late result for a replaced file is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    InFlight(UploadTicket),
    Uploaded {
        url: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// A submission is already outstanding.
    InFlight,
    /// At least one field rule failed; nothing was sent.
    Invalid(FieldErrors),
    /// Fields are valid but the image host has not produced a URL.
    UploadPending(Toast),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub toast: Toast,
    pub failure: Option<Failure>,
    pub close_modal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Blocked(SubmitBlocked),
    Completed(SubmissionReport),
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    image: Option<ImageFile>,
    errors: FieldErrors,
    upload: UploadState,
    submission_in_flight: bool,
    submitted_once: bool,
    next_ticket: u64,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn upload_state(&self) -> &UploadState {
        &self.upload
    }

    pub fn uploaded_url(&self) -> Option<&str> {
        match &self.upload {
            UploadState::Uploaded { url } => Some(url),
            _ => None,
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.upload, UploadState::InFlight(_))
    }

    pub fn is_submitting(&self) -> bool {
        self.submission_in_flight
    }

    /// Records the picked file and checks the image rules right away. On
    /// success the caller uploads the file and reports back with the ticket.
    pub fn select_image(&mut self, file: ImageFile) -> Result<UploadTicket, Failure> {
        let verdict = validation::validate_image(Some(&file));
        self.image = Some(file);
        match verdict {
            Err(message) => {
                self.errors.insert(FormField::Image, message.to_string());
                self.upload = UploadState::Idle;
                Err(Failure::validation(FormField::Image, message))
            }
            Ok(()) => {
                self.errors.remove(&FormField::Image);
                let ticket = UploadTicket(self.next_ticket);
                self.next_ticket += 1;
                self.upload = UploadState::InFlight(ticket);
                Ok(ticket)
            }
        }
    }

    /// Returns `false` when the ticket no longer matches the pending upload.
    pub fn finish_upload(&mut self, ticket: UploadTicket, result: Result<String, Failure>) -> bool {
        if self.upload != UploadState::InFlight(ticket) {
            return false;
        }
        match result {
            Ok(url) => {
                self.errors.remove(&FormField::Image);
                self.upload = UploadState::Uploaded { url };
            }
            Err(failure) => {
                let message = failure.message().to_string();
                self.errors.insert(FormField::Image, message.clone());
                self.upload = UploadState::Failed { message };
            }
        }
        true
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.upload = UploadState::Idle;
        self.errors.remove(&FormField::Image);
    }

    /// Re-checks one field after an edit, once a submit has been attempted.
    pub fn revalidate(&mut self, field: FormField) {
        if !self.submitted_once {
            return;
        }
        let verdict = match field {
            FormField::Image => validation::validate_image(self.image.as_ref()),
            FormField::Title => validation::validate_title(&self.title),
            FormField::Description => validation::validate_description(&self.description),
        };
        match verdict {
            Ok(()) => {
                self.errors.remove(&field);
                self.restore_upload_error();
            }
            Err(message) => {
                self.errors.insert(field, message.to_string());
            }
        }
    }

    fn restore_upload_error(&mut self) {
        if let UploadState::Failed { message } = &self.upload {
            self.errors
                .entry(FormField::Image)
                .or_insert_with(|| message.clone());
        }
    }

    pub fn prepare_submission(&mut self) -> Result<NewImage, SubmitBlocked> {
        if self.submission_in_flight {
            return Err(SubmitBlocked::InFlight);
        }
        self.submitted_once = true;

        self.errors = validation::validate_form(self.image.as_ref(), &self.title, &self.description);
        if !self.errors.is_empty() {
            self.restore_upload_error();
            return Err(SubmitBlocked::Invalid(self.errors.clone()));
        }

        let url = match &self.upload {
            UploadState::Uploaded { url } => url.clone(),
            UploadState::Failed { message } => {
                self.errors.insert(FormField::Image, message.clone());
                return Err(SubmitBlocked::UploadPending(Toast::warning(
                    "Image upload failed",
                    "Select the image again before submitting",
                )));
            }
            UploadState::InFlight(_) | UploadState::Idle => {
                return Err(SubmitBlocked::UploadPending(Toast::warning(
                    "Image still uploading",
                    "You need to wait for the image upload to finish",
                )));
            }
        };

        self.submission_in_flight = true;
        Ok(NewImage {
            title: self.title.clone(),
            description: self.description.clone(),
            url,
        })
    }

    /// Releases the in-flight flag for an attempt that never left the client.
    /// Field values are kept.
    pub fn abort_submission(&mut self) {
        self.submission_in_flight = false;
    }

    /// Completes an attempt that reached the API. The form is reset either way.
    pub fn finish_submission(&mut self, result: Result<(), Failure>) -> SubmissionReport {
        let report = match result {
            Ok(()) => SubmissionReport {
                toast: Toast::success(
                    "Image registered",
                    "Your new image was registered successfully!",
                ),
                failure: None,
                close_modal: true,
            },
            Err(failure) => SubmissionReport {
                toast: Toast::error(
                    "Failed to register image",
                    format!(
                        "An error occurred while registering the new image: {}",
                        failure.message()
                    ),
                ),
                failure: Some(failure),
                close_modal: true,
            },
        };
        self.reset();
        report
    }

    /// Clears every field, the preview URL, and all errors.
    pub fn reset(&mut self) {
        *self = Self {
            next_ticket: self.next_ticket,
            ..Self::default()
        };
    }

    /// Validates, uploads, and records the result of one file in place.
    pub async fn attach_image(
        &mut self,
        host: &dyn ImageHost,
        upload: ImageUpload,
    ) -> Result<String, Failure> {
        let ticket = self.select_image(ImageFile {
            filename: upload.filename.clone(),
            size_bytes: upload.bytes.len() as u64,
            mime_type: upload.mime_type.clone(),
        })?;
        let filename = upload.filename.clone();
        let result = host
            .upload_image(upload)
            .await
            .map_err(|err| Failure::upload(format!("{err:#}")));
        if let Err(failure) = &result {
            warn!(%filename, "upload form: image upload failed: {failure}");
        }
        self.finish_upload(ticket, result.clone());
        result
    }

    /// Full submit: validation, creation request, cache invalidation, reset.
    pub async fn submit(
        &mut self,
        api: &dyn GalleryApi,
        cache: &QueryCache<ImagesPage>,
    ) -> SubmitOutcome {
        let image = match self.prepare_submission() {
            Ok(image) => image,
            Err(blocked) => return SubmitOutcome::Blocked(blocked),
        };

        let result = api
            .create_image(&image)
            .await
            .map_err(|err| Failure::submission(format!("{err:#}")));
        match &result {
            Ok(()) => {
                cache.invalidate(&QueryKey::images()).await;
                info!(title = %image.title, "upload form: submission succeeded");
            }
            Err(failure) => warn!(title = %image.title, "upload form: submission failed: {failure}"),
        }
        SubmitOutcome::Completed(self.finish_submission(result))
    }
}

#[cfg(test)]
#[path = "tests/upload_form_tests.rs"]
mod tests;
