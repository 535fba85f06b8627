use super::*;
use crate::{
    cache::InfiniteData,
    test_support::{page, FakeGalleryApi, FakeImageHost},
    toast::ToastStatus,
    validation::{IMAGE_NOT_AN_IMAGE, IMAGE_TOO_LARGE, MAX_IMAGE_BYTES, TITLE_TOO_SHORT},
    MissingImageHost,
};

fn png_upload(size: usize) -> ImageUpload {
    ImageUpload {
        filename: "sunset.png".to_string(),
        mime_type: Some("image/png".to_string()),
        bytes: vec![0u8; size],
    }
}

async fn filled_form(host_url: &str) -> UploadForm {
    let mut form = UploadForm::new();
    form.title = "Sunset".to_string();
    form.description = "Golden hour".to_string();
    form.attach_image(&FakeImageHost::returning(host_url), png_upload(64))
        .await
        .expect("upload");
    form
}

#[tokio::test]
async fn valid_submission_creates_once_invalidates_and_resets() {
    let api = FakeGalleryApi::with_pages(vec![]);
    let cache = QueryCache::<ImagesPage>::new();
    cache
        .replace(&QueryKey::images(), InfiniteData::first(page(&["1"], None)))
        .await;
    let mut form = filled_form("https://cdn.test/sunset.png").await;

    let outcome = form.submit(api.as_ref(), &cache).await;

    let created = api.created.lock().await.clone();
    assert_eq!(
        created,
        vec![NewImage {
            title: "Sunset".to_string(),
            description: "Golden hour".to_string(),
            url: "https://cdn.test/sunset.png".to_string(),
        }]
    );
    match outcome {
        SubmitOutcome::Completed(report) => {
            assert_eq!(report.toast.status, ToastStatus::Success);
            assert!(report.failure.is_none());
            assert!(report.close_modal);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(cache.is_stale(&QueryKey::images()).await);
    assert!(form.title.is_empty());
    assert!(form.description.is_empty());
    assert!(form.image().is_none());
    assert!(form.uploaded_url().is_none());
    assert!(form.errors().is_empty());
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn invalid_fields_block_without_network() {
    let api = FakeGalleryApi::with_pages(vec![]);
    let cache = QueryCache::<ImagesPage>::new();
    let mut form = filled_form("https://cdn.test/a.png").await;
    form.title = "A".to_string();

    let outcome = form.submit(api.as_ref(), &cache).await;

    match outcome {
        SubmitOutcome::Blocked(SubmitBlocked::Invalid(errors)) => {
            assert_eq!(
                errors.get(&FormField::Title).map(String::as_str),
                Some(TITLE_TOO_SHORT)
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(api.created.lock().await.is_empty());
    assert_eq!(form.title, "A", "input kept for correction");
    assert_eq!(form.error(FormField::Title), Some(TITLE_TOO_SHORT));
}

#[tokio::test]
async fn missing_upload_url_blocks_with_warning() {
    let api = FakeGalleryApi::with_pages(vec![]);
    let cache = QueryCache::<ImagesPage>::new();
    let mut form = UploadForm::new();
    form.title = "Sunset".to_string();
    form.description = "Beach".to_string();
    let _ticket = form
        .select_image(ImageFile {
            filename: "sunset.png".to_string(),
            size_bytes: 64,
            mime_type: Some("image/png".to_string()),
        })
        .expect("valid image");
    assert!(form.is_uploading());

    let outcome = form.submit(api.as_ref(), &cache).await;

    match outcome {
        SubmitOutcome::Blocked(SubmitBlocked::UploadPending(toast)) => {
            assert_eq!(toast.status, ToastStatus::Warning);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(api.created.lock().await.is_empty());
    assert_eq!(form.title, "Sunset");
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn failed_submission_uses_error_toast_and_still_resets() {
    let api = FakeGalleryApi::failing_create();
    let cache = QueryCache::<ImagesPage>::new();
    cache
        .replace(&QueryKey::images(), InfiniteData::first(page(&["1"], None)))
        .await;
    let mut form = filled_form("https://cdn.test/a.png").await;

    let outcome = form.submit(api.as_ref(), &cache).await;

    match outcome {
        SubmitOutcome::Completed(report) => {
            assert_eq!(report.toast.status, ToastStatus::Error);
            assert!(report.toast.description.contains("500"));
            assert!(matches!(report.failure, Some(Failure::Submission { .. })));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!cache.is_stale(&QueryKey::images()).await);
    assert!(form.title.is_empty());
    assert!(form.image().is_none());
}

#[test]
fn second_submit_while_in_flight_is_rejected() {
    let mut form = UploadForm::new();
    form.title = "Sunset".to_string();
    form.description = "Beach".to_string();
    let ticket = form
        .select_image(ImageFile {
            filename: "a.png".to_string(),
            size_bytes: 1,
            mime_type: Some("image/png".to_string()),
        })
        .expect("valid image");
    assert!(form.finish_upload(ticket, Ok("https://cdn.test/a.png".to_string())));

    assert!(form.prepare_submission().is_ok());
    assert!(form.is_submitting());
    assert_eq!(form.prepare_submission(), Err(SubmitBlocked::InFlight));

    form.abort_submission();
    assert!(!form.is_submitting());
    assert_eq!(form.title, "Sunset");
    assert!(form.prepare_submission().is_ok());
}

#[test]
fn oversized_or_non_image_selection_sets_inline_error() {
    let mut form = UploadForm::new();
    let err = form
        .select_image(ImageFile {
            filename: "huge.png".to_string(),
            size_bytes: MAX_IMAGE_BYTES + 1,
            mime_type: Some("image/png".to_string()),
        })
        .expect_err("too large");
    assert_eq!(err, Failure::validation(FormField::Image, IMAGE_TOO_LARGE));
    assert_eq!(form.error(FormField::Image), Some(IMAGE_TOO_LARGE));
    assert!(!form.is_uploading());

    form.select_image(ImageFile {
        filename: "notes.txt".to_string(),
        size_bytes: 10,
        mime_type: Some("text/plain".to_string()),
    })
    .expect_err("not an image");
    assert_eq!(form.error(FormField::Image), Some(IMAGE_NOT_AN_IMAGE));
}

#[tokio::test]
async fn upload_failure_sets_image_error_and_clears_url() {
    let mut form = UploadForm::new();
    let err = form
        .attach_image(&FakeImageHost::failing(), png_upload(16))
        .await
        .expect_err("host down");
    assert!(matches!(err, Failure::Upload { .. }));
    assert!(form.uploaded_url().is_none());
    assert!(form
        .error(FormField::Image)
        .is_some_and(|m| m.contains("image host unavailable")));

    let err = form
        .attach_image(&MissingImageHost, png_upload(16))
        .await
        .expect_err("no host");
    assert!(err.message().contains("no image host configured"));
}

#[test]
fn stale_upload_result_is_ignored_after_reselect() {
    let mut form = UploadForm::new();
    let file = ImageFile {
        filename: "a.png".to_string(),
        size_bytes: 1,
        mime_type: Some("image/png".to_string()),
    };
    let first = form.select_image(file.clone()).expect("first");
    let second = form.select_image(file).expect("second");

    assert!(!form.finish_upload(first, Ok("https://cdn.test/old.png".to_string())));
    assert!(form.finish_upload(second, Ok("https://cdn.test/new.png".to_string())));
    assert_eq!(form.uploaded_url(), Some("https://cdn.test/new.png"));
}

#[test]
fn edits_revalidate_only_after_first_submit() {
    let mut form = UploadForm::new();
    form.title = "A".to_string();
    form.revalidate(FormField::Title);
    assert!(form.error(FormField::Title).is_none());

    let _ = form.prepare_submission();
    assert_eq!(form.error(FormField::Title), Some(TITLE_TOO_SHORT));

    form.title = "Ab".to_string();
    form.revalidate(FormField::Title);
    assert!(form.error(FormField::Title).is_none());
}

#[tokio::test]
async fn uploaded_bytes_reach_the_host_unchanged() {
    let host = FakeImageHost::returning("https://cdn.test/x.png");
    let mut form = UploadForm::new();
    form.attach_image(&host, png_upload(3)).await.expect("upload");

    let uploads = host.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bytes, vec![0u8; 3]);
    assert_eq!(uploads[0].mime_type.as_deref(), Some("image/png"));
}
