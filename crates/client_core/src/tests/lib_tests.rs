use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    list_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    created: Arc<Mutex<Vec<NewImage>>>,
    uploads: Arc<Mutex<Vec<(HashMap<String, String>, Vec<u8>)>>>,
    create_status: Option<StatusCode>,
    upload_body: Option<Value>,
}

async fn handle_list_images(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let body = match query.get("after").map(String::as_str) {
        None => json!({
            "data": [
                {"id": "9", "title": "nine", "description": "d9", "url": "https://cdn.test/9.png", "ts": 1_700_000_000_000_i64},
                {"id": "8", "title": "eight", "description": "d8", "url": "https://cdn.test/8.png", "ts": 1_700_000_000_001_i64}
            ],
            "after": {"id": "8"}
        }),
        Some(_) => json!({
            "data": [
                {"id": "7", "title": "seven", "description": "d7", "url": "https://cdn.test/7.png", "ts": 1_700_000_000_002_i64}
            ]
        }),
    };
    state.list_queries.lock().await.push(query);
    Json(body)
}

async fn handle_create_image(
    State(state): State<ServerState>,
    Json(payload): Json<NewImage>,
) -> StatusCode {
    if let Some(status) = state.create_status {
        return status;
    }
    state.created.lock().await.push(payload);
    StatusCode::CREATED
}

async fn handle_upload(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Json<Value> {
    state.uploads.lock().await.push((query, body.to_vec()));
    Json(
        state
            .upload_body
            .clone()
            .unwrap_or_else(|| json!({"url": "https://cdn.test/uploaded.png"})),
    )
}

async fn spawn_gallery_server(state: ServerState) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/images", get(handle_list_images).post(handle_create_image))
        .route("/api/upload", post(handle_upload))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn list_images_sends_after_only_when_present() {
    let state = ServerState::default();
    let server_url = spawn_gallery_server(state.clone()).await.expect("spawn server");
    let client = HttpGalleryClient::new(format!("{server_url}/"));

    let first = client.list_images(None).await.expect("first page");
    assert_eq!(first.data.len(), 2);
    assert_eq!(first.after, Some(Cursor::new("8")));

    let second = client
        .list_images(first.after.as_ref())
        .await
        .expect("second page");
    assert_eq!(second.data[0].id.as_str(), "7");
    assert!(second.after.is_none());

    let queries = state.list_queries.lock().await;
    assert_eq!(queries.len(), 2);
    assert!(!queries[0].contains_key("after"));
    assert_eq!(queries[1].get("after").map(String::as_str), Some("8"));
}

#[tokio::test]
async fn create_image_posts_title_description_and_url() {
    let state = ServerState::default();
    let server_url = spawn_gallery_server(state.clone()).await.expect("spawn server");
    let client = HttpGalleryClient::new(server_url);
    let image = NewImage {
        title: "Sunset".to_string(),
        description: "Beach".to_string(),
        url: "https://cdn.test/sunset.png".to_string(),
    };

    client.create_image(&image).await.expect("create");

    assert_eq!(*state.created.lock().await, vec![image]);
}

#[tokio::test]
async fn create_image_surfaces_server_errors() {
    let state = ServerState {
        create_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..ServerState::default()
    };
    let server_url = spawn_gallery_server(state).await.expect("spawn server");
    let client = HttpGalleryClient::new(server_url);

    let err = client
        .create_image(&NewImage {
            title: "Sunset".to_string(),
            description: "Beach".to_string(),
            url: "https://cdn.test/sunset.png".to_string(),
        })
        .await
        .expect_err("500 must fail");
    assert!(format!("{err:#}").contains("500"));
}

#[tokio::test]
async fn image_host_receives_raw_bytes_and_query_params() {
    let state = ServerState::default();
    let server_url = spawn_gallery_server(state.clone()).await.expect("spawn server");
    let host = HttpImageHost::new(format!("{server_url}/api/upload"), Some("secret".to_string()));

    let url = host
        .upload_image(ImageUpload {
            filename: "sunset.png".to_string(),
            mime_type: Some("image/png".to_string()),
            bytes: vec![1, 2, 3, 4],
        })
        .await
        .expect("upload");
    assert_eq!(url, "https://cdn.test/uploaded.png");

    let uploads = state.uploads.lock().await;
    let (query, body) = &uploads[0];
    assert_eq!(body, &vec![1, 2, 3, 4]);
    assert_eq!(query.get("filename").map(String::as_str), Some("sunset.png"));
    assert_eq!(query.get("mime_type").map(String::as_str), Some("image/png"));
    assert_eq!(query.get("key").map(String::as_str), Some("secret"));
}

#[tokio::test]
async fn image_host_accepts_nested_response_and_defaults_mime_type() {
    let state = ServerState {
        upload_body: Some(json!({"data": {"url": "https://cdn.test/nested.png"}})),
        ..ServerState::default()
    };
    let server_url = spawn_gallery_server(state.clone()).await.expect("spawn server");
    let host = HttpImageHost::new(format!("{server_url}/api/upload"), None);

    let url = host
        .upload_image(ImageUpload {
            filename: "blob".to_string(),
            mime_type: None,
            bytes: vec![0],
        })
        .await
        .expect("upload");
    assert_eq!(url, "https://cdn.test/nested.png");

    let uploads = state.uploads.lock().await;
    let (query, _) = &uploads[0];
    assert_eq!(
        query.get("mime_type").map(String::as_str),
        Some(DEFAULT_MIME_TYPE)
    );
    assert!(!query.contains_key("key"));
}

#[tokio::test]
async fn image_host_rejects_empty_url() {
    let state = ServerState {
        upload_body: Some(json!({"url": "  "})),
        ..ServerState::default()
    };
    let server_url = spawn_gallery_server(state).await.expect("spawn server");
    let host = HttpImageHost::new(format!("{server_url}/api/upload"), None);

    let err = host
        .upload_image(ImageUpload {
            filename: "a.png".to_string(),
            mime_type: Some("image/png".to_string()),
            bytes: vec![0],
        })
        .await
        .expect_err("empty url");
    assert!(err.to_string().contains("empty url"));
}

#[tokio::test]
async fn missing_image_host_names_the_file() {
    let err = MissingImageHost
        .upload_image(ImageUpload {
            filename: "a.png".to_string(),
            mime_type: None,
            bytes: Vec::new(),
        })
        .await
        .expect_err("no host");
    assert!(err.to_string().contains("a.png"));
}

#[tokio::test]
async fn download_image_returns_body_bytes() {
    let state = ServerState::default();
    let server_url = spawn_gallery_server(state).await.expect("spawn server");
    let client = HttpGalleryClient::new(server_url.clone());

    let bytes = client
        .download_image(&format!("{server_url}/api/images"))
        .await
        .expect("download");
    let value: Value = serde_json::from_slice(&bytes).expect("json body");
    assert!(value["data"].is_array());
}
