use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, GalleryApi, GalleryQuery, GalleryState, GalleryStatus, HttpGalleryClient,
    HttpImageHost, ImageUpload, InfiniteData, QueryCache, Settings, SubmitBlocked, SubmitOutcome,
    UploadForm,
};
use shared::{
    domain::Cursor,
    protocol::{ImageRecord, ImagesPage},
};

#[derive(Parser, Debug)]
#[command(name = "gallery", about = "Headless client for the image gallery")]
struct Cli {
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    image_host_url: Option<String>,
    #[arg(long)]
    image_host_key: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print gallery records, newest page first.
    List {
        /// Start after this cursor instead of the first page.
        #[arg(long)]
        after: Option<String>,
        /// Keep following cursors until the last page.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Upload a file to the image host and register it in the gallery.
    Upload {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
}

fn settings_from(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(cli.config.as_deref());
    if let Some(api_url) = &cli.api_url {
        settings.api_base_url = api_url.clone();
    }
    if let Some(image_host_url) = &cli.image_host_url {
        settings.image_host_url = image_host_url.clone();
    }
    if cli.image_host_key.is_some() {
        settings.image_host_key = cli.image_host_key.clone();
    }
    settings.validated()
}

fn format_record_line(record: &ImageRecord) -> String {
    let created = record
        .created_at()
        .map(|ts| {
            ts.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.id, created, record.title, record.description, record.url
    )
}

/// A listing that starts mid-chain keeps the cursor its first page was
/// requested with.
fn data_after(cursor: Cursor, page: ImagesPage) -> InfiniteData<ImagesPage> {
    let mut data = InfiniteData::default();
    data.push(Some(cursor), page);
    data
}

async fn list(api: Arc<dyn GalleryApi>, after: Option<String>, all: bool, json: bool) -> Result<()> {
    let query = GalleryQuery::new(api, QueryCache::new());
    let mut state = GalleryState::new();
    match after {
        None => query.load(&mut state).await,
        Some(cursor) => {
            let cursor = Cursor::new(cursor);
            let page = query.fetch_next_page(&cursor).await;
            state.apply_initial(page.map(|page| data_after(cursor, page)));
        }
    }
    if let GalleryStatus::Error(failure) = state.status() {
        return Err(anyhow!(failure.clone())).context("failed to load gallery");
    }

    if all {
        while let Some(cursor) = state.begin_next_page() {
            let page = query.fetch_next_page(&cursor).await;
            let failure = page.as_ref().err().cloned();
            state.apply_next_page(cursor, page);
            if let Some(failure) = failure {
                return Err(anyhow!(failure)).context("failed to load next page");
            }
        }
    }

    if json {
        let records: Vec<&ImageRecord> = state.records().collect();
        let body = serde_json::json!({
            "data": records,
            "after": state.next_cursor(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for record in state.records() {
        println!("{}", format_record_line(record));
    }
    if let Some(cursor) = state.next_cursor() {
        eprintln!("more images available: --after {cursor}");
    }
    Ok(())
}

async fn upload(settings: &Settings, file: PathBuf, title: String, description: String) -> Result<()> {
    let api = HttpGalleryClient::from_settings(settings)?;
    let host = HttpImageHost::from_settings(settings)?;
    let cache = QueryCache::<ImagesPage>::new();

    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("failed to read '{}'", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mime_type = mime_guess::from_path(&file)
        .first()
        .map(|mime| mime.essence_str().to_string());

    let mut form = UploadForm::new();
    form.title = title;
    form.description = description;
    let url = form
        .attach_image(
            &host,
            ImageUpload {
                filename,
                mime_type,
                bytes,
            },
        )
        .await
        .map_err(|failure| anyhow!(failure))
        .context("image was not uploaded")?;
    tracing::info!(%url, "image hosted");

    match form.submit(&api, &cache).await {
        SubmitOutcome::Blocked(SubmitBlocked::Invalid(errors)) => {
            for (field, message) in &errors {
                eprintln!("{field}: {message}");
            }
            bail!("form is invalid");
        }
        SubmitOutcome::Blocked(SubmitBlocked::UploadPending(toast)) => {
            bail!("{}: {}", toast.title, toast.description)
        }
        SubmitOutcome::Blocked(SubmitBlocked::InFlight) => bail!("submission already in flight"),
        SubmitOutcome::Completed(report) => {
            println!("{}: {}", report.toast.title, report.toast.description);
            match report.failure {
                Some(failure) => Err(anyhow!(failure)),
                None => Ok(()),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = settings_from(&cli)?;

    match cli.command {
        Command::List { after, all, json } => {
            let api: Arc<dyn GalleryApi> = Arc::new(HttpGalleryClient::from_settings(&settings)?);
            list(api, after, all, json).await
        }
        Command::Upload {
            file,
            title,
            description,
        } => upload(&settings, file, title, description).await,
    }
}
