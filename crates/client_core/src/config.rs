use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "gallery.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub image_host_url: String,
    pub image_host_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".into(),
            image_host_url: "http://127.0.0.1:3000/api/upload".into(),
            image_host_key: None,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Normalizes base URLs and rejects values `reqwest` could not use.
    pub fn validated(mut self) -> Result<Self> {
        self.api_base_url = normalize_base_url(&self.api_base_url)
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        self.image_host_url = normalize_base_url(&self.image_host_url)
            .with_context(|| format!("invalid image host url '{}'", self.image_host_url))?;
        if self
            .image_host_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.image_host_key = None;
        }
        Ok(self)
    }
}

/// Defaults, then `gallery.toml` (or `config_path`), then environment.
pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_overrides(&mut settings, &file_cfg),
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable config file: {err}")
            }
        },
        Err(err) if config_path.is_some() => {
            tracing::warn!(path = %path.display(), "config file not loaded: {err}");
        }
        Err(_) => {}
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_file_overrides(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("image_host_url").and_then(toml::Value::as_str) {
        settings.image_host_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("image_host_key").and_then(toml::Value::as_str) {
        settings.image_host_key = Some(v.to_string());
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
    {
        if let Ok(secs) = u64::try_from(v) {
            settings.request_timeout_secs = secs;
        }
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("GALLERY_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("GALLERY_IMAGE_HOST_URL") {
        settings.image_host_url = v;
    }
    if let Some(v) = lookup("APP__IMAGE_HOST_URL") {
        settings.image_host_url = v;
    }

    if let Some(v) = lookup("GALLERY_IMAGE_HOST_KEY") {
        settings.image_host_key = Some(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("url must not be empty"));
    }
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported scheme '{}'", parsed.scheme()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
