use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Cursor, ImageId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub title: String,
    pub description: String,
    pub url: String,
    /// Creation time in milliseconds since the Unix epoch, server-assigned.
    pub ts: i64,
}

impl ImageRecord {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts).single()
    }
}

/// One page returned by `GET /api/images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesPage {
    pub data: Vec<ImageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Cursor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Cursor>,
}

/// Body of `POST /api/images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Response of the external image host. Hosts either answer with the URL at
/// the top level or nest it under `data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageHostResponse {
    Flat { url: String },
    Nested { data: HostedImage },
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostedImage {
    pub url: String,
}

impl ImageHostResponse {
    pub fn into_url(self) -> String {
        match self {
            ImageHostResponse::Flat { url } => url,
            ImageHostResponse::Nested { data } => data.url,
        }
    }
}
