//! File upload types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A file stored by the service, referenced from prediction inputs by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUpload {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksums: Option<FileChecksums>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<FileUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChecksums {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
}

impl FileUpload {
    /// URL to put into a prediction's input map.
    pub fn url(&self) -> Option<&str> {
        self.urls.as_ref().and_then(|u| u.get.as_deref())
    }
}
