use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::translation::TranslationEntry;

/// DTO for a translation fetch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequestDto {
    /// Identity of the requesting user
    #[serde(rename = "UserId")]
    pub user_id: String,

    /// Optional read access credential
    #[serde(rename = "ReadAccessPassword")]
    pub read_access_password: Option<String>,

    /// Previous fetch time so the server can answer with deltas only
    #[serde(rename = "LastFetchUTC")]
    pub last_fetch_utc: Option<i64>,

    /// Keys of interest
    #[serde(rename = "Keys")]
    pub keys: Vec<String>,

    /// Locales of interest
    #[serde(rename = "Locales")]
    pub locales: Vec<String>,
}

/// A single translated key returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationItemDto {
    pub key: String,
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

impl From<TranslationItemDto> for TranslationEntry {
    fn from(item: TranslationItemDto) -> Self {
        TranslationEntry::new(item.key, item.translations)
    }
}

/// Error entry of a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationErrorDto {
    pub code: i32,
    pub message: String,
}

/// Response envelope of the translation endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponseDto {
    #[serde(rename = "type", default)]
    pub response_type: Option<String>,

    #[serde(default)]
    pub count: i64,

    #[serde(default)]
    pub items: Option<Vec<TranslationItemDto>>,

    #[serde(default)]
    pub errors: Option<Vec<TranslationErrorDto>>,
}

impl TranslationResponseDto {
    /// Items to merge, empty when the server reported errors or nothing new
    pub fn into_entries(self) -> Vec<TranslationEntry> {
        self.items
            .unwrap_or_default()
            .into_iter()
            .map(TranslationEntry::from)
            .filter(|entry| !entry.is_empty())
            .collect()
    }
}

/// Result of a health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub ok: bool,
    /// Informational body returned by the health check
    pub payload: Option<String>,
}
