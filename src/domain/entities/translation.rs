use std::collections::{BTreeMap, HashMap};

/// Config record key holding the globally active locale index
pub const LOCALE_INDEX_KEY: &str = "locale_index";

/// Config record key prefix for the per bucket fetch timestamp
pub const LAST_FETCH_KEY_PREFIX: &str = "last_fetch_utc_";

/// A translation key with its localized values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub key: String,
    pub translations: HashMap<String, String>,
}

impl TranslationEntry {
    pub fn new<S: Into<String>>(key: S, translations: HashMap<String, String>) -> Self {
        Self {
            key: key.into(),
            translations,
        }
    }

    /// Entries without any locale are never stored
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// Ordered list of the locales a bucket serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleList {
    locales: Vec<String>,
}

impl LocaleList {
    pub fn new(locales: Vec<String>) -> Self {
        Self { locales }
    }

    pub fn index_of(&self, locale: &str) -> Option<usize> {
        self.locales.iter().position(|l| l == locale)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.locales.get(index).map(String::as_str)
    }

    /// Returns `index` if it addresses a configured locale, 0 otherwise
    pub fn clamp_index(&self, index: i64) -> usize {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.locales.len())
            .unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.locales
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }
}

/// Persisted per bucket state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketConfig {
    pub active_locale_index: usize,
    /// Zero means the bucket was never fetched
    pub last_fetch_unix_seconds: i64,
}

impl BucketConfig {
    pub fn last_fetch_key(bucket_id: &str) -> String {
        format!("{}{}", LAST_FETCH_KEY_PREFIX, bucket_id)
    }

    /// Reads the bucket view out of a shared config record
    ///
    /// The locale index is shared by every bucket, so an index beyond this
    /// bucket's list only falls back to 0 locally and stays in the record.
    pub fn from_record(record: &BTreeMap<String, i64>, bucket_id: &str, locales: &LocaleList) -> Self {
        let raw_index = record.get(LOCALE_INDEX_KEY).copied().unwrap_or(0);
        let active_locale_index = locales.clamp_index(raw_index);
        if active_locale_index as i64 != raw_index {
            tracing::warn!(
                "Persisted locale index {} out of range for bucket {}, using 0",
                raw_index,
                bucket_id
            );
        }

        let last_fetch_unix_seconds = record
            .get(&Self::last_fetch_key(bucket_id))
            .copied()
            .unwrap_or(0)
            .max(0);

        Self {
            active_locale_index,
            last_fetch_unix_seconds,
        }
    }

    /// Fills in missing or negative values of a bucket, returns true if the record changed
    pub fn repair_record(record: &mut BTreeMap<String, i64>, bucket_id: &str) -> bool {
        let mut changed = false;
        for key in [LOCALE_INDEX_KEY.to_string(), Self::last_fetch_key(bucket_id)] {
            if record.get(&key).map_or(true, |value| *value < 0) {
                record.insert(key, 0);
                changed = true;
            }
        }
        changed
    }

    pub fn has_fetched(&self) -> bool {
        self.last_fetch_unix_seconds > 0
    }
}
