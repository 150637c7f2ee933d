use std::collections::{BTreeMap, HashMap, HashSet};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::entities::translation::TranslationEntry;
use crate::domain::services::i18n_service::{LocalizationError, LocalizationResult};

/// Serializable view of the cache: key -> locale -> value, sorted for stable output
pub type CacheSnapshot = BTreeMap<String, BTreeMap<String, String>>;

/// Concurrent in-memory translation cache
///
/// Each key lives in its own map entry; writers lock only the shard holding
/// that key, so lookups of unrelated keys never wait on a merge.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: DashMap<String, HashMap<String, String>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Looks up the value of `key` for `locale`
    pub fn get(&self, key: &str, locale: &str) -> Option<String> {
        self.entries
            .get(key)
            .and_then(|locales| locales.get(locale).cloned())
    }

    /// Upserts the given locale values of `key`
    ///
    /// Returns false when `translations` is empty, nothing is stored then.
    pub fn merge(&self, key: &str, translations: HashMap<String, String>) -> bool {
        if translations.is_empty() {
            return false;
        }

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut existing) => existing.get_mut().extend(translations),
            Entry::Vacant(slot) => {
                slot.insert(translations);
            }
        }
        true
    }

    /// Merges a batch of entries, returns how many were applied
    pub fn merge_entries<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = TranslationEntry>,
    {
        let mut applied = 0;
        for entry in entries {
            if self.merge(&entry.key, entry.translations) {
                applied += 1;
            }
        }
        applied
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Point-in-time copy of the whole cache
    pub fn snapshot(&self) -> CacheSnapshot {
        self.entries
            .iter()
            .map(|entry| {
                let locales = entry
                    .value()
                    .iter()
                    .map(|(locale, value)| (locale.clone(), value.clone()))
                    .collect();
                (entry.key().clone(), locales)
            })
            .collect()
    }

    /// Deterministic JSON encoding of the whole cache
    pub fn to_json_bytes(&self) -> LocalizationResult<Vec<u8>> {
        serde_json::to_vec(&self.snapshot())
            .map_err(|e| LocalizationError::CacheWrite(format!("Failed to serialize cache: {}", e)))
    }

    /// Replaces the cache content with the decoded JSON document
    ///
    /// Buckets load their blob on start, before lookups reach the cache. Keys
    /// present in the document are overwritten in place and stale keys are
    /// dropped afterwards, so a concurrent reader never sees a shared key
    /// vanish. On malformed input the cache is left empty.
    pub fn replace_from_json(&self, bytes: &[u8]) -> LocalizationResult<usize> {
        let snapshot: CacheSnapshot = match serde_json::from_slice(bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.entries.clear();
                return Err(LocalizationError::Decode(format!("Failed to parse cache document: {}", e)));
            }
        };

        let mut loaded = HashSet::with_capacity(snapshot.len());
        for (key, locales) in snapshot {
            if locales.is_empty() {
                continue;
            }
            self.entries.insert(key.clone(), locales.into_iter().collect());
            loaded.insert(key);
        }
        self.entries.retain(|key, _| loaded.contains(key));
        Ok(loaded.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn locales(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(l, v)| (l.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_inserts_and_upserts() {
        let cache = TranslationCache::new();

        assert!(cache.merge("greeting", locales(&[("en_US", "Hello")])));
        assert!(cache.merge("greeting", locales(&[("en_US", "Hi"), ("de_DE", "Hallo")])));

        assert_eq!(cache.get("greeting", "en_US").as_deref(), Some("Hi"));
        assert_eq!(cache.get("greeting", "de_DE").as_deref(), Some("Hallo"));
        assert_eq!(cache.get("greeting", "fr_FR"), None);
        assert_eq!(cache.get("farewell", "en_US"), None);
    }

    #[test]
    fn test_empty_merge_is_not_stored() {
        let cache = TranslationCache::new();

        assert!(!cache.merge("greeting", HashMap::new()));
        assert!(!cache.contains_key("greeting"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = TranslationCache::new();
        let twice = TranslationCache::new();
        let values = locales(&[("en_US", "Hello"), ("de_DE", "Hallo")]);

        once.merge("greeting", values.clone());
        twice.merge("greeting", values.clone());
        twice.merge("greeting", values);

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn test_json_round_trip() {
        let cache = TranslationCache::new();
        cache.merge("greeting", locales(&[("en_US", "Hello"), ("de_DE", "Hallo")]));
        cache.merge("farewell", locales(&[("en_US", "Bye")]));

        let bytes = cache.to_json_bytes().unwrap();
        let restored = TranslationCache::new();
        assert_eq!(restored.replace_from_json(&bytes).unwrap(), 2);

        assert_eq!(restored.snapshot(), cache.snapshot());

        let empty = TranslationCache::new();
        let restored = TranslationCache::new();
        restored.replace_from_json(&empty.to_json_bytes().unwrap()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = TranslationCache::new();
        let b = TranslationCache::new();
        a.merge("x", locales(&[("en_US", "1"), ("de_DE", "2")]));
        a.merge("y", locales(&[("en_US", "3")]));
        b.merge("y", locales(&[("en_US", "3")]));
        b.merge("x", locales(&[("de_DE", "2"), ("en_US", "1")]));

        assert_eq!(a.to_json_bytes().unwrap(), b.to_json_bytes().unwrap());
    }

    #[test]
    fn test_replace_overwrites_shared_keys_and_drops_stale_ones() {
        let cache = TranslationCache::new();
        cache.merge("greeting", locales(&[("en_US", "Hi"), ("de_DE", "Servus")]));
        cache.merge("farewell", locales(&[("en_US", "Bye")]));

        let loaded = cache
            .replace_from_json(br#"{"greeting":{"en_US":"Hello"},"empty":{}}"#)
            .unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(cache.get("greeting", "en_US").as_deref(), Some("Hello"));
        assert_eq!(cache.get("greeting", "de_DE"), None);
        assert!(!cache.contains_key("farewell"));
        assert!(!cache.contains_key("empty"));
    }

    #[test]
    fn test_malformed_document_leaves_cache_empty() {
        let cache = TranslationCache::new();
        cache.merge("greeting", locales(&[("en_US", "Hello")]));

        let result = cache.replace_from_json(b"{\"greeting\": [1, 2");

        assert!(matches!(result, Err(LocalizationError::Decode(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_merges_on_distinct_keys() {
        let cache = Arc::new(TranslationCache::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("key-{}-{}", worker, i);
                        cache.merge(&key, locales(&[("en_US", "value")]));
                        assert_eq!(cache.get(&key, "en_US").as_deref(), Some("value"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 800);
    }
}
