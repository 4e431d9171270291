use crate::geo::Resolution;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// What a cache entry was resolved from. URLs and place IDs never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Url(String),
    Place(String),
}

impl CacheKey {
    pub fn url(url: impl Into<String>) -> Self {
        CacheKey::Url(url.into())
    }

    pub fn place(place_id: impl Into<String>) -> Self {
        CacheKey::Place(place_id.into())
    }
}

/// Unbounded map from input key to its resolution.
///
/// Entries live as long as the cache and are never evicted, so one cache should
/// only ever see a small working set of distinct URLs.
#[derive(Debug, Default)]
pub struct CoordinateCache {
    entries: RwLock<HashMap<CacheKey, Resolution>>,
}

impl CoordinateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Resolution> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    pub fn insert(&self, key: CacheKey, resolution: Resolution) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolution);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coordinate, Source};
    use std::sync::Arc;

    #[test]
    fn insert_then_get() {
        let cache = CoordinateCache::new();
        assert!(cache.is_empty());
        let res = Resolution::resolved(Coordinate::new(37.0, 127.0), Source::AtMarker);
        cache.insert(CacheKey::url("https://map.naver.com/@37,127"), res);
        assert_eq!(cache.get(&CacheKey::url("https://map.naver.com/@37,127")), Some(res));
        assert_eq!(cache.get(&CacheKey::url("other")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn url_and_place_entries_are_kept_apart() {
        let cache = CoordinateCache::new();
        let by_url = Resolution::resolved(Coordinate::new(37.0, 127.0), Source::AtMarker);
        let by_place = Resolution::resolved(Coordinate::new(35.0, 129.0), Source::PlaceLookup);
        cache.insert(CacheKey::url("123"), by_url);
        cache.insert(CacheKey::place("123"), by_place);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&CacheKey::url("123")), Some(by_url));
        assert_eq!(cache.get(&CacheKey::place("123")), Some(by_place));
    }

    #[test]
    fn shared_between_threads() {
        let cache = Arc::new(CoordinateCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let res = Resolution::resolved(
                        Coordinate::new(35.0 + i as f64, 127.0),
                        Source::QueryParams,
                    );
                    cache.insert(CacheKey::url(format!("key-{i}")), res);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert_eq!(cache.len(), 4);
        cache.clear();
        assert!(cache.is_empty());
    }
}
