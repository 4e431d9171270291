//! Cached coordinate resolution.
//!
//! A [`Resolver`] owns the [`Extractor`], a [`CoordinateCache`] and a
//! [`PlaceLookup`]. Each input is resolved once: the cache is consulted before
//! the extraction cascade runs, and whatever the cascade produces, success or
//! default, is stored under the input's URL key afterwards.

use crate::cache::{CacheKey, CoordinateCache};
use crate::extract::Extractor;
use crate::geo::{DefaultReason, Resolution, Source};
use crate::place::{extract_place_id, LookupError, PlaceLookup, Unconfigured};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, info, warn};

pub struct Resolver<L = Unconfigured> {
    extractor: Extractor,
    cache: CoordinateCache,
    lookup: L,
    extractions: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Extractor::default(), Unconfigured)
    }
}

impl<L: PlaceLookup> Resolver<L> {
    pub fn new(extractor: Extractor, lookup: L) -> Self {
        Self::with_cache(extractor, lookup, CoordinateCache::new())
    }

    /// Builds a resolver around an existing cache, e.g. one pre-seeded by a test.
    pub fn with_cache(extractor: Extractor, lookup: L, cache: CoordinateCache) -> Self {
        Self {
            extractor,
            cache,
            lookup,
            extractions: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn cache(&self) -> &CoordinateCache {
        &self.cache
    }

    /// Number of cache misses handed to the extractor. Inputs the extractor
    /// rejects up front, such as short links, still count.
    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::Relaxed)
    }

    /// Number of calls made to the place lookup.
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::Relaxed)
    }

    /// Resolves `url` with the extraction cascade only. Never touches the place lookup.
    pub fn resolve_url(&self, url: &str) -> Resolution {
        if url.trim().is_empty() {
            return self.extractor.default_for(DefaultReason::EmptyInput);
        }

        let key = CacheKey::url(url);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {}", url);
            return hit;
        }

        self.extractions.fetch_add(1, Ordering::Relaxed);
        let resolution = self.extractor.extract(url);
        self.cache.insert(key, resolution);
        resolution
    }

    /// Resolves `url`, falling back to a place lookup when the URL carries a
    /// place ID but no usable coordinate.
    pub async fn locate(&self, url: &str) -> Resolution {
        let direct = self.resolve_url(url);
        match direct.reason() {
            Some(DefaultReason::NoMatch) | Some(DefaultReason::OutOfBounds { .. }) => {}
            _ => return direct,
        }

        let Some(place_id) = extract_place_id(url) else {
            return direct;
        };
        info!("No coordinate in {}, trying place ID {}", url, place_id);

        let key = CacheKey::place(place_id);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for place {}", place_id);
            return hit;
        }

        self.lookup_calls.fetch_add(1, Ordering::Relaxed);
        let resolution = match self.lookup.lookup(place_id).await {
            Ok(coordinate) => Resolution::resolved(coordinate, Source::PlaceLookup),
            Err(LookupError::NotConfigured) => {
                warn!("Place lookup not configured, using default for place {}", place_id);
                self.extractor.default_for(DefaultReason::LookupNotConfigured)
            }
            Err(e) => {
                error!("Place lookup for {} failed: {}", place_id, e);
                // Transient; a later call may succeed.
                return self.extractor.default_for(DefaultReason::LookupFailed);
            }
        };
        self.cache.insert(key, resolution);
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coordinate, DEFAULT_COORDINATE};

    #[test]
    fn second_call_is_served_from_cache() {
        let resolver: Resolver = Resolver::default();
        let url = "https://map.naver.com/v5/?lat=37.5&lng=127.1";
        let first = resolver.resolve_url(url);
        let second = resolver.resolve_url(url);
        assert_eq!(first, second);
        assert_eq!(resolver.extractions(), 1);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn defaults_are_cached_too() {
        let resolver: Resolver = Resolver::default();
        let url = "https://naver.me/abcd";
        assert_eq!(resolver.resolve_url(url).reason(), Some(DefaultReason::ShortLink));
        resolver.resolve_url(url);
        assert_eq!(resolver.extractions(), 1);
    }

    #[test]
    fn empty_input_skips_the_cache() {
        let resolver: Resolver = Resolver::default();
        let res = resolver.resolve_url("");
        assert_eq!(res.coordinate(), DEFAULT_COORDINATE);
        assert_eq!(resolver.extractions(), 0);
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn preseeded_cache_short_circuits_extraction() {
        let cache = CoordinateCache::new();
        let seeded = Resolution::resolved(Coordinate::new(35.0, 129.0), Source::Stored);
        cache.insert(CacheKey::url("anything"), seeded);
        let resolver = Resolver::with_cache(Extractor::default(), Unconfigured, cache);
        assert_eq!(resolver.resolve_url("anything"), seeded);
        assert_eq!(resolver.extractions(), 0);
    }

    #[tokio::test]
    async fn place_id_without_lookup_reports_not_configured() {
        let resolver: Resolver = Resolver::default();
        let res = resolver
            .locate("https://map.naver.com/v5/entry/place/1234567")
            .await;
        assert_eq!(res.reason(), Some(DefaultReason::LookupNotConfigured));
        assert_eq!(res.coordinate(), DEFAULT_COORDINATE);
        assert_eq!(resolver.cache().get(&CacheKey::place("1234567")), Some(res));
    }

    #[tokio::test]
    async fn url_shaped_like_a_place_key_does_not_shadow_the_place() {
        let resolver: Resolver = Resolver::default();
        assert_eq!(
            resolver.resolve_url("place_123").reason(),
            Some(DefaultReason::NoMatch)
        );

        let res = resolver
            .locate("https://map.naver.com/v5/entry/place/123")
            .await;
        assert_eq!(res.reason(), Some(DefaultReason::LookupNotConfigured));
        assert_eq!(resolver.lookup_calls(), 1);
    }

    #[tokio::test]
    async fn short_link_never_reaches_lookup() {
        let resolver: Resolver = Resolver::default();
        let res = resolver.locate("https://naver.me/place/123").await;
        assert_eq!(res.reason(), Some(DefaultReason::ShortLink));
        assert_eq!(resolver.lookup_calls(), 0);
    }
}
