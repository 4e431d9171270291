//! Place ID extraction and the place lookup interface.
//!
//! Some map URLs carry no coordinate at all, only the provider's numeric place
//! ID. [`extract_place_id`] pulls that ID out. A [`PlaceLookup`] implementation
//! exchanges it for a coordinate.

use crate::geo::Coordinate;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static PLACE_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"place/(\d+)",
        r"entry/place/(\d+)",
        r"eqpVu/place/(\d+)",
        r"(?:place|entry)/(\d+)",
        r"id=(\d+)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("invalid place id regex"))
    .collect()
});

/// Returns the first place ID captured by the known URL shapes, tried in order.
pub fn extract_place_id(url: &str) -> Option<&str> {
    PLACE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("place lookup is not configured")]
    NotConfigured,

    #[error("lookup response had no coordinate")]
    MissingCoordinate,

    #[error("lookup returned ({lat}, {lng}), outside the accepted bounds")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Exchanges a place ID for a coordinate.
#[allow(async_fn_in_trait)]
pub trait PlaceLookup {
    async fn lookup(&self, place_id: &str) -> Result<Coordinate, LookupError>;
}

/// The lookup used when no endpoint is wired up. Always fails with
/// [`LookupError::NotConfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

impl PlaceLookup for Unconfigured {
    async fn lookup(&self, _place_id: &str) -> Result<Coordinate, LookupError> {
        Err(LookupError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_place_path() {
        assert_eq!(
            extract_place_id("https://map.naver.com/v5/entry/place/1234567?c=15,0"),
            Some("1234567")
        );
    }

    #[test]
    fn mobile_and_entry_shapes() {
        assert_eq!(
            extract_place_id("https://m.map.naver.com/eqpVu/place/998877"),
            Some("998877")
        );
        assert_eq!(
            extract_place_id("https://map.naver.com/entry/445566"),
            Some("445566")
        );
    }

    #[test]
    fn id_query_parameter() {
        assert_eq!(
            extract_place_id("https://map.naver.com/local/siteview.nhn?id=31337"),
            Some("31337")
        );
    }

    #[test]
    fn no_place_id() {
        assert_eq!(extract_place_id("https://map.naver.com/v5/search/wine"), None);
        assert_eq!(extract_place_id(""), None);
    }

    #[tokio::test]
    async fn unconfigured_lookup_reports_not_configured() {
        let err = Unconfigured.lookup("1").await.unwrap_err();
        assert!(matches!(err, LookupError::NotConfigured));
    }
}
