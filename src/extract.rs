//! Coordinate extraction from free-form map URLs.
//!
//! [`Extractor::extract`] runs an ordered cascade of pure stages over the input.
//! Every pair a stage produces is checked against the configured [`Bounds`]; a
//! pair outside the box is logged and the cascade moves on to the next stage.
//! The first in-bounds pair wins. Nothing here returns an error: inputs that
//! cannot be resolved come back as [`Resolution::Defaulted`].

use crate::geo::{Bounds, Coordinate, DefaultReason, Resolution, Source, DEFAULT_COORDINATE};
use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static COMMA_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*),(\d+\.?\d*)").expect("invalid comma pair regex"));
static MAP_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"map[/=](\d+\.?\d*),(\d+\.?\d*)").expect("invalid map path regex")
});
static AT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\d+\.?\d*),(\d+\.?\d*)").expect("invalid @ marker regex"));
static NUMBER_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+)[^0-9]+(\d+\.\d+)").expect("invalid number pair regex")
});

const LAT_KEYS: [&str; 3] = ["lat", "latitude", "y"];
const LNG_KEYS: [&str; 3] = ["lng", "longitude", "x"];

/// Input handed to every stage. `url` is `None` when the raw string is not a valid URL.
pub struct Input<'a> {
    pub raw: &'a str,
    pub url: Option<Url>,
}

impl<'a> Input<'a> {
    pub fn new(raw: &'a str) -> Self {
        let url = match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Not a parseable URL ({}), using raw patterns only", e);
                None
            }
        };
        Self { raw, url }
    }
}

/// A cascade stage. Returns a raw `(lat, lng)` candidate; bounds are checked by the caller.
pub type Stage = fn(&Input<'_>, &Bounds) -> Option<(f64, f64)>;

/// Stages in the order they are tried.
pub const CASCADE: [(Source, Stage); 5] = [
    (Source::QueryParams, from_query),
    (Source::Fragment, from_fragment),
    (Source::Path, from_path),
    (Source::AtMarker, from_at_marker),
    (Source::NumberPair, from_number_pair),
];

#[derive(Debug, Clone)]
pub struct Extractor {
    bounds: Bounds,
    fallback: Coordinate,
    short_link_domains: Vec<String>,
    map_hosts: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            bounds: Bounds::KOREA,
            fallback: DEFAULT_COORDINATE,
            short_link_domains: vec!["naver.me".to_string()],
            map_hosts: vec!["map.naver.com".to_string(), "place.naver.com".to_string()],
        }
    }
}

impl Extractor {
    pub fn new(
        bounds: Bounds,
        fallback: Coordinate,
        short_link_domains: Vec<String>,
        map_hosts: Vec<String>,
    ) -> Self {
        Self {
            bounds,
            fallback,
            short_link_domains,
            map_hosts,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn fallback(&self) -> Coordinate {
        self.fallback
    }

    pub fn is_short_link(&self, raw: &str) -> bool {
        self.short_link_domains
            .iter()
            .any(|domain| raw.contains(domain.as_str()))
    }

    /// Whether `raw` points at a map service this extractor knows about.
    pub fn is_map_url(&self, raw: &str) -> bool {
        self.is_short_link(raw) || self.map_hosts.iter().any(|host| raw.contains(host.as_str()))
    }

    pub fn default_for(&self, reason: DefaultReason) -> Resolution {
        Resolution::defaulted(self.fallback, reason)
    }

    pub fn extract(&self, raw: &str) -> Resolution {
        let raw = raw.trim();
        if raw.is_empty() {
            warn!("Empty map URL, using default coordinate");
            return self.default_for(DefaultReason::EmptyInput);
        }

        if self.is_short_link(raw) {
            // Following the redirect needs a network round trip.
            warn!("Short link {} cannot be expanded, using default coordinate", raw);
            return self.default_for(DefaultReason::ShortLink);
        }

        let input = Input::new(raw);
        let mut rejected = None;

        for (source, stage) in CASCADE {
            let Some((lat, lng)) = stage(&input, &self.bounds) else {
                continue;
            };
            let candidate = Coordinate::new(lat, lng);
            if self.bounds.contains(&candidate) {
                info!("Extracted {} from {} of {}", candidate, source, raw);
                return Resolution::resolved(candidate, source);
            }
            debug!("Rejected out-of-bounds pair {} from {}", candidate, source);
            rejected = Some((lat, lng));
        }

        let reason = match rejected {
            Some((lat, lng)) => DefaultReason::OutOfBounds { lat, lng },
            None => DefaultReason::NoMatch,
        };
        warn!("Could not extract a coordinate from {}: {}", raw, reason);
        self.default_for(reason)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v != 0.0)
}

fn captured_pair(re: &Regex, haystack: &str) -> Option<(f64, f64)> {
    let caps = re.captures(haystack)?;
    let lat = parse_number(caps.get(1)?.as_str())?;
    let lng = parse_number(caps.get(2)?.as_str())?;
    Some((lat, lng))
}

fn first_param(url: &Url, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        url.query_pairs()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    })
}

pub fn from_query(input: &Input<'_>, _bounds: &Bounds) -> Option<(f64, f64)> {
    let url = input.url.as_ref()?;
    let lat = parse_number(&first_param(url, &LAT_KEYS)?)?;
    let lng = parse_number(&first_param(url, &LNG_KEYS)?)?;
    Some((lat, lng))
}

pub fn from_fragment(input: &Input<'_>, _bounds: &Bounds) -> Option<(f64, f64)> {
    let fragment = input.url.as_ref()?.fragment()?;
    captured_pair(&COMMA_PAIR, fragment)
}

pub fn from_path(input: &Input<'_>, _bounds: &Bounds) -> Option<(f64, f64)> {
    let url = input.url.as_ref()?;
    [Some(url.path()), url.query()]
        .into_iter()
        .flatten()
        .find_map(|part| captured_pair(&MAP_PATH, part))
}

pub fn from_at_marker(input: &Input<'_>, _bounds: &Bounds) -> Option<(f64, f64)> {
    captured_pair(&AT_MARKER, input.raw)
}

/// Takes the first two decimals in the string and guesses which one is the latitude.
pub fn from_number_pair(input: &Input<'_>, bounds: &Bounds) -> Option<(f64, f64)> {
    let (first, second) = captured_pair(&NUMBER_PAIR, input.raw)?;
    match (bounds.contains_lat(first), bounds.contains_lat(second)) {
        (true, false) => Some((first, second)),
        (false, true) => Some((second, first)),
        _ => {
            debug!("Ambiguous number pair ({}, {}), ignoring", first, second);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> Resolution {
        Extractor::default().extract(raw)
    }

    #[test]
    fn query_parameters_are_returned_exactly() {
        let res = extract("https://map.naver.com/v5/?lat=37.5665&lng=126.978");
        assert_eq!(
            res,
            Resolution::resolved(Coordinate::new(37.5665, 126.978), Source::QueryParams)
        );
    }

    #[test]
    fn query_aliases_are_accepted() {
        let res = extract("https://map.naver.com/?y=35.1796&x=129.0756");
        assert_eq!(res.coordinate(), Coordinate::new(35.1796, 129.0756));

        let res = extract("https://example.com/?latitude=36.35&longitude=127.38");
        assert_eq!(res.coordinate(), Coordinate::new(36.35, 127.38));
        assert_eq!(res.source(), Some(Source::QueryParams));
    }

    #[test]
    fn empty_input_defaults() {
        assert_eq!(
            extract(""),
            Resolution::defaulted(DEFAULT_COORDINATE, DefaultReason::EmptyInput)
        );
        assert_eq!(extract("   ").reason(), Some(DefaultReason::EmptyInput));
    }

    #[test]
    fn short_links_are_not_parsed() {
        let res = extract("https://naver.me/x?lat=37.1&lng=127.1");
        assert_eq!(res.reason(), Some(DefaultReason::ShortLink));
        assert_eq!(res.coordinate(), DEFAULT_COORDINATE);
    }

    #[test]
    fn fragment_pair_is_used() {
        let res = extract("https://map.naver.com/v5/search#place@37.4979,127.0276");
        assert_eq!(res.source(), Some(Source::Fragment));
        assert_eq!(res.coordinate(), Coordinate::new(37.4979, 127.0276));
    }

    #[test]
    fn map_path_pair_is_used() {
        let res = extract("https://example.com/map/35.8714,128.6014");
        assert_eq!(res.source(), Some(Source::Path));
        assert_eq!(res.coordinate(), Coordinate::new(35.8714, 128.6014));

        let res = extract("https://example.com/view?map=35.8714,128.6014");
        assert_eq!(res.source(), Some(Source::Path));
    }

    #[test]
    fn at_marker_works_without_a_valid_url() {
        let res = extract("somewhere @37.5000,127.0000 nearby");
        assert_eq!(res.source(), Some(Source::AtMarker));
        assert_eq!(res.coordinate(), Coordinate::new(37.5, 127.0));
    }

    #[test]
    fn number_pair_is_ordered_by_latitude_range() {
        let res = extract("coords 127.0276 and 37.4979");
        assert_eq!(res.source(), Some(Source::NumberPair));
        assert_eq!(res.coordinate(), Coordinate::new(37.4979, 127.0276));
    }

    #[test]
    fn number_pair_outside_latitude_range_is_unusable() {
        let res = extract("https://map.naver.com/v5/entry?c=14141234.5678,4512345.123,15,0,0,0,dh");
        assert_eq!(res.reason(), Some(DefaultReason::NoMatch));
        assert_eq!(res.coordinate(), DEFAULT_COORDINATE);
    }

    #[test]
    fn out_of_bounds_query_falls_through_to_fragment() {
        let res = extract("https://map.naver.com/?lat=40.0&lng=127.0#37.1,127.2");
        assert_eq!(res.source(), Some(Source::Fragment));
        assert_eq!(res.coordinate(), Coordinate::new(37.1, 127.2));
    }

    #[test]
    fn out_of_bounds_pair_is_reported() {
        let res = extract("https://map.naver.com/?lat=40.0&lng=127.0");
        assert_eq!(
            res.reason(),
            Some(DefaultReason::OutOfBounds {
                lat: 40.0,
                lng: 127.0
            })
        );
    }

    #[test]
    fn zero_query_values_count_as_missing() {
        let res = extract("https://map.naver.com/?lat=0&lng=0");
        assert_eq!(res.reason(), Some(DefaultReason::NoMatch));
    }

    #[test]
    fn recognises_map_urls() {
        let ex = Extractor::default();
        assert!(ex.is_map_url("https://map.naver.com/v5/entry/place/1"));
        assert!(ex.is_map_url("https://naver.me/abc"));
        assert!(ex.is_map_url("https://m.place.naver.com/restaurant/1"));
        assert!(!ex.is_map_url("https://example.com"));
    }
}
