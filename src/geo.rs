//! Coordinate types shared by the extractor, the resolver and the record store.
//!
//! A [`Resolution`] is what every resolution path returns. It always carries a
//! usable [`Coordinate`], and it records whether that coordinate was actually
//! recovered ([`Resolution::Resolved`]) or substituted ([`Resolution::Defaulted`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seoul City Hall, used whenever nothing better is available.
pub const DEFAULT_COORDINATE: Coordinate = Coordinate {
    lat: 37.5665,
    lng: 126.9780,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both axes differ from `other` by no more than `epsilon` degrees.
    pub fn is_near(&self, other: &Coordinate, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lng - other.lng).abs() <= epsilon
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Inclusive latitude/longitude box a coordinate must fall in to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Approximate box around the Korean peninsula.
    pub const KOREA: Bounds = Bounds {
        min_lat: 33.0,
        max_lat: 39.0,
        min_lng: 124.0,
        max_lng: 132.0,
    };

    pub fn contains_lat(&self, lat: f64) -> bool {
        lat.is_finite() && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn contains_lng(&self, lng: f64) -> bool {
        lng.is_finite() && lng >= self.min_lng && lng <= self.max_lng
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.contains_lat(coordinate.lat) && self.contains_lng(coordinate.lng)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::KOREA
    }
}

/// Where a resolved coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Coordinate already stored on the record.
    Stored,
    QueryParams,
    Fragment,
    Path,
    AtMarker,
    NumberPair,
    PlaceLookup,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Stored => "stored coordinate",
            Source::QueryParams => "query parameters",
            Source::Fragment => "url fragment",
            Source::Path => "url path",
            Source::AtMarker => "@ marker",
            Source::NumberPair => "number pair",
            Source::PlaceLookup => "place lookup",
        };
        f.write_str(name)
    }
}

/// Why the default coordinate was substituted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultReason {
    EmptyInput,
    /// Short links need a redirect to be followed, which is not done.
    ShortLink,
    NoMatch,
    /// A pair was found but fell outside the bounds. Carries the last rejected pair.
    OutOfBounds { lat: f64, lng: f64 },
    LookupNotConfigured,
    LookupFailed,
}

impl fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultReason::EmptyInput => f.write_str("empty input"),
            DefaultReason::ShortLink => f.write_str("short link cannot be expanded"),
            DefaultReason::NoMatch => f.write_str("no coordinate pattern matched"),
            DefaultReason::OutOfBounds { lat, lng } => {
                write!(f, "pair ({lat}, {lng}) is outside the accepted bounds")
            }
            DefaultReason::LookupNotConfigured => f.write_str("place lookup is not configured"),
            DefaultReason::LookupFailed => f.write_str("place lookup failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved {
        coordinate: Coordinate,
        source: Source,
    },
    Defaulted {
        coordinate: Coordinate,
        reason: DefaultReason,
    },
}

impl Resolution {
    pub fn resolved(coordinate: Coordinate, source: Source) -> Self {
        Resolution::Resolved { coordinate, source }
    }

    pub fn defaulted(coordinate: Coordinate, reason: DefaultReason) -> Self {
        Resolution::Defaulted { coordinate, reason }
    }

    /// The coordinate to use, whichever way it was obtained.
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Resolution::Resolved { coordinate, .. } | Resolution::Defaulted { coordinate, .. } => {
                *coordinate
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            Resolution::Resolved { source, .. } => Some(*source),
            Resolution::Defaulted { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<DefaultReason> {
        match self {
            Resolution::Resolved { .. } => None,
            Resolution::Defaulted { reason, .. } => Some(*reason),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved { coordinate, source } => {
                write!(f, "{coordinate} resolved from {source}")
            }
            Resolution::Defaulted { coordinate, reason } => {
                write!(f, "{coordinate} defaulted: {reason}")
            }
        }
    }
}
