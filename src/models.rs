use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorkageType {
    Free,
    #[default]
    Paid,
}

impl CorkageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorkageType::Free => "free",
            CorkageType::Paid => "paid",
        }
    }
}

impl fmt::Display for CorkageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorkageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(CorkageType::Free),
            "paid" => Ok(CorkageType::Paid),
            other => Err(format!("unknown corkage type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub location1: String, // region, e.g. Seoul
    pub location2: String, // district, e.g. Gangnam-gu
    pub address: Option<String>,
    pub map_lat: Option<f64>,
    pub map_lng: Option<f64>,
    pub corkage_type: CorkageType,
    pub corkage_fee: i64,
    pub website: Option<String>,
    pub updated_at: Option<String>,
}

impl Restaurant {
    /// The stored map coordinate, if both halves are present.
    pub fn stored_coordinate(&self) -> Option<Coordinate> {
        match (self.map_lat, self.map_lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

/// Body returned by the place lookup proxy.
#[derive(Debug, Deserialize)]
pub struct PlaceCoordinates {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl PlaceCoordinates {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}
