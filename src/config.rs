use crate::extract::Extractor;
use crate::geo::{Bounds, Coordinate, DEFAULT_COORDINATE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub geo: GeoConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeoConfig {
    pub default_lat: f64, // Used whenever a URL cannot be resolved
    pub default_lng: f64,
    pub bounds: Bounds,
    pub short_link_domains: Vec<String>, // Links that need a redirect to expand
    pub map_hosts: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LookupConfig {
    pub proxy_url: Option<String>, // Place lookup is disabled when unset
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub db_path: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            default_lat: DEFAULT_COORDINATE.lat,
            default_lng: DEFAULT_COORDINATE.lng,
            bounds: Bounds::KOREA,
            short_link_domains: vec!["naver.me".to_string()],
            map_hosts: vec!["map.naver.com".to_string(), "place.naver.com".to_string()],
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "easycorkage.db".to_string(),
        }
    }
}

impl GeoConfig {
    pub fn extractor(&self) -> Extractor {
        Extractor::new(
            self.bounds,
            Coordinate::new(self.default_lat, self.default_lng),
            self.short_link_domains.clone(),
            self.map_hosts.clone(),
        )
    }
}

impl Config {
    /// Loads the config file at `path`.
    /// If it doesn't exist, writes a default one there.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let config_path = path.as_ref();

        if let Ok(content) = fs::read_to_string(config_path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    warn!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    return Config::default();
                }
            }
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(config_path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", config_path.display());
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }
}
