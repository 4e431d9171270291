use crate::config::LookupConfig;
use crate::geo::{Bounds, Coordinate};
use crate::models::PlaceCoordinates;
use crate::place::{LookupError, PlaceLookup, Unconfigured};
use color_eyre::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Place lookup through a proxy that holds the map provider's API keys.
///
/// Sends `GET <endpoint>?placeId=<id>` and expects `{"lat": .., "lng": ..}` back.
pub struct ProxyLookup {
    client: Client,
    endpoint: String,
    timeout: Duration,
    bounds: Bounds,
}

impl ProxyLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, bounds: Bounds) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
            timeout,
            bounds,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PlaceLookup for ProxyLookup {
    async fn lookup(&self, place_id: &str) -> Result<Coordinate, LookupError> {
        debug!("Looking up place {} via {}", place_id, self.endpoint);
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[("placeId", place_id)])
            .send()
            .await?
            .error_for_status()?
            .json::<PlaceCoordinates>()
            .await?;

        let coordinate = res.coordinate().ok_or(LookupError::MissingCoordinate)?;
        if !self.bounds.contains(&coordinate) {
            return Err(LookupError::InvalidCoordinate {
                lat: coordinate.lat,
                lng: coordinate.lng,
            });
        }
        info!("Place {} resolved to {}", place_id, coordinate);
        Ok(coordinate)
    }
}

/// Shortest request timeout the proxy client will be built with.
pub const MIN_TIMEOUT_SECONDS: u64 = 1;

/// Lookup picked at startup from the `[lookup]` config section.
pub enum ConfiguredLookup {
    Unconfigured(Unconfigured),
    Proxy(ProxyLookup),
}

impl ConfiguredLookup {
    pub fn from_config(config: &LookupConfig, bounds: Bounds) -> Result<Self> {
        match config.proxy_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                if config.timeout_seconds < MIN_TIMEOUT_SECONDS {
                    warn!(
                        "Lookup timeout of {}s is too short, using {}s",
                        config.timeout_seconds, MIN_TIMEOUT_SECONDS
                    );
                }
                let timeout =
                    Duration::from_secs(config.timeout_seconds.max(MIN_TIMEOUT_SECONDS));
                info!("Place lookup routed through {}", url);
                Ok(Self::Proxy(ProxyLookup::new(url, timeout, bounds)?))
            }
            _ => {
                warn!("No place lookup proxy configured, place IDs will fall back to the default coordinate");
                Ok(Self::Unconfigured(Unconfigured))
            }
        }
    }
}

impl PlaceLookup for ConfiguredLookup {
    async fn lookup(&self, place_id: &str) -> Result<Coordinate, LookupError> {
        match self {
            ConfiguredLookup::Unconfigured(lookup) => lookup.lookup(place_id).await,
            ConfiguredLookup::Proxy(lookup) => lookup.lookup(place_id).await,
        }
    }
}
