//! Map location resolution for restaurant records.
//!
//! A restaurant may carry a stored coordinate, a website pointing at a map
//! service, both, or neither. [`locate_restaurant`] picks the best of these,
//! and [`refresh_location`] also writes a newly resolved coordinate back to
//! the record store so the URL does not have to be parsed again next time.

use crate::db::Database;
use crate::geo::{DefaultReason, Resolution, Source};
use crate::models::Restaurant;
use crate::place::PlaceLookup;
use crate::resolver::Resolver;
use color_eyre::Result;
use tracing::{info, warn};

/// Coordinates closer than this on both axes are treated as the same place.
pub const MOVE_THRESHOLD_DEGREES: f64 = 0.001;

/// Outcome of [`refresh_location`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub resolution: Resolution,
    /// Whether the record store was updated.
    pub updated: bool,
}

/// Resolves the map coordinate for a restaurant.
///
/// A stored coordinate inside the resolver's bounds is used as-is. Otherwise,
/// when the website looks like a map URL, it goes through
/// [`Resolver::locate`]. Anything else yields the default coordinate.
///
/// # Returns
///
/// A [`Resolution`]. Never fails: a restaurant with no usable location data
/// comes back as [`Resolution::Defaulted`] with [`DefaultReason::NoMatch`].
pub async fn locate_restaurant<L: PlaceLookup>(
    resolver: &Resolver<L>,
    restaurant: &Restaurant,
) -> Resolution {
    let extractor = resolver.extractor();

    if let Some(stored) = restaurant.stored_coordinate() {
        if extractor.bounds().contains(&stored) {
            return Resolution::resolved(stored, Source::Stored);
        }
        warn!(
            "Stored coordinate {} for '{}' is out of bounds",
            stored, restaurant.name
        );
    }

    match restaurant.website.as_deref() {
        Some(url) if extractor.is_map_url(url) => resolver.locate(url).await,
        _ => {
            warn!("No usable location data for '{}'", restaurant.name);
            extractor.default_for(DefaultReason::NoMatch)
        }
    }
}

/// Like [`locate_restaurant`], but persists a coordinate recovered from the
/// website when it is new or has moved by more than [`MOVE_THRESHOLD_DEGREES`].
pub async fn refresh_location<L: PlaceLookup>(
    db: &Database,
    resolver: &Resolver<L>,
    restaurant: &Restaurant,
) -> Result<Located> {
    let resolution = locate_restaurant(resolver, restaurant).await;

    let coordinate = match resolution {
        Resolution::Resolved { source, coordinate } if source != Source::Stored => coordinate,
        _ => {
            return Ok(Located {
                resolution,
                updated: false,
            })
        }
    };

    let moved = restaurant
        .stored_coordinate()
        .map_or(true, |stored| !stored.is_near(&coordinate, MOVE_THRESHOLD_DEGREES));
    if !moved {
        return Ok(Located {
            resolution,
            updated: false,
        });
    }

    let updated = db.update_location(&restaurant.id, coordinate)?;
    if updated {
        info!("Updated '{}' location to {}", restaurant.name, coordinate);
    }
    Ok(Located {
        resolution,
        updated,
    })
}
