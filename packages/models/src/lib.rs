#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Domain records shared across the hotspot-map packages.
//!
//! These types represent canonical data as the stores persist it: a
//! [`Location`] deduplicated by exact coordinates, a named [`Category`],
//! and the per-(location, category) [`Hotspot`] aggregate that counts how
//! many reports reference that pair. They are distinct from the provider
//! payload types in `hotspot_map_geocoder`, which model whatever the
//! geocoding service returned before resolution.

use serde::{Deserialize, Serialize};

/// A canonical geographic location, deduplicated by exact coordinates.
///
/// Two `Location` records describe the same real place iff their latitude
/// and longitude are exactly the values the geocoder returned; no distance
/// tolerance is applied (see [`Location::same_coordinates`]).
///
/// The descriptive fields (`street_address`, `neighbourhood`, `city`,
/// `region`, `postal_code`) are set once, when the record is first persisted
/// after a confident resolution, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Primary key, assigned by the store on first persistence.
    ///
    /// `None` while the record is transient, either freshly resolved or
    /// returned from a low-confidence lookup that was never saved.
    pub id: Option<i64>,
    /// Latitude (WGS84), exactly as returned by the geocoder.
    pub latitude: f64,
    /// Longitude (WGS84), exactly as returned by the geocoder.
    pub longitude: f64,
    /// Street address as supplied by the reporting caller.
    pub street_address: Option<String>,
    /// Neighbourhood / area name as supplied by the reporting caller.
    pub neighbourhood: Option<String>,
    /// City name as supplied by the reporting caller.
    pub city: Option<String>,
    /// Region (province), taken from the geocoder candidate at save time.
    pub region: Option<String>,
    /// Postal code as supplied by the reporting caller.
    pub postal_code: Option<u32>,
    /// Geocoder confidence score (0 to 1) for the resolution that produced
    /// this record. Transient metadata, not part of the record's identity.
    pub confidence: Option<f64>,
}

impl Location {
    /// Creates a transient location at the given coordinates, with all
    /// descriptive fields unset.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            id: None,
            latitude,
            longitude,
            street_address: None,
            neighbourhood: None,
            city: None,
            region: None,
            postal_code: None,
            confidence: None,
        }
    }

    /// Returns `true` if this record sits at exactly the given coordinates.
    ///
    /// Comparison is by bit pattern: "the same place" means the geocoder
    /// returned the identical floating-point values, so near-identical
    /// coordinates differing in the last decimal do **not** match.
    #[must_use]
    pub fn same_coordinates(&self, latitude: f64, longitude: f64) -> bool {
        self.latitude.to_bits() == latitude.to_bits()
            && self.longitude.to_bits() == longitude.to_bits()
    }
}

/// An incident category (e.g. a crime type), created or fetched by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Primary key, assigned by the store.
    pub id: i64,
    /// Category name as supplied by the reporting caller.
    pub name: String,
}

impl Category {
    /// Creates a category record with the given id and name.
    #[must_use]
    pub const fn new(id: i64, name: String) -> Self {
        Self { id, name }
    }
}

/// Composite key identifying one [`Hotspot`] aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HotspotKey {
    /// Id of the canonical location the reports refer to.
    pub location_id: i64,
    /// Id of the reported category.
    pub category_id: i64,
}

impl HotspotKey {
    /// Creates a composite key from its parts.
    #[must_use]
    pub const fn new(location_id: i64, category_id: i64) -> Self {
        Self {
            location_id,
            category_id,
        }
    }
}

impl std::fmt::Display for HotspotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(location {}, category {})",
            self.location_id, self.category_id
        )
    }
}

/// The aggregate of all reports for one category at one canonical location.
///
/// At most one `Hotspot` exists per [`HotspotKey`]. A persisted aggregate
/// always holds `num_reports >= 1`; when a retraction would drop the count
/// below one, the row is deleted instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// The canonical location the reports refer to.
    pub location: Location,
    /// The reported category.
    pub category: Category,
    /// Number of reports aggregated under this key.
    ///
    /// Zero only on an in-memory draft that has not been reported yet;
    /// every persisted row holds at least 1.
    pub num_reports: u32,
}

impl Hotspot {
    /// Creates an unreported draft aggregate for the given location and
    /// category.
    #[must_use]
    pub const fn new(location: Location, category: Category) -> Self {
        Self {
            location,
            category,
            num_reports: 0,
        }
    }

    /// Returns the composite key for this aggregate, or `None` while the
    /// owning location has not been persisted (transient low-confidence
    /// resolutions have no stable identity to aggregate under).
    #[must_use]
    pub fn key(&self) -> Option<HotspotKey> {
        self.location
            .id
            .map(|location_id| HotspotKey::new(location_id, self.category.id))
    }
}
