#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Persistence collaborator interfaces for the hotspot map.
//!
//! The resolution and aggregation core talks to storage only through the
//! traits defined here, taken as `Arc<dyn ..>` handles at construction.
//! [`memory::MemoryStore`] is the reference implementation backing tests
//! and the interactive CLI; a relational implementation would live behind
//! the same traits.

pub mod memory;

use async_trait::async_trait;
use hotspot_map_models::{Category, Hotspot, HotspotKey, Location};
use thiserror::Error;

/// Errors surfaced by the persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness guarantee rejected the write; the row that won is
    /// already persisted.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting write.
        message: String,
    },

    /// The addressed record does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Description of the missing record.
        message: String,
    },

    /// The record cannot be persisted as given.
    #[error("Invalid record: {message}")]
    InvalidRecord {
        /// Why the record was rejected.
        message: String,
    },
}

/// Canonical location persistence.
///
/// A location's identity is its exact coordinate pair; [`save`] enforces
/// that at the storage boundary so two racing writers cannot both insert
/// the same place.
///
/// [`save`]: LocationStore::save
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Looks up the canonical record with exactly these coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Location>, StoreError>;

    /// Looks up a location by its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_by_id(&self, id: i64) -> Result<Option<Location>, StoreError>;

    /// Returns every persisted location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_all(&self) -> Result<Vec<Location>, StoreError>;

    /// Returns the locations whose neighbourhood equals `neighbourhood`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_by_neighbourhood(
        &self,
        neighbourhood: &str,
    ) -> Result<Vec<Location>, StoreError>;

    /// Returns the locations whose region equals `region`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_by_region(&self, region: &str) -> Result<Vec<Location>, StoreError>;

    /// Persists `location` and returns the stored row with its id set.
    ///
    /// Coordinate-unique upsert: if a record with the same coordinates
    /// already exists, including one inserted by a concurrent caller, the
    /// existing record is returned unchanged and `location` is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn save(&self, location: Location) -> Result<Location, StoreError>;
}

/// Report category persistence.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Returns the category named `name`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup or write fails.
    async fn find_or_create(&self, name: &str) -> Result<Category, StoreError>;
}

/// Hotspot aggregate persistence, keyed by (location, category).
#[async_trait]
pub trait HotspotStore: Send + Sync {
    /// Returns every persisted hotspot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_all(&self) -> Result<Vec<Hotspot>, StoreError>;

    /// Looks up the hotspot with the given composite key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn find_by_key(&self, key: HotspotKey) -> Result<Option<Hotspot>, StoreError>;

    /// Persists a new hotspot row.
    ///
    /// The composite key is unique: a second insert for the same key fails
    /// with [`StoreError::Conflict`] rather than producing a duplicate row,
    /// so a caller losing an insert race can fall back to
    /// [`increment_report`].
    ///
    /// [`increment_report`]: HotspotStore::increment_report
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if the hotspot's location has
    /// no id yet or the row counts zero reports, [`StoreError::Conflict`]
    /// if a row with the same key already exists.
    async fn save(&self, hotspot: Hotspot) -> Result<Hotspot, StoreError>;

    /// Deletes the hotspot row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such row exists.
    async fn delete(&self, hotspot: &Hotspot) -> Result<(), StoreError>;

    /// Atomically adds one report to the hotspot's count and returns the
    /// updated row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such row exists.
    async fn increment_report(&self, key: HotspotKey) -> Result<Hotspot, StoreError>;

    /// Atomically removes one report from the hotspot's count and returns
    /// the updated row.
    ///
    /// Persisted rows never drop below one report; retracting the last
    /// report is a delete, not a decrement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such row exists,
    /// [`StoreError::InvalidRecord`] if the decrement would drop the count
    /// below one.
    async fn decrement_report(&self, key: HotspotKey) -> Result<Hotspot, StoreError>;
}
