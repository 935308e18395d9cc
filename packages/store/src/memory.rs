//! In-memory reference implementation of the persistence traits.
//!
//! Backs the test suites and the interactive CLI. All three tables live
//! behind a single [`RwLock`] so cross-table reads observe a consistent
//! snapshot; the uniqueness guarantees ([`LocationStore::save`],
//! [`HotspotStore::save`]) and the report-counter mutations hold the write
//! lock for the whole check-and-write, which makes them atomic with respect
//! to every other operation on the store.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use hotspot_map_models::{Category, Hotspot, HotspotKey, Location};

use crate::{CategoryStore, HotspotStore, LocationStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    locations: BTreeMap<i64, Location>,
    categories: BTreeMap<i64, Category>,
    hotspots: BTreeMap<HotspotKey, Hotspot>,
    last_location_id: i64,
    last_category_id: i64,
}

impl Inner {
    fn next_location_id(&mut self) -> i64 {
        self.last_location_id += 1;
        self.last_location_id
    }

    fn next_category_id(&mut self) -> i64 {
        self.last_category_id += 1;
        self.last_category_id
    }
}

/// In-memory store implementing [`LocationStore`], [`CategoryStore`], and
/// [`HotspotStore`] over one lock.
///
/// Ids are assigned sequentially starting at 1. A poisoned lock is
/// recovered with [`PoisonError::into_inner`]; the store holds plain data,
/// so the state a panicking writer left behind is still well formed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn find_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Location>, StoreError> {
        Ok(self
            .read()
            .locations
            .values()
            .find(|location| location.same_coordinates(latitude, longitude))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Location>, StoreError> {
        Ok(self.read().locations.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.read().locations.values().cloned().collect())
    }

    async fn find_by_neighbourhood(
        &self,
        neighbourhood: &str,
    ) -> Result<Vec<Location>, StoreError> {
        Ok(self
            .read()
            .locations
            .values()
            .filter(|location| location.neighbourhood.as_deref() == Some(neighbourhood))
            .cloned()
            .collect())
    }

    async fn find_by_region(&self, region: &str) -> Result<Vec<Location>, StoreError> {
        Ok(self
            .read()
            .locations
            .values()
            .filter(|location| location.region.as_deref() == Some(region))
            .cloned()
            .collect())
    }

    async fn save(&self, mut location: Location) -> Result<Location, StoreError> {
        let mut inner = self.write();

        // Uniqueness check and insert under one write guard.
        if let Some(existing) = inner
            .locations
            .values()
            .find(|row| row.same_coordinates(location.latitude, location.longitude))
        {
            log::debug!(
                "location save matched existing coordinates, keeping row {:?}",
                existing.id
            );
            return Ok(existing.clone());
        }

        let id = inner.next_location_id();
        location.id = Some(id);
        inner.locations.insert(id, location.clone());
        Ok(location)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn find_or_create(&self, name: &str) -> Result<Category, StoreError> {
        let mut inner = self.write();

        if let Some(existing) = inner.categories.values().find(|category| category.name == name) {
            return Ok(existing.clone());
        }

        let id = inner.next_category_id();
        let category = Category::new(id, name.to_string());
        inner.categories.insert(id, category.clone());
        Ok(category)
    }
}

#[async_trait]
impl HotspotStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Hotspot>, StoreError> {
        Ok(self.read().hotspots.values().cloned().collect())
    }

    async fn find_by_key(&self, key: HotspotKey) -> Result<Option<Hotspot>, StoreError> {
        Ok(self.read().hotspots.get(&key).cloned())
    }

    async fn save(&self, hotspot: Hotspot) -> Result<Hotspot, StoreError> {
        let Some(key) = hotspot.key() else {
            return Err(StoreError::InvalidRecord {
                message: "hotspot location has not been persisted".to_string(),
            });
        };

        // Persisted rows always count at least one report.
        if hotspot.num_reports == 0 {
            return Err(StoreError::InvalidRecord {
                message: format!("hotspot {key} has no reports"),
            });
        }

        let mut inner = self.write();

        if inner.hotspots.contains_key(&key) {
            return Err(StoreError::Conflict {
                message: format!("hotspot {key} already exists"),
            });
        }

        inner.hotspots.insert(key, hotspot.clone());
        Ok(hotspot)
    }

    async fn delete(&self, hotspot: &Hotspot) -> Result<(), StoreError> {
        let Some(key) = hotspot.key() else {
            return Err(StoreError::InvalidRecord {
                message: "hotspot location has not been persisted".to_string(),
            });
        };

        if self.write().hotspots.remove(&key).is_none() {
            return Err(StoreError::NotFound {
                message: format!("hotspot {key} does not exist"),
            });
        }

        Ok(())
    }

    async fn increment_report(&self, key: HotspotKey) -> Result<Hotspot, StoreError> {
        let mut inner = self.write();

        let hotspot = inner
            .hotspots
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                message: format!("hotspot {key} does not exist"),
            })?;

        hotspot.num_reports += 1;
        Ok(hotspot.clone())
    }

    async fn decrement_report(&self, key: HotspotKey) -> Result<Hotspot, StoreError> {
        let mut inner = self.write();

        let hotspot = inner
            .hotspots
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                message: format!("hotspot {key} does not exist"),
            })?;

        if hotspot.num_reports <= 1 {
            return Err(StoreError::InvalidRecord {
                message: format!("decrement would drop hotspot {key} below one report"),
            });
        }

        hotspot.num_reports -= 1;
        Ok(hotspot.clone())
    }
}
