//! Per-(location, category) report aggregation.

use std::collections::BTreeSet;
use std::sync::Arc;

use hotspot_map_models::{Hotspot, HotspotKey, Location};
use hotspot_map_store::{CategoryStore, HotspotStore, StoreError};

use crate::HotspotError;
use crate::resolver::LocationResolver;

/// Maintains the report count per (location, category) aggregate.
///
/// Reads canonical locations through the [`LocationResolver`] it owns, so
/// the aggregate queries and the reporting flow observe the same
/// resolution semantics.
#[derive(Clone)]
pub struct HotspotAggregator {
    resolver: LocationResolver,
    categories: Arc<dyn CategoryStore>,
    hotspots: Arc<dyn HotspotStore>,
}

impl HotspotAggregator {
    /// Creates an aggregator over the given resolver and stores.
    #[must_use]
    pub fn new(
        resolver: LocationResolver,
        categories: Arc<dyn CategoryStore>,
        hotspots: Arc<dyn HotspotStore>,
    ) -> Self {
        Self {
            resolver,
            categories,
            hotspots,
        }
    }

    /// Builds an unreported draft aggregate for the given address and
    /// category.
    ///
    /// Resolves the address to its canonical location and find-or-creates
    /// the category by name. The draft itself is not persisted; passing
    /// it to [`report`](Self::report) is what records it.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Resolution`] if the address cannot be
    /// resolved; store faults pass through.
    pub async fn create(
        &self,
        street_address: &str,
        area_name: &str,
        city_name: &str,
        postal_code: u32,
        category_name: &str,
    ) -> Result<Hotspot, HotspotError> {
        let location = self
            .resolver
            .resolve(street_address, area_name, city_name, postal_code)
            .await?;
        let category = self.categories.find_or_create(category_name).await?;
        Ok(Hotspot::new(location, category))
    }

    /// Records one report for the drafted aggregate.
    ///
    /// An aggregate already counting this (location, category) absorbs the
    /// report as an increment; otherwise a new row is inserted with one
    /// report. Losing the insert race to a concurrent reporter is absorbed
    /// the same way, so duplicate reports are never surfaced as errors.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Store`] with
    /// [`StoreError::InvalidRecord`] if the draft's location was never
    /// persisted (a low-confidence resolution has no stable identity to
    /// aggregate under), or if a collaborator fails.
    pub async fn report(&self, mut hotspot: Hotspot) -> Result<(), HotspotError> {
        let Some(key) = hotspot.key() else {
            return Err(HotspotError::Store(StoreError::InvalidRecord {
                message: "hotspot location has not been persisted".to_string(),
            }));
        };

        if self.hotspots.find_by_key(key).await?.is_some() {
            log::debug!("absorbing duplicate report for hotspot {key}");
            self.hotspots.increment_report(key).await?;
            return Ok(());
        }

        hotspot.num_reports = 1;
        match self.hotspots.save(hotspot).await {
            Ok(_) => Ok(()),
            Err(StoreError::Conflict { .. }) => {
                // A concurrent reporter inserted the row between the
                // duplicate check and the save.
                log::debug!("insert race lost for hotspot {key}, absorbing as increment");
                self.hotspots.increment_report(key).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Retracts one report for the given key, deleting the aggregate when
    /// its last report is retracted.
    ///
    /// Returns the aggregate as it stood before the retraction.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::RetractMissing`] if no aggregate counts
    /// this key; store faults pass through.
    pub async fn retract(
        &self,
        location_id: i64,
        category_id: i64,
    ) -> Result<Hotspot, HotspotError> {
        let key = HotspotKey::new(location_id, category_id);

        let Some(existing) = self.hotspots.find_by_key(key).await? else {
            return Err(HotspotError::RetractMissing);
        };

        if existing.num_reports > 1 {
            self.hotspots.decrement_report(key).await?;
        } else {
            self.hotspots.delete(&existing).await?;
            log::info!("hotspot {key} deleted after its last report was retracted");
        }

        Ok(existing)
    }

    /// Returns the aggregates at locations whose street address contains
    /// `street_name`.
    ///
    /// A matching street with no aggregates yet yields an empty list, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::NoneOnStreet`] if no persisted location
    /// matches the street name; store faults pass through.
    pub async fn by_street_name(&self, street_name: &str) -> Result<Vec<Hotspot>, HotspotError> {
        let matching: Vec<Location> = self
            .resolver
            .locations()
            .await?
            .into_iter()
            .filter(|location| {
                location
                    .street_address
                    .as_deref()
                    .is_some_and(|address| address.contains(street_name))
            })
            .collect();

        if matching.is_empty() {
            return Err(HotspotError::NoneOnStreet {
                street: street_name.to_string(),
            });
        }

        self.attached_to(&matching).await
    }

    /// Returns the aggregates at locations in the given region.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::NoneInRegion`] if no persisted location
    /// falls in the region; store faults pass through.
    pub async fn by_region(&self, region: &str) -> Result<Vec<Hotspot>, HotspotError> {
        let matching = self.resolver.locations_by_region(region).await?;

        if matching.is_empty() {
            return Err(HotspotError::NoneInRegion {
                region: region.to_string(),
            });
        }

        self.attached_to(&matching).await
    }

    /// Returns the aggregates at locations in the given neighbourhood.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::NoneInNeighbourhood`] if no persisted
    /// location falls in the neighbourhood; store faults pass through.
    pub async fn by_neighbourhood(
        &self,
        neighbourhood: &str,
    ) -> Result<Vec<Hotspot>, HotspotError> {
        let matching = self
            .resolver
            .locations_by_neighbourhood(neighbourhood)
            .await?;

        if matching.is_empty() {
            return Err(HotspotError::NoneInNeighbourhood {
                neighbourhood: neighbourhood.to_string(),
            });
        }

        self.attached_to(&matching).await
    }

    /// Returns every aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::NoneReported`] if no aggregates exist;
    /// store faults pass through.
    pub async fn all(&self) -> Result<Vec<Hotspot>, HotspotError> {
        let hotspots = self.hotspots.find_all().await?;

        if hotspots.is_empty() {
            return Err(HotspotError::NoneReported);
        }

        Ok(hotspots)
    }

    /// Collects the aggregates whose location is one of `locations`.
    async fn attached_to(&self, locations: &[Location]) -> Result<Vec<Hotspot>, HotspotError> {
        let ids: BTreeSet<i64> = locations
            .iter()
            .filter_map(|location| location.id)
            .collect();

        Ok(self
            .hotspots
            .find_all()
            .await?
            .into_iter()
            .filter(|hotspot| hotspot.location.id.is_some_and(|id| ids.contains(&id)))
            .collect())
    }
}
