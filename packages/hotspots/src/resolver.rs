//! Free-text address resolution with confidence gating and coordinate
//! dedup.

use std::sync::Arc;
use std::time::Duration;

use hotspot_map_geocoder::{Candidate, Geocoder};
use hotspot_map_models::Location;
use hotspot_map_store::LocationStore;

use crate::{HotspotError, ResolutionCause};

/// Default bound on a single geocoding lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum provider confidence for a resolved location to be persisted.
pub const MIN_CONFIDENCE: f64 = 0.5;

/// Resolves free-text addresses to canonical [`Location`] records.
///
/// One resolution makes at most one geocoding lookup (bounded by the
/// configured timeout) and at most one store write. Repeating a resolution
/// that already produced a canonical record returns that record unchanged,
/// so resolution is idempotent per coordinate pair.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    store: Arc<dyn LocationStore>,
    lookup_timeout: Duration,
}

impl LocationResolver {
    /// Creates a resolver bounded by [`DEFAULT_LOOKUP_TIMEOUT`].
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, store: Arc<dyn LocationStore>) -> Self {
        Self::with_timeout(geocoder, store, DEFAULT_LOOKUP_TIMEOUT)
    }

    /// Creates a resolver with an explicit lookup bound.
    #[must_use]
    pub fn with_timeout(
        geocoder: Arc<dyn Geocoder>,
        store: Arc<dyn LocationStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            geocoder,
            store,
            lookup_timeout,
        }
    }

    /// Resolves the given address fields to a canonical location.
    ///
    /// Builds the provider query `"<street>, <area>, <city>, <postal>"`,
    /// looks it up with a bounded wait, then:
    ///
    /// 1. returns the already-persisted record if one sits at exactly the
    ///    winning candidate's coordinates (the caller's descriptive fields
    ///    are discarded);
    /// 2. persists and returns a new record, enriched with the caller's
    ///    descriptive fields and the candidate's region, when the
    ///    candidate scores at least [`MIN_CONFIDENCE`];
    /// 3. otherwise returns the record transient, with no id, so the
    ///    caller can see what the lookup produced without it becoming
    ///    canonical.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Resolution`] if the lookup times out,
    /// fails, or matches no candidates; the concrete [`ResolutionCause`]
    /// is attached as the error source. Store faults pass through as
    /// [`HotspotError::Store`].
    pub async fn resolve(
        &self,
        street_address: &str,
        area_name: &str,
        city_name: &str,
        postal_code: u32,
    ) -> Result<Location, HotspotError> {
        let query = format!("{street_address}, {area_name}, {city_name}, {postal_code}");

        let candidate = self.lookup(&query).await.map_err(|cause| {
            log::warn!("address resolution failed for {query:?}: {cause}");
            HotspotError::Resolution(cause)
        })?;

        if let Some(existing) = self
            .store
            .find_by_coordinates(candidate.latitude, candidate.longitude)
            .await?
        {
            log::debug!(
                "coordinates ({}, {}) already resolved to location {:?}",
                candidate.latitude,
                candidate.longitude,
                existing.id
            );
            return Ok(existing);
        }

        let mut location = Location::new(candidate.latitude, candidate.longitude);
        location.region = candidate.region.clone();
        location.confidence = Some(candidate.confidence);

        if candidate.confidence < MIN_CONFIDENCE {
            log::debug!(
                "candidate for {query:?} scored {} (below {MIN_CONFIDENCE}), not persisting",
                candidate.confidence
            );
            return Ok(location);
        }

        location.street_address = Some(street_address.to_string());
        location.neighbourhood = Some(area_name.to_string());
        location.city = Some(city_name.to_string());
        location.postal_code = Some(postal_code);

        Ok(self.store.save(location).await?)
    }

    /// Runs the bounded lookup and picks the winning candidate: highest
    /// confidence, earliest seen on ties.
    async fn lookup(&self, query: &str) -> Result<Candidate, ResolutionCause> {
        let candidates = tokio::time::timeout(self.lookup_timeout, self.geocoder.forward(query))
            .await
            .map_err(|_| ResolutionCause::TimedOut(self.lookup_timeout))??;

        candidates
            .into_iter()
            .reduce(|best, candidate| {
                if candidate.confidence > best.confidence {
                    candidate
                } else {
                    best
                }
            })
            .ok_or(ResolutionCause::NoCandidates)
    }

    /// Looks up a canonical location by its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Store`] if the store fails.
    pub async fn location_by_id(&self, id: i64) -> Result<Option<Location>, HotspotError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Returns every canonical location.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Store`] if the store fails.
    pub async fn locations(&self) -> Result<Vec<Location>, HotspotError> {
        Ok(self.store.find_all().await?)
    }

    /// Returns the canonical locations in the given region.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Store`] if the store fails.
    pub async fn locations_by_region(&self, region: &str) -> Result<Vec<Location>, HotspotError> {
        Ok(self.store.find_by_region(region).await?)
    }

    /// Returns the canonical locations in the given neighbourhood.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Store`] if the store fails.
    pub async fn locations_by_neighbourhood(
        &self,
        neighbourhood: &str,
    ) -> Result<Vec<Location>, HotspotError> {
        Ok(self.store.find_by_neighbourhood(neighbourhood).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hotspot_map_geocoder::GeocodeError;
    use hotspot_map_store::memory::MemoryStore;

    use super::*;

    struct ScriptedGeocoder {
        candidates: Vec<Candidate>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedGeocoder {
        fn new(candidates: Vec<Candidate>) -> Self {
            Self {
                candidates,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn forward(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError> {
            self.seen.lock().unwrap().push(query.to_string());
            Ok(self.candidates.clone())
        }
    }

    struct HangingGeocoder;

    #[async_trait]
    impl Geocoder for HangingGeocoder {
        async fn forward(&self, _query: &str) -> Result<Vec<Candidate>, GeocodeError> {
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn forward(&self, _query: &str) -> Result<Vec<Candidate>, GeocodeError> {
            Err(GeocodeError::Parse {
                message: "malformed body".to_string(),
            })
        }
    }

    fn candidate(latitude: f64, longitude: f64, confidence: f64) -> Candidate {
        Candidate {
            latitude,
            longitude,
            confidence,
            label: None,
            region: None,
            neighbourhood: None,
            locality: None,
        }
    }

    fn resolver(geocoder: Arc<dyn Geocoder>, store: Arc<MemoryStore>) -> LocationResolver {
        LocationResolver::new(geocoder, store)
    }

    #[tokio::test]
    async fn builds_the_exact_provider_query() {
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![candidate(-33.92, 18.42, 0.9)]));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder.clone(), store);

        resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap();

        let seen = geocoder.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["1 Main St, Downtown, Cape Town, 8001"]);
    }

    #[tokio::test]
    async fn persists_confident_resolution_with_caller_fields() {
        let mut winning = candidate(-33.92, 18.42, 0.9);
        winning.region = Some("Western Cape".to_string());
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![winning]));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder, store.clone());

        let location = resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap();

        assert_eq!(location.id, Some(1));
        assert_eq!(location.street_address.as_deref(), Some("1 Main St"));
        assert_eq!(location.neighbourhood.as_deref(), Some("Downtown"));
        assert_eq!(location.city.as_deref(), Some("Cape Town"));
        assert_eq!(location.postal_code, Some(8001));
        assert_eq!(location.region.as_deref(), Some("Western Cape"));
        assert_eq!(location.confidence, Some(0.9));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn returns_the_existing_record_on_a_coordinate_match() {
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![candidate(-33.92, 18.42, 0.9)]));
        let store = Arc::new(MemoryStore::new());

        let mut existing = Location::new(-33.92, 18.42);
        existing.street_address = Some("1 Main St".to_string());
        let existing = store.save(existing).await.unwrap();

        let resolver = resolver(geocoder, store.clone());
        let location = resolver
            .resolve("1 Main Street", "CBD", "Cape Town", 8001)
            .await
            .unwrap();

        // The canonical record wins; the caller's fields are discarded.
        assert_eq!(location.id, existing.id);
        assert_eq!(location.street_address.as_deref(), Some("1 Main St"));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn low_confidence_resolution_stays_transient() {
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![candidate(-33.92, 18.42, 0.4)]));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder, store.clone());

        let location = resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap();

        assert_eq!(location.id, None);
        assert_eq!(location.confidence, Some(0.4));
        assert!(location.street_address.is_none());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn highest_confidence_candidate_wins() {
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![
            candidate(-33.90, 18.40, 0.3),
            candidate(-33.92, 18.42, 0.9),
            candidate(-33.95, 18.47, 0.7),
        ]));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder, store);

        let location = resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap();

        assert!(location.same_coordinates(-33.92, 18.42));
    }

    #[tokio::test]
    async fn first_candidate_wins_confidence_ties() {
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![
            candidate(-33.92, 18.42, 0.8),
            candidate(-33.95, 18.47, 0.8),
        ]));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder, store);

        let location = resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap();

        assert!(location.same_coordinates(-33.92, 18.42));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_a_resolution_error() {
        let geocoder = Arc::new(ScriptedGeocoder::new(Vec::new()));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder, store);

        let err = resolver
            .resolve("1 Nowhere St", "Nowhere", "Nowhere", 9999)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Could not add specified location");
        assert!(matches!(
            err,
            HotspotError::Resolution(ResolutionCause::NoCandidates)
        ));
    }

    #[tokio::test]
    async fn provider_failure_is_a_resolution_error() {
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(Arc::new(FailingGeocoder), store);

        let err = resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Could not add specified location");
        assert!(matches!(
            err,
            HotspotError::Resolution(ResolutionCause::Geocode(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_lookup_trips_the_timeout() {
        let store = Arc::new(MemoryStore::new());
        let resolver = LocationResolver::with_timeout(
            Arc::new(HangingGeocoder),
            store,
            Duration::from_secs(5),
        );

        let err = resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Could not add specified location");
        assert!(matches!(
            err,
            HotspotError::Resolution(ResolutionCause::TimedOut(bound))
                if bound == Duration::from_secs(5)
        ));
    }

    #[tokio::test]
    async fn location_reads_pass_through_to_the_store() {
        let geocoder = Arc::new(ScriptedGeocoder::new(vec![candidate(-33.92, 18.42, 0.9)]));
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(geocoder, store);

        resolver
            .resolve("1 Main St", "Downtown", "Cape Town", 8001)
            .await
            .unwrap();

        assert_eq!(resolver.locations().await.unwrap().len(), 1);
        assert!(resolver.location_by_id(1).await.unwrap().is_some());
        assert!(resolver.location_by_id(99).await.unwrap().is_none());
        assert_eq!(
            resolver
                .locations_by_neighbourhood("Downtown")
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(
            resolver
                .locations_by_region("Gauteng")
                .await
                .unwrap()
                .is_empty()
        );
    }
}
