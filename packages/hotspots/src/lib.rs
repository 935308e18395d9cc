#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Resolution and aggregation core for hotspot reporting.
//!
//! [`resolver::LocationResolver`] turns a free-text address into a
//! canonical, deduplicated [`Location`](hotspot_map_models::Location)
//! through the geocoding collaborator; [`aggregator::HotspotAggregator`]
//! maintains the per-(location, category) report counts on top of it.
//! Both take their collaborators as `Arc<dyn ..>` handles at construction,
//! so tests and callers decide the wiring.

pub mod aggregator;
pub mod resolver;

use std::time::Duration;

use hotspot_map_geocoder::GeocodeError;
use hotspot_map_store::StoreError;
use thiserror::Error;

/// Errors surfaced to callers of the reporting core.
///
/// The `Display` strings are the caller-facing messages; an API layer maps
/// them onto its bad-request responses unchanged.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// Address resolution failed. Every failure mode (provider
    /// unreachable, timed out, unparseable answer, no candidates) carries
    /// this one message; the concrete [`ResolutionCause`] rides along as
    /// [`source`](std::error::Error::source) for logs and is never shown
    /// to callers.
    #[error("Could not add specified location")]
    Resolution(#[source] ResolutionCause),

    /// A retraction addressed a key no aggregate counts.
    #[error("Could not find hotspot to delete")]
    RetractMissing,

    /// No persisted location matches the queried street name.
    #[error("No Hotspots with street name {street} exists")]
    NoneOnStreet {
        /// The queried street name.
        street: String,
    },

    /// No persisted location falls in the queried region.
    #[error("No Hotspots in region {region} exists")]
    NoneInRegion {
        /// The queried region.
        region: String,
    },

    /// No persisted location falls in the queried neighbourhood.
    #[error("No hotspots in neighbourhood {neighbourhood} exists")]
    NoneInNeighbourhood {
        /// The queried neighbourhood.
        neighbourhood: String,
    },

    /// No aggregates exist at all.
    #[error("No hotspots reported")]
    NoneReported,

    /// A persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The concrete reason an address resolution failed.
///
/// Attached to [`HotspotError::Resolution`] as its source so operators can
/// tell a hung provider from an address that matched nothing, while the
/// caller-facing message stays the same for all of them.
#[derive(Debug, Error)]
pub enum ResolutionCause {
    /// The lookup did not answer within the configured bound; the
    /// in-flight request was abandoned.
    #[error("geocoding lookup timed out after {0:?}")]
    TimedOut(Duration),

    /// The geocoder call itself failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// The provider answered with zero candidates.
    #[error("geocoder returned no candidates")]
    NoCandidates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_message_is_stable_across_causes() {
        let causes = [
            ResolutionCause::TimedOut(Duration::from_secs(5)),
            ResolutionCause::NoCandidates,
            ResolutionCause::Geocode(GeocodeError::Parse {
                message: "malformed body".to_string(),
            }),
        ];

        for cause in causes {
            let err = HotspotError::Resolution(cause);
            assert_eq!(err.to_string(), "Could not add specified location");
        }
    }

    #[test]
    fn resolution_cause_is_available_as_source() {
        let err = HotspotError::Resolution(ResolutionCause::NoCandidates);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("geocoder returned no candidates"));
    }

    #[test]
    fn not_found_messages_are_verbatim() {
        assert_eq!(
            HotspotError::NoneOnStreet {
                street: "Main".to_string()
            }
            .to_string(),
            "No Hotspots with street name Main exists"
        );
        assert_eq!(
            HotspotError::NoneInRegion {
                region: "Western Cape".to_string()
            }
            .to_string(),
            "No Hotspots in region Western Cape exists"
        );
        assert_eq!(
            HotspotError::NoneInNeighbourhood {
                neighbourhood: "Downtown".to_string()
            }
            .to_string(),
            "No hotspots in neighbourhood Downtown exists"
        );
        assert_eq!(
            HotspotError::NoneReported.to_string(),
            "No hotspots reported"
        );
        assert_eq!(
            HotspotError::RetractMissing.to_string(),
            "Could not find hotspot to delete"
        );
    }
}
