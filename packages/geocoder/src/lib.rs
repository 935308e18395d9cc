#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forward-geocoding client for hotspot address resolution.
//!
//! Converts a free-text address query into a ranked list of candidate
//! coordinates using the PositionStack forward-geocoding API. Provider
//! defaults (base URL, country filter) live in an embedded TOML file under
//! `services/`; the API access key is read from the
//! `POSITIONSTACK_API_KEY` environment variable and never ships with the
//! crate.
//!
//! The [`Geocoder`] trait is the seam the location resolver depends on:
//! production code wires [`positionstack::PositionStack`], tests substitute
//! scripted implementations.

pub mod positionstack;
pub mod service_config;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// One candidate location returned by the geocoding provider.
///
/// Carries the provider's raw descriptive fields alongside the coordinates
/// so the resolver can enrich canonical records (region) and log what was
/// matched (label) without re-querying.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Provider confidence score (0 to 1). Defaults to 0 when the provider
    /// omits it, so an unscored candidate is treated as unconfident rather
    /// than trusted.
    #[serde(default)]
    pub confidence: f64,
    /// The provider's formatted address label.
    #[serde(default)]
    pub label: Option<String>,
    /// Region (province) the candidate falls in.
    #[serde(default)]
    pub region: Option<String>,
    /// Neighbourhood the candidate falls in.
    #[serde(default)]
    pub neighbourhood: Option<String>,
    /// Locality (city or town) the candidate falls in.
    #[serde(default)]
    pub locality: Option<String>,
}

/// A forward-geocoding lookup: one free-text query in, ranked candidates
/// out.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `query` into candidate locations, ranked by the provider.
    ///
    /// An empty candidate list is a valid answer ("the provider matched
    /// nothing"), distinct from a failed lookup.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider is unreachable, answers
    /// with a non-success status, or returns a body that cannot be parsed.
    async fn forward(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError>;
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status code.
    #[error("Geocoder returned status {status}")]
    Status {
        /// The status code the provider answered with.
        status: reqwest::StatusCode,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Client-side configuration is missing or malformed.
    #[error("Config error: {message}")]
    Config {
        /// Description of what is missing.
        message: String,
    },
}
