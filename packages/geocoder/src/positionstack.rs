//! PositionStack forward geocoder client.
//!
//! PositionStack exposes a `/forward` endpoint that takes a free-form
//! `query` plus an `access_key` and answers with candidate locations under
//! a `data` array, each scored with a `confidence` between 0 and 1.
//!
//! The free tier is HTTP-only, which is why the embedded service config
//! carries an `http://` base URL. The access key is read from the
//! [`API_KEY_ENV`] environment variable.
//!
//! See <https://positionstack.com/documentation>

use async_trait::async_trait;

use crate::service_config::ServiceConfig;
use crate::{Candidate, GeocodeError, Geocoder};

/// Environment variable holding the PositionStack access key.
pub const API_KEY_ENV: &str = "POSITIONSTACK_API_KEY";

/// PositionStack API client.
#[derive(Debug, Clone)]
pub struct PositionStack {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
    country: String,
}

impl PositionStack {
    /// Creates a client for the given service configuration and access key.
    #[must_use]
    pub fn new(config: &ServiceConfig, access_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            access_key,
            country: config.country.clone(),
        }
    }

    /// Creates a client from the embedded service configuration, reading
    /// the access key from [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the environment variable is not
    /// set or is empty.
    pub fn from_env() -> Result<Self, GeocodeError> {
        let access_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GeocodeError::Config {
                message: format!("{API_KEY_ENV} is not set"),
            })?;

        Ok(Self::new(&ServiceConfig::load(), access_key))
    }
}

#[async_trait]
impl Geocoder for PositionStack {
    async fn forward(&self, query: &str) -> Result<Vec<Candidate>, GeocodeError> {
        let url = format!("{}/forward", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("query", query),
                ("country", self.country.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let candidates = parse_response(&body)?;

        log::trace!(
            "PositionStack returned {} candidate(s) for {query:?}",
            candidates.len()
        );

        Ok(candidates)
    }
}

/// Parses a PositionStack forward-geocoding response body.
fn parse_response(body: &serde_json::Value) -> Result<Vec<Candidate>, GeocodeError> {
    // The free tier reports some failures as an `error` object in an
    // otherwise-OK response.
    if let Some(error) = body.get("error") {
        return Err(GeocodeError::Parse {
            message: format!("PositionStack error response: {error}"),
        });
    }

    let data = body.get("data").ok_or_else(|| GeocodeError::Parse {
        message: "PositionStack response missing 'data' array".to_string(),
    })?;

    serde_json::from_value(data.clone()).map_err(|e| GeocodeError::Parse {
        message: format!("Malformed PositionStack candidate: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candidate_list() {
        let body = serde_json::json!({
            "data": [
                {
                    "latitude": -33.92,
                    "longitude": 18.42,
                    "confidence": 0.9,
                    "label": "1 Main Street, Cape Town, South Africa",
                    "region": "Western Cape",
                    "neighbourhood": "Downtown",
                    "locality": "Cape Town"
                },
                {
                    "latitude": -33.95,
                    "longitude": 18.47,
                    "confidence": 0.4,
                    "label": "Main Street, Cape Town, South Africa"
                }
            ]
        });

        let candidates = parse_response(&body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!((candidates[0].latitude - -33.92).abs() < 1e-9);
        assert!((candidates[0].longitude - 18.42).abs() < 1e-9);
        assert!((candidates[0].confidence - 0.9).abs() < 1e-9);
        assert_eq!(candidates[0].region.as_deref(), Some("Western Cape"));
        assert_eq!(candidates[1].region, None);
    }

    #[test]
    fn parses_empty_data_as_no_candidates() {
        let body = serde_json::json!({ "data": [] });
        assert!(parse_response(&body).unwrap().is_empty());
    }

    #[test]
    fn missing_data_is_a_parse_error() {
        let body = serde_json::json!({ "results": [] });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }

    #[test]
    fn error_payload_is_a_parse_error() {
        let body = serde_json::json!({
            "error": { "code": "invalid_access_key" }
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }

    #[test]
    fn confidence_defaults_to_zero_when_omitted() {
        let body = serde_json::json!({
            "data": [{ "latitude": -33.92, "longitude": 18.42 }]
        });
        let candidates = parse_response(&body).unwrap();
        assert!((candidates[0].confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn from_env_requires_an_access_key() {
        // Safety: test-only; no other test in this crate reads this var.
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }
        let err = PositionStack::from_env().unwrap_err();
        assert!(matches!(err, GeocodeError::Config { .. }));
    }
}
