//! Compile-time embedded geocoding service configuration.
//!
//! The PositionStack service definition lives in
//! `services/positionstack.toml` and is embedded at build time, so the
//! client needs no config files at runtime. Secrets stay out of the file:
//! the access key comes from the environment (see
//! [`crate::positionstack::API_KEY_ENV`]).

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Unique identifier (e.g. `"positionstack"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// API base URL (e.g. `"http://api.positionstack.com/v1"`).
    pub base_url: String,
    /// ISO country code every forward query is restricted to.
    pub country: String,
}

const SERVICE_TOML: &str = include_str!("../services/positionstack.toml");

impl ServiceConfig {
    /// Returns the embedded PositionStack service configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a build-time guarantee,
    /// since the config ships inside the crate).
    #[must_use]
    pub fn load() -> Self {
        toml::de::from_str(SERVICE_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse geocoding service config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_service() {
        let config = ServiceConfig::load();
        assert_eq!(config.id, "positionstack");
        assert!(!config.name.is_empty());
        assert!(config.base_url.starts_with("http"));
        assert_eq!(config.country, "ZA");
    }
}
