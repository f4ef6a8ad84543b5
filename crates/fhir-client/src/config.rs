//! Client runtime configuration.
//!
//! This module defines configuration that should be resolved once at
//! process startup and then passed into the client. The intent is to avoid
//! reading process-wide environment variables during request handling,
//! which can lead to inconsistent behaviour in multi-threaded runtimes and
//! test harnesses.

use crate::{ClientError, ClientResult};

/// Public HAPI FHIR server used when no base URL is configured.
pub const DEFAULT_FHIR_BASE_URL: &str = "https://hapi.fhir.org/baseR4";

/// Upstream FHIR connection settings resolved at startup.
#[derive(Clone, Debug)]
pub struct FhirConfig {
    base_url: String,
    api_key: Option<String>,
}

impl FhirConfig {
    /// Create a new `FhirConfig`.
    ///
    /// The base URL is trimmed of surrounding whitespace and any trailing
    /// slash so request paths can be appended directly. A blank API key is
    /// treated as no key at all.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration(
                "base_url cannot be empty".into(),
            ));
        }

        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self { base_url, api_key })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// Resolve the FHIR base URL from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the public default
/// server.
pub fn base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FHIR_BASE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_and_whitespace() {
        let config =
            FhirConfig::new("  https://fhir.example.org/r4/  ", None).expect("valid config");

        assert_eq!(config.base_url(), "https://fhir.example.org/r4");
    }

    #[test]
    fn rejects_empty_base_url() {
        let err = FhirConfig::new("   ", None).expect_err("should reject empty base url");

        match err {
            ClientError::Configuration(msg) => assert!(msg.contains("base_url")),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let config =
            FhirConfig::new(DEFAULT_FHIR_BASE_URL, Some("  ".to_string())).expect("valid config");

        assert!(config.api_key().is_none());
    }

    #[test]
    fn env_value_falls_back_to_public_default() {
        assert_eq!(base_url_from_env_value(None), DEFAULT_FHIR_BASE_URL);
        assert_eq!(
            base_url_from_env_value(Some("  ".to_string())),
            DEFAULT_FHIR_BASE_URL
        );
        assert_eq!(
            base_url_from_env_value(Some("http://localhost:8080/fhir".to_string())),
            "http://localhost:8080/fhir"
        );
    }
}
