//! Outbound HTTP boundary for the FHIR bridge.
//!
//! This crate provides a thin client for the upstream FHIR server plus a
//! generic forwarder for arbitrary JSON APIs.
//!
//! This crate focuses on:
//! - FHIR REST calls (`Patient` read/search, `Observation` search)
//! - the generic `call` forwarder with a fixed method whitelist
//! - explicit, constructor-passed configuration
//!
//! **No API concerns**: routing, status-code mapping, and request-shape
//! validation belong in `api-rest`. Nothing here retries or keeps state
//! between calls; the first failure is terminal for a request.

pub mod client;
pub mod config;

// Re-export facades
pub use client::{FhirClient, PatientSearch};
pub use config::{base_url_from_env_value, FhirConfig, DEFAULT_FHIR_BASE_URL};

/// Errors returned by the outbound HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("upstream returned {status}: {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

/// Type alias for Results that can fail with a [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;
