//! FHIR bridge server binary.
//!
//! ## Purpose
//! Runs the REST gateway: resolves configuration from the environment,
//! wires the outbound FHIR client, and serves the `api-rest` router.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use fhir_client::{FhirClient, FhirConfig, base_url_from_env_value};

/// Main entry point for the FHIR bridge
///
/// Starts the REST gateway on the configured address (default:
/// 0.0.0.0:3000) with OpenAPI/Swagger documentation at `/swagger-ui`.
///
/// # Environment Variables
/// - `BRIDGE_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `FHIR_BASE_URL`: upstream FHIR server (default: the public HAPI R4
///   server)
/// - `FHIR_API_KEY`: optional bearer token sent to the upstream server
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the upstream configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("BRIDGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let base_url = base_url_from_env_value(std::env::var("FHIR_BASE_URL").ok());
    let api_key = std::env::var("FHIR_API_KEY").ok();
    let config = FhirConfig::new(base_url, api_key)?;

    tracing::info!("-- Starting FHIR bridge REST API on {}", addr);
    tracing::info!("-- Upstream FHIR server: {}", config.base_url());

    let state = AppState {
        fhir: Arc::new(FhirClient::new(config)),
    };

    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
