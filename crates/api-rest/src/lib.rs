//! # API REST
//!
//! REST API implementation for the FHIR bridge.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, status mapping)
//!
//! Translation lives in `hl7` and upstream calls live in `fhir-client`;
//! this crate only routes, validates body shapes, and maps error kinds
//! onto status codes (404 for not-found, 400 for bad input, 500 for
//! everything else).

#![warn(rust_2018_idioms)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use fhir_client::{ClientError, FhirClient, PatientSearch};
use hl7::{HumanName, Message, Observation, ParsedRecord, Patient, PatientResource};

/// Application state shared across REST API handlers
///
/// Holds the outbound FHIR client behind an `Arc`; handlers are otherwise
/// stateless and keep nothing between requests.
#[derive(Clone)]
pub struct AppState {
    pub fhir: Arc<FhirClient>,
}

// ============================================================================
// Wire types
// ============================================================================

/// Greeting returned from the service root.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GreetingRes {
    pub message: String,
}

/// Error body returned alongside every non-2xx status.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Raw HL7v2 message submitted for parsing.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Hl7ParseReq {
    pub message: String,
}

/// FHIR-shaped payload submitted for HL7 serialisation.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FhirToHl7Req {
    /// Patient resource; unknown keys are ignored downstream.
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Serialised HL7v2 message.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Hl7MessageRes {
    pub hl7_message: String,
}

/// Arbitrary outbound request forwarded by the gateway.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiCallReq {
    pub url: String,

    /// HTTP method; GET, POST, PUT and DELETE are accepted.
    #[serde(default = "default_method")]
    pub method: String,

    /// JSON body, sent for POST and PUT only.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,

    /// Headers forwarded verbatim to the target.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        get_patient,
        search_patients,
        patient_observations,
        parse_hl7,
        fhir_to_hl7,
        call_api,
    ),
    components(schemas(
        GreetingRes,
        ErrorRes,
        Hl7ParseReq,
        Hl7MessageRes,
        FhirToHl7Req,
        ApiCallReq,
        PatientSearch,
        ParsedRecord,
        Observation,
        PatientResource,
        HumanName,
    ))
)]
pub struct ApiDoc;

/// Build the gateway router over the given state.
///
/// Mounts every bridge endpoint, the Swagger UI, and a permissive CORS
/// layer across the whole surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/patient/:id", get(get_patient))
        .route("/patients/search", post(search_patients))
        .route("/patient/:id/observations", get(patient_observations))
        .route("/hl7/parse", post(parse_hl7))
        .route("/fhir-to-hl7", post(fhir_to_hl7))
        .route("/call-api", post(call_api))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service greeting", body = GreetingRes)
    )
)]
/// Service greeting
///
/// Constant payload confirming the gateway is reachable.
#[axum::debug_handler]
async fn root() -> Json<GreetingRes> {
    Json(GreetingRes {
        message: "FHIR Bridge API".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patient/{id}",
    responses(
        (status = 200, description = "Patient resource from the upstream server", body = Object),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Fetch a single patient from the upstream FHIR server
///
/// # Errors
/// Returns `404 Not Found` wrapping the upstream error text if:
/// - the upstream call fails for any reason.
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorRes>)> {
    match state.fhir.get_patient(&id).await {
        Ok(patient) => Ok(Json(patient)),
        Err(e) => {
            tracing::error!("Get patient error: {:?}", e);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorRes {
                    error: format!("Patient not found: {e}"),
                }),
            ))
        }
    }
}

#[utoipa::path(
    post,
    path = "/patients/search",
    request_body = PatientSearch,
    responses(
        (status = 200, description = "Bundle entries matching the criteria", body = [Object]),
        (status = 500, description = "Upstream search failed", body = ErrorRes)
    )
)]
/// Search for patients matching the given criteria
///
/// Forwards the populated criteria as query parameters and returns the
/// Bundle's `entry` array (empty when the server sent none).
///
/// # Errors
/// Returns `500 Internal Server Error` wrapping the upstream error text if:
/// - the upstream call fails.
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    Json(search): Json<PatientSearch>,
) -> Result<Json<Vec<Value>>, (StatusCode, Json<ErrorRes>)> {
    match state.fhir.search_patients(&search).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            tracing::error!("Search patients error: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: format!("Error searching patients: {e}"),
                }),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/patient/{id}/observations",
    responses(
        (status = 200, description = "Observation Bundle entries for the patient", body = [Object]),
        (status = 500, description = "Upstream retrieval failed", body = ErrorRes)
    )
)]
/// Retrieve the clinical observations recorded for a patient
///
/// # Errors
/// Returns `500 Internal Server Error` wrapping the upstream error text if:
/// - the upstream call fails.
#[axum::debug_handler]
async fn patient_observations(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Vec<Value>>, (StatusCode, Json<ErrorRes>)> {
    match state.fhir.patient_observations(&id).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            tracing::error!("Get observations error: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: format!("Error retrieving observations: {e}"),
                }),
            ))
        }
    }
}

#[utoipa::path(
    post,
    path = "/hl7/parse",
    request_body = Hl7ParseReq,
    responses(
        (status = 200, description = "Structured record scanned from the message", body = ParsedRecord),
        (status = 400, description = "Malformed request body", body = ErrorRes)
    )
)]
/// Parse an HL7v2 message into a structured record
///
/// Parsing itself is best-effort and never fails; the only failure mode
/// is a request body that does not carry a string `message`.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body does not match the expected shape.
#[axum::debug_handler]
async fn parse_hl7(
    Json(body): Json<Value>,
) -> Result<Json<ParsedRecord>, (StatusCode, Json<ErrorRes>)> {
    let req: Hl7ParseReq = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Parse HL7 request error: {:?}", e);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorRes {
                    error: format!("Error parsing HL7 message: {e}"),
                }),
            ));
        }
    };

    Ok(Json(Message::parse(&req.message)))
}

#[utoipa::path(
    post,
    path = "/fhir-to-hl7",
    request_body = FhirToHl7Req,
    responses(
        (status = 200, description = "Serialised HL7v2 message", body = Hl7MessageRes),
        (status = 400, description = "Malformed request body", body = ErrorRes)
    )
)]
/// Serialise a FHIR-shaped patient payload into an HL7v2 message
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body does not carry a `data` object, or
/// - a field inside `data` has an unexpected type.
#[axum::debug_handler]
async fn fhir_to_hl7(
    Json(body): Json<Value>,
) -> Result<Json<Hl7MessageRes>, (StatusCode, Json<ErrorRes>)> {
    let resource: PatientResource = match serde_json::from_value(body)
        .and_then(|req: FhirToHl7Req| serde_json::from_value(req.data))
    {
        Ok(resource) => resource,
        Err(e) => {
            tracing::error!("FHIR to HL7 request error: {:?}", e);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorRes {
                    error: format!("Error converting FHIR to HL7: {e}"),
                }),
            ));
        }
    };

    Ok(Json(Hl7MessageRes {
        hl7_message: Patient::render(&resource),
    }))
}

#[utoipa::path(
    post,
    path = "/call-api",
    request_body = ApiCallReq,
    responses(
        (status = 200, description = "Forwarded JSON response", body = Object),
        (status = 400, description = "Unsupported HTTP method", body = ErrorRes),
        (status = 500, description = "Forwarded call failed", body = ErrorRes)
    )
)]
/// Forward an arbitrary request to an external JSON API
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the method is outside GET/POST/PUT/DELETE.
///
/// Returns `500 Internal Server Error` wrapping the upstream error text if:
/// - the forwarded call fails in any other way.
#[axum::debug_handler]
async fn call_api(
    State(state): State<AppState>,
    Json(req): Json<ApiCallReq>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorRes>)> {
    match state
        .fhir
        .call(&req.url, &req.method, req.data.as_ref(), req.headers.as_ref())
        .await
    {
        Ok(body) => Ok(Json(body)),
        Err(e) => {
            tracing::error!("Call external API error: {:?}", e);
            let status = match e {
                ClientError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(ErrorRes {
                    error: format!("Error calling external API: {e}"),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    const MSH_HEADER: &str = "MSH|^~\\&|SENDING_APP|SENDING_FACILITY|RECEIVING_APP|RECEIVING_FACILITY|20230615120000||ADT^A01|MSG00001|P|2.5";

    fn router_for(base_url: &str) -> Router {
        let config = fhir_client::FhirConfig::new(base_url, None).expect("valid config");
        router(AppState {
            fhir: Arc::new(FhirClient::new(config)),
        })
    }

    /// Router whose upstream is a closed port; only endpoints that never
    /// reach the upstream are exercised against it.
    fn offline_router() -> Router {
        router_for("http://127.0.0.1:9")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn root_returns_greeting() {
        let response = offline_router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "FHIR Bridge API");
    }

    #[tokio::test]
    async fn parse_endpoint_returns_structured_record() {
        let message = format!(
            "{MSH_HEADER}\rPID|||12345||Smith^John||19800101|M\rOBX||NM|8302-2^Height^LN||180|cm"
        );

        let response = offline_router()
            .oneshot(post_json("/hl7/parse", json!({"message": message})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["patient_id"], "12345");
        assert_eq!(body["last_name"], "Smith");
        assert_eq!(body["first_name"], "John");
        assert_eq!(body["observations"][0]["units"], "cm");
    }

    #[tokio::test]
    async fn parse_endpoint_rejects_non_string_message() {
        let response = offline_router()
            .oneshot(post_json("/hl7/parse", json!({"message": 42})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let error = body["error"].as_str().expect("error text");
        assert!(error.starts_with("Error parsing HL7 message:"));
    }

    #[tokio::test]
    async fn fhir_to_hl7_returns_header_alone_for_empty_data() {
        let response = offline_router()
            .oneshot(post_json("/fhir-to-hl7", json!({"data": {}})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["hl7_message"], MSH_HEADER);
    }

    #[tokio::test]
    async fn fhir_to_hl7_serialises_patient_data() {
        let data = json!({
            "id": "7",
            "gender": "F",
            "birthDate": "19900101",
            "name": [{"family": "Doe", "given": ["Jane"]}]
        });

        let response = offline_router()
            .oneshot(post_json("/fhir-to-hl7", json!({"data": data})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["hl7_message"],
            format!("{MSH_HEADER}\rPID|||7||Doe^Jane||19900101|F")
        );
    }

    #[tokio::test]
    async fn fhir_to_hl7_rejects_malformed_resource() {
        let response = offline_router()
            .oneshot(post_json("/fhir-to-hl7", json!({"data": {"name": "Doe"}})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let error = body["error"].as_str().expect("error text");
        assert!(error.starts_with("Error converting FHIR to HL7:"));
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Patient/123")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let response = router_for(&server.url())
            .oneshot(
                Request::builder()
                    .uri("/patient/123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        let error = body["error"].as_str().expect("error text");
        assert!(error.starts_with("Patient not found:"));
        assert!(error.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn call_api_rejects_unsupported_method() {
        let response = offline_router()
            .oneshot(post_json(
                "/call-api",
                json!({"url": "http://127.0.0.1:9/x", "method": "PATCH"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let error = body["error"].as_str().expect("error text");
        assert!(error.contains("unsupported HTTP method: PATCH"));
    }
}
