//! FHIR REST client and generic forwarder.
//!
//! One `reqwest` client serves both concerns. FHIR-bound requests always
//! carry the `application/fhir+json` content negotiation headers and, when
//! a key is configured, a bearer token. The generic forwarder sends only
//! what the caller asked for.

use std::collections::HashMap;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{ClientError, ClientResult, FhirConfig};

/// Media type for FHIR JSON content negotiation.
const FHIR_JSON: &str = "application/fhir+json";

/// Search criteria forwarded to the FHIR `Patient` search.
///
/// Only the populated members become query parameters; everything else is
/// left off the request entirely.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct PatientSearch {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
}

impl PatientSearch {
    fn query_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(name) = &self.name {
            params.push(("name", name.as_str()));
        }
        if let Some(identifier) = &self.identifier {
            params.push(("identifier", identifier.as_str()));
        }
        if let Some(birthdate) = &self.birthdate {
            params.push(("birthdate", birthdate.as_str()));
        }
        if let Some(gender) = &self.gender {
            params.push(("gender", gender.as_str()));
        }
        params
    }
}

/// Client for the upstream FHIR server and arbitrary JSON APIs.
///
/// Holds no per-request state; a single instance is shared across all
/// gateway handlers.
pub struct FhirClient {
    config: FhirConfig,
    client: Client,
}

impl FhirClient {
    /// Build a client over the given configuration.
    pub fn new(config: FhirConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Base URL of the upstream FHIR server.
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        self.config.api_key().map(|key| format!("Bearer {key}"))
    }

    /// Start a FHIR-bound GET with content negotiation and auth headers.
    fn fhir_get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, FHIR_JSON)
            .header(header::ACCEPT, FHIR_JSON);

        if let Some(auth) = self.auth_header_value() {
            request = request.header(header::AUTHORIZATION, auth);
        }

        request
    }

    /// Retrieve a single patient resource by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] when the server is unreachable,
    /// [`ClientError::Upstream`] on a non-2xx response, and
    /// [`ClientError::InvalidResponse`] when the body is not JSON.
    pub async fn get_patient(&self, patient_id: &str) -> ClientResult<Value> {
        let url = format!("{}/Patient/{patient_id}", self.base_url());

        tracing::debug!(url = %url, "fetching patient");

        let response = self
            .fhir_get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        Self::json_body(response).await
    }

    /// Search for patients matching the populated criteria.
    ///
    /// Returns the Bundle's `entry` array, or an empty list when the
    /// server sent no entries.
    pub async fn search_patients(&self, search: &PatientSearch) -> ClientResult<Vec<Value>> {
        let url = format!("{}/Patient", self.base_url());

        tracing::debug!(url = %url, "searching patients");

        let response = self
            .fhir_get(&url)
            .query(&search.query_params())
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let bundle = Self::json_body(response).await?;
        Ok(Self::bundle_entries(bundle))
    }

    /// Retrieve the clinical observations recorded for a patient.
    ///
    /// Returns the Bundle's `entry` array, or an empty list when the
    /// server sent no entries.
    pub async fn patient_observations(&self, patient_id: &str) -> ClientResult<Vec<Value>> {
        let url = format!("{}/Observation", self.base_url());

        tracing::debug!(url = %url, patient_id = %patient_id, "fetching observations");

        let response = self
            .fhir_get(&url)
            .query(&[("patient", patient_id)])
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let bundle = Self::json_body(response).await?;
        Ok(Self::bundle_entries(bundle))
    }

    /// Forward a request to an arbitrary JSON API.
    ///
    /// Supports GET, POST, PUT and DELETE case-insensitively; any other
    /// method is rejected before a request is attempted. The JSON `body`
    /// is sent for POST and PUT only, and caller `headers` are forwarded
    /// verbatim. The FHIR content negotiation headers are NOT applied
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnsupportedMethod`] for a method outside the
    /// whitelist; otherwise the same failure modes as the FHIR calls. An
    /// empty response body maps to an empty JSON object, not an error.
    pub async fn call(
        &self,
        url: &str,
        method: &str,
        body: Option<&Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> ClientResult<Value> {
        let method_name = method.to_uppercase();

        let mut request = match method_name.as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "DELETE" => self.client.delete(url),
            _ => return Err(ClientError::UnsupportedMethod(method.to_string())),
        };

        if let Some(body) = body {
            if matches!(method_name.as_str(), "POST" | "PUT") {
                request = request.json(body);
            }
        }

        if let Some(headers) = headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }

        tracing::debug!(url = %url, method = %method_name, "forwarding external call");

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if text.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Check the status and decode a JSON body, embedding the upstream
    /// body text in the error on a non-2xx response.
    async fn json_body(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Pull the `entry` array out of a search Bundle, defaulting to empty.
    fn bundle_entries(bundle: Value) -> Vec<Value> {
        match bundle {
            Value::Object(mut object) => match object.remove("entry") {
                Some(Value::Array(entries)) => entries,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}
