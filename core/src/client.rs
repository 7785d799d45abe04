//! Request dispatch for the tax service.
//!
//! # Design
//! `AvaTaxClient` holds only an `Arc<ClientConfig>` and carries no mutable
//! state between calls, so it is cheap to clone and safe to share across
//! tasks. Endpoint wrappers describe a call as a [`RestCall`] and hand it to
//! [`AvaTaxClient::rest_call`], which:
//! 1. builds the `HttpRequest` (`build_request`);
//! 2. sends it through the configured transport under the timeout guard;
//! 3. classifies and decodes the response (`parse_response`);
//! 4. flushes exactly one audit entry, whatever the outcome.
//!
//! `build_request` and `parse_response` are public so callers that execute
//! requests themselves can still reuse the header, body and decoding rules.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::AuditLogEntry;
use crate::classify::{classify, Classified, TextResponse, FORMAT_ERROR_MESSAGE};
use crate::config::ClientConfig;
use crate::error::{ApiError, RequestError, ServiceError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::query::{build_url, QueryParams};
use crate::{strict, timeout};

/// Header carrying the client-identity string.
pub const CLIENT_HEADER: &str = "X-Avalara-Client";

/// Name of the single field in multipart request bodies.
pub const MULTIPART_FIELD: &str = "file";

const JSON: &str = "application/json";

/// One API call as described by an endpoint wrapper.
#[derive(Debug, Clone)]
pub struct RestCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: QueryParams,
    pub payload: Option<Value>,
    pub multipart: bool,
    pub headers: Vec<(String, String)>,
}

impl RestCall {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            payload: None,
            multipart: false,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Serialize `model` as the payload.
    pub fn json<S: Serialize>(self, model: &S) -> Result<Self, RequestError> {
        Ok(self.payload(serde_json::to_value(model)?))
    }

    /// Send the payload as a single-field multipart form.
    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    /// Extra header; overrides any default header with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Decoded result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// JSON body converted to the requested type.
    Data(T),
    /// Tabular body (CSV, Excel), kept as raw text.
    Text(TextResponse),
    /// No body (204, or zero-length JSON).
    Empty,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> Option<T> {
        match self {
            ApiResponse::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ApiResponse::Text(text) => Some(text.text()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ApiResponse::Empty)
    }
}

/// Result of `GET /api/v2/utilities/ping`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub authenticated: Option<bool>,
    #[serde(default)]
    pub authentication_type: Option<String>,
    #[serde(default)]
    pub authenticated_user_name: Option<String>,
    #[serde(default)]
    pub authenticated_user_id: Option<i64>,
    #[serde(default)]
    pub authenticated_account_id: Option<i64>,
}

/// Asynchronous client for the tax service.
#[derive(Debug, Clone)]
pub struct AvaTaxClient {
    config: Arc<ClientConfig>,
}

impl AvaTaxClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Assemble the request for `call`: URL, default headers, caller headers
    /// (last write wins) and body.
    pub fn build_request(&self, call: &RestCall) -> Result<HttpRequest, RequestError> {
        let mut request = HttpRequest {
            method: call.method,
            url: build_url(&self.config.base_url, &call.path, &call.query),
            headers: Vec::new(),
            body: None,
        };

        request.set_header("Accept", JSON);
        if let Some(auth) = &self.config.auth_header {
            request.set_header("Authorization", auth.as_str());
        }
        request.set_header(CLIENT_HEADER, self.config.client_header.as_str());
        if !call.multipart {
            request.set_header("Content-Type", JSON);
        }
        for (name, value) in &call.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RequestError::InvalidHeaderName(name.clone()))?;
            HeaderValue::from_str(value).map_err(|_| RequestError::InvalidHeaderValue(name.clone()))?;
            request.set_header(name.as_str(), value.as_str());
        }

        request.body = match (&call.payload, call.multipart) {
            (payload, true) => Some(RequestBody::Multipart {
                field: MULTIPART_FIELD.to_string(),
                content: multipart_content(payload.as_ref())?,
            }),
            (Some(payload), false) => Some(RequestBody::Json(serde_json::to_string(payload)?)),
            (None, false) => None,
        };

        Ok(request)
    }

    /// Classify `response` and convert its JSON body to `T`.
    pub fn parse_response<T: DeserializeOwned>(
        &self,
        response: &HttpResponse,
    ) -> Result<ApiResponse<T>, ServiceError> {
        match classify(response)? {
            Classified::Tabular(text) => Ok(ApiResponse::Text(text)),
            Classified::Empty => Ok(ApiResponse::Empty),
            Classified::Data(value) => strict::convert(value, self.config.strict_type_conversion)
                .map(ApiResponse::Data)
                .map_err(|e| ServiceError::format(FORMAT_ERROR_MESSAGE, e)),
        }
    }

    /// Execute `call` and decode the response into `T`.
    ///
    /// Transport failures and timeouts are returned as `ApiError::Transport`
    /// and `ApiError::Timeout`; anything wrong with a received response is an
    /// `ApiError::Service`. Exactly one audit entry is flushed per call.
    #[tracing::instrument(
        name = "avatax_request",
        skip(self, call),
        fields(http.method = %call.method, http.path = %call.path)
    )]
    pub async fn rest_call<T: DeserializeOwned>(&self, call: RestCall) -> Result<ApiResponse<T>, ApiError> {
        let sink = self.config.logging.resolve();
        let mut entry = AuditLogEntry::new();

        let request = match self.build_request(&call) {
            Ok(request) => request,
            Err(err) => {
                let err = ApiError::Request(err);
                entry.populate_error_info(None, &err);
                entry.flush(sink.as_deref());
                return Err(err);
            }
        };
        entry.populate_request_info(&request);
        tracing::debug!(url = %request.url, "sending request");

        let transport = Arc::clone(&self.config.transport);
        let sent = timeout::guard(
            async move { transport.send(request).await.map_err(ApiError::Transport) },
            self.config.timeout,
            self.config.cancellation,
        )
        .await;
        entry.populate_elapsed_time();

        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                entry.populate_error_info(None, &err);
                entry.flush(sink.as_deref());
                return Err(err);
            }
        };

        match self.parse_response::<T>(&response) {
            Ok(decoded) => {
                let body = match &decoded {
                    ApiResponse::Empty => None,
                    _ => response.text().ok(),
                };
                entry.populate_response_info(&response, body);
                entry.flush(sink.as_deref());
                Ok(decoded)
            }
            Err(err) => {
                entry.populate_error_info(Some(&response), &err);
                entry.flush(sink.as_deref());
                Err(ApiError::Service(err))
            }
        }
    }

    /// Check connectivity and credentials.
    pub async fn ping(&self) -> Result<ApiResponse<PingResult>, ApiError> {
        self.rest_call(RestCall::get("/api/v2/utilities/ping")).await
    }
}

fn multipart_content(payload: Option<&Value>) -> Result<Vec<u8>, RequestError> {
    Ok(match payload {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(text)) => text.as_bytes().to_vec(),
        Some(other) => serde_json::to_vec(other)?,
    })
}
