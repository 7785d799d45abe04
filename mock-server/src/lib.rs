//! In-process stand-in for the tax service, used by the client's tests.
//!
//! Each route produces one of the response shapes the client has to
//! classify: JSON data, empty success, error envelopes, tabular text,
//! malformed JSON, and a request that never completes. `/api/v2/echo` and
//! `/api/v2/upload` reflect what the client sent.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::Multipart,
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

pub const PING_VERSION: &str = "24.1.0";
pub const CSV_REPORT: &str = "a,b\n1,2";
pub const BROKEN_JSON: &str = "{\"id\": 1,";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub version: String,
    pub authenticated: bool,
    pub authentication_type: String,
}

/// What `/api/v2/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// One field received by `/api/v2/upload`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadedField {
    pub name: String,
    pub content: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/api/v2/utilities/ping", get(ping))
        .route("/api/v2/empty", get(empty))
        .route("/api/v2/zero-length", get(zero_length))
        .route("/api/v2/service-error", get(service_error))
        .route("/api/v2/bad-request", get(bad_request))
        .route("/api/v2/report.csv", get(csv_report))
        .route("/api/v2/broken", get(broken))
        .route("/api/v2/hang", get(hang))
        .route("/api/v2/echo", any(echo))
        .route("/api/v2/upload", post(upload))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn ping(headers: HeaderMap) -> Json<Ping> {
    let authentication_type = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().next())
        .map_or("None", |scheme| match scheme {
            "Basic" => "UsernamePassword",
            "Bearer" => "OAuth",
            _ => "None",
        });
    Json(Ping {
        version: PING_VERSION.to_string(),
        authenticated: authentication_type != "None",
        authentication_type: authentication_type.to_string(),
    })
}

async fn empty() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::CONTENT_TYPE, "application/json")])
}

async fn zero_length() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Bytes::new(),
    )
}

async fn service_error() -> Json<serde_json::Value> {
    Json(json!({
        "error": {
            "message": "bad",
            "code": "X1",
            "target": "field",
            "details": "d"
        }
    }))
}

async fn bad_request() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "code": "EntityNotFoundError",
                "message": "Company not found.",
                "target": "HttpRequest",
                "details": [{"code": "EntityNotFoundError", "number": 4, "severity": "Error"}]
            }
        })),
    )
}

async fn csv_report() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/csv")], CSV_REPORT)
}

async fn broken() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], BROKEN_JSON)
}

async fn hang() -> StatusCode {
    std::future::pending::<()>().await;
    StatusCode::OK
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn upload(mut multipart: Multipart) -> Result<Json<Vec<UploadedField>>, StatusCode> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        let content = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        fields.push(UploadedField { name, content });
    }
    Ok(Json(fields))
}
