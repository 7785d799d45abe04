//! Request dispatch core for the AvaTax tax-calculation REST service.
//!
//! # Overview
//! Every endpoint wrapper funnels into [`AvaTaxClient::rest_call`], which
//! builds the request, sends it through a pluggable [`Transport`] under a
//! deadline, classifies the response by content type and status, decodes or
//! rejects the body, and writes one audit log line per call.
//!
//! # Design
//! - `ClientConfig` is immutable and shared behind an `Arc`; calls share no
//!   mutable state, so concurrent calls need no locking.
//! - Request and response are plain data (`HttpRequest` / `HttpResponse`);
//!   only the transport performs I/O.
//! - Transport failures and timeouts keep their own error variants; failures
//!   after a response arrived become a `ServiceError`.
//! - Typed decoding is generic over `T: DeserializeOwned`, with optional
//!   case-insensitive field matching.

pub mod audit;
pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod query;
pub mod strict;
pub mod timeout;

pub use audit::{AuditLogEntry, LogLevel};
pub use auth::{ClientIdentity, Credentials};
pub use classify::TextResponse;
pub use client::{ApiResponse, AvaTaxClient, PingResult, RestCall};
pub use config::{ClientConfig, ClientConfigBuilder, Environment};
pub use error::{ApiError, ConfigError, RequestError, ServiceError, FORMAT_ERROR_CODE};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, RequestBody, Transport, TransportError};
pub use logger::{AuditSink, LogOptions, TracingSink};
pub use query::{QueryParams, QueryValue};
pub use timeout::CancellationMode;
