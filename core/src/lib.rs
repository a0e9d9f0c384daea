//! Credentialed HTTP client core for namespaced REST services.
//!
//! # Overview
//! Turns a PEM certificate/key pair into a TLS client identity, composes
//! service URLs through layered overrides, and issues REST calls that only
//! succeed for an accepted set of status codes.
//!
//! # Design
//! - `PemCredential` is built once per client and never changes.
//! - `UrlBuilder` holds service metadata and overrides only; what a URL
//!   points at is passed per call as a `Target`, so builders can be shared.
//! - `RestClient` splits every call into `build_request`, a `Transport`
//!   round trip, and `evaluate`, keeping the status contract free of I/O.
//! - Service metadata and PEM material come from an injected `SecretSource`.
//! - Per-service clients such as `SigmaService` compose a `ServiceClient`
//!   and add only their endpoint methods.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod secrets;
pub mod service;
pub mod sigma;
pub mod transport;
pub mod types;
pub mod urls;

pub use client::{RestClient, Transport, ACCEPTED_STATUSES, NO_CONTENT_MESSAGE};
pub use config::ClientConfig;
pub use credential::{KeyEntry, KeyStore, PemCredential};
pub use error::{DecodeError, Error, FormatProblem, PemField, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use secrets::{MemorySecretSource, MountedSecretSource, SecretSource};
pub use service::ServiceClient;
pub use sigma::{AlarmReceiverKind, AlarmStatus, SigmaService};
pub use transport::UreqTransport;
pub use types::{Service, Target};
pub use urls::{ServiceEndpoint, UrlBuilder, UrlLevel};
