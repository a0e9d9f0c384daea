//! Error types for credential loading and REST calls.
//!
//! # Design
//! Every failure the core can produce lands in one `Error` enum so callers can
//! pattern-match instead of string-sniffing. Variants that wrap a lower-level
//! failure keep it as `source()`, and every variant carries the context needed
//! to diagnose it (URL, status, path) without re-running the call.

use std::path::PathBuf;

use thiserror::Error;

/// Which PEM input a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemField {
    Certificate,
    PrivateKey,
}

impl std::fmt::Display for PemField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PemField::Certificate => write!(f, "cert"),
            PemField::PrivateKey => write!(f, "key"),
        }
    }
}

/// Why a PEM input was rejected before any decoding took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatProblem {
    /// The input was absent or an empty string.
    Empty,
    /// The BEGIN/END delimiter pair was not found.
    MissingDelimiters,
}

/// Lower-level decode failure behind a `BuildFailure`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{field} payload is not valid base64")]
    Base64 {
        field: PemField,
        #[source]
        source: base64::DecodeError,
    },

    #[error("certificate is not a valid X.509 structure")]
    Certificate(#[source] x509_parser::error::X509Error),

    #[error("private key is not a PKCS#8 RSA key")]
    PrivateKey(#[source] rsa::pkcs8::Error),
}

/// Boxed error returned by a `Transport` implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by credential construction and `RestClient::request`.
#[derive(Debug, Error)]
pub enum Error {
    /// A PEM input was empty or lacked its delimiters. Fix the input.
    #[error("{}", format_message(*.field, *.problem))]
    InvalidFormat { field: PemField, problem: FormatProblem },

    /// A credential file does not exist.
    #[error("resource '{}' does not exist", .path.display())]
    ResourceNotFound { path: PathBuf },

    /// A credential file exists but could not be read.
    #[error("resource '{}' could not be read", .path.display())]
    ResourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PEM text was well-formed but the key material inside was not.
    #[error("unable to load credentials from PEM")]
    BuildFailure(#[source] DecodeError),

    /// A request was attempted without a credential.
    #[error("PEM credential can't be missing, please provide valid credentials")]
    NullCredential,

    /// DNS, connect, TLS handshake, timeout, or body read failure.
    #[error("transport failure requesting {url}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The service answered with a status outside the accepted set.
    #[error("error status code {status} in response from url: {url} with response: {body}")]
    UnacceptedStatus { status: u16, url: String, body: String },

    /// The service answered without an entity and with a status other than 204.
    #[error("no response in request to url: {url} (status {status})")]
    EmptyResponse { url: String, status: u16 },
}

impl Error {
    /// True for transport failures only.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// HTTP status attached to the error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnacceptedStatus { status, .. } | Error::EmptyResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn format_message(field: PemField, problem: FormatProblem) -> String {
    match (field, problem) {
        (_, FormatProblem::Empty) => format!("PEM {field} can't be null or empty"),
        (PemField::Certificate, FormatProblem::MissingDelimiters) => "Wrong certificate format".to_string(),
        (PemField::PrivateKey, FormatProblem::MissingDelimiters) => "Wrong private key format".to_string(),
    }
}
