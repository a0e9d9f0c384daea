//! Credentialed REST calls with an accepted-status contract.
//!
//! # Design
//! A call is split the same way end to end: `build_request` produces an
//! `HttpRequest`, a `Transport` performs the round trip, and `evaluate`
//! turns the `HttpResponse` into body text or a typed `Error`. Only the
//! middle step touches the network, so the status contract is tested with a
//! stub transport.
//!
//! Status contract:
//!
//! | entity  | status             | outcome                   |
//! |---------|--------------------|---------------------------|
//! | present | 200, 201, 202, 204 | body text                 |
//! | present | anything else      | `Error::UnacceptedStatus` |
//! | absent  | 204                | `NO_CONTENT_MESSAGE`      |
//! | absent  | anything else      | `Error::EmptyResponse`    |

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credential::PemCredential;
use crate::error::{Error, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::UreqTransport;

/// Returned in place of a body when the service answers 204 with no entity.
pub const NO_CONTENT_MESSAGE: &str = "Http code 204: successful request but no response from server";

/// Statuses accepted when the response carries an entity.
pub const ACCEPTED_STATUSES: [u16; 4] = [200, 201, 202, 204];

/// Performs one HTTP round trip presenting `credential` as the TLS client
/// identity. Implementations must not interpret the status code.
pub trait Transport {
    fn execute(&self, request: &HttpRequest, credential: &PemCredential) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest, credential: &PemCredential) -> Result<HttpResponse, TransportError> {
        (**self).execute(request, credential)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest, credential: &PemCredential) -> Result<HttpResponse, TransportError> {
        (**self).execute(request, credential)
    }
}

/// Blocking REST client. One call occupies the caller until it completes.
#[derive(Debug, Clone)]
pub struct RestClient<T = UreqTransport> {
    transport: T,
}

impl RestClient<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(UreqTransport::new(config))
    }
}

impl Default for RestClient<UreqTransport> {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue `method` against `url`. `body` is sent for PATCH, POST and PUT
    /// only.
    pub fn request(
        &self,
        url: &str,
        body: &str,
        credential: Option<&PemCredential>,
        method: HttpMethod,
    ) -> Result<String, Error> {
        let credential = credential.ok_or(Error::NullCredential)?;

        debug!(%method, url, body_len = body.len(), "creating request");
        let request = self.build_request(url, body, method);
        let response = self
            .transport
            .execute(&request, credential)
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;
        self.evaluate(url, response)
    }

    pub fn build_request(&self, url: &str, body: &str, method: HttpMethod) -> HttpRequest {
        if method.sends_body() {
            HttpRequest {
                method,
                url: url.to_string(),
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: Some(body.to_string()),
            }
        } else {
            HttpRequest {
                method,
                url: url.to_string(),
                headers: Vec::new(),
                body: None,
            }
        }
    }

    pub fn evaluate(&self, url: &str, response: HttpResponse) -> Result<String, Error> {
        check_status(url, response)
    }
}

fn check_status(url: &str, response: HttpResponse) -> Result<String, Error> {
    match response.body {
        Some(body) if ACCEPTED_STATUSES.contains(&response.status) => Ok(body),
        Some(body) => {
            warn!(status = response.status, url, "request rejected by service");
            Err(Error::UnacceptedStatus {
                status: response.status,
                url: url.to_string(),
                body,
            })
        }
        None if response.status == 204 => Ok(NO_CONTENT_MESSAGE.to_string()),
        None => {
            warn!(status = response.status, url, "no response entity");
            Err(Error::EmptyResponse {
                url: url.to_string(),
                status: response.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const URL: &str = "https://sigma.work-01.platform.bbva.com/v0/ns/user.xe81235/alarms";

    /// Records every request and answers with a canned response.
    struct StubTransport {
        response: Result<HttpResponse, String>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn answering(response: HttpResponse) -> Self {
            Self {
                response: Ok(response),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for StubTransport {
        fn execute(&self, request: &HttpRequest, _: &PemCredential) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.response.clone().map_err(Into::into)
        }
    }

    fn credential() -> PemCredential {
        PemCredential::from_strings(
            include_str!("../tests/fixtures/client.crt"),
            include_str!("../tests/fixtures/client.key"),
        )
        .unwrap()
    }

    fn call(response: HttpResponse, method: HttpMethod) -> Result<String, Error> {
        let client = RestClient::with_transport(StubTransport::answering(response));
        client.request(URL, r#"{"a":1}"#, Some(&credential()), method)
    }

    #[test]
    fn missing_credential_fails_before_transport() {
        let stub = StubTransport::answering(HttpResponse::with_body(200, "ok"));
        let client = RestClient::with_transport(&stub);
        let err = client.request(URL, "", None, HttpMethod::Get).unwrap_err();
        assert!(matches!(err, Error::NullCredential));
        assert!(stub.seen().is_empty());
    }

    #[test]
    fn accepted_status_with_entity_returns_body() {
        for status in ACCEPTED_STATUSES {
            let body = call(HttpResponse::with_body(status, "{\"id\":\"x\"}"), HttpMethod::Post).unwrap();
            assert_eq!(body, "{\"id\":\"x\"}", "status {status}");
        }
    }

    #[test]
    fn empty_entity_is_still_an_entity() {
        assert_eq!(call(HttpResponse::with_body(200, ""), HttpMethod::Get).unwrap(), "");
    }

    #[test]
    fn rejected_status_with_entity_is_unaccepted() {
        let err = call(HttpResponse::with_body(500, "internal error"), HttpMethod::Get).unwrap_err();
        assert!(err.to_string().contains("500"));
        match err {
            Error::UnacceptedStatus { status, url, body } => {
                assert_eq!(status, 500);
                assert_eq!(url, URL);
                assert_eq!(body, "internal error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_entity_with_204_is_the_sentinel() {
        let body = call(HttpResponse::without_body(204), HttpMethod::Delete).unwrap();
        assert_eq!(body, NO_CONTENT_MESSAGE);
    }

    #[test]
    fn no_entity_with_other_status_is_empty_response() {
        let err = call(HttpResponse::without_body(404), HttpMethod::Get).unwrap_err();
        assert!(matches!(err, Error::EmptyResponse { status: 404, ref url } if url == URL));
    }

    #[test]
    fn transport_failure_embeds_url() {
        let client = RestClient::with_transport(StubTransport::failing("handshake failed"));
        let err = client.request(URL, "", Some(&credential()), HttpMethod::Get).unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains(URL));
    }

    #[test]
    fn read_verbs_drop_the_body() {
        let stub = StubTransport::answering(HttpResponse::with_body(200, "ok"));
        let client = RestClient::with_transport(&stub);
        let cred = credential();
        client.request(URL, "ignored", Some(&cred), HttpMethod::Get).unwrap();
        client.request(URL, "ignored", Some(&cred), HttpMethod::Delete).unwrap();
        for req in stub.seen() {
            assert!(req.body.is_none(), "{} carried a body", req.method);
            assert!(req.headers.is_empty());
        }
    }

    #[test]
    fn write_verbs_send_json_body() {
        let stub = StubTransport::answering(HttpResponse::with_body(201, "ok"));
        let client = RestClient::with_transport(&stub);
        let cred = credential();
        for method in [HttpMethod::Patch, HttpMethod::Post, HttpMethod::Put] {
            client.request(URL, r#"{"enabled":true}"#, Some(&cred), method).unwrap();
        }
        let seen = stub.seen();
        assert_eq!(seen.len(), 3);
        for req in seen {
            assert_eq!(req.url, URL);
            assert_eq!(req.body.as_deref(), Some(r#"{"enabled":true}"#));
            assert_eq!(
                req.headers,
                vec![("content-type".to_string(), "application/json".to_string())]
            );
        }
    }

    #[test]
    fn repeated_gets_return_identical_bodies() {
        let stub = StubTransport::answering(HttpResponse::with_body(200, "[\"a\",\"b\"]"));
        let client = RestClient::with_transport(&stub);
        let cred = credential();
        let first = client.request(URL, "", Some(&cred), HttpMethod::Get).unwrap();
        let second = client.request(URL, "", Some(&cred), HttpMethod::Get).unwrap();
        assert_eq!(first, second);
        assert_eq!(stub.seen().len(), 2);
    }
}
