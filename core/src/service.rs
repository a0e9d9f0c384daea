//! A service client composed of URL builder, credential and REST client.
//!
//! Per-service clients hold a `ServiceClient` and implement only their own
//! endpoint methods on top of `request` and the URL builder.

use tracing::{debug, warn};

use crate::client::{RestClient, Transport};
use crate::config::ClientConfig;
use crate::credential::PemCredential;
use crate::error::Error;
use crate::http::HttpMethod;
use crate::secrets::SecretSource;
use crate::transport::UreqTransport;
use crate::types::Service;
use crate::urls::UrlBuilder;

/// Secret key holding the PEM client certificate.
pub const CERT_KEY: &str = "ecs.crt";
/// Secret key holding the PEM private key.
pub const PRIVATE_KEY_KEY: &str = "ecs.pk";

#[derive(Debug, Clone)]
pub struct ServiceClient<T = UreqTransport> {
    urls: UrlBuilder,
    credential: Option<PemCredential>,
    rest: RestClient<T>,
}

impl ServiceClient<UreqTransport> {
    /// Configure `service` from `secret_name`.
    ///
    /// Empty PEM values leave the client without a credential; requests then
    /// fail with `Error::NullCredential`. Non-empty but malformed PEM fails
    /// here.
    pub fn from_secrets(
        service: Service,
        secret_name: &str,
        secrets: &dyn SecretSource,
        config: &ClientConfig,
    ) -> Result<Self, Error> {
        Self::from_secrets_with_transport(service, secret_name, secrets, RestClient::new(config))
    }
}

impl<T: Transport> ServiceClient<T> {
    pub fn new(urls: UrlBuilder, credential: Option<PemCredential>, rest: RestClient<T>) -> Self {
        Self { urls, credential, rest }
    }

    pub fn from_secrets_with_transport(
        service: Service,
        secret_name: &str,
        secrets: &dyn SecretSource,
        rest: RestClient<T>,
    ) -> Result<Self, Error> {
        debug!(%service, secret_name, "creating service client");
        let urls = UrlBuilder::from_secrets(service, secret_name, secrets);

        let cert = secrets.read(secret_name, CERT_KEY);
        let key = secrets.read(secret_name, PRIVATE_KEY_KEY);
        let credential = if cert.is_empty() || key.is_empty() {
            warn!(%service, secret_name, "PEM credential secrets are empty, requests will fail until one is set");
            None
        } else {
            Some(PemCredential::from_strings(&cert, &key)?)
        };

        Ok(Self::new(urls, credential, rest))
    }

    pub fn service(&self) -> Service {
        self.urls.service()
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    pub fn urls_mut(&mut self) -> &mut UrlBuilder {
        &mut self.urls
    }

    pub fn credential(&self) -> Option<&PemCredential> {
        self.credential.as_ref()
    }

    pub fn set_credential(&mut self, credential: Option<PemCredential>) {
        self.credential = credential;
    }

    pub fn rest(&self) -> &RestClient<T> {
        &self.rest
    }

    pub fn request(&self, url: &str, body: &str, method: HttpMethod) -> Result<String, Error> {
        self.rest.request(url, body, self.credential.as_ref(), method)
    }

    pub fn get(&self, url: &str) -> Result<String, Error> {
        self.request(url, "", HttpMethod::Get)
    }

    pub fn delete(&self, url: &str) -> Result<String, Error> {
        self.request(url, "", HttpMethod::Delete)
    }

    pub fn post(&self, url: &str, body: &str) -> Result<String, Error> {
        self.request(url, body, HttpMethod::Post)
    }

    pub fn put(&self, url: &str, body: &str) -> Result<String, Error> {
        self.request(url, body, HttpMethod::Put)
    }

    pub fn patch(&self, url: &str, body: &str) -> Result<String, Error> {
        self.request(url, body, HttpMethod::Patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormatProblem, PemField, TransportError};
    use crate::http::{HttpRequest, HttpResponse};
    use crate::secrets::MemorySecretSource;

    #[derive(Debug)]
    struct Echo;

    impl Transport for Echo {
        fn execute(&self, request: &HttpRequest, _: &PemCredential) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::with_body(200, format!("{} {}", request.method, request.url)))
        }
    }

    fn secrets(with_pem: bool) -> MemorySecretSource {
        let source = MemorySecretSource::new()
            .with("ops", "omega.url.serviceUrlName", "omega")
            .with("ops", "omega.url.version", "v1")
            .with("ops", "ecs.url.zone", "live-02")
            .with("ops", "ecs.url.typeofaccess", "example.com")
            .with("ops", "ecs.url.ns", "/ns")
            .with("ops", "ecs.url.namespace", "team.a");
        if with_pem {
            source
                .with("ops", CERT_KEY, include_str!("../tests/fixtures/client.crt"))
                .with("ops", PRIVATE_KEY_KEY, include_str!("../tests/fixtures/client.key"))
        } else {
            source
        }
    }

    #[test]
    fn builds_from_secrets_and_issues_requests() {
        let client =
            ServiceClient::from_secrets_with_transport(Service::Omega, "ops", &secrets(true), RestClient::with_transport(Echo))
                .unwrap();
        assert_eq!(client.service(), Service::Omega);
        assert!(client.credential().is_some());

        let url = client.urls().namespace_service_url("/logs");
        assert_eq!(url, "https://omega.live-02.example.com/v1/ns/team.a/logs");
        assert_eq!(client.get(&url).unwrap(), format!("GET {url}"));
        assert_eq!(client.post(&url, "{}").unwrap(), format!("POST {url}"));
    }

    #[test]
    fn empty_pem_secrets_defer_failure_to_first_request() {
        let client =
            ServiceClient::from_secrets_with_transport(Service::Omega, "ops", &secrets(false), RestClient::with_transport(Echo))
                .unwrap();
        assert!(client.credential().is_none());
        let err = client.get("https://omega.example/").unwrap_err();
        assert!(matches!(err, Error::NullCredential));
    }

    #[test]
    fn malformed_pem_secret_fails_construction() {
        let source = secrets(false)
            .with("ops", CERT_KEY, "not a certificate")
            .with("ops", PRIVATE_KEY_KEY, "not a key");
        let err = ServiceClient::from_secrets_with_transport(Service::Omega, "ops", &source, RestClient::with_transport(Echo))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFormat {
                field: PemField::Certificate,
                problem: FormatProblem::MissingDelimiters
            }
        ));
    }

    #[test]
    fn urls_can_be_overridden_after_construction() {
        let mut client =
            ServiceClient::from_secrets_with_transport(Service::Omega, "ops", &secrets(true), RestClient::with_transport(Echo))
                .unwrap();
        client
            .urls_mut()
            .set_override(crate::urls::UrlLevel::FullService, "https://pinned.example/");
        assert_eq!(client.urls().namespace_service_url(""), "https://pinned.example/");
    }
}
