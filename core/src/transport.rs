//! Mutual-TLS transport over `ureq`.

use std::time::Duration;

use ureq::tls::{Certificate, ClientCert, PrivateKey, TlsConfig};
use ureq::{Agent, RequestBuilder};

use crate::client::Transport;
use crate::config::ClientConfig;
use crate::credential::{PemCredential, KEY_ALIAS};
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes requests with a fresh agent per call, so the connection is
/// closed when the call returns whatever its outcome.
///
/// Redirects are never followed and entities are read in full with lossy
/// UTF-8 decoding, so every answer reaches the status contract as sent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Option<Duration>,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn agent(&self, credential: &PemCredential) -> Result<Agent, TransportError> {
        let entry = credential
            .key_store()
            .key_entry(KEY_ALIAS, credential.key_store_password())
            .ok_or("credential key store has no usable key entry")?;

        let chain: Vec<Certificate<'static>> = entry
            .chain()
            .iter()
            .map(|der| Certificate::from_der(der).to_owned())
            .collect();
        let key = PrivateKey::from_pem(entry.key_pem().as_bytes())?.to_owned();

        let tls = TlsConfig::builder()
            .client_cert(Some(ClientCert::new_with_certs(&chain, key)))
            .build();

        Ok(Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .timeout_global(self.timeout)
            .tls_config(tls)
            .build()
            .new_agent())
    }

    fn headers<B>(&self, mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        builder = builder.header("user-agent", self.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, credential: &PemCredential) -> Result<HttpResponse, TransportError> {
        let agent = self.agent(credential)?;
        let url = request.url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);

        let mut response = match (request.method, body) {
            (HttpMethod::Get, _) => self.headers(agent.get(url), request).call(),
            (HttpMethod::Delete, _) => self.headers(agent.delete(url), request).call(),
            (HttpMethod::Patch, Some(body)) => self.headers(agent.patch(url), request).send(body),
            (HttpMethod::Patch, None) => self.headers(agent.patch(url), request).send_empty(),
            (HttpMethod::Post, Some(body)) => self.headers(agent.post(url), request).send(body),
            (HttpMethod::Post, None) => self.headers(agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => self.headers(agent.put(url), request).send(body),
            (HttpMethod::Put, None) => self.headers(agent.put(url), request).send_empty(),
        }?;

        let status = response.status().as_u16();
        let body = if carries_entity(status) {
            let bytes = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };
        Ok(HttpResponse { status, body })
    }
}

/// Informational, 204 and 304 responses never have an entity.
fn carries_entity(status: u16) -> bool {
    !((100..200).contains(&status) || status == 204 || status == 304)
}
