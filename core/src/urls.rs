//! Layered URL construction for namespaced services.
//!
//! # Design
//! URLs are built at five levels, each one extending the level above it:
//!
//! ```text
//! service base      https://{service}.{zone}.{origin}/
//! version + ns      {base}{version}{ns}/
//! namespace service {base}{version}{ns}/{namespace}
//! common service    {namespace service}/{collection}
//! action            {common service}/{name}:{action}
//! ```
//!
//! Every level first honours the full-URL override, then its own override,
//! and only then computes its form. An override replaces the level verbatim,
//! ignoring `append`; deeper levels still extend it.
//!
//! What a URL points at below the namespace is passed per call as a
//! `Target`, so a builder holds no per-request state and can be shared.

use tracing::warn;

use crate::secrets::SecretSource;
use crate::types::{Service, Target};

pub const NS_SEGMENT_KEY: &str = "ecs.url.ns";
pub const ACCESS_ORIGIN_KEY: &str = "ecs.url.typeofaccess";
pub const ZONE_KEY: &str = "ecs.url.zone";
pub const NAMESPACE_KEY: &str = "ecs.url.namespace";
pub const MRS_SEGMENT_KEY: &str = "ecs.url.mrs";

/// Key of the per-service value `name` (`{service}.url.{name}`).
pub fn service_key(service: Service, name: &str) -> String {
    format!("{service}.url.{name}")
}

/// Naming and namespace fragments a service URL is assembled from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Host label of the service, e.g. `sigma`.
    pub service_url_name: String,
    /// e.g. `work-01`.
    pub zone: String,
    /// Domain suffix the service is reached through, e.g. `platform.bbva.com`.
    pub access_origin: String,
    /// e.g. `v0`.
    pub version: String,
    /// Literal segment before the namespace, e.g. `/ns`.
    pub ns_segment: String,
    /// e.g. `user.xe81235`.
    pub namespace: String,
    /// Monitored-resource segment, e.g. `/mrs`.
    pub mrs_segment: String,
}

/// One of the override slots, from least to most specific, plus the
/// full-URL override that beats them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlLevel {
    ServiceBase,
    VersionAndNamespace,
    NamespaceService,
    CommonService,
    ActionService,
    FullService,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Overrides {
    service_base: Option<String>,
    version_and_ns: Option<String>,
    namespace_service: Option<String>,
    common_service: Option<String>,
    action_service: Option<String>,
    full_service: Option<String>,
}

impl Overrides {
    fn slot(&mut self, level: UrlLevel) -> &mut Option<String> {
        match level {
            UrlLevel::ServiceBase => &mut self.service_base,
            UrlLevel::VersionAndNamespace => &mut self.version_and_ns,
            UrlLevel::NamespaceService => &mut self.namespace_service,
            UrlLevel::CommonService => &mut self.common_service,
            UrlLevel::ActionService => &mut self.action_service,
            UrlLevel::FullService => &mut self.full_service,
        }
    }

    fn get(&self, level: UrlLevel) -> Option<&str> {
        match level {
            UrlLevel::ServiceBase => self.service_base.as_deref(),
            UrlLevel::VersionAndNamespace => self.version_and_ns.as_deref(),
            UrlLevel::NamespaceService => self.namespace_service.as_deref(),
            UrlLevel::CommonService => self.common_service.as_deref(),
            UrlLevel::ActionService => self.action_service.as_deref(),
            UrlLevel::FullService => self.full_service.as_deref(),
        }
    }
}

/// Produces fully qualified endpoint URLs for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    service: Service,
    endpoint: ServiceEndpoint,
    overrides: Overrides,
}

impl UrlBuilder {
    pub fn new(service: Service, endpoint: ServiceEndpoint) -> Self {
        Self {
            service,
            endpoint,
            overrides: Overrides::default(),
        }
    }

    /// Read the endpoint fragments of `service` from `secret_name`. Missing
    /// values stay empty and show up as malformed URLs at first use.
    pub fn from_secrets(service: Service, secret_name: &str, secrets: &dyn SecretSource) -> Self {
        let read = |key: &str| {
            let value = secrets.read(secret_name, key);
            if value.is_empty() {
                warn!(%service, secret_name, key, "URL fragment is empty");
            }
            value
        };
        let endpoint = ServiceEndpoint {
            service_url_name: read(&service_key(service, "serviceUrlName")),
            zone: read(ZONE_KEY),
            access_origin: read(ACCESS_ORIGIN_KEY),
            version: read(&service_key(service, "version")),
            ns_segment: read(NS_SEGMENT_KEY),
            namespace: read(NAMESPACE_KEY),
            mrs_segment: read(MRS_SEGMENT_KEY),
        };
        Self::new(service, endpoint)
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn namespace(&self) -> &str {
        &self.endpoint.namespace
    }

    pub fn mrs_segment(&self) -> &str {
        &self.endpoint.mrs_segment
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.endpoint.namespace = namespace.into();
    }

    pub fn set_zone(&mut self, zone: impl Into<String>) {
        self.endpoint.zone = zone.into();
    }

    pub fn set_access_origin(&mut self, access_origin: impl Into<String>) {
        self.endpoint.access_origin = access_origin.into();
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.endpoint.version = version.into();
    }

    pub fn override_url(&self, level: UrlLevel) -> Option<&str> {
        self.overrides.get(level)
    }

    pub fn set_override(&mut self, level: UrlLevel, url: impl Into<String>) {
        *self.overrides.slot(level) = Some(url.into());
    }

    pub fn clear_override(&mut self, level: UrlLevel) {
        *self.overrides.slot(level) = None;
    }

    /// Reset every override so all levels are computed again.
    pub fn clear_overrides(&mut self) {
        self.overrides = Overrides::default();
    }

    /// Set the override of `level` from a secret. An empty value leaves the
    /// level unset.
    pub fn override_from_secret(&mut self, level: UrlLevel, secrets: &dyn SecretSource, secret_name: &str, key: &str) {
        let url = secrets.read(secret_name, key);
        if url.is_empty() {
            warn!(?level, secret_name, key, "override secret is empty, keeping computed URL");
            self.clear_override(level);
        } else {
            self.set_override(level, url);
        }
    }

    /// `https://{service}.{zone}.{origin}/{append}`
    pub fn service_base_address(&self, append: &str) -> String {
        self.resolve(UrlLevel::ServiceBase, || {
            let e = &self.endpoint;
            format!("https://{}.{}.{}/{append}", e.service_url_name, e.zone, e.access_origin)
        })
    }

    /// `{base}{version}{ns}/{append}`
    pub fn version_and_ns_url(&self, append: &str) -> String {
        self.resolve(UrlLevel::VersionAndNamespace, || {
            format!(
                "{}{}{}/{append}",
                self.service_base_address(""),
                self.endpoint.version,
                self.endpoint.ns_segment
            )
        })
    }

    /// `{base}{version}{ns}/{namespace}{append}`
    pub fn namespace_service_url(&self, append: &str) -> String {
        self.resolve(UrlLevel::NamespaceService, || {
            format!(
                "{}{}{}/{}{append}",
                self.service_base_address(""),
                self.endpoint.version,
                self.endpoint.ns_segment,
                self.endpoint.namespace
            )
        })
    }

    /// `{namespace service}/{collection}{append}`
    pub fn common_service_url(&self, target: &Target, append: &str) -> String {
        self.resolve(UrlLevel::CommonService, || {
            format!("{}/{}{append}", self.namespace_service_url(""), target.collection)
        })
    }

    /// `{common service}/{name}:{action}{append}`
    pub fn action_default_url(&self, target: &Target, append: &str) -> String {
        self.resolve(UrlLevel::ActionService, || {
            format!(
                "{}/{}:{}{append}",
                self.common_service_url(target, ""),
                target.name,
                target.action
            )
        })
    }

    fn resolve(&self, level: UrlLevel, compute: impl FnOnce() -> String) -> String {
        if let Some(full) = self.overrides.get(UrlLevel::FullService) {
            return full.to_string();
        }
        match self.overrides.get(level) {
            Some(url) => url.to_string(),
            None => compute(),
        }
    }
}
