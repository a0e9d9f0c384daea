//! Service identifiers and per-call URL targets.

use std::fmt;
use std::str::FromStr;

/// A namespaced REST service reachable through the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Crm,
    Dataproc,
    Mr,
    Mu,
    Omega,
    Psi,
    Rho,
    Sigma,
    Unification,
}

impl Service {
    pub const ALL: [Service; 9] = [
        Service::Crm,
        Service::Dataproc,
        Service::Mr,
        Service::Mu,
        Service::Omega,
        Service::Psi,
        Service::Rho,
        Service::Sigma,
        Service::Unification,
    ];

    /// Lowercase name, used as the secret key prefix and default secret name.
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Crm => "crm",
            Service::Dataproc => "dataproc",
            Service::Mr => "mr",
            Service::Mu => "mu",
            Service::Omega => "omega",
            Service::Psi => "psi",
            Service::Rho => "rho",
            Service::Sigma => "sigma",
            Service::Unification => "unification",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service: {0}")]
pub struct UnknownService(pub String);

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .into_iter()
            .find(|service| service.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownService(s.to_string()))
    }
}

/// What a single URL points at below the namespace: a resource collection,
/// optionally a named resource in it, and optionally an action on that
/// resource (`{collection}/{name}:{action}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub collection: String,
    pub name: String,
    pub action: String,
}

impl Target {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }
}
