//! Key-value secret lookup used to configure service clients.
//!
//! A lookup never fails: a missing secret, missing key, or unreadable value
//! is logged and comes back as an empty string. Callers treat an empty value
//! as configuration that is simply not there.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

/// Resolves `(secret_name, key)` to a value, or `""` on any failure.
pub trait SecretSource: Send + Sync {
    fn read(&self, secret_name: &str, key: &str) -> String;
}

impl<S: SecretSource + ?Sized> SecretSource for &S {
    fn read(&self, secret_name: &str, key: &str) -> String {
        (**self).read(secret_name, key)
    }
}

impl<S: SecretSource + ?Sized> SecretSource for std::sync::Arc<S> {
    fn read(&self, secret_name: &str, key: &str) -> String {
        (**self).read(secret_name, key)
    }
}

/// Secrets held in memory, keyed by secret name then key.
#[derive(Debug, Default)]
pub struct MemorySecretSource {
    secrets: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemorySecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, secret_name: &str, key: &str, value: impl Into<String>) {
        let mut secrets = self.secrets.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        secrets
            .entry(secret_name.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn with(self, secret_name: &str, key: &str, value: impl Into<String>) -> Self {
        self.insert(secret_name, key, value);
        self
    }
}

impl SecretSource for MemorySecretSource {
    fn read(&self, secret_name: &str, key: &str) -> String {
        debug!(secret_name, key, "reading secret");
        let secrets = self.secrets.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match secrets.get(secret_name).and_then(|values| values.get(key)) {
            Some(value) => value.clone(),
            None => {
                warn!(secret_name, key, "secret key not found");
                String::new()
            }
        }
    }
}

/// Secrets mounted as files, one directory per secret and one file per key:
/// `<root>/<secret_name>/<key>`.
#[derive(Debug, Clone)]
pub struct MountedSecretSource {
    root: PathBuf,
}

impl MountedSecretSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SecretSource for MountedSecretSource {
    fn read(&self, secret_name: &str, key: &str) -> String {
        if !is_plain_component(secret_name) || !is_plain_component(key) {
            warn!(secret_name, key, "refusing secret lookup outside the mount root");
            return String::new();
        }
        let path = self.root.join(secret_name).join(key);
        debug!(path = %path.display(), "reading secret");
        match std::fs::read_to_string(&path) {
            Ok(value) => value.trim_end_matches(['\n', '\r']).to_string(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "there was an error recovering secret key value");
                String::new()
            }
        }
    }
}

fn is_plain_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}
