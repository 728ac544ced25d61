//! Registry for managing named limiters.
//!
//! Client code constructs one limiter per external service up front and
//! passes handles to whichever modules need them; the registry is an
//! explicit object for that wiring, not hidden global state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::limiter::{Limiter, Status};
use tracing::warn;

/// Errors from limiter registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The requested limiter name was not found.
    NotFound {
        /// Name that could not be located.
        name: String,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotFound { name } => {
                write!(f, "limiter '{name}' not found")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Trait for limiter registries.
pub trait LimiterRegistry: Send + Sync + std::fmt::Debug {
    /// Register a limiter under its service name, overwriting any existing
    /// entry.
    ///
    /// Overwrite is deliberate: when two registrations share a name, the
    /// last one wins. Callers should normally use unique names per upstream
    /// service and treat an overwrite as a replacement.
    fn register(&self, limiter: Limiter);
    /// Get a limiter handle by service name.
    fn get(&self, name: &str) -> Option<Limiter>;
    /// Snapshot one limiter's status, erroring if missing.
    fn status(&self, name: &str) -> Result<Status, RegistryError>;
    /// Snapshot every limiter's status, sorted by name.
    fn snapshot(&self) -> Vec<Status>;
}

/// In-memory implementation backed by an RwLock.
#[derive(Default, Clone, Debug)]
pub struct InMemoryLimiterRegistry {
    inner: Arc<RwLock<HashMap<String, Limiter>>>,
}

impl LimiterRegistry for InMemoryLimiterRegistry {
    fn register(&self, limiter: Limiter) {
        let mut map = self.inner.write().expect("limiter registry poisoned");
        let name = limiter.name().to_string();
        if map.contains_key(&name) {
            warn!(target: "tollbooth::registry", name = %name, "limiter name replaced; last registration wins");
        }
        map.insert(name, limiter);
    }

    fn get(&self, name: &str) -> Option<Limiter> {
        let guard = self.inner.read().expect("limiter registry poisoned");
        guard.get(name).cloned()
    }

    fn status(&self, name: &str) -> Result<Status, RegistryError> {
        let guard = self.inner.read().expect("limiter registry poisoned");
        match guard.get(name) {
            Some(limiter) => Ok(limiter.status()),
            None => Err(RegistryError::NotFound { name: name.to_string() }),
        }
    }

    fn snapshot(&self) -> Vec<Status> {
        let map = self.inner.read().expect("limiter registry poisoned");
        let mut entries: Vec<Status> = map.values().map(Limiter::status).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}
