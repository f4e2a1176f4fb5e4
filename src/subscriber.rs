//! Informer-style subscriptions built on a watcher and a reflector cache.

use std::{fmt, sync::Arc};

use kube_core::{Resource, ResourceExt};

/// Uniquely identifies an object of a known type by namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    /// The object namespace, if any
    pub namespace: Option<String>,
    /// The object name
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    pub fn from_resource<K: Resource>(resource: &K) -> Self {
        Self {
            namespace: resource.namespace(),
            name: resource.name_any(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A change notification, delivered after the cache already reflects it.
#[derive(Debug)]
pub enum Event<K> {
    /// The object was not in the cache before.
    Added(Arc<K>),
    /// The object replaced a cached version.
    Updated { old: Arc<K>, new: Arc<K> },
    /// The object left the cache.
    Deleted {
        /// The last state of the object known to the cache.
        object: Arc<K>,
        /// Set when the deletion was inferred from a relist
        /// rather than observed as a watch event.
        final_state_unknown: bool,
    },
}

pub mod informer;
pub use informer::{Feed, Informer};
pub mod lister;
pub use lister::{Lister, LookupError};
