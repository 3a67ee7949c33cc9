//! Event types for the Muster event stream
//!
//! This module defines the lifecycle vocabulary shared by watchers,
//! multiplexers and reconcilers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Kind of lifecycle change an event reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A service should be created
    Create,
    /// A service's source changed and it should be redeployed
    Update,
    /// A service should be removed
    Delete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Create => write!(f, "create"),
            EventKind::Update => write!(f, "update"),
            EventKind::Delete => write!(f, "delete"),
        }
    }
}

/// Identity of a service an event concerns.
///
/// Matching identity is `(name, version)`; an empty version means
/// "any / unversioned".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRef {
    /// Service name, e.g. "helloworld" or "micro.registry"
    pub name: String,
    /// Optional version; empty means unversioned
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Additional metadata key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ServiceRef {
    /// Creates an unversioned service reference.
    ///
    /// # Example
    /// ```
    /// use muster::event::ServiceRef;
    ///
    /// let svc = ServiceRef::new("helloworld");
    /// assert!(!svc.has_version());
    /// ```
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the version (builder pattern).
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Adds a metadata key-value pair (builder pattern).
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Whether this reference names a concrete version.
    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }

    /// Identity comparison on `(name, version)`; metadata is ignored.
    pub fn same_identity(&self, other: &ServiceRef) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_version() {
            write!(f, "{}@{}", self.name, self.version)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A lifecycle event. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Unique event identifier
    pub id: Uuid,
    /// What happened
    pub kind: EventKind,
    /// When it happened; never the zero instant
    pub timestamp: DateTime<Utc>,
    /// Which service it concerns
    pub service: ServiceRef,
}

impl Event {
    /// Creates an event stamped with the current time.
    ///
    /// # Example
    /// ```
    /// use muster::event::{Event, EventKind, ServiceRef};
    ///
    /// let ev = Event::new(EventKind::Update, ServiceRef::new("helloworld"));
    /// assert_eq!(ev.kind, EventKind::Update);
    /// assert!(ev.timestamp.timestamp() > 0);
    /// ```
    pub fn new(kind: EventKind, service: ServiceRef) -> Self {
        Self::at(kind, Utc::now(), service)
    }

    /// Creates an event with an explicit timestamp.
    pub fn at(kind: EventKind, timestamp: DateTime<Utc>, service: ServiceRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp,
            service,
        }
    }

    /// Shorthand for an `Update` event stamped now.
    pub fn update(service: ServiceRef) -> Self {
        Self::new(EventKind::Update, service)
    }

    /// Derives an event for another service, keeping kind and timestamp.
    ///
    /// The derived service takes `name`; the version is carried over from
    /// this event when present. Metadata is not carried.
    pub fn derive_for(&self, name: &str) -> Self {
        let mut service = ServiceRef::new(name);
        if self.service.has_version() {
            service.version = self.service.version.clone();
        }
        Self::at(self.kind, self.timestamp, service)
    }
}
