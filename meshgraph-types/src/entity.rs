//! Mesh entities and the directed edges between them.

use std::fmt;

/// Kind of a mesh entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    /// A running instance group identified by name and namespace.
    Workload,
    /// A stable network identity fronting one or more workloads.
    Service,
}

impl EntityKind {
    /// Display title, e.g. `"Workload"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Workload => "Workload",
            EntityKind::Service => "Service",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a mesh entity.
///
/// Two entities are the same node exactly when kind, name and namespace are
/// equal. The display form (`"Workload: web (shop)"`) doubles as the row id in
/// graph tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId {
    pub kind: EntityKind,
    pub name: String,
    pub namespace: String,
}

impl EntityId {
    /// Create an entity identity.
    pub fn new(kind: EntityKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Workload identity.
    pub fn workload(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::new(EntityKind::Workload, name, namespace)
    }

    /// Service identity.
    pub fn service(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::new(EntityKind::Service, name, namespace)
    }

    /// Whether this entity is a service.
    pub fn is_service(&self) -> bool {
        self.kind == EntityKind::Service
    }

    /// `"<name> (<namespace>)"`, used as a node subtitle.
    pub fn subtitle(&self) -> String {
        format!("{} ({})", self.name, self.namespace)
    }

    /// Row id, the display form. Names and namespaces are DNS labels, so the
    /// `": "` and `" ("` separators cannot occur inside them.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.name, self.namespace)
    }
}

/// Key of a directed edge: exactly one edge record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeKey {
    pub source: EntityId,
    pub destination: EntityId,
}

impl EdgeKey {
    /// Create an edge key.
    pub fn new(source: EntityId, destination: EntityId) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Stable string id, e.g. `"Workload: web (shop) -> Service: api (shop)"`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}
