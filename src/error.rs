//! Error taxonomy for connection orchestration
//!
//! Every failure kind a caller can meaningfully react to gets its own
//! variant; remote faults are never collapsed into booleans. The one
//! exception is existence checks (`has_port`, `has_operation`), which
//! convert a `NotFound` at that specific check into `false`.

use crate::lifecycle::Transition;
use crate::policy::TransportId;

/// Kind of named entity that failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedEntity {
    Component,
    Port,
    Operation,
    Property,
    Attribute,
}

impl NamedEntity {
    /// Get human-readable name for error messages
    pub fn name(self) -> &'static str {
        match self {
            NamedEntity::Component => "component",
            NamedEntity::Port => "port",
            NamedEntity::Operation => "operation",
            NamedEntity::Property => "property",
            NamedEntity::Attribute => "attribute",
        }
    }
}

impl std::fmt::Display for NamedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LinkError {
    #[error("no such {kind} '{name}'")]
    NotFound { kind: NamedEntity, name: String },

    #[error("invalid connection policy: {field} = {value}")]
    InvalidPolicy { field: &'static str, value: String },

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("component '{component}' rejected transition '{transition}'")]
    StateTransitionFailed {
        component: String,
        transition: Transition,
    },

    #[error("type '{0}' is not registered in the type registry")]
    UnknownType(String),

    #[error("type '{type_name}' has no handler for transport {transport}")]
    UnsupportedTransport {
        type_name: String,
        transport: TransportId,
    },

    #[error("remote communication failure: {0}")]
    Remote(String),
}

impl LinkError {
    /// Create a not-found error for a component name
    pub fn component_not_found(name: impl Into<String>) -> Self {
        LinkError::NotFound {
            kind: NamedEntity::Component,
            name: name.into(),
        }
    }

    /// Create a not-found error for a port name
    pub fn port_not_found(name: impl Into<String>) -> Self {
        LinkError::NotFound {
            kind: NamedEntity::Port,
            name: name.into(),
        }
    }

    /// Create a not-found error for an arbitrary named entity
    pub fn not_found(kind: NamedEntity, name: impl Into<String>) -> Self {
        LinkError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an invalid policy error carrying the offending field and value
    pub fn invalid_policy(field: &'static str, value: impl Into<String>) -> Self {
        LinkError::InvalidPolicy {
            field,
            value: value.into(),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        LinkError::ConnectionFailed(msg.into())
    }

    /// Create a remote communication failure
    pub fn remote(msg: impl Into<String>) -> Self {
        LinkError::Remote(msg.into())
    }

    /// Create a remote failure for a marshalling fault at the transport layer
    pub fn marshal(msg: impl Into<String>) -> Self {
        LinkError::Remote(format!("marshalling fault: {}", msg.into()))
    }

    /// Check if this is a name-resolution failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, LinkError::NotFound { .. })
    }

    /// Check if this is a type-registry lookup failure
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            LinkError::UnknownType(_) | LinkError::UnsupportedTransport { .. }
        )
    }

    /// Check if retrying the operation can plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LinkError::Remote(_) | LinkError::ConnectionFailed(_))
    }
}
