//! Negotiated connection parameters
//!
//! A `ConnectionPolicy` is immutable once negotiated: buffering kind and
//! capacity, locking discipline, pull vs. push, initial-sample behavior, and
//! which wire transport performs the linkage. Invalid enumerated values are
//! construction-time errors, never silently-defaulted values.

use crate::error::LinkError;
use serde::{Deserialize, Serialize};

/// How a connection holds samples in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    /// Hold exactly the most recent sample
    Data,
    /// Hold up to `capacity` samples
    Buffer,
}

/// Locking discipline of the underlying sample channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPolicy {
    Locked,
    LockFree,
}

/// Identifier of a wire transport implementation
///
/// Ids are assigned by the transport plugins that populate the type
/// registry; the two well-known ones are defined here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TransportId(pub u16);

impl TransportId {
    /// The distributed-object transport, the default for remote linkage
    pub const REMOTE: TransportId = TransportId(1);
    /// Shared message-queue transport for same-host processes
    pub const MESSAGE_QUEUE: TransportId = TransportId(2);
}

impl std::fmt::Display for TransportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable negotiated parameters for one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// Buffering kind of the connection
    pub kind: BufferKind,

    /// Number of samples held when `kind` is `Buffer`; must be at least 1
    pub capacity: u32,

    /// Locking discipline, passed through to the channel implementation
    pub lock_policy: LockPolicy,

    /// Reader pulls on demand instead of the writer pushing
    pub pull: bool,

    /// Deliver a currently-held sample immediately upon connecting
    pub init_sample: bool,

    /// Wire transport performing the linkage
    pub transport: TransportId,

    /// Capacity hint in bytes for transports that preallocate wire buffers
    pub data_size_hint: u32,
}

impl ConnectionPolicy {
    /// Create a most-recent-sample policy
    pub fn data() -> Self {
        Self {
            kind: BufferKind::Data,
            capacity: 0,
            lock_policy: LockPolicy::LockFree,
            pull: false,
            init_sample: false,
            transport: TransportId::REMOTE,
            data_size_hint: 0,
        }
    }

    /// Create a buffered policy holding up to `capacity` samples
    pub fn buffer(capacity: u32) -> Result<Self, LinkError> {
        if capacity < 1 {
            return Err(LinkError::invalid_policy("size", capacity.to_string()));
        }
        Ok(Self {
            kind: BufferKind::Buffer,
            capacity,
            ..Self::data()
        })
    }

    /// Set the locking discipline
    pub fn with_lock_policy(mut self, lock_policy: LockPolicy) -> Self {
        self.lock_policy = lock_policy;
        self
    }

    /// Set pull-based reading
    pub fn with_pull(mut self, pull: bool) -> Self {
        self.pull = pull;
        self
    }

    /// Set initial-sample delivery on connect
    pub fn with_init_sample(mut self, init_sample: bool) -> Self {
        self.init_sample = init_sample;
        self
    }

    /// Select the wire transport
    pub fn with_transport(mut self, transport: TransportId) -> Self {
        self.transport = transport;
        self
    }

    /// Set the wire buffer preallocation hint
    pub fn with_data_size_hint(mut self, data_size_hint: u32) -> Self {
        self.data_size_hint = data_size_hint;
        self
    }

    /// Validate the policy invariants
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.kind == BufferKind::Buffer && self.capacity < 1 {
            return Err(LinkError::invalid_policy("size", self.capacity.to_string()));
        }
        Ok(())
    }
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self::data()
    }
}
