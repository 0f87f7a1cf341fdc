//! Transport channel factory and local endpoints
//!
//! `TransportChannels` is the process-wide service that creates and tracks
//! the local endpoint objects bridging this process into the dataflow
//! network. It is shared state with lifecycle tied to process start and
//! shutdown: teardown paths must consult `is_subsystem_live` and degrade to
//! a no-op once the subsystem is gone.

use crate::error::LinkError;
use crate::flow::FlowStatus;
use crate::port::{PortDirection, PortRef};
use bytes::Bytes;
use std::fmt::Debug;
use std::sync::Arc;

use crate::directory::PortDirectoryRef;

/// Result of one read against an input endpoint
///
/// `wire` carries the sample bytes for `NewData`, and for `OldData` only
/// when the caller asked for the old value to be re-delivered.
#[derive(Debug, Clone)]
pub struct SampleRead {
    pub status: FlowStatus,
    pub wire: Option<Bytes>,
}

impl SampleRead {
    pub fn no_data() -> Self {
        Self {
            status: FlowStatus::NoData,
            wire: None,
        }
    }

    pub fn old_data(wire: Option<Bytes>) -> Self {
        Self {
            status: FlowStatus::OldData,
            wire,
        }
    }

    pub fn new_data(wire: Bytes) -> Self {
        Self {
            status: FlowStatus::NewData,
            wire: Some(wire),
        }
    }
}

/// Local endpoint receiving samples from a remote output port
pub trait InputEndpoint: Send + Sync + Debug {
    /// Unique name of this endpoint in the local port directory
    fn local_name(&self) -> &str;

    /// Sample type carried by this endpoint
    fn data_type_name(&self) -> &str;

    /// Take the next sample, or report the old/no-data state
    fn read(&self, copy_old_data: bool) -> Result<SampleRead, LinkError>;

    /// Discard queued and remembered samples
    fn clear(&self);

    /// Whether the endpoint is part of at least one connection
    fn connected(&self) -> bool;

    /// Drop every connection of this endpoint
    fn disconnect(&self);
}

/// Local endpoint feeding samples to a remote input port
pub trait OutputEndpoint: Send + Sync + Debug {
    /// Unique name of this endpoint in the local port directory
    fn local_name(&self) -> &str;

    /// Sample type carried by this endpoint
    fn data_type_name(&self) -> &str;

    /// Write a sample; fire-and-forget under the dataflow policy
    ///
    /// Returns whether the endpoint is presently connected, not whether the
    /// specific sample was delivered.
    fn write(&self, wire: &[u8]) -> Result<bool, LinkError>;

    /// Whether the endpoint is part of at least one connection
    fn connected(&self) -> bool;

    /// Drop every connection of this endpoint
    fn disconnect(&self);
}

/// A local endpoint of either direction
#[derive(Debug, Clone)]
pub enum Endpoint {
    Input(Arc<dyn InputEndpoint>),
    Output(Arc<dyn OutputEndpoint>),
}

impl Endpoint {
    pub fn direction(&self) -> PortDirection {
        match self {
            Endpoint::Input(_) => PortDirection::Input,
            Endpoint::Output(_) => PortDirection::Output,
        }
    }

    pub fn local_name(&self) -> &str {
        match self {
            Endpoint::Input(ep) => ep.local_name(),
            Endpoint::Output(ep) => ep.local_name(),
        }
    }

    pub fn data_type_name(&self) -> &str {
        match self {
            Endpoint::Input(ep) => ep.data_type_name(),
            Endpoint::Output(ep) => ep.data_type_name(),
        }
    }

    pub fn connected(&self) -> bool {
        match self {
            Endpoint::Input(ep) => ep.connected(),
            Endpoint::Output(ep) => ep.connected(),
        }
    }

    pub fn disconnect(&self) {
        match self {
            Endpoint::Input(ep) => ep.disconnect(),
            Endpoint::Output(ep) => ep.disconnect(),
        }
    }
}

/// Process-wide transport channel factory and endpoint registry
pub trait TransportChannels: Send + Sync + Debug {
    /// Create a local input endpoint for the given sample type
    fn create_input_endpoint(
        &self,
        type_name: &str,
        local_name: &str,
    ) -> Result<Arc<dyn InputEndpoint>, LinkError>;

    /// Create a local output endpoint for the given sample type
    fn create_output_endpoint(
        &self,
        type_name: &str,
        local_name: &str,
    ) -> Result<Arc<dyn OutputEndpoint>, LinkError>;

    /// Make an endpoint visible in the local port directory
    fn register_endpoint(&self, endpoint: &Endpoint) -> Result<(), LinkError>;

    /// Remove an endpoint from the local port directory
    ///
    /// Idempotent and infallible: deregistering an unknown name, or calling
    /// after subsystem shutdown, is a no-op.
    fn deregister_endpoint(&self, local_name: &str);

    /// Whether the process-wide transport subsystem is still up
    fn is_subsystem_live(&self) -> bool;

    /// The calling process's own port directory, used when negotiating
    /// proxy connections with remote components
    fn local_directory(&self) -> PortDirectoryRef;

    /// Generate a unique local endpoint name for a proxy of the given
    /// remote port
    fn local_name_for(&self, port: &PortRef) -> String;
}
