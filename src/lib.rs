//! Port connection and typed-data transport orchestration
//!
//! `port-link` lets a client process wire dataflow ports of
//! independently-running real-time components together, and read or write a
//! remote port directly through a local proxy, without either side knowing
//! the other's in-memory representation. It orchestrates:
//!
//! - component resolution by name or locator through an injected directory
//! - connection negotiation between an output and an input port under an
//!   immutable [`ConnectionPolicy`]
//! - typed-sample marshalling via per-type strategies (raw layout or
//!   structural marshaller)
//! - safe, idempotent teardown of local proxy endpoints, including across
//!   process shutdown
//! - component lifecycle transitions with a strict legal-transition table
//!
//! The distributed-object protocol, scheduler, and byte-level wire formats
//! are owned by the injected collaborators ([`ComponentDirectory`],
//! [`TypeRegistry`] population, [`TransportChannels`]); this crate only
//! coordinates them. All operations are synchronous and block on the
//! collaborator boundary.

pub mod channels;
pub mod component;
pub mod config;
pub mod connector;
pub mod directory;
pub mod error;
pub mod flow;
pub mod lifecycle;
pub mod policy;
pub mod port;
pub mod proxy;
pub mod registry;
pub mod test_utils;

pub use channels::{Endpoint, InputEndpoint, OutputEndpoint, SampleRead, TransportChannels};
pub use component::RemoteComponentHandle;
pub use config::PolicyConfig;
pub use connector::PortConnector;
pub use directory::{
    ComponentDirectory, ComponentRef, LifecycleControl, OperationDirectory, PortDirectory,
    PortDirectoryRef, RemoteComponent,
};
pub use error::{LinkError, NamedEntity};
pub use flow::{
    DirectCodec, FlowStatus, MarshalHandle, MarshallingStrategy, SampleCodec, StructuralCodec,
};
pub use lifecycle::{ComponentState, StateMachine, Transition};
pub use policy::{BufferKind, ConnectionPolicy, LockPolicy, TransportId};
pub use port::{PortDescriptor, PortDirection, PortRef};
pub use proxy::{InputWriter, LocalProxyPort, OutputReader};
pub use registry::{TransportHandler, TypeCapability, TypeRegistry};
