//! Collaborator interfaces the core consumes
//!
//! The core's boundary is this API surface, not a wire format: name lookup,
//! per-component port/operation directories, and lifecycle control are all
//! provided by an external distributed-object layer. Calls are blocking;
//! RPC-layer faults surface as `LinkError::Remote`.

use crate::error::LinkError;
use crate::lifecycle::{ComponentState, Transition};
use crate::policy::ConnectionPolicy;
use crate::port::PortDirection;
use std::fmt::Debug;
use std::sync::Arc;

pub type ComponentRef = Arc<dyn RemoteComponent>;
pub type PortDirectoryRef = Arc<dyn PortDirectory>;

/// Name and locator resolution for remote components
pub trait ComponentDirectory: Send + Sync + Debug {
    /// Resolve a component by its registered name
    fn resolve_by_name(&self, name: &str) -> Result<ComponentRef, LinkError>;

    /// Resolve a component by a direct address/locator string
    fn resolve_by_address(&self, locator: &str) -> Result<ComponentRef, LinkError>;

    /// Names of all currently known components
    fn known_components(&self) -> Result<Vec<String>, LinkError>;
}

/// A live remote component, reachable through its service directories
pub trait RemoteComponent: Send + Sync + Debug {
    /// Stable identifier of the component
    fn name(&self) -> &str;

    /// The component's dataflow port directory
    fn ports(&self) -> PortDirectoryRef;

    /// The component's operation/property/attribute directory
    fn operations(&self) -> Arc<dyn OperationDirectory>;

    /// The component's lifecycle control surface
    fn lifecycle(&self) -> Arc<dyn LifecycleControl>;

    /// Whether two references denote the same remote object
    fn is_same(&self, other: &dyn RemoteComponent) -> bool {
        self.name() == other.name()
    }
}

/// Per-component dataflow port directory
///
/// `create_connection` and `remove_connection` take the counterpart
/// directory so one end can negotiate on behalf of both.
pub trait PortDirectory: Send + Sync + Debug {
    /// Name of the component this directory belongs to
    fn component_name(&self) -> &str;

    /// Direction of the named port; `NotFound` if it does not exist
    fn port_kind(&self, name: &str) -> Result<PortDirection, LinkError>;

    /// Registered sample type of the named port
    fn data_type_name(&self, name: &str) -> Result<String, LinkError>;

    /// Names of all ports of this component
    fn port_names(&self) -> Result<Vec<String>, LinkError>;

    /// Connect this directory's output port to an input port of `input_dir`
    ///
    /// Returns the negotiation verdict; `false` means the directory refused
    /// (capacity/transport mismatch) even though both ports exist.
    fn create_connection(
        &self,
        output_name: &str,
        input_dir: &dyn PortDirectory,
        input_name: &str,
        policy: &ConnectionPolicy,
    ) -> Result<bool, LinkError>;

    /// Remove the connection between two ports, if any
    ///
    /// Returns whether a connection existed and was removed.
    fn remove_connection(
        &self,
        name: &str,
        other_dir: &dyn PortDirectory,
        other_name: &str,
    ) -> Result<bool, LinkError>;

    /// Drop every connection of the named port; silent if there are none
    fn disconnect_port(&self, name: &str) -> Result<(), LinkError>;

    /// Whether the named port is part of at least one connection
    fn is_connected(&self, name: &str) -> Result<bool, LinkError>;
}

/// Per-component operation, property and attribute directory
pub trait OperationDirectory: Send + Sync + Debug {
    /// Result type of the named operation; `NotFound` if it does not exist
    fn operation_result_type(&self, name: &str) -> Result<String, LinkError>;

    fn property_names(&self) -> Result<Vec<String>, LinkError>;

    fn attribute_names(&self) -> Result<Vec<String>, LinkError>;

    /// Type name of the named property; `NotFound` if it does not exist
    fn property_type_name(&self, name: &str) -> Result<String, LinkError>;

    /// Type name of the named attribute; `NotFound` if it does not exist
    fn attribute_type_name(&self, name: &str) -> Result<String, LinkError>;
}

/// Lifecycle control surface of a remote component
pub trait LifecycleControl: Send + Sync + Debug {
    /// Current lifecycle state; side-effect-free
    fn state(&self) -> Result<ComponentState, LinkError>;

    /// Request a transition; `false` means the component rejected it
    fn request(&self, transition: Transition) -> Result<bool, LinkError>;
}
