//! Name-addressed facade over a remote component
//!
//! A `RemoteComponentHandle` references a component, it never owns the
//! remote process: it is created by a successful directory lookup and only
//! holds the service directory references needed to talk to the component.

use crate::directory::{ComponentDirectory, ComponentRef, PortDirectoryRef};
use crate::error::LinkError;
use crate::lifecycle::{ComponentState, Transition};
use crate::port::PortDescriptor;

/// Handle to a remote component resolved through the directory
#[derive(Debug, Clone)]
pub struct RemoteComponentHandle {
    name: String,
    inner: ComponentRef,
}

impl RemoteComponentHandle {
    /// Resolve a component by name; fails with `NotFound` if no component
    /// of that name currently exists
    pub fn resolve(
        directory: &dyn ComponentDirectory,
        name: &str,
    ) -> Result<Self, LinkError> {
        let inner = directory.resolve_by_name(name)?;
        Ok(Self::from_ref(inner))
    }

    /// Resolve a component by a direct address/locator string
    pub fn resolve_address(
        directory: &dyn ComponentDirectory,
        locator: &str,
    ) -> Result<Self, LinkError> {
        let inner = directory.resolve_by_address(locator)?;
        Ok(Self::from_ref(inner))
    }

    pub(crate) fn from_ref(inner: ComponentRef) -> Self {
        Self {
            name: inner.name().to_string(),
            inner,
        }
    }

    /// Stable identifier of the component
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn port_directory(&self) -> PortDirectoryRef {
        self.inner.ports()
    }

    /// Resolve the named port into a descriptor
    pub fn port(&self, name: &str) -> Result<PortDescriptor, LinkError> {
        let ports = self.inner.ports();
        let direction = ports.port_kind(name)?;
        let data_type_name = ports.data_type_name(name)?;
        Ok(PortDescriptor::new(
            name,
            direction,
            data_type_name,
            &self.name,
        ))
    }

    /// Resolve every port of the component
    pub fn ports(&self) -> Result<Vec<PortDescriptor>, LinkError> {
        let names = self.inner.ports().port_names()?;
        names.iter().map(|name| self.port(name)).collect()
    }

    /// Whether the component has a port of the given name
    ///
    /// A `NotFound` at this check is the answer, not a failure; every other
    /// error still propagates.
    pub fn has_port(&self, name: &str) -> Result<bool, LinkError> {
        match self.inner.ports().port_kind(name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether the component has an operation of the given name
    pub fn has_operation(&self, name: &str) -> Result<bool, LinkError> {
        match self.inner.operations().operation_result_type(name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn property_names(&self) -> Result<Vec<String>, LinkError> {
        self.inner.operations().property_names()
    }

    pub fn attribute_names(&self) -> Result<Vec<String>, LinkError> {
        self.inner.operations().attribute_names()
    }

    /// Type name of the given property; `NotFound` if it does not exist
    pub fn property_type_name(&self, name: &str) -> Result<String, LinkError> {
        self.inner.operations().property_type_name(name)
    }

    /// Type name of the given attribute; `NotFound` if it does not exist
    pub fn attribute_type_name(&self, name: &str) -> Result<String, LinkError> {
        self.inner.operations().attribute_type_name(name)
    }

    /// Current lifecycle state
    pub fn state(&self) -> Result<ComponentState, LinkError> {
        self.inner.lifecycle().state()
    }

    /// PreOperational -> Stopped
    pub fn configure(&self) -> Result<(), LinkError> {
        self.transition(Transition::Configure)
    }

    /// Stopped -> Running
    pub fn start(&self) -> Result<(), LinkError> {
        self.transition(Transition::Start)
    }

    /// Running -> Stopped
    pub fn stop(&self) -> Result<(), LinkError> {
        self.transition(Transition::Stop)
    }

    /// Stopped -> PreOperational
    pub fn cleanup(&self) -> Result<(), LinkError> {
        self.transition(Transition::Cleanup)
    }

    /// Exception -> Stopped
    pub fn reset_exception(&self) -> Result<(), LinkError> {
        self.transition(Transition::ResetException)
    }

    fn transition(&self, transition: Transition) -> Result<(), LinkError> {
        if self.inner.lifecycle().request(transition)? {
            tracing::debug!(component = %self.name, %transition, "transition accepted");
            Ok(())
        } else {
            Err(LinkError::StateTransitionFailed {
                component: self.name.clone(),
                transition,
            })
        }
    }

    /// Whether two handles denote the same remote component
    pub fn is_same(&self, other: &RemoteComponentHandle) -> bool {
        self.inner.is_same(other.inner.as_ref())
    }
}

impl PartialEq for RemoteComponentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}
