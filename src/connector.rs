//! Connection orchestration between remote dataflow ports
//!
//! The `PortConnector` establishes, queries, and removes connections
//! between port handles, and builds the local proxy ports a client uses to
//! read or write a remote port directly. Components are re-resolved through
//! the directory on every operation: names can go stale between discovery
//! and use, and that surfaces as `NotFound` rather than a stale dereference.

use crate::channels::{Endpoint, TransportChannels};
use crate::component::RemoteComponentHandle;
use crate::directory::ComponentDirectory;
use crate::error::LinkError;
use crate::policy::ConnectionPolicy;
use crate::port::{PortDirection, PortRef};
use crate::proxy::LocalProxyPort;
use crate::registry::TypeRegistry;
use std::sync::Arc;

/// Orchestration engine for port connections
#[derive(Debug, Clone)]
pub struct PortConnector {
    directory: Arc<dyn ComponentDirectory>,
    types: Arc<TypeRegistry>,
    channels: Arc<dyn TransportChannels>,
}

impl PortConnector {
    pub fn new(
        directory: Arc<dyn ComponentDirectory>,
        types: Arc<TypeRegistry>,
        channels: Arc<dyn TransportChannels>,
    ) -> Self {
        Self {
            directory,
            types,
            channels,
        }
    }

    /// Resolve a component by name
    pub fn component(&self, name: &str) -> Result<RemoteComponentHandle, LinkError> {
        RemoteComponentHandle::resolve(self.directory.as_ref(), name)
    }

    /// Resolve a component by a direct address/locator string
    pub fn component_at(&self, locator: &str) -> Result<RemoteComponentHandle, LinkError> {
        RemoteComponentHandle::resolve_address(self.directory.as_ref(), locator)
    }

    /// Names of all currently known components
    pub fn known_components(&self) -> Result<Vec<String>, LinkError> {
        self.directory.known_components()
    }

    /// Connect an output port to an input port under the given policy
    ///
    /// Both ports must resolve to live components. All validation runs
    /// before any remote state is mutated; a refused negotiation between
    /// two valid ports is `ConnectionFailed`.
    pub fn connect(
        &self,
        output: &PortRef,
        input: &PortRef,
        policy: &ConnectionPolicy,
    ) -> Result<(), LinkError> {
        policy.validate()?;

        let out_dir = self.component(output.component())?.port_directory();
        let in_dir = self.component(input.component())?.port_directory();

        let out_type = self.check_port(&*out_dir, output, PortDirection::Output)?;
        let in_type = self.check_port(&*in_dir, input, PortDirection::Input)?;
        if out_type != in_type {
            return Err(LinkError::connection_failed(format!(
                "cannot connect {output} ({out_type}) to {input} ({in_type}): sample types differ"
            )));
        }

        // When the type is known locally, refuse an unsupported transport
        // before asking either remote end to mutate state. Unregistered
        // types are negotiated entirely by the two remote ends.
        if let Some(cap) = self.types.find(&out_type) {
            cap.resolve_transport(policy.transport)?;
        }

        if !out_dir.create_connection(output.port(), &*in_dir, input.port(), policy)? {
            return Err(LinkError::connection_failed(format!(
                "failed to connect {output} to {input}"
            )));
        }
        tracing::debug!(%output, %input, "connected ports");
        Ok(())
    }

    /// Build a local reader proxy for a remote output port
    ///
    /// Creates and registers a local input endpoint, then asks the remote
    /// output component to connect to it. Either a refused negotiation or
    /// an endpoint that never reached the connected state fails the call,
    /// and the endpoint is deregistered before the error propagates.
    pub fn create_local_reader(
        &self,
        output: &PortRef,
        type_name: &str,
        policy: &ConnectionPolicy,
    ) -> Result<LocalProxyPort, LinkError> {
        policy.validate()?;

        let remote_dir = self.component(output.component())?.port_directory();
        let remote_type = self.check_port(&*remote_dir, output, PortDirection::Output)?;
        self.check_sample_type(output, type_name, &remote_type, policy)?;

        let local_name = self.channels.local_name_for(output);
        let input = self
            .channels
            .create_input_endpoint(type_name, &local_name)?;
        let endpoint = Endpoint::Input(input);
        self.channels.register_endpoint(&endpoint)?;

        let negotiated = remote_dir
            .create_connection(
                output.port(),
                &*self.channels.local_directory(),
                &local_name,
                policy,
            )
            .map_err(|err| self.abandon_endpoint(&endpoint, err))?;
        if !negotiated || !endpoint.connected() {
            return Err(self.abandon_endpoint(
                &endpoint,
                LinkError::connection_failed(format!(
                    "failed to connect the reader proxy to {output}"
                )),
            ));
        }

        tracing::debug!(remote = %output, %local_name, "created local reader proxy");
        Ok(LocalProxyPort::new(
            output.clone(),
            endpoint,
            self.channels.clone(),
        ))
    }

    /// Build a local writer proxy for a remote input port
    ///
    /// Symmetric to `create_local_reader`: the connection is created from
    /// the local port directory to the remote input component, with the
    /// same cleanup-on-failure contract.
    pub fn create_local_writer(
        &self,
        input: &PortRef,
        type_name: &str,
        policy: &ConnectionPolicy,
    ) -> Result<LocalProxyPort, LinkError> {
        policy.validate()?;

        let remote_dir = self.component(input.component())?.port_directory();
        let remote_type = self.check_port(&*remote_dir, input, PortDirection::Input)?;
        self.check_sample_type(input, type_name, &remote_type, policy)?;

        let local_name = self.channels.local_name_for(input);
        let output = self
            .channels
            .create_output_endpoint(type_name, &local_name)?;
        let endpoint = Endpoint::Output(output);
        self.channels.register_endpoint(&endpoint)?;

        let negotiated = self
            .channels
            .local_directory()
            .create_connection(&local_name, &*remote_dir, input.port(), policy)
            .map_err(|err| self.abandon_endpoint(&endpoint, err))?;
        if !negotiated || !endpoint.connected() {
            return Err(self.abandon_endpoint(
                &endpoint,
                LinkError::connection_failed(format!(
                    "failed to connect the writer proxy to {input}"
                )),
            ));
        }

        tracing::debug!(remote = %input, %local_name, "created local writer proxy");
        Ok(LocalProxyPort::new(
            input.clone(),
            endpoint,
            self.channels.clone(),
        ))
    }

    /// Whether the port is part of at least one connection
    pub fn is_connected(&self, port: &PortRef) -> Result<bool, LinkError> {
        let dir = self.component(port.component())?.port_directory();
        dir.is_connected(port.port())
    }

    /// Drop every connection of the port
    ///
    /// Succeeds silently when the port exists but has no connections; only
    /// name-resolution failures are errors.
    pub fn disconnect_all(&self, port: &PortRef) -> Result<(), LinkError> {
        let dir = self.component(port.component())?.port_directory();
        dir.disconnect_port(port.port())?;
        tracing::debug!(%port, "disconnected all connections");
        Ok(())
    }

    /// Remove the connection between two ports, if any
    ///
    /// Returns whether a connection existed and was removed; `false` is a
    /// normal "nothing to do" outcome, not an error.
    pub fn disconnect_from(&self, a: &PortRef, b: &PortRef) -> Result<bool, LinkError> {
        let a_dir = self.component(a.component())?.port_directory();
        let b_dir = self.component(b.component())?.port_directory();

        // Both names must still resolve even when no connection exists.
        a_dir.port_kind(a.port())?;
        b_dir.port_kind(b.port())?;

        a_dir.remove_connection(a.port(), &*b_dir, b.port())
    }

    fn check_port(
        &self,
        dir: &dyn crate::directory::PortDirectory,
        port: &PortRef,
        wanted: PortDirection,
    ) -> Result<String, LinkError> {
        let kind = dir.port_kind(port.port())?;
        if kind != wanted {
            return Err(LinkError::connection_failed(format!(
                "{port} is an {kind} port, expected {wanted}"
            )));
        }
        dir.data_type_name(port.port())
    }

    fn check_sample_type(
        &self,
        port: &PortRef,
        type_name: &str,
        remote_type: &str,
        policy: &ConnectionPolicy,
    ) -> Result<(), LinkError> {
        if type_name != remote_type {
            return Err(LinkError::connection_failed(format!(
                "{port} carries {remote_type}, not {type_name}"
            )));
        }
        let cap = self.types.lookup(type_name)?;
        cap.resolve_transport(policy.transport)?;
        Ok(())
    }

    /// Reverse a proxy registration on a failed negotiation
    fn abandon_endpoint(&self, endpoint: &Endpoint, err: LinkError) -> LinkError {
        tracing::debug!(
            local_name = endpoint.local_name(),
            error = %err,
            "abandoning proxy endpoint after failed negotiation"
        );
        endpoint.disconnect();
        self.channels.deregister_endpoint(endpoint.local_name());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TransportId;
    use crate::test_utils::{test_registry, InProcessFabric, MockComponentBuilder};

    fn producer_consumer() -> (InProcessFabric, PortConnector) {
        let fabric = InProcessFabric::new();
        MockComponentBuilder::new("producer")
            .output_port("samples", "/base/RigidBodyState")
            .register(&fabric);
        MockComponentBuilder::new("consumer")
            .input_port("samples", "/base/RigidBodyState")
            .input_port("raw", "/base/JointReading")
            .register(&fabric);
        let connector = PortConnector::new(
            fabric.directory(),
            test_registry(),
            fabric.channels("client"),
        );
        (fabric, connector)
    }

    #[test]
    fn test_connect_then_query_then_disconnect_all() {
        let (_fabric, connector) = producer_consumer();
        let out = PortRef::new("producer", "samples");
        let inp = PortRef::new("consumer", "samples");

        connector.connect(&out, &inp, &ConnectionPolicy::data()).unwrap();
        assert!(connector.is_connected(&out).unwrap());
        assert!(connector.is_connected(&inp).unwrap());

        connector.disconnect_all(&out).unwrap();
        assert!(!connector.is_connected(&out).unwrap());
        assert!(!connector.is_connected(&inp).unwrap());

        // disconnecting an unconnected port is a silent success
        connector.disconnect_all(&out).unwrap();
    }

    #[test]
    fn test_disconnect_from_without_connection_is_false() {
        let (_fabric, connector) = producer_consumer();
        let out = PortRef::new("producer", "samples");
        let inp = PortRef::new("consumer", "samples");

        assert!(!connector.disconnect_from(&out, &inp).unwrap());

        connector.connect(&out, &inp, &ConnectionPolicy::data()).unwrap();
        assert!(connector.disconnect_from(&out, &inp).unwrap());
        assert!(!connector.is_connected(&out).unwrap());
        assert!(!connector.disconnect_from(&out, &inp).unwrap());
    }

    #[test]
    fn test_stale_component_name_is_not_found() {
        let (fabric, connector) = producer_consumer();
        let out = PortRef::new("producer", "samples");
        let inp = PortRef::new("consumer", "samples");

        fabric.remove_component("consumer");
        let err = connector
            .connect(&out, &inp, &ConnectionPolicy::data())
            .unwrap_err();
        assert!(err.is_not_found());

        let err = connector.is_connected(&inp).unwrap_err();
        assert!(err.is_not_found());

        let err = connector.disconnect_all(&inp).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_port_is_not_found() {
        let (_fabric, connector) = producer_consumer();
        let err = connector
            .is_connected(&PortRef::new("producer", "gps"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_connect_rejects_type_mismatch() {
        let (_fabric, connector) = producer_consumer();
        let err = connector
            .connect(
                &PortRef::new("producer", "samples"),
                &PortRef::new("consumer", "raw"),
                &ConnectionPolicy::data(),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::ConnectionFailed(_)));
    }

    #[test]
    fn test_connect_rejects_direction_mismatch() {
        let (_fabric, connector) = producer_consumer();
        // both ends are inputs
        let err = connector
            .connect(
                &PortRef::new("consumer", "samples"),
                &PortRef::new("consumer", "raw"),
                &ConnectionPolicy::data(),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::ConnectionFailed(_)));
    }

    #[test]
    fn test_connect_rejects_unsupported_transport_before_mutation() {
        let (fabric, connector) = producer_consumer();
        let out = PortRef::new("producer", "samples");
        let inp = PortRef::new("consumer", "samples");

        let err = connector
            .connect(
                &out,
                &inp,
                &ConnectionPolicy::data().with_transport(TransportId(9)),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::UnsupportedTransport { .. }));

        // strict pre-flight: no remote state was touched
        assert_eq!(fabric.connection_count(), 0);
        assert!(!connector.is_connected(&out).unwrap());
    }

    #[test]
    fn test_connect_rejects_invalid_policy_before_mutation() {
        let (fabric, connector) = producer_consumer();
        let mut policy = ConnectionPolicy::buffer(4).unwrap();
        policy.capacity = 0;

        let err = connector
            .connect(
                &PortRef::new("producer", "samples"),
                &PortRef::new("consumer", "samples"),
                &policy,
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::InvalidPolicy { .. }));
        assert_eq!(fabric.connection_count(), 0);
    }

    #[test]
    fn test_reader_requires_output_port() {
        let (_fabric, connector) = producer_consumer();
        let err = connector
            .create_local_reader(
                &PortRef::new("consumer", "samples"),
                "/base/RigidBodyState",
                &ConnectionPolicy::data(),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::ConnectionFailed(_)));
    }

    #[test]
    fn test_reader_requires_registered_type() {
        let fabric = InProcessFabric::new();
        MockComponentBuilder::new("producer")
            .output_port("samples", "/custom/Unregistered")
            .register(&fabric);
        let connector = PortConnector::new(
            fabric.directory(),
            test_registry(),
            fabric.channels("client"),
        );

        let err = connector
            .create_local_reader(
                &PortRef::new("producer", "samples"),
                "/custom/Unregistered",
                &ConnectionPolicy::data(),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::UnknownType(_)));
        assert_eq!(fabric.registered_endpoint_count("client"), 0);
    }

    #[test]
    fn test_refused_negotiation_leaves_no_registration() {
        let (fabric, connector) = producer_consumer();
        fabric
            .component("producer")
            .unwrap()
            .refuse_next_connection();

        let err = connector
            .create_local_reader(
                &PortRef::new("producer", "samples"),
                "/base/RigidBodyState",
                &ConnectionPolicy::data(),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::ConnectionFailed(_)));
        assert_eq!(fabric.registered_endpoint_count("client"), 0);
        assert_eq!(fabric.connection_count(), 0);
    }

    #[test]
    fn test_remote_fault_during_negotiation_cleans_up() {
        let (fabric, connector) = producer_consumer();
        fabric
            .component("producer")
            .unwrap()
            .fail_next_connection();

        let err = connector
            .create_local_reader(
                &PortRef::new("producer", "samples"),
                "/base/RigidBodyState",
                &ConnectionPolicy::data(),
            )
            .unwrap_err();
        assert!(matches!(err, LinkError::Remote(_)));
        assert_eq!(fabric.registered_endpoint_count("client"), 0);
    }

    #[test]
    fn test_writer_proxy_connects() {
        let (fabric, connector) = producer_consumer();
        let proxy = connector
            .create_local_writer(
                &PortRef::new("consumer", "samples"),
                "/base/RigidBodyState",
                &ConnectionPolicy::data(),
            )
            .unwrap();

        assert!(proxy.connected());
        assert_eq!(fabric.registered_endpoint_count("client"), 1);
        assert!(connector
            .is_connected(&PortRef::new("consumer", "samples"))
            .unwrap());

        proxy.disconnect();
        assert_eq!(fabric.registered_endpoint_count("client"), 0);
        assert!(!connector
            .is_connected(&PortRef::new("consumer", "samples"))
            .unwrap());
    }

    #[test]
    fn test_known_components_and_locator() {
        let (fabric, connector) = producer_consumer();
        let mut names = connector.known_components().unwrap();
        names.sort();
        assert_eq!(names, vec!["consumer", "producer"]);

        let handle = connector.component_at("inproc://producer").unwrap();
        assert_eq!(handle.name(), "producer");
        assert!(connector.component_at("inproc://ghost").unwrap_err().is_not_found());
        let _ = fabric;
    }
}
