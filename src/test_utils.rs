//! In-process fakes of the collaborator services
//!
//! `InProcessFabric` plays all three external roles at once: component
//! directory, per-component port/operation directories, and transport
//! channel factory. Sample channels honor the negotiated policy (Data slot
//! vs. bounded Buffer queue, initial-sample delivery, fire-and-forget
//! drops), so connector and proxy behavior can be exercised end to end
//! without a remote object layer.
//!
//! Failure injection is one-shot: the `*_next_*` methods arm a fault that
//! the next matching call consumes.

use crate::channels::{
    Endpoint, InputEndpoint, OutputEndpoint, SampleRead, TransportChannels,
};
use crate::directory::{
    ComponentDirectory, ComponentRef, LifecycleControl, OperationDirectory, PortDirectory,
    PortDirectoryRef,
};
use crate::error::{LinkError, NamedEntity};
use crate::lifecycle::{ComponentState, StateMachine, Transition};
use crate::policy::{BufferKind, ConnectionPolicy, TransportId};
use crate::port::{PortDirection, PortRef};
use crate::registry::{TransportHandler, TypeCapability, TypeRegistry};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Structural-marshaller sample type used throughout the tests
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RigidBodyState {
    pub frame: String,
    pub position: [f64; 3],
    pub valid: bool,
}

/// Direct-strategy sample type with a stable binary layout
#[derive(Debug, Clone, Copy, PartialEq, Default, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct JointReading {
    pub position: f64,
    pub velocity: f64,
    pub effort: f64,
}

/// Transport handler with fixed answers, for registry population
#[derive(Debug)]
pub struct StaticTransportHandler {
    id: TransportId,
    size_hint: Option<usize>,
}

impl StaticTransportHandler {
    pub fn new(id: TransportId) -> Arc<Self> {
        Arc::new(Self {
            id,
            size_hint: None,
        })
    }

    pub fn with_size_hint(id: TransportId, size_hint: usize) -> Arc<Self> {
        Arc::new(Self {
            id,
            size_hint: Some(size_hint),
        })
    }
}

impl TransportHandler for StaticTransportHandler {
    fn transport_id(&self) -> TransportId {
        self.id
    }

    fn sample_size_hint(&self) -> Option<usize> {
        self.size_hint
    }
}

/// Registry pre-populated with the test sample types
pub fn test_registry() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::new();
    registry.register(
        TypeCapability::new("/base/RigidBodyState")
            .with_handler(StaticTransportHandler::new(TransportId::REMOTE))
            .with_structural_marshalling("/base/RigidBodyState_m"),
    );
    registry.register(
        TypeCapability::new("/base/JointReading")
            .with_handler(StaticTransportHandler::new(TransportId::REMOTE))
            .with_handler(StaticTransportHandler::with_size_hint(
                TransportId::MESSAGE_QUEUE,
                std::mem::size_of::<JointReading>(),
            )),
    );
    registry.register(
        TypeCapability::new("/base/IMUSensors")
            .with_handler(StaticTransportHandler::new(TransportId::REMOTE))
            .with_structural_marshalling("/base/IMUSensors_m"),
    );
    Arc::new(registry)
}

#[derive(Debug)]
struct PortSlot {
    direction: PortDirection,
    type_name: String,
    /// Last sample this output produced, for initial-sample delivery
    last_written: Mutex<Option<Bytes>>,
    /// Samples delivered to this input, for test inspection
    received: Mutex<Vec<Bytes>>,
}

impl PortSlot {
    fn new(direction: PortDirection, type_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            direction,
            type_name: type_name.into(),
            last_written: Mutex::new(None),
            received: Mutex::new(Vec::new()),
        })
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    is_client: bool,
    ports: RwLock<HashMap<String, Arc<PortSlot>>>,
    /// Input port -> output port forwarding, for echo components
    forwards: HashMap<String, String>,
    operations: HashMap<String, String>,
    properties: HashMap<String, String>,
    attributes: HashMap<String, String>,
    lifecycle: Mutex<StateMachine>,
    unreachable: AtomicBool,
    veto_transition: AtomicBool,
    refuse_connection: AtomicBool,
    fail_connection: AtomicBool,
}

impl Node {
    fn check_reachable(&self) -> Result<(), LinkError> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(LinkError::remote(format!(
                "component '{}' is not reachable",
                self.name
            )));
        }
        Ok(())
    }

    fn slot(&self, port: &str) -> Result<Arc<PortSlot>, LinkError> {
        self.ports
            .read()
            .get(port)
            .cloned()
            .ok_or_else(|| LinkError::port_not_found(format!("{}.{}", self.name, port)))
    }
}

#[derive(Debug)]
struct ChannelState {
    queue: VecDeque<Bytes>,
    last: Option<Bytes>,
}

#[derive(Debug)]
struct Connection {
    from: (String, String),
    to: (String, String),
    policy: ConnectionPolicy,
    state: Mutex<ChannelState>,
}

impl Connection {
    fn push(&self, wire: Bytes) {
        let mut state = self.state.lock();
        match self.policy.kind {
            BufferKind::Data => {
                state.queue.clear();
                state.queue.push_back(wire);
            }
            BufferKind::Buffer => {
                if state.queue.len() >= self.policy.capacity as usize {
                    // full buffer drops the oldest sample, fire-and-forget
                    state.queue.pop_front();
                }
                state.queue.push_back(wire);
            }
        }
    }

    fn touches(&self, node: &str, port: &str) -> bool {
        (self.from.0 == node && self.from.1 == port) || (self.to.0 == node && self.to.1 == port)
    }
}

#[derive(Debug, Default)]
struct FabricInner {
    nodes: RwLock<HashMap<String, Arc<Node>>>,
    connections: RwLock<Vec<Arc<Connection>>>,
    proxy_counter: AtomicU64,
    shut_down: AtomicBool,
}

/// Shared in-process stand-in for the distributed-object layer
#[derive(Debug, Clone, Default)]
pub struct InProcessFabric {
    inner: Arc<FabricInner>,
}

impl InProcessFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// This fabric as an injectable component directory
    pub fn directory(&self) -> Arc<dyn ComponentDirectory> {
        Arc::new(self.clone())
    }

    /// Transport channel factory for a client process of the given name
    pub fn channels(&self, client_name: &str) -> Arc<dyn TransportChannels> {
        self.inner.nodes.write().insert(
            client_name.to_string(),
            Arc::new(Node {
                name: client_name.to_string(),
                is_client: true,
                ports: RwLock::new(HashMap::new()),
                forwards: HashMap::new(),
                operations: HashMap::new(),
                properties: HashMap::new(),
                attributes: HashMap::new(),
                lifecycle: Mutex::new(StateMachine::new()),
                unreachable: AtomicBool::new(false),
                veto_transition: AtomicBool::new(false),
                refuse_connection: AtomicBool::new(false),
                fail_connection: AtomicBool::new(false),
            }),
        );
        Arc::new(FabricChannels {
            fabric: self.clone(),
            node: client_name.to_string(),
        })
    }

    /// Handle to a registered mock component, for failure injection
    pub fn component(&self, name: &str) -> Option<MockComponentHandle> {
        let node = self.inner.nodes.read().get(name).cloned()?;
        if node.is_client {
            return None;
        }
        Some(MockComponentHandle {
            fabric: self.clone(),
            node,
        })
    }

    /// Drop a component, simulating a name that went stale
    pub fn remove_component(&self, name: &str) {
        self.inner.nodes.write().remove(name);
        self.inner
            .connections
            .write()
            .retain(|conn| conn.from.0 != name && conn.to.0 != name);
    }

    /// Simulate process-wide transport subsystem shutdown
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::Release);
    }

    /// Number of live connections across the fabric
    pub fn connection_count(&self) -> usize {
        self.inner.connections.read().len()
    }

    /// Number of endpoints currently registered by a client
    pub fn registered_endpoint_count(&self, client_name: &str) -> usize {
        self.inner
            .nodes
            .read()
            .get(client_name)
            .map(|node| node.ports.read().len())
            .unwrap_or(0)
    }

    fn node(&self, name: &str) -> Result<Arc<Node>, LinkError> {
        self.inner
            .nodes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LinkError::component_not_found(name))
    }

    fn connections_snapshot(&self) -> Vec<Arc<Connection>> {
        self.inner.connections.read().clone()
    }

    fn create_connection(
        &self,
        out_node: &str,
        out_port: &str,
        in_node: &str,
        in_port: &str,
        policy: &ConnectionPolicy,
    ) -> Result<bool, LinkError> {
        let from = self.node(out_node)?;
        let out_slot = from.slot(out_port)?;
        if out_slot.direction != PortDirection::Output {
            return Ok(false);
        }

        let Ok(to) = self.node(in_node) else {
            return Ok(false);
        };
        let Ok(in_slot) = to.slot(in_port) else {
            return Ok(false);
        };
        if in_slot.direction != PortDirection::Input {
            return Ok(false);
        }

        let connection = Arc::new(Connection {
            from: (out_node.to_string(), out_port.to_string()),
            to: (in_node.to_string(), in_port.to_string()),
            policy: policy.clone(),
            state: Mutex::new(ChannelState {
                queue: VecDeque::new(),
                last: None,
            }),
        });
        if policy.init_sample {
            if let Some(last) = out_slot.last_written.lock().clone() {
                connection.push(last);
            }
        }
        self.inner.connections.write().push(connection);
        Ok(true)
    }

    /// Deliver a sample from an output port into every connection it feeds
    fn deliver(&self, out_node: &str, out_port: &str, wire: &Bytes) {
        let targets: Vec<Arc<Connection>> = self
            .connections_snapshot()
            .into_iter()
            .filter(|conn| conn.from.0 == out_node && conn.from.1 == out_port)
            .collect();

        for conn in targets {
            conn.push(wire.clone());

            let Ok(node) = self.node(&conn.to.0) else {
                continue;
            };
            if let Ok(slot) = node.slot(&conn.to.1) {
                slot.received.lock().push(wire.clone());
            }
            if let Some(forward_out) = node.forwards.get(&conn.to.1).cloned() {
                self.write_output(&conn.to.0, &forward_out, wire.clone());
            }
        }
    }

    /// A component (or local output endpoint) producing a sample
    fn write_output(&self, node: &str, port: &str, wire: Bytes) -> bool {
        let Ok(node_ref) = self.node(node) else {
            return false;
        };
        let Ok(slot) = node_ref.slot(port) else {
            return false;
        };
        *slot.last_written.lock() = Some(wire.clone());
        self.deliver(node, port, &wire);
        self.has_connection(node, port)
    }

    fn read_for(&self, node: &str, port: &str, copy_old_data: bool) -> SampleRead {
        let incoming: Vec<Arc<Connection>> = self
            .connections_snapshot()
            .into_iter()
            .filter(|conn| conn.to.0 == node && conn.to.1 == port)
            .collect();

        for conn in &incoming {
            let mut state = conn.state.lock();
            if let Some(wire) = state.queue.pop_front() {
                state.last = Some(wire.clone());
                return SampleRead::new_data(wire);
            }
        }
        for conn in &incoming {
            let state = conn.state.lock();
            if let Some(last) = &state.last {
                return SampleRead::old_data(copy_old_data.then(|| last.clone()));
            }
        }
        SampleRead::no_data()
    }

    fn clear_for(&self, node: &str, port: &str) {
        for conn in self.connections_snapshot() {
            if conn.to.0 == node && conn.to.1 == port {
                let mut state = conn.state.lock();
                state.queue.clear();
                state.last = None;
            }
        }
    }

    fn has_connection(&self, node: &str, port: &str) -> bool {
        self.inner
            .connections
            .read()
            .iter()
            .any(|conn| conn.touches(node, port))
    }

    fn drop_connections(&self, node: &str, port: &str) {
        self.inner
            .connections
            .write()
            .retain(|conn| !conn.touches(node, port));
    }

    fn remove_connection(
        &self,
        a_node: &str,
        a_port: &str,
        b_node: &str,
        b_port: &str,
    ) -> bool {
        let mut connections = self.inner.connections.write();
        let before = connections.len();
        connections.retain(|conn| {
            !((conn.from.0 == a_node
                && conn.from.1 == a_port
                && conn.to.0 == b_node
                && conn.to.1 == b_port)
                || (conn.from.0 == b_node
                    && conn.from.1 == b_port
                    && conn.to.0 == a_node
                    && conn.to.1 == a_port))
        });
        connections.len() != before
    }
}

impl ComponentDirectory for InProcessFabric {
    fn resolve_by_name(&self, name: &str) -> Result<ComponentRef, LinkError> {
        let node = self.node(name)?;
        if node.is_client {
            return Err(LinkError::component_not_found(name));
        }
        Ok(Arc::new(MockRemote {
            fabric: self.clone(),
            node,
        }))
    }

    fn resolve_by_address(&self, locator: &str) -> Result<ComponentRef, LinkError> {
        match locator.strip_prefix("inproc://") {
            Some(name) => self.resolve_by_name(name),
            None => Err(LinkError::not_found(NamedEntity::Component, locator)),
        }
    }

    fn known_components(&self) -> Result<Vec<String>, LinkError> {
        Ok(self
            .inner
            .nodes
            .read()
            .values()
            .filter(|node| !node.is_client)
            .map(|node| node.name.clone())
            .collect())
    }
}

/// Builder for mock components
#[derive(Debug)]
pub struct MockComponentBuilder {
    name: String,
    ports: Vec<(String, PortDirection, String)>,
    forwards: HashMap<String, String>,
    operations: HashMap<String, String>,
    properties: HashMap<String, String>,
    attributes: HashMap<String, String>,
}

impl MockComponentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            forwards: HashMap::new(),
            operations: HashMap::new(),
            properties: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn output_port(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.ports
            .push((name.into(), PortDirection::Output, type_name.into()));
        self
    }

    pub fn input_port(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.ports
            .push((name.into(), PortDirection::Input, type_name.into()));
        self
    }

    /// Forward every sample arriving on `input` out through `output`
    pub fn forward(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.forwards.insert(input.into(), output.into());
        self
    }

    pub fn operation(mut self, name: impl Into<String>, result_type: impl Into<String>) -> Self {
        self.operations.insert(name.into(), result_type.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.insert(name.into(), type_name.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), type_name.into());
        self
    }

    pub fn register(self, fabric: &InProcessFabric) -> MockComponentHandle {
        let ports = self
            .ports
            .into_iter()
            .map(|(name, direction, type_name)| (name, PortSlot::new(direction, type_name)))
            .collect();
        let node = Arc::new(Node {
            name: self.name.clone(),
            is_client: false,
            ports: RwLock::new(ports),
            forwards: self.forwards,
            operations: self.operations,
            properties: self.properties,
            attributes: self.attributes,
            lifecycle: Mutex::new(StateMachine::new()),
            unreachable: AtomicBool::new(false),
            veto_transition: AtomicBool::new(false),
            refuse_connection: AtomicBool::new(false),
            fail_connection: AtomicBool::new(false),
        });
        fabric
            .inner
            .nodes
            .write()
            .insert(self.name, node.clone());
        MockComponentHandle {
            fabric: fabric.clone(),
            node,
        }
    }
}

/// Test-side control surface of a registered mock component
#[derive(Debug, Clone)]
pub struct MockComponentHandle {
    fabric: InProcessFabric,
    node: Arc<Node>,
}

impl MockComponentHandle {
    /// Make every remote call against this component fail
    pub fn set_unreachable(&self, unreachable: bool) {
        self.node.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Reject the next lifecycle transition request
    pub fn veto_next_transition(&self) {
        self.node.veto_transition.store(true, Ordering::Relaxed);
    }

    /// Refuse the next connection negotiation (verdict `false`)
    pub fn refuse_next_connection(&self) {
        self.node.refuse_connection.store(true, Ordering::Relaxed);
    }

    /// Fail the next connection negotiation with a remote fault
    pub fn fail_next_connection(&self) {
        self.node.fail_connection.store(true, Ordering::Relaxed);
    }

    /// Produce a sample on one of the component's output ports
    pub fn write_output(&self, port: &str, wire: &[u8]) -> bool {
        self.fabric
            .write_output(&self.node.name, port, Bytes::copy_from_slice(wire))
    }

    /// Samples delivered to one of the component's input ports
    pub fn received(&self, port: &str) -> Vec<Bytes> {
        self.node
            .slot(port)
            .map(|slot| slot.received.lock().clone())
            .unwrap_or_default()
    }

    /// Current lifecycle state of the mock's own machine
    pub fn state(&self) -> ComponentState {
        self.node.lifecycle.lock().state()
    }

    /// Push the mock into an error state
    pub fn force_state(&self, state: ComponentState) {
        self.node.lifecycle.lock().force(state);
    }
}

#[derive(Debug)]
struct MockRemote {
    fabric: InProcessFabric,
    node: Arc<Node>,
}

impl crate::directory::RemoteComponent for MockRemote {
    fn name(&self) -> &str {
        &self.node.name
    }

    fn ports(&self) -> PortDirectoryRef {
        Arc::new(NodeDirectory {
            fabric: self.fabric.clone(),
            node: self.node.clone(),
        })
    }

    fn operations(&self) -> Arc<dyn OperationDirectory> {
        Arc::new(NodeOperations {
            node: self.node.clone(),
        })
    }

    fn lifecycle(&self) -> Arc<dyn LifecycleControl> {
        Arc::new(NodeLifecycle {
            node: self.node.clone(),
        })
    }
}

/// Port directory of one fabric node, mock component or client process
#[derive(Debug)]
struct NodeDirectory {
    fabric: InProcessFabric,
    node: Arc<Node>,
}

impl PortDirectory for NodeDirectory {
    fn component_name(&self) -> &str {
        &self.node.name
    }

    fn port_kind(&self, name: &str) -> Result<PortDirection, LinkError> {
        self.node.check_reachable()?;
        Ok(self.node.slot(name)?.direction)
    }

    fn data_type_name(&self, name: &str) -> Result<String, LinkError> {
        self.node.check_reachable()?;
        Ok(self.node.slot(name)?.type_name.clone())
    }

    fn port_names(&self) -> Result<Vec<String>, LinkError> {
        self.node.check_reachable()?;
        Ok(self.node.ports.read().keys().cloned().collect())
    }

    fn create_connection(
        &self,
        output_name: &str,
        input_dir: &dyn PortDirectory,
        input_name: &str,
        policy: &ConnectionPolicy,
    ) -> Result<bool, LinkError> {
        self.node.check_reachable()?;
        self.node.slot(output_name)?;
        if self.node.fail_connection.swap(false, Ordering::Relaxed) {
            return Err(LinkError::remote("connection negotiation aborted"));
        }
        if self.node.refuse_connection.swap(false, Ordering::Relaxed) {
            return Ok(false);
        }
        if let Some(target) = self.fabric.inner.nodes.read().get(input_dir.component_name()) {
            if target.fail_connection.swap(false, Ordering::Relaxed) {
                return Err(LinkError::remote("connection negotiation aborted"));
            }
            if target.refuse_connection.swap(false, Ordering::Relaxed) {
                return Ok(false);
            }
        }
        self.fabric.create_connection(
            &self.node.name,
            output_name,
            input_dir.component_name(),
            input_name,
            policy,
        )
    }

    fn remove_connection(
        &self,
        name: &str,
        other_dir: &dyn PortDirectory,
        other_name: &str,
    ) -> Result<bool, LinkError> {
        self.node.check_reachable()?;
        self.node.slot(name)?;
        Ok(self.fabric.remove_connection(
            &self.node.name,
            name,
            other_dir.component_name(),
            other_name,
        ))
    }

    fn disconnect_port(&self, name: &str) -> Result<(), LinkError> {
        self.node.check_reachable()?;
        self.node.slot(name)?;
        self.fabric.drop_connections(&self.node.name, name);
        Ok(())
    }

    fn is_connected(&self, name: &str) -> Result<bool, LinkError> {
        self.node.check_reachable()?;
        self.node.slot(name)?;
        Ok(self.fabric.has_connection(&self.node.name, name))
    }
}

#[derive(Debug)]
struct NodeOperations {
    node: Arc<Node>,
}

impl NodeOperations {
    fn lookup(
        &self,
        table: &HashMap<String, String>,
        kind: NamedEntity,
        name: &str,
    ) -> Result<String, LinkError> {
        self.node.check_reachable()?;
        table
            .get(name)
            .cloned()
            .ok_or_else(|| LinkError::not_found(kind, name))
    }
}

impl OperationDirectory for NodeOperations {
    fn operation_result_type(&self, name: &str) -> Result<String, LinkError> {
        self.lookup(&self.node.operations, NamedEntity::Operation, name)
    }

    fn property_names(&self) -> Result<Vec<String>, LinkError> {
        self.node.check_reachable()?;
        Ok(self.node.properties.keys().cloned().collect())
    }

    fn attribute_names(&self) -> Result<Vec<String>, LinkError> {
        self.node.check_reachable()?;
        Ok(self.node.attributes.keys().cloned().collect())
    }

    fn property_type_name(&self, name: &str) -> Result<String, LinkError> {
        self.lookup(&self.node.properties, NamedEntity::Property, name)
    }

    fn attribute_type_name(&self, name: &str) -> Result<String, LinkError> {
        self.lookup(&self.node.attributes, NamedEntity::Attribute, name)
    }
}

#[derive(Debug)]
struct NodeLifecycle {
    node: Arc<Node>,
}

impl LifecycleControl for NodeLifecycle {
    fn state(&self) -> Result<ComponentState, LinkError> {
        self.node.check_reachable()?;
        Ok(self.node.lifecycle.lock().state())
    }

    fn request(&self, transition: Transition) -> Result<bool, LinkError> {
        self.node.check_reachable()?;
        if self.node.veto_transition.swap(false, Ordering::Relaxed) {
            return Ok(false);
        }
        Ok(self.node.lifecycle.lock().apply(transition))
    }
}

/// Transport channel factory backed by the fabric
#[derive(Debug)]
struct FabricChannels {
    fabric: InProcessFabric,
    node: String,
}

impl TransportChannels for FabricChannels {
    fn create_input_endpoint(
        &self,
        type_name: &str,
        local_name: &str,
    ) -> Result<Arc<dyn InputEndpoint>, LinkError> {
        Ok(Arc::new(FabricEndpoint {
            fabric: self.fabric.clone(),
            node: self.node.clone(),
            name: local_name.to_string(),
            type_name: type_name.to_string(),
            direction: PortDirection::Input,
        }))
    }

    fn create_output_endpoint(
        &self,
        type_name: &str,
        local_name: &str,
    ) -> Result<Arc<dyn OutputEndpoint>, LinkError> {
        Ok(Arc::new(FabricEndpoint {
            fabric: self.fabric.clone(),
            node: self.node.clone(),
            name: local_name.to_string(),
            type_name: type_name.to_string(),
            direction: PortDirection::Output,
        }))
    }

    fn register_endpoint(&self, endpoint: &Endpoint) -> Result<(), LinkError> {
        if !self.is_subsystem_live() {
            return Err(LinkError::remote("transport subsystem is shut down"));
        }
        let node = self.fabric.node(&self.node)?;
        node.ports.write().insert(
            endpoint.local_name().to_string(),
            PortSlot::new(endpoint.direction(), endpoint.data_type_name()),
        );
        Ok(())
    }

    fn deregister_endpoint(&self, local_name: &str) {
        if !self.is_subsystem_live() {
            return;
        }
        if let Ok(node) = self.fabric.node(&self.node) {
            node.ports.write().remove(local_name);
        }
        self.fabric.drop_connections(&self.node, local_name);
    }

    fn is_subsystem_live(&self) -> bool {
        !self.fabric.inner.shut_down.load(Ordering::Acquire)
    }

    fn local_directory(&self) -> PortDirectoryRef {
        let node = self
            .fabric
            .node(&self.node)
            .expect("client node registered at channel creation");
        Arc::new(NodeDirectory {
            fabric: self.fabric.clone(),
            node,
        })
    }

    fn local_name_for(&self, port: &PortRef) -> String {
        let id = self.fabric.inner.proxy_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}.{}.{}.{}", self.node, port.component(), port.port(), id)
    }
}

/// Local endpoint of either direction, backed by fabric channels
#[derive(Debug)]
struct FabricEndpoint {
    fabric: InProcessFabric,
    node: String,
    name: String,
    type_name: String,
    direction: PortDirection,
}

impl InputEndpoint for FabricEndpoint {
    fn local_name(&self) -> &str {
        &self.name
    }

    fn data_type_name(&self) -> &str {
        &self.type_name
    }

    fn read(&self, copy_old_data: bool) -> Result<SampleRead, LinkError> {
        debug_assert_eq!(self.direction, PortDirection::Input);
        Ok(self.fabric.read_for(&self.node, &self.name, copy_old_data))
    }

    fn clear(&self) {
        self.fabric.clear_for(&self.node, &self.name);
    }

    fn connected(&self) -> bool {
        self.fabric.has_connection(&self.node, &self.name)
    }

    fn disconnect(&self) {
        self.fabric.drop_connections(&self.node, &self.name);
    }
}

impl OutputEndpoint for FabricEndpoint {
    fn local_name(&self) -> &str {
        &self.name
    }

    fn data_type_name(&self) -> &str {
        &self.type_name
    }

    fn write(&self, wire: &[u8]) -> Result<bool, LinkError> {
        debug_assert_eq!(self.direction, PortDirection::Output);
        Ok(self
            .fabric
            .write_output(&self.node, &self.name, Bytes::copy_from_slice(wire)))
    }

    fn connected(&self) -> bool {
        self.fabric.has_connection(&self.node, &self.name)
    }

    fn disconnect(&self) {
        self.fabric.drop_connections(&self.node, &self.name);
    }
}
