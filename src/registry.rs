//! Type registry and per-type transport capabilities
//!
//! Maps a type name to its capability descriptor: which wire transports it
//! has handlers for, and whether it must be encoded through the structural
//! marshaller. Populated once at startup by an external plugin-loading
//! mechanism, looked up many times afterwards.

use crate::error::LinkError;
use crate::flow::MarshallingStrategy;
use crate::policy::TransportId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Handler a transport plugin registered for one (type, transport) pair
pub trait TransportHandler: Send + Sync + Debug {
    /// Wire transport this handler implements
    fn transport_id(&self) -> TransportId;

    /// Fixed wire size, for transports that preallocate sample buffers
    fn sample_size_hint(&self) -> Option<usize> {
        None
    }
}

/// Capability descriptor of one registered type
///
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct TypeCapability {
    type_name: String,
    handlers: HashMap<TransportId, Arc<dyn TransportHandler>>,
    marshalling_type_name: Option<String>,
}

impl TypeCapability {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            handlers: HashMap::new(),
            marshalling_type_name: None,
        }
    }

    /// Register a transport handler for this type
    pub fn with_handler(mut self, handler: Arc<dyn TransportHandler>) -> Self {
        self.handlers.insert(handler.transport_id(), handler);
        self
    }

    /// Mark the type as requiring the structural marshaller, with the name
    /// of its interchange type
    pub fn with_structural_marshalling(mut self, marshalling_type_name: impl Into<String>) -> Self {
        self.marshalling_type_name = Some(marshalling_type_name.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether a handler is registered for the given wire transport
    pub fn supports_transport(&self, transport: TransportId) -> bool {
        self.handlers.contains_key(&transport)
    }

    /// Whether samples must go through the structural marshaller instead of
    /// being passed by raw reference
    pub fn is_structural_marshaller(&self) -> bool {
        self.marshalling_type_name.is_some()
    }

    /// Marshalling strategy selected for this type
    pub fn marshalling_strategy(&self) -> MarshallingStrategy {
        if self.is_structural_marshaller() {
            MarshallingStrategy::Structural
        } else {
            MarshallingStrategy::Direct
        }
    }

    /// Interchange type name used by the structural marshaller; falls back
    /// to the type's own name for direct types
    pub fn marshalling_type_name(&self) -> &str {
        self.marshalling_type_name
            .as_deref()
            .unwrap_or(&self.type_name)
    }

    /// Resolve the handler for a wire transport
    pub fn resolve_transport(
        &self,
        transport: TransportId,
    ) -> Result<Arc<dyn TransportHandler>, LinkError> {
        self.handlers
            .get(&transport)
            .cloned()
            .ok_or_else(|| LinkError::UnsupportedTransport {
                type_name: self.type_name.clone(),
                transport,
            })
    }

    /// Transports this type has handlers for
    pub fn transport_ids(&self) -> Vec<TransportId> {
        self.handlers.keys().copied().collect()
    }
}

/// Registry of type capabilities, keyed by type name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<TypeCapability>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, replacing any previous entry of the same name
    pub fn register(&self, capability: TypeCapability) -> Arc<TypeCapability> {
        let capability = Arc::new(capability);
        let mut types = self.types.write();
        tracing::debug!(
            type_name = capability.type_name(),
            structural = capability.is_structural_marshaller(),
            "registering type capability"
        );
        types.insert(capability.type_name().to_string(), capability.clone());
        capability
    }

    /// Look up a type; fails with `UnknownType` if unregistered
    pub fn lookup(&self, type_name: &str) -> Result<Arc<TypeCapability>, LinkError> {
        self.find(type_name)
            .ok_or_else(|| LinkError::UnknownType(type_name.to_string()))
    }

    /// Non-failing lookup variant for existence checks
    pub fn find(&self, type_name: &str) -> Option<Arc<TypeCapability>> {
        self.types.read().get(type_name).cloned()
    }

    /// Whether the type name is registered
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.read().contains_key(type_name)
    }

    /// Resolve the handler for a (type, transport) pair in one call
    pub fn transport_for(
        &self,
        type_name: &str,
        transport: TransportId,
    ) -> Result<Arc<dyn TransportHandler>, LinkError> {
        self.lookup(type_name)?.resolve_transport(transport)
    }

    /// All registered type names
    pub fn type_names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }

    /// Names of the types transportable over the given wire transport
    pub fn names_supporting(&self, transport: TransportId) -> Vec<String> {
        self.types
            .read()
            .values()
            .filter(|cap| cap.supports_transport(transport))
            .map(|cap| cap.type_name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedHandler {
        id: TransportId,
        size: Option<usize>,
    }

    impl TransportHandler for FixedHandler {
        fn transport_id(&self) -> TransportId {
            self.id
        }

        fn sample_size_hint(&self) -> Option<usize> {
            self.size
        }
    }

    fn handler(id: TransportId) -> Arc<dyn TransportHandler> {
        Arc::new(FixedHandler { id, size: None })
    }

    fn sample_registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(
            TypeCapability::new("/base/JointState")
                .with_handler(handler(TransportId::REMOTE))
                .with_handler(handler(TransportId::MESSAGE_QUEUE)),
        );
        registry.register(
            TypeCapability::new("/base/RigidBodyState")
                .with_handler(handler(TransportId::REMOTE))
                .with_structural_marshalling("/base/RigidBodyState_m"),
        );
        registry
    }

    #[test]
    fn test_lookup_unknown_type() {
        let registry = sample_registry();
        let err = registry.lookup("/base/Time").unwrap_err();
        assert!(matches!(err, LinkError::UnknownType(name) if name == "/base/Time"));

        assert!(registry.find("/base/Time").is_none());
        assert!(!registry.is_registered("/base/Time"));
        assert!(registry.is_registered("/base/JointState"));
    }

    #[test]
    fn test_resolve_transport() {
        let registry = sample_registry();
        let cap = registry.lookup("/base/RigidBodyState").unwrap();

        assert!(cap.supports_transport(TransportId::REMOTE));
        assert!(!cap.supports_transport(TransportId::MESSAGE_QUEUE));

        let handler = cap.resolve_transport(TransportId::REMOTE).unwrap();
        assert_eq!(handler.transport_id(), TransportId::REMOTE);

        let err = cap.resolve_transport(TransportId::MESSAGE_QUEUE).unwrap_err();
        assert!(matches!(
            err,
            LinkError::UnsupportedTransport { transport, .. }
                if transport == TransportId::MESSAGE_QUEUE
        ));
    }

    #[test]
    fn test_marshalling_strategy_selection() {
        let registry = sample_registry();

        let direct = registry.lookup("/base/JointState").unwrap();
        assert!(!direct.is_structural_marshaller());
        assert_eq!(direct.marshalling_strategy(), MarshallingStrategy::Direct);
        assert_eq!(direct.marshalling_type_name(), "/base/JointState");

        let structural = registry.lookup("/base/RigidBodyState").unwrap();
        assert!(structural.is_structural_marshaller());
        assert_eq!(
            structural.marshalling_strategy(),
            MarshallingStrategy::Structural
        );
        assert_eq!(structural.marshalling_type_name(), "/base/RigidBodyState_m");
    }

    #[test]
    fn test_names_supporting() {
        let registry = sample_registry();
        let names = registry.names_supporting(TransportId::MESSAGE_QUEUE);
        assert_eq!(names, vec!["/base/JointState".to_string()]);

        let mut all = registry.names_supporting(TransportId::REMOTE);
        all.sort();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_register_replaces() {
        let registry = sample_registry();
        registry.register(TypeCapability::new("/base/JointState"));

        let cap = registry.lookup("/base/JointState").unwrap();
        assert!(!cap.supports_transport(TransportId::REMOTE));
    }
}
