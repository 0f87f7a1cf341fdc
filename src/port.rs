//! Port addressing
//!
//! Ports are addressed, never owned: a `PortRef` is a component-name +
//! port-name pair that gets re-resolved through the component directory on
//! every operation, so a component that disappeared between calls surfaces
//! as `NotFound` instead of a stale dereference.

use serde::{Deserialize, Serialize};

/// Direction of a dataflow port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    /// The direction a local proxy bridging this port must have
    pub fn inverse(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }

    pub fn is_input(self) -> bool {
        self == PortDirection::Input
    }

    pub fn is_output(self) -> bool {
        self == PortDirection::Output
    }
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        })
    }
}

/// Address of a port on a named component
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    component: String,
    port: String,
}

impl PortRef {
    pub fn new(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
        }
    }

    /// Name of the owning component
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Name of the port on that component
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

/// Resolved snapshot of a remote port
///
/// Holds what the directory reported at resolution time plus the
/// back-reference to the owning component; it does not track later changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    name: String,
    direction: PortDirection,
    data_type_name: String,
    owner: String,
}

impl PortDescriptor {
    pub fn new(
        name: impl Into<String>,
        direction: PortDirection,
        data_type_name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            data_type_name: data_type_name.into(),
            owner: owner.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Name of the sample type in the type registry
    pub fn data_type_name(&self) -> &str {
        &self.data_type_name
    }

    /// Name of the owning component
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Address of this port for connector operations
    pub fn to_ref(&self) -> PortRef {
        PortRef::new(&self.owner, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_inverse() {
        assert_eq!(PortDirection::Input.inverse(), PortDirection::Output);
        assert_eq!(PortDirection::Output.inverse(), PortDirection::Input);
        assert!(PortDirection::Input.is_input());
        assert!(!PortDirection::Input.is_output());
    }

    #[test]
    fn test_port_ref_display() {
        let port = PortRef::new("estimator", "pose_samples");
        assert_eq!(port.to_string(), "estimator.pose_samples");
        assert_eq!(port.component(), "estimator");
        assert_eq!(port.port(), "pose_samples");
    }

    #[test]
    fn test_descriptor_to_ref() {
        let descriptor = PortDescriptor::new(
            "pose_samples",
            PortDirection::Output,
            "/base/RigidBodyState",
            "estimator",
        );
        assert_eq!(
            descriptor.to_ref(),
            PortRef::new("estimator", "pose_samples")
        );
        assert_eq!(descriptor.data_type_name(), "/base/RigidBodyState");
    }
}
