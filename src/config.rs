//! TOML-based connection policy configuration
//!
//! Provides the strict configuration form of `ConnectionPolicy`:
//! - all seven fields are required, there are no implicit defaults
//! - `type` and `lock` are closed enumerations
//! - a violation reports the offending field and value

use crate::error::LinkError;
use crate::policy::{BufferKind, ConnectionPolicy, LockPolicy, TransportId};
use serde::{Deserialize, Serialize};

/// Raw policy configuration record, prior to validation
///
/// Fields are optional at the serde layer so that a missing key can be
/// reported as `InvalidPolicy` for that field rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Buffering kind: "data" or "buffer"
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Wire transport id
    pub transport: Option<u16>,

    /// Wire buffer preallocation hint in bytes
    pub data_size: Option<u32>,

    /// Deliver a currently-held sample on connect
    pub init: Option<bool>,

    /// Reader pulls on demand
    pub pull: Option<bool>,

    /// Buffer capacity in samples
    pub size: Option<u32>,

    /// Locking discipline: "locked" or "lock_free"
    pub lock: Option<String>,
}

impl PolicyConfig {
    /// Parse a configuration record from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, LinkError> {
        toml::from_str(toml_str).map_err(|e| LinkError::invalid_policy("config", e.to_string()))
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, LinkError> {
    value.ok_or(LinkError::InvalidPolicy {
        field,
        value: "missing".to_string(),
    })
}

impl ConnectionPolicy {
    /// Build a validated policy from a configuration record
    ///
    /// This is a strict closed enumeration, not an extensible one: any value
    /// of `type` or `lock` outside the enumerated set fails, as does any
    /// missing field.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, LinkError> {
        let kind = match required(config.kind.as_deref(), "type")? {
            "data" => BufferKind::Data,
            "buffer" => BufferKind::Buffer,
            other => return Err(LinkError::invalid_policy("type", other)),
        };

        let lock_policy = match required(config.lock.as_deref(), "lock")? {
            "locked" => LockPolicy::Locked,
            "lock_free" => LockPolicy::LockFree,
            other => return Err(LinkError::invalid_policy("lock", other)),
        };

        let policy = ConnectionPolicy {
            kind,
            capacity: required(config.size, "size")?,
            lock_policy,
            pull: required(config.pull, "pull")?,
            init_sample: required(config.init, "init")?,
            transport: TransportId(required(config.transport, "transport")?),
            data_size_hint: required(config.data_size, "data_size")?,
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> &'static str {
        r#"
            type = "buffer"
            transport = 1
            data_size = 0
            init = false
            pull = true
            size = 10
            lock = "lock_free"
        "#
    }

    #[test]
    fn test_full_config_parses() {
        let config = PolicyConfig::from_toml(sample_config()).unwrap();
        let policy = ConnectionPolicy::from_config(&config).unwrap();

        assert_eq!(policy.kind, BufferKind::Buffer);
        assert_eq!(policy.capacity, 10);
        assert_eq!(policy.lock_policy, LockPolicy::LockFree);
        assert!(policy.pull);
        assert!(!policy.init_sample);
        assert_eq!(policy.transport, TransportId::REMOTE);
    }

    #[test]
    fn test_missing_field_fails() {
        let config = PolicyConfig::from_toml(
            r#"
                type = "data"
                transport = 1
                data_size = 0
                init = false
                pull = false
                size = 0
            "#,
        )
        .unwrap();

        let err = ConnectionPolicy::from_config(&config).unwrap_err();
        match err {
            LinkError::InvalidPolicy { field, value } => {
                assert_eq!(field, "lock");
                assert_eq!(value, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut config = PolicyConfig::from_toml(sample_config()).unwrap();
        config.kind = Some("ring".to_string());

        let err = ConnectionPolicy::from_config(&config).unwrap_err();
        match err {
            LinkError::InvalidPolicy { field, value } => {
                assert_eq!(field, "type");
                assert_eq!(value, "ring");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_lock_rejected() {
        let mut config = PolicyConfig::from_toml(sample_config()).unwrap();
        config.lock = Some("spinning".to_string());

        let err = ConnectionPolicy::from_config(&config).unwrap_err();
        assert!(matches!(err, LinkError::InvalidPolicy { field: "lock", .. }));
    }

    #[test]
    fn test_buffer_capacity_zero_rejected() {
        let mut config = PolicyConfig::from_toml(sample_config()).unwrap();
        config.size = Some(0);

        let err = ConnectionPolicy::from_config(&config).unwrap_err();
        assert!(matches!(err, LinkError::InvalidPolicy { field: "size", .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = PolicyConfig::from_toml(
            r#"
                type = "data"
                burst = 3
            "#,
        );
        assert!(result.is_err());
    }
}
