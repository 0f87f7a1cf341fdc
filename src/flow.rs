//! Typed-sample marshalling strategies and the tri-state read result
//!
//! A sample type crosses the wire one of two ways, selected once at
//! construction and never re-inspected afterwards:
//!
//! - **Direct**: the value's binary layout is the wire form. Zero-copy,
//!   requires both endpoints to agree on layout (`zerocopy` traits).
//! - **Structural**: the value is marshalled through an intermediate
//!   `MarshalHandle`, for types whose endpoints do not share compiled-in
//!   definitions (`serde` + `bincode`).

use crate::error::LinkError;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use zerocopy::{AsBytes, FromBytes};

/// Result of a read against a dataflow connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Nothing was ever received on this connection
    NoData,
    /// The result reflects a previously delivered sample, not a new one
    OldData,
    /// A fresh sample was consumed
    NewData,
}

impl FlowStatus {
    /// Check if a fresh sample was consumed
    pub fn is_new(&self) -> bool {
        matches!(self, FlowStatus::NewData)
    }

    /// Check if any sample, fresh or not, was ever delivered
    pub fn has_data(&self) -> bool {
        !matches!(self, FlowStatus::NoData)
    }
}

/// How a type's samples are converted for transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshallingStrategy {
    /// Raw-layout pass-through
    Direct,
    /// Encoded through an intermediate marshalling handle
    Structural,
}

/// Per-type strategy converting between in-process values and wire samples
pub trait SampleCodec<T>: Send + Sync {
    /// Strategy this codec implements
    fn strategy(&self) -> MarshallingStrategy;

    /// Convert a value into its wire form
    fn encode(&self, value: &T) -> Result<Bytes, LinkError>;

    /// Refresh a caller-held value from received wire data
    fn decode_into(&self, wire: &[u8], into: &mut T) -> Result<(), LinkError>;
}

/// Direct-reference strategy for plain, layout-stable types
#[derive(Debug, Default)]
pub struct DirectCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DirectCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: AsBytes + FromBytes> SampleCodec<T> for DirectCodec<T> {
    fn strategy(&self) -> MarshallingStrategy {
        MarshallingStrategy::Direct
    }

    fn encode(&self, value: &T) -> Result<Bytes, LinkError> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode_into(&self, wire: &[u8], into: &mut T) -> Result<(), LinkError> {
        let value = T::read_from(wire).ok_or_else(|| {
            LinkError::marshal(format!(
                "wire sample of {} bytes does not match the expected layout",
                wire.len()
            ))
        })?;
        *into = value;
        Ok(())
    }
}

/// Opaque staging buffer of the structural strategy
///
/// One handle is created per operation and dropped on every exit path; the
/// wire view it exposes is what actually crosses the transport.
#[derive(Debug, Default)]
pub struct MarshalHandle {
    buf: Vec<u8>,
}

impl MarshalHandle {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Stage a caller-supplied value into the handle
    pub fn set_sample<T: Serialize>(&mut self, value: &T) -> Result<(), LinkError> {
        self.buf = bincode::serialize(value).map_err(|e| LinkError::marshal(e.to_string()))?;
        Ok(())
    }

    /// Wire view over the staged sample
    pub fn wire(&self) -> &[u8] {
        &self.buf
    }

    /// Replace the staged sample with just-received wire data
    pub fn refresh(&mut self, wire: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(wire);
    }

    /// Copy the staged sample back out into a caller-held value
    pub fn sample_into<T: DeserializeOwned>(&self, into: &mut T) -> Result<(), LinkError> {
        *into = bincode::deserialize(&self.buf).map_err(|e| LinkError::marshal(e.to_string()))?;
        Ok(())
    }
}

/// Structural-marshaller strategy for types without a shared binary layout
#[derive(Debug, Default)]
pub struct StructuralCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> StructuralCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> SampleCodec<T> for StructuralCodec<T> {
    fn strategy(&self) -> MarshallingStrategy {
        MarshallingStrategy::Structural
    }

    fn encode(&self, value: &T) -> Result<Bytes, LinkError> {
        let mut handle = MarshalHandle::new();
        handle.set_sample(value)?;
        Ok(Bytes::copy_from_slice(handle.wire()))
    }

    fn decode_into(&self, wire: &[u8], into: &mut T) -> Result<(), LinkError> {
        let mut handle = MarshalHandle::new();
        handle.refresh(wire);
        handle.sample_into(into)
    }
}
