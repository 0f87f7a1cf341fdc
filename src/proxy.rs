//! Local proxy ports and typed reader/writer access
//!
//! A `LocalProxyPort` exists purely to bridge this process to one remote
//! port: a proxy for a remote output is a local input, and vice versa. Its
//! teardown (disconnect + deregister from the channel factory) runs at most
//! once, from either an explicit `disconnect` or `Drop`, and degrades to a
//! no-op once the process-wide transport subsystem has shut down.

use crate::channels::{Endpoint, InputEndpoint, OutputEndpoint, TransportChannels};
use crate::error::LinkError;
use crate::flow::{DirectCodec, FlowStatus, SampleCodec, StructuralCodec};
use crate::port::{PortDirection, PortRef};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zerocopy::{AsBytes, FromBytes};

/// A locally registered port bridging this process to a remote port
#[derive(Debug)]
pub struct LocalProxyPort {
    bound: PortRef,
    endpoint: Endpoint,
    channels: Arc<dyn TransportChannels>,
    torn_down: AtomicBool,
}

impl LocalProxyPort {
    pub(crate) fn new(
        bound: PortRef,
        endpoint: Endpoint,
        channels: Arc<dyn TransportChannels>,
    ) -> Self {
        Self {
            bound,
            endpoint,
            channels,
            torn_down: AtomicBool::new(false),
        }
    }

    /// Direction of the local endpoint (inverse of the remote port bridged)
    pub fn direction(&self) -> PortDirection {
        self.endpoint.direction()
    }

    /// The remote port this proxy is bound to
    pub fn bound_remote(&self) -> &PortRef {
        &self.bound
    }

    /// Name of this proxy in the local port directory
    pub fn local_name(&self) -> &str {
        self.endpoint.local_name()
    }

    /// Sample type carried by this proxy
    pub fn data_type_name(&self) -> &str {
        self.endpoint.data_type_name()
    }

    /// Whether the proxy is still connected to its remote port
    pub fn connected(&self) -> bool {
        if self.torn_down.load(Ordering::Acquire) {
            return false;
        }
        self.endpoint.connected()
    }

    /// Disconnect and deregister the proxy
    ///
    /// Safe to call any number of times, from any number of owners of the
    /// teardown path; only the first call acts.
    pub fn disconnect(&self) {
        self.teardown();
    }

    pub(crate) fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        // The transport subsystem may be deinitialized before the proxy is
        // dropped; there is nothing left to unregister from in that case.
        if !self.channels.is_subsystem_live() {
            return;
        }
        tracing::debug!(
            local_name = self.endpoint.local_name(),
            remote = %self.bound,
            "tearing down local proxy port"
        );
        self.endpoint.disconnect();
        self.channels.deregister_endpoint(self.endpoint.local_name());
    }
}

impl Drop for LocalProxyPort {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn expect_direction(proxy: &LocalProxyPort, wanted: PortDirection) -> Result<(), LinkError> {
    if proxy.direction() != wanted {
        return Err(LinkError::connection_failed(format!(
            "local proxy for {} has {} direction, expected {}",
            proxy.bound_remote(),
            proxy.direction(),
            wanted
        )));
    }
    Ok(())
}

/// Typed reader over a proxy bound to a remote output port
pub struct OutputReader<T> {
    proxy: LocalProxyPort,
    input: Arc<dyn InputEndpoint>,
    codec: Box<dyn SampleCodec<T>>,
}

impl<T> std::fmt::Debug for OutputReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputReader")
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl<T> OutputReader<T> {
    /// Wrap a proxy with an explicit codec
    pub fn with_codec(
        proxy: LocalProxyPort,
        codec: Box<dyn SampleCodec<T>>,
    ) -> Result<Self, LinkError> {
        expect_direction(&proxy, PortDirection::Input)?;
        let input = match proxy.endpoint() {
            Endpoint::Input(ep) => ep.clone(),
            Endpoint::Output(_) => unreachable!("direction checked above"),
        };
        Ok(Self {
            proxy,
            input,
            codec,
        })
    }

    /// Read a sample into `sample`
    ///
    /// `NewData` always refreshes the caller's value; `OldData` refreshes it
    /// only when `copy_old_data` is set; `NoData` leaves it untouched.
    pub fn read(&self, sample: &mut T, copy_old_data: bool) -> Result<FlowStatus, LinkError> {
        let result = self.input.read(copy_old_data)?;
        match result.status {
            FlowStatus::NoData => {}
            FlowStatus::NewData => {
                let wire = result.wire.as_ref().ok_or_else(|| {
                    LinkError::marshal("transport reported a fresh sample without wire data")
                })?;
                self.codec.decode_into(wire, sample)?;
            }
            FlowStatus::OldData => {
                if copy_old_data {
                    if let Some(wire) = result.wire.as_ref() {
                        self.codec.decode_into(wire, sample)?;
                    }
                }
            }
        }
        Ok(result.status)
    }

    /// Discard queued and remembered samples
    pub fn clear(&self) {
        self.input.clear();
    }

    /// Whether the proxy is still connected to the remote output
    pub fn connected(&self) -> bool {
        self.proxy.connected()
    }

    /// Tear the proxy down; idempotent
    pub fn disconnect(&self) {
        self.proxy.disconnect();
    }

    /// The underlying proxy port
    pub fn proxy(&self) -> &LocalProxyPort {
        &self.proxy
    }
}

impl<T: AsBytes + FromBytes + 'static> OutputReader<T> {
    /// Reader for a plain type passed by raw layout
    pub fn direct(proxy: LocalProxyPort) -> Result<Self, LinkError> {
        Self::with_codec(proxy, Box::new(DirectCodec::<T>::new()))
    }
}

impl<T: Serialize + DeserializeOwned + 'static> OutputReader<T> {
    /// Reader for a type encoded through the structural marshaller
    pub fn structural(proxy: LocalProxyPort) -> Result<Self, LinkError> {
        Self::with_codec(proxy, Box::new(StructuralCodec::<T>::new()))
    }
}

/// Typed writer over a proxy bound to a remote input port
pub struct InputWriter<T> {
    proxy: LocalProxyPort,
    output: Arc<dyn OutputEndpoint>,
    codec: Box<dyn SampleCodec<T>>,
}

impl<T> InputWriter<T> {
    /// Wrap a proxy with an explicit codec
    pub fn with_codec(
        proxy: LocalProxyPort,
        codec: Box<dyn SampleCodec<T>>,
    ) -> Result<Self, LinkError> {
        expect_direction(&proxy, PortDirection::Output)?;
        let output = match proxy.endpoint() {
            Endpoint::Output(ep) => ep.clone(),
            Endpoint::Input(_) => unreachable!("direction checked above"),
        };
        Ok(Self {
            proxy,
            output,
            codec,
        })
    }

    /// Write a sample; fire-and-forget under the dataflow policy
    ///
    /// Returns whether the underlying port is presently connected to at
    /// least one endpoint, not whether this specific sample was delivered.
    pub fn write(&self, sample: &T) -> Result<bool, LinkError> {
        let wire = self.codec.encode(sample)?;
        self.output.write(&wire)
    }

    /// Whether the proxy is still connected to the remote input
    pub fn connected(&self) -> bool {
        self.proxy.connected()
    }

    /// Tear the proxy down; idempotent
    pub fn disconnect(&self) {
        self.proxy.disconnect();
    }

    /// The underlying proxy port
    pub fn proxy(&self) -> &LocalProxyPort {
        &self.proxy
    }
}

impl<T: AsBytes + FromBytes + 'static> InputWriter<T> {
    /// Writer for a plain type passed by raw layout
    pub fn direct(proxy: LocalProxyPort) -> Result<Self, LinkError> {
        Self::with_codec(proxy, Box::new(DirectCodec::<T>::new()))
    }
}

impl<T: Serialize + DeserializeOwned + 'static> InputWriter<T> {
    /// Writer for a type encoded through the structural marshaller
    pub fn structural(proxy: LocalProxyPort) -> Result<Self, LinkError> {
        Self::with_codec(proxy, Box::new(StructuralCodec::<T>::new()))
    }
}
