//! Async ECHONET Lite controller built on `echonet-core` and
//! `echonet-datalink`.
//!
//! [`EchonetClient`] discovers the object instances of a node and fetches
//! their property maps and identification data. Everything the node sends
//! back is folded into a shared [`DeviceStateStore`].

#[cfg(test)]
mod capture_log;
pub mod client;
pub mod discovery;
pub mod error;
pub mod manufacturer;
pub mod simulator;
pub mod store;

pub use client::{
    ClientConfig, EchonetClient, DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
pub use discovery::{DiscoveryPhase, FetchStage, HostDiscovery, InstanceFailure, InstanceRecord};
pub use echonet_core::frame::Property;
pub use echonet_core::types::{Eoj, ManufacturerCode, PropertyMap};
pub use echonet_datalink::{NodeAddress, UdpTransport};
pub use error::ClientError;
pub use manufacturer::{Manufacturer, ManufacturerResolver, FALLBACK_MANUFACTURER};
pub use simulator::SimulatedNode;
pub use store::{DeviceStateStore, HostEntry, InstanceState};
