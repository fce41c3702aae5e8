use echonet_core::types::{Eoj, Esv};
use echonet_datalink::{NodeAddress, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("encode error: {0}")]
    Encode(#[from] echonet_core::EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] echonet_core::DecodeError),
    #[error("request timed out")]
    Timeout,
    #[error("ECHONET node {host} is not online")]
    CannotConnect { host: NodeAddress },
    #[error("{host} did not report property map 0x{epc:02x} for {eoj}")]
    MissingPropertyMap { host: NodeAddress, eoj: Eoj, epc: u8 },
    #[error("service not available ({esv:?}) for properties {epcs:02x?}")]
    ServiceNotAvailable { esv: Esv, epcs: Vec<u8> },
    #[error("requests need a unicast address, got {0}")]
    GroupAddress(NodeAddress),
    #[error("unexpected response service {0:?}")]
    UnexpectedResponse(Esv),
}
