use crate::NodeAddress;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur while moving raw frames on and off the network.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame too large")]
    FrameTooLarge,
}

/// Async trait for sending and receiving raw ECHONET Lite frames.
///
/// The returned futures are `Send` so a client can drive its receive loop on
/// a spawned task. Implementors include [`UdpTransport`](crate::UdpTransport).
pub trait DataLink: Send + Sync {
    /// Sends `payload` to `address`.
    fn send(
        &self,
        address: NodeAddress,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives one frame into `buf`, returning `(bytes_read, source_address)`.
    fn recv(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, NodeAddress), TransportError>> + Send;
}
