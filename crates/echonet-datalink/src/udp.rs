use crate::{DataLink, NodeAddress, TransportError};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Largest datagram accepted in either direction.
pub const MAX_FRAME_LEN: usize = 1500;

/// ECHONET Lite over UDP. One socket serves every outbound send and the
/// single inbound receive loop; clones share it.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.set_broadcast(true)?;
        log::debug!("echonet transport bound to {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Binds `0.0.0.0:3610`, where nodes send both replies and
    /// announcements.
    pub async fn bind_default() -> Result<Self, TransportError> {
        Self::bind(SocketAddr::new(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            NodeAddress::ECHONET_LITE_PORT,
        ))
        .await
    }

    /// Joins the ECHONET Lite multicast group on `interface` so unsolicited
    /// announcements (e.g. instance list notifications) are received.
    pub fn join_multicast(&self, interface: Ipv4Addr) -> Result<(), TransportError> {
        self.socket
            .join_multicast_v4(NodeAddress::MULTICAST_GROUP, interface)?;
        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(TransportError::Io)
    }
}

impl DataLink for UdpTransport {
    async fn send(&self, address: NodeAddress, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge);
        }
        self.socket
            .send_to(payload, address.as_socket_addr())
            .await?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, NodeAddress), TransportError> {
        let mut frame = [0u8; MAX_FRAME_LEN];
        let (n, src) = self.socket.recv_from(&mut frame).await?;
        if n > buf.len() {
            return Err(TransportError::FrameTooLarge);
        }
        buf[..n].copy_from_slice(&frame[..n]);
        Ok((n, NodeAddress::Ip(src)))
    }
}

#[cfg(test)]
mod tests {
    use super::{UdpTransport, MAX_FRAME_LEN};
    use crate::{DataLink, NodeAddress, TransportError};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use tokio::net::UdpSocket;

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn recv_reports_source_address() {
        let transport = UdpTransport::bind(loopback()).await.unwrap();
        let target = transport.local_addr().unwrap();
        let sender = UdpSocket::bind(loopback()).await.unwrap();
        let sender_addr = sender.local_addr().unwrap();

        sender.send_to(&[0x10, 0x81, 0x00], target).await.unwrap();

        let mut out = [0u8; 16];
        let (n, src) = transport.recv(&mut out).await.unwrap();
        assert_eq!(&out[..n], &[0x10, 0x81, 0x00]);
        assert_eq!(src, NodeAddress::Ip(sender_addr));
    }

    #[tokio::test]
    async fn send_reaches_peer() {
        let transport = UdpTransport::bind(loopback()).await.unwrap();
        let peer = UdpSocket::bind(loopback()).await.unwrap();
        let peer_addr = NodeAddress::from(peer.local_addr().unwrap());

        transport.send(peer_addr, &[1, 2, 3]).await.unwrap();

        let mut recv = [0u8; 16];
        let (n, src) = peer.recv_from(&mut recv).await.unwrap();
        assert_eq!(&recv[..n], &[1, 2, 3]);
        assert_eq!(src, transport.local_addr().unwrap());
    }

    #[tokio::test]
    async fn oversized_send_is_rejected() {
        let transport = UdpTransport::bind(loopback()).await.unwrap();
        let target = NodeAddress::from(transport.local_addr().unwrap());
        let err = transport
            .send(target, &[0u8; MAX_FRAME_LEN + 1])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge));
    }

    #[tokio::test]
    async fn small_receive_buffer_is_reported() {
        let transport = UdpTransport::bind(loopback()).await.unwrap();
        let target = transport.local_addr().unwrap();
        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(&[0u8; 32], target).await.unwrap();

        let mut out = [0u8; 8];
        let err = transport.recv(&mut out).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge));
    }
}
