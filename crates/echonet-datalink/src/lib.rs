pub mod address;
pub mod traits;
pub mod udp;

pub use address::NodeAddress;
pub use traits::{DataLink, TransportError};
pub use udp::UdpTransport;
