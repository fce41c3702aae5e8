//! Discover the object instances of one ECHONET Lite node.
//!
//! Usage:
//!   cargo run -p echonet-client --example discover_host -- 192.168.1.20

use echonet_client::{EchonetClient, NodeAddress};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let host: NodeAddress = std::env::args()
        .nth(1)
        .ok_or("usage: discover_host <ip>[:port]")?
        .parse()?;

    // Bound to 0.0.0.0:3610, with the multicast group joined.
    let client = EchonetClient::new().await?;
    let records = client.discover_host(host).await?;

    if records.is_empty() {
        println!("{host} reported no device objects.");
    }
    for record in &records {
        println!(
            "{} by {} (get {:02x?}, set {:02x?})",
            record.eoj(),
            record.manufacturer,
            record.getmap,
            record.setmap,
        );
    }
    Ok(())
}
