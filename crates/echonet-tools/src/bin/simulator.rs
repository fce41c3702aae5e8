use clap::Parser;
use echonet_client::{Eoj, ManufacturerCode, NodeAddress, SimulatedNode, UdpTransport};
use echonet_tools::{parse_eoj, parse_hex_bytes};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "echonet-simulator")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:3610")]
    bind: SocketAddr,
    /// Manufacturer code as 3 hex bytes.
    #[arg(long, default_value = "00000b")]
    manufacturer: String,
    /// Objects to host, e.g. `013001 029001`.
    #[arg(long, num_args = 1.., default_values = ["013001"], value_parser = parse_eoj)]
    objects: Vec<Eoj>,
    /// Skip the instance list notification sent at startup.
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let manufacturer = ManufacturerCode::from_edt(&parse_hex_bytes(&args.manufacturer)?)?;
    let transport = UdpTransport::bind(args.bind).await?;
    if let Err(e) = transport.join_multicast(std::net::Ipv4Addr::UNSPECIFIED) {
        eprintln!("multicast join failed: {e}");
    }
    let sim = SimulatedNode::new(manufacturer, transport);

    for eoj in &args.objects {
        // Operation status on, installation location unset.
        sim.add_object(*eoj, [(0x80, vec![0x30]), (0x81, vec![0x00])], &[0x80, 0x81])
            .await;
    }
    if !args.quiet {
        sim.announce(NodeAddress::multicast()).await?;
    }

    println!(
        "Simulated node {manufacturer} running with {} object(s). Ctrl+C to stop.",
        args.objects.len()
    );
    sim.run().await?;
    Ok(())
}
