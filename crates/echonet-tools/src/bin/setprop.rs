use clap::Parser;
use echonet_client::{ClientConfig, EchonetClient, NodeAddress, Property};
use echonet_tools::{parse_assignment, parse_eoj};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "echonet-setprop")]
struct Args {
    #[arg(long)]
    host: IpAddr,
    #[arg(long, default_value_t = 3610)]
    port: u16,
    #[arg(long, default_value = "0.0.0.0:3610")]
    bind: SocketAddr,
    #[arg(long, value_parser = parse_eoj)]
    eoj: echonet_client::Eoj,
    /// Values to write as `EPC=EDT`, e.g. `80=30`.
    #[arg(required = true, value_parser = parse_assignment)]
    values: Vec<(u8, Vec<u8>)>,
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let client = EchonetClient::bind(ClientConfig {
        request_timeout: Duration::from_millis(args.timeout_ms),
        bind_addr: args.bind,
        multicast: None,
        ..ClientConfig::default()
    })
    .await?;
    let host = NodeAddress::Ip(SocketAddr::new(args.host, args.port));
    let properties: Vec<Property> = args
        .values
        .into_iter()
        .map(|(epc, edt)| Property::new(epc, edt))
        .collect();

    if let Err(e) = client.set_properties(host, args.eoj, &properties).await {
        eprintln!("set failed: {e}");
        std::process::exit(1);
    }
    println!("ok");
    Ok(())
}
