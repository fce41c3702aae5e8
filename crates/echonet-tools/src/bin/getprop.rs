use clap::Parser;
use echonet_client::{ClientConfig, EchonetClient, NodeAddress};
use echonet_tools::{hex, parse_eoj, parse_epc};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "echonet-getprop")]
struct Args {
    #[arg(long)]
    host: IpAddr,
    #[arg(long, default_value_t = 3610)]
    port: u16,
    #[arg(long, default_value = "0.0.0.0:3610")]
    bind: SocketAddr,
    /// Target object, e.g. `013001`.
    #[arg(long, value_parser = parse_eoj)]
    eoj: echonet_client::Eoj,
    /// Property codes to read, e.g. `80 b0`.
    #[arg(required = true, value_parser = parse_epc)]
    epcs: Vec<u8>,
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
    #[arg(long)]
    json: bool,
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

    match client.get_properties(host, args.eoj, &args.epcs).await {
        Ok(properties) if args.json => {
            let values: serde_json::Map<String, serde_json::Value> = properties
                .iter()
                .map(|p| (format!("{:02x}", p.epc), hex(&p.edt).into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        Ok(properties) => {
            for p in &properties {
                println!("{:02x}: {}", p.epc, hex(&p.edt));
            }
        }
        Err(e) => {
            eprintln!("get failed: {e}");
            std::process::exit(1);
        }
    }
    Ok(())
}
