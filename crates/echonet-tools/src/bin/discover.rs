use clap::Parser;
use echonet_client::{ClientConfig, EchonetClient, InstanceRecord, NodeAddress};
use echonet_tools::hex;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "echonet-discover")]
struct Args {
    /// Node to discover. Without it every node answering on the multicast
    /// group is discovered.
    #[arg(long)]
    host: Option<IpAddr>,
    #[arg(long, default_value_t = 3610)]
    port: u16,
    #[arg(long, default_value = "0.0.0.0:3610")]
    bind: SocketAddr,
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,
    #[arg(long, default_value_t = 1000)]
    request_timeout_ms: u64,
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = ClientConfig {
        discovery_timeout: Duration::from_millis(args.timeout_ms),
        request_timeout: Duration::from_millis(args.request_timeout_ms),
        bind_addr: args.bind,
        ..ClientConfig::default()
    };
    let client = EchonetClient::bind(config).await?;

    let hosts = match args.host {
        Some(ip) => vec![NodeAddress::Ip(SocketAddr::new(ip, args.port))],
        None => {
            client.discover(NodeAddress::multicast()).await?;
            tokio::time::sleep(Duration::from_millis(args.timeout_ms)).await;
            client.store().hosts().await
        }
    };

    let mut records: Vec<InstanceRecord> = Vec::new();
    for host in hosts {
        match client.discover_host_detailed(host).await {
            Ok(report) => {
                for failure in &report.failures {
                    eprintln!("{host}: skipped {} ({})", failure.eoj, failure.error);
                }
                records.extend(report.records);
            }
            Err(e) if args.host.is_some() => {
                eprintln!("discovery failed: {e}");
                std::process::exit(1);
            }
            Err(e) => eprintln!("{host}: {e}"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            println!(
                "{} {} maker={} uid={} get={} set={}",
                record.host,
                record.eoj(),
                record.manufacturer,
                hex(&record.uid),
                hex(&record.getmap),
                hex(&record.setmap),
            );
        }
    }
    Ok(())
}
