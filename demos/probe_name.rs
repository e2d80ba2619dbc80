use std::time::{Duration, Instant};

use anyhow::Result;
use qa401_control::{ChannelConfig, Endpoint, Session, register_tcp_channel};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let host = args.get(1).map(String::as_str).unwrap_or("localhost");

    // The analyzer answers quickly on a LAN; keep the channel timeouts
    // short so a wrong host is reported promptly.
    register_tcp_channel(ChannelConfig {
        connect_timeout: Duration::from_secs(3),
        io_timeout: Duration::from_secs(3),
    });

    let session = Session::tcp(Endpoint::qa401(host));
    session.establish().await?;

    let started = Instant::now();
    let name = session.dispatch(|proxy| proxy.get_name()).await?;
    println!("{}   [{:.1} ms]", name, started.elapsed().as_secs_f64() * 1e3);

    Ok(())
}
