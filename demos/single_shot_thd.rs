use std::time::Duration;

use anyhow::Result;
use qa401_control::{
    Acquisition, ChannelSelector, Endpoint, GenKind, GeneratorSpec, Measurements, Session,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let host = args.get(1).map(String::as_str).unwrap_or("localhost");

    let session = Session::tcp(Endpoint::qa401(host));
    session.establish().await?;

    let acquisition = Acquisition::new(&session);
    let measurements = Measurements::new(&session);

    // Drive a 1 kHz test tone from generator 1 at -10 dB.
    acquisition
        .set_generator(GeneratorSpec {
            kind: GenKind::Gen1,
            enabled: true,
            amplitude_db: -10.0,
            frequency_hz: 1000.0,
        })
        .await?;

    acquisition
        .run_single_and_wait(Duration::from_millis(50), Duration::from_secs(10))
        .await?;

    let buffer = measurements
        .get_frequency_data(ChannelSelector::LeftIn)
        .await?;
    let Some(buffer) = buffer else {
        println!("no buffer collected yet");
        return Ok(());
    };
    println!("Retrieved {} points", buffer.len());

    let thd = measurements
        .compute_thd_pct(Some(&buffer), 1000.0, 20000.0)
        .await?;
    println!("THD   : {thd:.4} %");

    let thdn = measurements
        .compute_thdn_pct(Some(&buffer), 1000.0, 20.0, 20000.0)
        .await?;
    println!("THD+N : {thdn:.4} %");

    // Leave the generator off when we are done.
    acquisition
        .set_generator(GeneratorSpec {
            kind: GenKind::Gen1,
            enabled: false,
            amplitude_db: -10.0,
            frequency_hz: 1000.0,
        })
        .await?;

    Ok(())
}
