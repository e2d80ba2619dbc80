use std::time::Duration;

use anyhow::Result;
use qa401_control::{
    Acquisition, ChannelSelector, Endpoint, Measurements, Session, UnitsMode,
};

/// Measure the peak bin twice, once in dBV and once in dBFS, the way you
/// would flip the units button on the analyzer between readings.
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

    for (units, label) in [(UnitsMode::DbV, "dBV"), (UnitsMode::DbFs, "dBFS")] {
        acquisition.set_units(units).await?;
        acquisition
            .run_single_and_wait(Duration::from_millis(50), Duration::from_secs(10))
            .await?;

        let buffer = measurements
            .get_frequency_data(ChannelSelector::LeftIn)
            .await?;
        match buffer {
            Some(buffer) => {
                let peak = measurements.compute_peak_power_db(Some(&buffer)).await?;
                println!("Peak: {peak:.2} {label}");
            }
            None => println!("no buffer collected yet"),
        }
    }

    Ok(())
}
