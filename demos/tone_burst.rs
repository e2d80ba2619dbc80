use anyhow::Result;
use qa401_control::{Acquisition, Endpoint, InputAttenState, Session};

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

    // Engage the 20 dB input pad before playing anything loud.
    acquisition
        .set_input_attenuation(InputAttenState::Db20)
        .await?;

    // Three seconds of A440 at -20 dB.
    acquisition.generate_tone(-20.0, 440.0, 3000.0).await?;

    acquisition
        .set_input_attenuation(InputAttenState::NoAtten)
        .await?;

    Ok(())
}
