use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tracing::debug;

use crate::error::TransportError;
use crate::proxy::{
    AcquisitionState, Binding, ChannelSelector, GeneratorSpec, InputAttenState, InstrumentProxy,
    SampleBuffer, UnitsMode,
};

/// Port the analyzer application listens on for remote control.
pub const DEFAULT_PORT: u16 = 9401;
/// Name the analyzer publishes its remote object under.
pub const SERVICE_NAME: &str = "QuantAsylumQA401Server";

/// Process-wide channel parameters. Registered once per process; later
/// registrations are no-ops that return the original.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
        }
    }
}

static TCP_CHANNEL: OnceLock<ChannelConfig> = OnceLock::new();

/// Register the TCP channel for this process. Idempotent: the first caller
/// wins and every caller gets the registered configuration back, so racing
/// first-time registrations cannot fail or double-register.
pub fn register_tcp_channel(config: ChannelConfig) -> &'static ChannelConfig {
    TCP_CHANNEL.get_or_init(|| {
        debug!("registering tcp channel: {config:?}");
        config
    })
}

fn channel() -> &'static ChannelConfig {
    TCP_CHANNEL.get_or_init(ChannelConfig::default)
}

/// Default activation mechanism: a TCP channel carrying one JSON object per
/// line, each addressed to a remote object by name.
pub struct TcpBinding;

#[async_trait]
impl Binding for TcpBinding {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        service: &str,
    ) -> Result<Box<dyn InstrumentProxy>, TransportError> {
        let config = channel();
        let endpoint = format!("{host}:{port}");
        debug!("binding {service} at {endpoint}");
        let stream = match timeout(config.connect_timeout, TcpStream::connect(&endpoint)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(TransportError::Bind { endpoint, source }),
            Err(_) => {
                return Err(TransportError::Bind {
                    endpoint,
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connect timed out",
                    ),
                });
            }
        };
        let (read_half, write_half) = stream.into_split();
        Ok(Box::new(TcpProxy {
            service: service.to_string(),
            reader: BufReader::new(read_half),
            writer: write_half,
            io_timeout: config.io_timeout,
        }))
    }
}

#[derive(Serialize)]
pub(crate) struct Request<'a> {
    pub target: &'a str,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Deserialize)]
struct Response {
    result: Option<Value>,
    fault: Option<String>,
}

pub struct TcpProxy {
    service: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    io_timeout: Duration,
}

impl TcpProxy {
    async fn invoke<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<T, TransportError> {
        let frame = serde_json::to_string(&Request {
            target: &self.service,
            method,
            params,
        })
        .map_err(|e| TransportError::Protocol(e.to_string()))?;

        debug!("rpc call   -> {method}");
        let reader = &mut self.reader;
        let writer = &mut self.writer;
        let exchange = async move {
            writer.write_all(frame.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            let mut line = String::new();
            let read = reader.read_line(&mut line).await?;
            Ok::<_, std::io::Error>((read, line))
        };
        let (read, line) = timeout(self.io_timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout)??;
        if read == 0 {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "instrument service closed the channel",
            )));
        }

        let reply: Response = serde_json::from_str(line.trim())
            .map_err(|e| TransportError::Protocol(format!("bad reply to {method}: {e}")))?;
        if let Some(fault) = reply.fault {
            return Err(TransportError::Remote(fault));
        }
        debug!("rpc result <- {method}");
        serde_json::from_value(reply.result.unwrap_or(Value::Null))
            .map_err(|e| TransportError::Protocol(format!("unexpected result for {method}: {e}")))
    }
}

#[async_trait]
impl InstrumentProxy for TcpProxy {
    async fn get_name(&mut self) -> Result<String, TransportError> {
        self.invoke("GetName", json!([])).await
    }

    async fn run(&mut self) -> Result<(), TransportError> {
        self.invoke("Run", json!([])).await
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        self.invoke("Stop", json!([])).await
    }

    async fn run_single(&mut self) -> Result<(), TransportError> {
        self.invoke("RunSingle", json!([])).await
    }

    async fn get_acquisition_state(&mut self) -> Result<AcquisitionState, TransportError> {
        self.invoke("GetAcquisitionState", json!([])).await
    }

    async fn get_data(
        &mut self,
        channel: ChannelSelector,
    ) -> Result<Option<SampleBuffer>, TransportError> {
        self.invoke("GetData", json!([channel])).await
    }

    async fn get_time_data(
        &mut self,
        channel: ChannelSelector,
    ) -> Result<Option<SampleBuffer>, TransportError> {
        self.invoke("GetTimeData", json!([channel])).await
    }

    async fn compute_power_db(&mut self, buffer: SampleBuffer) -> Result<f64, TransportError> {
        self.invoke("ComputePowerDB", json!([buffer])).await
    }

    async fn compute_thd_pct(
        &mut self,
        buffer: SampleBuffer,
        fundamental_hz: f64,
        max_harmonic_hz: f64,
    ) -> Result<f64, TransportError> {
        self.invoke(
            "ComputeTHDPct",
            json!([buffer, fundamental_hz, max_harmonic_hz]),
        )
        .await
    }

    async fn compute_thdn_pct(
        &mut self,
        buffer: SampleBuffer,
        fundamental_hz: f64,
        low_hz: f64,
        high_hz: f64,
    ) -> Result<f64, TransportError> {
        self.invoke(
            "ComputeTHDNPct",
            json!([buffer, fundamental_hz, low_hz, high_hz]),
        )
        .await
    }

    async fn compute_peak_power_db(
        &mut self,
        buffer: SampleBuffer,
    ) -> Result<f64, TransportError> {
        self.invoke("ComputePeakPowerDB", json!([buffer])).await
    }

    async fn set_generator(&mut self, spec: GeneratorSpec) -> Result<(), TransportError> {
        self.invoke(
            "SetGenerator",
            json!([spec.kind, spec.enabled, spec.amplitude_db, spec.frequency_hz]),
        )
        .await
    }

    async fn set_input_atten(&mut self, state: InputAttenState) -> Result<(), TransportError> {
        self.invoke("SetInputAtten", json!([state])).await
    }

    async fn set_units(&mut self, mode: UnitsMode) -> Result<(), TransportError> {
        self.invoke("SetUnits", json!([mode])).await
    }

    async fn generate_tone(
        &mut self,
        amplitude_db: f64,
        frequency_hz: f64,
        duration_ms: f64,
    ) -> Result<(), TransportError> {
        self.invoke(
            "GenerateTone",
            json!([amplitude_db, frequency_hz, duration_ms]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_first_wins() {
        let first = register_tcp_channel(ChannelConfig {
            connect_timeout: Duration::from_secs(1),
            io_timeout: Duration::from_secs(1),
        });
        let second = register_tcp_channel(ChannelConfig {
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(30),
        });
        // Tests share the process-wide slot, so we cannot assume which
        // registration ran first; only that a second one never replaces it.
        assert_eq!(first.connect_timeout, second.connect_timeout);
        assert_ne!(second.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn request_frame_addresses_the_named_object() {
        let frame = serde_json::to_value(Request {
            target: SERVICE_NAME,
            method: "GetData",
            params: json!([ChannelSelector::LeftIn]),
        })
        .unwrap();
        assert_eq!(frame["target"], "QuantAsylumQA401Server");
        assert_eq!(frame["method"], "GetData");
        assert_eq!(frame["params"][0], "LeftIn");
    }

    #[tokio::test]
    async fn tcp_proxy_round_trips_a_query() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half);
            let mut line = String::new();
            lines.read_line(&mut line).await.unwrap();
            let request: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(request["method"], "GetName");
            write_half
                .write_all(b"{\"result\":\"QA401 Audio Analyzer\"}\n")
                .await
                .unwrap();
        });

        let mut proxy = TcpBinding
            .connect("127.0.0.1", port, SERVICE_NAME)
            .await
            .unwrap();
        let name = proxy.get_name().await.unwrap();
        assert_eq!(name, "QA401 Audio Analyzer");
    }

    #[tokio::test]
    async fn closed_channel_surfaces_as_io_error() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut proxy = TcpBinding
            .connect("127.0.0.1", port, SERVICE_NAME)
            .await
            .unwrap();
        let err = proxy.get_name().await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
