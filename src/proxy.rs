use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Whether the analyzer is between acquisitions or mid-capture. Owned by the
/// remote instrument; the client only ever observes it via polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionState {
    Idle,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ChannelSelector {
    #[value(name = "left")]
    LeftIn,
    #[value(name = "right")]
    RightIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum GenKind {
    Gen1,
    Gen2,
}

/// One-shot generator configuration. Sent to the instrument and not
/// retained on the client side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub kind: GenKind,
    pub enabled: bool,
    pub amplitude_db: f64,
    pub frequency_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum InputAttenState {
    #[value(name = "none")]
    NoAtten,
    #[value(name = "20db")]
    Db20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum UnitsMode {
    #[value(name = "dbv")]
    DbV,
    #[value(name = "dbfs")]
    DbFs,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

/// A captured sweep: ordered (x, y) pairs in either the frequency or the
/// time domain. "Nothing captured yet" is modelled as `Option::None` by the
/// callers, which is distinct from an empty buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBuffer {
    pub points: Vec<PointD>,
}

impl SampleBuffer {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The QA401 analyzer's remote interface. Mirrors the method set the
/// instrument service publishes; implementations only marshal calls, all
/// signal processing happens on the instrument side.
#[async_trait]
pub trait InstrumentProxy: Send {
    async fn get_name(&mut self) -> Result<String, TransportError>;

    async fn run(&mut self) -> Result<(), TransportError>;
    async fn stop(&mut self) -> Result<(), TransportError>;
    async fn run_single(&mut self) -> Result<(), TransportError>;
    async fn get_acquisition_state(&mut self) -> Result<AcquisitionState, TransportError>;

    async fn get_data(
        &mut self,
        channel: ChannelSelector,
    ) -> Result<Option<SampleBuffer>, TransportError>;
    async fn get_time_data(
        &mut self,
        channel: ChannelSelector,
    ) -> Result<Option<SampleBuffer>, TransportError>;

    async fn compute_power_db(&mut self, buffer: SampleBuffer) -> Result<f64, TransportError>;
    async fn compute_thd_pct(
        &mut self,
        buffer: SampleBuffer,
        fundamental_hz: f64,
        max_harmonic_hz: f64,
    ) -> Result<f64, TransportError>;
    async fn compute_thdn_pct(
        &mut self,
        buffer: SampleBuffer,
        fundamental_hz: f64,
        low_hz: f64,
        high_hz: f64,
    ) -> Result<f64, TransportError>;
    async fn compute_peak_power_db(&mut self, buffer: SampleBuffer)
        -> Result<f64, TransportError>;

    async fn set_generator(&mut self, spec: GeneratorSpec) -> Result<(), TransportError>;
    async fn set_input_atten(&mut self, state: InputAttenState) -> Result<(), TransportError>;
    async fn set_units(&mut self, mode: UnitsMode) -> Result<(), TransportError>;
    async fn generate_tone(
        &mut self,
        amplitude_db: f64,
        frequency_hz: f64,
        duration_ms: f64,
    ) -> Result<(), TransportError>;
}

/// Remote-object activation: name -> proxy. Kept narrow so the wire
/// technology can be swapped without touching the session layer.
#[async_trait]
pub trait Binding: Send + Sync {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        service: &str,
    ) -> Result<Box<dyn InstrumentProxy>, TransportError>;
}
