use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::error::{AcquisitionError, CommandError};
use crate::proxy::{AcquisitionState, GeneratorSpec, InputAttenState, UnitsMode};
use crate::session::Session;

/// Drives the analyzer's capture engine through an established session.
pub struct Acquisition<'a> {
    session: &'a Session,
}

impl<'a> Acquisition<'a> {
    pub fn new(session: &'a Session) -> Self {
        Acquisition { session }
    }

    /// Start free-running acquisition, like pressing Run on the analyzer.
    /// Captured buffers are read back later via the measurement accessors.
    pub async fn start_continuous(&self) -> Result<(), CommandError> {
        self.session.dispatch(|proxy| proxy.run()).await
    }

    pub async fn stop_continuous(&self) -> Result<(), CommandError> {
        self.session.dispatch(|proxy| proxy.stop()).await
    }

    /// Trigger a single acquisition and poll until the instrument reports
    /// Idle again. Polls are spaced by `poll_interval`, and the whole call,
    /// the `RunSingle` trigger included, is bounded by `limit`; if the
    /// instrument never leaves Busy the call returns
    /// `AcquisitionError::Timeout` instead of spinning. Dropping the
    /// returned future abandons the wait cleanly, so callers can race it
    /// against their own shutdown signal.
    pub async fn run_single_and_wait(
        &self,
        poll_interval: Duration,
        limit: Duration,
    ) -> Result<(), AcquisitionError> {
        let single_shot = async {
            self.session.dispatch(|proxy| proxy.run_single()).await?;
            self.poll_until_idle(poll_interval).await
        };
        match timeout(limit, single_shot).await {
            Ok(result) => result,
            Err(_) => Err(AcquisitionError::Timeout { limit }),
        }
    }

    async fn poll_until_idle(&self, poll_interval: Duration) -> Result<(), AcquisitionError> {
        loop {
            let state = self
                .session
                .dispatch(|proxy| proxy.get_acquisition_state())
                .await?;
            if state == AcquisitionState::Idle {
                return Ok(());
            }
            sleep(poll_interval).await;
        }
    }

    pub async fn set_generator(&self, spec: GeneratorSpec) -> Result<(), CommandError> {
        self.session
            .dispatch(move |proxy| proxy.set_generator(spec))
            .await
    }

    /// Play a tone through the generator for `duration_ms` milliseconds.
    pub async fn generate_tone(
        &self,
        amplitude_db: f64,
        frequency_hz: f64,
        duration_ms: f64,
    ) -> Result<(), CommandError> {
        self.session
            .dispatch(move |proxy| proxy.generate_tone(amplitude_db, frequency_hz, duration_ms))
            .await
    }

    pub async fn set_input_attenuation(&self, state: InputAttenState) -> Result<(), CommandError> {
        self.session
            .dispatch(move |proxy| proxy.set_input_atten(state))
            .await
    }

    pub async fn set_units(&self, mode: UnitsMode) -> Result<(), CommandError> {
        self.session.dispatch(move |proxy| proxy.set_units(mode)).await
    }
}
