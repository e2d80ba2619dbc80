use crate::error::CommandError;
use crate::proxy::{ChannelSelector, SampleBuffer};
use crate::session::Session;

/// Retrieves captured buffers and asks the instrument for derived scalar
/// measurements. Buffer contents are never interpreted locally; the
/// analyzer owns all signal processing.
pub struct Measurements<'a> {
    session: &'a Session,
}

impl<'a> Measurements<'a> {
    pub fn new(session: &'a Session) -> Self {
        Measurements { session }
    }

    /// Last captured frequency-domain buffer for `channel`. `None` means
    /// nothing has been collected yet, which is a normal state right after
    /// connecting, not an error.
    pub async fn get_frequency_data(
        &self,
        channel: ChannelSelector,
    ) -> Result<Option<SampleBuffer>, CommandError> {
        self.session
            .dispatch(move |proxy| proxy.get_data(channel))
            .await
    }

    pub async fn get_time_data(
        &self,
        channel: ChannelSelector,
    ) -> Result<Option<SampleBuffer>, CommandError> {
        self.session
            .dispatch(move |proxy| proxy.get_time_data(channel))
            .await
    }

    pub async fn compute_power_db(
        &self,
        buffer: Option<&SampleBuffer>,
    ) -> Result<f64, CommandError> {
        let buffer = require_buffer(buffer)?;
        self.session
            .dispatch(move |proxy| proxy.compute_power_db(buffer))
            .await
    }

    pub async fn compute_thd_pct(
        &self,
        buffer: Option<&SampleBuffer>,
        fundamental_hz: f64,
        max_harmonic_hz: f64,
    ) -> Result<f64, CommandError> {
        let buffer = require_buffer(buffer)?;
        self.session
            .dispatch(move |proxy| proxy.compute_thd_pct(buffer, fundamental_hz, max_harmonic_hz))
            .await
    }

    pub async fn compute_thdn_pct(
        &self,
        buffer: Option<&SampleBuffer>,
        fundamental_hz: f64,
        low_hz: f64,
        high_hz: f64,
    ) -> Result<f64, CommandError> {
        let buffer = require_buffer(buffer)?;
        self.session
            .dispatch(move |proxy| proxy.compute_thdn_pct(buffer, fundamental_hz, low_hz, high_hz))
            .await
    }

    pub async fn compute_peak_power_db(
        &self,
        buffer: Option<&SampleBuffer>,
    ) -> Result<f64, CommandError> {
        let buffer = require_buffer(buffer)?;
        self.session
            .dispatch(move |proxy| proxy.compute_peak_power_db(buffer))
            .await
    }
}

/// An absent buffer is rejected here, before anything touches the wire.
fn require_buffer(buffer: Option<&SampleBuffer>) -> Result<SampleBuffer, CommandError> {
    buffer
        .cloned()
        .ok_or_else(|| CommandError::InvalidArgument("no sample buffer collected yet".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_buffer_is_an_invalid_argument() {
        let err = require_buffer(None).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }

    #[test]
    fn empty_buffer_is_still_a_buffer() {
        let empty = SampleBuffer { points: vec![] };
        assert!(require_buffer(Some(&empty)).is_ok());
    }
}
