use std::time::Duration;

use thiserror::Error;

/// Channel-level failures: the remote object could not be reached, the
/// connection broke mid-call, or the exchange itself was malformed.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to open channel to {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("channel i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("channel timed out waiting for the instrument")]
    Timeout,

    #[error("instrument reported a fault: {0}")]
    Remote(String),

    #[error("malformed exchange with instrument service: {0}")]
    Protocol(String),
}

/// Why `establish` left the session Disconnected. A bind failure usually
/// means the analyzer application is not running or the endpoint is wrong;
/// a probe failure means the channel opened but the named remote object did
/// not answer, so check that remote control is enabled in the analyzer.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("could not bind the instrument service: {0}")]
    Bind(#[source] TransportError),

    #[error("bound the service but the identity probe failed: {0}")]
    Probe(#[source] TransportError),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("session is not connected; call establish() first")]
    NotConnected,

    #[error("remote call failed and the session was invalidated: {0}")]
    Transport(#[source] TransportError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("acquisition still busy after {limit:?}")]
    Timeout { limit: Duration },

    #[error(transparent)]
    Command(#[from] CommandError),
}
