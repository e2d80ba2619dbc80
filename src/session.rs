use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{CommandError, SessionError, TransportError};
use crate::proxy::{Binding, InstrumentProxy};
use crate::transport::{DEFAULT_PORT, SERVICE_NAME, TcpBinding};

/// Where the analyzer's remote object lives.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub service: String,
}

impl Endpoint {
    /// Endpoint for a QA401 analyzer application running on `host` with its
    /// stock remote-control settings.
    pub fn qa401(host: impl Into<String>) -> Self {
        Endpoint {
            host: host.into(),
            port: DEFAULT_PORT,
            service: SERVICE_NAME.to_string(),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::qa401("localhost")
    }
}

enum State {
    Disconnected,
    Connected(Box<dyn InstrumentProxy>),
}

/// Owns the proxy and its validity. The session starts Disconnected, goes
/// Connected only through a successful `establish` (bind plus identity
/// probe), and falls back to Disconnected whenever a dispatched call fails.
/// It never reconnects on its own: after any fault the caller decides when
/// to call `establish` again.
pub struct Session {
    binding: Box<dyn Binding>,
    endpoint: Endpoint,
    state: Mutex<State>,
}

impl Session {
    pub fn new(binding: Box<dyn Binding>, endpoint: Endpoint) -> Self {
        Session {
            binding,
            endpoint,
            state: Mutex::new(State::Disconnected),
        }
    }

    /// Session over the default TCP channel.
    pub fn tcp(endpoint: Endpoint) -> Self {
        Session::new(Box::new(TcpBinding), endpoint)
    }

    /// Bind the remote object and probe it with a `GetName` round trip. A
    /// binding that succeeds but whose probe fails leaves the session
    /// Disconnected; the two failures carry different operator guidance.
    pub async fn establish(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        // Drop any stale proxy before rebinding.
        *state = State::Disconnected;
        let mut proxy = self
            .binding
            .connect(&self.endpoint.host, self.endpoint.port, &self.endpoint.service)
            .await
            .map_err(SessionError::Bind)?;
        let name = proxy.get_name().await.map_err(SessionError::Probe)?;
        info!("session established with {name}");
        *state = State::Connected(proxy);
        Ok(())
    }

    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.lock().await, State::Connected(_))
    }

    /// Force Disconnected. Harmless if already disconnected.
    pub async fn invalidate(&self) {
        *self.state.lock().await = State::Disconnected;
    }

    /// The single guarded boundary every remote call goes through. Checks
    /// readiness and runs the operation under one lock, so check-then-act
    /// is atomic and concurrent callers serialize. Any transport fault
    /// invalidates the session before it is surfaced; the caller never has
    /// to repeat that policy.
    pub async fn dispatch<T, F>(&self, op: F) -> Result<T, CommandError>
    where
        F: for<'a> FnOnce(&'a mut dyn InstrumentProxy) -> BoxFuture<'a, Result<T, TransportError>>
            + Send,
    {
        let mut state = self.state.lock().await;
        let proxy = match &mut *state {
            State::Connected(proxy) => proxy.as_mut(),
            State::Disconnected => return Err(CommandError::NotConnected),
        };
        let result = op(proxy).await;
        match result {
            Ok(value) => Ok(value),
            Err(cause) => {
                warn!("remote call failed, invalidating session: {cause}");
                *state = State::Disconnected;
                Err(CommandError::Transport(cause))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_without_establish_is_rejected() {
        let session = Session::tcp(Endpoint::default());
        assert!(!session.is_ready().await);
        let err = session
            .dispatch(|proxy| proxy.get_name())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotConnected));
    }
}
