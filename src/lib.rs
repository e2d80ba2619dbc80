pub mod acquisition;
pub mod error;
pub mod measurement;
pub mod proxy;
pub mod session;
pub mod transport;

// Re-export the primary types so users can depend on the crate without
// knowing the internal module layout.
pub use acquisition::Acquisition;
pub use error::{AcquisitionError, CommandError, SessionError, TransportError};
pub use measurement::Measurements;
pub use proxy::{
    AcquisitionState, Binding, ChannelSelector, GenKind, GeneratorSpec, InputAttenState,
    InstrumentProxy, PointD, SampleBuffer, UnitsMode,
};
pub use session::{Endpoint, Session};
pub use transport::{ChannelConfig, DEFAULT_PORT, SERVICE_NAME, TcpBinding, register_tcp_channel};
