mod config;
mod dis;
mod event;
pub(crate) mod lifecycle;
mod stats;
mod transport;

pub use config::{DEFAULT_DIS_PORT, DEFAULT_EMISSION_HEARTBEAT_SECS, NetIoConfig, Timeline};
pub use dis::DisNetIo;
pub use event::{NetEvent, RemovalReason};
pub use stats::NetworkStats;
pub use transport::{MemoryHandler, NetHandler, TransportError, UdpHandler};
