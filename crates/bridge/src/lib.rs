pub mod dis;
pub mod dr;
pub mod geo;
pub mod hla;
pub mod net;
pub mod nib;
pub mod ntm;
pub mod player;
pub mod units;

pub use dis::{EntityId, EntityType, Pdu, decode_datagram};
pub use geo::GamingArea;
pub use hla::{HlaError, HlaNetIo, MemoryRti, RtiAmbassador};
pub use net::{
    DEFAULT_DIS_PORT, DisNetIo, MemoryHandler, NetEvent, NetHandler, NetIoConfig, NetworkStats,
    RemovalReason, Timeline, UdpHandler,
};
pub use nib::{Nib, NibTable};
pub use ntm::{Ntm, NtmEntry};
pub use player::{Player, PlayerHandle, PlayerMode, Simulation, TemplateRegistry};
