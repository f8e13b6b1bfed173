use std::fmt;

use simbridge::net::NetEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub enum NodeEvent {
    Started { description: String },
    Network(NetEvent),
    Launched { missile: u16, station: u32 },
    Detonated { missile: u16 },
    Frozen(bool),
    Error { message: String },
}

impl NodeEvent {
    pub fn level(&self) -> Level {
        match self {
            NodeEvent::Error { .. } => Level::Error,
            NodeEvent::Network(NetEvent::Detonation {
                local_target: Some(_),
                ..
            }) => Level::Warn,
            NodeEvent::Frozen(_) => Level::Warn,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeEvent::Started { description } => write!(f, "node started: {description}"),
            NodeEvent::Network(event) => write!(f, "{event}"),
            NodeEvent::Launched { missile, station } => {
                write!(f, "missile {missile} launched from station {station}")
            }
            NodeEvent::Detonated { missile } => write!(f, "missile {missile} detonated"),
            NodeEvent::Frozen(true) => f.write_str("simulation frozen"),
            NodeEvent::Frozen(false) => f.write_str("simulation running"),
            NodeEvent::Error { message } => f.write_str(message),
        }
    }
}
