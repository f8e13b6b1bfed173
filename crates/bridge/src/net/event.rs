use std::fmt;

use glam::DVec3;

use crate::dis::{DetonationResult, EntityId, EventIdentifier};
use crate::player::PlayerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Deactivated,
    TimedOut,
    Deleted,
}

/// Something a NetIO saw or did that the host application may act on.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    EntityCreated {
        id: EntityId,
        player: Option<PlayerHandle>,
    },
    EntityRemoved {
        id: EntityId,
        reason: RemovalReason,
    },
    WeaponFired {
        shooter: EntityId,
        munition: EntityId,
        target: EntityId,
        event: EventIdentifier,
    },
    Detonation {
        shooter: EntityId,
        munition: EntityId,
        target: EntityId,
        /// Set when the target is one of our players.
        local_target: Option<PlayerHandle>,
        result: DetonationResult,
        /// Gaming-area NED position.
        location: DVec3,
    },
    EmissionUpdated {
        id: EntityId,
        systems: usize,
    },
    RadioUpdated {
        id: EntityId,
        radio_id: u16,
    },
    SignalReceived {
        id: EntityId,
        radio_id: u16,
        data: Vec<u8>,
    },
    StartResume {
        originator: EntityId,
        request_id: u32,
    },
    StopFreeze {
        originator: EntityId,
        request_id: u32,
    },
    Comment {
        originator: EntityId,
        text: Vec<String>,
    },
}

impl fmt::Display for NetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetEvent::EntityCreated { id, player } => match player {
                Some(_) => write!(f, "entity {id} joined"),
                None => write!(f, "entity {id} joined (no template)"),
            },
            NetEvent::EntityRemoved { id, reason } => write!(f, "entity {id} removed ({reason:?})"),
            NetEvent::WeaponFired {
                shooter,
                munition,
                target,
                ..
            } => write!(f, "{shooter} fired {munition} at {target}"),
            NetEvent::Detonation {
                munition,
                target,
                result,
                local_target,
                ..
            } => {
                write!(f, "{munition} detonated on {target}: {result:?}")?;
                if local_target.is_some() {
                    f.write_str(" [ours]")?;
                }
                Ok(())
            }
            NetEvent::EmissionUpdated { id, systems } => {
                write!(f, "entity {id} emitting {systems} systems")
            }
            NetEvent::RadioUpdated { id, radio_id } => write!(f, "entity {id} radio {radio_id}"),
            NetEvent::SignalReceived { id, radio_id, data } => {
                write!(f, "signal from {id} radio {radio_id}: {} bytes", data.len())
            }
            NetEvent::StartResume { originator, .. } => write!(f, "start/resume from {originator}"),
            NetEvent::StopFreeze { originator, .. } => write!(f, "stop/freeze from {originator}"),
            NetEvent::Comment { originator, text } => {
                write!(f, "comment from {originator}: {}", text.join(" | "))
            }
        }
    }
}
