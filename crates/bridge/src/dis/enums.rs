use serde::{Deserialize, Serialize};

pub const DIS_VERSION_1278_1A: u8 = 6;
pub const DIS_VERSION_1278_1_2012: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    EntityState = 1,
    Fire = 2,
    Detonation = 3,
    Collision = 4,
    CreateEntity = 11,
    RemoveEntity = 12,
    StartResume = 13,
    StopFreeze = 14,
    Acknowledge = 15,
    ActionRequest = 16,
    ActionResponse = 17,
    DataQuery = 18,
    SetData = 19,
    Data = 20,
    EventReport = 21,
    Comment = 22,
    ElectromagneticEmission = 23,
    Designator = 24,
    Transmitter = 25,
    Signal = 26,
    Receiver = 27,
    IffAtcNavaids = 28,
    CreateEntityR = 51,
    RemoveEntityR = 52,
    StartResumeR = 53,
    StopFreezeR = 54,
    AcknowledgeR = 55,
    ActionRequestR = 56,
    ActionResponseR = 57,
    DataQueryR = 58,
    SetDataR = 59,
    DataR = 60,
    EventReportR = 61,
    CommentR = 62,
}

impl PduType {
    pub fn from_u8(value: u8) -> Option<Self> {
        use PduType::*;
        Some(match value {
            1 => EntityState,
            2 => Fire,
            3 => Detonation,
            4 => Collision,
            11 => CreateEntity,
            12 => RemoveEntity,
            13 => StartResume,
            14 => StopFreeze,
            15 => Acknowledge,
            16 => ActionRequest,
            17 => ActionResponse,
            18 => DataQuery,
            19 => SetData,
            20 => Data,
            21 => EventReport,
            22 => Comment,
            23 => ElectromagneticEmission,
            24 => Designator,
            25 => Transmitter,
            26 => Signal,
            27 => Receiver,
            28 => IffAtcNavaids,
            51 => CreateEntityR,
            52 => RemoveEntityR,
            53 => StartResumeR,
            54 => StopFreezeR,
            55 => AcknowledgeR,
            56 => ActionRequestR,
            57 => ActionResponseR,
            58 => DataQueryR,
            59 => SetDataR,
            60 => DataR,
            61 => EventReportR,
            62 => CommentR,
            _ => return None,
        })
    }

    pub fn family(self) -> ProtocolFamily {
        use PduType::*;
        match self {
            EntityState | Collision => ProtocolFamily::EntityInformation,
            Fire | Detonation => ProtocolFamily::Warfare,
            CreateEntity | RemoveEntity | StartResume | StopFreeze | Acknowledge
            | ActionRequest | ActionResponse | DataQuery | SetData | Data | EventReport
            | Comment => ProtocolFamily::SimulationManagement,
            ElectromagneticEmission | Designator | IffAtcNavaids => {
                ProtocolFamily::DistributedEmissionRegeneration
            }
            Transmitter | Signal | Receiver => ProtocolFamily::RadioCommunications,
            _ => ProtocolFamily::SimulationManagementReliable,
        }
    }

    pub fn is_reliable_variant(self) -> bool {
        (self as u8) >= PduType::CreateEntityR as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolFamily {
    Other = 0,
    EntityInformation = 1,
    Warfare = 2,
    Logistics = 3,
    RadioCommunications = 4,
    SimulationManagement = 5,
    DistributedEmissionRegeneration = 6,
    SimulationManagementReliable = 10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForceId {
    Other = 0,
    Friendly = 1,
    Opposing = 2,
    Neutral = 3,
}

impl ForceId {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ForceId::Friendly,
            2 => ForceId::Opposing,
            3 => ForceId::Neutral,
            _ => ForceId::Other,
        }
    }
}

pub mod kind {
    pub const OTHER: u8 = 0;
    pub const PLATFORM: u8 = 1;
    pub const MUNITION: u8 = 2;
    pub const LIFE_FORM: u8 = 3;
    pub const ENVIRONMENTAL: u8 = 4;
    pub const CULTURAL_FEATURE: u8 = 5;
    pub const SUPPLY: u8 = 6;
    pub const RADIO: u8 = 7;
    pub const EXPENDABLE: u8 = 8;
    pub const SENSOR_EMITTER: u8 = 9;
    pub const COUNT: u8 = 10;
}

pub mod domain {
    pub const OTHER: u8 = 0;
    pub const LAND: u8 = 1;
    pub const AIR: u8 = 2;
    pub const SURFACE: u8 = 3;
    pub const SUBSURFACE: u8 = 4;
    pub const SPACE: u8 = 5;
    /// Munition domains run to directed energy (12).
    pub const COUNT: u8 = 13;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DetonationResult {
    #[default]
    Other = 0,
    EntityImpact = 1,
    EntityProximateDetonation = 2,
    GroundImpact = 3,
    GroundProximateDetonation = 4,
    Detonation = 5,
    None = 6,
}

impl DetonationResult {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::EntityImpact,
            2 => Self::EntityProximateDetonation,
            3 => Self::GroundImpact,
            4 => Self::GroundProximateDetonation,
            5 => Self::Detonation,
            6 => Self::None,
            _ => Self::Other,
        }
    }
}

/// Burst descriptor codes for the munitions we fire.
pub mod burst {
    pub const WARHEAD_HIGH_EXPLOSIVE: u16 = 1000;
    pub const FUSE_CONTACT: u16 = 1000;
}

/// Articulated part classes (type metric is added to the class).
pub mod part {
    pub const LANDING_GEAR: u32 = 3072;
    pub const LEFT_WEAPON_BAY_DOOR: u32 = 3168;
    pub const RIGHT_WEAPON_BAY_DOOR: u32 = 3200;
    pub const WING_SWEEP: u32 = 3264;
    pub const PRIMARY_LAUNCHER: u32 = 4736;

    pub const POSITION: u32 = 1;
    pub const EXTENSION: u32 = 3;
    pub const AZIMUTH: u32 = 11;
    pub const ELEVATION: u32 = 13;
}

pub mod acknowledge {
    pub const START_RESUME: u16 = 3;
    pub const STOP_FREEZE: u16 = 4;

    pub const RESPONSE_OTHER: u16 = 0;
    pub const RESPONSE_ABLE_TO_COMPLY: u16 = 1;
}

/// Site or application value addressing every simulation.
pub const ALL_SITES: u16 = 0xFFFF;
pub const ALL_APPLICATIONS: u16 = 0xFFFF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdu_type_roundtrip_and_family() {
        for code in 0..=u8::MAX {
            if let Some(pdu_type) = PduType::from_u8(code) {
                assert_eq!(pdu_type as u8, code);
            }
        }
        assert_eq!(PduType::from_u8(1), Some(PduType::EntityState));
        assert_eq!(PduType::from_u8(200), None);
        assert_eq!(PduType::Fire.family(), ProtocolFamily::Warfare);
        assert_eq!(PduType::Signal.family(), ProtocolFamily::RadioCommunications);
        assert!(PduType::CommentR.is_reliable_variant());
        assert!(!PduType::Comment.is_reliable_variant());
    }

    #[test]
    fn test_undefined_force_is_other() {
        assert_eq!(ForceId::from_u8(2), ForceId::Opposing);
        assert_eq!(ForceId::from_u8(9), ForceId::Other);
    }
}
