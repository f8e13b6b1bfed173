use bytemuck::{Pod, Zeroable};

use super::enums::PduType;
use super::order::{WireRecord, swap_f32};
use super::records::{
    BurstDescriptor, DeadReckoningParameters, EntityIdentifier, EntityMarking, EntityType,
    EulerAngles, EventIdentifier, PduHeader, VectorDis, WorldCoordinates,
};

/// Fixed part of a PDU: a wire record that starts with the header.
pub trait PduRecord: WireRecord {
    const PDU_TYPE: PduType;

    fn header(&self) -> &PduHeader;
    fn header_mut(&mut self) -> &mut PduHeader;

    /// Fills type and family in the header; length is set at encode time.
    fn stamp(&mut self, protocol_version: u8, exercise_id: u8, timestamp: u32) {
        let header = self.header_mut();
        header.protocol_version = protocol_version;
        header.exercise_id = exercise_id;
        header.pdu_type = Self::PDU_TYPE as u8;
        header.protocol_family = Self::PDU_TYPE.family() as u8;
        header.timestamp = timestamp;
    }
}

macro_rules! pdu_record {
    ($($ty:ty => $pdu_type:ident),* $(,)?) => {
        $(
            impl $crate::dis::pdu::PduRecord for $ty {
                const PDU_TYPE: $crate::dis::enums::PduType = $crate::dis::enums::PduType::$pdu_type;

                fn header(&self) -> &$crate::dis::records::PduHeader {
                    &self.header
                }

                fn header_mut(&mut self) -> &mut $crate::dis::records::PduHeader {
                    &mut self.header
                }
            }
        )*
    };
}
pub(crate) use pdu_record;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct EntityStatePdu {
    pub header: PduHeader,
    pub entity_id: EntityIdentifier,
    pub force_id: u8,
    pub number_of_articulation_parameters: u8,
    pub entity_type: EntityType,
    pub alternative_entity_type: EntityType,
    pub entity_linear_velocity: VectorDis,
    pub entity_location: WorldCoordinates,
    pub entity_orientation: EulerAngles,
    pub appearance: u32,
    pub dead_reckoning: DeadReckoningParameters,
    pub entity_marking: EntityMarking,
    pub capabilities: u32,
}

impl WireRecord for EntityStatePdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.entity_id.swap_bytes();
        self.entity_type.swap_bytes();
        self.alternative_entity_type.swap_bytes();
        self.entity_linear_velocity.swap_bytes();
        self.entity_location.swap_bytes();
        self.entity_orientation.swap_bytes();
        self.appearance = self.appearance.swap_bytes();
        self.dead_reckoning.swap_bytes();
        self.entity_marking.swap_bytes();
        self.capabilities = self.capabilities.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FirePdu {
    pub header: PduHeader,
    pub firing_entity_id: EntityIdentifier,
    pub target_entity_id: EntityIdentifier,
    pub munition_id: EntityIdentifier,
    pub event_id: EventIdentifier,
    pub fire_mission_index: u32,
    pub location: WorldCoordinates,
    pub burst: BurstDescriptor,
    pub velocity: VectorDis,
    pub range: f32,
}

impl WireRecord for FirePdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.firing_entity_id.swap_bytes();
        self.target_entity_id.swap_bytes();
        self.munition_id.swap_bytes();
        self.event_id.swap_bytes();
        self.fire_mission_index = self.fire_mission_index.swap_bytes();
        self.location.swap_bytes();
        self.burst.swap_bytes();
        self.velocity.swap_bytes();
        self.range = swap_f32(self.range);
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DetonationPdu {
    pub header: PduHeader,
    pub firing_entity_id: EntityIdentifier,
    pub target_entity_id: EntityIdentifier,
    pub munition_id: EntityIdentifier,
    pub event_id: EventIdentifier,
    pub velocity: VectorDis,
    pub location: WorldCoordinates,
    pub burst: BurstDescriptor,
    pub location_in_entity: VectorDis,
    pub detonation_result: u8,
    pub number_of_articulation_parameters: u8,
    pub padding: u16,
}

impl WireRecord for DetonationPdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.firing_entity_id.swap_bytes();
        self.target_entity_id.swap_bytes();
        self.munition_id.swap_bytes();
        self.event_id.swap_bytes();
        self.velocity.swap_bytes();
        self.location.swap_bytes();
        self.burst.swap_bytes();
        self.location_in_entity.swap_bytes();
        self.padding = self.padding.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DesignatorPdu {
    pub header: PduHeader,
    pub designating_entity_id: EntityIdentifier,
    pub code_name: u16,
    pub designated_entity_id: EntityIdentifier,
    pub designator_code: u16,
    pub designator_power: f32,
    pub designator_wavelength: f32,
    pub designator_spot_wrt_designated: VectorDis,
    pub designator_spot_location: WorldCoordinates,
    pub dead_reckoning_algorithm: u8,
    pub padding1: u8,
    pub padding2: u16,
    pub entity_linear_acceleration: VectorDis,
}

impl WireRecord for DesignatorPdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.designating_entity_id.swap_bytes();
        self.code_name = self.code_name.swap_bytes();
        self.designated_entity_id.swap_bytes();
        self.designator_code = self.designator_code.swap_bytes();
        self.designator_power = swap_f32(self.designator_power);
        self.designator_wavelength = swap_f32(self.designator_wavelength);
        self.designator_spot_wrt_designated.swap_bytes();
        self.designator_spot_location.swap_bytes();
        self.padding2 = self.padding2.swap_bytes();
        self.entity_linear_acceleration.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct IffAtcNavaidsPdu {
    pub header: PduHeader,
    pub emitting_entity_id: EntityIdentifier,
    pub event_id: EventIdentifier,
    pub location: VectorDis,
    pub system_type: u16,
    pub system_name: u16,
    pub system_mode: u8,
    pub change_options: u8,
    pub padding: u16,
    pub system_status: u8,
    pub alternate_parameter_4: u8,
    pub information_layers: u8,
    pub modifier: u8,
    pub parameters: [u16; 6],
}

impl WireRecord for IffAtcNavaidsPdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.emitting_entity_id.swap_bytes();
        self.event_id.swap_bytes();
        self.location.swap_bytes();
        self.system_type = self.system_type.swap_bytes();
        self.system_name = self.system_name.swap_bytes();
        self.padding = self.padding.swap_bytes();
        for parameter in &mut self.parameters {
            *parameter = parameter.swap_bytes();
        }
    }
}

pdu_record! {
    EntityStatePdu => EntityState,
    FirePdu => Fire,
    DetonationPdu => Detonation,
    DesignatorPdu => Designator,
    IffAtcNavaidsPdu => IffAtcNavaids,
}

const _: () = assert!(std::mem::size_of::<EntityStatePdu>() == 144);
const _: () = assert!(std::mem::size_of::<FirePdu>() == 96);
const _: () = assert!(std::mem::size_of::<DetonationPdu>() == 104);
const _: () = assert!(std::mem::size_of::<DesignatorPdu>() == 88);
const _: () = assert!(std::mem::size_of::<IffAtcNavaidsPdu>() == 60);
