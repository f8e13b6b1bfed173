use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::order::{WireRecord, swap_f32, swap_f64};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PduHeader {
    pub protocol_version: u8,
    pub exercise_id: u8,
    pub pdu_type: u8,
    pub protocol_family: u8,
    pub timestamp: u32,
    pub length: u16,
    pub status: u8,
    pub padding: u8,
}

impl WireRecord for PduHeader {
    fn swap_bytes(&mut self) {
        self.timestamp = self.timestamp.swap_bytes();
        self.length = self.length.swap_bytes();
    }
}

impl PduHeader {
    pub fn new(protocol_version: u8, exercise_id: u8, pdu_type: u8, protocol_family: u8) -> Self {
        Self {
            protocol_version,
            exercise_id,
            pdu_type,
            protocol_family,
            ..Default::default()
        }
    }
}

/// DIS EntityIdentifier: the federation-wide key of an entity.
#[repr(C)]
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
pub struct EntityIdentifier {
    pub site: u16,
    pub application: u16,
    pub entity: u16,
}

pub type EntityId = EntityIdentifier;

impl WireRecord for EntityIdentifier {
    fn swap_bytes(&mut self) {
        self.site = self.site.swap_bytes();
        self.application = self.application.swap_bytes();
        self.entity = self.entity.swap_bytes();
    }
}

impl EntityIdentifier {
    pub const NONE: EntityIdentifier = EntityIdentifier {
        site: 0,
        application: 0,
        entity: 0,
    };

    pub fn new(site: u16, application: u16, entity: u16) -> Self {
        Self {
            site,
            application,
            entity,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub fn same_simulation(&self, site: u16, application: u16) -> bool {
        self.site == site && self.application == application
    }
}

impl fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.site, self.application, self.entity)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct EventIdentifier {
    pub site: u16,
    pub application: u16,
    pub event: u16,
}

impl WireRecord for EventIdentifier {
    fn swap_bytes(&mut self) {
        self.site = self.site.swap_bytes();
        self.application = self.application.swap_bytes();
        self.event = self.event.swap_bytes();
    }
}

impl EventIdentifier {
    pub fn new(site: u16, application: u16, event: u16) -> Self {
        Self {
            site,
            application,
            event,
        }
    }
}

#[repr(C)]
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
pub struct EntityType {
    pub kind: u8,
    pub domain: u8,
    pub country: u16,
    pub category: u8,
    pub subcategory: u8,
    pub specific: u8,
    pub extra: u8,
}

impl WireRecord for EntityType {
    fn swap_bytes(&mut self) {
        self.country = self.country.swap_bytes();
    }
}

impl EntityType {
    pub const NULL: EntityType = EntityType {
        kind: 0,
        domain: 0,
        country: 0,
        category: 0,
        subcategory: 0,
        specific: 0,
        extra: 0,
    };

    pub fn new(
        kind: u8,
        domain: u8,
        country: u16,
        category: u8,
        subcategory: u8,
        specific: u8,
        extra: u8,
    ) -> Self {
        Self {
            kind,
            domain,
            country,
            category,
            subcategory,
            specific,
            extra,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}.{}",
            self.kind,
            self.domain,
            self.country,
            self.category,
            self.subcategory,
            self.specific,
            self.extra
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WorldCoordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WireRecord for WorldCoordinates {
    fn swap_bytes(&mut self) {
        self.x = swap_f64(self.x);
        self.y = swap_f64(self.y);
        self.z = swap_f64(self.z);
    }
}

impl From<DVec3> for WorldCoordinates {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<WorldCoordinates> for DVec3 {
    fn from(w: WorldCoordinates) -> Self {
        DVec3::new(w.x, w.y, w.z)
    }
}

/// Orientation of the body relative to the geocentric frame, applied as
/// psi about z, then theta about y, then phi about x.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct EulerAngles {
    pub psi: f32,
    pub theta: f32,
    pub phi: f32,
}

impl WireRecord for EulerAngles {
    fn swap_bytes(&mut self) {
        self.psi = swap_f32(self.psi);
        self.theta = swap_f32(self.theta);
        self.phi = swap_f32(self.phi);
    }
}

/// Vectors hold Euler angles as (phi, theta, psi), i.e. roll, pitch, yaw.
impl From<DVec3> for EulerAngles {
    fn from(v: DVec3) -> Self {
        Self {
            psi: v.z as f32,
            theta: v.y as f32,
            phi: v.x as f32,
        }
    }
}

impl From<EulerAngles> for DVec3 {
    fn from(e: EulerAngles) -> Self {
        DVec3::new(e.phi as f64, e.theta as f64, e.psi as f64)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VectorDis {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WireRecord for VectorDis {
    fn swap_bytes(&mut self) {
        self.x = swap_f32(self.x);
        self.y = swap_f32(self.y);
        self.z = swap_f32(self.z);
    }
}

impl From<DVec3> for VectorDis {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x as f32,
            y: v.y as f32,
            z: v.z as f32,
        }
    }
}

impl From<VectorDis> for DVec3 {
    fn from(v: VectorDis) -> Self {
        DVec3::new(v.x as f64, v.y as f64, v.z as f64)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DeadReckoningParameters {
    pub algorithm: u8,
    pub other_parameters: [u8; 15],
    pub linear_acceleration: VectorDis,
    pub angular_velocity: VectorDis,
}

impl WireRecord for DeadReckoningParameters {
    fn swap_bytes(&mut self) {
        self.linear_acceleration = self.linear_acceleration.swapped();
        self.angular_velocity = self.angular_velocity.swapped();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct EntityMarking {
    pub character_set: u8,
    pub characters: [u8; 11],
}

impl WireRecord for EntityMarking {
    fn swap_bytes(&mut self) {}
}

impl EntityMarking {
    pub const ASCII: u8 = 1;

    pub fn from_text(text: &str) -> Self {
        let mut characters = [0u8; 11];
        for (slot, byte) in characters.iter_mut().zip(text.bytes().filter(u8::is_ascii)) {
            *slot = byte;
        }
        Self {
            character_set: Self::ASCII,
            characters,
        }
    }

    pub fn text(&self) -> String {
        self.characters
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as char)
            .collect()
    }
}

/// Articulated or attached part record. The 8-byte value holds an `f32`
/// (articulated part) or an `EntityType` (attached part) in host order.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ArticulationParameter {
    pub type_designator: u8,
    pub change_indicator: u8,
    pub attached_to: u16,
    pub parameter_type: u32,
    pub value: [u8; 8],
}

impl WireRecord for ArticulationParameter {
    fn swap_bytes(&mut self) {
        self.attached_to = self.attached_to.swap_bytes();
        self.parameter_type = self.parameter_type.swap_bytes();
        match self.type_designator {
            Self::ARTICULATED_PART => self.value[0..4].reverse(),
            Self::ATTACHED_PART => self.value[2..4].reverse(),
            _ => self.value.reverse(),
        }
    }
}

impl ArticulationParameter {
    pub const ARTICULATED_PART: u8 = 0;
    pub const ATTACHED_PART: u8 = 1;

    pub fn articulated(parameter_type: u32, value: f32) -> Self {
        let mut bytes = [0u8; 8];
        bytes[0..4].copy_from_slice(&value.to_ne_bytes());
        Self {
            type_designator: Self::ARTICULATED_PART,
            change_indicator: 0,
            attached_to: 0,
            parameter_type,
            value: bytes,
        }
    }

    pub fn attached(station: u32, store: EntityType) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(bytemuck::bytes_of(&store));
        Self {
            type_designator: Self::ATTACHED_PART,
            change_indicator: 0,
            attached_to: 0,
            parameter_type: station,
            value: bytes,
        }
    }

    pub fn is_articulated(&self) -> bool {
        self.type_designator == Self::ARTICULATED_PART
    }

    pub fn is_attached(&self) -> bool {
        self.type_designator == Self::ATTACHED_PART
    }

    pub fn articulated_value(&self) -> Option<f32> {
        self.is_articulated().then(|| {
            f32::from_ne_bytes([self.value[0], self.value[1], self.value[2], self.value[3]])
        })
    }

    pub fn attached_type(&self) -> Option<EntityType> {
        self.is_attached()
            .then(|| bytemuck::pod_read_unaligned::<EntityType>(&self.value))
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BurstDescriptor {
    pub munition: EntityType,
    pub warhead: u16,
    pub fuse: u16,
    pub quantity: u16,
    pub rate: u16,
}

impl WireRecord for BurstDescriptor {
    fn swap_bytes(&mut self) {
        self.munition = self.munition.swapped();
        self.warhead = self.warhead.swap_bytes();
        self.fuse = self.fuse.swap_bytes();
        self.quantity = self.quantity.swap_bytes();
        self.rate = self.rate.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ClockTime {
    pub hour: u32,
    pub time_past_hour: u32,
}

impl WireRecord for ClockTime {
    fn swap_bytes(&mut self) {
        self.hour = self.hour.swap_bytes();
        self.time_past_hour = self.time_past_hour.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct FixedDatum {
    pub id: u32,
    pub value: u32,
}

impl WireRecord for FixedDatum {
    fn swap_bytes(&mut self) {
        self.id = self.id.swap_bytes();
        self.value = self.value.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RadioEntityType {
    pub kind: u8,
    pub domain: u8,
    pub country: u16,
    pub category: u8,
    pub nomenclature_version: u8,
    pub nomenclature: u16,
}

impl WireRecord for RadioEntityType {
    fn swap_bytes(&mut self) {
        self.country = self.country.swap_bytes();
        self.nomenclature = self.nomenclature.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ModulationType {
    pub spread_spectrum: u16,
    pub major: u16,
    pub detail: u16,
    pub system: u16,
}

impl WireRecord for ModulationType {
    fn swap_bytes(&mut self) {
        self.spread_spectrum = self.spread_spectrum.swap_bytes();
        self.major = self.major.swap_bytes();
        self.detail = self.detail.swap_bytes();
        self.system = self.system.swap_bytes();
    }
}

const _: () = assert!(std::mem::size_of::<PduHeader>() == 12);
const _: () = assert!(std::mem::size_of::<EntityIdentifier>() == 6);
const _: () = assert!(std::mem::size_of::<EventIdentifier>() == 6);
const _: () = assert!(std::mem::size_of::<EntityType>() == 8);
const _: () = assert!(std::mem::size_of::<WorldCoordinates>() == 24);
const _: () = assert!(std::mem::size_of::<EulerAngles>() == 12);
const _: () = assert!(std::mem::size_of::<VectorDis>() == 12);
const _: () = assert!(std::mem::size_of::<DeadReckoningParameters>() == 40);
const _: () = assert!(std::mem::size_of::<EntityMarking>() == 12);
const _: () = assert!(std::mem::size_of::<ArticulationParameter>() == 16);
const _: () = assert!(std::mem::size_of::<BurstDescriptor>() == 16);
const _: () = assert!(std::mem::size_of::<ClockTime>() == 8);
const _: () = assert!(std::mem::size_of::<FixedDatum>() == 8);
const _: () = assert!(std::mem::size_of::<RadioEntityType>() == 8);
const _: () = assert!(std::mem::size_of::<ModulationType>() == 8);

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dis::order::layout::{
        BURST, DEAD_RECKONING, ENTITY_TYPE, HEADER, ID, MARKING, VEC32, VEC64, assert_field_swaps,
    };

    fn assert_involution<T: WireRecord>(value: T) {
        let twice = value.swapped().swapped();
        assert_eq!(bytemuck::bytes_of(&twice), bytemuck::bytes_of(&value));
    }

    #[test]
    fn test_record_swaps_reverse_each_field() {
        assert_field_swaps::<PduHeader>(&[HEADER]);
        assert_field_swaps::<EntityIdentifier>(&[ID]);
        assert_field_swaps::<EventIdentifier>(&[ID]);
        assert_field_swaps::<EntityType>(&[ENTITY_TYPE]);
        assert_field_swaps::<WorldCoordinates>(&[VEC64]);
        assert_field_swaps::<EulerAngles>(&[VEC32]);
        assert_field_swaps::<VectorDis>(&[VEC32]);
        assert_field_swaps::<DeadReckoningParameters>(&[DEAD_RECKONING]);
        assert_field_swaps::<EntityMarking>(&[MARKING]);
        // Patterned byte 0 is 0, so this is an articulated part.
        assert_field_swaps::<ArticulationParameter>(&[&[(1, 2), (2, 1), (4, 1), (4, 1), (1, 4)]]);
        assert_field_swaps::<BurstDescriptor>(&[BURST]);
        assert_field_swaps::<ClockTime>(&[&[(4, 2)]]);
        assert_field_swaps::<FixedDatum>(&[&[(4, 2)]]);
        assert_field_swaps::<RadioEntityType>(&[&[(1, 2), (2, 1), (1, 2), (2, 1)]]);
        assert_field_swaps::<ModulationType>(&[&[(2, 4)]]);
    }

    #[test]
    fn test_swaps_hold_at_extremes() {
        for byte in [0x00, 0xFF] {
            let mut header = PduHeader::zeroed();
            bytemuck::bytes_of_mut(&mut header).fill(byte);
            assert_involution(header);
            let mut burst = BurstDescriptor::zeroed();
            bytemuck::bytes_of_mut(&mut burst).fill(byte);
            assert_involution(burst);
        }
    }

    #[test]
    fn test_swap_changes_multibyte_fields_only() {
        let mut header = PduHeader::new(6, 1, 1, 1);
        header.timestamp = 0x0102_0304;
        header.length = 0x0506;
        let swapped = header.swapped();
        assert_eq!(swapped.timestamp, 0x0403_0201);
        assert_eq!(swapped.length, 0x0605);
        assert_eq!(swapped.pdu_type, 1);
    }

    #[test]
    fn test_articulation_values_survive_swap() {
        let part = ArticulationParameter::articulated(3265, 0.75);
        assert_involution(part);
        assert_eq!(part.articulated_value(), Some(0.75));
        assert_eq!(part.attached_type(), None);

        let store = EntityType::new(2, 1, 225, 1, 1, 0, 0);
        let attached = ArticulationParameter::attached(1, store);
        assert_involution(attached);
        assert_eq!(attached.attached_type(), Some(store));
        let swapped = attached.swapped();
        assert_eq!([swapped.value[2], swapped.value[3]], [attached.value[3], attached.value[2]]);
    }

    #[test]
    fn test_marking_text_roundtrip() {
        let marking = EntityMarking::from_text("EAGLE01-LONG-NAME");
        assert_eq!(marking.character_set, EntityMarking::ASCII);
        assert_eq!(marking.text(), "EAGLE01-LON");
        assert_eq!(EntityMarking::from_text("F16").text(), "F16");
    }

    #[test]
    fn test_entity_identifier_display() {
        assert_eq!(EntityIdentifier::new(1, 2, 3).to_string(), "1:2:3");
        assert!(EntityIdentifier::NONE.is_none());
    }
}
