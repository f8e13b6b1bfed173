use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::dis::{
    ArticulationParameter, ByteOrder, EntityId, EntityMarking, EntityType, EulerAngles,
    VectorDis, WireCodec, WireError, WireRecord, WorldCoordinates, checked_slice,
};
use crate::dr::DrAlgorithm;
use crate::nib::{Nib, StagedArticulation, StagedEntityState, bits_to_level, level_to_bits};

use super::HlaError;

/// Object identifiers travel as NUL-padded names in a fixed buffer.
pub const OBJECT_NAME_SIZE: usize = 64;

/// Published attributes of the RPR BaseEntity/PhysicalEntity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    EntityIdentifier,
    EntityType,
    Spatial,
    ForceIdentifier,
    Marking,
    DamageState,
    SmokePlumePresent,
    FlamesPresent,
    CamouflageType,
    ArticulatedParameters,
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Attribute::EntityIdentifier,
        Attribute::EntityType,
        Attribute::Spatial,
        Attribute::ForceIdentifier,
        Attribute::Marking,
        Attribute::DamageState,
        Attribute::SmokePlumePresent,
        Attribute::FlamesPresent,
        Attribute::CamouflageType,
        Attribute::ArticulatedParameters,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::EntityIdentifier => "EntityIdentifier",
            Attribute::EntityType => "EntityType",
            Attribute::Spatial => "Spatial",
            Attribute::ForceIdentifier => "ForceIdentifier",
            Attribute::Marking => "Marking",
            Attribute::DamageState => "DamageState",
            Attribute::SmokePlumePresent => "SmokePlumePresent",
            Attribute::FlamesPresent => "FlamesPresent",
            Attribute::CamouflageType => "CamouflageType",
            Attribute::ArticulatedParameters => "ArticulatedParametersArray",
        }
    }

    pub fn flag(self) -> AttributeFlags {
        match self {
            Attribute::EntityIdentifier => AttributeFlags::ENTITY_IDENTIFIER,
            Attribute::EntityType => AttributeFlags::ENTITY_TYPE,
            Attribute::Spatial => AttributeFlags::SPATIAL,
            Attribute::ForceIdentifier => AttributeFlags::FORCE_IDENTIFIER,
            Attribute::Marking => AttributeFlags::MARKING,
            Attribute::DamageState => AttributeFlags::DAMAGE_STATE,
            Attribute::SmokePlumePresent => AttributeFlags::SMOKE_PLUME_PRESENT,
            Attribute::FlamesPresent => AttributeFlags::FLAMES_PRESENT,
            Attribute::CamouflageType => AttributeFlags::CAMOUFLAGE_TYPE,
            Attribute::ArticulatedParameters => AttributeFlags::ARTICULATED_PARAMETERS,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// Set of attributes, used as the dirty mask of an output object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFlags: u16 {
        const ENTITY_IDENTIFIER = 1 << 0;
        const ENTITY_TYPE = 1 << 1;
        const SPATIAL = 1 << 2;
        const FORCE_IDENTIFIER = 1 << 3;
        const MARKING = 1 << 4;
        const DAMAGE_STATE = 1 << 5;
        const SMOKE_PLUME_PRESENT = 1 << 6;
        const FLAMES_PRESENT = 1 << 7;
        const CAMOUFLAGE_TYPE = 1 << 8;
        const ARTICULATED_PARAMETERS = 1 << 9;

        const APPEARANCE = Self::DAMAGE_STATE.bits()
            | Self::SMOKE_PLUME_PRESENT.bits()
            | Self::FLAMES_PRESENT.bits()
            | Self::CAMOUFLAGE_TYPE.bits();
    }
}

impl AttributeFlags {
    pub fn attributes(self) -> impl Iterator<Item = Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(move |attribute| self.contains(attribute.flag()))
    }
}

/// RPR spatial record: dead-reckoning algorithm, frozen flag and the
/// geocentric state the algorithm extrapolates from.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpatialRecord {
    pub dead_reckoning_algorithm: u8,
    pub is_frozen: u8,
    pub padding: [u8; 6],
    pub world_location: WorldCoordinates,
    pub orientation: EulerAngles,
    pub velocity: VectorDis,
    pub acceleration: VectorDis,
    pub angular_velocity: VectorDis,
}

impl WireRecord for SpatialRecord {
    fn swap_bytes(&mut self) {
        self.world_location.swap_bytes();
        self.orientation.swap_bytes();
        self.velocity.swap_bytes();
        self.acceleration.swap_bytes();
        self.angular_velocity.swap_bytes();
    }
}

const _: () = assert!(std::mem::size_of::<SpatialRecord>() == 80);

fn codec() -> WireCodec {
    WireCodec::new(ByteOrder::NETWORK)
}

fn encode_record<T: WireRecord>(value: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(T::SIZE);
    codec().write(value, &mut out);
    out
}

fn encode_u32(value: u32) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn decode_u32(bytes: &[u8]) -> Result<u32, WireError> {
    codec().read_u32(bytes, 0)
}

fn encode_articulations(parameters: &[ArticulationParameter]) -> Vec<u8> {
    let mut out = encode_u32(parameters.len() as u32);
    for parameter in parameters {
        codec().write(parameter, &mut out);
    }
    out
}

fn decode_articulations(bytes: &[u8]) -> Result<Vec<ArticulationParameter>, WireError> {
    let count = decode_u32(bytes)? as usize;
    checked_slice(bytes, 4, count.saturating_mul(ArticulationParameter::SIZE))?;
    (0..count)
        .map(|idx| codec().read(bytes, 4 + idx * ArticulationParameter::SIZE))
        .collect()
}

/// `name` NUL-padded into a fixed buffer; longer names are cut so the last
/// byte stays NUL.
pub fn object_name_buffer(name: &str) -> [u8; OBJECT_NAME_SIZE] {
    let mut buf = [0u8; OBJECT_NAME_SIZE];
    let mut len = name.len().min(OBJECT_NAME_SIZE - 1);
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

pub fn name_from_buffer(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Current value of `attribute` for an output NIB, in network order.
pub fn encode_attribute(attribute: Attribute, nib: &Nib) -> Vec<u8> {
    match attribute {
        Attribute::EntityIdentifier => encode_record(&nib.entity_id()),
        Attribute::EntityType => encode_record(&nib.entity_type()),
        Attribute::Spatial => {
            let k = nib.kinematics;
            encode_record(&SpatialRecord {
                dead_reckoning_algorithm: nib.dr_algorithm() as u8,
                is_frozen: u8::from(nib.appearance.frozen),
                world_location: k.position.into(),
                orientation: k.orientation.into(),
                velocity: k.velocity.into(),
                acceleration: k.acceleration.into(),
                angular_velocity: k.angular_velocity.into(),
                ..Default::default()
            })
        }
        Attribute::ForceIdentifier => vec![nib.force_id()],
        Attribute::Marking => encode_record(&EntityMarking::from_text(&nib.marking)),
        Attribute::DamageState => {
            let state = if nib.mode.is_destroyed() {
                3
            } else {
                level_to_bits(nib.appearance.damage)
            };
            encode_u32(state)
        }
        Attribute::SmokePlumePresent => encode_u32(u32::from(nib.appearance.smoke >= 0.5)),
        Attribute::FlamesPresent => encode_u32(u32::from(nib.appearance.flames >= 0.5)),
        Attribute::CamouflageType => encode_u32(u32::from(nib.appearance.camouflage.min(4))),
        Attribute::ArticulatedParameters => encode_articulations(&nib.articulations),
    }
}

/// Reflected object state accumulated across partial updates.
#[derive(Debug, Clone, Default)]
pub struct ReflectedEntity {
    pub entity_id: Option<EntityId>,
    pub staged: StagedEntityState,
}

impl ReflectedEntity {
    /// Folds one reflected attribute into the staged state.
    pub fn reflect(&mut self, attribute: Attribute, bytes: &[u8]) -> Result<(), HlaError> {
        let wire = |source| HlaError::Attribute { attribute, source };
        let staged = &mut self.staged;
        match attribute {
            Attribute::EntityIdentifier => {
                self.entity_id = Some(codec().read::<EntityId>(bytes, 0).map_err(wire)?);
            }
            Attribute::EntityType => {
                staged.entity_type = codec().read::<EntityType>(bytes, 0).map_err(wire)?;
            }
            Attribute::Spatial => {
                let spatial: SpatialRecord = codec().read(bytes, 0).map_err(wire)?;
                staged.dr_algorithm = DrAlgorithm::from_u8(spatial.dead_reckoning_algorithm);
                staged.appearance.frozen = spatial.is_frozen != 0;
                staged.position = spatial.world_location.into();
                staged.orientation = spatial.orientation.into();
                staged.velocity = spatial.velocity.into();
                staged.acceleration = spatial.acceleration.into();
                staged.angular_velocity = spatial.angular_velocity.into();
            }
            Attribute::ForceIdentifier => {
                staged.force_id = checked_slice(bytes, 0, 1).map_err(wire)?[0];
            }
            Attribute::Marking => {
                staged.marking = codec().read::<EntityMarking>(bytes, 0).map_err(wire)?.text();
            }
            Attribute::DamageState => {
                staged.appearance.damage = bits_to_level(decode_u32(bytes).map_err(wire)?);
            }
            Attribute::SmokePlumePresent => {
                staged.appearance.smoke = flag_level(decode_u32(bytes).map_err(wire)?);
            }
            Attribute::FlamesPresent => {
                staged.appearance.flames = flag_level(decode_u32(bytes).map_err(wire)?);
            }
            Attribute::CamouflageType => {
                staged.appearance.camouflage = decode_u32(bytes).map_err(wire)?.min(4) as u8;
            }
            Attribute::ArticulatedParameters => {
                let parameters = decode_articulations(bytes).map_err(wire)?;
                staged.articulation = StagedArticulation::from_parameters(parameters);
            }
        }
        Ok(())
    }
}

fn flag_level(value: u32) -> f64 {
    if value != 0 { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dis::part;
    use crate::player::{PlayerArena, PlayerMode};
    use glam::DVec3;

    fn nib() -> Nib {
        let mut arena = PlayerArena::new();
        let handle = arena.insert(Default::default());
        let mut nib = Nib::new_output(EntityId::new(1, 2, 3), handle, "test", DrAlgorithm::Rvw);
        nib.set_entity_type(1, 2, 225, 1, 3, 0, 0);
        nib
    }

    #[test]
    fn test_flags_enumerate_attributes() {
        let attributes: Vec<_> = AttributeFlags::APPEARANCE.attributes().collect();
        assert_eq!(
            attributes,
            vec![
                Attribute::DamageState,
                Attribute::SmokePlumePresent,
                Attribute::FlamesPresent,
                Attribute::CamouflageType
            ]
        );
        assert_eq!(AttributeFlags::all().attributes().count(), Attribute::ALL.len());
    }

    #[test]
    fn test_identifier_is_network_order() {
        let bytes = encode_attribute(Attribute::EntityIdentifier, &nib());
        assert_eq!(bytes, vec![0, 1, 0, 2, 0, 3]);
    }

    #[test]
    fn test_reflect_spatial_and_appearance() {
        let mut source = nib();
        source.kinematics.position = DVec3::new(6_378_137.0, 10.0, -20.0);
        source.kinematics.velocity = DVec3::new(0.0, 200.0, 0.0);
        source.kinematics.orientation = DVec3::new(0.1, 0.2, 0.3);
        source.appearance.frozen = true;
        source.appearance.damage = 0.5;
        source.appearance.camouflage = 3;
        source.mode = PlayerMode::Active;

        let mut reflected = ReflectedEntity::default();
        for attribute in Attribute::ALL {
            reflected
                .reflect(attribute, &encode_attribute(attribute, &source))
                .unwrap();
        }
        let staged = &reflected.staged;
        assert_eq!(reflected.entity_id, Some(EntityId::new(1, 2, 3)));
        assert_eq!(staged.entity_type, source.entity_type());
        assert_eq!(staged.dr_algorithm, DrAlgorithm::Rvw);
        assert_eq!(staged.position, source.kinematics.position);
        assert!((staged.orientation - source.kinematics.orientation).length() < 1e-6);
        assert!(staged.appearance.frozen);
        assert_eq!(staged.appearance.damage, 0.33);
        assert_eq!(staged.appearance.camouflage, 3);
    }

    #[test]
    fn test_destroyed_mode_reports_destroyed() {
        let mut source = nib();
        source.mode = PlayerMode::Killed;
        assert_eq!(encode_attribute(Attribute::DamageState, &source), vec![0, 0, 0, 3]);
    }

    #[test]
    fn test_articulations_bounded_by_buffer() {
        let mut source = nib();
        source.articulations = vec![ArticulationParameter::articulated(
            part::WING_SWEEP + part::POSITION,
            0.5,
        )];
        let mut bytes = encode_attribute(Attribute::ArticulatedParameters, &source);
        let mut reflected = ReflectedEntity::default();
        reflected
            .reflect(Attribute::ArticulatedParameters, &bytes)
            .unwrap();
        assert_eq!(reflected.staged.articulation.wing_sweep, Some(0.5));

        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            reflected.reflect(Attribute::ArticulatedParameters, &bytes),
            Err(HlaError::Attribute { .. })
        ));
    }

    #[test]
    fn test_object_name_buffer() {
        let buf = object_name_buffer("simbridge.1.2.3");
        assert_eq!(name_from_buffer(&buf), "simbridge.1.2.3");

        let long = "x".repeat(100);
        let buf = object_name_buffer(&long);
        assert_eq!(buf[OBJECT_NAME_SIZE - 1], 0);
        assert_eq!(name_from_buffer(&buf).len(), OBJECT_NAME_SIZE - 1);
    }
}
