use glam::DVec3;

use crate::dis::{
    ByteOrder, DetonationResult, EntityType, VectorDis, WireCodec, WireRecord, WorldCoordinates,
    checked_slice,
};

use super::HlaError;
use super::rpr::{OBJECT_NAME_SIZE, name_from_buffer, object_name_buffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    EventIdentifier,
    FiringObjectIdentifier,
    TargetObjectIdentifier,
    MunitionObjectIdentifier,
    MunitionType,
    FiringLocation,
    InitialVelocityVector,
    DetonationLocation,
    FinalVelocityVector,
    DetonationResultCode,
    WarheadType,
    FuseType,
    QuantityFired,
    RateOfFire,
}

fn codec() -> WireCodec {
    WireCodec::new(ByteOrder::NETWORK)
}

fn record<T: WireRecord>(value: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(T::SIZE);
    codec().write(value, &mut out);
    out
}

fn event_identifier(count: u16, issuer: &str) -> Vec<u8> {
    let mut out = count.to_be_bytes().to_vec();
    out.extend_from_slice(&object_name_buffer(issuer));
    out
}

/// Received parameter list with typed, bounds-checked lookups.
struct Received<'a>(&'a [(Parameter, Vec<u8>)]);

impl Received<'_> {
    fn bytes(&self, parameter: Parameter) -> Result<&[u8], HlaError> {
        self.0
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, bytes)| bytes.as_slice())
            .ok_or(HlaError::MissingParameter(parameter))
    }

    fn slice(&self, parameter: Parameter, offset: usize, len: usize) -> Result<&[u8], HlaError> {
        checked_slice(self.bytes(parameter)?, offset, len)
            .map_err(|source| HlaError::Parameter { parameter, source })
    }

    fn record<T: WireRecord>(&self, parameter: Parameter) -> Result<T, HlaError> {
        codec()
            .read(self.bytes(parameter)?, 0)
            .map_err(|source| HlaError::Parameter { parameter, source })
    }

    fn name(&self, parameter: Parameter) -> Result<String, HlaError> {
        Ok(name_from_buffer(self.slice(parameter, 0, OBJECT_NAME_SIZE)?))
    }

    fn u16(&self, parameter: Parameter) -> Result<u16, HlaError> {
        let bytes = self.slice(parameter, 0, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Optional counters default to zero when absent.
    fn u16_or_zero(&self, parameter: Parameter) -> Result<u16, HlaError> {
        match self.u16(parameter) {
            Err(HlaError::MissingParameter(_)) => Ok(0),
            other => other,
        }
    }

    fn event_identifier(&self) -> Result<(u16, String), HlaError> {
        let bytes = self.slice(Parameter::EventIdentifier, 0, 2 + OBJECT_NAME_SIZE)?;
        Ok((
            u16::from_be_bytes([bytes[0], bytes[1]]),
            name_from_buffer(&bytes[2..]),
        ))
    }
}

/// WeaponFire interaction. Object identifiers are RTI object names; an
/// empty name means unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponFire {
    pub event_count: u16,
    pub issuer: String,
    pub firing_object: String,
    pub target_object: String,
    pub munition_object: String,
    pub munition_type: EntityType,
    /// Geocentric.
    pub firing_location: DVec3,
    pub initial_velocity: DVec3,
    pub warhead: u16,
    pub fuse: u16,
    pub quantity: u16,
    pub rate: u16,
}

impl WeaponFire {
    pub fn to_parameters(&self) -> Vec<(Parameter, Vec<u8>)> {
        vec![
            (
                Parameter::EventIdentifier,
                event_identifier(self.event_count, &self.issuer),
            ),
            (
                Parameter::FiringObjectIdentifier,
                object_name_buffer(&self.firing_object).to_vec(),
            ),
            (
                Parameter::TargetObjectIdentifier,
                object_name_buffer(&self.target_object).to_vec(),
            ),
            (
                Parameter::MunitionObjectIdentifier,
                object_name_buffer(&self.munition_object).to_vec(),
            ),
            (Parameter::MunitionType, record(&self.munition_type)),
            (
                Parameter::FiringLocation,
                record(&WorldCoordinates::from(self.firing_location)),
            ),
            (
                Parameter::InitialVelocityVector,
                record(&VectorDis::from(self.initial_velocity)),
            ),
            (Parameter::WarheadType, self.warhead.to_be_bytes().to_vec()),
            (Parameter::FuseType, self.fuse.to_be_bytes().to_vec()),
            (Parameter::QuantityFired, self.quantity.to_be_bytes().to_vec()),
            (Parameter::RateOfFire, self.rate.to_be_bytes().to_vec()),
        ]
    }

    pub fn from_parameters(parameters: &[(Parameter, Vec<u8>)]) -> Result<Self, HlaError> {
        let received = Received(parameters);
        let (event_count, issuer) = received.event_identifier()?;
        Ok(Self {
            event_count,
            issuer,
            firing_object: received.name(Parameter::FiringObjectIdentifier)?,
            target_object: received.name(Parameter::TargetObjectIdentifier)?,
            munition_object: received.name(Parameter::MunitionObjectIdentifier)?,
            munition_type: received.record(Parameter::MunitionType)?,
            firing_location: received
                .record::<WorldCoordinates>(Parameter::FiringLocation)?
                .into(),
            initial_velocity: received
                .record::<VectorDis>(Parameter::InitialVelocityVector)?
                .into(),
            warhead: received.u16_or_zero(Parameter::WarheadType)?,
            fuse: received.u16_or_zero(Parameter::FuseType)?,
            quantity: received.u16_or_zero(Parameter::QuantityFired)?,
            rate: received.u16_or_zero(Parameter::RateOfFire)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MunitionDetonation {
    pub event_count: u16,
    pub issuer: String,
    pub firing_object: String,
    pub target_object: String,
    pub munition_object: String,
    pub munition_type: EntityType,
    /// Geocentric.
    pub location: DVec3,
    pub final_velocity: DVec3,
    pub result: DetonationResult,
    pub warhead: u16,
    pub fuse: u16,
    pub quantity: u16,
    pub rate: u16,
}

impl MunitionDetonation {
    pub fn to_parameters(&self) -> Vec<(Parameter, Vec<u8>)> {
        vec![
            (
                Parameter::EventIdentifier,
                event_identifier(self.event_count, &self.issuer),
            ),
            (
                Parameter::FiringObjectIdentifier,
                object_name_buffer(&self.firing_object).to_vec(),
            ),
            (
                Parameter::TargetObjectIdentifier,
                object_name_buffer(&self.target_object).to_vec(),
            ),
            (
                Parameter::MunitionObjectIdentifier,
                object_name_buffer(&self.munition_object).to_vec(),
            ),
            (Parameter::MunitionType, record(&self.munition_type)),
            (
                Parameter::DetonationLocation,
                record(&WorldCoordinates::from(self.location)),
            ),
            (
                Parameter::FinalVelocityVector,
                record(&VectorDis::from(self.final_velocity)),
            ),
            (Parameter::DetonationResultCode, vec![self.result as u8]),
            (Parameter::WarheadType, self.warhead.to_be_bytes().to_vec()),
            (Parameter::FuseType, self.fuse.to_be_bytes().to_vec()),
            (Parameter::QuantityFired, self.quantity.to_be_bytes().to_vec()),
            (Parameter::RateOfFire, self.rate.to_be_bytes().to_vec()),
        ]
    }

    pub fn from_parameters(parameters: &[(Parameter, Vec<u8>)]) -> Result<Self, HlaError> {
        let received = Received(parameters);
        let (event_count, issuer) = received.event_identifier()?;
        let result = received.slice(Parameter::DetonationResultCode, 0, 1)?[0];
        Ok(Self {
            event_count,
            issuer,
            firing_object: received.name(Parameter::FiringObjectIdentifier)?,
            target_object: received.name(Parameter::TargetObjectIdentifier)?,
            munition_object: received.name(Parameter::MunitionObjectIdentifier)?,
            munition_type: received.record(Parameter::MunitionType)?,
            location: received
                .record::<WorldCoordinates>(Parameter::DetonationLocation)?
                .into(),
            final_velocity: received
                .record::<VectorDis>(Parameter::FinalVelocityVector)?
                .into(),
            result: DetonationResult::from_u8(result),
            warhead: received.u16_or_zero(Parameter::WarheadType)?,
            fuse: received.u16_or_zero(Parameter::FuseType)?,
            quantity: received.u16_or_zero(Parameter::QuantityFired)?,
            rate: received.u16_or_zero(Parameter::RateOfFire)?,
        })
    }
}
