mod interaction;
mod memory;
mod netio;
mod rpr;

pub use interaction::{MunitionDetonation, Parameter, WeaponFire};
pub use memory::{AttributeUpdate, MemoryRti, SentInteraction};
pub use netio::{HlaNetIo, dirty_attributes, update_basic_entity};
pub use rpr::{
    Attribute, AttributeFlags, OBJECT_NAME_SIZE, ReflectedEntity, SpatialRecord,
    encode_attribute, name_from_buffer, object_name_buffer,
};

use thiserror::Error;

use crate::dis::WireError;
use crate::player::VehicleClass;

#[derive(Debug, Error)]
pub enum HlaError {
    #[error("rti refused: {0}")]
    Rti(String),
    #[error("unknown object instance {0}")]
    UnknownObject(String),
    #[error("attribute {attribute}: {source}")]
    Attribute {
        attribute: Attribute,
        #[source]
        source: WireError,
    },
    #[error("interaction parameter {parameter:?}: {source}")]
    Parameter {
        parameter: Parameter,
        #[source]
        source: WireError,
    },
    #[error("interaction missing parameter {0:?}")]
    MissingParameter(Parameter),
}

/// RPR object classes an entity is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Aircraft,
    GroundVehicle,
    SurfaceVessel,
    Lifeform,
    Munition,
    PhysicalEntity,
}

impl ObjectClass {
    pub fn for_class(class: VehicleClass) -> Self {
        match class {
            VehicleClass::Air => ObjectClass::Aircraft,
            VehicleClass::Ground => ObjectClass::GroundVehicle,
            VehicleClass::Ship => ObjectClass::SurfaceVessel,
            VehicleClass::LifeForm => ObjectClass::Lifeform,
            VehicleClass::Weapon => ObjectClass::Munition,
            VehicleClass::Other => ObjectClass::PhysicalEntity,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectClass::Aircraft => "BaseEntity.PhysicalEntity.Platform.Aircraft",
            ObjectClass::GroundVehicle => "BaseEntity.PhysicalEntity.Platform.GroundVehicle",
            ObjectClass::SurfaceVessel => "BaseEntity.PhysicalEntity.Platform.SurfaceVessel",
            ObjectClass::Lifeform => "BaseEntity.PhysicalEntity.Lifeform",
            ObjectClass::Munition => "BaseEntity.PhysicalEntity.Munition",
            ObjectClass::PhysicalEntity => "BaseEntity.PhysicalEntity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    WeaponFire,
    MunitionDetonation,
}

/// Outgoing half of an RTI connection. Every call either takes effect or
/// returns an error with nothing applied.
pub trait RtiAmbassador {
    fn register_object_instance(&mut self, class: ObjectClass, name: &str) -> Result<(), HlaError>;

    fn update_attribute_values(
        &mut self,
        name: &str,
        attributes: &[(Attribute, Vec<u8>)],
        time: f64,
    ) -> Result<(), HlaError>;

    fn delete_object_instance(&mut self, name: &str) -> Result<(), HlaError>;

    fn send_interaction(
        &mut self,
        interaction: Interaction,
        parameters: &[(Parameter, Vec<u8>)],
        time: f64,
    ) -> Result<(), HlaError>;
}
