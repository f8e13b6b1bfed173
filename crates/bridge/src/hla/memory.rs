use std::collections::BTreeMap;

use super::rpr::Attribute;
use super::{HlaError, Interaction, ObjectClass, Parameter, RtiAmbassador};

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUpdate {
    pub object: String,
    pub attributes: Vec<(Attribute, Vec<u8>)>,
    pub time: f64,
}

impl AttributeUpdate {
    pub fn get(&self, attribute: Attribute) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentInteraction {
    pub interaction: Interaction,
    pub parameters: Vec<(Parameter, Vec<u8>)>,
    pub time: f64,
}

/// RTI stand-in that records every call. Used by tests and by nodes that
/// run the HLA side without a federation.
#[derive(Debug, Default)]
pub struct MemoryRti {
    pub objects: BTreeMap<String, ObjectClass>,
    pub updates: Vec<AttributeUpdate>,
    pub interactions: Vec<SentInteraction>,
    pub deleted: Vec<String>,
    /// Makes every call fail.
    pub refuse: bool,
}

impl MemoryRti {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, what: &str) -> Result<(), HlaError> {
        if self.refuse {
            return Err(HlaError::Rti(format!("{what} refused")));
        }
        Ok(())
    }

    fn known(&self, name: &str) -> Result<(), HlaError> {
        if self.objects.contains_key(name) {
            Ok(())
        } else {
            Err(HlaError::UnknownObject(name.to_string()))
        }
    }
}

impl RtiAmbassador for MemoryRti {
    fn register_object_instance(&mut self, class: ObjectClass, name: &str) -> Result<(), HlaError> {
        self.check("register")?;
        if self.objects.contains_key(name) {
            return Err(HlaError::Rti(format!("object name {name} in use")));
        }
        self.objects.insert(name.to_string(), class);
        Ok(())
    }

    fn update_attribute_values(
        &mut self,
        name: &str,
        attributes: &[(Attribute, Vec<u8>)],
        time: f64,
    ) -> Result<(), HlaError> {
        self.check("update")?;
        self.known(name)?;
        self.updates.push(AttributeUpdate {
            object: name.to_string(),
            attributes: attributes.to_vec(),
            time,
        });
        Ok(())
    }

    fn delete_object_instance(&mut self, name: &str) -> Result<(), HlaError> {
        self.check("delete")?;
        self.known(name)?;
        self.objects.remove(name);
        self.deleted.push(name.to_string());
        Ok(())
    }

    fn send_interaction(
        &mut self,
        interaction: Interaction,
        parameters: &[(Parameter, Vec<u8>)],
        time: f64,
    ) -> Result<(), HlaError> {
        self.check("interaction")?;
        self.interactions.push(SentInteraction {
            interaction,
            parameters: parameters.to_vec(),
            time,
        });
        Ok(())
    }
}
