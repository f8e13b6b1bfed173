use std::collections::{BTreeMap, HashMap};

use crate::dis::{DetonationResult, EntityId, EventIdentifier, burst};
use crate::dr::{DrThresholds, kinematic_update_reason};
use crate::net::lifecycle;
use crate::net::{NetEvent, NetIoConfig, RemovalReason};
use crate::nib::{Nib, NibTable};
use crate::ntm::Ntm;
use crate::player::{Player, PlayerMode, Simulation, TemplateRegistry};

use super::interaction::{MunitionDetonation, WeaponFire};
use super::rpr::{Attribute, AttributeFlags, ReflectedEntity, encode_attribute};
use super::{HlaError, Interaction, ObjectClass, RtiAmbassador};

#[derive(Debug, Clone)]
struct OutputObject {
    name: String,
    class: ObjectClass,
    registered: bool,
}

/// Attributes of an output NIB that must be published now. Everything on
/// first publication; afterwards the changed discrete attributes, and the
/// spatial attribute whenever anything goes out or the remote
/// extrapolation has drifted.
pub fn dirty_attributes(nib: &Nib, exec_time: f64, thresholds: &DrThresholds) -> AttributeFlags {
    let (Some(sent), Some(update_time)) = (nib.sent_state(), nib.update_time()) else {
        return AttributeFlags::all();
    };
    let mut dirty = AttributeFlags::empty();
    if sent.entity_type != nib.entity_type() {
        dirty |= AttributeFlags::ENTITY_TYPE;
    }
    if sent.force_id != nib.force_id() {
        dirty |= AttributeFlags::FORCE_IDENTIFIER;
    }
    if sent.appearance != nib.appearance_word() || sent.mode != nib.mode {
        dirty |= AttributeFlags::APPEARANCE;
    }
    if sent.articulations != nib.articulations {
        dirty |= AttributeFlags::ARTICULATED_PARAMETERS;
    }
    let drifted = kinematic_update_reason(
        thresholds,
        nib.dead_reckoning(),
        exec_time - update_time,
        nib.kinematics.position,
        nib.kinematics.orientation,
    )
    .is_some();
    if drifted || !dirty.is_empty() {
        dirty |= AttributeFlags::SPATIAL;
    }
    dirty
}

/// Publishes the dirty attributes of an output NIB. The NIB only records
/// the update once the RTI has accepted it.
pub fn update_basic_entity<R: RtiAmbassador>(
    rti: &mut R,
    object_name: &str,
    nib: &mut Nib,
    exec_time: f64,
    thresholds: &DrThresholds,
) -> bool {
    let dirty = dirty_attributes(nib, exec_time, thresholds);
    if dirty.is_empty() {
        return false;
    }
    let attributes: Vec<(Attribute, Vec<u8>)> = dirty
        .attributes()
        .map(|attribute| (attribute, encode_attribute(attribute, nib)))
        .collect();
    match rti.update_attribute_values(object_name, &attributes, exec_time) {
        Ok(()) => {
            log::trace!("{object_name}: published {dirty:?}");
            nib.mark_entity_state_sent(exec_time);
            true
        }
        Err(e) => {
            log::warn!("{object_name}: attribute update failed: {e}");
            false
        }
    }
}

/// Object-name lookups for players and entity ids.
struct Names<'a> {
    objects: &'a BTreeMap<EntityId, OutputObject>,
    discovered: &'a HashMap<String, ReflectedEntity>,
    site: u16,
    application: u16,
}

impl Names<'_> {
    fn player(&self, player: &Player) -> Option<String> {
        match player.remote_id {
            Some(id) => self
                .discovered
                .iter()
                .find(|(_, reflected)| reflected.entity_id == Some(id))
                .map(|(name, _)| name.clone()),
            None => self
                .objects
                .get(&EntityId::new(self.site, self.application, player.id))
                .filter(|object| object.registered)
                .map(|object| object.name.clone()),
        }
    }

    fn entity(&self, name: &str) -> EntityId {
        if name.is_empty() {
            return EntityId::NONE;
        }
        if let Some(id) = self.discovered.get(name).and_then(|r| r.entity_id) {
            return id;
        }
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map_or(EntityId::NONE, |(id, _)| *id)
    }
}

struct Shot {
    shooter: String,
    target: String,
}

fn resolve_shot(names: &Names<'_>, nib: &Nib, weapon: &Player, sim: &Simulation) -> Option<Shot> {
    let Some(shooter) = weapon
        .launcher()
        .and_then(|h| sim.players.get(h))
        .and_then(|launcher| names.player(launcher))
    else {
        log::debug!("{}: no launcher object, weapon interaction not sent", nib.entity_id());
        return None;
    };
    let target = weapon
        .weapon
        .and_then(|w| w.target)
        .and_then(|h| sim.players.get(h))
        .and_then(|target| names.player(target))
        .unwrap_or_default();
    Some(Shot { shooter, target })
}

fn next_event(counter: &mut u16) -> u16 {
    *counter = counter.wrapping_add(1).max(1);
    *counter
}

/// HLA network I/O over an RTI ambassador using RPR-FOM encodings. The
/// federate ambassador callbacks map onto the `discover`/`reflect`/
/// `remove`/`receive` methods.
pub struct HlaNetIo<R: RtiAmbassador> {
    rti: R,
    config: NetIoConfig,
    ntm: Ntm,
    templates: TemplateRegistry,
    inputs: NibTable,
    outputs: NibTable,
    objects: BTreeMap<EntityId, OutputObject>,
    discovered: HashMap<String, ReflectedEntity>,
    events: Vec<NetEvent>,
    next_event: u16,
}

impl<R: RtiAmbassador> HlaNetIo<R> {
    pub fn new(rti: R, config: NetIoConfig, ntm: Ntm, templates: TemplateRegistry) -> Self {
        log::info!(
            "hla netio federate {} site {} application {}",
            config.federate_name,
            config.site,
            config.application
        );
        Self {
            rti,
            config,
            ntm,
            templates,
            inputs: NibTable::new(),
            outputs: NibTable::new(),
            objects: BTreeMap::new(),
            discovered: HashMap::new(),
            events: Vec::new(),
            next_event: 0,
        }
    }

    pub fn config(&self) -> &NetIoConfig {
        &self.config
    }

    pub fn rti(&self) -> &R {
        &self.rti
    }

    pub fn rti_mut(&mut self) -> &mut R {
        &mut self.rti
    }

    pub fn inputs(&self) -> &NibTable {
        &self.inputs
    }

    pub fn outputs(&self) -> &NibTable {
        &self.outputs
    }

    /// Object name registered for one of our entities.
    pub fn object_name(&self, id: &EntityId) -> Option<&str> {
        self.objects.get(id).map(|object| object.name.as_str())
    }

    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        std::mem::take(&mut self.events)
    }

    fn names(&self) -> Names<'_> {
        Names {
            objects: &self.objects,
            discovered: &self.discovered,
            site: self.config.site,
            application: self.config.application,
        }
    }

    fn is_ours(&self, id: &EntityId) -> bool {
        id.same_simulation(self.config.site, self.config.application) || self.outputs.contains(id)
    }

    pub fn discover_object_instance(&mut self, name: &str, class: ObjectClass) {
        if self.discovered.contains_key(name) {
            return;
        }
        log::debug!("discovered {name} ({})", class.name());
        self.discovered
            .insert(name.to_string(), ReflectedEntity::default());
    }

    /// Folds reflected attributes into the object's staged state and
    /// applies it to the input NIB, creating the NIB once the entity
    /// identifier is known. A bad attribute rejects the whole reflection.
    pub fn reflect_attribute_values(
        &mut self,
        name: &str,
        attributes: &[(Attribute, Vec<u8>)],
        sim: &mut Simulation,
    ) -> Result<(), HlaError> {
        let mut reflected = self
            .discovered
            .get(name)
            .cloned()
            .ok_or_else(|| HlaError::UnknownObject(name.to_string()))?;
        for (attribute, bytes) in attributes {
            reflected.reflect(*attribute, bytes)?;
        }
        let id = reflected.entity_id;
        let staged = reflected.staged.clone();
        self.discovered.insert(name.to_string(), reflected);

        let Some(id) = id else {
            log::trace!("{name}: no entity identifier reflected yet");
            return Ok(());
        };
        if self.is_ours(&id) {
            log::trace!("{name}: ignoring reflection of our own entity {id}");
            return Ok(());
        }
        if !self.inputs.contains(&id) {
            let nib = lifecycle::new_input_nib(
                id,
                staged.entity_type,
                staged.force_id,
                &staged.marking,
                &self.config,
                &self.ntm,
                &self.templates,
                sim,
            );
            let player = nib.player();
            if self.inputs.insert(nib) {
                self.events.push(NetEvent::EntityCreated { id, player });
            }
        }
        if let Some(nib) = self.inputs.get_mut(&id) {
            nib.entity_state_to_nib(&staged, sim.exec_time());
        }
        Ok(())
    }

    pub fn remove_object_instance(&mut self, name: &str, sim: &mut Simulation) {
        let Some(reflected) = self.discovered.remove(name) else {
            log::trace!("remove of unknown object {name}");
            return;
        };
        if let Some(nib) = reflected.entity_id.and_then(|id| self.inputs.remove(&id)) {
            lifecycle::remove_input(nib, RemovalReason::Deleted, sim, &mut self.events);
        }
    }

    pub fn receive_interaction(
        &mut self,
        interaction: Interaction,
        parameters: &[(super::Parameter, Vec<u8>)],
        sim: &mut Simulation,
    ) -> Result<(), HlaError> {
        match interaction {
            Interaction::WeaponFire => {
                let fire = WeaponFire::from_parameters(parameters)?;
                let names = self.names();
                let shooter = names.entity(&fire.firing_object);
                let munition = names.entity(&fire.munition_object);
                let target = names.entity(&fire.target_object);
                if !shooter.is_none() && self.is_ours(&shooter) {
                    return Ok(());
                }
                self.events.push(NetEvent::WeaponFired {
                    shooter,
                    munition,
                    target,
                    event: EventIdentifier::new(
                        shooter.site,
                        shooter.application,
                        fire.event_count,
                    ),
                });
            }
            Interaction::MunitionDetonation => {
                let detonation = MunitionDetonation::from_parameters(parameters)?;
                let names = self.names();
                let shooter = names.entity(&detonation.firing_object);
                let munition = names.entity(&detonation.munition_object);
                let target = names.entity(&detonation.target_object);
                if !shooter.is_none() && self.is_ours(&shooter) {
                    return Ok(());
                }
                if let Some(nib) = self.inputs.get_mut(&munition) {
                    nib.mode = PlayerMode::Detonated;
                    if let Some(player) = nib.player().and_then(|h| sim.players.get_mut(h)) {
                        player.set_mode(PlayerMode::Detonated);
                        player.weapon.get_or_insert_with(Default::default).detonation_result =
                            Some(detonation.result);
                    }
                }
                let local_target = self.outputs.get(&target).and_then(Nib::player);
                self.events.push(NetEvent::Detonation {
                    shooter,
                    munition,
                    target,
                    local_target,
                    result: detonation.result,
                    location: sim.gaming_area().position_from_ecef(detonation.location),
                });
            }
        }
        Ok(())
    }

    /// Moves mirrored players and expires quiet objects.
    pub fn input_frame(&mut self, sim: &mut Simulation) {
        lifecycle::update_remote_players(&mut self.inputs, sim, &self.ntm);
        let max_age = self.config.thresholds.max_age;
        lifecycle::expire_inputs(&mut self.inputs, sim, max_age, &mut self.events);
    }

    /// Registers, updates and deletes the objects of our local players and
    /// sends their weapon interactions.
    pub fn output_frame(&mut self, sim: &mut Simulation) {
        let created = lifecycle::sync_output_nibs(
            &mut self.outputs,
            sim,
            &self.config,
            &self.ntm,
            &mut self.events,
        );
        for id in created {
            let Some(nib) = self.outputs.get(&id) else {
                continue;
            };
            let name = format!(
                "{}.{}.{}.{}",
                self.config.federate_name, id.site, id.application, id.entity
            );
            self.objects.insert(
                id,
                OutputObject {
                    name,
                    class: ObjectClass::for_class(nib.class),
                    registered: false,
                },
            );
        }

        let exec_time = sim.exec_time();
        let area = *sim.gaming_area();
        let mut retired = Vec::new();
        for nib in self.outputs.iter_mut() {
            let id = nib.entity_id();
            let Some(object) = self.objects.get_mut(&id) else {
                continue;
            };
            match nib.player().and_then(|h| sim.players.get(h)) {
                Some(player) if player.network_enabled => {
                    nib.player_state_to_nib(player, &area, exec_time);
                }
                _ => nib.mode = PlayerMode::DeleteRequest,
            }
            nib.manage_articulation_parameters(&self.ntm);

            if nib.mode == PlayerMode::DeleteRequest {
                if !object.registered {
                    retired.push(id);
                } else if let Err(e) = self.rti.delete_object_instance(&object.name) {
                    log::warn!("{}: delete failed: {e}", object.name);
                } else {
                    retired.push(id);
                }
                continue;
            }
            if !object.registered {
                if let Err(e) = self.rti.register_object_instance(object.class, &object.name) {
                    log::warn!("{}: registration failed: {e}", object.name);
                    continue;
                }
                log::debug!("registered {} as {}", object.name, object.class.name());
                object.registered = true;
            }
            let name = object.name.clone();
            update_basic_entity(
                &mut self.rti,
                &name,
                nib,
                exec_time,
                &self.config.thresholds,
            );

            let Some(weapon) = nib.player().and_then(|h| sim.players.get(h)) else {
                continue;
            };
            if !weapon.is_weapon() {
                continue;
            }
            let names = Names {
                objects: &self.objects,
                discovered: &self.discovered,
                site: self.config.site,
                application: self.config.application,
            };
            if matches!(weapon.mode, PlayerMode::Launched | PlayerMode::Detonated)
                && !nib.fire_sent
                && let Some(shot) = resolve_shot(&names, nib, weapon, sim)
            {
                if nib.event_number == 0 {
                    nib.event_number = next_event(&mut self.next_event);
                }
                let fire = WeaponFire {
                    event_count: nib.event_number,
                    issuer: shot.shooter.clone(),
                    firing_object: shot.shooter,
                    target_object: shot.target,
                    munition_object: name.clone(),
                    munition_type: nib.entity_type(),
                    firing_location: nib.kinematics.position,
                    initial_velocity: nib.kinematics.velocity,
                    warhead: burst::WARHEAD_HIGH_EXPLOSIVE,
                    fuse: burst::FUSE_CONTACT,
                    quantity: 1,
                    rate: 0,
                };
                match self
                    .rti
                    .send_interaction(Interaction::WeaponFire, &fire.to_parameters(), exec_time)
                {
                    Ok(()) => nib.fire_sent = true,
                    Err(e) => log::warn!("{name}: weapon fire not sent: {e}"),
                }
            }
            if weapon.mode == PlayerMode::Detonated
                && nib.fire_sent
                && !nib.detonation_sent
                && let Some(shot) = resolve_shot(&names, nib, weapon, sim)
            {
                let detonation = MunitionDetonation {
                    event_count: nib.event_number,
                    issuer: shot.shooter.clone(),
                    firing_object: shot.shooter,
                    target_object: shot.target,
                    munition_object: name.clone(),
                    munition_type: nib.entity_type(),
                    location: nib.kinematics.position,
                    final_velocity: nib.kinematics.velocity,
                    result: weapon
                        .weapon
                        .and_then(|w| w.detonation_result)
                        .unwrap_or(DetonationResult::Detonation),
                    warhead: burst::WARHEAD_HIGH_EXPLOSIVE,
                    fuse: burst::FUSE_CONTACT,
                    quantity: 1,
                    rate: 0,
                };
                match self.rti.send_interaction(
                    Interaction::MunitionDetonation,
                    &detonation.to_parameters(),
                    exec_time,
                ) {
                    Ok(()) => nib.detonation_sent = true,
                    Err(e) => log::warn!("{name}: detonation not sent: {e}"),
                }
            }
        }

        for id in retired {
            self.objects.remove(&id);
            if let Some(nib) = self.outputs.remove(&id) {
                self.events.push(NetEvent::EntityRemoved {
                    id: nib.entity_id(),
                    reason: RemovalReason::Deleted,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerArena;
    use crate::dr::DrAlgorithm;
    use glam::DVec3;

    fn sent_nib() -> Nib {
        let mut arena = PlayerArena::new();
        let handle = arena.insert(Player::default());
        let mut nib = Nib::new_output(EntityId::new(1, 1, 1), handle, "test", DrAlgorithm::Fpw);
        nib.mode = PlayerMode::Active;
        nib.kinematics.velocity = DVec3::new(10.0, 0.0, 0.0);
        nib.mark_entity_state_sent(0.0);
        nib
    }

    #[test]
    fn test_everything_dirty_before_first_publication() {
        let mut arena = PlayerArena::new();
        let handle = arena.insert(Player::default());
        let nib = Nib::new_output(EntityId::new(1, 1, 1), handle, "test", DrAlgorithm::Fpw);
        assert_eq!(
            dirty_attributes(&nib, 0.0, &DrThresholds::default()),
            AttributeFlags::all()
        );
    }

    #[test]
    fn test_discrete_change_carries_spatial() {
        let thresholds = DrThresholds::default();
        let mut nib = sent_nib();
        nib.kinematics.position = DVec3::new(10.0, 0.0, 0.0);
        assert!(dirty_attributes(&nib, 1.0, &thresholds).is_empty());

        nib.appearance.smoke = 1.0;
        assert_eq!(
            dirty_attributes(&nib, 1.0, &thresholds),
            AttributeFlags::APPEARANCE | AttributeFlags::SPATIAL
        );
    }

    #[test]
    fn test_drift_marks_only_spatial() {
        let mut nib = sent_nib();
        nib.kinematics.position = DVec3::new(50.0, 0.0, 0.0);
        assert_eq!(
            dirty_attributes(&nib, 1.0, &DrThresholds::default()),
            AttributeFlags::SPATIAL
        );
    }
}
