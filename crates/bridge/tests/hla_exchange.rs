use glam::DVec3;

use simbridge::dis::{EntityId, EntityType};
use simbridge::hla::{Attribute, HlaNetIo, MemoryRti, ObjectClass};
use simbridge::net::{NetEvent, NetIoConfig, RemovalReason};
use simbridge::ntm::{Ntm, NtmEntry};
use simbridge::player::{
    Player, PlayerHandle, PlayerMode, Simulation, TemplateRegistry, VehicleClass, WeaponState,
};

fn netio(site: u16) -> HlaNetIo<MemoryRti> {
    let ntm = Ntm::new(vec![
        NtmEntry::new("f16", EntityType::new(1, 2, 225, 1, 3, 0, 0)),
        NtmEntry::new("sa6", EntityType::new(1, 1, 222, 28, 1, 0, 0)),
        NtmEntry::new("sam", EntityType::new(2, 9, 222, 1, 1, 0, 0)),
    ]);
    let mut templates = TemplateRegistry::new();
    templates.register("f16", || Player::default().with_class(VehicleClass::Air));
    templates.register("sa6", || Player::default().with_class(VehicleClass::Ground));
    templates.register("sam", || Player::default().with_class(VehicleClass::Weapon));
    let config = NetIoConfig {
        site,
        ..Default::default()
    };
    HlaNetIo::new(MemoryRti::new(), config, ntm, templates)
}

fn local_player(
    sim: &mut Simulation,
    id: u16,
    template: &str,
    class: VehicleClass,
) -> PlayerHandle {
    let mut player = Player::new(id, format!("{template}-{id}"), template).with_class(class);
    player.mode = PlayerMode::Active;
    player.network_enabled = true;
    sim.add_player(player)
}

/// Plays the federation: hands everything `from` published to `to`.
fn forward(from: &mut HlaNetIo<MemoryRti>, to: &mut HlaNetIo<MemoryRti>, sim: &mut Simulation) {
    let updates = std::mem::take(&mut from.rti_mut().updates);
    for update in updates {
        let class = from
            .rti()
            .objects
            .get(&update.object)
            .copied()
            .unwrap_or(ObjectClass::PhysicalEntity);
        to.discover_object_instance(&update.object, class);
        to.reflect_attribute_values(&update.object, &update.attributes, sim)
            .unwrap();
    }
    let interactions = std::mem::take(&mut from.rti_mut().interactions);
    for sent in interactions {
        to.receive_interaction(sent.interaction, &sent.parameters, sim)
            .unwrap();
    }
    let deleted = std::mem::take(&mut from.rti_mut().deleted);
    for name in deleted {
        to.remove_object_instance(&name, sim);
    }
}

#[test]
fn test_object_reflects_into_remote_player() {
    let mut a = netio(1);
    let mut b = netio(2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    let handle = local_player(&mut sim_a, 7, "f16", VehicleClass::Air);
    if let Some(player) = sim_a.player_mut(handle) {
        player.position = DVec3::new(-2000.0, 1500.0, -6000.0);
        player.velocity = DVec3::new(0.0, 250.0, 0.0);
        player.euler = DVec3::new(0.0, 0.1, 1.57);
    }

    a.output_frame(&mut sim_a);
    let id = EntityId::new(1, 1, 7);
    let name = a.object_name(&id).unwrap().to_string();
    assert_eq!(a.rti().objects.get(&name), Some(&ObjectClass::Aircraft));
    assert_eq!(a.rti().updates.len(), 1);
    assert_eq!(a.rti().updates[0].attributes.len(), Attribute::ALL.len());

    forward(&mut a, &mut b, &mut sim_b);
    b.input_frame(&mut sim_b);

    let remote = b
        .inputs()
        .get(&id)
        .and_then(|nib| nib.player())
        .and_then(|h| sim_b.player(h))
        .unwrap();
    assert_eq!(remote.class, VehicleClass::Air);
    assert_eq!(remote.name, "f16-7");
    assert!((remote.position - DVec3::new(-2000.0, 1500.0, -6000.0)).length() < 0.01);
    assert!((remote.euler - DVec3::new(0.0, 0.1, 1.57)).length() < 1e-4);
}

#[test]
fn test_only_dirty_attributes_are_updated() {
    let mut a = netio(1);
    let mut sim = Simulation::default();
    let handle = local_player(&mut sim, 2, "sa6", VehicleClass::Ground);

    a.output_frame(&mut sim);
    sim.step(0.1);
    a.output_frame(&mut sim);
    assert_eq!(a.rti().updates.len(), 1);

    if let Some(player) = sim.player_mut(handle) {
        player.appearance.flames = 1.0;
    }
    sim.step(0.1);
    a.output_frame(&mut sim);
    let update = &a.rti().updates[1];
    assert!(update.get(Attribute::FlamesPresent).is_some());
    assert!(update.get(Attribute::Spatial).is_some());
    assert!(update.get(Attribute::EntityIdentifier).is_none());
    assert!(update.get(Attribute::Marking).is_none());
}

#[test]
fn test_refused_registration_retries() {
    let mut a = netio(1);
    let mut sim = Simulation::default();
    local_player(&mut sim, 3, "f16", VehicleClass::Air);

    a.rti_mut().refuse = true;
    a.output_frame(&mut sim);
    assert!(a.rti().objects.is_empty());
    let nib = a.outputs().get(&EntityId::new(1, 1, 3)).unwrap();
    assert!(nib.sent_state().is_none());

    a.rti_mut().refuse = false;
    a.output_frame(&mut sim);
    assert_eq!(a.rti().objects.len(), 1);
    assert_eq!(a.rti().updates[0].attributes.len(), Attribute::ALL.len());
}

#[test]
fn test_own_objects_are_not_mirrored() {
    let mut a = netio(1);
    let mut loopback = netio(1);
    let mut sim = Simulation::default();
    local_player(&mut sim, 4, "f16", VehicleClass::Air);

    a.output_frame(&mut sim);
    let mut other_sim = Simulation::default();
    forward(&mut a, &mut loopback, &mut other_sim);
    assert!(loopback.inputs().is_empty());
    assert!(other_sim.players.is_empty());
}

#[test]
fn test_deleted_object_removes_remote_player() {
    let mut a = netio(1);
    let mut b = netio(2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    let handle = local_player(&mut sim_a, 5, "sa6", VehicleClass::Ground);

    a.output_frame(&mut sim_a);
    forward(&mut a, &mut b, &mut sim_b);
    assert_eq!(sim_b.players.len(), 1);
    b.drain_events();

    sim_a.remove_player(handle);
    a.output_frame(&mut sim_a);
    assert!(a.outputs().is_empty());
    assert_eq!(a.rti().deleted.len(), 1);

    forward(&mut a, &mut b, &mut sim_b);
    assert!(b.inputs().is_empty());
    assert!(sim_b.players.is_empty());
    assert_eq!(
        b.drain_events(),
        vec![NetEvent::EntityRemoved {
            id: EntityId::new(1, 1, 5),
            reason: RemovalReason::Deleted
        }]
    );
}

#[test]
fn test_weapon_interactions_name_the_objects() {
    let mut a = netio(1);
    let mut b = netio(2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();

    local_player(&mut sim_b, 9, "f16", VehicleClass::Air);
    b.output_frame(&mut sim_b);
    forward(&mut b, &mut a, &mut sim_a);
    let target = a
        .inputs()
        .get(&EntityId::new(2, 1, 9))
        .and_then(|nib| nib.player());
    assert!(target.is_some());

    let launcher = local_player(&mut sim_a, 10, "sa6", VehicleClass::Ground);
    let missile = local_player(&mut sim_a, 20, "sam", VehicleClass::Weapon);
    if let Some(weapon) = sim_a.player_mut(missile) {
        weapon.mode = PlayerMode::Launched;
        weapon.weapon = Some(WeaponState {
            launcher: Some(launcher),
            target,
            ..Default::default()
        });
    }
    a.output_frame(&mut sim_a);
    assert_eq!(a.rti().interactions.len(), 1);
    forward(&mut a, &mut b, &mut sim_b);

    let munition = EntityId::new(1, 1, 20);
    let fired = b.drain_events().into_iter().find_map(|e| match e {
        NetEvent::WeaponFired {
            shooter,
            munition,
            target,
            ..
        } => Some((shooter, munition, target)),
        _ => None,
    });
    assert_eq!(
        fired,
        Some((EntityId::new(1, 1, 10), munition, EntityId::new(2, 1, 9)))
    );

    if let Some(weapon) = sim_a.player_mut(missile) {
        weapon.mode = PlayerMode::Detonated;
    }
    sim_a.step(0.1);
    a.output_frame(&mut sim_a);
    forward(&mut a, &mut b, &mut sim_b);

    let ours = b.outputs().get(&EntityId::new(2, 1, 9)).and_then(|n| n.player());
    let hit = b.drain_events().into_iter().find_map(|e| match e {
        NetEvent::Detonation {
            munition,
            local_target,
            ..
        } => Some((munition, local_target)),
        _ => None,
    });
    assert_eq!(hit, Some((munition, ours)));
    let mirrored = b.inputs().get(&munition).unwrap();
    assert_eq!(mirrored.mode, PlayerMode::Detonated);
}
