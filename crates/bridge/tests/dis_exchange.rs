use glam::DVec3;

use simbridge::dis::{
    ALL_APPLICATIONS, ALL_SITES, ByteOrder, CommentPdu, DIS_VERSION_1278_1A, Datums, EntityId,
    EntityType, Pdu, StartResumePdu, VariableDatum, WireCodec, acknowledge, decode_datagram,
};
use simbridge::net::{DisNetIo, MemoryHandler, NetEvent, NetHandler, NetIoConfig, RemovalReason};
use simbridge::ntm::{Ntm, NtmEntry};
use simbridge::player::{
    Emitter, Player, PlayerHandle, PlayerMode, Radio, Simulation, TemplateRegistry, VehicleClass,
    WeaponState,
};
use simbridge::units::{Frequency, Power};

fn ntm() -> Ntm {
    Ntm::new(vec![
        NtmEntry::new("f16", EntityType::new(1, 2, 225, 1, 3, 0, 0)),
        NtmEntry::new("sa6", EntityType::new(1, 1, 222, 28, 1, 0, 0)),
        NtmEntry::new("sam", EntityType::new(2, 9, 222, 1, 1, 0, 0)),
    ])
}

fn templates() -> TemplateRegistry {
    let mut templates = TemplateRegistry::new();
    templates.register("f16", || Player::default().with_class(VehicleClass::Air));
    templates.register("sa6", || Player::default().with_class(VehicleClass::Ground));
    templates.register("sam", || Player::default().with_class(VehicleClass::Weapon));
    templates
}

fn netio(handler: MemoryHandler, site: u16) -> DisNetIo<MemoryHandler> {
    let config = NetIoConfig {
        site,
        application: 1,
        ..Default::default()
    };
    DisNetIo::new(handler, config, ntm(), templates())
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

fn codec() -> WireCodec {
    WireCodec::new(ByteOrder::Big)
}

fn encode(mut pdu: Pdu) -> Vec<u8> {
    pdu.stamp(DIS_VERSION_1278_1A, 1, 0);
    pdu.encode(&codec())
}

/// Decodes everything queued on a raw peer handler.
fn drain_peer(peer: &mut MemoryHandler) -> Vec<Pdu> {
    let mut buf = vec![0u8; 8192];
    let mut pdus = Vec::new();
    while let Some(size) = peer.receive(&mut buf).unwrap() {
        let (decoded, error) = decode_datagram(&buf[..size], &codec());
        assert!(error.is_none());
        pdus.extend(decoded);
    }
    pdus
}

#[test]
fn test_entity_state_mirrors_remote_player() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();

    let handle = local_player(&mut sim_a, 7, "f16", VehicleClass::Air);
    if let Some(player) = sim_a.player_mut(handle) {
        player.position = DVec3::new(1000.0, -500.0, -3000.0);
        player.velocity = DVec3::new(200.0, 0.0, 0.0);
        player.euler = DVec3::new(0.1, 0.05, 1.2);
        player.appearance.smoke = 1.0;
    }

    sender.output_frame(&mut sim_a);
    receiver.input_frame(&mut sim_b);

    let id = EntityId::new(1, 1, 7);
    let nib = receiver.inputs().get(&id).expect("input nib created");
    assert_eq!(nib.template.as_deref(), Some("f16"));
    let handle = nib.player();
    let remote = handle.and_then(|h| sim_b.player(h)).expect("mirroring player");
    assert_eq!(remote.remote_id, Some(id));
    assert_eq!(remote.class, VehicleClass::Air);
    assert!((remote.position - DVec3::new(1000.0, -500.0, -3000.0)).length() < 0.01);
    assert!((remote.euler - DVec3::new(0.1, 0.05, 1.2)).length() < 1e-4);
    assert_eq!(remote.appearance.smoke, 1.0);

    let events = receiver.drain_events();
    assert_eq!(
        events,
        vec![NetEvent::EntityCreated {
            id,
            player: handle
        }]
    );
}

#[test]
fn test_ground_appearance_survives_the_wire() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();

    let handle = local_player(&mut sim_a, 3, "sa6", VehicleClass::Ground);
    if let Some(player) = sim_a.player_mut(handle) {
        player.appearance.damage = 0.7;
        player.appearance.smoke = 0.4;
        player.appearance.flames = 1.0;
        player.appearance.frozen = true;
        player.appearance.camouflage = 2;
    }

    sender.output_frame(&mut sim_a);
    receiver.input_frame(&mut sim_b);

    let remote = receiver
        .inputs()
        .get(&EntityId::new(1, 1, 3))
        .and_then(|nib| nib.player())
        .and_then(|h| sim_b.player(h))
        .expect("mirroring player");
    assert_eq!(remote.class, VehicleClass::Ground);
    assert_eq!(remote.appearance.damage, 0.66);
    assert_eq!(remote.appearance.smoke, 0.33);
    assert_eq!(remote.appearance.flames, 1.0);
    assert!(remote.appearance.frozen);
    assert_eq!(remote.appearance.camouflage, 2);
}

#[test]
fn test_one_input_nib_per_entity() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    local_player(&mut sim_a, 1, "f16", VehicleClass::Air);
    local_player(&mut sim_a, 2, "sa6", VehicleClass::Ground);

    for _ in 0..3 {
        sender.output_frame(&mut sim_a);
        receiver.input_frame(&mut sim_b);
        sim_a.step(6.0);
        sim_b.step(6.0);
    }
    assert_eq!(receiver.inputs().len(), 2);
    assert_eq!(sim_b.players.len(), 2);
    let created = receiver
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, NetEvent::EntityCreated { .. }))
        .count();
    assert_eq!(created, 2);
}

#[test]
fn test_loopback_echo_is_dropped() {
    let handler = MemoryHandler::new().with_loopback();
    let mut node = netio(handler, 1);
    let mut sim = Simulation::default();
    local_player(&mut sim, 3, "f16", VehicleClass::Air);

    node.output_frame(&mut sim);
    node.input_frame(&mut sim);

    assert!(node.inputs().is_empty());
    assert_eq!(node.outputs().len(), 1);
    assert_eq!(node.stats().echoes_dropped, 1);
    assert_eq!(sim.players.len(), 1);
}

#[test]
fn test_failed_send_retries_next_tick() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    local_player(&mut sim_a, 4, "f16", VehicleClass::Air);

    sender.handler_mut().fail_sends = true;
    sender.output_frame(&mut sim_a);
    assert_eq!(sender.stats().send_failures, 1);
    let nib = sender.outputs().get(&EntityId::new(1, 1, 4)).unwrap();
    assert!(nib.sent_state().is_none());
    receiver.input_frame(&mut sim_b);
    assert!(receiver.inputs().is_empty());

    sender.handler_mut().fail_sends = false;
    sim_a.step(0.05);
    sender.output_frame(&mut sim_a);
    receiver.input_frame(&mut sim_b);
    assert_eq!(receiver.inputs().len(), 1);
    assert_eq!(sender.stats().pdus_sent, 1);
}

#[test]
fn test_quiet_entity_times_out() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    local_player(&mut sim_a, 5, "sa6", VehicleClass::Ground);

    sender.output_frame(&mut sim_a);
    receiver.input_frame(&mut sim_b);
    assert_eq!(sim_b.players.len(), 1);
    receiver.drain_events();

    sim_b.step(13.0);
    receiver.input_frame(&mut sim_b);
    assert!(receiver.inputs().is_empty());
    assert!(sim_b.players.is_empty());
    assert_eq!(receiver.stats().entities_timed_out, 1);
    assert_eq!(
        receiver.drain_events(),
        vec![NetEvent::EntityRemoved {
            id: EntityId::new(1, 1, 5),
            reason: RemovalReason::TimedOut
        }]
    );
}

#[test]
fn test_disabled_player_is_deactivated_and_removed() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    let handle = local_player(&mut sim_a, 6, "sa6", VehicleClass::Ground);

    sender.output_frame(&mut sim_a);
    receiver.input_frame(&mut sim_b);
    assert_eq!(receiver.inputs().len(), 1);

    if let Some(player) = sim_a.player_mut(handle) {
        player.network_enabled = false;
    }
    sender.output_frame(&mut sim_a);
    assert!(sender.outputs().is_empty());
    receiver.input_frame(&mut sim_b);
    assert!(receiver.inputs().is_empty());
    assert!(sim_b.players.is_empty());
}

fn launch(
    sim: &mut Simulation,
    launcher: Option<PlayerHandle>,
    target: Option<PlayerHandle>,
) -> PlayerHandle {
    let handle = local_player(sim, 20, "sam", VehicleClass::Weapon);
    if let Some(weapon) = sim.player_mut(handle) {
        weapon.mode = PlayerMode::Launched;
        weapon.velocity = DVec3::new(0.0, 0.0, -300.0);
        weapon.weapon = Some(WeaponState {
            launcher,
            target,
            ..Default::default()
        });
    }
    handle
}

#[test]
fn test_fire_and_detonation_reach_the_target() {
    let (a, b) = MemoryHandler::pair();
    let mut shooter = netio(a, 1);
    let mut victim = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();

    local_player(&mut sim_b, 9, "f16", VehicleClass::Air);
    victim.output_frame(&mut sim_b);
    shooter.input_frame(&mut sim_a);
    let target = shooter
        .inputs()
        .get(&EntityId::new(2, 1, 9))
        .and_then(|nib| nib.player());
    assert!(target.is_some());

    let launcher = local_player(&mut sim_a, 10, "sa6", VehicleClass::Ground);
    let missile = launch(&mut sim_a, Some(launcher), target);
    shooter.output_frame(&mut sim_a);
    victim.input_frame(&mut sim_b);

    let munition = EntityId::new(1, 1, 20);
    let nib = shooter.outputs().get(&munition).unwrap();
    assert!(nib.fire_sent);
    let events = victim.drain_events();
    let fired = events.iter().find_map(|e| match e {
        NetEvent::WeaponFired {
            shooter,
            munition,
            target,
            event,
        } => Some((*shooter, *munition, *target, event.event)),
        _ => None,
    });
    assert_eq!(
        fired,
        Some((EntityId::new(1, 1, 10), munition, EntityId::new(2, 1, 9), nib.event_number))
    );

    if let Some(weapon) = sim_a.player_mut(missile) {
        weapon.mode = PlayerMode::Detonated;
    }
    sim_a.step(0.1);
    shooter.output_frame(&mut sim_a);
    victim.input_frame(&mut sim_b);
    let hit = victim.drain_events().into_iter().find_map(|e| match e {
        NetEvent::Detonation {
            munition,
            local_target,
            ..
        } => Some((munition, local_target)),
        _ => None,
    });
    let ours = victim.outputs().get(&EntityId::new(2, 1, 9)).and_then(|n| n.player());
    assert_eq!(hit, Some((munition, ours)));
    assert!(shooter.outputs().get(&munition).unwrap().detonation_sent);
}

#[test]
fn test_fire_without_launcher_sends_nothing() {
    let (a, mut peer) = MemoryHandler::pair();
    let mut shooter = netio(a, 1);
    let mut sim = Simulation::default();
    launch(&mut sim, None, None);

    shooter.output_frame(&mut sim);
    let nib = shooter.outputs().get(&EntityId::new(1, 1, 20)).unwrap();
    assert!(!nib.fire_sent);
    let pdus = drain_peer(&mut peer);
    assert_eq!(pdus.len(), 1);
    assert!(matches!(pdus[0], Pdu::EntityState(_)));
}

#[test]
fn test_emitter_and_radio_are_published() {
    let (a, b) = MemoryHandler::pair();
    let mut sender = netio(a, 1);
    let mut receiver = netio(b, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();
    let handle = local_player(&mut sim_a, 11, "f16", VehicleClass::Air);
    if let Some(player) = sim_a.player_mut(handle) {
        player.emitters.push(Emitter::new(
            1234,
            1,
            Frequency::gigahertz(9.4),
            Power::kilowatts(5.0),
        ));
        let mut radio = Radio::new(1, Frequency::megahertz(251.0), Power::watts(10.0));
        radio.transmitting = true;
        player.radio = Some(radio);
    }

    sender.output_frame(&mut sim_a);
    receiver.input_frame(&mut sim_b);

    let id = EntityId::new(1, 1, 11);
    let events = receiver.drain_events();
    assert!(events.contains(&NetEvent::EmissionUpdated { id, systems: 1 }));
    assert!(events.contains(&NetEvent::RadioUpdated { id, radio_id: 1 }));

    let remote = receiver
        .inputs()
        .get(&id)
        .and_then(|nib| nib.player())
        .and_then(|h| sim_b.player(h))
        .unwrap();
    assert_eq!(remote.emitters.len(), 1);
    assert_eq!(remote.emitters[0].name, 1234);
    assert!((remote.emitters[0].frequency.as_hertz() - 9.4e9).abs() < 1e4);
    let radio = remote.radio.as_ref().unwrap();
    assert!(radio.powered && radio.transmitting);
}

fn start_resume(request_id: u32) -> Vec<u8> {
    encode(Pdu::StartResume(StartResumePdu {
        originating_entity_id: EntityId::new(9, 9, 0),
        receiving_entity_id: EntityId::new(ALL_SITES, ALL_APPLICATIONS, 0),
        request_id,
        ..Default::default()
    }))
}

#[test]
fn test_start_resume_is_acknowledged() {
    let (a, mut peer) = MemoryHandler::pair();
    let mut node = netio(a, 1);
    let mut sim = Simulation::default();

    peer.send(&start_resume(42)).unwrap();
    node.input_frame(&mut sim);

    assert_eq!(
        node.drain_events(),
        vec![NetEvent::StartResume {
            originator: EntityId::new(9, 9, 0),
            request_id: 42
        }]
    );
    let pdus = drain_peer(&mut peer);
    assert_eq!(pdus.len(), 1);
    let Pdu::Acknowledge(ack) = &pdus[0] else {
        panic!("expected acknowledge, got {:?}", pdus[0]);
    };
    assert_eq!(ack.acknowledge_flag, acknowledge::START_RESUME);
    assert_eq!(ack.response_flag, acknowledge::RESPONSE_ABLE_TO_COMPLY);
    assert_eq!(ack.request_id, 42);
    assert_eq!(ack.receiving_entity_id, EntityId::new(9, 9, 0));
}

#[test]
fn test_bundled_datagram_stops_at_bad_pdu() {
    let (a, mut peer) = MemoryHandler::pair();
    let mut node = netio(a, 1);
    let mut sim = Simulation::default();

    let mut comment = Datums::new(CommentPdu {
        originating_entity_id: EntityId::new(9, 9, 0),
        ..Default::default()
    });
    comment.variable.push(VariableDatum::text(1, "range hot"));

    let mut datagram = start_resume(1);
    datagram.extend(encode(Pdu::Comment(comment)));
    // header claiming more bytes than remain
    let mut truncated = start_resume(2);
    truncated.truncate(20);
    datagram.extend(truncated);
    peer.send(&datagram).unwrap();

    node.input_frame(&mut sim);
    let events = node.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], NetEvent::StartResume { request_id: 1, .. }));
    assert_eq!(
        events[1],
        NetEvent::Comment {
            originator: EntityId::new(9, 9, 0),
            text: vec!["range hot".to_string()]
        }
    );
    assert_eq!(node.stats().decode_errors, 1);
    assert_eq!(node.stats().pdus_received, 2);
}

#[test]
fn test_foreign_exercise_is_ignored() {
    let (a, mut peer) = MemoryHandler::pair();
    let mut node = netio(a, 1);
    let mut sim = Simulation::default();

    let mut pdu = Pdu::StartResume(StartResumePdu {
        originating_entity_id: EntityId::new(9, 9, 0),
        receiving_entity_id: EntityId::new(ALL_SITES, ALL_APPLICATIONS, 0),
        ..Default::default()
    });
    pdu.stamp(DIS_VERSION_1278_1A, 7, 0);
    peer.send(&pdu.encode(&codec())).unwrap();
    node.input_frame(&mut sim);

    assert!(node.drain_events().is_empty());
    assert_eq!(node.stats().foreign_exercise_dropped, 1);
}
