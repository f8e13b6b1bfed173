use std::thread;
use std::time::{Duration, Instant};

use glam::DVec3;

use simbridge::dis::{EntityId, EntityType};
use simbridge::net::{DisNetIo, NetEvent, NetIoConfig, UdpHandler};
use simbridge::ntm::{Ntm, NtmEntry};
use simbridge::player::{Player, PlayerMode, Simulation, TemplateRegistry, VehicleClass};

fn netio(handler: UdpHandler, site: u16) -> DisNetIo<UdpHandler> {
    let ntm = Ntm::new(vec![NtmEntry::new("uh60", EntityType::new(1, 2, 225, 20, 1, 0, 0))]);
    let mut templates = TemplateRegistry::new();
    templates.register("uh60", || Player::default().with_class(VehicleClass::Air));
    let config = NetIoConfig {
        site,
        ..Default::default()
    };
    DisNetIo::new(handler, config, ntm, templates)
}

fn wait_for_events(
    netio: &mut DisNetIo<UdpHandler>,
    sim: &mut Simulation,
    timeout_ms: u64,
) -> Option<Vec<NetEvent>> {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        netio.input_frame(sim);
        let events = netio.drain_events();
        if !events.is_empty() {
            return Some(events);
        }
        thread::sleep(Duration::from_millis(1));
    }
    None
}

#[test]
fn test_entity_state_over_udp() {
    let placeholder = "127.0.0.1:9".parse().unwrap();
    let receiving = UdpHandler::bind("127.0.0.1:0", placeholder).unwrap();
    let sending = UdpHandler::bind("127.0.0.1:0", receiving.local_addr()).unwrap();

    let mut sender = netio(sending, 1);
    let mut receiver = netio(receiving, 2);
    let mut sim_a = Simulation::default();
    let mut sim_b = Simulation::default();

    let mut player = Player::new(3, "dustoff", "uh60").with_class(VehicleClass::Air);
    player.mode = PlayerMode::Active;
    player.network_enabled = true;
    player.position = DVec3::new(100.0, 200.0, -150.0);
    sim_a.add_player(player);

    sender.output_frame(&mut sim_a);
    assert_eq!(sender.stats().datagrams_sent, 1);

    let events = wait_for_events(&mut receiver, &mut sim_b, 500).expect("no entity state received");
    let id = EntityId::new(1, 1, 3);
    assert!(matches!(events[0], NetEvent::EntityCreated { id: got, player: Some(_) } if got == id));

    let remote = receiver
        .inputs()
        .get(&id)
        .and_then(|nib| nib.player())
        .and_then(|h| sim_b.player(h))
        .unwrap();
    assert_eq!(remote.name, "dustoff");
    assert!((remote.position - DVec3::new(100.0, 200.0, -150.0)).length() < 0.01);
    assert_eq!(receiver.stats().datagrams_received, 1);
}
