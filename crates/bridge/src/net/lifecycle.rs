//! NIB creation and expiry shared by the DIS and HLA NetIOs.

use crate::dis::{EntityId, EntityType};
use crate::dr::DrAlgorithm;
use crate::nib::{Nib, NibTable, side_from_force};
use crate::ntm::Ntm;
use crate::player::{Player, PlayerHandle, PlayerMode, Simulation, TemplateRegistry, VehicleClass};

use super::config::NetIoConfig;
use super::event::{NetEvent, RemovalReason};

/// Input NIB for a first sighting, bound to a new mirroring player when the
/// type maps to a registered template.
#[allow(clippy::too_many_arguments)]
pub(crate) fn new_input_nib(
    id: EntityId,
    entity_type: EntityType,
    force_id: u8,
    marking: &str,
    config: &NetIoConfig,
    ntm: &Ntm,
    templates: &TemplateRegistry,
    sim: &mut Simulation,
) -> Nib {
    let mut nib = Nib::new_input(id, &config.federate_name, config.smoothing_time);
    if !nib.set_entity_type_record(entity_type) {
        log::debug!("{id}: creating input entity with null type");
    }
    nib.side = side_from_force(force_id);
    nib.marking = marking.to_string();

    let template = ntm.find_template(&entity_type).map(str::to_string);
    match template.as_deref().and_then(|t| templates.build(t)) {
        Some(mut player) => {
            player.id = id.entity;
            player.name = if marking.is_empty() {
                id.to_string()
            } else {
                marking.to_string()
            };
            player.side = nib.side;
            player.remote_id = Some(id);
            player.network_enabled = false;
            nib.class = player.class;
            nib.bind_player(sim.add_player(player));
        }
        None => log::debug!("{id}: no player template for {entity_type}"),
    }
    nib.template = template;
    nib.ntm_checked = true;
    log::debug!("input entity {id} created ({entity_type})");
    nib
}

/// Local players that should have an output NIB.
pub(crate) fn is_publishable(player: &Player) -> bool {
    player.is_local() && player.network_enabled && player.mode.is_networked()
}

pub(crate) fn new_output_nib(
    id: EntityId,
    handle: PlayerHandle,
    player: &Player,
    config: &NetIoConfig,
    ntm: &Ntm,
) -> Nib {
    let algorithm = match player.class {
        VehicleClass::Air | VehicleClass::Weapon => DrAlgorithm::Rvw,
        _ => DrAlgorithm::Fpw,
    };
    let mut nib = Nib::new_output(id, handle, &config.federate_name, algorithm);
    nib.template = Some(player.template.clone());
    nib.class = player.class;
    match ntm.find_entity_type(&player.template) {
        Some(entity_type) => {
            nib.set_entity_type_record(entity_type);
        }
        None => log::warn!(
            "no entity type for template {}; {id} goes out untyped",
            player.template
        ),
    }
    nib.ntm_checked = true;
    log::debug!("output entity {id} created for player {}", player.name);
    nib
}

/// Creates output NIBs for local players that became publishable.
pub(crate) fn sync_output_nibs(
    outputs: &mut NibTable,
    sim: &Simulation,
    config: &NetIoConfig,
    ntm: &Ntm,
    events: &mut Vec<NetEvent>,
) -> Vec<EntityId> {
    let mut created = Vec::new();
    for (handle, player) in sim.players.iter() {
        if !is_publishable(player) || outputs.find_by_player(handle).is_some() {
            continue;
        }
        let id = EntityId::new(config.site, config.application, player.id);
        if outputs.contains(&id) {
            log::warn!("player {} collides with output entity {id}", player.name);
            continue;
        }
        if outputs.insert(new_output_nib(id, handle, player, config, ntm)) {
            events.push(NetEvent::EntityCreated {
                id,
                player: Some(handle),
            });
            created.push(id);
        }
    }
    created
}

/// Moves every mirrored player to its extrapolated network state.
pub(crate) fn update_remote_players(inputs: &mut NibTable, sim: &mut Simulation, ntm: &Ntm) {
    let exec_time = sim.exec_time();
    let area = *sim.gaming_area();
    for nib in inputs.iter_mut() {
        let Some(player) = nib.player().and_then(|h| sim.players.get_mut(h)) else {
            continue;
        };
        nib.nib_to_player_state(player, &area, exec_time, ntm);
    }
}

/// Drops input NIBs that were deactivated or went quiet, along with their
/// players. Returns how many timed out.
pub(crate) fn expire_inputs(
    inputs: &mut NibTable,
    sim: &mut Simulation,
    max_age: f64,
    events: &mut Vec<NetEvent>,
) -> u64 {
    let exec_time = sim.exec_time();
    let removed = inputs.drain_where(|nib| {
        nib.mode == PlayerMode::DeleteRequest || nib.is_stale(exec_time, max_age)
    });
    let mut timed_out = 0;
    for nib in removed {
        let reason = if nib.mode == PlayerMode::DeleteRequest {
            RemovalReason::Deactivated
        } else {
            timed_out += 1;
            RemovalReason::TimedOut
        };
        remove_input(nib, reason, sim, events);
    }
    timed_out
}

pub(crate) fn remove_input(
    nib: Nib,
    reason: RemovalReason,
    sim: &mut Simulation,
    events: &mut Vec<NetEvent>,
) {
    if let Some(handle) = nib.player() {
        sim.remove_player(handle);
    }
    log::debug!("input entity {} removed ({reason:?})", nib.entity_id());
    events.push(NetEvent::EntityRemoved {
        id: nib.entity_id(),
        reason,
    });
}
