use crate::dis::{
    BeamSpec, BurstDescriptor, DeadReckoningParameters, Detonation, DetonationPdu, DetonationResult,
    ElectromagneticEmission, ElectromagneticEmissionPdu, EmissionSystem, EmitterBeam,
    EmitterSystem, EntityId, EntityMarking, EntityState, EntityStatePdu,
    EventIdentifier, FirePdu, Pdu, RadioEntityType, Transmitter, TransmitterPdu, burst, kind,
};
use crate::dr::DrThresholds;
use crate::nib::Nib;
use crate::player::{Emitter, Player, PlayerMode, Simulation};

use super::super::transport::NetHandler;
use super::Channel;

const EMISSION_STATE_UPDATE: u8 = 1;
const SYSTEM_DATA_WORDS: u8 = 5;
const BEAM_DATA_WORDS: u8 = 13;

fn entity_state_pdu(nib: &Nib) -> EntityState {
    let k = nib.kinematics;
    let pdu = EntityStatePdu {
        entity_id: nib.entity_id(),
        force_id: nib.force_id(),
        entity_type: nib.entity_type(),
        alternative_entity_type: nib.entity_type(),
        entity_linear_velocity: k.velocity.into(),
        entity_location: k.position.into(),
        entity_orientation: k.orientation.into(),
        appearance: nib.appearance_word(),
        dead_reckoning: DeadReckoningParameters {
            algorithm: nib.dr_algorithm() as u8,
            linear_acceleration: k.acceleration.into(),
            angular_velocity: k.angular_velocity.into(),
            ..Default::default()
        },
        entity_marking: EntityMarking::from_text(&nib.marking),
        ..Default::default()
    };
    let mut state = EntityState {
        pdu,
        ..Default::default()
    };
    state.set_articulations(nib.articulations.iter().copied().collect());
    state
}

/// Sends entity state when the captured state has drifted from what the
/// network is extrapolating. Returns whether a PDU went out.
pub(super) fn entity_state_manager<H: NetHandler>(
    channel: &mut Channel<H>,
    nib: &mut Nib,
    exec_time: f64,
    thresholds: &DrThresholds,
) -> bool {
    if !nib.is_player_state_update_required(exec_time, thresholds) {
        return false;
    }
    let state = entity_state_pdu(nib);
    if !channel.send(Pdu::EntityState(state)) {
        return false;
    }
    nib.mark_entity_state_sent(exec_time);
    true
}

struct Shot {
    shooter: EntityId,
    target: EntityId,
    event: EventIdentifier,
}

fn resolve_shot<H: NetHandler>(
    channel: &mut Channel<H>,
    nib: &mut Nib,
    weapon: &Player,
    sim: &Simulation,
) -> Option<Shot> {
    let Some(launcher) = weapon.launcher().and_then(|h| sim.players.get(h)) else {
        log::debug!("{}: no launcher, weapon event not sent", nib.entity_id());
        return None;
    };
    let target = weapon
        .weapon
        .and_then(|w| w.target)
        .and_then(|h| sim.players.get(h))
        .map(|p| channel.network_id(p))
        .unwrap_or(EntityId::NONE);
    if nib.event_number == 0 {
        nib.event_number = channel.allocate_event();
    }
    Some(Shot {
        shooter: channel.network_id(launcher),
        target,
        event: EventIdentifier::new(channel.site, channel.application, nib.event_number),
    })
}

fn burst_descriptor(nib: &Nib) -> BurstDescriptor {
    BurstDescriptor {
        munition: nib.entity_type(),
        warhead: burst::WARHEAD_HIGH_EXPLOSIVE,
        fuse: burst::FUSE_CONTACT,
        quantity: 1,
        rate: 0,
    }
}

/// Announces a launched weapon once. Requires the launcher to still exist.
pub(super) fn weapon_fire_msg_factory<H: NetHandler>(
    channel: &mut Channel<H>,
    nib: &mut Nib,
    weapon: &Player,
    sim: &Simulation,
) -> bool {
    let Some(shot) = resolve_shot(channel, nib, weapon, sim) else {
        return false;
    };
    let pdu = FirePdu {
        firing_entity_id: shot.shooter,
        target_entity_id: shot.target,
        munition_id: nib.entity_id(),
        event_id: shot.event,
        location: nib.kinematics.position.into(),
        burst: burst_descriptor(nib),
        velocity: nib.kinematics.velocity.into(),
        ..Default::default()
    };
    if !channel.send(Pdu::Fire(pdu)) {
        return false;
    }
    log::debug!("{} fired {} at {}", shot.shooter, nib.entity_id(), shot.target);
    nib.fire_sent = true;
    true
}

/// Announces the weapon's detonation once, sharing the fire event number.
pub(super) fn munition_detonation_msg_factory<H: NetHandler>(
    channel: &mut Channel<H>,
    nib: &mut Nib,
    weapon: &Player,
    sim: &Simulation,
) -> bool {
    let Some(shot) = resolve_shot(channel, nib, weapon, sim) else {
        return false;
    };
    let result = weapon
        .weapon
        .and_then(|w| w.detonation_result)
        .unwrap_or(DetonationResult::Detonation);
    let pdu = DetonationPdu {
        firing_entity_id: shot.shooter,
        target_entity_id: shot.target,
        munition_id: nib.entity_id(),
        event_id: shot.event,
        velocity: nib.kinematics.velocity.into(),
        location: nib.kinematics.position.into(),
        burst: burst_descriptor(nib),
        detonation_result: result as u8,
        ..Default::default()
    };
    let detonation = Detonation {
        pdu,
        ..Default::default()
    };
    if !channel.send(Pdu::Detonation(detonation)) {
        return false;
    }
    log::debug!("{} detonated ({result:?})", nib.entity_id());
    nib.detonation_sent = true;
    true
}

fn beam(emitter: &Emitter) -> EmitterBeam {
    EmitterBeam {
        beam_data_length: BEAM_DATA_WORDS,
        beam_id: 1,
        frequency: emitter.frequency.as_hertz() as f32,
        frequency_range: emitter.frequency_range.as_hertz() as f32,
        effective_radiated_power: emitter.power.as_dbm() as f32,
        pulse_repetition_frequency: emitter.pulse_repetition_frequency as f32,
        pulse_width: emitter.pulse_width as f32,
        beam_azimuth_center: emitter.azimuth_center as f32,
        beam_azimuth_sweep: emitter.azimuth_sweep as f32,
        beam_elevation_center: emitter.elevation_center as f32,
        beam_elevation_sweep: emitter.elevation_sweep as f32,
        beam_function: emitter.beam_function,
        ..Default::default()
    }
}

/// Sends the emitter set on change or heartbeat. Emitters that are not
/// transmitting are listed without beams.
pub(super) fn emission_manager<H: NetHandler>(
    channel: &mut Channel<H>,
    nib: &mut Nib,
    exec_time: f64,
    heartbeat: f64,
) -> bool {
    if nib.mode == PlayerMode::DeleteRequest
        || !nib.is_emission_update_required(exec_time, heartbeat)
    {
        return false;
    }
    let event = channel.allocate_event();
    let mut message = ElectromagneticEmission::new(ElectromagneticEmissionPdu {
        emitting_entity_id: nib.entity_id(),
        event_id: EventIdentifier::new(channel.site, channel.application, event),
        state_update_indicator: EMISSION_STATE_UPDATE,
        ..Default::default()
    });
    for emitter in &nib.emitters {
        let system = EmissionSystem {
            system_data_length: SYSTEM_DATA_WORDS,
            emitter_system: EmitterSystem {
                name: emitter.name,
                function: emitter.function,
                id: emitter.id,
            },
            location: emitter.location.into(),
            ..Default::default()
        };
        let beams: Vec<BeamSpec> = emitter
            .transmitting
            .then(|| BeamSpec {
                beam: beam(emitter),
                targets: Vec::new(),
            })
            .into_iter()
            .collect();
        if !message.push_system(system, &beams) {
            log::warn!("{}: emitter {} dropped from emission pdu", nib.entity_id(), emitter.id);
        }
    }
    if !channel.send(Pdu::ElectromagneticEmission(message)) {
        return false;
    }
    nib.mark_emission_sent(exec_time);
    true
}

/// Sends the radio state on change or heartbeat; the antenna sits at the
/// entity's location.
pub(super) fn transmitter_manager<H: NetHandler>(
    channel: &mut Channel<H>,
    nib: &mut Nib,
    exec_time: f64,
    heartbeat: f64,
) -> bool {
    if nib.mode == PlayerMode::DeleteRequest || !nib.is_radio_update_required(exec_time, heartbeat)
    {
        return false;
    }
    let Some(radio) = nib.radio.clone() else {
        // Radio removed since the last send: report it switched off once.
        return send_radio_off(channel, nib, exec_time);
    };
    let pdu = TransmitterPdu {
        entity_id: nib.entity_id(),
        radio_id: radio.id,
        radio_entity_type: RadioEntityType {
            kind: kind::RADIO,
            ..Default::default()
        },
        transmit_state: radio.transmit_state(),
        antenna_location: nib.kinematics.position.into(),
        frequency: radio.frequency.as_hertz().max(0.0) as u64,
        transmit_frequency_bandwidth: radio.bandwidth.as_hertz() as f32,
        power: radio.power.as_dbm() as f32,
        ..Default::default()
    };
    if !channel.send(Pdu::Transmitter(Transmitter::new(pdu))) {
        return false;
    }
    nib.mark_radio_sent(exec_time);
    true
}

fn send_radio_off<H: NetHandler>(channel: &mut Channel<H>, nib: &mut Nib, exec_time: f64) -> bool {
    let pdu = TransmitterPdu {
        entity_id: nib.entity_id(),
        antenna_location: nib.kinematics.position.into(),
        ..Default::default()
    };
    if !channel.send(Pdu::Transmitter(Transmitter::new(pdu))) {
        return false;
    }
    nib.mark_radio_sent(exec_time);
    true
}
