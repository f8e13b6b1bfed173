use glam::DVec3;

use crate::dis::{
    ALL_APPLICATIONS, ALL_SITES, AcknowledgePdu, CommentPdu, Datums, Detonation,
    ElectromagneticEmission, EntityId, EntityState, EntityType, FirePdu, PduHeader, Pdu, Signal,
    Transmitter, acknowledge, decode_dis_timestamp, decode_datagram,
};
use crate::dr::DrAlgorithm;
use crate::nib::{Nib, StagedArticulation, StagedEntityState, decode_appearance};
use crate::player::{Emitter, PlayerHandle, PlayerMode, Radio, Simulation, WeaponState};
use crate::units::{Frequency, Power};

use super::super::config::Timeline;
use super::super::event::NetEvent;
use super::super::lifecycle;
use super::super::transport::NetHandler;
use super::DisNetIo;

const HALF_HOUR: f64 = 1800.0;

impl<H: NetHandler> DisNetIo<H> {
    pub(super) fn process_datagram(&mut self, datagram: &[u8], sim: &mut Simulation) {
        self.channel.stats.record_received(datagram.len());
        let (pdus, error) = decode_datagram(datagram, &self.channel.codec);
        if let Some(e) = error {
            self.channel.stats.decode_errors += 1;
            log::warn!("dropping rest of {} byte datagram: {e}", datagram.len());
        }
        for pdu in pdus {
            self.channel.stats.pdus_received += 1;
            if pdu.header().exercise_id != self.config.exercise {
                self.channel.stats.foreign_exercise_dropped += 1;
                log::trace!("ignoring exercise {} pdu", pdu.header().exercise_id);
                continue;
            }
            self.process_pdu(pdu, sim);
        }
    }

    /// Dispatches one decoded PDU of our exercise.
    pub fn process_pdu(&mut self, pdu: Pdu, sim: &mut Simulation) {
        match pdu {
            Pdu::EntityState(es) => self.process_entity_state_pdu(&es, sim),
            Pdu::Fire(fire) => self.process_fire_pdu(&fire, sim),
            Pdu::Detonation(det) => self.process_detonation_pdu(&det, sim),
            Pdu::ElectromagneticEmission(ee) => self.process_emission_pdu(&ee, sim),
            Pdu::Transmitter(tx) => self.process_transmitter_pdu(&tx, sim),
            Pdu::Signal(signal) => self.process_signal_pdu(signal),
            Pdu::StartResume(p) => self.process_simulation_management(
                p.originating_entity_id,
                p.receiving_entity_id,
                p.request_id,
                acknowledge::START_RESUME,
            ),
            Pdu::StopFreeze(p) => self.process_simulation_management(
                p.originating_entity_id,
                p.receiving_entity_id,
                p.request_id,
                acknowledge::STOP_FREEZE,
            ),
            Pdu::Comment(comment) => self.process_comment_pdu(&comment),
            other => {
                self.channel.stats.unhandled += 1;
                log::trace!("no handler for {:?} pdu", other.pdu_type());
            }
        }
    }

    fn is_echo(&mut self, id: &EntityId) -> bool {
        if self.channel.is_ours(id) || self.outputs.contains(id) {
            self.channel.stats.echoes_dropped += 1;
            log::trace!("dropping echo of {id}");
            return true;
        }
        false
    }

    /// Age of a remote timestamp in local seconds. Only absolute stamps on
    /// the UTC timeline carry usable clock information.
    fn diff_time(&self, header: &PduHeader, sim: &Simulation) -> f64 {
        let (remote, absolute) = decode_dis_timestamp(header.timestamp);
        if self.config.timeline != Timeline::Utc || !absolute {
            return 0.0;
        }
        let local = sim.utc_time().rem_euclid(3600.0);
        let mut diff = local - remote;
        if diff > HALF_HOUR {
            diff -= 3600.0;
        } else if diff < -HALF_HOUR {
            diff += 3600.0;
        }
        diff
    }

    fn create_input_nib(
        &mut self,
        id: EntityId,
        entity_type: EntityType,
        force_id: u8,
        marking: &str,
        sim: &mut Simulation,
    ) {
        let nib = lifecycle::new_input_nib(
            id,
            entity_type,
            force_id,
            marking,
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

    fn staged_entity_state(&self, es: &EntityState, sim: &Simulation) -> StagedEntityState {
        let pdu = &es.pdu;
        let decoded =
            decode_appearance(pdu.appearance, pdu.entity_type.kind, pdu.entity_type.domain);
        let articulations = (0..pdu.number_of_articulation_parameters as usize)
            .map_while(|idx| es.articulation_parameter(idx));
        StagedEntityState {
            entity_type: pdu.entity_type,
            force_id: pdu.force_id,
            marking: pdu.entity_marking.text(),
            appearance: decoded.appearance,
            deactivated: decoded.deactivated,
            articulation: StagedArticulation::from_parameters(articulations),
            position: pdu.entity_location.into(),
            velocity: pdu.entity_linear_velocity.into(),
            acceleration: pdu.dead_reckoning.linear_acceleration.into(),
            orientation: pdu.entity_orientation.into(),
            angular_velocity: pdu.dead_reckoning.angular_velocity.into(),
            dr_algorithm: DrAlgorithm::from_u8(pdu.dead_reckoning.algorithm),
            diff_time: self.diff_time(&pdu.header, sim),
        }
    }

    /// Mirrors a remote entity: echo suppression, lazy NIB creation, then
    /// the staged update.
    pub fn process_entity_state_pdu(&mut self, es: &EntityState, sim: &mut Simulation) {
        let id = es.pdu.entity_id;
        if self.is_echo(&id) {
            return;
        }
        let staged = self.staged_entity_state(es, sim);
        if !self.inputs.contains(&id) {
            if staged.deactivated {
                log::trace!("{id}: deactivated before first sighting");
                return;
            }
            self.create_input_nib(id, staged.entity_type, staged.force_id, &staged.marking, sim);
        }
        if let Some(nib) = self.inputs.get_mut(&id) {
            nib.entity_state_to_nib(&staged, sim.exec_time());
        }
    }

    fn handle_for(&self, id: &EntityId) -> Option<PlayerHandle> {
        self.outputs
            .get(id)
            .or_else(|| self.inputs.get(id))
            .and_then(Nib::player)
    }

    /// A remote shot: the munition becomes a launched input entity until
    /// its own entity state arrives.
    pub fn process_fire_pdu(&mut self, fire: &FirePdu, sim: &mut Simulation) {
        if self.is_echo(&fire.firing_entity_id) {
            return;
        }
        let munition = fire.munition_id;
        if !munition.is_none() && !self.inputs.contains(&munition) {
            let force_id = self
                .inputs
                .get(&fire.firing_entity_id)
                .map_or(0, Nib::force_id);
            let staged = StagedEntityState {
                entity_type: fire.burst.munition,
                force_id,
                position: fire.location.into(),
                velocity: fire.velocity.into(),
                dr_algorithm: DrAlgorithm::Fpw,
                diff_time: self.diff_time(&fire.header, sim),
                ..Default::default()
            };
            self.create_input_nib(munition, staged.entity_type, force_id, "", sim);
            let launcher = self.handle_for(&fire.firing_entity_id);
            let target = self.handle_for(&fire.target_entity_id);
            if let Some(nib) = self.inputs.get_mut(&munition) {
                nib.entity_state_to_nib(&staged, sim.exec_time());
                if let Some(player) = nib.player().and_then(|h| sim.players.get_mut(h)) {
                    player.weapon = Some(WeaponState {
                        launcher,
                        target,
                        event: fire.event_id.event,
                        ..Default::default()
                    });
                }
            }
        }
        log::debug!(
            "{} fired {} at {}",
            fire.firing_entity_id,
            fire.munition_id,
            fire.target_entity_id
        );
        self.events.push(NetEvent::WeaponFired {
            shooter: fire.firing_entity_id,
            munition,
            target: fire.target_entity_id,
            event: fire.event_id,
        });
    }

    /// A remote detonation: the munition is marked detonated and the event
    /// names our player when it was the target.
    pub fn process_detonation_pdu(&mut self, det: &Detonation, sim: &mut Simulation) {
        let pdu = &det.pdu;
        if self.is_echo(&pdu.firing_entity_id) {
            return;
        }
        let result = det.result();
        if let Some(nib) = self.inputs.get_mut(&pdu.munition_id) {
            nib.mode = PlayerMode::Detonated;
            if let Some(player) = nib.player().and_then(|h| sim.players.get_mut(h)) {
                player.set_mode(PlayerMode::Detonated);
                let weapon = player.weapon.get_or_insert_with(WeaponState::default);
                weapon.detonation_result = Some(result);
            }
        }
        let local_target = self.outputs.get(&pdu.target_entity_id).and_then(Nib::player);
        let location = sim.gaming_area().position_from_ecef(DVec3::from(pdu.location));
        log::debug!(
            "{} detonated on {}: {result:?}",
            pdu.munition_id,
            pdu.target_entity_id
        );
        self.events.push(NetEvent::Detonation {
            shooter: pdu.firing_entity_id,
            munition: pdu.munition_id,
            target: pdu.target_entity_id,
            local_target,
            result,
            location,
        });
    }

    /// Replaces the remote entity's emitter list; one emitter per system,
    /// characterised by its first beam.
    pub fn process_emission_pdu(&mut self, ee: &ElectromagneticEmission, sim: &mut Simulation) {
        let id = ee.pdu.emitting_entity_id;
        if self.is_echo(&id) {
            return;
        }
        let Some(nib) = self.inputs.get_mut(&id) else {
            log::trace!("emission from unknown entity {id}");
            return;
        };
        let emitters: Vec<Emitter> = ee
            .systems()
            .map(|view| {
                let system = view.system.emitter_system;
                let first = view.beams().next();
                let mut emitter = Emitter::new(
                    system.name,
                    system.id,
                    Frequency::hertz(first.map_or(0.0, |b| f64::from(b.beam.frequency))),
                    Power::dbm(first.map_or(0.0, |b| f64::from(b.beam.effective_radiated_power))),
                );
                emitter.function = system.function;
                emitter.location = view.system.location.into();
                emitter.transmitting = first.is_some();
                if let Some(b) = first.map(|beam| beam.beam) {
                    emitter.frequency_range = Frequency::hertz(f64::from(b.frequency_range));
                    emitter.pulse_repetition_frequency = f64::from(b.pulse_repetition_frequency);
                    emitter.pulse_width = f64::from(b.pulse_width);
                    emitter.azimuth_center = f64::from(b.beam_azimuth_center);
                    emitter.azimuth_sweep = f64::from(b.beam_azimuth_sweep);
                    emitter.elevation_center = f64::from(b.beam_elevation_center);
                    emitter.elevation_sweep = f64::from(b.beam_elevation_sweep);
                    emitter.beam_function = b.beam_function;
                }
                emitter
            })
            .collect();
        let systems = emitters.len();
        if let Some(player) = nib.player().and_then(|h| sim.players.get_mut(h)) {
            player.emitters.clone_from(&emitters);
        }
        nib.emitters = emitters;
        self.events.push(NetEvent::EmissionUpdated { id, systems });
    }

    pub fn process_transmitter_pdu(&mut self, tx: &Transmitter, sim: &mut Simulation) {
        let pdu = &tx.pdu;
        let id = pdu.entity_id;
        if self.is_echo(&id) {
            return;
        }
        let Some(nib) = self.inputs.get_mut(&id) else {
            log::trace!("transmitter on unknown entity {id}");
            return;
        };
        let mut radio = Radio::new(
            pdu.radio_id,
            Frequency::hertz(pdu.frequency as f64),
            Power::dbm(f64::from(pdu.power)),
        );
        radio.bandwidth = Frequency::hertz(f64::from(pdu.transmit_frequency_bandwidth));
        radio.set_transmit_state(pdu.transmit_state);
        if let Some(player) = nib.player().and_then(|h| sim.players.get_mut(h)) {
            player.radio = Some(radio.clone());
        }
        nib.radio = Some(radio);
        self.events.push(NetEvent::RadioUpdated {
            id,
            radio_id: pdu.radio_id,
        });
    }

    pub fn process_signal_pdu(&mut self, signal: Signal) {
        let id = signal.pdu.entity_id;
        if self.is_echo(&id) {
            return;
        }
        let radio_id = signal.pdu.radio_id;
        let mut data = signal.data;
        data.truncate(signal.pdu.data_length.div_ceil(8) as usize);
        self.events.push(NetEvent::SignalReceived { id, radio_id, data });
    }

    fn addressed_to_us(&self, receiver: &EntityId) -> bool {
        (receiver.site == ALL_SITES || receiver.site == self.config.site)
            && (receiver.application == ALL_APPLICATIONS
                || receiver.application == self.config.application)
    }

    /// Start/resume and stop/freeze: raised to the host, which decides what
    /// to do, and acknowledged as able to comply.
    fn process_simulation_management(
        &mut self,
        originator: EntityId,
        receiver: EntityId,
        request_id: u32,
        acknowledge_flag: u16,
    ) {
        if self.channel.is_ours(&originator) || !self.addressed_to_us(&receiver) {
            log::trace!("simulation management from {originator} to {receiver} ignored");
            return;
        }
        let event = if acknowledge_flag == acknowledge::START_RESUME {
            NetEvent::StartResume {
                originator,
                request_id,
            }
        } else {
            NetEvent::StopFreeze {
                originator,
                request_id,
            }
        };
        log::info!("{event}");
        self.events.push(event);

        let ack = AcknowledgePdu {
            originating_entity_id: EntityId::new(self.config.site, self.config.application, 0),
            receiving_entity_id: originator,
            acknowledge_flag,
            response_flag: acknowledge::RESPONSE_ABLE_TO_COMPLY,
            request_id,
            ..Default::default()
        };
        if !self.channel.send(Pdu::Acknowledge(ack)) {
            log::warn!("acknowledge of request {request_id} to {originator} not sent");
        }
    }

    fn process_comment_pdu(&mut self, comment: &Datums<CommentPdu>) {
        let originator = comment.pdu.originating_entity_id;
        if self.channel.is_ours(&originator) {
            return;
        }
        let text = comment.variable.iter().map(|datum| datum.as_text()).collect();
        self.events.push(NetEvent::Comment { originator, text });
    }
}
