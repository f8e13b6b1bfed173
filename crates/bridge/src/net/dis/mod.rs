mod inbound;
mod outbound;

use crate::dis::{EntityId, MAX_PDU_SIZE, Pdu, WireCodec, dis_timestamp};
use crate::nib::NibTable;
use crate::ntm::Ntm;
use crate::player::{Player, PlayerMode, Simulation, TemplateRegistry};

use super::config::{NetIoConfig, Timeline};
use super::event::{NetEvent, RemovalReason};
use super::lifecycle;
use super::stats::NetworkStats;
use super::transport::NetHandler;

const RECEIVE_BUFFER_SIZE: usize = 65_536;

/// Sending half of a DIS NetIO: the handler, codec and counters plus the
/// header values stamped on every PDU of the current frame.
struct Channel<H> {
    handler: H,
    codec: WireCodec,
    stats: NetworkStats,
    site: u16,
    application: u16,
    exercise: u8,
    protocol_version: u8,
    timestamp: u32,
    next_event: u16,
}

impl<H: NetHandler> Channel<H> {
    /// Stamps, encodes and sends one PDU. Returns whether it went out.
    fn send(&mut self, mut pdu: Pdu) -> bool {
        pdu.stamp(self.protocol_version, self.exercise, self.timestamp);
        let bytes = pdu.encode(&self.codec);
        if bytes.len() > MAX_PDU_SIZE {
            log::warn!("not sending {} byte {:?} pdu", bytes.len(), pdu.pdu_type());
            self.stats.send_failures += 1;
            return false;
        }
        match self.handler.send(&bytes) {
            Ok(sent) => {
                self.stats.record_sent(sent, 1);
                true
            }
            Err(e) => {
                log::warn!("send of {:?} failed: {e}", pdu.pdu_type());
                self.stats.send_failures += 1;
                false
            }
        }
    }

    fn allocate_event(&mut self) -> u16 {
        self.next_event = self.next_event.wrapping_add(1).max(1);
        self.next_event
    }

    /// Network id of a player: mirrored id for remote players, ours for
    /// local ones.
    fn network_id(&self, player: &Player) -> EntityId {
        player
            .remote_id
            .unwrap_or(EntityId::new(self.site, self.application, player.id))
    }

    fn is_ours(&self, id: &EntityId) -> bool {
        id.same_simulation(self.site, self.application)
    }
}

/// DIS network I/O: maps local players onto PDUs and incoming PDUs onto
/// remote players.
pub struct DisNetIo<H: NetHandler> {
    channel: Channel<H>,
    config: NetIoConfig,
    ntm: Ntm,
    templates: TemplateRegistry,
    inputs: NibTable,
    outputs: NibTable,
    events: Vec<NetEvent>,
    recv_buffer: Vec<u8>,
}

impl<H: NetHandler> DisNetIo<H> {
    pub fn new(handler: H, config: NetIoConfig, ntm: Ntm, templates: TemplateRegistry) -> Self {
        log::info!(
            "dis netio site {} application {} exercise {} ({:?} timeline)",
            config.site,
            config.application,
            config.exercise,
            config.timeline
        );
        Self {
            channel: Channel {
                handler,
                codec: WireCodec::new(config.byte_order),
                stats: NetworkStats::default(),
                site: config.site,
                application: config.application,
                exercise: config.exercise,
                protocol_version: config.protocol_version,
                timestamp: 0,
                next_event: 0,
            },
            config,
            ntm,
            templates,
            inputs: NibTable::new(),
            outputs: NibTable::new(),
            events: Vec::new(),
            recv_buffer: vec![0; RECEIVE_BUFFER_SIZE],
        }
    }

    pub fn config(&self) -> &NetIoConfig {
        &self.config
    }

    pub fn ntm(&self) -> &Ntm {
        &self.ntm
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.channel.stats
    }

    pub fn handler(&self) -> &H {
        &self.channel.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.channel.handler
    }

    pub fn inputs(&self) -> &NibTable {
        &self.inputs
    }

    pub fn outputs(&self) -> &NibTable {
        &self.outputs
    }

    /// Events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        std::mem::take(&mut self.events)
    }

    fn begin_frame(&mut self, sim: &Simulation) {
        self.channel.timestamp = match self.config.timeline {
            Timeline::Execution => dis_timestamp(sim.exec_time(), false),
            Timeline::Utc => dis_timestamp(sim.utc_time().rem_euclid(3600.0), true),
        };
    }

    /// Receives and dispatches everything pending, moves the remote
    /// players, then drops entities that left or went quiet.
    pub fn input_frame(&mut self, sim: &mut Simulation) {
        self.begin_frame(sim);
        let mut buf = std::mem::take(&mut self.recv_buffer);
        loop {
            match self.channel.handler.receive(&mut buf) {
                Ok(Some(size)) => self.process_datagram(&buf[..size], sim),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("receive failed: {e}");
                    break;
                }
            }
        }
        self.recv_buffer = buf;

        lifecycle::update_remote_players(&mut self.inputs, sim, &self.ntm);
        let max_age = self.config.thresholds.max_age;
        self.channel.stats.entities_timed_out +=
            lifecycle::expire_inputs(&mut self.inputs, sim, max_age, &mut self.events);
    }

    /// Publishes the local players: creates output NIBs for newly networked
    /// players, captures state, runs the factories and retires deleted
    /// entities once their final PDU is out.
    pub fn output_frame(&mut self, sim: &mut Simulation) {
        self.begin_frame(sim);
        lifecycle::sync_output_nibs(
            &mut self.outputs,
            sim,
            &self.config,
            &self.ntm,
            &mut self.events,
        );

        let exec_time = sim.exec_time();
        let area = *sim.gaming_area();
        let mut retired = Vec::new();
        for nib in self.outputs.iter_mut() {
            match nib.player().and_then(|h| sim.players.get(h)) {
                Some(player) if player.network_enabled => {
                    nib.player_state_to_nib(player, &area, exec_time);
                }
                _ => nib.mode = PlayerMode::DeleteRequest,
            }
            nib.manage_articulation_parameters(&self.ntm);

            let sent = outbound::entity_state_manager(
                &mut self.channel,
                nib,
                exec_time,
                &self.config.thresholds,
            );
            if nib.mode == PlayerMode::DeleteRequest {
                if sent || nib.sent_state().is_none() {
                    retired.push(nib.entity_id());
                }
                continue;
            }

            if let Some(player) = nib.player().and_then(|h| sim.players.get(h)) {
                if player.is_weapon() {
                    if matches!(player.mode, PlayerMode::Launched | PlayerMode::Detonated)
                        && !nib.fire_sent
                    {
                        outbound::weapon_fire_msg_factory(&mut self.channel, nib, player, sim);
                    }
                    if player.mode == PlayerMode::Detonated
                        && nib.fire_sent
                        && !nib.detonation_sent
                    {
                        outbound::munition_detonation_msg_factory(
                            &mut self.channel,
                            nib,
                            player,
                            sim,
                        );
                    }
                }
                let heartbeat = self.config.emission_heartbeat;
                outbound::emission_manager(&mut self.channel, nib, exec_time, heartbeat);
                outbound::transmitter_manager(&mut self.channel, nib, exec_time, heartbeat);
            }
        }

        for id in retired {
            if let Some(nib) = self.outputs.remove(&id) {
                self.events.push(NetEvent::EntityRemoved {
                    id: nib.entity_id(),
                    reason: RemovalReason::Deleted,
                });
            }
        }
    }
}
