use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use simbridge::dis::EntityId;
use simbridge::geo::GamingArea;
use simbridge::net::{DisNetIo, NetEvent, NetHandler, NetworkStats};
use simbridge::nib::{Nib, NibTable};
use simbridge::ntm::Ntm;
use simbridge::player::{PlayerMode, Simulation};

use crate::config::NodeConfig;
use crate::events::NodeEvent;
use crate::scenario::{Scenario, templates};

/// Frame time is clamped so a stalled terminal cannot queue up a burst of
/// catch-up ticks.
const MAX_FRAME_SECS: f64 = 0.25;

pub struct FixedTimestep {
    dt: f64,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / f64::from(tick_rate.max(1)),
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f64) {
        self.accumulator += delta.min(MAX_FRAME_SECS);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct NibRow {
    pub id: EntityId,
    pub marking: String,
    pub template: String,
    pub mode: PlayerMode,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl NibRow {
    fn from_nib(nib: &Nib, sim: &Simulation) -> Self {
        let position = nib
            .player()
            .and_then(|h| sim.player(h))
            .map(|p| p.position)
            .unwrap_or_default();
        let geodetic = sim.gaming_area().geodetic(position);
        Self {
            id: nib.entity_id(),
            marking: nib.marking.clone(),
            template: nib.template.clone().unwrap_or_else(|| "-".to_string()),
            mode: nib.mode,
            latitude: geodetic.latitude,
            longitude: geodetic.longitude,
            altitude: geodetic.altitude,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeStats {
    pub uptime_secs: u64,
    pub tick: u64,
    pub exec_time: f64,
    pub frozen: bool,
    pub missiles_in_flight: usize,
    pub inputs: Vec<NibRow>,
    pub outputs: Vec<NibRow>,
    pub network: NetworkStats,
}

fn rows(table: &NibTable, sim: &Simulation) -> Vec<NibRow> {
    table.iter().map(|nib| NibRow::from_nib(nib, sim)).collect()
}

/// One DIS participant: the scripted scenario, the simulation it runs in
/// and the NetIO publishing it, stepped at a fixed rate.
pub struct Node<H: NetHandler> {
    netio: DisNetIo<H>,
    sim: Simulation,
    scenario: Scenario,
    timestep: FixedTimestep,
    tick: u64,
    last_tick_time: Instant,
    start_time: Instant,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<NodeEvent>,
    reported: NetworkStats,
    sends_failing: bool,
}

impl<H: NetHandler> Node<H> {
    pub fn new(handler: H, config: NodeConfig, ntm: Ntm) -> Self {
        let mut sim = Simulation::new(GamingArea::new(
            config.reference_latitude,
            config.reference_longitude,
        ));
        let scenario = Scenario::setup(&mut sim, config.scenario.clone());
        let netio = DisNetIo::new(handler, config.netio.clone(), ntm, templates());
        Self {
            netio,
            sim,
            scenario,
            timestep: FixedTimestep::new(config.tick_rate),
            tick: 0,
            last_tick_time: Instant::now(),
            start_time: Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
            reported: NetworkStats::default(),
            sends_failing: false,
        }
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = NodeEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn log_event(&mut self, event: NodeEvent) {
        self.pending_events.push_back(event);
    }

    /// Runs until the running flag clears or `duration` elapses.
    pub fn run(&mut self, duration: Option<Duration>) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            for event in self.drain_events().collect::<Vec<_>>() {
                match event.level() {
                    crate::events::Level::Info => log::info!("{event}"),
                    crate::events::Level::Warn => log::warn!("{event}"),
                    crate::events::Level::Error => log::error!("{event}"),
                }
            }
            if duration.is_some_and(|d| self.start_time.elapsed() >= d) {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Runs every tick that has come due since the last call.
    pub fn tick_once(&mut self) {
        let now = Instant::now();
        self.timestep.accumulate((now - self.last_tick_time).as_secs_f64());
        self.last_tick_time = now;
        while self.timestep.consume_tick() {
            self.step(self.timestep.dt());
        }
    }

    /// One fixed step: network in, script, move, network out.
    pub fn step(&mut self, dt: f64) {
        self.netio.input_frame(&mut self.sim);
        for event in self.netio.drain_events() {
            match event {
                NetEvent::StartResume { .. } => {
                    self.sim.set_frozen(false);
                    self.pending_events.push_back(NodeEvent::Frozen(false));
                }
                NetEvent::StopFreeze { .. } => {
                    self.sim.set_frozen(true);
                    self.pending_events.push_back(NodeEvent::Frozen(true));
                }
                _ => {}
            }
            self.pending_events.push_back(NodeEvent::Network(event));
        }

        let scripted = self.scenario.update(&mut self.sim);
        self.pending_events.extend(scripted);
        self.sim.step(dt);
        self.netio.output_frame(&mut self.sim);
        for event in self.netio.drain_events() {
            self.pending_events.push_back(NodeEvent::Network(event));
        }
        self.report_network_errors();
        self.tick += 1;
    }

    /// Raises an error when sends start failing and for every tick that
    /// drops malformed datagrams.
    fn report_network_errors(&mut self) {
        let stats = self.netio.stats();
        let failed = stats.send_failures - self.reported.send_failures;
        if failed > 0 && !self.sends_failing {
            self.pending_events.push_back(NodeEvent::Error {
                message: format!("sends failing ({} so far)", stats.send_failures),
            });
        }
        self.sends_failing = failed > 0;

        let malformed = stats.decode_errors - self.reported.decode_errors;
        if malformed > 0 {
            self.pending_events.push_back(NodeEvent::Error {
                message: format!("dropped {malformed} malformed datagram(s)"),
            });
        }
        self.reported = stats.clone();
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            uptime_secs: self.start_time.elapsed().as_secs(),
            tick: self.tick,
            exec_time: self.sim.exec_time(),
            frozen: self.sim.is_frozen(),
            missiles_in_flight: self.scenario.missiles_in_flight(),
            inputs: rows(self.netio.inputs(), &self.sim),
            outputs: rows(self.netio.outputs(), &self.sim),
            network: self.netio.stats().clone(),
        }
    }
}

#[cfg(test)]
impl<H: NetHandler> Node<H> {
    fn simulation(&self) -> &Simulation {
        &self.sim
    }

    fn netio(&self) -> &DisNetIo<H> {
        &self.netio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simbridge::dis::{ALL_APPLICATIONS, ALL_SITES, ByteOrder, Pdu, StopFreezePdu, WireCodec};
    use simbridge::net::MemoryHandler;

    use crate::config::default_ntm;
    use crate::events::Level;

    #[test]
    fn test_fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(20);
        ts.accumulate(0.1);
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());

        ts.accumulate(10.0);
        let mut ticks = 0;
        while ts.consume_tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 5);
    }

    #[test]
    fn test_two_nodes_see_each_other() {
        let (a, b) = MemoryHandler::pair();
        let mut config = NodeConfig::default();
        let mut first = Node::new(a, config.clone(), default_ntm());
        config.netio.site = 2;
        let mut second = Node::new(b, config, default_ntm());

        for _ in 0..3 {
            first.step(0.05);
            second.step(0.05);
        }
        let stats = second.stats();
        assert_eq!(stats.outputs.len(), 2);
        assert_eq!(stats.inputs.len(), 2);
        assert!(stats.inputs.iter().any(|row| row.template == "f16"));
        assert!(stats.inputs.iter().any(|row| row.template == "sa6"));
    }

    #[test]
    fn test_stop_freeze_halts_the_scenario() {
        let (a, mut peer) = MemoryHandler::pair();
        let mut node = Node::new(a, NodeConfig::default(), default_ntm());
        node.step(0.05);

        let mut pdu = Pdu::StopFreeze(StopFreezePdu {
            originating_entity_id: EntityId::new(50, 1, 0),
            receiving_entity_id: EntityId::new(ALL_SITES, ALL_APPLICATIONS, 0),
            request_id: 9,
            ..Default::default()
        });
        pdu.stamp(node.netio().config().protocol_version, 1, 0);
        peer.send(&pdu.encode(&WireCodec::new(ByteOrder::Big))).unwrap();

        node.step(0.05);
        let frozen_at = node.simulation().exec_time();
        node.step(0.05);
        assert!(node.simulation().is_frozen());
        assert_eq!(node.simulation().exec_time(), frozen_at);
        assert!(node.drain_events().any(|event| matches!(event, NodeEvent::Frozen(true))));
    }

    #[test]
    fn test_send_failures_raise_one_error() {
        let (mut a, _peer) = MemoryHandler::pair();
        a.fail_sends = true;
        let mut node = Node::new(a, NodeConfig::default(), default_ntm());
        for _ in 0..3 {
            node.step(0.05);
        }
        let errors: Vec<_> = node
            .drain_events()
            .filter(|event| event.level() == Level::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("sends failing"));
    }

    #[test]
    fn test_malformed_datagram_raises_error() {
        let (a, mut peer) = MemoryHandler::pair();
        let mut node = Node::new(a, NodeConfig::default(), default_ntm());
        peer.send(&[6, 1, 1, 1, 0, 0]).unwrap();
        node.step(0.05);
        assert!(node.drain_events().any(|event| matches!(
            event,
            NodeEvent::Error { ref message } if message.contains("malformed")
        )));
    }
}
