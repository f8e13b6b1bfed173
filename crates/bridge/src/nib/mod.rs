mod appearance;
mod articulation;
mod staged;
mod table;

pub(crate) use appearance::{bits_to_level, level_to_bits};
pub use appearance::{
    AppearanceBits, DecodedAppearance, decode_appearance, encode_appearance, force_from_side,
    side_from_force,
};
pub use articulation::{AttachedStore, StagedArticulation, articulation_records};
pub use staged::StagedEntityState;
pub use table::NibTable;

use glam::DVec3;

use crate::dis::{ArticulationParameter, EntityId, EntityType, domain, kind};
use crate::dr::{
    DeadReckoning, DrAlgorithm, DrThresholds, Smoother, UpdateReason, kinematic_update_reason,
};
use crate::geo::GamingArea;
use crate::ntm::Ntm;
use crate::player::{
    Appearance, Articulation, Emitter, Player, PlayerHandle, PlayerMode, Radio, Side, Store,
    VehicleClass, WeaponStation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NibDirection {
    /// Remote entity mirrored into the local simulation.
    Input,
    /// Local player published on the network.
    Output,
}

/// Geocentric kinematics; orientation is (phi, theta, psi) relative to ECEF.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    pub orientation: DVec3,
    pub angular_velocity: DVec3,
}

/// What an output NIB last put on the network.
#[derive(Debug, Clone, PartialEq)]
pub struct SentState {
    pub appearance: u32,
    pub force_id: u8,
    pub mode: PlayerMode,
    pub entity_type: EntityType,
    pub articulations: Vec<ArticulationParameter>,
}

#[derive(Debug, Clone, PartialEq)]
struct Sent<T> {
    time: f64,
    value: T,
}

/// Network interface block: the bridge between one player and its network
/// representation.
#[derive(Debug, Clone)]
pub struct Nib {
    direction: NibDirection,
    entity_id: EntityId,
    entity_type: EntityType,
    federate_name: String,
    player: Option<PlayerHandle>,

    pub marking: String,
    pub template: Option<String>,
    pub mode: PlayerMode,
    pub side: Side,
    pub class: VehicleClass,
    pub appearance: Appearance,
    pub articulation: Articulation,
    /// Output: the player's stations at the last capture.
    pub stations: Vec<WeaponStation>,
    /// Input: stores reported by attached-part records.
    pub stores: Vec<AttachedStore>,
    /// Output: records built by `manage_articulation_parameters`.
    pub articulations: Vec<ArticulationParameter>,
    pub emitters: Vec<Emitter>,
    pub radio: Option<Radio>,

    /// Output: state captured from the player this frame.
    pub kinematics: Kinematics,
    dr_algorithm: DrAlgorithm,
    dr: DeadReckoning,
    smoother: Smoother,

    update_time: Option<f64>,
    sent: Option<SentState>,
    player_update_required: bool,
    pub ntm_checked: bool,
    pub fire_sent: bool,
    pub detonation_sent: bool,
    /// Event number shared by a weapon's fire and detonation; 0 until fired.
    pub event_number: u16,
    emission_sent: Option<Sent<Vec<Emitter>>>,
    radio_sent: Option<Sent<Option<Radio>>>,
}

impl Nib {
    fn new(direction: NibDirection, entity_id: EntityId, federate_name: &str) -> Self {
        Self {
            direction,
            entity_id,
            entity_type: EntityType::NULL,
            federate_name: federate_name.to_string(),
            player: None,
            marking: String::new(),
            template: None,
            mode: PlayerMode::Inactive,
            side: Side::Gray,
            class: VehicleClass::Other,
            appearance: Appearance::default(),
            articulation: Articulation::default(),
            stations: Vec::new(),
            stores: Vec::new(),
            articulations: Vec::new(),
            emitters: Vec::new(),
            radio: None,
            kinematics: Kinematics::default(),
            dr_algorithm: DrAlgorithm::Fpw,
            dr: DeadReckoning::default(),
            smoother: Smoother::new(0.0),
            update_time: None,
            sent: None,
            player_update_required: false,
            ntm_checked: false,
            fire_sent: false,
            detonation_sent: false,
            event_number: 0,
            emission_sent: None,
            radio_sent: None,
        }
    }

    pub fn new_input(entity_id: EntityId, federate_name: &str, smoothing_time: f64) -> Self {
        let mut nib = Self::new(NibDirection::Input, entity_id, federate_name);
        nib.smoother = Smoother::new(smoothing_time);
        nib
    }

    pub fn new_output(
        entity_id: EntityId,
        player: PlayerHandle,
        federate_name: &str,
        dr_algorithm: DrAlgorithm,
    ) -> Self {
        let mut nib = Self::new(NibDirection::Output, entity_id, federate_name);
        nib.player = Some(player);
        nib.dr_algorithm = dr_algorithm;
        nib
    }

    pub fn direction(&self) -> NibDirection {
        self.direction
    }

    pub fn is_input(&self) -> bool {
        self.direction == NibDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == NibDirection::Output
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn federate_name(&self) -> &str {
        &self.federate_name
    }

    pub fn player(&self) -> Option<PlayerHandle> {
        self.player
    }

    pub fn bind_player(&mut self, player: PlayerHandle) {
        self.player = Some(player);
    }

    pub fn unbind_player(&mut self) -> Option<PlayerHandle> {
        self.player.take()
    }

    pub fn dead_reckoning(&self) -> &DeadReckoning {
        &self.dr
    }

    pub fn dr_algorithm(&self) -> DrAlgorithm {
        self.dr_algorithm
    }

    /// Last network update (input) or last successful send (output).
    pub fn update_time(&self) -> Option<f64> {
        self.update_time
    }

    pub fn sent_state(&self) -> Option<&SentState> {
        self.sent.as_ref()
    }

    pub fn player_update_required(&self) -> bool {
        self.player_update_required
    }

    pub fn force_id(&self) -> u8 {
        force_from_side(self.side)
    }

    pub fn appearance_word(&self) -> u32 {
        encode_appearance(
            &self.appearance,
            self.mode,
            self.entity_type.kind,
            self.entity_type.domain,
        )
    }

    /// Rejects kinds and domains outside the enumeration; on failure the
    /// current type is kept.
    #[allow(clippy::too_many_arguments)]
    pub fn set_entity_type(
        &mut self,
        kind: u8,
        domain: u8,
        country: u16,
        category: u8,
        subcategory: u8,
        specific: u8,
        extra: u8,
    ) -> bool {
        if kind >= kind::COUNT || domain >= domain::COUNT {
            log::debug!(
                "{}: invalid entity type kind {kind} domain {domain}",
                self.entity_id
            );
            return false;
        }
        self.entity_type =
            EntityType::new(kind, domain, country, category, subcategory, specific, extra);
        true
    }

    pub fn set_entity_type_record(&mut self, entity_type: EntityType) -> bool {
        let t = entity_type;
        self.set_entity_type(
            t.kind,
            t.domain,
            t.country,
            t.category,
            t.subcategory,
            t.specific,
            t.extra,
        )
    }

    /// Applies a decoded network update to an input NIB and resets its
    /// dead-reckoning baseline.
    pub fn entity_state_to_nib(&mut self, staged: &StagedEntityState, exec_time: f64) {
        if !self.set_entity_type_record(staged.entity_type) {
            log::warn!("{}: keeping entity type {}", self.entity_id, self.entity_type);
        }
        self.side = side_from_force(staged.force_id);
        self.marking.clone_from(&staged.marking);
        self.appearance = staged.appearance;
        staged.articulation.apply_to(&mut self.articulation);
        if !staged.articulation.stores.is_empty() {
            self.stores.clone_from(&staged.articulation.stores);
        }
        self.mode = self.mode_for(staged);

        let shown = self.update_time.map(|t| {
            let state = self.dr.extrapolate(exec_time - t);
            self.smoother.apply(exec_time, state.position, state.orientation)
        });
        self.dr_algorithm = staged.dr_algorithm;
        self.dr.reset(
            staged.dr_algorithm,
            staged.position,
            staged.velocity,
            staged.acceleration,
            staged.orientation,
            staged.angular_velocity,
            staged.diff_time,
        );
        if let Some((position, orientation)) = shown {
            let fresh = self.dr.baseline();
            self.smoother
                .begin(exec_time, position, orientation, fresh.position, fresh.orientation);
        }
        self.update_time = Some(exec_time);
        self.player_update_required = true;
    }

    fn mode_for(&self, staged: &StagedEntityState) -> PlayerMode {
        if staged.deactivated {
            PlayerMode::DeleteRequest
        } else if self.entity_type.kind == kind::MUNITION {
            if self.mode == PlayerMode::Detonated {
                PlayerMode::Detonated
            } else {
                PlayerMode::Launched
            }
        } else if staged.appearance.damage >= 1.0 {
            if self.mode == PlayerMode::Crashed {
                PlayerMode::Crashed
            } else {
                PlayerMode::Killed
            }
        } else {
            PlayerMode::Active
        }
    }

    /// Captures the local player's state into an output NIB.
    pub fn player_state_to_nib(&mut self, player: &Player, area: &GamingArea, _exec_time: f64) {
        self.mode = player.mode;
        self.side = player.side;
        self.class = player.class;
        self.appearance = player.appearance;
        self.articulation = player.articulation;
        self.stations.clone_from(&player.stations);
        self.emitters.clone_from(&player.emitters);
        self.radio.clone_from(&player.radio);
        if self.marking.is_empty() {
            self.marking = player.name.chars().take(11).collect();
        }
        self.kinematics = Kinematics {
            position: area.position_to_ecef(player.position),
            velocity: area.vector_to_ecef(player.velocity),
            acceleration: area.vector_to_ecef(player.acceleration),
            orientation: area.euler_to_ecef(player.euler),
            angular_velocity: player.angular_velocity,
        };
    }

    /// Writes the extrapolated remote state into the mirroring player.
    /// Discrete state is copied only after a network update.
    pub fn nib_to_player_state(
        &mut self,
        player: &mut Player,
        area: &GamingArea,
        exec_time: f64,
        ntm: &Ntm,
    ) {
        let Some(update_time) = self.update_time else {
            return;
        };
        let state = self.dr.extrapolate(exec_time - update_time);
        let (position, orientation) =
            self.smoother
                .apply(exec_time, state.position, state.orientation);
        player.position = area.position_from_ecef(position);
        player.velocity = area.vector_from_ecef(state.velocity);
        player.acceleration = if self.dr_algorithm.uses_acceleration() {
            area.vector_from_ecef(self.dr.acceleration())
        } else {
            DVec3::ZERO
        };
        player.euler = area.euler_from_ecef(orientation);
        player.angular_velocity = state.angular_velocity;

        if !self.player_update_required {
            return;
        }
        player.set_mode(self.mode);
        player.side = self.side;
        player.appearance = self.appearance;
        player.articulation = self.articulation;
        if !self.stores.is_empty() {
            player.stations = self
                .stores
                .iter()
                .map(|attached| WeaponStation {
                    station: attached.station,
                    store: self.store_for(attached, ntm),
                })
                .collect();
        }
        self.player_update_required = false;
    }

    fn store_for(&self, attached: &AttachedStore, ntm: &Ntm) -> Option<Store> {
        if attached.entity_type.is_null() {
            return None;
        }
        let template = ntm.find_template(&attached.entity_type);
        if template.is_none() {
            log::trace!(
                "{}: no template for store {} on station {}",
                self.entity_id,
                attached.entity_type,
                attached.station
            );
        }
        template.map(|template| Store {
            template: template.to_string(),
            released: false,
        })
    }

    /// Rebuilds the articulation record list from the captured state.
    pub fn manage_articulation_parameters(&mut self, ntm: &Ntm) {
        self.articulations =
            articulation_records(self.class, &self.articulation, &self.stations, ntm);
    }

    /// Why the captured state must be sent now, if it must.
    pub fn update_reason(&self, exec_time: f64, thresholds: &DrThresholds) -> Option<UpdateReason> {
        let (Some(sent), Some(update_time)) = (&self.sent, self.update_time) else {
            return Some(UpdateReason::NeverSent);
        };
        if sent.mode != self.mode {
            return Some(UpdateReason::ModeChange);
        }
        if sent.appearance != self.appearance_word() {
            return Some(UpdateReason::AppearanceChange);
        }
        if sent.force_id != self.force_id() {
            return Some(UpdateReason::ForceChange);
        }
        if sent.entity_type != self.entity_type {
            return Some(UpdateReason::TypeChange);
        }
        if sent.articulations != self.articulations {
            return Some(UpdateReason::ArticulationChange);
        }
        kinematic_update_reason(
            thresholds,
            &self.dr,
            exec_time - update_time,
            self.kinematics.position,
            self.kinematics.orientation,
        )
    }

    pub fn is_player_state_update_required(
        &self,
        exec_time: f64,
        thresholds: &DrThresholds,
    ) -> bool {
        match self.update_reason(exec_time, thresholds) {
            Some(reason) => {
                log::trace!("{}: update required ({reason})", self.entity_id);
                true
            }
            None => false,
        }
    }

    /// Call only after the entity state went out: the captured state
    /// becomes the new baseline.
    pub fn mark_entity_state_sent(&mut self, exec_time: f64) {
        let k = self.kinematics;
        self.dr.reset(
            self.dr_algorithm,
            k.position,
            k.velocity,
            k.acceleration,
            k.orientation,
            k.angular_velocity,
            0.0,
        );
        self.update_time = Some(exec_time);
        self.sent = Some(SentState {
            appearance: self.appearance_word(),
            force_id: self.force_id(),
            mode: self.mode,
            entity_type: self.entity_type,
            articulations: self.articulations.clone(),
        });
    }

    /// Input NIB not refreshed within `max_age` seconds.
    pub fn is_stale(&self, exec_time: f64, max_age: f64) -> bool {
        self.is_input() && self.update_time.is_some_and(|t| exec_time - t > max_age)
    }

    pub fn is_emission_update_required(&self, exec_time: f64, heartbeat: f64) -> bool {
        match &self.emission_sent {
            None => !self.emitters.is_empty(),
            Some(sent) => {
                sent.value != self.emitters
                    || (!self.emitters.is_empty() && exec_time - sent.time >= heartbeat)
            }
        }
    }

    pub fn mark_emission_sent(&mut self, exec_time: f64) {
        self.emission_sent = Some(Sent {
            time: exec_time,
            value: self.emitters.clone(),
        });
    }

    pub fn is_radio_update_required(&self, exec_time: f64, heartbeat: f64) -> bool {
        match &self.radio_sent {
            None => self.radio.is_some(),
            Some(sent) => {
                sent.value != self.radio
                    || (self.radio.is_some() && exec_time - sent.time >= heartbeat)
            }
        }
    }

    pub fn mark_radio_sent(&mut self, exec_time: f64) {
        self.radio_sent = Some(Sent {
            time: exec_time,
            value: self.radio.clone(),
        });
    }
}
