use bytemuck::{Pod, Zeroable};

use super::order::{TrailingData, WireCodec, WireError, WireRecord, checked_slice, swap_f32};
use super::pdu::pdu_record;
use super::records::{EntityIdentifier, EventIdentifier, PduHeader, VectorDis};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ElectromagneticEmissionPdu {
    pub header: PduHeader,
    pub emitting_entity_id: EntityIdentifier,
    pub event_id: EventIdentifier,
    pub state_update_indicator: u8,
    pub number_of_systems: u8,
    pub padding: u16,
}

impl WireRecord for ElectromagneticEmissionPdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.emitting_entity_id.swap_bytes();
        self.event_id.swap_bytes();
        self.padding = self.padding.swap_bytes();
    }
}

pdu_record! {
    ElectromagneticEmissionPdu => ElectromagneticEmission,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct EmitterSystem {
    pub name: u16,
    pub function: u8,
    pub id: u8,
}

impl WireRecord for EmitterSystem {
    fn swap_bytes(&mut self) {
        self.name = self.name.swap_bytes();
    }
}

/// Header of one emitter system; `system_data_length` counts 32-bit words
/// and covers the header plus all of its beams.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct EmissionSystem {
    pub system_data_length: u8,
    pub number_of_beams: u8,
    pub padding: u16,
    pub emitter_system: EmitterSystem,
    pub location: VectorDis,
}

impl WireRecord for EmissionSystem {
    fn swap_bytes(&mut self) {
        self.padding = self.padding.swap_bytes();
        self.emitter_system.swap_bytes();
        self.location.swap_bytes();
    }
}

/// Header of one emitter beam; `beam_data_length` counts 32-bit words and
/// covers the header plus its track/jam targets.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct EmitterBeam {
    pub beam_data_length: u8,
    pub beam_id: u8,
    pub beam_parameter_index: u16,
    pub frequency: f32,
    pub frequency_range: f32,
    pub effective_radiated_power: f32,
    pub pulse_repetition_frequency: f32,
    pub pulse_width: f32,
    pub beam_azimuth_center: f32,
    pub beam_azimuth_sweep: f32,
    pub beam_elevation_center: f32,
    pub beam_elevation_sweep: f32,
    pub beam_sweep_sync: f32,
    pub beam_function: u8,
    pub number_of_targets: u8,
    pub high_density_track_jam: u8,
    pub padding: u8,
    pub jamming_mode_sequence: u32,
}

impl WireRecord for EmitterBeam {
    fn swap_bytes(&mut self) {
        self.beam_parameter_index = self.beam_parameter_index.swap_bytes();
        self.frequency = swap_f32(self.frequency);
        self.frequency_range = swap_f32(self.frequency_range);
        self.effective_radiated_power = swap_f32(self.effective_radiated_power);
        self.pulse_repetition_frequency = swap_f32(self.pulse_repetition_frequency);
        self.pulse_width = swap_f32(self.pulse_width);
        self.beam_azimuth_center = swap_f32(self.beam_azimuth_center);
        self.beam_azimuth_sweep = swap_f32(self.beam_azimuth_sweep);
        self.beam_elevation_center = swap_f32(self.beam_elevation_center);
        self.beam_elevation_sweep = swap_f32(self.beam_elevation_sweep);
        self.beam_sweep_sync = swap_f32(self.beam_sweep_sync);
        self.jamming_mode_sequence = self.jamming_mode_sequence.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TrackJamTarget {
    pub entity_id: EntityIdentifier,
    pub emitter_id: u8,
    pub beam_id: u8,
}

impl WireRecord for TrackJamTarget {
    fn swap_bytes(&mut self) {
        self.entity_id.swap_bytes();
    }
}

const _: () = assert!(std::mem::size_of::<ElectromagneticEmissionPdu>() == 28);
const _: () = assert!(std::mem::size_of::<EmissionSystem>() == 20);
const _: () = assert!(std::mem::size_of::<EmitterBeam>() == 52);
const _: () = assert!(std::mem::size_of::<TrackJamTarget>() == 8);

const WORD: usize = 4;

/// A beam with its targets, used to build emission PDUs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeamSpec {
    pub beam: EmitterBeam,
    pub targets: Vec<TrackJamTarget>,
}

/// Decoded EE PDU. Systems are held host-order in `systems` and walked
/// through their self-describing lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectromagneticEmission {
    pub pdu: ElectromagneticEmissionPdu,
    systems: TrailingData,
}

impl ElectromagneticEmission {
    pub fn new(pdu: ElectromagneticEmissionPdu) -> Self {
        let mut message = Self {
            pdu,
            systems: TrailingData::new(),
        };
        message.pdu.number_of_systems = 0;
        message
    }

    /// Appends a system with its beams, computing every length field.
    /// Returns false when a count or length would overflow its field.
    pub fn push_system(&mut self, mut system: EmissionSystem, beams: &[BeamSpec]) -> bool {
        if self.pdu.number_of_systems == u8::MAX || beams.len() > u8::MAX as usize {
            return false;
        }
        let mut encoded = TrailingData::new();
        let mut words = EmissionSystem::SIZE / WORD;
        for spec in beams {
            if spec.targets.len() > u8::MAX as usize {
                return false;
            }
            let beam_words = (EmitterBeam::SIZE + spec.targets.len() * TrackJamTarget::SIZE) / WORD;
            let Ok(beam_data_length) = u8::try_from(beam_words) else {
                return false;
            };
            let mut beam = spec.beam;
            beam.beam_data_length = beam_data_length;
            beam.number_of_targets = spec.targets.len() as u8;
            encoded.push(&beam);
            for target in &spec.targets {
                encoded.push(target);
            }
            words += beam_words;
        }
        let Ok(system_data_length) = u8::try_from(words) else {
            return false;
        };
        system.system_data_length = system_data_length;
        system.number_of_beams = beams.len() as u8;
        self.systems.push(&system);
        self.systems.extend(encoded.as_bytes());
        self.pdu.number_of_systems += 1;
        true
    }

    pub fn system_count(&self) -> usize {
        self.pdu.number_of_systems as usize
    }

    pub fn emission_system(&self, idx: usize) -> Option<SystemView<'_>> {
        if idx >= self.system_count() {
            return None;
        }
        let mut offset = 0;
        for _ in 0..idx {
            let system: EmissionSystem = self.systems.record(offset)?;
            if system.system_data_length == 0 {
                return None;
            }
            offset += system.system_data_length as usize * WORD;
        }
        let system: EmissionSystem = self.systems.record(offset)?;
        let len = (system.system_data_length as usize * WORD).max(EmissionSystem::SIZE);
        let bytes = self.systems.slice(offset, len)?;
        Some(SystemView { system, bytes })
    }

    pub fn systems(&self) -> impl Iterator<Item = SystemView<'_>> {
        (0..self.system_count()).map_while(|idx| self.emission_system(idx))
    }

    pub fn trailing_len(&self) -> usize {
        self.systems.len()
    }

    pub(crate) fn write_trailing(&self, codec: &WireCodec, out: &mut Vec<u8>) {
        for view in self.systems() {
            let start = out.len();
            codec.write(&view.system, out);
            for beam in view.beams() {
                let beam_start = out.len();
                codec.write(&beam.beam, out);
                for target in beam.targets() {
                    codec.write(&target, out);
                }
                out.resize(beam_start + beam.bytes.len(), 0);
            }
            out.resize(start + view.bytes.len(), 0);
        }
    }

    /// Reads `number_of_systems` systems from wire bytes that follow the
    /// fixed part. Declared lengths are honoured; unknown trailing words in
    /// a record are kept as zero padding.
    pub(crate) fn read_trailing(
        pdu: ElectromagneticEmissionPdu,
        body: &[u8],
        codec: &WireCodec,
    ) -> Result<Self, WireError> {
        let mut systems = TrailingData::new();
        let mut offset = 0;
        for index in 0..pdu.number_of_systems as usize {
            let system: EmissionSystem = codec.read(body, offset)?;
            let system_len = system.system_data_length as usize * WORD;
            if system_len < EmissionSystem::SIZE {
                return Err(WireError::RecordOverrun {
                    index,
                    length: system_len,
                });
            }
            checked_slice(body, offset, system_len).map_err(|_| WireError::RecordOverrun {
                index,
                length: system_len,
            })?;
            let system_start = systems.len();
            systems.push(&system);

            let mut beam_offset = offset + EmissionSystem::SIZE;
            let system_end = offset + system_len;
            for _ in 0..system.number_of_beams {
                let beam: EmitterBeam = codec.read(body, beam_offset)?;
                let beam_len = beam.beam_data_length as usize * WORD;
                let targets_len = beam.number_of_targets as usize * TrackJamTarget::SIZE;
                if beam_len < EmitterBeam::SIZE + targets_len || beam_offset + beam_len > system_end
                {
                    return Err(WireError::RecordOverrun {
                        index,
                        length: beam_len,
                    });
                }
                let beam_start = systems.len();
                systems.push(&beam);
                for t in 0..beam.number_of_targets as usize {
                    let offset = beam_offset + EmitterBeam::SIZE + t * TrackJamTarget::SIZE;
                    let target: TrackJamTarget = codec.read(body, offset)?;
                    systems.push(&target);
                }
                systems.pad_to(beam_start + beam_len);
                beam_offset += beam_len;
            }
            systems.pad_to(system_start + system_len);
            offset = system_end;
        }
        Ok(Self { pdu, systems })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemView<'a> {
    pub system: EmissionSystem,
    bytes: &'a [u8],
}

impl<'a> SystemView<'a> {
    pub fn beam(&self, idx: usize) -> Option<BeamView<'a>> {
        if idx >= self.system.number_of_beams as usize {
            return None;
        }
        let mut offset = EmissionSystem::SIZE;
        for _ in 0..idx {
            let beam = read_host::<EmitterBeam>(self.bytes, offset)?;
            if beam.beam_data_length == 0 {
                return None;
            }
            offset += beam.beam_data_length as usize * WORD;
        }
        let beam = read_host::<EmitterBeam>(self.bytes, offset)?;
        let len = (beam.beam_data_length as usize * WORD).max(EmitterBeam::SIZE);
        let bytes = checked_slice(self.bytes, offset, len).ok()?;
        Some(BeamView { beam, bytes })
    }

    pub fn beams(&self) -> impl Iterator<Item = BeamView<'a>> + use<'a> {
        let view = *self;
        (0..view.system.number_of_beams as usize).map_while(move |idx| view.beam(idx))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BeamView<'a> {
    pub beam: EmitterBeam,
    bytes: &'a [u8],
}

impl<'a> BeamView<'a> {
    pub fn track_jam_target(&self, idx: usize) -> Option<TrackJamTarget> {
        if idx >= self.beam.number_of_targets as usize {
            return None;
        }
        read_host(self.bytes, EmitterBeam::SIZE + idx * TrackJamTarget::SIZE)
    }

    pub fn targets(&self) -> impl Iterator<Item = TrackJamTarget> + use<'a> {
        let view = *self;
        (0..view.beam.number_of_targets as usize).map_while(move |idx| view.track_jam_target(idx))
    }
}

fn read_host<T: WireRecord>(bytes: &[u8], offset: usize) -> Option<T> {
    checked_slice(bytes, offset, T::SIZE)
        .ok()
        .map(bytemuck::pod_read_unaligned::<T>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dis::order::ByteOrder;

    fn sample() -> ElectromagneticEmission {
        let mut message = ElectromagneticEmission::new(ElectromagneticEmissionPdu::default());
        let radar = EmissionSystem {
            emitter_system: EmitterSystem {
                name: 1505,
                function: 2,
                id: 1,
            },
            ..Default::default()
        };
        let beams = vec![
            BeamSpec {
                beam: EmitterBeam {
                    beam_id: 1,
                    frequency: 9.4e9,
                    ..Default::default()
                },
                targets: vec![TrackJamTarget {
                    entity_id: EntityIdentifier::new(1, 2, 3),
                    emitter_id: 1,
                    beam_id: 1,
                }],
            },
            BeamSpec {
                beam: EmitterBeam {
                    beam_id: 2,
                    ..Default::default()
                },
                targets: Vec::new(),
            },
        ];
        assert!(message.push_system(radar, &beams));
        assert!(message.push_system(EmissionSystem::default(), &[]));
        message
    }

    #[test]
    fn test_emission_swaps_reverse_each_field() {
        use crate::dis::order::layout::{HEADER, ID, VEC32, assert_field_swaps};

        assert_field_swaps::<ElectromagneticEmissionPdu>(&[HEADER, ID, ID, &[(1, 2), (2, 1)]]);
        assert_field_swaps::<EmissionSystem>(&[&[(1, 2), (2, 1), (2, 1), (1, 2)], VEC32]);
        assert_field_swaps::<EmitterBeam>(&[&[(1, 2), (2, 1), (4, 10), (1, 4), (4, 1)]]);
        assert_field_swaps::<TrackJamTarget>(&[ID, &[(1, 2)]]);
    }

    #[test]
    fn test_lengths_are_counted_in_words() {
        let message = sample();
        let first = message.emission_system(0).unwrap();
        assert_eq!(first.system.system_data_length as usize, (20 + 60 + 52) / 4);
        assert_eq!(first.beam(0).unwrap().beam.beam_data_length, 15);
        assert_eq!(first.beam(1).unwrap().beam.beam_data_length, 13);
        assert_eq!(message.trailing_len(), 20 + 60 + 52 + 20);
    }

    #[test]
    fn test_accessors_walk_variable_records() {
        let message = sample();
        assert_eq!(message.system_count(), 2);
        let first = message.emission_system(0).unwrap();
        assert_eq!(first.system.emitter_system.name, 1505);
        let beam = first.beam(0).unwrap();
        assert_eq!(beam.beam.frequency, 9.4e9);
        assert_eq!(beam.track_jam_target(0).unwrap().entity_id, EntityIdentifier::new(1, 2, 3));
        assert!(beam.track_jam_target(1).is_none());
        assert_eq!(first.beam(1).unwrap().beam.beam_id, 2);
        assert!(first.beam(2).is_none());

        let second = message.emission_system(1).unwrap();
        assert_eq!(second.system.number_of_beams, 0);
        assert!(second.beam(0).is_none());
        assert!(message.emission_system(2).is_none());
    }

    #[test]
    fn test_empty_message_has_no_systems() {
        let message = ElectromagneticEmission::new(ElectromagneticEmissionPdu::default());
        assert!(message.emission_system(0).is_none());
        assert_eq!(message.systems().count(), 0);
    }

    #[test]
    fn test_trailing_survives_wire_order() {
        let message = sample();
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let codec = WireCodec::new(order);
            let mut wire = Vec::new();
            message.write_trailing(&codec, &mut wire);
            assert_eq!(wire.len(), message.trailing_len());
            let decoded =
                ElectromagneticEmission::read_trailing(message.pdu, &wire, &codec).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_overrunning_system_is_rejected() {
        let message = sample();
        let codec = WireCodec::default();
        let mut wire = Vec::new();
        message.write_trailing(&codec, &mut wire);
        wire.truncate(40);
        assert!(ElectromagneticEmission::read_trailing(message.pdu, &wire, &codec).is_err());
    }
}
