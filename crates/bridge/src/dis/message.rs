use std::fmt;

use super::emission::{ElectromagneticEmission, ElectromagneticEmissionPdu};
use super::enums::{DetonationResult, PduType};
use super::order::{TrailingData, WireCodec, WireError, WireRecord};
use super::pdu::{
    DesignatorPdu, DetonationPdu, EntityStatePdu, FirePdu, IffAtcNavaidsPdu, PduRecord,
};
use super::radio::{Signal, SignalPdu, Transmitter, TransmitterPdu};
use super::records::{ArticulationParameter, EntityType, PduHeader};
use super::simman::{
    AcknowledgePdu, ActionRequestPdu, ActionResponsePdu, CommentPdu, DataPdu, DataQueryPdu,
    Datums, StartResumePdu, StopFreezePdu,
};

pub const MAX_PDU_SIZE: usize = 8192;

/// Articulation records held host-order after a fixed part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Articulations {
    count: u8,
    records: TrailingData,
}

impl Articulations {
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn push(&mut self, parameter: ArticulationParameter) -> bool {
        if self.count == u8::MAX {
            return false;
        }
        self.records.push(&parameter);
        self.count += 1;
        true
    }

    pub fn get(&self, idx: usize) -> Option<ArticulationParameter> {
        if idx >= self.len() {
            return None;
        }
        self.records.record(idx * ArticulationParameter::SIZE)
    }

    pub fn iter(&self) -> impl Iterator<Item = ArticulationParameter> + '_ {
        (0..self.len()).map_while(|idx| self.get(idx))
    }

    fn wire_len(&self) -> usize {
        self.len() * ArticulationParameter::SIZE
    }

    fn write(&self, codec: &WireCodec, out: &mut Vec<u8>) {
        for parameter in self.iter() {
            codec.write(&parameter, out);
        }
    }

    fn read(count: u8, body: &[u8], codec: &WireCodec) -> Result<Self, WireError> {
        let mut records = TrailingData::new();
        for idx in 0..count as usize {
            let parameter: ArticulationParameter = codec
                .read(body, idx * ArticulationParameter::SIZE)
                .map_err(|_| WireError::RecordOverrun {
                    index: idx,
                    length: ArticulationParameter::SIZE,
                })?;
            records.push(&parameter);
        }
        Ok(Self { count, records })
    }
}

impl FromIterator<ArticulationParameter> for Articulations {
    fn from_iter<I: IntoIterator<Item = ArticulationParameter>>(iter: I) -> Self {
        let mut articulations = Articulations::default();
        for parameter in iter {
            if !articulations.push(parameter) {
                break;
            }
        }
        articulations
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityState {
    pub pdu: EntityStatePdu,
    pub articulations: Articulations,
}

impl EntityState {
    pub fn articulation_parameter(&self, idx: usize) -> Option<ArticulationParameter> {
        if idx >= self.pdu.number_of_articulation_parameters as usize {
            return None;
        }
        self.articulations.get(idx)
    }

    pub fn set_articulations(&mut self, articulations: Articulations) {
        self.pdu.number_of_articulation_parameters = articulations.count;
        self.articulations = articulations;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detonation {
    pub pdu: DetonationPdu,
    pub articulations: Articulations,
}

impl Detonation {
    pub fn articulation_parameter(&self, idx: usize) -> Option<ArticulationParameter> {
        if idx >= self.pdu.number_of_articulation_parameters as usize {
            return None;
        }
        self.articulations.get(idx)
    }

    pub fn result(&self) -> DetonationResult {
        DetonationResult::from_u8(self.pdu.detonation_result)
    }
}

/// A decoded PDU in host byte order.
#[derive(Debug, Clone, PartialEq)]
pub enum Pdu {
    EntityState(EntityState),
    Fire(FirePdu),
    Detonation(Detonation),
    ElectromagneticEmission(ElectromagneticEmission),
    Designator(DesignatorPdu),
    IffAtcNavaids(IffAtcNavaidsPdu),
    Transmitter(Transmitter),
    Signal(Signal),
    StartResume(StartResumePdu),
    StopFreeze(StopFreezePdu),
    Acknowledge(AcknowledgePdu),
    ActionRequest(Datums<ActionRequestPdu>),
    ActionResponse(Datums<ActionResponsePdu>),
    DataQuery(Datums<DataQueryPdu>),
    Data(Datums<DataPdu>),
    Comment(Datums<CommentPdu>),
    /// Recognised type without a model; `body` is the raw wire bytes after
    /// the header.
    Other { header: PduHeader, body: Vec<u8> },
}

impl Pdu {
    pub fn header(&self) -> &PduHeader {
        match self {
            Pdu::EntityState(m) => &m.pdu.header,
            Pdu::Fire(p) => &p.header,
            Pdu::Detonation(m) => &m.pdu.header,
            Pdu::ElectromagneticEmission(m) => &m.pdu.header,
            Pdu::Designator(p) => &p.header,
            Pdu::IffAtcNavaids(p) => &p.header,
            Pdu::Transmitter(m) => &m.pdu.header,
            Pdu::Signal(m) => &m.pdu.header,
            Pdu::StartResume(p) => &p.header,
            Pdu::StopFreeze(p) => &p.header,
            Pdu::Acknowledge(p) => &p.header,
            Pdu::ActionRequest(m) => &m.pdu.header,
            Pdu::ActionResponse(m) => &m.pdu.header,
            Pdu::DataQuery(m) => &m.pdu.header,
            Pdu::Data(m) => &m.pdu.header,
            Pdu::Comment(m) => &m.pdu.header,
            Pdu::Other { header, .. } => header,
        }
    }

    fn header_mut(&mut self) -> &mut PduHeader {
        match self {
            Pdu::EntityState(m) => &mut m.pdu.header,
            Pdu::Fire(p) => &mut p.header,
            Pdu::Detonation(m) => &mut m.pdu.header,
            Pdu::ElectromagneticEmission(m) => &mut m.pdu.header,
            Pdu::Designator(p) => &mut p.header,
            Pdu::IffAtcNavaids(p) => &mut p.header,
            Pdu::Transmitter(m) => &mut m.pdu.header,
            Pdu::Signal(m) => &mut m.pdu.header,
            Pdu::StartResume(p) => &mut p.header,
            Pdu::StopFreeze(p) => &mut p.header,
            Pdu::Acknowledge(p) => &mut p.header,
            Pdu::ActionRequest(m) => &mut m.pdu.header,
            Pdu::ActionResponse(m) => &mut m.pdu.header,
            Pdu::DataQuery(m) => &mut m.pdu.header,
            Pdu::Data(m) => &mut m.pdu.header,
            Pdu::Comment(m) => &mut m.pdu.header,
            Pdu::Other { header, .. } => header,
        }
    }

    pub fn pdu_type(&self) -> Option<PduType> {
        PduType::from_u8(self.header().pdu_type)
    }

    /// Type implied by the variant; `Other` carries whatever its header says.
    fn variant_type(&self) -> Option<PduType> {
        Some(match self {
            Pdu::EntityState(_) => PduType::EntityState,
            Pdu::Fire(_) => PduType::Fire,
            Pdu::Detonation(_) => PduType::Detonation,
            Pdu::ElectromagneticEmission(_) => PduType::ElectromagneticEmission,
            Pdu::Designator(_) => PduType::Designator,
            Pdu::IffAtcNavaids(_) => PduType::IffAtcNavaids,
            Pdu::Transmitter(_) => PduType::Transmitter,
            Pdu::Signal(_) => PduType::Signal,
            Pdu::StartResume(_) => PduType::StartResume,
            Pdu::StopFreeze(_) => PduType::StopFreeze,
            Pdu::Acknowledge(_) => PduType::Acknowledge,
            Pdu::ActionRequest(_) => PduType::ActionRequest,
            Pdu::ActionResponse(_) => PduType::ActionResponse,
            Pdu::DataQuery(_) => PduType::DataQuery,
            Pdu::Data(_) => PduType::Data,
            Pdu::Comment(_) => PduType::Comment,
            Pdu::Other { .. } => return None,
        })
    }

    /// Fills version, exercise, type, family and timestamp for a PDU that is
    /// about to be sent.
    pub fn stamp(&mut self, protocol_version: u8, exercise_id: u8, timestamp: u32) {
        fn apply<P: PduRecord>(pdu: &mut P, version: u8, exercise: u8, timestamp: u32) {
            pdu.stamp(version, exercise, timestamp);
        }
        match self {
            Pdu::EntityState(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::Fire(p) => apply(p, protocol_version, exercise_id, timestamp),
            Pdu::Detonation(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::ElectromagneticEmission(m) => {
                apply(&mut m.pdu, protocol_version, exercise_id, timestamp)
            }
            Pdu::Designator(p) => apply(p, protocol_version, exercise_id, timestamp),
            Pdu::IffAtcNavaids(p) => apply(p, protocol_version, exercise_id, timestamp),
            Pdu::Transmitter(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::Signal(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::StartResume(p) => apply(p, protocol_version, exercise_id, timestamp),
            Pdu::StopFreeze(p) => apply(p, protocol_version, exercise_id, timestamp),
            Pdu::Acknowledge(p) => apply(p, protocol_version, exercise_id, timestamp),
            Pdu::ActionRequest(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::ActionResponse(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::DataQuery(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::Data(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::Comment(m) => apply(&mut m.pdu, protocol_version, exercise_id, timestamp),
            Pdu::Other { header, .. } => {
                header.protocol_version = protocol_version;
                header.exercise_id = exercise_id;
                header.timestamp = timestamp;
            }
        }
    }

    /// Decodes one PDU from the front of `buf`. The header length bounds the
    /// PDU; bytes after it are ignored.
    pub fn decode(buf: &[u8], codec: &WireCodec) -> Result<Pdu, WireError> {
        let header: PduHeader = codec.read(buf, 0)?;
        let declared = header.length as usize;
        if declared < PduHeader::SIZE || declared > buf.len() {
            return Err(WireError::BadLength {
                declared,
                available: buf.len(),
            });
        }
        let buf = &buf[..declared];
        let pdu_type =
            PduType::from_u8(header.pdu_type).ok_or(WireError::UnknownPduType(header.pdu_type))?;

        Ok(match pdu_type {
            PduType::EntityState => {
                let pdu: EntityStatePdu = codec.read(buf, 0)?;
                let articulations = Articulations::read(
                    pdu.number_of_articulation_parameters,
                    tail::<EntityStatePdu>(buf),
                    codec,
                )?;
                Pdu::EntityState(EntityState { pdu, articulations })
            }
            PduType::Fire => Pdu::Fire(codec.read(buf, 0)?),
            PduType::Detonation => {
                let pdu: DetonationPdu = codec.read(buf, 0)?;
                let articulations = Articulations::read(
                    pdu.number_of_articulation_parameters,
                    tail::<DetonationPdu>(buf),
                    codec,
                )?;
                Pdu::Detonation(Detonation { pdu, articulations })
            }
            PduType::ElectromagneticEmission => {
                let pdu: ElectromagneticEmissionPdu = codec.read(buf, 0)?;
                Pdu::ElectromagneticEmission(ElectromagneticEmission::read_trailing(
                    pdu,
                    tail::<ElectromagneticEmissionPdu>(buf),
                    codec,
                )?)
            }
            PduType::Designator => Pdu::Designator(codec.read(buf, 0)?),
            PduType::IffAtcNavaids => Pdu::IffAtcNavaids(codec.read(buf, 0)?),
            PduType::Transmitter => {
                let pdu: TransmitterPdu = codec.read(buf, 0)?;
                Pdu::Transmitter(Transmitter::read_trailing(pdu, tail::<TransmitterPdu>(buf))?)
            }
            PduType::Signal => {
                let pdu: SignalPdu = codec.read(buf, 0)?;
                Pdu::Signal(Signal::read_trailing(pdu, tail::<SignalPdu>(buf))?)
            }
            PduType::StartResume => Pdu::StartResume(codec.read(buf, 0)?),
            PduType::StopFreeze => Pdu::StopFreeze(codec.read(buf, 0)?),
            PduType::Acknowledge => Pdu::Acknowledge(codec.read(buf, 0)?),
            PduType::ActionRequest => Pdu::ActionRequest(read_datums(buf, codec)?),
            PduType::ActionResponse => Pdu::ActionResponse(read_datums(buf, codec)?),
            PduType::DataQuery => Pdu::DataQuery(read_datums(buf, codec)?),
            PduType::Data => Pdu::Data(read_datums(buf, codec)?),
            PduType::Comment => Pdu::Comment(read_datums(buf, codec)?),
            _ => Pdu::Other {
                header,
                body: buf[PduHeader::SIZE..].to_vec(),
            },
        })
    }

    /// Encodes to wire order, setting `header.length` and, for modelled
    /// PDUs, the type and family.
    pub fn encode(&mut self, codec: &WireCodec) -> Vec<u8> {
        let length = self.encoded_len();
        let variant_type = self.variant_type();
        let header = self.header_mut();
        header.length = length as u16;
        if let Some(pdu_type) = variant_type {
            header.pdu_type = pdu_type as u8;
            header.protocol_family = pdu_type.family() as u8;
        }

        let mut out = Vec::with_capacity(length);
        match self {
            Pdu::EntityState(m) => {
                m.pdu.number_of_articulation_parameters = m.articulations.count;
                codec.write(&m.pdu, &mut out);
                m.articulations.write(codec, &mut out);
            }
            Pdu::Fire(p) => codec.write(p, &mut out),
            Pdu::Detonation(m) => {
                m.pdu.number_of_articulation_parameters = m.articulations.count;
                codec.write(&m.pdu, &mut out);
                m.articulations.write(codec, &mut out);
            }
            Pdu::ElectromagneticEmission(m) => {
                codec.write(&m.pdu, &mut out);
                m.write_trailing(codec, &mut out);
            }
            Pdu::Designator(p) => codec.write(p, &mut out),
            Pdu::IffAtcNavaids(p) => codec.write(p, &mut out),
            Pdu::Transmitter(m) => {
                codec.write(&m.pdu, &mut out);
                m.write_trailing(&mut out);
            }
            Pdu::Signal(m) => {
                codec.write(&m.pdu, &mut out);
                m.write_trailing(&mut out);
            }
            Pdu::StartResume(p) => codec.write(p, &mut out),
            Pdu::StopFreeze(p) => codec.write(p, &mut out),
            Pdu::Acknowledge(p) => codec.write(p, &mut out),
            Pdu::ActionRequest(m) => write_datums(m, codec, &mut out),
            Pdu::ActionResponse(m) => write_datums(m, codec, &mut out),
            Pdu::DataQuery(m) => write_datums(m, codec, &mut out),
            Pdu::Data(m) => write_datums(m, codec, &mut out),
            Pdu::Comment(m) => write_datums(m, codec, &mut out),
            Pdu::Other { header, body } => {
                codec.write(header, &mut out);
                out.extend_from_slice(body);
            }
        }
        out
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Pdu::EntityState(m) => EntityStatePdu::SIZE + m.articulations.wire_len(),
            Pdu::Fire(_) => FirePdu::SIZE,
            Pdu::Detonation(m) => DetonationPdu::SIZE + m.articulations.wire_len(),
            Pdu::ElectromagneticEmission(m) => ElectromagneticEmissionPdu::SIZE + m.trailing_len(),
            Pdu::Designator(_) => DesignatorPdu::SIZE,
            Pdu::IffAtcNavaids(_) => IffAtcNavaidsPdu::SIZE,
            Pdu::Transmitter(m) => TransmitterPdu::SIZE + m.trailing_len(),
            Pdu::Signal(m) => SignalPdu::SIZE + m.trailing_len(),
            Pdu::StartResume(_) => StartResumePdu::SIZE,
            Pdu::StopFreeze(_) => StopFreezePdu::SIZE,
            Pdu::Acknowledge(_) => AcknowledgePdu::SIZE,
            Pdu::ActionRequest(m) => ActionRequestPdu::SIZE + m.trailing_len(),
            Pdu::ActionResponse(m) => ActionResponsePdu::SIZE + m.trailing_len(),
            Pdu::DataQuery(m) => DataQueryPdu::SIZE + m.trailing_len(),
            Pdu::Data(m) => DataPdu::SIZE + m.trailing_len(),
            Pdu::Comment(m) => CommentPdu::SIZE + m.trailing_len(),
            Pdu::Other { body, .. } => PduHeader::SIZE + body.len(),
        }
    }
}

fn tail<P: WireRecord>(buf: &[u8]) -> &[u8] {
    buf.get(P::SIZE..).unwrap_or(&[])
}

fn read_datums<P: super::simman::DatumCarrier>(
    buf: &[u8],
    codec: &WireCodec,
) -> Result<Datums<P>, WireError> {
    let pdu: P = codec.read(buf, 0)?;
    Datums::read_trailing(pdu, tail::<P>(buf), codec)
}

fn write_datums<P: super::simman::DatumCarrier>(
    message: &mut Datums<P>,
    codec: &WireCodec,
    out: &mut Vec<u8>,
) {
    message.sync_counts();
    codec.write(&message.pdu, out);
    message.write_trailing(codec, out);
}

/// Decodes every PDU bundled in one datagram. A malformed PDU ends the
/// walk; the PDUs decoded before it are kept.
pub fn decode_datagram(buf: &[u8], codec: &WireCodec) -> (Vec<Pdu>, Option<WireError>) {
    let mut pdus = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let rest = &buf[offset..];
        let length = match codec.read::<PduHeader>(rest, 0) {
            Ok(header) => header.length as usize,
            Err(e) => return (pdus, Some(e)),
        };
        match Pdu::decode(rest, codec) {
            Ok(pdu) => pdus.push(pdu),
            Err(e) => return (pdus, Some(e)),
        }
        offset += length;
    }
    (pdus, None)
}

fn write_entity_type(f: &mut fmt::Formatter<'_>, label: &str, t: &EntityType) -> fmt::Result {
    writeln!(f, "  {label:<22}{t}")
}

impl fmt::Display for Pdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header();
        let name = self
            .pdu_type()
            .map(|t| format!("{t:?}"))
            .unwrap_or_else(|| format!("Type{}", header.pdu_type));
        writeln!(
            f,
            "{name} PDU: version {} exercise {} family {} timestamp {:#010x} length {}",
            header.protocol_version,
            header.exercise_id,
            header.protocol_family,
            header.timestamp,
            header.length
        )?;
        match self {
            Pdu::EntityState(m) => {
                let p = &m.pdu;
                writeln!(f, "  {:<22}{}", "entity", p.entity_id)?;
                writeln!(f, "  {:<22}{}", "force", p.force_id)?;
                write_entity_type(f, "type", &p.entity_type)?;
                writeln!(
                    f,
                    "  {:<22}({:.3}, {:.3}, {:.3})",
                    "location",
                    p.entity_location.x,
                    p.entity_location.y,
                    p.entity_location.z
                )?;
                writeln!(
                    f,
                    "  {:<22}({:.3}, {:.3}, {:.3})",
                    "velocity",
                    p.entity_linear_velocity.x,
                    p.entity_linear_velocity.y,
                    p.entity_linear_velocity.z
                )?;
                writeln!(
                    f,
                    "  {:<22}psi {:.4} theta {:.4} phi {:.4}",
                    "orientation",
                    p.entity_orientation.psi,
                    p.entity_orientation.theta,
                    p.entity_orientation.phi
                )?;
                writeln!(f, "  {:<22}{:#010x}", "appearance", p.appearance)?;
                writeln!(f, "  {:<22}{}", "dr algorithm", p.dead_reckoning.algorithm)?;
                writeln!(f, "  {:<22}{}", "marking", p.entity_marking.text())?;
                for (idx, part) in m.articulations.iter().enumerate() {
                    match (part.articulated_value(), part.attached_type()) {
                        (Some(value), _) => writeln!(
                            f,
                            "  articulation[{idx}]     type {} value {value:.4}",
                            part.parameter_type
                        )?,
                        (_, Some(store)) => writeln!(
                            f,
                            "  articulation[{idx}]     station {} store {store}",
                            part.parameter_type
                        )?,
                        _ => writeln!(
                            f,
                            "  articulation[{idx}]     designator {}",
                            part.type_designator
                        )?,
                    }
                }
                Ok(())
            }
            Pdu::Fire(p) => {
                writeln!(f, "  {:<22}{}", "firing", p.firing_entity_id)?;
                writeln!(f, "  {:<22}{}", "target", p.target_entity_id)?;
                writeln!(f, "  {:<22}{}", "munition", p.munition_id)?;
                writeln!(f, "  {:<22}{}", "event", p.event_id.event)?;
                write_entity_type(f, "munition type", &p.burst.munition)?;
                writeln!(f, "  {:<22}{:.1}", "range", p.range)
            }
            Pdu::Detonation(m) => {
                let p = &m.pdu;
                writeln!(f, "  {:<22}{}", "firing", p.firing_entity_id)?;
                writeln!(f, "  {:<22}{}", "target", p.target_entity_id)?;
                writeln!(f, "  {:<22}{}", "munition", p.munition_id)?;
                writeln!(f, "  {:<22}{}", "event", p.event_id.event)?;
                writeln!(f, "  {:<22}{:?}", "result", m.result())
            }
            Pdu::ElectromagneticEmission(m) => {
                writeln!(f, "  {:<22}{}", "emitter", m.pdu.emitting_entity_id)?;
                for (idx, system) in m.systems().enumerate() {
                    writeln!(
                        f,
                        "  system[{idx}]           name {} function {} beams {}",
                        system.system.emitter_system.name,
                        system.system.emitter_system.function,
                        system.system.number_of_beams
                    )?;
                    for beam in system.beams() {
                        writeln!(
                            f,
                            "    beam {}            freq {:.0} Hz erp {:.1} dBm targets {}",
                            beam.beam.beam_id,
                            beam.beam.frequency,
                            beam.beam.effective_radiated_power,
                            beam.beam.number_of_targets
                        )?;
                    }
                }
                Ok(())
            }
            Pdu::Transmitter(m) => {
                writeln!(f, "  {:<22}{}", "entity", m.pdu.entity_id)?;
                writeln!(f, "  {:<22}{}", "radio", m.pdu.radio_id)?;
                writeln!(f, "  {:<22}{}", "state", m.pdu.transmit_state)?;
                writeln!(f, "  {:<22}{} Hz", "frequency", m.pdu.frequency)?;
                writeln!(f, "  {:<22}{:.1} dBm", "power", m.pdu.power)
            }
            Pdu::Signal(m) => {
                writeln!(f, "  {:<22}{}", "entity", m.pdu.entity_id)?;
                writeln!(f, "  {:<22}{}", "radio", m.pdu.radio_id)?;
                writeln!(f, "  {:<22}{} bits", "data", m.pdu.data_length)
            }
            Pdu::Comment(m) => {
                writeln!(f, "  {:<22}{}", "from", m.pdu.originating_entity_id)?;
                for datum in &m.variable {
                    writeln!(f, "  datum {:<16}{}", datum.id, datum.as_text())?;
                }
                Ok(())
            }
            Pdu::Other { body, .. } => writeln!(f, "  {:<22}{} bytes", "body", body.len()),
            other => writeln!(f, "  {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dis::enums::part;
    use crate::dis::order::ByteOrder;
    use crate::dis::records::{EntityIdentifier, EntityMarking};
    use crate::dis::simman::VariableDatum;

    fn entity_state(parts: usize) -> EntityState {
        let mut message = EntityState::default();
        message.pdu.entity_id = EntityIdentifier::new(10, 20, 30);
        message.pdu.entity_location.x = 6_378_137.0;
        message.pdu.entity_marking = EntityMarking::from_text("VIPER1");
        message.set_articulations(
            (0..parts)
                .map(|i| {
                    ArticulationParameter::articulated(part::WING_SWEEP + part::POSITION, i as f32)
                })
                .collect(),
        );
        message
    }

    #[test]
    fn test_articulation_accessor_bounds() {
        for count in [0usize, 1, 5] {
            let message = entity_state(count);
            assert_eq!(message.pdu.number_of_articulation_parameters as usize, count);
            for idx in 0..count {
                assert_eq!(
                    message.articulation_parameter(idx).and_then(|p| p.articulated_value()),
                    Some(idx as f32)
                );
            }
            assert!(message.articulation_parameter(count).is_none());
            assert!(message.articulation_parameter(count + 10).is_none());
        }
    }

    #[test]
    fn test_count_larger_than_buffer_is_none() {
        let mut message = entity_state(1);
        message.pdu.number_of_articulation_parameters = 3;
        assert!(message.articulation_parameter(0).is_some());
        assert!(message.articulation_parameter(1).is_none());
    }

    #[test]
    fn test_entity_state_encode_decode_both_orders() {
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let codec = WireCodec::new(order);
            let mut pdu = Pdu::EntityState(entity_state(2));
            pdu.stamp(6, 1, 0x0000_1235);
            let bytes = pdu.encode(&codec);
            assert_eq!(bytes.len(), 144 + 32);
            assert_eq!(pdu.header().length, 176);
            assert_eq!(Pdu::decode(&bytes, &codec).unwrap(), pdu);
        }
    }

    #[test]
    fn test_network_order_is_big_endian() {
        let codec = WireCodec::new(ByteOrder::Big);
        let mut pdu = Pdu::EntityState(entity_state(0));
        pdu.stamp(6, 1, 0);
        let bytes = pdu.encode(&codec);
        assert_eq!(bytes[2], PduType::EntityState as u8);
        assert_eq!(&bytes[8..10], &144u16.to_be_bytes());
        assert_eq!(&bytes[12..14], &10u16.to_be_bytes());
    }

    #[test]
    fn test_truncated_articulations_rejected() {
        let codec = WireCodec::default();
        let mut pdu = Pdu::EntityState(entity_state(2));
        let mut bytes = pdu.encode(&codec);
        bytes.truncate(144 + 16);
        bytes[8..10].copy_from_slice(&160u16.to_be_bytes());
        assert!(matches!(
            Pdu::decode(&bytes, &codec),
            Err(WireError::RecordOverrun { index: 1, .. })
        ));
    }

    #[test]
    fn test_encode_fills_type_and_family() {
        let codec = WireCodec::default();
        let mut pdu = Pdu::Fire(FirePdu::default());
        let bytes = pdu.encode(&codec);
        assert_eq!(bytes[2], PduType::Fire as u8);
        assert_eq!(bytes[3], PduType::Fire.family() as u8);
        assert_eq!(Pdu::decode(&bytes, &codec).unwrap(), pdu);

        let mut comment = Pdu::Comment(Datums::new(CommentPdu::default()));
        let bytes = comment.encode(&codec);
        assert_eq!(Pdu::decode(&bytes, &codec).unwrap().pdu_type(), Some(PduType::Comment));
    }

    #[test]
    fn test_bad_length_and_unknown_type() {
        let codec = WireCodec::default();
        let mut pdu = Pdu::Fire(FirePdu::default());
        pdu.stamp(6, 1, 0);
        let bytes = pdu.encode(&codec);
        assert!(matches!(
            Pdu::decode(&bytes[..50], &codec),
            Err(WireError::BadLength { declared: 96, .. })
        ));

        let mut unknown = bytes.clone();
        unknown[2] = 99;
        assert_eq!(Pdu::decode(&unknown, &codec), Err(WireError::UnknownPduType(99)));
    }

    #[test]
    fn test_reliable_variants_decode_as_other() {
        let codec = WireCodec::default();
        let mut header = PduHeader::new(6, 1, PduType::CommentR as u8, 10);
        header.length = 16;
        let mut bytes = Vec::new();
        codec.write(&header, &mut bytes);
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        match Pdu::decode(&bytes, &codec).unwrap() {
            Pdu::Other { header, body } => {
                assert_eq!(header.pdu_type, 62);
                assert_eq!(body, vec![1, 2, 3, 4]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_datagram_bundles_and_stops_on_error() {
        let codec = WireCodec::default();
        let mut first = Pdu::EntityState(entity_state(1));
        first.stamp(6, 1, 0);
        let mut comment = Datums::new(CommentPdu::default());
        comment.variable.push(VariableDatum::text(1, "check"));
        let mut second = Pdu::Comment(comment);
        second.stamp(6, 1, 0);

        let mut datagram = first.encode(&codec);
        datagram.extend(second.encode(&codec));
        let (pdus, error) = decode_datagram(&datagram, &codec);
        assert!(error.is_none());
        assert_eq!(pdus.len(), 2);
        assert_eq!(pdus[1].pdu_type(), Some(PduType::Comment));

        datagram.extend_from_slice(&[6, 1, 2]);
        let (pdus, error) = decode_datagram(&datagram, &codec);
        assert_eq!(pdus.len(), 2);
        assert!(matches!(error, Some(WireError::Truncated { .. })));
    }

    #[test]
    fn test_display_dump_names_fields() {
        let mut pdu = Pdu::EntityState(entity_state(1));
        pdu.stamp(6, 1, 0);
        let text = pdu.to_string();
        assert!(text.starts_with("EntityState PDU"));
        assert!(text.contains("10:20:30"));
        assert!(text.contains("VIPER1"));
        assert!(text.contains("articulation[0]"));
    }
}
