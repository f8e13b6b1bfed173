use bytemuck::{Pod, Zeroable};

use super::order::{WireCodec, WireError, WireRecord, padded_len};
use super::pdu::{PduRecord, pdu_record};
use super::records::{ClockTime, EntityIdentifier, FixedDatum, PduHeader};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct StartResumePdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub real_world_time: ClockTime,
    pub simulation_time: ClockTime,
    pub request_id: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct StopFreezePdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub real_world_time: ClockTime,
    pub reason: u8,
    pub frozen_behavior: u8,
    pub padding: u16,
    pub request_id: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AcknowledgePdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub acknowledge_flag: u16,
    pub response_flag: u16,
    pub request_id: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ActionRequestPdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub request_id: u32,
    pub action_id: u32,
    pub number_of_fixed_datums: u32,
    pub number_of_variable_datums: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ActionResponsePdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub request_id: u32,
    pub request_status: u32,
    pub number_of_fixed_datums: u32,
    pub number_of_variable_datums: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DataQueryPdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub request_id: u32,
    pub time_interval: u32,
    pub number_of_fixed_datums: u32,
    pub number_of_variable_datums: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DataPdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub request_id: u32,
    pub padding: u32,
    pub number_of_fixed_datums: u32,
    pub number_of_variable_datums: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CommentPdu {
    pub header: PduHeader,
    pub originating_entity_id: EntityIdentifier,
    pub receiving_entity_id: EntityIdentifier,
    pub number_of_fixed_datums: u32,
    pub number_of_variable_datums: u32,
}

macro_rules! swap_fields {
    ($ty:ty { $($record:ident),* ; $($scalar:ident),* }) => {
        impl WireRecord for $ty {
            fn swap_bytes(&mut self) {
                self.header.swap_bytes();
                self.originating_entity_id.swap_bytes();
                self.receiving_entity_id.swap_bytes();
                $(self.$record.swap_bytes();)*
                $(self.$scalar = self.$scalar.swap_bytes();)*
            }
        }
    };
}

swap_fields!(StartResumePdu { real_world_time, simulation_time; request_id });
swap_fields!(StopFreezePdu { real_world_time; padding, request_id });
swap_fields!(AcknowledgePdu { ; acknowledge_flag, response_flag, request_id });
swap_fields!(ActionRequestPdu { ; request_id, action_id, number_of_fixed_datums, number_of_variable_datums });
swap_fields!(ActionResponsePdu { ; request_id, request_status, number_of_fixed_datums, number_of_variable_datums });
swap_fields!(DataQueryPdu { ; request_id, time_interval, number_of_fixed_datums, number_of_variable_datums });
swap_fields!(DataPdu { ; request_id, padding, number_of_fixed_datums, number_of_variable_datums });
swap_fields!(CommentPdu { ; number_of_fixed_datums, number_of_variable_datums });

pdu_record! {
    StartResumePdu => StartResume,
    StopFreezePdu => StopFreeze,
    AcknowledgePdu => Acknowledge,
    ActionRequestPdu => ActionRequest,
    ActionResponsePdu => ActionResponse,
    DataQueryPdu => DataQuery,
    DataPdu => Data,
    CommentPdu => Comment,
}

const _: () = assert!(std::mem::size_of::<StartResumePdu>() == 44);
const _: () = assert!(std::mem::size_of::<StopFreezePdu>() == 40);
const _: () = assert!(std::mem::size_of::<AcknowledgePdu>() == 32);
const _: () = assert!(std::mem::size_of::<ActionRequestPdu>() == 40);
const _: () = assert!(std::mem::size_of::<ActionResponsePdu>() == 40);
const _: () = assert!(std::mem::size_of::<DataQueryPdu>() == 40);
const _: () = assert!(std::mem::size_of::<DataPdu>() == 40);
const _: () = assert!(std::mem::size_of::<CommentPdu>() == 32);

/// Fixed parts that are followed by fixed and variable datum records.
pub trait DatumCarrier: PduRecord {
    fn datum_counts(&self) -> (u32, u32);
    fn set_datum_counts(&mut self, fixed: u32, variable: u32);
}

macro_rules! datum_carrier {
    ($($ty:ty),*) => {
        $(
            impl DatumCarrier for $ty {
                fn datum_counts(&self) -> (u32, u32) {
                    (self.number_of_fixed_datums, self.number_of_variable_datums)
                }

                fn set_datum_counts(&mut self, fixed: u32, variable: u32) {
                    self.number_of_fixed_datums = fixed;
                    self.number_of_variable_datums = variable;
                }
            }
        )*
    };
}

datum_carrier!(ActionRequestPdu, ActionResponsePdu, DataQueryPdu, DataPdu, CommentPdu);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableDatum {
    pub id: u32,
    pub data: Vec<u8>,
}

impl VariableDatum {
    pub fn text(id: u32, text: &str) -> Self {
        Self {
            id,
            data: text.as_bytes().to_vec(),
        }
    }

    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.data)
            .trim_end_matches('\0')
            .to_string()
    }

    fn wire_len(&self) -> usize {
        8 + padded_len(self.data.len(), 8)
    }
}

/// Datum records trailing a simulation-management PDU. Variable datum
/// lengths are in bits on the wire and the data is padded to 64 bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Datums<P> {
    pub pdu: P,
    pub fixed: Vec<FixedDatum>,
    pub variable: Vec<VariableDatum>,
}

impl<P: DatumCarrier> Datums<P> {
    pub fn new(pdu: P) -> Self {
        Self {
            pdu,
            fixed: Vec::new(),
            variable: Vec::new(),
        }
    }

    pub fn sync_counts(&mut self) {
        self.pdu
            .set_datum_counts(self.fixed.len() as u32, self.variable.len() as u32);
    }

    pub fn trailing_len(&self) -> usize {
        self.fixed.len() * FixedDatum::SIZE
            + self.variable.iter().map(VariableDatum::wire_len).sum::<usize>()
    }

    pub(crate) fn write_trailing(&self, codec: &WireCodec, out: &mut Vec<u8>) {
        for datum in &self.fixed {
            codec.write(datum, out);
        }
        for datum in &self.variable {
            let start = out.len();
            codec.write_u32(datum.id, out);
            codec.write_u32((datum.data.len() * 8) as u32, out);
            out.extend_from_slice(&datum.data);
            out.resize(start + datum.wire_len(), 0);
        }
    }

    pub(crate) fn read_trailing(pdu: P, body: &[u8], codec: &WireCodec) -> Result<Self, WireError> {
        let (fixed_count, variable_count) = pdu.datum_counts();
        let mut offset = 0;
        let mut fixed = Vec::new();
        for _ in 0..fixed_count {
            fixed.push(codec.read::<FixedDatum>(body, offset)?);
            offset += FixedDatum::SIZE;
        }
        let mut variable = Vec::new();
        for index in 0..variable_count as usize {
            let id = codec.read_u32(body, offset)?;
            let bits = codec.read_u32(body, offset + 4)? as usize;
            let len = bits.div_ceil(8);
            let data = body
                .get(offset + 8..)
                .and_then(|rest| rest.get(..len))
                .ok_or(WireError::RecordOverrun { index, length: len })?
                .to_vec();
            offset += 8 + padded_len(len, 8);
            variable.push(VariableDatum { id, data });
        }
        Ok(Self {
            pdu,
            fixed,
            variable,
        })
    }
}
