use bytemuck::{Pod, Zeroable};

use super::order::{WireError, WireRecord, checked_slice, padded_len, swap_f32};
use super::pdu::pdu_record;
use super::records::{
    EntityIdentifier, ModulationType, PduHeader, RadioEntityType, VectorDis, WorldCoordinates,
};

pub mod transmit_state {
    pub const OFF: u8 = 0;
    pub const ON_NOT_TRANSMITTING: u8 = 1;
    pub const ON_TRANSMITTING: u8 = 2;
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TransmitterPdu {
    pub header: PduHeader,
    pub entity_id: EntityIdentifier,
    pub radio_id: u16,
    pub radio_entity_type: RadioEntityType,
    pub transmit_state: u8,
    pub input_source: u8,
    pub padding1: u16,
    pub antenna_location: WorldCoordinates,
    pub relative_antenna_location: VectorDis,
    pub antenna_pattern_type: u16,
    pub antenna_pattern_length: u16,
    pub frequency: u64,
    pub transmit_frequency_bandwidth: f32,
    pub power: f32,
    pub modulation_type: ModulationType,
    pub crypto_system: u16,
    pub crypto_key_id: u16,
    pub modulation_parameter_length: u8,
    pub padding2: u8,
    pub padding3: u16,
}

impl WireRecord for TransmitterPdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.entity_id.swap_bytes();
        self.radio_id = self.radio_id.swap_bytes();
        self.radio_entity_type.swap_bytes();
        self.padding1 = self.padding1.swap_bytes();
        self.antenna_location.swap_bytes();
        self.relative_antenna_location.swap_bytes();
        self.antenna_pattern_type = self.antenna_pattern_type.swap_bytes();
        self.antenna_pattern_length = self.antenna_pattern_length.swap_bytes();
        self.frequency = self.frequency.swap_bytes();
        self.transmit_frequency_bandwidth = swap_f32(self.transmit_frequency_bandwidth);
        self.power = swap_f32(self.power);
        self.modulation_type.swap_bytes();
        self.crypto_system = self.crypto_system.swap_bytes();
        self.crypto_key_id = self.crypto_key_id.swap_bytes();
        self.padding3 = self.padding3.swap_bytes();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SignalPdu {
    pub header: PduHeader,
    pub entity_id: EntityIdentifier,
    pub radio_id: u16,
    pub encoding_scheme: u16,
    pub tdl_type: u16,
    pub sample_rate: u32,
    /// Length of the data in bits.
    pub data_length: u16,
    pub samples: u16,
}

impl WireRecord for SignalPdu {
    fn swap_bytes(&mut self) {
        self.header.swap_bytes();
        self.entity_id.swap_bytes();
        self.radio_id = self.radio_id.swap_bytes();
        self.encoding_scheme = self.encoding_scheme.swap_bytes();
        self.tdl_type = self.tdl_type.swap_bytes();
        self.sample_rate = self.sample_rate.swap_bytes();
        self.data_length = self.data_length.swap_bytes();
        self.samples = self.samples.swap_bytes();
    }
}

pdu_record! {
    TransmitterPdu => Transmitter,
    SignalPdu => Signal,
}

const _: () = assert!(std::mem::size_of::<TransmitterPdu>() == 104);
const _: () = assert!(std::mem::size_of::<SignalPdu>() == 32);

/// Transmitter PDU with its opaque modulation parameters and antenna
/// pattern; both are carried unswapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transmitter {
    pub pdu: TransmitterPdu,
    pub modulation_parameters: Vec<u8>,
    pub antenna_pattern: Vec<u8>,
}

impl Transmitter {
    pub fn new(pdu: TransmitterPdu) -> Self {
        let mut message = Self {
            pdu,
            ..Default::default()
        };
        message.pdu.modulation_parameter_length = 0;
        message.pdu.antenna_pattern_length = 0;
        message
    }

    pub fn set_modulation_parameters(&mut self, bytes: &[u8]) -> bool {
        let Ok(len) = u8::try_from(bytes.len()) else {
            return false;
        };
        self.pdu.modulation_parameter_length = len;
        self.modulation_parameters = bytes.to_vec();
        true
    }

    pub fn trailing_len(&self) -> usize {
        self.modulation_parameters.len() + self.antenna_pattern.len()
    }

    pub(crate) fn write_trailing(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.modulation_parameters);
        out.extend_from_slice(&self.antenna_pattern);
    }

    pub(crate) fn read_trailing(pdu: TransmitterPdu, body: &[u8]) -> Result<Self, WireError> {
        let modulation_len = pdu.modulation_parameter_length as usize;
        let pattern_len = pdu.antenna_pattern_length as usize;
        let modulation_parameters = checked_slice(body, 0, modulation_len)?.to_vec();
        let antenna_pattern = checked_slice(body, modulation_len, pattern_len)?.to_vec();
        Ok(Self {
            pdu,
            modulation_parameters,
            antenna_pattern,
        })
    }
}

/// Signal PDU with its data padded to a 32-bit boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signal {
    pub pdu: SignalPdu,
    pub data: Vec<u8>,
}

impl Signal {
    pub fn new(pdu: SignalPdu, data: &[u8]) -> Option<Self> {
        let bits = u16::try_from(data.len().checked_mul(8)?).ok()?;
        let mut message = Self {
            pdu,
            data: data.to_vec(),
        };
        message.pdu.data_length = bits;
        Some(message)
    }

    pub fn data_bytes(&self) -> usize {
        (self.pdu.data_length as usize).div_ceil(8)
    }

    pub fn trailing_len(&self) -> usize {
        padded_len(self.data_bytes(), 4)
    }

    pub(crate) fn write_trailing(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&self.data);
        out.resize(start + self.trailing_len(), 0);
    }

    pub(crate) fn read_trailing(pdu: SignalPdu, body: &[u8]) -> Result<Self, WireError> {
        let len = (pdu.data_length as usize).div_ceil(8);
        let data = checked_slice(body, 0, len)?.to_vec();
        Ok(Self { pdu, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_swaps_reverse_each_field() {
        use crate::dis::order::layout::{HEADER, ID, VEC32, VEC64, assert_field_swaps};

        assert_field_swaps::<TransmitterPdu>(&[
            HEADER,
            ID,
            &[(2, 1)],
            &[(1, 2), (2, 1), (1, 2), (2, 1)],
            &[(1, 2), (2, 1)],
            VEC64,
            VEC32,
            &[(2, 2), (8, 1), (4, 2)],
            &[(2, 4)],
            &[(2, 2), (1, 2), (2, 1)],
        ]);
        assert_field_swaps::<SignalPdu>(&[HEADER, ID, &[(2, 3), (4, 1), (2, 2)]]);
    }

    #[test]
    fn test_transmitter_swap_reaches_frequency() {
        let pdu = TransmitterPdu {
            frequency: 251_000_000,
            power: 10.0,
            ..Default::default()
        };
        let wire = pdu.swapped();
        assert_eq!(wire.frequency, 251_000_000u64.swap_bytes());
        assert_eq!(wire.swapped(), pdu);
    }

    #[test]
    fn test_signal_data_is_padded() {
        let signal = Signal::new(SignalPdu::default(), &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(signal.pdu.data_length, 40);
        assert_eq!(signal.trailing_len(), 8);
        let mut out = Vec::new();
        signal.write_trailing(&mut out);
        assert_eq!(out, vec![1, 2, 3, 4, 5, 0, 0, 0]);
        let decoded = Signal::read_trailing(signal.pdu, &out).unwrap();
        assert_eq!(decoded.data, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_transmitter_trailing_bounds() {
        let mut transmitter = Transmitter::new(TransmitterPdu::default());
        assert!(transmitter.set_modulation_parameters(&[9; 8]));
        assert!(!transmitter.set_modulation_parameters(&[0; 300]));
        let mut out = Vec::new();
        transmitter.write_trailing(&mut out);
        assert!(Transmitter::read_trailing(transmitter.pdu, &out).is_ok());
        assert!(Transmitter::read_trailing(transmitter.pdu, &out[..4]).is_err());
    }
}
