use bytemuck::Pod;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("buffer truncated: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("header length {declared} does not fit buffer of {available} bytes")]
    BadLength { declared: usize, available: usize },
    #[error("unknown PDU type {0}")]
    UnknownPduType(u8),
    #[error("record {index} overruns trailing data ({length} bytes declared)")]
    RecordOverrun { index: usize, length: usize },
}

/// Byte order of a wire channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    pub const NETWORK: ByteOrder = ByteOrder::Big;

    pub fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// A fixed-layout wire record. `swap_bytes` converts every multi-byte field
/// between host and opposite byte order; applying it twice is the identity.
pub trait WireRecord: Pod {
    const SIZE: usize = std::mem::size_of::<Self>();

    fn swap_bytes(&mut self);

    fn swapped(mut self) -> Self {
        self.swap_bytes();
        self
    }
}

#[inline]
pub fn swap_f32(value: f32) -> f32 {
    f32::from_bits(value.to_bits().swap_bytes())
}

#[inline]
pub fn swap_f64(value: f64) -> f64 {
    f64::from_bits(value.to_bits().swap_bytes())
}

/// Reads and writes records for one channel. Whether the host order differs
/// from the wire order is decided once, when the codec is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireCodec {
    order: ByteOrder,
    swap: bool,
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(ByteOrder::NETWORK)
    }
}

impl WireCodec {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            swap: order != ByteOrder::host(),
        }
    }

    /// A codec whose wire order is the host order; used for host-order
    /// trailing buffers.
    pub fn native() -> Self {
        Self::new(ByteOrder::host())
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn needs_swap(&self) -> bool {
        self.swap
    }

    pub fn to_wire<T: WireRecord>(&self, value: &T) -> T {
        if self.swap { (*value).swapped() } else { *value }
    }

    pub fn from_wire<T: WireRecord>(&self, value: T) -> T {
        if self.swap { value.swapped() } else { value }
    }

    pub fn write<T: WireRecord>(&self, value: &T, out: &mut Vec<u8>) {
        let wire = self.to_wire(value);
        out.extend_from_slice(bytemuck::bytes_of(&wire));
    }

    pub fn read<T: WireRecord>(&self, buf: &[u8], offset: usize) -> Result<T, WireError> {
        let bytes = checked_slice(buf, offset, T::SIZE)?;
        Ok(self.from_wire(bytemuck::pod_read_unaligned::<T>(bytes)))
    }

    pub fn write_u32(&self, value: u32, out: &mut Vec<u8>) {
        let wire = if self.swap { value.swap_bytes() } else { value };
        out.extend_from_slice(&wire.to_ne_bytes());
    }

    pub fn read_u32(&self, buf: &[u8], offset: usize) -> Result<u32, WireError> {
        let bytes = checked_slice(buf, offset, 4)?;
        let value = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(if self.swap { value.swap_bytes() } else { value })
    }
}

pub fn checked_slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], WireError> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(WireError::Truncated {
            offset,
            needed: len,
            available: buf.len(),
        })
}

/// Host-order bytes following the fixed part of a PDU. Records are read back
/// through offset- and length-checked accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailingData {
    bytes: Vec<u8>,
}

impl TrailingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn push<T: WireRecord>(&mut self, record: &T) {
        self.bytes.extend_from_slice(bytemuck::bytes_of(record));
    }

    pub fn extend(&mut self, raw: &[u8]) {
        self.bytes.extend_from_slice(raw);
    }

    /// Zero-fills up to `len` bytes; never shrinks.
    pub fn pad_to(&mut self, len: usize) {
        if len > self.bytes.len() {
            self.bytes.resize(len, 0);
        }
    }

    pub fn record<T: WireRecord>(&self, offset: usize) -> Option<T> {
        checked_slice(&self.bytes, offset, T::SIZE)
            .ok()
            .map(bytemuck::pod_read_unaligned::<T>)
    }

    pub fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        checked_slice(&self.bytes, offset, len).ok()
    }
}

/// Rounds a byte count up to the next multiple of `boundary`.
pub fn padded_len(len: usize, boundary: usize) -> usize {
    len.div_ceil(boundary) * boundary
}

#[cfg(test)]
pub(crate) mod layout {
    use super::WireRecord;

    pub type Fields = &'static [(usize, usize)];

    pub const HEADER: Fields = &[(1, 4), (4, 1), (2, 1), (1, 2)];
    pub const ID: Fields = &[(2, 3)];
    pub const ENTITY_TYPE: Fields = &[(1, 2), (2, 1), (1, 4)];
    pub const VEC32: Fields = &[(4, 3)];
    pub const VEC64: Fields = &[(8, 3)];
    pub const DEAD_RECKONING: Fields = &[(1, 16), (4, 6)];
    pub const MARKING: Fields = &[(1, 12)];
    pub const BURST: Fields = &[(1, 2), (2, 1), (1, 4), (2, 4)];

    /// Byte `i` holds `i`, so every multi-byte field reads differently
    /// in each order.
    pub fn patterned<T: WireRecord>() -> T {
        let mut value = T::zeroed();
        bytemuck::bytes_of_mut(&mut value)
            .iter_mut()
            .enumerate()
            .for_each(|(i, b)| *b = i as u8);
        value
    }

    /// `fields` lists `(width, repeat)` runs covering the record. Swapping
    /// must reverse each field in place and swapping back must restore it.
    pub fn assert_field_swaps<T: WireRecord>(fields: &[Fields]) {
        let value = patterned::<T>();
        let bytes = bytemuck::bytes_of(&value);
        let mut expected: Vec<u8> = Vec::with_capacity(bytes.len());
        let mut offset = 0;
        for &(width, count) in fields.iter().copied().flatten() {
            for _ in 0..count {
                expected.extend(bytes[offset..offset + width].iter().rev());
                offset += width;
            }
        }
        assert_eq!(offset, T::SIZE, "layout does not cover {}", std::any::type_name::<T>());

        let swapped = value.swapped();
        assert_eq!(
            bytemuck::bytes_of(&swapped),
            &expected[..],
            "{}",
            std::any::type_name::<T>()
        );
        assert_eq!(bytemuck::bytes_of(&swapped.swapped()), bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_swap_is_involution() {
        for value in [0.0f32, -1.5, f32::MAX, f32::MIN_POSITIVE] {
            assert_eq!(swap_f32(swap_f32(value)).to_bits(), value.to_bits());
        }
        for value in [0.0f64, 6_378_137.0, f64::MAX, -0.25] {
            assert_eq!(swap_f64(swap_f64(value)).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_network_codec_writes_big_endian() {
        let codec = WireCodec::new(ByteOrder::Big);
        let mut out = Vec::new();
        codec.write_u32(0x0102_0304, &mut out);
        assert_eq!(out, vec![1, 2, 3, 4]);
        assert_eq!(codec.read_u32(&out, 0).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_little_codec_writes_little_endian() {
        let codec = WireCodec::new(ByteOrder::Little);
        let mut out = Vec::new();
        codec.write_u32(0x0102_0304, &mut out);
        assert_eq!(out, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_checked_slice_rejects_overrun() {
        let buf = [0u8; 8];
        assert!(checked_slice(&buf, 4, 4).is_ok());
        assert_eq!(
            checked_slice(&buf, 6, 4),
            Err(WireError::Truncated {
                offset: 6,
                needed: 4,
                available: 8
            })
        );
        assert!(checked_slice(&buf, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_trailing_record_bounds() {
        use crate::dis::records::FixedDatum;

        let datum = FixedDatum { id: 7, value: 42 };
        let mut trailing = TrailingData::new();
        trailing.push(&datum);
        assert_eq!(trailing.len(), 8);
        assert_eq!(trailing.record::<FixedDatum>(0), Some(datum));
        assert_eq!(trailing.record::<FixedDatum>(1), None);
        trailing.pad_to(12);
        assert_eq!(trailing.slice(8, 4), Some(&[0u8; 4][..]));
        assert_eq!(trailing.slice(10, 4), None);
    }

    #[test]
    fn test_padding_rounds_up() {
        assert_eq!(padded_len(0, 4), 0);
        assert_eq!(padded_len(5, 4), 8);
        assert_eq!(padded_len(8, 8), 8);
    }
}
