mod emission;
mod enums;
mod message;
mod order;
mod pdu;
mod radio;
mod records;
mod simman;

pub use emission::{
    BeamSpec, BeamView, ElectromagneticEmission, ElectromagneticEmissionPdu, EmissionSystem,
    EmitterBeam, EmitterSystem, SystemView, TrackJamTarget,
};
pub use enums::{
    ALL_APPLICATIONS, ALL_SITES, DIS_VERSION_1278_1_2012, DIS_VERSION_1278_1A, DetonationResult,
    ForceId, PduType, ProtocolFamily, acknowledge, burst, domain, kind, part,
};
pub use message::{Articulations, Detonation, EntityState, MAX_PDU_SIZE, Pdu, decode_datagram};
pub use order::{
    ByteOrder, TrailingData, WireCodec, WireError, WireRecord, checked_slice, padded_len,
    swap_f32, swap_f64,
};
pub use pdu::{DesignatorPdu, DetonationPdu, EntityStatePdu, FirePdu, IffAtcNavaidsPdu, PduRecord};
pub use radio::{Signal, SignalPdu, Transmitter, TransmitterPdu, transmit_state};
pub use records::{
    ArticulationParameter, BurstDescriptor, ClockTime, DeadReckoningParameters, EntityId,
    EntityIdentifier, EntityMarking, EntityType, EulerAngles, EventIdentifier, FixedDatum,
    ModulationType, PduHeader, RadioEntityType, VectorDis, WorldCoordinates,
};
pub use simman::{
    AcknowledgePdu, ActionRequestPdu, ActionResponsePdu, CommentPdu, DataPdu, DataQueryPdu,
    DatumCarrier, Datums, StartResumePdu, StopFreezePdu, VariableDatum,
};

const TIMESTAMP_UNITS_PER_HOUR: f64 = 2_147_483_648.0;

/// DIS timestamp: seconds past the hour in units of 3600/2^31 s, shifted
/// left one bit; the low bit marks absolute time.
pub fn dis_timestamp(seconds_past_hour: f64, absolute: bool) -> u32 {
    let fraction = seconds_past_hour.rem_euclid(3600.0) / 3600.0;
    let units = ((fraction * TIMESTAMP_UNITS_PER_HOUR) as u64).min(0x7FFF_FFFF) as u32;
    (units << 1) | u32::from(absolute)
}

/// Inverse of [`dis_timestamp`]: (seconds past the hour, absolute).
pub fn decode_dis_timestamp(timestamp: u32) -> (f64, bool) {
    let units = (timestamp >> 1) as f64;
    (units * 3600.0 / TIMESTAMP_UNITS_PER_HOUR, timestamp & 1 == 1)
}

/// `ClockTime` for an absolute time in seconds since the epoch.
pub fn clock_time(seconds: f64) -> ClockTime {
    let hour = (seconds / 3600.0).floor();
    let past = seconds - hour * 3600.0;
    ClockTime {
        hour: hour as u32,
        time_past_hour: dis_timestamp(past, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_roundtrip() {
        for seconds in [0.0, 1.5, 1799.25, 3599.9] {
            let (decoded, absolute) = decode_dis_timestamp(dis_timestamp(seconds, true));
            assert!(absolute);
            assert!((decoded - seconds).abs() < 1e-5, "{seconds} -> {decoded}");
        }
        let (_, absolute) = decode_dis_timestamp(dis_timestamp(10.0, false));
        assert!(!absolute);
    }

    #[test]
    fn test_timestamp_wraps_each_hour() {
        assert_eq!(dis_timestamp(3610.0, true), dis_timestamp(10.0, true));
        assert_eq!(dis_timestamp(-5.0, false), dis_timestamp(3595.0, false));
    }

    #[test]
    fn test_clock_time_splits_hours() {
        let clock = clock_time(7200.0 + 30.0);
        assert_eq!(clock.hour, 2);
        let (past, _) = decode_dis_timestamp(clock.time_past_hour);
        assert!((past - 30.0).abs() < 1e-5);
    }
}
