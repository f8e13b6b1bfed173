use serde::{Deserialize, Serialize};

use crate::dis::{ByteOrder, DIS_VERSION_1278_1A};
use crate::dr::DrThresholds;

pub const DEFAULT_DIS_PORT: u16 = 3000;
pub const DEFAULT_EMISSION_HEARTBEAT_SECS: f64 = 10.0;

/// Which clock stamps outgoing PDUs and ages incoming ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    /// Relative timestamps from the local execution clock.
    #[default]
    Execution,
    /// Absolute timestamps; incoming entity state is aged by the
    /// difference between the sender's clock and ours.
    Utc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetIoConfig {
    pub site: u16,
    pub application: u16,
    pub exercise: u8,
    pub protocol_version: u8,
    pub federate_name: String,
    pub byte_order: ByteOrder,
    pub timeline: Timeline,
    pub thresholds: DrThresholds,
    /// Seconds to blend remote entities onto a new baseline; 0 disables.
    pub smoothing_time: f64,
    /// Heartbeat for emission and transmitter PDUs.
    pub emission_heartbeat: f64,
}

impl Default for NetIoConfig {
    fn default() -> Self {
        Self {
            site: 1,
            application: 1,
            exercise: 1,
            protocol_version: DIS_VERSION_1278_1A,
            federate_name: "simbridge".to_string(),
            byte_order: ByteOrder::Big,
            timeline: Timeline::Execution,
            thresholds: DrThresholds::default(),
            smoothing_time: 0.0,
            emission_heartbeat: DEFAULT_EMISSION_HEARTBEAT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "site": 42, "timeline": "utc", "thresholds": { "heartbeat": 2.0 } }"#;
        let config: NetIoConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.site, 42);
        assert_eq!(config.timeline, Timeline::Utc);
        assert_eq!(config.thresholds.heartbeat, 2.0);
        assert_eq!(config.thresholds.position_error, 3.0);
        assert_eq!(config.exercise, 1);
        assert_eq!(config.byte_order, ByteOrder::Big);
    }
}
