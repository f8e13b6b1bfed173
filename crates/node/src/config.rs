use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use simbridge::dis::EntityType;
use simbridge::net::NetIoConfig;
use simbridge::ntm::{Ntm, NtmEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Orbit radius around the reference point, meters.
    pub orbit_radius: f64,
    /// Meters per second.
    pub orbit_speed: f64,
    pub orbit_altitude: f64,
    /// Seconds between launches.
    pub fire_interval: f64,
    /// Seconds from launch to detonation.
    pub flight_time: f64,
    pub missile_speed: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            orbit_radius: 5000.0,
            orbit_speed: 150.0,
            orbit_altitude: 3000.0,
            fire_interval: 30.0,
            flight_time: 8.0,
            missile_speed: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub tick_rate: u32,
    pub reference_latitude: f64,
    pub reference_longitude: f64,
    pub netio: NetIoConfig,
    pub scenario: ScenarioConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            reference_latitude: 36.2,
            reference_longitude: -115.0,
            netio: NetIoConfig::default(),
            scenario: ScenarioConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Type map for the scenario's own templates, with wildcard rows so any
/// remote aircraft, ground vehicle or munition gets a mirror.
pub fn default_ntm() -> Ntm {
    Ntm::new(vec![
        NtmEntry::new("f16", EntityType::new(1, 2, 225, 1, 3, 0, 0)),
        NtmEntry::new("sa6", EntityType::new(1, 1, 222, 28, 1, 0, 0)),
        NtmEntry::new("sam", EntityType::new(2, 9, 222, 1, 1, 0, 0)),
        NtmEntry::new("aircraft", EntityType::new(1, 2, 0, 0, 0, 0, 0)),
        NtmEntry::new("ground", EntityType::new(1, 1, 0, 0, 0, 0, 0)),
        NtmEntry::new("ship", EntityType::new(1, 3, 0, 0, 0, 0, 0)),
        NtmEntry::new("munition", EntityType::new(2, 0, 0, 0, 0, 0, 0)),
    ])
}

pub fn load_ntm(path: &Path) -> Result<Ntm> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading ntm {}", path.display()))?;
    let ntm: Ntm =
        serde_json::from_str(&text).with_context(|| format!("parsing ntm {}", path.display()))?;
    log::info!("loaded {} ntm entries from {}", ntm.len(), path.display());
    Ok(ntm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_node_config() {
        let config: NodeConfig = serde_json::from_str(
            r#"{ "tick_rate": 30, "netio": { "site": 7 }, "scenario": { "fire_interval": 5.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.netio.site, 7);
        assert_eq!(config.netio.application, 1);
        assert_eq!(config.scenario.fire_interval, 5.0);
        assert_eq!(config.scenario.flight_time, 8.0);
    }

    #[test]
    fn test_ntm_table_parses() {
        let json = r#"[
            { "template": "f16", "entity_type": { "kind": 1, "domain": 2, "country": 225,
              "category": 1, "subcategory": 3, "specific": 0, "extra": 0 } }
        ]"#;
        let ntm: Ntm = serde_json::from_str(json).unwrap();
        assert_eq!(ntm.find_entity_type("f16"), Some(EntityType::new(1, 2, 225, 1, 3, 0, 0)));
    }

    #[test]
    fn test_default_ntm_covers_unknown_aircraft() {
        let ntm = default_ntm();
        assert_eq!(ntm.find_template(&EntityType::new(1, 2, 222, 1, 9, 0, 0)), Some("aircraft"));
        assert_eq!(ntm.find_template(&EntityType::new(1, 2, 225, 1, 3, 1, 0)), Some("f16"));
    }
}
