use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrequencyUnit {
    Hertz,
    KiloHertz,
    MegaHertz,
    GigaHertz,
    TeraHertz,
}

impl FrequencyUnit {
    fn hertz_per_unit(self) -> f64 {
        match self {
            FrequencyUnit::Hertz => 1.0,
            FrequencyUnit::KiloHertz => 1.0e3,
            FrequencyUnit::MegaHertz => 1.0e6,
            FrequencyUnit::GigaHertz => 1.0e9,
            FrequencyUnit::TeraHertz => 1.0e12,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            FrequencyUnit::Hertz => "Hz",
            FrequencyUnit::KiloHertz => "kHz",
            FrequencyUnit::MegaHertz => "MHz",
            FrequencyUnit::GigaHertz => "GHz",
            FrequencyUnit::TeraHertz => "THz",
        }
    }
}

pub fn convert_frequency(value: f64, from: FrequencyUnit, to: FrequencyUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.hertz_per_unit() / to.hertz_per_unit()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub value: f64,
    pub unit: FrequencyUnit,
}

impl Frequency {
    pub fn new(value: f64, unit: FrequencyUnit) -> Self {
        Self { value, unit }
    }

    pub fn hertz(value: f64) -> Self {
        Self::new(value, FrequencyUnit::Hertz)
    }

    pub fn megahertz(value: f64) -> Self {
        Self::new(value, FrequencyUnit::MegaHertz)
    }

    pub fn gigahertz(value: f64) -> Self {
        Self::new(value, FrequencyUnit::GigaHertz)
    }

    pub fn to(self, unit: FrequencyUnit) -> Self {
        Self::new(convert_frequency(self.value, self.unit, unit), unit)
    }

    pub fn as_hertz(self) -> f64 {
        convert_frequency(self.value, self.unit, FrequencyUnit::Hertz)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUnit {
    Watts,
    KiloWatts,
    MilliWatts,
    DecibelWatts,
    DecibelMilliWatts,
}

impl PowerUnit {
    fn symbol(self) -> &'static str {
        match self {
            PowerUnit::Watts => "W",
            PowerUnit::KiloWatts => "kW",
            PowerUnit::MilliWatts => "mW",
            PowerUnit::DecibelWatts => "dBW",
            PowerUnit::DecibelMilliWatts => "dBm",
        }
    }
}

fn power_to_watts(value: f64, unit: PowerUnit) -> f64 {
    match unit {
        PowerUnit::Watts => value,
        PowerUnit::KiloWatts => value * 1.0e3,
        PowerUnit::MilliWatts => value * 1.0e-3,
        PowerUnit::DecibelWatts => 10f64.powf(value / 10.0),
        PowerUnit::DecibelMilliWatts => 10f64.powf((value - 30.0) / 10.0),
    }
}

fn watts_to_power(watts: f64, unit: PowerUnit) -> f64 {
    match unit {
        PowerUnit::Watts => watts,
        PowerUnit::KiloWatts => watts * 1.0e-3,
        PowerUnit::MilliWatts => watts * 1.0e3,
        PowerUnit::DecibelWatts => 10.0 * watts.log10(),
        PowerUnit::DecibelMilliWatts => 10.0 * watts.log10() + 30.0,
    }
}

/// Converts between power units. Decibel conversions of zero or negative
/// linear power give negative infinity or NaN, as the logarithm does.
pub fn convert_power(value: f64, from: PowerUnit, to: PowerUnit) -> f64 {
    match (from, to) {
        _ if from == to => value,
        (PowerUnit::DecibelWatts, PowerUnit::DecibelMilliWatts) => value + 30.0,
        (PowerUnit::DecibelMilliWatts, PowerUnit::DecibelWatts) => value - 30.0,
        _ => watts_to_power(power_to_watts(value, from), to),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Power {
    pub value: f64,
    pub unit: PowerUnit,
}

impl Power {
    pub fn new(value: f64, unit: PowerUnit) -> Self {
        Self { value, unit }
    }

    pub fn watts(value: f64) -> Self {
        Self::new(value, PowerUnit::Watts)
    }

    pub fn kilowatts(value: f64) -> Self {
        Self::new(value, PowerUnit::KiloWatts)
    }

    pub fn dbm(value: f64) -> Self {
        Self::new(value, PowerUnit::DecibelMilliWatts)
    }

    pub fn to(self, unit: PowerUnit) -> Self {
        Self::new(convert_power(self.value, self.unit, unit), unit)
    }

    pub fn as_watts(self) -> f64 {
        convert_power(self.value, self.unit, PowerUnit::Watts)
    }

    pub fn as_dbm(self) -> f64 {
        convert_power(self.value, self.unit, PowerUnit::DecibelMilliWatts)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

pub const FEET_TO_METERS: f64 = 0.3048;
pub const NM_TO_METERS: f64 = 1852.0;
pub const KNOTS_TO_MPS: f64 = NM_TO_METERS / 3600.0;

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_frequency_conversions() {
        assert!(close(Frequency::gigahertz(9.4).as_hertz(), 9.4e9));
        let mhz = Frequency::hertz(251_000_000.0).to(FrequencyUnit::MegaHertz);
        assert_eq!(mhz.unit, FrequencyUnit::MegaHertz);
        assert!(close(mhz.value, 251.0));
        assert_eq!(convert_frequency(3.0, FrequencyUnit::KiloHertz, FrequencyUnit::KiloHertz), 3.0);
    }

    #[test]
    fn test_power_conversions() {
        assert!(close(Power::watts(1.0).as_dbm(), 30.0));
        assert!(close(Power::kilowatts(1.0).to(PowerUnit::DecibelWatts).value, 30.0));
        assert!(close(Power::dbm(60.0).as_watts(), 1000.0));
        assert!(close(
            convert_power(20.0, PowerUnit::DecibelWatts, PowerUnit::DecibelMilliWatts),
            50.0
        ));
        assert!(close(convert_power(5.0, PowerUnit::MilliWatts, PowerUnit::Watts), 0.005));
    }

    #[test]
    fn test_display_uses_unit_symbol() {
        assert_eq!(Frequency::megahertz(251.0).to_string(), "251 MHz");
        assert_eq!(Power::dbm(30.0).to_string(), "30 dBm");
    }
}
