use crate::dis::{ForceId, domain, kind};
use crate::player::{Appearance, PlayerMode, Posture, Side};

bitflags::bitflags! {
    /// Single-bit fields of the DIS platform appearance word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AppearanceBits: u32 {
        const CAMOUFLAGE_PAINT = 1 << 0;
        const FLAMING = 1 << 15;
        const FROZEN = 1 << 21;
        const DEACTIVATED = 1 << 23;
    }
}

const DAMAGE_SHIFT: u32 = 3;
const SMOKE_SHIFT: u32 = 5;
const CAMOUFLAGE_TYPE_SHIFT: u32 = 17;
const POSTURE_SHIFT: u32 = 16;
const TWO_BITS: u32 = 0b11;
const FOUR_BITS: u32 = 0b1111;

/// Levels carried by the 2-bit damage and smoke fields.
const LEVELS: [f64; 4] = [0.0, 0.33, 0.66, 1.0];

/// Decoded appearance word.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodedAppearance {
    pub appearance: Appearance,
    pub deactivated: bool,
}

impl DecodedAppearance {
    pub fn destroyed(&self) -> bool {
        self.appearance.damage >= 1.0
    }
}

/// Bucket code (0..=3) of a 0.0..=1.0 level.
pub(crate) fn level_to_bits(level: f64) -> u32 {
    if level < 0.33 {
        0
    } else if level < 0.66 {
        1
    } else if level < 1.0 {
        2
    } else {
        3
    }
}

pub(crate) fn bits_to_level(bits: u32) -> f64 {
    LEVELS[(bits & TWO_BITS) as usize]
}

fn is_land_platform(entity_kind: u8, entity_domain: u8) -> bool {
    entity_kind == kind::PLATFORM && entity_domain == domain::LAND
}

pub fn encode_appearance(
    appearance: &Appearance,
    mode: PlayerMode,
    entity_kind: u8,
    entity_domain: u8,
) -> u32 {
    let damage = if mode.is_destroyed() {
        3
    } else {
        level_to_bits(appearance.damage)
    };
    let mut word = (damage << DAMAGE_SHIFT) | (level_to_bits(appearance.smoke) << SMOKE_SHIFT);

    let mut bits = AppearanceBits::empty();
    bits.set(AppearanceBits::FLAMING, appearance.flames >= 0.5);
    bits.set(AppearanceBits::FROZEN, appearance.frozen);
    bits.set(AppearanceBits::DEACTIVATED, mode == PlayerMode::DeleteRequest);

    if appearance.camouflage > 0 {
        bits.insert(AppearanceBits::CAMOUFLAGE_PAINT);
        if is_land_platform(entity_kind, entity_domain) {
            let scheme = u32::from(appearance.camouflage.min(4) - 1);
            word |= scheme << CAMOUFLAGE_TYPE_SHIFT;
        }
    }
    if entity_kind == kind::LIFE_FORM {
        word |= (appearance.posture.code() & FOUR_BITS) << POSTURE_SHIFT;
    }
    word | bits.bits()
}

pub fn decode_appearance(word: u32, entity_kind: u8, entity_domain: u8) -> DecodedAppearance {
    let bits = AppearanceBits::from_bits_truncate(word);
    let camouflage = if bits.contains(AppearanceBits::CAMOUFLAGE_PAINT) {
        if is_land_platform(entity_kind, entity_domain) {
            ((word >> CAMOUFLAGE_TYPE_SHIFT) & TWO_BITS) as u8 + 1
        } else {
            1
        }
    } else {
        0
    };
    let posture = if entity_kind == kind::LIFE_FORM {
        Posture::from_code((word >> POSTURE_SHIFT) & FOUR_BITS)
    } else {
        Posture::NotApplicable
    };
    DecodedAppearance {
        appearance: Appearance {
            damage: bits_to_level(word >> DAMAGE_SHIFT),
            smoke: bits_to_level(word >> SMOKE_SHIFT),
            flames: if bits.contains(AppearanceBits::FLAMING) { 1.0 } else { 0.0 },
            frozen: bits.contains(AppearanceBits::FROZEN),
            camouflage,
            posture,
        },
        deactivated: bits.contains(AppearanceBits::DEACTIVATED),
    }
}

pub fn side_from_force(force_id: u8) -> Side {
    match ForceId::from_u8(force_id) {
        ForceId::Friendly => Side::Blue,
        ForceId::Opposing => Side::Red,
        ForceId::Neutral => Side::White,
        ForceId::Other => Side::Gray,
    }
}

pub fn force_from_side(side: Side) -> u8 {
    let force = match side {
        Side::Blue => ForceId::Friendly,
        Side::Red => ForceId::Opposing,
        Side::White => ForceId::Neutral,
        Side::Gray => ForceId::Other,
    };
    force as u8
}
