//! Catalog record types.
//!
//! A [`WeaponRecord`] is one entry of the reference catalog: a named weapon
//! with category tags, optional alternate names, and the attack statistics
//! the rendering layer turns into comparison tables. The detection engine
//! treats everything past the naming fields as opaque.

use serde::{Deserialize, Serialize};

/// One entry of the weapon catalog.
///
/// Deserialized from the per-weapon JSON documents published by the
/// comparison site. Field names follow that wire format (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRecord {
    /// Unique identifier across the catalog.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Alternate names users write instead of the display name.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Category tags, e.g. "Sword", "Polearm", "One Handed".
    #[serde(default)]
    pub weapon_types: Vec<String>,
    /// Damage type of the weapon's melee attacks.
    #[serde(default)]
    pub damage_type: DamageType,
    /// Melee attack profiles.
    #[serde(default)]
    pub attacks: MeleeAttacks,
    /// Thrown attack damage.
    #[serde(default)]
    pub ranged_attack: RangedAttack,
    /// Special attack figures.
    #[serde(default)]
    pub special_attack: SpecialAttack,
    /// Sprint charge attack figures.
    #[serde(default)]
    pub charge_attack: SpecialAttack,
    /// Leaping strike figures.
    #[serde(default)]
    pub leap_attack: SpecialAttack,
}

impl WeaponRecord {
    /// Whether the record carries enough naming data to be indexed.
    #[must_use]
    pub fn is_indexable(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }

    /// "One Handed" or "Two Handed", from the category tags.
    #[must_use]
    pub fn handedness(&self) -> &'static str {
        if self
            .weapon_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case("one handed"))
        {
            "One Handed"
        } else {
            "Two Handed"
        }
    }

    /// Mean reach across the three melee attacks.
    #[must_use]
    pub fn average_range(&self) -> f64 {
        (self.attacks.slash.range + self.attacks.overhead.range + self.attacks.stab.range) / 3.0
    }

    /// Mean alt-mode reach across the three melee attacks.
    #[must_use]
    pub fn average_alt_range(&self) -> f64 {
        (self.attacks.slash.alt_range + self.attacks.overhead.alt_range + self.attacks.stab.alt_range)
            / 3.0
    }

    /// Mean light-attack windup across the three melee attacks.
    #[must_use]
    pub fn average_windup(&self) -> f64 {
        (self.attacks.slash.light.windup
            + self.attacks.overhead.light.windup
            + self.attacks.stab.light.windup)
            / 3.0
    }

    /// Mean light-attack damage across the three melee attacks.
    #[must_use]
    pub fn average_light_damage(&self) -> f64 {
        (self.attacks.slash.light.damage
            + self.attacks.overhead.light.damage
            + self.attacks.stab.light.damage)
            / 3.0
    }

    /// Mean heavy-attack damage across the three melee attacks.
    #[must_use]
    pub fn average_heavy_damage(&self) -> f64 {
        (self.attacks.slash.heavy.damage
            + self.attacks.overhead.heavy.damage
            + self.attacks.stab.heavy.damage)
            / 3.0
    }
}

/// Damage type of a weapon's melee attacks.
///
/// Determines the armor multipliers applied against the two armored
/// target classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DamageType {
    /// Cutting damage; no armor bonus.
    #[default]
    Cut,
    /// Chopping damage; moderate armor bonus.
    Chop,
    /// Blunt damage; the largest armor bonus.
    Blunt,
}

impl DamageType {
    /// Damage multiplier against footman-class targets.
    #[must_use]
    pub const fn footman_multiplier(self) -> f64 {
        match self {
            Self::Cut => 1.0,
            Self::Chop => 1.175,
            Self::Blunt => 1.35,
        }
    }

    /// Damage multiplier against knight-class targets.
    #[must_use]
    pub const fn knight_multiplier(self) -> f64 {
        match self {
            Self::Cut => 1.0,
            Self::Chop => 1.25,
            Self::Blunt => 1.5,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cut => "Cut",
            Self::Chop => "Chop",
            Self::Blunt => "Blunt",
        }
    }
}

/// The three melee attack profiles of a weapon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeleeAttacks {
    /// Horizontal swing.
    #[serde(default)]
    pub slash: AttackProfile,
    /// Vertical swing.
    #[serde(default)]
    pub overhead: AttackProfile,
    /// Thrust.
    #[serde(default)]
    pub stab: AttackProfile,
}

/// One melee attack profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackProfile {
    /// Reach in centimeters.
    #[serde(default)]
    pub range: f64,
    /// Reach of the alternate grip or stance.
    #[serde(default)]
    pub alt_range: f64,
    /// Light variant timings and damage.
    #[serde(default)]
    pub light: SwingTimings,
    /// Heavy variant timings and damage.
    #[serde(default)]
    pub heavy: SwingTimings,
}

/// Windup and damage of a single swing variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwingTimings {
    /// Windup in milliseconds.
    #[serde(default)]
    pub windup: f64,
    /// Base damage.
    #[serde(default)]
    pub damage: f64,
}

/// Thrown attack damage per hit location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangedAttack {
    /// Damage per hit location.
    #[serde(default)]
    pub damage: RangedDamage,
}

/// Hit-location damage of a thrown attack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangedDamage {
    /// Leg hit.
    #[serde(default)]
    pub legs: f64,
    /// Torso hit.
    #[serde(default)]
    pub torso: f64,
    /// Head hit.
    #[serde(default)]
    pub head: f64,
}

/// Windup and damage of a special-class attack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecialAttack {
    /// Windup in milliseconds.
    #[serde(default)]
    pub windup: f64,
    /// Damage dealt.
    #[serde(default)]
    pub damage: f64,
}
