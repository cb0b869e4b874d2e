//! Reply rendering.
//!
//! Produces the two text blocks that wrap a generated answer: the CSV stat
//! table the generation service is grounded on, and the reply footer with
//! the side-by-side comparison link and the bot signature. The footer
//! starts with [`FOOTER_MARKER`] so the context assembler can strip it
//! when an old reply comes back around as conversation context.

use crate::models::WeaponRecord;
use crate::{Error, Result};

/// Delimiter between a generated answer and the appended footer block.
pub const FOOTER_MARKER: &str = "\n\n---\n";

/// Signature line appended to every reply.
const SIGNATURE: &str =
    "^(I am a bot; the numbers come straight from the armory tables. Message my keeper if I misbehave.)";

/// Renders the stat table for a set of records as CSV.
///
/// One row per weapon: identity and handedness, per-attack averages, the
/// three melee profiles, throw damage by hit location, the special-class
/// attacks, and the armor multipliers derived from the damage type.
///
/// # Errors
///
/// Returns an error if CSV serialization fails.
pub fn stat_table(records: &[&WeaponRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "name",
            "damage_type",
            "handedness",
            "average_range",
            "average_alt_range",
            "average_windup",
            "average_light_damage",
            "average_heavy_damage",
            "slash_range",
            "slash_alt_range",
            "slash_windup",
            "slash_light_damage",
            "slash_heavy_damage",
            "overhead_range",
            "overhead_alt_range",
            "overhead_windup",
            "overhead_light_damage",
            "overhead_heavy_damage",
            "stab_range",
            "stab_alt_range",
            "stab_windup",
            "stab_light_damage",
            "stab_heavy_damage",
            "throw_legs",
            "throw_torso",
            "throw_head",
            "special_windup",
            "special_damage",
            "charge_damage",
            "leap_damage",
            "footman_multiplier",
            "knight_multiplier",
        ])
        .map_err(|e| Error::operation("stat_table", e))?;

    for record in records {
        let attacks = &record.attacks;
        writer
            .write_record([
                record.name.clone(),
                record.damage_type.as_str().to_string(),
                record.handedness().to_string(),
                format!("{:.1}", record.average_range()),
                format!("{:.1}", record.average_alt_range()),
                format!("{:.1}", record.average_windup()),
                format!("{:.1}", record.average_light_damage()),
                format!("{:.1}", record.average_heavy_damage()),
                trim_float(attacks.slash.range),
                trim_float(attacks.slash.alt_range),
                trim_float(attacks.slash.light.windup),
                trim_float(attacks.slash.light.damage),
                trim_float(attacks.slash.heavy.damage),
                trim_float(attacks.overhead.range),
                trim_float(attacks.overhead.alt_range),
                trim_float(attacks.overhead.light.windup),
                trim_float(attacks.overhead.light.damage),
                trim_float(attacks.overhead.heavy.damage),
                trim_float(attacks.stab.range),
                trim_float(attacks.stab.alt_range),
                trim_float(attacks.stab.light.windup),
                trim_float(attacks.stab.light.damage),
                trim_float(attacks.stab.heavy.damage),
                trim_float(record.ranged_attack.damage.legs),
                trim_float(record.ranged_attack.damage.torso),
                trim_float(record.ranged_attack.damage.head),
                trim_float(record.special_attack.windup),
                trim_float(record.special_attack.damage),
                trim_float(record.charge_attack.damage),
                trim_float(record.leap_attack.damage),
                trim_float(record.damage_type.footman_multiplier()),
                trim_float(record.damage_type.knight_multiplier()),
            ])
            .map_err(|e| Error::operation("stat_table", e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::operation("stat_table", e))?;
    String::from_utf8(bytes).map_err(|e| Error::operation("stat_table", e))
}

/// Builds the comparison-site link for a set of records.
///
/// The site takes the weapon ids joined with `-` in a single `weapon`
/// query parameter.
#[must_use]
pub fn comparison_link(base_url: &str, records: &[&WeaponRecord]) -> String {
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    format!("{base_url}?weapon={}", ids.join("-"))
}

/// Joins record names into a natural-language list.
#[must_use]
pub fn weapon_text_list(records: &[&WeaponRecord]) -> String {
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    match names.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// Builds the footer block appended to every reply.
#[must_use]
pub fn reply_footer(base_url: &str, records: &[&WeaponRecord]) -> String {
    let link = comparison_link(base_url, records);
    let list = weapon_text_list(records);
    format!(
        "{FOOTER_MARKER}[Here you can view a direct comparison between the {list}.]({link}) \
Averages are shown by default; more stats are available for display.\n\n{SIGNATURE}"
    )
}

/// Joins a generated answer and its footer into the posted reply body.
#[must_use]
pub fn compose_reply(answer: &str, base_url: &str, records: &[&WeaponRecord]) -> String {
    format!("{}{}", answer.trim_end(), reply_footer(base_url, records))
}

/// Formats a float without a trailing `.0` for whole numbers.
fn trim_float(value: f64) -> String {
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> WeaponRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "damageType": "Blunt",
            "attacks": {
                "slash": {"range": 50, "altRange": 45, "light": {"windup": 500, "damage": 40}, "heavy": {"windup": 600, "damage": 60}},
                "overhead": {"range": 52, "altRange": 46, "light": {"windup": 510, "damage": 45}, "heavy": {"windup": 610, "damage": 65}},
                "stab": {"range": 48, "altRange": 44, "light": {"windup": 520, "damage": 30}, "heavy": {"windup": 620, "damage": 50}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_stat_table_has_row_per_record() {
        let a = record("mc", "Mace");
        let b = record("wh", "Warhammer");
        let table = stat_table(&[&a, &b]).unwrap();
        let lines: Vec<&str> = table.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("name,damage_type,handedness"));
        assert!(lines[1].starts_with("Mace,Blunt,Two Handed"));
        assert!(lines[2].starts_with("Warhammer,"));
    }

    #[test]
    fn test_stat_table_multipliers_from_damage_type() {
        let a = record("mc", "Mace");
        let table = stat_table(&[&a]).unwrap();
        assert!(table.trim_end().ends_with("1.35,1.5"));
    }

    #[test]
    fn test_comparison_link_joins_ids() {
        let a = record("mc", "Mace");
        let b = record("wh", "Warhammer");
        assert_eq!(
            comparison_link("https://armory.example", &[&a, &b]),
            "https://armory.example?weapon=mc-wh"
        );
    }

    #[test]
    fn test_weapon_text_list_forms() {
        let a = record("a", "Axe");
        let b = record("b", "Bill");
        let c = record("c", "Cudgel");
        assert_eq!(weapon_text_list(&[&a]), "Axe");
        assert_eq!(weapon_text_list(&[&a, &b]), "Axe and Bill");
        assert_eq!(weapon_text_list(&[&a, &b, &c]), "Axe, Bill, and Cudgel");
    }

    #[test]
    fn test_reply_footer_starts_with_marker() {
        let a = record("a", "Axe");
        let footer = reply_footer("https://armory.example", &[&a]);
        assert!(footer.starts_with(FOOTER_MARKER));
        assert!(footer.contains("I am a bot"));
    }

    #[test]
    fn test_compose_reply_round_trips_with_strip() {
        let a = record("a", "Axe");
        let reply = compose_reply("The axe wins.", "https://armory.example", &[&a]);
        assert_eq!(crate::context::strip_footer(&reply), "The axe wins.");
    }
}
