//! Rank codec.
//!
//! Converts (tier, division, league points) records into a single
//! orderable score and back, and aggregates sets of rank labels into an
//! average label. The codec scale is `tier_index * 4 + division_offset`;
//! apex tiers (Master and above) carry no divisions and always sit at
//! offset 0. League points never influence the codec scale; they only
//! enter the wider ladder key produced by [`rank_value`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced while parsing upstream rank data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("unknown division: {0}")]
    UnknownDivision(String),
}

/// Ladder tiers, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub const ALL: [Tier; 10] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// 0-based position in the ladder, Iron = 0.
    pub fn index(&self) -> u32 {
        *self as u32
    }

    /// Tier at the given index, clamped to Challenger.
    pub fn from_index(index: u32) -> Tier {
        let clamped = (index as usize).min(Tier::ALL.len() - 1);
        Tier::ALL[clamped]
    }

    /// Apex tiers have no divisions.
    pub fn is_apex(&self) -> bool {
        *self >= Tier::Master
    }

    /// Canonical upper-case wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Emerald => "EMERALD",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }
}

impl FromStr for Tier {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IRON" => Ok(Tier::Iron),
            "BRONZE" => Ok(Tier::Bronze),
            "SILVER" => Ok(Tier::Silver),
            "GOLD" => Ok(Tier::Gold),
            "PLATINUM" => Ok(Tier::Platinum),
            "EMERALD" => Ok(Tier::Emerald),
            "DIAMOND" => Ok(Tier::Diamond),
            "MASTER" => Ok(Tier::Master),
            "GRANDMASTER" => Ok(Tier::Grandmaster),
            "CHALLENGER" => Ok(Tier::Challenger),
            other => Err(RankError::UnknownTier(other.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    /// Title-case form used in human-facing labels ("Grandmaster").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Iron => "Iron",
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Emerald => "Emerald",
            Tier::Diamond => "Diamond",
            Tier::Master => "Master",
            Tier::Grandmaster => "Grandmaster",
            Tier::Challenger => "Challenger",
        };
        f.write_str(s)
    }
}

/// Divisions within a non-apex tier, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Division {
    Iv,
    Iii,
    Ii,
    I,
}

impl Division {
    /// Offset within a tier: IV = 0 … I = 3.
    pub fn offset(&self) -> u32 {
        *self as u32
    }

    /// Division for an offset within a tier; values above 3 clamp to I.
    pub fn from_offset(offset: u32) -> Division {
        match offset {
            0 => Division::Iv,
            1 => Division::Iii,
            2 => Division::Ii,
            _ => Division::I,
        }
    }
}

impl FromStr for Division {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IV" => Ok(Division::Iv),
            "III" => Ok(Division::Iii),
            "II" => Ok(Division::Ii),
            "I" => Ok(Division::I),
            other => Err(RankError::UnknownDivision(other.to_string())),
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Division::Iv => "IV",
            Division::Iii => "III",
            Division::Ii => "II",
            Division::I => "I",
        };
        f.write_str(s)
    }
}

const DIVISIONS_PER_TIER: u32 = 4;

/// Multiplier separating the codec score from the league-point component
/// in [`rank_value`]. Large enough that any LP total fits below it.
pub const LP_STRIDE: i64 = 1_000_000_000;

/// Codec score for a typed (tier, division) pair.
///
/// Apex tiers ignore the division and sit at offset 0, so two apex
/// players always compare equal on this scale.
pub fn score(tier: Tier, division: Division) -> u32 {
    if tier.is_apex() {
        tier.index() * DIVISIONS_PER_TIER
    } else {
        tier.index() * DIVISIONS_PER_TIER + division.offset()
    }
}

/// Encode upstream tier/division strings into a codec score.
///
/// Tier lookup is case-insensitive. For apex tiers the division string is
/// ignored entirely, whatever the upstream reported.
pub fn encode(tier: &str, division: &str) -> Result<u32, RankError> {
    let tier: Tier = tier.parse()?;
    if tier.is_apex() {
        return Ok(score(tier, Division::I));
    }
    let division: Division = division.parse()?;
    Ok(score(tier, division))
}

/// Decode a codec score back into (tier, division).
///
/// Lossy inverse for apex tiers: their stored offset is always 0, and the
/// division is reported as I by convention. Scores above the top of the
/// scale clamp to Challenger.
pub fn decode(score: u32) -> (Tier, Division) {
    let tier = Tier::from_index(score / DIVISIONS_PER_TIER);
    if tier.is_apex() {
        (tier, Division::I)
    } else {
        (tier, Division::from_offset(score % DIVISIONS_PER_TIER))
    }
}

/// Full ladder sort key: codec score widened with league points.
///
/// League points break ties uniformly for every tier, apex included; the
/// result intentionally exceeds the 32-bit range so it survives as the
/// sole numeric sort component.
pub fn rank_value(codec_score: u32, league_points: u32) -> i64 {
    codec_score as i64 * LP_STRIDE + league_points as i64
}

/// Parse a "TIER DIVISION" label into a codec score.
///
/// A bare tier label is accepted: apex tiers need no division, and a
/// non-apex tier without one counts as division IV, matching how upstream
/// summary strings omit it.
pub fn parse_label(label: &str) -> Result<u32, RankError> {
    let mut parts = label.split_whitespace();
    let tier: Tier = match parts.next() {
        Some(t) => t.parse()?,
        None => return Err(RankError::UnknownTier(String::new())),
    };
    if tier.is_apex() {
        return Ok(score(tier, Division::I));
    }
    let division = match parts.next() {
        Some(d) => d.parse()?,
        None => Division::Iv,
    };
    Ok(score(tier, division))
}

/// Label for a codec score, title-case ("Gold II", "Challenger").
///
/// Apex tiers carry no real division, so their labels omit it.
pub fn label(score: u32) -> String {
    let (tier, division) = decode(score);
    if tier.is_apex() {
        tier.to_string()
    } else {
        format!("{} {}", tier, division)
    }
}

/// Average rank label over a set of per-player rank strings.
///
/// Null and unparsable entries are dropped from the sample; an empty
/// sample yields the literal "Unranked". The mean is an integer with
/// halves rounding up, so the result depends only on the multiset of
/// inputs, never their order.
pub fn average_rank(labels: &[Option<String>]) -> String {
    let mut scores: Vec<u32> = Vec::with_capacity(labels.len());
    for entry in labels.iter().flatten() {
        match parse_label(entry) {
            Ok(score) => scores.push(score),
            Err(e) => debug!("skipping unparsable rank label {:?}: {}", entry, e),
        }
    }

    if scores.is_empty() {
        return "Unranked".to_string();
    }

    let sum: u64 = scores.iter().map(|&s| s as u64).sum();
    let count = scores.len() as u64;
    let mean = ((sum + count / 2) / count) as u32;
    label(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_basic() {
        assert_eq!(encode("IRON", "IV").unwrap(), 0);
        assert_eq!(encode("IRON", "I").unwrap(), 3);
        assert_eq!(encode("GOLD", "II").unwrap(), 3 * 4 + 2);
        assert_eq!(encode("CHALLENGER", "I").unwrap(), 9 * 4);
    }

    #[test]
    fn test_encode_case_insensitive() {
        assert_eq!(encode("gold", "ii").unwrap(), encode("GOLD", "II").unwrap());
        assert_eq!(
            encode("Grandmaster", "I").unwrap(),
            encode("GRANDMASTER", "I").unwrap()
        );
    }

    #[test]
    fn test_encode_unknown_tier() {
        let err = encode("WOOD", "IV").unwrap_err();
        assert_eq!(err, RankError::UnknownTier("WOOD".to_string()));
    }

    #[test]
    fn test_encode_unknown_division() {
        let err = encode("GOLD", "V").unwrap_err();
        assert_eq!(err, RankError::UnknownDivision("V".to_string()));
    }

    #[test]
    fn test_apex_ignores_division() {
        // Upstream occasionally reports a division for apex players;
        // the score must not move.
        assert_eq!(encode("MASTER", "IV").unwrap(), encode("MASTER", "I").unwrap());
        assert_eq!(encode("CHALLENGER", "nonsense").unwrap(), 36);
    }

    #[test]
    fn test_round_trip_non_apex() {
        for tier in Tier::ALL.iter().filter(|t| !t.is_apex()) {
            for division in [Division::Iv, Division::Iii, Division::Ii, Division::I] {
                let encoded = score(*tier, division);
                assert_eq!(decode(encoded), (*tier, division));
            }
        }
    }

    #[test]
    fn test_apex_decode_is_lossy() {
        // Apex tiers store offset 0 but decode with division I by
        // convention, so the round trip is asymmetric on purpose.
        for tier in [Tier::Master, Tier::Grandmaster, Tier::Challenger] {
            let encoded = score(tier, Division::Iv);
            assert_eq!(encoded % 4, 0);
            assert_eq!(decode(encoded), (tier, Division::I));
        }
    }

    #[test]
    fn test_decode_clamps_above_scale() {
        assert_eq!(decode(200), (Tier::Challenger, Division::I));
    }

    #[test]
    fn test_parse_label_defaults_missing_division() {
        assert_eq!(parse_label("GOLD").unwrap(), encode("GOLD", "IV").unwrap());
        assert_eq!(parse_label("CHALLENGER").unwrap(), 36);
    }

    #[test]
    fn test_average_rank_identical_inputs() {
        let labels = vec![
            Some("GOLD II".to_string()),
            Some("GOLD II".to_string()),
        ];
        assert_eq!(average_rank(&labels), "Gold II");
    }

    #[test]
    fn test_average_rank_iron_and_challenger() {
        // IRON IV = 0, CHALLENGER = 36: mean 18 = Platinum II.
        let labels = vec![
            Some("IRON IV".to_string()),
            Some("CHALLENGER I".to_string()),
        ];
        assert_eq!(average_rank(&labels), "Platinum II");
    }

    #[test]
    fn test_average_rank_rounds_half_up() {
        // IRON IV = 0, IRON III = 1: mean 0.5 rounds up to IRON III.
        let labels = vec![
            Some("IRON IV".to_string()),
            Some("IRON III".to_string()),
        ];
        assert_eq!(average_rank(&labels), "Iron III");
    }

    #[test]
    fn test_average_rank_permutation_invariant() {
        let mut labels = vec![
            Some("IRON II".to_string()),
            Some("DIAMOND I".to_string()),
            Some("GOLD IV".to_string()),
            None,
            Some("MASTER I".to_string()),
        ];
        let forward = average_rank(&labels);
        labels.reverse();
        assert_eq!(average_rank(&labels), forward);
        labels.swap(0, 2);
        assert_eq!(average_rank(&labels), forward);
    }

    #[test]
    fn test_average_rank_empty_is_unranked() {
        assert_eq!(average_rank(&[]), "Unranked");
        assert_eq!(average_rank(&[None, None]), "Unranked");
    }

    #[test]
    fn test_average_rank_skips_unparsable() {
        let labels = vec![
            Some("GOLD II".to_string()),
            Some("not a rank".to_string()),
            None,
        ];
        assert_eq!(average_rank(&labels), "Gold II");
    }

    #[test]
    fn test_apex_labels_omit_division() {
        assert_eq!(label(score(Tier::Master, Division::I)), "Master");
        assert_eq!(label(score(Tier::Challenger, Division::I)), "Challenger");
        assert_eq!(label(score(Tier::Diamond, Division::I)), "Diamond I");

        // MASTER = 28, GRANDMASTER = 32: mean 30 stays in the Master band.
        let labels = vec![
            Some("MASTER".to_string()),
            Some("GRANDMASTER".to_string()),
        ];
        assert_eq!(average_rank(&labels), "Master");
    }

    #[test]
    fn test_rank_value_orders_by_division_then_lp() {
        let gold_iv = rank_value(encode("GOLD", "IV").unwrap(), 99);
        let gold_iii = rank_value(encode("GOLD", "III").unwrap(), 0);
        assert!(gold_iii > gold_iv);

        let chall_low = rank_value(encode("CHALLENGER", "I").unwrap(), 150);
        let chall_high = rank_value(encode("CHALLENGER", "I").unwrap(), 1400);
        assert!(chall_high > chall_low);
    }

    #[test]
    fn test_rank_value_exceeds_32_bit_range() {
        let value = rank_value(encode("MASTER", "I").unwrap(), 0);
        assert!(value > i64::from(u32::MAX));
    }
}
