//! Skill data codec.
//!
//! Converts between the ordered record list stored on a profile and a keyed
//! mapping, so that a partial skill submission (one intake page) can be laid
//! over the volunteer's saved skills without dropping unrelated codes.
//!
//! Records are validated while decoding (unknown code, level outside `0..=4`,
//! non-integer level). The functions here assume validated input and cannot fail.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fixed set of skill identifiers a volunteer can rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillCode {
    // Design
    Ux,
    UiDesign,
    UserResearch,
    GraphicDesign,
    Figma,
    Sketch,
    AdobeXd,
    Copy,
    // Technical
    FrontEndDev,
    BackEndDev,
    MobileDev,
    React,
    NodeExpress,
    Python,
    Sql,
    DevOps,
    DataAnalysis,
    Qa,
    // Additional
    ProjectManagement,
    ProductManagement,
    Marketing,
    SocialMedia,
    GrantWriting,
    Fundraising,
}

/// Self-rated experience, 0 ("no experience") through 4 ("daily use").
///
/// Level 0 is a recorded answer, not the absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SkillLevel(u8);

impl SkillLevel {
    pub const MAX: u8 = 4;
}

impl TryFrom<i64> for SkillLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(SkillLevel(value as u8))
        } else {
            Err(format!(
                "skill level must be between 0 and {}, got {}",
                Self::MAX,
                value
            ))
        }
    }
}

impl From<SkillLevel> for i64 {
    fn from(level: SkillLevel) -> Self {
        level.0 as i64
    }
}

/// One (code, level) entry as submitted by the intake forms and stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub code: SkillCode,
    pub level: SkillLevel,
}

impl SkillRecord {
    pub fn new(code: SkillCode, level: SkillLevel) -> Self {
        Self { code, level }
    }
}

/// Keyed representation used for merging. Iteration order carries no meaning.
pub type SkillMapping = HashMap<SkillCode, SkillLevel>;

/// Build a mapping from records. A code listed twice keeps its last level.
pub fn to_mapping(records: &[SkillRecord]) -> SkillMapping {
    let mut mapping = SkillMapping::with_capacity(records.len());
    for record in records {
        mapping.insert(record.code, record.level);
    }
    mapping
}

/// Expand a mapping back into records, one per entry, in mapping order.
pub fn to_records(mapping: &SkillMapping) -> Vec<SkillRecord> {
    mapping
        .iter()
        .map(|(code, level)| SkillRecord::new(*code, *level))
        .collect()
}

/// Overlay `update` on `base`.
///
/// Codes only in `base` survive unchanged; codes in `update` take the
/// update's level. The result has unique codes.
pub fn merge(base: &[SkillRecord], update: &[SkillRecord]) -> Vec<SkillRecord> {
    let mut merged = to_mapping(base);
    merged.extend(to_mapping(update));
    to_records(&merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(value: i64) -> SkillLevel {
        SkillLevel::try_from(value).unwrap()
    }

    fn record(code: SkillCode, value: i64) -> SkillRecord {
        SkillRecord::new(code, level(value))
    }

    fn sorted(mut records: Vec<SkillRecord>) -> Vec<SkillRecord> {
        records.sort_by_key(|r| r.code);
        records
    }

    #[test]
    fn test_round_trip_is_set_equal() {
        let records = vec![
            record(SkillCode::FrontEndDev, 3),
            record(SkillCode::Ux, 0),
            record(SkillCode::Figma, 4),
        ];

        let restored = to_records(&to_mapping(&records));

        assert_eq!(sorted(restored), sorted(records));
    }

    #[test]
    fn test_duplicate_code_last_write_wins() {
        let mapping = to_mapping(&[record(SkillCode::Ux, 1), record(SkillCode::Ux, 3)]);

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[&SkillCode::Ux], level(3));
    }

    #[test]
    fn test_merge_preserves_base_only_codes() {
        let base = vec![record(SkillCode::React, 2), record(SkillCode::Sql, 1)];
        let update = vec![record(SkillCode::Figma, 3)];

        let merged = sorted(merge(&base, &update));

        assert_eq!(
            merged,
            sorted(vec![
                record(SkillCode::React, 2),
                record(SkillCode::Sql, 1),
                record(SkillCode::Figma, 3),
            ])
        );
    }

    #[test]
    fn test_merge_update_wins_on_shared_code() {
        let base = vec![record(SkillCode::Copy, 4), record(SkillCode::Python, 2)];
        let update = vec![record(SkillCode::Copy, 0)];

        let merged = to_mapping(&merge(&base, &update));

        assert_eq!(merged[&SkillCode::Copy], level(0));
        assert_eq!(merged[&SkillCode::Python], level(2));
    }

    #[test]
    fn test_merge_restores_uniqueness() {
        let base = vec![record(SkillCode::Qa, 1), record(SkillCode::Qa, 2)];
        let update = vec![record(SkillCode::DevOps, 1), record(SkillCode::DevOps, 4)];

        let merged = merge(&base, &update);

        assert_eq!(merged.len(), 2);
        let mapping = to_mapping(&merged);
        assert_eq!(mapping[&SkillCode::Qa], level(2));
        assert_eq!(mapping[&SkillCode::DevOps], level(4));
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let base = vec![record(SkillCode::Marketing, 2)];

        assert_eq!(merge(&base, &[]), base);
        assert_eq!(merge(&[], &base), base);
        assert!(merge(&[], &[]).is_empty());
    }

    #[test]
    fn test_level_bounds() {
        assert!(SkillLevel::try_from(0).is_ok());
        assert!(SkillLevel::try_from(4).is_ok());
        assert!(SkillLevel::try_from(5).is_err());
        assert!(SkillLevel::try_from(-1).is_err());
    }

    #[test]
    fn test_record_decoding_rejects_malformed_input() {
        let ok: SkillRecord =
            serde_json::from_str(r#"{"code":"nodeExpress","level":0}"#).unwrap();
        assert_eq!(ok, record(SkillCode::NodeExpress, 0));

        assert!(serde_json::from_str::<SkillRecord>(r#"{"level":2}"#).is_err());
        assert!(serde_json::from_str::<SkillRecord>(r#"{"code":"ux","level":7}"#).is_err());
        assert!(serde_json::from_str::<SkillRecord>(r#"{"code":"ux","level":1.5}"#).is_err());
        assert!(serde_json::from_str::<SkillRecord>(r#"{"code":"juggling","level":1}"#).is_err());
    }

    #[test]
    fn test_record_encoding_uses_camel_case_codes() {
        let json = serde_json::to_value(record(SkillCode::FrontEndDev, 3)).unwrap();

        assert_eq!(json, serde_json::json!({ "code": "frontEndDev", "level": 3 }));
    }
}
