use serde::{Deserialize, Serialize};

use crate::core::types::{Locus, SerologySubtype};

/// A serology typing with its position in the broad/split hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerologyTyping {
    pub locus: Locus,
    pub name: String,
    pub subtype: SerologySubtype,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_deleted: bool,
}

impl SerologyTyping {
    pub fn new(locus: Locus, name: impl Into<String>, subtype: SerologySubtype) -> Self {
        Self {
            locus,
            name: name.into(),
            subtype,
            is_deleted: false,
        }
    }

    #[must_use]
    pub fn deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = is_deleted;
        self
    }
}

impl std::fmt::Display for SerologyTyping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{} ({})", self.locus, self.name, self.subtype)
    }
}

/// One entry of a typing's matching serologies.
///
/// `is_unexpected` marks serologies reached through a sibling relationship
/// rather than through the typing's own direct relationships.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchingSerology {
    pub serology: SerologyTyping,
    #[serde(default)]
    pub is_unexpected: bool,
}

impl MatchingSerology {
    pub fn new(serology: SerologyTyping, is_unexpected: bool) -> Self {
        Self {
            serology,
            is_unexpected,
        }
    }

    pub fn expected(serology: SerologyTyping) -> Self {
        Self::new(serology, false)
    }

    pub fn name(&self) -> &str {
        &self.serology.name
    }
}

/// Append `entries` to `target`, keeping first-occurrence order.
///
/// A serology already present stays where it is; it is only flagged
/// unexpected if every path that reached it was unexpected.
pub fn merge_matching_serologies(target: &mut Vec<MatchingSerology>, entries: &[MatchingSerology]) {
    for entry in entries {
        match target.iter_mut().find(|m| m.serology == entry.serology) {
            Some(existing) => existing.is_unexpected &= entry.is_unexpected,
            None => target.push(entry.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serology(name: &str, subtype: SerologySubtype) -> SerologyTyping {
        SerologyTyping::new(Locus::B, name, subtype)
    }

    #[test]
    fn test_merge_keeps_first_occurrence_order() {
        let mut target = vec![MatchingSerology::expected(serology(
            "62",
            SerologySubtype::Split,
        ))];
        let entries = vec![
            MatchingSerology::expected(serology("15", SerologySubtype::Broad)),
            MatchingSerology::expected(serology("62", SerologySubtype::Split)),
        ];

        merge_matching_serologies(&mut target, &entries);

        let names: Vec<&str> = target.iter().map(MatchingSerology::name).collect();
        assert_eq!(names, vec!["62", "15"]);
    }

    #[test]
    fn test_merge_expected_path_wins() {
        let mut target = vec![MatchingSerology::new(
            serology("49", SerologySubtype::Split),
            true,
        )];
        merge_matching_serologies(
            &mut target,
            &[MatchingSerology::expected(serology(
                "49",
                SerologySubtype::Split,
            ))],
        );
        assert_eq!(target.len(), 1);
        assert!(!target[0].is_unexpected);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            serology("15", SerologySubtype::Broad).to_string(),
            "B*15 (Broad)"
        );
    }
}
