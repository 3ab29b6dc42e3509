use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::serology::MatchingSerology;
use crate::core::types::{AlleleTypingStatus, SerologySubtype};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("{operation} is not supported for {variant} scoring info")]
    UnsupportedOperation {
        operation: &'static str,
        variant: &'static str,
    },
}

/// A matching serology in its stored form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerologyEntry {
    pub name: String,
    pub subtype: SerologySubtype,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_unexpected: bool,
}

impl From<&MatchingSerology> for SerologyEntry {
    fn from(matching: &MatchingSerology) -> Self {
        Self {
            name: matching.serology.name.clone(),
            subtype: matching.serology.subtype,
            is_unexpected: matching.is_unexpected,
        }
    }
}

/// Scoring data for exactly one allele
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleAlleleScoringInfo {
    pub allele_name: String,
    pub allele_typing_status: AlleleTypingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_p_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_g_group: Option<String>,
    #[serde(default)]
    pub matching_serologies: Vec<SerologyEntry>,
}

/// Scoring data for a name backed by several alleles, keeping per-allele detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleAlleleScoringInfo {
    pub allele_scoring_infos: Vec<SingleAlleleScoringInfo>,
    /// Union of every allele's serologies
    #[serde(default)]
    pub matching_serologies: Vec<SerologyEntry>,
}

/// Scoring data for many alleles with per-allele detail dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedMolecularScoringInfo {
    #[serde(default)]
    pub matching_p_groups: Vec<String>,
    #[serde(default)]
    pub matching_g_groups: Vec<String>,
    #[serde(default)]
    pub matching_serologies: Vec<SerologyEntry>,
}

/// Scoring data for a serology typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerologyScoringInfo {
    pub serology_subtype: SerologySubtype,
    #[serde(default)]
    pub matching_p_groups: Vec<String>,
    #[serde(default)]
    pub matching_g_groups: Vec<String>,
    #[serde(default)]
    pub matching_serologies: Vec<SerologyEntry>,
}

/// Storage form of a matched record, one variant per resolution class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringInfo {
    SingleAllele(SingleAlleleScoringInfo),
    MultipleAllele(MultipleAlleleScoringInfo),
    ConsolidatedMolecular(ConsolidatedMolecularScoringInfo),
    Serology(SerologyScoringInfo),
}

impl ScoringInfo {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::SingleAllele(_) => "single_allele",
            Self::MultipleAllele(_) => "multiple_allele",
            Self::ConsolidatedMolecular(_) => "consolidated_molecular",
            Self::Serology(_) => "serology",
        }
    }

    /// Per-allele records behind this info.
    ///
    /// Consolidated and serology infos do not keep per-allele detail, so
    /// they fail with [`ScoringError::UnsupportedOperation`].
    pub fn expand_to_single_alleles(&self) -> Result<Vec<SingleAlleleScoringInfo>, ScoringError> {
        match self {
            Self::SingleAllele(info) => Ok(vec![info.clone()]),
            Self::MultipleAllele(info) => Ok(info.allele_scoring_infos.clone()),
            Self::ConsolidatedMolecular(_) | Self::Serology(_) => {
                Err(ScoringError::UnsupportedOperation {
                    operation: "expand_to_single_alleles",
                    variant: self.variant_name(),
                })
            }
        }
    }

    /// Distinct P-groups, sorted
    pub fn matching_p_groups(&self) -> Vec<String> {
        match self {
            Self::SingleAllele(info) => info.matching_p_group.iter().cloned().collect(),
            Self::MultipleAllele(info) => distinct_sorted(
                info.allele_scoring_infos
                    .iter()
                    .filter_map(|allele| allele.matching_p_group.clone()),
            ),
            Self::ConsolidatedMolecular(info) => info.matching_p_groups.clone(),
            Self::Serology(info) => info.matching_p_groups.clone(),
        }
    }

    /// Distinct G-groups, sorted
    pub fn matching_g_groups(&self) -> Vec<String> {
        match self {
            Self::SingleAllele(info) => info.matching_g_group.iter().cloned().collect(),
            Self::MultipleAllele(info) => distinct_sorted(
                info.allele_scoring_infos
                    .iter()
                    .filter_map(|allele| allele.matching_g_group.clone()),
            ),
            Self::ConsolidatedMolecular(info) => info.matching_g_groups.clone(),
            Self::Serology(info) => info.matching_g_groups.clone(),
        }
    }

    pub fn matching_serologies(&self) -> &[SerologyEntry] {
        match self {
            Self::SingleAllele(info) => &info.matching_serologies,
            Self::MultipleAllele(info) => &info.matching_serologies,
            Self::ConsolidatedMolecular(info) => &info.matching_serologies,
            Self::Serology(info) => &info.matching_serologies,
        }
    }
}

pub(crate) fn distinct_sorted(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut items: Vec<String> = items.into_iter().collect();
    items.sort();
    items.dedup();
    items
}

/// Append serology entries not already present, keeping first-occurrence order
pub(crate) fn merge_serology_entries(target: &mut Vec<SerologyEntry>, entries: &[SerologyEntry]) {
    for entry in entries {
        match target
            .iter_mut()
            .find(|e| e.name == entry.name && e.subtype == entry.subtype)
        {
            Some(existing) => existing.is_unexpected &= entry.is_unexpected,
            None => target.push(entry.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(name: &str, p_group: Option<&str>) -> SingleAlleleScoringInfo {
        SingleAlleleScoringInfo {
            allele_name: name.to_string(),
            allele_typing_status: AlleleTypingStatus::default(),
            matching_p_group: p_group.map(str::to_string),
            matching_g_group: None,
            matching_serologies: vec![SerologyEntry {
                name: "1".to_string(),
                subtype: SerologySubtype::NotSplit,
                is_unexpected: false,
            }],
        }
    }

    #[test]
    fn test_multiple_allele_expands_to_its_alleles() {
        let alleles = vec![
            single("01:01:01:01", Some("01:01P")),
            single("01:01:02", Some("01:01P")),
            single("01:01:03", None),
        ];
        let info = ScoringInfo::MultipleAllele(MultipleAlleleScoringInfo {
            allele_scoring_infos: alleles.clone(),
            matching_serologies: Vec::new(),
        });

        assert_eq!(info.expand_to_single_alleles().unwrap(), alleles);
        assert_eq!(info.matching_p_groups(), vec!["01:01P"]);
    }

    #[test]
    fn test_single_allele_expands_to_itself() {
        let allele = single("01:01:01:01", Some("01:01P"));
        let info = ScoringInfo::SingleAllele(allele.clone());
        assert_eq!(info.expand_to_single_alleles().unwrap(), vec![allele]);
    }

    #[test]
    fn test_consolidated_does_not_expand() {
        let info = ScoringInfo::ConsolidatedMolecular(ConsolidatedMolecularScoringInfo {
            matching_p_groups: vec!["01:01P".to_string()],
            matching_g_groups: Vec::new(),
            matching_serologies: Vec::new(),
        });

        assert_eq!(
            info.expand_to_single_alleles(),
            Err(ScoringError::UnsupportedOperation {
                operation: "expand_to_single_alleles",
                variant: "consolidated_molecular",
            })
        );
    }

    #[test]
    fn test_serialization_is_tagged() {
        let info = ScoringInfo::SingleAllele(single("01:01:01:01", Some("01:01P")));
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"type\":\"single_allele\""));
        assert!(!json.contains("matching_g_group"));

        let parsed: ScoringInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }
}
