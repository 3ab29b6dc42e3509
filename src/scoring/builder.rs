//! Selects the storage-minimal [`ScoringInfo`] variant for matched records.

use crate::core::types::HlaTypingCategory;
use crate::matching::matcher::{MatchedAllele, MatchedSerology};
use crate::scoring::info::{
    distinct_sorted, merge_serology_entries, ConsolidatedMolecularScoringInfo,
    MultipleAlleleScoringInfo, ScoringInfo, SerologyEntry, SerologyScoringInfo,
    SingleAlleleScoringInfo,
};

pub fn single_allele_info(allele: &MatchedAllele) -> SingleAlleleScoringInfo {
    SingleAlleleScoringInfo {
        allele_name: allele.hla_typing.name.clone(),
        allele_typing_status: allele.typing_used_in_matching.status,
        matching_p_group: allele.matching_p_groups.first().cloned(),
        matching_g_group: allele.matching_g_groups.first().cloned(),
        matching_serologies: allele
            .matching_serologies
            .iter()
            .map(SerologyEntry::from)
            .collect(),
    }
}

/// `SingleAllele` for one allele, `MultipleAllele` for several; `None` if empty
pub fn allele_scoring_info(alleles: &[&MatchedAllele]) -> Option<ScoringInfo> {
    match alleles {
        [] => None,
        [allele] => Some(ScoringInfo::SingleAllele(single_allele_info(allele))),
        alleles => Some(multiple_allele_info(
            alleles.iter().map(|allele| single_allele_info(allele)).collect(),
        )),
    }
}

pub fn serology_scoring_info(serology: &MatchedSerology) -> ScoringInfo {
    ScoringInfo::Serology(SerologyScoringInfo {
        serology_subtype: serology.hla_typing.subtype,
        matching_p_groups: serology.matching_p_groups.clone(),
        matching_g_groups: serology.matching_g_groups.clone(),
        matching_serologies: serology
            .matching_serologies
            .iter()
            .map(SerologyEntry::from)
            .collect(),
    })
}

fn multiple_allele_info(allele_scoring_infos: Vec<SingleAlleleScoringInfo>) -> ScoringInfo {
    let mut matching_serologies = Vec::new();
    for allele in &allele_scoring_infos {
        merge_serology_entries(&mut matching_serologies, &allele.matching_serologies);
    }
    ScoringInfo::MultipleAllele(MultipleAlleleScoringInfo {
        allele_scoring_infos,
        matching_serologies,
    })
}

/// Collapse several infos into one, keeping only group and serology unions
pub fn consolidate(infos: &[ScoringInfo]) -> ScoringInfo {
    let mut matching_serologies = Vec::new();
    for info in infos {
        merge_serology_entries(&mut matching_serologies, info.matching_serologies());
    }

    ScoringInfo::ConsolidatedMolecular(ConsolidatedMolecularScoringInfo {
        matching_p_groups: distinct_sorted(infos.iter().flat_map(ScoringInfo::matching_p_groups)),
        matching_g_groups: distinct_sorted(infos.iter().flat_map(ScoringInfo::matching_g_groups)),
        matching_serologies,
    })
}

/// Combine the rows found for one lookup into a single info.
///
/// Allele names and allele strings keep per-allele detail where every row
/// has it; codes, XX and group expansions are always consolidated, even
/// when they cover a single allele.
pub fn combine_for_category(
    category: HlaTypingCategory,
    infos: &[ScoringInfo],
) -> Option<ScoringInfo> {
    if let [info] = infos {
        if !matches!(
            category,
            HlaTypingCategory::NmdpCode
                | HlaTypingCategory::XxCode
                | HlaTypingCategory::PGroup
                | HlaTypingCategory::GGroup
        ) {
            return Some(info.clone());
        }
    }
    if infos.is_empty() {
        return None;
    }

    match category {
        HlaTypingCategory::Allele
        | HlaTypingCategory::AlleleStringOfNames
        | HlaTypingCategory::AlleleStringOfSubtypes => {
            let expanded: Result<Vec<Vec<SingleAlleleScoringInfo>>, _> = infos
                .iter()
                .map(ScoringInfo::expand_to_single_alleles)
                .collect();
            match expanded {
                Ok(alleles) => {
                    let mut singles: Vec<SingleAlleleScoringInfo> = Vec::new();
                    for allele in alleles.into_iter().flatten() {
                        if !singles.iter().any(|s| s.allele_name == allele.allele_name) {
                            singles.push(allele);
                        }
                    }
                    Some(multiple_allele_info(singles))
                }
                Err(_) => Some(consolidate(infos)),
            }
        }
        HlaTypingCategory::Serology => Some(consolidate(infos)),
        HlaTypingCategory::GGroup
        | HlaTypingCategory::PGroup
        | HlaTypingCategory::XxCode
        | HlaTypingCategory::NmdpCode => Some(consolidate(infos)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::NomenclatureSnapshot;
    use crate::core::types::Locus;
    use crate::matching::matcher::{calculate_matched_hla, MatchedHlaSet};

    fn matched() -> MatchedHlaSet {
        let snapshot =
            NomenclatureSnapshot::from_json(include_str!("../../tests/data/snapshot_3400.json"))
                .unwrap();
        calculate_matched_hla(&snapshot)
    }

    #[test]
    fn test_single_allele_info() {
        let matched = matched();
        let allele = matched.allele(Locus::A, "01:01:01:01").unwrap();
        let info = allele_scoring_info(&[allele]).unwrap();

        let ScoringInfo::SingleAllele(single) = &info else {
            panic!("expected single allele info, got {info:?}");
        };
        assert_eq!(single.matching_p_group.as_deref(), Some("01:01P"));
        assert_eq!(single.matching_g_group.as_deref(), Some("01:01:01G"));
        assert_eq!(single.matching_serologies.len(), 1);
    }

    #[test]
    fn test_multiple_allele_info_unions_serologies() {
        let matched = matched();
        let alleles = vec![
            matched.allele(Locus::A, "01:01:01:01").unwrap(),
            matched.allele(Locus::A, "01:01:01:02N").unwrap(),
        ];
        let info = allele_scoring_info(&alleles).unwrap();

        assert_eq!(info.expand_to_single_alleles().unwrap().len(), 2);
        let names: Vec<&str> = info
            .matching_serologies()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["1"]);
        assert_eq!(info.matching_g_groups(), vec!["01:01:01G"]);
    }

    #[test]
    fn test_empty_allele_list_has_no_info() {
        assert!(allele_scoring_info(&[]).is_none());
    }

    #[test]
    fn test_consolidate_drops_allele_detail() {
        let matched = matched();
        let infos: Vec<ScoringInfo> = ["11:01:01:01", "11:02:01"]
            .iter()
            .map(|name| {
                allele_scoring_info(&[matched.allele(Locus::A, name).unwrap()]).unwrap()
            })
            .collect();

        let consolidated = consolidate(&infos);
        assert!(consolidated.expand_to_single_alleles().is_err());
        assert_eq!(consolidated.matching_p_groups(), vec!["11:01P", "11:02P"]);
        assert_eq!(consolidated.matching_serologies().len(), 1);
    }

    #[test]
    fn test_combine_for_allele_string_keeps_detail() {
        let matched = matched();
        let infos: Vec<ScoringInfo> = ["01:01:01:01", "01:02"]
            .iter()
            .map(|name| {
                allele_scoring_info(&[matched.allele(Locus::A, name).unwrap()]).unwrap()
            })
            .collect();

        let combined =
            combine_for_category(HlaTypingCategory::AlleleStringOfNames, &infos).unwrap();
        assert!(matches!(combined, ScoringInfo::MultipleAllele(_)));
        assert_eq!(combined.expand_to_single_alleles().unwrap().len(), 2);

        let combined = combine_for_category(HlaTypingCategory::NmdpCode, &infos).unwrap();
        assert!(matches!(combined, ScoringInfo::ConsolidatedMolecular(_)));
    }

    #[test]
    fn test_serology_info() {
        let matched = matched();
        let serology = matched.serology(Locus::A, "11").unwrap();
        let info = serology_scoring_info(serology);
        assert_eq!(info.matching_p_groups(), vec!["11:01P", "11:02P"]);
        assert!(info.expand_to_single_alleles().is_err());
    }
}
