use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::core::allele::strip_locus_prefix;
use crate::core::snapshot::{AlleleGroup, NomenclatureSnapshot};
use crate::core::types::Locus;
use crate::matching::matcher::MatchedHlaSet;

/// Kind of named allele group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    PGroup,
    GGroup,
    XxCode,
}

/// A lookup name and the current allele names it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleNameEntry {
    pub locus: Locus,
    pub lookup_name: String,
    pub current_allele_names: Vec<String>,
}

/// A P-group, G-group or XX code and its member alleles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleGroupEntry {
    pub locus: Locus,
    pub kind: GroupKind,
    pub name: String,
    pub alleles: Vec<String>,
}

/// Map every known allele name to the current full names it stands for.
///
/// Full names map to themselves, name variants to every allele sharing the
/// variant, deleted alleles to their identical allele, and historical names
/// to the name they carry in this release.
pub fn build_allele_names(
    snapshot: &NomenclatureSnapshot,
    matched: &MatchedHlaSet,
) -> Vec<AlleleNameEntry> {
    let mut names: BTreeMap<(Locus, String), BTreeSet<String>> = BTreeMap::new();

    for allele in &matched.alleles {
        let typing = &allele.hla_typing;
        if typing.is_deleted {
            if allele.typing_used_in_matching.name != typing.name {
                names
                    .entry((typing.locus, typing.name.clone()))
                    .or_default()
                    .insert(allele.typing_used_in_matching.name.clone());
            }
            continue;
        }

        names
            .entry((typing.locus, typing.name.clone()))
            .or_default()
            .insert(typing.name.clone());
        for variant in typing.name_variants() {
            names
                .entry((typing.locus, variant.clone()))
                .or_default()
                .insert(typing.name.clone());
        }
    }

    for history in &snapshot.allele_name_histories {
        let Some(locus) = Locus::from_molecular(&history.typing_locus) else {
            continue;
        };
        let Some(current) = &history.current_name else {
            continue;
        };
        let current = strip_locus_prefix(current);
        for historical in &history.historical_names {
            names
                .entry((locus, strip_locus_prefix(historical).to_string()))
                .or_default()
                .insert(current.to_string());
        }
    }

    names
        .into_iter()
        .map(|((locus, lookup_name), current)| AlleleNameEntry {
            locus,
            lookup_name,
            current_allele_names: current.into_iter().collect(),
        })
        .collect()
}

/// Collect P-groups, G-groups and XX codes with their matched member alleles.
///
/// Confidential and deleted alleles are not members of any group; groups
/// left without members are dropped.
pub fn build_allele_groups(
    snapshot: &NomenclatureSnapshot,
    matched: &MatchedHlaSet,
) -> Vec<AlleleGroupEntry> {
    let current: HashSet<(Locus, &str)> = matched
        .alleles
        .iter()
        .filter(|allele| !allele.hla_typing.is_deleted)
        .map(|allele| (allele.hla_typing.locus, allele.hla_typing.name.as_str()))
        .collect();

    let mut groups: BTreeMap<(Locus, GroupKind, String), BTreeSet<String>> = BTreeMap::new();

    let mut add_named_groups = |kind: GroupKind, table: &[AlleleGroup]| {
        for group in table {
            let Some(locus) = Locus::from_molecular(&group.typing_locus) else {
                continue;
            };
            let members: BTreeSet<String> = group
                .alleles
                .iter()
                .map(|allele| strip_locus_prefix(allele))
                .filter(|allele| current.contains(&(locus, *allele)))
                .map(str::to_string)
                .collect();
            if !members.is_empty() {
                groups
                    .entry((locus, kind, group.name.clone()))
                    .or_default()
                    .extend(members);
            }
        }
    };
    add_named_groups(GroupKind::PGroup, &snapshot.p_groups);
    add_named_groups(GroupKind::GGroup, &snapshot.g_groups);

    for allele in matched.alleles.iter().filter(|a| !a.hla_typing.is_deleted) {
        let typing = &allele.hla_typing;
        groups
            .entry((typing.locus, GroupKind::XxCode, typing.xx_code()))
            .or_default()
            .insert(typing.name.clone());
    }

    groups
        .into_iter()
        .map(|((locus, kind, name), alleles)| AlleleGroupEntry {
            locus,
            kind,
            name,
            alleles: alleles.into_iter().collect(),
        })
        .collect()
}

/// Distinct P-groups of the matched alleles
pub fn build_p_groups(matched: &MatchedHlaSet) -> Vec<String> {
    matched
        .alleles
        .iter()
        .flat_map(|allele| allele.matching_p_groups.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::calculate_matched_hla;

    fn fixture() -> (NomenclatureSnapshot, MatchedHlaSet) {
        let snapshot =
            NomenclatureSnapshot::from_json(include_str!("../../tests/data/snapshot_3400.json"))
                .unwrap();
        let matched = calculate_matched_hla(&snapshot);
        (snapshot, matched)
    }

    fn current_names<'a>(
        entries: &'a [AlleleNameEntry],
        locus: Locus,
        name: &str,
    ) -> Option<&'a [String]> {
        entries
            .iter()
            .find(|e| e.locus == locus && e.lookup_name == name)
            .map(|e| e.current_allele_names.as_slice())
    }

    #[test]
    fn test_historical_names_map_to_current() {
        let (snapshot, matched) = fixture();
        let names = build_allele_names(&snapshot, &matched);

        assert_eq!(
            current_names(&names, Locus::A, "02:01:01:99"),
            Some(&["02:01:01:01".to_string()][..])
        );
        assert_eq!(current_names(&names, Locus::A, "01:77"), None);
    }

    #[test]
    fn test_variants_map_to_every_sharing_allele() {
        let (snapshot, matched) = fixture();
        let names = build_allele_names(&snapshot, &matched);

        assert_eq!(
            current_names(&names, Locus::A, "01:01:01"),
            Some(&["01:01:01:01".to_string(), "01:01:01:02N".to_string()][..])
        );
    }

    #[test]
    fn test_deleted_allele_maps_to_identical() {
        let (snapshot, matched) = fixture();
        let names = build_allele_names(&snapshot, &matched);

        assert_eq!(
            current_names(&names, Locus::A, "11:53"),
            Some(&["11:02:01".to_string()][..])
        );
        assert_eq!(current_names(&names, Locus::A, "11:54"), None);
    }

    #[test]
    fn test_groups_exclude_confidential_alleles() {
        let (snapshot, matched) = fixture();
        let groups = build_allele_groups(&snapshot, &matched);

        let find = |kind: GroupKind, name: &str| {
            groups
                .iter()
                .find(|g| g.locus == Locus::A && g.kind == kind && g.name == name)
        };

        assert_eq!(
            find(GroupKind::PGroup, "24:02P").map(|g| g.alleles.clone()),
            Some(vec!["24:02:01:01".to_string(), "24:03:01".to_string()])
        );
        assert!(find(GroupKind::PGroup, "99:01P").is_none());
        assert!(find(GroupKind::XxCode, "99:XX").is_none());
        assert_eq!(
            find(GroupKind::XxCode, "11:XX").map(|g| g.alleles.clone()),
            Some(vec!["11:01:01:01".to_string(), "11:02:01".to_string()])
        );
    }

    #[test]
    fn test_p_groups_are_distinct_and_sorted() {
        let (_, matched) = fixture();
        let p_groups = build_p_groups(&matched);

        assert!(p_groups.windows(2).all(|w| w[0] < w[1]));
        assert!(p_groups.contains(&"24:02P".to_string()));
        assert!(!p_groups.contains(&"99:01P".to_string()));
    }
}
