//! Matching-input records.
//!
//! Each allele and serology in a snapshot is joined with its status, group
//! membership and "identical HLA" replacement. The result is one record per
//! non-confidential typing at a matching locus, computed independently of
//! every other typing.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::core::allele::{strip_locus_prefix, AlleleTyping};
use crate::core::serology::SerologyTyping;
use crate::core::snapshot::{
    AlleleGroup, NomenclatureAllele, NomenclatureSerology, NomenclatureSnapshot,
};
use crate::core::types::{AlleleTypingStatus, Locus};
use crate::matching::family::SerologyGraph;
use crate::matching::TypingKey;

/// An allele prepared for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleInfoForMatching {
    pub hla_typing: AlleleTyping,
    /// The allele itself, or the allele a deleted entry was renamed to
    pub typing_used_in_matching: AlleleTyping,
    pub matching_p_groups: Vec<String>,
    pub matching_g_groups: Vec<String>,
}

/// A serology prepared for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerologyInfoForMatching {
    pub hla_typing: SerologyTyping,
    pub typing_used_in_matching: SerologyTyping,
}

/// Allele -> groups it belongs to, for one kind of group table
#[derive(Debug, Default)]
struct GroupMembership {
    by_allele: HashMap<TypingKey, Vec<String>>,
}

impl GroupMembership {
    fn new(groups: &[AlleleGroup]) -> Self {
        let mut by_allele: HashMap<TypingKey, Vec<String>> = HashMap::new();
        for group in groups {
            let Some(locus) = Locus::from_molecular(&group.typing_locus) else {
                continue;
            };
            for allele in &group.alleles {
                by_allele
                    .entry((locus, strip_locus_prefix(allele).to_string()))
                    .or_default()
                    .push(group.name.clone());
            }
        }
        Self { by_allele }
    }

    fn groups_of(&self, allele: &AlleleTyping) -> Vec<String> {
        self.by_allele
            .get(&(allele.locus, allele.name.clone()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Produces [`AlleleInfoForMatching`] records from a snapshot
pub struct AlleleInfoGenerator<'a> {
    snapshot: &'a NomenclatureSnapshot,
    statuses: HashMap<TypingKey, AlleleTypingStatus>,
    confidential: HashSet<TypingKey>,
    p_groups: GroupMembership,
    g_groups: GroupMembership,
}

impl<'a> AlleleInfoGenerator<'a> {
    pub fn new(snapshot: &'a NomenclatureSnapshot) -> Self {
        let statuses = snapshot
            .allele_statuses
            .iter()
            .filter_map(|status| {
                let locus = Locus::from_molecular(&status.typing_locus)?;
                Some((
                    (locus, status.name.clone()),
                    AlleleTypingStatus::new(status.sequence_status, status.dna_category),
                ))
            })
            .collect();

        let confidential = snapshot
            .confidential_alleles
            .iter()
            .filter_map(|allele| {
                let locus = Locus::from_molecular(&allele.typing_locus)?;
                Some((locus, strip_locus_prefix(&allele.name).to_string()))
            })
            .collect();

        Self {
            snapshot,
            statuses,
            confidential,
            p_groups: GroupMembership::new(&snapshot.p_groups),
            g_groups: GroupMembership::new(&snapshot.g_groups),
        }
    }

    /// Generate one record per non-confidential allele at a matching locus,
    /// in snapshot order
    pub fn generate(&self) -> Vec<AlleleInfoForMatching> {
        self.snapshot
            .alleles
            .par_iter()
            .filter_map(|allele| self.info_for(allele))
            .collect()
    }

    /// Whether an allele name is excluded from the dictionary
    pub fn is_confidential(&self, locus: Locus, name: &str) -> bool {
        self.confidential.contains(&(locus, name.to_string()))
    }

    fn status_of(&self, locus: Locus, name: &str) -> AlleleTypingStatus {
        self.statuses
            .get(&(locus, name.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn typing(&self, locus: Locus, name: &str) -> AlleleTyping {
        AlleleTyping::new(locus, name).with_status(self.status_of(locus, name))
    }

    fn info_for(&self, allele: &NomenclatureAllele) -> Option<AlleleInfoForMatching> {
        let locus = Locus::from_molecular(&allele.typing_locus)?;
        let name = strip_locus_prefix(&allele.name);
        if self.is_confidential(locus, name) {
            return None;
        }

        let hla_typing = self.typing(locus, name).deleted(allele.is_deleted);
        let identical = allele
            .identical_hla
            .as_deref()
            .map(strip_locus_prefix)
            .filter(|identical| !identical.is_empty());

        let info = match (allele.is_deleted, identical) {
            (true, Some(identical)) => {
                let used = self.typing(locus, identical);
                AlleleInfoForMatching {
                    matching_p_groups: self.p_groups.groups_of(&used),
                    matching_g_groups: self.g_groups.groups_of(&used),
                    typing_used_in_matching: used,
                    hla_typing,
                }
            }
            (true, None) => AlleleInfoForMatching {
                typing_used_in_matching: hla_typing.clone(),
                hla_typing,
                matching_p_groups: Vec::new(),
                matching_g_groups: Vec::new(),
            },
            (false, _) => AlleleInfoForMatching {
                matching_p_groups: self.p_groups.groups_of(&hla_typing),
                matching_g_groups: self.g_groups.groups_of(&hla_typing),
                typing_used_in_matching: hla_typing.clone(),
                hla_typing,
            },
        };

        Some(info)
    }
}

/// Produces [`SerologyInfoForMatching`] records from a snapshot
pub struct SerologyInfoGenerator<'a> {
    snapshot: &'a NomenclatureSnapshot,
    graph: &'a SerologyGraph,
}

impl<'a> SerologyInfoGenerator<'a> {
    pub fn new(snapshot: &'a NomenclatureSnapshot, graph: &'a SerologyGraph) -> Self {
        Self { snapshot, graph }
    }

    pub fn generate(&self) -> Vec<SerologyInfoForMatching> {
        self.snapshot
            .serologies
            .par_iter()
            .filter_map(|serology| self.info_for(serology))
            .collect()
    }

    fn info_for(&self, serology: &NomenclatureSerology) -> Option<SerologyInfoForMatching> {
        let locus = Locus::from_serology(&serology.typing_locus)?;
        let hla_typing = SerologyTyping::new(
            locus,
            &serology.name,
            self.graph.subtype_of(locus, &serology.name),
        )
        .deleted(serology.is_deleted);

        let identical = serology
            .identical_hla
            .as_deref()
            .map(str::trim)
            .filter(|identical| !identical.is_empty());
        let typing_used_in_matching = match identical {
            Some(identical) if serology.is_deleted => SerologyTyping::new(
                locus,
                identical,
                self.graph.subtype_of(locus, identical),
            ),
            _ => hla_typing.clone(),
        };

        Some(SerologyInfoForMatching {
            hla_typing,
            typing_used_in_matching,
        })
    }
}
