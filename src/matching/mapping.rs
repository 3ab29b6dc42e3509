//! Bidirectional allele <-> serology mapping.

use std::collections::{BTreeSet, HashMap};

use crate::core::allele::{strip_locus_prefix, AlleleTyping};
use crate::core::serology::{merge_matching_serologies, MatchingSerology};
use crate::core::snapshot::{AlleleToSerologyRelationship, SerologyAssignment};
use crate::core::types::Locus;
use crate::matching::family::SerologyFamilyResolver;
use crate::matching::info::AlleleInfoForMatching;
use crate::matching::TypingKey;

/// Assigned serologies per allele, ordered by assignment precedence
#[derive(Debug, Default)]
pub struct SerologyAssignments {
    by_allele: HashMap<TypingKey, Vec<SerologyAssignment>>,
}

impl SerologyAssignments {
    pub fn new(relationships: &[AlleleToSerologyRelationship]) -> Self {
        let mut by_allele: HashMap<TypingKey, Vec<SerologyAssignment>> = HashMap::new();
        for relationship in relationships {
            let Some(locus) = Locus::from_molecular(&relationship.typing_locus) else {
                continue;
            };
            by_allele
                .entry((locus, strip_locus_prefix(&relationship.allele_name).to_string()))
                .or_default()
                .extend(relationship.serology_assignments.iter().cloned());
        }

        // Stable sort keeps declaration order among equal assignments
        for assignments in by_allele.values_mut() {
            assignments.sort_by_key(|a| a.assignment.precedence());
        }

        Self { by_allele }
    }

    pub fn of(&self, allele: &AlleleTyping) -> &[SerologyAssignment] {
        self.by_allele
            .get(&(allele.locus, allele.name.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Resolves the matching serologies of an allele
pub struct AlleleToSerologyMapper<'a> {
    assignments: &'a SerologyAssignments,
    resolver: &'a SerologyFamilyResolver,
}

impl<'a> AlleleToSerologyMapper<'a> {
    pub fn new(assignments: &'a SerologyAssignments, resolver: &'a SerologyFamilyResolver) -> Self {
        Self {
            assignments,
            resolver,
        }
    }

    /// Union of the families of every serology assigned to the allele used in
    /// matching. Null expressers never match a serology.
    pub fn matching_serologies(&self, info: &AlleleInfoForMatching) -> Vec<MatchingSerology> {
        let used = &info.typing_used_in_matching;
        if info.hla_typing.is_null_expresser() || used.is_null_expresser() {
            return Vec::new();
        }

        let mut matching = Vec::new();
        for assignment in self.assignments.of(used) {
            if let Some(family) = self.resolver.resolve_name(used.locus, &assignment.name) {
                merge_matching_serologies(&mut matching, &family);
            }
        }
        matching
    }
}

/// Finds the alleles that match a serology
pub struct SerologyToAlleleMapper<'a> {
    alleles: &'a [AlleleInfoForMatching],
    /// Assigned serology -> indices into `alleles`
    alleles_by_serology: HashMap<TypingKey, Vec<usize>>,
}

impl<'a> SerologyToAlleleMapper<'a> {
    pub fn new(alleles: &'a [AlleleInfoForMatching], assignments: &SerologyAssignments) -> Self {
        let mut alleles_by_serology: HashMap<TypingKey, Vec<usize>> = HashMap::new();
        for (index, info) in alleles.iter().enumerate() {
            let used = &info.typing_used_in_matching;
            if info.hla_typing.is_null_expresser() || used.is_null_expresser() {
                continue;
            }
            for assignment in assignments.of(used) {
                let indices = alleles_by_serology
                    .entry((used.locus, assignment.name.clone()))
                    .or_default();
                if indices.last() != Some(&index) {
                    indices.push(index);
                }
            }
        }

        Self {
            alleles,
            alleles_by_serology,
        }
    }

    /// Alleles whose assigned serologies intersect `serology_names`, in
    /// snapshot order
    pub fn matching_alleles(
        &self,
        locus: Locus,
        serology_names: &[&str],
    ) -> Vec<&'a AlleleInfoForMatching> {
        let indices: BTreeSet<usize> = serology_names
            .iter()
            .filter_map(|name| self.alleles_by_serology.get(&(locus, (*name).to_string())))
            .flatten()
            .copied()
            .collect();

        indices.into_iter().map(|index| &self.alleles[index]).collect()
    }
}
