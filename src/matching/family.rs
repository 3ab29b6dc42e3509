//! Serology family resolution.
//!
//! Serologies are related through the WMDA broad/split/associated table. The
//! matching serologies of a serology depend on its subtype, and each subtype
//! has its own calculator. The walk follows the relationship data exactly,
//! including historical oddities such as an associated antigen hanging off a
//! broad rather than a split.

use std::collections::HashMap;

use crate::core::serology::{MatchingSerology, SerologyTyping};
use crate::core::snapshot::SerologyToSerologyRelationship;
use crate::core::types::{Locus, SerologySubtype};
use crate::matching::TypingKey;

/// Indexed view of the serology to serology relationship table
#[derive(Debug, Default)]
pub struct SerologyGraph {
    /// Broad -> splits, in declaration order
    splits_of: HashMap<TypingKey, Vec<String>>,
    /// Split -> defining broad
    broad_of: HashMap<TypingKey, String>,
    /// Entity -> serologies associated to it, in declaration order
    associated_of: HashMap<TypingKey, Vec<String>>,
    /// Associated serology -> the entity it is associated to
    associated_to: HashMap<TypingKey, String>,
    /// Serologies known to the nomenclature, with deletion status
    known: HashMap<TypingKey, bool>,
}

impl SerologyGraph {
    /// Index relationships at matching loci; other loci are ignored
    pub fn new(relationships: &[SerologyToSerologyRelationship]) -> Self {
        let mut graph = Self::default();

        for relationship in relationships {
            let Some(locus) = Locus::from_serology(&relationship.typing_locus) else {
                continue;
            };

            if !relationship.split_antigens.is_empty() {
                graph
                    .splits_of
                    .entry((locus, relationship.name.clone()))
                    .or_default()
                    .extend(relationship.split_antigens.iter().cloned());
                for split in &relationship.split_antigens {
                    graph
                        .broad_of
                        .insert((locus, split.clone()), relationship.name.clone());
                }
            }

            if !relationship.associated_antigens.is_empty() {
                graph
                    .associated_of
                    .entry((locus, relationship.name.clone()))
                    .or_default()
                    .extend(relationship.associated_antigens.iter().cloned());
                for associated in &relationship.associated_antigens {
                    graph
                        .associated_to
                        .insert((locus, associated.clone()), relationship.name.clone());
                }
            }
        }

        graph
    }

    /// Register the serologies that exist in the nomenclature
    #[must_use]
    pub fn with_known_serologies<'a>(
        mut self,
        serologies: impl IntoIterator<Item = &'a SerologyTyping>,
    ) -> Self {
        for serology in serologies {
            self.known
                .insert((serology.locus, serology.name.clone()), serology.is_deleted);
        }
        self
    }

    /// Subtype as implied by the relationship table
    pub fn subtype_of(&self, locus: Locus, name: &str) -> SerologySubtype {
        let key = (locus, name.to_string());
        if self.broad_of.contains_key(&key) {
            SerologySubtype::Split
        } else if self.splits_of.contains_key(&key) {
            SerologySubtype::Broad
        } else if self.associated_to.contains_key(&key) {
            SerologySubtype::Associated
        } else {
            SerologySubtype::NotSplit
        }
    }

    pub fn is_known(&self, locus: Locus, name: &str) -> bool {
        self.known.contains_key(&(locus, name.to_string()))
    }

    /// Build a typing for a related serology name
    pub fn typing(&self, locus: Locus, name: &str) -> SerologyTyping {
        let is_deleted = self
            .known
            .get(&(locus, name.to_string()))
            .copied()
            .unwrap_or(false);
        SerologyTyping::new(locus, name, self.subtype_of(locus, name)).deleted(is_deleted)
    }

    fn splits(&self, serology: &SerologyTyping) -> &[String] {
        self.splits_of
            .get(&(serology.locus, serology.name.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn broad(&self, serology: &SerologyTyping) -> Option<&str> {
        self.broad_of
            .get(&(serology.locus, serology.name.clone()))
            .map(String::as_str)
    }

    fn associated(&self, locus: Locus, name: &str) -> &[String] {
        self.associated_of
            .get(&(locus, name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn associated_parent(&self, serology: &SerologyTyping) -> Option<&str> {
        self.associated_to
            .get(&(serology.locus, serology.name.clone()))
            .map(String::as_str)
    }
}

/// Computes the matching serologies for one serology subtype
pub trait MatchingSerologyCalculator: Send + Sync {
    fn matching_serologies(
        &self,
        graph: &SerologyGraph,
        serology: &SerologyTyping,
    ) -> Vec<MatchingSerology>;
}

/// Self, then anything associated to it
struct NotSplitCalculator;

/// Self, then the defining broad; sibling splits are excluded
struct SplitCalculator;

/// Self, splits, then anything associated to self or a split
struct BroadCalculator;

/// Self, then the family of the entity it is associated to
struct AssociatedCalculator;

impl MatchingSerologyCalculator for NotSplitCalculator {
    fn matching_serologies(
        &self,
        graph: &SerologyGraph,
        serology: &SerologyTyping,
    ) -> Vec<MatchingSerology> {
        let mut family = vec![MatchingSerology::expected(serology.clone())];
        family.extend(
            graph
                .associated(serology.locus, &serology.name)
                .iter()
                .map(|name| MatchingSerology::expected(graph.typing(serology.locus, name))),
        );
        family
    }
}

impl MatchingSerologyCalculator for SplitCalculator {
    fn matching_serologies(
        &self,
        graph: &SerologyGraph,
        serology: &SerologyTyping,
    ) -> Vec<MatchingSerology> {
        let mut family = vec![MatchingSerology::expected(serology.clone())];
        if let Some(broad) = graph.broad(serology) {
            family.push(MatchingSerology::expected(
                graph.typing(serology.locus, broad),
            ));
        }
        family
    }
}

impl MatchingSerologyCalculator for BroadCalculator {
    fn matching_serologies(
        &self,
        graph: &SerologyGraph,
        serology: &SerologyTyping,
    ) -> Vec<MatchingSerology> {
        let locus = serology.locus;
        let splits = graph.splits(serology);

        let mut family = vec![MatchingSerology::expected(serology.clone())];
        family.extend(
            splits
                .iter()
                .map(|split| MatchingSerology::expected(graph.typing(locus, split))),
        );

        let associated = std::iter::once(serology.name.as_str())
            .chain(splits.iter().map(String::as_str))
            .flat_map(|name| graph.associated(locus, name));
        for name in associated {
            if !family.iter().any(|m| m.name() == name.as_str()) {
                family.push(MatchingSerology::expected(graph.typing(locus, name)));
            }
        }

        family
    }
}

impl MatchingSerologyCalculator for AssociatedCalculator {
    fn matching_serologies(
        &self,
        graph: &SerologyGraph,
        serology: &SerologyTyping,
    ) -> Vec<MatchingSerology> {
        let mut family = vec![MatchingSerology::expected(serology.clone())];
        let Some(parent_name) = graph.associated_parent(serology) else {
            return family;
        };

        let parent = graph.typing(serology.locus, parent_name);
        let parent_broad = graph.broad(&parent).map(str::to_string);

        // An associated parent would loop back here; treat it as not split.
        let parent_family = match parent.subtype {
            SerologySubtype::Associated => NotSplitCalculator.matching_serologies(graph, &parent),
            subtype => calculator_for(subtype).matching_serologies(graph, &parent),
        };

        for entry in parent_family {
            if entry.serology.name == serology.name {
                continue;
            }
            let direct = entry.serology.name == parent.name
                || parent_broad.as_deref() == Some(entry.serology.name.as_str());
            family.push(MatchingSerology::new(
                entry.serology,
                entry.is_unexpected || !direct,
            ));
        }

        family
    }
}

/// Pick the family calculator for a serology subtype
pub fn calculator_for(subtype: SerologySubtype) -> &'static dyn MatchingSerologyCalculator {
    match subtype {
        SerologySubtype::NotSplit => &NotSplitCalculator,
        SerologySubtype::Split => &SplitCalculator,
        SerologySubtype::Broad => &BroadCalculator,
        SerologySubtype::Associated => &AssociatedCalculator,
    }
}

/// Resolves the ordered matching serologies of any serology
#[derive(Debug)]
pub struct SerologyFamilyResolver {
    graph: SerologyGraph,
}

impl SerologyFamilyResolver {
    pub fn new(graph: SerologyGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &SerologyGraph {
        &self.graph
    }

    /// Matching serologies of a serology typing: self first, then broad,
    /// then splits, then associated antigens
    pub fn resolve(&self, serology: &SerologyTyping) -> Vec<MatchingSerology> {
        calculator_for(serology.subtype).matching_serologies(&self.graph, serology)
    }

    /// Resolve by name; `None` if the serology is not in the nomenclature
    pub fn resolve_name(&self, locus: Locus, name: &str) -> Option<Vec<MatchingSerology>> {
        if !self.graph.is_known(locus, name) {
            return None;
        }
        Some(self.resolve(&self.graph.typing(locus, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::NomenclatureSnapshot;

    fn resolver() -> SerologyFamilyResolver {
        let snapshot = NomenclatureSnapshot::from_json(include_str!(
            "../../tests/data/snapshot_3400.json"
        ))
        .unwrap();
        let graph = SerologyGraph::new(&snapshot.serology_to_serology_relationships);
        let known: Vec<SerologyTyping> = snapshot
            .serologies
            .iter()
            .filter_map(|s| {
                let locus = Locus::from_serology(&s.typing_locus)?;
                Some(graph.typing(locus, &s.name))
            })
            .collect();
        SerologyFamilyResolver::new(graph.with_known_serologies(&known))
    }

    fn describe(family: &[MatchingSerology]) -> Vec<(String, SerologySubtype, bool)> {
        family
            .iter()
            .map(|m| (m.serology.name.clone(), m.serology.subtype, m.is_unexpected))
            .collect()
    }

    fn names(family: &[MatchingSerology]) -> Vec<&str> {
        family.iter().map(MatchingSerology::name).collect()
    }

    #[test]
    fn test_subtypes_from_relationships() {
        let resolver = resolver();
        let graph = resolver.graph();
        assert_eq!(graph.subtype_of(Locus::B, "15"), SerologySubtype::Broad);
        assert_eq!(graph.subtype_of(Locus::B, "62"), SerologySubtype::Split);
        assert_eq!(graph.subtype_of(Locus::B, "3901"), SerologySubtype::Associated);
        assert_eq!(graph.subtype_of(Locus::A, "11"), SerologySubtype::NotSplit);
        // A split that also has associated antigens is still a split
        assert_eq!(graph.subtype_of(Locus::B, "39"), SerologySubtype::Split);
    }

    #[test]
    fn test_broad_family_lists_splits_in_order() {
        let resolver = resolver();
        let family = resolver.resolve_name(Locus::B, "15").unwrap();
        assert_eq!(
            describe(&family),
            vec![
                ("15".to_string(), SerologySubtype::Broad, false),
                ("62".to_string(), SerologySubtype::Split, false),
                ("63".to_string(), SerologySubtype::Split, false),
                ("75".to_string(), SerologySubtype::Split, false),
                ("76".to_string(), SerologySubtype::Split, false),
                ("77".to_string(), SerologySubtype::Split, false),
            ]
        );
    }

    #[test]
    fn test_split_family_excludes_siblings() {
        let resolver = resolver();
        let family = resolver.resolve_name(Locus::B, "62").unwrap();
        assert_eq!(
            describe(&family),
            vec![
                ("62".to_string(), SerologySubtype::Split, false),
                ("15".to_string(), SerologySubtype::Broad, false),
            ]
        );
    }

    #[test]
    fn test_broad_family_includes_associated_of_splits() {
        let resolver = resolver();
        let family = resolver.resolve_name(Locus::B, "16").unwrap();
        assert_eq!(names(&family), vec!["16", "38", "39", "3901", "3902"]);

        let family = resolver.resolve_name(Locus::B, "21").unwrap();
        assert_eq!(names(&family), vec!["21", "49", "50", "4005"]);
    }

    #[test]
    fn test_associated_to_split() {
        let resolver = resolver();
        let family = resolver.resolve_name(Locus::B, "3901").unwrap();
        assert_eq!(
            describe(&family),
            vec![
                ("3901".to_string(), SerologySubtype::Associated, false),
                ("39".to_string(), SerologySubtype::Split, false),
                ("16".to_string(), SerologySubtype::Broad, false),
            ]
        );
    }

    #[test]
    fn test_associated_to_broad_flags_splits_unexpected() {
        let resolver = resolver();
        let family = resolver.resolve_name(Locus::B, "4005").unwrap();
        assert_eq!(
            describe(&family),
            vec![
                ("4005".to_string(), SerologySubtype::Associated, false),
                ("21".to_string(), SerologySubtype::Broad, false),
                ("49".to_string(), SerologySubtype::Split, true),
                ("50".to_string(), SerologySubtype::Split, true),
            ]
        );
    }

    #[test]
    fn test_not_split_with_no_relationships() {
        let resolver = resolver();
        let family = resolver.resolve_name(Locus::A, "11").unwrap();
        assert_eq!(
            describe(&family),
            vec![("11".to_string(), SerologySubtype::NotSplit, false)]
        );
    }

    #[test]
    fn test_unknown_serology_resolves_to_none() {
        let resolver = resolver();
        assert!(resolver.resolve_name(Locus::A, "8000").is_none());
    }

    #[test]
    fn test_serology_loci_do_not_leak() {
        let resolver = resolver();
        // DR15 is a split of DR2; B15 is a broad. Same name, different locus.
        let family = resolver.resolve_name(Locus::Drb1, "15").unwrap();
        assert_eq!(names(&family), vec!["15", "2"]);
    }
}
