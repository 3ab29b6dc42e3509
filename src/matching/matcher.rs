//! Matched alleles and serologies for one nomenclature version.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::core::allele::AlleleTyping;
use crate::core::serology::{MatchingSerology, SerologyTyping};
use crate::core::snapshot::NomenclatureSnapshot;
use crate::core::typing::HlaTyping;
use crate::core::types::Locus;
use crate::matching::family::{SerologyFamilyResolver, SerologyGraph};
use crate::matching::info::{
    AlleleInfoForMatching, AlleleInfoGenerator, SerologyInfoForMatching, SerologyInfoGenerator,
};
use crate::matching::mapping::{
    AlleleToSerologyMapper, SerologyAssignments, SerologyToAlleleMapper,
};

/// Matching data for one allele of a nomenclature version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedAllele {
    pub hla_typing: AlleleTyping,
    pub typing_used_in_matching: AlleleTyping,
    pub matching_p_groups: Vec<String>,
    pub matching_g_groups: Vec<String>,
    pub matching_serologies: Vec<MatchingSerology>,
}

impl MatchedAllele {
    pub fn typing(&self) -> HlaTyping {
        HlaTyping::Allele(self.hla_typing.clone())
    }
}

/// Matching data for one serology of a nomenclature version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedSerology {
    pub hla_typing: SerologyTyping,
    pub typing_used_in_matching: SerologyTyping,
    pub matching_p_groups: Vec<String>,
    pub matching_g_groups: Vec<String>,
    pub matching_serologies: Vec<MatchingSerology>,
}

impl MatchedSerology {
    pub fn typing(&self) -> HlaTyping {
        HlaTyping::Serology(self.hla_typing.clone())
    }
}

/// Builds a [`MatchedAllele`] for every allele info
pub struct AlleleMatcher<'a> {
    mapper: AlleleToSerologyMapper<'a>,
}

impl<'a> AlleleMatcher<'a> {
    pub fn new(mapper: AlleleToSerologyMapper<'a>) -> Self {
        Self { mapper }
    }

    pub fn create_matched_alleles(&self, infos: &[AlleleInfoForMatching]) -> Vec<MatchedAllele> {
        infos
            .par_iter()
            .map(|info| MatchedAllele {
                hla_typing: info.hla_typing.clone(),
                typing_used_in_matching: info.typing_used_in_matching.clone(),
                matching_p_groups: info.matching_p_groups.clone(),
                matching_g_groups: info.matching_g_groups.clone(),
                matching_serologies: self.mapper.matching_serologies(info),
            })
            .collect()
    }
}

/// Builds a [`MatchedSerology`] for every serology info
pub struct SerologyMatcher<'a> {
    resolver: &'a SerologyFamilyResolver,
    alleles: SerologyToAlleleMapper<'a>,
}

impl<'a> SerologyMatcher<'a> {
    pub fn new(resolver: &'a SerologyFamilyResolver, alleles: SerologyToAlleleMapper<'a>) -> Self {
        Self { resolver, alleles }
    }

    pub fn create_matched_serologies(
        &self,
        infos: &[SerologyInfoForMatching],
    ) -> Vec<MatchedSerology> {
        infos
            .par_iter()
            .map(|info| self.matched_serology(info))
            .collect()
    }

    fn matched_serology(&self, info: &SerologyInfoForMatching) -> MatchedSerology {
        let used = &info.typing_used_in_matching;
        let matching_serologies = self.resolver.resolve(used);

        let names: Vec<&str> = matching_serologies
            .iter()
            .map(MatchingSerology::name)
            .collect();
        let matching_alleles = self.alleles.matching_alleles(used.locus, &names);

        let matching_p_groups: BTreeSet<String> = matching_alleles
            .iter()
            .flat_map(|allele| allele.matching_p_groups.iter().cloned())
            .collect();
        let matching_g_groups: BTreeSet<String> = matching_alleles
            .iter()
            .flat_map(|allele| allele.matching_g_groups.iter().cloned())
            .collect();

        MatchedSerology {
            hla_typing: info.hla_typing.clone(),
            typing_used_in_matching: used.clone(),
            matching_p_groups: matching_p_groups.into_iter().collect(),
            matching_g_groups: matching_g_groups.into_iter().collect(),
            matching_serologies,
        }
    }
}

/// Every matched typing of one nomenclature version
#[derive(Debug, Clone, Default)]
pub struct MatchedHlaSet {
    pub nomenclature_version: String,
    pub alleles: Vec<MatchedAllele>,
    pub serologies: Vec<MatchedSerology>,
}

impl MatchedHlaSet {
    pub fn allele(&self, locus: Locus, name: &str) -> Option<&MatchedAllele> {
        self.alleles
            .iter()
            .find(|m| m.hla_typing.locus == locus && m.hla_typing.name == name)
    }

    pub fn serology(&self, locus: Locus, name: &str) -> Option<&MatchedSerology> {
        self.serologies
            .iter()
            .find(|m| m.hla_typing.locus == locus && m.hla_typing.name == name)
    }
}

/// Runs the full matching pre-calculation for a snapshot
pub fn calculate_matched_hla(snapshot: &NomenclatureSnapshot) -> MatchedHlaSet {
    info!(
        "Pre-calculating matching data for nomenclature version {}",
        snapshot.version
    );

    let graph = SerologyGraph::new(&snapshot.serology_to_serology_relationships);
    let serology_infos = SerologyInfoGenerator::new(snapshot, &graph).generate();
    let resolver = SerologyFamilyResolver::new(
        graph.with_known_serologies(serology_infos.iter().map(|info| &info.hla_typing)),
    );

    let allele_infos = AlleleInfoGenerator::new(snapshot).generate();
    let assignments = SerologyAssignments::new(&snapshot.allele_to_serology_relationships);
    debug!(
        "Generated {} allele and {} serology matching inputs",
        allele_infos.len(),
        serology_infos.len()
    );

    let alleles = AlleleMatcher::new(AlleleToSerologyMapper::new(&assignments, &resolver))
        .create_matched_alleles(&allele_infos);
    let serologies = SerologyMatcher::new(
        &resolver,
        SerologyToAlleleMapper::new(&allele_infos, &assignments),
    )
    .create_matched_serologies(&serology_infos);

    info!(
        "Matched {} alleles and {} serologies",
        alleles.len(),
        serologies.len()
    );

    MatchedHlaSet {
        nomenclature_version: snapshot.version.clone(),
        alleles,
        serologies,
    }
}
