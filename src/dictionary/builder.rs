//! Dictionary builder.
//!
//! The `DictionaryBuilder` runs the matching pre-calculation for one
//! nomenclature snapshot and turns every matched typing into metadata rows.
//! A build either produces a complete [`PublishedDictionary`] or fails as a
//! whole; nothing is published for a failed build.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::core::snapshot::{NomenclatureSnapshot, NomenclatureSource, SnapshotError};
use crate::core::types::{Locus, TypingMethod};
use crate::dictionary::index::{build_allele_groups, build_allele_names, build_p_groups};
use crate::dictionary::store::{
    DictionaryData, DictionaryStore, PublishedDictionary, StoreError, DICTIONARY_FORMAT_VERSION,
};
use crate::dictionary::{HlaMetadataRow, RowKey};
use crate::matching::matcher::{calculate_matched_hla, MatchedAllele, MatchedHlaSet};
use crate::scoring::builder::{allele_scoring_info, serology_scoring_info, single_allele_info};
use crate::scoring::ScoringInfo;
use crate::utils::validation::validate_version;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to load nomenclature: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Invalid nomenclature version: {0}")]
    InvalidVersion(String),

    #[error("Nomenclature version {0} has no typings at matching loci")]
    NoTypings(String),

    #[error("Duplicate {method} typing {locus}*{name}")]
    DuplicateTyping {
        locus: Locus,
        method: TypingMethod,
        name: String,
    },

    #[error("Failed to publish dictionary: {0}")]
    Publish(#[from] StoreError),
}

/// Builds the complete dictionary for one nomenclature snapshot
pub struct DictionaryBuilder<'a> {
    snapshot: &'a NomenclatureSnapshot,
}

impl<'a> DictionaryBuilder<'a> {
    pub fn new(snapshot: &'a NomenclatureSnapshot) -> Self {
        Self { snapshot }
    }

    /// Run the pre-calculation and assemble every row and index
    ///
    /// # Errors
    ///
    /// Returns `BuildError::InvalidVersion` for an unusable version name,
    /// `BuildError::NoTypings` if nothing survives locus filtering, or
    /// `BuildError::DuplicateTyping` if the snapshot names a typing twice.
    pub fn build(&self) -> Result<PublishedDictionary, BuildError> {
        let version = &self.snapshot.version;
        validate_version(version).map_err(|e| BuildError::InvalidVersion(e.to_string()))?;

        let matched = calculate_matched_hla(self.snapshot);
        if matched.alleles.is_empty() && matched.serologies.is_empty() {
            return Err(BuildError::NoTypings(version.clone()));
        }
        check_unique_typings(&matched)?;

        let rows = build_rows(&matched);
        let allele_names = build_allele_names(self.snapshot, &matched);
        let allele_groups = build_allele_groups(self.snapshot, &matched);
        let p_groups = build_p_groups(&matched);

        info!(
            "Built dictionary for version {}: {} rows, {} allele names, {} groups",
            version,
            rows.len(),
            allele_names.len(),
            allele_groups.len()
        );

        Ok(PublishedDictionary::from_data(DictionaryData {
            format_version: DICTIONARY_FORMAT_VERSION.to_string(),
            nomenclature_version: version.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            rows,
            allele_names,
            allele_groups,
            p_groups,
        }))
    }
}

fn check_unique_typings(matched: &MatchedHlaSet) -> Result<(), BuildError> {
    let mut seen: HashSet<RowKey> = HashSet::new();

    let alleles = matched
        .alleles
        .iter()
        .map(|a| (a.hla_typing.locus, TypingMethod::Molecular, a.hla_typing.name.clone()));
    let serologies = matched
        .serologies
        .iter()
        .map(|s| (s.hla_typing.locus, TypingMethod::Serology, s.hla_typing.name.clone()));

    for key in alleles.chain(serologies) {
        if !seen.insert(key.clone()) {
            let (locus, method, name) = key;
            return Err(BuildError::DuplicateTyping {
                locus,
                method,
                name,
            });
        }
    }
    Ok(())
}

/// One row per allele full name, per unclaimed name variant and per serology
fn build_rows(matched: &MatchedHlaSet) -> Vec<HlaMetadataRow> {
    let mut rows: BTreeMap<RowKey, HlaMetadataRow> = matched
        .alleles
        .par_iter()
        .map(|allele| {
            HlaMetadataRow::for_typing(
                &allele.typing(),
                ScoringInfo::SingleAllele(single_allele_info(allele)),
            )
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|row| (row.key(), row))
        .collect();
    let full_names = rows.len();

    // Variants are served by every current allele that shares them; a full
    // allele name always wins over a variant spelled the same way
    let mut variants: BTreeMap<(Locus, String), Vec<&MatchedAllele>> = BTreeMap::new();
    for allele in matched.alleles.iter().filter(|a| !a.hla_typing.is_deleted) {
        for variant in allele.hla_typing.name_variants() {
            variants
                .entry((allele.hla_typing.locus, variant.clone()))
                .or_default()
                .push(allele);
        }
    }
    variants.retain(|(locus, name), _| {
        !rows.contains_key(&(*locus, TypingMethod::Molecular, name.clone()))
    });

    let variant_rows: Vec<HlaMetadataRow> = variants
        .into_par_iter()
        .filter_map(|((locus, name), mut alleles)| {
            alleles.sort_by(|a, b| a.hla_typing.name.cmp(&b.hla_typing.name));
            allele_scoring_info(&alleles)
                .map(|info| HlaMetadataRow::new(locus, name, TypingMethod::Molecular, info))
        })
        .collect();
    let variant_count = variant_rows.len();
    rows.extend(variant_rows.into_iter().map(|row| (row.key(), row)));

    let serology_rows: Vec<HlaMetadataRow> = matched
        .serologies
        .par_iter()
        .map(|serology| {
            HlaMetadataRow::for_typing(&serology.typing(), serology_scoring_info(serology))
        })
        .collect();
    let serology_count = serology_rows.len();
    rows.extend(serology_rows.into_iter().map(|row| (row.key(), row)));

    debug!(
        "Rows: {} allele names, {} name variants, {} serologies",
        full_names, variant_count, serology_count
    );

    rows.into_values().collect()
}

/// Build the dictionary for `version` and publish it to `store`.
///
/// Any failure aborts the rebuild for that version; the error is logged and
/// returned, and the store keeps whatever it held before.
///
/// # Errors
///
/// Returns the `BuildError` that stopped the build or the publish.
pub fn rebuild(
    source: &dyn NomenclatureSource,
    store: &dyn DictionaryStore,
    version: &str,
) -> Result<Arc<PublishedDictionary>, BuildError> {
    let result = validate_version(version)
        .map_err(|e| BuildError::InvalidVersion(e.to_string()))
        .and_then(|()| Ok(source.get(version)?))
        .and_then(|snapshot| DictionaryBuilder::new(&snapshot).build())
        .and_then(|dictionary| Ok(store.publish(dictionary)?));

    if let Err(e) = &result {
        error!("Dictionary rebuild for version {} failed: {}", version, e);
    }
    result
}
