//! Services the lookup strategies expand typings through.
//!
//! Each trait has a default implementation: code expansion reads a MAC
//! table, the others read the published dictionaries.

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::core::allele::{strip_locus_prefix, FIELD_DELIMITER};
use crate::core::types::Locus;
use crate::dictionary::store::{DictionaryStore, StoreError};
use crate::lookup::categorise::ALLELE_STRING_DELIMITER;
use crate::parsing::mac::MacDictionary;
use crate::utils::validation::check_allele_string_limit;

#[derive(Error, Debug)]
pub enum ExpansionError {
    #[error("Unknown NMDP code: {0}")]
    UnknownCode(String),

    #[error("Unknown allele group {locus}*{name}")]
    UnknownGroup { locus: Locus, name: String },

    #[error("Invalid allele string: {0}")]
    InvalidAlleleString(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Expands NMDP multiple allele codes
pub trait CodeExpansionService: Send + Sync {
    fn expand(&self, code: &str) -> Result<BTreeSet<String>, ExpansionError>;
}

/// Expands P-groups, G-groups and XX codes to their member alleles
pub trait GroupExpansionService: Send + Sync {
    fn expand(
        &self,
        locus: Locus,
        group: &str,
        version: &str,
    ) -> Result<BTreeSet<String>, ExpansionError>;
}

/// Splits an allele string into allele names
pub trait AlleleStringSplitter: Send + Sync {
    fn split(&self, allele_string: &str) -> Result<Vec<String>, ExpansionError>;
}

/// Maps an allele name to the names it carries in a given version
pub trait CurrentNameResolver: Send + Sync {
    fn resolve(
        &self,
        locus: Locus,
        name: &str,
        version: &str,
    ) -> Result<BTreeSet<String>, ExpansionError>;
}

impl CodeExpansionService for MacDictionary {
    fn expand(&self, code: &str) -> Result<BTreeSet<String>, ExpansionError> {
        MacDictionary::expand(self, code)
            .map(|alleles| alleles.into_iter().collect())
            .ok_or_else(|| ExpansionError::UnknownCode(code.to_string()))
    }
}

/// Group expansion backed by the allele-groups index of each dictionary
pub struct DictionaryGroupExpansion {
    store: Arc<dyn DictionaryStore>,
}

impl DictionaryGroupExpansion {
    pub fn new(store: Arc<dyn DictionaryStore>) -> Self {
        Self { store }
    }
}

impl GroupExpansionService for DictionaryGroupExpansion {
    fn expand(
        &self,
        locus: Locus,
        group: &str,
        version: &str,
    ) -> Result<BTreeSet<String>, ExpansionError> {
        let dictionary = self.store.dictionary(version)?;
        let name = normalise_group_name(strip_locus_prefix(group));

        dictionary
            .group(locus, &name)
            .map(|group| group.alleles.iter().cloned().collect())
            .ok_or(ExpansionError::UnknownGroup { locus, name })
    }
}

/// Group names are stored with upper case suffixes (`01:01P`, `01:XX`)
fn normalise_group_name(name: &str) -> String {
    name.to_uppercase()
}

/// Splits `/`-separated allele strings.
///
/// Strings of names (`01:01/02:01`) split as written. Strings of subtypes
/// (`01:01/02/03`) take the first field of the leading name for every part
/// without one, giving `01:01`, `01:02`, `01:03`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlashAlleleStringSplitter;

impl AlleleStringSplitter for SlashAlleleStringSplitter {
    fn split(&self, allele_string: &str) -> Result<Vec<String>, ExpansionError> {
        let parts: Vec<&str> = allele_string
            .split(ALLELE_STRING_DELIMITER)
            .map(|part| strip_locus_prefix(part.trim()))
            .collect();

        if let Some(message) = check_allele_string_limit(parts.len()) {
            return Err(ExpansionError::InvalidAlleleString(message));
        }
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ExpansionError::InvalidAlleleString(allele_string.to_string()));
        }

        let first_field = parts[0]
            .split_once(FIELD_DELIMITER)
            .map(|(first, _)| first)
            .ok_or_else(|| ExpansionError::InvalidAlleleString(allele_string.to_string()))?;

        let mut names: Vec<String> = Vec::with_capacity(parts.len());
        for part in parts {
            let name = if part.contains(FIELD_DELIMITER) {
                part.to_string()
            } else {
                format!("{first_field}{FIELD_DELIMITER}{part}")
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Current-name resolution backed by the allele-names index of each dictionary
pub struct DictionaryCurrentNameResolver {
    store: Arc<dyn DictionaryStore>,
}

impl DictionaryCurrentNameResolver {
    pub fn new(store: Arc<dyn DictionaryStore>) -> Self {
        Self { store }
    }
}

impl CurrentNameResolver for DictionaryCurrentNameResolver {
    fn resolve(
        &self,
        locus: Locus,
        name: &str,
        version: &str,
    ) -> Result<BTreeSet<String>, ExpansionError> {
        let dictionary = self.store.dictionary(version)?;
        Ok(dictionary
            .current_names(locus, strip_locus_prefix(name))
            .iter()
            .cloned()
            .collect())
    }
}
