use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::core::allele::{strip_locus_prefix, AlleleTyping};
use crate::core::types::{HlaTypingCategory, Locus, TargetHlaCategory};
use crate::dictionary::store::DictionaryStore;
use crate::dictionary::HlaMetadataRow;
use crate::lookup::categorise::categorise;
use crate::lookup::collaborators::{
    CodeExpansionService, DictionaryCurrentNameResolver, DictionaryGroupExpansion,
    SlashAlleleStringSplitter,
};
use crate::lookup::dispatcher::{LookupContext, LookupDispatcher, LookupError, LookupRequest};
use crate::parsing::mac::{parse_mac_file, MacDictionary, MacParseError};
use crate::scoring::builder::combine_for_category;
use crate::scoring::ScoringInfo;
use crate::utils::validation::{validate_lookup_name, validate_version};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to load MAC file: {0}")]
    MacError(#[from] MacParseError),
}

/// Lookup service settings, loadable from JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Version used when a caller does not name one; latest published if unset
    #[serde(default)]
    pub default_version: Option<String>,

    /// MAC table for NMDP code expansion
    #[serde(default)]
    pub mac_file: Option<PathBuf>,
}

impl LookupConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the configured MAC table, or an empty one
    pub fn load_mac_dictionary(&self) -> Result<MacDictionary, ConfigError> {
        match &self.mac_file {
            Some(path) => {
                let macs = parse_mac_file(path)?;
                info!("Loaded {} MAC codes from {}", macs.len(), path.display());
                Ok(macs)
            }
            None => Ok(MacDictionary::new()),
        }
    }
}

/// Rows resolved for one lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub category: HlaTypingCategory,
    pub locus: Locus,
    pub lookup_name: String,
    pub nomenclature_version: String,
    pub rows: Vec<HlaMetadataRow>,
}

impl LookupResult {
    /// One scoring info covering every row
    pub fn scoring_info(&self) -> Result<ScoringInfo, LookupError> {
        let infos: Vec<ScoringInfo> = self
            .rows
            .iter()
            .map(|row| row.scoring_info.clone())
            .collect();
        combine_for_category(self.category, &infos).ok_or_else(|| LookupError::NotFound {
            locus: self.locus,
            name: self.lookup_name.clone(),
        })
    }
}

/// Public lookup surface over the published dictionaries
pub struct HlaMetadataService {
    store: Arc<dyn DictionaryStore>,
    dispatcher: LookupDispatcher,
    config: LookupConfig,
}

impl HlaMetadataService {
    /// Wire the default collaborators around `store`
    pub fn new(
        store: Arc<dyn DictionaryStore>,
        codes: Arc<dyn CodeExpansionService>,
        config: LookupConfig,
    ) -> Self {
        let context = LookupContext::new(
            Arc::clone(&store),
            codes,
            Arc::new(DictionaryGroupExpansion::new(Arc::clone(&store))),
            Arc::new(SlashAlleleStringSplitter),
            Arc::new(DictionaryCurrentNameResolver::new(Arc::clone(&store))),
        );
        Self::with_dispatcher(store, LookupDispatcher::new(context), config)
    }

    pub fn with_dispatcher(
        store: Arc<dyn DictionaryStore>,
        dispatcher: LookupDispatcher,
        config: LookupConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Published versions, oldest first
    pub fn versions(&self) -> Vec<String> {
        self.store.versions()
    }

    /// The requested version, else the configured default, else the latest
    ///
    /// # Errors
    ///
    /// Returns `LookupError::VersionNotFound` if nothing has been published
    /// or the version name is invalid.
    pub fn resolve_version(&self, version: Option<&str>) -> Result<String, LookupError> {
        let version = version
            .map(str::to_string)
            .or_else(|| self.config.default_version.clone())
            .or_else(|| self.store.latest_version())
            .ok_or_else(|| LookupError::VersionNotFound("latest".to_string()))?;

        validate_version(&version).map_err(|_| LookupError::VersionNotFound(version.clone()))?;
        Ok(version)
    }

    /// Resolve `name` as a typing of the given category
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidTyping` for malformed input and the
    /// dispatcher's errors otherwise.
    pub fn lookup(
        &self,
        category: HlaTypingCategory,
        locus: Locus,
        name: &str,
        version: &str,
    ) -> Result<LookupResult, LookupError> {
        let name =
            validate_lookup_name(name).map_err(|e| LookupError::InvalidTyping(e.to_string()))?;
        let lookup_name = if category == HlaTypingCategory::AlleleStringOfNames
            || category == HlaTypingCategory::AlleleStringOfSubtypes
        {
            name
        } else {
            strip_locus_prefix(name)
        };

        let rows = self.dispatcher.lookup(&LookupRequest {
            category,
            locus,
            lookup_name,
            version,
        })?;

        Ok(LookupResult {
            category,
            locus,
            lookup_name: lookup_name.to_string(),
            nomenclature_version: version.to_string(),
            rows,
        })
    }

    /// Categorise `name` and resolve it
    pub fn lookup_typing(
        &self,
        locus: Locus,
        name: &str,
        version: &str,
    ) -> Result<LookupResult, LookupError> {
        let category = self.categorise(name)?;
        self.lookup(category, locus, name, version)
    }

    /// Scoring info for a typing, consolidated over every row it resolves to
    pub fn scoring_info(
        &self,
        locus: Locus,
        name: &str,
        version: &str,
    ) -> Result<ScoringInfo, LookupError> {
        self.lookup_typing(locus, name, version)?.scoring_info()
    }

    /// Express a typing in another resolution
    ///
    /// # Errors
    ///
    /// Two-field allele targets need per-allele detail and fail with
    /// `LookupError::UnsupportedOperation` for serology typings.
    pub fn convert(
        &self,
        locus: Locus,
        name: &str,
        target: TargetHlaCategory,
        version: &str,
    ) -> Result<Vec<String>, LookupError> {
        let result = self.lookup_typing(locus, name, version)?;

        let converted = match target {
            TargetHlaCategory::PGroup => result.scoring_info()?.matching_p_groups(),
            TargetHlaCategory::GGroup => result.scoring_info()?.matching_g_groups(),
            TargetHlaCategory::Serology => result
                .scoring_info()?
                .matching_serologies()
                .iter()
                .map(|serology| serology.name.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            TargetHlaCategory::TwoFieldAlleleIncludingExpressionSuffix
            | TargetHlaCategory::TwoFieldAlleleExcludingExpressionSuffix => {
                let mut names = BTreeSet::new();
                for row in &result.rows {
                    for allele in row.scoring_info.expand_to_single_alleles()? {
                        let typing = AlleleTyping::new(locus, allele.allele_name);
                        let two_field = match target {
                            TargetHlaCategory::TwoFieldAlleleIncludingExpressionSuffix => {
                                typing.two_field_name_including_suffix()
                            }
                            _ => typing.two_field_name_excluding_suffix(),
                        };
                        names.insert(two_field.to_string());
                    }
                }
                names.into_iter().collect()
            }
        };

        Ok(converted)
    }

    /// Every P-group of a version
    pub fn get_all_p_groups(&self, version: &str) -> Result<BTreeSet<String>, LookupError> {
        Ok(self.store.dictionary(version)?.all_p_groups().clone())
    }

    /// Classify a typing string
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidTyping` if the string is not a known form.
    pub fn categorise(&self, name: &str) -> Result<HlaTypingCategory, LookupError> {
        let name =
            validate_lookup_name(name).map_err(|e| LookupError::InvalidTyping(e.to_string()))?;
        categorise(name).ok_or_else(|| LookupError::InvalidTyping(name.to_string()))
    }
}
