use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::types::{Locus, TypingMethod};
use crate::dictionary::index::{AlleleGroupEntry, AlleleNameEntry, GroupKind};
use crate::dictionary::{HlaMetadataRow, RowKey};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Nomenclature version {0} has not been published")]
    VersionNotFound(String),

    #[error("Failed to read dictionary: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse dictionary: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Dictionary file format version for compatibility checking
pub const DICTIONARY_FORMAT_VERSION: &str = "1.0.0";

/// Serializable dictionary format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryData {
    pub format_version: String,
    pub nomenclature_version: String,
    pub created_at: String,
    pub rows: Vec<HlaMetadataRow>,
    #[serde(default)]
    pub allele_names: Vec<AlleleNameEntry>,
    #[serde(default)]
    pub allele_groups: Vec<AlleleGroupEntry>,
    #[serde(default)]
    pub p_groups: Vec<String>,
}

/// A complete, read-only dictionary for one nomenclature version
#[derive(Debug)]
pub struct PublishedDictionary {
    pub nomenclature_version: String,
    pub created_at: String,

    rows: Vec<HlaMetadataRow>,
    allele_names: Vec<AlleleNameEntry>,
    allele_groups: Vec<AlleleGroupEntry>,
    p_groups: BTreeSet<String>,

    /// Index: (locus, method, lookup name) -> index in rows
    row_index: HashMap<RowKey, usize>,

    /// Index: (locus, lookup name) -> index in allele_names
    name_index: HashMap<(Locus, String), usize>,

    /// Index: (locus, group name) -> index in allele_groups
    group_index: HashMap<(Locus, String), usize>,
}

impl PublishedDictionary {
    /// Build the lookup indexes over serialized dictionary data
    pub fn from_data(data: DictionaryData) -> Self {
        let row_index = data
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.key(), idx))
            .collect();
        let name_index = data
            .allele_names
            .iter()
            .enumerate()
            .map(|(idx, entry)| ((entry.locus, entry.lookup_name.clone()), idx))
            .collect();
        let group_index = data
            .allele_groups
            .iter()
            .enumerate()
            .map(|(idx, group)| ((group.locus, group.name.clone()), idx))
            .collect();

        Self {
            nomenclature_version: data.nomenclature_version,
            created_at: data.created_at,
            rows: data.rows,
            allele_names: data.allele_names,
            allele_groups: data.allele_groups,
            p_groups: data.p_groups.into_iter().collect(),
            row_index,
            name_index,
            group_index,
        }
    }

    /// Load a dictionary from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a dictionary from a JSON string
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let data: DictionaryData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.format_version != DICTIONARY_FORMAT_VERSION {
            warn!(
                "Dictionary format version mismatch (expected {}, found {})",
                DICTIONARY_FORMAT_VERSION, data.format_version
            );
        }

        Ok(Self::from_data(data))
    }

    /// Export the dictionary to JSON
    pub fn to_json(&self) -> Result<String, StoreError> {
        let data = DictionaryData {
            format_version: DICTIONARY_FORMAT_VERSION.to_string(),
            nomenclature_version: self.nomenclature_version.clone(),
            created_at: self.created_at.clone(),
            rows: self.rows.clone(),
            allele_names: self.allele_names.clone(),
            allele_groups: self.allele_groups.clone(),
            p_groups: self.p_groups.iter().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Get the row for an exact lookup name
    pub fn get(
        &self,
        locus: Locus,
        lookup_name: &str,
        method: TypingMethod,
    ) -> Option<&HlaMetadataRow> {
        self.row_index
            .get(&(locus, method, lookup_name.to_string()))
            .map(|&idx| &self.rows[idx])
    }

    pub fn rows(&self) -> &[HlaMetadataRow] {
        &self.rows
    }

    /// Current full names a (possibly historical or truncated) allele name stands for
    pub fn current_names(&self, locus: Locus, lookup_name: &str) -> &[String] {
        self.name_index
            .get(&(locus, lookup_name.to_string()))
            .map(|&idx| self.allele_names[idx].current_allele_names.as_slice())
            .unwrap_or_default()
    }

    /// Member alleles of a P-group, G-group or XX code
    pub fn group(&self, locus: Locus, name: &str) -> Option<&AlleleGroupEntry> {
        self.group_index
            .get(&(locus, name.to_string()))
            .map(|&idx| &self.allele_groups[idx])
    }

    pub fn groups_of_kind(&self, kind: GroupKind) -> impl Iterator<Item = &AlleleGroupEntry> {
        self.allele_groups.iter().filter(move |group| group.kind == kind)
    }

    pub fn all_p_groups(&self) -> &BTreeSet<String> {
        &self.p_groups
    }

    /// Number of rows in the dictionary
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dictionary has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Versioned storage of published dictionaries
pub trait DictionaryStore: Send + Sync {
    /// The published dictionary for a version
    fn dictionary(&self, version: &str) -> Result<Arc<PublishedDictionary>, StoreError>;

    /// Make a dictionary visible to readers, replacing any earlier one for its version
    fn publish(
        &self,
        dictionary: PublishedDictionary,
    ) -> Result<Arc<PublishedDictionary>, StoreError>;

    /// Published versions, oldest first
    fn versions(&self) -> Vec<String>;

    fn get(
        &self,
        locus: Locus,
        lookup_name: &str,
        method: TypingMethod,
        version: &str,
    ) -> Result<Option<HlaMetadataRow>, StoreError> {
        Ok(self.dictionary(version)?.get(locus, lookup_name, method).cloned())
    }

    fn latest_version(&self) -> Option<String> {
        self.versions().pop()
    }
}

/// Process-local dictionary store.
///
/// Each version is held behind an `Arc`; publishing swaps the whole
/// dictionary under a write lock, so readers see either the old or the new
/// version and never a partial one.
#[derive(Debug, Default)]
pub struct InMemoryDictionaryStore {
    dictionaries: RwLock<BTreeMap<String, Arc<PublishedDictionary>>>,
}

impl InMemoryDictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish every dictionary file in `paths`
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, StoreError> {
        let store = Self::new();
        for path in paths {
            let dictionary = PublishedDictionary::load_from_file(path.as_ref())?;
            store.publish(dictionary)?;
        }
        Ok(store)
    }
}

impl DictionaryStore for InMemoryDictionaryStore {
    fn dictionary(&self, version: &str) -> Result<Arc<PublishedDictionary>, StoreError> {
        self.dictionaries
            .read()
            .get(version)
            .cloned()
            .ok_or_else(|| StoreError::VersionNotFound(version.to_string()))
    }

    fn publish(
        &self,
        dictionary: PublishedDictionary,
    ) -> Result<Arc<PublishedDictionary>, StoreError> {
        let version = dictionary.nomenclature_version.clone();
        let rows = dictionary.len();
        let dictionary = Arc::new(dictionary);

        let previous = self
            .dictionaries
            .write()
            .insert(version.clone(), Arc::clone(&dictionary));

        if previous.is_some() {
            info!("Replaced dictionary for version {} ({} rows)", version, rows);
        } else {
            info!("Published dictionary for version {} ({} rows)", version, rows);
        }
        Ok(dictionary)
    }

    fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.dictionaries.read().keys().cloned().collect();
        versions.sort_by_key(|v| (v.parse::<u64>().ok(), v.clone()));
        versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AlleleTypingStatus;
    use crate::scoring::{ScoringInfo, SingleAlleleScoringInfo};

    fn dictionary(version: &str) -> PublishedDictionary {
        let row = HlaMetadataRow::new(
            Locus::A,
            "01:01:01:01",
            TypingMethod::Molecular,
            ScoringInfo::SingleAllele(SingleAlleleScoringInfo {
                allele_name: "01:01:01:01".to_string(),
                allele_typing_status: AlleleTypingStatus::default(),
                matching_p_group: Some("01:01P".to_string()),
                matching_g_group: None,
                matching_serologies: Vec::new(),
            }),
        );

        PublishedDictionary::from_data(DictionaryData {
            format_version: DICTIONARY_FORMAT_VERSION.to_string(),
            nomenclature_version: version.to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            rows: vec![row],
            allele_names: vec![AlleleNameEntry {
                locus: Locus::A,
                lookup_name: "01010101".to_string(),
                current_allele_names: vec!["01:01:01:01".to_string()],
            }],
            allele_groups: Vec::new(),
            p_groups: vec!["01:01P".to_string()],
        })
    }

    #[test]
    fn test_get_by_exact_name() {
        let dictionary = dictionary("3400");
        assert!(dictionary
            .get(Locus::A, "01:01:01:01", TypingMethod::Molecular)
            .is_some());
        assert!(dictionary
            .get(Locus::A, "01:01:01:01", TypingMethod::Serology)
            .is_none());
        assert!(dictionary
            .get(Locus::B, "01:01:01:01", TypingMethod::Molecular)
            .is_none());
    }

    #[test]
    fn test_current_names() {
        let dictionary = dictionary("3400");
        assert_eq!(dictionary.current_names(Locus::A, "01010101"), ["01:01:01:01"]);
        assert!(dictionary.current_names(Locus::A, "unknown").is_empty());
    }

    #[test]
    fn test_json_roundtrip_keeps_indexes() {
        let json = dictionary("3400").to_json().unwrap();
        let loaded = PublishedDictionary::from_json(&json).unwrap();

        assert_eq!(loaded.nomenclature_version, "3400");
        assert_eq!(loaded.len(), 1);
        assert!(loaded
            .get(Locus::A, "01:01:01:01", TypingMethod::Molecular)
            .is_some());
        assert!(loaded.all_p_groups().contains("01:01P"));
    }

    #[test]
    fn test_store_publish_and_versions() {
        let store = InMemoryDictionaryStore::new();
        store.publish(dictionary("3400")).unwrap();
        store.publish(dictionary("3330")).unwrap();

        assert_eq!(store.versions(), vec!["3330", "3400"]);
        assert_eq!(store.latest_version().as_deref(), Some("3400"));
        assert!(store
            .get(Locus::A, "01:01:01:01", TypingMethod::Molecular, "3330")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_store_unknown_version() {
        let store = InMemoryDictionaryStore::new();
        assert!(matches!(
            store.dictionary("3400"),
            Err(StoreError::VersionNotFound(v)) if v == "3400"
        ));
    }

    #[test]
    fn test_publish_replaces_whole_version() {
        let store = InMemoryDictionaryStore::new();
        let first = store.publish(dictionary("3400")).unwrap();
        let second = store.publish(dictionary("3400")).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&store.dictionary("3400").unwrap(), &second));
        // Readers holding the old version keep a consistent view
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3400.json");
        dictionary("3400").save(&path).unwrap();

        let store = InMemoryDictionaryStore::load_files(&[path]).unwrap();
        assert_eq!(store.versions(), vec!["3400"]);
    }
}
