//! Parsed nomenclature facts for one release.
//!
//! Snapshots are produced upstream from the WMDA nomenclature files and
//! handed to this crate as JSON. Nothing here parses the raw files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::{Assignment, DnaCategory, SequenceStatus};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read nomenclature snapshot: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse nomenclature snapshot: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Nomenclature version '{0}' is not available")]
    VersionNotAvailable(String),

    #[error("Snapshot declares version '{found}' but '{expected}' was requested")]
    VersionMismatch { expected: String, found: String },
}

/// An allele as listed in the nomenclature, possibly deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureAllele {
    /// Raw locus string, e.g. `A*` or `DRB1*`
    pub typing_locus: String,
    pub name: String,
    #[serde(default)]
    pub is_deleted: bool,
    /// Name of the allele that replaces a deleted one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identical_hla: Option<String>,
}

/// A serology as listed in the nomenclature, possibly deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureSerology {
    /// Raw locus string, e.g. `A`, `Cw` or `DR`
    pub typing_locus: String,
    pub name: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identical_hla: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleStatusRecord {
    pub typing_locus: String,
    pub name: String,
    #[serde(default)]
    pub sequence_status: SequenceStatus,
    #[serde(default)]
    pub dna_category: DnaCategory,
}

/// An allele whose name must never appear in the dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialAllele {
    pub typing_locus: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerologyAssignment {
    pub name: String,
    pub assignment: Assignment,
}

impl SerologyAssignment {
    pub fn new(name: impl Into<String>, assignment: Assignment) -> Self {
        Self {
            name: name.into(),
            assignment,
        }
    }
}

/// The serologies assigned to one allele
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleToSerologyRelationship {
    pub typing_locus: String,
    pub allele_name: String,
    #[serde(default)]
    pub serology_assignments: Vec<SerologyAssignment>,
}

/// One line of the broad/split/associated relationship table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerologyToSerologyRelationship {
    pub typing_locus: String,
    pub name: String,
    #[serde(default)]
    pub split_antigens: Vec<String>,
    #[serde(default)]
    pub associated_antigens: Vec<String>,
}

/// A P-group or G-group with its member alleles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleGroup {
    pub typing_locus: String,
    pub name: String,
    pub alleles: Vec<String>,
}

/// Every name an allele has carried across releases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleNameHistory {
    pub typing_locus: String,
    /// Name in this release; `None` if the allele no longer exists
    #[serde(default)]
    pub current_name: Option<String>,
    #[serde(default)]
    pub historical_names: Vec<String>,
}

/// Immutable set of parsed facts for a single nomenclature version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomenclatureSnapshot {
    pub version: String,
    #[serde(default)]
    pub alleles: Vec<NomenclatureAllele>,
    #[serde(default)]
    pub serologies: Vec<NomenclatureSerology>,
    #[serde(default)]
    pub allele_statuses: Vec<AlleleStatusRecord>,
    #[serde(default)]
    pub confidential_alleles: Vec<ConfidentialAllele>,
    #[serde(default)]
    pub allele_to_serology_relationships: Vec<AlleleToSerologyRelationship>,
    #[serde(default)]
    pub serology_to_serology_relationships: Vec<SerologyToSerologyRelationship>,
    #[serde(default)]
    pub p_groups: Vec<AlleleGroup>,
    #[serde(default)]
    pub g_groups: Vec<AlleleGroup>,
    #[serde(default)]
    pub allele_name_histories: Vec<AlleleNameHistory>,
}

impl NomenclatureSnapshot {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Provides the parsed nomenclature for a requested version
pub trait NomenclatureSource {
    fn get(&self, version: &str) -> Result<NomenclatureSnapshot, SnapshotError>;
}

/// Reads snapshots stored as `<dir>/<version>.json`
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, version: &str) -> PathBuf {
        self.root.join(format!("{version}.json"))
    }
}

impl NomenclatureSource for JsonDirectorySource {
    fn get(&self, version: &str) -> Result<NomenclatureSnapshot, SnapshotError> {
        let path = self.path_for(version);
        if !path.exists() {
            return Err(SnapshotError::VersionNotAvailable(version.to_string()));
        }

        let snapshot = NomenclatureSnapshot::load_from_file(&path)?;
        if snapshot.version != version {
            return Err(SnapshotError::VersionMismatch {
                expected: version.to_string(),
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_defaults_missing_tables() {
        let snapshot = NomenclatureSnapshot::from_json(r#"{"version": "3400"}"#).unwrap();
        assert_eq!(snapshot.version, "3400");
        assert!(snapshot.alleles.is_empty());
        assert!(snapshot.allele_name_histories.is_empty());
    }

    #[test]
    fn test_snapshot_parses_relationships() {
        let json = r#"{
            "version": "3400",
            "allele_to_serology_relationships": [
                {"typing_locus": "B*", "allele_name": "39:01:01:02L",
                 "serology_assignments": [{"name": "3901", "assignment": "expert"}]}
            ],
            "serology_to_serology_relationships": [
                {"typing_locus": "B", "name": "39", "associated_antigens": ["3901"]}
            ]
        }"#;
        let snapshot = NomenclatureSnapshot::from_json(json).unwrap();
        let relationship = &snapshot.allele_to_serology_relationships[0];
        assert_eq!(
            relationship.serology_assignments[0].assignment,
            Assignment::Expert
        );
        assert!(snapshot.serology_to_serology_relationships[0]
            .split_antigens
            .is_empty());
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = NomenclatureSnapshot::new("3410");
        std::fs::write(dir.path().join("3410.json"), snapshot.to_json().unwrap()).unwrap();

        let source = JsonDirectorySource::new(dir.path());
        assert_eq!(source.get("3410").unwrap().version, "3410");
        assert!(matches!(
            source.get("3420"),
            Err(SnapshotError::VersionNotAvailable(_))
        ));
    }

    #[test]
    fn test_directory_source_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = NomenclatureSnapshot::new("3400");
        std::fs::write(dir.path().join("3410.json"), snapshot.to_json().unwrap()).unwrap();

        let source = JsonDirectorySource::new(dir.path());
        assert!(matches!(
            source.get("3410"),
            Err(SnapshotError::VersionMismatch { .. })
        ));
    }
}
