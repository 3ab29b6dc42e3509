//! Versioned HLA metadata dictionaries.
//!
//! A dictionary holds, for one nomenclature version, one [`HlaMetadataRow`]
//! per lookup name together with the indexes the lookup collaborators need:
//!
//! - **Rows**: every allele full name, every allele name variant and every
//!   serology, keyed by `(locus, lookup name, typing method)`
//! - **Allele names**: historical names, full names and name variants mapped
//!   to the current full names they stand for
//! - **Allele groups**: P-groups, G-groups and XX codes mapped to their
//!   member alleles
//!
//! Dictionaries are built in full by [`builder::DictionaryBuilder`] and
//! published in one step through a [`store::DictionaryStore`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use hla_dictionary::core::snapshot::JsonDirectorySource;
//! use hla_dictionary::core::types::{Locus, TypingMethod};
//! use hla_dictionary::dictionary::builder::rebuild;
//! use hla_dictionary::dictionary::store::{DictionaryStore, InMemoryDictionaryStore};
//!
//! let source = JsonDirectorySource::new("nomenclature");
//! let store = InMemoryDictionaryStore::new();
//! rebuild(&source, &store, "3400").unwrap();
//!
//! let row = store.get(Locus::A, "01:01", TypingMethod::Molecular, "3400").unwrap();
//! println!("{:?}", row.map(|row| row.scoring_info));
//! ```

use serde::{Deserialize, Serialize};

use crate::core::types::{Locus, TypingMethod};
use crate::core::typing::HlaTyping;
use crate::scoring::ScoringInfo;

pub mod builder;
pub mod index;
pub mod store;

pub use builder::{BuildError, DictionaryBuilder};
pub use store::{DictionaryStore, InMemoryDictionaryStore, PublishedDictionary, StoreError};

/// Unique key of a row within one dictionary version
pub type RowKey = (Locus, TypingMethod, String);

/// One lookup name and the scoring data it resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HlaMetadataRow {
    pub locus: Locus,
    pub lookup_name: String,
    pub typing_method: TypingMethod,
    pub scoring_info: ScoringInfo,
}

impl HlaMetadataRow {
    pub fn new(
        locus: Locus,
        lookup_name: impl Into<String>,
        typing_method: TypingMethod,
        scoring_info: ScoringInfo,
    ) -> Self {
        Self {
            locus,
            lookup_name: lookup_name.into(),
            typing_method,
            scoring_info,
        }
    }

    /// Row keyed by the typing's own locus, name and method
    pub fn for_typing(typing: &HlaTyping, scoring_info: ScoringInfo) -> Self {
        Self::new(typing.locus(), typing.name(), typing.typing_method(), scoring_info)
    }

    pub fn key(&self) -> RowKey {
        (self.locus, self.typing_method, self.lookup_name.clone())
    }
}
