//! # hla-dictionary
//!
//! A library for pre-calculating and querying HLA matching dictionaries.
//!
//! Donor and patient HLA typings arrive at many resolutions: serologies,
//! full allele names, truncated names, P- and G-groups, XX codes, NMDP
//! multiple allele codes and allele strings. Scoring a match needs them all
//! in one comparable form.
//!
//! `hla-dictionary` reads one version of the HLA nomenclature, works out for
//! every allele and serology what it matches, and publishes the result as a
//! versioned dictionary that answers lookups for any typing string.
//!
//! ## Features
//!
//! - **Serology families**: broad, split and associated antigens resolved per locus
//! - **Allele matching**: P-group, G-group and serology assignments for every allele
//! - **Name variants**: truncated allele names resolve to every allele they stand for
//! - **Scoring info**: one record per lookup name, consolidated for ambiguous typings
//! - **Expansion**: NMDP codes, XX codes, groups and allele strings, memoized per key
//! - **History**: renamed and deleted allele names fall back to their current names
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hla_dictionary::{HlaMetadataService, InMemoryDictionaryStore, Locus, LookupConfig};
//! use hla_dictionary::core::snapshot::JsonDirectorySource;
//! use hla_dictionary::dictionary::builder::rebuild;
//! use hla_dictionary::parsing::mac::parse_mac_file;
//!
//! let source = JsonDirectorySource::new("nomenclature");
//! let store = Arc::new(InMemoryDictionaryStore::new());
//! rebuild(&source, store.as_ref(), "3400").unwrap();
//!
//! let codes = parse_mac_file(std::path::Path::new("mac.tsv")).unwrap();
//! let service = HlaMetadataService::new(store, Arc::new(codes), LookupConfig::default());
//!
//! let info = service.scoring_info(Locus::A, "01:AB", "3400").unwrap();
//! println!("{:?}", info.matching_p_groups());
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Core data types for loci, alleles, serologies and nomenclature snapshots
//! - [`matching`]: Serology families and per-allele matching pre-calculation
//! - [`scoring`]: Scoring info variants and how they are combined
//! - [`dictionary`]: Dictionary building, indexes and versioned storage
//! - [`lookup`]: Typing classification, expansion and lookup dispatch
//! - [`parsing`]: Parsers for MAC code tables
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: Read-only HTTP lookup API

pub mod cli;
pub mod core;
pub mod dictionary;
pub mod lookup;
pub mod matching;
pub mod parsing;
pub mod scoring;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use core::types::*;
pub use dictionary::{
    DictionaryBuilder, DictionaryStore, HlaMetadataRow, InMemoryDictionaryStore,
    PublishedDictionary,
};
pub use lookup::{HlaMetadataService, LookupConfig, LookupDispatcher, LookupError};
pub use scoring::ScoringInfo;
