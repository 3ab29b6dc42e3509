//! HLA matching pre-calculation.
//!
//! This module turns a [`NomenclatureSnapshot`](crate::core::snapshot::NomenclatureSnapshot)
//! into matched records:
//!
//! - [`info`]: matching-input records (status, groups, identical-HLA substitution)
//! - [`family`]: subtype-aware serology family resolution
//! - [`mapping`]: allele <-> serology mapping through WMDA assignments
//! - [`matcher`]: [`MatchedAllele`] and [`MatchedSerology`] for every typing
//!
//! ## Serology families
//!
//! | Subtype | Matching serologies |
//! |---------|---------------------|
//! | NotSplit | self, associated antigens |
//! | Split | self, broad |
//! | Broad | self, splits, associated of self and splits |
//! | Associated | self, parent entity and its family (siblings flagged unexpected) |
//!
//! Order matters: results are compared as sequences downstream.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hla_dictionary::core::snapshot::NomenclatureSnapshot;
//! use hla_dictionary::core::types::Locus;
//! use hla_dictionary::matching::matcher::calculate_matched_hla;
//! use std::path::Path;
//!
//! let snapshot = NomenclatureSnapshot::load_from_file(Path::new("3400.json")).unwrap();
//! let matched = calculate_matched_hla(&snapshot);
//!
//! if let Some(allele) = matched.allele(Locus::B, "39:01:01:02L") {
//!     for serology in &allele.matching_serologies {
//!         println!("{}", serology.serology);
//!     }
//! }
//! ```

use crate::core::types::Locus;

pub mod family;
pub mod info;
pub mod mapping;
pub mod matcher;

pub use matcher::{MatchedAllele, MatchedHlaSet, MatchedSerology};

/// Locus + name key used by the lookup tables in this module
pub(crate) type TypingKey = (Locus, String);
