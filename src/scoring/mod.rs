//! Persisted scoring data.
//!
//! Every dictionary row carries a [`ScoringInfo`], the smallest variant that
//! still answers the questions asked at scoring time:
//!
//! | Variant | Used for | Per-allele detail |
//! |---------|----------|-------------------|
//! | `SingleAllele` | one allele name | yes |
//! | `MultipleAllele` | name variants, allele strings | yes |
//! | `ConsolidatedMolecular` | XX codes, NMDP codes, P/G groups | no |
//! | `Serology` | serology names | no |

pub mod builder;
pub mod info;

pub use info::{ScoringError, ScoringInfo, SerologyEntry, SingleAlleleScoringInfo};
