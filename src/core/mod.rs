//! Core data types for HLA matching.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`AlleleTyping`]: A molecular typing with its derived name forms
//! - [`SerologyTyping`]: A serology typing and its broad/split subtype
//! - [`HlaTyping`]: Either of the above
//! - [`NomenclatureSnapshot`]: The parsed facts of one nomenclature release
//! - [`Locus`], [`SerologySubtype`], [`Assignment`]: Classification types
//!
//! ## Locus Naming
//!
//! Molecular and serology typings spell loci differently:
//!
//! | Locus | Molecular | Serology |
//! |-------|-----------|----------|
//! | A     | A*        | A        |
//! | C     | C*        | Cw       |
//! | DQB1  | DQB1*     | DQ       |
//! | DRB1  | DRB1*     | DR       |
//!
//! Typings at loci outside the matching set (e.g. DRB3) are dropped.
//!
//! [`AlleleTyping`]: allele::AlleleTyping
//! [`SerologyTyping`]: serology::SerologyTyping
//! [`HlaTyping`]: typing::HlaTyping
//! [`NomenclatureSnapshot`]: snapshot::NomenclatureSnapshot
//! [`Locus`]: types::Locus
//! [`SerologySubtype`]: types::SerologySubtype
//! [`Assignment`]: types::Assignment

pub mod allele;
pub mod serology;
pub mod snapshot;
pub mod types;
pub mod typing;
