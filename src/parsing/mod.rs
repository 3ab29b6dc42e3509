//! Parsers for external code tables.
//!
//! - **MAC files**: NMDP multiple allele codes, one `code<TAB>expansion` per line
//!
//! ## Example
//!
//! ```rust,no_run
//! use hla_dictionary::parsing::mac::parse_mac_file;
//! use std::path::Path;
//!
//! let macs = parse_mac_file(Path::new("mac.tsv")).unwrap();
//! let alleles = macs.expand("01:AB");
//! ```
//!
//! ## Expansion forms
//!
//! | Form | Example | `01:CODE` expands to |
//! |------|---------|----------------------|
//! | Generic | `01/02` | `01:01`, `01:02` |
//! | Specific | `01:01/11:02` | `01:01`, `11:02` |

pub mod mac;
