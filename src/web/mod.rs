//! Read-only HTTP API over published dictionaries.
//!
//! ## Starting the Server
//!
//! ```text
//! # Serve one dictionary on the default port 8080
//! hla-dictionary serve --dictionary hla-3400.json --mac-file mac.tsv
//!
//! # Several versions, bound to all interfaces
//! hla-dictionary serve -d hla-3390.json -d hla-3400.json --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /api/versions` - Loaded nomenclature versions
//! - `GET /api/lookup?locus=A&name=01:01[&version=3400][&category=allele]` - Scoring info for a typing
//! - `GET /api/convert?locus=A&name=24:03:01&target=p_group[&version=3400]` - Convert a typing
//! - `GET /api/p-groups[?version=3400]` - Every P-group of a version

pub mod server;
