//! Typing lookups against published dictionaries.
//!
//! A lookup takes a typing string such as `A*01:01`, `A*01:AB` or
//! `B*15:01/15:03`, classifies it, expands it to constituent names and
//! returns the dictionary rows those names resolve to.
//!
//! - [`categorise`]: string to [`HlaTypingCategory`](crate::core::types::HlaTypingCategory)
//! - [`dispatcher`]: one strategy per category, with memoized expansions
//! - [`collaborators`]: code, group, allele string and current-name services
//! - [`service`]: the public surface used by the CLI and the server

pub mod cache;
pub mod categorise;
pub mod collaborators;
pub mod dispatcher;
pub mod service;

pub use cache::MemoizingCache;
pub use dispatcher::{LookupContext, LookupDispatcher, LookupError, LookupRequest, LookupStrategy};
pub use service::{ConfigError, HlaMetadataService, LookupConfig, LookupResult};
