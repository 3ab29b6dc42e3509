//! Category-keyed lookup dispatch.
//!
//! Every [`HlaTypingCategory`] maps to one [`LookupStrategy`] that turns the
//! lookup name into the constituent names to fetch from the dictionary:
//!
//! | Category | Constituents |
//! |----------|--------------|
//! | Allele, Serology | the name itself |
//! | PGroup, GGroup, XxCode | group members (memoized) |
//! | AlleleStringOfNames, AlleleStringOfSubtypes | split names, all must resolve |
//! | NmdpCode | MAC expansion (memoized) |
//!
//! Allele names missing from the requested version are retried under their
//! current names before the lookup fails.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::allele::strip_locus_prefix;
use crate::core::types::{HlaTypingCategory, Locus, TypingMethod};
use crate::dictionary::store::{DictionaryStore, StoreError};
use crate::dictionary::{HlaMetadataRow, RowKey};
use crate::lookup::cache::MemoizingCache;
use crate::lookup::collaborators::{
    AlleleStringSplitter, CodeExpansionService, CurrentNameResolver, ExpansionError,
    GroupExpansionService,
};
use crate::scoring::ScoringError;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Unrecognised HLA {locus}*{name}")]
    NotFound { locus: Locus, name: String },

    #[error("No lookup strategy registered for category {0}")]
    UnsupportedCategory(HlaTypingCategory),

    #[error("Invalid HLA typing: {0}")]
    InvalidTyping(String),

    #[error("Nomenclature version {0} has not been published")]
    VersionNotFound(String),

    #[error(transparent)]
    UnsupportedOperation(#[from] ScoringError),

    #[error("Expansion failed: {0}")]
    Expansion(ExpansionError),

    #[error("Dictionary store error: {0}")]
    Store(StoreError),
}

impl LookupError {
    fn not_found(locus: Locus, name: &str) -> Self {
        Self::NotFound {
            locus,
            name: name.to_string(),
        }
    }
}

impl From<StoreError> for LookupError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::VersionNotFound(version) => Self::VersionNotFound(version),
            other => Self::Store(other),
        }
    }
}

impl From<ExpansionError> for LookupError {
    fn from(error: ExpansionError) -> Self {
        match error {
            ExpansionError::Store(store) => store.into(),
            ExpansionError::InvalidAlleleString(message) => Self::InvalidTyping(message),
            other => Self::Expansion(other),
        }
    }
}

/// One lookup, as received by the dispatcher
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    pub category: HlaTypingCategory,
    pub locus: Locus,
    pub lookup_name: &'a str,
    pub version: &'a str,
}

/// Collaborators and caches shared by every strategy
pub struct LookupContext {
    pub store: Arc<dyn DictionaryStore>,
    pub codes: Arc<dyn CodeExpansionService>,
    pub groups: Arc<dyn GroupExpansionService>,
    pub splitter: Arc<dyn AlleleStringSplitter>,
    pub current_names: Arc<dyn CurrentNameResolver>,
    code_cache: MemoizingCache<String, BTreeSet<String>>,
    group_cache: MemoizingCache<(String, Locus, String), BTreeSet<String>>,
}

impl LookupContext {
    pub fn new(
        store: Arc<dyn DictionaryStore>,
        codes: Arc<dyn CodeExpansionService>,
        groups: Arc<dyn GroupExpansionService>,
        splitter: Arc<dyn AlleleStringSplitter>,
        current_names: Arc<dyn CurrentNameResolver>,
    ) -> Self {
        Self {
            store,
            codes,
            groups,
            splitter,
            current_names,
            code_cache: MemoizingCache::new(),
            group_cache: MemoizingCache::new(),
        }
    }

    /// MAC expansion, computed once per code for the life of the context
    pub fn expand_code(&self, code: &str) -> Result<Arc<BTreeSet<String>>, ExpansionError> {
        let code = strip_locus_prefix(code).to_uppercase();
        self.code_cache
            .get_or_try_compute(code.clone(), || self.codes.expand(&code))
    }

    /// Group expansion, computed once per version, locus and group
    pub fn expand_group(
        &self,
        locus: Locus,
        group: &str,
        version: &str,
    ) -> Result<Arc<BTreeSet<String>>, ExpansionError> {
        let group = strip_locus_prefix(group).to_uppercase();
        self.group_cache
            .get_or_try_compute((version.to_string(), locus, group.clone()), || {
                self.groups.expand(locus, &group, version)
            })
    }

    /// Exact row for a name, falling back to the current names of an allele
    fn rows_for(
        &self,
        locus: Locus,
        name: &str,
        method: TypingMethod,
        version: &str,
    ) -> Result<Vec<HlaMetadataRow>, LookupError> {
        let name = strip_locus_prefix(name);
        if let Some(row) = self.store.get(locus, name, method, version)? {
            return Ok(vec![row]);
        }
        if method == TypingMethod::Serology {
            return Ok(Vec::new());
        }

        let current = self.current_names.resolve(locus, name, version)?;
        let mut rows = Vec::new();
        for current_name in current.iter().filter(|current| current.as_str() != name) {
            if let Some(row) = self.store.get(locus, current_name, method, version)? {
                debug!("{}*{} resolved through current name {}", locus, name, current_name);
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

/// Turns a lookup name into the names to fetch from the dictionary
pub trait LookupStrategy: Send + Sync {
    fn constituent_names(
        &self,
        context: &LookupContext,
        request: &LookupRequest<'_>,
    ) -> Result<Vec<String>, LookupError>;

    /// Whether every constituent must resolve for the lookup to succeed
    fn requires_every_constituent(&self) -> bool {
        false
    }
}

/// `Allele` and `Serology`: the name itself
pub struct DirectLookup;

impl LookupStrategy for DirectLookup {
    fn constituent_names(
        &self,
        _context: &LookupContext,
        request: &LookupRequest<'_>,
    ) -> Result<Vec<String>, LookupError> {
        Ok(vec![request.lookup_name.to_string()])
    }

    fn requires_every_constituent(&self) -> bool {
        true
    }
}

/// `PGroup`, `GGroup` and `XxCode`: the group's member alleles
pub struct GroupLookup;

impl LookupStrategy for GroupLookup {
    fn constituent_names(
        &self,
        context: &LookupContext,
        request: &LookupRequest<'_>,
    ) -> Result<Vec<String>, LookupError> {
        match context.expand_group(request.locus, request.lookup_name, request.version) {
            Ok(alleles) => Ok(alleles.iter().cloned().collect()),
            Err(ExpansionError::UnknownGroup { .. }) => {
                Err(LookupError::not_found(request.locus, request.lookup_name))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `AlleleStringOfNames` and `AlleleStringOfSubtypes`: the split names
pub struct AlleleStringLookup;

impl LookupStrategy for AlleleStringLookup {
    fn constituent_names(
        &self,
        context: &LookupContext,
        request: &LookupRequest<'_>,
    ) -> Result<Vec<String>, LookupError> {
        Ok(context.splitter.split(request.lookup_name)?)
    }

    fn requires_every_constituent(&self) -> bool {
        true
    }
}

/// `NmdpCode`: the code's MAC expansion
pub struct NmdpCodeLookup;

impl LookupStrategy for NmdpCodeLookup {
    fn constituent_names(
        &self,
        context: &LookupContext,
        request: &LookupRequest<'_>,
    ) -> Result<Vec<String>, LookupError> {
        match context.expand_code(request.lookup_name) {
            Ok(alleles) => Ok(alleles.iter().cloned().collect()),
            Err(ExpansionError::UnknownCode(_)) => {
                Err(LookupError::not_found(request.locus, request.lookup_name))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The strategy registered for every category
pub fn default_strategies() -> HashMap<HlaTypingCategory, Box<dyn LookupStrategy>> {
    HlaTypingCategory::ALL
        .into_iter()
        .map(|category| {
            let strategy: Box<dyn LookupStrategy> = match category {
                HlaTypingCategory::Allele | HlaTypingCategory::Serology => Box::new(DirectLookup),
                HlaTypingCategory::PGroup
                | HlaTypingCategory::GGroup
                | HlaTypingCategory::XxCode => Box::new(GroupLookup),
                HlaTypingCategory::AlleleStringOfNames
                | HlaTypingCategory::AlleleStringOfSubtypes => Box::new(AlleleStringLookup),
                HlaTypingCategory::NmdpCode => Box::new(NmdpCodeLookup),
            };
            (category, strategy)
        })
        .collect()
}

/// Resolves lookups through a strategy table built once at construction
pub struct LookupDispatcher {
    context: LookupContext,
    strategies: HashMap<HlaTypingCategory, Box<dyn LookupStrategy>>,
}

impl LookupDispatcher {
    pub fn new(context: LookupContext) -> Self {
        Self::with_strategies(context, default_strategies())
    }

    pub fn with_strategies(
        context: LookupContext,
        strategies: HashMap<HlaTypingCategory, Box<dyn LookupStrategy>>,
    ) -> Self {
        Self {
            context,
            strategies,
        }
    }

    pub fn context(&self) -> &LookupContext {
        &self.context
    }

    /// Resolve a lookup into one or more dictionary rows
    ///
    /// # Errors
    ///
    /// Returns `LookupError::UnsupportedCategory` if no strategy is registered,
    /// `LookupError::VersionNotFound` for an unpublished version, or
    /// `LookupError::NotFound` naming the original locus and lookup name when
    /// neither the exact names nor their current equivalents resolve.
    pub fn lookup(&self, request: &LookupRequest<'_>) -> Result<Vec<HlaMetadataRow>, LookupError> {
        let strategy = self
            .strategies
            .get(&request.category)
            .ok_or(LookupError::UnsupportedCategory(request.category))?;

        // Fail on an unknown version before any expansion runs
        self.context.store.dictionary(request.version)?;

        let names = strategy.constituent_names(&self.context, request)?;
        debug!(
            "{} lookup of {}*{} expanded to {} names",
            request.category,
            request.locus,
            request.lookup_name,
            names.len()
        );

        let method = request.category.typing_method();
        let mut rows: Vec<HlaMetadataRow> = Vec::new();
        let mut seen: HashSet<RowKey> = HashSet::new();
        for name in &names {
            let found = self
                .context
                .rows_for(request.locus, name, method, request.version)?;
            if found.is_empty() && strategy.requires_every_constituent() {
                return Err(LookupError::not_found(request.locus, request.lookup_name));
            }
            rows.extend(found.into_iter().filter(|row| seen.insert(row.key())));
        }

        if rows.is_empty() {
            return Err(LookupError::not_found(request.locus, request.lookup_name));
        }
        Ok(rows)
    }
}
