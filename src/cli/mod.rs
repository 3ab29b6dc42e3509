//! Command-line interface for hla-dictionary.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **build**: Pre-calculate the matching dictionary for a nomenclature version
//! - **lookup**: Resolve a typing to its dictionary rows and scoring info
//! - **convert**: Express a typing as P-groups, G-groups, serologies or two-field names
//! - **p-groups**: List every P-group of a version
//! - **serve**: Start the read-only lookup API
//!
//! ## Usage
//!
//! ```text
//! # Build the dictionary for version 3400 from <dir>/3400.json
//! hla-dictionary build --snapshots nomenclature/ --nomenclature-version 3400 -o hla-3400.json
//!
//! # Look up a typing
//! hla-dictionary lookup 'A*01:01' --dictionary hla-3400.json
//!
//! # Expand an NMDP code, with JSON output for scripting
//! hla-dictionary lookup 'A*01:AB' --dictionary hla-3400.json --mac-file mac.tsv --format json
//!
//! # Convert to P-groups
//! hla-dictionary convert 'A*24:03:01' --target p-group --dictionary hla-3400.json
//!
//! # Start the API
//! hla-dictionary serve --dictionary hla-3400.json --port 8080
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::core::allele::strip_locus_prefix;
use crate::core::types::Locus;
use crate::dictionary::store::InMemoryDictionaryStore;
use crate::lookup::service::{HlaMetadataService, LookupConfig};

pub mod build;
pub mod convert;
pub mod lookup;
pub mod p_groups;

#[derive(Parser)]
#[command(name = "hla-dictionary")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Pre-calculate and query HLA matching dictionaries")]
#[command(
    long_about = "hla-dictionary pre-calculates, for one nomenclature version, how every HLA allele and serology matches.\n\nThe resulting dictionary answers, for any typing string:\n- Which alleles or serologies it stands for\n- Their P-groups, G-groups and serology families\n- Consolidated scoring info for ambiguous typings (codes, groups, allele strings)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the matching dictionary for a nomenclature version
    Build(build::BuildArgs),

    /// Look up a typing in a published dictionary
    Lookup(lookup::LookupArgs),

    /// Convert a typing to another resolution
    Convert(convert::ConvertArgs),

    /// List the P-groups of a nomenclature version
    PGroups(p_groups::PGroupsArgs),

    /// Start the web server
    Serve(ServeArgs),
}

/// Where published dictionaries and NMDP codes come from
#[derive(clap::Args, Clone, Debug)]
pub struct DictionaryArgs {
    /// Dictionary JSON files produced by `build` (repeatable)
    #[arg(short, long = "dictionary", required = true)]
    pub dictionaries: Vec<PathBuf>,

    /// MAC table (`CODE<TAB>expansion`) for NMDP code lookups
    #[arg(long)]
    pub mac_file: Option<PathBuf>,

    /// Lookup config JSON; flags given on the command line take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Nomenclature version to query (defaults to the latest loaded)
    #[arg(short = 'n', long)]
    pub nomenclature_version: Option<String>,
}

impl DictionaryArgs {
    /// Merge the config file with the command-line flags
    pub fn lookup_config(&self) -> anyhow::Result<LookupConfig> {
        let mut config = match &self.config {
            Some(path) => LookupConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => LookupConfig::default(),
        };
        if self.mac_file.is_some() {
            config.mac_file.clone_from(&self.mac_file);
        }
        if self.nomenclature_version.is_some() {
            config.default_version.clone_from(&self.nomenclature_version);
        }
        Ok(config)
    }

    /// Load the dictionaries and wire up the lookup service
    pub fn service(&self) -> anyhow::Result<HlaMetadataService> {
        let config = self.lookup_config()?;
        let store = InMemoryDictionaryStore::load_files(&self.dictionaries)?;
        let codes = config.load_mac_dictionary()?;
        Ok(HlaMetadataService::new(
            Arc::new(store),
            Arc::new(codes),
            config,
        ))
    }
}

/// Split a typing such as `A*01:01` into its locus and name.
///
/// `locus` wins over a prefix in the typing; serology typings carry no
/// prefix, so they need `--locus`.
pub fn parse_typing(typing: &str, locus: Option<Locus>) -> anyhow::Result<(Locus, String)> {
    let typing = typing.trim();
    let prefix = typing
        .split('/')
        .next()
        .and_then(|first| first.split_once('*'))
        .map(|(prefix, _)| prefix);

    let locus = match (locus, prefix) {
        (Some(locus), _) => locus,
        (None, Some(prefix)) => Locus::parse(prefix)
            .with_context(|| format!("'{prefix}' is not a matching locus"))?,
        (None, None) => bail!("No locus given for '{typing}': use a prefix such as A* or --locus"),
    };

    let name = if typing.contains('/') {
        typing.to_string()
    } else {
        strip_locus_prefix(typing).to_string()
    };
    Ok((locus, name))
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub dictionaries: DictionaryArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
