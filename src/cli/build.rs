use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::snapshot::JsonDirectorySource;
use crate::dictionary::builder::rebuild;
use crate::dictionary::store::InMemoryDictionaryStore;
use crate::dictionary::index::GroupKind;

#[derive(Args)]
pub struct BuildArgs {
    /// Directory of nomenclature snapshots named `<version>.json`
    #[arg(long, required = true)]
    pub snapshots: PathBuf,

    /// Nomenclature version to build (e.g., "3400")
    #[arg(short = 'n', long, required = true)]
    pub nomenclature_version: String,

    /// Output dictionary file
    #[arg(short, long, required = true)]
    pub output: PathBuf,
}

/// Execute the build command
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read, the build fails, or the
/// dictionary cannot be written.
pub fn run(args: BuildArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let source = JsonDirectorySource::new(&args.snapshots);
    let store = InMemoryDictionaryStore::new();

    let dictionary = rebuild(&source, &store, &args.nomenclature_version)?;
    dictionary.save(&args.output)?;

    let p_groups = dictionary.all_p_groups().len();
    let g_groups = dictionary.groups_of_kind(GroupKind::GGroup).count();

    match format {
        OutputFormat::Text => {
            println!(
                "Built dictionary for version {}: {} rows, {} P-groups, {} G-groups",
                dictionary.nomenclature_version,
                dictionary.len(),
                p_groups,
                g_groups
            );
            if verbose {
                println!("  Created: {}", dictionary.created_at);
            }
            println!("Wrote {}", args.output.display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "nomenclature_version": dictionary.nomenclature_version,
                "created_at": dictionary.created_at,
                "rows": dictionary.len(),
                "p_groups": p_groups,
                "g_groups": g_groups,
                "output": args.output.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("nomenclature_version\trows\tp_groups\tg_groups\toutput");
            println!(
                "{}\t{}\t{}\t{}\t{}",
                dictionary.nomenclature_version,
                dictionary.len(),
                p_groups,
                g_groups,
                args.output.display()
            );
        }
    }

    Ok(())
}
