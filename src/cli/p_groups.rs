use clap::Args;

use crate::cli::{DictionaryArgs, OutputFormat};

#[derive(Args)]
pub struct PGroupsArgs {
    #[command(flatten)]
    pub dictionaries: DictionaryArgs,
}

/// Execute the p-groups command
///
/// # Errors
///
/// Returns an error if the dictionaries cannot be loaded or the version is
/// not among them.
pub fn run(args: PGroupsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let service = args.dictionaries.service()?;
    let version = service.resolve_version(args.dictionaries.nomenclature_version.as_deref())?;
    let p_groups = service.get_all_p_groups(&version)?;

    if verbose {
        eprintln!("Loaded versions: {}", service.versions().join(", "));
    }

    match format {
        OutputFormat::Text => {
            println!("P-groups in version {} ({})\n", version, p_groups.len());
            for p_group in &p_groups {
                println!("{p_group}");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "nomenclature_version": version,
                "p_groups": p_groups,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            for p_group in &p_groups {
                println!("{version}\t{p_group}");
            }
        }
    }

    Ok(())
}
