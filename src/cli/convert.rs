use clap::Args;

use crate::cli::lookup::display_list;
use crate::cli::{parse_typing, DictionaryArgs, OutputFormat};
use crate::core::types::{Locus, TargetHlaCategory};

#[derive(Args)]
pub struct ConvertArgs {
    /// Typing to convert (e.g., "A*24:03:01", "B*15:AB")
    #[arg(required = true)]
    pub typing: String,

    /// Resolution to convert to
    #[arg(short, long, required = true)]
    pub target: TargetHlaCategory,

    /// Locus, for typings without an `A*` style prefix
    #[arg(short, long)]
    pub locus: Option<Locus>,

    #[command(flatten)]
    pub dictionaries: DictionaryArgs,
}

/// Execute the convert command
///
/// # Errors
///
/// Returns an error if the typing does not resolve or cannot be expressed in
/// the target resolution.
pub fn run(args: ConvertArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let service = args.dictionaries.service()?;
    let version = service.resolve_version(args.dictionaries.nomenclature_version.as_deref())?;
    let (locus, name) = parse_typing(&args.typing, args.locus)?;

    let converted = service.convert(locus, &name, args.target, &version)?;

    if verbose {
        eprintln!(
            "Converted {}*{} to {} names in version {}",
            locus,
            name,
            converted.len(),
            version
        );
    }

    match format {
        OutputFormat::Text => {
            println!("{locus}*{name} -> {}", display_list(&converted));
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "locus": locus,
                "lookup_name": name,
                "target": args.target,
                "nomenclature_version": version,
                "names": converted,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            for converted_name in &converted {
                println!("{locus}\t{name}\t{converted_name}");
            }
        }
    }

    Ok(())
}
