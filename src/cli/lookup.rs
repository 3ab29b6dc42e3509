use clap::Args;

use crate::cli::{parse_typing, DictionaryArgs, OutputFormat};
use crate::core::types::{HlaTypingCategory, Locus};
use crate::lookup::service::LookupResult;
use crate::scoring::{ScoringInfo, SerologyEntry};

#[derive(Args)]
pub struct LookupArgs {
    /// Typing to look up (e.g., "A*01:01", "A*01:AB", "B*15:01/15:03")
    #[arg(required = true)]
    pub typing: String,

    /// Locus, for typings without an `A*` style prefix
    #[arg(short, long)]
    pub locus: Option<Locus>,

    /// Treat the typing as this category instead of classifying it
    #[arg(long)]
    pub category: Option<HlaTypingCategory>,

    #[command(flatten)]
    pub dictionaries: DictionaryArgs,
}

/// Execute the lookup command
///
/// # Errors
///
/// Returns an error if the dictionaries cannot be loaded or the typing does
/// not resolve.
pub fn run(args: LookupArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let service = args.dictionaries.service()?;
    let version = service.resolve_version(args.dictionaries.nomenclature_version.as_deref())?;
    let (locus, name) = parse_typing(&args.typing, args.locus)?;

    let result = match args.category {
        Some(category) => service.lookup(category, locus, &name, &version)?,
        None => service.lookup_typing(locus, &name, &version)?,
    };
    let info = result.scoring_info()?;

    if verbose {
        eprintln!(
            "Resolved {}*{} as {} in version {} ({} rows)",
            result.locus,
            result.lookup_name,
            result.category,
            result.nomenclature_version,
            result.rows.len()
        );
    }

    match format {
        OutputFormat::Text => print_text(&result, &info, verbose),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "category": result.category,
                "locus": result.locus,
                "lookup_name": result.lookup_name,
                "nomenclature_version": result.nomenclature_version,
                "scoring_info": info,
                "rows": result.rows,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("locus\tlookup_name\ttyping_method\tscoring_info\tp_groups\tg_groups\tserologies");
            for row in &result.rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    row.locus,
                    row.lookup_name,
                    row.typing_method,
                    row.scoring_info.variant_name(),
                    row.scoring_info.matching_p_groups().join(","),
                    row.scoring_info.matching_g_groups().join(","),
                    serology_names(row.scoring_info.matching_serologies()).join(",")
                );
            }
        }
    }

    Ok(())
}

fn print_text(result: &LookupResult, info: &ScoringInfo, verbose: bool) {
    println!(
        "{}*{} ({}, version {})",
        result.locus, result.lookup_name, result.category, result.nomenclature_version
    );
    println!("{}", "=".repeat(60));
    println!();
    println!("Scoring info: {}", info.variant_name());
    println!("  P-groups:   {}", display_list(&info.matching_p_groups()));
    println!("  G-groups:   {}", display_list(&info.matching_g_groups()));
    println!(
        "  Serologies: {}",
        display_list(&serology_names(info.matching_serologies()))
    );

    if let Ok(alleles) = info.expand_to_single_alleles() {
        if alleles.len() > 1 || verbose {
            println!();
            println!("Alleles ({}):", alleles.len());
            for allele in alleles {
                println!(
                    "  {:<16} {:<8} {}",
                    allele.allele_name,
                    allele.matching_p_group.as_deref().unwrap_or("-"),
                    allele.matching_g_group.as_deref().unwrap_or("-")
                );
            }
        }
    }

    if verbose {
        println!();
        println!("Rows ({}):", result.rows.len());
        for row in &result.rows {
            println!(
                "  {:<16} {:<10} {}",
                row.lookup_name,
                row.typing_method,
                row.scoring_info.variant_name()
            );
        }
    }
}

/// Serology names, with unexpected ones marked
pub(crate) fn serology_names(serologies: &[SerologyEntry]) -> Vec<String> {
    serologies
        .iter()
        .map(|serology| {
            if serology.is_unexpected {
                format!("{}?", serology.name)
            } else {
                serology.name.clone()
            }
        })
        .collect()
}

pub(crate) fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
