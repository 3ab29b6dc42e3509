use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod dictionary;
mod lookup;
mod matching;
mod parsing;
mod scoring;
mod utils;
mod web;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("hla_dictionary=debug,info")
    } else {
        EnvFilter::new("hla_dictionary=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Build(args) => {
            cli::build::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Lookup(args) => {
            cli::lookup::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Convert(args) => {
            cli::convert::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::PGroups(args) => {
            cli::p_groups::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Serve(args) => {
            web::server::run(args)?;
        }
    }

    Ok(())
}
