use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use interop_bindgen::{
    BindgenError, GeneratorConfig, OutputLayout, diagnostics, generate, loader, logging, write_files,
};
use interop_bindgen::config::OnCycle;

/// Generate native and managed bindings from descriptor feeds.
///
/// EXAMPLES:
///     interop-bindgen game.json                      Write to ./Source and ./Managed
///     interop-bindgen native.json managed.json -o out
///     interop-bindgen game.json --config bindgen.toml --deny-errors
#[derive(Parser, Debug)]
#[command(name = "interop-bindgen")]
#[command(version)]
struct Cli {
    /// Descriptor feeds, concatenated in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output root
    #[arg(long, short = 'o', default_value = ".")]
    output: PathBuf,

    /// Configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Ignore inheritance cycles instead of aborting
    #[arg(long)]
    allow_cycles: bool,

    /// Fail on unknown type names instead of treating them as opaque native types
    #[arg(long)]
    no_opaque_fallback: bool,

    /// Exit with status 2 when any error was collected
    #[arg(long)]
    deny_errors: bool,

    /// Generate without writing files
    #[arg(long)]
    dry_run: bool,

    /// More log output (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<BindgenError>() {
                Some(BindgenError::Generation(generation)) => {
                    for line in diagnostics([generation]) {
                        eprintln!("{line}");
                    }
                }
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if cli.allow_cycles {
        config.ordering.on_cycle = OnCycle::Continue;
    }
    if cli.no_opaque_fallback {
        config.resolution.opaque_fallback = false;
    }

    let feed = loader::load_feeds(&cli.inputs).context("loading descriptor feeds")?;
    let output = generate(&feed, &config)?;

    let mut errors = output.errors;
    if !cli.dry_run {
        let layout = OutputLayout::new(&cli.output, &config.output);
        let summary = write_files(&layout, &output.files);
        errors.extend(summary.errors);
    }

    for line in diagnostics(&errors) {
        eprintln!("{line}");
    }
    if cli.deny_errors && !errors.is_empty() {
        eprintln!("{} error(s) with --deny-errors", errors.len());
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
