use anyhow::{format_err, Result};
use clap::Parser;
use ctgview::{
    open, resolve, summarize, AvailablePaths, ElementView, Error, StructureListing,
    SummaryOptionsBuilder,
};
use std::path::PathBuf;

/// Read contingency analysis results.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the scenario result file (.h5 or .json)
    #[arg(required = true)]
    file: PathBuf,

    /// Print the file structure.
    #[arg(long, default_value_t = false, conflicts_with = "element")]
    structure: bool,

    /// Read a specific element by path.
    #[arg(long, value_name = "PATH")]
    element: Option<String>,

    /// Contingency compared against the base case for generator redispatch.
    #[arg(long, conflicts_with_all = ["structure", "element"])]
    reference: Option<usize>,

    /// Absolute active power change reported as redispatch.
    #[arg(long, conflicts_with_all = ["structure", "element"])]
    threshold: Option<f64>,

    /// Print the summary as JSON.
    #[arg(long, default_value_t = false, conflicts_with_all = ["structure", "element"])]
    json: bool,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let container = open(&cli.file)?;

    if cli.structure {
        print!("{}", StructureListing::new(&container));
        return Ok(());
    }

    if let Some(path) = &cli.element {
        return match resolve(&container, path) {
            Ok(node) => {
                print!("{}", ElementView { path, node: &node });
                Ok(())
            }
            Err(Error::NotFound { path, available }) => {
                print!("{}", AvailablePaths(&available));
                Err(format_err!(
                    "'{}' not found in {}",
                    path,
                    cli.file.display()
                ))
            }
            Err(err) => Err(err.into()),
        };
    }

    let mut options = SummaryOptionsBuilder::default();
    if let Some(reference) = cli.reference {
        options.reference(reference);
    }
    if let Some(threshold) = cli.threshold {
        options.threshold(threshold);
    }
    let options = options.build()?;

    let summary = summarize(&container, &options)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }
    Ok(())
}
