//! wdbc - A tool for converting and extending WDBC client database files
//!
//! Usage:
//!   wdbc info <dbc_file> [-s schema]              - Show file information
//!   wdbc extract <dbc_file> -s <schema> [-o csv]  - Convert a DBC file to CSV
//!   wdbc build <csv_file> -s <schema> -o <dbc>    - Build a DBC file from CSV
//!   wdbc append <dbc_file> <csv_file> -s <schema> - Append CSV rows to a DBC file
//!   wdbc dump <dir> --schemas <dir>               - Convert every DBC under a directory

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wdbc::dbc::utils::{
    append_csv_to_dbc, dump_directory, export_from_csv, extract_to_csv, show_dbc_info,
};

#[derive(Parser)]
#[command(name = "wdbc")]
#[command(version)]
#[command(about = "Convert and extend WDBC client database files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show DBC header information
    Info {
        /// Path to the .dbc file
        dbc_file: PathBuf,
        /// Schema JSON; decodes the records as well
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
    /// Convert a DBC file to CSV
    Extract {
        /// Path to the .dbc file
        dbc_file: PathBuf,
        /// Schema JSON describing the records
        #[arg(short, long)]
        schema: PathBuf,
        /// Output CSV path (default: input path with .csv extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a new DBC file from CSV
    Build {
        /// Path to the .csv file
        csv_file: PathBuf,
        /// Schema JSON describing the records
        #[arg(short, long)]
        schema: PathBuf,
        /// Output DBC path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Append the rows of a CSV file to a DBC file
    Append {
        /// Source .dbc file
        dbc_file: PathBuf,
        /// CSV file with a header row matching the schema
        csv_file: PathBuf,
        /// Schema JSON describing the records
        #[arg(short, long)]
        schema: PathBuf,
        /// Output DBC path (default: overwrite the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert every DBC file under a directory to CSV
    Dump {
        /// Directory containing .dbc files
        input: PathBuf,
        /// Directory containing <name>.json schemas
        #[arg(long)]
        schemas: PathBuf,
        /// Filter pattern (e.g., *.dbc, Item*)
        #[arg(short, long)]
        filter: Option<String>,
        /// Output directory (default: next to the input files)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { dbc_file, schema } => {
            show_dbc_info(&dbc_file, schema.as_deref())?;
        }
        Commands::Extract {
            dbc_file,
            schema,
            output,
        } => {
            let csv = extract_to_csv(&dbc_file, &schema, output.as_deref())?;
            println!("Saved {}", csv.display());
        }
        Commands::Build {
            csv_file,
            schema,
            output,
        } => {
            export_from_csv(&csv_file, &schema, &output)?;
            println!("Saved {}", output.display());
        }
        Commands::Append {
            dbc_file,
            csv_file,
            schema,
            output,
        } => {
            append_csv_to_dbc(&dbc_file, &csv_file, &schema, output.as_deref())?;
        }
        Commands::Dump {
            input,
            schemas,
            filter,
            output,
        } => {
            let (_, failed, _) =
                dump_directory(&input, &schemas, filter.as_deref(), output.as_deref())?;
            if failed > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
