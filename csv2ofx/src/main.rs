//! csv2ofx CLI - Convert bank CSV exports to OFX
//!
//! ```bash
//! csv2ofx --format spv-kreditt --source export.csv --destination out.ofx
//! csv2ofx --config banks.json --format dnb < export.csv > out.ofx
//! csv2ofx --list-formats
//! ```

use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use csv2ofx::{
    ConversionPipeline, ConvertError, ConvertOptions, Diagnostics, OfxWriter, PayerIdentity,
    SpecCatalog, StreamTarget,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csv2ofx")]
#[command(about = "Convert bank CSV exports to OFX statements", long_about = None)]
struct Cli {
    /// Format name in the specification document
    #[arg(short, long, default_value = "spv-kreditt")]
    format: String,

    /// Specification document
    #[arg(short, long, default_value = "specs.json")]
    config: PathBuf,

    /// Input CSV file ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    source: StreamTarget,

    /// Output OFX file ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    destination: StreamTarget,

    /// List the formats in the specification document and exit
    #[arg(long)]
    list_formats: bool,

    /// Account number written to the statement
    #[arg(long)]
    payer_account: Option<String>,

    /// Bank id written to the statement
    #[arg(long)]
    payer_bank: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn payer(&self) -> PayerIdentity {
        let default = PayerIdentity::default();
        PayerIdentity {
            account: self.payer_account.clone().unwrap_or(default.account),
            bank: self.payer_bank.clone().unwrap_or(default.bank),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `-v` picks the level.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Fails only when a global subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), ConvertError> {
    let mut diagnostics = Diagnostics::new(io::stderr());
    diagnostics.echo("Source", &cli.source);
    diagnostics.echo("Format", &cli.format);
    diagnostics.echo("Destination", &cli.destination);
    diagnostics.echo("Config", cli.config.display());

    let catalog = SpecCatalog::load(&cli.config)?;

    if cli.list_formats {
        for name in catalog.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let format = catalog.find_format(&cli.format)?;
    debug!(format = %format.name, "format selected");

    let input = cli.source.open_input()?;
    let mut output = cli.destination.create_output()?;

    let options = ConvertOptions::new(format).with_payer(cli.payer());
    ConversionPipeline::new(options).run(input, &mut output, &mut diagnostics, &OfxWriter::new())?;
    Ok(())
}
