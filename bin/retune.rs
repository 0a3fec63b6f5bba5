//! `retune` command-line entry point.
//!
//! Builds the tuning table from a Scala scale (and optional keyboard mapping), opens a
//! MIDI input and output, and translates until Enter is pressed.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use retune::{load_config, RetuneConfig, RetuneEngine, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "retune", version, about = "Real-time MIDI re-tuner")]
struct Cli {
    /// Scala scale file (.scl)
    scale: PathBuf,

    /// Scala keyboard mapping file (.kbm)
    #[arg(short = 'k', long = "keyboard-mapping", value_name = "KBM")]
    keyboard_mapping: Option<PathBuf>,

    /// Pitch-bend half range of the receiver in cents
    #[arg(short = 'p', long = "pitch-range", value_name = "CENTS")]
    pitch_range: Option<f64>,

    /// Enabled output channels as a bitmask (decimal or 0x hex), bit 0 = channel 1
    #[arg(short = 'm', long = "channel-mask", value_name = "MASK", value_parser = parse_mask)]
    channel_mask: Option<u16>,

    /// TOML config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the translation table
    #[arg(long)]
    print_table: bool,

    /// Build and print the table, then exit without opening ports
    #[arg(long)]
    dry_run: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_mask(text: &str) -> std::result::Result<u16, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed.map_err(|e| format!("'{}' is not a 16-bit channel mask: {}", text, e))
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(cli: &Cli) -> Result<RetuneConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RetuneConfig::default(),
    };
    if let Some(cents) = cli.pitch_range {
        config.pitch_range_cents = cents;
    }
    if let Some(mask) = cli.channel_mask {
        config.channel_mask = mask;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    let mut builder = RetuneEngine::builder()
        .config(config)
        .scale_file(&cli.scale);
    if let Some(path) = &cli.keyboard_mapping {
        builder = builder.mapping_file(path);
    }
    let engine = builder.build()?;

    if cli.print_table || cli.dry_run {
        print!("{}", engine.report());
    } else {
        debug!("Translation table:\n{}", engine.report());
    }
    if cli.dry_run {
        return Ok(());
    }

    let host = engine.open()?;
    info!("Retuning '{}'. Press Enter to quit.", engine.scale().label());

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let stats = host.shutdown();
    info!(
        "Stopped after {} blocks ({} input, {} output events dropped, {} overruns)",
        stats.blocks, stats.dropped_input, stats.dropped_output, stats.overruns
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
