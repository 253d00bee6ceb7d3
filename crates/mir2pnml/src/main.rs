//! mir2pnml CLI - translates a textual MIR dump into a PNML Place/Transition net.
//!
//! This is the only part of the tool allowed to touch the filesystem,
//! read environment variables, or call `std::process::exit`. Everything
//! else is pure transformation living in `mir2pnml-core`.

mod error;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use error::{Mir2PnmlError, Result};

/// Translate a textual MIR dump into a PNML 2009 Place/Transition net.
#[derive(Parser, Debug)]
#[command(name = "mir2pnml")]
#[command(author = "Fax Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Translate a textual MIR dump into a PNML Place/Transition net", long_about = None)]
struct Cli {
    /// Path to the MIR text dump to translate
    #[arg(long)]
    mir: PathBuf,

    /// Path to write the PNML output to
    #[arg(long)]
    out: PathBuf,

    /// Name of the function to treat as the net's entry point
    #[arg(long, default_value = "main")]
    entry_fn: String,

    /// Maximum number of functions to translate (default: unlimited)
    #[arg(long)]
    max_fns: Option<usize>,

    /// Also write the in-memory net as JSON to this path
    #[arg(long)]
    dump_json: Option<PathBuf>,

    /// Reserved for future reader/writer fan-out modeling; currently inert
    #[arg(long)]
    rwlock_n: Option<u32>,

    /// Increase log verbosity (repeatable: -v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable ANSI color in diagnostic output
    #[arg(long, global = true)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, no_color: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(n) = cli.rwlock_n {
        debug!(rwlock_n = n, "rwlock-n is reserved and has no effect yet");
    }

    info!(path = %cli.mir.display(), "reading MIR input");
    let text = fs::read_to_string(&cli.mir).map_err(Mir2PnmlError::Io)?;

    let functions = mir2pnml_core::parse(&text)?;
    debug!(count = functions.len(), "parsed functions");
    if functions.is_empty() {
        return Err(Mir2PnmlError::EmptyInput);
    }
    if !functions.iter().any(|f| f.name == cli.entry_fn) {
        return Err(Mir2PnmlError::EntryFnNotFound(cli.entry_fn.clone()));
    }

    let net = mir2pnml_core::build(&functions, &cli.entry_fn, cli.max_fns);
    info!(
        places = net.places.len(),
        transitions = net.transitions.len(),
        arcs = net.arcs.len(),
        warnings = net.warnings.len(),
        "built Petri net"
    );
    for w in &net.warnings {
        warn!(
            function = %w.function,
            basic_block = %w.basic_block,
            line = w.line,
            callee = w.callee.as_deref().unwrap_or(""),
            "{}",
            w.reason
        );
    }

    let pnml = mir2pnml_core::write_pnml(&net)?;
    fs::write(&cli.out, pnml).map_err(Mir2PnmlError::Io)?;
    info!(path = %cli.out.display(), "wrote PNML output");

    if let Some(json_path) = &cli.dump_json {
        let json = net.to_json()?;
        fs::write(json_path, json).map_err(Mir2PnmlError::Io)?;
        info!(path = %json_path.display(), "wrote JSON dump");
    }

    Ok(())
}
