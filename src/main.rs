use std::{path::PathBuf, process::exit};

use anyhow::Context;
use clap::Parser;
use jack_bytecode::driver::{self, DriverConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Compiles Jack sources into VM bytecode text.
#[derive(Parser, Debug)]
#[command(name = "jack-bytecode", version)]
struct Cli {
    /// A .jack file or a directory of .jack files
    path: PathBuf,

    /// Write .vm files into this directory instead of next to the sources
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Print the bytecode to stdout instead of writing files
    #[arg(long, conflicts_with = "out_dir")]
    stdout: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of parallel workers
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,
}

impl From<Cli> for DriverConfig {
    fn from(cli: Cli) -> Self {
        DriverConfig {
            input: cli.path,
            out_dir: cli.out_dir,
            to_stdout: cli.stdout,
            jobs: cli.jobs,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.into()) {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit(2);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Returns `false` when at least one unit failed to compile.
fn run(config: DriverConfig) -> anyhow::Result<bool> {
    let summary = driver::run(&config)
        .with_context(|| format!("Failed to compile {}", config.input.display()))?;

    if config.to_stdout {
        for unit in &summary.compiled {
            print!("{}", unit.text);
        }
    }
    for failure in &summary.failures {
        eprintln!("{}", failure.diagnostic());
    }
    if !summary.is_success() {
        eprintln!(
            "{} of {} unit(s) failed",
            summary.failures.len(),
            summary.total()
        );
    }
    Ok(summary.is_success())
}
