use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use gpst::tools::{self, ProcessOptions};
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Process GPS activity tracks", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a track, calculate additional data and save it as GPX
    Process {
        /// FIT or GPX file to read
        #[arg(value_hint = ValueHint::FilePath)]
        in_file: PathBuf,

        /// GPX file to write
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out_file: PathBuf,

        /// Overwrite the output without asking
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,

        /// Save the track as read, without derived data
        #[arg(long, action = ArgAction::SetTrue)]
        no_calculate: bool,

        /// Print the summary table as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        summary: bool,
    },
    /// Convert a FIT file to GPX
    Convert {
        #[arg(value_hint = ValueHint::FilePath)]
        in_file: PathBuf,

        /// Defaults to the input path with a .gpx extension
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out_file: Option<PathBuf>,

        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    print!("{} exists. Overwrite? [y/N] ", path.display());
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Process {
            in_file,
            out_file,
            yes,
            no_calculate,
            summary,
        } => {
            let options = ProcessOptions {
                overwrite: yes,
                skip_calculation: no_calculate,
                ..Default::default()
            };
            let track = tools::process(&in_file, &out_file, &options, confirm_overwrite)?;
            if summary {
                println!("{}", serde_json::to_string_pretty(track.summary())?);
            }
        }
        Command::Convert {
            in_file,
            out_file,
            yes,
        } => {
            tools::convert(&in_file, out_file.as_deref(), yes, confirm_overwrite)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
