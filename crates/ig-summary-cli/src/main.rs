//! IG Summary CLI
//!
//! Command-line interface for generating and diffing FHIR IG data dictionaries

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use ig_summary_core::{DataDictionaryMode, init_tracing};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "ig-summary")]
#[command(about = "Data dictionaries for FHIR Implementation Guides")]
#[command(version = ig_summary_core::VERSION)]
#[command(
    long_about = "ig-summary lists every profiled element of a FHIR Implementation Guide in a data dictionary,\n\
and compares two data dictionaries to show what changed between releases.\n\
\n\
Examples:\n  \
ig-summary create --input ./my-ig --output ./out          # Data dictionary of a built IG\n  \
ig-summary create -i ./my-ig -o ./out --mode all         # Include non must-support elements\n  \
ig-summary diff --a old.json --b new.json --output ./out # Compare two data dictionaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level, overriding --verbose
    #[arg(short = 'l', long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data dictionary of an Implementation Guide
    Create {
        /// IG folder: either the IG source (with sushi-config.yaml and output/) or an unpacked package
        #[arg(short, long)]
        input: PathBuf,

        /// Folder the data dictionary is written to
        #[arg(short, long)]
        output: PathBuf,

        /// Elements to include, overriding the settings file
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Data dictionary settings (YAML)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// A previous data dictionary (JSON) to compare the new one against
        #[arg(short, long)]
        comparison: Option<PathBuf>,

        /// Additional folders with dependency definitions (can be used multiple times)
        #[arg(short, long)]
        dependency: Vec<PathBuf>,
    },

    /// Compare two data dictionaries
    Diff {
        /// The "old" data dictionary (JSON)
        #[arg(long)]
        a: PathBuf,

        /// The "new" data dictionary (JSON)
        #[arg(long)]
        b: PathBuf,

        /// Folder the diff is written to
        #[arg(short, long)]
        output: PathBuf,

        /// Diff settings (YAML)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Must-support elements only
    Ms,
    /// Every element
    All,
}

impl From<ModeArg> for DataDictionaryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ms => DataDictionaryMode::MustSupport,
            ModeArg::All => DataDictionaryMode::All,
        }
    }
}

fn log_filter(log_level: Option<LogLevel>, verbose: u8) -> &'static str {
    match (log_level, verbose) {
        (Some(LogLevel::Error), _) => "ig_summary=error",
        (Some(LogLevel::Warn), _) => "ig_summary=warn",
        (Some(LogLevel::Info), _) => "ig_summary=info",
        (Some(LogLevel::Debug), _) => "ig_summary=debug",
        (None, 0) => "ig_summary=info",
        (None, 1) => "ig_summary=debug",
        (None, _) => "ig_summary=trace",
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize colored output
    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    unsafe {
        std::env::set_var("RUST_LOG", log_filter(cli.log_level, cli.verbose));
    }
    init_tracing();

    if let Err(e) = run_command(cli) {
        error!("ig-summary failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Create {
            input,
            output,
            mode,
            settings,
            comparison,
            dependency,
        } => commands::create::create_command(commands::create::CreateOptions {
            input,
            output,
            mode: mode.map(Into::into),
            settings,
            comparison,
            dependencies: dependency,
        }),
        Commands::Diff {
            a,
            b,
            output,
            settings,
        } => commands::diff::diff_command(&a, &b, &output, settings.as_deref()),
    }
}
