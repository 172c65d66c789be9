mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use recform_core::Context;
use tracing_subscriber::EnvFilter;

use commands::{cmd_check, cmd_convert, cmd_edit, cmd_prompt};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Prompt for, edit, convert and check lists of records.
#[derive(Parser)]
#[command(
    name = "recform",
    version,
    about = "Prompt for, edit, convert and check lists of records"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable an option for this run (live_datetime, convert_unknown_enum_to_none)
    #[arg(long = "option", global = true, value_name = "NAME")]
    options: Vec<String>,

    /// Do not record or log advisory warnings
    #[arg(long, global = true)]
    no_warnings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt for one record and append it to a data file
    Prompt {
        /// Path to the record schema (JSON or YAML)
        schema: PathBuf,
        /// Data file holding a list of records (.json, .yaml or .yml)
        file: PathBuf,
        /// Fail instead of starting an empty list when the file is missing
        #[arg(long)]
        no_create: bool,
    },

    /// Edit one record of a data file in place
    Edit {
        /// Path to the record schema (JSON or YAML)
        schema: PathBuf,
        /// Data file holding a list of records
        file: PathBuf,
        /// Index of the record to edit (defaults to the last one)
        #[arg(long)]
        index: Option<usize>,
        /// Keep editing fields until DONE EDITING is picked
        #[arg(long = "loop")]
        repeat: bool,
        /// Show the record before each field choice
        #[arg(long)]
        show: bool,
    },

    /// Load a data file and write it in another format
    Convert {
        /// Path to the record schema (JSON or YAML)
        schema: PathBuf,
        /// Data file to read
        input: PathBuf,
        /// Data file to write; the format follows its extension
        output_file: PathBuf,
        /// Write JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Load a data file and report its records and warnings
    Check {
        /// Path to the record schema (JSON or YAML)
        schema: PathBuf,
        /// Data file holding a list of records
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let ctx = Context::from_env();
    if cli.no_warnings {
        ctx.warnings().suppress(true);
    }
    let _scope = match ctx.options().enable_named(cli.options.as_slice()) {
        Ok(scope) => scope,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Prompt {
            schema,
            file,
            no_create,
        } => {
            cmd_prompt(&schema, &file, !no_create, &ctx, cli.output, cli.quiet);
        }
        Commands::Edit {
            schema,
            file,
            index,
            repeat,
            show,
        } => {
            cmd_edit(&schema, &file, index, repeat, show, &ctx, cli.output, cli.quiet);
        }
        Commands::Convert {
            schema,
            input,
            output_file,
            compact,
        } => {
            cmd_convert(&schema, &input, &output_file, compact, &ctx, cli.output, cli.quiet);
        }
        Commands::Check { schema, file } => {
            cmd_check(&schema, &file, &ctx, cli.output, cli.quiet);
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`, or `error` when quiet).
fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
