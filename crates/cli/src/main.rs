// emendas CLI - classify budget amendments from a TOML config

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use emendas_engine::EmendasError;

use exit_codes::{engine_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "emendas")]
#[command(about = "Decide budget amendments: approved, partially approved or rejected")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the ledger and mandatory-allocation tables
    #[command(after_help = "\
Examples:
  emendas run loa2025.toml
  emendas run loa2025.toml --input processaemendas.xlsm --output resultado.xlsx
  emendas run loa2025.toml --json
  emendas run loa2025.toml --report run.json")]
    Run {
        /// Path to the TOML config file
        config: PathBuf,

        /// Workbook file or CSV directory to read (overrides `input`)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Workbook file or CSV directory to write (overrides `output`)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the run report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the run report as JSON to a file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  emendas validate loa2025.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  emendas-engine ", env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, input, output, json, report } => run::cmd_run(config, input, output, json, report),
        Commands::Validate { config } => run::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Engine and adapter errors, with the exit code the registry assigns.
    pub fn engine(err: EmendasError) -> Self {
        let hint = match &err {
            EmendasError::MissingColumn { .. } => Some("check the [columns] section of the config".to_string()),
            EmendasError::MalformedTable { .. } => {
                Some("a table needs a header row and at least one numeric amendment code".to_string())
            }
            _ => None,
        };
        Self { code: engine_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
