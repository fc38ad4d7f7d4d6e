//! `emendas run` and `emendas validate`: config-driven decision runs.

use std::path::{Path, PathBuf};

use emendas_engine::{EmendasConfig, Pipeline, RunReport, TableSummary};
use emendas_io::{is_workbook, open_source, Output};

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO, EXIT_USAGE};
use crate::CliError;

fn run_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Read, parse and validate the config, resolving its paths against the
/// config file's directory.
fn load_config(config_path: &Path) -> Result<EmendasConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        run_err(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
    })?;

    let mut config = EmendasConfig::from_toml(&config_str).map_err(CliError::engine)?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base_dir);
    Ok(config)
}

pub fn cmd_run(
    config_path: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    json_output: bool,
    report_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    let input = input.or_else(|| config.input.clone()).ok_or_else(|| {
        run_err(EXIT_INVALID_CONFIG, "no input configured")
            .with_hint("set `input` in the config or pass --input")
    })?;

    // A CSV directory is updated in place unless told otherwise; a workbook
    // never is, since only the processed tables would survive the rewrite.
    let output = match output.or_else(|| config.output.clone()) {
        Some(path) => path,
        None if is_workbook(&input) => {
            return Err(run_err(EXIT_INVALID_CONFIG, "no output configured for workbook input")
                .with_hint("set `output` in the config or pass --output (an .xlsx file or a directory)"));
        }
        None => input.clone(),
    };

    log::info!("{}: {} -> {}", config.name, input.display(), output.display());

    let mut source = open_source(&input).map_err(CliError::engine)?;
    let mut sink = Output::create(&output).map_err(CliError::engine)?;

    let pipeline = Pipeline::new(config);
    let report = pipeline
        .run(source.as_mut(), &mut sink)
        .map_err(CliError::engine)?;
    sink.finish().map_err(CliError::engine)?;

    if json_output || report_file.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| run_err(EXIT_IO, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = report_file {
            std::fs::write(path, &json_str)
                .map_err(|e| run_err(EXIT_IO, format!("cannot write report: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    print_summary(&report);
    eprintln!("output: {}", output.display());
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    eprintln!("config ok: {}", config.name);
    eprintln!("  ledger:    {}", config.tables.ledger);
    eprintln!("  mandatory: {}", config.tables.mandatory);
    eprintln!("  criteria:  {}", config.tables.criteria);
    match &config.mandatory.value_column {
        Some(col) => eprintln!("  mandatory value column: {col}"),
        None => eprintln!("  mandatory value column: (none, '{}' omitted)", config.output_columns.value),
    }
    if let Some(ref input) = config.input {
        if !input.exists() {
            eprintln!("warning: input {} does not exist", input.display());
        }
    }
    Ok(())
}

/// Human summary to stderr
fn print_summary(report: &RunReport) {
    for summary in [&report.ledger, &report.mandatory] {
        eprintln!("{}", summary_line(summary));
    }
}

fn summary_line(s: &TableSummary) -> String {
    format!(
        "{}: {} rows in {} groups: {} approved, {} partial, {} rejected; {} with usage id 6",
        s.table, s.rows, s.groups, s.approved, s.partially_approved, s.rejected, s.usage_flagged,
    )
}
