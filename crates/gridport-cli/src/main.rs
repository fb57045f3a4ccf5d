//! `gridport`: table-aware reads and updates for remote spreadsheets.
//!
//! Every command prints one JSON envelope to stdout on success
//! (`{"ok": true, "result": ...}`) or to stderr on failure
//! (`{"ok": false, "error": {"kind", "message"}}`), and exits with a code
//! from the registry in `exit_codes`.

mod exit_codes;

use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value as JsonValue, json};
use tracing_subscriber::EnvFilter;

use gridport_engine::{
    BatchOp, CellValue, GridPort, GridPortError, ReadOptions, ValueInput, WriteOptions,
};
use gridport_sheets::{SheetsClient, SheetsConfig};

#[derive(Parser)]
#[command(name = "gridport")]
#[command(about = "Table-aware reads and addressed updates for remote spreadsheets")]
#[command(version)]
struct Cli {
    /// Spreadsheet ID
    #[arg(long, global = true, env = "GRIDPORT_SPREADSHEET")]
    spreadsheet: Option<String>,

    /// OAuth bearer token
    #[arg(long, global = true, env = "GRIDPORT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Values API base URL override
    #[arg(long, global = true, env = "GRIDPORT_BASE_URL", hide = true)]
    base_url: Option<String>,

    /// Compute writes without applying them
    #[arg(long, global = true)]
    dry_run: bool,

    /// How written values are interpreted by the service
    #[arg(long, global = true, value_enum, default_value_t = InputMode::UserEntered)]
    value_input: InputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputMode {
    /// Store values literally
    Raw,
    /// Parse values as if typed into the grid
    UserEntered,
}

impl From<InputMode> for ValueInput {
    fn from(mode: InputMode) -> Self {
        match mode {
            InputMode::Raw => ValueInput::Raw,
            InputMode::UserEntered => ValueInput::UserEntered,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the spreadsheet's tabs
    Tabs,

    /// Read a sheet's table as addressed records
    #[command(after_help = "\
Examples:
  gridport read Tasks
  gridport read Tasks --limit 10 --raw
  gridport read Tasks --range A2:C9 --header-row 1")]
    Read {
        sheet: String,
        /// Stop after this many data rows
        #[arg(long)]
        limit: Option<usize>,
        /// Read this range instead of the inferred data window
        #[arg(long)]
        range: Option<String>,
        /// Pin the header row instead of inferring it
        #[arg(long)]
        header_row: Option<u32>,
        /// Unformatted typed values instead of display strings
        #[arg(long)]
        raw: bool,
    },

    /// Append one row, addressed by column name or letter
    #[command(after_help = "\
Examples:
  gridport append Tasks '{\"Name\": \"Acme\", \"Status\": \"Active\"}'
  gridport append Tasks '{\"A\": 42}' --dry-run")]
    Append {
        sheet: String,
        /// JSON object mapping column references to values
        values: String,
    },

    /// Update cells in rows addressed by row number or by key match
    #[command(after_help = "\
Examples:
  gridport update Tasks '{\"Status\": \"Done\"}' --row 7
  gridport update Tasks '{\"Status\": \"Done\"}' --key ID=T-1
  gridport update Tasks '{\"Status\": \"Done\"}' --key Status=Open --allow-multi")]
    Update {
        sheet: String,
        /// JSON object mapping column references to new values
        set: String,
        /// Absolute 1-based grid row to update
        #[arg(long, conflicts_with = "key")]
        row: Option<i64>,
        /// Key match, written COLUMN=VALUE
        #[arg(long)]
        key: Option<String>,
        /// Permit a key that matches more than one row
        #[arg(long, requires = "key")]
        allow_multi: bool,
    },

    /// Write a literal block of values to an explicit range
    SetRange {
        sheet: String,
        /// Target range, e.g. B2:D4
        range: String,
        /// JSON array of rows, e.g. '[["a", 1], ["b", 2]]'
        values: String,
    },

    /// Run an ordered sequence of operations from a JSON array
    #[command(after_help = "\
Example:
  gridport batch Tasks '[
    {\"op\": \"append\", \"values\": {\"ID\": \"T-9\", \"Status\": \"Open\"}},
    {\"op\": \"updateByKey\", \"key\": \"ID\", \"value\": \"T-1\", \"set\": {\"Status\": \"Done\"}}
  ]'")]
    Batch {
        sheet: String,
        /// JSON array of operations
        ops: String,
    },
}

enum CliError {
    Usage(anyhow::Error),
    Op(GridPortError),
}

impl From<GridPortError> for CliError {
    fn from(err: GridPortError) -> Self {
        CliError::Op(err)
    }
}

impl CliError {
    fn parts(&self) -> (&'static str, String, u8) {
        match self {
            CliError::Usage(err) => ("usage", err.to_string(), exit_codes::EXIT_USAGE),
            CliError::Op(err) => (
                err.kind().as_str(),
                err.to_string(),
                exit_codes::for_kind(err.kind()),
            ),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(result) => {
            println!("{}", json!({"ok": true, "result": result}));
            ExitCode::from(exit_codes::EXIT_SUCCESS)
        }
        Err(err) => {
            let (kind, message, code) = err.parts();
            eprintln!("{}", json!({"ok": false, "error": {"kind": kind, "message": message}}));
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<JsonValue, CliError> {
    let spreadsheet = cli.spreadsheet.clone().ok_or_else(|| {
        CliError::Usage(anyhow!(
            "no spreadsheet id; pass --spreadsheet or set GRIDPORT_SPREADSHEET"
        ))
    })?;
    let token = cli.token.clone().ok_or_else(|| {
        CliError::Usage(anyhow!("no token; pass --token or set GRIDPORT_TOKEN"))
    })?;

    let client = SheetsClient::new(SheetsConfig {
        spreadsheet_id: spreadsheet,
        token,
        base_url: cli.base_url.clone(),
    })
    .map_err(GridPortError::from)?;
    let mut port = GridPort::new(client);
    let opts = WriteOptions {
        value_input: cli.value_input.into(),
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Tabs => {
            let tabs = port.list_tabs()?;
            Ok(serde_json::to_value(tabs).unwrap_or(JsonValue::Null))
        }
        Commands::Read {
            sheet,
            limit,
            range,
            header_row,
            raw,
        } => {
            let slice = port.read_table(
                &sheet,
                &ReadOptions {
                    limit,
                    range,
                    header_row,
                    raw,
                },
            )?;
            Ok(slice.to_json())
        }
        Commands::Append { sheet, values } => {
            let values = parse_pairs(&values)?;
            let result = port.append(&sheet, &values, &opts)?;
            Ok(serde_json::to_value(result).unwrap_or(JsonValue::Null))
        }
        Commands::Update {
            sheet,
            set,
            row,
            key,
            allow_multi,
        } => {
            let set = parse_pairs(&set)?;
            match (row, key) {
                (Some(row), None) => {
                    let result = port.update_by_row(&sheet, row, &set, &opts)?;
                    Ok(serde_json::to_value(result).unwrap_or(JsonValue::Null))
                }
                (None, Some(key)) => {
                    let (column, value) = key.split_once('=').ok_or_else(|| {
                        CliError::Usage(anyhow!("--key must be written COLUMN=VALUE"))
                    })?;
                    let result =
                        port.update_by_key(&sheet, column, value, &set, allow_multi, &opts)?;
                    Ok(serde_json::to_value(result).unwrap_or(JsonValue::Null))
                }
                (None, None) => Err(CliError::Usage(anyhow!("pass --row or --key"))),
                (Some(_), Some(_)) => unreachable!("clap rejects --row with --key"),
            }
        }
        Commands::SetRange {
            sheet,
            range,
            values,
        } => {
            let rows = parse_rows(&values)?;
            let result = port.set_range(&sheet, &range, &rows, &opts)?;
            Ok(serde_json::to_value(result).unwrap_or(JsonValue::Null))
        }
        Commands::Batch { sheet, ops } => {
            let ops: Vec<BatchOp> = serde_json::from_str(&ops)
                .map_err(|e| CliError::Usage(anyhow!("invalid batch operations: {e}")))?;
            let outcomes = port.run_batch(&sheet, &ops, &opts)?;
            Ok(serde_json::to_value(outcomes).unwrap_or(JsonValue::Null))
        }
    }
}

/// Parse a JSON object into addressed values, preserving key order.
fn parse_pairs(raw: &str) -> Result<Vec<(String, CellValue)>, CliError> {
    let map: Map<String, JsonValue> = serde_json::from_str(raw)
        .map_err(|e| CliError::Usage(anyhow!("expected a JSON object: {e}")))?;
    Ok(map
        .iter()
        .map(|(key, value)| (key.clone(), CellValue::from_json(value)))
        .collect())
}

/// Parse a JSON array of rows into a literal block.
fn parse_rows(raw: &str) -> Result<Vec<Vec<CellValue>>, CliError> {
    let rows: Vec<Vec<JsonValue>> = serde_json::from_str(raw)
        .map_err(|e| CliError::Usage(anyhow!("expected a JSON array of rows: {e}")))?;
    Ok(rows
        .iter()
        .map(|row| row.iter().map(CellValue::from_json).collect())
        .collect())
}
