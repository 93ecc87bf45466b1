// RuleBoard CLI - headless rule-table editing against the rule service.

mod exit_codes;
mod ops;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_TRANSPORT, EXIT_USAGE};
use ruleboard_catalog_client::{CatalogClient, ClientError};
use ruleboard_engine::{BoardEvent, ConditionSeed, FormulaSeed, RuleBoard};
use ruleboard_protocol::{ConditionTuple, FormulaTuple, RowsResult, SubmitRequest};

#[derive(Parser)]
#[command(name = "rboard")]
#[command(about = "Headless editor for device rule tables")]
#[command(version)]
struct Cli {
    /// Rule service base URL
    #[arg(
        long,
        env = "RBOARD_BASE_URL",
        default_value = "http://localhost:5000",
        global = true
    )]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the device and data-type catalogs
    Catalog {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fetch the rule tables for a device/type pair
    Pull {
        #[arg(long)]
        device: String,
        #[arg(long = "type")]
        data_type: String,
        #[arg(long)]
        json: bool,
    },

    /// Apply an operation script to a data set
    #[command(after_help = "\
The script holds one JSON op per line; blank lines and # comments are
skipped. Rows are addressed by display position (order, for formulas).

Examples:
  {\"op\":\"add_formula\"}
  {\"op\":\"edit_formula\",\"row\":3,\"field\":\"output_variable\",\"value\":\"v3\"}
  {\"op\":\"move_formula\",\"row\":1,\"to\":3}
  {\"op\":\"delete_formulas\",\"rows\":[2]}
  {\"op\":\"associate\",\"condition\":1,\"formulas\":[1,3]}")]
    Apply {
        /// Script file: one JSON op per line
        #[arg(long)]
        script: PathBuf,

        /// Seed file (RowsResult JSON) to edit locally instead of fetching
        #[arg(long)]
        input: Option<PathBuf>,

        /// Device to fetch (and to submit for)
        #[arg(long)]
        device: Option<String>,

        /// Data type to fetch (and to submit for)
        #[arg(long = "type")]
        data_type: Option<String>,

        /// Print the result as JSON (board snapshot)
        #[arg(long)]
        json: bool,

        /// Print per-op change events to stderr
        #[arg(long)]
        verbose: bool,

        /// Submit the edited data set afterwards
        #[arg(long)]
        submit: bool,
    },

    /// Submit a seed file as-is
    Submit {
        /// Seed file (RowsResult JSON)
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        device: String,
        #[arg(long = "type")]
        data_type: String,
    },
}

struct Failure {
    code: u8,
    message: String,
}

fn fail(code: u8, message: impl Into<String>) -> Failure {
    Failure {
        code,
        message: message.into(),
    }
}

impl From<ClientError> for Failure {
    fn from(err: ClientError) -> Self {
        let code = match err {
            ClientError::Network(_) | ClientError::Http(_, _) => EXIT_TRANSPORT,
            ClientError::Parse(_) => EXIT_PARSE,
            ClientError::Validation(_) | ClientError::Rejected(_) => EXIT_ERROR,
        };
        fail(code, err.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(f) => {
            eprintln!("error: {}", f.message);
            ExitCode::from(f.code)
        }
    }
}

fn run(cli: Cli) -> Result<(), Failure> {
    match cli.command {
        Commands::Catalog { json } => catalog(&cli.base_url, json),
        Commands::Pull {
            device,
            data_type,
            json,
        } => pull(&cli.base_url, &device, &data_type, json),
        Commands::Apply {
            script,
            input,
            device,
            data_type,
            json,
            verbose,
            submit,
        } => apply(
            &cli.base_url,
            &script,
            input.as_deref(),
            device.as_deref(),
            data_type.as_deref(),
            json,
            verbose,
            submit,
        ),
        Commands::Submit {
            input,
            device,
            data_type,
        } => submit_file(&cli.base_url, &input, &device, &data_type),
    }
}

fn catalog(base_url: &str, json: bool) -> Result<(), Failure> {
    let client = CatalogClient::new(base_url);
    let catalog = client.fetch_catalog()?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&catalog).map_err(|e| fail(EXIT_ERROR, e.to_string()))?
        );
        return Ok(());
    }
    println!("devices:");
    for (code, label) in &catalog.device {
        println!("  {code}  {label}");
    }
    println!("types:");
    for (code, label) in &catalog.data_type {
        println!("  {code}  {label}");
    }
    Ok(())
}

fn pull(base_url: &str, device: &str, data_type: &str, json: bool) -> Result<(), Failure> {
    let board = fetch_board(base_url, device, data_type)?;
    print_board(&board, json)
}

#[allow(clippy::too_many_arguments)]
fn apply(
    base_url: &str,
    script: &Path,
    input: Option<&Path>,
    device: Option<&str>,
    data_type: Option<&str>,
    json: bool,
    verbose: bool,
    submit: bool,
) -> Result<(), Failure> {
    let mut board = match (input, device, data_type) {
        (Some(path), _, _) => board_from_file(path, device, data_type)?,
        (None, Some(device), Some(data_type)) => fetch_board(base_url, device, data_type)?,
        _ => {
            return Err(fail(
                EXIT_USAGE,
                "apply needs --input FILE, or --device and --type to fetch",
            ))
        }
    };
    if submit && board.selected_pair().is_none() {
        return Err(fail(EXIT_USAGE, "--submit needs --device and --type"));
    }

    let text = fs::read_to_string(script)
        .map_err(|e| fail(EXIT_IO, format!("cannot read {}: {e}", script.display())))?;
    let script_ops = ops::parse_script(&text)
        .map_err(|(line, e)| fail(EXIT_PARSE, format!("script line {line}: {e}")))?;

    board.take_events();
    for (idx, op) in script_ops.into_iter().enumerate() {
        ops::apply(&mut board, op).map_err(|e| fail(EXIT_ERROR, format!("op {}: {e}", idx + 1)))?;
        let events = board.take_events();
        if verbose {
            print_events(&events);
        }
    }

    print_board(&board, json)?;

    if submit {
        let client = CatalogClient::new(base_url);
        client.submit(&submit_request(&board)?)?;
        eprintln!("submitted");
    }
    Ok(())
}

fn submit_file(base_url: &str, input: &Path, device: &str, data_type: &str) -> Result<(), Failure> {
    let board = board_from_file(input, Some(device), Some(data_type))?;
    let client = CatalogClient::new(base_url);
    client.submit(&submit_request(&board)?)?;
    eprintln!("submitted");
    Ok(())
}

// =============================================================================
// Board construction and serialization
// =============================================================================

fn fetch_board(base_url: &str, device: &str, data_type: &str) -> Result<RuleBoard, Failure> {
    let client = CatalogClient::new(base_url);
    let rows = client.fetch_rows(device, data_type)?;
    Ok(board_from_rows(rows, Some(device), Some(data_type)))
}

fn board_from_file(
    path: &Path,
    device: Option<&str>,
    data_type: Option<&str>,
) -> Result<RuleBoard, Failure> {
    let text = fs::read_to_string(path)
        .map_err(|e| fail(EXIT_IO, format!("cannot read {}: {e}", path.display())))?;
    let rows: RowsResult = serde_json::from_str(&text)
        .map_err(|e| fail(EXIT_PARSE, format!("{}: {e}", path.display())))?;
    Ok(board_from_rows(rows, device, data_type))
}

fn board_from_rows(rows: RowsResult, device: Option<&str>, data_type: Option<&str>) -> RuleBoard {
    let mut board = RuleBoard::new();
    board.set_device(device.map(str::to_string));
    board.set_data_type(data_type.map(str::to_string));

    let conditions = rows
        .if_symbols
        .into_iter()
        .map(|ConditionTuple(expr, failure, tags)| ConditionSeed {
            condition_expr: expr,
            failure_handling: failure,
            impact_tags: tags,
        })
        .collect();
    let formulas = rows
        .formulas
        .into_iter()
        .map(|FormulaTuple(var, expr, order, extra1, extra2)| FormulaSeed {
            output_variable: var,
            expression: expr,
            order,
            extra1,
            extra2,
        })
        .collect();

    let ticket = board.begin_load();
    board.apply_rows(ticket, conditions, formulas);
    board
}

fn submit_request(board: &RuleBoard) -> Result<SubmitRequest, Failure> {
    let (device, data_type) = board
        .selected_pair()
        .ok_or_else(|| fail(EXIT_USAGE, "no device/type pair selected"))?;
    let (conditions, formulas) = board.export_rows();
    Ok(SubmitRequest {
        device: device.to_string(),
        data_type: data_type.to_string(),
        if_symbols: conditions
            .into_iter()
            .map(|c| ConditionTuple(c.condition_expr, c.failure_handling, c.impact_tags))
            .collect(),
        formulas: formulas
            .into_iter()
            .map(|r| FormulaTuple(r.output_variable, r.expression, r.order, r.extra1, r.extra2))
            .collect(),
    })
}

fn print_board(board: &RuleBoard, json: bool) -> Result<(), Failure> {
    if json {
        let snapshot = board.snapshot();
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).map_err(|e| fail(EXIT_ERROR, e.to_string()))?
        );
        return Ok(());
    }

    let view = board.snapshot();
    println!("conditions:");
    for (idx, row) in view.conditions.iter().enumerate() {
        println!(
            "  {:>3}  {:<30}  {:<20}  [{}]",
            idx + 1,
            row.condition_expr,
            row.failure_handling,
            row.impact_tags
        );
    }
    println!("formulas:");
    for row in &view.formulas {
        println!(
            "  {:>3}  {:<16}  {:<30}  {}  {}",
            row.order, row.output_variable, row.expression, row.extra1, row.extra2
        );
    }
    Ok(())
}

fn print_events(events: &[BoardEvent]) {
    for event in events {
        if let BoardEvent::OrdersRemapped(mapping) = event {
            if mapping.is_identity() {
                continue;
            }
            let parts: Vec<String> = mapping
                .iter()
                .filter_map(|(old, new)| match new {
                    Some(n) if n != old => Some(format!("{old}->{n}")),
                    Some(_) => None,
                    None => Some(format!("{old} removed")),
                })
                .collect();
            eprintln!("remap: {}", parts.join(", "));
        }
    }
}
