//! listsync CLI entrypoint.
//!
//! This is the main entrypoint for the listsync command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use listsync::cli::{Cli, Commands, OutputFormatter, StateCommands};
use listsync::client::{ApiClient, ListRequest};
use listsync::config::{find_config_file, ConfigParser, ConfigValidator, ListConfig, SyncConfig};
use listsync::error::{ConfigError, ListSyncError, ReconcileError, Result};
use listsync::merge::{merge, ListDiff};
use listsync::paginate::fetch_all;
use listsync::reconciler::{json_key, ReconciliationReport, Reconciler};
use listsync::state::{LocalStateStore, StateStore};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Merge { local, remote } => cmd_merge(&local, &remote, &formatter),
        Commands::Fetch { list, page_size } => {
            cmd_fetch(config_path, &list, page_size, &formatter).await
        }
        Commands::Reconcile { list } => {
            cmd_reconcile(config_path, list.as_deref(), &formatter).await
        }
        Commands::Drift => cmd_drift(config_path, &formatter).await,
        Commands::Validate { warnings } => cmd_validate(config_path, warnings, &formatter),
        Commands::State { command } => cmd_state(config_path, command, &formatter).await,
    }
}

/// Merge two orderings read from JSON files.
fn cmd_merge(local_path: &Path, remote_path: &Path, formatter: &OutputFormatter) -> Result<()> {
    let local = read_ordering(local_path)?;
    let remote = read_ordering(remote_path)?;
    debug!("Merging {} local and {} remote items", local.len(), remote.len());

    let merged = merge(&local, &remote);
    let diff = ListDiff::between(&local, &remote);

    write_output(&formatter.format_merge(&merged, &diff))
}

/// Fetch one configured list.
async fn cmd_fetch(
    config_path: Option<&Path>,
    name: &str,
    page_size: Option<u32>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let list = find_list(&config, name)?;
    let client = ApiClient::new(&config.api)?;

    let options = config
        .pagination
        .fetch_options(page_size.or(list.page_size))?;
    let request = list_request(&client, list);

    let outcome = fetch_all(&request, &options).await;
    let keys: Vec<String> = outcome.items.iter().filter_map(json_key(&list.key)).collect();

    write_output(&formatter.format_fetch(name, &keys, outcome.pages_fetched))?;

    if outcome.is_complete() {
        return Ok(());
    }

    warn!("Listing '{name}' is incomplete: {} items fetched", outcome.items.len());
    match outcome.last_failure() {
        Some(failure) => Err(ListSyncError::Api(failure.error.clone())),
        None => Err(ListSyncError::internal("fetch stopped without a recorded failure")),
    }
}

/// Reconcile one or all configured lists.
async fn cmd_reconcile(
    config_path: Option<&Path>,
    only: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let lists = select_lists(&config, only)?;
    let client = ApiClient::new(&config.api)?;
    let store = open_store(&config)?;

    info!("Reconciling {} lists", lists.len());

    let mut report = ReconciliationReport::new();
    for list in lists {
        let result = match config.fetch_options_for(list) {
            Ok(options) => {
                Reconciler::new(&store)
                    .with_options(options)
                    .reconcile_list(&list.name, &list_request(&client, list), json_key(&list.key))
                    .await
            }
            Err(e) => Err(e.into()),
        };
        report.record(&list.name, result);
    }

    write_output(&formatter.format_reconciliation(&report))?;
    finish_report(&report)
}

/// Check every configured list for drift.
async fn cmd_drift(config_path: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let config = load_config(config_path)?;
    let client = ApiClient::new(&config.api)?;
    let store = open_store(&config)?;

    let mut report = ReconciliationReport::new();
    for list in &config.lists {
        let result = match config.fetch_options_for(list) {
            Ok(options) => {
                Reconciler::new(&store)
                    .with_options(options)
                    .check_list(&list.name, &list_request(&client, list), json_key(&list.key))
                    .await
            }
            Err(e) => Err(e.into()),
        };
        report.record(&list.name, result);
    }

    write_output(&formatter.format_drift(&report))?;
    finish_report(&report)
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&Path>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let parser = parser_for(&config_file);
    parser.load_dotenv()?;
    let config = parser.load_with_env(&config_file)?;

    let result = ConfigValidator::new().check(&config);
    write_output(&formatter.format_validation(&result, show_warnings))?;

    match result.errors.first() {
        None => Ok(()),
        Some(first) => Err(ConfigError::validation(first.message.clone(), first.field.clone()).into()),
    }
}

/// Inspect or clear the stored state.
async fn cmd_state(
    config_path: Option<&Path>,
    command: StateCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    match command {
        StateCommands::Show { list } => {
            if let Some(state) = store.load().await? {
                write_output(&formatter.format_state(&state, list.as_deref()))?;
            } else {
                eprintln!("No state found.");
            }
        }
        StateCommands::Clear => {
            store.delete().await?;
            eprintln!("State cleared ({} backend).", store.backend_type());
        }
    }

    Ok(())
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.to_path_buf()))
}

/// Creates a parser that reads `.env` next to the configuration file.
fn parser_for(config_file: &Path) -> ConfigParser {
    ConfigParser::new().with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")))
}

/// Loads, overrides, and validates the configuration.
fn load_config(config_path: Option<&Path>) -> Result<SyncConfig> {
    let config_file = resolve_config_path(config_path)?;
    let parser = parser_for(&config_file);
    parser.load_dotenv()?;

    let config = parser.load_with_env(&config_file)?;
    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok(config)
}

/// Looks up a configured list by name.
fn find_list<'a>(config: &'a SyncConfig, name: &str) -> Result<&'a ListConfig> {
    config.list(name).ok_or_else(|| {
        ListSyncError::Config(ConfigError::UnknownList {
            name: name.to_string(),
        })
    })
}

/// Selects one named list, or all lists.
fn select_lists<'a>(config: &'a SyncConfig, only: Option<&str>) -> Result<Vec<&'a ListConfig>> {
    match only {
        Some(name) => Ok(vec![find_list(config, name)?]),
        None => Ok(config.lists.iter().collect()),
    }
}

/// Builds the request for a configured list.
fn list_request(client: &ApiClient, list: &ListConfig) -> ListRequest<serde_json::Value> {
    list.query
        .iter()
        .fold(client.list(&list.path), |request, (key, value)| {
            request.with_query(key, value)
        })
}

/// Opens the configured state store.
fn open_store(config: &SyncConfig) -> Result<Box<dyn StateStore>> {
    let store = match &config.state.path {
        Some(path) => LocalStateStore::with_state_path(path),
        None => LocalStateStore::new()?,
    };
    debug!("Using state file: {}", store.state_path().display());
    Ok(Box::new(store))
}

/// Reads a JSON array of strings from a file.
fn read_ordering(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ListSyncError::Config(ConfigError::ParseError {
            message: format!("Expected a JSON array of strings: {e}"),
            location: Some(path.display().to_string()),
        })
    })
}

/// Turns a report with failed lists into an error.
fn finish_report(report: &ReconciliationReport) -> Result<()> {
    if report.success() {
        return Ok(());
    }
    Err(ListSyncError::Reconcile(ReconcileError::Aborted {
        reason: format!("{} lists failed", report.errors.len()),
    }))
}

/// Writes command output to stdout.
fn write_output(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end())?;
    stdout.flush()?;
    Ok(())
}

