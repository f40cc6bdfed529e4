mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

use crate::commands::{
    backup, completions, customers, dispositions, report, transfer, Context,
};
use crate::error::{exit_code_for, report_error};
use pledgeline_config as config;
use pledgeline_core::time::now_utc;
use pledgeline_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "pledgeline", version, about = "pledgeline CLI")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage the disposition catalog
    #[command(subcommand)]
    Disposition(dispositions::DispositionCommand),
    #[command(name = "add-customer")]
    AddCustomer(customers::AddCustomerArgs),
    #[command(name = "edit-customer")]
    EditCustomer(customers::EditCustomerArgs),
    /// Record a disposition for a customer
    #[command(name = "set-disposition")]
    SetDisposition(customers::SetDispositionArgs),
    Show(customers::ShowArgs),
    List(customers::ListArgs),
    Delete(customers::DeleteArgs),
    #[command(subcommand)]
    Import(transfer::ImportCommand),
    #[command(subcommand)]
    Export(transfer::ExportCommand),
    /// Count customers per status
    Report(report::ReportArgs),
    /// Re-derive every customer's status
    Recalc(report::RecalcArgs),
    Backup(backup::BackupArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let command = match command {
        Command::Completions(args) => return completions::emit(args),
        command => command,
    };

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    // Timeouts lapse with the clock, so stored statuses are refreshed on load.
    let now = now_utc();
    let refreshed = store
        .customers()
        .recalculate_all(now)
        .with_context(|| "recalculate statuses")?;
    if refreshed > 0 {
        info!(changed = refreshed, "statuses refreshed on load");
    }

    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
        now,
    };

    match command {
        Command::Disposition(cmd) => match cmd {
            dispositions::DispositionCommand::Add(args) => dispositions::add_disposition(&ctx, args),
            dispositions::DispositionCommand::Edit(args) => {
                dispositions::edit_disposition(&ctx, args)
            }
            dispositions::DispositionCommand::Rm(args) => {
                dispositions::remove_disposition(&ctx, args)
            }
            dispositions::DispositionCommand::Ls(args) => {
                dispositions::list_dispositions(&ctx, args)
            }
        },
        Command::AddCustomer(args) => customers::add_customer(&ctx, args),
        Command::EditCustomer(args) => customers::edit_customer(&ctx, args),
        Command::SetDisposition(args) => customers::set_disposition(&ctx, args),
        Command::Show(args) => customers::show_customer(&ctx, args),
        Command::List(args) => customers::list_customers(&ctx, args),
        Command::Delete(args) => customers::delete_customer(&ctx, args),
        Command::Import(cmd) => match cmd {
            transfer::ImportCommand::Csv(args) => transfer::import_csv(&ctx, args),
            transfer::ImportCommand::Paids(args) => transfer::import_paids(&ctx, args),
        },
        Command::Export(cmd) => match cmd {
            transfer::ExportCommand::Csv(args) => transfer::export_csv(&ctx, args),
        },
        Command::Report(args) => report::status_report(&ctx, args),
        Command::Recalc(args) => report::recalculate(&ctx, args),
        Command::Backup(args) => backup::backup(&ctx, args),
        Command::Completions(_) => {
            unreachable!("completions command handled before store initialization")
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
