//! Salon Commission Tracker
//!
//! Records sales per staff member and reports commission by day, week, or
//! all time against a local SQLite ledger or a hosted backend.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commission_tracker::config::{Backend, Config, FileConfig};
use commission_tracker::constants;
use commission_tracker::entries::{EntryId, EntryInput, commission};
use commission_tracker::money::format_usd;
use commission_tracker::period::{StaffFilter, ViewMode, filter_view, noon_on};
use commission_tracker::reports::{self, ExportFormat, ViewReport};
use commission_tracker::session::Session;
use commission_tracker::store::{RestStore, SqliteStore, Store};

#[derive(Parser, Debug)]
#[command(name = "commission-tracker")]
#[command(about = "Commission tracking for salon staff")]
struct Args {
    /// Data directory for the local ledger
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Output directory for exported CSV files
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Path to config.toml
    #[arg(long, default_value = constants::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage staff members
    Staff {
        #[command(subcommand)]
        action: StaffCommand,
    },

    /// Manage sale entries
    Entry {
        #[command(subcommand)]
        action: EntryCommand,
    },

    /// Show totals, growth, and the team leaderboard
    Summary {
        #[arg(long, value_enum, default_value_t = ViewMode::Daily)]
        view: ViewMode,

        /// Only include these staff members (repeatable)
        #[arg(long = "staff")]
        staff: Vec<String>,

        /// Report as of this date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Export the current view to CSV
    Export {
        #[arg(long, value_enum, default_value_t = ViewMode::Daily)]
        view: ViewMode,

        /// Only include these staff members (repeatable)
        #[arg(long = "staff")]
        staff: Vec<String>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Rates)]
        format: ExportFormat,
    },

    /// Show entries and commission day by day for one month
    Calendar {
        /// Month (YYYY-MM, default: current month)
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum StaffCommand {
    /// List staff members
    List,

    /// Add a staff member
    Add { name: String },

    /// Remove a staff member (their entries are kept)
    Remove { name: String },

    /// Rename a staff member and all of their entries (re-run to finish an
    /// interrupted rename)
    Rename { old: String, new: String },
}

#[derive(Subcommand, Debug)]
enum EntryCommand {
    /// List entries in a view
    List {
        #[arg(long, value_enum, default_value_t = ViewMode::All)]
        view: ViewMode,

        /// Only include these staff members (repeatable)
        #[arg(long = "staff")]
        staff: Vec<String>,
    },

    /// Record a sale
    Add {
        /// Staff member who performed the service
        #[arg(long)]
        staff: String,

        /// Sales amount in USD
        #[arg(long)]
        amount: f64,

        /// Commission rate as a fraction (e.g. 0.6); default 0.7
        #[arg(long)]
        rate: Option<f64>,

        /// Service performed
        #[arg(long)]
        service: Option<String>,

        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change an existing entry (unset options keep their current value)
    Edit {
        id: String,

        #[arg(long)]
        staff: Option<String>,

        #[arg(long)]
        amount: Option<f64>,

        #[arg(long, conflicts_with = "default_rate")]
        rate: Option<f64>,

        /// Drop the stored rate so the default applies
        #[arg(long)]
        default_rate: bool,

        /// Service performed (empty string clears it)
        #[arg(long)]
        service: Option<String>,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete an entry by ID
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = FileConfig::load_or_default(&args.config)?;
    let config = Config::from_file(file_config, &args.data_dir)?;

    match config.backend {
        Backend::Sqlite => {
            let store = SqliteStore::open(&config.ledger_path)
                .await
                .with_context(|| {
                    format!("Failed to open ledger: {}", config.ledger_path.display())
                })?;
            run(store, &args, &config).await
        }
        Backend::Rest => {
            let rest = config
                .rest
                .as_ref()
                .context("Missing [store.rest] section in config")?;
            println!("Using backend: {}\n", rest.url);
            run(RestStore::new(rest), &args, &config).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run<S: Store>(store: S, args: &Args, config: &Config) -> Result<()> {
    let mut session = Session::new(store, Local);
    session
        .load()
        .await
        .context("Failed to load staff and entries")?;

    match &args.command {
        Some(Command::Staff { action }) => handle_staff_command(action, &mut session).await,
        Some(Command::Entry { action }) => handle_entry_command(action, &mut session).await,
        Some(Command::Summary { view, staff, date }) => {
            let reference = reference_time(date.as_deref())?;
            let filter = StaffFilter::new(staff.iter().cloned());
            let report = ViewReport::build(
                session.entries(),
                session.staff(),
                *view,
                &filter,
                &reference,
            );
            reports::print_summary(&report);
            Ok(())
        }
        Some(Command::Export {
            view,
            staff,
            format,
        }) => {
            let now = Local::now();
            let filter = StaffFilter::new(staff.iter().cloned());
            let entries = filter_view(session.entries(), *view, &now, &filter);
            let path = reports::export_path(
                &args.output_dir,
                &config.export_prefix,
                *view,
                now.date_naive(),
            );

            println!("Exporting {} entries...", entries.len());
            reports::export_csv(&path, *format, &entries, &Local)
                .with_context(|| format!("Failed to write {}", path.display()))
        }
        Some(Command::Calendar { month }) => {
            let (year, month) = parse_month(month.as_deref())?;
            reports::print_calendar(session.entries(), year, month, &Local);
            Ok(())
        }
        None => {
            let report = ViewReport::build(
                session.entries(),
                session.staff(),
                ViewMode::Daily,
                &StaffFilter::default(),
                &Local::now(),
            );
            reports::print_summary(&report);
            Ok(())
        }
    }
}

/// Handle staff management subcommands
async fn handle_staff_command<S: Store>(
    action: &StaffCommand,
    session: &mut Session<S, Local>,
) -> Result<()> {
    match action {
        StaffCommand::List => {
            if session.staff().is_empty() {
                println!("No staff members yet.");
                println!("\nUse 'commission-tracker staff add <name>' to add one");
            } else {
                for name in session.staff() {
                    println!("  {}", name);
                }
                println!("\n{} staff member(s)", session.staff().len());
            }
            Ok(())
        }
        StaffCommand::Add { name } => {
            session.add_staff(name).await?;
            println!("Added staff member: {}", name.trim());
            Ok(())
        }
        StaffCommand::Remove { name } => {
            session.remove_staff(name).await?;
            println!("Removed staff member: {}", name);
            println!("Existing entries keep the name '{}'.", name);
            Ok(())
        }
        StaffCommand::Rename { old, new } => {
            if let Err(e) = session.rename_staff(old, new).await {
                if e.is_partial() {
                    eprintln!("Warning: {}", e);
                    eprintln!(
                        "Run 'commission-tracker staff rename \"{}\" \"{}\"' again once the \
                         backend is reachable to relabel the remaining entries.",
                        old,
                        new.trim()
                    );
                }
                return Err(e.into());
            }
            println!("Renamed '{}' to '{}'", old, new.trim());
            Ok(())
        }
    }
}

/// Handle entry subcommands
async fn handle_entry_command<S: Store>(
    action: &EntryCommand,
    session: &mut Session<S, Local>,
) -> Result<()> {
    match action {
        EntryCommand::List { view, staff } => {
            let filter = StaffFilter::new(staff.iter().cloned());
            let entries = filter_view(session.entries(), *view, &Local::now(), &filter);
            reports::print_entries(&entries, &Local);
            if !entries.is_empty() {
                println!("\n{} entry(s)", entries.len());
            }
            Ok(())
        }
        EntryCommand::Add {
            staff,
            amount,
            rate,
            service,
            date,
        } => {
            let input = EntryInput {
                staff_name: staff.clone(),
                sales_amount: *amount,
                commission_rate: *rate,
                service_type: service.clone(),
                date: parse_date_or_today(date.as_deref())?,
            };
            let id = session.add_entry(&input).await?;

            if let Some(entry) = session.find_entry(&id) {
                println!(
                    "Added entry {}: {} sold {} ({} commission)",
                    id,
                    entry.staff_name,
                    format_usd(entry.sales_amount),
                    format_usd(commission(entry))
                );
            }
            Ok(())
        }
        EntryCommand::Edit {
            id,
            staff,
            amount,
            rate,
            default_rate,
            service,
            date,
        } => {
            let id: EntryId = id.parse()?;
            let existing = session
                .find_entry(&id)
                .with_context(|| format!("No entry with ID {}", id))?;

            let commission_rate = if *default_rate {
                None
            } else {
                rate.or(existing.commission_rate)
            };
            let input = EntryInput {
                staff_name: staff.clone().unwrap_or_else(|| existing.staff_name.clone()),
                sales_amount: amount.unwrap_or(existing.sales_amount),
                commission_rate,
                service_type: service.clone().or_else(|| existing.service_type.clone()),
                date: match date {
                    Some(d) => parse_date(d)?,
                    None => existing.timestamp.with_timezone(&Local).date_naive(),
                },
            };

            session.edit_entry(&id, &input).await?;
            println!("Updated entry {}", id);
            Ok(())
        }
        EntryCommand::Delete { id } => {
            let id: EntryId = id.parse()?;
            let existed = session.find_entry(&id).is_some();
            session.delete_entry(&id).await?;
            if existed {
                println!("Deleted entry {}", id);
            } else {
                println!("Entry {} was already gone", id);
            }
            Ok(())
        }
    }
}

// =============================================================================
// Argument parsing helpers
// =============================================================================

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, constants::DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

fn parse_date_or_today(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}

/// Noon on the given date, or now
fn reference_time(date: Option<&str>) -> Result<DateTime<Local>> {
    match date {
        Some(s) => Ok(noon_on(parse_date(s)?, &Local).with_timezone(&Local)),
        None => Ok(Local::now()),
    }
}

fn parse_month(s: Option<&str>) -> Result<(i32, u32)> {
    match s {
        Some(s) => {
            let first = parse_date(&format!("{}-01", s))
                .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
            Ok((first.year(), first.month()))
        }
        None => {
            let today = Local::now().date_naive();
            Ok((today.year(), today.month()))
        }
    }
}
