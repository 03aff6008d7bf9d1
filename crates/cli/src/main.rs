//! SchoolSoft CLI - Command-line front-end for the school dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from SCHOOLSOFT_PASSWORD)
//! schoolsoft login -e bursar@school.ac.ke
//!
//! # Dashboard counts and today's payment modes
//! schoolsoft dashboard
//!
//! # Second page of students in Grade 4, sorted by last name
//! schoolsoft students list --page 2 --filter Class.name="Grade 4" --sort last_name
//!
//! # Record a payment
//! schoolsoft payments create --set studentId=12 --set amount=2500 \
//!     --set payment_mode=MPESA --set reference=QWE123RTY
//!
//! # Print the invoice for payment 31
//! schoolsoft invoice 31 --print
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `dashboard`, `fee-status` - Statistics widgets
//! - `students|teachers|classes|users|payments` - List, create, update, delete
//! - `school` - Show or update school settings
//! - `report class` - Class report with CSV export
//! - `invoice` - Generate, save, preview or print a payment invoice
//! - `maintenance` - Database reset actions

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use schoolsoft_admin::api::MaintenanceAction;
use schoolsoft_admin::config::AdminConfig;
use schoolsoft_admin::state::AppState;
use schoolsoft_core::{Class, ClassId, Student, Teacher, User};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{CliError, FieldArg, records};

#[derive(Parser)]
#[command(name = "schoolsoft")]
#[command(author, version, about = "SchoolSoft dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SCHOOLSOFT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show dashboard counts and today's payment modes
    Dashboard,
    /// Show the fee status chart for a class
    FeeStatus {
        /// Class ID
        class_id: i32,
    },
    /// Manage students
    Students {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage teachers
    Teachers {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage classes
    Classes {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage dashboard users
    Users {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage fee payments
    Payments {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// School settings
    School {
        #[command(subcommand)]
        action: SchoolAction,
    },
    /// Reports
    Report {
        #[command(subcommand)]
        target: ReportTarget,
    },
    /// Generate the invoice for a payment
    Invoice {
        /// Payment ID
        payment_id: i32,

        /// Save the PDF to this path
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Send the PDF to the print command
        #[arg(long)]
        print: bool,

        /// Open the PDF with the view command
        #[arg(long)]
        preview: bool,
    },
    /// Reset backend data
    Maintenance {
        /// `reset-payments`, `partial-reset` or `full-reset`
        action: MaintenanceAction,

        /// Repeat the action name to confirm
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// List one page of records
    List(ListArgs),
    /// Create a record
    Create {
        /// Field value as `name=value` (repeatable)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<FieldArg>,
    },
    /// Update a record
    Update {
        /// Record ID
        id: i32,

        /// Field value as `name=value` (repeatable)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<FieldArg>,
    },
    /// Delete a record
    Delete {
        /// Record ID
        id: i32,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page
    #[arg(long, default_value_t = 10)]
    pub size: u32,

    /// Column filter as `column=value` (repeatable)
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    pub filters: Vec<FieldArg>,

    /// Sort as `column` or `column:desc` (repeatable)
    #[arg(long = "sort", value_name = "COLUMN[:desc]")]
    pub sorting: Vec<String>,

    /// Global search text
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Subcommand)]
enum SchoolAction {
    /// Show the school settings
    Show,
    /// Update the school settings
    Update {
        /// Field value as `name=value` (repeatable)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<FieldArg>,
    },
}

#[derive(Subcommand)]
enum ReportTarget {
    /// Students of one class with fee totals
    Class {
        /// Class ID
        class_id: i32,

        #[command(flatten)]
        list: ListArgs,

        /// Write the current page as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &AdminConfig) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "schoolsoft_admin=info,schoolsoft_cli=info".into());

    // Logs go to stderr; stdout carries command output
    let json_layer = config.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.log_json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr().lock(), "Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    if let Err(e) = run(cli, config).await {
        e.report();
        let _ = writeln!(std::io::stderr().lock(), "{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: AdminConfig) -> Result<(), CliError> {
    let state = AppState::from_config(config).await?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&state, &email, password, &mut out).await?;
        }
        Commands::Logout => commands::auth::logout(&state, &mut out).await?,
        Commands::Whoami => commands::auth::whoami(&state, &mut out)?,
        command => {
            let session = state.require_session(Utc::now()).await?;
            match command {
                Commands::Dashboard => commands::dashboard::show(&state, &mut out).await?,
                Commands::FeeStatus { class_id } => {
                    commands::dashboard::fee_status(&state, ClassId::new(class_id), &mut out)
                        .await?;
                }
                Commands::Students { action } => {
                    records::run::<Student>(&state, action, &mut out).await?;
                }
                Commands::Teachers { action } => {
                    records::run::<Teacher>(&state, action, &mut out).await?;
                }
                Commands::Classes { action } => {
                    records::run::<Class>(&state, action, &mut out).await?;
                }
                Commands::Users { action } => {
                    records::run::<User>(&state, action, &mut out).await?;
                }
                Commands::Payments { action } => {
                    records::run_payments(&state, action, &mut out).await?;
                }
                Commands::School { action } => match action {
                    SchoolAction::Show => commands::school::show(&state, &mut out).await?,
                    SchoolAction::Update { fields } => {
                        commands::school::update(&state, &fields, &mut out).await?;
                    }
                },
                Commands::Report {
                    target: ReportTarget::Class { class_id, list, csv },
                } => {
                    commands::report::class(
                        &state,
                        ClassId::new(class_id),
                        &list,
                        csv.as_deref(),
                        &mut out,
                    )
                    .await?;
                }
                Commands::Invoice {
                    payment_id,
                    out: path,
                    print,
                    preview,
                } => {
                    let request = commands::invoice::InvoiceRequest {
                        payment_id,
                        out: path,
                        print,
                        preview,
                    };
                    commands::invoice::run(&state, &session, &request, &mut out).await?;
                }
                Commands::Maintenance { action, confirm } => {
                    commands::maintenance::run(&state, &session, action, &confirm, &mut out)
                        .await?;
                }
                Commands::Login { .. } | Commands::Logout | Commands::Whoami => {}
            }
        }
    }
    Ok(())
}
