//! Gatehouse operator binary.
//!
//! # Usage
//!
//! ```bash
//! # Is this profile unlocked?
//! gatehouse --store profile.json status
//!
//! # Submit the unlock form
//! gatehouse --store profile.json --leads leads.jsonl \
//!     grant --name A --email a@x.com --phone 123 --company X
//!
//! # List a catalog with lock state
//! gatehouse --store profile.json catalog downloads.json
//! ```

use std::{io::Write, path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use gatehouse_cli::{CliError, Runtime, RuntimeConfig, SystemEnv};
use gatehouse_core::{ContactInfo, ControllerConfig, GrantOutcome, ResourceCatalog, UnlockForm};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Gated download access tool
#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(about = "Inspect and grant gated download access")]
#[command(version)]
struct Args {
    /// Store file holding the unlock record
    #[arg(short, long, env = "GATEHOUSE_STORE", default_value = "gatehouse-store.json")]
    store: PathBuf,

    /// Append captured leads to this file
    #[arg(long, env = "GATEHOUSE_LEADS")]
    leads: Option<PathBuf>,

    /// Access window in days
    #[arg(long, env = "GATEHOUSE_UNLOCK_DAYS", default_value = "14")]
    unlock_days: u64,

    /// Asset host for relative resource paths
    #[arg(long, env = "GATEHOUSE_ASSET_BASE", default_value = gatehouse_cli::DEFAULT_ASSET_BASE)]
    asset_base: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether gated downloads are unlocked
    Status,

    /// Submit the unlock form
    Grant {
        /// Visitor name
        #[arg(long)]
        name: String,
        /// Visitor email
        #[arg(long)]
        email: String,
        /// Visitor phone
        #[arg(long)]
        phone: String,
        /// Visitor company
        #[arg(long)]
        company: Option<String>,
        /// Require the company field
        #[arg(long)]
        require_company: bool,
    },

    /// List a catalog file with lock state and canonical URLs
    Catalog {
        /// Catalog JSON file
        path: PathBuf,
    },

    /// Print the canonical URL for a resource
    Open {
        /// Resource URL as written in the catalog
        url: String,
        /// Refuse unless unlocked
        #[arg(long)]
        gated: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            let _ = writeln!(std::io::stderr(), "error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = RuntimeConfig {
        store_path: args.store,
        leads_path: args.leads,
        asset_base: args.asset_base,
        controller: ControllerConfig::default()
            .with_unlock_duration(Duration::from_secs(args.unlock_days.saturating_mul(24 * 60 * 60))),
    };

    tracing::debug!(store = %config.store_path.display(), "gatehouse starting");
    let runtime = Runtime::open(config, SystemEnv::new())?;
    let mut out = std::io::stdout().lock();

    match args.command {
        Command::Status => {
            writeln!(out, "{}", runtime.status())?;
        },

        Command::Grant { name, email, phone, company, require_company } => {
            let mut contact =
                ContactInfo::new().with("name", name).with("email", email).with("phone", phone);
            if let Some(company) = company {
                contact.insert("company", company);
            }

            let form =
                if require_company { UnlockForm::with_company() } else { UnlockForm::standard() };

            match runtime.grant(&contact, &form)? {
                GrantOutcome::Persisted => writeln!(out, "{}", runtime.status())?,
                GrantOutcome::SessionOnly => {
                    writeln!(out, "unlocked for this session only (store not writable)")?;
                },
            }
        },

        Command::Catalog { path } => {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| CliError::Catalog(format!("{}: {e}", path.display())))?;
            let catalog = ResourceCatalog::from_json(&raw)?;
            write!(out, "{}", runtime.catalog_listing(&catalog))?;
        },

        Command::Open { url, gated } => {
            writeln!(out, "{}", runtime.open_url(&url, gated)?)?;
        },
    }

    Ok(())
}
