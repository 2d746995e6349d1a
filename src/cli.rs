//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analytics::{parse_timestamp, Granularity};
use crate::forms::LineItemInput;
use crate::models::Resource;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Stocktally - console for a retail inventory backend
///
/// Browse products, variants, suppliers, purchases, sales and expenses,
/// record new transactions, and see profit per month, quarter or year.
///
/// Examples:
///   stocktally analytics --granularity quarterly
///   stocktally analytics --now 2024-06-30 --format markdown
///   stocktally list variants --low-stock
///   stocktally record sale --item 12:2:19.99 --item 7:1:5
///   stocktally login --email owner@shop.test
///   stocktally init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the REST backend
    ///
    /// Overrides `api.base_url` from .stocktally.toml.
    #[arg(long, value_name = "URL", env = "STOCKTALLY_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .stocktally.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Where theme and session are stored
    #[arg(long, value_name = "FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Disable colored tables
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sales, purchases, expenses and profit per period
    Analytics {
        /// Bucket size (defaults to `analytics.granularity` from config)
        #[arg(short, long)]
        granularity: Option<Granularity>,

        /// Reference date for the covered range (defaults to now)
        ///
        /// Accepts YYYY-MM-DD or an RFC 3339 timestamp.
        #[arg(long, value_name = "DATE", value_parser = parse_now)]
        now: Option<NaiveDateTime>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List a backend collection
    List {
        /// Collection to list
        resource: Resource,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: ListFormat,

        /// Only show variants at or below the low-stock threshold
        #[arg(long)]
        low_stock: bool,

        /// Low-stock threshold (defaults to `analytics.low_stock_threshold`)
        #[arg(long, value_name = "UNITS", requires = "low_stock")]
        threshold: Option<i64>,
    },

    /// Record a sale, purchase or expense
    #[command(subcommand)]
    Record(RecordCommand),

    /// Sign in and remember the session
    Login {
        #[arg(long, env = "STOCKTALLY_EMAIL")]
        email: String,

        #[arg(long, env = "STOCKTALLY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show or change the color theme
    Theme {
        #[arg(default_value = "show")]
        action: ThemeAction,
    },

    /// Generate a default .stocktally.toml configuration file
    InitConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordCommand {
    /// Record a customer sale
    Sale {
        /// Line item, repeatable (e.g. --item 12:2:19.99)
        #[arg(short, long = "item", value_name = "VARIANT:QTY:PRICE", required = true)]
        items: Vec<LineItemInput>,

        /// Sale date (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Customer name
        #[arg(long)]
        customer: Option<String>,

        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Record a stock purchase from a supplier
    Purchase {
        /// Supplier id
        #[arg(long, value_name = "ID")]
        supplier: i64,

        /// Line item, repeatable (e.g. --item 12:10:7.50)
        #[arg(short, long = "item", value_name = "VARIANT:QTY:COST", required = true)]
        items: Vec<LineItemInput>,

        /// Purchase date (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,

        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Record an operating expense
    Expense {
        /// Expense category (e.g. Rent, Utilities)
        #[arg(long)]
        category: String,

        /// Amount spent
        #[arg(long)]
        amount: Decimal,

        #[arg(long)]
        description: Option<String>,

        /// Expense date (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

/// Output format for analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Terminal table (default)
    #[default]
    Table,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ListFormat {
    #[default]
    Table,
    Json,
}

/// What `theme` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
    Light,
    Dark,
}

fn parse_now(value: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(value).ok_or_else(|| format!("invalid date or timestamp: '{}'", value))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Command::Login { ref email, .. } = self.command {
            if !email.contains('@') {
                return Err(format!("Not an e-mail address: {}", email));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
