//! Stocktally - console for a retail inventory backend
//!
//! Lists catalogue and transaction records, records new sales, purchases
//! and expenses, and buckets them into monthly, quarterly or yearly
//! analytics.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime or argument error (connection, config, validation, etc.)

mod analytics;
mod api;
mod cli;
mod config;
mod forms;
mod models;
mod report;
mod session;

use analytics::{aggregate, aggregate_as_of_now, count_undated, Granularity};
use anyhow::{bail, Context, Result};
use api::ApiClient;
use chrono::{NaiveDateTime, Utc};
use cli::{Args, Command, ListFormat, OutputFormat, RecordCommand, ThemeAction};
use config::{Config, CONFIG_FILE};
use forms::{ExpenseForm, PurchaseForm, SaleForm};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Envelope, Expense, LoginRequest, Product, Purchase, Resource, Sale, Supplier, Variant};
use report::table::money;
use report::{AnalyticsReport, Palette, ReportMetadata, TableRow};
use rust_decimal::Decimal;
use serde::Serialize;
use session::{AppContext, FileStore, Session, Theme};
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Stocktally v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .stocktally.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the backend URL, timeout and analytics defaults.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the CLI flags. Logs go to stderr so
/// reports on stdout stay clean.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Dispatch the parsed command.
async fn run(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let store = FileStore::open(config.general.state_file())?;
    debug!("State file: {}", store.path().display());
    let mut ctx = AppContext::load(store);
    let quiet = args.quiet;

    match args.command {
        Command::Analytics {
            granularity,
            now,
            format,
        } => {
            let granularity = granularity.unwrap_or(config.analytics.granularity);
            handle_analytics(&config, &ctx, granularity, now, format, quiet).await
        }
        Command::List {
            resource,
            format,
            low_stock,
            threshold,
        } => {
            let threshold = low_stock
                .then(|| threshold.unwrap_or(config.analytics.low_stock_threshold));
            handle_list(&config, &ctx, resource, format, threshold).await
        }
        Command::Record(record) => handle_record(&config, &ctx, record).await,
        Command::Login { email, password } => {
            handle_login(&config, &mut ctx, email, password).await
        }
        Command::Logout => handle_logout(&mut ctx),
        Command::Whoami => handle_whoami(&ctx),
        Command::Theme { action } => handle_theme(&mut ctx, action),
        Command::InitConfig => handle_init_config(),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Table colors for the current theme, unless coloring is off.
fn palette(config: &Config, ctx: &AppContext<FileStore>) -> Palette {
    if config.report.color {
        Palette::for_theme(ctx.preferences.theme)
    } else {
        Palette::plain()
    }
}

/// Spinner on stderr while requests are in flight. Hidden in quiet mode.
fn spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn handle_analytics(
    config: &Config,
    ctx: &AppContext<FileStore>,
    granularity: Granularity,
    now: Option<NaiveDateTime>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let client = ApiClient::new(&config.api, &ctx.session)?;

    let pb = spinner(quiet, "Fetching sales, purchases and expenses...");
    let fetched = futures::try_join!(
        client.list::<Sale>(Resource::Sales),
        client.list::<Purchase>(Resource::Purchases),
        client.list::<Expense>(Resource::Expenses),
    );
    pb.finish_and_clear();
    let (sales, purchases, expenses) = fetched?;

    info!(
        "Fetched {} sales, {} purchases, {} expenses",
        sales.len(),
        purchases.len(),
        expenses.len()
    );

    let skipped = count_undated(&sales) + count_undated(&purchases) + count_undated(&expenses);
    if skipped > 0 {
        warn!(
            "{} entries have a missing or malformed date and were left out",
            skipped
        );
    }

    let generated_at = Utc::now();
    let buckets = match now {
        Some(now) => aggregate(&sales, &purchases, &expenses, granularity, now),
        None => aggregate_as_of_now(&sales, &purchases, &expenses, granularity),
    };
    debug!("Built {} {} buckets", buckets.len(), granularity);

    let metadata = ReportMetadata {
        api_url: client.base_url().to_string(),
        generated_at,
        granularity,
        as_of: now.unwrap_or_else(|| generated_at.naive_utc()),
        sales_count: sales.len(),
        purchases_count: purchases.len(),
        expenses_count: expenses.len(),
        skipped_entries: skipped,
    };
    let report = AnalyticsReport::new(metadata, buckets);

    let output = match format {
        OutputFormat::Table => report::generate_table_report(&report, &palette(config, ctx)),
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)? + "\n",
    };
    print!("{}", output);

    Ok(())
}

async fn handle_list(
    config: &Config,
    ctx: &AppContext<FileStore>,
    resource: Resource,
    format: ListFormat,
    low_stock: Option<i64>,
) -> Result<()> {
    if low_stock.is_some() && resource != Resource::Variants {
        bail!("--low-stock only applies to variants");
    }

    let client = ApiClient::new(&config.api, &ctx.session)?;
    let palette = palette(config, ctx);

    match resource {
        Resource::Products => show(&client.list::<Product>(resource).await?, format, &palette),
        Resource::Variants => {
            let mut variants: Vec<Variant> = client.list(resource).await?;
            if let Some(threshold) = low_stock {
                variants.retain(|v| v.is_low_stock(threshold));
                info!("{} variants at or below {} units", variants.len(), threshold);
            }
            show(&variants, format, &palette)
        }
        Resource::Suppliers => show(&client.list::<Supplier>(resource).await?, format, &palette),
        Resource::Purchases => show(&client.list::<Purchase>(resource).await?, format, &palette),
        Resource::Sales => show(&client.list::<Sale>(resource).await?, format, &palette),
        Resource::Expenses => show(&client.list::<Expense>(resource).await?, format, &palette),
    }
}

fn show<T: Serialize + TableRow>(rows: &[T], format: ListFormat, palette: &Palette) -> Result<()> {
    match format {
        ListFormat::Table => print!("{}", report::render_table(rows, palette)),
        ListFormat::Json => println!("{}", report::render_listing_json(rows)?),
    }
    Ok(())
}

async fn handle_record(
    config: &Config,
    ctx: &AppContext<FileStore>,
    record: RecordCommand,
) -> Result<()> {
    let today = Utc::now().date_naive();

    match record {
        RecordCommand::Sale {
            items,
            date,
            customer,
            dry_run,
        } => {
            let form = SaleForm {
                date,
                customer,
                items,
            };
            let payload = form.to_payload(today)?;
            submit(config, ctx, Resource::Sales, &payload, form.total(), dry_run).await
        }
        RecordCommand::Purchase {
            supplier,
            items,
            date,
            note,
            dry_run,
        } => {
            let form = PurchaseForm {
                supplier_id: Some(supplier),
                date,
                items,
                note,
            };
            let payload = form.to_payload(today)?;
            submit(config, ctx, Resource::Purchases, &payload, form.total(), dry_run).await
        }
        RecordCommand::Expense {
            category,
            amount,
            description,
            date,
            dry_run,
        } => {
            let form = ExpenseForm {
                category,
                description,
                amount,
                date,
            };
            let payload = form.to_payload(today)?;
            submit(config, ctx, Resource::Expenses, &payload, form.total(), dry_run).await
        }
    }
}

/// Send a validated payload, or print it when `dry_run` is set.
async fn submit<B: Serialize>(
    config: &Config,
    ctx: &AppContext<FileStore>,
    resource: Resource,
    payload: &B,
    total: Decimal,
    dry_run: bool,
) -> Result<()> {
    println!("🧾 Total: {}", money(total));

    if dry_run {
        println!("{}", serde_json::to_string_pretty(payload)?);
        println!("\n✅ Dry run complete. Nothing was sent.");
        return Ok(());
    }

    let client = ApiClient::new(&config.api, &ctx.session)?;
    let envelope: Envelope<serde_json::Value> = client.create(resource, payload).await?;

    let id = envelope.data.get("id").and_then(serde_json::Value::as_i64);
    debug!("Created record {:?} in {}", id, resource);

    if envelope.message.is_empty() {
        println!("✅ Recorded in {}", resource);
    } else {
        println!("✅ {}", envelope.message);
    }
    if let Some(id) = id {
        println!("   ID: {}", id);
    }
    Ok(())
}

async fn handle_login(
    config: &Config,
    ctx: &mut AppContext<FileStore>,
    email: String,
    password: String,
) -> Result<()> {
    // Sign in without whatever token is currently stored.
    let client = ApiClient::new(&config.api, &Session::default())?;
    let response = client.login(&LoginRequest { email, password }).await?;

    let user = response.user.map(|u| u.display_name().to_string());
    ctx.sign_in(response.token, user)?;

    match ctx.session.user.as_deref() {
        Some(user) => println!("✅ Signed in as {}", user),
        None => println!("✅ Signed in"),
    }
    Ok(())
}

fn handle_logout(ctx: &mut AppContext<FileStore>) -> Result<()> {
    if !ctx.session.is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }

    ctx.sign_out()?;
    println!("👋 Signed out.");
    Ok(())
}

fn handle_whoami(ctx: &AppContext<FileStore>) -> Result<()> {
    if ctx.session.is_authenticated() {
        println!("{}", ctx.session.user.as_deref().unwrap_or("(signed in)"));
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

fn handle_theme(ctx: &mut AppContext<FileStore>, action: ThemeAction) -> Result<()> {
    let theme = match action {
        ThemeAction::Show => {
            println!("{}", ctx.preferences.theme);
            return Ok(());
        }
        ThemeAction::Toggle => ctx.toggle_theme()?,
        ThemeAction::Light => ctx.set_theme(Theme::Light)?,
        ThemeAction::Dark => ctx.set_theme(Theme::Dark)?,
    };

    println!("🎨 Theme set to {}", theme);
    Ok(())
}
