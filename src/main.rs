//! PortfolioMonitor - Main Entry Point
//!
//! Runs the monitoring scheduler, or performs one-off analysis and
//! management commands against the configured store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use portfolio_monitor::common::channels::create_notification_channel_with_size;
use portfolio_monitor::config::load_config;
use portfolio_monitor::monitor::alerts::normalize_instrument;
use portfolio_monitor::monitor::messages;
use portfolio_monitor::monitor::session::{PendingInput, SessionRegistry, CONFIRMATION_TIMEOUT};
use portfolio_monitor::monitor::settings::{self, SettingToggle};
use portfolio_monitor::monitor::summary::{trade_calculation, PerformancePeriod};
use portfolio_monitor::{
    open_store, ChannelNotifier, DeliveryWorker, InMemoryStore, Monitor, MonitorStore, OkxClient,
    Scheduler,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Keep all state in memory instead of the configured store
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the periodic monitoring tasks (default)
    Run,
    /// Print RSI(14), SMA(20) and SMA(50) for an instrument
    Analyze { instrument: String },
    /// Manage price alerts
    Alert {
        #[command(subcommand)]
        action: AlertCommand,
    },
    /// Manage movement-alert thresholds
    Movement {
        #[command(subcommand)]
        action: MovementCommand,
    },
    /// Set invested capital
    Capital { amount: Decimal },
    /// Show profit and loss against invested capital
    Pnl,
    /// Show every holding ranked by value
    Portfolio,
    /// Show the five largest holdings
    Top,
    /// Show asset count, value and PnL
    Stats {
        /// Add concentration, weekly change and the largest holdings
        #[arg(long)]
        advanced: bool,
    },
    /// Profit of buying and selling a quantity, e.g. `calc 45000 50000 0.1`
    Calc {
        buy: Decimal,
        sell: Decimal,
        quantity: Decimal,
    },
    /// Show statistics for day, week or month
    Performance { period: PerformancePeriod },
    /// Show or toggle switches
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Reset every stored record
    Clear {
        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AlertCommand {
    /// Add an alert, e.g. "BTC-USDT > 50000"
    Add { alert: String },
    /// List active alerts
    List,
    /// Delete the alert at a list position (1-based)
    Delete { position: usize },
}

#[derive(Subcommand, Debug)]
enum MovementCommand {
    /// Set the global movement percent
    Global { percent: Decimal },
    /// Set an asset's movement percent; 0 removes it
    Override { asset: String, percent: Decimal },
    /// Show the current thresholds
    Show,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    /// daily-summary, auto-post or debug
    Toggle { name: SettingToggle },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config)).context("failed to load configuration")?;

    // Initialize logging
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PortfolioMonitor");
    info!("Configuration file: {}", args.config);

    // The calculator needs neither the store nor the exchange
    if let Some(Command::Calc {
        buy,
        sell,
        quantity,
    }) = &args.command
    {
        return print_trade_calculation(*buy, *sell, *quantity);
    }

    let store: Arc<dyn MonitorStore> = if args.dry_run {
        info!("Dry run, state is kept in memory");
        Arc::new(InMemoryStore::new())
    } else {
        open_store(&config)
            .await
            .context("failed to initialise persistent store")?
    };

    let timeout = Duration::from_secs(config.settings.request_timeout_seconds);
    let provider = Arc::new(OkxClient::new(&config.okx, timeout)?);

    let (tx, rx) = create_notification_channel_with_size(config.notifications.channel_buffer);
    let _delivery = DeliveryWorker::new(&config.notifications, timeout)?.spawn(rx);
    let notifier = Arc::new(ChannelNotifier::new(tx));

    let monitor = Arc::new(Monitor::new(provider, store, notifier, &config));

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            let mut scheduler = Scheduler::new(Arc::clone(&monitor), config.schedule.clone());
            scheduler.start();
            info!("Application initialized successfully");

            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal, cleaning up...");
            scheduler.shutdown();
            scheduler.join().await;
        }
        Command::Analyze { instrument } => {
            let instrument = normalize_instrument(&instrument)?;
            let result = monitor.analyze(&instrument).await?;
            println!("{}", messages::analysis(&instrument, &result));
        }
        Command::Alert { action } => run_alert_command(monitor.store(), action).await?,
        Command::Movement { action } => run_movement_command(monitor.store(), action).await?,
        Command::Capital { amount } => {
            settings::set_capital(monitor.store(), amount).await?;
            println!("Capital set to {}", messages::usd(amount));
        }
        Command::Pnl => {
            let (total, capital, pnl) = monitor.profit_and_loss().await?;
            println!("{}", messages::profit_and_loss(total, capital, &pnl));
        }
        Command::Portfolio => {
            let overview = monitor.portfolio_overview().await?;
            println!("{}", messages::portfolio(&overview));
        }
        Command::Top => {
            let overview = monitor.portfolio_overview().await?;
            println!("{}", messages::top_assets(&overview));
        }
        Command::Stats { advanced: false } => {
            let overview = monitor.portfolio_overview().await?;
            println!("{}", messages::quick_stats(&overview));
        }
        Command::Stats { advanced: true } => {
            let (overview, weekly) = monitor.advanced_stats().await?;
            println!("{}", messages::advanced_stats(&overview, weekly.as_ref()));
        }
        Command::Calc {
            buy,
            sell,
            quantity,
        } => print_trade_calculation(buy, sell, quantity)?,
        Command::Performance { period } => {
            let stats = monitor.performance(period).await?;
            println!("{}", messages::performance(period, stats.as_ref()));
        }
        Command::Settings { action } => {
            let current = match action {
                SettingsCommand::Show => monitor.store().load_settings().await?,
                SettingsCommand::Toggle { name } => {
                    settings::toggle_setting(monitor.store(), name).await?
                }
            };
            println!(
                "daily summary: {}\nauto-post to channel: {}\ndebug mode: {}",
                current.daily_summary, current.auto_post_to_channel, current.debug_mode
            );
        }
        Command::Clear { yes } => {
            if !yes && !confirm_clear_all(&config.notifications.owner_id).await? {
                bail!("clear cancelled, nothing was deleted");
            }
            settings::clear_all(monitor.store()).await?;
            println!("All data cleared");
        }
    }

    Ok(())
}

fn print_trade_calculation(buy: Decimal, sell: Decimal, quantity: Decimal) -> Result<()> {
    let calc = trade_calculation(buy, sell, quantity)?;
    println!("{}", messages::trade_calculation(&calc));
    Ok(())
}

/// Ask for a typed confirmation that only counts inside the confirmation window
async fn confirm_clear_all(user: &str) -> Result<bool> {
    let sessions = SessionRegistry::new();
    sessions.expect(user, PendingInput::ConfirmClearAll).await;
    println!(
        "Type 'yes' within {}s to delete every stored record",
        CONFIRMATION_TIMEOUT.as_secs()
    );

    let mut answer = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    if tokio::time::timeout(CONFIRMATION_TIMEOUT, stdin.read_line(&mut answer))
        .await
        .is_err()
    {
        warn!("No confirmation received");
    }

    let pending = sessions.take(user).await;
    Ok(pending == Some(PendingInput::ConfirmClearAll) && answer.trim().eq_ignore_ascii_case("yes"))
}

async fn run_alert_command(store: &dyn MonitorStore, action: AlertCommand) -> Result<()> {
    match action {
        AlertCommand::Add { alert } => {
            let alert = settings::add_alert(store, &alert).await?;
            println!("Alert added: {}", messages::alert_line(&alert));
        }
        AlertCommand::List => {
            let alerts = settings::list_alerts(store).await?;
            println!("{}", messages::alert_list(&alerts));
        }
        AlertCommand::Delete { position } => {
            let alert = settings::delete_alert_at(store, position).await?;
            println!("Alert deleted: {}", messages::alert_line(&alert));
        }
    }
    Ok(())
}

async fn run_movement_command(store: &dyn MonitorStore, action: MovementCommand) -> Result<()> {
    let movement = match action {
        MovementCommand::Global { percent } => settings::set_global_movement(store, percent).await?,
        MovementCommand::Override { asset, percent } => {
            settings::set_movement_override(store, &asset, percent).await?
        }
        MovementCommand::Show => store.load_alert_settings().await?,
    };

    println!("Global: {}%", movement.global.normalize());
    for (asset, percent) in &movement.overrides {
        println!("{}: {}%", asset, percent.normalize());
    }
    Ok(())
}
