// # auctiond - Auction Server Manager Daemon
//
// Thin integration layer around auction-core. The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Loading the persisted server configuration
// 4. Subscribing time synchronization and producing periodic time checks
//    (status lines from the notify topic are written to the log)
// 5. Persisting the configuration on shutdown
//
// Server implementations are linked in by embedding applications through
// `AuctionServerManager::factories()`. The bare daemon registers none, so a
// configuration naming a server it cannot build is a startup error.
//
// ## Configuration
//
// - `AUCTION_CONFIG_PATH`: Path to the persisted configuration (default `auctions.json`)
// - `AUCTION_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `AUCTION_TIMECHECK_INTERVAL_SECS`: Seconds between time checks, 0 disables (default 0)
// - `AUCTION_DRAIN_POLICY`: drain_and_requeue or peek_and_discard
//
// ## Example
//
// ```bash
// export AUCTION_CONFIG_PATH=/var/lib/auctiond/auctions.json
// export AUCTION_TIMECHECK_INTERVAL_SECS=300
//
// auctiond
// ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use auction_core::{
    AuctionServerManager, ConfigFile, DrainPolicy, ManagerConfig, MessageBus, MessageListener,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum AuctiondExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<AuctiondExitCode> for ExitCode {
    fn from(code: AuctiondExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Failure while running the daemon, classified by exit code
enum DaemonError {
    Config(anyhow::Error),
    Runtime(anyhow::Error),
}

/// Application configuration
struct Config {
    config_path: String,
    log_level: String,
    timecheck_interval_secs: u64,
    drain_policy: DrainPolicy,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let timecheck_interval_secs = match env::var("AUCTION_TIMECHECK_INTERVAL_SECS") {
            Ok(raw) => raw.trim().parse().with_context(|| {
                format!("AUCTION_TIMECHECK_INTERVAL_SECS must be a number. Got: {}", raw)
            })?,
            Err(_) => 0,
        };

        let drain_policy = match env::var("AUCTION_DRAIN_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => DrainPolicy::default(),
        };

        Ok(Self {
            config_path: env::var("AUCTION_CONFIG_PATH")
                .unwrap_or_else(|_| "auctions.json".to_string()),
            log_level: env::var("AUCTION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            timecheck_interval_secs,
            drain_policy,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.config_path.trim().is_empty() {
            anyhow::bail!("AUCTION_CONFIG_PATH cannot be empty");
        }

        if self.timecheck_interval_secs != 0
            && !(10..=86400).contains(&self.timecheck_interval_secs)
        {
            anyhow::bail!(
                "AUCTION_TIMECHECK_INTERVAL_SECS must be 0 or between 10 and 86400 seconds. Got: {}",
                self.timecheck_interval_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "AUCTION_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn manager_config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::default();
        config.time_sync.drain_policy = self.drain_policy;
        config.time_sync.check_interval_secs = self.timecheck_interval_secs;
        config
    }
}

/// Writes time-sync status lines to the log
struct StatusLog;

#[async_trait]
impl MessageListener for StatusLog {
    async fn message_action(&self, message: &str) {
        info!("{}", message);
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AuctiondExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return AuctiondExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AuctiondExitCode::ConfigError.into();
    }

    info!("Starting auctiond daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AuctiondExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => AuctiondExitCode::CleanShutdown,
            Err(DaemonError::Config(e)) => {
                error!("Configuration error: {:#}", e);
                AuctiondExitCode::ConfigError
            }
            Err(DaemonError::Runtime(e)) => {
                error!("Daemon error: {:#}", e);
                AuctiondExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> std::result::Result<(), DaemonError> {
    let manager = AuctionServerManager::new(config.manager_config())
        .map_err(|e| DaemonError::Config(e.into()))?;

    let file = ConfigFile::new(&config.config_path)
        .await
        .map_err(|e| DaemonError::Config(e.into()))?;

    match file.load().await.map_err(|e| DaemonError::Config(e.into()))? {
        Some(root) => {
            manager
                .load(&root)
                .with_context(|| format!("Failed to load {}", file.path().display()))
                .map_err(DaemonError::Config)?;
            info!("Loaded {} server(s)", manager.registry().len());
        }
        None => info!("No configuration at {}, starting empty", file.path().display()),
    }

    let bus = MessageBus::new();
    let status = bus
        .register_listener(&manager.config().time_sync.notify_topic, Arc::new(StatusLog))
        .map_err(|e| DaemonError::Runtime(e.into()))?;
    let subscription = manager
        .start_time_sync(&bus)
        .map_err(|e| DaemonError::Runtime(e.into()))?;

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let ticker = match config.timecheck_interval_secs {
        0 => None,
        secs => Some(tokio::spawn(produce_time_checks(
            bus.clone(),
            manager.config().time_sync.topic.clone(),
            manager.config().time_sync.command.clone(),
            Duration::from_secs(secs),
            stop_rx,
        ))),
    };

    info!("Daemon initialized successfully");

    let shutdown = wait_for_shutdown().await;

    let _ = stop_tx.send(true);
    if let Some(ticker) = ticker
        && let Err(e) = ticker.await
    {
        warn!("Time check producer ended abnormally: {}", e);
    }

    if let Err(e) = manager.stop_time_sync(subscription) {
        warn!("Failed to stop time sync: {}", e);
    }
    status.unsubscribe();
    bus.shutdown().await;

    file.save(&manager.to_config_tree())
        .await
        .map_err(|e| DaemonError::Runtime(e.into()))?;
    info!("Saved configuration to {}", file.path().display());

    match shutdown {
        Ok(signal) => {
            info!("Received shutdown signal: {}", signal);
            Ok(())
        }
        Err(e) => Err(DaemonError::Runtime(e)),
    }
}

/// Publish `command` on `topic` every `period` until told to stop
async fn produce_time_checks(
    bus: MessageBus,
    topic: String,
    command: String,
    period: Duration,
    mut stop: tokio::sync::watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => bus.publish(&topic, command.as_str()),
            _ = stop.changed() => break,
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
