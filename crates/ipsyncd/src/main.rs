// # ipsyncd - IP Synchronization Daemon
//
// Thin integration layer: reads settings from environment variables,
// wires the concrete provider, discovery source, and file stores into
// the sync engine, and drains the engine's event channel into an
// append-only log file. All synchronization logic lives in ipsync-core.
//
// ## Configuration
//
// All daemon-level settings come from environment variables; the managed
// records themselves live in the JSON configuration file.
//
// - `IPSYNC_CONFIG`: Path to the JSON configuration file (default: config.json)
// - `IPSYNC_IP_STATE`: Path to the persisted last-observed address (default: last_ip.txt)
// - `IPSYNC_EVENT_LOG`: Path to the append-only event log (default: logs/events.jsonl)
// - `IPSYNC_DISCOVERY_URL`: Address-discovery endpoint (default: api.ipify.org)
// - `IPSYNC_LOG_LEVEL`: Log level (trace, debug, info, warn, error; default: info)
//
// ## Example
//
// ```bash
// export IPSYNC_CONFIG=/etc/ipsync/config.json
// export IPSYNC_IP_STATE=/var/lib/ipsync/last_ip.txt
// export IPSYNC_EVENT_LOG=/var/log/ipsync/events.jsonl
//
// ipsyncd
// ```

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use ipsync_core::store::{FileConfigStore, FileIpStateStore};
use ipsync_core::{LoggedEvent, SyncEngine};
use ipsync_discovery::{DEFAULT_DISCOVERY_URL, HttpAddressSource};
use ipsync_provider_cloudflare::CloudflareDns;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon settings from environment variables
struct Settings {
    config_path: PathBuf,
    ip_state_path: PathBuf,
    event_log_path: PathBuf,
    discovery_url: String,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Self {
        Self {
            config_path: env::var("IPSYNC_CONFIG")
                .unwrap_or_else(|_| "config.json".to_string())
                .into(),
            ip_state_path: env::var("IPSYNC_IP_STATE")
                .unwrap_or_else(|_| "last_ip.txt".to_string())
                .into(),
            event_log_path: env::var("IPSYNC_EVENT_LOG")
                .unwrap_or_else(|_| "logs/events.jsonl".to_string())
                .into(),
            discovery_url: env::var("IPSYNC_DISCOVERY_URL")
                .unwrap_or_else(|_| DEFAULT_DISCOVERY_URL.to_string()),
            log_level: env::var("IPSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("IPSYNC_CONFIG cannot be empty");
        }

        if self.ip_state_path.as_os_str().is_empty() {
            anyhow::bail!("IPSYNC_IP_STATE cannot be empty");
        }

        if self.event_log_path.as_os_str().is_empty() {
            anyhow::bail!("IPSYNC_EVENT_LOG cannot be empty");
        }

        if !self.discovery_url.starts_with("https://") && !self.discovery_url.starts_with("http://")
        {
            anyhow::bail!(
                "IPSYNC_DISCOVERY_URL must use HTTP or HTTPS scheme. Got: {}",
                self.discovery_url
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IPSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    let settings = Settings::from_env();

    if let Err(e) = settings.validate() {
        eprintln!("Configuration error: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    let log_level = match settings.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    info!("Starting ipsyncd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(settings)).into()
}

/// Run the daemon
async fn run_daemon(settings: Settings) -> SyncExitCode {
    // A configuration that cannot be loaded is the one unrecoverable
    // startup error; everything after this is survived and retried on
    // the next poll cycle.
    let config_store = FileConfigStore::new(&settings.config_path);
    let config = {
        use ipsync_core::traits::ConfigStore;
        match config_store.load().await {
            Ok(config) => config,
            Err(e) => {
                error!(
                    path = %settings.config_path.display(),
                    "failed to load configuration: {}", e
                );
                return SyncExitCode::ConfigError;
            }
        }
    };

    info!(
        records = config.records.len(),
        poll_interval_ms = config.poll_interval_ms,
        "configuration loaded"
    );

    let (mut engine, event_rx) = match SyncEngine::new(
        Box::new(CloudflareDns::new()),
        Box::new(HttpAddressSource::new(settings.discovery_url.clone())),
        Box::new(config_store),
        Box::new(FileIpStateStore::new(&settings.ip_state_path)),
        config,
    ) {
        Ok(parts) => parts,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return SyncExitCode::ConfigError;
        }
    };

    let writer = tokio::spawn(write_event_log(settings.event_log_path.clone(), event_rx));

    let code = match engine.run().await {
        Ok(()) => {
            info!("shutting down");
            SyncExitCode::CleanShutdown
        }
        Err(e) => {
            error!("engine error: {}", e);
            SyncExitCode::RuntimeError
        }
    };

    // Dropping the engine closes the event channel; the writer drains
    // what remains and exits.
    drop(engine);
    if let Err(e) = writer.await {
        warn!("event log writer panicked: {}", e);
    }

    code
}

/// Drain engine events into an append-only JSON-lines file
///
/// The log is write-only from the daemon's perspective: entries are
/// appended and never read back or rewritten. A log that cannot be
/// opened or written to is reported and the affected entries dropped;
/// synchronization itself is never blocked on the log.
async fn write_event_log(path: PathBuf, mut events: mpsc::Receiver<LoggedEvent>) {
    let mut file = match open_event_log(&path).await {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(path = %path.display(), "cannot open event log: {}", e);
            None
        }
    };

    while let Some(event) = events.recv().await {
        let Some(out) = file.as_mut() else {
            continue;
        };

        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to serialize event: {}", e);
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = out.write_all(&line).await {
            warn!(path = %path.display(), "failed to append to event log: {}", e);
        }
    }

    if let Some(mut out) = file {
        let _ = out.flush().await;
    }
}

/// Open the event log for appending, creating parent directories
async fn open_event_log(path: &Path) -> std::io::Result<tokio::fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}
