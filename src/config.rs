use crate::contract::is_zero_address;
use crate::feeds::{SortOrder, TimeWindow};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// saysome - say something, on chain
///
/// Terminal client for posting, liking and commenting on says stored by a
/// smart contract. Configuration priority: CLI args > environment variables >
/// config file > defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "saysome")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Say something. Say anything. On chain.", long_about = None)]
pub struct CliArgs {
    /// Path to the TOML config file
    #[arg(short, long, env = "SAYSOME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Wallet JSON-RPC endpoint
    #[arg(long, env = "SAYSOME_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Deployed contract address (zero address runs the demo feed)
    #[arg(long, env = "SAYSOME_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Says fetched per refresh (1-100)
    #[arg(long, env = "SAYSOME_BATCH_SIZE")]
    pub batch_size: Option<u64>,

    /// Contract event polling interval in milliseconds (250-60000)
    #[arg(long, env = "SAYSOME_EVENT_POLL_MS")]
    pub event_poll_ms: Option<u64>,

    /// Receipt polling interval while a transaction confirms (100-60000)
    #[arg(long, env = "SAYSOME_CONFIRMATION_POLL_MS")]
    pub confirmation_poll_ms: Option<u64>,

    /// Wallet account/network polling interval in milliseconds (250-60000)
    #[arg(long, env = "SAYSOME_WALLET_POLL_MS")]
    pub wallet_poll_ms: Option<u64>,

    /// RPC request timeout in milliseconds (1000-60000)
    #[arg(long, env = "SAYSOME_RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Behave like a mobile runtime: deep-link into the wallet app when no provider is found
    #[arg(long, env = "SAYSOME_MOBILE")]
    pub mobile: Option<bool>,

    /// Wallet deep link prefix
    #[arg(long, env = "SAYSOME_DEEP_LINK_BASE")]
    pub deep_link_base: Option<String>,

    /// Public URL of the dapp, handed to the wallet app
    #[arg(long, env = "SAYSOME_DAPP_URL")]
    pub dapp_url: Option<String>,

    /// How long to wait for the wallet after following the deep link (ms)
    #[arg(long, env = "SAYSOME_WALLET_GRACE_MS")]
    pub wallet_grace_ms: Option<u64>,

    /// How long notifications stay on screen (ms)
    #[arg(long, env = "SAYSOME_TOAST_TTL_MS")]
    pub toast_ttl_ms: Option<u64>,

    /// Log file (the terminal UI owns stdout)
    #[arg(long, env = "SAYSOME_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Initial time window: all, today, week, month
    #[arg(long, value_parser = clap::value_parser!(TimeWindow))]
    pub window: Option<TimeWindow>,

    /// Initial sort: newest, oldest, mostLiked
    #[arg(long, value_parser = clap::value_parser!(SortOrder))]
    pub sort: Option<SortOrder>,

    /// Print the feed as JSON and exit instead of starting the UI
    #[arg(long)]
    pub dump: bool,
}

/// On-disk configuration; every key is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub batch_size: Option<u64>,
    pub event_poll_ms: Option<u64>,
    pub confirmation_poll_ms: Option<u64>,
    pub wallet_poll_ms: Option<u64>,
    pub rpc_timeout_ms: Option<u64>,
    pub mobile: Option<bool>,
    pub deep_link_base: Option<String>,
    pub dapp_url: Option<String>,
    pub wallet_grace_ms: Option<u64>,
    pub toast_ttl_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub contract_address: String,
    pub batch_size: u64,
    pub event_poll_ms: u64,
    pub confirmation_poll_ms: u64,
    pub wallet_poll_ms: u64,
    pub rpc_timeout_ms: u64,
    pub mobile: bool,
    pub deep_link_base: String,
    pub dapp_url: String,
    pub wallet_grace_ms: u64,
    pub toast_ttl_ms: u64,
    pub log_file: PathBuf,
    pub window: TimeWindow,
    pub sort: SortOrder,
    pub dump: bool,
}

fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("saysome").join("config.toml"))
    }

    fn default_log_file() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("saysome"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("saysome.log")
    }

    /// Reads the config file (explicit path must exist; the default path may
    /// be absent) and merges it under the CLI/env values.
    pub fn load(args: CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path)?,
                _ => FileConfig::default(),
            },
        };
        Self::merge(args, file)
    }

    pub fn load_file(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn merge(args: CliArgs, file: FileConfig) -> Result<Self> {
        let rpc_url = args
            .rpc_url
            .or(file.rpc_url)
            .unwrap_or_else(|| "http://127.0.0.1:8545".to_string());
        validate_url(&rpc_url, "rpc_url")?;

        // Malformed addresses are kept: the gateway reports them once at
        // initialization instead of refusing to start.
        let contract_address = args
            .contract_address
            .or(file.contract_address)
            .unwrap_or_else(|| ZERO_ADDRESS.to_string());

        let batch_size = validate_in_range(
            args.batch_size.or(file.batch_size).unwrap_or(10),
            1,
            100,
            "batch_size",
        )?;
        let event_poll_ms = validate_in_range(
            args.event_poll_ms.or(file.event_poll_ms).unwrap_or(2000),
            250,
            60000,
            "event_poll_ms",
        )?;
        let confirmation_poll_ms = validate_in_range(
            args.confirmation_poll_ms
                .or(file.confirmation_poll_ms)
                .unwrap_or(1000),
            100,
            60000,
            "confirmation_poll_ms",
        )?;
        let wallet_poll_ms = validate_in_range(
            args.wallet_poll_ms.or(file.wallet_poll_ms).unwrap_or(1500),
            250,
            60000,
            "wallet_poll_ms",
        )?;
        let rpc_timeout_ms = validate_in_range(
            args.rpc_timeout_ms.or(file.rpc_timeout_ms).unwrap_or(8000),
            1000,
            60000,
            "rpc_timeout_ms",
        )?;
        let wallet_grace_ms = validate_in_range(
            args.wallet_grace_ms.or(file.wallet_grace_ms).unwrap_or(3000),
            0,
            60000,
            "wallet_grace_ms",
        )?;
        let toast_ttl_ms = validate_in_range(
            args.toast_ttl_ms.or(file.toast_ttl_ms).unwrap_or(4000),
            500,
            60000,
            "toast_ttl_ms",
        )?;

        let deep_link_base = args
            .deep_link_base
            .or(file.deep_link_base)
            .unwrap_or_else(|| "https://metamask.app.link/dapp".to_string());
        validate_url(&deep_link_base, "deep_link_base")?;

        Ok(Config {
            rpc_url,
            contract_address,
            batch_size,
            event_poll_ms,
            confirmation_poll_ms,
            wallet_poll_ms,
            rpc_timeout_ms,
            mobile: args.mobile.or(file.mobile).unwrap_or(false),
            deep_link_base,
            dapp_url: args
                .dapp_url
                .or(file.dapp_url)
                .unwrap_or_else(|| "saysome.app/says".to_string()),
            wallet_grace_ms,
            toast_ttl_ms,
            log_file: args
                .log_file
                .or(file.log_file)
                .unwrap_or_else(Self::default_log_file),
            window: args.window.unwrap_or_default(),
            sort: args.sort.unwrap_or_default(),
            dump: args.dump,
        })
    }

    /// Zero address: no contract deployed, serve the demo feed.
    pub fn is_demo(&self) -> bool {
        is_zero_address(&self.contract_address)
    }

    pub fn log_summary(&self) {
        log::info!("saysome configuration:");
        log::info!("  RPC URL: {}", self.rpc_url);
        if self.is_demo() {
            log::info!("  Contract: none (demo mode)");
        } else {
            log::info!("  Contract: {}", self.contract_address);
        }
        log::info!("  Batch size: {}", self.batch_size);
        log::info!("  Event poll: {}ms", self.event_poll_ms);
        log::info!("  Wallet poll: {}ms", self.wallet_poll_ms);
        if self.mobile {
            log::info!("  Mobile deep link: {}/{}", self.deep_link_base, self.dapp_url);
        }
    }
}
