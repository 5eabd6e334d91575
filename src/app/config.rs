//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. The account address may be
//! overridden with `CEXARB_ACCOUNT_ADDRESS` so deployments can share one
//! file across accounts.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::{Asset, AssetTable, TradingPair};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Thresholds for detecting, sizing and executing an arbitrage.
#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageConfig {
    /// Minimum deviation between the crossed prices, in basis points.
    #[serde(default = "default_min_deviation_bps")]
    pub min_deviation_bps: Decimal,
    /// Blocks a pair stays idle after an execution attempt.
    #[serde(default = "default_cooldown_blocks")]
    pub cooldown_blocks: u64,
    /// USD value of the smallest fill worth executing when the asset has no
    /// static minimum.
    #[serde(default = "default_min_fill_notional")]
    pub min_fill_notional: Decimal,
    /// Fraction the simulated swap output is discounted by (e.g., 0.005 = 0.5%).
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: Decimal,
    /// Venue taker fee in basis points of the venue leg's notional.
    #[serde(default = "default_venue_taker_fee_bps")]
    pub venue_taker_fee_bps: Decimal,
    /// Upper bound on any single venue or chain call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_min_deviation_bps() -> Decimal {
    Decimal::from(60)
}

const fn default_cooldown_blocks() -> u64 {
    5
}

fn default_min_fill_notional() -> Decimal {
    Decimal::from(10)
}

fn default_slippage_tolerance() -> Decimal {
    Decimal::new(5, 3) // 0.5%
}

fn default_venue_taker_fee_bps() -> Decimal {
    Decimal::from(10)
}

const fn default_call_timeout_secs() -> u64 {
    10
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_deviation_bps: default_min_deviation_bps(),
            cooldown_blocks: default_cooldown_blocks(),
            min_fill_notional: default_min_fill_notional(),
            slippage_tolerance: default_slippage_tolerance(),
            venue_taker_fee_bps: default_venue_taker_fee_bps(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl ArbitrageConfig {
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Account that holds the chain-side balances and signs transactions.
    #[serde(default)]
    pub account_address: String,
    /// Denomination prices are converted into for profitability checks.
    pub usd_denom: String,
    /// Denomination gas is paid in.
    #[serde(default = "default_fee_denom")]
    pub fee_denom: String,
    #[serde(default = "default_fee_decimals")]
    pub fee_decimals: u32,
    /// Fee-denom units per gas unit.
    #[serde(default = "default_gas_price")]
    pub gas_price: Decimal,
    /// Multiplier applied to simulated gas to get the gas limit.
    #[serde(default = "default_gas_adjustment")]
    pub gas_adjustment: Decimal,
}

fn default_fee_denom() -> String {
    "uosmo".into()
}

const fn default_fee_decimals() -> u32 {
    6
}

fn default_gas_price() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

fn default_gas_adjustment() -> Decimal {
    Decimal::new(102, 2) // 1.02
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// Symbol the venue uses, e.g. `BTC`.
    pub symbol: String,
    /// Chain denomination, e.g. `ibc/...`.
    pub denom: String,
    /// Decimal precision; looked up on chain when omitted.
    #[serde(default)]
    pub decimals: Option<u32>,
    /// Static minimum fill in human units.
    #[serde(default)]
    pub min_fill: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairConfig {
    pub base: String,
    pub quote: String,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        if let Ok(address) = std::env::var("CEXARB_ACCOUNT_ADDRESS") {
            config.chain.account_address = address;
        }

        config.validate()?;

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.chain.account_address.is_empty() {
            return Err(ConfigError::MissingField {
                field: "chain.account_address",
            }
            .into());
        }
        if self.chain.usd_denom.is_empty() {
            return Err(ConfigError::MissingField {
                field: "chain.usd_denom",
            }
            .into());
        }
        if self.chain.fee_denom.is_empty() {
            return Err(ConfigError::MissingField {
                field: "chain.fee_denom",
            }
            .into());
        }
        if self.chain.gas_price < Decimal::ZERO {
            return Err(invalid("chain.gas_price", "must not be negative"));
        }

        let arb = &self.arbitrage;
        if arb.min_deviation_bps < Decimal::ZERO || arb.min_deviation_bps > Decimal::from(10_000) {
            return Err(invalid(
                "arbitrage.min_deviation_bps",
                "must be between 0 and 10000",
            ));
        }
        if arb.cooldown_blocks == 0 {
            return Err(invalid("arbitrage.cooldown_blocks", "must be at least 1"));
        }
        if arb.slippage_tolerance < Decimal::ZERO || arb.slippage_tolerance >= Decimal::ONE {
            return Err(invalid(
                "arbitrage.slippage_tolerance",
                "must be in [0, 1)",
            ));
        }
        if arb.min_fill_notional < Decimal::ZERO {
            return Err(invalid("arbitrage.min_fill_notional", "must not be negative"));
        }
        if arb.call_timeout_secs == 0 {
            return Err(invalid("arbitrage.call_timeout_secs", "must be at least 1"));
        }

        for asset in &self.assets {
            if asset.denom.is_empty() {
                return Err(invalid("assets.denom", format!("empty for {}", asset.symbol)));
            }
        }
        if self.pairs.is_empty() {
            return Err(ConfigError::MissingField { field: "pairs" }.into());
        }
        self.trading_pairs()?;
        Ok(())
    }

    /// The immutable symbol table for the configured assets.
    #[allow(clippy::result_large_err)]
    pub fn asset_table(&self) -> Result<AssetTable> {
        let assets = self.assets.iter().map(|a| {
            let mut asset = Asset::new(&a.symbol, &a.denom);
            if let Some(decimals) = a.decimals {
                asset = asset.with_decimals(decimals);
            }
            if let Some(min_fill) = a.min_fill {
                asset = asset.with_min_fill(min_fill);
            }
            asset
        });
        AssetTable::new(assets).map_err(|symbol| ConfigError::DuplicateAsset { symbol }.into())
    }

    /// Configured pairs with their assets resolved.
    #[allow(clippy::result_large_err)]
    pub fn trading_pairs(&self) -> Result<Vec<TradingPair>> {
        let table = self.asset_table()?;
        let lookup = |symbol: &str| {
            table
                .get(symbol)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownAsset {
                    symbol: symbol.to_string(),
                })
        };
        self.pairs
            .iter()
            .map(|p| Ok(TradingPair::new(lookup(&p.base)?, lookup(&p.quote)?)))
            .collect()
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
        [chain]
        account_address = "osmo1abc"
        usd_denom = "ibc/USDC"

        [[assets]]
        symbol = "BTC"
        denom = "ibc/BTC"
        decimals = 8

        [[assets]]
        symbol = "USDC"
        denom = "ibc/USDC"
        decimals = 6

        [[pairs]]
        base = "BTC"
        quote = "USDC"
    "#;

    #[test]
    fn defaults_apply() {
        let config = Config::parse(MINIMAL).unwrap();

        assert_eq!(config.arbitrage.min_deviation_bps, dec!(60));
        assert_eq!(config.arbitrage.cooldown_blocks, 5);
        assert_eq!(config.arbitrage.min_fill_notional, dec!(10));
        assert_eq!(config.arbitrage.slippage_tolerance, dec!(0.005));
        assert_eq!(config.arbitrage.call_timeout(), Duration::from_secs(10));
        assert_eq!(config.chain.fee_denom, "uosmo");
        assert_eq!(config.chain.gas_price, dec!(0.1));
        assert_eq!(config.chain.gas_adjustment, dec!(1.02));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn pairs_resolve_to_assets() {
        let config = Config::parse(MINIMAL).unwrap();
        let pairs = config.trading_pairs().unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].venue_symbol(), "BTCUSDC");
        assert_eq!(pairs[0].base().decimals(), Some(8));
    }

    #[test]
    fn unknown_pair_asset_is_rejected() {
        let content = MINIMAL.replace("quote = \"USDC\"", "quote = \"EUR\"");
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("EUR"));
    }

    #[test]
    fn zero_cooldown_is_rejected() {
        let content = format!("{MINIMAL}\n[arbitrage]\ncooldown_blocks = 0\n");
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("cooldown_blocks"));
    }
}
