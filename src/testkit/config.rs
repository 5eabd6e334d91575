//! Canonical test configuration.
//!
//! One BTC/USDC pair with BTC at 8 decimals and USDC at 6, USDC doubling
//! as the USD denomination.

use crate::app::Config;

pub const ACCOUNT: &str = "osmo1trader";
pub const BTC_DENOM: &str = "ibc/BTC";
pub const USDC_DENOM: &str = "ibc/USDC";
pub const FEE_DENOM: &str = "uosmo";

pub const BTC_USDC_TOML: &str = r#"
[logging]
level = "debug"

[arbitrage]
min_deviation_bps = 60
cooldown_blocks = 5
min_fill_notional = 10
slippage_tolerance = 0.005
venue_taker_fee_bps = 10
call_timeout_secs = 10

[chain]
account_address = "osmo1trader"
usd_denom = "ibc/USDC"
fee_denom = "uosmo"
fee_decimals = 6
gas_price = 0.1
gas_adjustment = 1.02

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

/// The BTC/USDC configuration.
pub fn btc_usdc() -> Config {
    Config::parse(BTC_USDC_TOML).expect("test configuration is valid")
}
