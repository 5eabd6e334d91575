use std::io::Write;

use cexarb::app::Config;
use cexarb::error::{ConfigError, Error};
use cexarb::testkit::config::BTC_USDC_TOML;
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn config_loads_from_file() {
    let file = write_temp_config(BTC_USDC_TOML);
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.arbitrage.min_deviation_bps, dec!(60));
    assert_eq!(config.arbitrage.venue_taker_fee_bps, dec!(10));
    assert_eq!(config.chain.usd_denom, "ibc/USDC");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.trading_pairs().unwrap()[0].to_string(), "BTC/USDC");
}

#[test]
fn account_address_can_come_from_environment() {
    let toml = BTC_USDC_TOML.replace("account_address = \"osmo1trader\"\n", "");
    let file = write_temp_config(&toml);

    std::env::set_var("CEXARB_ACCOUNT_ADDRESS", "osmo1fromenv");
    let result = Config::load(file.path());
    std::env::remove_var("CEXARB_ACCOUNT_ADDRESS");

    assert_eq!(result.unwrap().chain.account_address, "osmo1fromenv");
}

#[test]
fn missing_file_is_a_read_error() {
    let result = Config::load("/nonexistent/cexarb.toml");
    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_temp_config("[chain\nusd_denom = 1");
    let result = Config::load(file.path());
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

#[test]
fn config_rejects_invalid_slippage() {
    let toml = BTC_USDC_TOML.replace("slippage_tolerance = 0.005", "slippage_tolerance = 1.5");
    match Config::parse(&toml) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "arbitrage.slippage_tolerance",
            ..
        })) => {}
        other => panic!("expected invalid slippage error, got {other:?}"),
    }
}

#[test]
fn config_rejects_out_of_range_deviation() {
    let toml = BTC_USDC_TOML.replace("min_deviation_bps = 60", "min_deviation_bps = 20000");
    assert!(matches!(
        Config::parse(&toml),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "arbitrage.min_deviation_bps",
            ..
        }))
    ));
}

#[test]
fn duplicate_asset_is_rejected() {
    let toml = format!(
        "{BTC_USDC_TOML}\n[[assets]]\nsymbol = \"BTC\"\ndenom = \"ibc/WBTC\"\n"
    );
    assert!(matches!(
        Config::parse(&toml),
        Err(Error::Config(ConfigError::DuplicateAsset { symbol })) if symbol == "BTC"
    ));
}

#[test]
fn config_without_pairs_is_rejected() {
    let toml = BTC_USDC_TOML.replace("[[pairs]]\nbase = \"BTC\"\nquote = \"USDC\"\n", "");
    assert!(matches!(
        Config::parse(&toml),
        Err(Error::Config(ConfigError::MissingField { field: "pairs" }))
    ));
}

#[test]
fn missing_account_address_is_rejected() {
    let toml = BTC_USDC_TOML.replace("account_address = \"osmo1trader\"\n", "");
    assert!(matches!(
        Config::parse(&toml),
        Err(Error::Config(ConfigError::MissingField {
            field: "chain.account_address"
        }))
    ));
}
