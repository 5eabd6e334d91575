//! Bybit wire message types.
//!
//! Public order-book stream messages carry either a full snapshot or a
//! delta for one symbol. Price and size are decimal strings:
//!
//! ```json
//! {"topic":"orderbook.50.BTCUSDC","type":"delta","ts":1700000000000,
//!  "data":{"s":"BTCUSDC","b":[["60000.5","0.1"]],"a":[["60001","0"]],"u":42,"seq":7}}
//! ```

use serde::Deserialize;

use crate::domain::money::parse_decimal;
use crate::domain::{BookUpdate, DomainError, PriceLevel, UpdateKind};
use crate::error::Result;

/// An order-book stream message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderbookMessage {
    Snapshot { data: OrderbookData },
    Delta { data: OrderbookData },
}

#[derive(Debug, Deserialize)]
pub struct OrderbookData {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b")]
    pub bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    pub asks: Vec<[String; 2]>,
}

impl OrderbookMessage {
    /// Decode one stream frame.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Convert to a [`BookUpdate`] with parsed decimals.
    pub fn into_update(self) -> std::result::Result<BookUpdate, DomainError> {
        let (kind, data) = match self {
            OrderbookMessage::Snapshot { data } => (UpdateKind::Snapshot, data),
            OrderbookMessage::Delta { data } => (UpdateKind::Delta, data),
        };
        Ok(BookUpdate {
            symbol: data.symbol,
            kind,
            bids: parse_levels(&data.bids)?,
            asks: parse_levels(&data.asks)?,
        })
    }
}

fn parse_levels(levels: &[[String; 2]]) -> std::result::Result<Vec<PriceLevel>, DomainError> {
    levels
        .iter()
        .map(|[price, size]| Ok(PriceLevel::new(parse_decimal(price)?, parse_decimal(size)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_snapshot() {
        let raw = r#"{"topic":"orderbook.50.BTCUSDC","type":"snapshot","ts":1,
            "data":{"s":"BTCUSDC","b":[["60000","1.5"]],"a":[["60010","0.2"],["60020","0.3"]],"u":1,"seq":1}}"#;
        let update = OrderbookMessage::parse(raw).unwrap().into_update().unwrap();

        assert_eq!(update.kind, UpdateKind::Snapshot);
        assert_eq!(update.symbol, "BTCUSDC");
        assert_eq!(update.bids, vec![PriceLevel::new(dec!(60000), dec!(1.5))]);
        assert_eq!(update.asks.len(), 2);
    }

    #[test]
    fn decodes_delta_with_removal() {
        let raw = r#"{"type":"delta","data":{"s":"BTCUSDC","b":[],"a":[["60010","0"]]}}"#;
        let update = OrderbookMessage::parse(raw).unwrap().into_update().unwrap();

        assert_eq!(update.kind, UpdateKind::Delta);
        assert!(update.asks[0].size().is_zero());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = r#"{"type":"pong","data":{"s":"BTCUSDC","b":[],"a":[]}}"#;
        assert!(OrderbookMessage::parse(raw).is_err());
    }

    #[test]
    fn bad_decimal_is_rejected() {
        let raw = r#"{"type":"delta","data":{"s":"BTCUSDC","b":[["abc","1"]],"a":[]}}"#;
        let message = OrderbookMessage::parse(raw).unwrap();
        assert!(matches!(
            message.into_update(),
            Err(DomainError::InvalidDecimal { .. })
        ));
    }
}
