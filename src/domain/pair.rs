//! Assets and trading pairs.

use std::collections::HashMap;
use std::fmt;

use super::money::Volume;

/// Static metadata for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    symbol: String,
    denom: String,
    decimals: Option<u32>,
    min_fill: Option<Volume>,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            denom: denom.into(),
            decimals: None,
            min_fill: None,
        }
    }

    /// Set the known decimal precision. Without it the chain is asked.
    #[must_use]
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Set a static minimum fill in human base units.
    #[must_use]
    pub fn with_min_fill(mut self, min_fill: Volume) -> Self {
        self.min_fill = Some(min_fill);
        self
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn denom(&self) -> &str {
        &self.denom
    }

    #[must_use]
    pub const fn decimals(&self) -> Option<u32> {
        self.decimals
    }

    #[must_use]
    pub const fn min_fill(&self) -> Option<Volume> {
        self.min_fill
    }
}

/// Immutable symbol-to-asset lookup, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    by_symbol: HashMap<String, Asset>,
}

impl AssetTable {
    /// Build the table. Returns the first duplicated symbol as `Err`.
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Result<Self, String> {
        let mut by_symbol = HashMap::new();
        for asset in assets {
            let symbol = asset.symbol.clone();
            if by_symbol.insert(symbol.clone(), asset).is_some() {
                return Err(symbol);
            }
        }
        Ok(Self { by_symbol })
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Asset> {
        self.by_symbol.get(symbol)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// A base/quote pair tradable on both the venue and the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    base: Asset,
    quote: Asset,
}

impl TradingPair {
    #[must_use]
    pub const fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }

    #[must_use]
    pub const fn base(&self) -> &Asset {
        &self.base
    }

    #[must_use]
    pub const fn quote(&self) -> &Asset {
        &self.quote
    }

    /// Symbol the venue lists this pair under, e.g. `BTCUSDC`.
    #[must_use]
    pub fn venue_symbol(&self) -> String {
        format!("{}{}", self.base.symbol, self.quote.symbol)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base.symbol, self.quote.symbol)
    }
}
