use anyhow::bail;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;

pub mod pnl;

/// Provider identifier of a tradeable asset, e.g. `bitcoin` or `aapl`.
///
/// Identifiers are compared case-insensitively; we lowercase on construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AssetId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            bail!("Empty asset id");
        }
        Ok(AssetId::new(value))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssetClass {
    #[serde(rename = "crypto")]
    Crypto,
    #[serde(rename = "stocks")]
    Stock,
    #[serde(rename = "forex")]
    Forex,
    #[serde(rename = "commodities")]
    Commodity,
}

impl AssetClass {
    pub fn label(self) -> String {
        match self {
            AssetClass::Crypto => "crypto".to_string(),
            AssetClass::Stock => "stocks".to_string(),
            AssetClass::Forex => "forex".to_string(),
            AssetClass::Commodity => "commodities".to_string(),
        }
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "crypto" => Ok(AssetClass::Crypto),
            "stock" => Ok(AssetClass::Stock),
            "stocks" => Ok(AssetClass::Stock),
            "forex" => Ok(AssetClass::Forex),
            "commodity" => Ok(AssetClass::Commodity),
            "commodities" => Ok(AssetClass::Commodity),
            unknown => bail!("Unknown asset class {unknown}"),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let class = match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Stock => "stocks",
            AssetClass::Forex => "forex",
            AssetClass::Commodity => "commodities",
        };
        class.to_string().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// How a trade is carried: outright, leveraged futures-style, or as a
/// fixed-expiry binary contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeMode {
    Spot,
    Futures,
    Contract,
}

impl TradeMode {
    pub fn label(self) -> String {
        match self {
            TradeMode::Spot => "spot".to_string(),
            TradeMode::Futures => "futures".to_string(),
            TradeMode::Contract => "contract".to_string(),
        }
    }
}

/// Candle interval codes understood by the market-data provider and the
/// embedded chart widget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    pub fn label(self) -> String {
        match self {
            Interval::OneMinute => "1m".to_string(),
            Interval::FiveMinutes => "5m".to_string(),
            Interval::FifteenMinutes => "15m".to_string(),
            Interval::OneHour => "1h".to_string(),
            Interval::FourHours => "4h".to_string(),
            Interval::OneDay => "1d".to_string(),
            Interval::OneWeek => "1w".to_string(),
        }
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            "1w" => Ok(Interval::OneWeek),
            unknown => bail!("Unknown candle interval {unknown}"),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.label().fmt(f)
    }
}
