use markets::AssetClass;
use markets::AssetId;
use markets::Interval;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

pub trait Request: Serialize {
    const METHOD: Method;
    const ENDPOINT: &'static str;
    const HAS_PAYLOAD: bool = true;
    type Response: DeserializeOwned;

    #[inline]
    fn no_payload(&self) -> bool {
        !Self::HAS_PAYLOAD
    }
}

/// Current quote of a single asset.
#[derive(Clone, Debug, Deserialize)]
pub struct Ticker {
    pub asset: AssetId,
    #[serde(rename = "priceUsd")]
    pub price_usd: f64,
    #[serde(rename = "change24h")]
    pub change_24h_pct: Option<f64>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// One OHLCV bar, as charted by the embedded widget.
#[derive(Clone, Debug, Deserialize)]
pub struct Candle {
    #[serde(rename = "openTime", with = "time::serde::rfc3339")]
    pub open_time: OffsetDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Listing row for the browse tables, one per asset.
#[derive(Clone, Debug, Deserialize)]
pub struct MarketSnapshot {
    pub asset: AssetId,
    pub symbol: String,
    pub name: String,
    pub class: AssetClass,
    #[serde(rename = "priceUsd")]
    pub price_usd: f64,
    #[serde(rename = "change24h")]
    pub change_24h_pct: Option<f64>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<f64>,
    #[serde(rename = "marketCapRank")]
    pub market_cap_rank: Option<u32>,
}

/// List the markets of one asset class, ranked by market cap.
#[derive(Clone, Debug, Serialize)]
pub struct GetMarketsRequest {
    pub class: AssetClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Request for GetMarketsRequest {
    const METHOD: Method = Method::GET;
    const ENDPOINT: &'static str = "/markets";
    const HAS_PAYLOAD: bool = true;
    type Response = Vec<MarketSnapshot>;
}

#[derive(Clone, Debug, Serialize)]
pub struct GetTickerRequest {
    pub asset: AssetId,
}

impl Request for GetTickerRequest {
    const METHOD: Method = Method::GET;
    const ENDPOINT: &'static str = "/ticker";
    const HAS_PAYLOAD: bool = true;
    type Response = Ticker;
}

#[derive(Clone, Debug, Serialize)]
pub struct GetCandlesRequest {
    pub asset: AssetId,
    pub interval: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Request for GetCandlesRequest {
    const METHOD: Method = Method::GET;
    const ENDPOINT: &'static str = "/candles";
    const HAS_PAYLOAD: bool = true;
    type Response = Vec<Candle>;
}
