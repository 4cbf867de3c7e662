use crate::models::Candle;
use crate::models::GetCandlesRequest;
use crate::models::GetMarketsRequest;
use crate::models::GetTickerRequest;
use crate::models::MarketSnapshot;
use crate::models::Request;
use crate::models::Ticker;
use anyhow::bail;
use anyhow::Result;
use markets::AssetClass;
use markets::AssetId;
use markets::Interval;
use reqwest::Method;
use reqwest::Response;
use reqwest::Url;
use reqwest::{self};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::from_str;
use serde_urlencoded::to_string as to_ustring;

#[derive(Clone)]
pub struct Client {
    url: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(url: impl ToString) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    /// Listing rows for the browse tables of one asset class, ranked by
    /// market cap.
    pub async fn markets(&self, class: AssetClass, limit: u32) -> Result<Vec<MarketSnapshot>> {
        let markets = self
            .send_request(GetMarketsRequest {
                class,
                limit: Some(limit),
            })
            .await?;
        Ok(markets)
    }

    pub async fn ticker(&self, asset: AssetId) -> Result<Ticker> {
        let ticker = self.send_request(GetTickerRequest { asset }).await?;
        Ok(ticker)
    }

    /// OHLCV bars for the chart widget, most recent last.
    pub async fn candles(
        &self,
        asset: AssetId,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let candles = self
            .send_request(GetCandlesRequest {
                asset,
                interval,
                limit: Some(limit),
            })
            .await?;
        Ok(candles)
    }

    async fn send_request<R>(&self, req: R) -> Result<R::Response>
    where
        R: Request,
        R::Response: DeserializeOwned,
    {
        let url = format!("{}{}", self.url, R::ENDPOINT);
        let mut url = Url::parse(&url)?;

        if matches!(R::METHOD, Method::GET | Method::DELETE) && R::HAS_PAYLOAD {
            url.set_query(Some(&to_ustring(&req)?));
        }

        let resp = self
            .client
            .request(R::METHOD, url)
            .header("content-type", "application/json")
            .send()
            .await?;

        let response = self.handle_response(resp).await?;

        Ok(response)
    }

    async fn handle_response<T: DeserializeOwned>(&self, resp: Response) -> Result<T> {
        let status = resp.status();
        let content = resp.text().await?;
        if status.is_success() {
            match from_str::<T>(&content) {
                Ok(ret) => Ok(ret),
                Err(e) => {
                    bail!("Cannot deserialize '{}'. '{}'", content, e);
                }
            }
        } else {
            match from_str::<MarketDataErrorResponse>(&content) {
                Ok(ret) => bail!("Market data error: {:?}", ret),
                Err(e) => {
                    bail!("Cannot deserialize error '{}'. '{}'", content, e);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketDataErrorResponse {
    pub error: String,
}
