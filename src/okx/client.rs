//! OKX market data provider built on the REST client

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::messages::{AccountBalance, TickerData, CANDLE_CLOSE_INDEX};
use super::rest::OkxRestClient;
use crate::common::errors::{MonitorError, Result};
use crate::common::traits::MarketDataProvider;
use crate::common::types::{instrument_id, PortfolioAsset, PortfolioReport, PriceMap, PriceTick};
use crate::config::types::OkxConfig;

/// Candle size used for technical analysis
const ANALYSIS_BAR: &str = "1D";

/// Market data and portfolio access through OKX
pub struct OkxClient {
    /// REST API client
    rest_client: OkxRestClient,
    /// Currency every asset is valued in
    quote_currency: String,
}

impl OkxClient {
    /// Create a new OKX client from configuration
    pub fn new(config: &OkxConfig, timeout: Duration) -> Result<Self> {
        let rest_client = OkxRestClient::with_timeout(&config.rest_url, timeout)?;

        let rest_client = match config.credentials() {
            Some(creds) => rest_client.with_credentials(creds),
            None => {
                info!("No OKX credentials configured, portfolio fetches will fail");
                rest_client
            }
        };

        Ok(Self {
            rest_client,
            quote_currency: config.quote_currency.clone(),
        })
    }
}

/// Convert ticker rows into a price map, dropping rows with bad numbers
pub fn tickers_to_prices(tickers: Vec<TickerData>) -> PriceMap {
    tickers
        .into_iter()
        .filter_map(|t| {
            let price: Decimal = match t.last.parse() {
                Ok(p) => p,
                Err(_) => {
                    warn!("Skipping ticker {} with unparsable price {}", t.inst_id, t.last);
                    return None;
                }
            };
            let open_24h = t.open24h.and_then(|o| o.parse().ok());
            Some((t.inst_id, PriceTick { price, open_24h }))
        })
        .collect()
}

/// Value every currency with positive equity against the quote currency
///
/// The quote currency itself is worth 1; currencies without a price are
/// kept with a zero value.
pub fn value_balances(
    accounts: &[AccountBalance],
    prices: &PriceMap,
    quote_currency: &str,
) -> Result<PortfolioReport> {
    let mut assets = Vec::new();
    let mut total = Decimal::ZERO;

    for detail in accounts.iter().flat_map(|a| a.details.iter()) {
        let amount: Decimal = detail.eq.parse().map_err(|e| {
            MonitorError::InvalidResponse(format!("Invalid equity for {}: {}", detail.ccy, e))
        })?;
        if amount <= Decimal::ZERO {
            continue;
        }

        let price = if detail.ccy == quote_currency {
            Decimal::ONE
        } else {
            prices
                .get(&instrument_id(&detail.ccy, quote_currency))
                .map(|tick| tick.price)
                .unwrap_or(Decimal::ZERO)
        };

        let value = amount * price;
        total += value;
        assets.push(PortfolioAsset {
            asset: detail.ccy.clone(),
            amount,
            price,
            value,
        });
    }

    assets.sort_by(|a, b| b.value.cmp(&a.value));

    Ok(PortfolioReport {
        assets,
        total,
        error: None,
    })
}

#[async_trait]
impl MarketDataProvider for OkxClient {
    #[instrument(skip(self))]
    async fn get_market_prices(&self) -> Result<PriceMap> {
        let prices = tickers_to_prices(self.rest_client.get_spot_tickers().await?);
        if prices.is_empty() {
            return Err(MonitorError::MarketDataUnavailable(
                "OKX returned no spot tickers".to_string(),
            ));
        }
        Ok(prices)
    }

    #[instrument(skip(self))]
    async fn get_historical_candles(&self, instrument: &str, count: usize) -> Result<Vec<Decimal>> {
        let rows = self
            .rest_client
            .get_candles(instrument, ANALYSIS_BAR, count)
            .await?;

        let mut closes = rows
            .iter()
            .map(|row| {
                row.get(CANDLE_CLOSE_INDEX)
                    .ok_or_else(|| {
                        MonitorError::InvalidResponse("Candle row too short".to_string())
                    })?
                    .parse::<Decimal>()
                    .map_err(|e| MonitorError::InvalidResponse(format!("Invalid close: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        // OKX returns newest first
        closes.truncate(count);
        closes.reverse();
        Ok(closes)
    }

    #[instrument(skip(self, prices))]
    async fn get_portfolio(&self, prices: &PriceMap) -> Result<PortfolioReport> {
        if !self.rest_client.has_credentials() {
            return Ok(PortfolioReport::failed("OKX API credentials are not configured"));
        }

        let accounts = match self.rest_client.get_account_balance().await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("Account balance fetch failed: {}", e);
                return Ok(PortfolioReport::failed(e.to_string()));
            }
        };

        match value_balances(&accounts, prices, &self.quote_currency) {
            Ok(report) => Ok(report),
            Err(e) => Ok(PortfolioReport::failed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okx::messages::BalanceDetail;
    use rust_decimal_macros::dec;

    fn detail(ccy: &str, eq: &str) -> BalanceDetail {
        BalanceDetail {
            ccy: ccy.to_string(),
            eq: eq.to_string(),
        }
    }

    #[test]
    fn test_value_balances() {
        let accounts = vec![AccountBalance {
            total_eq: None,
            details: vec![
                detail("USDT", "250"),
                detail("BTC", "0.01"),
                detail("DOGE", "0"),
                detail("XYZ", "3"),
            ],
        }];
        let mut prices = PriceMap::new();
        prices.insert("BTC-USDT".to_string(), PriceTick::new(dec!(50000)));

        let report = value_balances(&accounts, &prices, "USDT").unwrap();

        assert_eq!(report.total, dec!(750));
        assert_eq!(report.assets.len(), 3);
        assert_eq!(report.assets[0].asset, "BTC");
        assert_eq!(report.assets[0].value, dec!(500));
        assert_eq!(report.assets[2].asset, "XYZ");
        assert_eq!(report.assets[2].value, Decimal::ZERO);
    }

    #[test]
    fn test_tickers_to_prices_skips_bad_rows() {
        let tickers = vec![
            TickerData {
                inst_id: "BTC-USDT".into(),
                last: "50000".into(),
                open24h: Some("48000".into()),
            },
            TickerData {
                inst_id: "BAD-USDT".into(),
                last: "".into(),
                open24h: None,
            },
        ];
        let prices = tickers_to_prices(tickers);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["BTC-USDT"].open_24h, Some(dec!(48000)));
    }
}
