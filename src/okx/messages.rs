//! OKX REST response payloads
//!
//! OKX wraps every payload in `{"code": "0", "msg": "", "data": [...]}` and
//! encodes numbers as strings.

use serde::{Deserialize, Serialize};

/// Standard OKX response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkxResponse<T> {
    /// "0" on success
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> OkxResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.code == "0"
    }
}

/// Entry of `/api/v5/market/tickers`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerData {
    pub inst_id: String,
    pub last: String,
    #[serde(default)]
    pub open24h: Option<String>,
}

/// Row of `/api/v5/market/candles`:
/// `[ts, open, high, low, close, vol, volCcy, volCcyQuote, confirm]`
pub type CandleRow = Vec<String>;

/// Index of the close price inside a candle row
pub const CANDLE_CLOSE_INDEX: usize = 4;

/// Entry of `/api/v5/account/balance`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    #[serde(default)]
    pub total_eq: Option<String>,
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

/// Per-currency balance inside an account balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDetail {
    pub ccy: String,
    /// Equity of the currency
    pub eq: String,
}
