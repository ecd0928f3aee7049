use crate::defines::*;
use crate::error::{BotError, Result};
use crate::types::*;
use crate::util::{build_query, sign, timestamp_ms};

use isahc::config::Configurable;
use isahc::{Body, HttpClient, ReadResponseExt};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Exchange capabilities the order workflow and the console driver rely on.
///
/// Every call blocks until the exchange answers. Implementations hold no
/// state the caller needs to know about.
pub trait ExchangeGateway {
    fn futures_balances(&self) -> Result<Vec<FuturesBalance>>;

    /// Spot balance of `asset`, `None` when the account holds none of it.
    fn spot_balance(&self, asset: &str) -> Result<Option<SpotBalance>>;

    /// Move `amount` of `asset` between spot and futures wallets, returns the
    /// transfer id.
    fn transfer(&self, asset: &str, amount: Decimal, direction: TransferType) -> Result<u64>;

    fn ticker_price(&self, symbol: &str) -> Result<TickerPrice>;

    fn exchange_info(&self) -> Result<ExchangeInfo>;

    fn position_mode(&self) -> Result<PositionMode>;

    fn set_position_mode(&self, mode: PositionMode) -> Result<()>;

    fn create_order(&self, request: &OrderRequest) -> Result<FuturesOrder>;

    fn open_orders(&self, symbol: &str) -> Result<Vec<FuturesOrder>>;

    fn order_status(&self, symbol: &str, order_id: u64) -> Result<FuturesOrder>;

    /// Position snapshots for `symbol`, or for every symbol when `None`.
    fn positions(&self, symbol: Option<&str>) -> Result<Vec<Position>>;
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
}

/// Blocking REST client for Binance USDT-M futures plus the two spot
/// endpoints needed for wallet balances and transfers.
pub struct BinanceFuturesClient {
    http: HttpClient,
    api_secret: String,
    futures_base: Url,
    spot_base: Url,
}

impl BinanceFuturesClient {
    pub fn new(ctx: &TradingContext) -> Result<BinanceFuturesClient> {
        let http = HttpClient::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_header(API_KEY_HEADER, ctx.api_key.as_str())
            .build()?;

        Ok(BinanceFuturesClient {
            http,
            api_secret: ctx.api_secret.clone(),
            futures_base: Url::parse(&ctx.futures_base_url)?,
            spot_base: Url::parse(&ctx.spot_base_url)?,
        })
    }

    /// Build the final query string. Signed requests get `recvWindow`,
    /// `timestamp` and the HMAC signature of everything before it appended.
    fn query(&self, mut params: Vec<(&str, String)>, signed: bool) -> String {
        if !signed {
            return build_query(&params);
        }
        params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
        params.push(("timestamp", timestamp_ms().to_string()));
        let unsigned = build_query(&params);
        let signature = sign(&self.api_secret, &unsigned);
        format!("{unsigned}&signature={signature}")
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        base: &Url,
        path: &str,
        params: Vec<(&str, String)>,
        signed: bool,
    ) -> Result<T> {
        let mut url = base.join(path)?;
        let query = self.query(params, signed);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        debug!(?method, path, signed, "sending request");
        let mut response = match method {
            Method::Get => self.http.get(url.as_str())?,
            Method::Post => self.http.post(url.as_str(), Body::empty())?,
        };

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            debug!(status = status.as_u16(), path, "request rejected");
            return Err(BotError::from_response(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn futures<T: DeserializeOwned>(&self, method: Method, path: &str, params: Vec<(&str, String)>, signed: bool) -> Result<T> {
        self.send(method, &self.futures_base, path, params, signed)
    }

    fn spot<T: DeserializeOwned>(&self, method: Method, path: &str, params: Vec<(&str, String)>) -> Result<T> {
        self.send(method, &self.spot_base, path, params, true)
    }
}

impl ExchangeGateway for BinanceFuturesClient {
    fn futures_balances(&self) -> Result<Vec<FuturesBalance>> {
        self.futures(Method::Get, EP_FUTURES_BALANCE, vec![], true)
    }

    fn spot_balance(&self, asset: &str) -> Result<Option<SpotBalance>> {
        let account: SpotAccountResponse = self.spot(Method::Get, EP_SPOT_ACCOUNT, vec![])?;
        Ok(account.balances.into_iter().find(|b| b.asset == asset))
    }

    fn transfer(&self, asset: &str, amount: Decimal, direction: TransferType) -> Result<u64> {
        let params = vec![
            ("asset", asset.to_string()),
            ("amount", amount.normalize().to_string()),
            ("type", (direction as u8).to_string()),
        ];
        let response: TransferResponse = self.spot(Method::Post, EP_FUTURES_TRANSFER, params)?;
        Ok(response.tran_id)
    }

    fn ticker_price(&self, symbol: &str) -> Result<TickerPrice> {
        self.futures(Method::Get, EP_TICKER_PRICE, vec![("symbol", symbol.to_string())], false)
    }

    fn exchange_info(&self) -> Result<ExchangeInfo> {
        self.futures(Method::Get, EP_EXCHANGE_INFO, vec![], false)
    }

    fn position_mode(&self) -> Result<PositionMode> {
        let response: PositionModeResponse = self.futures(Method::Get, EP_POSITION_MODE, vec![], true)?;
        Ok(PositionMode::from_dual_side(response.dual_side_position))
    }

    fn set_position_mode(&self, mode: PositionMode) -> Result<()> {
        let params = vec![("dualSidePosition", mode.is_dual_side().to_string())];
        let _: serde_json::Value = self.futures(Method::Post, EP_POSITION_MODE, params, true)?;
        Ok(())
    }

    fn create_order(&self, request: &OrderRequest) -> Result<FuturesOrder> {
        self.futures(Method::Post, EP_ORDER, request.to_params(), true)
    }

    fn open_orders(&self, symbol: &str) -> Result<Vec<FuturesOrder>> {
        self.futures(Method::Get, EP_OPEN_ORDERS, vec![("symbol", symbol.to_string())], true)
    }

    fn order_status(&self, symbol: &str, order_id: u64) -> Result<FuturesOrder> {
        let params = vec![("symbol", symbol.to_string()), ("orderId", order_id.to_string())];
        self.futures(Method::Get, EP_ORDER, params, true)
    }

    fn positions(&self, symbol: Option<&str>) -> Result<Vec<Position>> {
        let params = symbol.map(|s| vec![("symbol", s.to_string())]).unwrap_or_default();
        self.futures(Method::Get, EP_POSITION_RISK, params, true)
    }
}
