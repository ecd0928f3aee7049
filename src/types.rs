use clap::Parser;
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Debug, Parser)]
#[clap(name="binfut")]
#[clap(about="binfut walks you through placing a market, limit or stop order on Binance USDT-M futures", long_about=None)]
pub struct CommandlineArgs {
    /// Top up the futures wallet from spot when it runs low, before anything else
    #[clap(long)]
    pub auto_transfer: bool,

    /// Number of attempts for limit and stop orders
    #[clap(long, default_value_t=crate::defines::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Execute against production endpoints instead of testnet.
    // Real funds are at risk with this flag, testnet stays the default.
    #[clap(long)]
    pub mainnet: bool,
}

/// `TradingContext` holds credentials and endpoints resolved at startup.
pub struct TradingContext {
    /// Set environment variable with name BINANCE_API_KEY
    pub api_key: String,

    /// Set environment variable with name BINANCE_API_SECRET
    pub api_secret: String,

    /// USDT-M futures REST base, overridable with BINANCE_FUTURES_REST_URL
    pub futures_base_url: String,

    /// Spot REST base (balances, transfers), overridable with BINANCE_SPOT_REST_URL
    pub spot_base_url: String,

    /// Whether or not to execute API against testnet
    pub use_testnet: bool,
}

/// Waits used by the order workflow while the exchange propagates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTiming {
    /// Pause after a market order before looking for the position
    pub market_settle: Duration,
    /// Pause after a limit/stop order before looking in open orders
    pub limit_settle: Duration,
    /// Pause between two failed attempts
    pub retry_delay: Duration,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    /// Pause after a spot→futures transfer
    pub transfer_settle: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    Gtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    Both,
    Long,
    Short,
}

/// Account-wide position mode. Hedge is Binance's "dual side position".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionMode {
    OneWay,
    Hedge,
}

/// Direction of a wallet transfer between spot and USDT-M futures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    SpotToFutures = 1,
}

/// Order types offered by the console menu, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Market,
    Limit,
    StopLimit,
}

/// Everything needed to submit one order. Numbers are sent as given, any
/// rounding happens before the request is built.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub reduce_only: Option<bool>,
    pub close_position: Option<bool>,
    pub position_side: Option<PositionSide>,
    /// Ask for the final fill result rather than a bare acknowledgement
    pub full_result: bool,
}

/// Decimal places required by a symbol's filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolPrecision {
    /// Digits after the decimal point of `PRICE_FILTER.tickSize`
    pub price: u32,
    /// Digits after the decimal point of `LOT_SIZE.stepSize`
    pub quantity: u32,
}

/// Element of the futures balance response.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesBalance {
    pub asset: String,
    pub balance: Decimal,
    #[serde(default)]
    pub available_balance: Decimal,
}

/// Element of the spot account's `balances` list.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SpotBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct SpotAccountResponse {
    pub balances: Vec<SpotBalance>,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub tran_id: u64,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionModeResponse {
    pub dual_side_position: bool,
}

/// Only the part of exchange info the precision lookup needs.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// Filter values are kept as text since precision is read off their digits.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    #[serde(default)]
    pub tick_size: Option<String>,
    #[serde(default)]
    pub step_size: Option<String>,
}

/// Order as returned by create-order, order-status and open-orders.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesOrder {
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: Side,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stop_price: Decimal,
    #[serde(default)]
    pub orig_qty: Decimal,
    #[serde(default)]
    pub executed_qty: Decimal,
    #[serde(default)]
    pub avg_price: Decimal,
    #[serde(default)]
    pub position_side: Option<PositionSide>,
}

/// Element of the position risk response.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub position_amt: Decimal,
    pub entry_price: Decimal,
    #[serde(rename = "unRealizedProfit")]
    pub unrealized_profit: Decimal,
    #[serde(default)]
    pub position_side: Option<PositionSide>,
}

/// Where the USDT futures balance stands against the testnet minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBalanceStatus {
    Sufficient(Decimal),
    /// Below the minimum, `None` when the wallet has no USDT entry at all
    Low(Option<Decimal>),
}
