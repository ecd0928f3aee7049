use crate::defines::*;
use crate::error::{BotError, Result};
use crate::types::*;

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

impl TradingContext {
    /// Read credentials and endpoints from the environment, after loading a
    /// `.env` file from the working directory if one exists.
    pub fn from_env(use_testnet: bool) -> Result<TradingContext> {
        dotenvy::dotenv().ok();

        let api_key = required_env("BINANCE_API_KEY")?;
        let api_secret = required_env("BINANCE_API_SECRET")?;

        let (futures_default, spot_default) = if use_testnet {
            (FUTURES_TESTNET_URL, SPOT_TESTNET_URL)
        } else {
            (FUTURES_MAINNET_URL, SPOT_MAINNET_URL)
        };

        Ok(TradingContext {
            api_key,
            api_secret,
            futures_base_url: std::env::var("BINANCE_FUTURES_REST_URL")
                .unwrap_or_else(|_| futures_default.to_string()),
            spot_base_url: std::env::var("BINANCE_SPOT_REST_URL")
                .unwrap_or_else(|_| spot_default.to_string()),
            use_testnet,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(BotError::Config(format!("required env variable {key} is not set"))),
    }
}

/// Provide default values for `WorkflowTiming`
impl Default for WorkflowTiming {
    fn default() -> WorkflowTiming {
        WorkflowTiming {
            market_settle: Duration::from_millis(DEFAULT_MARKET_SETTLE_MS),
            limit_settle: Duration::from_millis(DEFAULT_LIMIT_SETTLE_MS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            transfer_settle: Duration::from_millis(TRANSFER_SETTLE_MS),
        }
    }
}

impl WorkflowTiming {
    /// No waiting at all; every poll checks exactly once.
    #[cfg(test)]
    pub fn immediate() -> WorkflowTiming {
        WorkflowTiming {
            market_settle: Duration::ZERO,
            limit_settle: Duration::ZERO,
            retry_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            poll_timeout: Duration::ZERO,
            transfer_settle: Duration::ZERO,
        }
    }
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Position side an opening order lands on in hedge mode.
    pub fn opening_position_side(&self) -> PositionSide {
        match self {
            Side::Buy => PositionSide::Long,
            Side::Sell => PositionSide::Short,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Side> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(BotError::InvalidInput(format!("side must be BUY or SELL, got '{other}'"))),
        }
    }
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopMarket => "STOP_MARKET",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
        }
    }
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Both => "BOTH",
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }
}

impl PositionMode {
    pub fn from_dual_side(dual_side_position: bool) -> PositionMode {
        if dual_side_position {
            PositionMode::Hedge
        } else {
            PositionMode::OneWay
        }
    }

    pub fn is_dual_side(&self) -> bool {
        matches!(self, PositionMode::Hedge)
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionMode::OneWay => f.write_str("one-way"),
            PositionMode::Hedge => f.write_str("hedge"),
        }
    }
}

impl FromStr for MenuChoice {
    type Err = BotError;

    fn from_str(s: &str) -> Result<MenuChoice> {
        match s.trim() {
            "1" => Ok(MenuChoice::Market),
            "2" => Ok(MenuChoice::Limit),
            "3" => Ok(MenuChoice::StopLimit),
            other => Err(BotError::InvalidInput(format!("invalid choice '{other}'"))),
        }
    }
}

impl OrderRequest {
    pub fn market(symbol: &str, side: Side, quantity: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
            reduce_only: Some(false),
            close_position: None,
            position_side: None,
            full_result: true,
        }
    }

    pub fn limit(symbol: &str, side: Side, quantity: Decimal, price: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            stop_price: None,
            time_in_force: Some(TimeInForce::Gtc),
            reduce_only: None,
            close_position: None,
            position_side: None,
            full_result: false,
        }
    }

    pub fn stop_market(symbol: &str, side: Side, quantity: Decimal, price: Decimal, stop_price: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::StopMarket,
            quantity,
            price: Some(price),
            stop_price: Some(stop_price),
            time_in_force: Some(TimeInForce::Gtc),
            reduce_only: None,
            close_position: Some(false),
            position_side: None,
            full_result: false,
        }
    }

    /// Set the hedge-mode position side. Binance refuses `reduceOnly` in
    /// hedge mode, so it is dropped whenever a side is given.
    pub fn with_position_side(mut self, position_side: Option<PositionSide>) -> OrderRequest {
        if position_side.is_some() {
            self.reduce_only = None;
        }
        self.position_side = position_side;
        self
    }

    /// Unsigned request parameters, in the order they are sent.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("type", self.order_type.as_str().to_string()),
            ("quantity", self.quantity.normalize().to_string()),
        ];
        if let Some(price) = self.price {
            params.push(("price", price.normalize().to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            params.push(("stopPrice", stop_price.normalize().to_string()));
        }
        if let Some(tif) = self.time_in_force {
            params.push(("timeInForce", tif.as_str().to_string()));
        }
        if let Some(reduce_only) = self.reduce_only {
            params.push(("reduceOnly", reduce_only.to_string()));
        }
        if let Some(close_position) = self.close_position {
            params.push(("closePosition", close_position.to_string()));
        }
        if let Some(position_side) = self.position_side {
            params.push(("positionSide", position_side.as_str().to_string()));
        }
        if self.full_result {
            params.push(("newOrderRespType", "RESULT".to_string()));
        }
        params
    }
}

impl Position {
    /// Nonzero amount, i.e. the account is exposed on this symbol.
    pub fn is_active(&self) -> bool {
        !self.position_amt.is_zero()
    }
}
