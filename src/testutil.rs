//! In-memory `ExchangeGateway` that records calls, shared by the unit tests.

use crate::error::{BotError, Result};
use crate::gateway::ExchangeGateway;
use crate::types::*;

use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::str::FromStr;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn api_error(code: i64, message: &str) -> BotError {
    BotError::Api { code, message: message.to_string() }
}

pub fn position(symbol: &str, amount: &str) -> Position {
    Position {
        symbol: symbol.to_string(),
        position_amt: dec(amount),
        entry_price: dec("30000"),
        unrealized_profit: dec("0.5"),
        position_side: None,
    }
}

pub fn symbol_info(symbol: &str, tick: &str, step: &str) -> SymbolInfo {
    SymbolInfo {
        symbol: symbol.to_string(),
        filters: vec![
            SymbolFilter { filter_type: "PRICE_FILTER".into(), tick_size: Some(tick.into()), step_size: None },
            SymbolFilter { filter_type: "LOT_SIZE".into(), tick_size: None, step_size: Some(step.into()) },
        ],
    }
}

/// Scripted failures pop from the front on each call; once a script is empty
/// the call succeeds with the configured state.
#[derive(Default)]
pub struct FakeGateway {
    pub futures_balances: RefCell<Vec<FuturesBalance>>,
    pub spot_balances: RefCell<Vec<SpotBalance>>,
    pub prices: RefCell<Vec<TickerPrice>>,
    pub symbols: RefCell<Vec<SymbolInfo>>,
    pub mode: Cell<Option<PositionMode>>,
    pub positions: RefCell<Vec<Position>>,
    /// Positions that appear only after an order has been submitted
    pub positions_after_fill: RefCell<Vec<Position>>,
    pub open_orders: RefCell<Vec<FuturesOrder>>,
    /// Whether submitted orders show up in `open_orders`
    pub list_submitted: Cell<bool>,

    pub exchange_info_errors: RefCell<Vec<BotError>>,
    pub mode_errors: RefCell<Vec<BotError>>,
    pub set_mode_errors: RefCell<Vec<BotError>>,
    pub positions_errors: RefCell<Vec<BotError>>,
    /// Position queries fail once any order has been submitted
    pub positions_fail_after_order: Cell<bool>,
    pub order_errors: RefCell<Vec<BotError>>,
    pub open_orders_errors: RefCell<Vec<BotError>>,
    pub balance_errors: RefCell<Vec<BotError>>,

    pub set_mode_calls: RefCell<Vec<PositionMode>>,
    pub submitted: RefCell<Vec<OrderRequest>>,
    pub order_attempts: Cell<u32>,
    pub order_status_calls: Cell<u32>,
    pub transfers: RefCell<Vec<(String, Decimal, TransferType)>>,
    next_order_id: Cell<u64>,
}

fn pop_error(errors: &RefCell<Vec<BotError>>) -> Result<()> {
    let mut errors = errors.borrow_mut();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.remove(0))
    }
}

impl FakeGateway {
    pub fn new() -> FakeGateway {
        let gateway = FakeGateway::default();
        gateway.mode.set(Some(PositionMode::OneWay));
        gateway.list_submitted.set(true);
        gateway.next_order_id.set(1000);
        gateway
    }

    /// BTCUSDT with tick 0.01 / step 0.001 and a 30000 price.
    pub fn btcusdt() -> FakeGateway {
        let gateway = FakeGateway::new();
        gateway.symbols.borrow_mut().push(symbol_info("BTCUSDT", "0.01", "0.001"));
        gateway.prices.borrow_mut().push(TickerPrice { symbol: "BTCUSDT".into(), price: dec("30000") });
        gateway
    }

    pub fn with_futures_usdt(self, amount: &str) -> FakeGateway {
        self.futures_balances.borrow_mut().push(FuturesBalance {
            asset: "USDT".into(),
            balance: dec(amount),
            available_balance: dec(amount),
        });
        self
    }

    pub fn with_spot_usdt(self, amount: &str) -> FakeGateway {
        self.spot_balances.borrow_mut().push(SpotBalance {
            asset: "USDT".into(),
            free: dec(amount),
            locked: Decimal::ZERO,
        });
        self
    }

    pub fn last_submitted(&self) -> OrderRequest {
        self.submitted.borrow().last().cloned().expect("no order submitted")
    }
}

impl ExchangeGateway for FakeGateway {
    fn futures_balances(&self) -> Result<Vec<FuturesBalance>> {
        pop_error(&self.balance_errors)?;
        Ok(self.futures_balances.borrow().clone())
    }

    fn spot_balance(&self, asset: &str) -> Result<Option<SpotBalance>> {
        Ok(self.spot_balances.borrow().iter().find(|b| b.asset == asset).cloned())
    }

    fn transfer(&self, asset: &str, amount: Decimal, direction: TransferType) -> Result<u64> {
        self.transfers.borrow_mut().push((asset.to_string(), amount, direction));
        let mut balances = self.futures_balances.borrow_mut();
        if let Some(b) = balances.iter_mut().find(|b| b.asset == asset) {
            b.balance += amount;
        }
        Ok(77)
    }

    fn ticker_price(&self, symbol: &str) -> Result<TickerPrice> {
        self.prices
            .borrow()
            .iter()
            .find(|p| p.symbol == symbol)
            .cloned()
            .ok_or_else(|| api_error(-1121, "Invalid symbol."))
    }

    fn exchange_info(&self) -> Result<ExchangeInfo> {
        pop_error(&self.exchange_info_errors)?;
        Ok(ExchangeInfo { symbols: self.symbols.borrow().clone() })
    }

    fn position_mode(&self) -> Result<PositionMode> {
        pop_error(&self.mode_errors)?;
        Ok(self.mode.get().unwrap_or(PositionMode::OneWay))
    }

    fn set_position_mode(&self, mode: PositionMode) -> Result<()> {
        self.set_mode_calls.borrow_mut().push(mode);
        pop_error(&self.set_mode_errors)?;
        self.mode.set(Some(mode));
        Ok(())
    }

    fn create_order(&self, request: &OrderRequest) -> Result<FuturesOrder> {
        self.order_attempts.set(self.order_attempts.get() + 1);
        pop_error(&self.order_errors)?;
        self.submitted.borrow_mut().push(request.clone());

        let order_id = self.next_order_id.get();
        self.next_order_id.set(order_id + 1);
        let order = FuturesOrder {
            order_id,
            symbol: request.symbol.clone(),
            status: "NEW".into(),
            order_type: request.order_type.as_str().into(),
            side: request.side,
            price: request.price.unwrap_or_default(),
            stop_price: request.stop_price.unwrap_or_default(),
            orig_qty: request.quantity,
            executed_qty: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            position_side: request.position_side,
        };

        if request.order_type == OrderType::Market {
            let filled = self.positions_after_fill.take();
            self.positions.borrow_mut().extend(filled);
        } else if self.list_submitted.get() {
            self.open_orders.borrow_mut().push(order.clone());
        }
        Ok(order)
    }

    fn open_orders(&self, symbol: &str) -> Result<Vec<FuturesOrder>> {
        pop_error(&self.open_orders_errors)?;
        Ok(self.open_orders.borrow().iter().filter(|o| o.symbol == symbol).cloned().collect())
    }

    fn order_status(&self, symbol: &str, order_id: u64) -> Result<FuturesOrder> {
        self.order_status_calls.set(self.order_status_calls.get() + 1);
        Ok(FuturesOrder {
            order_id,
            symbol: symbol.to_string(),
            status: "EXPIRED".into(),
            order_type: "MARKET".into(),
            side: Side::Buy,
            price: Decimal::ZERO,
            stop_price: Decimal::ZERO,
            orig_qty: Decimal::ZERO,
            executed_qty: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            position_side: None,
        })
    }

    fn positions(&self, symbol: Option<&str>) -> Result<Vec<Position>> {
        pop_error(&self.positions_errors)?;
        if self.positions_fail_after_order.get() && !self.submitted.borrow().is_empty() {
            return Err(api_error(-1001, "Internal error"));
        }
        Ok(self
            .positions
            .borrow()
            .iter()
            .filter(|p| symbol.map_or(true, |s| p.symbol == s))
            .cloned()
            .collect())
    }
}
