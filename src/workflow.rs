use crate::defines::{LOT_SIZE_FILTER, PRICE_FILTER};
use crate::error::{BotError, Result};
use crate::gateway::ExchangeGateway;
use crate::types::*;
use crate::util::{decimal_places, pause, poll_until, precision_from_step, round_to_precision};

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Reconciles position mode, normalizes numbers to the symbol's precision,
/// submits orders and checks they took effect.
///
/// The gateway is owned for the lifetime of the workflow and every call runs
/// to completion before the next one starts.
pub struct OrderWorkflow<G: ExchangeGateway> {
    pub(crate) gateway: G,
    pub(crate) timing: WorkflowTiming,
}

impl<G: ExchangeGateway> OrderWorkflow<G> {
    pub fn new(gateway: G) -> OrderWorkflow<G> {
        OrderWorkflow::with_timing(gateway, WorkflowTiming::default())
    }

    pub fn with_timing(gateway: G, timing: WorkflowTiming) -> OrderWorkflow<G> {
        OrderWorkflow { gateway, timing }
    }

    /// Switch the account to hedge mode when no position is open.
    ///
    /// Failing to read the current mode is fatal and comes back as
    /// `BotError::PositionModeLookup`. A failed switch is only logged. With
    /// active positions the mode is left as is. Returns the mode orders
    /// should be built for.
    pub fn resolve_position_mode(&self) -> Result<PositionMode> {
        let current = match self.gateway.position_mode() {
            Ok(mode) => mode,
            Err(e) => {
                error!(error = %e, "error getting position mode");
                return Err(BotError::PositionModeLookup(Box::new(e)));
            }
        };
        info!(mode = %current, "current position mode");

        let positions = self.gateway.positions(None)?;
        let active = positions.iter().filter(|p| p.is_active()).count();
        if active > 0 {
            info!(active, "active positions exist, keeping current position mode");
            return Ok(current);
        }

        match self.gateway.set_position_mode(PositionMode::Hedge) {
            Ok(()) => {
                info!("hedge mode enabled");
                Ok(PositionMode::Hedge)
            }
            Err(e) if e.is_no_change() => {
                debug!("hedge mode already enabled");
                Ok(PositionMode::Hedge)
            }
            Err(e) => {
                warn!(error = %e, "could not change to hedge mode");
                Ok(current)
            }
        }
    }

    /// Price and quantity decimals for `symbol`, `None` when the symbol is
    /// unknown or exchange info can't be fetched. A missing filter counts
    /// as 0 decimals.
    pub fn resolve_precision(&self, symbol: &str) -> Option<SymbolPrecision> {
        let info = match self.gateway.exchange_info() {
            Ok(info) => info,
            Err(e) => {
                error!(symbol, error = %e, "error getting symbol precision");
                return None;
            }
        };

        let symbol_info = match info.symbols.iter().find(|s| s.symbol == symbol) {
            Some(s) => s,
            None => {
                warn!(symbol, "symbol not listed in exchange info, skipping rounding");
                return None;
            }
        };

        let mut precision = SymbolPrecision { price: 0, quantity: 0 };
        for filter in &symbol_info.filters {
            match filter.filter_type.as_str() {
                PRICE_FILTER => {
                    if let Some(p) = filter.tick_size.as_deref().and_then(precision_from_step) {
                        precision.price = p;
                    }
                }
                LOT_SIZE_FILTER => {
                    if let Some(p) = filter.step_size.as_deref().and_then(precision_from_step) {
                        precision.quantity = p;
                    }
                }
                _ => {}
            }
        }
        debug!(symbol, price = precision.price, quantity = precision.quantity, "resolved precision");
        Some(precision)
    }

    /// Place a market order and look for the resulting position.
    ///
    /// A missing position after the poll window is only reported, along with
    /// the order's status.
    pub fn place_market_order(&self, symbol: &str, side: Side, quantity: Decimal) -> Result<FuturesOrder> {
        let mode = self.resolve_position_mode()?;

        let quantity = match self.resolve_precision(symbol) {
            Some(p) => round_to_precision(quantity, p.quantity),
            None => quantity,
        };

        let request = OrderRequest::market(symbol, side, quantity).with_position_side(position_side_for(mode, side));

        let order = self.gateway.create_order(&request).map_err(|e| {
            error!(symbol, error = %e, "error placing market order");
            e
        })?;
        info!(order_id = order.order_id, symbol, %side, %quantity, status = %order.status, "market order placed");

        pause(self.timing.market_settle);
        match self.wait_for_position(symbol) {
            Ok(Some(position)) => {
                info!(
                    symbol,
                    amount = %position.position_amt,
                    entry_price = %position.entry_price,
                    "position verified"
                );
            }
            Ok(None) => {
                warn!(order_id = order.order_id, "order placed but position not found, checking order status");
                match self.gateway.order_status(symbol, order.order_id) {
                    Ok(status) => info!(order_id = status.order_id, status = %status.status, executed = %status.executed_qty, "order status"),
                    Err(e) => warn!(order_id = order.order_id, error = %e, "could not fetch order status"),
                }
            }
            Err(e) => warn!(symbol, error = %e, "could not verify position"),
        }
        Ok(order)
    }

    /// Place a GTC limit order, retrying the whole attempt up to
    /// `max_retries` times.
    pub fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        max_retries: u32,
    ) -> Result<FuturesOrder> {
        self.with_retries("limit", max_retries, || {
            let mode = self.resolve_position_mode()?;

            let (price, quantity) = match self.resolve_precision(symbol) {
                Some(p) => (round_to_precision(price, p.price), round_to_precision(quantity, p.quantity)),
                None => (price, quantity),
            };

            let request = OrderRequest::limit(symbol, side, quantity, price).with_position_side(position_side_for(mode, side));

            let order = self.gateway.create_order(&request)?;
            info!(order_id = order.order_id, symbol, %side, %quantity, %price, "limit order placed");

            pause(self.timing.limit_settle);
            self.confirm_open_order(&order)?;
            Ok(order)
        })
    }

    /// Place a GTC stop-market order carrying both `price` and `stop_price`.
    /// Same retry shape as [`Self::place_limit_order`].
    ///
    /// Unlike the limit path, prices go out exactly as given; a warning is
    /// logged when they carry more decimals than the symbol's tick allows.
    pub fn place_stop_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
        max_retries: u32,
    ) -> Result<FuturesOrder> {
        self.with_retries("stop-limit", max_retries, || {
            let mode = self.resolve_position_mode()?;
            self.flag_unrounded_prices(symbol, price, stop_price);

            let request = OrderRequest::stop_market(symbol, side, quantity, price, stop_price)
                .with_position_side(position_side_for(mode, side));

            let order = self.gateway.create_order(&request)?;
            info!(order_id = order.order_id, symbol, %side, %quantity, %price, %stop_price, "stop-limit order placed");

            pause(self.timing.limit_settle);
            self.confirm_open_order(&order)?;
            Ok(order)
        })
    }

    fn with_retries<F>(&self, label: &str, max_retries: u32, mut attempt: F) -> Result<FuturesOrder>
    where
        F: FnMut() -> Result<FuturesOrder>,
    {
        if max_retries == 0 {
            return Err(BotError::InvalidInput("max retries must be at least 1".into()));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt() {
                Ok(order) => return Ok(order),
                Err(e) if e.is_fatal_precondition() => return Err(e),
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "{label} order attempt failed");
                    if attempts >= max_retries {
                        error!(attempts, "max retries reached, could not place {label} order");
                        return Err(BotError::RetriesExhausted { attempts, last: Box::new(e) });
                    }
                    pause(self.timing.retry_delay);
                }
            }
        }
    }

    /// Look for `order` among the symbol's open orders. Not finding it is
    /// logged, not an error; the exchange may still be propagating it.
    fn confirm_open_order(&self, order: &FuturesOrder) -> Result<bool> {
        let found = poll_until(self.timing.poll_interval, self.timing.poll_timeout, || {
            let open = self.gateway.open_orders(&order.symbol)?;
            Ok(open.into_iter().find(|o| o.order_id == order.order_id))
        })?;

        match found {
            Some(open) => {
                info!(order_id = open.order_id, status = %open.status, "order verified in open orders");
                Ok(true)
            }
            None => {
                warn!(order_id = order.order_id, "order placed but not found in open orders");
                Ok(false)
            }
        }
    }

    fn wait_for_position(&self, symbol: &str) -> Result<Option<Position>> {
        poll_until(self.timing.poll_interval, self.timing.poll_timeout, || {
            let positions = self.gateway.positions(Some(symbol))?;
            Ok(positions.into_iter().find(|p| p.is_active()))
        })
    }

    // TODO: round stop prices like the limit path once it is confirmed the
    // exchange rejects unrounded stop prices on every symbol.
    fn flag_unrounded_prices(&self, symbol: &str, price: Decimal, stop_price: Decimal) {
        if let Some(precision) = self.resolve_precision(symbol) {
            if decimal_places(price) > precision.price || decimal_places(stop_price) > precision.price {
                warn!(
                    symbol,
                    %price,
                    %stop_price,
                    tick_decimals = precision.price,
                    "stop order prices exceed tick precision and are sent unrounded"
                );
            }
        }
    }
}

/// Hedge mode needs an explicit side for the position being opened.
fn position_side_for(mode: PositionMode, side: Side) -> Option<PositionSide> {
    match mode {
        PositionMode::Hedge => Some(side.opening_position_side()),
        PositionMode::OneWay => None,
    }
}
