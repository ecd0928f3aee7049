use crate::defines::*;
use crate::error::Result;
use crate::gateway::ExchangeGateway;
use crate::types::*;
use crate::util::pause;
use crate::workflow::OrderWorkflow;

use rust_decimal::Decimal;
use tracing::info;

/// Wallet checks done before any order is placed.
impl<G: ExchangeGateway> OrderWorkflow<G> {
    /// Futures wallet balance of `asset`, zero when the wallet has no entry.
    pub fn futures_balance(&self, asset: &str) -> Result<Decimal> {
        let balances = self.gateway.futures_balances()?;
        Ok(balances
            .into_iter()
            .find(|b| b.asset == asset)
            .map(|b| b.balance)
            .unwrap_or_default())
    }

    pub fn test_balance_status(&self) -> Result<TestBalanceStatus> {
        let balances = self.gateway.futures_balances()?;
        let usdt = balances.into_iter().find(|b| b.asset == QUOTE_ASSET).map(|b| b.balance);

        Ok(match usdt {
            Some(balance) if balance >= Decimal::from(MIN_TEST_BALANCE) => {
                info!(%balance, "current test balance");
                TestBalanceStatus::Sufficient(balance)
            }
            other => {
                info!("insufficient test balance");
                TestBalanceStatus::Low(other)
            }
        })
    }

    /// Top up the USDT futures wallet from spot when futures runs low and
    /// spot can spare it. Returns the amount moved, if any.
    pub fn prepare_futures_account(&self) -> Result<Option<Decimal>> {
        let spot = match self.gateway.spot_balance(QUOTE_ASSET)? {
            Some(b) => b.free,
            None => return Ok(None),
        };
        info!(balance = %spot, "spot USDT balance");

        let futures = match self.gateway.futures_balances()?.into_iter().find(|b| b.asset == QUOTE_ASSET) {
            Some(b) => b.balance,
            None => return Ok(None),
        };
        info!(balance = %futures, "futures USDT balance");

        let threshold = Decimal::from(LOW_FUTURES_BALANCE);
        if futures >= threshold || spot <= threshold {
            return Ok(None);
        }

        let amount = (spot - Decimal::from(SPOT_RESERVE)).min(Decimal::from(MAX_AUTO_TRANSFER));
        info!(%amount, "transferring USDT to futures account");
        let tran_id = self.gateway.transfer(QUOTE_ASSET, amount, TransferType::SpotToFutures)?;
        info!(tran_id, "transfer submitted");

        pause(self.timing.transfer_settle);
        Ok(Some(amount))
    }

    pub fn market_price(&self, symbol: &str) -> Result<Decimal> {
        Ok(self.gateway.ticker_price(symbol)?.price)
    }

    /// Nonzero positions on `symbol`.
    pub fn active_positions(&self, symbol: &str) -> Result<Vec<Position>> {
        Ok(self
            .gateway
            .positions(Some(symbol))?
            .into_iter()
            .filter(|p| p.is_active())
            .collect())
    }

    pub fn open_orders(&self, symbol: &str) -> Result<Vec<FuturesOrder>> {
        self.gateway.open_orders(symbol)
    }
}
