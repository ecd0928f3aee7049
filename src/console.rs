use crate::defines::{QUOTE_ASSET, TESTNET_FAUCET_URL};
use crate::error::{BotError, Result};
use crate::gateway::ExchangeGateway;
use crate::types::*;
use crate::util::parse_positive_decimal;
use crate::workflow::OrderWorkflow;

use regex::Regex;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Placed,
    Halted,
}

/// Options for one session, taken from the command line.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub auto_transfer: bool,
    pub max_retries: u32,
    pub use_testnet: bool,
}

/// What the user asked for, already parsed.
struct OrderIntent {
    choice: MenuChoice,
    symbol: String,
    side: Side,
    quantity: Decimal,
    market_price: Decimal,
}

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{5,20}$").expect("symbol pattern is valid"))
}

pub fn validate_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol_pattern().is_match(&symbol) {
        Ok(symbol)
    } else {
        Err(BotError::InvalidInput(format!("'{}' is not a valid futures symbol", raw.trim())))
    }
}

/// Prompts the user and prints results. Reads from any `BufRead` and writes
/// to any `Write` so sessions can be scripted.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Console<R, W> {
        Console { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(BotError::InvalidInput("input closed before an answer was given".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Run one session: wallet checks, order prompts, placement and summary.
    /// Bad user input ends the session with `Outcome::Halted`; only console
    /// I/O failures come back as errors.
    pub fn run<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>, opts: &SessionOptions) -> Result<Outcome> {
        match self.session(workflow, opts) {
            Err(BotError::InvalidInput(msg)) => {
                warn!(%msg, "session stopped on invalid input");
                self.say(&msg)?;
                Ok(Outcome::Halted)
            }
            other => other,
        }
    }

    fn session<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>, opts: &SessionOptions) -> Result<Outcome> {
        if opts.auto_transfer {
            match workflow.prepare_futures_account() {
                Ok(Some(amount)) => self.say(&format!("\nTransferred {amount} {QUOTE_ASSET} from spot to futures"))?,
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "error preparing futures account");
                    self.say(&format!("\nCould not prepare futures account: {e}"))?;
                }
            }
        }

        if opts.use_testnet {
            self.say("\nChecking test balance...")?;
            if !self.ensure_test_balance(workflow)? {
                self.say("Failed to verify test balance. Please make sure you have test assets.")?;
                return Ok(Outcome::Halted);
            }
            self.say("\nTESTNET MODE: All trades will use test money, not real funds.")?;
        }
        let balance = match workflow.futures_balance(QUOTE_ASSET) {
            Ok(balance) => balance,
            Err(e) => {
                error!(error = %e, "error checking futures balance");
                Decimal::ZERO
            }
        };
        self.say(&format!("\nCurrent futures account balance: {balance} {QUOTE_ASSET}"))?;
        if balance <= Decimal::ZERO {
            self.say("Insufficient futures balance. Please transfer funds to futures account.")?;
            return Ok(Outcome::Halted);
        }

        let intent = match self.collect_intent(workflow)? {
            Some(intent) => intent,
            None => return Ok(Outcome::Halted),
        };
        self.place(workflow, opts, intent)
    }

    /// Walk the user through the testnet faucet when the wallet is below the
    /// test minimum. `false` means there is still no USDT to trade with.
    fn ensure_test_balance<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>) -> Result<bool> {
        match workflow.test_balance_status() {
            Ok(TestBalanceStatus::Sufficient(_)) => return Ok(true),
            Ok(TestBalanceStatus::Low(_)) => {}
            Err(e) => {
                error!(error = %e, "error checking test balance");
                return Ok(false);
            }
        }

        self.say("\nIMPORTANT: Please follow these steps to get test assets:")?;
        self.say(&format!("1. Go to {TESTNET_FAUCET_URL}"))?;
        self.say("2. Click on 'Get Assets' button in the top-right")?;
        self.say("3. Wait a few seconds for the test assets to be credited")?;
        self.ask("\nPress Enter after you've gotten test assets...")?;

        match workflow.test_balance_status() {
            Ok(TestBalanceStatus::Sufficient(balance)) | Ok(TestBalanceStatus::Low(Some(balance))) => {
                info!(%balance, "new test balance");
                Ok(true)
            }
            Ok(TestBalanceStatus::Low(None)) => Ok(false),
            Err(e) => {
                error!(error = %e, "error getting test assets");
                Ok(false)
            }
        }
    }

    fn collect_intent<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>) -> Result<Option<OrderIntent>> {
        self.say("\n1. Market Order\n2. Limit Order\n3. Stop-Limit Order")?;
        let choice: MenuChoice = self.ask("Choose order type: ")?.parse()?;

        let symbol = validate_symbol(&self.ask("Enter symbol (e.g., BTCUSDT): ")?)?;
        let market_price = match workflow.market_price(&symbol) {
            Ok(price) => price,
            Err(e) => {
                error!(%symbol, error = %e, "error getting market price");
                self.say(&format!("Could not get current price for {symbol}"))?;
                return Ok(None);
            }
        };
        self.say(&format!("\nCurrent {symbol} price: {market_price}"))?;

        let side: Side = self.ask("\nEnter side (BUY/SELL): ")?.parse()?;
        let quantity = parse_positive_decimal("quantity", &self.ask("Enter quantity: ")?)?;

        Ok(Some(OrderIntent { choice, symbol, side, quantity, market_price }))
    }

    fn place<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>, opts: &SessionOptions, intent: OrderIntent) -> Result<Outcome> {
        let OrderIntent { choice, symbol, side, quantity, market_price } = intent;

        let result = match choice {
            MenuChoice::Market => {
                self.say(&format!("\nPlacing market order at current price: {market_price}"))?;
                workflow.place_market_order(&symbol, side, quantity)
            }
            MenuChoice::Limit => {
                self.say(&format!("\nCurrent market price: {market_price}"))?;
                let price = parse_positive_decimal("limit price", &self.ask("Enter limit price: ")?)?;
                workflow.place_limit_order(&symbol, side, quantity, price, opts.max_retries)
            }
            MenuChoice::StopLimit => {
                self.say(&format!("\nCurrent market price: {market_price}"))?;
                let price = parse_positive_decimal("limit price", &self.ask("Enter limit price: ")?)?;
                let stop_price = parse_positive_decimal("stop price", &self.ask("Enter stop price: ")?)?;
                workflow.place_stop_order(&symbol, side, quantity, price, stop_price, opts.max_retries)
            }
        };

        match result {
            Ok(order) => {
                info!(order_id = order.order_id, %symbol, "order placed");
                self.say("\nOrder placed successfully!")?;
                match choice {
                    MenuChoice::Market => self.show_position(workflow, &symbol)?,
                    MenuChoice::Limit | MenuChoice::StopLimit => self.show_open_orders(workflow, &symbol)?,
                }
                Ok(Outcome::Placed)
            }
            Err(e) => {
                error!(%symbol, error = %e, "order failed");
                self.say(&format!("\nOrder failed: {e}"))?;
                Ok(Outcome::Halted)
            }
        }
    }

    fn show_position<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>, symbol: &str) -> Result<()> {
        match workflow.active_positions(symbol) {
            Ok(positions) => {
                if let Some(pos) = positions.first() {
                    self.say("\nPosition opened:")?;
                    self.say(&format!("Amount: {}", pos.position_amt))?;
                    self.say(&format!("Entry Price: {}", pos.entry_price))?;
                    self.say(&format!("Unrealized PnL: {}", pos.unrealized_profit))?;
                }
            }
            Err(e) => warn!(symbol, error = %e, "could not fetch positions for summary"),
        }
        Ok(())
    }

    fn show_open_orders<G: ExchangeGateway>(&mut self, workflow: &OrderWorkflow<G>, symbol: &str) -> Result<()> {
        match workflow.open_orders(symbol) {
            Ok(orders) if !orders.is_empty() => {
                self.say("\nOpen orders:")?;
                for order in orders {
                    self.say(&format!("Order ID: {}", order.order_id))?;
                    self.say(&format!("Type: {}", order.order_type))?;
                    self.say(&format!("Side: {}", order.side))?;
                    self.say(&format!("Price: {}", order.price))?;
                    self.say(&format!("Quantity: {}", order.orig_qty))?;
                }
            }
            Ok(_) => {}
            Err(e) => warn!(symbol, error = %e, "could not fetch open orders for summary"),
        }
        Ok(())
    }
}
