/// Futures REST base used unless `--mainnet` or an env override is given
pub const FUTURES_TESTNET_URL: &str = "https://testnet.binancefuture.com";
pub const FUTURES_MAINNET_URL: &str = "https://fapi.binance.com";
pub const SPOT_TESTNET_URL: &str = "https://testnet.binance.vision";
pub const SPOT_MAINNET_URL: &str = "https://api.binance.com";

/// Page where testnet USDT can be claimed with the "Get Assets" button
pub const TESTNET_FAUCET_URL: &str = "https://testnet.binancefuture.com/en/futures/BTCUSDT";

// Futures endpoints
pub const EP_FUTURES_BALANCE: &str = "/fapi/v2/balance";
pub const EP_TICKER_PRICE: &str = "/fapi/v1/ticker/price";
pub const EP_EXCHANGE_INFO: &str = "/fapi/v1/exchangeInfo";
pub const EP_POSITION_MODE: &str = "/fapi/v1/positionSide/dual";
pub const EP_ORDER: &str = "/fapi/v1/order";
pub const EP_OPEN_ORDERS: &str = "/fapi/v1/openOrders";
pub const EP_POSITION_RISK: &str = "/fapi/v2/positionRisk";

// Spot endpoints
pub const EP_SPOT_ACCOUNT: &str = "/api/v3/account";
pub const EP_FUTURES_TRANSFER: &str = "/sapi/v1/futures/transfer";

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
pub const RECV_WINDOW_MS: u64 = 5000;
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// "No need to change position side."
pub const API_CODE_NO_NEED_TO_CHANGE_POSITION_SIDE: i64 = -4059;

pub const PRICE_FILTER: &str = "PRICE_FILTER";
pub const LOT_SIZE_FILTER: &str = "LOT_SIZE";

pub const QUOTE_ASSET: &str = "USDT";

/// Below this futures balance the user is asked to claim testnet assets
pub const MIN_TEST_BALANCE: u32 = 100;
/// Spot→futures top-up kicks in when futures holds less than this
pub const LOW_FUTURES_BALANCE: u32 = 10;
/// Upper bound of a single automatic top-up
pub const MAX_AUTO_TRANSFER: u32 = 10;
/// Amount always left behind on spot during a top-up
pub const SPOT_RESERVE: u32 = 1;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

// Timings, in milliseconds
pub const DEFAULT_MARKET_SETTLE_MS: u64 = 2000;
pub const DEFAULT_LIMIT_SETTLE_MS: u64 = 1000;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 5000;
pub const TRANSFER_SETTLE_MS: u64 = 1000;
