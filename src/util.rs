use crate::error::{BotError, Result};

use ring::hmac;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Number of decimal places implied by a tick or step size such as
/// `"0.00100000"`.
///
/// The count is the distance from the decimal point to the last nonzero
/// digit, so padding zeros are ignored and integral steps (`"1"`,
/// `"10.0"`) give 0. Returns `None` if `step` is not a number.
pub fn precision_from_step(step: &str) -> Option<u32> {
    let step = step.trim();
    Decimal::from_str(step).ok()?;

    match step.find('.') {
        Some(dot) => Some(step[dot + 1..].trim_end_matches('0').len() as u32),
        None => Some(0),
    }
}

/// Round `value` to at most `precision` decimal places, ties to even.
/// Values already within the precision come back unchanged.
pub fn round_to_precision(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven)
}

/// Number of decimal places actually used by `value`.
pub fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// HMAC-SHA256 of `payload` keyed with the API secret, hex encoded.
pub fn sign(secret: &str, payload: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, payload.as_bytes()).as_ref())
}

/// Milliseconds since unix epoch from the local clock.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Form-encode `params` into a query string, keeping their order.
pub fn build_query(params: &[(&str, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Call `check` until it yields a value or `timeout` has passed, sleeping
/// `interval` in between. `check` always runs at least once. Errors from
/// `check` end the poll.
pub fn poll_until<T, F>(interval: Duration, timeout: Duration, mut check: F) -> Result<Option<T>>
where
    F: FnMut() -> Result<Option<T>>,
{
    let start = Instant::now();
    let mut rounds = 0u32;
    loop {
        rounds += 1;
        if let Some(found) = check()? {
            debug!(rounds, "poll condition met");
            return Ok(Some(found));
        }
        if start.elapsed() >= timeout {
            debug!(rounds, "poll window closed");
            return Ok(None);
        }
        pause(interval);
    }
}

pub fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

/// Parse a positive decimal typed by the user.
pub fn parse_positive_decimal(field: &str, raw: &str) -> Result<Decimal> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| BotError::InvalidInput(format!("{field} must be a number, got '{}'", raw.trim())))?;
    if value <= Decimal::ZERO {
        return Err(BotError::InvalidInput(format!("{field} must be greater than zero")));
    }
    Ok(value)
}

pub fn measure_start(start: &mut Instant) {
    *start = Instant::now();
}

pub fn measure_end(start: &Instant) {
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "run finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[rstest]
    #[case("1", 0)]
    #[case("1.00000000", 0)]
    #[case("10", 0)]
    #[case("0.1", 1)]
    #[case("0.01", 2)]
    #[case("0.001", 3)]
    #[case("0.00010000", 4)]
    #[case("0.00000001", 8)]
    #[case("0.50", 1)]
    fn test_precision_from_step(#[case] step: &str, #[case] expected: u32) {
        assert_eq!(precision_from_step(step), Some(expected));
    }

    #[test]
    fn test_precision_from_step_rejects_garbage() {
        assert_eq!(precision_from_step("tick"), None);
        assert_eq!(precision_from_step(""), None);
    }

    #[test]
    fn test_precision_for_every_power_of_ten() {
        for n in 0..=12u32 {
            let step = Decimal::new(1, n).to_string();
            assert_eq!(precision_from_step(&step), Some(n), "step {step}");
        }
    }

    #[rstest]
    #[case("12345.678", 2, "12345.68")]
    #[case("0.12345", 3, "0.123")]
    #[case("0.0125", 3, "0.012")]
    #[case("0.0135", 3, "0.014")]
    #[case("7.9", 0, "8")]
    fn test_round_to_precision(#[case] value: &str, #[case] precision: u32, #[case] expected: &str) {
        let rounded = round_to_precision(dec(value), precision);
        assert_eq!(rounded, dec(expected));
        assert!(decimal_places(rounded) <= precision);
    }

    #[test]
    fn test_round_keeps_values_within_precision() {
        for raw in ["0.12", "0.123", "42", "1000.5"] {
            assert_eq!(round_to_precision(dec(raw), 3), dec(raw));
        }
    }

    #[test]
    fn test_sign_matches_binance_documentation() {
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign(secret, query),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_build_query_keeps_order_and_encodes() {
        let query = build_query(&[("symbol", "BTCUSDT".to_string()), ("note", "a b&c".to_string())]);
        assert_eq!(query, "symbol=BTCUSDT&note=a+b%26c");
    }

    #[test]
    fn test_poll_until_runs_once_with_zero_timeout() {
        let calls = Cell::new(0);
        let found: Option<u32> = poll_until(Duration::ZERO, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            Ok(None)
        })
        .unwrap();
        assert_eq!(found, None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_poll_until_stops_on_first_hit() {
        let calls = Cell::new(0);
        let found = poll_until(Duration::ZERO, Duration::from_secs(5), || {
            calls.set(calls.get() + 1);
            Ok(if calls.get() == 3 { Some("ready") } else { None })
        })
        .unwrap();
        assert_eq!(found, Some("ready"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_parse_positive_decimal() {
        assert_eq!(parse_positive_decimal("quantity", " 0.5 ").unwrap(), dec("0.5"));
        assert!(parse_positive_decimal("quantity", "0").is_err());
        assert!(parse_positive_decimal("price", "abc").is_err());
    }
}
