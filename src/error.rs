use thiserror::Error;

use crate::defines::API_CODE_NO_NEED_TO_CHANGE_POSITION_SIDE;

/// Every failure that can surface from the gateway, the order workflow or the
/// console driver.
#[derive(Error, Debug)]
pub enum BotError {
    /// Connection, TLS or timeout failure inside the HTTP client
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] isahc::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Exchange rejected the request with its own error payload
    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// Non-success HTTP status without a parsable error payload
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Position mode could not be read; order placement must not go ahead.
    #[error("Could not read position mode: {0}")]
    PositionModeLookup(#[source] Box<BotError>),

    #[error("Gave up after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<BotError>,
    },
}

impl BotError {
    /// Build an error from a non-success HTTP response, preferring the
    /// exchange's `{"code": .., "msg": ..}` payload when present.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ApiErrorBody {
            code: i64,
            msg: String,
        }

        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(e) => BotError::Api { code: e.code, message: e.msg },
            Err(_) => BotError::HttpStatus { status, body: body.to_string() },
        }
    }

    /// Exchange reports the requested position mode is already active.
    pub fn is_no_change(&self) -> bool {
        matches!(self, BotError::Api { code, .. } if *code == API_CODE_NO_NEED_TO_CHANGE_POSITION_SIDE)
    }

    /// Errors that abort an order call immediately instead of being retried.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, BotError::PositionModeLookup(_))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_parses_api_payload() {
        let err = BotError::from_response(400, r#"{"code":-4059,"msg":"No need to change position side."}"#);
        match err {
            BotError::Api { code, ref message } => {
                assert_eq!(code, -4059);
                assert_eq!(message, "No need to change position side.");
            }
            _ => panic!("Expected Api error variant"),
        }
        assert!(err.is_no_change());
    }

    #[test]
    fn test_from_response_falls_back_to_status() {
        let err = BotError::from_response(502, "<html>bad gateway</html>");
        assert!(matches!(err, BotError::HttpStatus { status: 502, .. }));
        assert!(!err.is_no_change());
    }

    #[test]
    fn test_fatal_precondition() {
        let inner = BotError::Api { code: -2015, message: "Invalid API-key".into() };
        assert!(BotError::PositionModeLookup(Box::new(inner)).is_fatal_precondition());
        assert!(!BotError::Config("missing".into()).is_fatal_precondition());
    }
}
