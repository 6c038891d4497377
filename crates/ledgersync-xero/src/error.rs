//! Error types for the Xero ledger client.

use thiserror::Error;

/// Maximum length of a raw response body carried into an error message.
const BODY_TRUNCATE: usize = 200;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Xero API rejected the request.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Parsed validation message, or the truncated raw body.
        message: String,
    },

    /// Token vault failure while building the client.
    #[error("Token vault error: {0}")]
    Vault(#[from] ledgersync_vault::VaultError),

    /// A response was missing an expected field.
    #[error("Unexpected Xero response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Translate an error response into a [`LedgerError::Api`].
///
/// Xero validation failures arrive as
/// `{"Elements":[{"ValidationErrors":[{"Message":"..."}]}]}`; when that
/// envelope is present the messages are joined, otherwise the error falls
/// back to `HTTP <code>: <truncated body>`.
#[must_use]
pub fn parse_api_error(status: u16, body: &str) -> LedgerError {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let mut messages = Vec::new();

        if let Some(elements) = value.get("Elements").and_then(|e| e.as_array()) {
            for element in elements {
                if let Some(errors) = element.get("ValidationErrors").and_then(|v| v.as_array()) {
                    for err in errors {
                        if let Some(msg) = err.get("Message").and_then(|m| m.as_str()) {
                            messages.push(msg.to_string());
                        }
                    }
                }
            }
        }

        if messages.is_empty() {
            if let Some(msg) = value.get("Message").and_then(|m| m.as_str()) {
                messages.push(msg.to_string());
            }
        }

        if !messages.is_empty() {
            return LedgerError::Api {
                status,
                message: messages.join("; "),
            };
        }
    }

    let truncated: String = body.chars().take(BODY_TRUNCATE).collect();
    LedgerError::Api {
        status,
        message: format!("HTTP {status}: {truncated}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validation_envelope() {
        let body = r#"{
            "Type": "ValidationException",
            "Elements": [{
                "ValidationErrors": [
                    {"Message": "Account code '999' is not valid"},
                    {"Message": "The TaxType field is mandatory"}
                ]
            }]
        }"#;

        let err = parse_api_error(400, body);
        let LedgerError::Api { status, message } = err else {
            panic!("expected Api error");
        };
        assert_eq!(status, 400);
        assert_eq!(
            message,
            "Account code '999' is not valid; The TaxType field is mandatory"
        );
    }

    #[test]
    fn test_parse_top_level_message() {
        let err = parse_api_error(401, r#"{"Message": "TokenExpired"}"#);
        let LedgerError::Api { message, .. } = err else {
            panic!("expected Api error");
        };
        assert_eq!(message, "TokenExpired");
    }

    #[test]
    fn test_fallback_to_truncated_body() {
        let long_body = "x".repeat(500);
        let err = parse_api_error(502, &long_body);
        let LedgerError::Api { status, message } = err else {
            panic!("expected Api error");
        };
        assert_eq!(status, 502);
        assert!(message.starts_with("HTTP 502: "));
        assert!(message.len() <= "HTTP 502: ".len() + BODY_TRUNCATE);
    }
}
