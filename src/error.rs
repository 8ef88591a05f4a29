//! Decode error types shared by every scheme codec.

use thiserror::Error;

/// Typed failure produced by link decoding.
///
/// All variants are plain data so callers can branch on the kind and decide
/// fallback behavior (try WireGuard text, try Clash YAML, give up).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input is not a syntactically valid URI where one was expected.
    #[error("not a valid URI: {0}")]
    UnparseableUri(String),

    /// The scheme token is not in the supported table. Classification still
    /// succeeds (`ProxyType::Unknown`); only full decoding declines.
    #[error("unrecognized scheme: {0}")]
    UnrecognizedScheme(String),

    /// Base64/JSON/INI content under a recognized scheme failed to parse.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Host, port, or a protocol-mandatory key is absent after the
    /// structural parse succeeded.
    #[error("missing mandatory field: {0}")]
    MissingMandatoryField(&'static str),

    /// Port present but non-numeric or outside 1-65535 where no scheme
    /// default applies.
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// Input exceeds the size bound enforced before any parsing starts.
    #[error("input too large: {0} bytes")]
    InputTooLarge(usize),
}
