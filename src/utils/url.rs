//! Percent encoding/decoding helpers.

/// Percent-encodes a string.
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Percent-decodes a string, falling back to the raw input when decoding
/// fails.
///
/// Share links frequently carry remarks with stray `%` characters; the
/// fallback keeps those readable instead of failing the whole decode.
pub fn url_decode(input: &str) -> String {
    match urlencoding::decode(input) {
        Ok(cow) => cow.into_owned(),
        Err(_) => {
            log::debug!("percent-decoding failed, keeping raw text: {}", input);
            input.to_string()
        }
    }
}
