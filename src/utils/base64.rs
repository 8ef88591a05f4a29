use base64::{engine::general_purpose, Engine as _};

/// Encodes a string to standard Base64.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Encodes a string to URL-safe Base64 without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(input)
}

/// Decodes Base64 in any of the dialects seen in share links: standard or
/// URL-safe alphabet, padded or unpadded.
///
/// Returns `None` when the input fits none of them. Decoded bytes that are
/// not valid UTF-8 are replaced lossily, matching how link payloads are
/// treated everywhere else.
pub fn loose_base64_decode(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let engines: [&general_purpose::GeneralPurpose; 4] = [
        &general_purpose::STANDARD,
        &general_purpose::STANDARD_NO_PAD,
        &general_purpose::URL_SAFE,
        &general_purpose::URL_SAFE_NO_PAD,
    ];
    for engine in engines {
        if let Ok(bytes) = engine.decode(trimmed) {
            return Some(String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    None
}
