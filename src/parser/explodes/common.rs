//! Helpers shared by the scheme decoders.

use std::collections::BTreeMap;

use url::Url;

use crate::error::DecodeError;
use crate::utils::url::url_decode;

/// Parses a link as a URL, mapping syntax failures to `UnparseableUri`.
pub(crate) fn parse_url(link: &str) -> Result<Url, DecodeError> {
    Url::parse(link).map_err(|e| DecodeError::UnparseableUri(e.to_string()))
}

/// Canonical host and port of a parsed URL.
///
/// IPv6 brackets are stripped so the same literal hashes identically no
/// matter which format produced it. Port 0 is rejected.
pub(crate) fn host_port(url: &Url) -> Result<(String, u16), DecodeError> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(DecodeError::MissingMandatoryField("host"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = url.port().ok_or(DecodeError::MissingMandatoryField("port"))?;
    if port == 0 {
        return Err(DecodeError::InvalidPort("0".to_string()));
    }
    Ok((host.to_string(), port))
}

/// Splits `host:port` on the last colon so IPv6 literals survive, stripping
/// brackets from the host.
pub(crate) fn split_host_port(input: &str) -> Result<(String, u16), DecodeError> {
    let (host, port) = input
        .rsplit_once(':')
        .ok_or(DecodeError::MissingMandatoryField("port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(DecodeError::MissingMandatoryField("host"));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| DecodeError::InvalidPort(port.to_string()))?;
    if port == 0 {
        return Err(DecodeError::InvalidPort("0".to_string()));
    }
    Ok((host.to_string(), port))
}

/// Flat query map with percent-decoded keys and values; repeated keys keep
/// the last occurrence.
pub(crate) fn query_map(url: &Url) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params.insert(key.into_owned(), value.into_owned());
    }
    params
}

/// Removes `key` from the query map, returning it only when non-empty.
/// Whatever is left in the map after all recognized keys are taken becomes
/// the proxy's `extra` overflow.
pub(crate) fn take(params: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    match params.remove(key) {
        Some(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

pub(crate) fn truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub(crate) fn take_bool(params: &mut BTreeMap<String, String>, key: &str) -> Option<bool> {
    take(params, key).map(|v| truthy(&v))
}

/// Comma-separated ALPN list.
pub(crate) fn take_alpn(params: &mut BTreeMap<String, String>) -> Vec<String> {
    match take(params, "alpn") {
        Some(value) => value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Display name from the URL fragment, falling back to `host (port)` when
/// the link carries no remark.
pub(crate) fn remark(url: &Url, server: &str, port: u16) -> String {
    match url.fragment() {
        Some(fragment) if !fragment.is_empty() => url_decode(fragment),
        _ => format!("{} ({})", server, port),
    }
}
