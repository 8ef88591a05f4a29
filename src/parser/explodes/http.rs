use crate::error::DecodeError;
use crate::models::HttpProxy;
use crate::utils::url::url_decode;

use super::common::{parse_url, query_map, remark};

/// Decode an HTTP(S) proxy link: `http://[user:pass@]host[:port]#name`.
///
/// The only scheme family with a conventional port default (80/443) when
/// the link carries none.
pub fn decode_http(link: &str) -> Result<HttpProxy, DecodeError> {
    let url = parse_url(link)?;
    let tls = url.scheme().eq_ignore_ascii_case("https");
    let server = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(DecodeError::MissingMandatoryField("host"))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    let port = url
        .port_or_known_default()
        .unwrap_or(if tls { 443 } else { 80 });
    if port == 0 {
        return Err(DecodeError::InvalidPort("0".to_string()));
    }
    let username = Some(url_decode(url.username())).filter(|u| !u.is_empty());
    let password = url.password().map(url_decode).filter(|p| !p.is_empty());
    let name = remark(&url, &server, port);

    Ok(HttpProxy {
        name,
        server,
        port,
        username,
        password,
        tls,
        extra: query_map(&url),
    })
}
