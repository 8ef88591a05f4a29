use crate::error::DecodeError;
use crate::models::TrojanProxy;
use crate::utils::url::url_decode;

use super::common::{host_port, parse_url, query_map, remark, take, take_alpn, take_bool};

/// Decode a Trojan link: `trojan://password@host:port?sni=#name`.
pub fn decode_trojan(link: &str) -> Result<TrojanProxy, DecodeError> {
    let url = parse_url(link)?;
    let (server, port) = host_port(&url)?;
    let password = url_decode(url.username());
    if password.is_empty() {
        return Err(DecodeError::MissingMandatoryField("password"));
    }

    let mut params = query_map(&url);
    let sni = take(&mut params, "sni").or_else(|| take(&mut params, "peer"));
    let network = take(&mut params, "type");
    let host = take(&mut params, "host");
    let path = take(&mut params, "path");
    let security = take(&mut params, "security");
    let alpn = take_alpn(&mut params);
    let fingerprint = take(&mut params, "fp");
    let allow_insecure = take_bool(&mut params, "allowInsecure");
    let name = remark(&url, &server, port);

    Ok(TrojanProxy {
        name,
        server,
        port,
        password,
        sni,
        network,
        host,
        path,
        security,
        alpn,
        fingerprint,
        allow_insecure,
        extra: params,
    })
}
