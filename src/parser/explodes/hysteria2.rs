use crate::error::DecodeError;
use crate::models::Hysteria2Proxy;
use crate::utils::url::url_decode;

use super::common::{host_port, parse_url, query_map, remark, take, take_bool};

/// Decode a Hysteria v2 link:
/// `hysteria2://password@host:port?sni=&obfs=&obfs-password=&insecure=#name`.
/// The `hy2://` alias routes here as well.
pub fn decode_hysteria2(link: &str) -> Result<Hysteria2Proxy, DecodeError> {
    let url = parse_url(link)?;
    let (server, port) = host_port(&url)?;
    let password = url_decode(url.username());
    if password.is_empty() {
        return Err(DecodeError::MissingMandatoryField("password"));
    }

    let mut params = query_map(&url);
    let sni = take(&mut params, "sni");
    let obfs = take(&mut params, "obfs");
    let obfs_password = take(&mut params, "obfs-password");
    let insecure = take_bool(&mut params, "insecure");
    let ports = take(&mut params, "ports");
    let name = remark(&url, &server, port);

    Ok(Hysteria2Proxy {
        name,
        server,
        port,
        password,
        sni,
        obfs,
        obfs_password,
        insecure,
        ports,
        extra: params,
    })
}
