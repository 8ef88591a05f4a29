use crate::error::DecodeError;
use crate::models::HysteriaProxy;

use super::common::{host_port, parse_url, query_map, remark, take, take_alpn, take_bool};

/// Decode a Hysteria v1 link:
/// `hysteria://host:port?auth=&protocol=&peer=&upmbps=&downmbps=&obfs=#name`.
/// The `hy://` alias routes here as well.
pub fn decode_hysteria(link: &str) -> Result<HysteriaProxy, DecodeError> {
    let url = parse_url(link)?;
    let (server, port) = host_port(&url)?;

    let mut params = query_map(&url);
    let auth = take(&mut params, "auth");
    let protocol = take(&mut params, "protocol");
    let peer = take(&mut params, "peer");
    let up_mbps = take(&mut params, "upmbps").and_then(|v| v.parse().ok());
    let down_mbps = take(&mut params, "downmbps").and_then(|v| v.parse().ok());
    let obfs = take(&mut params, "obfs");
    let obfs_param = take(&mut params, "obfsParam");
    let alpn = take_alpn(&mut params);
    let insecure = take_bool(&mut params, "insecure");
    let name = remark(&url, &server, port);

    Ok(HysteriaProxy {
        name,
        server,
        port,
        auth,
        protocol,
        peer,
        up_mbps,
        down_mbps,
        obfs,
        obfs_param,
        alpn,
        insecure,
        extra: params,
    })
}
