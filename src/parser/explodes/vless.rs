use crate::error::DecodeError;
use crate::models::VlessProxy;
use crate::utils::url::url_decode;

use super::common::{host_port, parse_url, query_map, remark, take, take_alpn};

/// Decode a VLESS link:
/// `vless://uuid@host:port?type=&security=&sni=&pbk=&sid=&flow=#name`.
pub fn decode_vless(link: &str) -> Result<VlessProxy, DecodeError> {
    let url = parse_url(link)?;
    let (server, port) = host_port(&url)?;
    let uuid = url_decode(url.username());
    if uuid.is_empty() {
        return Err(DecodeError::MissingMandatoryField("uuid"));
    }

    let mut params = query_map(&url);
    let flow = take(&mut params, "flow");
    let encryption = take(&mut params, "encryption");
    let network = take(&mut params, "type");
    let security = take(&mut params, "security");
    let sni = take(&mut params, "sni");
    let alpn = take_alpn(&mut params);
    let fingerprint = take(&mut params, "fp");
    let public_key = take(&mut params, "pbk");
    let short_id = take(&mut params, "sid");
    let host = take(&mut params, "host");
    let path = take(&mut params, "path");
    let service_name = take(&mut params, "serviceName");
    let header_type = take(&mut params, "headerType");
    let name = remark(&url, &server, port);

    Ok(VlessProxy {
        name,
        server,
        port,
        uuid,
        flow,
        encryption,
        network,
        security,
        sni,
        alpn,
        fingerprint,
        public_key,
        short_id,
        host,
        path,
        service_name,
        header_type,
        extra: params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vless_reality() {
        let link = "vless://b831381d-6324-4d53-ad4f-8cda48b30811@1.2.3.4:443?type=tcp&security=reality&sni=learn.microsoft.com&pbk=PUBKEY&sid=0123&flow=xtls-rprx-vision&fp=chrome#Reality%20Node";
        let proxy = decode_vless(link).unwrap();
        assert_eq!(proxy.server, "1.2.3.4");
        assert_eq!(proxy.port, 443);
        assert_eq!(proxy.uuid, "b831381d-6324-4d53-ad4f-8cda48b30811");
        assert_eq!(proxy.security.as_deref(), Some("reality"));
        assert_eq!(proxy.sni.as_deref(), Some("learn.microsoft.com"));
        assert_eq!(proxy.public_key.as_deref(), Some("PUBKEY"));
        assert_eq!(proxy.short_id.as_deref(), Some("0123"));
        assert_eq!(proxy.flow.as_deref(), Some("xtls-rprx-vision"));
        assert_eq!(proxy.fingerprint.as_deref(), Some("chrome"));
        assert_eq!(proxy.name, "Reality Node");
    }

    #[test]
    fn test_decode_vless_ws() {
        let link =
            "vless://uuid-1@example.com:8443?type=ws&host=cdn.example.com&path=%2Fws&security=tls";
        let proxy = decode_vless(link).unwrap();
        assert_eq!(proxy.network.as_deref(), Some("ws"));
        assert_eq!(proxy.host.as_deref(), Some("cdn.example.com"));
        assert_eq!(proxy.path.as_deref(), Some("/ws"));
        assert_eq!(proxy.name, "example.com (8443)");
    }

    #[test]
    fn test_decode_vless_missing_uuid() {
        assert_eq!(
            decode_vless("vless://example.com:443?type=tcp"),
            Err(DecodeError::MissingMandatoryField("uuid"))
        );
    }

    #[test]
    fn test_decode_vless_missing_port() {
        assert_eq!(
            decode_vless("vless://uuid-1@example.com?type=tcp"),
            Err(DecodeError::MissingMandatoryField("port"))
        );
    }

    #[test]
    fn test_decode_vless_unknown_params_preserved() {
        let link = "vless://uuid-1@example.com:443?type=tcp&spiderX=%2F&unknownKey=1";
        let proxy = decode_vless(link).unwrap();
        assert_eq!(proxy.extra.get("spiderX").map(String::as_str), Some("/"));
        assert_eq!(proxy.extra.get("unknownKey").map(String::as_str), Some("1"));
    }
}
