use std::collections::BTreeMap;

use crate::error::DecodeError;
use crate::models::ShadowsocksRProxy;
use crate::utils::base64::loose_base64_decode;

/// Decode a ShadowsocksR link.
///
/// The whole payload after the scheme is base64:
/// `host:port:protocol:method:obfs:base64(password)/?obfsparam=&protoparam=&remarks=&group=`
/// with the four query params themselves base64-encoded.
pub fn decode_ssr(link: &str) -> Result<ShadowsocksRProxy, DecodeError> {
    let rest = link
        .strip_prefix("ssr://")
        .ok_or_else(|| DecodeError::UnparseableUri(link.to_string()))?;
    let decoded = loose_base64_decode(rest).ok_or_else(|| {
        DecodeError::MalformedPayload("shadowsocksr payload is not base64".to_string())
    })?;

    let (main, query) = match decoded.find("/?") {
        Some(pos) => (&decoded[..pos], Some(&decoded[pos + 2..])),
        None => (decoded.as_str(), None),
    };

    // Split from the right so an IPv6 host keeps its colons
    let mut fields: Vec<&str> = main.rsplitn(6, ':').collect();
    if fields.len() < 6 {
        return Err(DecodeError::MalformedPayload(
            "shadowsocksr payload has too few fields".to_string(),
        ));
    }
    fields.reverse();
    let server = fields[0].trim_start_matches('[').trim_end_matches(']');
    if server.is_empty() {
        return Err(DecodeError::MissingMandatoryField("host"));
    }
    let port: u16 = fields[1]
        .parse()
        .map_err(|_| DecodeError::InvalidPort(fields[1].to_string()))?;
    if port == 0 {
        return Err(DecodeError::InvalidPort("0".to_string()));
    }
    let protocol = fields[2].to_string();
    let method = fields[3].to_string();
    let obfs = fields[4].to_string();
    let password = match loose_base64_decode(fields[5]) {
        Some(password) => password,
        None => {
            log::debug!("shadowsocksr password segment is not base64, keeping it empty");
            String::new()
        }
    };

    let mut obfs_param = None;
    let mut protocol_param = None;
    let mut group = None;
    let mut name = String::new();
    let mut extra = BTreeMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let decoded_value = loose_base64_decode(&value).unwrap_or_default();
            match key.as_ref() {
                "obfsparam" => obfs_param = Some(decoded_value).filter(|v| !v.is_empty()),
                "protoparam" => protocol_param = Some(decoded_value).filter(|v| !v.is_empty()),
                "remarks" => name = decoded_value,
                "group" => group = Some(decoded_value).filter(|v| !v.is_empty()),
                _ => {
                    extra.insert(key.into_owned(), value.into_owned());
                }
            }
        }
    }

    if name.is_empty() {
        name = format!("{} ({})", server, port);
    }

    Ok(ShadowsocksRProxy {
        name,
        server: server.to_string(),
        port,
        protocol,
        method,
        obfs,
        password,
        obfs_param,
        protocol_param,
        group,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::url_safe_base64_encode;

    fn make_ssr(main: &str, query: &str) -> String {
        let payload = if query.is_empty() {
            main.to_string()
        } else {
            format!("{}/?{}", main, query)
        };
        format!("ssr://{}", url_safe_base64_encode(&payload))
    }

    #[test]
    fn test_decode_ssr_basic() {
        let password = url_safe_base64_encode("secret");
        let link = make_ssr(
            &format!("example.com:8388:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:{password}"),
            "",
        );
        let proxy = decode_ssr(&link).unwrap();
        assert_eq!(proxy.server, "example.com");
        assert_eq!(proxy.port, 8388);
        assert_eq!(proxy.protocol, "auth_aes128_md5");
        assert_eq!(proxy.method, "aes-256-cfb");
        assert_eq!(proxy.obfs, "tls1.2_ticket_auth");
        assert_eq!(proxy.password, "secret");
        assert_eq!(proxy.name, "example.com (8388)");
    }

    #[test]
    fn test_decode_ssr_with_params() {
        let password = url_safe_base64_encode("secret");
        let query = format!(
            "obfsparam={}&protoparam={}&remarks={}&group={}",
            url_safe_base64_encode("obfs.example.com"),
            url_safe_base64_encode("32"),
            url_safe_base64_encode("My SSR"),
            url_safe_base64_encode("Default"),
        );
        let link = make_ssr(
            &format!("1.2.3.4:443:origin:rc4-md5:plain:{password}"),
            &query,
        );
        let proxy = decode_ssr(&link).unwrap();
        assert_eq!(proxy.obfs_param.as_deref(), Some("obfs.example.com"));
        assert_eq!(proxy.protocol_param.as_deref(), Some("32"));
        assert_eq!(proxy.name, "My SSR");
        assert_eq!(proxy.group.as_deref(), Some("Default"));
    }

    #[test]
    fn test_decode_ssr_ipv6_host() {
        let password = url_safe_base64_encode("pw");
        let link = make_ssr(&format!("[2001:db8::1]:443:origin:rc4-md5:plain:{password}"), "");
        let proxy = decode_ssr(&link).unwrap();
        assert_eq!(proxy.server, "2001:db8::1");
        assert_eq!(proxy.port, 443);
    }

    #[test]
    fn test_decode_ssr_garbled_password_absorbed() {
        let link = make_ssr("example.com:8388:origin:rc4-md5:plain:!!not-base64!!", "");
        let proxy = decode_ssr(&link).unwrap();
        assert_eq!(proxy.password, "");
    }

    #[test]
    fn test_decode_ssr_not_base64() {
        assert!(matches!(
            decode_ssr("ssr://!!!not-base64!!!"),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_ssr_too_few_fields() {
        let link = format!("ssr://{}", url_safe_base64_encode("example.com:8388"));
        assert!(matches!(
            decode_ssr(&link),
            Err(DecodeError::MalformedPayload(_))
        ));
    }
}
