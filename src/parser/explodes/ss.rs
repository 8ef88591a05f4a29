use std::collections::BTreeMap;

use crate::error::DecodeError;
use crate::models::ShadowsocksProxy;
use crate::utils::base64::loose_base64_decode;
use crate::utils::url::url_decode;

use super::common::split_host_port;

/// Decode a Shadowsocks link.
///
/// Accepts SIP002 (`ss://base64(method:password)@host:port`), the same
/// shape with plain percent-encoded credentials, and the legacy form where
/// the whole payload after the scheme is base64.
pub fn decode_ss(link: &str) -> Result<ShadowsocksProxy, DecodeError> {
    let rest = link
        .strip_prefix("ss://")
        .ok_or_else(|| DecodeError::UnparseableUri(link.to_string()))?;
    // Some emitters write "/?" before the query
    let mut body = rest.replace("/?", "?");

    let mut name = String::new();
    if let Some(pos) = body.find('#') {
        name = url_decode(&body[pos + 1..]);
        body.truncate(pos);
    }

    let mut extra = BTreeMap::new();
    let mut plugin = None;
    let mut plugin_opts = None;
    if let Some(pos) = body.find('?') {
        let query = body[pos + 1..].to_string();
        body.truncate(pos);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "plugin" {
                // "plugin-name;key=value;key=value"
                match value.split_once(';') {
                    Some((head, tail)) => {
                        plugin = Some(head.to_string());
                        plugin_opts = Some(tail.to_string());
                    }
                    None => plugin = Some(value.into_owned()),
                }
            } else {
                extra.insert(key.into_owned(), value.into_owned());
            }
        }
    }

    let (method, password, server, port) = match body.rsplit_once('@') {
        Some((userinfo, hostport)) => {
            // SIP002: user-info is base64(method:password), but plain
            // percent-encoded credentials also occur in the wild
            let secret = match loose_base64_decode(userinfo) {
                Some(decoded) if decoded.contains(':') => decoded,
                _ => url_decode(userinfo),
            };
            let (method, password) = secret
                .split_once(':')
                .ok_or(DecodeError::MissingMandatoryField("password"))?;
            let (server, port) = split_host_port(hostport)?;
            (method.to_string(), password.to_string(), server, port)
        }
        None => {
            // Legacy: the whole body is base64(method:password@host:port)
            let decoded = loose_base64_decode(&body).ok_or_else(|| {
                DecodeError::MalformedPayload("shadowsocks payload is not base64".to_string())
            })?;
            let (secret, hostport) = decoded
                .rsplit_once('@')
                .ok_or(DecodeError::MissingMandatoryField("server"))?;
            let (method, password) = secret
                .split_once(':')
                .ok_or(DecodeError::MissingMandatoryField("password"))?;
            let (server, port) = split_host_port(hostport)?;
            (method.to_string(), password.to_string(), server, port)
        }
    };

    if method.is_empty() {
        return Err(DecodeError::MissingMandatoryField("method"));
    }
    if name.is_empty() {
        name = format!("{} ({})", server, port);
    }

    Ok(ShadowsocksProxy {
        name,
        server,
        port,
        method,
        password,
        plugin,
        plugin_opts,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ss_sip002() {
        // base64("aes-256-gcm:pass")
        let proxy = decode_ss("ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#MyNode").unwrap();
        assert_eq!(proxy.server, "1.2.3.4");
        assert_eq!(proxy.port, 8388);
        assert_eq!(proxy.method, "aes-256-gcm");
        assert_eq!(proxy.password, "pass");
        assert_eq!(proxy.name, "MyNode");
    }

    #[test]
    fn test_decode_ss_legacy() {
        // base64("chacha20-ietf-poly1305:password@127.0.0.1:8080")
        let proxy =
            decode_ss("ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTpwYXNzd29yZEAxMjcuMC4wLjE6ODA4MA==")
                .unwrap();
        assert_eq!(proxy.server, "127.0.0.1");
        assert_eq!(proxy.port, 8080);
        assert_eq!(proxy.method, "chacha20-ietf-poly1305");
        assert_eq!(proxy.password, "password");
        assert_eq!(proxy.name, "127.0.0.1 (8080)");
    }

    #[test]
    fn test_decode_ss_plain_credentials() {
        let proxy = decode_ss("ss://aes-256-gcm:password123@example.com:8388").unwrap();
        assert_eq!(proxy.method, "aes-256-gcm");
        assert_eq!(proxy.password, "password123");
    }

    #[test]
    fn test_decode_ss_password_with_colon() {
        // base64("chacha20-ietf-poly1305:pass:word")
        let proxy =
            decode_ss("ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTpwYXNzOndvcmQ=@example.com:8388")
                .unwrap();
        assert_eq!(proxy.password, "pass:word");
    }

    #[test]
    fn test_decode_ss_plugin() {
        let proxy = decode_ss(
            "ss://YWVzLTI1Ni1nY206cGFzcw==@example.com:8388/?plugin=obfs-local%3Bobfs%3Dhttp%3Bobfs-host%3Dexample.com#Plugin",
        )
        .unwrap();
        assert_eq!(proxy.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(
            proxy.plugin_opts.as_deref(),
            Some("obfs=http;obfs-host=example.com")
        );
    }

    #[test]
    fn test_decode_ss_unknown_query_goes_to_extra() {
        let proxy = decode_ss("ss://YWVzLTI1Ni1nY206cGFzcw==@example.com:8388/?foo=bar").unwrap();
        assert_eq!(proxy.extra.get("foo").map(String::as_str), Some("bar"));
    }

    #[test]
    fn test_decode_ss_non_numeric_port() {
        assert_eq!(
            decode_ss("ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:abc"),
            Err(DecodeError::InvalidPort("abc".to_string()))
        );
    }

    #[test]
    fn test_decode_ss_ipv6() {
        let proxy = decode_ss("ss://YWVzLTI1Ni1nY206cGFzcw==@[2001:db8::1]:8388").unwrap();
        assert_eq!(proxy.server, "2001:db8::1");
        assert_eq!(proxy.port, 8388);
    }

    #[test]
    fn test_decode_ss_invalid_payload() {
        assert!(matches!(
            decode_ss("ss://@@@"),
            Err(DecodeError::MissingMandatoryField(_) | DecodeError::MalformedPayload(_))
        ));
    }
}
