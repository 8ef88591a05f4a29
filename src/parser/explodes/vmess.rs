use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::DecodeError;
use crate::models::VmessProxy;
use crate::utils::base64::loose_base64_decode;

/// JSON keys lifted into named fields; everything else lands in `extra`.
const KNOWN_KEYS: &[&str] = &[
    "v", "ps", "add", "port", "id", "aid", "scy", "net", "type", "host", "path", "tls", "sni",
    "alpn", "fp",
];

/// Reads a JSON field that different emitters write as either a string or a
/// number.
fn str_or_num(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a VMess link: `vmess://base64(json)`.
pub fn decode_vmess(link: &str) -> Result<VmessProxy, DecodeError> {
    let rest = link
        .strip_prefix("vmess://")
        .ok_or_else(|| DecodeError::UnparseableUri(link.to_string()))?;
    let decoded = loose_base64_decode(rest)
        .ok_or_else(|| DecodeError::MalformedPayload("vmess body is not base64".to_string()))?;
    let json: Value = serde_json::from_str(&decoded)
        .map_err(|e| DecodeError::MalformedPayload(format!("vmess body: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| DecodeError::MalformedPayload("vmess body is not an object".to_string()))?;

    let version: u64 = obj
        .get("v")
        .and_then(str_or_num)
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    let server = obj
        .get("add")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingMandatoryField("add"))?
        .to_string();
    let port_raw = obj
        .get("port")
        .and_then(str_or_num)
        .ok_or(DecodeError::MissingMandatoryField("port"))?;
    let port: u16 = port_raw
        .parse()
        .map_err(|_| DecodeError::InvalidPort(port_raw.clone()))?;
    if port == 0 {
        return Err(DecodeError::InvalidPort("0".to_string()));
    }
    let uuid = obj
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingMandatoryField("id"))?
        .to_string();
    let alter_id: u16 = obj
        .get("aid")
        .and_then(str_or_num)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let security = obj
        .get("scy")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("auto")
        .to_string();
    let network = obj
        .get("net")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("tcp")
        .to_string();
    let header_type = obj
        .get("type")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let mut host = obj
        .get("host")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let mut path = obj
        .get("path")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let tls = obj
        .get("tls")
        .and_then(Value::as_str)
        .map(|s| s == "tls" || s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let sni = obj
        .get("sni")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let alpn: Vec<String> = obj
        .get("alpn")
        .and_then(Value::as_str)
        .map(|s| {
            s.split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let fingerprint = obj
        .get("fp")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    // v1 bodies pack "host;path" into the host field
    if version < 2 {
        if let Some(h) = host.clone() {
            if let Some((head, tail)) = h.split_once(';') {
                host = Some(head.to_string()).filter(|s| !s.is_empty());
                path = Some(tail.to_string()).filter(|s| !s.is_empty());
            }
        }
    }

    let name = obj
        .get("ps")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("{} ({})", server, port));

    let mut extra = BTreeMap::new();
    for (key, value) in obj {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            if let Some(v) = str_or_num(value) {
                extra.insert(key.clone(), v);
            }
        }
    }

    Ok(VmessProxy {
        name,
        server,
        port,
        uuid,
        alter_id,
        security,
        network,
        header_type,
        host,
        path,
        tls,
        sni,
        alpn,
        fingerprint,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    fn make_vmess(body: &str) -> String {
        format!("vmess://{}", base64_encode(body))
    }

    #[test]
    fn test_decode_vmess_basic() {
        let link = make_vmess(
            r#"{"v":"2","ps":"My VMess","add":"example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","type":"none","host":"cdn.example.com","path":"/ws","tls":"tls"}"#,
        );
        let proxy = decode_vmess(&link).unwrap();
        assert_eq!(proxy.name, "My VMess");
        assert_eq!(proxy.server, "example.com");
        assert_eq!(proxy.port, 443);
        assert_eq!(proxy.uuid, "b831381d-6324-4d53-ad4f-8cda48b30811");
        assert_eq!(proxy.network, "ws");
        assert_eq!(proxy.host.as_deref(), Some("cdn.example.com"));
        assert_eq!(proxy.path.as_deref(), Some("/ws"));
        assert!(proxy.tls);
    }

    #[test]
    fn test_decode_vmess_numeric_port_and_aid() {
        let link = make_vmess(r#"{"ps":"n","add":"h.example","port":8080,"id":"uuid-1","aid":2}"#);
        let proxy = decode_vmess(&link).unwrap();
        assert_eq!(proxy.port, 8080);
        assert_eq!(proxy.alter_id, 2);
        assert_eq!(proxy.security, "auto");
        assert_eq!(proxy.network, "tcp");
    }

    #[test]
    fn test_decode_vmess_v1_host_semicolon_path() {
        let link = make_vmess(
            r#"{"v":"1","ps":"n","add":"h.example","port":80,"id":"uuid-1","host":"cdn.example.com;/path"}"#,
        );
        let proxy = decode_vmess(&link).unwrap();
        assert_eq!(proxy.host.as_deref(), Some("cdn.example.com"));
        assert_eq!(proxy.path.as_deref(), Some("/path"));
    }

    #[test]
    fn test_decode_vmess_unknown_keys_preserved() {
        let link =
            make_vmess(r#"{"ps":"n","add":"h.example","port":80,"id":"uuid-1","custom":"x"}"#);
        let proxy = decode_vmess(&link).unwrap();
        assert_eq!(proxy.extra.get("custom").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_decode_vmess_bad_base64() {
        assert!(matches!(
            decode_vmess("vmess://@@@"),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_vmess_bad_json() {
        let link = make_vmess("{not json");
        assert!(matches!(
            decode_vmess(&link),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_vmess_missing_port() {
        let link = make_vmess(r#"{"ps":"n","add":"h.example","id":"uuid-1"}"#);
        assert_eq!(
            decode_vmess(&link),
            Err(DecodeError::MissingMandatoryField("port"))
        );
    }
}
