//! Clash YAML adapter: parses a document with a `proxies` list into
//! structured entries and synthesizes the equivalent scheme URI for each,
//! so bulk imports re-enter the normal decode path.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::json;
use serde_yaml::Value;

use crate::error::DecodeError;
use crate::models::{ProxyType, WireGuardProxy};
use crate::parser::explodes::wireguard::encode_wireguard_url;
use crate::utils::base64::{base64_encode, url_safe_base64_encode};
use crate::utils::url::url_encode;

/// One element of a Clash `proxies` list. Recognized scalar fields are
/// lifted; every other key stays in `options` for the per-type link
/// synthesis to pick over.
#[derive(Debug, Clone, Deserialize)]
pub struct ClashProxyEntry {
    #[serde(rename = "type")]
    pub proxy_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default, deserialize_with = "port_string_or_number")]
    pub port: Option<u16>,
    #[serde(flatten)]
    pub options: HashMap<String, Value>,
}

/// Clash emitters write ports as numbers or quoted strings; accept both.
fn port_string_or_number<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> Visitor<'de> for PortVisitor {
        type Value = Option<u16>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a port number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            u16::try_from(value)
                .map(Some)
                .map_err(|_| E::custom(format!("port out of range: {}", value)))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            u16::try_from(value)
                .map(Some)
                .map_err(|_| E::custom(format!("port out of range: {}", value)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("port is not numeric: {}", value)))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

#[derive(Debug, Deserialize)]
struct ClashDocument {
    proxies: Vec<Value>,
}

/// Result of parsing a Clash document: kept entries plus the count of
/// entries skipped because their `type` is unsupported or their shape does
/// not deserialize. Partial success is reported as counts, never as an
/// aggregate error.
#[derive(Debug, Default)]
pub struct ClashImport {
    pub entries: Vec<ClashProxyEntry>,
    pub skipped: usize,
}

/// Parse a Clash YAML document. A document without a `proxies` list is a
/// malformed payload; individual bad entries only bump `skipped`.
pub fn parse_clash_yaml(text: &str) -> Result<ClashImport, DecodeError> {
    let doc: ClashDocument = serde_yaml::from_str(text)
        .map_err(|e| DecodeError::MalformedPayload(format!("clash yaml: {}", e)))?;

    let mut import = ClashImport::default();
    for value in doc.proxies {
        let type_tag = value.get("type").and_then(Value::as_str).unwrap_or("");
        if ProxyType::from_scheme(type_tag) == ProxyType::Unknown {
            log::debug!("skipping clash proxy with unsupported type {:?}", type_tag);
            import.skipped += 1;
            continue;
        }
        match serde_yaml::from_value::<ClashProxyEntry>(value) {
            Ok(entry) => import.entries.push(entry),
            Err(e) => {
                log::warn!("skipping malformed clash proxy entry: {}", e);
                import.skipped += 1;
            }
        }
    }
    Ok(import)
}

impl ClashProxyEntry {
    fn opt_str(&self, key: &str) -> Option<String> {
        match self.options.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn opt_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }

    /// String list written either as a YAML sequence or a comma-joined
    /// scalar.
    fn opt_list(&self, key: &str) -> Vec<String> {
        match self.options.get(key) {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn nested_str(&self, outer: &str, key: &str) -> Option<String> {
        self.options
            .get(outer)?
            .get(key)?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Flattens the `plugin-opts` mapping onto the plugin name as
    /// `plugin;key=value;key=value`, the form the `plugin=` query value
    /// carries on the wire.
    fn plugin_with_opts(&self) -> Option<String> {
        let mut plugin = self.opt_str("plugin")?;
        if let Some(Value::Mapping(opts)) = self.options.get("plugin-opts") {
            for (key, value) in opts {
                let Some(key) = key.as_str() else { continue };
                let Some(value) = scalar_string(value) else { continue };
                plugin.push(';');
                plugin.push_str(key);
                plugin.push('=');
                plugin.push_str(&value);
            }
        }
        Some(plugin)
    }

    /// `ws-opts.headers.Host`, the transport host header Clash nests two
    /// levels deep.
    fn ws_host(&self) -> Option<String> {
        self.options
            .get("ws-opts")?
            .get("headers")?
            .get("Host")?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn host_for_link(server: &str) -> String {
    if server.contains(':') {
        format!("[{}]", server)
    } else {
        server.to_string()
    }
}

fn push_pair(query: &mut Vec<String>, key: &str, value: &str) {
    query.push(format!("{}={}", key, url_encode(value)));
}

fn assemble(scheme_part: String, query: Vec<String>, name: &str) -> String {
    let mut link = scheme_part;
    if !query.is_empty() {
        link.push('?');
        link.push_str(&query.join("&"));
    }
    if !name.is_empty() {
        link.push('#');
        link.push_str(&url_encode(name));
    }
    link
}

/// Synthesize the scheme URI equivalent to a Clash proxy entry, using the
/// same field mapping as the corresponding decoder. Returns `None` when a
/// mandatory field is missing; the caller counts the failure and keeps
/// going.
pub fn generate_proxy_link(entry: &ClashProxyEntry) -> Option<String> {
    let server = entry.server.as_deref().filter(|s| !s.is_empty())?;
    let port = entry.port.filter(|p| *p != 0)?;
    let host = host_for_link(server);
    let name = entry.name.clone().unwrap_or_default();

    match entry.proxy_type.as_str() {
        "ss" => {
            let cipher = entry.opt_str("cipher")?;
            let password = entry.opt_str("password")?;
            let userinfo = url_safe_base64_encode(&format!("{}:{}", cipher, password));
            let mut query = Vec::new();
            if let Some(plugin) = entry.plugin_with_opts() {
                push_pair(&mut query, "plugin", &plugin);
            }
            Some(assemble(
                format!("ss://{}@{}:{}", userinfo, host, port),
                query,
                &name,
            ))
        }
        "ssr" => {
            let cipher = entry.opt_str("cipher")?;
            let password = entry.opt_str("password")?;
            let protocol = entry.opt_str("protocol")?;
            let obfs = entry.opt_str("obfs")?;
            let mut payload = format!(
                "{}:{}:{}:{}:{}:{}",
                server,
                port,
                protocol,
                cipher,
                obfs,
                url_safe_base64_encode(&password)
            );
            let mut params = Vec::new();
            if let Some(v) = entry.opt_str("obfs-param") {
                params.push(format!("obfsparam={}", url_safe_base64_encode(&v)));
            }
            if let Some(v) = entry.opt_str("protocol-param") {
                params.push(format!("protoparam={}", url_safe_base64_encode(&v)));
            }
            if !name.is_empty() {
                params.push(format!("remarks={}", url_safe_base64_encode(&name)));
            }
            if !params.is_empty() {
                payload.push_str("/?");
                payload.push_str(&params.join("&"));
            }
            Some(format!("ssr://{}", url_safe_base64_encode(&payload)))
        }
        "vmess" => {
            let uuid = entry.opt_str("uuid")?;
            let tls = entry.opt_bool("tls").unwrap_or(false);
            let body = json!({
                "v": "2",
                "ps": name,
                "add": server,
                "port": port.to_string(),
                "id": uuid,
                "aid": entry.opt_str("alterId").unwrap_or_else(|| "0".to_string()),
                "scy": entry.opt_str("cipher").unwrap_or_else(|| "auto".to_string()),
                "net": entry.opt_str("network").unwrap_or_else(|| "tcp".to_string()),
                "type": "none",
                "host": entry.ws_host().unwrap_or_default(),
                "path": entry.nested_str("ws-opts", "path").unwrap_or_default(),
                "tls": if tls { "tls" } else { "" },
                "sni": entry.opt_str("servername").unwrap_or_default(),
            });
            Some(format!("vmess://{}", base64_encode(&body.to_string())))
        }
        "vless" => {
            let uuid = entry.opt_str("uuid")?;
            let mut query = Vec::new();
            push_pair(&mut query, "encryption", "none");
            if let Some(v) = entry.opt_str("network") {
                push_pair(&mut query, "type", &v);
            }
            if entry.nested_str("reality-opts", "public-key").is_some() {
                push_pair(&mut query, "security", "reality");
            } else if entry.opt_bool("tls").unwrap_or(false) {
                push_pair(&mut query, "security", "tls");
            }
            if let Some(v) = entry.opt_str("servername") {
                push_pair(&mut query, "sni", &v);
            }
            if let Some(v) = entry.nested_str("reality-opts", "public-key") {
                push_pair(&mut query, "pbk", &v);
            }
            if let Some(v) = entry.nested_str("reality-opts", "short-id") {
                push_pair(&mut query, "sid", &v);
            }
            if let Some(v) = entry.opt_str("flow") {
                push_pair(&mut query, "flow", &v);
            }
            if let Some(v) = entry.opt_str("client-fingerprint") {
                push_pair(&mut query, "fp", &v);
            }
            if let Some(v) = entry.ws_host() {
                push_pair(&mut query, "host", &v);
            }
            if let Some(v) = entry.nested_str("ws-opts", "path") {
                push_pair(&mut query, "path", &v);
            }
            if let Some(v) = entry.nested_str("grpc-opts", "grpc-service-name") {
                push_pair(&mut query, "serviceName", &v);
            }
            Some(assemble(
                format!("vless://{}@{}:{}", url_encode(&uuid), host, port),
                query,
                &name,
            ))
        }
        "trojan" => {
            let password = entry.opt_str("password")?;
            let mut query = Vec::new();
            if let Some(v) = entry.opt_str("sni") {
                push_pair(&mut query, "sni", &v);
            }
            if let Some(v) = entry.opt_str("network") {
                push_pair(&mut query, "type", &v);
            }
            if let Some(v) = entry.ws_host() {
                push_pair(&mut query, "host", &v);
            }
            if let Some(v) = entry.nested_str("ws-opts", "path") {
                push_pair(&mut query, "path", &v);
            }
            if entry.opt_bool("skip-cert-verify").unwrap_or(false) {
                push_pair(&mut query, "allowInsecure", "1");
            }
            Some(assemble(
                format!("trojan://{}@{}:{}", url_encode(&password), host, port),
                query,
                &name,
            ))
        }
        "hysteria" => {
            let mut query = Vec::new();
            if let Some(v) = entry.opt_str("auth-str").or_else(|| entry.opt_str("auth_str")) {
                push_pair(&mut query, "auth", &v);
            }
            if let Some(v) = entry.opt_str("protocol") {
                push_pair(&mut query, "protocol", &v);
            }
            if let Some(v) = entry.opt_str("sni") {
                push_pair(&mut query, "peer", &v);
            }
            if let Some(v) = entry.opt_str("up") {
                push_pair(&mut query, "upmbps", &v);
            }
            if let Some(v) = entry.opt_str("down") {
                push_pair(&mut query, "downmbps", &v);
            }
            if let Some(v) = entry.opt_str("obfs") {
                push_pair(&mut query, "obfs", &v);
            }
            let alpn = entry.opt_list("alpn");
            if !alpn.is_empty() {
                push_pair(&mut query, "alpn", &alpn.join(","));
            }
            if entry.opt_bool("skip-cert-verify").unwrap_or(false) {
                push_pair(&mut query, "insecure", "1");
            }
            Some(assemble(
                format!("hysteria://{}:{}", host, port),
                query,
                &name,
            ))
        }
        "hysteria2" => {
            let password = entry.opt_str("password")?;
            let mut query = Vec::new();
            if let Some(v) = entry.opt_str("sni") {
                push_pair(&mut query, "sni", &v);
            }
            if let Some(v) = entry.opt_str("obfs") {
                push_pair(&mut query, "obfs", &v);
            }
            if let Some(v) = entry.opt_str("obfs-password") {
                push_pair(&mut query, "obfs-password", &v);
            }
            if entry.opt_bool("skip-cert-verify").unwrap_or(false) {
                push_pair(&mut query, "insecure", "1");
            }
            if let Some(v) = entry.opt_str("ports") {
                push_pair(&mut query, "ports", &v);
            }
            Some(assemble(
                format!("hysteria2://{}@{}:{}", url_encode(&password), host, port),
                query,
                &name,
            ))
        }
        "tuic" => {
            let uuid = entry.opt_str("uuid")?;
            let userinfo = match entry.opt_str("password") {
                Some(password) => format!("{}:{}", url_encode(&uuid), url_encode(&password)),
                None => url_encode(&uuid),
            };
            let mut query = Vec::new();
            if let Some(v) = entry.opt_str("congestion-controller") {
                push_pair(&mut query, "congestion_control", &v);
            }
            if let Some(v) = entry.opt_str("udp-relay-mode") {
                push_pair(&mut query, "udp_relay_mode", &v);
            }
            let alpn = entry.opt_list("alpn");
            if !alpn.is_empty() {
                push_pair(&mut query, "alpn", &alpn.join(","));
            }
            if let Some(v) = entry.opt_str("sni") {
                push_pair(&mut query, "sni", &v);
            }
            if entry.opt_bool("disable-sni").unwrap_or(false) {
                push_pair(&mut query, "disable_sni", "1");
            }
            if entry.opt_bool("skip-cert-verify").unwrap_or(false) {
                push_pair(&mut query, "allow_insecure", "1");
            }
            Some(assemble(
                format!("tuic://{}@{}:{}", userinfo, host, port),
                query,
                &name,
            ))
        }
        "socks5" => {
            let userinfo = match (entry.opt_str("username"), entry.opt_str("password")) {
                (Some(user), Some(pass)) => {
                    format!("{}:{}@", url_encode(&user), url_encode(&pass))
                }
                (Some(user), None) => format!("{}@", url_encode(&user)),
                _ => String::new(),
            };
            Some(assemble(
                format!("socks5://{}{}:{}", userinfo, host, port),
                Vec::new(),
                &name,
            ))
        }
        "http" => {
            let scheme = if entry.opt_bool("tls").unwrap_or(false) {
                "https"
            } else {
                "http"
            };
            let userinfo = match (entry.opt_str("username"), entry.opt_str("password")) {
                (Some(user), Some(pass)) => {
                    format!("{}:{}@", url_encode(&user), url_encode(&pass))
                }
                (Some(user), None) => format!("{}@", url_encode(&user)),
                _ => String::new(),
            };
            Some(assemble(
                format!("{}://{}{}:{}", scheme, userinfo, host, port),
                Vec::new(),
                &name,
            ))
        }
        "anytls" => {
            let password = entry.opt_str("password")?;
            let mut query = Vec::new();
            if let Some(v) = entry.opt_str("sni") {
                push_pair(&mut query, "sni", &v);
            }
            if entry.opt_bool("skip-cert-verify").unwrap_or(false) {
                push_pair(&mut query, "insecure", "1");
            }
            Some(assemble(
                format!("anytls://{}@{}:{}", url_encode(&password), host, port),
                query,
                &name,
            ))
        }
        "wireguard" => {
            let mut address = Vec::new();
            if let Some(ip) = entry.opt_str("ip") {
                address.push(ip);
            }
            if let Some(ipv6) = entry.opt_str("ipv6") {
                address.push(ipv6);
            }
            let wg = WireGuardProxy {
                name,
                server: server.to_string(),
                port,
                private_key: entry.opt_str("private-key")?,
                public_key: entry.opt_str("public-key")?,
                pre_shared_key: entry.opt_str("pre-shared-key"),
                address,
                dns: entry.opt_list("dns"),
                allowed_ips: entry.opt_list("allowed-ips"),
                mtu: entry.opt_str("mtu").and_then(|v| v.parse().ok()),
                extra: Default::default(),
            };
            Some(encode_wireguard_url(&wg))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutputConfig, Proxy};
    use crate::parser::dispatch::decode;

    #[test]
    fn test_parse_clash_yaml_skips_unknown_types() {
        let yaml = r#"
proxies:
  - type: ss
    name: "Keep Me"
    server: example.com
    port: 8388
    cipher: aes-256-gcm
    password: password
  - type: unsupported-type
    name: "Skip Me"
    server: example.com
    port: 1
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        assert_eq!(import.entries.len(), 1);
        assert_eq!(import.skipped, 1);
        assert_eq!(import.entries[0].proxy_type, "ss");
    }

    #[test]
    fn test_parse_clash_yaml_string_port() {
        let yaml = r#"
proxies:
  - type: trojan
    name: t
    server: example.com
    port: "443"
    password: pw
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        assert_eq!(import.entries[0].port, Some(443));
    }

    #[test]
    fn test_parse_clash_yaml_without_proxies_key() {
        assert!(matches!(
            parse_clash_yaml("rules:\n  - MATCH,DIRECT\n"),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_generate_ss_link_decodes_back() {
        let yaml = r#"
proxies:
  - type: ss
    name: "My SS"
    server: example.com
    port: 8388
    cipher: aes-256-gcm
    password: password
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        let link = generate_proxy_link(&import.entries[0]).unwrap();
        let proxy = decode(&link, &OutputConfig::default()).unwrap();
        match proxy {
            Proxy::Shadowsocks(ss) => {
                assert_eq!(ss.server, "example.com");
                assert_eq!(ss.port, 8388);
                assert_eq!(ss.method, "aes-256-gcm");
                assert_eq!(ss.password, "password");
                assert_eq!(ss.name, "My SS");
            }
            other => panic!("expected shadowsocks, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_ss_link_carries_plugin_opts() {
        let yaml = r#"
proxies:
  - type: ss
    name: "Obfs Node"
    server: example.com
    port: 8388
    cipher: aes-256-gcm
    password: password
    plugin: obfs
    plugin-opts:
      mode: http
      host: cdn.example.com
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        let link = generate_proxy_link(&import.entries[0]).unwrap();
        let proxy = decode(&link, &OutputConfig::default()).unwrap();
        match proxy {
            Proxy::Shadowsocks(ss) => {
                assert_eq!(ss.plugin.as_deref(), Some("obfs"));
                assert_eq!(
                    ss.plugin_opts.as_deref(),
                    Some("mode=http;host=cdn.example.com")
                );
            }
            other => panic!("expected shadowsocks, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_vmess_link_decodes_back() {
        let yaml = r#"
proxies:
  - type: vmess
    name: "WS Node"
    server: example.com
    port: 443
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
    alterId: 0
    cipher: auto
    network: ws
    tls: true
    servername: sni.example.com
    ws-opts:
      path: /ws
      headers:
        Host: cdn.example.com
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        let link = generate_proxy_link(&import.entries[0]).unwrap();
        let proxy = decode(&link, &OutputConfig::default()).unwrap();
        match proxy {
            Proxy::VMess(vmess) => {
                assert_eq!(vmess.server, "example.com");
                assert_eq!(vmess.uuid, "b831381d-6324-4d53-ad4f-8cda48b30811");
                assert_eq!(vmess.network, "ws");
                assert!(vmess.tls);
                assert_eq!(vmess.host.as_deref(), Some("cdn.example.com"));
                assert_eq!(vmess.path.as_deref(), Some("/ws"));
                assert_eq!(vmess.sni.as_deref(), Some("sni.example.com"));
            }
            other => panic!("expected vmess, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_link_missing_mandatory_field() {
        let yaml = r#"
proxies:
  - type: ss
    name: "No Cipher"
    server: example.com
    port: 8388
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        assert_eq!(generate_proxy_link(&import.entries[0]), None);
    }

    #[test]
    fn test_generate_wireguard_link_roundtrip() {
        let yaml = r#"
proxies:
  - type: wireguard
    name: wg-node
    server: vpn.example.com
    port: 51820
    private-key: "priv="
    public-key: "pub="
    ip: 10.0.0.2/32
    dns: [1.1.1.1]
    allowed-ips: ["0.0.0.0/0"]
    mtu: 1420
"#;
        let import = parse_clash_yaml(yaml).unwrap();
        let link = generate_proxy_link(&import.entries[0]).unwrap();
        let proxy = decode(&link, &OutputConfig::default()).unwrap();
        match proxy {
            Proxy::WireGuard(wg) => {
                assert_eq!(wg.server, "vpn.example.com");
                assert_eq!(wg.port, 51820);
                assert_eq!(wg.private_key, "priv=");
                assert_eq!(wg.public_key, "pub=");
                assert_eq!(wg.address, vec!["10.0.0.2/32".to_string()]);
                assert_eq!(wg.mtu, Some(1420));
                assert_eq!(wg.name, "wg-node");
            }
            other => panic!("expected wireguard, got {:?}", other),
        }
    }
}
