//! Content fingerprinting for decoded proxies.
//!
//! Two links describing the same endpoint must hash identically no matter
//! how they were written: query order, hostname casing and the display name
//! never change the fingerprint. Each variant contributes a fixed, ordered
//! field list; cosmetic fields (`name`, the SSR `group`) and the `extra`
//! overflow map stay out of the payload.

use std::fmt;

use md5::{Digest, Md5};

use crate::models::Proxy;

/// Lower-case hex MD5 of a proxy's identity payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes the payload separator inside a field value so a `|` in a
/// credential cannot shift segment boundaries and collide two distinct
/// proxies.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

/// Accumulates the `|`-separated identity payload.
///
/// Absent optional fields serialize as the empty segment while present ones
/// carry a `=` marker, so `None` and `Some("")` stay distinguishable.
/// Values are separator-escaped before joining.
struct Payload {
    parts: Vec<String>,
}

impl Payload {
    fn new(proto: &str, server: &str, port: u16) -> Self {
        Payload {
            parts: vec![
                proto.to_string(),
                escape(&server.to_ascii_lowercase()),
                port.to_string(),
            ],
        }
    }

    fn field(&mut self, value: &str) {
        self.parts.push(escape(value));
    }

    fn opt(&mut self, value: Option<&str>) {
        self.parts.push(match value {
            Some(v) => format!("={}", escape(v)),
            None => String::new(),
        });
    }

    /// Hostname-ish optional field, folded to lower case.
    fn opt_host(&mut self, value: Option<&str>) {
        self.parts.push(match value {
            Some(v) => format!("={}", escape(&v.to_ascii_lowercase())),
            None => String::new(),
        });
    }

    fn flag(&mut self, value: bool) {
        self.parts.push(if value { "1" } else { "0" }.to_string());
    }

    fn opt_flag(&mut self, value: Option<bool>) {
        self.opt(value.map(|v| if v { "1" } else { "0" }));
    }

    fn opt_num(&mut self, value: Option<impl ToString>) {
        let rendered = value.map(|v| v.to_string());
        self.opt(rendered.as_deref());
    }

    fn list(&mut self, values: &[String]) {
        let escaped: Vec<String> = values.iter().map(|v| escape(v)).collect();
        self.parts.push(escaped.join(","));
    }

    fn digest(self) -> Fingerprint {
        let hash = Md5::digest(self.parts.join("|").as_bytes());
        let hex: String = hash.iter().map(|b| format!("{:02x}", b)).collect();
        Fingerprint(hex)
    }
}

/// Computes the content fingerprint of a decoded proxy.
///
/// Returns `None` for entries without a usable endpoint (empty server or
/// port zero), which keeps incomplete nodes out of dedup indexes instead
/// of colliding on a degenerate payload.
pub fn content_hash(proxy: &Proxy) -> Option<Fingerprint> {
    let server = proxy.server();
    let port = proxy.port();
    if server.is_empty() || port == 0 {
        return None;
    }

    let mut payload = Payload::new(proxy.proxy_type().as_str(), server, port);
    match proxy {
        Proxy::Shadowsocks(p) => {
            payload.field(&p.method);
            payload.field(&p.password);
            payload.opt(p.plugin.as_deref());
            payload.opt(p.plugin_opts.as_deref());
        }
        Proxy::ShadowsocksR(p) => {
            payload.field(&p.protocol);
            payload.field(&p.method);
            payload.field(&p.obfs);
            payload.field(&p.password);
            payload.opt(p.obfs_param.as_deref());
            payload.opt(p.protocol_param.as_deref());
        }
        Proxy::VMess(p) => {
            payload.field(&p.uuid);
            payload.field(&p.alter_id.to_string());
            payload.field(&p.security);
            payload.field(&p.network);
            payload.opt(p.header_type.as_deref());
            payload.opt_host(p.host.as_deref());
            payload.opt(p.path.as_deref());
            payload.flag(p.tls);
            payload.opt_host(p.sni.as_deref());
            payload.list(&p.alpn);
            payload.opt(p.fingerprint.as_deref());
        }
        Proxy::Vless(p) => {
            payload.field(&p.uuid);
            payload.opt(p.flow.as_deref());
            payload.opt(p.encryption.as_deref());
            payload.opt(p.network.as_deref());
            payload.opt(p.security.as_deref());
            payload.opt_host(p.sni.as_deref());
            payload.list(&p.alpn);
            payload.opt(p.fingerprint.as_deref());
            payload.opt(p.public_key.as_deref());
            payload.opt(p.short_id.as_deref());
            payload.opt_host(p.host.as_deref());
            payload.opt(p.path.as_deref());
            payload.opt(p.service_name.as_deref());
            payload.opt(p.header_type.as_deref());
        }
        Proxy::Trojan(p) => {
            payload.field(&p.password);
            payload.opt_host(p.sni.as_deref());
            payload.opt(p.network.as_deref());
            payload.opt_host(p.host.as_deref());
            payload.opt(p.path.as_deref());
            payload.opt(p.security.as_deref());
            payload.list(&p.alpn);
            payload.opt(p.fingerprint.as_deref());
            payload.opt_flag(p.allow_insecure);
        }
        Proxy::Hysteria(p) => {
            payload.opt(p.auth.as_deref());
            payload.opt(p.protocol.as_deref());
            payload.opt_host(p.peer.as_deref());
            payload.opt_num(p.up_mbps);
            payload.opt_num(p.down_mbps);
            payload.opt(p.obfs.as_deref());
            payload.opt(p.obfs_param.as_deref());
            payload.list(&p.alpn);
            payload.opt_flag(p.insecure);
        }
        Proxy::Hysteria2(p) => {
            payload.field(&p.password);
            payload.opt_host(p.sni.as_deref());
            payload.opt(p.obfs.as_deref());
            payload.opt(p.obfs_password.as_deref());
            payload.opt_flag(p.insecure);
            payload.opt(p.ports.as_deref());
        }
        Proxy::Tuic(p) => {
            payload.field(&p.uuid);
            payload.opt(p.password.as_deref());
            payload.opt(p.congestion_control.as_deref());
            payload.opt(p.udp_relay_mode.as_deref());
            payload.list(&p.alpn);
            payload.opt_host(p.sni.as_deref());
            payload.opt_flag(p.allow_insecure);
            payload.opt_flag(p.disable_sni);
        }
        Proxy::Socks5(p) => {
            payload.opt(p.username.as_deref());
            payload.opt(p.password.as_deref());
        }
        Proxy::Http(p) => {
            payload.opt(p.username.as_deref());
            payload.opt(p.password.as_deref());
            payload.flag(p.tls);
        }
        Proxy::AnyTls(p) => {
            payload.field(&p.password);
            payload.opt_host(p.sni.as_deref());
            payload.opt_flag(p.insecure);
        }
        Proxy::WireGuard(p) => {
            payload.field(&p.private_key);
            payload.field(&p.public_key);
            payload.opt(p.pre_shared_key.as_deref());
            payload.list(&p.address);
            payload.list(&p.dns);
            payload.list(&p.allowed_ips);
            payload.opt_num(p.mtu);
        }
    }
    Some(payload.digest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpProxy, ShadowsocksProxy, Socks5Proxy, VmessProxy};

    fn ss(name: &str, server: &str, password: &str) -> Proxy {
        Proxy::Shadowsocks(ShadowsocksProxy {
            name: name.to_string(),
            server: server.to_string(),
            port: 8388,
            method: "aes-256-gcm".to_string(),
            password: password.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_hash_ignores_name() {
        let a = content_hash(&ss("Node A", "example.com", "pw")).unwrap();
        let b = content_hash(&ss("Node B", "example.com", "pw")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_ignores_host_case() {
        let a = content_hash(&ss("n", "EXAMPLE.com", "pw")).unwrap();
        let b = content_hash(&ss("n", "example.com", "pw")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_separator_in_credentials_cannot_shift_fields() {
        let a = content_hash(&Proxy::Shadowsocks(ShadowsocksProxy {
            server: "example.com".to_string(),
            port: 8388,
            method: "aes".to_string(),
            password: "x|y".to_string(),
            ..Default::default()
        }))
        .unwrap();
        let b = content_hash(&Proxy::Shadowsocks(ShadowsocksProxy {
            server: "example.com".to_string(),
            port: 8388,
            method: "aes|x".to_string(),
            password: "y".to_string(),
            ..Default::default()
        }))
        .unwrap();
        assert_ne!(a, b, "different credentials must not collide");
    }

    #[test]
    fn test_hash_escape_character_in_credentials() {
        let a = content_hash(&ss("n", "example.com", "x\\|y")).unwrap();
        let b = content_hash(&ss("n", "example.com", "x\\")).unwrap();
        let c = content_hash(&ss("n", "example.com", "x|y")).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_sensitive_to_credentials() {
        let a = content_hash(&ss("n", "example.com", "pw1")).unwrap();
        let b = content_hash(&ss("n", "example.com", "pw2")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_ignores_extra_map() {
        let mut with_extra = ShadowsocksProxy {
            server: "example.com".to_string(),
            port: 8388,
            method: "aes-256-gcm".to_string(),
            password: "pw".to_string(),
            ..Default::default()
        };
        let bare = Proxy::Shadowsocks(with_extra.clone());
        with_extra
            .extra
            .insert("udp".to_string(), "true".to_string());
        assert_eq!(
            content_hash(&Proxy::Shadowsocks(with_extra)),
            content_hash(&bare)
        );
    }

    #[test]
    fn test_hash_none_vs_empty_username() {
        let none = Proxy::Socks5(Socks5Proxy {
            server: "example.com".to_string(),
            port: 1080,
            username: None,
            ..Default::default()
        });
        let empty = Proxy::Socks5(Socks5Proxy {
            server: "example.com".to_string(),
            port: 1080,
            username: Some(String::new()),
            ..Default::default()
        });
        assert_ne!(content_hash(&none), content_hash(&empty));
    }

    #[test]
    fn test_hash_http_vs_https() {
        let plain = Proxy::Http(HttpProxy {
            server: "example.com".to_string(),
            port: 8080,
            tls: false,
            ..Default::default()
        });
        let tls = Proxy::Http(HttpProxy {
            server: "example.com".to_string(),
            port: 8080,
            tls: true,
            ..Default::default()
        });
        assert_ne!(content_hash(&plain), content_hash(&tls));
    }

    #[test]
    fn test_hash_requires_endpoint() {
        let no_server = ss("n", "", "pw");
        assert_eq!(content_hash(&no_server), None);

        let no_port = Proxy::VMess(VmessProxy {
            server: "example.com".to_string(),
            port: 0,
            uuid: "u".to_string(),
            ..Default::default()
        });
        assert_eq!(content_hash(&no_port), None);
    }

    #[test]
    fn test_hash_format() {
        let fp = content_hash(&ss("n", "example.com", "pw")).unwrap();
        assert_eq!(fp.as_str().len(), 32);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
