//! Canonical proxy model
//!
//! Every scheme decoder populates one variant of [`Proxy`]; every consumer
//! (listing metadata, content hashing, re-encoding) reads from it. Each
//! variant carries exactly the fields meaningful to its protocol, plus one
//! `extra` overflow map holding unrecognized query keys so nothing is
//! silently dropped.

use std::collections::BTreeMap;

/// Unrecognized option-bag keys, preserved verbatim. `BTreeMap` keeps
/// iteration deterministic.
pub type ExtraOptions = BTreeMap<String, String>;

/// Protocol kind of a proxy link.
///
/// This is the canonical identifier used for classification, dispatch and
/// display across the crate. `Unknown` is a value, not an error: the pure
/// classifier returns it for anything outside the supported table and lets
/// the caller decide whether to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Shadowsocks,
    ShadowsocksR,
    VMess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    Tuic,
    Socks5,
    Http,
    Https,
    AnyTls,
    WireGuard,
    Unknown,
}

impl ProxyType {
    /// Stable lower-case tag, also used as the leading token of the content
    /// hash payload.
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::ShadowsocksR => "ssr",
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria => "hysteria",
            ProxyType::Hysteria2 => "hysteria2",
            ProxyType::Tuic => "tuic",
            ProxyType::Socks5 => "socks5",
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::AnyTls => "anytls",
            ProxyType::WireGuard => "wireguard",
            ProxyType::Unknown => "unknown",
        }
    }

    /// Maps a scheme token (the part before `://`, any casing) to a
    /// protocol, including the aliases each ecosystem uses.
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme.to_ascii_lowercase().as_str() {
            "ss" => ProxyType::Shadowsocks,
            "ssr" => ProxyType::ShadowsocksR,
            "vmess" => ProxyType::VMess,
            "vless" => ProxyType::Vless,
            "trojan" => ProxyType::Trojan,
            "hy" | "hysteria" => ProxyType::Hysteria,
            "hy2" | "hysteria2" => ProxyType::Hysteria2,
            "tuic" => ProxyType::Tuic,
            "socks5" => ProxyType::Socks5,
            "http" => ProxyType::Http,
            "https" => ProxyType::Https,
            "anytls" => ProxyType::AnyTls,
            "wg" | "wireguard" => ProxyType::WireGuard,
            _ => ProxyType::Unknown,
        }
    }
}

/// Decode options threaded through the canonicalization funnel.
///
/// Empty today; exists so format-specific knobs can be added later without
/// touching every decoder signature.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowsocksProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub method: String,
    pub password: String,
    pub plugin: Option<String>,
    pub plugin_opts: Option<String>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowsocksRProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub protocol: String,
    pub method: String,
    pub obfs: String,
    pub password: String,
    pub obfs_param: Option<String>,
    pub protocol_param: Option<String>,
    pub group: Option<String>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmessProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    pub alter_id: u16,
    pub security: String,
    pub network: String,
    pub header_type: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub tls: bool,
    pub sni: Option<String>,
    pub alpn: Vec<String>,
    pub fingerprint: Option<String>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VlessProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    pub flow: Option<String>,
    pub encryption: Option<String>,
    pub network: Option<String>,
    pub security: Option<String>,
    pub sni: Option<String>,
    pub alpn: Vec<String>,
    pub fingerprint: Option<String>,
    pub public_key: Option<String>,
    pub short_id: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub service_name: Option<String>,
    pub header_type: Option<String>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrojanProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub password: String,
    pub sni: Option<String>,
    pub network: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub security: Option<String>,
    pub alpn: Vec<String>,
    pub fingerprint: Option<String>,
    pub allow_insecure: Option<bool>,
    pub extra: ExtraOptions,
}

/// Hysteria v1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HysteriaProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub auth: Option<String>,
    pub protocol: Option<String>,
    pub peer: Option<String>,
    pub up_mbps: Option<u32>,
    pub down_mbps: Option<u32>,
    pub obfs: Option<String>,
    pub obfs_param: Option<String>,
    pub alpn: Vec<String>,
    pub insecure: Option<bool>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hysteria2Proxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub password: String,
    pub sni: Option<String>,
    pub obfs: Option<String>,
    pub obfs_password: Option<String>,
    pub insecure: Option<bool>,
    /// Port-hopping range, e.g. `20000-30000`.
    pub ports: Option<String>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuicProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    pub password: Option<String>,
    pub congestion_control: Option<String>,
    pub udp_relay_mode: Option<String>,
    pub alpn: Vec<String>,
    pub sni: Option<String>,
    pub allow_insecure: Option<bool>,
    pub disable_sni: Option<bool>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Socks5Proxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// True for `https://` links.
    pub tls: bool,
    pub extra: ExtraOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnyTlsProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub password: String,
    pub sni: Option<String>,
    pub insecure: Option<bool>,
    pub extra: ExtraOptions,
}

/// WireGuard peer configuration, shared by the INI bridge and the `wg://`
/// codec. `server`/`port` hold the peer endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireGuardProxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub private_key: String,
    pub public_key: String,
    pub pre_shared_key: Option<String>,
    pub address: Vec<String>,
    pub dns: Vec<String>,
    pub allowed_ips: Vec<String>,
    pub mtu: Option<u16>,
    pub extra: ExtraOptions,
}

/// Protocol-agnostic representation of a decoded proxy link.
///
/// A closed, exhaustively-matched union: adding a scheme is a
/// compiler-checked change to this enum and the dispatcher, never a growing
/// chain of string comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proxy {
    Shadowsocks(ShadowsocksProxy),
    ShadowsocksR(ShadowsocksRProxy),
    VMess(VmessProxy),
    Vless(VlessProxy),
    Trojan(TrojanProxy),
    Hysteria(HysteriaProxy),
    Hysteria2(Hysteria2Proxy),
    Tuic(TuicProxy),
    Socks5(Socks5Proxy),
    Http(HttpProxy),
    AnyTls(AnyTlsProxy),
    WireGuard(WireGuardProxy),
}

impl Proxy {
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            Proxy::Shadowsocks(_) => ProxyType::Shadowsocks,
            Proxy::ShadowsocksR(_) => ProxyType::ShadowsocksR,
            Proxy::VMess(_) => ProxyType::VMess,
            Proxy::Vless(_) => ProxyType::Vless,
            Proxy::Trojan(_) => ProxyType::Trojan,
            Proxy::Hysteria(_) => ProxyType::Hysteria,
            Proxy::Hysteria2(_) => ProxyType::Hysteria2,
            Proxy::Tuic(_) => ProxyType::Tuic,
            Proxy::Socks5(_) => ProxyType::Socks5,
            Proxy::Http(p) => {
                if p.tls {
                    ProxyType::Https
                } else {
                    ProxyType::Http
                }
            }
            Proxy::AnyTls(_) => ProxyType::AnyTls,
            Proxy::WireGuard(_) => ProxyType::WireGuard,
        }
    }

    /// Display name, sourced from the protocol's own remark field at decode
    /// time. Never part of the content fingerprint.
    pub fn name(&self) -> &str {
        match self {
            Proxy::Shadowsocks(p) => &p.name,
            Proxy::ShadowsocksR(p) => &p.name,
            Proxy::VMess(p) => &p.name,
            Proxy::Vless(p) => &p.name,
            Proxy::Trojan(p) => &p.name,
            Proxy::Hysteria(p) => &p.name,
            Proxy::Hysteria2(p) => &p.name,
            Proxy::Tuic(p) => &p.name,
            Proxy::Socks5(p) => &p.name,
            Proxy::Http(p) => &p.name,
            Proxy::AnyTls(p) => &p.name,
            Proxy::WireGuard(p) => &p.name,
        }
    }

    pub fn server(&self) -> &str {
        match self {
            Proxy::Shadowsocks(p) => &p.server,
            Proxy::ShadowsocksR(p) => &p.server,
            Proxy::VMess(p) => &p.server,
            Proxy::Vless(p) => &p.server,
            Proxy::Trojan(p) => &p.server,
            Proxy::Hysteria(p) => &p.server,
            Proxy::Hysteria2(p) => &p.server,
            Proxy::Tuic(p) => &p.server,
            Proxy::Socks5(p) => &p.server,
            Proxy::Http(p) => &p.server,
            Proxy::AnyTls(p) => &p.server,
            Proxy::WireGuard(p) => &p.server,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Proxy::Shadowsocks(p) => p.port,
            Proxy::ShadowsocksR(p) => p.port,
            Proxy::VMess(p) => p.port,
            Proxy::Vless(p) => p.port,
            Proxy::Trojan(p) => p.port,
            Proxy::Hysteria(p) => p.port,
            Proxy::Hysteria2(p) => p.port,
            Proxy::Tuic(p) => p.port,
            Proxy::Socks5(p) => p.port,
            Proxy::Http(p) => p.port,
            Proxy::AnyTls(p) => p.port,
            Proxy::WireGuard(p) => p.port,
        }
    }

    /// `host:port` string used for listing and node metadata.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server(), self.port())
    }
}
