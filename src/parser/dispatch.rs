//! Scheme dispatcher: classify a link by its scheme token and route it to
//! the matching decoder.

use crate::error::DecodeError;
use crate::models::{OutputConfig, Proxy, ProxyType};

use super::explodes;

/// Upper bound on accepted input size, bounding base64/JSON parsing cost
/// for a single link.
pub const MAX_LINK_LEN: usize = 16 * 1024;

/// Scheme token of a link: the substring before `://`.
pub fn scheme_of(link: &str) -> Option<&str> {
    link.find("://").map(|pos| &link[..pos])
}

/// Pure protocol classification. Never decodes and never fails: garbage
/// input (empty string, no `://`, unknown token) maps to
/// [`ProxyType::Unknown`].
pub fn classify(link: &str) -> ProxyType {
    match scheme_of(link.trim()) {
        Some(scheme) => ProxyType::from_scheme(scheme),
        None => ProxyType::Unknown,
    }
}

/// The single canonicalization funnel: decode a link into its canonical
/// proxy variant. Both storage metadata and content hashing go through
/// here so every consumer sees the same normalization.
pub fn decode(link: &str, _config: &OutputConfig) -> Result<Proxy, DecodeError> {
    let link = link.trim();
    if link.len() > MAX_LINK_LEN {
        return Err(DecodeError::InputTooLarge(link.len()));
    }
    let scheme = scheme_of(link)
        .ok_or_else(|| DecodeError::UnparseableUri("missing scheme separator".to_string()))?;

    match ProxyType::from_scheme(scheme) {
        ProxyType::Shadowsocks => explodes::ss::decode_ss(link).map(Proxy::Shadowsocks),
        ProxyType::ShadowsocksR => explodes::ssr::decode_ssr(link).map(Proxy::ShadowsocksR),
        ProxyType::VMess => explodes::vmess::decode_vmess(link).map(Proxy::VMess),
        ProxyType::Vless => explodes::vless::decode_vless(link).map(Proxy::Vless),
        ProxyType::Trojan => explodes::trojan::decode_trojan(link).map(Proxy::Trojan),
        ProxyType::Hysteria => explodes::hysteria::decode_hysteria(link).map(Proxy::Hysteria),
        ProxyType::Hysteria2 => explodes::hysteria2::decode_hysteria2(link).map(Proxy::Hysteria2),
        ProxyType::Tuic => explodes::tuic::decode_tuic(link).map(Proxy::Tuic),
        ProxyType::Socks5 => explodes::socks::decode_socks5(link).map(Proxy::Socks5),
        ProxyType::Http | ProxyType::Https => explodes::http::decode_http(link).map(Proxy::Http),
        ProxyType::AnyTls => explodes::anytls::decode_anytls(link).map(Proxy::AnyTls),
        ProxyType::WireGuard => {
            explodes::wireguard::decode_wireguard_url(link).map(Proxy::WireGuard)
        }
        ProxyType::Unknown => Err(DecodeError::UnrecognizedScheme(scheme.to_string())),
    }
}
