//! Proxy share-link codec.
//!
//! Decodes the common proxy share-link schemes (`ss://`, `vmess://`,
//! `trojan://`, ...) into one canonical [`Proxy`] model, bridges WireGuard
//! INI configs to `wg://` links, imports Clash YAML proxy lists, and
//! computes an order- and case-insensitive content fingerprint for
//! deduplication.
//!
//! The funnel is: classify the scheme, decode into a typed variant, then
//! hash or re-encode from the canonical model. Decoding never panics on
//! untrusted input; failures come back as [`DecodeError`].

pub mod error;
pub mod hash;
pub mod models;
pub mod parser;
pub mod utils;

pub use error::DecodeError;
pub use hash::{content_hash, Fingerprint};
pub use models::{OutputConfig, Proxy, ProxyType};
pub use parser::dispatch::{classify, decode, MAX_LINK_LEN};
pub use parser::explodes::wireguard::{
    decode_wireguard_url, encode_wireguard_url, is_wireguard_config, parse_wireguard_config,
};
pub use parser::yaml::clash::{
    generate_proxy_link, parse_clash_yaml, ClashImport, ClashProxyEntry,
};
