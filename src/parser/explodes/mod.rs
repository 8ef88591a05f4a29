//! One decoder module per scheme family. Each decoder turns a raw link
//! string into its canonical proxy struct or a typed [`DecodeError`].
//!
//! [`DecodeError`]: crate::error::DecodeError

pub mod anytls;
pub mod common;
pub mod http;
pub mod hysteria;
pub mod hysteria2;
pub mod socks;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;
pub mod wireguard;
