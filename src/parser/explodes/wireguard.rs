//! WireGuard bridge: recognizes raw INI-style configuration text, parses it
//! into the canonical WireGuard record, and round-trips that record through
//! a `wg://` URI so the rest of the pipeline only ever sees URIs.

use url::form_urlencoded;

use crate::error::DecodeError;
use crate::models::WireGuardProxy;
use crate::utils::url::{url_decode, url_encode};

use super::common::{host_port, parse_url, query_map, remark, split_host_port, take};

/// Pure sniff for INI-style WireGuard text: an `[Interface]` section header
/// plus a `PrivateKey` or `Address` key, and no URI scheme separator.
/// Classification never attempts a full parse.
pub fn is_wireguard_config(text: &str) -> bool {
    if text.contains("://") {
        return false;
    }
    let mut has_interface = false;
    let mut has_key = false;
    for line in text.lines() {
        let line = line.trim();
        if line.eq_ignore_ascii_case("[interface]") {
            has_interface = true;
        } else if let Some((key, _)) = line.split_once('=') {
            let key = key.trim().to_ascii_lowercase();
            if key == "privatekey" || key == "address" {
                has_key = true;
            }
        }
    }
    has_interface && has_key
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Interface,
    Peer,
    Other,
}

/// Parse INI-style WireGuard text into the canonical record.
///
/// `key = value` per line, `#`/`;` comment lines ignored, whitespace
/// trimmed. The peer endpoint splits on the last colon so IPv6 literals
/// survive. A missing peer endpoint or public key is a decode error.
pub fn parse_wireguard_config(text: &str) -> Result<WireGuardProxy, DecodeError> {
    let mut section = Section::None;
    let mut private_key = String::new();
    let mut public_key = String::new();
    let mut pre_shared_key = None;
    let mut address = Vec::new();
    let mut dns = Vec::new();
    let mut allowed_ips = Vec::new();
    let mut mtu = None;
    let mut endpoint = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = match line[1..line.len() - 1].to_ascii_lowercase().as_str() {
                "interface" => Section::Interface,
                "peer" => Section::Peer,
                _ => Section::Other,
            };
            continue;
        }
        // Base64 values end with '='; only the first '=' separates key
        // from value.
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match (section, key.as_str()) {
            (Section::Interface, "privatekey") => private_key = value.to_string(),
            (Section::Interface, "address") => {
                address = split_comma_list(value);
            }
            (Section::Interface, "dns") => {
                dns = split_comma_list(value);
            }
            (Section::Interface, "mtu") => mtu = value.parse().ok(),
            (Section::Peer, "publickey") => public_key = value.to_string(),
            (Section::Peer, "presharedkey") => pre_shared_key = Some(value.to_string()),
            (Section::Peer, "endpoint") => endpoint = Some(value.to_string()),
            (Section::Peer, "allowedips") => {
                allowed_ips = split_comma_list(value);
            }
            _ => {}
        }
    }

    if public_key.is_empty() {
        return Err(DecodeError::MissingMandatoryField("PublicKey"));
    }
    let endpoint = endpoint.ok_or(DecodeError::MissingMandatoryField("Endpoint"))?;
    let (server, port) = split_host_port(&endpoint)?;
    let name = format!("{} ({})", server, port);

    Ok(WireGuardProxy {
        name,
        server,
        port,
        private_key,
        public_key,
        pre_shared_key,
        address,
        dns,
        allowed_ips,
        mtu,
        extra: Default::default(),
    })
}

fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Encode the canonical record as a `wg://` URI: private key in the
/// user-info slot, peer endpoint as the authority, everything else in the
/// query. `decode_wireguard_url(encode_wireguard_url(x)) == x` for every
/// field the encoder writes.
pub fn encode_wireguard_url(wg: &WireGuardProxy) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("publickey", &wg.public_key);
    if let Some(psk) = &wg.pre_shared_key {
        query.append_pair("presharedkey", psk);
    }
    if !wg.address.is_empty() {
        query.append_pair("address", &wg.address.join(","));
    }
    if !wg.dns.is_empty() {
        query.append_pair("dns", &wg.dns.join(","));
    }
    if !wg.allowed_ips.is_empty() {
        query.append_pair("allowedips", &wg.allowed_ips.join(","));
    }
    if let Some(mtu) = wg.mtu {
        query.append_pair("mtu", &mtu.to_string());
    }

    let host = if wg.server.contains(':') {
        format!("[{}]", wg.server)
    } else {
        wg.server.clone()
    };
    let mut link = format!(
        "wg://{}@{}:{}/?{}",
        url_encode(&wg.private_key),
        host,
        wg.port,
        query.finish()
    );
    if !wg.name.is_empty() {
        link.push('#');
        link.push_str(&url_encode(&wg.name));
    }
    link
}

/// Decode a `wg://` (or `wireguard://`) URI back into the canonical record.
pub fn decode_wireguard_url(link: &str) -> Result<WireGuardProxy, DecodeError> {
    let url = parse_url(link)?;
    let (server, port) = host_port(&url)?;
    let private_key = url_decode(url.username());

    let mut params = query_map(&url);
    let public_key =
        take(&mut params, "publickey").ok_or(DecodeError::MissingMandatoryField("publickey"))?;
    let pre_shared_key = take(&mut params, "presharedkey");
    let address = take(&mut params, "address")
        .map(|v| split_comma_list(&v))
        .unwrap_or_default();
    let dns = take(&mut params, "dns")
        .map(|v| split_comma_list(&v))
        .unwrap_or_default();
    let allowed_ips = take(&mut params, "allowedips")
        .map(|v| split_comma_list(&v))
        .unwrap_or_default();
    let mtu = take(&mut params, "mtu").and_then(|v| v.parse().ok());
    let name = remark(&url, &server, port);

    Ok(WireGuardProxy {
        name,
        server,
        port,
        private_key,
        public_key,
        pre_shared_key,
        address,
        dns,
        allowed_ips,
        mtu,
        extra: params,
    })
}
