use crate::error::DecodeError;
use crate::models::AnyTlsProxy;
use crate::utils::url::url_decode;

use super::common::{host_port, parse_url, query_map, remark, take, take_bool};

/// Decode an AnyTLS link: `anytls://password@host:port?sni=&insecure=#name`.
pub fn decode_anytls(link: &str) -> Result<AnyTlsProxy, DecodeError> {
    let url = parse_url(link)?;
    let (server, port) = host_port(&url)?;
    let password = url_decode(url.username());
    if password.is_empty() {
        return Err(DecodeError::MissingMandatoryField("password"));
    }

    let mut params = query_map(&url);
    let sni = take(&mut params, "sni");
    let insecure = take_bool(&mut params, "insecure");
    let name = remark(&url, &server, port);

    Ok(AnyTlsProxy {
        name,
        server,
        port,
        password,
        sni,
        insecure,
        extra: params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_anytls_basic() {
        let proxy =
            decode_anytls("anytls://pw@example.com:8443?sni=example.com&insecure=0#AnyTLS").unwrap();
        assert_eq!(proxy.server, "example.com");
        assert_eq!(proxy.port, 8443);
        assert_eq!(proxy.password, "pw");
        assert_eq!(proxy.sni.as_deref(), Some("example.com"));
        assert_eq!(proxy.insecure, Some(false));
        assert_eq!(proxy.name, "AnyTLS");
    }

    #[test]
    fn test_decode_anytls_missing_password() {
        assert_eq!(
            decode_anytls("anytls://example.com:8443"),
            Err(DecodeError::MissingMandatoryField("password"))
        );
    }
}
