pub mod proxy;

pub use proxy::{
    AnyTlsProxy, ExtraOptions, HttpProxy, Hysteria2Proxy, HysteriaProxy, OutputConfig, Proxy,
    ProxyType, ShadowsocksProxy, ShadowsocksRProxy, Socks5Proxy, TrojanProxy, TuicProxy,
    VlessProxy, VmessProxy, WireGuardProxy,
};
