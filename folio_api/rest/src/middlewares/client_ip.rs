use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::{from_fn, Next},
    Router,
};
use tracing::{debug, error, warn};

use crate::RestServerRealIpConfig;

pub fn add<S: Clone + Send + Sync + 'static>(
    real_ip_config: Option<Arc<RestServerRealIpConfig>>,
) -> impl FnOnce(Router<S>) -> Router<S> {
    |router| {
        router.layer(from_fn(move |mut request: Request, next: Next| {
            let client_ip = ClientIp::from_request(&request, real_ip_config.as_deref());
            request.extensions_mut().insert(client_ip);
            next.run(request)
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientIp(pub IpAddr);

impl ClientIp {
    /// Used if the peer address is unknown.
    pub const UNSPECIFIED: Self = Self(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    fn from_request(request: &Request, real_ip_config: Option<&RestServerRealIpConfig>) -> Self {
        let Some(client_ip) = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
        else {
            warn!("peer address not available");
            return Self::UNSPECIFIED;
        };

        let Some(RestServerRealIpConfig { header, set_from }) = real_ip_config else {
            return Self(client_ip);
        };

        let header_value = request.headers().get(header);

        if *set_from != client_ip {
            if let Some(header_value) = header_value {
                debug!(%client_ip, ?header_value, "ignoring real ip header value from untrusted source");
            }
            return Self(client_ip);
        }

        let Some(header_value) = header_value else {
            warn!(%client_ip, "real ip header not found");
            return Self(client_ip);
        };

        // X-Forwarded-For: <client>, <proxy1>, <proxy2>
        let Some(real_ip) = header_value
            .to_str()
            .ok()
            .and_then(|value| value.split(',').next())
            .and_then(|real_ip| real_ip.trim().parse().ok())
        else {
            error!(%client_ip, ?header_value, "failed to parse real ip header value");
            return Self(client_ip);
        };

        Self(real_ip)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const PROXY: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn request(peer: Option<IpAddr>, forwarded_for: Option<&'static str>) -> Request {
        let mut request = Request::new(axum::body::Body::empty());
        if let Some(peer) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::new(peer, 4242)));
        }
        if let Some(forwarded_for) = forwarded_for {
            request
                .headers_mut()
                .insert("X-Forwarded-For", HeaderValue::from_static(forwarded_for));
        }
        request
    }

    fn config() -> RestServerRealIpConfig {
        RestServerRealIpConfig {
            header: "X-Forwarded-For".into(),
            set_from: PROXY,
        }
    }

    #[test]
    fn peer_address() {
        let peer = "198.51.100.1".parse().unwrap();
        let request = request(Some(peer), Some("203.0.113.7"));

        assert_eq!(ClientIp::from_request(&request, None), ClientIp(peer));
    }

    #[test]
    fn no_peer_address() {
        let request = request(None, None);

        assert_eq!(
            ClientIp::from_request(&request, Some(&config())),
            ClientIp::UNSPECIFIED
        );
    }

    #[test]
    fn trusted_proxy() {
        let request = request(Some(PROXY), Some("203.0.113.7, 10.0.0.1, 127.0.0.1"));

        assert_eq!(
            ClientIp::from_request(&request, Some(&config())),
            ClientIp("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn untrusted_proxy() {
        let peer = "198.51.100.1".parse().unwrap();
        let request = request(Some(peer), Some("203.0.113.7"));

        assert_eq!(
            ClientIp::from_request(&request, Some(&config())),
            ClientIp(peer)
        );
    }

    #[test]
    fn trusted_proxy_invalid_header() {
        for header in [Some("not an ip"), None] {
            let request = request(Some(PROXY), header);

            assert_eq!(
                ClientIp::from_request(&request, Some(&config())),
                ClientIp(PROXY)
            );
        }
    }
}
