use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{error::AppError, state::limits::RateLimitGate};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Reject the request with 429 once the client address exhausted the limiter budget.
pub async fn enforce_rate_limit(
    State(gate): State<RateLimitGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(
        req.headers(),
        req.extensions().get::<ConnectInfo<SocketAddr>>(),
        gate.trusted_proxy_hops(),
    );
    if !gate.check(ip) {
        debug!(%ip, path = %req.uri().path(), "rate limit exceeded");
        return Err(AppError::TooManyRequests(
            "Too many requests, please try again later.".into(),
        ));
    }
    Ok(next.run(req).await)
}

/// Walk the address chain from the socket peer back through `X-Forwarded-For`,
/// rightmost hop first, and stop after `trusted_hops` proxies. An unparsable hop ends the chain.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trusted_hops: usize,
) -> IpAddr {
    let peer = peer
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let forwarded = headers
        .get_all(FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .collect::<Vec<_>>();

    forwarded
        .iter()
        .rev()
        .map_while(|hop| hop.trim().parse::<IpAddr>().ok())
        .take(trusted_hops)
        .last()
        .unwrap_or(peer)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn peer_is_used_without_forwarded_header() {
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 4242)));
        assert_eq!(client_ip(&HeaderMap::new(), Some(&peer), 1), ip(10, 0, 0, 9));
        assert_eq!(
            client_ip(&HeaderMap::new(), None, 1),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn spoofed_leading_hops_are_ignored() {
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 4242)));
        let headers = forwarded("1.2.3.4, 203.0.113.7");

        assert_eq!(client_ip(&headers, Some(&peer), 1), ip(203, 0, 113, 7));
        assert_eq!(client_ip(&headers, Some(&peer), 2), ip(1, 2, 3, 4));
        assert_eq!(client_ip(&headers, Some(&peer), 5), ip(1, 2, 3, 4));
    }

    #[test]
    fn zero_trusted_hops_keys_on_the_peer() {
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 4242)));
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_ip(&headers, Some(&peer), 0), ip(10, 0, 0, 9));
    }

    #[test]
    fn unparsable_hop_ends_the_chain() {
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 4242)));
        assert_eq!(
            client_ip(&forwarded("garbage"), Some(&peer), 1),
            ip(10, 0, 0, 9)
        );
        assert_eq!(
            client_ip(&forwarded("1.2.3.4, garbage, 203.0.113.7"), Some(&peer), 3),
            ip(203, 0, 113, 7)
        );
    }
}
