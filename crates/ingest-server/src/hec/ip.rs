//! Source IP resolution (§4.C step 2): `X-Forwarded-For` first hop, else
//! `X-Real-IP`, else the socket address.

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Resolve the client's source IP for rate limiting and stats.
pub fn source_ip(headers: &HeaderMap, socket_addr: IpAddr) -> IpAddr {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_hop) = value.split(',').next() {
            if let Ok(ip) = first_hop.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }
    if let Some(value) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if let Ok(ip) = value.trim().parse::<IpAddr>() {
            return ip;
        }
    }
    socket_addr
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;

    fn socket() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    #[test]
    fn prefers_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.5, 10.0.0.1"));
        assert_eq!(source_ip(&headers, socket()), IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.9"));
        assert_eq!(source_ip(&headers, socket()), IpAddr::V4(Ipv4Addr::new(198, 51, 100, 9)));
    }

    #[test]
    fn falls_back_to_socket_address() {
        let headers = HeaderMap::new();
        assert_eq!(source_ip(&headers, socket()), socket());
    }

    #[test]
    fn malformed_forwarded_for_falls_through_to_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(source_ip(&headers, socket()), socket());
    }
}
