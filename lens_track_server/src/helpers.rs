use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::trace;
use regex::Regex;

/// Resolve the caller's IP address. Proxy headers are only consulted when the matching
/// configuration flag is on:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    if use_x_forwarded_for {
        // The header may carry a proxy chain. The leftmost entry is the client.
        let ip = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = ip {
            trace!("Using X-Forwarded-For header for remote address: {ip}");
            return Some(ip);
        }
    }
    if use_forwarded {
        let re = Regex::new(r#"for=(?P<ip>[^;]+)"#).unwrap();
        let ip = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.captures(v))
            .and_then(|caps| caps.name("ip"))
            .and_then(|m| IpAddr::from_str(m.as_str()).ok());
        if let Some(ip) = ip {
            trace!("Using Forwarded header for remote address: {ip}");
            return Some(ip);
        }
    }
    let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
    trace!("Using peer address for remote address: {peer_addr:?}");
    peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
}
