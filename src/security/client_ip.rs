//! Client identity behind trusted reverse proxies.
//!
//! The address chain is `X-Forwarded-For` entries followed by the TCP peer.
//! Each trusted hop appended exactly one entry, so skipping
//! `trusted_hops` entries from the right yields the address the outermost
//! trusted proxy saw. Entries further left are client-controlled and ignored.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Derive the rate-limit key for a request.
pub fn client_key(peer: Option<SocketAddr>, headers: &HeaderMap, trusted_hops: usize) -> String {
    let mut chain: Vec<String> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(normalize)
        .collect();

    match peer {
        Some(addr) => chain.push(normalize(&addr.ip().to_string())),
        None if chain.is_empty() => return "unknown".to_string(),
        None => {}
    }

    let index = chain.len().saturating_sub(1).saturating_sub(trusted_hops);
    chain.swap_remove(index)
}

/// Canonicalize an address entry so `::ffff:1.2.3.4` and `1.2.3.4`
/// share a key.
fn normalize(entry: &str) -> String {
    match entry.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(ip) => ip.to_string(),
        Err(_) => entry.to_string(),
    }
}
