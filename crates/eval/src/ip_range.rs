//! IPv4 range matching for `Value::in_ip_range`.
//!
//! Three notations are recognised, tried per range:
//! CIDR or dotted netmask (`10.0.0.0/8`, `10.0.0.0/255.0.0.0`), wildcard
//! (`10.0.*.*`) and explicit inclusive ranges (`10.0.0.1-10.0.0.9`).
//! Malformed ranges never fail; they simply do not match.

use std::net::Ipv4Addr;

/// Convert a strict dotted quad to its unsigned 32-bit value.
pub fn ip_to_u32(ip: &str) -> Option<u32> {
    ip.trim().parse::<Ipv4Addr>().ok().map(u32::from)
}

/// Whether `ip` (a dotted quad) falls inside `range`.
pub fn ip_in_range(ip: &str, range: &str) -> bool {
    let Some(ip) = ip_to_u32(ip) else {
        return false;
    };
    let range = range.trim();

    if let Some((base, mask)) = range.split_once('/') {
        return matches_netmask(ip, base, mask).unwrap_or_else(|| {
            tracing::debug!(range, "skipping malformed netmask range");
            false
        });
    }

    let explicit = if range.contains('*') {
        format!("{}-{}", range.replace('*', "0"), range.replace('*', "255"))
    } else {
        range.to_string()
    };
    if let Some((lower, upper)) = explicit.split_once('-') {
        return matches_bounds(ip, lower, upper).unwrap_or_else(|| {
            tracing::debug!(range, "skipping malformed explicit range");
            false
        });
    }

    tracing::debug!(range, "range is not in CIDR, wildcard or lower-upper form");
    false
}

fn matches_netmask(ip: u32, base: &str, mask: &str) -> Option<bool> {
    let base = ip_to_u32(&pad_octets(base))?;
    let mask = if mask.contains('.') {
        ip_to_u32(&mask.replace('*', "0"))?
    } else {
        prefix_mask(mask.trim().parse().ok()?)?
    };
    Some(ip & mask == base & mask)
}

fn matches_bounds(ip: u32, lower: &str, upper: &str) -> Option<bool> {
    let lower = ip_to_u32(lower)?;
    let upper = ip_to_u32(upper)?;
    Some(lower <= ip && ip <= upper)
}

/// Netmask for a CIDR prefix length in `0..=32`.
fn prefix_mask(prefix: u32) -> Option<u32> {
    if prefix > 32 {
        return None;
    }
    let host_bits = (1u64 << (32 - prefix)) - 1;
    Some(!(host_bits as u32))
}

/// Pad a partial address (`10.1`) to four octets, empty octets as `0`.
fn pad_octets(base: &str) -> String {
    let mut octets: Vec<&str> = base
        .trim()
        .split('.')
        .map(|octet| if octet.is_empty() { "0" } else { octet })
        .collect();
    while octets.len() < 4 {
        octets.push("0");
    }
    octets.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_to_u32_is_unsigned() {
        assert_eq!(ip_to_u32("0.0.0.0"), Some(0));
        assert_eq!(ip_to_u32("10.0.0.1"), Some(0x0A00_0001));
        assert_eq!(ip_to_u32("255.255.255.255"), Some(u32::MAX));
        assert_eq!(ip_to_u32("192.168.1.10"), Some(0xC0A8_010A));
    }

    #[test]
    fn ip_to_u32_rejects_garbage() {
        assert_eq!(ip_to_u32("256.0.0.1"), None);
        assert_eq!(ip_to_u32("1.2.3"), None);
        assert_eq!(ip_to_u32("a.b.c.d"), None);
        assert_eq!(ip_to_u32(""), None);
    }

    #[test]
    fn cidr_prefix() {
        assert!(ip_in_range("192.168.1.10", "192.168.1.0/24"));
        assert!(!ip_in_range("192.168.2.10", "192.168.1.0/24"));
        assert!(ip_in_range("200.1.2.3", "200.0.0.0/8"));
        assert!(ip_in_range("8.8.8.8", "0.0.0.0/0"));
        assert!(ip_in_range("10.0.0.7", "10.0.0.7/32"));
        assert!(!ip_in_range("10.0.0.8", "10.0.0.7/32"));
    }

    #[test]
    fn cidr_base_is_padded() {
        assert!(ip_in_range("10.20.30.40", "10/8"));
        assert!(ip_in_range("172.16.5.4", "172.16/12"));
        assert!(!ip_in_range("172.32.0.1", "172.16/12"));
    }

    #[test]
    fn dotted_netmask() {
        assert!(ip_in_range("192.168.1.10", "192.168.1.0/255.255.255.0"));
        assert!(!ip_in_range("192.168.2.10", "192.168.1.0/255.255.255.0"));
        assert!(ip_in_range("192.168.9.10", "192.168.0.0/255.255.*.*"));
    }

    #[test]
    fn wildcard() {
        assert!(ip_in_range("10.0.0.5", "10.0.*.*"));
        assert!(ip_in_range("10.0.255.255", "10.0.*.*"));
        assert!(!ip_in_range("10.1.0.0", "10.0.*.*"));
    }

    #[test]
    fn explicit_range_is_inclusive_and_unsigned() {
        assert!(ip_in_range("10.0.0.5", "10.0.0.1-10.0.0.10"));
        assert!(ip_in_range("10.0.0.1", "10.0.0.1-10.0.0.10"));
        assert!(ip_in_range("10.0.0.10", "10.0.0.1-10.0.0.10"));
        assert!(!ip_in_range("10.0.0.11", "10.0.0.1-10.0.0.10"));
        assert!(ip_in_range("200.0.0.1", "127.0.0.1-255.0.0.0"));
        assert!(!ip_in_range("100.0.0.1", "127.0.0.1-255.0.0.0"));
    }

    #[test]
    fn malformed_ranges_do_not_match() {
        assert!(!ip_in_range("1.2.3.4", "not-a-range"));
        assert!(!ip_in_range("1.2.3.4", "1.2.3.0/33"));
        assert!(!ip_in_range("1.2.3.4", "1.2.3.0/abc"));
        assert!(!ip_in_range("1.2.3.4", "1.2.3.4"));
        assert!(!ip_in_range("1.2.3.4", ""));
        assert!(!ip_in_range("not-an-ip", "0.0.0.0/0"));
    }
}
