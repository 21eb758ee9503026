//! Outbound destination checks (SSRF defense).
//!
//! [`check_endpoint`] is a pure function of the URL text and a
//! [`TrustPolicy`] snapshot: no DNS, no sockets. A URL that does not parse is
//! a rejection, never a panic.
//!
//! Under a strict policy the rules run in this order, first match wins:
//!
//! 1. scheme must be `http` or `https`
//! 2. loopback literals (`localhost`, `127.0.0.1`, `::1`) are accepted
//! 3. remote servers must be enabled
//! 4. cloud metadata hosts and private/link-local IP literals are refused
//! 5. a non-empty trusted host list must contain the host or a parent domain
//! 6. an explicit port must be in `1..=65535`

use lmguard_kernel::{EndpointRejection, TrustPolicy};
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

const METADATA_IPV4: [Ipv4Addr; 2] = [
    Ipv4Addr::new(169, 254, 169, 254), // AWS, Azure, GCP
    Ipv4Addr::new(100, 100, 100, 200), // Alibaba Cloud
];

const METADATA_DOMAINS: [&str; 1] = ["metadata.google.internal"];

/// `true` if `url` may be contacted under `policy`.
pub fn is_allowed_endpoint(url: &str, policy: &TrustPolicy) -> bool {
    check_endpoint(url, policy).is_ok()
}

/// Like [`is_allowed_endpoint`] but names the rule that rejected the URL.
pub fn check_endpoint(url: &str, policy: &TrustPolicy) -> Result<(), EndpointRejection> {
    let parsed = Url::parse(url).map_err(|_| EndpointRejection::Malformed)?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(EndpointRejection::Scheme),
    }

    if !policy.strict_validation {
        return Ok(());
    }

    let host = parsed.host().ok_or(EndpointRejection::MissingHost)?;

    if is_loopback_literal(&host) {
        return Ok(());
    }

    if !policy.allow_remote_servers {
        return Err(EndpointRejection::RemoteNotAllowed);
    }

    if is_metadata_host(&host) {
        return Err(EndpointRejection::MetadataHost);
    }

    if is_private_host(&host) {
        return Err(EndpointRejection::PrivateRange);
    }

    if !policy.trusted_hosts.is_empty() {
        let hostname = parsed.host_str().unwrap_or_default();
        if !policy
            .trusted_hosts
            .iter()
            .any(|trusted| host_matches_trusted(hostname, trusted))
        {
            return Err(EndpointRejection::NotTrusted);
        }
    }

    // `Url` already refuses ports above 65535 at parse time.
    if parsed.port() == Some(0) {
        return Err(EndpointRejection::Port);
    }

    Ok(())
}

fn is_loopback_literal(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => *ip == Ipv4Addr::LOCALHOST,
        Host::Ipv6(ip) => *ip == Ipv6Addr::LOCALHOST,
    }
}

fn is_metadata_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.');
            METADATA_DOMAINS
                .iter()
                .any(|m| domain.eq_ignore_ascii_case(m))
        }
        Host::Ipv4(ip) => METADATA_IPV4.contains(ip),
        Host::Ipv6(ip) => ip
            .to_ipv4_mapped()
            .is_some_and(|v4| METADATA_IPV4.contains(&v4)),
    }
}

fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(_) => false,
        Host::Ipv4(ip) => is_private_ipv4(*ip),
        Host::Ipv6(ip) => is_private_ipv6(*ip),
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    a == 10                                 // 10.0.0.0/8
        || (a == 172 && (16..=31).contains(&b)) // 172.16.0.0/12
        || (a == 192 && b == 168)           // 192.168.0.0/16
        || a == 127                         // 127.0.0.0/8
        || (a == 169 && b == 254)           // 169.254.0.0/16
        || a == 0 // 0.0.0.0/8
}

fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_ipv4(v4);
    }
    let first = ip.segments()[0];
    ip.is_unspecified()
        || ip.is_loopback()
        || (first & 0xfe00) == 0xfc00 // fc00::/7 unique local
        || (first & 0xffc0) == 0xfe80 // fe80::/10 link local
}

fn host_matches_trusted(host: &str, trusted: &str) -> bool {
    let host = host.trim_end_matches('.');
    let trusted = trusted.trim().trim_end_matches('.');
    if trusted.is_empty() {
        return false;
    }
    if host.eq_ignore_ascii_case(trusted) {
        return true;
    }
    if host.len() <= trusted.len() + 1 {
        return false;
    }
    let boundary = host.len() - trusted.len() - 1;
    host.as_bytes().get(boundary) == Some(&b'.')
        && host
            .get(boundary + 1..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(trusted))
}
