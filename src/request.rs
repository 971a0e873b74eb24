// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Query name parsing.
//!
//! A query name inside a cluster zone takes one of these shapes (labels left of
//! the zone, leftmost first):
//!
//! ```text
//! _<port>._<proto>.<service>.<namespace>.svc      SRV
//! <endpoint>.<service>.<namespace>.svc            headless endpoint
//! <endpoint>.<cluster>.<service>.<namespace>.svc  endpoint in a multi-cluster zone
//! <service>.<namespace>.svc                       service
//! <ip-dashed>.<namespace>.pod                     pod
//! <namespace>.svc | <namespace>.pod               namespace (NODATA)
//! svc | pod | (empty)                             zone level (NODATA)
//! ```
//!
//! Anything else fails with [`ResolveError::ParseError`].

use crate::config::fqdn;
use crate::constants::{IPV4_REVERSE_SUFFIX, IPV6_REVERSE_SUFFIX, POD, SVC};
use crate::errors::ResolveError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// What a query name asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Service,
    Pod,
}

impl RequestKind {
    /// The schema label (`svc` or `pod`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Service => SVC,
            Self::Pod => POD,
        }
    }
}

/// A query name decomposed against the cluster schema.
///
/// Fields the name does not carry are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// `None` for zone-level names.
    pub kind: Option<RequestKind>,
    pub namespace: String,
    /// Service name, or the dashed IP of a pod query.
    pub service: String,
    pub endpoint: String,
    pub cluster: String,
    /// SRV port name, without the leading underscore.
    pub port: String,
    /// SRV protocol, without the leading underscore.
    pub protocol: String,
}

impl Request {
    /// The kind label, or empty for zone-level names.
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        self.kind.map_or("", RequestKind::as_str)
    }
}

/// Parse `name` (absolute) inside `zone` (absolute).
///
/// In a multi-cluster zone two labels before the service name are read as
/// `<endpoint>.<cluster>` unless both start with `_`.
///
/// # Errors
///
/// Returns [`ResolveError::ParseError`] if the name does not fit the schema, and
/// [`ResolveError::NotAuthoritative`] if it is not inside `zone`.
pub fn parse_request(name: &str, zone: &str, multicluster: bool) -> Result<Request, ResolveError> {
    let name = fqdn(name);
    let base = trim_zone(&name, &fqdn(zone)).ok_or_else(|| ResolveError::NotAuthoritative(name.clone()))?;

    let mut request = Request::default();
    if base.is_empty() || base == SVC || base == POD {
        return Ok(request);
    }

    let mut segs: Vec<&str> = base.split('.').collect();

    let kind = match segs.pop() {
        Some(SVC) => RequestKind::Service,
        Some(POD) => RequestKind::Pod,
        _ => return Err(ResolveError::ParseError),
    };
    request.kind = Some(kind);

    let Some(namespace) = segs.pop() else {
        return Ok(request);
    };
    request.namespace = namespace.to_string();

    let Some(service) = segs.pop() else {
        return Ok(request);
    };
    request.service = service.to_string();

    match segs.as_slice() {
        [] => {}
        [endpoint] => request.endpoint = (*endpoint).to_string(),
        [first, second] => {
            let srv = first.starts_with('_') && second.starts_with('_');
            if multicluster && !srv {
                request.endpoint = (*first).to_string();
                request.cluster = (*second).to_string();
            } else {
                request.port = strip_underscore(first).to_string();
                request.protocol = strip_underscore(second).to_string();
            }
        }
        _ => return Err(ResolveError::ParseError),
    }

    Ok(request)
}

/// Labels of `name` left of `zone`, without the joining dot.
///
/// Returns `None` when `name` is not `zone` or a subdomain of it.
#[must_use]
pub fn trim_zone(name: &str, zone: &str) -> Option<String> {
    if name == zone {
        return Some(String::new());
    }
    if zone == "." {
        return Some(name.trim_end_matches('.').to_string());
    }
    name.strip_suffix(zone)
        .and_then(|rest| rest.strip_suffix('.'))
        .map(str::to_string)
}

/// Whether `name` is `zone` or below it. Both must be absolute and lowercase.
#[must_use]
pub fn is_subdomain(name: &str, zone: &str) -> bool {
    trim_zone(name, zone).is_some()
}

/// The longest zone containing `name`.
#[must_use]
pub fn find_zone<'a>(name: &str, zones: &'a [String]) -> Option<&'a str> {
    zones
        .iter()
        .filter(|zone| is_subdomain(name, zone))
        .max_by_key(|zone| zone.len())
        .map(String::as_str)
}

fn strip_underscore(label: &str) -> &str {
    label.strip_prefix('_').unwrap_or(label)
}

/// Decode the IP encoded in the leftmost label of a pod query.
///
/// `10-240-0-1` reads as IPv4; anything else has its dashes read as colons.
#[must_use]
pub fn pod_ip_from_label(label: &str) -> String {
    if label.matches('-').count() == 3 && !label.contains("--") {
        label.replace('-', ".")
    } else {
        label.replace('-', ":")
    }
}

/// Render an IP as a single DNS label by replacing separators with dashes.
#[must_use]
pub fn dashed_ip(ip: &str) -> String {
    ip.replace(['.', ':'], "-")
}

/// Whether `name` sits in a reverse zone.
#[must_use]
pub fn is_reverse_name(name: &str) -> bool {
    let name = fqdn(name);
    name.ends_with(IPV4_REVERSE_SUFFIX) || name.ends_with(IPV6_REVERSE_SUFFIX)
}

/// Extract the address from a complete reverse name.
///
/// Returns `None` for names that are not a full `in-addr.arpa.` (four octets) or
/// `ip6.arpa.` (32 nibbles) address.
#[must_use]
pub fn extract_reverse_ip(name: &str) -> Option<IpAddr> {
    let name = fqdn(name);
    if let Some(labels) = name.strip_suffix(IPV4_REVERSE_SUFFIX) {
        let mut octets: Vec<u8> = labels
            .split('.')
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        if octets.len() != 4 {
            return None;
        }
        octets.reverse();
        return Some(IpAddr::V4(Ipv4Addr::new(
            octets[0], octets[1], octets[2], octets[3],
        )));
    }

    if let Some(labels) = name.strip_suffix(IPV6_REVERSE_SUFFIX) {
        let nibbles: Vec<&str> = labels.split('.').collect();
        if nibbles.len() != 32 || nibbles.iter().any(|n| n.len() != 1) {
            return None;
        }
        let hex: String = nibbles.iter().rev().copied().collect();
        let value = u128::from_str_radix(&hex, 16).ok()?;
        return Some(IpAddr::V6(Ipv6Addr::from(value)));
    }

    None
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod request_tests;
