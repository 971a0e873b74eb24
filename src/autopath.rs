// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Server-side search path completion.
//!
//! A pod resolving `foo` with the usual `ndots:5` configuration first asks for
//! `foo.<ns>.svc.<zone>`, then `foo.svc.<zone>`, and so on. When the client is a
//! known pod we walk that list on its behalf and answer the first query with a
//! CNAME from the name it asked for to the name that resolved.
//!
//! The walk only applies when pods are verified, the client address belongs to a
//! pod and an autopath host search list is configured.

use crate::errors::HandlerError;
use crate::request::{is_subdomain, trim_zone};
use crate::resolver::Resolver;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{rdata, DNSClass, Name, RData, Record};
use std::net::IpAddr;
use tracing::debug;

/// The search path of the pod at `client`, or empty when autopath does not apply.
///
/// `[<ns>.svc.<zone>, svc.<zone>, <zone>, <host search...>, ""]`; the trailing
/// empty entry stands for the bare name.
#[must_use]
pub fn search_path(resolver: &Resolver, client: IpAddr) -> Vec<String> {
    let Some(host_search) = resolver.autopath_search() else {
        return Vec::new();
    };
    let Some(pod) = resolver.pod_with_ip(client) else {
        return Vec::new();
    };

    let zone = resolver.primary_zone();
    let mut search = vec![
        format!("{}.svc.{zone}", pod.namespace),
        format!("svc.{zone}"),
        zone.to_string(),
    ];
    search.extend(host_search.iter().cloned());
    search.push(String::new());
    search
}

/// Names to try for `name`, in order.
///
/// Empty unless `name` lies under the first search domain, which is the domain
/// the client appended. `zones` restricts candidates to names we can answer.
#[must_use]
pub fn candidates(name: &str, search: &[String], zones: &[String]) -> Vec<String> {
    let Some(first) = search.first() else {
        return Vec::new();
    };
    let Some(base) = trim_zone(name, first) else {
        return Vec::new();
    };
    if base.is_empty() {
        return Vec::new();
    }

    search
        .iter()
        .map(|domain| {
            if domain.is_empty() {
                format!("{base}.")
            } else {
                format!("{base}.{domain}")
            }
        })
        .filter(|candidate| zones.iter().any(|zone| is_subdomain(candidate, zone)))
        .collect()
}

/// Try each candidate with `lookup` and return the first answer that is not NXDOMAIN.
///
/// The winning reply is rewritten by [`cnamer`] so it answers `original`. When
/// every candidate fails the first reply is returned unchanged. Returns `None`
/// if there were no candidates.
///
/// # Errors
///
/// Returns the first error from `lookup`.
pub fn walk<F>(
    original: &Name,
    candidates: &[String],
    mut lookup: F,
) -> Result<Option<Message>, HandlerError>
where
    F: FnMut(&str) -> Result<Message, HandlerError>,
{
    let mut first_reply = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let mut reply = lookup(candidate)?;
        if reply.response_code() == ResponseCode::NXDomain {
            if i == 0 {
                first_reply = Some(reply);
            }
            continue;
        }
        debug!(original = %original, candidate = %candidate, "Autopath matched");
        cnamer(&mut reply, original);
        return Ok(Some(reply));
    }
    Ok(first_reply)
}

/// Point `original` at the owner of the first answer and restore the question.
///
/// No alias is added when the answer already lives at `original`.
pub fn cnamer(reply: &mut Message, original: &Name) {
    if let Some(first) = reply
        .answers()
        .first()
        .filter(|first| first.name() != original)
    {
        let mut alias = Record::from_rdata(
            original.clone(),
            first.ttl(),
            RData::CNAME(rdata::CNAME(first.name().clone())),
        );
        alias.set_dns_class(DNSClass::IN);

        let mut answers = vec![alias];
        answers.extend(reply.take_answers());
        reply.insert_answers(answers);
    }

    let queries: Vec<_> = reply
        .take_queries()
        .into_iter()
        .map(|mut query| {
            query.set_name(original.clone());
            query
        })
        .collect();
    reply.add_queries(queries);
}

#[cfg(test)]
#[path = "autopath_tests.rs"]
mod autopath_tests;
