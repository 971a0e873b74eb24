// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource record synthesis.
//!
//! Converts resolver [`Item`]s into hickory [`Record`]s for each supported query
//! type. The zone-level SOA and NS records are synthesized here as well.

use crate::constants::{
    HOSTMASTER_LABEL, MAX_CNAME_CHAIN, NS_LABEL_PREFIX, SOA_EXPIRE_SECS, SOA_MAX_TTL_SECS,
    SOA_REFRESH_SECS, SOA_RETRY_SECS, SRV_PRIORITY, SRV_WEIGHT,
};
use crate::errors::HandlerError;
use crate::request::is_subdomain;
use crate::resolver::{Item, Resolver, Target};
use hickory_proto::rr::rdata::{self, SOA};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;

/// Records for the answer and additional sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answer {
    pub answers: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl From<Vec<Record>> for Answer {
    fn from(answers: Vec<Record>) -> Self {
        Self {
            answers,
            additionals: Vec::new(),
        }
    }
}

/// Answer `name` (absolute, lowercase) of type `qtype` inside `zone`.
///
/// Types without data of their own are checked with an A lookup so that an
/// existing name answers NODATA and a missing one fails with a name error.
///
/// # Errors
///
/// Returns [`HandlerError::Resolve`] when the lookup fails and
/// [`HandlerError::Proto`] if a synthesized name is invalid.
pub fn answer(
    resolver: &Resolver,
    name: &str,
    zone: &str,
    qtype: RecordType,
) -> Result<Answer, HandlerError> {
    let answer = match qtype {
        RecordType::A | RecordType::AAAA => address(resolver, name, zone, qtype, &[])?.into(),
        RecordType::TXT => txt(resolver, name, zone)?.into(),
        RecordType::SRV => srv(resolver, name, zone)?,
        RecordType::PTR => ptr(resolver, name, zone)?.into(),
        RecordType::CNAME => cname(resolver, name, zone)?.into(),
        RecordType::SOA if name == zone => vec![soa(resolver, zone)?].into(),
        RecordType::SOA => Answer::default(),
        RecordType::NS if name == zone => vec![ns(resolver, zone)?].into(),
        _ => {
            address(resolver, name, zone, RecordType::A, &[])?;
            Answer::default()
        }
    };
    Ok(answer)
}

/// The SOA record for `zone`.
///
/// # Errors
///
/// Returns [`HandlerError::Proto`] if the zone is not a valid name.
pub fn soa(resolver: &Resolver, zone: &str) -> Result<Record, HandlerError> {
    let ttl = resolver.ttl().min(SOA_MAX_TTL_SECS);
    let soa = SOA::new(
        to_name(&format!("{NS_LABEL_PREFIX}{zone}"))?,
        to_name(&format!("{HOSTMASTER_LABEL}{zone}"))?,
        resolver.serial(zone),
        SOA_REFRESH_SECS,
        SOA_RETRY_SECS,
        SOA_EXPIRE_SECS,
        resolver.ttl(),
    );
    Ok(record(to_name(zone)?, ttl, RData::SOA(soa)))
}

/// The NS record for the apex of `zone`.
///
/// # Errors
///
/// Returns [`HandlerError::Proto`] if the zone is not a valid name.
pub fn ns(resolver: &Resolver, zone: &str) -> Result<Record, HandlerError> {
    let target = to_name(&format!("{NS_LABEL_PREFIX}{zone}"))?;
    Ok(record(to_name(zone)?, resolver.ttl(), RData::NS(rdata::NS(target))))
}

/// A or AAAA records for `name`, following aliases that stay inside `zone`.
///
/// `chain` holds the CNAMEs already followed; an alias already on it is skipped.
fn address(
    resolver: &Resolver,
    name: &str,
    zone: &str,
    qtype: RecordType,
    chain: &[Record],
) -> Result<Vec<Record>, HandlerError> {
    let items = resolver.services(name, zone, qtype)?;
    let owner = to_name(name)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for item in &items {
        match &item.target {
            Target::Ip(ip) => {
                if !seen.insert(*ip) {
                    continue;
                }
                if let Some(rdata) = address_rdata(*ip, qtype) {
                    records.push(record(owner.clone(), item.ttl, rdata));
                }
            }
            Target::Name(target) => {
                if chain.len() >= MAX_CNAME_CHAIN {
                    continue;
                }
                let alias = record(
                    owner.clone(),
                    item.ttl,
                    RData::CNAME(rdata::CNAME(to_name(target)?)),
                );
                if chain.contains(&alias) {
                    continue;
                }
                if !is_subdomain(target, zone) {
                    records.push(alias);
                    continue;
                }

                let mut next_chain = chain.to_vec();
                next_chain.push(alias.clone());
                if let Ok(next) = address(resolver, target, zone, qtype, &next_chain) {
                    if !next.is_empty() {
                        records.push(alias);
                        records.extend(next);
                    }
                }
            }
            Target::Text(_) => {}
        }
    }
    Ok(records)
}

fn address_rdata(ip: IpAddr, qtype: RecordType) -> Option<RData> {
    match (ip, qtype) {
        (IpAddr::V4(v4), RecordType::A) => Some(RData::A(v4.into())),
        (IpAddr::V6(v6), RecordType::AAAA) => Some(RData::AAAA(v6.into())),
        _ => None,
    }
}

/// SRV records pointing at each item's owner, with address glue.
fn srv(resolver: &Resolver, name: &str, zone: &str) -> Result<Answer, HandlerError> {
    let items = resolver.services(name, zone, RecordType::SRV)?;
    let owner = to_name(name)?;

    let mut answer = Answer::default();
    let mut seen_srv = HashSet::new();
    let mut seen_glue = HashSet::new();
    for Item {
        target,
        port,
        owner: target_owner,
        ttl,
    } in &items
    {
        let (Target::Ip(ip), Some(port)) = (target, port) else {
            continue;
        };
        let target_name = to_name(target_owner)?;

        if seen_srv.insert((target_owner.clone(), *port)) {
            let srv = rdata::SRV::new(SRV_PRIORITY, SRV_WEIGHT, *port, target_name.clone());
            answer.answers.push(record(owner.clone(), *ttl, RData::SRV(srv)));
        }

        if seen_glue.insert((target_owner.clone(), *ip)) {
            let glue = match ip {
                IpAddr::V4(v4) => RData::A((*v4).into()),
                IpAddr::V6(v6) => RData::AAAA((*v6).into()),
            };
            answer.additionals.push(record(target_name, *ttl, glue));
        }
    }
    Ok(answer)
}

fn ptr(resolver: &Resolver, name: &str, zone: &str) -> Result<Vec<Record>, HandlerError> {
    let items = resolver.reverse(name, zone)?;
    let owner = to_name(name)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for item in &items {
        if let Target::Name(target) = &item.target {
            if seen.insert(target.clone()) {
                records.push(record(
                    owner.clone(),
                    item.ttl,
                    RData::PTR(rdata::PTR(to_name(target)?)),
                ));
            }
        }
    }
    Ok(records)
}

fn txt(resolver: &Resolver, name: &str, zone: &str) -> Result<Vec<Record>, HandlerError> {
    let owner = to_name(name)?;
    Ok(resolver
        .services(name, zone, RecordType::TXT)?
        .into_iter()
        .filter_map(|item| match item.target {
            Target::Text(text) => Some(record(
                owner.clone(),
                item.ttl,
                RData::TXT(rdata::TXT::new(vec![text])),
            )),
            _ => None,
        })
        .collect())
}

fn cname(resolver: &Resolver, name: &str, zone: &str) -> Result<Vec<Record>, HandlerError> {
    let owner = to_name(name)?;
    let mut records = Vec::new();
    for item in resolver.services(name, zone, RecordType::CNAME)? {
        if let Target::Name(target) = &item.target {
            records.push(record(
                owner.clone(),
                item.ttl,
                RData::CNAME(rdata::CNAME(to_name(target)?)),
            ));
        }
    }
    Ok(records)
}

fn record(name: Name, ttl: u32, rdata: RData) -> Record {
    let mut record = Record::from_rdata(name, ttl, rdata);
    record.set_dns_class(DNSClass::IN);
    record
}

/// Parse an absolute name.
///
/// # Errors
///
/// Returns [`HandlerError::Proto`] if `name` is not a valid domain name.
pub fn to_name(name: &str) -> Result<Name, HandlerError> {
    Ok(Name::from_str(name)?)
}

#[cfg(test)]
#[path = "answer_tests.rs"]
mod answer_tests;
