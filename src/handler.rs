// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Query handler.
//!
//! [`KubernetesHandler::serve_dns`] is the single entry point: it publishes the
//! query metadata, resolves the question against the cluster indexes and writes
//! an authoritative reply through a [`ResponseWriter`].
//!
//! Response codes:
//!
//! - `NOERROR` with records, or with only the zone SOA for NODATA
//! - `NXDOMAIN` with the zone SOA when the name does not exist
//! - `SERVFAIL` when the lookup fails, or for a missing name before the first sync
//! - `REFUSED` for names outside every zone and for zone transfers

use crate::answer::{answer, soa, to_name};
use crate::autopath;
use crate::config::fqdn;
use crate::constants::EDNS_UDP_PAYLOAD;
use crate::errors::HandlerError;
use crate::metadata::{publish, RequestContext};
use crate::metrics;
use crate::resolver::Resolver;
use hickory_proto::op::{Edns, Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::time::Instant;
use tracing::{debug, warn};

/// Destination of a reply.
pub trait ResponseWriter: Send {
    /// Address of the client that sent the query.
    fn remote_ip(&self) -> IpAddr;

    /// Send `msg` to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be encoded or sent.
    fn write_msg(&mut self, msg: Message) -> Result<(), HandlerError>;
}

/// Authoritative handler for the configured cluster zones.
pub struct KubernetesHandler {
    resolver: Resolver,
}

impl KubernetesHandler {
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Answer `req` and write the reply to `w`.
    ///
    /// Returns the response code that was written.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NoQuestion`] if the request carries no question
    /// (nothing is written), or an error from building or writing the reply.
    pub fn serve_dns(
        &self,
        ctx: &mut RequestContext,
        w: &mut dyn ResponseWriter,
        req: &Message,
    ) -> Result<ResponseCode, HandlerError> {
        let start = Instant::now();
        let query = req.queries().first().ok_or(HandlerError::NoQuestion)?;
        let qname = fqdn(&query.name().to_ascii());
        let qtype = query.query_type();
        let client = w.remote_ip();

        publish(&self.resolver, ctx, &qname, client);

        let zone = self.resolver.matching_zone(&qname).unwrap_or_default().to_string();

        let reply = if zone.is_empty() || matches!(qtype, RecordType::AXFR | RecordType::IXFR) {
            refused(req)
        } else {
            let search = autopath::search_path(&self.resolver, client);
            let candidates = autopath::candidates(&qname, &search, self.resolver.zones());
            match autopath::walk(query.name(), &candidates, |candidate| {
                self.reply(req, candidate, qtype)
            })? {
                Some(reply) => reply,
                None => self.reply(req, &qname, qtype)?,
            }
        };

        let rcode = reply.response_code();
        debug!(
            name = %qname,
            qtype = %qtype,
            client = %client,
            rcode = rcode_label(rcode),
            answers = reply.answers().len(),
            "Answered query"
        );
        w.write_msg(reply)?;
        metrics::record_request(&zone, rcode_label(rcode), start.elapsed());
        Ok(rcode)
    }

    /// Build the reply for `name` of type `qtype`, echoing the header of `req`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Proto`] if a synthesized name is invalid.
    pub fn reply(
        &self,
        req: &Message,
        name: &str,
        qtype: RecordType,
    ) -> Result<Message, HandlerError> {
        let Some(zone) = self.resolver.matching_zone(name) else {
            return Ok(refused(req));
        };
        let mut msg = response_to(req);
        if let Some(query) = req.queries().first() {
            let mut query = query.clone();
            query.set_name(to_name(name)?);
            msg.add_query(query);
        } else {
            msg.add_query(Query::query(to_name(name)?, qtype));
        }

        match answer(&self.resolver, name, zone, qtype) {
            Ok(answer) if answer.answers.is_empty() => {
                msg.set_response_code(ResponseCode::NoError);
                msg.add_name_server(soa(&self.resolver, zone)?);
            }
            Ok(answer) => {
                msg.set_response_code(ResponseCode::NoError);
                msg.insert_answers(answer.answers);
                msg.insert_additionals(answer.additionals);
            }
            Err(HandlerError::Resolve(e)) if e.is_name_error() => {
                let rcode = if self.resolver.state().has_synced() {
                    ResponseCode::NXDomain
                } else {
                    ResponseCode::ServFail
                };
                msg.set_response_code(rcode);
                msg.add_name_server(soa(&self.resolver, zone)?);
            }
            Err(e) => {
                warn!(name = %name, qtype = %qtype, error = %e, "Lookup failed");
                msg.set_response_code(ResponseCode::ServFail);
            }
        }
        Ok(msg)
    }
}

/// An empty authoritative reply carrying the header fields of `req`.
///
/// An OPT record is included only when `req` carried one.
fn response_to(req: &Message) -> Message {
    let mut msg = Message::new();
    msg.set_id(req.id())
        .set_message_type(MessageType::Response)
        .set_op_code(req.op_code())
        .set_recursion_desired(req.recursion_desired())
        .set_authoritative(true);
    if req.extensions().is_some() {
        let mut edns = Edns::new();
        edns.set_max_payload(EDNS_UDP_PAYLOAD);
        msg.set_edns(edns);
    }
    msg
}

fn refused(req: &Message) -> Message {
    let mut msg = response_to(req);
    msg.add_queries(req.queries().to_vec());
    msg.set_response_code(ResponseCode::Refused);
    msg
}

/// Mnemonic of a response code, as used in metric labels.
#[must_use]
pub fn rcode_label(rcode: ResponseCode) -> &'static str {
    match rcode {
        ResponseCode::NoError => "NOERROR",
        ResponseCode::FormErr => "FORMERR",
        ResponseCode::ServFail => "SERVFAIL",
        ResponseCode::NXDomain => "NXDOMAIN",
        ResponseCode::NotImp => "NOTIMP",
        ResponseCode::Refused => "REFUSED",
        _ => "OTHER",
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod handler_tests;
