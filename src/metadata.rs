// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-query metadata labels.
//!
//! Every query publishes the decomposed request under `kubernetes/*` keys so that
//! later stages (logging, policy) can act on it without re-parsing the name.

use crate::constants::{
    METADATA_CLIENT_LABEL_PREFIX, METADATA_CLIENT_NAMESPACE, METADATA_CLIENT_POD_NAME,
    METADATA_CLUSTER, METADATA_ENDPOINT, METADATA_KIND, METADATA_NAMESPACE,
    METADATA_PARSE_ERROR, METADATA_PORT_NAME, METADATA_PROTOCOL, METADATA_SERVICE,
};
use crate::request::parse_request;
use crate::resolver::Resolver;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Mutable state carried through a single query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    metadata: BTreeMap<String, String>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata label, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// All labels published so far.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Publish the metadata for a query of `name` from `client`.
///
/// Client pod labels are published whenever pods are verified and the client
/// address belongs to a pod. Request labels are published only for names inside
/// a configured zone; a name that does not parse sets only
/// `kubernetes/parse-error`.
pub fn publish(resolver: &Resolver, ctx: &mut RequestContext, name: &str, client: IpAddr) {
    if let Some(pod) = resolver.pod_with_ip(client) {
        ctx.set(METADATA_CLIENT_NAMESPACE, pod.namespace.as_str());
        ctx.set(METADATA_CLIENT_POD_NAME, pod.name.as_str());
        for (key, value) in &pod.labels {
            ctx.set(format!("{METADATA_CLIENT_LABEL_PREFIX}{key}"), value.as_str());
        }
    }

    let Some(zone) = resolver.matching_zone(name) else {
        return;
    };
    let multicluster = resolver.is_multicluster_zone(zone);

    let request = match parse_request(name, zone, multicluster) {
        Ok(request) => request,
        Err(e) => {
            if let Some(value) = e.metadata_value() {
                ctx.set(METADATA_PARSE_ERROR, value);
            }
            return;
        }
    };

    ctx.set(METADATA_KIND, request.kind_str());
    ctx.set(METADATA_NAMESPACE, request.namespace);
    ctx.set(METADATA_SERVICE, request.service);
    ctx.set(METADATA_ENDPOINT, request.endpoint);
    ctx.set(METADATA_PORT_NAME, request.port);
    ctx.set(METADATA_PROTOCOL, request.protocol);
    if multicluster {
        ctx.set(METADATA_CLUSTER, request.cluster);
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod metadata_tests;
