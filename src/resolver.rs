// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Query resolution against the cluster indexes.
//!
//! [`Resolver`] turns a query name into a list of [`Item`]s: an address, alias or
//! text payload plus the owner name and port it was found under. Turning items
//! into resource records is left to [`crate::answer`].
//!
//! Lookups never block: every read goes through [`ClusterState`], which answers
//! from in-memory indexes.

use crate::config::{fqdn, Config, PodMode};
use crate::constants::{DNS_SCHEMA_VERSION, DNS_SCHEMA_VERSION_NAME, DNS_SCHEMA_VERSION_TTL_SECS};
use crate::controller::{ClusterState, ModifiedMode};
use crate::errors::ResolveError;
use crate::object::{
    index_key, EndpointAddress, EndpointPort, Pod, ServiceImportType, ServicePort, ServiceType,
};
use crate::request::{
    dashed_ip, extract_reverse_ip, find_zone, is_reverse_name, parse_request, pod_ip_from_label,
    trim_zone, Request, RequestKind,
};
use hickory_proto::rr::RecordType;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// What an [`Item`] points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An address, answered as A or AAAA.
    Ip(IpAddr),
    /// A domain name: an alias for forward lookups, the pointee for PTR.
    Name(String),
    /// A TXT payload.
    Text(String),
}

/// One lookup result, before it becomes a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub target: Target,
    /// Port for SRV answers, when the source declares one.
    pub port: Option<u16>,
    /// Absolute name this item lives at; the SRV target for IP-backed items.
    pub owner: String,
    pub ttl: u32,
}

impl Item {
    fn ip(host: &str, port: Option<u16>, owner: String, ttl: u32) -> Option<Self> {
        let ip = host.parse().ok()?;
        Some(Self {
            target: Target::Ip(ip),
            port,
            owner,
            ttl,
        })
    }
}

/// Resolver over the cluster indexes.
pub struct Resolver {
    state: Arc<dyn ClusterState>,
    zones: Vec<String>,
    multicluster_zones: Vec<String>,
    primary_zone: String,
    ttl: u32,
    pod_mode: PodMode,
    endpoint_pod_names: bool,
    ignore_empty_service: bool,
    namespaces: BTreeSet<String>,
    namespace_label_filter: bool,
    autopath_search: Option<Vec<String>>,
}

impl Resolver {
    /// Build a resolver from configuration.
    #[must_use]
    pub fn new(config: &Config, state: Arc<dyn ClusterState>) -> Self {
        Self {
            state,
            zones: config.zones.iter().map(|z| fqdn(z)).collect(),
            multicluster_zones: config.multicluster_zones.iter().map(|z| fqdn(z)).collect(),
            primary_zone: fqdn(config.primary_zone()),
            ttl: config.ttl,
            pod_mode: config.pod_mode,
            endpoint_pod_names: config.endpoint_pod_names,
            ignore_empty_service: config.ignore_empty_service,
            namespaces: config.namespace_set(),
            namespace_label_filter: config.namespace_label_selector.is_some(),
            autopath_search: config.autopath.clone(),
        }
    }

    /// Configured zones.
    #[must_use]
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// Zone used for PTR targets.
    #[must_use]
    pub fn primary_zone(&self) -> &str {
        &self.primary_zone
    }

    /// TTL applied to synthesized records.
    #[must_use]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Pod query mode.
    #[must_use]
    pub fn pod_mode(&self) -> PodMode {
        self.pod_mode
    }

    /// Extra search domains for autopath, when enabled.
    #[must_use]
    pub fn autopath_search(&self) -> Option<&[String]> {
        self.autopath_search.as_deref()
    }

    /// The cluster state this resolver reads.
    #[must_use]
    pub fn state(&self) -> &dyn ClusterState {
        self.state.as_ref()
    }

    /// The longest configured zone containing `name`.
    #[must_use]
    pub fn matching_zone(&self, name: &str) -> Option<&str> {
        find_zone(name, &self.zones)
    }

    /// Whether `zone` is answered from service imports.
    #[must_use]
    pub fn is_multicluster_zone(&self, zone: &str) -> bool {
        self.multicluster_zones.iter().any(|z| z == zone)
    }

    /// Whether records in `namespace` may be served.
    ///
    /// The namespace must be in the configured list (if any) and, when a
    /// namespace label selector is set, present in the filtered namespace store.
    #[must_use]
    pub fn namespace_exposed(&self, namespace: &str) -> bool {
        if !self.namespaces.is_empty() && !self.namespaces.contains(namespace) {
            return false;
        }
        if self.namespace_label_filter {
            return self.state.namespace(namespace).is_some();
        }
        true
    }

    /// SOA serial for `zone`.
    #[must_use]
    pub fn serial(&self, zone: &str) -> u32 {
        let modified = if self.is_multicluster_zone(zone) {
            self.state.modified(ModifiedMode::MultiCluster)
        } else {
            self.state
                .modified(ModifiedMode::Internal)
                .max(self.state.modified(ModifiedMode::External))
        };
        u32::try_from(modified.max(0)).unwrap_or(u32::MAX)
    }

    /// The first pod owning `ip`, when pods are verified.
    #[must_use]
    pub fn pod_with_ip(&self, ip: IpAddr) -> Option<Arc<Pod>> {
        if self.pod_mode != PodMode::Verified {
            return None;
        }
        self.state.pods_by_ip(&ip.to_string()).into_iter().next()
    }

    /// Items for a forward query of type `qtype`.
    ///
    /// TXT answers only the schema version record; SRV drops alias items.
    ///
    /// # Errors
    ///
    /// Returns a name error when nothing matches, see [`ResolveError::is_name_error`].
    pub fn services(&self, name: &str, zone: &str, qtype: RecordType) -> Result<Vec<Item>, ResolveError> {
        match qtype {
            RecordType::TXT => {
                let base = trim_zone(name, zone).unwrap_or_default();
                if base == DNS_SCHEMA_VERSION_NAME {
                    return Ok(vec![Item {
                        target: Target::Text(DNS_SCHEMA_VERSION.to_string()),
                        port: None,
                        owner: name.to_string(),
                        ttl: DNS_SCHEMA_VERSION_TTL_SECS,
                    }]);
                }
                // Another type exists at this name: NODATA.
                match self.records(name, zone) {
                    Ok(items) if !items.is_empty() => Ok(Vec::new()),
                    _ => Err(ResolveError::NoItems),
                }
            }
            RecordType::SRV => Ok(self
                .records(name, zone)?
                .into_iter()
                .filter(|item| !matches!(item.target, Target::Name(_)))
                .collect()),
            _ => self.records(name, zone),
        }
    }

    /// Items for a forward name.
    ///
    /// An empty list with `Ok` means the name exists without data (NODATA).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ParseError`] for names outside the schema and
    /// [`ResolveError::NoItems`] when nothing matches.
    pub fn records(&self, name: &str, zone: &str) -> Result<Vec<Item>, ResolveError> {
        let multicluster = self.is_multicluster_zone(zone);
        let request = parse_request(name, zone, multicluster)?;

        let Some(kind) = request.kind else {
            return Ok(Vec::new());
        };
        if is_reverse_name(name) {
            return Err(ResolveError::NoItems);
        }
        if !self.namespace_exposed(&request.namespace) {
            return Err(ResolveError::NoItems);
        }

        match kind {
            RequestKind::Pod => self.find_pods(&request, zone),
            RequestKind::Service if multicluster => self.find_multicluster_services(&request, zone),
            RequestKind::Service => self.find_services(&request, zone),
        }
    }

    /// Items for a reverse name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoItems`] when no service or named endpoint owns the address.
    pub fn reverse(&self, name: &str, zone: &str) -> Result<Vec<Item>, ResolveError> {
        let Some(ip) = extract_reverse_ip(name) else {
            return self.records(name, zone).map(|_| Vec::new());
        };
        let items = self.service_record_for_ip(&ip.to_string());
        if items.is_empty() {
            return Err(ResolveError::NoItems);
        }
        Ok(items)
    }

    fn service_record_for_ip(&self, ip: &str) -> Vec<Item> {
        // Cluster IPs take precedence over external IPs
        if let Some(svc) = self
            .state
            .services_by_ip(ip)
            .into_iter()
            .chain(self.state.services_by_external_ip(ip))
            .find(|svc| self.namespace_exposed(&svc.namespace))
        {
            return vec![Item {
                target: Target::Name(format!(
                    "{}.{}.svc.{}",
                    svc.name, svc.namespace, self.primary_zone
                )),
                port: None,
                owner: String::new(),
                ttl: self.ttl,
            }];
        }

        let mut items = Vec::new();
        for ep in self.state.endpoints_by_ip(ip) {
            if !self.namespace_exposed(&ep.namespace) {
                continue;
            }
            for subset in &ep.subsets {
                for addr in &subset.addresses {
                    if addr.ip == ip && !addr.hostname.is_empty() {
                        items.push(Item {
                            target: Target::Name(format!(
                                "{}.{}.svc.{}",
                                addr.hostname, ep.index, self.primary_zone
                            )),
                            port: None,
                            owner: String::new(),
                            ttl: self.ttl,
                        });
                    }
                }
            }
        }
        items
    }

    fn find_pods(&self, request: &Request, zone: &str) -> Result<Vec<Item>, ResolveError> {
        if self.pod_mode == PodMode::Disabled {
            return Err(ResolveError::NoItems);
        }
        if request.service.is_empty() {
            return Ok(Vec::new());
        }

        let ip: IpAddr = pod_ip_from_label(&request.service)
            .parse()
            .map_err(|_| ResolveError::NoItems)?;
        let owner = format!("{}.{}.pod.{zone}", request.service, request.namespace);

        if self.pod_mode == PodMode::Insecure {
            return Ok(vec![Item {
                target: Target::Ip(ip),
                port: None,
                owner,
                ttl: self.ttl,
            }]);
        }

        let items: Vec<Item> = self
            .state
            .pods_by_ip(&ip.to_string())
            .iter()
            .filter(|pod| pod.namespace == request.namespace && !pod.deleting)
            .map(|_| Item {
                target: Target::Ip(ip),
                port: None,
                owner: owner.clone(),
                ttl: self.ttl,
            })
            .collect();
        if items.is_empty() {
            debug!(ip = %ip, namespace = %request.namespace, "No verified pod for query");
            return Err(ResolveError::NoItems);
        }
        Ok(items)
    }

    fn find_services(&self, request: &Request, zone: &str) -> Result<Vec<Item>, ResolveError> {
        if request.service.is_empty() {
            return Ok(Vec::new());
        }

        let index = index_key(&request.service, &request.namespace);
        let mut endpoints = None;
        let mut found = false;
        let mut items = Vec::new();

        for svc in self.state.services_by_index(&index) {
            if self.ignore_empty_service && svc.service_type == ServiceType::ClusterIp {
                let ready = self
                    .state
                    .endpoints_by_index(&svc.index)
                    .iter()
                    .any(|ep| ep.has_addresses());
                if !ready {
                    continue;
                }
            }

            let service_owner = format!("{}.{}.svc.{zone}", svc.name, svc.namespace);

            if svc.service_type == ServiceType::ExternalName {
                if !request.endpoint.is_empty() || svc.external_name.is_empty() {
                    continue;
                }
                found = true;
                items.push(Item {
                    target: Target::Name(fqdn(&svc.external_name)),
                    port: None,
                    owner: service_owner,
                    ttl: self.ttl,
                });
                continue;
            }

            if svc.headless() || !request.endpoint.is_empty() {
                let endpoints =
                    endpoints.get_or_insert_with(|| self.state.endpoints_by_index(&index));
                for ep in endpoints.iter().filter(|ep| ep.index == svc.index) {
                    for subset in &ep.subsets {
                        for addr in &subset.addresses {
                            let hostname = self.endpoint_hostname(addr);
                            if !request.endpoint.is_empty()
                                && !request.endpoint.eq_ignore_ascii_case(&hostname)
                            {
                                continue;
                            }
                            let owner = format!("{hostname}.{service_owner}");
                            for (name, protocol, port) in endpoint_ports(&subset.ports) {
                                if !port_matches(request, name, protocol) {
                                    continue;
                                }
                                found = true;
                                items.extend(Item::ip(&addr.ip, port, owner.clone(), self.ttl));
                            }
                        }
                    }
                }
                continue;
            }

            for (name, protocol, port) in service_ports(&svc.ports) {
                if !port_matches(request, name, protocol) {
                    continue;
                }
                found = true;
                for ip in &svc.cluster_ips {
                    items.extend(Item::ip(ip, port, service_owner.clone(), self.ttl));
                }
            }
        }

        if found {
            Ok(items)
        } else {
            Err(ResolveError::NoItems)
        }
    }

    fn find_multicluster_services(
        &self,
        request: &Request,
        zone: &str,
    ) -> Result<Vec<Item>, ResolveError> {
        if request.service.is_empty() {
            return Ok(Vec::new());
        }

        let index = index_key(&request.service, &request.namespace);
        let mut endpoints = None;
        let mut found = false;
        let mut items = Vec::new();

        for import in self.state.service_imports_by_index(&index) {
            let service_owner = format!("{}.{}.svc.{zone}", import.name, import.namespace);

            if import.import_type == ServiceImportType::Headless || !request.endpoint.is_empty() {
                let endpoints = endpoints
                    .get_or_insert_with(|| self.state.multicluster_endpoints_by_index(&index));
                for mc in endpoints.iter().filter(|mc| mc.endpoints.index == import.index) {
                    if !request.cluster.is_empty()
                        && !request.cluster.eq_ignore_ascii_case(&mc.cluster_id)
                    {
                        continue;
                    }
                    for subset in &mc.endpoints.subsets {
                        for addr in &subset.addresses {
                            let hostname = self.endpoint_hostname(addr);
                            if !request.endpoint.is_empty()
                                && !request.endpoint.eq_ignore_ascii_case(&hostname)
                            {
                                continue;
                            }
                            let owner = format!("{hostname}.{}.{service_owner}", mc.cluster_id);
                            for (name, protocol, port) in endpoint_ports(&subset.ports) {
                                if !port_matches(request, name, protocol) {
                                    continue;
                                }
                                found = true;
                                items.extend(Item::ip(&addr.ip, port, owner.clone(), self.ttl));
                            }
                        }
                    }
                }
                continue;
            }

            for (name, protocol, port) in service_ports(&import.ports) {
                if !port_matches(request, name, protocol) {
                    continue;
                }
                found = true;
                for ip in &import.cluster_ips {
                    items.extend(Item::ip(ip, port, service_owner.clone(), self.ttl));
                }
            }
        }

        if found {
            Ok(items)
        } else {
            Err(ResolveError::NoItems)
        }
    }

    /// The DNS label an endpoint address answers under.
    ///
    /// Its hostname, else its pod name when endpoint pod names are enabled, else
    /// its IP with separators replaced by dashes.
    #[must_use]
    pub fn endpoint_hostname(&self, addr: &EndpointAddress) -> String {
        if !addr.hostname.is_empty() {
            return addr.hostname.clone();
        }
        if self.endpoint_pod_names && !addr.target_ref_name.is_empty() {
            return addr.target_ref_name.clone();
        }
        dashed_ip(&addr.ip)
    }
}

/// An empty, `*` or `any` request label matches anything.
fn label_matches(requested: &str, actual: &str) -> bool {
    requested.is_empty()
        || requested == "*"
        || requested == "any"
        || requested.eq_ignore_ascii_case(actual)
}

fn port_matches(request: &Request, name: &str, protocol: &str) -> bool {
    label_matches(&request.port, name) && label_matches(&request.protocol, protocol)
}

/// `(name, protocol, port)` for each port, or a single portless entry when none are declared.
fn service_ports(ports: &[ServicePort]) -> Vec<(&str, &str, Option<u16>)> {
    if ports.is_empty() {
        return vec![("", "", None)];
    }
    ports
        .iter()
        .map(|p| (p.name.as_str(), p.protocol.as_str(), u16::try_from(p.port).ok()))
        .collect()
}

fn endpoint_ports(ports: &[EndpointPort]) -> Vec<(&str, &str, Option<u16>)> {
    if ports.is_empty() {
        return vec![("", "", None)];
    }
    ports
        .iter()
        .map(|p| (p.name.as_str(), p.protocol.as_str(), u16::try_from(p.port).ok()))
        .collect()
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
