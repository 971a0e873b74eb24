// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Stripped projections of cluster objects.
//!
//! The controller converts every watched Kubernetes object into one of the types
//! below, keeping only what DNS needs. Projections are immutable once stored and
//! are replaced wholesale on update.
//!
//! Subsets, addresses and ports are kept in canonical (sorted) order so two
//! projections can be compared positionally.

use crate::constants::{
    CLUSTER_IP_NONE, LABEL_MC_SERVICE_NAME, LABEL_MC_SOURCE_CLUSTER, LABEL_SERVICE_NAME,
    SERVICE_IMPORT_TYPE_HEADLESS, SERVICE_TYPE_EXTERNAL_NAME,
};
use crate::crd::ServiceImport as ServiceImportResource;
use crate::errors::StoreError;
use k8s_openapi::api::core::v1::{
    Namespace as NamespaceResource, Pod as PodResource, Service as ServiceResource,
};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Capabilities shared by every stored projection.
pub trait ClusterObject: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Kind name used in logs, metrics and errors.
    const KIND: &'static str;

    /// Store key: `namespace/name`, or `name` for cluster-scoped objects.
    fn key(&self) -> String;

    /// Resource version of the object this projection was built from.
    fn resource_version(&self) -> &str;

    /// Unwrap this kind from a tagged [`Object`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WrongType`] if the object holds another kind.
    fn from_object(obj: Object) -> Result<Self, StoreError>;

    /// Wrap this projection into a tagged [`Object`].
    fn into_object(self) -> Object;
}

/// Build the compound `name.namespace` index used by services and endpoints.
#[must_use]
pub fn index_key(name: &str, namespace: &str) -> String {
    format!("{name}.{namespace}")
}

/// Key of an object in its store: `namespace/name`, or `name` for cluster-scoped kinds.
#[must_use]
pub fn store_key(name: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}/{name}")
    }
}

fn meta_parts(meta: &ObjectMeta) -> (String, String, String) {
    (
        meta.name.clone().unwrap_or_default(),
        meta.namespace.clone().unwrap_or_default(),
        meta.resource_version.clone().unwrap_or_default(),
    )
}

// ============================================================================
// Service
// ============================================================================

/// How a service is exposed in DNS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    /// A virtual IP service.
    ClusterIp,
    /// No virtual IP; resolves to its endpoints.
    Headless,
    /// An alias answered with a CNAME.
    ExternalName,
}

/// A named port of a service or service import.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServicePort {
    /// Port name, may be empty.
    pub name: String,
    /// Port number.
    pub port: i32,
    /// `TCP`, `UDP` or `SCTP`.
    pub protocol: String,
}

/// Projection of a `core/v1` Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    /// `name.namespace`
    pub index: String,
    pub resource_version: String,
    pub cluster_ips: Vec<String>,
    pub external_ips: Vec<String>,
    pub external_name: String,
    pub service_type: ServiceType,
    pub ports: Vec<ServicePort>,
}

impl Service {
    /// Whether the service has no virtual IP.
    #[must_use]
    pub fn headless(&self) -> bool {
        self.service_type == ServiceType::Headless
    }

    /// Build a projection from an API object.
    #[must_use]
    pub fn from_resource(svc: &ServiceResource) -> Self {
        let (name, namespace, resource_version) = meta_parts(&svc.metadata);
        let spec = svc.spec.clone().unwrap_or_default();

        let mut cluster_ips = spec.cluster_ips.clone().unwrap_or_default();
        if cluster_ips.is_empty() {
            if let Some(ip) = spec.cluster_ip.clone() {
                cluster_ips.push(ip);
            }
        }
        cluster_ips.retain(|ip| !ip.is_empty());

        let mut external_ips = spec.external_ips.clone().unwrap_or_default();
        let ingress = svc
            .status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref());
        if let Some(ingress) = ingress {
            external_ips.extend(ingress.iter().filter_map(|i| i.ip.clone()));
        }

        let service_type = if spec.type_.as_deref() == Some(SERVICE_TYPE_EXTERNAL_NAME) {
            ServiceType::ExternalName
        } else if cluster_ips.is_empty() || cluster_ips.iter().any(|ip| ip == CLUSTER_IP_NONE) {
            ServiceType::Headless
        } else {
            ServiceType::ClusterIp
        };
        if service_type != ServiceType::ClusterIp {
            cluster_ips.clear();
        }

        let mut ports: Vec<ServicePort> = spec
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(|p| ServicePort {
                name: p.name.unwrap_or_default(),
                port: p.port,
                protocol: p.protocol.unwrap_or_else(|| "TCP".to_string()),
            })
            .collect();
        ports.sort();

        Self {
            index: index_key(&name, &namespace),
            name,
            namespace,
            resource_version,
            cluster_ips,
            external_ips,
            external_name: spec.external_name.unwrap_or_default(),
            service_type,
            ports,
        }
    }
}

impl ClusterObject for Service {
    const KIND: &'static str = "Service";

    fn key(&self) -> String {
        store_key(&self.name, &self.namespace)
    }

    fn resource_version(&self) -> &str {
        &self.resource_version
    }

    fn from_object(obj: Object) -> Result<Self, StoreError> {
        match obj {
            Object::Service(svc) => Ok(svc),
            other => Err(other.wrong_type(Self::KIND)),
        }
    }

    fn into_object(self) -> Object {
        Object::Service(self)
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// A ready member address of an endpoint set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointAddress {
    pub ip: String,
    pub hostname: String,
    pub node_name: String,
    /// Name of the pod backing this address, if any.
    pub target_ref_name: String,
}

/// A port of an endpoint set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointPort {
    pub name: String,
    pub port: i32,
    pub protocol: String,
}

/// A group of addresses sharing the same ports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointSubset {
    pub addresses: Vec<EndpointAddress>,
    pub ports: Vec<EndpointPort>,
}

/// Projection of a `discovery.k8s.io/v1` `EndpointSlice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Name of the slice.
    pub name: String,
    pub namespace: String,
    /// `service.namespace`
    pub index: String,
    pub resource_version: String,
    pub subsets: Vec<EndpointSubset>,
    /// Every member IP across subsets.
    pub index_ip: Vec<String>,
}

impl Endpoints {
    /// Build a projection from a slice, indexed under the service named by `service_label`.
    ///
    /// Returns `None` for slices without the label or with FQDN addresses.
    #[must_use]
    pub fn from_slice(slice: &EndpointSlice, service_label: &str) -> Option<Self> {
        if slice.address_type == "FQDN" {
            return None;
        }
        let (name, namespace, resource_version) = meta_parts(&slice.metadata);
        let service = slice.metadata.labels.as_ref()?.get(service_label)?.clone();

        let mut addresses = Vec::new();
        for endpoint in &slice.endpoints {
            // Unknown readiness counts as ready.
            let ready = endpoint
                .conditions
                .as_ref()
                .and_then(|c| c.ready)
                .unwrap_or(true);
            if !ready {
                continue;
            }
            for ip in &endpoint.addresses {
                addresses.push(EndpointAddress {
                    ip: ip.clone(),
                    hostname: endpoint.hostname.clone().unwrap_or_default(),
                    node_name: endpoint.node_name.clone().unwrap_or_default(),
                    target_ref_name: endpoint
                        .target_ref
                        .as_ref()
                        .and_then(|r| r.name.clone())
                        .unwrap_or_default(),
                });
            }
        }
        addresses.sort();

        let mut ports: Vec<EndpointPort> = slice
            .ports
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|p| EndpointPort {
                name: p.name.unwrap_or_default(),
                port: p.port.unwrap_or_default(),
                protocol: p.protocol.unwrap_or_else(|| "TCP".to_string()),
            })
            .collect();
        ports.sort();

        let index_ip = addresses.iter().map(|a| a.ip.clone()).collect();

        Some(Self {
            index: index_key(&service, &namespace),
            name,
            namespace,
            resource_version,
            subsets: vec![EndpointSubset { addresses, ports }],
            index_ip,
        })
    }

    /// Build a projection for a regular service slice.
    #[must_use]
    pub fn from_resource(slice: &EndpointSlice) -> Option<Self> {
        Self::from_slice(slice, LABEL_SERVICE_NAME)
    }

    /// Whether any subset carries at least one ready address.
    #[must_use]
    pub fn has_addresses(&self) -> bool {
        self.subsets.iter().any(|s| !s.addresses.is_empty())
    }

    /// Equivalent for DNS purposes: same subsets with the same addresses
    /// (IP and hostname) and the same ports, positionally.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        if self.subsets.len() != other.subsets.len() {
            return false;
        }
        self.subsets.iter().zip(&other.subsets).all(|(a, b)| {
            a.addresses.len() == b.addresses.len()
                && a.ports.len() == b.ports.len()
                && a
                    .addresses
                    .iter()
                    .zip(&b.addresses)
                    .all(|(x, y)| x.ip == y.ip && x.hostname == y.hostname)
                && a.ports.iter().zip(&b.ports).all(|(x, y)| {
                    x.name == y.name && x.port == y.port && x.protocol == y.protocol
                })
        })
    }
}

impl ClusterObject for Endpoints {
    const KIND: &'static str = "Endpoints";

    fn key(&self) -> String {
        store_key(&self.name, &self.namespace)
    }

    fn resource_version(&self) -> &str {
        &self.resource_version
    }

    fn from_object(obj: Object) -> Result<Self, StoreError> {
        match obj {
            Object::Endpoints(ep) => Ok(ep),
            other => Err(other.wrong_type(Self::KIND)),
        }
    }

    fn into_object(self) -> Object {
        Object::Endpoints(self)
    }
}

// ============================================================================
// Pod
// ============================================================================

/// Projection of a `core/v1` Pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub resource_version: String,
    pub pod_ip: String,
    pub labels: BTreeMap<String, String>,
    /// Set once the pod carries a deletion timestamp.
    pub deleting: bool,
}

impl Pod {
    /// Build a projection from an API object.
    #[must_use]
    pub fn from_resource(pod: &PodResource) -> Self {
        let (name, namespace, resource_version) = meta_parts(&pod.metadata);
        Self {
            name,
            namespace,
            resource_version,
            pod_ip: pod
                .status
                .as_ref()
                .and_then(|s| s.pod_ip.clone())
                .unwrap_or_default(),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
            deleting: pod.metadata.deletion_timestamp.is_some(),
        }
    }
}

impl ClusterObject for Pod {
    const KIND: &'static str = "Pod";

    fn key(&self) -> String {
        store_key(&self.name, &self.namespace)
    }

    fn resource_version(&self) -> &str {
        &self.resource_version
    }

    fn from_object(obj: Object) -> Result<Self, StoreError> {
        match obj {
            Object::Pod(pod) => Ok(pod),
            other => Err(other.wrong_type(Self::KIND)),
        }
    }

    fn into_object(self) -> Object {
        Object::Pod(self)
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// Projection of a `core/v1` Namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub resource_version: String,
    pub labels: BTreeMap<String, String>,
}

impl Namespace {
    /// Build a projection from an API object.
    #[must_use]
    pub fn from_resource(ns: &NamespaceResource) -> Self {
        let (name, _, resource_version) = meta_parts(&ns.metadata);
        Self {
            name,
            resource_version,
            labels: ns.metadata.labels.clone().unwrap_or_default(),
        }
    }
}

impl ClusterObject for Namespace {
    const KIND: &'static str = "Namespace";

    fn key(&self) -> String {
        self.name.clone()
    }

    fn resource_version(&self) -> &str {
        &self.resource_version
    }

    fn from_object(obj: Object) -> Result<Self, StoreError> {
        match obj {
            Object::Namespace(ns) => Ok(ns),
            other => Err(other.wrong_type(Self::KIND)),
        }
    }

    fn into_object(self) -> Object {
        Object::Namespace(self)
    }
}

// ============================================================================
// ServiceImport
// ============================================================================

/// How an imported service is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceImportType {
    ClusterSetIp,
    Headless,
}

/// Projection of a multi-cluster `ServiceImport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceImport {
    pub name: String,
    pub namespace: String,
    /// `name.namespace`
    pub index: String,
    pub resource_version: String,
    pub import_type: ServiceImportType,
    pub cluster_ips: Vec<String>,
    pub ports: Vec<ServicePort>,
}

impl ServiceImport {
    /// Build a projection from an API object.
    #[must_use]
    pub fn from_resource(import: &ServiceImportResource) -> Self {
        let (name, namespace, resource_version) = meta_parts(&import.metadata);
        let import_type = if import.spec.import_type == SERVICE_IMPORT_TYPE_HEADLESS {
            ServiceImportType::Headless
        } else {
            ServiceImportType::ClusterSetIp
        };
        let mut ports: Vec<ServicePort> = import
            .spec
            .ports
            .iter()
            .map(|p| ServicePort {
                name: p.name.clone().unwrap_or_default(),
                port: p.port,
                protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
            })
            .collect();
        ports.sort();

        Self {
            index: index_key(&name, &namespace),
            name,
            namespace,
            resource_version,
            import_type,
            cluster_ips: import.spec.ips.clone(),
            ports,
        }
    }

    /// Equivalent for DNS purposes: same type and same port triples.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.import_type == other.import_type && self.ports == other.ports
    }
}

impl ClusterObject for ServiceImport {
    const KIND: &'static str = "ServiceImport";

    fn key(&self) -> String {
        store_key(&self.name, &self.namespace)
    }

    fn resource_version(&self) -> &str {
        &self.resource_version
    }

    fn from_object(obj: Object) -> Result<Self, StoreError> {
        match obj {
            Object::ServiceImport(import) => Ok(import),
            other => Err(other.wrong_type(Self::KIND)),
        }
    }

    fn into_object(self) -> Object {
        Object::ServiceImport(self)
    }
}

// ============================================================================
// MultiClusterEndpoints
// ============================================================================

/// An endpoint set exported by a member cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiClusterEndpoints {
    pub endpoints: Endpoints,
    pub cluster_id: String,
}

impl MultiClusterEndpoints {
    /// Build a projection from a multi-cluster slice.
    ///
    /// Returns `None` unless both multi-cluster labels are present.
    #[must_use]
    pub fn from_resource(slice: &EndpointSlice) -> Option<Self> {
        let cluster_id = slice
            .metadata
            .labels
            .as_ref()?
            .get(LABEL_MC_SOURCE_CLUSTER)?
            .clone();
        let endpoints = Endpoints::from_slice(slice, LABEL_MC_SERVICE_NAME)?;
        Some(Self {
            endpoints,
            cluster_id,
        })
    }

    /// Equivalent when the endpoints are equivalent and the cluster is the same.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.cluster_id == other.cluster_id && self.endpoints.equivalent(&other.endpoints)
    }
}

impl ClusterObject for MultiClusterEndpoints {
    const KIND: &'static str = "MultiClusterEndpoints";

    fn key(&self) -> String {
        self.endpoints.key()
    }

    fn resource_version(&self) -> &str {
        &self.endpoints.resource_version
    }

    fn from_object(obj: Object) -> Result<Self, StoreError> {
        match obj {
            Object::MultiClusterEndpoints(ep) => Ok(ep),
            other => Err(other.wrong_type(Self::KIND)),
        }
    }

    fn into_object(self) -> Object {
        Object::MultiClusterEndpoints(self)
    }
}

// ============================================================================
// Tagged variant
// ============================================================================

/// Any stored projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Service(Service),
    Endpoints(Endpoints),
    Pod(Pod),
    Namespace(Namespace),
    ServiceImport(ServiceImport),
    MultiClusterEndpoints(MultiClusterEndpoints),
}

impl Object {
    /// Kind name of the wrapped projection.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Service(_) => Service::KIND,
            Self::Endpoints(_) => Endpoints::KIND,
            Self::Pod(_) => Pod::KIND,
            Self::Namespace(_) => Namespace::KIND,
            Self::ServiceImport(_) => ServiceImport::KIND,
            Self::MultiClusterEndpoints(_) => MultiClusterEndpoints::KIND,
        }
    }

    /// Store key of the wrapped projection.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Service(o) => o.key(),
            Self::Endpoints(o) => o.key(),
            Self::Pod(o) => o.key(),
            Self::Namespace(o) => o.key(),
            Self::ServiceImport(o) => o.key(),
            Self::MultiClusterEndpoints(o) => o.key(),
        }
    }

    fn wrong_type(&self, expected: &'static str) -> StoreError {
        StoreError::WrongType {
            expected,
            found: self.kind(),
        }
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod object_tests;
