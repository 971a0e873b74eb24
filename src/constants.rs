// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for kubedns.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Cluster Schema Constants
// ============================================================================

/// Label that marks a query as a service lookup (`<svc>.<ns>.svc.<zone>`)
pub const SVC: &str = "svc";

/// Label that marks a query as a pod lookup (`<ip>.<ns>.pod.<zone>`)
pub const POD: &str = "pod";

/// Name of the TXT record that advertises the DNS schema version
pub const DNS_SCHEMA_VERSION_NAME: &str = "dns-version";

/// Version of the Kubernetes DNS-based service discovery schema we implement
pub const DNS_SCHEMA_VERSION: &str = "1.1.0";

/// TTL of the schema version TXT record (seconds)
pub const DNS_SCHEMA_VERSION_TTL_SECS: u32 = 28800;

/// Leading labels of the nameserver name synthesized for each zone
pub const NS_LABEL_PREFIX: &str = "ns.dns.";

/// Leading label of the SOA mailbox synthesized for each zone
pub const HOSTMASTER_LABEL: &str = "hostmaster.";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries
pub const DNS_PORT: u16 = 53;

/// Default TTL for synthesized records (seconds)
pub const DEFAULT_TTL_SECS: u32 = 5;

/// Maximum TTL accepted from configuration (seconds)
pub const MAX_TTL_SECS: u32 = 3600;

/// Upper bound on the TTL of a synthesized SOA record (seconds)
pub const SOA_MAX_TTL_SECS: u32 = 300;

/// SOA refresh interval
pub const SOA_REFRESH_SECS: i32 = 7200;

/// SOA retry interval
pub const SOA_RETRY_SECS: i32 = 1800;

/// SOA expire time
pub const SOA_EXPIRE_SECS: i32 = 86400;

/// Priority shared by every synthesized SRV record
pub const SRV_PRIORITY: u16 = 0;

/// Weight shared by every synthesized SRV record
pub const SRV_WEIGHT: u16 = 100;

/// Longest CNAME chain followed inside our zones
pub const MAX_CNAME_CHAIN: usize = 8;

/// UDP payload limit for clients that do not advertise EDNS (RFC 1035)
pub const DEFAULT_UDP_PAYLOAD: usize = 512;

/// EDNS buffer size we advertise, and the largest UDP payload we ever send
pub const EDNS_UDP_PAYLOAD: u16 = 4096;

/// Largest UDP payload we send or receive
pub const MAX_UDP_PAYLOAD: usize = EDNS_UDP_PAYLOAD as usize;

/// Reverse zone suffix for IPv4
pub const IPV4_REVERSE_SUFFIX: &str = ".in-addr.arpa.";

/// Reverse zone suffix for IPv6
pub const IPV6_REVERSE_SUFFIX: &str = ".ip6.arpa.";

// ============================================================================
// Kubernetes Label Constants
// ============================================================================

/// Label on an `EndpointSlice` naming the service it belongs to
pub const LABEL_SERVICE_NAME: &str = "kubernetes.io/service-name";

/// Label on a multi-cluster `EndpointSlice` naming the imported service
pub const LABEL_MC_SERVICE_NAME: &str = "multicluster.kubernetes.io/service-name";

/// Label on a multi-cluster `EndpointSlice` naming the source cluster
pub const LABEL_MC_SOURCE_CLUSTER: &str = "multicluster.kubernetes.io/source-cluster";

/// Service IP value that marks a headless service
pub const CLUSTER_IP_NONE: &str = "None";

/// `Service.spec.type` value for alias services
pub const SERVICE_TYPE_EXTERNAL_NAME: &str = "ExternalName";

/// `ServiceImport.spec.type` value for virtual-IP imports
pub const SERVICE_IMPORT_TYPE_CLUSTER_SET_IP: &str = "ClusterSetIP";

/// `ServiceImport.spec.type` value for headless imports
pub const SERVICE_IMPORT_TYPE_HEADLESS: &str = "Headless";

// ============================================================================
// Store Index Names
// ============================================================================

/// Service index keyed by `name.namespace`
pub const SVC_NAME_NAMESPACE_INDEX: &str = "NameNamespace";

/// Service index keyed by each cluster IP
pub const SVC_IP_INDEX: &str = "ServiceIP";

/// Service index keyed by each external IP
pub const SVC_EXTERNAL_IP_INDEX: &str = "ServiceExternalIP";

/// Endpoints index keyed by `service.namespace`
pub const EP_NAME_NAMESPACE_INDEX: &str = "EndpointNameNamespace";

/// Endpoints index keyed by each member IP
pub const EP_IP_INDEX: &str = "EndpointsIP";

/// Pod index keyed by each pod IP
pub const POD_IP_INDEX: &str = "PodIP";

/// Service import index keyed by `name.namespace`
pub const SVC_IMPORT_NAME_NAMESPACE_INDEX: &str = "ServiceImportNameNamespace";

/// Multi-cluster endpoints index keyed by `service.namespace`
pub const MC_EP_NAME_NAMESPACE_INDEX: &str = "MultiClusterEndpointsNameNamespace";

// ============================================================================
// Metadata Label Constants
// ============================================================================

/// Prefix shared by every metadata label we publish
pub const METADATA_PREFIX: &str = "kubernetes/";

/// Metadata label set when the query name does not fit the cluster schema
pub const METADATA_PARSE_ERROR: &str = "kubernetes/parse-error";

/// Metadata label for the request kind (`svc` or `pod`)
pub const METADATA_KIND: &str = "kubernetes/kind";

/// Metadata label for the queried namespace
pub const METADATA_NAMESPACE: &str = "kubernetes/namespace";

/// Metadata label for the queried service (or dashed pod IP)
pub const METADATA_SERVICE: &str = "kubernetes/service";

/// Metadata label for the queried endpoint
pub const METADATA_ENDPOINT: &str = "kubernetes/endpoint";

/// Metadata label for the queried SRV port name
pub const METADATA_PORT_NAME: &str = "kubernetes/port-name";

/// Metadata label for the queried SRV protocol
pub const METADATA_PROTOCOL: &str = "kubernetes/protocol";

/// Metadata label for the queried cluster id (multi-cluster zones only)
pub const METADATA_CLUSTER: &str = "kubernetes/cluster";

/// Metadata label for the namespace of the client pod
pub const METADATA_CLIENT_NAMESPACE: &str = "kubernetes/client-namespace";

/// Metadata label for the name of the client pod
pub const METADATA_CLIENT_POD_NAME: &str = "kubernetes/client-pod-name";

/// Prefix of the per-label metadata published for the client pod
pub const METADATA_CLIENT_LABEL_PREFIX: &str = "kubernetes/client-label/";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default UDP listen address for the DNS server
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:53";

/// Default listen address for the health and metrics HTTP server
pub const DEFAULT_HEALTH_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint
pub const HEALTH_PATH: &str = "/healthz";

/// Path for the readiness endpoint (reports `HasSynced`)
pub const READY_PATH: &str = "/ready";
