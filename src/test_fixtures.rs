// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Builders for Kubernetes objects shared by unit tests.

use crate::config::Config;
use crate::constants::{LABEL_MC_SERVICE_NAME, LABEL_MC_SOURCE_CLUSTER, LABEL_SERVICE_NAME};
use crate::controller::{ControllerOptions, DnsController, WatchKind};
use crate::object::{self, ClusterObject, Object};
use crate::crd::{ServiceImport, ServiceImportPort, ServiceImportSpec};
use k8s_openapi::api::core::v1::{
    Namespace, ObjectReference, Pod, PodStatus, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::api::discovery::v1::{Endpoint, EndpointConditions, EndpointPort, EndpointSlice};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn meta(name: &str, namespace: &str, resource_version: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        resource_version: Some(resource_version.to_string()),
        ..Default::default()
    }
}

pub fn service_ports(ports: &[(&str, i32, &str)]) -> Option<Vec<ServicePort>> {
    Some(
        ports
            .iter()
            .map(|(name, port, protocol)| ServicePort {
                name: Some((*name).to_string()),
                port: *port,
                protocol: Some((*protocol).to_string()),
                ..Default::default()
            })
            .collect(),
    )
}

pub fn cluster_ip_service(name: &str, namespace: &str, ip: &str) -> Service {
    Service {
        metadata: meta(name, namespace, "1"),
        spec: Some(ServiceSpec {
            cluster_ip: Some(ip.to_string()),
            cluster_ips: Some(vec![ip.to_string()]),
            type_: Some("ClusterIP".to_string()),
            ports: service_ports(&[("http", 80, "TCP")]),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn headless_service(name: &str, namespace: &str) -> Service {
    Service {
        metadata: meta(name, namespace, "1"),
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".to_string()),
            cluster_ips: Some(vec!["None".to_string()]),
            type_: Some("ClusterIP".to_string()),
            ports: service_ports(&[("http", 80, "TCP")]),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn external_name_service(name: &str, namespace: &str, external_name: &str) -> Service {
    Service {
        metadata: meta(name, namespace, "1"),
        spec: Some(ServiceSpec {
            type_: Some("ExternalName".to_string()),
            external_name: Some(external_name.to_string()),
            ports: service_ports(&[("http", 80, "TCP")]),
            ..Default::default()
        }),
        status: None,
    }
}

fn slice(
    slice_name: &str,
    namespace: &str,
    labels: BTreeMap<String, String>,
    addresses: &[(&str, Option<&str>)],
) -> EndpointSlice {
    let mut metadata = meta(slice_name, namespace, "1");
    metadata.labels = Some(labels);
    EndpointSlice {
        metadata,
        address_type: "IPv4".to_string(),
        endpoints: addresses
            .iter()
            .map(|(ip, hostname)| Endpoint {
                addresses: vec![(*ip).to_string()],
                hostname: hostname.map(str::to_string),
                conditions: Some(EndpointConditions {
                    ready: Some(true),
                    ..Default::default()
                }),
                target_ref: Some(ObjectReference {
                    kind: Some("Pod".to_string()),
                    name: Some(format!("pod-{}", ip.replace('.', "-"))),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect(),
        ports: Some(vec![EndpointPort {
            name: Some("http".to_string()),
            port: Some(80),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
    }
}

pub fn endpoint_slice(
    slice_name: &str,
    service: &str,
    namespace: &str,
    addresses: &[(&str, Option<&str>)],
) -> EndpointSlice {
    slice(
        slice_name,
        namespace,
        BTreeMap::from([(LABEL_SERVICE_NAME.to_string(), service.to_string())]),
        addresses,
    )
}

pub fn multicluster_endpoint_slice(
    slice_name: &str,
    service: &str,
    namespace: &str,
    cluster: &str,
    addresses: &[(&str, Option<&str>)],
) -> EndpointSlice {
    slice(
        slice_name,
        namespace,
        BTreeMap::from([
            (LABEL_MC_SERVICE_NAME.to_string(), service.to_string()),
            (LABEL_MC_SOURCE_CLUSTER.to_string(), cluster.to_string()),
        ]),
        addresses,
    )
}

pub fn pod(name: &str, namespace: &str, ip: &str, labels: &[(&str, &str)]) -> Pod {
    let mut metadata = meta(name, namespace, "1");
    metadata.labels = Some(
        labels
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    );
    Pod {
        metadata,
        spec: None,
        status: Some(PodStatus {
            pod_ip: Some(ip.to_string()),
            ..Default::default()
        }),
    }
}

pub fn namespace(name: &str, labels: &[(&str, &str)]) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            resource_version: Some("1".to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        spec: None,
        status: None,
    }
}

pub fn service_import(name: &str, namespace: &str, import_type: &str, ips: &[&str]) -> ServiceImport {
    let mut import = ServiceImport::new(
        name,
        ServiceImportSpec {
            ips: ips.iter().map(|ip| (*ip).to_string()).collect(),
            import_type: import_type.to_string(),
            ports: vec![ServiceImportPort {
                name: Some("http".to_string()),
                protocol: Some("TCP".to_string()),
                app_protocol: None,
                port: 80,
            }],
        },
    );
    import.metadata.namespace = Some(namespace.to_string());
    import.metadata.resource_version = Some("1".to_string());
    import
}

// ----------------------------------------------------------------------------
// Populated cluster
// ----------------------------------------------------------------------------

pub const TEST_CONFIG: &str = r#"
zones: ["cluster.local.", "in-addr.arpa.", "clusterset.local."]
multiclusterZones: ["clusterset.local."]
podMode: verified
"#;

/// [`TEST_CONFIG`] with the top-level keys of `overrides` replaced or added.
pub fn config(overrides: &str) -> Config {
    let mut base: serde_yaml::Mapping = serde_yaml::from_str(TEST_CONFIG).unwrap();
    if !overrides.trim().is_empty() {
        let overrides: serde_yaml::Mapping = serde_yaml::from_str(overrides).unwrap();
        base.extend(overrides);
    }
    Config::from_yaml(&serde_yaml::to_string(&base).unwrap()).unwrap()
}

/// A controller holding a small cluster:
///
/// - `svc1.testns` (`ClusterIP` 10.0.0.1) and `svc-empty.testns` (10.0.0.9, no endpoints)
/// - `svc2.testns`, headless over `foo1` (10.0.0.2) and an unnamed 10.0.0.3
/// - `ext.testns`, an alias for `example.io`
/// - pod `pod1.podns` at 10.240.0.1
/// - import `svc3.testns` (headless, cluster `c1`, `foo` at 10.1.0.1)
///   and `svc4.testns` (`ClusterSetIP` 10.2.0.1)
/// - namespaces `testns` and `podns`
///
/// Kinds the options do not enable are left empty; enabled kinds are marked synced.
pub fn cluster(config: &Config) -> Arc<DnsController> {
    let options = ControllerOptions::from(config);
    let controller = Arc::new(DnsController::new(options));

    let objects: Vec<(WatchKind, Option<Object>)> = vec![
        (
            WatchKind::Service,
            Some(
                object::Service::from_resource(&cluster_ip_service("svc1", "testns", "10.0.0.1"))
                    .into_object(),
            ),
        ),
        (
            WatchKind::Service,
            Some(
                object::Service::from_resource(&cluster_ip_service(
                    "svc-empty", "testns", "10.0.0.9",
                ))
                .into_object(),
            ),
        ),
        (
            WatchKind::Service,
            Some(object::Service::from_resource(&headless_service("svc2", "testns")).into_object()),
        ),
        (
            WatchKind::Service,
            Some(
                object::Service::from_resource(&external_name_service("ext", "testns", "example.io"))
                    .into_object(),
            ),
        ),
        (
            WatchKind::Endpoints,
            object::Endpoints::from_resource(&endpoint_slice(
                "svc1-abc",
                "svc1",
                "testns",
                &[("10.0.0.1", None)],
            ))
            .map(ClusterObject::into_object),
        ),
        (
            WatchKind::Endpoints,
            object::Endpoints::from_resource(&endpoint_slice(
                "svc2-abc",
                "svc2",
                "testns",
                &[("10.0.0.2", Some("foo1")), ("10.0.0.3", None)],
            ))
            .map(ClusterObject::into_object),
        ),
        (
            WatchKind::Pod,
            Some(object::Pod::from_resource(&pod("pod1", "podns", "10.240.0.1", &[("app", "web")])).into_object()),
        ),
        (
            WatchKind::Namespace,
            Some(object::Namespace::from_resource(&namespace("testns", &[])).into_object()),
        ),
        (
            WatchKind::Namespace,
            Some(object::Namespace::from_resource(&namespace("podns", &[])).into_object()),
        ),
        (
            WatchKind::ServiceImport,
            Some(
                object::ServiceImport::from_resource(&service_import("svc3", "testns", "Headless", &[]))
                    .into_object(),
            ),
        ),
        (
            WatchKind::ServiceImport,
            Some(
                object::ServiceImport::from_resource(&service_import(
                    "svc4",
                    "testns",
                    "ClusterSetIP",
                    &["10.2.0.1"],
                ))
                .into_object(),
            ),
        ),
        (
            WatchKind::MultiClusterEndpoints,
            object::MultiClusterEndpoints::from_resource(&multicluster_endpoint_slice(
                "svc3-c1",
                "svc3",
                "testns",
                "c1",
                &[("10.1.0.1", Some("foo"))],
            ))
            .map(ClusterObject::into_object),
        ),
    ];

    for (kind, obj) in objects {
        if !options.enabled(kind) {
            continue;
        }
        controller.on_apply(kind, obj.unwrap()).unwrap();
    }
    for kind in WatchKind::ALL {
        if options.enabled(kind) {
            controller.mark_synced(kind);
        }
    }
    controller
}
