// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `resolver.rs`

use crate::config::Config;
use crate::controller::{ClusterState, WatchKind};
use crate::errors::ResolveError;
use crate::object::{self, ClusterObject, EndpointAddress};
use crate::resolver::*;
use crate::test_fixtures::{self, config};
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

const ZONE: &str = "cluster.local.";
const MC_ZONE: &str = "clusterset.local.";
const REVERSE_ZONE: &str = "in-addr.arpa.";

fn resolver(config: &Config) -> Resolver {
    let state: Arc<dyn ClusterState> = test_fixtures::cluster(config);
    Resolver::new(config, state)
}

fn ip(s: &str) -> Target {
    Target::Ip(s.parse::<IpAddr>().unwrap())
}

fn targets(items: &[Item]) -> Vec<Target> {
    items.iter().map(|i| i.target.clone()).collect()
}

fn owners(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.owner.as_str()).collect()
}

// ----------------------------------------------------------------------------
// Services
// ----------------------------------------------------------------------------

#[test]
fn test_cluster_ip_service() {
    let r = resolver(&config(""));
    let items = r.records("svc1.testns.svc.cluster.local.", ZONE).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].target, ip("10.0.0.1"));
    assert_eq!(items[0].port, Some(80));
    assert_eq!(items[0].owner, "svc1.testns.svc.cluster.local.");
    assert_eq!(items[0].ttl, r.ttl());
}

#[test]
fn test_headless_service_answers_every_endpoint() {
    let r = resolver(&config(""));
    let items = r.records("svc2.testns.svc.cluster.local.", ZONE).unwrap();

    assert_eq!(targets(&items), vec![ip("10.0.0.2"), ip("10.0.0.3")]);
    assert_eq!(
        owners(&items),
        vec![
            "foo1.svc2.testns.svc.cluster.local.",
            "10-0-0-3.svc2.testns.svc.cluster.local."
        ]
    );
}

#[test]
fn test_headless_endpoint_by_hostname() {
    let r = resolver(&config(""));

    let items = r.records("foo1.svc2.testns.svc.cluster.local.", ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.0.0.2")]);

    let items = r.records("FOO1.svc2.testns.svc.cluster.local.", ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.0.0.2")]);

    let items = r.records("10-0-0-3.svc2.testns.svc.cluster.local.", ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.0.0.3")]);

    assert_eq!(
        r.records("nope.svc2.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
}

#[test]
fn test_headless_without_endpoints_is_name_error() {
    let r = resolver(&config("noEndpoints: true\n"));
    assert_eq!(
        r.records("svc2.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
    // Cluster IP services do not need endpoints.
    assert!(r.records("svc1.testns.svc.cluster.local.", ZONE).is_ok());
}

#[test]
fn test_endpoint_pod_names() {
    let r = resolver(&config("endpointPodNames: true\n"));
    let items = r.records("svc2.testns.svc.cluster.local.", ZONE).unwrap();
    assert_eq!(
        owners(&items),
        vec![
            "foo1.svc2.testns.svc.cluster.local.",
            "pod-10-0-0-3.svc2.testns.svc.cluster.local."
        ]
    );
}

#[test]
fn test_endpoint_hostname_fallbacks() {
    let addr = EndpointAddress {
        ip: "fd00::1".to_string(),
        hostname: String::new(),
        node_name: String::new(),
        target_ref_name: "web-0".to_string(),
    };
    assert_eq!(resolver(&config("")).endpoint_hostname(&addr), "fd00--1");
    assert_eq!(
        resolver(&config("endpointPodNames: true\n")).endpoint_hostname(&addr),
        "web-0"
    );

    let named = EndpointAddress {
        hostname: "db".to_string(),
        ..addr
    };
    assert_eq!(
        resolver(&config("endpointPodNames: true\n")).endpoint_hostname(&named),
        "db"
    );
}

#[test]
fn test_srv_port_filters() {
    let r = resolver(&config(""));

    let items = r.records("_http._tcp.svc1.testns.svc.cluster.local.", ZONE).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].port, Some(80));

    for wildcard in ["*", "any"] {
        let name = format!("_{wildcard}._tcp.svc1.testns.svc.cluster.local.");
        assert_eq!(r.records(&name, ZONE).unwrap().len(), 1, "{name}");
    }

    assert_eq!(
        r.records("_https._tcp.svc1.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
    assert_eq!(
        r.records("_http._udp.svc1.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
}

#[test]
fn test_external_name_service() {
    let r = resolver(&config(""));
    let items = r.records("ext.testns.svc.cluster.local.", ZONE).unwrap();
    assert_eq!(targets(&items), vec![Target::Name("example.io.".to_string())]);

    // An alias has no endpoints.
    assert_eq!(
        r.records("foo.ext.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );

    // SRV drops alias targets; the name still exists.
    assert_eq!(
        r.services("ext.testns.svc.cluster.local.", ZONE, RecordType::SRV),
        Ok(Vec::new())
    );
}

#[test]
fn test_ignore_empty_service() {
    let r = resolver(&config(""));
    assert!(r.records("svc-empty.testns.svc.cluster.local.", ZONE).is_ok());

    let r = resolver(&config("ignoreEmptyService: true\n"));
    assert_eq!(
        r.records("svc-empty.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
    assert!(r.records("svc1.testns.svc.cluster.local.", ZONE).is_ok());
}

#[test]
fn test_nodata_and_missing_names() {
    let r = resolver(&config(""));
    assert_eq!(r.records("cluster.local.", ZONE), Ok(Vec::new()));
    assert_eq!(r.records("svc.cluster.local.", ZONE), Ok(Vec::new()));
    assert_eq!(r.records("testns.svc.cluster.local.", ZONE), Ok(Vec::new()));
    assert_eq!(
        r.records("missing.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
    assert_eq!(
        r.records("foo.bar.notapod.cluster.local.", ZONE),
        Err(ResolveError::ParseError)
    );
}

#[test]
fn test_namespace_list_hides_other_namespaces() {
    let r = resolver(&config("namespaces: [other]\n"));
    assert_eq!(
        r.records("svc1.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
    assert!(!r.namespace_exposed("testns"));
    assert!(r.namespace_exposed("other"));
}

#[test]
fn test_namespace_label_selector_requires_watched_namespace() {
    let r = resolver(&config("namespaceLabelSelector: team=dns\n"));
    assert!(r.namespace_exposed("testns"));
    assert!(!r.namespace_exposed("unlisted"));
}

// ----------------------------------------------------------------------------
// Pods
// ----------------------------------------------------------------------------

#[test]
fn test_verified_pod() {
    let r = resolver(&config(""));
    let items = r.records("10-240-0-1.podns.pod.cluster.local.", ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.240.0.1")]);
    assert_eq!(owners(&items), vec!["10-240-0-1.podns.pod.cluster.local."]);

    // Wrong namespace, unknown IP, undecodable label.
    for name in [
        "10-240-0-1.testns.pod.cluster.local.",
        "10-240-0-2.podns.pod.cluster.local.",
        "not-an-ip.podns.pod.cluster.local.",
    ] {
        assert_eq!(r.records(name, ZONE), Err(ResolveError::NoItems), "{name}");
    }
}

#[test]
fn test_insecure_pod_echoes_ip() {
    let r = resolver(&config("podMode: insecure\n"));
    let items = r.records("10-9-9-9.anyns.pod.cluster.local.", ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.9.9.9")]);
    assert_eq!(owners(&items), vec!["10-9-9-9.anyns.pod.cluster.local."]);
    assert!(r.pod_with_ip("10.240.0.1".parse().unwrap()).is_none());
}

#[test]
fn test_disabled_pods() {
    let r = resolver(&config("podMode: disabled\n"));
    assert_eq!(
        r.records("10-240-0-1.podns.pod.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
}

#[test]
fn test_pod_with_ip() {
    let r = resolver(&config(""));
    let pod = r.pod_with_ip("10.240.0.1".parse().unwrap()).unwrap();
    assert_eq!(pod.name, "pod1");
    assert!(r.pod_with_ip("10.240.0.2".parse().unwrap()).is_none());
}

// ----------------------------------------------------------------------------
// Multi-cluster
// ----------------------------------------------------------------------------

#[test]
fn test_multicluster_headless_import() {
    let r = resolver(&config(""));

    let items = r.records("svc3.testns.svc.clusterset.local.", MC_ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.1.0.1")]);
    assert_eq!(owners(&items), vec!["foo.c1.svc3.testns.svc.clusterset.local."]);

    let items = r.records("foo.c1.svc3.testns.svc.clusterset.local.", MC_ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.1.0.1")]);

    assert_eq!(
        r.records("foo.c2.svc3.testns.svc.clusterset.local.", MC_ZONE),
        Err(ResolveError::NoItems)
    );
}

#[test]
fn test_multicluster_cluster_set_ip_import() {
    let r = resolver(&config(""));
    let items = r.records("svc4.testns.svc.clusterset.local.", MC_ZONE).unwrap();
    assert_eq!(targets(&items), vec![ip("10.2.0.1")]);
    assert_eq!(items[0].port, Some(80));
}

#[test]
fn test_multicluster_zone_ignores_local_services() {
    let r = resolver(&config(""));
    assert_eq!(
        r.records("svc1.testns.svc.clusterset.local.", MC_ZONE),
        Err(ResolveError::NoItems)
    );
    assert_eq!(
        r.records("svc4.testns.svc.cluster.local.", ZONE),
        Err(ResolveError::NoItems)
    );
}

// ----------------------------------------------------------------------------
// Reverse
// ----------------------------------------------------------------------------

#[test]
fn test_reverse_service_ip() {
    let r = resolver(&config(""));
    let items = r.reverse("1.0.0.10.in-addr.arpa.", REVERSE_ZONE).unwrap();
    assert_eq!(
        targets(&items),
        vec![Target::Name("svc1.testns.svc.cluster.local.".to_string())]
    );
}

#[test]
fn test_reverse_external_ip() {
    let config = config("");
    let controller = test_fixtures::cluster(&config);
    let mut lb = object::Service::from_resource(&test_fixtures::cluster_ip_service(
        "lb", "testns", "10.0.0.20",
    ));
    lb.external_ips = vec!["192.0.2.50".to_string()];
    controller
        .on_apply(WatchKind::Service, lb.into_object())
        .unwrap();
    let r = Resolver::new(&config, controller);

    let items = r.reverse("50.2.0.192.in-addr.arpa.", REVERSE_ZONE).unwrap();
    assert_eq!(
        targets(&items),
        vec![Target::Name("lb.testns.svc.cluster.local.".to_string())]
    );
}

#[test]
fn test_reverse_named_endpoint() {
    let r = resolver(&config(""));
    let items = r.reverse("2.0.0.10.in-addr.arpa.", REVERSE_ZONE).unwrap();
    assert_eq!(
        targets(&items),
        vec![Target::Name("foo1.svc2.testns.svc.cluster.local.".to_string())]
    );

    // Endpoints without a hostname have no PTR.
    assert_eq!(
        r.reverse("3.0.0.10.in-addr.arpa.", REVERSE_ZONE),
        Err(ResolveError::NoItems)
    );
}

#[test]
fn test_reverse_hidden_namespace_and_partial_names() {
    let r = resolver(&config("namespaces: [other]\n"));
    assert_eq!(
        r.reverse("1.0.0.10.in-addr.arpa.", REVERSE_ZONE),
        Err(ResolveError::NoItems)
    );

    let r = resolver(&config(""));
    let err = r.reverse("0.10.in-addr.arpa.", REVERSE_ZONE).unwrap_err();
    assert!(err.is_name_error());
}

// ----------------------------------------------------------------------------
// Query types
// ----------------------------------------------------------------------------

#[test]
fn test_txt_schema_version() {
    let r = resolver(&config(""));
    let items = r
        .services("dns-version.cluster.local.", ZONE, RecordType::TXT)
        .unwrap();
    assert_eq!(targets(&items), vec![Target::Text("1.1.0".to_string())]);
    assert_eq!(items[0].ttl, 28800);

    assert_eq!(
        r.services("svc1.testns.svc.cluster.local.", ZONE, RecordType::TXT),
        Ok(Vec::new())
    );
    assert_eq!(
        r.services("missing.testns.svc.cluster.local.", ZONE, RecordType::TXT),
        Err(ResolveError::NoItems)
    );
}

#[test]
fn test_serial_tracks_modified_timestamps() {
    let r = resolver(&config(""));
    let internal = r.state().modified(crate::controller::ModifiedMode::Internal);
    let multicluster = r.state().modified(crate::controller::ModifiedMode::MultiCluster);

    assert!(internal > 0);
    assert_eq!(i64::from(r.serial(ZONE)), internal);
    assert_eq!(i64::from(r.serial(MC_ZONE)), multicluster);
}

#[test]
fn test_zone_helpers() {
    let r = resolver(&config(""));
    assert_eq!(r.primary_zone(), "cluster.local.");
    assert_eq!(
        r.matching_zone("svc1.testns.svc.clusterset.local."),
        Some("clusterset.local.")
    );
    assert_eq!(r.matching_zone("example.com."), None);
    assert!(r.is_multicluster_zone(MC_ZONE));
    assert!(!r.is_multicluster_zone(ZONE));
    assert!(r.autopath_search().is_none());
}
