// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

use crate::config::{fqdn, is_reverse_zone, Config, PodMode};
use std::io::Write;

#[test]
fn test_empty_document_uses_defaults() {
    let config = Config::from_yaml("").unwrap();

    assert_eq!(config.zones, vec!["cluster.local.".to_string()]);
    assert_eq!(config.ttl, 5);
    assert_eq!(config.pod_mode, PodMode::Disabled);
    assert!(config.init_endpoints_cache());
    assert!(!config.init_pod_cache());
    assert!(!config.multicluster());
}

#[test]
fn test_full_document() {
    let raw = r#"
zones: ["Cluster.Local", "in-addr.arpa.", "clusterset.local."]
multiclusterZones: ["clusterset.local"]
ttl: 30
podMode: verified
endpointPodNames: true
ignoreEmptyService: true
namespaces: ["testns"]
autopath: ["example.internal"]
"#;
    let config = Config::from_yaml(raw).unwrap();

    assert_eq!(
        config.zones,
        vec![
            "cluster.local.".to_string(),
            "in-addr.arpa.".to_string(),
            "clusterset.local.".to_string()
        ]
    );
    assert_eq!(config.multicluster_zones, vec!["clusterset.local.".to_string()]);
    assert_eq!(config.ttl, 30);
    assert!(config.init_pod_cache());
    assert!(config.endpoint_pod_names);
    assert!(config.ignore_empty_service);
    assert!(config.multicluster());
    assert!(config.namespace_set().contains("testns"));
    assert_eq!(
        config.autopath,
        Some(vec!["example.internal.".to_string()])
    );
}

#[test]
fn test_primary_zone_skips_reverse_zones() {
    let config = Config::from_yaml("zones: [\"10.in-addr.arpa.\", \"cluster.local.\"]").unwrap();
    assert_eq!(config.primary_zone(), "cluster.local.");
}

#[test]
fn test_multicluster_zone_must_be_listed() {
    let result = Config::from_yaml("multiclusterZones: [\"clusterset.local.\"]");
    assert!(result.is_err());
}

#[test]
fn test_ttl_out_of_range_is_rejected() {
    let result = Config::from_yaml("ttl: 7200");
    assert!(result.is_err());
}

#[test]
fn test_no_endpoints_disables_endpoint_cache() {
    let config = Config::from_yaml("noEndpoints: true").unwrap();
    assert!(!config.init_endpoints_cache());
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ttl: 60\npodMode: insecure").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.ttl, 60);
    assert_eq!(config.pod_mode, PodMode::Insecure);
}

#[test]
fn test_fqdn_and_reverse_zone_helpers() {
    assert_eq!(fqdn("Example.COM"), "example.com.");
    assert_eq!(fqdn("example.com."), "example.com.");
    assert!(is_reverse_zone("in-addr.arpa."));
    assert!(is_reverse_zone("10.in-addr.arpa"));
    assert!(is_reverse_zone("ip6.arpa."));
    assert!(!is_reverse_zone("cluster.local."));
}
