// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions consumed by kubedns.
//!
//! Only one external CRD is watched: the Multi-Cluster Services API
//! [`ServiceImport`] (`multicluster.x-k8s.io/v1alpha1`). Its definition here mirrors
//! the upstream schema closely enough to deserialize the fields DNS needs.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: multicluster.x-k8s.io/v1alpha1
//! kind: ServiceImport
//! metadata:
//!   name: svc2
//!   namespace: testns
//! spec:
//!   type: Headless
//!   ports:
//!     - name: http
//!       protocol: TCP
//!       port: 80
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `ServiceImport` describes a service exported from one or more member clusters.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "multicluster.x-k8s.io",
    version = "v1alpha1",
    kind = "ServiceImport",
    namespaced,
    doc = "ServiceImport describes a service imported from clusters in a ClusterSet."
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImportSpec {
    /// Virtual IPs of a `ClusterSetIP` import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,

    /// `ClusterSetIP` or `Headless`.
    #[serde(rename = "type")]
    pub import_type: String,

    /// Ports exposed by the imported service.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServiceImportPort>,
}

/// A port exposed by a [`ServiceImport`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImportPort {
    /// Port name, unique within the import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `TCP`, `UDP` or `SCTP`. Defaults to `TCP`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Application protocol hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_protocol: Option<String>,

    /// Port number.
    pub port: i32,
}
