// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # kubedns - authoritative DNS for Kubernetes
//!
//! kubedns answers DNS queries for the cluster domain from an in-memory view of
//! the Kubernetes API. It watches Services, EndpointSlices, Pods and Namespaces,
//! plus multi-cluster `ServiceImport` objects, and synthesizes the records
//! Kubernetes clients expect from the cluster domain.
//!
//! ## Modules
//!
//! - [`config`] - Configuration file parsing and validation
//! - [`object`] - Reduced, DNS-relevant views of the watched Kubernetes objects
//! - [`store`] - Indexed in-memory stores, one per watched kind
//! - [`controller`] - Applies watch events to the stores and tracks sync state
//! - [`listwatch`] - Watch sources backed by `kube::runtime::watcher`
//! - [`request`] - Parsing of query names into their service and pod segments
//! - [`resolver`] - Lookup of services, endpoints and pods for a parsed request
//! - [`answer`] - Translation of lookup results into DNS records
//! - [`autopath`] - Server-side search path completion
//! - [`metadata`] - Per-query metadata published for other handlers
//! - [`handler`] - The DNS query handler
//! - [`server`] - UDP transport and the health/metrics HTTP endpoints
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use kubedns::config::Config;
//! use kubedns::controller::{ClusterState, ControllerOptions, DnsController};
//! use kubedns::handler::KubernetesHandler;
//! use kubedns::resolver::Resolver;
//! use std::sync::Arc;
//!
//! let config = Config::from_yaml("zones: [cluster.local.]\npodMode: verified\n").unwrap();
//! let controller = Arc::new(DnsController::new(ControllerOptions::from(&config)));
//! let state: Arc<dyn ClusterState> = controller.clone();
//! let handler = KubernetesHandler::new(Resolver::new(&config, state));
//! ```

pub mod answer;
pub mod autopath;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod errors;
pub mod handler;
pub mod listwatch;
pub mod metadata;
pub mod metrics;
pub mod object;
pub mod request;
pub mod resolver;
pub mod server;
pub mod store;

#[cfg(test)]
mod test_fixtures;
