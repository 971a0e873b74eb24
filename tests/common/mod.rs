// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kubedns::config::Config;
use kubedns::controller::{ClusterState, ControllerOptions, DnsController};
use kubedns::crd::ServiceImport;
use kubedns::errors::HandlerError;
use kubedns::handler::{KubernetesHandler, ResponseWriter};
use kubedns::listwatch::{Sources, StaticListWatch};
use kubedns::metadata::RequestContext;
use kubedns::resolver::Resolver;
use serde_json::json;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Objects served by the fake API, one list per kind.
#[derive(Default)]
pub struct Fixture {
    pub services: Vec<Service>,
    pub endpoints: Vec<EndpointSlice>,
    pub pods: Vec<Pod>,
    pub service_imports: Vec<ServiceImport>,
    pub multicluster_endpoints: Vec<EndpointSlice>,
}

/// A controller running against static sources, and a handler over it.
pub struct TestServer {
    pub controller: Arc<DnsController>,
    pub handler: KubernetesHandler,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start the controller and wait for the initial lists to land.
    pub async fn start(config: &Config, fixture: Fixture) -> Self {
        let sources = Sources {
            services: Some(Arc::new(StaticListWatch::listed(fixture.services))),
            endpoints: Some(Arc::new(StaticListWatch::listed(fixture.endpoints))),
            pods: Some(Arc::new(StaticListWatch::listed(fixture.pods))),
            namespaces: None,
            service_imports: Some(Arc::new(StaticListWatch::listed(fixture.service_imports))),
            multicluster_endpoints: Some(Arc::new(StaticListWatch::listed(
                fixture.multicluster_endpoints,
            ))),
        };

        let controller = Arc::new(DnsController::new(ControllerOptions::from(config)));
        let task = tokio::spawn(controller.clone().run(sources));
        wait_for_sync(controller.as_ref()).await;

        let state: Arc<dyn ClusterState> = controller.clone();
        let handler = KubernetesHandler::new(Resolver::new(config, state));
        Self {
            controller,
            handler,
            task,
        }
    }

    /// Send one question and return the reply plus the metadata published for it.
    pub fn query(&self, name: &str, qtype: RecordType) -> (Message, RequestContext) {
        let mut ctx = RequestContext::new();
        let mut writer = CaptureWriter::new("192.0.2.10");
        self.handler
            .serve_dns(&mut ctx, &mut writer, &request(name, qtype))
            .expect("query failed");
        let reply = writer.written.pop().expect("no reply written");
        (reply, ctx)
    }

    pub async fn shutdown(self) {
        self.controller.stop().expect("stop");
        timeout(Duration::from_secs(5), self.task)
            .await
            .expect("controller did not stop")
            .expect("controller panicked");
    }
}

async fn wait_for_sync(state: &dyn ClusterState) {
    for _ in 0..100 {
        if state.has_synced() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("controller did not sync");
}

/// [`ResponseWriter`] that keeps every reply.
pub struct CaptureWriter {
    client: IpAddr,
    pub written: Vec<Message>,
}

impl CaptureWriter {
    pub fn new(client: &str) -> Self {
        Self {
            client: client.parse().expect("client address"),
            written: Vec::new(),
        }
    }
}

impl ResponseWriter for CaptureWriter {
    fn remote_ip(&self) -> IpAddr {
        self.client
    }

    fn write_msg(&mut self, msg: Message) -> Result<(), HandlerError> {
        self.written.push(msg);
        Ok(())
    }
}

pub fn request(name: &str, qtype: RecordType) -> Message {
    let mut msg = Message::new();
    msg.set_id(1)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    msg.add_query(Query::query(Name::from_str(name).expect("query name"), qtype));
    msg
}

/// Record data of the answer section, rendered as text.
pub fn rdata(msg: &Message) -> Vec<String> {
    msg.answers()
        .iter()
        .filter_map(|r| r.data().map(ToString::to_string))
        .collect()
}

pub fn config(yaml: &str) -> Config {
    Config::from_yaml(yaml).expect("config")
}

// ----------------------------------------------------------------------------
// Kubernetes objects
// ----------------------------------------------------------------------------

pub fn cluster_ip_service(name: &str, namespace: &str, ip: &str) -> Service {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "spec": {
            "type": "ClusterIP",
            "clusterIP": ip,
            "clusterIPs": [ip],
            "ports": [{ "name": "http", "port": 80, "protocol": "TCP" }]
        }
    }))
    .expect("service")
}

pub fn headless_service(name: &str, namespace: &str) -> Service {
    cluster_ip_service(name, namespace, "None")
}

pub fn external_name_service(name: &str, namespace: &str, external_name: &str) -> Service {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "spec": { "type": "ExternalName", "externalName": external_name }
    }))
    .expect("service")
}

fn slice(
    name: &str,
    namespace: &str,
    labels: serde_json::Value,
    addresses: &[(&str, Option<&str>)],
) -> EndpointSlice {
    let endpoints: Vec<_> = addresses
        .iter()
        .map(|(ip, hostname)| {
            let mut endpoint = json!({
                "addresses": [ip],
                "conditions": { "ready": true }
            });
            if let Some(hostname) = hostname {
                endpoint["hostname"] = json!(hostname);
            }
            endpoint
        })
        .collect();

    serde_json::from_value(json!({
        "apiVersion": "discovery.k8s.io/v1",
        "kind": "EndpointSlice",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1",
            "labels": labels
        },
        "addressType": "IPv4",
        "endpoints": endpoints,
        "ports": [{ "name": "http", "port": 80, "protocol": "TCP" }]
    }))
    .expect("endpoint slice")
}

pub fn endpoint_slice(
    name: &str,
    service: &str,
    namespace: &str,
    addresses: &[(&str, Option<&str>)],
) -> EndpointSlice {
    slice(
        name,
        namespace,
        json!({ "kubernetes.io/service-name": service }),
        addresses,
    )
}

pub fn multicluster_endpoint_slice(
    name: &str,
    service: &str,
    namespace: &str,
    cluster: &str,
    addresses: &[(&str, Option<&str>)],
) -> EndpointSlice {
    slice(
        name,
        namespace,
        json!({
            "multicluster.kubernetes.io/service-name": service,
            "multicluster.kubernetes.io/source-cluster": cluster
        }),
        addresses,
    )
}

pub fn service_import(name: &str, namespace: &str, import_type: &str, ips: &[&str]) -> ServiceImport {
    serde_json::from_value(json!({
        "apiVersion": "multicluster.x-k8s.io/v1alpha1",
        "kind": "ServiceImport",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "spec": {
            "type": import_type,
            "ips": ips,
            "ports": [{ "name": "http", "port": 80, "protocol": "TCP" }]
        }
    }))
    .expect("service import")
}
