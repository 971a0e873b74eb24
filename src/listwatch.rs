// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! List/watch sources feeding the controller.
//!
//! The controller is parameterized over [`ListWatch`], a capability that yields a
//! stream of `kube` watcher events for one resource kind. Relisting on expiry and
//! exponential backoff are handled by the stream itself: [`ApiListWatch`] wraps
//! `kube::runtime::watcher` with its default backoff, so a disconnect shows up to
//! the controller as a fresh `Init` .. `InitDone` sequence rather than an error.
//!
//! [`StaticListWatch`] replays a fixed event sequence and then idles, which is
//! enough to drive the controller without an API server.

use crate::config::Config;
use crate::crd::ServiceImport;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::runtime::watcher::{self, Event};
use kube::runtime::WatchStreamExt;
use kube::{Api, Client, Resource};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;

/// A stream of watcher events for one kind.
pub type EventStream<K> = BoxStream<'static, Result<Event<K>, watcher::Error>>;

/// A list/watch capability for one resource kind.
pub trait ListWatch<K>: Send + Sync {
    /// Start listing and watching. The stream never ends on its own while the
    /// source is healthy.
    fn watch(&self) -> EventStream<K>;
}

/// [`ListWatch`] backed by the Kubernetes API.
pub struct ApiListWatch<K> {
    api: Api<K>,
    config: watcher::Config,
}

impl<K> ApiListWatch<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    /// Watch `K` across all namespaces, optionally restricted by a label selector.
    #[must_use]
    pub fn all(client: Client, label_selector: Option<&str>) -> Self {
        let mut config = watcher::Config::default();
        if let Some(selector) = label_selector.filter(|s| !s.is_empty()) {
            config = config.labels(selector);
        }
        Self {
            api: Api::all(client),
            config,
        }
    }
}

impl<K> ListWatch<K> for ApiListWatch<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    fn watch(&self) -> EventStream<K> {
        watcher::watcher(self.api.clone(), self.config.clone())
            .default_backoff()
            .boxed()
    }
}

/// [`ListWatch`] that replays a fixed sequence of events, then stays open.
pub struct StaticListWatch<K> {
    events: Mutex<Vec<Event<K>>>,
}

impl<K: Clone> StaticListWatch<K> {
    /// Replay `events` verbatim.
    #[must_use]
    pub fn new(events: Vec<Event<K>>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    /// Replay a complete initial list of `objects`.
    #[must_use]
    pub fn listed(objects: Vec<K>) -> Self {
        let mut events = Vec::with_capacity(objects.len() + 2);
        events.push(Event::Init);
        events.extend(objects.into_iter().map(Event::InitApply));
        events.push(Event::InitDone);
        Self::new(events)
    }

    /// Append events replayed by subsequent calls to [`ListWatch::watch`].
    pub fn push(&self, event: Event<K>) {
        self.events.lock().push(event);
    }
}

impl<K: Clone + Send + Sync + 'static> ListWatch<K> for StaticListWatch<K> {
    fn watch(&self) -> EventStream<K> {
        let events = self.events.lock().clone();
        stream::iter(events.into_iter().map(Ok))
            .chain(stream::pending())
            .boxed()
    }
}

/// One source per watched kind. `None` leaves the kind unwatched.
#[derive(Default)]
pub struct Sources {
    pub services: Option<Arc<dyn ListWatch<Service>>>,
    pub endpoints: Option<Arc<dyn ListWatch<EndpointSlice>>>,
    pub pods: Option<Arc<dyn ListWatch<Pod>>>,
    pub namespaces: Option<Arc<dyn ListWatch<Namespace>>>,
    pub service_imports: Option<Arc<dyn ListWatch<ServiceImport>>>,
    pub multicluster_endpoints: Option<Arc<dyn ListWatch<EndpointSlice>>>,
}

impl Sources {
    /// Build API-backed sources for every kind the configuration needs.
    ///
    /// Multi-cluster endpoint slices are selected by the presence of the
    /// source-cluster label; the label selector only applies to services and
    /// endpoints.
    #[must_use]
    pub fn from_client(client: &Client, config: &Config) -> Self {
        let selector = config.label_selector.as_deref();
        let mut sources = Self {
            services: Some(Arc::new(ApiListWatch::<Service>::all(
                client.clone(),
                selector,
            ))),
            ..Self::default()
        };
        if config.init_endpoints_cache() {
            sources.endpoints = Some(Arc::new(ApiListWatch::<EndpointSlice>::all(
                client.clone(),
                selector,
            )));
        }
        if config.init_pod_cache() {
            sources.pods = Some(Arc::new(ApiListWatch::<Pod>::all(client.clone(), None)));
        }
        if let Some(ns_selector) = config.namespace_label_selector.as_deref() {
            sources.namespaces = Some(Arc::new(ApiListWatch::<Namespace>::all(
                client.clone(),
                Some(ns_selector),
            )));
        }
        if config.multicluster() {
            sources.service_imports = Some(Arc::new(ApiListWatch::<ServiceImport>::all(
                client.clone(),
                None,
            )));
            sources.multicluster_endpoints = Some(Arc::new(ApiListWatch::<EndpointSlice>::all(
                client.clone(),
                Some(crate::constants::LABEL_MC_SOURCE_CLUSTER),
            )));
        }
        sources
    }
}

#[cfg(test)]
#[path = "listwatch_tests.rs"]
mod listwatch_tests;
