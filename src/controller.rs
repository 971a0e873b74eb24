// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster-state controller.
//!
//! [`DnsController`] owns one [`IndexedStore`] per watched kind and keeps them in
//! step with the cluster through a [`ListWatch`] source per kind. Every applied
//! event goes through change detection; a change that is visible in DNS bumps one
//! of three "modified" timestamps:
//!
//! - **Internal**: services, endpoints and pods
//! - **External**: services that have (or had) external IPs
//! - **MultiCluster**: service imports and multi-cluster endpoints
//!
//! The timestamps are Unix seconds and only ever move forward; they serve as SOA
//! serials.
//!
//! ## Workers
//!
//! [`DnsController::run`] spawns one task per enabled kind and blocks until
//! [`DnsController::stop`] broadcasts shutdown. Handlers read the stores
//! concurrently through [`ClusterState`] and never wait on a worker.

use crate::config::Config;
use crate::constants::{
    EP_IP_INDEX, EP_NAME_NAMESPACE_INDEX, MC_EP_NAME_NAMESPACE_INDEX, POD_IP_INDEX,
    SVC_EXTERNAL_IP_INDEX, SVC_IMPORT_NAME_NAMESPACE_INDEX, SVC_IP_INDEX,
    SVC_NAME_NAMESPACE_INDEX,
};
use crate::crd::ServiceImport as ServiceImportResource;
use crate::errors::ControllerError;
use crate::listwatch::{ListWatch, Sources};
use crate::metrics;
use crate::object::{
    store_key, ClusterObject, Endpoints, MultiClusterEndpoints, Namespace, Object, Pod, Service,
    ServiceImport,
};
use crate::store::IndexedStore;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{
    Namespace as NamespaceResource, Pod as PodResource, Service as ServiceResource,
};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::runtime::watcher::Event;
use kube::{Resource, ResourceExt};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// The three modified-timestamp axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifiedMode {
    Internal,
    External,
    MultiCluster,
}

impl ModifiedMode {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::MultiCluster => "multicluster",
        }
    }
}

/// The kinds the controller can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WatchKind {
    Service,
    Endpoints,
    Pod,
    Namespace,
    ServiceImport,
    MultiClusterEndpoints,
}

impl WatchKind {
    pub const ALL: [Self; 6] = [
        Self::Service,
        Self::Endpoints,
        Self::Pod,
        Self::Namespace,
        Self::ServiceImport,
        Self::MultiClusterEndpoints,
    ];

    /// Kind name shared with [`ClusterObject::KIND`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Service => Service::KIND,
            Self::Endpoints => Endpoints::KIND,
            Self::Pod => Pod::KIND,
            Self::Namespace => Namespace::KIND,
            Self::ServiceImport => ServiceImport::KIND,
            Self::MultiClusterEndpoints => MultiClusterEndpoints::KIND,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Which kinds the controller watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub init_endpoints_cache: bool,
    pub init_pod_cache: bool,
    pub init_namespace_cache: bool,
    pub multicluster: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            init_endpoints_cache: true,
            init_pod_cache: false,
            init_namespace_cache: false,
            multicluster: false,
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            init_endpoints_cache: config.init_endpoints_cache(),
            init_pod_cache: config.init_pod_cache(),
            init_namespace_cache: config.namespace_label_selector.is_some(),
            multicluster: config.multicluster(),
        }
    }
}

impl ControllerOptions {
    /// Whether `kind` is watched under these options.
    #[must_use]
    pub fn enabled(&self, kind: WatchKind) -> bool {
        match kind {
            WatchKind::Service => true,
            WatchKind::Endpoints => self.init_endpoints_cache,
            WatchKind::Pod => self.init_pod_cache,
            WatchKind::Namespace => self.init_namespace_cache,
            WatchKind::ServiceImport | WatchKind::MultiClusterEndpoints => self.multicluster,
        }
    }
}

/// Read access to the cluster indexes, as seen by the resolver.
pub trait ClusterState: Send + Sync {
    /// Services by `name.namespace`.
    fn services_by_index(&self, index: &str) -> Vec<Arc<Service>>;
    /// Services owning a cluster IP.
    fn services_by_ip(&self, ip: &str) -> Vec<Arc<Service>>;
    /// Services advertising an external IP.
    fn services_by_external_ip(&self, ip: &str) -> Vec<Arc<Service>>;
    /// Endpoint sets by `service.namespace`.
    fn endpoints_by_index(&self, index: &str) -> Vec<Arc<Endpoints>>;
    /// Endpoint sets containing a member IP.
    fn endpoints_by_ip(&self, ip: &str) -> Vec<Arc<Endpoints>>;
    /// Pods by pod IP.
    fn pods_by_ip(&self, ip: &str) -> Vec<Arc<Pod>>;
    /// Service imports by `name.namespace`.
    fn service_imports_by_index(&self, index: &str) -> Vec<Arc<ServiceImport>>;
    /// Multi-cluster endpoint sets by `service.namespace`.
    fn multicluster_endpoints_by_index(&self, index: &str) -> Vec<Arc<MultiClusterEndpoints>>;
    /// A namespace by name, when namespaces are watched.
    fn namespace(&self, name: &str) -> Option<Arc<Namespace>>;
    /// Whether every enabled kind finished its initial list.
    fn has_synced(&self) -> bool;
    /// Latest change on an axis, in Unix seconds.
    fn modified(&self, mode: ModifiedMode) -> i64;
}

/// Outcome of applying an object to a store.
enum Applied<T> {
    Added(T),
    Updated(Arc<T>, T),
    Unchanged,
}

fn upsert<T: ClusterObject>(store: &IndexedStore<T>, obj: T) -> Applied<T> {
    if let Some(old) = store.get_by_key(&obj.key()) {
        if !obj.resource_version().is_empty() && old.resource_version() == obj.resource_version() {
            return Applied::Unchanged;
        }
    }
    let new = obj.clone();
    match store.add(obj) {
        None => Applied::Added(new),
        Some(old) => Applied::Updated(old, new),
    }
}

/// Decide which axes a service change touches: `(internal, external)`.
///
/// Creation and deletion always touch internal, and external only when the
/// service carries external IPs. Port changes touch both.
#[must_use]
pub fn service_modified(old: Option<&Service>, new: Option<&Service>) -> (bool, bool) {
    match (old, new) {
        (None, None) => (false, false),
        (None, Some(svc)) | (Some(svc), None) => (true, !svc.external_ips.is_empty()),
        (Some(old), Some(new)) => {
            let mut internal = false;
            let mut external = false;
            if old.external_ips != new.external_ips {
                external = true;
            }
            if old.external_name != new.external_name
                || old.cluster_ips != new.cluster_ips
                || old.service_type != new.service_type
            {
                internal = true;
            }
            if old.ports != new.ports {
                internal = true;
                external = true;
            }
            (internal, external)
        }
    }
}

/// Owner of the cluster-state stores.
pub struct DnsController {
    options: ControllerOptions,

    services: IndexedStore<Service>,
    endpoints: IndexedStore<Endpoints>,
    pods: IndexedStore<Pod>,
    namespaces: IndexedStore<Namespace>,
    service_imports: IndexedStore<ServiceImport>,
    multicluster_endpoints: IndexedStore<MultiClusterEndpoints>,

    synced: [AtomicBool; 6],

    internal_modified: AtomicI64,
    external_modified: AtomicI64,
    multicluster_modified: AtomicI64,

    stop_lock: Mutex<bool>,
    shutdown: watch::Sender<bool>,
}

impl DnsController {
    /// Create a controller with empty stores.
    #[must_use]
    pub fn new(options: ControllerOptions) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            options,
            services: IndexedStore::<Service>::new()
                .with_index(SVC_NAME_NAMESPACE_INDEX, |s| vec![s.index.clone()])
                .with_index(SVC_IP_INDEX, |s| s.cluster_ips.clone())
                .with_index(SVC_EXTERNAL_IP_INDEX, |s| s.external_ips.clone()),
            endpoints: IndexedStore::<Endpoints>::new()
                .with_index(EP_NAME_NAMESPACE_INDEX, |e| vec![e.index.clone()])
                .with_index(EP_IP_INDEX, |e| e.index_ip.clone()),
            pods: IndexedStore::<Pod>::new().with_index(POD_IP_INDEX, |p| {
                if p.pod_ip.is_empty() {
                    Vec::new()
                } else {
                    vec![p.pod_ip.clone()]
                }
            }),
            namespaces: IndexedStore::<Namespace>::new(),
            service_imports: IndexedStore::<ServiceImport>::new()
                .with_index(SVC_IMPORT_NAME_NAMESPACE_INDEX, |s| vec![s.index.clone()]),
            multicluster_endpoints: IndexedStore::<MultiClusterEndpoints>::new()
                .with_index(MC_EP_NAME_NAMESPACE_INDEX, |e| vec![e.endpoints.index.clone()]),
            synced: Default::default(),
            internal_modified: AtomicI64::new(0),
            external_modified: AtomicI64::new(0),
            multicluster_modified: AtomicI64::new(0),
            stop_lock: Mutex::new(false),
            shutdown,
        }
    }

    /// The options this controller was built with.
    #[must_use]
    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// Run one worker per enabled kind with a source, until [`DnsController::stop`].
    ///
    /// An enabled kind without a source never reports synced.
    pub async fn run(self: Arc<Self>, sources: Sources) {
        let mut workers = JoinSet::new();

        if let Some(source) = sources.services {
            workers.spawn(self.clone().reflect(WatchKind::Service, source, convert_service));
        }
        if self.options.init_endpoints_cache {
            if let Some(source) = sources.endpoints {
                workers.spawn(self.clone().reflect(WatchKind::Endpoints, source, convert_endpoints));
            }
        }
        if self.options.init_pod_cache {
            if let Some(source) = sources.pods {
                workers.spawn(self.clone().reflect(WatchKind::Pod, source, convert_pod));
            }
        }
        if self.options.init_namespace_cache {
            if let Some(source) = sources.namespaces {
                workers.spawn(self.clone().reflect(WatchKind::Namespace, source, convert_namespace));
            }
        }
        if self.options.multicluster {
            if let Some(source) = sources.service_imports {
                workers.spawn(self.clone().reflect(
                    WatchKind::ServiceImport,
                    source,
                    convert_service_import,
                ));
            }
            if let Some(source) = sources.multicluster_endpoints {
                workers.spawn(self.clone().reflect(
                    WatchKind::MultiClusterEndpoints,
                    source,
                    convert_multicluster_endpoints,
                ));
            }
        }

        info!(workers = workers.len(), "Cluster state controller started");

        let mut shutdown = self.shutdown.subscribe();
        while !*shutdown.borrow_and_update() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Controller worker failed: {e}");
            }
        }
        info!("Cluster state controller stopped");
    }

    /// Broadcast shutdown to every worker.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::ShutdownInProgress`] if shutdown was already requested.
    pub fn stop(&self) -> Result<(), ControllerError> {
        let mut stopped = self.stop_lock.lock();
        if *stopped {
            return Err(ControllerError::ShutdownInProgress);
        }
        *stopped = true;
        self.shutdown.send_replace(true);
        Ok(())
    }

    /// Whether `kind` completed its initial list.
    #[must_use]
    pub fn kind_synced(&self, kind: WatchKind) -> bool {
        self.synced[kind.slot()].load(Ordering::Acquire)
    }

    /// Record that `kind` completed its initial list. Returns `true` the first time.
    pub fn mark_synced(&self, kind: WatchKind) -> bool {
        !self.synced[kind.slot()].swap(true, Ordering::AcqRel)
    }

    async fn reflect<K>(
        self: Arc<Self>,
        kind: WatchKind,
        source: Arc<dyn ListWatch<K>>,
        convert: fn(&K) -> Option<Object>,
    ) where
        K: Resource + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        let mut events = source.watch();
        let mut relisted: Option<BTreeSet<String>> = None;

        debug!(kind = kind.name(), "Watch started");
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            let event = tokio::select! {
                biased;
                _ = shutdown.changed() => continue,
                event = events.next() => event,
            };
            let Some(event) = event else {
                warn!(kind = kind.name(), "Watch stream ended");
                break;
            };
            match event {
                Ok(Event::Apply(obj)) => match convert(&obj) {
                    Some(converted) => self.apply_logged(kind, converted),
                    None => {
                        self.remove(kind, &resource_key(&obj));
                    }
                },
                Ok(Event::Delete(obj)) => match convert(&obj) {
                    Some(converted) => self.delete_logged(kind, converted),
                    None => {
                        self.remove(kind, &resource_key(&obj));
                    }
                },
                Ok(Event::Init) => {
                    relisted = Some(BTreeSet::new());
                }
                Ok(Event::InitApply(obj)) => match convert(&obj) {
                    Some(converted) => {
                        if let Some(seen) = relisted.as_mut() {
                            seen.insert(converted.key());
                        }
                        self.apply_logged(kind, converted);
                    }
                    None => {
                        self.remove(kind, &resource_key(&obj));
                    }
                },
                Ok(Event::InitDone) => {
                    let seen = relisted.take().unwrap_or_default();
                    for key in self.keys(kind) {
                        if !seen.contains(&key) {
                            self.remove(kind, &key);
                        }
                    }
                    if self.mark_synced(kind) {
                        info!(kind = kind.name(), "Initial list complete");
                    }
                }
                Err(e) => {
                    metrics::record_watch_error(kind.name());
                    let err = ControllerError::Watch {
                        kind: kind.name(),
                        reason: e.to_string(),
                    };
                    warn!(transient = err.is_transient(), "{err}");
                }
            }
        }
        debug!(kind = kind.name(), "Watch stopped");
    }

    fn apply_logged(&self, kind: WatchKind, obj: Object) {
        if let Err(e) = self.on_apply(kind, obj) {
            metrics::record_store_event(kind.name(), "dropped");
            warn!(kind = kind.name(), "Dropping update: {e}");
        }
    }

    fn delete_logged(&self, kind: WatchKind, obj: Object) {
        if obj.kind() != kind.name() {
            metrics::record_store_event(kind.name(), "dropped");
            warn!(
                kind = kind.name(),
                found = obj.kind(),
                "Dropping delete: obj was not of the correct type"
            );
            return;
        }
        self.remove(kind, &obj.key());
    }

    /// Apply an added or updated object to the store for `kind`, running change detection.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Store`] if `obj` is not of `kind`; nothing is applied.
    pub fn on_apply(&self, kind: WatchKind, obj: Object) -> Result<(), ControllerError> {
        let key = obj.key();
        let event = match kind {
            WatchKind::Service => match upsert(&self.services, Service::from_object(obj)?) {
                Applied::Added(new) => {
                    self.bump_service(service_modified(None, Some(&new)));
                    "add"
                }
                Applied::Updated(old, new) => {
                    self.bump_service(service_modified(Some(&old), Some(&new)));
                    "update"
                }
                Applied::Unchanged => "unchanged",
            },
            WatchKind::Endpoints => match upsert(&self.endpoints, Endpoints::from_object(obj)?) {
                Applied::Added(_) => {
                    self.bump(ModifiedMode::Internal);
                    "add"
                }
                Applied::Updated(old, new) => {
                    if !old.equivalent(&new) {
                        self.bump(ModifiedMode::Internal);
                    }
                    "update"
                }
                Applied::Unchanged => "unchanged",
            },
            WatchKind::Pod => match upsert(&self.pods, Pod::from_object(obj)?) {
                Applied::Added(_) => {
                    self.bump(ModifiedMode::Internal);
                    "add"
                }
                Applied::Updated(..) => {
                    self.bump(ModifiedMode::Internal);
                    "update"
                }
                Applied::Unchanged => "unchanged",
            },
            WatchKind::Namespace => match upsert(&self.namespaces, Namespace::from_object(obj)?) {
                Applied::Added(_) => "add",
                Applied::Updated(..) => "update",
                Applied::Unchanged => "unchanged",
            },
            WatchKind::ServiceImport => {
                match upsert(&self.service_imports, ServiceImport::from_object(obj)?) {
                    Applied::Added(_) => {
                        self.bump(ModifiedMode::MultiCluster);
                        "add"
                    }
                    Applied::Updated(old, new) => {
                        if !old.equivalent(&new) {
                            self.bump(ModifiedMode::MultiCluster);
                        }
                        "update"
                    }
                    Applied::Unchanged => "unchanged",
                }
            }
            WatchKind::MultiClusterEndpoints => match upsert(
                &self.multicluster_endpoints,
                MultiClusterEndpoints::from_object(obj)?,
            ) {
                Applied::Added(_) => {
                    self.bump(ModifiedMode::MultiCluster);
                    "add"
                }
                Applied::Updated(old, new) => {
                    if !old.equivalent(&new) {
                        self.bump(ModifiedMode::MultiCluster);
                    }
                    "update"
                }
                Applied::Unchanged => "unchanged",
            },
        };
        debug!(kind = kind.name(), key = %key, event, "Applied watch event");
        metrics::record_store_event(kind.name(), event);
        metrics::set_store_objects(kind.name(), self.len(kind));
        Ok(())
    }

    /// Remove the object stored under `key` for `kind`, running change detection.
    ///
    /// Returns true if an object was removed.
    pub fn remove(&self, kind: WatchKind, key: &str) -> bool {
        let removed = match kind {
            WatchKind::Service => self.services.delete_by_key(key).map(|old| {
                self.bump_service(service_modified(Some(&old), None));
            }),
            WatchKind::Endpoints => self
                .endpoints
                .delete_by_key(key)
                .map(|_| self.bump(ModifiedMode::Internal)),
            WatchKind::Pod => self
                .pods
                .delete_by_key(key)
                .map(|_| self.bump(ModifiedMode::Internal)),
            WatchKind::Namespace => self.namespaces.delete_by_key(key).map(|_| ()),
            WatchKind::ServiceImport => self
                .service_imports
                .delete_by_key(key)
                .map(|_| self.bump(ModifiedMode::MultiCluster)),
            WatchKind::MultiClusterEndpoints => self
                .multicluster_endpoints
                .delete_by_key(key)
                .map(|_| self.bump(ModifiedMode::MultiCluster)),
        }
        .is_some();

        if removed {
            debug!(kind = kind.name(), key, "Removed object");
            metrics::record_store_event(kind.name(), "delete");
            metrics::set_store_objects(kind.name(), self.len(kind));
        }
        removed
    }

    fn keys(&self, kind: WatchKind) -> Vec<String> {
        match kind {
            WatchKind::Service => self.services.list_keys(),
            WatchKind::Endpoints => self.endpoints.list_keys(),
            WatchKind::Pod => self.pods.list_keys(),
            WatchKind::Namespace => self.namespaces.list_keys(),
            WatchKind::ServiceImport => self.service_imports.list_keys(),
            WatchKind::MultiClusterEndpoints => self.multicluster_endpoints.list_keys(),
        }
    }

    /// Number of objects held for `kind`.
    #[must_use]
    pub fn len(&self, kind: WatchKind) -> usize {
        match kind {
            WatchKind::Service => self.services.len(),
            WatchKind::Endpoints => self.endpoints.len(),
            WatchKind::Pod => self.pods.len(),
            WatchKind::Namespace => self.namespaces.len(),
            WatchKind::ServiceImport => self.service_imports.len(),
            WatchKind::MultiClusterEndpoints => self.multicluster_endpoints.len(),
        }
    }

    fn bump_service(&self, (internal, external): (bool, bool)) {
        if internal {
            self.bump(ModifiedMode::Internal);
        }
        if external {
            self.bump(ModifiedMode::External);
        }
    }

    fn bump(&self, mode: ModifiedMode) {
        let now = chrono::Utc::now().timestamp();
        let slot = match mode {
            ModifiedMode::Internal => &self.internal_modified,
            ModifiedMode::External => &self.external_modified,
            ModifiedMode::MultiCluster => &self.multicluster_modified,
        };
        slot.fetch_max(now, Ordering::AcqRel);
        metrics::record_modified_bump(mode.as_str());
    }
}

impl ClusterState for DnsController {
    fn services_by_index(&self, index: &str) -> Vec<Arc<Service>> {
        self.services.by_index(SVC_NAME_NAMESPACE_INDEX, index)
    }

    fn services_by_ip(&self, ip: &str) -> Vec<Arc<Service>> {
        self.services.by_index(SVC_IP_INDEX, ip)
    }

    fn services_by_external_ip(&self, ip: &str) -> Vec<Arc<Service>> {
        self.services.by_index(SVC_EXTERNAL_IP_INDEX, ip)
    }

    fn endpoints_by_index(&self, index: &str) -> Vec<Arc<Endpoints>> {
        self.endpoints.by_index(EP_NAME_NAMESPACE_INDEX, index)
    }

    fn endpoints_by_ip(&self, ip: &str) -> Vec<Arc<Endpoints>> {
        self.endpoints.by_index(EP_IP_INDEX, ip)
    }

    fn pods_by_ip(&self, ip: &str) -> Vec<Arc<Pod>> {
        self.pods.by_index(POD_IP_INDEX, ip)
    }

    fn service_imports_by_index(&self, index: &str) -> Vec<Arc<ServiceImport>> {
        self.service_imports
            .by_index(SVC_IMPORT_NAME_NAMESPACE_INDEX, index)
    }

    fn multicluster_endpoints_by_index(&self, index: &str) -> Vec<Arc<MultiClusterEndpoints>> {
        self.multicluster_endpoints
            .by_index(MC_EP_NAME_NAMESPACE_INDEX, index)
    }

    fn namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get_by_key(name)
    }

    fn has_synced(&self) -> bool {
        WatchKind::ALL
            .iter()
            .filter(|kind| self.options.enabled(**kind))
            .all(|kind| self.kind_synced(*kind))
    }

    fn modified(&self, mode: ModifiedMode) -> i64 {
        match mode {
            ModifiedMode::Internal => self.internal_modified.load(Ordering::Acquire),
            ModifiedMode::External => self.external_modified.load(Ordering::Acquire),
            ModifiedMode::MultiCluster => self.multicluster_modified.load(Ordering::Acquire),
        }
    }
}

/// Store key of a raw resource, matching [`ClusterObject::key`] of its projection.
fn resource_key<K: Resource>(obj: &K) -> String {
    store_key(&obj.name_any(), &obj.namespace().unwrap_or_default())
}

fn convert_service(svc: &ServiceResource) -> Option<Object> {
    Some(Service::from_resource(svc).into_object())
}

fn convert_endpoints(slice: &EndpointSlice) -> Option<Object> {
    Endpoints::from_resource(slice).map(ClusterObject::into_object)
}

fn convert_pod(pod: &PodResource) -> Option<Object> {
    Some(Pod::from_resource(pod).into_object())
}

fn convert_namespace(ns: &NamespaceResource) -> Option<Object> {
    Some(Namespace::from_resource(ns).into_object())
}

fn convert_service_import(import: &ServiceImportResource) -> Option<Object> {
    Some(ServiceImport::from_resource(import).into_object())
}

fn convert_multicluster_endpoints(slice: &EndpointSlice) -> Option<Object> {
    MultiClusterEndpoints::from_resource(slice).map(ClusterObject::into_object)
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
