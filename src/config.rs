// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration types for kubedns.
//!
//! Configuration is read from a YAML file. Every field has a default so an empty
//! document yields a working `cluster.local.` authority.
//!
//! ```yaml
//! zones: ["cluster.local.", "in-addr.arpa.", "clusterset.local."]
//! multiclusterZones: ["clusterset.local."]
//! ttl: 30
//! podMode: verified
//! endpointPodNames: false
//! namespaces: []
//! autopath: ["example.internal."]
//! ```

use crate::constants::{
    DEFAULT_HEALTH_LISTEN_ADDRESS, DEFAULT_LISTEN_ADDRESS, DEFAULT_TTL_SECS, IPV4_REVERSE_SUFFIX,
    IPV6_REVERSE_SUFFIX, MAX_TTL_SECS,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;

/// How `<ip>.<ns>.pod.<zone>` queries are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodMode {
    /// Pod queries always answer NXDOMAIN.
    #[default]
    Disabled,
    /// The IP encoded in the name is echoed back without verification.
    Insecure,
    /// The IP must belong to a pod in the queried namespace.
    Verified,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Zones we are authoritative for. The first non-reverse zone is the primary zone.
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,

    /// Subset of `zones` answered from service imports.
    #[serde(default)]
    pub multicluster_zones: Vec<String>,

    /// TTL for every synthesized record.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Pod query mode.
    #[serde(default)]
    pub pod_mode: PodMode,

    /// Name headless endpoints after their target pod when they carry no hostname.
    #[serde(default)]
    pub endpoint_pod_names: bool,

    /// Answer NXDOMAIN for `ClusterIP` services without ready endpoints.
    #[serde(default)]
    pub ignore_empty_service: bool,

    /// Do not watch endpoints. Headless and SRV lookups degrade to NXDOMAIN.
    #[serde(default)]
    pub no_endpoints: bool,

    /// Namespaces exposed through DNS. Empty exposes all namespaces.
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Label selector applied to services and endpoints.
    #[serde(default)]
    pub label_selector: Option<String>,

    /// Label selector restricting which namespaces are exposed.
    #[serde(default)]
    pub namespace_label_selector: Option<String>,

    /// Host search path appended to the cluster search path for autopath.
    /// `None` disables autopath.
    #[serde(default)]
    pub autopath: Option<Vec<String>>,

    /// UDP address the DNS server listens on.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Address of the health and metrics HTTP server.
    #[serde(default = "default_health_listen")]
    pub health_listen: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            multicluster_zones: Vec::new(),
            ttl: default_ttl(),
            pod_mode: PodMode::default(),
            endpoint_pod_names: false,
            ignore_empty_service: false,
            no_endpoints: false,
            namespaces: Vec::new(),
            label_selector: None,
            namespace_label_selector: None,
            autopath: None,
            listen: default_listen(),
            health_listen: default_health_listen(),
        }
    }
}

fn default_zones() -> Vec<String> {
    vec!["cluster.local.".to_string()]
}

fn default_ttl() -> u32 {
    DEFAULT_TTL_SECS
}

fn default_listen() -> SocketAddr {
    DEFAULT_LISTEN_ADDRESS
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], crate::constants::DNS_PORT)))
}

fn default_health_listen() -> SocketAddr {
    DEFAULT_HEALTH_LISTEN_ADDRESS
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)))
}

impl Config {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or fails
    /// [`Config::validate`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid or fails validation.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(raw).context("Failed to parse config")?
        };
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Lowercase zones and make them absolute.
    pub fn normalize(&mut self) {
        for zone in self.zones.iter_mut().chain(self.multicluster_zones.iter_mut()) {
            *zone = fqdn(zone);
        }
        if let Some(search) = self.autopath.as_mut() {
            for domain in search.iter_mut() {
                *domain = fqdn(domain);
            }
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no zone is configured, a multi-cluster zone is not also
    /// a configured zone, or the TTL is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            bail!("At least one zone must be configured");
        }
        for zone in &self.multicluster_zones {
            if !self.zones.contains(zone) {
                bail!("Multicluster zone {zone} is not listed in zones");
            }
        }
        if self.ttl > MAX_TTL_SECS {
            bail!("ttl {} exceeds the maximum of {MAX_TTL_SECS}", self.ttl);
        }
        Ok(())
    }

    /// The primary zone: the first configured zone that is not a reverse zone.
    #[must_use]
    pub fn primary_zone(&self) -> &str {
        self.zones
            .iter()
            .find(|z| !is_reverse_zone(z))
            .or_else(|| self.zones.first())
            .map_or(".", String::as_str)
    }

    /// Whether pods need to be watched.
    #[must_use]
    pub fn init_pod_cache(&self) -> bool {
        self.pod_mode == PodMode::Verified
    }

    /// Whether endpoints need to be watched.
    #[must_use]
    pub fn init_endpoints_cache(&self) -> bool {
        !self.no_endpoints
    }

    /// Whether service imports and multi-cluster endpoints need to be watched.
    #[must_use]
    pub fn multicluster(&self) -> bool {
        !self.multicluster_zones.is_empty()
    }

    /// The exposed namespaces as a set.
    #[must_use]
    pub fn namespace_set(&self) -> BTreeSet<String> {
        self.namespaces.iter().cloned().collect()
    }
}

/// Lowercase a name and ensure it ends with a dot.
#[must_use]
pub fn fqdn(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with('.') {
        lower
    } else {
        format!("{lower}.")
    }
}

/// Whether a zone is an IPv4 or IPv6 reverse zone.
#[must_use]
pub fn is_reverse_zone(zone: &str) -> bool {
    let zone = fqdn(zone);
    zone == IPV4_REVERSE_SUFFIX[1..]
        || zone == IPV6_REVERSE_SUFFIX[1..]
        || zone.ends_with(IPV4_REVERSE_SUFFIX)
        || zone.ends_with(IPV6_REVERSE_SUFFIX)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
