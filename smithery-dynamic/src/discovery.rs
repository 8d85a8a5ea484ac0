// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use futures::future::join_all;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::Client;
use tokio::sync::RwLock;
use tokio::time::Instant;

use smithery_common::config::KubernetesConfig;
use smithery_common::telemetry::{debug, warn};

use crate::coordinate::ResourceCoordinate;
use crate::error::Result;

/// One resource type as advertised by the API server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredResource {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub singular: String,
    pub short_names: Vec<String>,
    pub categories: Vec<String>,
    pub namespaced: bool,
    /// Whether `version` is the server preferred version of the group
    pub preferred: bool,
}

impl DiscoveredResource {
    pub fn from_api_resource(group: &str, version: &str, preferred: bool, resource: &APIResource) -> Self {
        DiscoveredResource {
            group: resource.group.clone().unwrap_or_else(|| group.to_string()),
            version: resource.version.clone().unwrap_or_else(|| version.to_string()),
            kind: resource.kind.clone(),
            plural: resource.name.clone(),
            singular: if resource.singular_name.is_empty() {
                resource.kind.to_lowercase()
            } else {
                resource.singular_name.clone()
            },
            short_names: resource.short_names.clone().unwrap_or_default(),
            categories: resource.categories.clone().unwrap_or_default(),
            namespaced: resource.namespaced,
            preferred,
        }
    }

    /// Case insensitive match against plural, singular, short names or categories
    pub fn matches(&self, name: &str) -> bool {
        self.plural.eq_ignore_ascii_case(name)
            || self.singular.eq_ignore_ascii_case(name)
            || self.short_names.iter().any(|short| short.eq_ignore_ascii_case(name))
            || self.categories.iter().any(|category| category.eq_ignore_ascii_case(name))
    }

    pub fn coordinate(&self) -> ResourceCoordinate {
        ResourceCoordinate {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
            resource: self.plural.clone(),
            namespace: None,
        }
    }
}

fn from_resource_list(group: &str, version: &str, preferred: bool, list: &APIResourceList) -> Vec<DiscoveredResource> {
    list.resources
        .iter()
        // Subresources such as `pods/log` are not addressable on their own
        .filter(|resource| !resource.name.contains('/'))
        .map(|resource| DiscoveredResource::from_api_resource(group, version, preferred, resource))
        .collect()
}

/// Anything able to list every resource type served by a cluster
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn discover_resources(&self) -> Result<Vec<DiscoveredResource>>;
}

#[async_trait]
impl DiscoverySource for Client {
    /// Walks `/api` and `/apis`. A group version that fails to answer, such
    /// as an aggregated API whose backend is down, is logged and skipped.
    async fn discover_resources(&self) -> Result<Vec<DiscoveredResource>> {
        let core_versions = self.list_core_api_versions().await?;
        let groups = self.list_api_groups().await?;

        let mut requests = Vec::new();
        for (index, version) in core_versions.versions.iter().enumerate() {
            requests.push(GroupVersionRequest {
                group: String::new(),
                version: version.clone(),
                group_version: version.clone(),
                preferred: index == 0,
            });
        }
        for group in &groups.groups {
            let preferred = group
                .preferred_version
                .as_ref()
                .map(|p| p.version.clone())
                .or_else(|| group.versions.first().map(|v| v.version.clone()))
                .unwrap_or_default();

            for version in &group.versions {
                requests.push(GroupVersionRequest {
                    group: group.name.clone(),
                    version: version.version.clone(),
                    group_version: version.group_version.clone(),
                    preferred: version.version == preferred,
                });
            }
        }

        let lists = join_all(requests.iter().map(|request| async move {
            if request.group.is_empty() {
                self.list_core_api_resources(&request.group_version).await
            } else {
                self.list_api_group_resources(&request.group_version).await
            }
        }))
        .await;

        let mut resources = Vec::new();
        for (request, list) in requests.iter().zip(lists) {
            match list {
                Ok(list) => resources.extend(from_resource_list(&request.group, &request.version, request.preferred, &list)),
                Err(e) => warn!(
                    event = "DiscoveryGroupFailed",
                    group_version = request.group_version.as_str(),
                    error = %e,
                ),
            }
        }

        debug!(event = "DiscoveryFetched", resources = resources.len());
        Ok(resources)
    }
}

struct GroupVersionRequest {
    group: String,
    version: String,
    group_version: String,
    preferred: bool,
}

struct CachedDiscovery {
    fetched_at: Instant,
    resources: Arc<Vec<DiscoveredResource>>,
}

/// Process local discovery cache shared between requests.
///
/// Entries are fetched lazily and reused until `ttl` elapses. Concurrent
/// misses may fetch twice, the last writer wins.
pub struct DiscoveryCache {
    ttl: Option<Duration>,
    entries: RwLock<Option<CachedDiscovery>>,
}

impl DiscoveryCache {
    /// A `ttl` of `None` keeps entries for the process lifetime
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { ttl, entries: RwLock::new(None) }
    }

    pub fn from_config(config: &KubernetesConfig) -> Self {
        match config.discovery_ttl_secs {
            0 => Self::new(None),
            secs => Self::new(Some(Duration::from_secs(secs))),
        }
    }

    pub async fn resources(&self, source: &dyn DiscoverySource) -> Result<Arc<Vec<DiscoveredResource>>> {
        if let Some(cached) = self.entries.read().await.as_ref() {
            let fresh = self.ttl.map_or(true, |ttl| cached.fetched_at.elapsed() < ttl);
            if fresh {
                return Ok(cached.resources.clone());
            }
        }

        let resources = Arc::new(source.discover_resources().await?);
        *self.entries.write().await = Some(CachedDiscovery {
            fetched_at: Instant::now(),
            resources: resources.clone(),
        });

        Ok(resources)
    }

    /// Drop cached entries so the next lookup sees newly installed types
    pub async fn invalidate(&self) {
        *self.entries.write().await = None;
    }
}

impl Default for DiscoveryCache {
    fn default() -> Self {
        Self::new(None)
    }
}
