// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! In-memory [`ResourceApi`] for tests, exported to dependent crates
//! through the `testing` feature.
//!
//! Objects are keyed by group, plural, namespace and name, and every write
//! bumps a resourceVersion so optimistic concurrency behaves like a real
//! API server.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, AtomicU64, Ordering};
use async_trait::async_trait;
use kube::api::DynamicObject;
use tokio::sync::Mutex;

use crate::client::ResourceApi;
use crate::coordinate::{ResourceCoordinate, RestMapping};
use crate::crd::crd_discovered_resource;
use crate::discovery::DiscoveredResource;
use crate::error::{DynamicError, Result};
use crate::resolver::{discover_matching, resolve_mapping};

type ObjectKey = (String, String, Option<String>, String);

/// Snapshot of how many calls reached each operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get: usize,
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Default)]
struct Counters {
    get: AtomicUsize,
    list: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

pub struct MemoryClient {
    resources: Vec<DiscoveredResource>,
    objects: Mutex<BTreeMap<ObjectKey, DynamicObject>>,
    pending_conflicts: Mutex<usize>,
    next_version: AtomicU64,
    counters: Counters,
    apply_max_attempts: u32,
}

impl MemoryClient {
    pub fn new(resources: Vec<DiscoveredResource>) -> Self {
        Self {
            resources,
            objects: Mutex::new(BTreeMap::new()),
            pending_conflicts: Mutex::new(0),
            next_version: AtomicU64::new(1),
            counters: Counters::default(),
            apply_max_attempts: 1,
        }
    }

    /// A cluster that only serves CustomResourceDefinitions
    pub fn with_crds() -> Self {
        Self::new(vec![crd_discovered_resource()])
    }

    pub fn with_apply_max_attempts(mut self, attempts: u32) -> Self {
        self.apply_max_attempts = attempts.max(1);
        self
    }

    /// Make the next `count` updates fail with a conflict, as if another
    /// writer got in first
    pub async fn fail_next_updates(&self, count: usize) {
        *self.pending_conflicts.lock().await = count;
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            get: self.counters.get.load(Ordering::SeqCst),
            list: self.counters.list.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            update: self.counters.update.load(Ordering::SeqCst),
            delete: self.counters.delete.load(Ordering::SeqCst),
        }
    }

    pub fn reset_calls(&self) {
        for counter in [
            &self.counters.get,
            &self.counters.list,
            &self.counters.create,
            &self.counters.update,
            &self.counters.delete,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    fn mapping(&self, coord: &ResourceCoordinate) -> Result<RestMapping> {
        resolve_mapping(&self.resources, coord)
    }

    fn key(mapping: &RestMapping, coord: &ResourceCoordinate, name: &str) -> ObjectKey {
        let namespace = if mapping.namespaced {
            coord.namespace.clone().filter(|ns| !ns.is_empty())
        } else {
            None
        };
        (mapping.group.clone(), mapping.resource.clone(), namespace, name.to_string())
    }

    fn object_name(object: &DynamicObject) -> Result<String> {
        object
            .metadata
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DynamicError::Invalid("metadata.name is required".to_string()))
    }

    fn bump_version(&self, object: &mut DynamicObject) {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        object.metadata.resource_version = Some(version.to_string());
    }
}

#[async_trait]
impl ResourceApi for MemoryClient {
    async fn get(&self, coord: &ResourceCoordinate, name: &str) -> Result<DynamicObject> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        let mapping = self.mapping(coord)?;

        self.objects
            .lock()
            .await
            .get(&Self::key(&mapping, coord, name))
            .cloned()
            .ok_or_else(|| DynamicError::NotFound(format!("{} \"{}\" not found", mapping.resource, name)))
    }

    async fn list(&self, coord: &ResourceCoordinate) -> Result<Vec<DynamicObject>> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        let mapping = self.mapping(coord)?;
        let namespace = coord.namespace.clone().filter(|ns| mapping.namespaced && !ns.is_empty());

        Ok(self.objects
            .lock()
            .await
            .iter()
            .filter(|((group, resource, ns, _), _)| {
                *group == mapping.group
                    && *resource == mapping.resource
                    && (namespace.is_none() || *ns == namespace)
            })
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn create(&self, coord: &ResourceCoordinate, object: &DynamicObject) -> Result<DynamicObject> {
        self.counters.create.fetch_add(1, Ordering::SeqCst);
        let mapping = self.mapping(coord)?;
        let name = Self::object_name(object)?;
        let key = Self::key(&mapping, coord, &name);

        let mut objects = self.objects.lock().await;
        if objects.contains_key(&key) {
            return Err(DynamicError::AlreadyExists(format!("{} \"{}\" already exists", mapping.resource, name)));
        }

        let mut stored = object.clone();
        self.bump_version(&mut stored);
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, coord: &ResourceCoordinate, object: &DynamicObject) -> Result<DynamicObject> {
        self.counters.update.fetch_add(1, Ordering::SeqCst);
        let mapping = self.mapping(coord)?;
        let name = Self::object_name(object)?;
        let key = Self::key(&mapping, coord, &name);

        {
            let mut pending = self.pending_conflicts.lock().await;
            if *pending > 0 {
                *pending -= 1;
                // Simulates another writer bumping the stored version
                if let Some(current) = self.objects.lock().await.get_mut(&key) {
                    self.bump_version(current);
                }
                return Err(DynamicError::Conflict(format!("{} \"{}\" was modified", mapping.resource, name)));
            }
        }

        let mut objects = self.objects.lock().await;
        let current = objects
            .get(&key)
            .ok_or_else(|| DynamicError::NotFound(format!("{} \"{}\" not found", mapping.resource, name)))?;

        if let Some(expected) = object.metadata.resource_version.as_deref() {
            if current.metadata.resource_version.as_deref() != Some(expected) {
                return Err(DynamicError::Conflict(format!(
                    "{} \"{}\": the object has been modified",
                    mapping.resource, name
                )));
            }
        }

        let mut stored = object.clone();
        self.bump_version(&mut stored);
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, coord: &ResourceCoordinate, name: &str) -> Result<()> {
        self.counters.delete.fetch_add(1, Ordering::SeqCst);
        let mapping = self.mapping(coord)?;

        self.objects
            .lock()
            .await
            .remove(&Self::key(&mapping, coord, name))
            .map(|_| ())
            .ok_or_else(|| DynamicError::NotFound(format!("{} \"{}\" not found", mapping.resource, name)))
    }

    async fn discover(&self, category: &str) -> Result<Vec<ResourceCoordinate>> {
        Ok(discover_matching(&self.resources, category))
    }

    fn apply_max_attempts(&self) -> u32 {
        self.apply_max_attempts
    }
}
