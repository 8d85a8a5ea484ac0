// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::fmt;
use kube::core::{ApiResource, GroupVersionKind};
use serde::{Deserialize, Serialize};

/// Identifies a resource type by group/version plus either its kind or its
/// plural resource name, optionally scoped to a namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCoordinate {
    pub group: String,
    pub version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl ResourceCoordinate {
    pub fn from_gvk(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    pub fn from_gvr(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
            ..Default::default()
        }
    }

    pub fn within(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn api_version(&self) -> String {
        api_version(&self.group, &self.version)
    }
}

impl fmt::Display for ResourceCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.kind.is_empty() { &self.resource } else { &self.kind };
        write!(f, "{}, {}", self.api_version(), name)
    }
}

/// A coordinate resolved against discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestMapping {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name used in the REST path
    pub resource: String,
    pub namespaced: bool,
}

impl RestMapping {
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, &self.kind);
        ApiResource::from_gvk_with_plural(&gvk, &self.resource)
    }
}

pub fn api_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{}/{}", group, version)
    }
}
