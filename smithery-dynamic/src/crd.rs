// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::api::{DynamicObject, TypeMeta};
use serde_json::Value;

use smithery_common::utils::nested;

use crate::coordinate::ResourceCoordinate;
use crate::discovery::DiscoveredResource;
use crate::error::{DynamicError, Result};

pub static CRD_GROUP: &str = "apiextensions.k8s.io";
pub static CRD_VERSION: &str = "v1";
pub static CRD_RESOURCE: &str = "customresourcedefinitions";
pub static CRD_KIND: &str = "CustomResourceDefinition";

/// Coordinate of the cluster scoped CustomResourceDefinition type
pub fn crd_coordinate() -> ResourceCoordinate {
    ResourceCoordinate::from_gvr(CRD_GROUP, CRD_VERSION, CRD_RESOURCE)
}

/// Canonical CRD object name, `<plural>.<group>`
pub fn crd_name(resource: &str, group: &str) -> String {
    format!("{}.{}", resource, group)
}

/// Overwrite the type meta of a manifest so it is always applied as a CRD
pub fn stamp_crd_type_meta(object: &mut DynamicObject) {
    object.types = Some(TypeMeta {
        api_version: format!("{}/{}", CRD_GROUP, CRD_VERSION),
        kind: CRD_KIND.to_string(),
    });
}

/// Discovery entry for the CRD type itself
pub fn crd_discovered_resource() -> DiscoveredResource {
    DiscoveredResource {
        group: CRD_GROUP.to_string(),
        version: CRD_VERSION.to_string(),
        kind: CRD_KIND.to_string(),
        plural: CRD_RESOURCE.to_string(),
        singular: "customresourcedefinition".to_string(),
        short_names: vec!["crd".to_string(), "crds".to_string()],
        categories: vec![],
        namespaced: false,
        preferred: true,
    }
}

fn versions(crd: &DynamicObject) -> Option<&Vec<Value>> {
    nested(&crd.data, &["spec", "versions"]).and_then(Value::as_array)
}

/// Names of every version declared by a CRD, in declaration order
pub fn version_names(crd: &DynamicObject) -> Vec<String> {
    versions(crd)
        .map(|versions| {
            versions
                .iter()
                .filter_map(|v| v.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract `schema.openAPIV3Schema` of the given version of a CRD
pub fn openapi_schema(crd: &DynamicObject, version: &str) -> Result<Value> {
    let versions = versions(crd)
        .ok_or_else(|| DynamicError::NotFound("no versions found in CRD".to_string()))?;

    let entry = versions
        .iter()
        .find(|v| v.get("name").and_then(Value::as_str) == Some(version))
        .ok_or_else(|| DynamicError::NotFound(format!("version [{}] not found in CRD schema", version)))?;

    nested(entry, &["schema", "openAPIV3Schema"])
        .filter(|schema| schema.is_object())
        .cloned()
        .ok_or_else(|| DynamicError::NotFound(format!("schema OpenAPI v3 not found for version: {}", version)))
}
