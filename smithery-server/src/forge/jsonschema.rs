// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use serde_json::Value;

use smithery_common::constant::DEFAULT_WIDGET_VERSION;
use smithery_common::utils::{nested, nested_mut, nested_object, set_nested};

use crate::forge::error::{SchemaError, SchemaResult};

const API_REF_KEY: &str = "apiRef";
const WIDGET_DATA_KEY: &str = "widgetData";
const WIDGET_DATA_TEMPLATE_KEY: &str = "widgetDataTemplate";
const RESOURCES_REFS_KEY: &str = "resourcesRefs";
const RESOURCES_REFS_TEMPLATE_KEY: &str = "resourcesRefsTemplate";
const ALLOWED_RESOURCES_KEY: &str = "allowedResources";

// Identity fields of the custom resource, never part of its spec
const IDENTITY_FIELDS: &[&str] = &["kind", "apiVersion"];

/// Structural fragments injected into every widget spec, keyed by the
/// property they are stored under
const FRAGMENTS: &[(&str, &str)] = &[
    (API_REF_KEY, include_str!("../../assets/apiRef.json")),
    (WIDGET_DATA_TEMPLATE_KEY, include_str!("../../assets/widgetDataTemplate.json")),
    (RESOURCES_REFS_KEY, include_str!("../../assets/resourcesRefs.json")),
    (RESOURCES_REFS_TEMPLATE_KEY, include_str!("../../assets/resourcesRefsTemplate.json")),
];

fn allowed_resources_path() -> [&'static str; 6] {
    ["properties", "spec", "properties", WIDGET_DATA_KEY, "properties", ALLOWED_RESOURCES_KEY]
}

fn resource_enum_path() -> [&'static str; 7] {
    ["properties", RESOURCES_REFS_KEY, "properties", "items", "items", "properties", "resource"]
}

/// Read the widget kind and version from the `default` of the matching
/// properties.
///
/// The version falls back to the last segment of `apiVersion`, then to
/// `v1alpha1`. An empty kind is returned as is.
pub fn extract_kind_and_version(schema: &Value) -> SchemaResult<(String, String)> {
    let properties = nested_object(schema, &["properties"])
        .ok_or_else(|| SchemaError::InvalidSchema("missing 'properties' field".to_string()))?;

    let default_of = |key: &str| -> String {
        properties
            .get(key)
            .and_then(|prop| prop.get("default"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let kind = default_of("kind");
    let mut version = default_of("version");
    if version.is_empty() {
        let api_version = default_of("apiVersion");
        if let Some(idx) = api_version.rfind('/').filter(|idx| *idx > 0) {
            version = api_version[idx + 1..].to_string();
        }
    }
    if version.is_empty() {
        version = DEFAULT_WIDGET_VERSION.to_string();
    }

    Ok((kind, version))
}

/// String enum values of `widgetData.allowedResources`, in source order.
///
/// Missing paths and non string nodes yield an empty list.
pub fn extract_allowed_resources(schema: &Value) -> Vec<String> {
    let Some(node) = nested_object(schema, &allowed_resources_path()) else {
        return Vec::new();
    };

    if node.get("type").and_then(Value::as_str) != Some("string") {
        return Vec::new();
    }

    node.get("enum")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Take `properties.spec` out of a widget schema and prepare it for CRD
/// generation: inject the fixed fragments and drop identity fields from
/// `required`.
pub fn extract_spec(mut schema: Value) -> SchemaResult<Value> {
    let mut spec = nested_mut(&mut schema, &["properties", "spec"])
        .map(Value::take)
        .ok_or_else(|| SchemaError::InvalidSchema("properties.spec not found in JSON schema".to_string()))?;

    if !spec.is_object() {
        return Err(SchemaError::InvalidSchema("properties.spec is not an object".to_string()));
    }

    for &(key, source) in FRAGMENTS {
        let fragment: Value = serde_json::from_str(source)
            .map_err(|e| SchemaError::Asset(key, e.to_string()))?;

        if !set_nested(&mut spec, &["properties", key], fragment) {
            return Err(SchemaError::InvalidSchema("properties.spec.properties is not an object".to_string()));
        }
    }

    if let Some(required) = spec.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|field| {
            field
                .as_str()
                .map_or(true, |name| !IDENTITY_FIELDS.contains(&name))
        });
    }

    Ok(spec)
}

/// Constrain `resourcesRefs` items to the given resources.
///
/// No-op when `allowed` is empty. Expects a spec returned by
/// [`extract_spec`].
pub fn set_allowed_resources(mut spec: Value, allowed: &[String]) -> SchemaResult<Value> {
    if allowed.is_empty() {
        return Ok(spec);
    }

    let path = resource_enum_path();
    let node = nested_mut(&mut spec, &path)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| SchemaError::FieldNotFound(path.join(".")))?;

    node.insert(
        "enum".to_string(),
        Value::Array(allowed.iter().cloned().map(Value::String).collect()),
    );

    Ok(spec)
}
