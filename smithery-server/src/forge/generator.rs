// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::collections::BTreeMap;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
    CustomResourceDefinitionVersion, CustomResourceSubresourceStatus, CustomResourceSubresources,
    CustomResourceValidation, JSONSchemaProps,
};
use kube::api::{GroupVersionKind, ObjectMeta};

use crate::forge::error::{GeneratorError, GeneratorResult};

/// Everything a generator needs to produce a CRD manifest
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub gvk: GroupVersionKind,
    /// JSON Schema of the `spec` field
    pub spec_schema: Vec<u8>,
    /// JSON Schema of the `status` field
    pub status_schema: Vec<u8>,
    pub categories: Vec<String>,
}

/// Turns a GVK and two JSON Schemas into a CRD manifest
pub trait CrdGenerator: Send + Sync {
    fn generate(&self, options: &GenerateOptions) -> GeneratorResult<Vec<u8>>;
}

/// Generates a namespaced, single version CRD as YAML with a status
/// subresource.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaCrdGenerator;

impl CrdGenerator for SchemaCrdGenerator {
    fn generate(&self, options: &GenerateOptions) -> GeneratorResult<Vec<u8>> {
        let crd = build_crd(options)?;
        Ok(serde_norway::to_string(&crd)?.into_bytes())
    }
}

fn typed(type_: &str) -> JSONSchemaProps {
    JSONSchemaProps {
        type_: Some(type_.to_string()),
        ..Default::default()
    }
}

pub fn build_crd(options: &GenerateOptions) -> GeneratorResult<CustomResourceDefinition> {
    let gvk = &options.gvk;
    if gvk.kind.is_empty() {
        return Err(GeneratorError::EmptyKind);
    }
    if gvk.version.is_empty() {
        return Err(GeneratorError::EmptyVersion);
    }

    let spec: JSONSchemaProps = serde_json::from_slice(&options.spec_schema)
        .map_err(|e| GeneratorError::InvalidSchema("spec", e))?;
    let status: JSONSchemaProps = serde_json::from_slice(&options.status_schema)
        .map_err(|e| GeneratorError::InvalidSchema("status", e))?;

    let singular = gvk.kind.to_lowercase();
    let plural = pluralize(&singular);

    let root = JSONSchemaProps {
        type_: Some("object".to_string()),
        properties: Some(BTreeMap::from([
            ("apiVersion".to_string(), typed("string")),
            ("kind".to_string(), typed("string")),
            ("metadata".to_string(), typed("object")),
            ("spec".to_string(), spec),
            ("status".to_string(), status),
        ])),
        ..Default::default()
    };

    Ok(CustomResourceDefinition {
        metadata: ObjectMeta {
            name: Some(format!("{}.{}", plural, gvk.group)),
            ..Default::default()
        },
        spec: CustomResourceDefinitionSpec {
            group: gvk.group.clone(),
            names: CustomResourceDefinitionNames {
                kind: gvk.kind.clone(),
                list_kind: Some(format!("{}List", gvk.kind)),
                plural,
                singular: Some(singular),
                categories: (!options.categories.is_empty()).then(|| options.categories.clone()),
                ..Default::default()
            },
            scope: "Namespaced".to_string(),
            versions: vec![CustomResourceDefinitionVersion {
                name: gvk.version.clone(),
                served: true,
                storage: true,
                schema: Some(CustomResourceValidation {
                    open_api_v3_schema: Some(root),
                }),
                subresources: Some(CustomResourceSubresources {
                    status: Some(CustomResourceSubresourceStatus(serde_json::json!({}))),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    })
}

/// English plural of a lowercase kind, the way resource names are usually
/// derived
pub fn pluralize(singular: &str) -> String {
    const SIBILANT_SUFFIXES: &[&str] = &["s", "x", "z", "ch", "sh"];

    if SIBILANT_SUFFIXES.iter().any(|suffix| singular.ends_with(suffix)) {
        return format!("{}es", singular);
    }

    if let Some(stem) = singular.strip_suffix('y') {
        let consonant_before = stem
            .chars()
            .last()
            .is_some_and(|c| !"aeiou".contains(c));
        if consonant_before {
            return format!("{}ies", stem);
        }
    }

    format!("{}s", singular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn options(kind: &str) -> GenerateOptions {
        GenerateOptions {
            gvk: GroupVersionKind::gvk("widgets.templates.krateo.io", "v1beta1", kind),
            spec_schema: br#"{"type":"object","properties":{"label":{"type":"string"}},"required":["label"]}"#.to_vec(),
            status_schema: br#"{"type":"object","additionalProperties":true,"x-kubernetes-preserve-unknown-fields":true}"#.to_vec(),
            categories: vec!["widgets".to_string(), "krateo".to_string()],
        }
    }

    #[test]
    fn plurals_follow_english_rules() {
        assert_eq!(pluralize("button"), "buttons");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("policy"), "policies");
        assert_eq!(pluralize("gateway"), "gateways");
    }

    #[test]
    fn crd_carries_names_and_schemas() {
        let crd = build_crd(&options("LineChart")).unwrap();

        assert_eq!(crd.metadata.name.as_deref(), Some("linecharts.widgets.templates.krateo.io"));
        assert_eq!(crd.spec.names.plural, "linecharts");
        assert_eq!(crd.spec.names.list_kind.as_deref(), Some("LineChartList"));
        assert_eq!(crd.spec.names.categories, Some(vec!["widgets".to_string(), "krateo".to_string()]));

        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1beta1");
        assert!(version.served && version.storage);

        let root = version.schema.as_ref().unwrap().open_api_v3_schema.as_ref().unwrap();
        let properties = root.properties.as_ref().unwrap();
        assert_eq!(properties["spec"].required, Some(vec!["label".to_string()]));
        assert_eq!(properties["status"].x_kubernetes_preserve_unknown_fields, Some(true));
    }

    #[test]
    fn manifest_is_yaml() {
        let manifest = SchemaCrdGenerator.generate(&options("Button")).unwrap();
        let value: serde_json::Value = serde_norway::from_slice(&manifest).unwrap();

        assert_eq!(value["apiVersion"], json!("apiextensions.k8s.io/v1"));
        assert_eq!(value["kind"], json!("CustomResourceDefinition"));
        assert_eq!(value["spec"]["group"], json!("widgets.templates.krateo.io"));
        assert_eq!(value["spec"]["versions"][0]["subresources"]["status"], json!({}));
    }

    #[test]
    fn empty_kind_and_bad_schemas_fail() {
        assert!(matches!(SchemaCrdGenerator.generate(&options("")), Err(GeneratorError::EmptyKind)));

        let mut bad = options("Button");
        bad.spec_schema = b"not json".to_vec();
        assert!(matches!(build_crd(&bad), Err(GeneratorError::InvalidSchema("spec", _))));
    }
}
