// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub mod error;
pub mod generator;
pub mod jsonschema;

use std::sync::Arc;
use std::time::Instant;
use kube::api::{DynamicObject, GroupVersionKind};
use serde_json::{json, Value};

use smithery_common::config::WidgetsConfig;
use smithery_common::telemetry::info;
use smithery_common::utils::eta;
use smithery_dynamic::client::{object_from_yaml, ResourceApi};
use smithery_dynamic::crd::{crd_coordinate, stamp_crd_type_meta};

use crate::forge::error::{ForgeError, ForgeResult};
use crate::forge::generator::{CrdGenerator, GenerateOptions, SchemaCrdGenerator};
use crate::forge::jsonschema::{extract_allowed_resources, extract_kind_and_version, extract_spec, set_allowed_resources};

/// Status is never validated, anything the widget writes is kept
pub fn status_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": true,
        "x-kubernetes-preserve-unknown-fields": true
    })
}

/// A generated CRD manifest and, when applied, the object stored by the cluster
#[derive(Debug)]
pub struct Forged {
    pub kind: String,
    pub version: String,
    pub manifest: Vec<u8>,
    pub applied: Option<DynamicObject>,
}

/// Turns widget JSON Schemas into CRDs.
///
/// Every step runs in order and the first failure aborts the run, so a
/// partially transformed schema is never generated nor applied.
#[derive(Clone)]
pub struct Forge {
    group: String,
    categories: Vec<String>,
    generator: Arc<dyn CrdGenerator>,
}

impl Forge {
    pub fn new(group: &str, categories: Vec<String>) -> Self {
        Self {
            group: group.to_string(),
            categories,
            generator: Arc::new(SchemaCrdGenerator),
        }
    }

    pub fn from_config(config: &WidgetsConfig) -> Self {
        Self::new(&config.group, config.categories.clone())
    }

    pub fn with_generator(mut self, generator: Arc<dyn CrdGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Run the schema pipeline and the generator, without touching the cluster
    pub fn generate(&self, schema: Value) -> ForgeResult<Forged> {
        let (kind, version) = extract_kind_and_version(&schema).map_err(ForgeError::Identity)?;
        let allowed_resources = extract_allowed_resources(&schema);

        let mut spec = extract_spec(schema).map_err(ForgeError::Spec)?;
        if !allowed_resources.is_empty() {
            spec = set_allowed_resources(spec, &allowed_resources).map_err(ForgeError::AllowedResources)?;
        }

        let options = GenerateOptions {
            gvk: GroupVersionKind::gvk(&self.group, &version, &kind),
            spec_schema: serde_json::to_vec(&spec).map_err(ForgeError::Marshal)?,
            status_schema: serde_json::to_vec(&status_schema()).map_err(ForgeError::Marshal)?,
            categories: self.categories.clone(),
        };

        info!(event = "GeneratingCRD", kind = kind.as_str(), version = version.as_str());
        let start = Instant::now();
        let manifest = self.generator.generate(&options).map_err(ForgeError::Generate)?;
        info!(
            event = "GeneratedCRD",
            kind = kind.as_str(),
            version = version.as_str(),
            duration = eta(start).as_str(),
        );

        Ok(Forged { kind, version, manifest, applied: None })
    }

    /// Apply a generated CRD and refresh discovery so its kind resolves
    pub async fn apply(&self, mut forged: Forged, client: &dyn ResourceApi) -> ForgeResult<Forged> {
        info!(event = "ApplyingCRD", kind = forged.kind.as_str(), version = forged.version.as_str());
        let start = Instant::now();

        let mut object = object_from_yaml(&forged.manifest).map_err(ForgeError::Apply)?;
        stamp_crd_type_meta(&mut object);

        let applied = client.apply(&crd_coordinate(), object).await.map_err(ForgeError::Apply)?;
        client.refresh_discovery().await;

        info!(
            event = "AppliedCRD",
            kind = forged.kind.as_str(),
            version = forged.version.as_str(),
            duration = eta(start).as_str(),
        );
        forged.applied = Some(applied);

        Ok(forged)
    }

    /// Generate the CRD and, when a client is given, apply it to the cluster
    pub async fn forge(&self, schema: Value, client: Option<&dyn ResourceApi>) -> ForgeResult<Forged> {
        let forged = self.generate(schema)?;

        match client {
            Some(client) => self.apply(forged, client).await,
            None => Ok(forged),
        }
    }
}
