// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub mod dynamic;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

use async_trait::async_trait;
use kube::api::DynamicObject;
use serde_json::Value;

use smithery_common::telemetry::{debug, warn};

use crate::coordinate::ResourceCoordinate;
use crate::error::{DynamicError, Result};

pub use dynamic::DynamicClient;

/// Generic access to any resource type known to the cluster.
///
/// Every call is parameterized by a coordinate, so one client serves all
/// kinds without compiled in types.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn get(&self, coord: &ResourceCoordinate, name: &str) -> Result<DynamicObject>;

    /// Server ordered, not guaranteed stable between calls
    async fn list(&self, coord: &ResourceCoordinate) -> Result<Vec<DynamicObject>>;

    async fn create(&self, coord: &ResourceCoordinate, object: &DynamicObject) -> Result<DynamicObject>;

    async fn update(&self, coord: &ResourceCoordinate, object: &DynamicObject) -> Result<DynamicObject>;

    async fn delete(&self, coord: &ResourceCoordinate, name: &str) -> Result<()>;

    /// Resource types whose names, short names or categories match `category`
    async fn discover(&self, category: &str) -> Result<Vec<ResourceCoordinate>>;

    /// Forget cached discovery so types installed since become resolvable
    async fn refresh_discovery(&self) {}

    /// How many get and update rounds `apply` makes before surfacing a conflict
    fn apply_max_attempts(&self) -> u32 {
        1
    }

    /// Create the object, or replace it when it already exists.
    ///
    /// The server resourceVersion is copied onto `object` before the update,
    /// so a concurrent write in between fails with a conflict. Conflicts are
    /// retried up to `apply_max_attempts` times.
    async fn apply(&self, coord: &ResourceCoordinate, mut object: DynamicObject) -> Result<DynamicObject> {
        let name = object
            .metadata
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DynamicError::InvalidArgument("object has no name".to_string()))?;

        let max_attempts = self.apply_max_attempts().max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;

            let existing = match self.get(coord, &name).await {
                Ok(existing) => existing,
                Err(DynamicError::NotFound(_)) => {
                    debug!(event = "ApplyCreate", resource = %coord, name = name.as_str());
                    return self.create(coord, &object).await;
                }
                Err(e) => return Err(e),
            };

            let resource_version = existing.metadata.resource_version.ok_or_else(|| {
                DynamicError::Invalid(format!("existing object {} has no resourceVersion", name))
            })?;
            object.metadata.resource_version = Some(resource_version);

            debug!(event = "ApplyUpdate", resource = %coord, name = name.as_str(), attempt = attempt);
            match self.update(coord, &object).await {
                Err(DynamicError::Conflict(message)) if attempt < max_attempts => {
                    warn!(
                        event = "ApplyConflict",
                        resource = %coord,
                        name = name.as_str(),
                        attempt = attempt,
                        error = message.as_str(),
                    );
                }
                result => return result,
            }
        }
    }

    /// Decode a single YAML or JSON document and apply it
    async fn apply_yaml(&self, coord: &ResourceCoordinate, bytes: &[u8]) -> Result<DynamicObject> {
        let object = object_from_yaml(bytes)?;
        self.apply(coord, object).await
    }
}

/// Decode exactly one YAML or JSON document into a generic object
pub fn object_from_yaml(bytes: &[u8]) -> Result<DynamicObject> {
    let value: Value = serde_norway::from_slice(bytes)
        .map_err(|e| DynamicError::DecodeError(e.to_string()))?;

    if !value.is_object() {
        return Err(DynamicError::DecodeError("document is not a mapping".to_string()));
    }

    serde_json::from_value(value).map_err(|e| DynamicError::DecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::memory::MemoryClient;
    use crate::crd::crd_coordinate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn widget_crd(description: &str) -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": "buttons.widgets.templates.krateo.io" },
            "spec": { "group": "widgets.templates.krateo.io", "description": description }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn apply_creates_missing_objects() {
        let client = MemoryClient::with_crds();

        let applied = client.apply(&crd_coordinate(), widget_crd("first")).await.unwrap();

        let calls = client.calls();
        assert_eq!((calls.get, calls.create, calls.update), (1, 1, 0));
        assert_eq!(applied.metadata.resource_version.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn apply_updates_existing_objects() {
        let client = MemoryClient::with_crds();
        client.create(&crd_coordinate(), &widget_crd("first")).await.unwrap();
        client.reset_calls();

        let applied = client.apply(&crd_coordinate(), widget_crd("second")).await.unwrap();

        let calls = client.calls();
        assert_eq!((calls.get, calls.create, calls.update), (1, 0, 1));
        assert_eq!(applied.data["spec"]["description"], json!("second"));
        assert_eq!(applied.metadata.resource_version.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn apply_requires_a_name() {
        let client = MemoryClient::with_crds();
        let mut object = widget_crd("first");
        object.metadata.name = Some(String::new());

        let err = client.apply(&crd_coordinate(), object).await.unwrap_err();

        assert!(matches!(err, DynamicError::InvalidArgument(_)));
        assert_eq!(client.calls().get, 0);
    }

    #[tokio::test]
    async fn apply_retries_conflicts_within_bound() {
        let client = MemoryClient::with_crds().with_apply_max_attempts(2);
        client.create(&crd_coordinate(), &widget_crd("first")).await.unwrap();
        client.fail_next_updates(1).await;
        client.reset_calls();

        client.apply(&crd_coordinate(), widget_crd("second")).await.unwrap();

        let calls = client.calls();
        assert_eq!((calls.get, calls.update), (2, 2));
    }

    #[tokio::test]
    async fn apply_surfaces_conflict_when_attempts_run_out() {
        let client = MemoryClient::with_crds();
        client.create(&crd_coordinate(), &widget_crd("first")).await.unwrap();
        client.fail_next_updates(1).await;

        let err = client.apply(&crd_coordinate(), widget_crd("second")).await.unwrap_err();

        assert!(matches!(err, DynamicError::Conflict(_)));
    }

    #[tokio::test]
    async fn apply_yaml_creates_then_updates() {
        let client = MemoryClient::with_crds();
        let manifest = |description: &str| {
            format!(
                "apiVersion: apiextensions.k8s.io/v1\n\
                 kind: CustomResourceDefinition\n\
                 metadata:\n  name: buttons.widgets.templates.krateo.io\n\
                 spec:\n  group: widgets.templates.krateo.io\n  description: {}\n",
                description
            )
        };

        let created = client.apply_yaml(&crd_coordinate(), manifest("first").as_bytes()).await.unwrap();
        let calls = client.calls();
        assert_eq!((calls.get, calls.create, calls.update), (1, 1, 0));
        assert_eq!(created.data["spec"]["description"], json!("first"));

        client.reset_calls();
        let updated = client.apply_yaml(&crd_coordinate(), manifest("second").as_bytes()).await.unwrap();
        let calls = client.calls();
        assert_eq!((calls.get, calls.create, calls.update), (1, 0, 1));
        assert_eq!(updated.data["spec"]["description"], json!("second"));
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn apply_yaml_rejects_malformed_documents() {
        let client = MemoryClient::with_crds();

        let err = client.apply_yaml(&crd_coordinate(), b"kind: [unclosed").await.unwrap_err();

        assert!(matches!(err, DynamicError::DecodeError(_)));
        assert_eq!(client.calls().get, 0);
    }

    #[test]
    fn yaml_and_json_documents_decode() {
        let yaml = b"apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\ndata:\n  key: value\n";
        let object = object_from_yaml(yaml).unwrap();
        assert_eq!(object.metadata.name.as_deref(), Some("settings"));
        assert_eq!(object.data["data"]["key"], json!("value"));

        let json = br#"{"apiVersion":"v1","kind":"ConfigMap","metadata":{"name":"settings"}}"#;
        assert_eq!(object_from_yaml(json).unwrap().types.unwrap().kind, "ConfigMap");
    }

    #[test]
    fn multi_document_and_malformed_input_fail() {
        let multi = b"kind: A\n---\nkind: B\n";
        assert!(matches!(object_from_yaml(multi), Err(DynamicError::DecodeError(_))));
        assert!(matches!(object_from_yaml(b"kind: [unclosed"), Err(DynamicError::DecodeError(_))));
        assert!(matches!(object_from_yaml(b"- a\n- b\n"), Err(DynamicError::DecodeError(_))));
    }
}
