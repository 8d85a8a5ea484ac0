// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::sync::Arc;
use async_trait::async_trait;
use kube::{
    api::{Api, DeleteParams, DynamicObject, ListParams, PostParams},
    Client,
};

use smithery_common::config::KubernetesConfig;

use crate::client::ResourceApi;
use crate::coordinate::{ResourceCoordinate, RestMapping};
use crate::discovery::DiscoveryCache;
use crate::error::{DynamicError, Result};
use crate::resolver::Resolver;

/// Kubernetes backed [`ResourceApi`] resolving coordinates through discovery
#[derive(Clone)]
pub struct DynamicClient {
    client: Client,
    resolver: Resolver,
    apply_max_attempts: u32,
}

impl DynamicClient {
    pub fn new(client: Client, cache: Arc<DiscoveryCache>) -> Self {
        let resolver = Resolver::new(Arc::new(client.clone()), cache);
        Self { client, resolver, apply_max_attempts: 1 }
    }

    pub fn from_config(client: Client, cache: Arc<DiscoveryCache>, config: &KubernetesConfig) -> Self {
        Self::new(client, cache).with_apply_max_attempts(config.apply_max_attempts)
    }

    pub fn with_apply_max_attempts(mut self, attempts: u32) -> Self {
        self.apply_max_attempts = attempts.max(1);
        self
    }

    async fn api_for(&self, coord: &ResourceCoordinate) -> Result<(Api<DynamicObject>, RestMapping)> {
        let mapping = self.resolver.resolve(coord).await?;
        let api_resource = mapping.api_resource();

        let api = match coord.namespace.as_deref() {
            Some(namespace) if mapping.namespaced && !namespace.is_empty() => {
                Api::namespaced_with(self.client.clone(), namespace, &api_resource)
            }
            _ => Api::all_with(self.client.clone(), &api_resource),
        };

        Ok((api, mapping))
    }
}

#[async_trait]
impl ResourceApi for DynamicClient {
    async fn get(&self, coord: &ResourceCoordinate, name: &str) -> Result<DynamicObject> {
        let (api, _) = self.api_for(coord).await?;
        Ok(api.get(name).await?)
    }

    async fn list(&self, coord: &ResourceCoordinate) -> Result<Vec<DynamicObject>> {
        let (api, _) = self.api_for(coord).await?;
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn create(&self, coord: &ResourceCoordinate, object: &DynamicObject) -> Result<DynamicObject> {
        let (api, _) = self.api_for(coord).await?;
        Ok(api.create(&PostParams::default(), object).await?)
    }

    async fn update(&self, coord: &ResourceCoordinate, object: &DynamicObject) -> Result<DynamicObject> {
        let name = object
            .metadata
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DynamicError::InvalidArgument("object has no name".to_string()))?;

        let (api, _) = self.api_for(coord).await?;
        Ok(api.replace(name, &PostParams::default(), object).await?)
    }

    async fn delete(&self, coord: &ResourceCoordinate, name: &str) -> Result<()> {
        let (api, _) = self.api_for(coord).await?;
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn discover(&self, category: &str) -> Result<Vec<ResourceCoordinate>> {
        self.resolver.discover(category).await
    }

    async fn refresh_discovery(&self) {
        self.resolver.cache().invalidate().await;
    }

    fn apply_max_attempts(&self) -> u32 {
        self.apply_max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use crate::coordinate::ResourceCoordinate;
    use crate::crd::crd_coordinate;
    use crate::mock::{discovery, mock_client, status, Requests};

    const CRD_PATH: &str = "/apis/apiextensions.k8s.io/v1/customresourcedefinitions";
    const CONFIGMAP_PATH: &str = "/api/v1/namespaces/krateo-system/configmaps/settings";

    fn config_map() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "settings", "namespace": "krateo-system", "resourceVersion": "7" },
            "data": { "key": "value" }
        })
    }

    fn widget_crd() -> Value {
        json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": "buttons.widgets.templates.krateo.io", "resourceVersion": "1" },
            "spec": { "group": "widgets.templates.krateo.io" }
        })
    }

    /// A cluster holding one ConfigMap and no widget CRD yet
    fn cluster() -> (DynamicClient, Requests) {
        let (client, requests) = mock_client(|method, path| {
            if let Some(response) = discovery(path) {
                return response;
            }
            match (method, path) {
                (&Method::GET, CONFIGMAP_PATH) => (StatusCode::OK, config_map()),
                (&Method::POST, CRD_PATH) => (StatusCode::CREATED, widget_crd()),
                _ => status(StatusCode::NOT_FOUND, "NotFound", "not found"),
            }
        });

        (DynamicClient::new(client, Arc::new(DiscoveryCache::default())), requests)
    }

    fn crd_object() -> DynamicObject {
        serde_json::from_value(widget_crd()).unwrap()
    }

    #[tokio::test]
    async fn namespaced_resources_use_the_namespace_path() {
        let (client, requests) = cluster();
        let coord = ResourceCoordinate::from_gvk("", "v1", "ConfigMap").within("krateo-system");

        let object = client.get(&coord, "settings").await.unwrap();

        assert_eq!(object.metadata.name.as_deref(), Some("settings"));
        assert_eq!(object.data["data"]["key"], json!("value"));
        assert!(requests.all().contains(&format!("GET {}", CONFIGMAP_PATH)));
    }

    #[tokio::test]
    async fn cluster_scoped_resources_ignore_the_namespace() {
        let (client, requests) = cluster();
        let coord = crd_coordinate().within("krateo-system");

        let err = client.get(&coord, "buttons.widgets.templates.krateo.io").await.unwrap_err();

        assert!(matches!(err, DynamicError::NotFound(_)));
        assert!(requests
            .all()
            .contains(&format!("GET {}/buttons.widgets.templates.krateo.io", CRD_PATH)));
    }

    #[tokio::test]
    async fn apply_creates_through_the_api_server() {
        let (client, requests) = cluster();

        let applied = client.apply(&crd_coordinate(), crd_object()).await.unwrap();

        assert_eq!(applied.metadata.resource_version.as_deref(), Some("1"));
        let writes: Vec<String> = requests
            .all()
            .into_iter()
            .filter(|request| !request.starts_with("GET"))
            .collect();
        assert_eq!(writes, vec![format!("POST {}", CRD_PATH)]);
    }

    #[tokio::test]
    async fn update_requires_a_name() {
        let (client, requests) = cluster();
        let mut object = crd_object();
        object.metadata.name = None;

        let err = client.update(&crd_coordinate(), &object).await.unwrap_err();

        assert!(matches!(err, DynamicError::InvalidArgument(_)));
        assert!(requests.all().iter().all(|request| !request.starts_with("PUT")));
    }

    #[tokio::test]
    async fn unknown_kinds_have_no_match() {
        let (client, _) = cluster();
        let coord = ResourceCoordinate::from_gvk("widgets.templates.krateo.io", "", "Panel");

        let err = client.list(&coord).await.unwrap_err();
        assert!(matches!(err, DynamicError::NoMatch(_)));
    }
}
