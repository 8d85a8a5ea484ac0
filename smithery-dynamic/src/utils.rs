// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::sync::Arc;
use kube::Client;

use smithery_common::config::KubernetesConfig;

use crate::client::DynamicClient;
use crate::discovery::DiscoveryCache;
use crate::error::{DynamicError, Result};


/// Create a new kube client by inferring the kubeconfig from the environment
/// or the default service account
///
/// # Returns
/// A Result containing the kube Client or an error
pub async fn create_k8s_client() -> Result<Client> {
    Client::try_default().await.map_err(DynamicError::from)
}

/// Create a dynamic client sharing a fresh discovery cache
///
/// # Arguments
/// * `config`: Discovery TTL and apply retry settings
///
/// # Returns
/// A Result containing the DynamicClient or an error when no credentials
/// could be inferred
pub async fn create_dynamic_client(config: &KubernetesConfig) -> Result<DynamicClient> {
    let client = create_k8s_client().await?;
    let cache = Arc::new(DiscoveryCache::from_config(config));
    Ok(DynamicClient::from_config(client, cache, config))
}
