// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::sync::Arc;

use smithery_common::state::State;

use crate::client::ResourceApi;
use crate::error::{DynamicError, Result};

// Context struct to hold the cluster client and the state
#[derive(Clone)]
pub struct Context {
    pub client: Option<Arc<dyn ResourceApi>>,
    pub state: Arc<State>,
}

impl Context {
    pub fn new(state: Arc<State>) -> Self {
        Self { client: None, state }
    }

    pub fn with_client(mut self, client: Arc<dyn ResourceApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// The cluster client, or an authorization error when no credentials
    /// were available at startup
    pub fn client(&self) -> Result<Arc<dyn ResourceApi>> {
        self.client
            .clone()
            .ok_or_else(|| DynamicError::Unauthorized("no kubernetes credentials available".to_string()))
    }
}
