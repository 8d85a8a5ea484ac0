// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DynamicError {
    #[error("kubernetes api error: {0}")]
    KubeError(kube::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no matches for {0}")]
    NoMatch(String),
    #[error("ambiguous mapping for {0}: candidates {1:?}")]
    AmbiguousMapping(String, Vec<String>),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid object: {0}")]
    Invalid(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("failed to decode object: {0}")]
    DecodeError(String),
}

impl DynamicError {
    /// True for both a missing object and a resource type unknown to discovery
    pub fn is_not_found(&self) -> bool {
        matches!(self, DynamicError::NotFound(_) | DynamicError::NoMatch(_))
    }
}

impl From<kube::Error> for DynamicError {
    fn from(error: kube::Error) -> Self {
        match &error {
            kube::Error::Api(response) => {
                let message = response.message.clone();
                match (response.code, response.reason.as_str()) {
                    (404, _) => DynamicError::NotFound(message),
                    (409, "AlreadyExists") => DynamicError::AlreadyExists(message),
                    (409, _) => DynamicError::Conflict(message),
                    (422, _) => DynamicError::Invalid(message),
                    (401, _) | (403, _) => DynamicError::Unauthorized(message),
                    _ => DynamicError::KubeError(error),
                }
            }
            kube::Error::Auth(_) | kube::Error::InferConfig(_) => DynamicError::Unauthorized(error.to_string()),
            _ => DynamicError::KubeError(error),
        }
    }
}

pub type Result<T> = result::Result<T, DynamicError>;
