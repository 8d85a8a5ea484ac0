// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use thiserror::Error;
use std::result::Result;

use smithery_dynamic::error::DynamicError;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("'{0}' field not found")]
    FieldNotFound(String),
    #[error("unable to load fragment {0}: {1}")]
    Asset(&'static str, String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("kind must not be empty")]
    EmptyKind,
    #[error("version must not be empty")]
    EmptyVersion,
    #[error("invalid {0} schema: {1}")]
    InvalidSchema(&'static str, serde_json::Error),
    #[error("unable to serialize CRD: {0}")]
    Serialize(#[from] serde_norway::Error),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("unable to extract kind and version from JSON Schema: {0}")]
    Identity(SchemaError),
    #[error("unable to extract spec from JSON Schema: {0}")]
    Spec(SchemaError),
    #[error("unable to inject allowed resources into JSON Schema: {0}")]
    AllowedResources(SchemaError),
    #[error("unable to convert extracted spec to JSON: {0}")]
    Marshal(serde_json::Error),
    #[error("unable to generate CRD: {0}")]
    Generate(GeneratorError),
    #[error("unable to apply CRD: {0}")]
    Apply(DynamicError),
}

pub type ForgeResult<T> = Result<T, ForgeError>;
