// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::result;

use smithery_common::telemetry::error;
use smithery_dynamic::error::DynamicError;

use crate::forge::error::{ForgeError, SchemaError};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct APIError {
    pub code: u16,
    pub message: String,
}

impl APIError {
    pub fn new(code: StatusCode, message: String) -> Self {
        Self { code: code.as_u16(), message }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.to_string())
    }

    pub fn method_not_allowed(method: &str, allowed: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("method {} not allowed, only {} is supported", method, allowed),
        )
    }

    pub fn invalid_content_type(content_type: &str) -> Self {
        Self::new(
            StatusCode::NOT_ACCEPTABLE,
            format!("Invalid content type: {}", content_type),
        )
    }

    /// Logs the full error and only hands the summary to the caller
    pub fn unexpected_error(summary: &str, detail: &dyn std::fmt::Display) -> Self {
        error!(event = "UnexpectedError", summary = summary, error = %detail);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, summary.to_string())
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<DynamicError> for APIError {
    fn from(err: DynamicError) -> Self {
        match &err {
            DynamicError::NotFound(_) | DynamicError::NoMatch(_) => APIError::not_found(&err.to_string()),
            DynamicError::Unauthorized(_) => APIError::unauthorized(&err.to_string()),
            DynamicError::InvalidArgument(_) | DynamicError::DecodeError(_) => APIError::bad_request(&err.to_string()),
            _ => APIError::unexpected_error("kubernetes request failed", &err),
        }
    }
}

impl From<ForgeError> for APIError {
    fn from(err: ForgeError) -> Self {
        match &err {
            ForgeError::Spec(SchemaError::Asset(..)) => APIError::unexpected_error("unable to load schema fragments", &err),
            ForgeError::Identity(_) | ForgeError::Spec(_) | ForgeError::AllowedResources(_) => {
                APIError::bad_request(&err.to_string())
            }
            ForgeError::Apply(DynamicError::Unauthorized(_)) => APIError::unauthorized(&err.to_string()),
            ForgeError::Marshal(_) | ForgeError::Generate(_) | ForgeError::Apply(_) => {
                APIError::unexpected_error("unable to forge CRD", &err)
            }
        }
    }
}

pub type APIResult<T> = result::Result<T, APIError>;
