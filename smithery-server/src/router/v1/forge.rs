// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use smithery_common::telemetry::info;
use smithery_dynamic::context::Context;

use crate::error::{APIError, APIResult};
use crate::forge::Forge;
use crate::router::parse_bool;

const JSON_CONTENT_TYPE: &str = "application/json";
const YAML_CONTENT_TYPE: &str = "application/yaml";

pub fn router() -> Router {
    Router::new().route("/forge", post(forge_endpoint).fallback(method_not_allowed))
}

#[derive(Debug, Deserialize)]
struct ForgeParams {
    apply: Option<String>,
}

async fn method_not_allowed(method: Method) -> APIError {
    APIError::method_not_allowed(method.as_str(), Method::POST.as_str())
}

fn check_content_type(headers: &HeaderMap) -> APIResult<()> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    // Parameters such as charset are allowed after the media type
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if !media_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
        return Err(APIError::invalid_content_type(content_type));
    }

    Ok(())
}

async fn forge_endpoint(
    Extension(ctx): Extension<Arc<Context>>,
    Query(params): Query<ForgeParams>,
    headers: HeaderMap,
    body: Bytes,
) -> APIResult<Response> {
    check_content_type(&headers)?;

    if body.is_empty() {
        return Err(APIError::bad_request("empty body"));
    }

    let schema: Value = serde_json::from_slice(&body)
        .map_err(|e| APIError::bad_request(&format!("unable to decode JSON Schema: {}", e)))?;
    if !schema.is_object() {
        return Err(APIError::bad_request("JSON Schema must be an object"));
    }

    let apply = parse_bool(params.apply.as_deref(), true);
    info!(event = "ForgeRequested", apply = apply);

    // Schema errors are reported before credentials are checked
    let forge = Forge::from_config(&ctx.state.config.widgets);
    let mut forged = forge.generate(schema)?;
    if apply {
        let client = ctx.client()?;
        forged = forge.apply(forged, client.as_ref()).await?;
    }

    Ok(([(header::CONTENT_TYPE, YAML_CONTENT_TYPE)], forged.manifest).into_response())
}
