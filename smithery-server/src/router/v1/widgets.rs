// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use axum::{
    extract::{Extension, Query},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use smithery_dynamic::context::Context;

use crate::error::{APIError, APIResult};
use crate::widgets::{list_widgets, widget_schema, WidgetInfo};

pub fn router() -> Router {
    Router::new()
        .route("/schema", get(schema_endpoint))
        .route("/list", get(list_endpoint))
}

#[derive(Debug, Deserialize)]
struct SchemaParams {
    version: Option<String>,
    resource: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> APIResult<&'a str> {
    value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| APIError::bad_request(&format!("missing '{}' query parameter", name)))
}

async fn schema_endpoint(
    Extension(ctx): Extension<Arc<Context>>,
    Query(params): Query<SchemaParams>,
) -> APIResult<Json<Value>> {
    let version = required(&params.version, "version")?;
    let resource = required(&params.resource, "resource")?;

    let client = ctx.client()?;
    let schema = widget_schema(client.as_ref(), ctx.state.widgets_group(), resource, version).await?;

    Ok(Json(schema))
}

async fn list_endpoint(Extension(ctx): Extension<Arc<Context>>) -> APIResult<Json<Vec<WidgetInfo>>> {
    let client = ctx.client()?;
    let widgets = list_widgets(client.as_ref(), ctx.state.widgets_group()).await?;

    Ok(Json(widgets))
}
