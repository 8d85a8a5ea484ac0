// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::api::DynamicObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use smithery_common::telemetry::{debug, warn};
use smithery_common::utils::nested_str;
use smithery_dynamic::client::ResourceApi;
use smithery_dynamic::crd::{crd_coordinate, crd_name, openapi_schema, version_names};
use smithery_dynamic::error::{DynamicError, Result};

/// Summary of an installed widget CRD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetInfo {
    pub resource: String,
    pub kind: String,
    pub group: String,
    pub versions: Vec<String>,
}

/// Project a CRD into a [`WidgetInfo`], or None when it is not a widget or
/// lacks the fields to describe one
pub fn project_widget(crd: &DynamicObject, widgets_group: &str) -> Option<WidgetInfo> {
    let name = crd.metadata.name.as_deref().unwrap_or_default();

    let Some(group) = nested_str(&crd.data, &["spec", "group"]) else {
        warn!(event = "SkippedCRD", name = name, reason = "spec.group not found in CRD");
        return None;
    };
    if group != widgets_group {
        debug!(event = "SkippedCRD", name = name, reason = "not a widget");
        return None;
    }

    let Some(plural) = nested_str(&crd.data, &["spec", "names", "plural"]) else {
        warn!(event = "SkippedCRD", name = name, reason = "spec.names.plural not found in CRD");
        return None;
    };
    let Some(kind) = nested_str(&crd.data, &["spec", "names", "kind"]) else {
        warn!(event = "SkippedCRD", name = name, reason = "spec.names.kind not found in CRD");
        return None;
    };

    let versions = version_names(crd);
    if versions.is_empty() {
        warn!(event = "SkippedCRD", name = name, reason = "spec.versions not found in CRD");
        return None;
    }

    Some(WidgetInfo {
        resource: plural.to_string(),
        kind: kind.to_string(),
        group: group.to_string(),
        versions,
    })
}

/// Every installed CRD belonging to the widgets group.
///
/// Fails with NotFound when there is none.
pub async fn list_widgets(client: &dyn ResourceApi, widgets_group: &str) -> Result<Vec<WidgetInfo>> {
    let widgets: Vec<WidgetInfo> = client
        .list(&crd_coordinate())
        .await?
        .iter()
        .filter_map(|crd| project_widget(crd, widgets_group))
        .collect();

    if widgets.is_empty() {
        return Err(DynamicError::NotFound("no widgets found".to_string()));
    }

    Ok(widgets)
}

/// OpenAPI v3 schema of one version of a widget CRD
pub async fn widget_schema(client: &dyn ResourceApi, widgets_group: &str, resource: &str, version: &str) -> Result<Value> {
    let crd = client.get(&crd_coordinate(), &crd_name(resource, widgets_group)).await?;
    openapi_schema(&crd, version)
}
