// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! Canned API server behind a real `kube::Client`, for exercising the
//! kube backed code paths without a cluster.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use http::{Method, Request, Response, StatusCode};
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};

/// Every request seen by the mock, as `METHOD /path`
#[derive(Clone, Default)]
pub struct Requests(Arc<Mutex<Vec<String>>>);

impl Requests {
    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn record(&self, method: &Method, path: &str) {
        self.0.lock().unwrap().push(format!("{} {}", method, path));
    }
}

pub fn mock_client<F>(handler: F) -> (Client, Requests)
where
    F: Fn(&Method, &str) -> (StatusCode, Value) + Send + Sync + 'static,
{
    let requests = Requests::default();
    let recorded = requests.clone();
    let handler = Arc::new(handler);

    let service = tower::service_fn(move |request: Request<Body>| {
        let handler = handler.clone();
        let recorded = recorded.clone();
        async move {
            let path = request.uri().path().to_string();
            recorded.record(request.method(), &path);

            let (status, body) = handler(request.method(), &path);
            let response = Response::builder()
                .status(status)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap();
            Ok::<_, Infallible>(response)
        }
    });

    (Client::new(service, "default"), requests)
}

pub fn status(code: StatusCode, reason: &str, message: &str) -> (StatusCode, Value) {
    (code, json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code.as_u16()
    }))
}

fn resource_list(group_version: &str, resources: Value) -> Value {
    json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources
    })
}

/// Discovery documents of a small cluster: core ConfigMaps, the CRD type,
/// a widget group served in two versions and an aggregated metrics API whose
/// backend is down.
pub fn discovery(path: &str) -> Option<(StatusCode, Value)> {
    let body = match path {
        "/api" => json!({
            "kind": "APIVersions",
            "apiVersion": "v1",
            "versions": ["v1"],
            "serverAddressByClientCIDRs": []
        }),
        "/apis" => json!({
            "kind": "APIGroupList",
            "apiVersion": "v1",
            "groups": [
                {
                    "name": "apiextensions.k8s.io",
                    "versions": [{ "groupVersion": "apiextensions.k8s.io/v1", "version": "v1" }],
                    "preferredVersion": { "groupVersion": "apiextensions.k8s.io/v1", "version": "v1" }
                },
                {
                    "name": "widgets.templates.krateo.io",
                    "versions": [
                        { "groupVersion": "widgets.templates.krateo.io/v1alpha1", "version": "v1alpha1" },
                        { "groupVersion": "widgets.templates.krateo.io/v1beta1", "version": "v1beta1" }
                    ],
                    "preferredVersion": { "groupVersion": "widgets.templates.krateo.io/v1beta1", "version": "v1beta1" }
                },
                {
                    "name": "metrics.k8s.io",
                    "versions": [{ "groupVersion": "metrics.k8s.io/v1beta1", "version": "v1beta1" }],
                    "preferredVersion": { "groupVersion": "metrics.k8s.io/v1beta1", "version": "v1beta1" }
                }
            ]
        }),
        "/api/v1" => resource_list("v1", json!([
            { "name": "configmaps", "singularName": "configmap", "namespaced": true, "kind": "ConfigMap", "verbs": ["get", "list"], "shortNames": ["cm"] },
            { "name": "pods/log", "singularName": "", "namespaced": true, "kind": "Pod", "verbs": ["get"] }
        ])),
        "/apis/apiextensions.k8s.io/v1" => resource_list("apiextensions.k8s.io/v1", json!([
            { "name": "customresourcedefinitions", "singularName": "customresourcedefinition", "namespaced": false, "kind": "CustomResourceDefinition", "verbs": ["get", "list"], "shortNames": ["crd", "crds"] }
        ])),
        "/apis/widgets.templates.krateo.io/v1alpha1" => resource_list("widgets.templates.krateo.io/v1alpha1", json!([
            { "name": "buttons", "singularName": "button", "namespaced": true, "kind": "Button", "verbs": ["get"], "categories": ["widgets"] }
        ])),
        "/apis/widgets.templates.krateo.io/v1beta1" => resource_list("widgets.templates.krateo.io/v1beta1", json!([
            { "name": "buttons", "singularName": "button", "namespaced": true, "kind": "Button", "verbs": ["get"], "categories": ["widgets"] }
        ])),
        "/apis/metrics.k8s.io/v1beta1" => {
            return Some(status(
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
                "the server is currently unable to handle the request",
            ))
        }
        _ => return None,
    };

    Some((StatusCode::OK, body))
}
