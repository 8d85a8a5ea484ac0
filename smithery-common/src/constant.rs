// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub const APP_NAME: &str = "smithery";
pub const ENV_PREFIX: &str = "SMITHERY";

/// API group every forged widget CRD is installed under
pub const DEFAULT_WIDGETS_GROUP: &str = "widgets.templates.krateo.io";
pub const DEFAULT_WIDGETS_CATEGORIES: &[&str] = &["widgets", "krateo"];

/// Version used when a widget schema does not declare one
pub const DEFAULT_WIDGET_VERSION: &str = "v1alpha1";
