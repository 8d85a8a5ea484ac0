// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::sync::Arc;

use crate::coordinate::{ResourceCoordinate, RestMapping};
use crate::discovery::{DiscoveredResource, DiscoveryCache, DiscoverySource};
use crate::error::{DynamicError, Result};

/// Resolves coordinates into REST mappings using cached discovery
#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn DiscoverySource>,
    cache: Arc<DiscoveryCache>,
}

impl Resolver {
    pub fn new(source: Arc<dyn DiscoverySource>, cache: Arc<DiscoveryCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<DiscoveryCache> {
        &self.cache
    }

    pub async fn resolve(&self, coord: &ResourceCoordinate) -> Result<RestMapping> {
        let resources = self.cache.resources(self.source.as_ref()).await?;
        resolve_mapping(&resources, coord)
    }

    /// Every preferred resource type matching `category` by name, short name or category
    pub async fn discover(&self, category: &str) -> Result<Vec<ResourceCoordinate>> {
        let resources = self.cache.resources(self.source.as_ref()).await?;
        Ok(discover_matching(&resources, category))
    }
}

pub fn discover_matching(resources: &[DiscoveredResource], category: &str) -> Vec<ResourceCoordinate> {
    resources
        .iter()
        .filter(|resource| resource.preferred && resource.matches(category))
        .map(DiscoveredResource::coordinate)
        .collect()
}

/// Resolve a coordinate against a discovery snapshot.
///
/// When only the plural resource is known the kind is looked up first.
pub fn resolve_mapping(resources: &[DiscoveredResource], coord: &ResourceCoordinate) -> Result<RestMapping> {
    let kind = if !coord.kind.is_empty() {
        coord.kind.clone()
    } else if !coord.resource.is_empty() {
        kind_for(resources, coord)?
    } else {
        return Err(DynamicError::InvalidArgument(
            "either kind or resource must be set".to_string(),
        ));
    };

    let candidates: Vec<&DiscoveredResource> = resources
        .iter()
        .filter(|r| r.group == coord.group && r.kind == kind)
        .filter(|r| coord.version.is_empty() || r.version == coord.version)
        .collect();

    let selected = match candidates.as_slice() {
        [] => return Err(DynamicError::NoMatch(coord.to_string())),
        [only] => *only,
        many => {
            let preferred: Vec<&&DiscoveredResource> = many.iter().filter(|r| r.preferred).collect();
            match preferred.as_slice() {
                [only] => **only,
                _ => {
                    return Err(DynamicError::AmbiguousMapping(
                        coord.to_string(),
                        many.iter().map(|r| r.version.clone()).collect(),
                    ))
                }
            }
        }
    };

    Ok(RestMapping {
        group: selected.group.clone(),
        version: selected.version.clone(),
        kind: selected.kind.clone(),
        resource: selected.plural.clone(),
        namespaced: selected.namespaced,
    })
}

fn kind_for(resources: &[DiscoveredResource], coord: &ResourceCoordinate) -> Result<String> {
    let mut kinds: Vec<&str> = resources
        .iter()
        .filter(|r| r.group == coord.group && r.plural.eq_ignore_ascii_case(&coord.resource))
        .filter(|r| coord.version.is_empty() || r.version == coord.version)
        .map(|r| r.kind.as_str())
        .collect();
    kinds.sort_unstable();
    kinds.dedup();

    match kinds.as_slice() {
        [] => Err(DynamicError::NoMatch(coord.to_string())),
        [kind] => Ok(kind.to_string()),
        many => Err(DynamicError::AmbiguousMapping(
            coord.to_string(),
            many.iter().map(|k| k.to_string()).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource(group: &str, version: &str, kind: &str, plural: &str, preferred: bool) -> DiscoveredResource {
        DiscoveredResource {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            singular: kind.to_lowercase(),
            short_names: vec![],
            categories: vec!["widgets".to_string()],
            namespaced: true,
            preferred,
        }
    }

    fn snapshot() -> Vec<DiscoveredResource> {
        vec![
            resource("widgets.templates.krateo.io", "v1beta1", "Button", "buttons", true),
            resource("widgets.templates.krateo.io", "v1alpha1", "Button", "buttons", false),
            resource("widgets.templates.krateo.io", "v1beta1", "Panel", "panels", false),
            resource("widgets.templates.krateo.io", "v1alpha1", "Panel", "panels", false),
            crate::crd::crd_discovered_resource(),
        ]
    }

    #[test]
    fn resolves_resource_to_kind() {
        let coord = ResourceCoordinate::from_gvr("apiextensions.k8s.io", "v1", "customresourcedefinitions");
        let mapping = resolve_mapping(&snapshot(), &coord).unwrap();

        assert_eq!(mapping.kind, "CustomResourceDefinition");
        assert_eq!(mapping.resource, "customresourcedefinitions");
        assert!(!mapping.namespaced);
    }

    #[test]
    fn resolves_kind_with_explicit_version() {
        let coord = ResourceCoordinate::from_gvk("widgets.templates.krateo.io", "v1alpha1", "Button");
        let mapping = resolve_mapping(&snapshot(), &coord).unwrap();

        assert_eq!(mapping.version, "v1alpha1");
        assert_eq!(mapping.resource, "buttons");
    }

    #[test]
    fn missing_version_picks_the_preferred_one() {
        let coord = ResourceCoordinate::from_gvk("widgets.templates.krateo.io", "", "Button");
        let mapping = resolve_mapping(&snapshot(), &coord).unwrap();

        assert_eq!(mapping.version, "v1beta1");
    }

    #[test]
    fn missing_version_without_preference_is_ambiguous() {
        let coord = ResourceCoordinate::from_gvk("widgets.templates.krateo.io", "", "Panel");
        let err = resolve_mapping(&snapshot(), &coord).unwrap_err();

        assert!(matches!(err, DynamicError::AmbiguousMapping(_, versions) if versions.len() == 2));
    }

    #[test]
    fn unknown_kind_has_no_match() {
        let coord = ResourceCoordinate::from_gvk("widgets.templates.krateo.io", "v1", "Table");
        let err = resolve_mapping(&snapshot(), &coord).unwrap_err();

        assert!(matches!(err, DynamicError::NoMatch(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn empty_coordinate_is_rejected() {
        let err = resolve_mapping(&snapshot(), &ResourceCoordinate::default()).unwrap_err();
        assert!(matches!(err, DynamicError::InvalidArgument(_)));
    }

    #[test]
    fn discover_returns_preferred_matches_only() {
        let found = discover_matching(&snapshot(), "WIDGETS");

        assert_eq!(found, vec![ResourceCoordinate {
            group: "widgets.templates.krateo.io".to_string(),
            version: "v1beta1".to_string(),
            kind: "Button".to_string(),
            resource: "buttons".to_string(),
            namespace: None,
        }]);
    }
}
