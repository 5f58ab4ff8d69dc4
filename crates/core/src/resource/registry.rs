//! Path-keyed lookup of [`ResourceDescription`]s.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::ResourceDescription;

pub const DEFAULT_RESOURCE_PATH: &str = "/stream";

/// Registry of named resources, keyed by path.
///
/// Supports a "default" resource that acts as a fallback when the
/// requested URI path doesn't match any registered resource, so that a
/// server with a single configured stream serves it regardless of the
/// path a client happens to request.
#[derive(Clone)]
pub struct ResourceRegistry {
    resources: Arc<RwLock<HashMap<String, Arc<ResourceDescription>>>>,
    default_path: Arc<RwLock<Option<String>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: Arc::new(RwLock::new(HashMap::new())),
            default_path: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a resource at `path`. Replaces any existing entry there.
    pub fn add(&self, path: &str, resource: ResourceDescription) -> Arc<ResourceDescription> {
        let resource = Arc::new(resource);
        self.resources
            .write()
            .insert(path.to_string(), resource.clone());
        tracing::info!(path, "resource registered");
        resource
    }

    /// Designate a resource path as the default fallback.
    pub fn set_default(&self, path: &str) {
        *self.default_path.write() = Some(path.to_string());
    }

    /// Look up a resource by exact path.
    pub fn get(&self, path: &str) -> Option<Arc<ResourceDescription>> {
        self.resources.read().get(path).cloned()
    }

    /// Resolve a resource from an RTSP URI, falling back to the default
    /// resource (if one was set via [`set_default`](Self::set_default))
    /// when no exact path match exists.
    pub fn resolve_from_uri(&self, uri: &str) -> Option<Arc<ResourceDescription>> {
        let path = extract_resource_path(uri);
        self.get(path).or_else(|| {
            let default = self.default_path.read();
            default.as_ref().and_then(|p| self.get(p))
        })
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the resource path from an RTSP URI.
///
/// `rtsp://host:8554/stream/track1` → `/stream`
/// `rtsp://host:8554/stream`        → `/stream`
/// `rtsp://host:8554/`              → `/`
/// `rtsp://host:8554`               → `/stream` (default)
/// `*`                               → `/stream` (default)
pub fn extract_resource_path(uri: &str) -> &str {
    let path = if let Some(after) = uri
        .strip_prefix("rtsp://")
        .or_else(|| uri.strip_prefix("rtsps://"))
    {
        match after.find('/') {
            Some(slash) => &after[slash..],
            None => DEFAULT_RESOURCE_PATH,
        }
    } else if uri.starts_with('/') {
        uri
    } else {
        DEFAULT_RESOURCE_PATH
    };

    if let Some(pos) = path.rfind("/track") {
        &path[..pos]
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_resource() -> ResourceDescription {
        ResourceDescription::new("Stream", "", "", "", "", 0, 0.0, "", "")
    }

    #[test]
    fn extract_path_full_uri() {
        assert_eq!(
            extract_resource_path("rtsp://localhost:8554/stream"),
            "/stream"
        );
    }

    #[test]
    fn extract_path_with_track() {
        assert_eq!(
            extract_resource_path("rtsp://localhost:8554/stream/track1"),
            "/stream"
        );
    }

    #[test]
    fn extract_path_no_path() {
        assert_eq!(
            extract_resource_path("rtsp://localhost:8554"),
            DEFAULT_RESOURCE_PATH
        );
    }

    #[test]
    fn extract_path_star() {
        assert_eq!(extract_resource_path("*"), DEFAULT_RESOURCE_PATH);
    }

    #[test]
    fn registry_add_and_get() {
        let registry = ResourceRegistry::new();
        registry.add("/stream", stub_resource());
        assert!(registry.get("/stream").is_some());
        assert!(registry.get("/other").is_none());
    }

    #[test]
    fn registry_resolve_from_uri() {
        let registry = ResourceRegistry::new();
        registry.add("/stream", stub_resource());

        assert!(
            registry
                .resolve_from_uri("rtsp://localhost:8554/stream")
                .is_some()
        );
        assert!(
            registry
                .resolve_from_uri("rtsp://localhost:8554/stream/track1")
                .is_some()
        );
        assert!(
            registry
                .resolve_from_uri("rtsp://localhost:8554/other")
                .is_none()
        );
    }

    #[test]
    fn registry_resolve_fallback_to_default() {
        let registry = ResourceRegistry::new();
        registry.add("/stream", stub_resource());
        registry.set_default("/stream");

        assert!(
            registry
                .resolve_from_uri("rtsp://localhost:8554/anything")
                .is_some()
        );
    }
}
