//! Node path helpers and idempotent hierarchy creation

use crate::client::{CoordinationClient, NodeMode};
use crate::error::{CoordinationError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Append `segment` to the node path `base`
pub fn join_path(base: &str, segment: &str) -> String {
    let base = base.trim_end_matches('/');
    let segment = segment.trim_start_matches('/');
    format!("{}/{}", base, segment)
}

/// Parent of a node path; `None` for the root
pub fn parent_path(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of a node path
pub fn node_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Check a path is absolute, has no empty segments and no trailing slash
pub fn validate_path(path: &str) -> Result<()> {
    let valid = path == "/"
        || (path.starts_with('/')
            && !path.ends_with('/')
            && !path[1..].split('/').any(str::is_empty));
    if valid {
        Ok(())
    } else {
        Err(CoordinationError::InvalidPath {
            path: path.to_string(),
        })
    }
}

/// Every ancestor of `path` plus `path` itself, root excluded, shallowest first
fn cumulative_segments(path: &str) -> Vec<String> {
    let mut current = String::new();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            current.push('/');
            current.push_str(segment);
            current.clone()
        })
        .collect()
}

/// Creates the fixed node hierarchy zkrun works in
pub struct PathManager {
    client: Arc<dyn CoordinationClient>,
}

impl PathManager {
    pub fn new(client: Arc<dyn CoordinationClient>) -> Self {
        Self { client }
    }

    /// Ensure every segment of `path` exists
    ///
    /// Ancestors are always persistent; the final segment is persistent or
    /// ephemeral per `persistent`. A segment that already exists, including
    /// one a concurrent caller created first, counts as success.
    pub async fn ensure_hierarchy(&self, path: &str, persistent: bool) -> Result<()> {
        validate_path(path)?;

        let segments = cumulative_segments(path);
        let last = segments.len().saturating_sub(1);

        for (idx, segment) in segments.iter().enumerate() {
            let mode = if idx == last && !persistent {
                NodeMode::Ephemeral
            } else {
                NodeMode::Persistent
            };

            match self.client.create(segment, mode).await {
                Ok(_) => info!(path = %segment, "Created coordination node"),
                Err(e) if e.is_node_exists() => {
                    debug!(path = %segment, "Coordination node already exists")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
