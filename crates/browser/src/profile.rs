//! Isolated browser profile directories.
//!
//! Each browser context gets its own ephemeral profile directory, deleted at
//! close — no cross-task cookies unless explicitly loaded (§5
//! "Shared-resource policy"). The registry tracks live profiles so the
//! worker can assert none leak past a task boundary.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::TempDir;

use authscope_domain::error::{Error, Result};

/// An isolated, ephemeral browser profile directory. Removed from disk when
/// dropped.
pub struct BrowserProfile {
    id: String,
    dir: TempDir,
}

impl BrowserProfile {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// Tracks active browser profiles so a task boundary can assert that none
/// are left open into the next task: a `RwLock<HashMap>` of live resources
/// with explicit release.
#[derive(Default)]
pub struct ProfileRegistry {
    active: RwLock<HashMap<String, Arc<BrowserProfile>>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a fresh, isolated profile directory.
    pub fn acquire(&self) -> Result<Arc<BrowserProfile>> {
        let dir = TempDir::new().map_err(Error::Io)?;
        let id = uuid::Uuid::new_v4().to_string();
        let profile = Arc::new(BrowserProfile {
            id: id.clone(),
            dir,
        });
        self.active.write().insert(id, profile.clone());
        Ok(profile)
    }

    /// Release a profile. The directory is removed once the last `Arc`
    /// reference (this one, plus any held by the caller) drops.
    pub fn release(&self, id: &str) {
        self.active.write().remove(id);
    }

    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_tracks_count() {
        let registry = ProfileRegistry::new();
        let p = registry.acquire().unwrap();
        assert_eq!(registry.active_count(), 1);
        let path = p.path().to_path_buf();
        assert!(path.exists());
        registry.release(p.id());
        drop(p);
        assert_eq!(registry.active_count(), 0);
    }
}
