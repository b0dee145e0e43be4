//! Decoded-image cache for redraw loops.
//!
//! The viewer redraws the same files many times. [`ImageCache`] keeps one
//! decoded buffer per path so a redraw does not hit the disk again. Entries
//! remember the sample kind they were decoded at; asking for a different kind
//! re-decodes and replaces the entry.
//!
//! # Example
//!
//! ```ignore
//! use hdrtone_io::cache::ImageCache;
//! use hdrtone_core::SampleKind;
//!
//! let cache = ImageCache::new();
//! let a = cache.get("sky.hdr", SampleKind::F32)?;
//! let b = cache.get("sky.hdr", SampleKind::F32)?; // no disk access
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hdrtone_core::{ImageBuffer, SampleKind};
use tracing::{debug, trace, warn};

use crate::DecodeResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    kind: SampleKind,
    image: Arc<ImageBuffer>,
}

/// Thread-safe per-path image cache.
///
/// Loads go through [`crate::load`], so the LDR fallback applies.
/// Failed decodes are not cached.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl ImageCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    // entries are replaced whole, so a poisoned map is still consistent
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| {
            warn!("image cache lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| {
            warn!("image cache lock poisoned, recovering");
            self.entries.clear_poison();
            PoisonError::into_inner(e)
        })
    }

    /// Returns the cached image for `path`, decoding it if absent or if it
    /// was cached at a different sample kind.
    pub fn get<P: AsRef<Path>>(&self, path: P, kind: SampleKind) -> DecodeResult<Arc<ImageBuffer>> {
        let path = path.as_ref();

        if let Some(entry) = self.read().get(path).filter(|e| e.kind == kind) {
            trace!(path = %path.display(), "cache hit");
            return Ok(Arc::clone(&entry.image));
        }

        debug!(path = %path.display(), kind = %kind, "cache miss, decoding");
        let image = Arc::new(crate::load(path, kind)?);
        self.write().insert(
            path.to_path_buf(),
            CacheEntry {
                kind,
                image: Arc::clone(&image),
            },
        );
        Ok(image)
    }

    /// Returns true if `path` is cached at any sample kind.
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.read().contains_key(path.as_ref())
    }

    /// Drops the entry for `path`. Returns true if one was present.
    pub fn invalidate<P: AsRef<Path>>(&self, path: P) -> bool {
        self.write().remove(path.as_ref()).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdrtone_core::LINEAR_GAMMA;

    fn write_pfm(dir: &Path, name: &str) -> PathBuf {
        let image = ImageBuffer::from_f32(2, 1, LINEAR_GAMMA, vec![0.5, 1.0, 2.0, 0.0, 0.25, 4.0])
            .unwrap();
        let path = dir.join(name);
        crate::pfm::write(&path, &image).unwrap();
        path
    }

    #[test]
    fn test_hit_returns_same_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pfm(dir.path(), "a.pfm");
        let cache = ImageCache::new();

        let first = cache.get(&path, SampleKind::F32).unwrap();
        let second = cache.get(&path, SampleKind::F32).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_kind_change_redecodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pfm(dir.path(), "a.pfm");
        let cache = ImageCache::new();

        let float = cache.get(&path, SampleKind::F32).unwrap();
        let bytes = cache.get(&path, SampleKind::U8).unwrap();
        assert_eq!(float.sample_kind(), SampleKind::F32);
        assert_eq!(bytes.sample_kind(), SampleKind::U8);
        assert_eq!(bytes.as_u8().unwrap(), &[128, 255, 255, 0, 64, 255]);
        assert_eq!(cache.len(), 1);

        let again = cache.get(&path, SampleKind::U8).unwrap();
        assert!(Arc::ptr_eq(&bytes, &again));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_pfm(dir.path(), "a.pfm");
        let b = write_pfm(dir.path(), "b.pfm");
        let cache = ImageCache::new();

        cache.get(&a, SampleKind::F32).unwrap();
        cache.get(&b, SampleKind::F32).unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate(&a));
        assert!(!cache.invalidate(&a));
        assert!(!cache.contains(&a));
        assert!(cache.contains(&b));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_poisoned_lock_still_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pfm(dir.path(), "a.pfm");
        let cache = ImageCache::new();
        cache.get(&path, SampleKind::F32).unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cache.entries.write().unwrap();
            panic!("writer died");
        }));
        assert!(cache.entries.is_poisoned());

        assert_eq!(cache.len(), 1);
        let first = cache.get(&path, SampleKind::U8).unwrap();
        let second = cache.get(&path, SampleKind::U8).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!cache.entries.is_poisoned());
    }

    #[test]
    fn test_failure_not_cached() {
        let cache = ImageCache::new();
        assert!(cache.get("/no/such/file.exr", SampleKind::F32).is_err());
        assert!(cache.is_empty());
    }
}
