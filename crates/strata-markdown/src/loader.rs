//! Context file loading with a modification-time keyed cache
//!
//! Each [`ContextLoader`] owns its cache. Entries are keyed by absolute path
//! and replaced as soon as the file's modification time moves past the one
//! recorded when the entry was loaded.

use crate::context::ContextFile;
use crate::error::{MarkdownError, MarkdownResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Source of file modification times
pub trait MtimeSource: Send + Sync {
    fn modified(&self, path: &Path) -> std::io::Result<SystemTime>;
}

/// Reads modification times from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMtime;

impl MtimeSource for FsMtime {
    fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CachedContext {
    file: Arc<ContextFile>,
    modified: SystemTime,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<PathBuf, CachedContext>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Loads markdown context files and caches them by path and mtime
pub struct ContextLoader {
    base_dir: PathBuf,
    mtime: Arc<dyn MtimeSource>,
    cache: Mutex<CacheState>,
}

impl ContextLoader {
    /// Create a loader resolving relative paths against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_mtime_source(base_dir, Arc::new(FsMtime))
    }

    /// Create a loader with a custom modification-time source
    pub fn with_mtime_source(base_dir: impl Into<PathBuf>, mtime: Arc<dyn MtimeSource>) -> Self {
        Self {
            base_dir: base_dir.into(),
            mtime,
            cache: Mutex::new(CacheState::default()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a relative or absolute path against the base directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Canonical form of `path`, so `a.md` and `sub/../a.md` share an entry
    fn cache_key(&self, path: &Path) -> PathBuf {
        let resolved = self.resolve(path);
        resolved.canonicalize().unwrap_or(resolved)
    }

    fn canonical_base(&self) -> PathBuf {
        self.base_dir
            .canonicalize()
            .unwrap_or_else(|_| self.base_dir.clone())
    }

    /// Load a context file, serving it from cache when the file is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`MarkdownError::NotFound`] if the file does not exist, an IO
    /// error if it cannot be read, or a frontmatter error if its frontmatter
    /// block is malformed.
    pub fn load_context_file(&self, path: impl AsRef<Path>) -> MarkdownResult<Arc<ContextFile>> {
        let absolute = self.cache_key(path.as_ref());
        if !absolute.is_file() {
            return Err(MarkdownError::not_found(absolute));
        }

        let modified = self
            .mtime
            .modified(&absolute)
            .map_err(|e| MarkdownError::io(&absolute, e))?;

        {
            let mut cache = self.cache.lock();
            let cached = cache
                .entries
                .get(&absolute)
                .filter(|entry| modified <= entry.modified)
                .map(|entry| Arc::clone(&entry.file));
            if let Some(file) = cached {
                cache.hits += 1;
                debug!(path = %absolute.display(), "Context cache hit");
                return Ok(file);
            }
            cache.misses += 1;
        }

        debug!(path = %absolute.display(), "Context cache miss");
        let source =
            std::fs::read_to_string(&absolute).map_err(|e| MarkdownError::io(&absolute, e))?;
        let identity = path_identity(&self.canonical_base(), &absolute);
        let file = Arc::new(ContextFile::from_source(identity, &source, modified)?);

        self.cache.lock().entries.insert(
            absolute,
            CachedContext {
                file: Arc::clone(&file),
                modified,
            },
        );

        Ok(file)
    }

    /// Load every `*.md` file beneath `dir`, sorted by path.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Vec<Arc<ContextFile>> {
        let root = self.resolve(dir.as_ref());
        let mut paths: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("md"))
            .collect();
        paths.sort();

        paths
            .into_iter()
            .filter_map(|path| match self.load_context_file(&path) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping context file");
                    None
                }
            })
            .collect()
    }

    /// Drop one cached entry; returns whether it was present
    pub fn evict(&self, path: impl AsRef<Path>) -> bool {
        let absolute = self.cache_key(path.as_ref());
        let mut cache = self.cache.lock();
        let removed = cache.entries.remove(&absolute).is_some();
        if removed {
            cache.evictions += 1;
            debug!(path = %absolute.display(), "Evicted context cache entry");
        }
        removed
    }

    /// Drop all cached entries; returns how many were removed
    pub fn clear_cache(&self) -> usize {
        let mut cache = self.cache.lock();
        let count = cache.entries.len();
        cache.entries.clear();
        cache.evictions += count as u64;
        count
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: cache.hits,
            misses: cache.misses,
            evictions: cache.evictions,
            size: cache.entries.len(),
        }
    }

    /// Cached files carrying `tag`, sorted by path
    pub fn find_by_tag(&self, tag: &str) -> Vec<Arc<ContextFile>> {
        self.cached_where(|file| file.has_tag(tag))
    }

    /// Cached files in `category`, sorted by path
    pub fn find_by_category(&self, category: &str) -> Vec<Arc<ContextFile>> {
        self.cached_where(|file| file.has_category(category))
    }

    /// All cached files, highest priority first, ties broken by path
    pub fn sorted_by_priority(&self) -> Vec<Arc<ContextFile>> {
        let mut files = self.cached_where(|_| true);
        files.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        files
    }

    fn cached_where(&self, predicate: impl Fn(&ContextFile) -> bool) -> Vec<Arc<ContextFile>> {
        let cache = self.cache.lock();
        let mut files: Vec<Arc<ContextFile>> = cache
            .entries
            .values()
            .filter(|entry| predicate(&entry.file))
            .map(|entry| Arc::clone(&entry.file))
            .collect();
        files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        files
    }
}

/// Path identity relative to `base_dir` with `/` separators, or the full
/// path when it lies outside the base directory
pub fn path_identity(base_dir: &Path, path: &Path) -> String {
    match path.strip_prefix(base_dir) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
