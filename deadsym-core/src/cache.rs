//! Fingerprint-keyed symbol cache with SHA-256 change detection.
//!
//! Extracted symbol tables are cached per filename and reused while the
//! content fingerprint, the language and the extractor version all match.
//! Any mismatch triggers re-extraction; stale entries are never served.
//!
//! # Cache Versioning
//!
//! The on-disk cache carries version metadata so that it is discarded when:
//! - the deadsym version changes major version
//! - the cache format changes
//!
//! Entries written by an older extractor are re-extracted individually
//! (see [`EXTRACTOR_VERSION`]).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::analyzer::extract_symbols;
use crate::error::{DeadsymError, DeadsymResult, IoResultExt};
use crate::extract::EXTRACTOR_VERSION;
use crate::language::Language;
use crate::model::{SourceFile, SymbolTable};

/// Maximum cache file size (50MB) - prevents unbounded cache growth
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when cache format changes.
const CACHE_VERSION: u32 = 1;

/// Deadsym version for cache compatibility checking.
const DEADSYM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory (under the analysis root) holding the cache file.
pub const CACHE_DIR: &str = ".deadsym";

const CACHE_FILE: &str = "cache.json";

/// Compute SHA-256 hash from bytes (in-memory, no I/O).
#[inline]
fn hash_bytes(bytes: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(bytes);
    format!("{:x}", sha.finalize())
}

/// Fingerprint of file content.
pub fn content_fingerprint(content: &str) -> String {
    hash_bytes(content.as_bytes())
}

/// The caller's fingerprint, or one computed from content when absent.
pub fn fingerprint_of(file: &SourceFile) -> String {
    if file.content_fingerprint.is_empty() {
        content_fingerprint(&file.content)
    } else {
        file.content_fingerprint.clone()
    }
}

/// Order-independent signature of a file set: SHA-256 over the sorted
/// `filename|fingerprint` rows.
pub fn workspace_signature<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut rows: Vec<String> = rows
        .into_iter()
        .map(|(filename, fingerprint)| format!("{filename}|{fingerprint}"))
        .collect();
    rows.sort();

    let mut sha = Sha256::new();
    for row in &rows {
        sha.update(row.as_bytes());
        sha.update(b"\n");
    }
    format!("{:x}", sha.finalize())
}

/// Cached extraction of one file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParsedFileEntry {
    pub fingerprint: String,
    pub language: Language,
    pub extractor_version: u32,
    pub symbols: SymbolTable,
}

impl ParsedFileEntry {
    /// True if this entry may be served for the given key.
    pub fn matches(&self, fingerprint: &str, language: Language) -> bool {
        self.fingerprint == fingerprint
            && self.language == language
            && self.extractor_version == EXTRACTOR_VERSION
    }
}

/// Cache metadata for version checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheMetadata {
    /// Cache format version
    pub cache_version: u32,
    /// Deadsym version that created this cache
    pub deadsym_version: String,
    /// Timestamp when cache was created
    #[serde(default)]
    pub created_at: u64,
}

impl CacheMetadata {
    /// Create metadata for current environment.
    pub fn current() -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            cache_version: CACHE_VERSION,
            deadsym_version: DEADSYM_VERSION.to_string(),
            created_at,
        }
    }

    /// Check if this cache is compatible with current version.
    pub fn is_compatible(&self) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        let current_major = DEADSYM_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.deadsym_version.split('.').next().unwrap_or("0");

        current_major == cached_major
    }
}

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Extracted,
}

/// The full cache model, stored as `.deadsym/cache.json`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SymbolCache {
    #[serde(default)]
    pub metadata: CacheMetadata,
    /// Maps filename to its cached extraction.
    pub files: HashMap<String, ParsedFileEntry>,
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self {
            metadata: CacheMetadata::current(),
            files: HashMap::new(),
        }
    }
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&ParsedFileEntry> {
        self.files.get(filename)
    }

    /// Symbols of `filename`, extracted only on a cache miss.
    pub fn get_or_extract(
        &mut self,
        filename: &str,
        language: Language,
        fingerprint: &str,
        source: &str,
    ) -> (SymbolTable, CacheLookup) {
        if let Some(entry) = self.files.get(filename) {
            if entry.matches(fingerprint, language) {
                debug!(file = filename, "symbol cache hit");
                return (entry.symbols.clone(), CacheLookup::Hit);
            }
        }

        debug!(file = filename, %language, "symbol cache miss, extracting");
        let symbols = extract_symbols(filename, language, source);
        self.files.insert(
            filename.to_string(),
            ParsedFileEntry {
                fingerprint: fingerprint.to_string(),
                language,
                extractor_version: EXTRACTOR_VERSION,
                symbols: symbols.clone(),
            },
        );
        (symbols, CacheLookup::Extracted)
    }

    /// Drop entries for files not in `keep`.
    pub fn retain_files(&mut self, keep: &HashSet<String>) {
        self.files.retain(|name, _| keep.contains(name));
    }
}

fn cache_path(root: &Path) -> std::path::PathBuf {
    root.join(CACHE_DIR).join(CACHE_FILE)
}

/// Load the cache from `.deadsym/cache.json`.
///
/// Returns `None` if:
/// - File doesn't exist
/// - File is corrupted
/// - Cache version is incompatible with current deadsym version
pub fn load_cache(root: &Path) -> Option<SymbolCache> {
    let path = cache_path(root);
    if !path.exists() {
        return None;
    }

    match read_cache(&path) {
        Ok(cache) => Some(cache),
        Err(e) if e.is_recoverable() => {
            info!(error = %e, "discarding cache, rebuilding");
            let _ = fs::remove_file(&path);
            None
        }
        Err(e) => {
            warn!(path = e.file().as_deref().unwrap_or_default(), error = %e, "cache not readable");
            None
        }
    }
}

fn read_cache(path: &Path) -> DeadsymResult<SymbolCache> {
    let text = fs::read_to_string(path).with_path(path)?;
    let cache: SymbolCache = serde_json::from_str(&text)
        .map_err(|e| DeadsymError::cache(format!("unreadable cache: {e}")))?;

    if !cache.metadata.is_compatible() {
        return Err(DeadsymError::cache(format!(
            "version mismatch: cache {} ({}), current {}",
            cache.metadata.cache_version, cache.metadata.deadsym_version, CACHE_VERSION
        )));
    }
    Ok(cache)
}

/// Save the cache to disk.
///
/// Writes to a uniquely named temp file and renames it into place, so a
/// reader never sees a partial file. A cache larger than the size cap is
/// deleted instead of written.
pub fn save_cache(root: &Path, cache: &SymbolCache) -> Result<()> {
    let dir = root.join(CACHE_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache dir: {}", dir.display()))?;
    }

    let path = dir.join(CACHE_FILE);
    let json = serde_json::to_string_pretty(cache)?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        warn!(
            limit_mb = MAX_CACHE_SIZE_BYTES / 1_000_000,
            "cache exceeds size limit, clearing"
        );
        let _ = fs::remove_file(&path);
        return Ok(());
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("{CACHE_FILE}.{}.{}.tmp", std::process::id(), nanos));

    fs::write(&temp_path, &json).with_path(&temp_path)?;

    fs::rename(&temp_path, &path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename cache file to: {}", path.display())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("deadsym_cache_test").join(format!(
            "{}_{}_{}",
            name,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_hash_bytes_empty() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_fallback() {
        let given = SourceFile::new("a.py", "x = 1").with_fingerprint("v1");
        assert_eq!(fingerprint_of(&given), "v1");

        let missing = SourceFile::new("a.py", "x = 1");
        assert_eq!(fingerprint_of(&missing), content_fingerprint("x = 1"));
        assert_eq!(fingerprint_of(&missing).len(), 64);
    }

    #[test]
    fn test_workspace_signature_order_independent() {
        let a = workspace_signature([("a.ts", "1"), ("b.ts", "2")]);
        let b = workspace_signature([("b.ts", "2"), ("a.ts", "1")]);
        assert_eq!(a, b);
        assert_ne!(a, workspace_signature([("a.ts", "1"), ("b.ts", "3")]));
    }

    #[test]
    fn test_workspace_signature_separates_fields() {
        // rows are delimited, so shifting text between name and fingerprint differs
        let a = workspace_signature([("ab", "c")]);
        let b = workspace_signature([("a", "bc")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_or_extract_hit_and_miss() {
        let mut cache = SymbolCache::new();
        let src = "import os\n";
        let (t1, l1) = cache.get_or_extract("a.py", Language::Python, "f1", src);
        let (t2, l2) = cache.get_or_extract("a.py", Language::Python, "f1", src);
        assert_eq!(l1, CacheLookup::Extracted);
        assert_eq!(l2, CacheLookup::Hit);
        assert_eq!(t1, t2);
        assert_eq!(t1.imports[0].name, "os");
    }

    #[test]
    fn test_fingerprint_change_reextracts() {
        let mut cache = SymbolCache::new();
        cache.get_or_extract("a.py", Language::Python, "f1", "import os\n");
        let (t, lookup) = cache.get_or_extract("a.py", Language::Python, "f2", "import sys\n");
        assert_eq!(lookup, CacheLookup::Extracted);
        assert_eq!(t.imports[0].name, "sys");
        assert_eq!(cache.get("a.py").unwrap().fingerprint, "f2");
    }

    #[test]
    fn test_language_change_reextracts() {
        let mut cache = SymbolCache::new();
        cache.get_or_extract("a", Language::Python, "f1", "import os\n");
        let (_, lookup) = cache.get_or_extract("a", Language::Ruby, "f1", "import os\n");
        assert_eq!(lookup, CacheLookup::Extracted);
    }

    #[test]
    fn test_stale_extractor_version_reextracts() {
        let mut cache = SymbolCache::new();
        cache.files.insert(
            "a.py".into(),
            ParsedFileEntry {
                fingerprint: "f1".into(),
                language: Language::Python,
                extractor_version: EXTRACTOR_VERSION.wrapping_sub(1),
                symbols: SymbolTable::default(),
            },
        );
        let (t, lookup) = cache.get_or_extract("a.py", Language::Python, "f1", "import os\n");
        assert_eq!(lookup, CacheLookup::Extracted);
        assert_eq!(t.imports.len(), 1);
    }

    #[test]
    fn test_retain_files() {
        let mut cache = SymbolCache::new();
        cache.get_or_extract("a.py", Language::Python, "1", "");
        cache.get_or_extract("b.py", Language::Python, "1", "");
        let keep: HashSet<String> = ["b.py".to_string()].into_iter().collect();
        cache.retain_files(&keep);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b.py").is_some());
    }

    #[test]
    fn test_cache_save_load() {
        let dir = create_temp_dir("save_load");
        let mut cache = SymbolCache::new();
        cache.get_or_extract("main.go", Language::Go, "abc123", "package main\nimport \"fmt\"\n");
        save_cache(&dir, &cache).unwrap();

        let loaded = load_cache(&dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("main.go"), cache.get("main.go"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_cache_not_found() {
        let dir = create_temp_dir("not_found");
        assert!(load_cache(&dir).is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_read_cache_reports_typed_errors() {
        let dir = create_temp_dir("typed_errors");
        let path = dir.join(CACHE_FILE);
        assert!(matches!(read_cache(&path), Err(DeadsymError::Io { .. })));

        fs::write(&path, "{ not json").unwrap();
        let err = read_cache(&path).unwrap_err();
        assert!(matches!(err, DeadsymError::Cache { .. }));
        assert!(err.is_recoverable());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_cache_corrupted_json() {
        let dir = create_temp_dir("corrupted");
        fs::create_dir_all(dir.join(CACHE_DIR)).unwrap();
        fs::write(dir.join(CACHE_DIR).join(CACHE_FILE), "{ not valid json ").unwrap();
        assert!(load_cache(&dir).is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_incompatible_cache_is_removed() {
        let dir = create_temp_dir("incompatible");
        let mut cache = SymbolCache::new();
        cache.metadata.cache_version = CACHE_VERSION + 1;
        save_cache(&dir, &cache).unwrap();
        assert!(load_cache(&dir).is_none());
        assert!(!cache_path(&dir).exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let dir = create_temp_dir("atomic_no_temp");
        save_cache(&dir, &SymbolCache::default()).unwrap();
        for entry in fs::read_dir(dir.join(CACHE_DIR)).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "Temp file left behind: {}", name);
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_metadata_compatibility() {
        assert!(CacheMetadata::current().is_compatible());
        let old = CacheMetadata {
            cache_version: CACHE_VERSION,
            deadsym_version: "999.0.0".into(),
            created_at: 0,
        };
        assert!(!old.is_compatible());
    }
}
