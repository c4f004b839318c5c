//! Builder pattern API for analyzing a directory tree.
//!
//! Provides a fluent interface for configuring and running a workspace
//! analysis over files on disk:
//!
//! ```rust,ignore
//! use deadsym_core::prelude::*;
//!
//! let report = Deadsym::new("/path/to/project")
//!     .with_cache(true)
//!     .exclude_dirs(["fixtures"])
//!     .include_parameters(false)
//!     .analyze()?;
//!
//! println!("{} findings", report.total());
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cache;
use crate::config::DeadsymConfig;
use crate::engine::{Engine, EngineStats};
use crate::model::{SourceFile, WorkspaceResult};
use crate::scan::gather_source_files;

/// Builder for configuring a directory analysis.
#[derive(Debug, Clone)]
pub struct Deadsym {
    /// Root directory to analyze
    root: PathBuf,

    /// Whether to load and persist `.deadsym/cache.json`
    use_cache: bool,

    /// Whether parameter findings are reported
    include_parameters: bool,

    /// Custom excluded directories
    excluded_dirs: Vec<String>,

    /// Filename patterns whose findings are suppressed
    ignored_patterns: Vec<String>,
}

impl Deadsym {
    /// Create a new analysis builder for the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_cache: true,
            include_parameters: true,
            excluded_dirs: Vec::new(),
            ignored_patterns: Vec::new(),
        }
    }

    /// Enable or disable the on-disk symbol cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Report unused parameters (default true).
    pub fn include_parameters(mut self, enabled: bool) -> Self {
        self.include_parameters = enabled;
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add filename patterns whose findings are dropped.
    pub fn ignore_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Apply the settings of a `deadsym.toml`.
    pub fn with_config(mut self, config: &DeadsymConfig) -> Self {
        if let Some(dirs) = &config.exclude_dirs {
            self.excluded_dirs.extend(dirs.iter().cloned());
        }
        if let Some(patterns) = &config.ignore {
            self.ignored_patterns.extend(patterns.iter().cloned());
        }
        self.include_parameters = config.report_parameters();
        self
    }

    /// Run the analysis and return the report.
    pub fn analyze(&self) -> Result<ScanReport> {
        // 1. Gather files
        let excludes: Vec<&str> = self.excluded_dirs.iter().map(String::as_str).collect();
        let paths = gather_source_files(&self.root, &excludes)
            .context("Failed to gather source files")?;

        // 2. Read in parallel; analysis itself stays serialized in the engine
        let files: Vec<SourceFile> = paths
            .par_iter()
            .filter_map(|path| read_source(&self.root, path))
            .collect();

        // 3. Seed the engine from the cache if enabled
        let engine = match self.use_cache.then(|| cache::load_cache(&self.root)).flatten() {
            Some(symbols) => Engine::with_symbol_cache(symbols),
            None => Engine::new(),
        };

        // 4. Workspace analysis
        let mut results = engine.analyze_workspace(&files);
        results.results.retain(|name, _| !self.is_ignored(name));
        if !self.include_parameters {
            for result in results.results.values_mut() {
                result.parameters.clear();
            }
        }

        // 5. Persist the cache, pruned to the current file set
        if self.use_cache {
            let mut symbols = engine.symbol_cache();
            let present: HashSet<String> = files.iter().map(|f| f.filename.clone()).collect();
            symbols.retain_files(&present);
            if let Err(e) = cache::save_cache(&self.root, &symbols) {
                warn!(error = %e, "cache save failed");
            }
        }

        let stats = engine.stats();
        info!(
            files = files.len(),
            findings = results.total(),
            extractions = stats.extractions,
            "analysis complete"
        );

        Ok(ScanReport {
            root: self.root.clone(),
            files_analyzed: files.len(),
            results,
            stats,
        })
    }

    /// Check if a filename matches any ignored pattern.
    fn is_ignored(&self, name: &str) -> bool {
        self.ignored_patterns.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                name.starts_with(prefix)
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                name.ends_with(suffix)
            } else {
                name.contains(pattern.as_str())
            }
        })
    }
}

/// Read one file as a [`SourceFile`] named relative to `root`.
fn read_source(root: &Path, path: &Path) -> Option<SourceFile> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };
    let relative = path.strip_prefix(root).unwrap_or(path);
    let filename = relative.to_string_lossy().replace('\\', "/");
    Some(SourceFile::new(filename, content))
}

/// Result of analyzing a directory.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Root path that was analyzed
    pub root: PathBuf,

    /// Number of source files read
    pub files_analyzed: usize,

    /// Per-file findings, keyed by root-relative filename
    pub results: WorkspaceResult,

    /// Engine counters for this run
    pub stats: EngineStats,
}

impl ScanReport {
    /// Check if anything unused was found.
    pub fn has_findings(&self) -> bool {
        self.total() > 0
    }

    /// Total count of all findings.
    pub fn total(&self) -> usize {
        self.results.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_project() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "deadsym_builder_test_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(dir.join("src")).expect("Failed to create test directory");

        fs::write(
            dir.join("src/util.ts"),
            "export function used() { return 1; }\nexport function dead(x) { return 2; }\n",
        )
        .expect("Failed to write util.ts");
        fs::write(
            dir.join("src/main.ts"),
            "import { used } from './util';\nimport fs from 'fs';\nconsole.log(used());\n",
        )
        .expect("Failed to write main.ts");
        fs::write(dir.join("notes.md"), "dead used fs").expect("Failed to write notes.md");

        dir
    }

    #[test]
    fn test_builder_basic() {
        let dir = create_test_project();
        let report = Deadsym::new(&dir).with_cache(false).analyze().unwrap();

        assert_eq!(report.files_analyzed, 2);
        let util = report.results.get("src/util.ts").unwrap();
        let vars: Vec<_> = util.variables.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(vars, vec!["function dead"]);
        assert_eq!(util.parameters[0].text, "parameter x");

        let main = report.results.get("src/main.ts").unwrap();
        assert_eq!(main.imports[0].text, "import fs");
        assert!(!dir.join(".deadsym").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_ignore_patterns() {
        let dir = create_test_project();
        let report = Deadsym::new(&dir)
            .with_cache(false)
            .ignore_patterns(["util"])
            .analyze()
            .unwrap();

        assert!(report.results.get("src/util.ts").is_none());
        assert!(report.results.get("src/main.ts").is_some());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_without_parameters() {
        let dir = create_test_project();
        let report = Deadsym::new(&dir)
            .with_cache(false)
            .include_parameters(false)
            .analyze()
            .unwrap();
        assert!(report.results.results.values().all(|r| r.parameters.is_empty()));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_persists_and_reuses_cache() {
        let dir = create_test_project();
        let first = Deadsym::new(&dir).analyze().unwrap();
        assert_eq!(first.stats.extractions, 2);
        assert!(dir.join(".deadsym/cache.json").exists());

        let second = Deadsym::new(&dir).analyze().unwrap();
        assert_eq!(second.stats.extractions, 0);
        assert_eq!(second.stats.symbol_hits, 2);
        assert_eq!(first.total(), second.total());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_with_config() {
        let dir = create_test_project();
        let config: DeadsymConfig =
            toml::from_str("ignore = [\"main\"]\n[analysis]\nparameters = false\n").unwrap();
        let report = Deadsym::new(&dir)
            .with_cache(false)
            .with_config(&config)
            .analyze()
            .unwrap();
        assert_eq!(report.results.results.len(), 1);
        assert!(report.results.results.values().all(|r| r.parameters.is_empty()));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_ignore_pattern_forms() {
        let b = Deadsym::new("/x").ignore_patterns(["gen*", "*.d.ts", "fixtures"]);
        assert!(b.is_ignored("generated/a.ts"));
        assert!(b.is_ignored("src/types.d.ts"));
        assert!(b.is_ignored("test/fixtures/a.py"));
        assert!(!b.is_ignored("src/app.ts"));
    }
}
