//! The analysis engine: one value owning every cache, behind one lock.
//!
//! ```text
//!            analyze(file)                    analyze_workspace(files)
//!                 │                                     │
//!                 ▼                                     ▼
//!   ┌──────────────────────────┐        ┌──────────────────────────────┐
//!   │ result cache             │        │ workspace cache              │
//!   │ (filename, fingerprint)  │        │ signature of all files       │
//!   └────────────┬─────────────┘        └──────────────┬───────────────┘
//!                │ miss                                │ miss
//!                ▼                                     ▼
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │ SymbolCache (filename, fingerprint, language, extractor version)  │
//!   └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests are serialized by a single [`Mutex`]. Results leave the engine
//! as fresh copies with new issue ids, so callers never alias cached data.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::analyzer::analyze_table;
use crate::cache::{fingerprint_of, workspace_signature, CacheLookup, SymbolCache};
use crate::extract::extractor_for;
use crate::language::{self, Language};
use crate::model::{AnalysisResult, SourceFile, SymbolTable, WorkspaceResult};
use crate::workspace::{analyze_tables, WorkspaceFile};

/// Counters of work done and avoided, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Extractor invocations
    pub extractions: u64,
    /// Symbol tables served from the symbol cache
    pub symbol_hits: u64,
    /// Single-file results served from the result cache
    pub result_hits: u64,
    /// Workspace results served from the workspace cache
    pub workspace_hits: u64,
}

struct CachedResult {
    fingerprint: String,
    result: AnalysisResult,
}

#[derive(Default)]
struct EngineState {
    symbols: SymbolCache,
    results: HashMap<String, CachedResult>,
    workspace: Option<(String, WorkspaceResult)>,
    stats: EngineStats,
}

impl EngineState {
    fn symbols_for(
        &mut self,
        filename: &str,
        language: Language,
        fingerprint: &str,
        source: &str,
    ) -> SymbolTable {
        let (table, lookup) = self
            .symbols
            .get_or_extract(filename, language, fingerprint, source);
        match lookup {
            CacheLookup::Hit => self.stats.symbol_hits += 1,
            CacheLookup::Extracted => self.stats.extractions += 1,
        }
        table
    }
}

/// Multi-language unused-symbol analyzer.
///
/// Construct once and share by reference; every method takes `&self`.
#[derive(Default)]
pub struct Engine {
    state: Mutex<EngineState>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine seeded with a previously saved symbol cache.
    pub fn with_symbol_cache(symbols: SymbolCache) -> Self {
        Self {
            state: Mutex::new(EngineState {
                symbols,
                ..EngineState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // a panic mid-request leaves caches that are at worst incomplete
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Language tag for a filename.
    pub fn detect_language(&self, filename: &str) -> Language {
        language::detect_language(filename)
    }

    /// Analyze one file on its own. Never fails: unknown languages and
    /// unparseable files give an empty result.
    pub fn analyze(&self, file: &SourceFile) -> AnalysisResult {
        let language = language::detect_language(&file.filename);
        let Some(extractor) = extractor_for(language) else {
            return AnalysisResult::default();
        };
        let fingerprint = fingerprint_of(file);

        let mut state = self.lock();
        if let Some(cached) = state.results.get(&file.filename) {
            if cached.fingerprint == fingerprint {
                let fresh = cached.result.with_fresh_ids();
                state.stats.result_hits += 1;
                debug!(file = %file.filename, "result cache hit");
                return fresh;
            }
        }

        let table = state.symbols_for(&file.filename, language, &fingerprint, &file.content);
        let result = analyze_table(&file.filename, language, extractor, &file.content, &table);
        state.results.insert(
            file.filename.clone(),
            CachedResult {
                fingerprint,
                result: result.clone(),
            },
        );
        result
    }

    /// Analyze a set of files together, resolving usages across files.
    pub fn analyze_workspace(&self, files: &[SourceFile]) -> WorkspaceResult {
        let fingerprints: Vec<String> = files.iter().map(fingerprint_of).collect();
        let signature = workspace_signature(
            files
                .iter()
                .zip(&fingerprints)
                .map(|(f, fp)| (f.filename.as_str(), fp.as_str())),
        );

        let mut state = self.lock();
        if let Some((cached_sig, cached)) = &state.workspace {
            if *cached_sig == signature {
                let fresh = cached.with_fresh_ids();
                state.stats.workspace_hits += 1;
                debug!(files = files.len(), "workspace cache hit");
                return fresh;
            }
        }

        let members: Vec<WorkspaceFile<'_>> = files
            .iter()
            .zip(&fingerprints)
            .map(|(file, fingerprint)| {
                let language = language::detect_language(&file.filename);
                let table = state.symbols_for(&file.filename, language, fingerprint, &file.content);
                WorkspaceFile {
                    filename: &file.filename,
                    language,
                    source: &file.content,
                    table,
                }
            })
            .collect();

        let result = WorkspaceResult {
            results: analyze_tables(&members).into_iter().collect(),
        };
        state.workspace = Some((signature, result.clone()));
        result
    }

    /// Snapshot of the symbol cache, for persistence.
    pub fn symbol_cache(&self) -> SymbolCache {
        self.lock().symbols.clone()
    }

    pub fn stats(&self) -> EngineStats {
        self.lock().stats
    }

    /// Drop every cached table and result.
    pub fn clear(&self) {
        let mut state = self.lock();
        let stats = state.stats;
        *state = EngineState {
            stats,
            ..EngineState::default()
        };
    }
}
