//! deadsym-core: multi-language unused symbol detection library
//!
//! This library finds unused imports, unused top-level definitions and
//! unused function parameters in TypeScript/JavaScript (including Vue,
//! Svelte and Astro components), Python, Go, Ruby and PHP sources.
//!
//! # Features
//!
//! - **Single-file analysis**: usage resolved from the file's own text
//! - **Workspace analysis**: usages resolved across every submitted file,
//!   including precise import-to-export linkage
//! - **Template awareness**: component tags and template expressions count
//!   as usage in markup-hosted scripts
//! - **Framework exemptions**: route handlers and lifecycle exports are
//!   never reported
//! - **Incremental caching**: symbol tables keyed by content fingerprint,
//!   workspace results keyed by the signature of the whole file set
//!
//! # Quick Start
//!
//! ```rust
//! use deadsym_core::prelude::*;
//!
//! let engine = Engine::new();
//! let result = engine.analyze(&SourceFile::new("main.py", "import os\n"));
//! assert_eq!(result.imports[0].text, "import os");
//! ```
//!
//! # Module Organization
//!
//! - [`lexer`]: character-level tokenizers for the token-pattern languages
//! - [`extract`]: per-language symbol extraction behind [`Extractor`]
//! - [`usage`]: comment-aware whole-word usage resolution
//! - [`analyzer`]: per-file issue construction and the exemption policy hook
//! - [`workspace`]: cross-file [`UsageIndex`]
//! - [`cache`]: fingerprint-keyed symbol cache with disk persistence
//! - [`engine`]: the lock-guarded [`Engine`] owning all caches
//! - [`builder`]: fluent API for analyzing a directory on disk
//! - [`error`]: typed error handling

pub mod analyzer;
pub mod builder;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod language;
pub mod lexer;
pub mod logging;
pub mod model;
pub mod policy;
pub mod prelude;
pub mod report;
pub mod scan;
pub mod usage;
pub mod workspace;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DeadsymError, DeadsymResult, IoResultExt};

// Data model
pub use model::{
    AnalysisResult, CodeIssue, Definition, DefinitionKind, Import, Parameter, SourceFile, Span,
    SymbolTable, WorkspaceResult,
};

// Engine
pub use engine::{Engine, EngineStats};

// Language dispatch
pub use language::{detect_language, Language};

// Extraction
pub use extract::{extractor_for, Extractor, EXTRACTOR_VERSION};

// Analysis
pub use analyzer::{analyze_file, build_result, LocalUsage, UsageOracle};
pub use workspace::{IndexedUsage, SymbolKey, UsageIndex, WorkspaceFile};

// Usage resolution
pub use usage::{contains_word, is_used, CommentStyle};

// Exemption policy
pub use policy::is_framework_export;

// Cache types
pub use cache::{
    content_fingerprint, load_cache, save_cache, workspace_signature, CacheMetadata,
    ParsedFileEntry, SymbolCache,
};

// Builder API
pub use builder::{Deadsym, ScanReport};

// Configuration
pub use config::{load_config, DeadsymConfig, OutputConfig};

// Logging
pub use logging::{init_plain_logging, init_structured_logging};

// Reporting
pub use report::{print_json, print_plain, summarize, Summary};

// File scanning
pub use scan::gather_source_files;

#[cfg(test)]
mod tests;
