//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use deadsym_core::prelude::*;
//! ```

// Core analysis types
pub use crate::error::{DeadsymError, DeadsymResult};
pub use crate::model::{
    AnalysisResult, CodeIssue, Definition, DefinitionKind, Import, Parameter, SourceFile,
    SymbolTable, WorkspaceResult,
};

// Engine and language dispatch
pub use crate::engine::{Engine, EngineStats};
pub use crate::language::{detect_language, Language};

// Per-file and workspace analysis
pub use crate::analyzer::{analyze_file, UsageOracle};
pub use crate::workspace::{SymbolKey, UsageIndex};

// Extraction
pub use crate::extract::{extractor_for, Extractor};

// File scanning
pub use crate::scan::gather_source_files;

// Caching
pub use crate::cache::{load_cache, save_cache, SymbolCache};

// Configuration
pub use crate::config::{load_config, DeadsymConfig};

// Builder API
pub use crate::builder::{Deadsym, ScanReport};
