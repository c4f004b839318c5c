//! Per-language symbol extraction behind one [`Extractor`] contract.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────┐
//!  filename ─────► │ extractor_for(lang)  │
//!                  └──────────┬───────────┘
//!       ┌──────────────┬──────┴───────┬──────────────┬─────────────┐
//!       ▼              ▼              ▼              ▼             ▼
//! ┌───────────┐ ┌────────────┐ ┌────────────┐ ┌───────────┐ ┌───────────┐
//! │javascript │ │  markup    │ │  python /  │ │   ruby    │ │    php    │
//! │ token     │ │ script     │ │  golang    │ │  token    │ │  token    │
//! │ patterns  │ │ isolation +│ │ tree-sitter│ │  patterns │ │  patterns │
//! │           │ │ javascript │ │ AST walk   │ │           │ │           │
//! └─────┬─────┘ └─────┬──────┘ └─────┬──────┘ └─────┬─────┘ └─────┬─────┘
//!       └─────────────┴──────────────┴──────┬───────┴─────────────┘
//!                                           ▼
//!                            SymbolTable { imports, definitions,
//!                                          parameters }
//! ```
//!
//! Extractors are stateless unit values; every call builds its own lexer or
//! parser. A structural parse failure is reported as
//! [`DeadsymError::Parse`](crate::error::DeadsymError) and turned into an
//! empty result by the analyzer.

pub mod golang;
pub mod javascript;
pub mod markup;
pub mod php;
pub mod python;
pub mod ruby;
mod syntax;

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::DeadsymResult;
use crate::language::Language;
use crate::model::{Definition, DefinitionKind, Import, Parameter, Span, SymbolTable};
use crate::usage::{CommentStyle, StrippedSource};

pub use golang::GoExtractor;
pub use javascript::JavaScriptExtractor;
pub use markup::MarkupExtractor;
pub use php::PhpExtractor;
pub use python::PythonExtractor;
pub use ruby::RubyExtractor;

/// Bumped whenever any extractor changes what it records, so cached symbol
/// tables from an older build are re-extracted.
pub const EXTRACTOR_VERSION: u32 = 3;

/// Common contract of every language extractor.
pub trait Extractor: Send + Sync {
    /// Pull imports, definitions and parameters out of `source`.
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable>;

    /// Comment syntax used when resolving usages in this language.
    fn comment_style(&self) -> CommentStyle;

    /// Text searched for local usages. Markup dialects blank out everything
    /// but the script region so that line numbers stay physical.
    fn usage_view<'a>(&self, source: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(source)
    }

    /// Whether names may also be used from the surrounding template.
    fn supports_template_usage(&self) -> bool {
        false
    }

    /// Template/markup usage of a script-declared name.
    fn template_usage(&self, _source: &str, _name: &str) -> bool {
        false
    }

    /// Language-specific extra evidence that an import is used, OR-ed with
    /// the plain whole-word check. `text` is the file's comment-free view.
    fn import_used_by_heuristic(&self, _text: &StrippedSource, _import: &Import) -> bool {
        false
    }
}

static JAVASCRIPT: JavaScriptExtractor = JavaScriptExtractor;
static VUE: MarkupExtractor = MarkupExtractor::new(Language::Vue);
static SVELTE: MarkupExtractor = MarkupExtractor::new(Language::Svelte);
static ASTRO: MarkupExtractor = MarkupExtractor::new(Language::Astro);
static PYTHON: PythonExtractor = PythonExtractor;
static GO: GoExtractor = GoExtractor;
static RUBY: RubyExtractor = RubyExtractor;
static PHP: PhpExtractor = PhpExtractor;

/// Select the extractor for a language. `Unknown` has none.
pub fn extractor_for(language: Language) -> Option<&'static dyn Extractor> {
    match language {
        Language::TypeScript | Language::JavaScript => Some(&JAVASCRIPT),
        Language::Vue => Some(&VUE),
        Language::Svelte => Some(&SVELTE),
        Language::Astro => Some(&ASTRO),
        Language::Python => Some(&PYTHON),
        Language::Go => Some(&GO),
        Language::Ruby => Some(&RUBY),
        Language::Php => Some(&PHP),
        Language::Unknown => None,
    }
}

/// Raw text of a file in an unrecognized language. It declares nothing but
/// can still reference names declared elsewhere (`onload="init()"` in HTML).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, _filename: &str, _source: &str) -> DeadsymResult<SymbolTable> {
        Ok(SymbolTable::default())
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::Markup
    }
}

static PLAIN_TEXT: PlainTextExtractor = PlainTextExtractor;

/// The extractor for `language`, or the plain-text reader for `Unknown`.
pub(crate) fn text_reader_for(language: Language) -> &'static dyn Extractor {
    extractor_for(language).unwrap_or(&PLAIN_TEXT)
}

/// Accumulates one file's records, enforcing first-occurrence-wins
/// deduplication by name across imports and definitions.
pub(crate) struct SymbolTableBuilder<'f> {
    file: &'f str,
    table: SymbolTable,
    names: HashSet<String>,
    params: HashSet<(String, usize)>,
    exported: HashSet<String>,
}

impl<'f> SymbolTableBuilder<'f> {
    pub(crate) fn new(file: &'f str) -> Self {
        Self {
            file,
            table: SymbolTable::default(),
            names: HashSet::new(),
            params: HashSet::new(),
            exported: HashSet::new(),
        }
    }

    pub(crate) fn import(
        &mut self,
        name: &str,
        source: &str,
        line: usize,
        end_line: usize,
        label: String,
    ) {
        if name.is_empty() || !self.names.insert(name.to_string()) {
            return;
        }
        self.table.imports.push(Import {
            name: name.to_string(),
            source: source.to_string(),
            line,
            end_line: end_line.max(line),
            label,
            file: self.file.to_string(),
        });
    }

    pub(crate) fn define(&mut self, name: &str, line: usize, kind: DefinitionKind, exported: bool) {
        if name.is_empty() || !self.names.insert(name.to_string()) {
            return;
        }
        self.table.definitions.push(Definition {
            name: name.to_string(),
            line,
            kind,
            exported,
            file: self.file.to_string(),
        });
    }

    /// Record a parameter declared in the list covered by `span`, reported
    /// on the signature `line`.
    pub(crate) fn parameter(&mut self, name: &str, line: usize, span: Span) {
        if name.is_empty() || !self.params.insert((name.to_string(), line)) {
            return;
        }
        self.table.parameters.push(Parameter {
            name: name.to_string(),
            line,
            span,
            file: self.file.to_string(),
        });
    }

    /// Mark a definition exported after the fact (`export { a }` and friends).
    pub(crate) fn mark_exported(&mut self, name: &str) {
        self.exported.insert(name.to_string());
    }

    pub(crate) fn finish(mut self) -> SymbolTable {
        for def in &mut self.table.definitions {
            if self.exported.contains(&def.name) {
                def.exported = true;
            }
        }
        self.table
    }
}

/// Parameters named `_` or starting with `_` are intentionally unused.
pub(crate) fn is_discard_name(name: &str) -> bool {
    name.trim_start_matches('$').starts_with('_')
}
