//! Workspace-level usage resolution across a full file set.
//!
//! # Algorithm
//!
//! ```text
//! files ──► symbol tables ──► UsageIndex::build ──► IndexedUsage ──► build_result
//!                                  │
//!        ┌─────────────────────────┼────────────────────────────┐
//!        ▼                         ▼                            ▼
//!  (a) own text, outside    (b) any other file's text,   (c) exported definition
//!      the declaration          minus its import lines       bound by another
//!                               and its own declarations     file's import
//! ```
//!
//! A symbol is used when any of (a), (b) or (c) holds; (c) applies to
//! exported definitions only. Files in unrecognized languages declare nothing
//! but are still searched as plain text for (b). The index is rebuilt from scratch on every
//! workspace analysis. Parameters are function-local and keep the
//! single-file check.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use tracing::debug;

use crate::analyzer::{build_result, LocalUsage, UsageOracle};
use crate::extract::{extractor_for, text_reader_for, Extractor};
use crate::language::Language;
use crate::model::{AnalysisResult, Definition, Import, Parameter, SymbolTable};

/// Identity of a symbol in the workspace: its owning file and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey {
    pub file: String,
    pub name: String,
}

impl SymbolKey {
    pub fn new(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
        }
    }
}

/// One member of a workspace together with its extracted symbols.
#[derive(Debug, Clone)]
pub struct WorkspaceFile<'a> {
    pub filename: &'a str,
    pub language: Language,
    pub source: &'a str,
    pub table: SymbolTable,
}

/// A workspace file prepared for repeated usage queries.
struct Prepared<'a> {
    file: &'a WorkspaceFile<'a>,
    local: LocalUsage<'a>,
    import_lines: Vec<RangeInclusive<usize>>,
}

impl<'a> Prepared<'a> {
    fn new(file: &'a WorkspaceFile<'a>, extractor: &'static dyn Extractor) -> Self {
        Self {
            file,
            local: LocalUsage::new(extractor, file.source),
            import_lines: file.table.imports.iter().map(Import::span).collect(),
        }
    }

    /// A genuine reference to `name` from this file, as seen by another
    /// file declaring it. Import statements and this file's own
    /// declarations of the same name do not count.
    fn references(&self, name: &str) -> bool {
        let own = self.file.table.declaration_lines(name);
        self.local.text().find_where(name, |l| {
            own.contains(&l) || self.import_lines.iter().any(|r| r.contains(&l))
        }) || self.local.template_mentions(name)
    }
}

/// Which (file, name) pairs are used anywhere in the workspace.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    used: HashSet<SymbolKey>,
}

impl UsageIndex {
    /// Build the index over every import and definition of `files`.
    pub fn build(files: &[WorkspaceFile<'_>]) -> Self {
        let prepared: Vec<Prepared<'_>> = files
            .iter()
            .map(|f| Prepared::new(f, text_reader_for(f.language)))
            .collect();

        // name -> files binding it through an import
        let mut importers: HashMap<&str, HashSet<&str>> = HashMap::new();
        for p in &prepared {
            for import in &p.file.table.imports {
                importers
                    .entry(import.name.as_str())
                    .or_default()
                    .insert(p.file.filename);
            }
        }

        let elsewhere = |owner: &str, name: &str| {
            prepared
                .iter()
                .filter(|other| other.file.filename != owner)
                .any(|other| other.references(name))
        };

        let mut used = HashSet::new();
        for p in &prepared {
            let owner = p.file.filename;
            for import in &p.file.table.imports {
                if p.local.import_used(import) || elsewhere(owner, &import.name) {
                    used.insert(SymbolKey::new(owner, &import.name));
                }
            }
            for def in &p.file.table.definitions {
                let linked = def.exported
                    && importers
                        .get(def.name.as_str())
                        .is_some_and(|files| files.iter().any(|f| *f != owner));
                if linked || p.local.definition_used(def) || elsewhere(owner, &def.name) {
                    used.insert(SymbolKey::new(owner, &def.name));
                }
            }
        }

        debug!(files = files.len(), used = used.len(), "built workspace usage index");
        Self { used }
    }

    pub fn is_used(&self, file: &str, name: &str) -> bool {
        self.used.contains(&SymbolKey::new(file, name))
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Usage answers for one file backed by a [`UsageIndex`].
pub struct IndexedUsage<'a> {
    index: &'a UsageIndex,
    file: &'a str,
    local: LocalUsage<'a>,
}

impl<'a> IndexedUsage<'a> {
    pub fn new(index: &'a UsageIndex, file: &'a WorkspaceFile<'a>, extractor: &'a dyn Extractor) -> Self {
        Self {
            index,
            file: file.filename,
            local: LocalUsage::new(extractor, file.source),
        }
    }
}

impl UsageOracle for IndexedUsage<'_> {
    fn import_used(&self, import: &Import) -> bool {
        self.index.is_used(self.file, &import.name)
    }

    fn definition_used(&self, definition: &Definition) -> bool {
        self.index.is_used(self.file, &definition.name)
    }

    fn parameter_used(&self, parameter: &Parameter) -> bool {
        self.local.parameter_used(parameter)
    }
}

/// Per-file results for a whole workspace, keyed by filename. Files without
/// an extractor get an empty result.
pub fn analyze_tables(files: &[WorkspaceFile<'_>]) -> Vec<(String, AnalysisResult)> {
    let index = UsageIndex::build(files);
    files
        .iter()
        .map(|file| {
            let result = match extractor_for(file.language) {
                Some(extractor) => {
                    let usage = IndexedUsage::new(&index, file, extractor);
                    build_result(file.filename, file.language, &file.table, &usage)
                }
                None => AnalysisResult::default(),
            };
            (file.filename.to_string(), result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::extract_symbols;
    use crate::language::detect_language;

    fn workspace<'a>(files: &[(&'a str, &'a str)]) -> Vec<WorkspaceFile<'a>> {
        files
            .iter()
            .map(|(name, src)| {
                let language = detect_language(name);
                WorkspaceFile {
                    filename: name,
                    language,
                    source: src,
                    table: extract_symbols(name, language, src),
                }
            })
            .collect()
    }

    fn variables<'r>(results: &'r [(String, AnalysisResult)], file: &str) -> Vec<&'r str> {
        results
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, r)| r.variables.iter().map(|i| i.text.as_str()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_import_binding_links_exported_definition() {
        let files = workspace(&[
            ("a.ts", "export function helper() { return 1; }\n"),
            ("b.ts", "import { helper } from './a';\n"),
        ]);
        let results = analyze_tables(&files);
        assert!(variables(&results, "a.ts").is_empty());
    }

    #[test]
    fn test_unknown_language_file_references_count() {
        let files = workspace(&[
            ("app.js", "function initApp() {}\nfunction unusedThing() {}\n"),
            ("index.html", "<body onload=\"initApp()\">\n<!-- unusedThing() -->\n</body>\n"),
        ]);
        let results = analyze_tables(&files);
        assert_eq!(variables(&results, "app.js"), vec!["function unusedThing"]);
        let html = &results.iter().find(|(f, _)| f == "index.html").unwrap().1;
        assert!(html.is_empty());
    }

    #[test]
    fn test_unimported_export_is_reported() {
        let files = workspace(&[
            ("file1.ts", "export class Widget {}\n"),
            ("file2.ts", "const x = 1;\nconsole.log(x);\n"),
        ]);
        let results = analyze_tables(&files);
        assert_eq!(variables(&results, "file1.ts"), vec!["class Widget"]);
    }

    #[test]
    fn test_reference_in_other_file_counts() {
        let files = workspace(&[
            ("util.py", "def slugify(s):\n    return s\n"),
            ("main.py", "from util import *\nprint(slugify('x'))\n"),
        ]);
        let index = UsageIndex::build(&files);
        assert!(index.is_used("util.py", "slugify"));
    }

    #[test]
    fn test_reimport_alone_is_not_a_reference() {
        let files = workspace(&[
            ("a.js", "export const token = 1;\n"),
            ("b.js", "import { token } from './a';\n"),
        ]);
        let index = UsageIndex::build(&files);
        // b's import line is stripped, so b's own import stays unused
        assert!(!index.is_used("b.js", "token"));
        // a's export is linked through b's binding
        assert!(index.is_used("a.js", "token"));
    }

    #[test]
    fn test_same_name_declared_elsewhere_is_not_a_reference() {
        let files = workspace(&[
            ("a.py", "counter = 0\n"),
            ("b.py", "counter = 1\n"),
        ]);
        let index = UsageIndex::build(&files);
        assert!(!index.is_used("a.py", "counter"));
        assert!(!index.is_used("b.py", "counter"));
    }

    #[test]
    fn test_whole_word_across_files() {
        let files = workspace(&[
            ("a.py", "total = 0\n"),
            ("c.py", "subtotal = 3\nprint(subtotal)\n"),
        ]);
        let index = UsageIndex::build(&files);
        assert!(!index.is_used("a.py", "total"));
        assert!(index.is_used("c.py", "subtotal"));
    }

    #[test]
    fn test_comment_mentions_elsewhere_do_not_count() {
        let files = workspace(&[
            ("a.go", "package a\n\nfunc Helper() {}\n"),
            ("b.go", "package b\n\n// Helper is documented here\n"),
        ]);
        let index = UsageIndex::build(&files);
        assert!(!index.is_used("a.go", "Helper"));
    }

    #[test]
    fn test_parameters_stay_local() {
        let files = workspace(&[
            ("a.py", "def f(unused):\n    return 1\n\nf(2)\n"),
            ("b.py", "unused = 3\nprint(unused)\n"),
        ]);
        let results = analyze_tables(&files);
        let (_, a) = results.iter().find(|(f, _)| f == "a.py").unwrap();
        assert_eq!(a.parameters.len(), 1);
    }

    #[test]
    fn test_broken_file_contributes_nothing() {
        let files = workspace(&[
            ("ok.py", "import os\nos.getcwd()\n"),
            ("bad.py", "def (:\n"),
            ("notes.txt", "anything"),
        ]);
        let results = analyze_tables(&files);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|(_, r)| r.is_empty()));
    }

    #[test]
    fn test_symbol_key_is_structured() {
        let a = SymbolKey::new("x@y", "z");
        let b = SymbolKey::new("x", "y@z");
        assert_ne!(a, b);
    }
}
