//! Shared data model: symbol records, issues and per-file results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind label of a definition, rendered into issue text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Method,
    Class,
    Module,
    Interface,
    Trait,
    Type,
    Enum,
    Var,
    Let,
    Const,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Function => "function",
            DefinitionKind::Method => "method",
            DefinitionKind::Class => "class",
            DefinitionKind::Module => "module",
            DefinitionKind::Interface => "interface",
            DefinitionKind::Trait => "trait",
            DefinitionKind::Type => "type",
            DefinitionKind::Enum => "enum",
            DefinitionKind::Var => "var",
            DefinitionKind::Let => "let",
            DefinitionKind::Const => "const",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared top-level name (variable, function, class, type, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    /// 1-based declaration line
    pub line: usize,
    pub kind: DefinitionKind,
    pub exported: bool,
    pub file: String,
}

impl Definition {
    /// Human label used as issue text, e.g. `function foo`.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.name)
    }
}

/// A name bound by an import/require/use statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Bound identifier after alias/destructure resolution
    pub name: String,
    /// Module, path or namespace string
    pub source: String,
    /// 1-based line of the statement start
    pub line: usize,
    /// Last line of the statement (equal to `line` for one-liners)
    pub end_line: usize,
    /// Display label, e.g. `import os` or `use App\Models\User;`
    pub label: String,
    pub file: String,
}

impl Import {
    /// Physical lines occupied by the import statement.
    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.line..=self.end_line.max(self.line)
    }
}

/// A region of source text. Lines are 1-based, columns are 0-based byte
/// offsets within the line, `end_col` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// The whole of one line.
    pub fn whole_line(line: usize) -> Self {
        Self::new(line, 0, line, usize::MAX)
    }
}

/// A function parameter, attached to its signature line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// 1-based line of the enclosing function signature
    pub line: usize,
    /// The parameter list the name was declared in
    pub span: Span,
    pub file: String,
}

impl Parameter {
    pub fn label(&self) -> String {
        format!("parameter {}", self.name)
    }
}

/// Everything an extractor found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub imports: Vec<Import>,
    pub definitions: Vec<Definition>,
    pub parameters: Vec<Parameter>,
}

impl SymbolTable {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.definitions.is_empty() && self.parameters.is_empty()
    }

    /// True if any import in this table binds exactly `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.name == name)
    }

    /// Lines on which this file itself declares `name`.
    pub fn declaration_lines(&self, name: &str) -> Vec<usize> {
        self.definitions
            .iter()
            .filter(|d| d.name == name)
            .map(|d| d.line)
            .chain(
                self.parameters
                    .iter()
                    .filter(|p| p.name == name)
                    .map(|p| p.line),
            )
            .collect()
    }
}

/// One reported finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeIssue {
    /// Opaque unique token, regenerated per analysis call
    pub id: String,
    pub line: usize,
    pub text: String,
    pub file: String,
}

impl CodeIssue {
    pub fn new(line: usize, text: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: new_issue_id(),
            line,
            text: text.into(),
            file: file.into(),
        }
    }

    /// The identity-free part of an issue, for comparisons across runs.
    pub fn key(&self) -> (usize, &str, &str) {
        (self.line, self.text.as_str(), self.file.as_str())
    }
}

fn new_issue_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// The three unused-symbol categories for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub imports: Vec<CodeIssue>,
    pub variables: Vec<CodeIssue>,
    pub parameters: Vec<CodeIssue>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.variables.is_empty() && self.parameters.is_empty()
    }

    pub fn total(&self) -> usize {
        self.imports.len() + self.variables.len() + self.parameters.len()
    }

    /// Copy of this result where every issue carries a new id.
    pub fn with_fresh_ids(&self) -> Self {
        let refresh = |issues: &[CodeIssue]| {
            issues
                .iter()
                .map(|i| CodeIssue {
                    id: new_issue_id(),
                    ..i.clone()
                })
                .collect()
        };
        Self {
            imports: refresh(&self.imports),
            variables: refresh(&self.variables),
            parameters: refresh(&self.parameters),
        }
    }

    /// All issues in category order.
    pub fn issues(&self) -> impl Iterator<Item = &CodeIssue> {
        self.imports
            .iter()
            .chain(self.variables.iter())
            .chain(self.parameters.iter())
    }
}

/// A file submitted for analysis. Content is always supplied in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub content: String,
    pub filename: String,
    /// Caller-provided fingerprint; computed from content when empty.
    #[serde(default)]
    pub content_fingerprint: String,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            content_fingerprint: String::new(),
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.content_fingerprint = fingerprint.into();
        self
    }
}

/// Per-file results of one workspace analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceResult {
    pub results: BTreeMap<String, AnalysisResult>,
}

impl WorkspaceResult {
    pub fn get(&self, filename: &str) -> Option<&AnalysisResult> {
        self.results.get(filename)
    }

    pub fn with_fresh_ids(&self) -> Self {
        Self {
            results: self
                .results
                .iter()
                .map(|(k, v)| (k.clone(), v.with_fresh_ids()))
                .collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.results.values().map(AnalysisResult::total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_label() {
        let def = Definition {
            name: "foo".into(),
            line: 3,
            kind: DefinitionKind::Function,
            exported: false,
            file: "a.js".into(),
        };
        assert_eq!(def.label(), "function foo");
    }

    #[test]
    fn test_issue_ids_unique() {
        let a = CodeIssue::new(1, "import os", "a.py");
        let b = CodeIssue::new(1, "import os", "a.py");
        assert_ne!(a.id, b.id);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn test_fresh_ids_keep_fields() {
        let result = AnalysisResult {
            imports: vec![CodeIssue::new(1, "import os", "a.py")],
            variables: vec![],
            parameters: vec![CodeIssue::new(4, "parameter b", "a.py")],
        };
        let fresh = result.with_fresh_ids();
        assert_eq!(fresh.total(), 2);
        assert_ne!(fresh.imports[0].id, result.imports[0].id);
        assert_eq!(fresh.imports[0].key(), result.imports[0].key());
    }

    #[test]
    fn test_source_file_json_shape() {
        let file: SourceFile = serde_json::from_str(
            r#"{"content":"x = 1","filename":"a.py","contentFingerprint":"abc"}"#,
        )
        .unwrap();
        assert_eq!(file.content_fingerprint, "abc");

        let missing: SourceFile =
            serde_json::from_str(r#"{"content":"","filename":"b.py"}"#).unwrap();
        assert!(missing.content_fingerprint.is_empty());
    }

    #[test]
    fn test_import_span_defaults_to_single_line() {
        let import = Import {
            name: "x".into(),
            source: "m".into(),
            line: 5,
            end_line: 0,
            label: "import x".into(),
            file: "a.ts".into(),
        };
        assert_eq!(import.span(), 5..=5);
    }
}
