//! Per-file analysis: extraction plus usage resolution into issue lists.
//!
//! The same [`build_result`] runs in single-file and workspace mode; only the
//! [`UsageOracle`] differs. [`LocalUsage`] answers from the file's own text,
//! [`crate::workspace::IndexedUsage`] from the workspace-wide index.

use tracing::warn;

use crate::extract::{extractor_for, Extractor};
use crate::language::{detect_language, Language};
use crate::model::{AnalysisResult, CodeIssue, Definition, Import, Parameter, SourceFile, SymbolTable};
use crate::policy::is_framework_export;
use crate::usage::StrippedSource;

/// Decides whether an extracted symbol counts as used.
pub trait UsageOracle {
    fn import_used(&self, import: &Import) -> bool;
    fn definition_used(&self, definition: &Definition) -> bool;
    fn parameter_used(&self, parameter: &Parameter) -> bool;
}

/// Usage evidence from one file's own text.
pub struct LocalUsage<'a> {
    extractor: &'a dyn Extractor,
    source: &'a str,
    text: StrippedSource,
}

impl<'a> LocalUsage<'a> {
    pub fn new(extractor: &'a dyn Extractor, source: &'a str) -> Self {
        let view = extractor.usage_view(source);
        Self {
            extractor,
            source,
            text: StrippedSource::new(&view, extractor.comment_style()),
        }
    }

    /// Comment-free usage view of the file.
    pub fn text(&self) -> &StrippedSource {
        &self.text
    }

    /// Whether the surrounding template references `name`.
    pub fn template_mentions(&self, name: &str) -> bool {
        self.extractor.supports_template_usage() && self.extractor.template_usage(self.source, name)
    }
}

impl UsageOracle for LocalUsage<'_> {
    fn import_used(&self, import: &Import) -> bool {
        self.text.is_used_outside(&import.name, &import.span())
            || self.extractor.import_used_by_heuristic(&self.text, import)
            || self.template_mentions(&import.name)
    }

    fn definition_used(&self, definition: &Definition) -> bool {
        self.text.is_used(&definition.name, definition.line) || self.template_mentions(&definition.name)
    }

    fn parameter_used(&self, parameter: &Parameter) -> bool {
        self.text.is_used_outside_span(&parameter.name, &parameter.span)
    }
}

/// Run the language's extractor. A failure is logged and yields an empty
/// table so that one broken file never aborts a batch.
pub fn extract_symbols(filename: &str, language: Language, source: &str) -> SymbolTable {
    let Some(extractor) = extractor_for(language) else {
        return SymbolTable::default();
    };
    match extractor.extract(filename, source) {
        Ok(table) => table,
        Err(e) => {
            warn!(file = filename, error = %e, "extraction failed, reporting no findings");
            SymbolTable::default()
        }
    }
}

/// Turn a symbol table into the three unused-issue lists.
pub fn build_result(
    filename: &str,
    language: Language,
    table: &SymbolTable,
    usage: &dyn UsageOracle,
) -> AnalysisResult {
    let imports = table
        .imports
        .iter()
        .filter(|i| !usage.import_used(i))
        .map(|i| CodeIssue::new(i.line, i.label.clone(), filename))
        .collect();

    let variables = table
        .definitions
        .iter()
        .filter(|d| !is_framework_export(&d.name, filename, language))
        .filter(|d| !usage.definition_used(d))
        .map(|d| CodeIssue::new(d.line, d.label(), filename))
        .collect();

    let parameters = table
        .parameters
        .iter()
        .filter(|p| !usage.parameter_used(p))
        .map(|p| CodeIssue::new(p.line, p.label(), filename))
        .collect();

    AnalysisResult {
        imports,
        variables,
        parameters,
    }
}

/// Analyze one file in isolation, without any caching.
pub fn analyze_file(file: &SourceFile) -> AnalysisResult {
    let language = detect_language(&file.filename);
    let Some(extractor) = extractor_for(language) else {
        return AnalysisResult::default();
    };
    let table = extract_symbols(&file.filename, language, &file.content);
    analyze_table(&file.filename, language, extractor, &file.content, &table)
}

/// Single-file issue construction over an already extracted table.
pub(crate) fn analyze_table(
    filename: &str,
    language: Language,
    extractor: &dyn Extractor,
    source: &str,
    table: &SymbolTable,
) -> AnalysisResult {
    let usage = LocalUsage::new(extractor, source);
    build_result(filename, language, table, &usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(filename: &str, content: &str) -> AnalysisResult {
        analyze_file(&SourceFile::new(filename, content))
    }

    fn texts(issues: &[CodeIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn test_python_unused_import() {
        let r = analyze("main.py", "import os\nimport sys\nprint(sys.argv)\n");
        assert_eq!(texts(&r.imports), vec!["import os"]);
        assert_eq!(r.imports[0].line, 1);
        assert_eq!(r.imports[0].file, "main.py");
    }

    #[test]
    fn test_unused_parameter_same_line_body() {
        let r = analyze("f.py", "def f(a, b): return a\n\nf(1, 2)\n");
        assert_eq!(texts(&r.parameters), vec!["parameter b"]);
        assert_eq!(r.parameters[0].line, 1);
        assert!(r.variables.is_empty());
    }

    #[test]
    fn test_typescript_definitions_and_exemption() {
        let r = analyze(
            "app/api/users/route.ts",
            "export async function GET() { return 1; }\nconst unused = 2;\nexport const helper = 3;\n",
        );
        assert_eq!(texts(&r.variables), vec!["const unused", "const helper"]);
    }

    #[test]
    fn test_multiline_import_statement_is_excluded() {
        let src = "import {\n  a,\n  b,\n} from './x';\nconsole.log(a);\n";
        let r = analyze("m.ts", src);
        assert_eq!(r.imports.len(), 1);
        assert_eq!(r.imports[0].line, 1);
        assert!(r.imports[0].text.contains('b'));
    }

    #[test]
    fn test_vue_template_usage_counts() {
        let src = "<template>\n  <Card :title=\"title\" />\n</template>\n<script setup>\nimport Card from './Card.vue'\nimport Unused from './Unused.vue'\nconst title = 'x'\n</script>\n";
        let r = analyze("Page.vue", src);
        assert_eq!(texts(&r.imports), vec!["import Unused"]);
        assert!(r.variables.is_empty());
    }

    #[test]
    fn test_ruby_require_heuristic() {
        let r = analyze("app.rb", "require 'json'\nrequire 'set'\nputs JSON.dump({})\n");
        assert_eq!(texts(&r.imports), vec!["require 'set'"]);
    }

    #[test]
    fn test_php_use_statement() {
        let src = "<?php\nuse App\\Models\\User;\nuse App\\Models\\Post;\n\nfunction show(): User { return new User(); }\nshow();\n";
        let r = analyze("index.php", src);
        assert_eq!(texts(&r.imports), vec!["use App\\Models\\Post;"]);
    }

    #[test]
    fn test_go_unused_import_and_param() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\nfunc greet(name string, loud bool) {\n\tfmt.Println(name)\n}\n\nfunc main() {\n\tgreet(\"x\", true)\n}\n";
        let r = analyze("main.go", src);
        assert_eq!(texts(&r.imports), vec!["import os"]);
        assert_eq!(texts(&r.parameters), vec!["parameter loud"]);
        assert_eq!(r.parameters[0].line, 8);
    }

    #[test]
    fn test_unknown_language_is_empty() {
        assert!(analyze("README.md", "import os\n").is_empty());
    }

    #[test]
    fn test_parse_failure_is_empty() {
        assert!(analyze("broken.py", "def f(:\n  import os\n").is_empty());
        assert!(analyze("broken.go", "package a\nfunc (").is_empty());
    }

    #[test]
    fn test_extract_symbols_unknown_language() {
        assert!(extract_symbols("a.txt", Language::Unknown, "x").is_empty());
    }
}
