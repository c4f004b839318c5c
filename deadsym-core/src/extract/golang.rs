//! Go extraction over the tree-sitter syntax tree.
//!
//! Exported means a leading uppercase letter, following the language's own
//! visibility rule.

use std::path::Path;

use tree_sitter::Node;

use super::syntax::{end_line, line, named_children, parse_tree, span, text};
use super::{Extractor, SymbolTableBuilder};
use crate::error::DeadsymResult;
use crate::model::{DefinitionKind, SymbolTable};
use crate::usage::CommentStyle;

/// Extractor for `.go` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoExtractor;

impl Extractor for GoExtractor {
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable> {
        let tree = parse_tree(&tree_sitter_go::LANGUAGE.into(), filename, source)?;
        let root = tree.root_node();

        let mut walker = GoWalker {
            src: source.as_bytes(),
            b: SymbolTableBuilder::new(filename),
            test_file: is_test_file(filename),
        };
        for decl in named_children(root) {
            walker.top_level(decl);
        }
        walker.parameters(root);
        Ok(walker.b.finish())
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::CLike
    }
}

const TEST_PREFIXES: &[&str] = &["Test", "Benchmark", "Example", "Fuzz"];

fn is_test_file(filename: &str) -> bool {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"))
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Package name a path binds by default: last segment, without a `/vN`
/// major-version suffix or a `.vN` gopkg suffix.
fn package_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let last = segments.next().unwrap_or(path);
    let is_major = |s: &str| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit());
    let last = if is_major(last) {
        segments.next().unwrap_or(last)
    } else {
        last
    };
    match last.rsplit_once('.') {
        Some((base, suffix)) if is_major(suffix) => base,
        _ => last,
    }
}

struct GoWalker<'a> {
    src: &'a [u8],
    b: SymbolTableBuilder<'a>,
    test_file: bool,
}

impl<'a> GoWalker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        text(node, self.src)
    }

    fn top_level(&mut self, decl: Node<'_>) {
        match decl.kind() {
            "import_declaration" => self.imports(decl),
            "function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name").map(|n| self.text(n)) {
                    if !self.is_entry_point(name) {
                        self.b.define(name, line(decl), DefinitionKind::Function, is_exported(name));
                    }
                }
            }
            "method_declaration" => {
                if let Some(name) = decl.child_by_field_name("name").map(|n| self.text(n)) {
                    self.b.define(name, line(decl), DefinitionKind::Method, is_exported(name));
                }
            }
            "var_declaration" => self.specs(decl, "var_spec", DefinitionKind::Var),
            "const_declaration" => self.specs(decl, "const_spec", DefinitionKind::Const),
            "type_declaration" => self.specs(decl, "type_spec", DefinitionKind::Type),
            _ => {}
        }
    }

    fn is_entry_point(&self, name: &str) -> bool {
        name == "main"
            || name == "init"
            || (self.test_file && TEST_PREFIXES.iter().any(|p| name.starts_with(p)))
    }

    fn imports(&mut self, decl: Node<'_>) {
        for node in descendants_of_kind(decl, "import_spec") {
            let Some(path) = node.child_by_field_name("path").map(|p| self.text(p)) else {
                continue;
            };
            let path = path.trim_matches(|c| c == '"' || c == '`');
            let bound = match node.child_by_field_name("name") {
                Some(alias) => self.text(alias),
                None => package_name(path),
            };
            if bound == "_" || bound == "." {
                continue;
            }
            self.b
                .import(bound, path, line(node), end_line(node), format!("import {path}"));
        }
    }

    /// Names declared by every `spec_kind` under a `var`/`const`/`type` block.
    fn specs(&mut self, decl: Node<'_>, spec_kind: &str, kind: DefinitionKind) {
        let mut specs = descendants_of_kind(decl, spec_kind);
        if spec_kind == "type_spec" {
            specs.extend(descendants_of_kind(decl, "type_alias"));
        }
        for spec in specs {
            let mut cursor = spec.walk();
            let names: Vec<_> = spec.children_by_field_name("name", &mut cursor).collect();
            for name_node in names {
                let name = self.text(name_node);
                if name != "_" {
                    self.b.define(name, line(name_node), kind, is_exported(name));
                }
            }
        }
    }

    fn parameters(&mut self, node: Node<'_>) {
        if matches!(
            node.kind(),
            "function_declaration" | "method_declaration" | "func_literal"
        ) && node.child_by_field_name("body").is_some()
        {
            if let Some(list) = node.child_by_field_name("parameters") {
                self.parameter_list(list, line(node));
            }
        }
        for child in named_children(node) {
            self.parameters(child);
        }
    }

    fn parameter_list(&mut self, list: Node<'_>, signature_line: usize) {
        let list_span = span(list);
        for decl in named_children(list) {
            if !matches!(
                decl.kind(),
                "parameter_declaration" | "variadic_parameter_declaration"
            ) {
                continue;
            }
            let mut cursor = decl.walk();
            let names: Vec<_> = decl.children_by_field_name("name", &mut cursor).collect();
            for name_node in names {
                let name = self.text(name_node);
                if name != "_" {
                    self.b.parameter(name, signature_line, list_span);
                }
            }
        }
    }
}

/// Every descendant of `node` (itself included) with the given kind,
/// not descending into matches.
fn descendants_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    if node.kind() == kind {
        return vec![node];
    }
    named_children(node)
        .into_iter()
        .flat_map(|child| descendants_of_kind(child, kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(filename: &str, src: &str) -> SymbolTable {
        GoExtractor.extract(filename, src).unwrap()
    }

    #[test]
    fn test_imports() {
        let t = extract(
            "main.go",
            "package main\n\nimport (\n\t\"fmt\"\n\tstr \"strings\"\n\t_ \"embed\"\n\t. \"math\"\n\t\"github.com/acme/lib/v2\"\n\t\"gopkg.in/yaml.v3\"\n)\n",
        );
        let names: Vec<_> = t.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["fmt", "str", "lib", "yaml"]);
        assert_eq!(t.imports[0].label, "import fmt");
        assert_eq!(t.imports[0].line, 4);
        assert_eq!(t.imports[1].source, "strings");
    }

    #[test]
    fn test_single_import() {
        let t = extract("a.go", "package a\nimport \"os\"\n");
        assert_eq!(t.imports[0].name, "os");
        assert_eq!(t.imports[0].line, 2);
    }

    #[test]
    fn test_definitions() {
        let t = extract(
            "a.go",
            "package a\n\nvar x, Y = 1, 2\nconst (\n\tA = 1\n\tb = 2\n)\ntype T struct{}\nfunc helper() {}\nfunc (t T) Run() {}\nfunc main() {}\nfunc init() {}\n",
        );
        let defs: Vec<_> = t
            .definitions
            .iter()
            .map(|d| (d.name.as_str(), d.kind, d.exported))
            .collect();
        assert_eq!(
            defs,
            vec![
                ("x", DefinitionKind::Var, false),
                ("Y", DefinitionKind::Var, true),
                ("A", DefinitionKind::Const, true),
                ("b", DefinitionKind::Const, false),
                ("T", DefinitionKind::Type, true),
                ("helper", DefinitionKind::Function, false),
                ("Run", DefinitionKind::Method, true),
            ]
        );
    }

    #[test]
    fn test_test_file_entry_points() {
        let src = "package a\nfunc TestX(t *testing.T) {}\nfunc BenchmarkY(b *testing.B) {}\nfunc helper() {}\n";
        let t = extract("a_test.go", src);
        let names: Vec<_> = t.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["helper"]);

        let t = extract("a.go", src);
        assert_eq!(t.definitions.len(), 3);
    }

    #[test]
    fn test_parameters_exclude_receiver_and_blank() {
        let t = extract(
            "a.go",
            "package a\nfunc (s *Server) Handle(w Writer, _ *Request, a, b int, rest ...string) {\n\tfn := func(x int) {}\n\t_ = fn\n}\n",
        );
        let names: Vec<_> = t.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["w", "a", "b", "rest", "x"]);
        assert_eq!(t.parameters[0].line, 2);
        assert_eq!(t.parameters[4].line, 3);
    }

    #[test]
    fn test_underscore_prefixed_parameter_is_reported() {
        let t = extract("a.go", "package a\nfunc f(_x int) {}\n");
        assert_eq!(t.parameters[0].name, "_x");
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("fmt"), "fmt");
        assert_eq!(package_name("net/http"), "http");
        assert_eq!(package_name("github.com/a/b/v3"), "b");
        assert_eq!(package_name("gopkg.in/check.v1"), "check");
    }

    #[test]
    fn test_syntax_error() {
        assert!(GoExtractor.extract("a.go", "package a\nfunc (").is_err());
    }
}
