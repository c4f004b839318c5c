//! Python extraction over the tree-sitter syntax tree.
//!
//! Imports are collected at any depth (function-local imports included).
//! Definitions are module-level only, looking through top-level `if`, `try`
//! and `with` blocks, plus the methods of module-level classes. Parameters
//! come from every `def`; `self`, `cls`, discard names and `*args`/`**kwargs`
//! are skipped, as are the parameters of stub bodies.

use tree_sitter::Node;

use super::syntax::{end_line, line, named_children, parse_tree, span, text};
use super::{is_discard_name, Extractor, SymbolTableBuilder};
use crate::error::DeadsymResult;
use crate::model::{DefinitionKind, SymbolTable};
use crate::usage::CommentStyle;

/// Extractor for `.py` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonExtractor;

impl Extractor for PythonExtractor {
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable> {
        let tree = parse_tree(&tree_sitter_python::LANGUAGE.into(), filename, source)?;
        let root = tree.root_node();

        let mut walker = PyWalker {
            src: source.as_bytes(),
            b: SymbolTableBuilder::new(filename),
        };
        walker.imports(root);
        walker.definitions(root, false);
        walker.parameters(root);
        Ok(walker.b.finish())
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::Hash
    }
}

/// Decorators that mark a signature without a real body.
const SIGNATURE_DECORATORS: &[&str] = &["overload", "abstractmethod"];

fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

struct PyWalker<'a> {
    src: &'a [u8],
    b: SymbolTableBuilder<'a>,
}

impl<'a> PyWalker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        text(node, self.src)
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    fn imports(&mut self, node: Node<'_>) {
        match node.kind() {
            "import_statement" => self.import_statement(node),
            "import_from_statement" => self.from_import(node),
            _ => {
                for child in named_children(node) {
                    self.imports(child);
                }
            }
        }
    }

    fn import_statement(&mut self, node: Node<'_>) {
        let (start, end) = (line(node), end_line(node));
        let mut cursor = node.walk();
        let names: Vec<_> = node.children_by_field_name("name", &mut cursor).collect();

        for name in names {
            match name.kind() {
                "dotted_name" => {
                    let module = self.text(name);
                    let bound = module.split('.').next().unwrap_or(module);
                    if bound != "_" {
                        self.b.import(bound, module, start, end, format!("import {module}"));
                    }
                }
                "aliased_import" => {
                    let (Some(module), Some(alias)) =
                        (self.field_text(name, "name"), self.field_text(name, "alias"))
                    else {
                        continue;
                    };
                    if alias != "_" {
                        let label = format!("import {module} as {alias}");
                        self.b.import(alias, module, start, end, label);
                    }
                }
                _ => {}
            }
        }
    }

    fn from_import(&mut self, node: Node<'_>) {
        let (start, end) = (line(node), end_line(node));
        let module = self.field_text(node, "module_name").unwrap_or("");
        let mut cursor = node.walk();
        let names: Vec<_> = node.children_by_field_name("name", &mut cursor).collect();

        for name in names {
            match name.kind() {
                "dotted_name" => {
                    let imported = self.text(name);
                    if imported != "_" {
                        let label = format!("from {module} import {imported}");
                        self.b.import(imported, module, start, end, label);
                    }
                }
                "aliased_import" => {
                    let (Some(imported), Some(alias)) =
                        (self.field_text(name, "name"), self.field_text(name, "alias"))
                    else {
                        continue;
                    };
                    if alias != "_" {
                        let label = format!("from {module} import {imported} as {alias}");
                        self.b.import(alias, module, start, end, label);
                    }
                }
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Walk the statements of the module (or of a class body when `in_class`).
    fn definitions(&mut self, block: Node<'_>, in_class: bool) {
        for stmt in named_children(block) {
            match stmt.kind() {
                "function_definition" | "class_definition" | "decorated_definition" => {
                    self.definition(stmt, in_class)
                }
                "expression_statement" if !in_class => {
                    for child in named_children(stmt) {
                        if child.kind() == "assignment" {
                            self.assignment(child);
                        }
                    }
                }
                "if_statement" | "try_statement" | "with_statement" if !in_class => {
                    for nested in compound_blocks(stmt) {
                        self.definitions(nested, false);
                    }
                }
                _ => {}
            }
        }
    }

    fn definition(&mut self, node: Node<'_>, in_class: bool) {
        match node.kind() {
            "decorated_definition" => {
                if let Some(inner) = node.child_by_field_name("definition") {
                    self.definition(inner, in_class);
                }
            }
            "function_definition" => {
                let Some(name) = self.field_text(node, "name") else {
                    return;
                };
                if in_class && is_dunder(name) {
                    return;
                }
                let kind = if in_class {
                    DefinitionKind::Method
                } else {
                    DefinitionKind::Function
                };
                self.b.define(name, line(node), kind, !name.starts_with('_'));
            }
            "class_definition" if !in_class => {
                let Some(name) = self.field_text(node, "name") else {
                    return;
                };
                self.b.define(name, line(node), DefinitionKind::Class, !name.starts_with('_'));
                if let Some(body) = node.child_by_field_name("body") {
                    self.definitions(body, true);
                }
            }
            _ => {}
        }
    }

    fn assignment(&mut self, node: Node<'_>) {
        if let Some(left) = node.child_by_field_name("left") {
            for target in assignment_targets(left) {
                let name = self.text(target);
                if !is_dunder(name) && name != "_" {
                    self.b.define(name, line(target), DefinitionKind::Var, !name.starts_with('_'));
                }
            }
        }
        // a = b = 1
        if let Some(right) = node.child_by_field_name("right") {
            if right.kind() == "assignment" {
                self.assignment(right);
            }
        }
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    fn parameters(&mut self, node: Node<'_>) {
        if node.kind() == "function_definition" {
            self.function_parameters(node);
        }
        for child in named_children(node) {
            self.parameters(child);
        }
    }

    fn function_parameters(&mut self, func: Node<'_>) {
        let Some(params) = func.child_by_field_name("parameters") else {
            return;
        };
        if func.child_by_field_name("body").is_some_and(is_stub_body) || self.is_signature_only(func)
        {
            return;
        }

        let signature_line = line(func);
        let list_span = span(params);
        for param in named_children(params) {
            let name_node = match param.kind() {
                "identifier" => Some(param),
                "default_parameter" | "typed_default_parameter" => {
                    param.child_by_field_name("name")
                }
                "typed_parameter" => named_children(param)
                    .into_iter()
                    .next()
                    .filter(|n| n.kind() == "identifier"),
                _ => None,
            };
            let Some(name_node) = name_node else { continue };
            let name = self.text(name_node);
            if name != "self" && name != "cls" && !is_discard_name(name) {
                self.b.parameter(name, signature_line, list_span);
            }
        }
    }

    /// `@overload` / `@abstractmethod` signatures.
    fn is_signature_only(&self, func: Node<'_>) -> bool {
        let Some(parent) = func.parent().filter(|p| p.kind() == "decorated_definition") else {
            return false;
        };
        named_children(parent)
            .into_iter()
            .filter(|n| n.kind() == "decorator")
            .any(|d| {
                let name = self.text(d).trim_start_matches('@').trim();
                let last = name.rsplit('.').next().unwrap_or(name);
                SIGNATURE_DECORATORS.contains(&last)
            })
    }
}

/// Blocks nested directly in a compound statement and its clauses.
fn compound_blocks(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "block" => out.push(child),
            "elif_clause" | "else_clause" | "except_clause" | "except_group_clause"
            | "finally_clause" => out.extend(compound_blocks(child)),
            _ => {}
        }
    }
    out
}

/// Identifiers bound by an assignment target (`a`, `a, b`, `(a, [b, c])`).
fn assignment_targets(node: Node<'_>) -> Vec<Node<'_>> {
    match node.kind() {
        "identifier" => vec![node],
        "pattern_list" | "tuple_pattern" | "list_pattern" | "expression_list" | "tuple"
        | "list" | "parenthesized_expression" => named_children(node)
            .into_iter()
            .flat_map(assignment_targets)
            .collect(),
        _ => Vec::new(),
    }
}

/// A body of only `pass`, `...`, docstrings and `raise`.
fn is_stub_body(body: Node<'_>) -> bool {
    named_children(body).into_iter().all(|stmt| match stmt.kind() {
        "pass_statement" | "raise_statement" | "comment" => true,
        "expression_statement" => named_children(stmt)
            .into_iter()
            .all(|e| matches!(e.kind(), "ellipsis" | "string" | "concatenated_string")),
        _ => false,
    })
}
