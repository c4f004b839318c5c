//! Ruby extraction over the token stream.
//!
//! Block structure is tracked with a stack of openers (`class`, `module`,
//! `def`, `do`, statement-leading `if`/`unless`/`while`/`until`, `begin`,
//! `case`) closed by `end`, which is enough to tell top-level code from
//! method bodies.

use super::{is_discard_name, Extractor, SymbolTableBuilder};
use crate::error::DeadsymResult;
use crate::lexer::ruby::{RubyLexer, RubyToken, RubyTokenKind};
use crate::model::{DefinitionKind, Import, Span, SymbolTable};
use crate::usage::{CommentStyle, StrippedSource};

/// Extractor for `.rb` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyExtractor;

impl Extractor for RubyExtractor {
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable> {
        Ok(RubyScanner::new(filename, source).run())
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::Ruby
    }

    /// A required library is usually referenced through the constant it
    /// defines: `require 'json'` -> `JSON`, `require 'active_support/core_ext'`
    /// -> `ActiveSupport::...`, `require 'httparty'` -> `HTTParty`.
    fn import_used_by_heuristic(&self, text: &StrippedSource, import: &Import) -> bool {
        let span = import.span();
        let in_statement = |l: usize| span.contains(&l);

        let path = import.source.trim_end_matches(".rb");
        let mut segments = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..");
        let first = segments.next().unwrap_or(path);
        let last = import.name.as_str();

        let candidates = [camel_case(last), last.to_uppercase(), camel_case(first)];
        if candidates
            .iter()
            .any(|c| !c.is_empty() && text.find_where(c, in_statement))
        {
            return true;
        }

        let squashed = last.replace(['_', '-'], "").to_lowercase();
        (1..=text.line_count())
            .filter(|l| !in_statement(*l))
            .filter_map(|l| text.line(l))
            .flat_map(|line| line.split(|c: char| !(c.is_alphanumeric() || c == '_')))
            .any(|word| !word.is_empty() && word.to_lowercase() == squashed)
    }
}

/// `core_ext` -> `CoreExt`, `net-http` -> `NetHttp`.
fn camel_case(s: &str) -> String {
    s.split(['_', '-'])
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut chars = p.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect()
}

const IMPORT_METHODS: &[&str] = &["require", "require_relative", "load"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Class,
    Module,
    Def,
    Do,
    Flow,
}

struct RubyScanner<'a> {
    toks: Vec<RubyToken>,
    b: SymbolTableBuilder<'a>,
    stack: Vec<Block>,
    /// Stack depth at which a bare `private` was seen
    private_from: Option<usize>,
    private_next: bool,
}

impl<'a> RubyScanner<'a> {
    fn new(filename: &'a str, source: &str) -> Self {
        Self {
            toks: RubyLexer::new(source).collect(),
            b: SymbolTableBuilder::new(filename),
            stack: Vec::new(),
            private_from: None,
            private_next: false,
        }
    }

    fn kind(&self, i: usize) -> RubyTokenKind {
        self.toks.get(i).map_or(RubyTokenKind::Eof, |t| t.kind)
    }

    fn text(&self, i: usize) -> &str {
        self.toks.get(i).map_or("", |t| t.text.as_str())
    }

    fn line(&self, i: usize) -> usize {
        self.toks.get(i).or(self.toks.last()).map_or(1, |t| t.line)
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.kind(i) == RubyTokenKind::Punct && self.text(i) == p
    }

    fn is_keyword(&self, i: usize, kw: &str) -> bool {
        self.kind(i) == RubyTokenKind::Keyword && self.text(i) == kw
    }

    fn ends_line(&self, i: usize) -> bool {
        matches!(self.kind(i), RubyTokenKind::Newline | RubyTokenKind::Eof) || self.is_punct(i, ";")
    }

    fn statement_start(&self, i: usize) -> bool {
        i == 0 || self.ends_line(i - 1)
    }

    /// `x = ...` but not `==`, `=~` or `=>`.
    fn assigns(&self, i: usize) -> bool {
        self.is_punct(i + 1, "=")
            && !self.is_punct(i + 2, "=")
            && !self.is_punct(i + 2, "~")
            && !self.is_punct(i + 2, ">")
    }

    fn inside(&self, blocks: &[Block]) -> bool {
        self.stack.iter().any(|b| blocks.contains(b))
    }

    fn run(mut self) -> SymbolTable {
        let mut i = 0;
        while i < self.toks.len() {
            let start = self.statement_start(i);
            let next = match (self.kind(i), self.text(i)) {
                (RubyTokenKind::Keyword, "def") => self.def(i),
                (RubyTokenKind::Keyword, "class") => self.namespace(i, Block::Class),
                (RubyTokenKind::Keyword, "module") => self.namespace(i, Block::Module),
                (RubyTokenKind::Keyword, "do" | "begin" | "case" | "for") => {
                    let block = if self.text(i) == "do" {
                        Block::Do
                    } else {
                        Block::Flow
                    };
                    self.stack.push(block);
                    i + 1
                }
                (RubyTokenKind::Keyword, "if" | "unless" | "while" | "until")
                    if start
                        || self.is_punct(i.wrapping_sub(1), "=")
                        || self.is_punct(i.wrapping_sub(1), "(") =>
                {
                    self.stack.push(Block::Flow);
                    i + 1
                }
                (RubyTokenKind::Keyword, "end") => {
                    self.stack.pop();
                    if self.private_from.is_some_and(|d| self.stack.len() < d) {
                        self.private_from = None;
                    }
                    i + 1
                }
                (RubyTokenKind::Ident, word)
                    if IMPORT_METHODS.contains(&word) && !self.is_punct(i.wrapping_sub(1), ".") =>
                {
                    self.import(i)
                }
                (RubyTokenKind::Ident, "private" | "protected") if start => {
                    if self.ends_line(i + 1) {
                        self.private_from = Some(self.stack.len());
                    } else if self.is_keyword(i + 1, "def") {
                        self.private_next = true;
                    }
                    i + 1
                }
                (RubyTokenKind::Constant, name)
                    if start && self.assigns(i) && !self.inside(&[Block::Def]) =>
                {
                    let (name, line) = (name.to_string(), self.line(i));
                    self.b.define(&name, line, DefinitionKind::Const, true);
                    i + 2
                }
                (RubyTokenKind::Ident, name)
                    if start
                        && self.assigns(i)
                        && !self.inside(&[Block::Def, Block::Do, Block::Class, Block::Module]) =>
                {
                    let (name, line) = (name.to_string(), self.line(i));
                    self.b.define(&name, line, DefinitionKind::Var, false);
                    i + 2
                }
                _ => i + 1,
            };
            i = next.max(i + 1);
        }
        self.b.finish()
    }

    fn import(&mut self, i: usize) -> usize {
        let method = self.text(i).to_string();
        let arg = if self.is_punct(i + 1, "(") { i + 2 } else { i + 1 };
        if self.kind(arg) != RubyTokenKind::Str || self.line(arg) != self.line(i) {
            return i + 1;
        }
        let source = self.text(arg).to_string();
        let file = source.rsplit('/').next().unwrap_or(&source);
        let name = file.split('.').next().unwrap_or(file);
        if !name.is_empty() {
            let label = format!("{method} '{source}'");
            let line = self.line(i);
            self.b.import(name, &source, line, line, label);
        }
        arg + 1
    }

    /// `class Foo::Bar < Base` / `module Foo` / `class << self`
    fn namespace(&mut self, i: usize, block: Block) -> usize {
        self.stack.push(block);
        let mut k = i + 1;
        while self.kind(k) == RubyTokenKind::Constant && self.is_punct(k + 1, "::") {
            k += 2;
        }
        if self.kind(k) == RubyTokenKind::Constant && !self.inside(&[Block::Def]) {
            let kind = if block == Block::Class {
                DefinitionKind::Class
            } else {
                DefinitionKind::Module
            };
            let (name, line) = (self.text(k).to_string(), self.line(k));
            self.b.define(&name, line, kind, true);
        }
        k + 1
    }

    fn def(&mut self, i: usize) -> usize {
        let line = self.line(i);
        let mut k = i + 1;

        // def self.name / def obj.name
        if matches!(
            self.kind(k),
            RubyTokenKind::Keyword | RubyTokenKind::Ident | RubyTokenKind::Constant
        ) && self.is_punct(k + 1, ".")
        {
            k += 2;
        }

        let name_tok = k;
        let named = matches!(self.kind(k), RubyTokenKind::Ident | RubyTokenKind::Constant);
        k += 1;
        // operator methods: `def ==(other)`, `def [](i)`
        if !named {
            while self.kind(k) == RubyTokenKind::Punct && !self.is_punct(k, "(") {
                k += 1;
            }
        }
        // setter `def name=(v)`
        if named && self.is_punct(k, "=") && self.is_punct(k + 1, "(") {
            k += 1;
        }

        let header_end = if self.is_punct(k, "(") {
            let close = self.matching_paren(k);
            self.parameters(k + 1, close, line, self.span(k, close));
            close + 1
        } else if !self.ends_line(k) && !self.is_punct(k, "=") {
            let mut end = k;
            while !self.ends_line(end) {
                end += 1;
            }
            self.parameters(k, end, line, self.span(k, end - 1));
            end
        } else {
            k
        };

        // endless `def name(args) = expr` has no `end`
        if !self.is_punct(header_end, "=") {
            self.stack.push(Block::Def);
        }

        let private = self.private_next || self.private_from.is_some();
        self.private_next = false;
        if named {
            let name = self.text(name_tok).to_string();
            if name != "initialize" {
                let kind = if self.inside(&[Block::Class, Block::Module]) {
                    DefinitionKind::Method
                } else {
                    DefinitionKind::Function
                };
                self.b.define(&name, line, kind, !private);
            }
        }
        header_end
    }

    fn matching_paren(&self, open: usize) -> usize {
        let mut depth = 0usize;
        for j in open..self.toks.len() {
            if self.is_punct(j, "(") {
                depth += 1;
            } else if self.is_punct(j, ")") {
                depth -= 1;
                if depth == 0 {
                    return j;
                }
            }
        }
        self.toks.len().saturating_sub(1)
    }

    fn span(&self, from: usize, to: usize) -> Span {
        let last = self.toks.len() - 1;
        let (a, b) = (&self.toks[from.min(last)], &self.toks[to.min(last)]);
        Span::new(a.line, a.col, b.line, b.end_col())
    }

    /// Parameters in `start..end`, split on top-level commas.
    fn parameters(&mut self, start: usize, end: usize, line: usize, span: Span) {
        let mut depth = 0usize;
        let mut segment_start = true;
        for j in start..end.min(self.toks.len()) {
            let tok = &self.toks[j];
            if tok.kind == RubyTokenKind::Punct {
                match tok.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    "," if depth == 0 => {
                        segment_start = true;
                        continue;
                    }
                    _ => {}
                }
            }
            if tok.kind == RubyTokenKind::Newline {
                continue;
            }
            if segment_start {
                segment_start = false;
                // splat `*a`, `**kw` and block `&blk` arguments are skipped
                if tok.kind == RubyTokenKind::Ident && !is_discard_name(&tok.text) {
                    let name = tok.text.clone();
                    self.b.parameter(&name, line, span);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> SymbolTable {
        RubyExtractor.extract("test.rb", src).unwrap()
    }

    fn defs(t: &SymbolTable) -> Vec<(&str, DefinitionKind)> {
        t.definitions
            .iter()
            .map(|d| (d.name.as_str(), d.kind))
            .collect()
    }

    #[test]
    fn test_requires() {
        let t = extract(
            "require 'json'\nrequire_relative '../lib/user_service'\nload 'tasks/setup.rb'\nrequire('net/http')\n",
        );
        let names: Vec<_> = t.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["json", "user_service", "setup", "http"]);
        assert_eq!(t.imports[0].label, "require 'json'");
        assert_eq!(t.imports[1].label, "require_relative '../lib/user_service'");
    }

    #[test]
    fn test_definitions() {
        let t = extract(
            "MAX = 10\ncount = 0\n\nmodule Billing\n  class Invoice < Base\n    RATE = 2\n    def initialize(x)\n      @x = x\n    end\n\n    def self.build\n    end\n\n    def total\n      local = 1\n      local\n    end\n  end\nend\n\ndef helper\nend\n",
        );
        assert_eq!(
            defs(&t),
            vec![
                ("MAX", DefinitionKind::Const),
                ("count", DefinitionKind::Var),
                ("Billing", DefinitionKind::Module),
                ("Invoice", DefinitionKind::Class),
                ("RATE", DefinitionKind::Const),
                ("build", DefinitionKind::Method),
                ("total", DefinitionKind::Method),
                ("helper", DefinitionKind::Function),
            ]
        );
    }

    #[test]
    fn test_comparisons_are_not_assignments() {
        let t = extract("x == 1\ny =~ /a/\n");
        assert!(t.definitions.is_empty());
    }

    #[test]
    fn test_private_methods_not_exported() {
        let t = extract("class A\n  def pub\n  end\n\n  private\n\n  def hidden\n  end\nend\n");
        let public = t.definitions.iter().find(|d| d.name == "pub").unwrap();
        let hidden = t.definitions.iter().find(|d| d.name == "hidden").unwrap();
        assert!(public.exported);
        assert!(!hidden.exported);
    }

    #[test]
    fn test_parameters() {
        let t = extract(
            "def run(a, b = 2, c:, d: 4, *rest, **opts, &blk, _skip)\n  a\nend\n\ndef bare x, y\nend\n",
        );
        let names: Vec<_> = t.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "x", "y"]);
        assert!(t.parameters[..4].iter().all(|p| p.line == 1));
        assert_eq!(t.parameters[4].line, 5);
    }

    #[test]
    fn test_parameter_span() {
        let t = extract("def f(a, b) a end\n");
        assert_eq!(t.parameters[0].span, Span::new(1, 5, 1, 11));
    }

    #[test]
    fn test_operator_def_opens_block() {
        let t = extract("class V\n  def ==(other)\n    x = other\n  end\nend\ny = 1\n");
        assert!(t.parameters.iter().any(|p| p.name == "other"));
        assert!(t.definitions.iter().any(|d| d.name == "y"));
        assert!(t.definitions.iter().all(|d| d.name != "x"));
    }

    #[test]
    fn test_endless_def_does_not_open_block() {
        let t = extract("def double(x) = x * 2\nvalue = 3\n");
        assert!(t.definitions.iter().any(|d| d.name == "value"));
    }

    #[test]
    fn test_heuristic_candidates() {
        let src = "require 'json'\nrequire 'active_support/core_ext'\nrequire 'httparty'\nrequire 'set'\n\nJSON.parse(x)\nActiveSupport::Inflector\nHTTParty.get(u)\n";
        let t = extract(src);
        let text = StrippedSource::new(src, CommentStyle::Ruby);
        let used: Vec<_> = t
            .imports
            .iter()
            .map(|i| RubyExtractor.import_used_by_heuristic(&text, i))
            .collect();
        assert_eq!(used, vec![true, true, true, false]);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("core_ext"), "CoreExt");
        assert_eq!(camel_case("net-http"), "NetHttp");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn test_garbage_input() {
        for src in ["def", "def (", "class", "end end end", "require", "=begin", "x =", "def ==(o)"] {
            let _ = extract(src);
        }
    }
}
