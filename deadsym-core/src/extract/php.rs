//! PHP extraction over the token stream.
//!
//! A first pass assigns every token its scope context (inside a class body,
//! inside a function) from the `{ }` structure and the declaration keyword
//! that opened each brace. The second pass reads declarations with that
//! context: `use` only counts as an import at namespace level, so trait
//! `use` in a class body and closure `use (...)` are never imports.

use super::{is_discard_name, Extractor, SymbolTableBuilder};
use crate::error::DeadsymResult;
use crate::lexer::php::{PhpLexer, PhpToken, PhpTokenKind};
use crate::model::{DefinitionKind, Span, SymbolTable};
use crate::usage::CommentStyle;

/// Extractor for `.php` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpExtractor;

impl Extractor for PhpExtractor {
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable> {
        Ok(PhpScanner::new(filename, source).run())
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::Php
    }
}

const VISIBILITY: &[&str] = &["public", "private", "protected", "readonly"];
const METHOD_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "static", "abstract", "final", "readonly",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Namespace,
    Class,
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_function: bool,
    /// Directly in a class-like body (not inside one of its methods)
    in_class: bool,
}

impl Context {
    fn namespace_level(&self) -> bool {
        !self.in_function && !self.in_class
    }
}

fn after_member_access(toks: &[PhpToken], i: usize) -> bool {
    i > 0 && ["::", "->", "?->"].iter().any(|op| toks[i - 1].is_punct(op))
}

/// Scope context in effect at each token.
fn scope_contexts(toks: &[PhpToken]) -> Vec<Context> {
    let mut out = Vec::with_capacity(toks.len());
    let mut scopes: Vec<Scope> = Vec::new();
    let mut pending: Option<Scope> = None;

    for (i, tok) in toks.iter().enumerate() {
        let in_function = scopes.contains(&Scope::Function);
        let in_class =
            !in_function && scopes.iter().rev().find(|s| **s != Scope::Block) == Some(&Scope::Class);
        out.push(Context {
            in_function,
            in_class,
        });

        let next_is_name = toks.get(i + 1).is_some_and(|t| t.kind == PhpTokenKind::Ident);
        match tok.kind {
            PhpTokenKind::Ident if !after_member_access(toks, i) => {
                if tok.is_word("function") {
                    pending = Some(Scope::Function);
                } else if tok.is_word("class")
                    || (next_is_name
                        && (tok.is_word("interface") || tok.is_word("trait") || tok.is_word("enum")))
                {
                    pending = Some(Scope::Class);
                } else if tok.is_word("namespace") {
                    pending = Some(Scope::Namespace);
                }
            }
            PhpTokenKind::Punct if tok.text == "{" => {
                scopes.push(pending.take().unwrap_or(Scope::Block));
            }
            PhpTokenKind::Punct if tok.text == "}" => {
                scopes.pop();
            }
            PhpTokenKind::Punct if tok.text == ";" => pending = None,
            _ => {}
        }
    }
    out
}

struct PhpScanner<'a> {
    toks: Vec<PhpToken>,
    ctx: Vec<Context>,
    b: SymbolTableBuilder<'a>,
}

impl<'a> PhpScanner<'a> {
    fn new(filename: &'a str, source: &str) -> Self {
        let toks: Vec<PhpToken> = PhpLexer::new(source).collect();
        let ctx = scope_contexts(&toks);
        Self {
            toks,
            ctx,
            b: SymbolTableBuilder::new(filename),
        }
    }

    fn kind(&self, i: usize) -> PhpTokenKind {
        self.toks.get(i).map_or(PhpTokenKind::Eof, |t| t.kind)
    }

    fn text(&self, i: usize) -> &str {
        self.toks.get(i).map_or("", |t| t.text.as_str())
    }

    fn line(&self, i: usize) -> usize {
        self.toks.get(i).or(self.toks.last()).map_or(1, |t| t.line)
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.toks.get(i).is_some_and(|t| t.is_punct(p))
    }

    fn is_word(&self, i: usize, w: &str) -> bool {
        self.toks.get(i).is_some_and(|t| t.is_word(w))
    }

    fn last(&self) -> usize {
        self.toks.len().saturating_sub(1)
    }

    /// Index of the bracket closing the one at `open`, or the last token.
    fn matching(&self, open: usize) -> usize {
        let (o, c) = match self.text(open) {
            "(" => ("(", ")"),
            "[" => ("[", "]"),
            _ => ("{", "}"),
        };
        let mut depth = 0usize;
        for j in open..self.toks.len() {
            if self.is_punct(j, o) {
                depth += 1;
            } else if self.is_punct(j, c) {
                depth -= 1;
                if depth == 0 {
                    return j;
                }
            }
        }
        self.last()
    }

    fn statement_start(&self, i: usize) -> bool {
        if i == 0 {
            return true;
        }
        let prev = i - 1;
        self.is_punct(prev, ";")
            || self.is_punct(prev, "{")
            || self.is_punct(prev, "}")
            // `<?php` opening tag
            || (self.is_word(prev, "php") && prev > 0 && self.is_punct(prev - 1, "?"))
    }

    fn assigns(&self, i: usize) -> bool {
        self.is_punct(i + 1, "=") && !self.is_punct(i + 2, "=") && !self.is_punct(i + 2, ">")
    }

    /// True if a modifier list ending just before `i` contains `word`.
    fn has_modifier_before(&self, i: usize, word: &str) -> bool {
        let mut j = i;
        while j > 0 {
            j -= 1;
            let text = self.text(j).to_ascii_lowercase();
            if self.kind(j) != PhpTokenKind::Ident || !METHOD_MODIFIERS.contains(&text.as_str()) {
                return false;
            }
            if text == word {
                return true;
            }
        }
        false
    }

    fn run(mut self) -> SymbolTable {
        let mut i = 0;
        while i < self.toks.len() {
            let ctx = self.ctx[i];
            let next = match self.kind(i) {
                PhpTokenKind::Ident if !after_member_access(&self.toks, i) => {
                    let word = self.text(i).to_ascii_lowercase();
                    match word.as_str() {
                        "use" if ctx.namespace_level() && !self.is_punct(i + 1, "(") => {
                            self.use_statement(i)
                        }
                        "function" => self.function(i, ctx),
                        "fn" if self.is_punct(i + 1, "(") || self.is_punct(i + 1, "&") => {
                            self.arrow_function(i)
                        }
                        "class" | "interface" | "trait" | "enum"
                            if self.kind(i + 1) == PhpTokenKind::Ident && ctx.namespace_level() =>
                        {
                            let kind = match word.as_str() {
                                "class" => DefinitionKind::Class,
                                "interface" => DefinitionKind::Interface,
                                "trait" => DefinitionKind::Trait,
                                _ => DefinitionKind::Enum,
                            };
                            let (name, line) = (self.text(i + 1).to_string(), self.line(i + 1));
                            self.b.define(&name, line, kind, true);
                            i + 2
                        }
                        "const" if !ctx.in_function => self.constants(i, ctx),
                        _ => i + 1,
                    }
                }
                PhpTokenKind::Variable
                    if ctx.namespace_level()
                        && self.text(i) != "$this"
                        && self.statement_start(i)
                        && self.assigns(i) =>
                {
                    let (name, line) = (self.text(i).to_string(), self.line(i));
                    self.b.define(&name, line, DefinitionKind::Var, false);
                    i + 2
                }
                _ => i + 1,
            };
            i = next.max(i + 1);
        }
        self.b.finish()
    }

    // ------------------------------------------------------------------
    // use statements
    // ------------------------------------------------------------------

    fn use_statement(&mut self, i: usize) -> usize {
        let line = self.line(i);
        let mut k = i + 1;
        let prefix = if self.is_word(k, "function") {
            k += 1;
            "function "
        } else if self.is_word(k, "const") {
            k += 1;
            "const "
        } else {
            ""
        };

        let end = (k..self.toks.len())
            .find(|&j| self.is_punct(j, ";") || self.kind(j) == PhpTokenKind::Eof)
            .unwrap_or_else(|| self.last());
        let end_line = self.line(end);

        loop {
            let (path, next) = self.qualified_name(k, end);
            if self.is_punct(next, "{") {
                // grouped: use App\Models\{User, Post as P};
                let close = self.matching(next).min(end);
                let mut j = next + 1;
                while j < close {
                    let inner_prefix = if self.is_word(j, "function") {
                        j += 1;
                        "function "
                    } else if self.is_word(j, "const") {
                        j += 1;
                        "const "
                    } else {
                        prefix
                    };
                    let (inner, after) = self.qualified_name(j, close);
                    let (alias, after) = self.alias(after);
                    if !inner.is_empty() {
                        let full = format!("{path}{inner}");
                        self.emit_use(inner_prefix, &full, alias.as_deref(), line, end_line);
                    }
                    j = after + 1;
                }
                k = close + 1;
            } else {
                let (alias, after) = self.alias(next);
                if !path.is_empty() {
                    self.emit_use(prefix, &path, alias.as_deref(), line, end_line);
                }
                k = after;
            }
            if self.is_punct(k, ",") && k < end {
                k += 1;
                continue;
            }
            break;
        }
        end + 1
    }

    /// `A\B\C` starting at `k`: (text, index after it).
    fn qualified_name(&self, mut k: usize, end: usize) -> (String, usize) {
        let mut path = String::new();
        let mut want_ident = true;
        while k < end {
            if self.is_punct(k, "\\") {
                want_ident = true;
            } else if want_ident && self.kind(k) == PhpTokenKind::Ident {
                want_ident = false;
            } else {
                break;
            }
            path.push_str(self.text(k));
            k += 1;
        }
        (path, k)
    }

    fn alias(&self, k: usize) -> (Option<String>, usize) {
        if self.is_word(k, "as") && self.kind(k + 1) == PhpTokenKind::Ident {
            (Some(self.text(k + 1).to_string()), k + 2)
        } else {
            (None, k)
        }
    }

    fn emit_use(
        &mut self,
        prefix: &str,
        path: &str,
        alias: Option<&str>,
        line: usize,
        end_line: usize,
    ) {
        let path = path.trim_start_matches('\\');
        let bound = alias.unwrap_or_else(|| path.rsplit('\\').next().unwrap_or(path));
        let label = match alias {
            Some(a) => format!("use {prefix}{path} as {a};"),
            None => format!("use {prefix}{path};"),
        };
        self.b.import(bound, path, line, end_line, label);
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn function(&mut self, i: usize, ctx: Context) -> usize {
        let mut k = i + 1;
        if self.is_punct(k, "&") {
            k += 1;
        }
        let name = (self.kind(k) == PhpTokenKind::Ident).then_some(k);
        if name.is_some() {
            k += 1;
        }
        if !self.is_punct(k, "(") {
            return i + 1;
        }
        let close = self.matching(k);

        if let Some(n) = name {
            let (text, line) = (self.text(n).to_string(), self.line(i));
            if ctx.in_class {
                if !text.starts_with("__") {
                    let exported = !self.has_modifier_before(i, "private");
                    self.b.define(&text, line, DefinitionKind::Method, exported);
                }
            } else if !ctx.in_function {
                self.b.define(&text, line, DefinitionKind::Function, true);
            }
        }

        if self.has_body(close) {
            self.parameters(k, close, self.line(i));
        }
        close + 1
    }

    fn arrow_function(&mut self, i: usize) -> usize {
        let open = if self.is_punct(i + 1, "&") { i + 2 } else { i + 1 };
        if !self.is_punct(open, "(") {
            return i + 1;
        }
        let close = self.matching(open);
        self.parameters(open, close, self.line(i));
        close + 1
    }

    /// A `{` body follows the parameter list, past any return type and
    /// closure `use (...)` clause.
    fn has_body(&self, close: usize) -> bool {
        let mut j = close + 1;
        while j < self.toks.len() && j <= close + 64 {
            if self.is_word(j, "use") && self.is_punct(j + 1, "(") {
                j = self.matching(j + 1) + 1;
                continue;
            }
            match self.kind(j) {
                PhpTokenKind::Eof => return false,
                PhpTokenKind::Punct => match self.text(j) {
                    "{" => return true,
                    ";" | "}" | "=>" => return false,
                    _ => {}
                },
                _ => {}
            }
            j += 1;
        }
        false
    }

    fn constants(&mut self, i: usize, ctx: Context) -> usize {
        let exported = !(ctx.in_class && self.has_modifier_before(i, "private"));
        let mut depth = 0usize;
        let mut j = i + 1;
        while j < self.toks.len() && !self.is_punct(j, ";") {
            let punct = self.kind(j) == PhpTokenKind::Punct;
            if punct && matches!(self.text(j), "(" | "[" | "{") {
                depth += 1;
            } else if punct && matches!(self.text(j), ")" | "]" | "}") {
                depth = depth.saturating_sub(1);
            } else if depth == 0
                && self.kind(j) == PhpTokenKind::Ident
                && self.assigns(j)
            {
                let (name, line) = (self.text(j).to_string(), self.line(j));
                self.b.define(&name, line, DefinitionKind::Const, exported);
            }
            j += 1;
        }
        j
    }

    /// Parameters of the list `open..=close`. Promoted constructor
    /// properties, `$this` and discard names are skipped.
    fn parameters(&mut self, open: usize, close: usize, line: usize) {
        let (first, last) = (&self.toks[open], &self.toks[close.min(self.last())]);
        let span = Span::new(first.line, first.col, last.line, last.end_col());

        let mut names = Vec::new();
        let mut k = open + 1;
        while k < close {
            // one parameter: up to the next top-level comma
            let mut end = k;
            let mut depth = 0usize;
            while end < close {
                match self.text(end) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    "," if depth == 0 => break,
                    _ => {}
                }
                end += 1;
            }

            let mut j = k;
            // attributes: #[Inject]
            while self.is_punct(j, "#") && self.is_punct(j + 1, "[") && j < end {
                j = self.matching(j + 1) + 1;
            }
            let promoted = (j..end).any(|t| {
                self.kind(t) == PhpTokenKind::Ident
                    && VISIBILITY.contains(&self.text(t).to_ascii_lowercase().as_str())
            });
            let variable = (j..end).find(|&t| self.kind(t) == PhpTokenKind::Variable);
            if let (false, Some(v)) = (promoted, variable) {
                let name = self.text(v);
                if name != "$this" && !is_discard_name(name) {
                    names.push(name.to_string());
                }
            }
            k = end + 1;
        }

        for name in names {
            self.b.parameter(&name, line, span);
        }
    }
}
