//! JavaScript / TypeScript symbol extraction over the token stream.
//!
//! Top-level declarations recognized:
//! - `import` clauses: default, named (with `as` and `type`), namespace,
//!   TS `import x = require(..)`
//! - `const`/`let`/`var` bindings, including destructuring; a `require(..)`
//!   initializer turns the bindings into imports
//! - `function`, `class`, `enum`, `interface`, `type`, `namespace`
//! - export marks from `export`, `export { .. }`, `export default x`,
//!   `module.exports` and `exports.x`
//!
//! Parameters are collected at any depth from function declarations and
//! expressions, arrow functions and class/object methods. Destructured,
//! `this` and discard parameters are skipped, as are TS parameter properties
//! and anything inside a type-only context.

use crate::error::DeadsymResult;
use crate::lexer::javascript::{JsLexer, JsToken, JsTokenKind};
use crate::model::{DefinitionKind, Span, SymbolTable};
use crate::usage::CommentStyle;

use super::{is_discard_name, Extractor, SymbolTableBuilder};

/// Extractor for `.ts/.tsx/.js/.jsx/.mjs/.cjs` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable> {
        Ok(extract_script(filename, source))
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::CLike
    }
}

/// Extract symbols from JavaScript-family source. Never fails.
pub(crate) fn extract_script(filename: &str, source: &str) -> SymbolTable {
    let stream = TokenStream::new(source);
    let mut builder = SymbolTableBuilder::new(filename);
    collect_declarations(&stream, &mut builder);
    collect_parameters(&stream, &mut builder);
    builder.finish()
}

// ============================================================================
// Token stream with bracket matching
// ============================================================================

/// Tokens that end a line but let the expression continue on the next one.
const TRAILING_CONTINUATION: &[&str] = &[
    "=", "+", "-", "*", "/", "%", "&", "|", "^", "!", "?", ":", "<", ">", ",", ".", "(", "[",
    "{", "=>", "...", "~",
];

/// Tokens that, starting a line, continue the previous expression.
const LEADING_CONTINUATION: &[&str] = &[
    ".", "?", "+", "*", "/", "%", "&", "|", "^", "=", "<", ">", ":", ",", ")", "]", "}", "=>",
];

const PARAMETER_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Significant tokens (newlines folded into a flag) plus bracket partners
/// and nesting depths.
struct TokenStream {
    toks: Vec<JsToken>,
    newline_before: Vec<bool>,
    partner: Vec<Option<usize>>,
    brace_depth: Vec<usize>,
    group_depth: Vec<usize>,
    type_context: Vec<bool>,
}

impl TokenStream {
    fn new(source: &str) -> Self {
        let mut toks = Vec::new();
        let mut newline_before = Vec::new();
        let mut pending = false;
        for tok in JsLexer::new(source) {
            if tok.kind == JsTokenKind::Newline {
                pending = true;
                continue;
            }
            newline_before.push(pending);
            pending = false;
            toks.push(tok);
        }

        let n = toks.len();
        let mut partner = vec![None; n];
        let mut brace_depth = Vec::with_capacity(n);
        let mut group_depth = Vec::with_capacity(n);
        let mut stack: Vec<usize> = Vec::new();
        let (mut braces, mut groups) = (0usize, 0usize);

        for (i, tok) in toks.iter().enumerate() {
            brace_depth.push(braces);
            group_depth.push(groups);
            if tok.kind != JsTokenKind::Punct {
                continue;
            }
            match tok.text.as_str() {
                "{" => {
                    stack.push(i);
                    braces += 1;
                }
                "(" | "[" => {
                    stack.push(i);
                    groups += 1;
                }
                close @ ("}" | ")" | "]") => {
                    let open = match close {
                        "}" => "{",
                        ")" => "(",
                        _ => "[",
                    };
                    let Some(pos) = stack.iter().rposition(|&o| toks[o].text == open) else {
                        continue;
                    };
                    // openers left unclosed inside this pair
                    for &o in &stack[pos..] {
                        if toks[o].text == "{" {
                            braces -= 1;
                        } else {
                            groups -= 1;
                        }
                    }
                    let o = stack[pos];
                    stack.truncate(pos);
                    partner[o] = Some(i);
                    partner[i] = Some(o);
                }
                _ => {}
            }
        }

        let mut stream = Self {
            toks,
            newline_before,
            partner,
            brace_depth,
            group_depth,
            type_context: vec![false; n],
        };
        stream.mark_type_contexts();
        stream
    }

    fn len(&self) -> usize {
        self.toks.len()
    }

    fn text(&self, i: usize) -> &str {
        self.toks.get(i).map_or("", |t| t.text.as_str())
    }

    fn kind(&self, i: usize) -> JsTokenKind {
        self.toks.get(i).map_or(JsTokenKind::Eof, |t| t.kind)
    }

    fn line(&self, i: usize) -> usize {
        self.toks.get(i).or(self.toks.last()).map_or(1, |t| t.line)
    }

    fn col(&self, i: usize) -> usize {
        self.toks.get(i).map_or(0, |t| t.col)
    }

    fn end_col(&self, i: usize) -> usize {
        self.toks.get(i).map_or(0, |t| t.end_col())
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.kind(i) == JsTokenKind::Punct && self.text(i) == p
    }

    fn is_punct_before(&self, i: usize, p: &str) -> bool {
        i > 0 && self.is_punct(i - 1, p)
    }

    fn is_ident(&self, i: usize) -> bool {
        self.kind(i) == JsTokenKind::Ident
    }

    fn is_keyword(&self, i: usize, kw: &str) -> bool {
        self.kind(i) == JsTokenKind::Keyword && self.text(i) == kw
    }

    fn is_word(&self, i: usize, w: &str) -> bool {
        matches!(self.kind(i), JsTokenKind::Ident | JsTokenKind::Keyword) && self.text(i) == w
    }

    fn newline_before(&self, i: usize) -> bool {
        self.newline_before.get(i).copied().unwrap_or(true)
    }

    fn top_level(&self, i: usize) -> bool {
        self.brace_depth.get(i) == Some(&0) && self.group_depth.get(i) == Some(&0)
    }

    fn partner(&self, i: usize) -> Option<usize> {
        self.partner.get(i).copied().flatten()
    }

    fn last(&self) -> usize {
        self.len().saturating_sub(1)
    }

    fn close_or_end(&self, open: usize) -> usize {
        self.partner(open).unwrap_or_else(|| self.last())
    }

    /// Skip a `<...>` type-parameter list starting at `i`; returns `i` when
    /// there is none or it is unbalanced.
    fn skip_generics(&self, i: usize) -> usize {
        if !self.is_punct(i, "<") {
            return i;
        }
        let mut depth = 0usize;
        let mut j = i;
        while j < self.len() && j < i + 64 {
            if self.kind(j) == JsTokenKind::Punct {
                match self.text(j) {
                    "<" => depth += 1,
                    ">" => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return j + 1;
                        }
                    }
                    "(" | "[" | "{" => {
                        j = self.partner(j).map_or(j + 1, |c| c + 1);
                        continue;
                    }
                    ";" => return i,
                    _ => {}
                }
            }
            j += 1;
        }
        i
    }

    fn continues_expression(&self, j: usize) -> bool {
        if j == 0 {
            return false;
        }
        let prev = j - 1;
        (self.kind(prev) == JsTokenKind::Punct
            && TRAILING_CONTINUATION.contains(&self.text(prev)))
            || (self.kind(j) == JsTokenKind::Punct
                && LEADING_CONTINUATION.contains(&self.text(j)))
            || matches!(self.text(j), "as" | "satisfies" | "instanceof" | "in")
    }

    /// Advance over an expression (or, with `stop_at_assign`, a type
    /// annotation) to the `,`, `;`, `=`, unmatched closer or statement end.
    fn skip_expression(&self, start: usize, stop_at_assign: bool) -> usize {
        let mut j = start;
        let mut angle = 0usize;
        while j < self.len() {
            if self.kind(j) == JsTokenKind::Eof {
                return j;
            }
            if j > start && self.newline_before(j) && !self.continues_expression(j) {
                return j;
            }
            if self.kind(j) == JsTokenKind::Punct {
                match self.text(j) {
                    "(" | "[" | "{" => match self.partner(j) {
                        Some(c) => {
                            j = c + 1;
                            continue;
                        }
                        None => return self.last(),
                    },
                    ")" | "]" | "}" | ";" => return j,
                    "," if angle == 0 => return j,
                    "=" if stop_at_assign && angle == 0 => return j,
                    "<" if stop_at_assign => angle += 1,
                    ">" if stop_at_assign => angle = angle.saturating_sub(1),
                    _ => {}
                }
            }
            j += 1;
        }
        self.last()
    }

    /// Interface bodies and type alias right-hand sides never hold runtime
    /// parameters.
    fn mark_type_contexts(&mut self) {
        let mut ranges = Vec::new();
        for i in 0..self.len() {
            if !self.is_ident(i) || !self.is_ident(i + 1) {
                continue;
            }
            match self.text(i) {
                "interface" => {
                    let body = (i + 2..(i + 64).min(self.len())).find(|&j| self.is_punct(j, "{"));
                    if let Some(open) = body {
                        ranges.push((i, self.close_or_end(open)));
                    }
                }
                "type" => {
                    let eq = self.skip_generics(i + 2);
                    if self.is_punct(eq, "=") {
                        ranges.push((i, self.skip_expression(eq + 1, false)));
                    }
                }
                _ => {}
            }
        }
        let last = self.last();
        for (start, end) in ranges {
            for flag in &mut self.type_context[start..=end.min(last)] {
                *flag = true;
            }
        }
    }

    /// True when the declaration at `i` is preceded by `export` (through
    /// `default`/`declare`/`abstract`/`async` modifiers).
    fn exported_before(&self, i: usize) -> bool {
        let mut j = i;
        while j > 0 {
            j -= 1;
            match self.text(j) {
                "default" | "declare" | "abstract" | "async" => continue,
                "export" => return self.kind(j) == JsTokenKind::Keyword,
                _ => return false,
            }
        }
        false
    }

    /// Index of the next `,` at this nesting level, or `close`.
    fn skip_entry(&self, k: usize, close: usize) -> usize {
        let mut j = k;
        while j < close {
            if self.is_punct(j, ",") {
                return j;
            }
            if self.kind(j) == JsTokenKind::Punct && matches!(self.text(j), "(" | "[" | "{") {
                j = self.partner(j).map_or(close, |c| c + 1);
                continue;
            }
            j += 1;
        }
        close
    }

    /// Comma-separated segments strictly inside `open..close`.
    fn segments(&self, open: usize, close: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut start = open + 1;
        let mut angle = 0usize;
        let mut j = open + 1;
        while j < close {
            if self.kind(j) == JsTokenKind::Punct {
                match self.text(j) {
                    "(" | "[" | "{" => {
                        j = self.partner(j).map_or(close, |c| (c + 1).min(close));
                        continue;
                    }
                    "<" => angle += 1,
                    ">" => angle = angle.saturating_sub(1),
                    "," if angle == 0 => {
                        out.push((start, j));
                        start = j + 1;
                    }
                    _ => {}
                }
            }
            j += 1;
        }
        if start < close {
            out.push((start, close));
        }
        out
    }
}

// ============================================================================
// Declarations
// ============================================================================

fn collect_declarations(s: &TokenStream, b: &mut SymbolTableBuilder) {
    let mut exports: Vec<String> = Vec::new();
    let mut i = 0;

    while i < s.len() {
        let next = match (s.kind(i), s.text(i)) {
            (JsTokenKind::Keyword, "import")
                if !s.is_punct(i + 1, "(") && !s.is_punct(i + 1, ".") =>
            {
                parse_import(s, i, b)
            }
            (JsTokenKind::Keyword, "export") => parse_export(s, i, &mut exports),
            (JsTokenKind::Keyword, "const" | "let" | "var") if s.top_level(i) => {
                parse_variable(s, i, b)
            }
            (JsTokenKind::Keyword, "function") if s.top_level(i) => {
                let k = if s.is_punct(i + 1, "*") { i + 2 } else { i + 1 };
                if s.is_ident(k) {
                    b.define(s.text(k), s.line(k), DefinitionKind::Function, s.exported_before(i));
                }
                k
            }
            (JsTokenKind::Keyword, "class") if s.top_level(i) => {
                define_named(s, i, b, DefinitionKind::Class)
            }
            (JsTokenKind::Keyword, "enum") if s.top_level(i) => {
                define_named(s, i, b, DefinitionKind::Enum)
            }
            (JsTokenKind::Ident, "interface")
                if s.top_level(i) && s.is_ident(i + 1) && !s.newline_before(i + 1) =>
            {
                define_named(s, i, b, DefinitionKind::Interface)
            }
            (JsTokenKind::Ident, "type")
                if s.top_level(i)
                    && s.is_ident(i + 1)
                    && s.is_punct(s.skip_generics(i + 2), "=") =>
            {
                define_named(s, i, b, DefinitionKind::Type)
            }
            (JsTokenKind::Ident, "namespace" | "module")
                if s.top_level(i) && s.is_ident(i + 1) && s.is_punct(i + 2, "{") =>
            {
                define_named(s, i, b, DefinitionKind::Module)
            }
            (JsTokenKind::Ident, "module")
                if s.is_punct(i + 1, ".")
                    && s.is_word(i + 2, "exports")
                    && !s.is_punct_before(i, ".") =>
            {
                parse_module_exports(s, i + 3, &mut exports)
            }
            (JsTokenKind::Ident, "exports")
                if s.is_punct(i + 1, ".")
                    && s.is_ident(i + 2)
                    && s.is_punct(i + 3, "=")
                    && !s.is_punct_before(i, ".") =>
            {
                exports.push(s.text(i + 2).to_string());
                if s.is_ident(i + 4) {
                    exports.push(s.text(i + 4).to_string());
                }
                i + 4
            }
            _ => i + 1,
        };
        i = next.max(i + 1);
    }

    for name in &exports {
        b.mark_exported(name);
    }
}

fn define_named(
    s: &TokenStream,
    i: usize,
    b: &mut SymbolTableBuilder,
    kind: DefinitionKind,
) -> usize {
    if s.is_ident(i + 1) {
        b.define(s.text(i + 1), s.line(i + 1), kind, s.exported_before(i));
    }
    i + 2
}

/// `{ a, b as c, type D }` as (first name, bound name) pairs.
fn named_bindings(s: &TokenStream, open: usize, close: usize) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (start, end) in s.segments(open, close) {
        let mut entry: Vec<usize> = (start..end).collect();
        if entry.len() >= 2 && s.text(entry[0]) == "type" && s.text(entry[1]) != "as" {
            entry.remove(0);
        }
        match entry.as_slice() {
            [name] if s.is_ident(*name) => {
                out.push((s.text(*name).to_string(), s.text(*name).to_string()));
            }
            [first, as_kw, local] if s.text(*as_kw) == "as" && s.is_ident(*local) => {
                out.push((s.text(*first).to_string(), s.text(*local).to_string()));
            }
            _ => {}
        }
    }
    out
}

fn parse_import(s: &TokenStream, i: usize, b: &mut SymbolTableBuilder) -> usize {
    let line = s.line(i);
    let mut j = i + 1;

    // `import type X from` / `import type { X }`
    if s.is_word(j, "type") && !s.is_word(j + 1, "from") && !s.is_punct(j + 1, ",") {
        j += 1;
    }

    // side-effect import
    if s.kind(j) == JsTokenKind::Str {
        return j + 1;
    }

    let mut bindings: Vec<(String, String)> = Vec::new();

    if s.is_ident(j) {
        let name = s.text(j).to_string();

        // TS `import x = require('m')` / `import x = Ns.Member`
        if s.is_punct(j + 1, "=") {
            let (source, end) = require_call(s, j + 2).unwrap_or_default();
            let end = if end == 0 { j + 1 } else { end };
            b.import(&name, &source, line, s.line(end), format!("import {name}"));
            return end + 1;
        }

        bindings.push((name.clone(), format!("import {name}")));
        j += 1;
        if s.is_punct(j, ",") {
            j += 1;
        }
    }

    if s.is_punct(j, "*") && s.is_word(j + 1, "as") && s.is_ident(j + 2) {
        let name = s.text(j + 2).to_string();
        bindings.push((name.clone(), format!("import * as {name}")));
        j += 3;
    }

    if s.is_punct(j, "{") {
        let close = s.close_or_end(j);
        for (imported, local) in named_bindings(s, j, close) {
            let label = if imported == local {
                format!("import {{ {local} }}")
            } else {
                format!("import {{ {imported} as {local} }}")
            };
            bindings.push((local, label));
        }
        j = close + 1;
    }

    let mut source = String::new();
    let mut end = j.saturating_sub(1);
    if s.is_word(j, "from") && s.kind(j + 1) == JsTokenKind::Str {
        source = s.text(j + 1).to_string();
        end = j + 1;
        j += 2;
    }

    for (name, label) in bindings {
        b.import(&name, &source, line, s.line(end), label);
    }
    j
}

fn parse_export(s: &TokenStream, i: usize, exports: &mut Vec<String>) -> usize {
    // `export { a, b as c }` (but not re-exports `export { a } from './x'`)
    if s.is_punct(i + 1, "{") {
        let close = s.close_or_end(i + 1);
        if !s.is_word(close + 1, "from") {
            exports.extend(named_bindings(s, i + 1, close).into_iter().map(|(local, _)| local));
        }
        return close + 1;
    }

    // `export default name` / `export = name`
    let target = if s.is_keyword(i + 1, "default") || s.is_punct(i + 1, "=") {
        i + 2
    } else {
        return i + 1;
    };
    let ends_statement = s.is_punct(target + 1, ";")
        || s.newline_before(target + 1)
        || s.kind(target + 1) == JsTokenKind::Eof;
    if s.is_ident(target) && ends_statement {
        exports.push(s.text(target).to_string());
        return target + 1;
    }
    i + 1
}

/// `module.exports = X`, `module.exports = { a, b: c }`, `module.exports.x =`
fn parse_module_exports(s: &TokenStream, k: usize, exports: &mut Vec<String>) -> usize {
    if s.is_punct(k, ".") && s.is_ident(k + 1) {
        exports.push(s.text(k + 1).to_string());
        return k + 2;
    }
    if !s.is_punct(k, "=") {
        return k;
    }
    if s.is_ident(k + 1) && !s.is_punct(k + 2, "(") {
        exports.push(s.text(k + 1).to_string());
        return k + 2;
    }
    if s.is_punct(k + 1, "{") {
        let open = k + 1;
        let close = s.close_or_end(open);
        let inner_depth = s.brace_depth.get(open).map_or(1, |d| d + 1);
        for j in open + 1..close {
            let direct = s.brace_depth.get(j) == Some(&inner_depth);
            let shorthand = s.is_punct(j + 1, ",") || s.is_punct(j + 1, "}");
            let value = s.is_punct_before(j, ":") && !s.is_punct(j + 1, "(");
            if direct && s.is_ident(j) && (shorthand || value) {
                exports.push(s.text(j).to_string());
            }
        }
        return close + 1;
    }
    k + 1
}

/// `require('m')` (optionally awaited) starting at `k`: (source, index of `)`).
fn require_call(s: &TokenStream, k: usize) -> Option<(String, usize)> {
    let k = if s.is_word(k, "await") { k + 1 } else { k };
    let is_string = matches!(s.kind(k + 2), JsTokenKind::Str | JsTokenKind::Template);
    if s.is_word(k, "require") && s.is_punct(k + 1, "(") && is_string && s.is_punct(k + 3, ")") {
        Some((s.text(k + 2).to_string(), k + 3))
    } else {
        None
    }
}

fn is_function_initializer(s: &TokenStream, k: usize) -> bool {
    let k = if s.is_word(k, "async") && !s.is_punct(k + 1, "=") {
        k + 1
    } else {
        k
    };
    if s.is_keyword(k, "function") {
        return true;
    }
    if s.is_ident(k) && s.is_punct(k + 1, "=>") {
        return true;
    }
    let k = s.skip_generics(k);
    if !s.is_punct(k, "(") {
        return false;
    }
    let Some(close) = s.partner(k) else {
        return false;
    };
    if s.is_punct(close + 1, "=>") {
        return true;
    }
    // `(a): Ret => ...`
    s.is_punct(close + 1, ":")
        && (close + 2..(close + 40).min(s.len()))
            .take_while(|&j| !s.is_punct(j, ";") && !s.is_punct(j, "{"))
            .any(|j| s.is_punct(j, "=>"))
}

/// Token indices of every name bound by a destructuring pattern.
fn pattern_names(s: &TokenStream, open: usize, close: usize, out: &mut Vec<usize>) {
    let object = s.is_punct(open, "{");
    let mut k = open + 1;
    while k < close {
        if s.is_punct(k, ",") {
            k += 1;
            continue;
        }
        if s.is_punct(k, "...") {
            if s.is_ident(k + 1) {
                out.push(k + 1);
            }
            k = s.skip_entry(k + 1, close);
            continue;
        }
        if object && s.is_punct(k, "[") {
            // computed key `[expr]: target`
            let key_close = s.partner(k).unwrap_or(close).min(close);
            k = if s.is_punct(key_close + 1, ":") {
                bind_target(s, key_close + 2, close, out)
            } else {
                s.skip_entry(key_close + 1, close)
            };
            continue;
        }
        if object && s.is_punct(k + 1, ":") {
            k = bind_target(s, k + 2, close, out);
            continue;
        }
        k = bind_target(s, k, close, out);
    }
}

fn bind_target(s: &TokenStream, v: usize, close: usize, out: &mut Vec<usize>) -> usize {
    if s.is_punct(v, "{") || s.is_punct(v, "[") {
        let inner = s.partner(v).unwrap_or(close).min(close);
        pattern_names(s, v, inner, out);
        return s.skip_entry(inner + 1, close);
    }
    if s.is_ident(v) {
        out.push(v);
    }
    s.skip_entry(v + 1, close)
}

fn parse_variable(s: &TokenStream, i: usize, b: &mut SymbolTableBuilder) -> usize {
    let keyword = s.text(i);
    let kind = match keyword {
        "const" => DefinitionKind::Const,
        "let" => DefinitionKind::Let,
        _ => DefinitionKind::Var,
    };
    let exported = s.exported_before(i);
    let mut j = i + 1;

    // `const enum E {}`
    if s.is_keyword(j, "enum") {
        if s.is_ident(j + 1) {
            b.define(s.text(j + 1), s.line(j + 1), DefinitionKind::Enum, exported);
        }
        return j + 2;
    }

    loop {
        let mut names = Vec::new();
        let destructured = s.is_punct(j, "{") || s.is_punct(j, "[");
        if s.is_ident(j) {
            names.push(j);
            j += 1;
        } else if destructured {
            let close = s.close_or_end(j);
            pattern_names(s, j, close, &mut names);
            j = close + 1;
        } else {
            return j;
        }

        // type annotation or definite assignment `!`
        if s.is_punct(j, ":") || s.is_punct(j, "!") {
            j = s.skip_expression(j, true);
        }

        if s.is_punct(j, "=") {
            let init = j + 1;
            if let Some((source, end)) = require_call(s, init) {
                for &n in &names {
                    let name = s.text(n);
                    let label = if destructured {
                        format!("{keyword} {{ {name} }} = require('{source}')")
                    } else {
                        format!("{keyword} {name} = require('{source}')")
                    };
                    b.import(name, &source, s.line(i), s.line(end), label);
                }
            } else {
                let def_kind = if !destructured && is_function_initializer(s, init) {
                    DefinitionKind::Function
                } else {
                    kind
                };
                for &n in &names {
                    b.define(s.text(n), s.line(n), def_kind, exported);
                }
            }
            j = s.skip_expression(init, false);
        } else {
            for &n in &names {
                b.define(s.text(n), s.line(n), kind, exported);
            }
        }

        if s.is_punct(j, ",") {
            j += 1;
            continue;
        }
        return j;
    }
}

// ============================================================================
// Parameters
// ============================================================================

fn collect_parameters(s: &TokenStream, b: &mut SymbolTableBuilder) {
    for i in 0..s.len() {
        if s.type_context[i] {
            continue;
        }
        match (s.kind(i), s.text(i)) {
            (JsTokenKind::Keyword, "function") => {
                let mut k = i + 1;
                if s.is_punct(k, "*") {
                    k += 1;
                }
                if s.is_ident(k) {
                    k += 1;
                }
                let open = s.skip_generics(k);
                if let (true, Some(close)) = (s.is_punct(open, "("), s.partner(open)) {
                    if has_body(s, close) {
                        parameter_list(s, open, close, s.line(i), b);
                    }
                }
            }
            (JsTokenKind::Punct, "=>") if i > 0 => arrow_parameters(s, i, b),
            (JsTokenKind::Ident, _) if is_method_like(s, i) => {
                let open = s.skip_generics(i + 1);
                if let Some(close) = s.partner(open) {
                    if has_body(s, close) {
                        parameter_list(s, open, close, s.line(i), b);
                    }
                }
            }
            _ => {}
        }
    }
}

fn arrow_parameters(s: &TokenStream, arrow: usize, b: &mut SymbolTableBuilder) {
    let p = arrow - 1;

    // `x => ...` (but `(a): Ret => ...` has an identifier return type here)
    let return_type = p >= 2 && s.is_punct(p - 1, ":") && s.is_punct(p - 2, ")");
    if s.is_ident(p) && !return_type && !s.is_punct_before(p, ".") {
        let name = s.text(p);
        if name != "async" && !is_discard_name(name) {
            let line = s.line(p);
            b.parameter(name, line, Span::new(line, s.col(p), line, s.end_col(p)));
        }
        return;
    }

    let open = if s.is_punct(p, ")") {
        s.partner(p)
    } else {
        // walk back over a return type annotation to `) :`
        let lower = p.saturating_sub(48);
        let mut j = p;
        let mut found = None;
        while j > lower {
            j -= 1;
            if s.is_punct(j, ")") && s.is_punct(j + 1, ":") {
                found = s.partner(j);
                break;
            }
            if s.is_punct(j, ";") || s.is_punct(j, "=>") || s.is_punct(j, "=") {
                break;
            }
        }
        found
    };

    let Some(open) = open else { return };
    // `cb: (x: number) => void` is a type, not a function
    if s.is_punct_before(open, ":") || s.is_punct_before(open, "<") {
        return;
    }
    if let Some(close) = s.partner(open) {
        parameter_list(s, open, close, s.line(open), b);
    }
}

fn is_method_like(s: &TokenStream, i: usize) -> bool {
    let opens_list = s.is_punct(i + 1, "(")
        || (s.is_punct(i + 1, "<") && s.is_punct(s.skip_generics(i + 1), "("));
    opens_list
        && !s.is_punct_before(i, ".")
        && !(i > 0 && (s.is_keyword(i - 1, "function") || s.is_keyword(i - 1, "new")))
}

/// True if a function body `{` follows the parameter list closing at `close`,
/// possibly after a return type annotation.
fn has_body(s: &TokenStream, close: usize) -> bool {
    let k = close + 1;
    if s.is_punct(k, "{") {
        return true;
    }
    if !s.is_punct(k, ":") {
        return false;
    }

    let mut angle = 0usize;
    let mut j = k + 1;
    while j < s.len() && j < k + 64 {
        if s.kind(j) == JsTokenKind::Eof {
            return false;
        }
        if s.kind(j) == JsTokenKind::Punct {
            match s.text(j) {
                "<" => angle += 1,
                ">" => angle = angle.saturating_sub(1),
                "{" => {
                    let type_literal = angle > 0
                        || j == k + 1
                        || ["|", "&", ",", ":"].iter().any(|p| s.is_punct(j - 1, p));
                    if !type_literal {
                        return true;
                    }
                    j = s.partner(j).map_or(s.len(), |c| c + 1);
                    continue;
                }
                "(" | "[" => {
                    j = s.partner(j).map_or(s.len(), |c| c + 1);
                    continue;
                }
                ";" | "=>" | "}" | "=" | ")" => return false,
                _ => {}
            }
        }
        j += 1;
    }
    false
}

fn parameter_list(
    s: &TokenStream,
    open: usize,
    close: usize,
    line: usize,
    b: &mut SymbolTableBuilder,
) {
    let span = Span::new(s.line(open), s.col(open), s.line(close), s.end_col(close));

    for (start, end) in s.segments(open, close) {
        let mut k = start;

        // parameter decorators: `@Inject() svc`
        while k < end && s.is_punct(k, "@") {
            k += 1;
            while k < end && (s.is_ident(k) || s.is_punct(k, ".")) {
                k += 1;
            }
            if s.is_punct(k, "(") {
                k = s.partner(k).map_or(end, |c| c + 1);
            }
        }

        // TS parameter properties become class fields
        if k + 1 < end && s.is_ident(k) && PARAMETER_MODIFIERS.contains(&s.text(k)) {
            continue;
        }
        if s.is_punct(k, "...") {
            k += 1;
        }
        if k < end && s.is_ident(k) {
            let name = s.text(k);
            if !is_discard_name(name) {
                b.parameter(name, line, span);
            }
        }
    }
}
