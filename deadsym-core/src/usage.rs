//! Usage resolution: comment-aware, whole-word name search.
//!
//! This is the one matching primitive behind local usage, cross-file usage and
//! template-tag usage. A name counts as used on a line when it appears there
//! as a whole word (neither neighbour is a letter, digit or underscore) after
//! the line has been stripped of comments.
//!
//! ```
//! use deadsym_core::usage::{is_used, CommentStyle};
//!
//! let src = "import os\n# os is mentioned only here\n";
//! assert!(!is_used(src, "os", 1, CommentStyle::Hash));
//! ```

use std::ops::RangeInclusive;

use crate::language::Language;
use crate::model::Span;

/// Comment syntax of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` and `/* */` (JS, TS, Go)
    CLike,
    /// `#` (Python)
    Hash,
    /// `#` plus `=begin`/`=end` blocks
    Ruby,
    /// `//`, `#` and `/* */`
    Php,
    /// `<!-- -->` (template markup)
    Markup,
}

impl CommentStyle {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Python => CommentStyle::Hash,
            Language::Ruby => CommentStyle::Ruby,
            Language::Php => CommentStyle::Php,
            _ => CommentStyle::CLike,
        }
    }

    /// String literal opened at `rest`, as its closing delimiter.
    fn string_at(&self, rest: &str) -> Option<&'static str> {
        if *self == CommentStyle::Hash {
            if rest.starts_with("\"\"\"") {
                return Some("\"\"\"");
            }
            if rest.starts_with("'''") {
                return Some("'''");
            }
        }
        match (self, rest.chars().next()?) {
            (CommentStyle::Markup, _) => None,
            (_, '"') => Some("\""),
            (_, '\'') => Some("'"),
            (CommentStyle::CLike, '`') => Some("`"),
            _ => None,
        }
    }

    fn starts_line_comment(&self, rest: &str) -> bool {
        match self {
            CommentStyle::CLike => rest.starts_with("//"),
            CommentStyle::Hash | CommentStyle::Ruby => rest.starts_with('#'),
            CommentStyle::Php => {
                rest.starts_with("//") || (rest.starts_with('#') && !rest.starts_with("#["))
            }
            CommentStyle::Markup => false,
        }
    }

    /// Block comment opened at `rest`, as (open, close).
    fn block_at(&self, rest: &str) -> Option<(&'static str, &'static str)> {
        match self {
            CommentStyle::CLike | CommentStyle::Php if rest.starts_with("/*") => Some(("/*", "*/")),
            CommentStyle::Markup if rest.starts_with("<!--") => Some(("<!--", "-->")),
            _ => None,
        }
    }
}

/// Line-by-line comment remover that carries block-comment and multi-line
/// string state (template literals, triple-quoted strings) across lines.
#[derive(Debug)]
pub struct CommentStripper {
    style: CommentStyle,
    in_block: Option<&'static str>,
    in_string: Option<&'static str>,
}

/// Delimiters whose literal may continue past the end of a line.
fn spans_lines(close: &str) -> bool {
    close == "`" || close.len() == 3
}

impl CommentStripper {
    pub fn new(style: CommentStyle) -> Self {
        Self {
            style,
            in_block: None,
            in_string: None,
        }
    }

    /// Return `line` with comments blanked. Block comments become spaces of
    /// the same byte length so columns still line up with the source; a line
    /// comment truncates the line.
    pub fn strip_line(&mut self, line: &str) -> String {
        if self.style == CommentStyle::Ruby {
            if self.in_block.is_some() {
                if line.starts_with("=end") {
                    self.in_block = None;
                }
                return String::new();
            }
            if line.starts_with("=begin") {
                self.in_block = Some("=end");
                return String::new();
            }
        }

        // plain quotes never continue onto the next line
        if self.in_string.is_some_and(|close| !spans_lines(close)) {
            self.in_string = None;
        }

        let mut out = String::with_capacity(line.len());
        let mut i = 0;

        while i < line.len() {
            let rest = &line[i..];

            if let Some(close) = self.in_block {
                match rest.find(close) {
                    Some(pos) => {
                        let skipped = pos + close.len();
                        out.extend(std::iter::repeat(' ').take(skipped));
                        i += skipped;
                        self.in_block = None;
                        continue;
                    }
                    None => break,
                }
            }

            let Some(c) = rest.chars().next() else { break };

            if let Some(close) = self.in_string {
                if rest.starts_with(close) {
                    out.push_str(close);
                    i += close.len();
                    self.in_string = None;
                    continue;
                }
                out.push(c);
                i += c.len_utf8();
                if c == '\\' {
                    if let Some(escaped) = line[i..].chars().next() {
                        out.push(escaped);
                        i += escaped.len_utf8();
                    }
                }
                continue;
            }

            if let Some(close) = self.style.string_at(rest) {
                self.in_string = Some(close);
                out.push_str(close);
                i += close.len();
                continue;
            }

            if self.style.starts_line_comment(rest) {
                break;
            }

            if let Some((open, close)) = self.style.block_at(rest) {
                self.in_block = Some(close);
                out.extend(std::iter::repeat(' ').take(open.len()));
                i += open.len();
                continue;
            }

            out.push(c);
            i += c.len_utf8();
        }

        out
    }
}

/// `text[..col]`, backing off to a char boundary.
fn prefix(text: &str, col: usize) -> &str {
    let mut col = col.min(text.len());
    while !text.is_char_boundary(col) {
        col -= 1;
    }
    &text[..col]
}

/// `text[col..]`, moving forward to a char boundary.
fn suffix(text: &str, col: usize) -> &str {
    let mut col = col.min(text.len());
    while !text.is_char_boundary(col) {
        col += 1;
    }
    &text[col..]
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True if `word` occurs in `haystack` with non-word characters (or the line
/// boundary) on both sides.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }

    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }
        start = begin + word.chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Source text pre-split into comment-free lines, for repeated queries.
#[derive(Debug, Clone, Default)]
pub struct StrippedSource {
    lines: Vec<String>,
}

impl StrippedSource {
    pub fn new(source: &str, style: CommentStyle) -> Self {
        let mut stripper = CommentStripper::new(style);
        Self {
            lines: source.lines().map(|l| stripper.strip_line(l)).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Comment-free text of the 1-based line `line`.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// Whole-word search on every line for which `skip` is false.
    pub fn find_where(&self, name: &str, skip: impl Fn(usize) -> bool) -> bool {
        self.lines
            .iter()
            .enumerate()
            .filter(|(i, text)| !text.trim().is_empty() && !skip(i + 1))
            .any(|(_, text)| contains_word(text, name))
    }

    /// Whole-word search outside the declaration line.
    pub fn is_used(&self, name: &str, declaration_line: usize) -> bool {
        self.find_where(name, |l| l == declaration_line)
    }

    /// Whole-word search outside a multi-line declaration span.
    pub fn is_used_outside(&self, name: &str, span: &RangeInclusive<usize>) -> bool {
        self.find_where(name, |l| span.contains(&l))
    }

    /// Whole-word search that ignores the text inside `span` (a parameter
    /// list). Text before and after the span on its boundary lines is still
    /// searched, so `def f(a): return a` sees the second `a`.
    pub fn is_used_outside_span(&self, name: &str, span: &Span) -> bool {
        self.lines.iter().enumerate().any(|(i, text)| {
            let line = i + 1;
            if line < span.start_line || line > span.end_line {
                return contains_word(text, name);
            }
            let before = if line == span.start_line {
                prefix(text, span.start_col)
            } else {
                ""
            };
            let after = if line == span.end_line {
                suffix(text, span.end_col)
            } else {
                ""
            };
            contains_word(before, name) || contains_word(after, name)
        })
    }

    /// Whole-word search anywhere.
    pub fn mentions(&self, name: &str) -> bool {
        self.find_where(name, |_| false)
    }
}

/// Decide whether `name` is referenced in `source` anywhere other than on
/// `declaration_line`, ignoring comments.
pub fn is_used(source: &str, name: &str, declaration_line: usize, style: CommentStyle) -> bool {
    StrippedSource::new(source, style).is_used(name, declaration_line)
}
