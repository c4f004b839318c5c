//! Character-level tokenizers for the languages without a structural parser.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │  javascript.rs   │   │     ruby.rs      │   │      php.rs      │
//! │ ──────────────── │   │ ──────────────── │   │ ──────────────── │
//! │ JS/TS and script │   │ Ruby token kinds │   │ PHP token kinds  │
//! │ regions of markup│   │ (=begin/=end)    │   │ ($vars, # / //)  │
//! └────────┬─────────┘   └────────┬─────────┘   └────────┬─────────┘
//!          └──────────────┬───────┴──────────────────────┘
//!                         ▼
//!               ┌──────────────────┐
//!               │     Cursor       │
//!               │ ──────────────── │
//!               │ char stream with │
//!               │ line tracking    │
//!               └──────────────────┘
//! ```
//!
//! Every lexer is an [`Iterator`] created fresh per call. Scanning never
//! fails: unrecognized characters become `Unknown` tokens, an unterminated
//! string consumes to end of input, and an unterminated block comment
//! suppresses every token after it. The last item is always an `Eof` token.

pub mod javascript;
pub mod php;
pub mod ruby;

pub use javascript::{tokenize_javascript, JsLexer, JsTokenKind};
pub use php::{tokenize_php, PhpLexer, PhpTokenKind};
pub use ruby::{tokenize_ruby, RubyLexer, RubyTokenKind};

/// A token produced by one of the lexers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    pub kind: K,
    pub text: String,
    /// 1-based physical line of the first character
    pub line: usize,
    /// 0-based byte column of the first character
    pub col: usize,
}

impl<K: Copy + PartialEq> Token<K> {
    pub fn new(kind: K, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }

    /// Column just past the last character, for single-line tokens.
    pub fn end_col(&self) -> usize {
        self.col + self.text.len()
    }

    /// True if this token has kind `kind` and exactly the text `text`.
    pub fn is(&self, kind: K, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// Char stream with one-based line tracking shared by all lexers.
pub(crate) struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Cursor {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 0,
        }
    }

    pub(crate) fn line(&self) -> usize {
        self.line
    }

    /// Current (line, byte column).
    pub(crate) fn position(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Previous character, if any.
    pub(crate) fn prev(&self) -> Option<char> {
        self.pos.checked_sub(1).and_then(|p| self.chars.get(p).copied())
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += c.len_utf8();
        }
        Some(c)
    }

    pub(crate) fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    pub(crate) fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    pub(crate) fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Skip to (not past) the next newline.
    pub(crate) fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Skip past `close`. Returns false (with the cursor at EOF) if the
    /// comment is never closed.
    pub(crate) fn skip_block_comment(&mut self, close: &str) -> bool {
        while !self.is_eof() {
            if self.starts_with(close) {
                self.advance(close.chars().count());
                return true;
            }
            self.bump();
        }
        false
    }

    /// Read a string body after the opening `quote` was consumed. Backslash
    /// escapes are honored; an unterminated string runs to end of input.
    pub(crate) fn read_string(&mut self, quote: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == '\\' {
                if let Some(escaped) = self.bump() {
                    out.push(escaped);
                }
                continue;
            }
            if c == quote {
                break;
            }
            out.push(c);
        }
        out
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_lines() {
        let mut c = Cursor::new("a\nb\nc");
        assert_eq!(c.line(), 1);
        c.advance(2);
        assert_eq!(c.line(), 2);
        c.advance(10);
        assert!(c.is_eof());
        assert_eq!(c.line(), 3);
    }

    #[test]
    fn test_cursor_columns_are_bytes() {
        let mut c = Cursor::new("é=x\ny");
        c.advance(2);
        assert_eq!(c.position(), (1, 3));
        c.advance(2);
        assert_eq!(c.position(), (2, 0));
    }

    #[test]
    fn test_unterminated_block_comment_reaches_eof() {
        let mut c = Cursor::new("/* never closed\nx = 1");
        c.advance(2);
        assert!(!c.skip_block_comment("*/"));
        assert!(c.is_eof());
    }

    #[test]
    fn test_read_string_with_escape() {
        let mut c = Cursor::new(r#"a\"b" rest"#);
        assert_eq!(c.read_string('"'), "a\"b");
        assert_eq!(c.peek(), Some(' '));
    }
}
