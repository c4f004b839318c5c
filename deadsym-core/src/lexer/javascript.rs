//! Tokenizer for JavaScript, TypeScript and the script regions of markup files.
//!
//! Contextual words (`from`, `as`, `type`, `async`, ...) are emitted as
//! identifiers; only reserved words become [`JsTokenKind::Keyword`].

use super::{is_ident_continue, is_ident_start, Cursor, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsTokenKind {
    Ident,
    Keyword,
    /// Single/double quoted string; text is the unquoted body
    Str,
    /// Backtick template literal; text is the raw body
    Template,
    Number,
    /// Punctuation. `=>` and `...` are single tokens, everything else is one char.
    Punct,
    Newline,
    Unknown,
    Eof,
}

pub type JsToken = Token<JsTokenKind>;

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Lazy single-pass tokenizer.
pub struct JsLexer {
    cursor: Cursor,
    done: bool,
}

impl JsLexer {
    pub fn new(source: &str) -> Self {
        Self {
            cursor: Cursor::new(source),
            done: false,
        }
    }

    fn eof(&mut self) -> Option<JsToken> {
        self.done = true;
        let (line, col) = self.cursor.position();
        Some(Token::new(JsTokenKind::Eof, "", line, col))
    }
}

impl Iterator for JsLexer {
    type Item = JsToken;

    fn next(&mut self) -> Option<JsToken> {
        if self.done {
            return None;
        }

        loop {
            let (line, col) = self.cursor.position();
            let Some(c) = self.cursor.peek() else {
                return self.eof();
            };

            match c {
                '\n' => {
                    self.cursor.bump();
                    return Some(Token::new(JsTokenKind::Newline, "\n", line, col));
                }
                c if c.is_whitespace() => {
                    self.cursor.bump();
                }
                '/' if self.cursor.peek_at(1) == Some('/') => {
                    self.cursor.skip_line_comment();
                }
                '/' if self.cursor.peek_at(1) == Some('*') => {
                    self.cursor.advance(2);
                    if !self.cursor.skip_block_comment("*/") {
                        return self.eof();
                    }
                }
                '"' | '\'' => {
                    self.cursor.bump();
                    let body = self.cursor.read_string(c);
                    return Some(Token::new(JsTokenKind::Str, body, line, col));
                }
                '`' => {
                    self.cursor.bump();
                    let body = self.cursor.read_string('`');
                    return Some(Token::new(JsTokenKind::Template, body, line, col));
                }
                c if is_ident_start(c) || c == '$' => {
                    let word = self.cursor.eat_while(|c| is_ident_continue(c) || c == '$');
                    let kind = if RESERVED.contains(&word.as_str()) {
                        JsTokenKind::Keyword
                    } else {
                        JsTokenKind::Ident
                    };
                    return Some(Token::new(kind, word, line, col));
                }
                c if c.is_ascii_digit() => {
                    let num = self
                        .cursor
                        .eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                    return Some(Token::new(JsTokenKind::Number, num, line, col));
                }
                '=' if self.cursor.peek_at(1) == Some('>') => {
                    self.cursor.advance(2);
                    return Some(Token::new(JsTokenKind::Punct, "=>", line, col));
                }
                '.' if self.cursor.starts_with("...") => {
                    self.cursor.advance(3);
                    return Some(Token::new(JsTokenKind::Punct, "...", line, col));
                }
                c if c.is_ascii_punctuation() => {
                    self.cursor.bump();
                    return Some(Token::new(JsTokenKind::Punct, c.to_string(), line, col));
                }
                other => {
                    self.cursor.bump();
                    return Some(Token::new(JsTokenKind::Unknown, other.to_string(), line, col));
                }
            }
        }
    }
}

/// Tokenize `source` into a vector ending with an `Eof` token.
pub fn tokenize_javascript(source: &str) -> Vec<JsToken> {
    JsLexer::new(source).collect()
}
