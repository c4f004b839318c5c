//! Tokenizer for PHP.
//!
//! Keywords are case-insensitive in PHP, so the lexer does not classify them;
//! extractors compare identifier text with [`PhpToken::is_word`].

use super::{is_ident_continue, is_ident_start, Cursor, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhpTokenKind {
    /// `$name`, text includes the sigil
    Variable,
    Ident,
    Str,
    Number,
    /// Punctuation; `\`, `=>`, `->`, `::`, `...` are single tokens
    Punct,
    Unknown,
    Eof,
}

pub type PhpToken = Token<PhpTokenKind>;

impl PhpToken {
    /// Case-insensitive identifier comparison.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == PhpTokenKind::Ident && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == PhpTokenKind::Punct && self.text == p
    }
}

const MULTI_PUNCT: &[&str] = &["...", "=>", "->", "::", "?->"];

/// Lazy single-pass tokenizer.
pub struct PhpLexer {
    cursor: Cursor,
    done: bool,
}

impl PhpLexer {
    pub fn new(source: &str) -> Self {
        Self {
            cursor: Cursor::new(source),
            done: false,
        }
    }

    fn eof(&mut self) -> Option<PhpToken> {
        self.done = true;
        let (line, col) = self.cursor.position();
        Some(Token::new(PhpTokenKind::Eof, "", line, col))
    }
}

impl Iterator for PhpLexer {
    type Item = PhpToken;

    fn next(&mut self) -> Option<PhpToken> {
        if self.done {
            return None;
        }

        loop {
            let (line, col) = self.cursor.position();
            let Some(c) = self.cursor.peek() else {
                return self.eof();
            };

            match c {
                c if c.is_whitespace() => {
                    self.cursor.bump();
                }
                '/' if self.cursor.peek_at(1) == Some('/') => self.cursor.skip_line_comment(),
                // `#[` opens an attribute, not a comment
                '#' if self.cursor.peek_at(1) != Some('[') => self.cursor.skip_line_comment(),
                '/' if self.cursor.peek_at(1) == Some('*') => {
                    self.cursor.advance(2);
                    if !self.cursor.skip_block_comment("*/") {
                        return self.eof();
                    }
                }
                '"' | '\'' | '`' => {
                    self.cursor.bump();
                    let body = self.cursor.read_string(c);
                    return Some(Token::new(PhpTokenKind::Str, body, line, col));
                }
                '$' if self.cursor.peek_at(1).is_some_and(is_ident_start) => {
                    self.cursor.bump();
                    let name = self.cursor.eat_while(is_ident_continue);
                    return Some(Token::new(PhpTokenKind::Variable, format!("${name}"), line, col));
                }
                c if is_ident_start(c) => {
                    let word = self.cursor.eat_while(is_ident_continue);
                    return Some(Token::new(PhpTokenKind::Ident, word, line, col));
                }
                c if c.is_ascii_digit() => {
                    let num = self
                        .cursor
                        .eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                    return Some(Token::new(PhpTokenKind::Number, num, line, col));
                }
                c if c.is_ascii_punctuation() => {
                    if let Some(p) = MULTI_PUNCT.iter().find(|p| self.cursor.starts_with(p)) {
                        self.cursor.advance(p.len());
                        return Some(Token::new(PhpTokenKind::Punct, *p, line, col));
                    }
                    self.cursor.bump();
                    return Some(Token::new(PhpTokenKind::Punct, c.to_string(), line, col));
                }
                other => {
                    self.cursor.bump();
                    return Some(Token::new(PhpTokenKind::Unknown, other.to_string(), line, col));
                }
            }
        }
    }
}

/// Tokenize `source` into a vector ending with an `Eof` token.
pub fn tokenize_php(source: &str) -> Vec<PhpToken> {
    PhpLexer::new(source).collect()
}
