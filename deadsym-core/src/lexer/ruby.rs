//! Tokenizer for Ruby.

use super::{is_ident_continue, is_ident_start, Cursor, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubyTokenKind {
    /// Lowercase identifier or method name (may end in `?` or `!`)
    Ident,
    /// Capitalized name (class, module or constant)
    Constant,
    Keyword,
    Str,
    /// `:name`
    Symbol,
    /// `@name` or `@@name`
    InstanceVar,
    /// `$name`
    GlobalVar,
    Number,
    /// Punctuation; `::` is a single token
    Punct,
    Newline,
    Unknown,
    Eof,
}

pub type RubyToken = Token<RubyTokenKind>;

const KEYWORDS: &[&str] = &[
    "alias", "and", "begin", "break", "case", "class", "def", "defined?", "do", "else", "elsif",
    "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "or", "redo",
    "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless", "until",
    "when", "while", "yield",
];

/// Lazy single-pass tokenizer.
pub struct RubyLexer {
    cursor: Cursor,
    done: bool,
}

impl RubyLexer {
    pub fn new(source: &str) -> Self {
        Self {
            cursor: Cursor::new(source),
            done: false,
        }
    }

    fn eof(&mut self) -> Option<RubyToken> {
        self.done = true;
        let (line, col) = self.cursor.position();
        Some(Token::new(RubyTokenKind::Eof, "", line, col))
    }

    /// `=begin` ... `=end` block comment, both markers at line start.
    fn skip_embedded_doc(&mut self) -> bool {
        self.cursor.skip_line_comment();
        while !self.cursor.is_eof() {
            self.cursor.bump();
            if self.cursor.starts_with("=end") {
                self.cursor.skip_line_comment();
                return true;
            }
            self.cursor.skip_line_comment();
        }
        false
    }
}

impl Iterator for RubyLexer {
    type Item = RubyToken;

    fn next(&mut self) -> Option<RubyToken> {
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
                    return Some(Token::new(RubyTokenKind::Newline, "\n", line, col));
                }
                c if c.is_whitespace() => {
                    self.cursor.bump();
                }
                '#' => self.cursor.skip_line_comment(),
                '=' if self.cursor.starts_with("=begin")
                    && self.cursor.prev().map_or(true, |p| p == '\n') =>
                {
                    if !self.skip_embedded_doc() {
                        return self.eof();
                    }
                }
                '"' | '\'' | '`' => {
                    self.cursor.bump();
                    let body = self.cursor.read_string(c);
                    return Some(Token::new(RubyTokenKind::Str, body, line, col));
                }
                ':' if self.cursor.peek_at(1) == Some(':') => {
                    self.cursor.advance(2);
                    return Some(Token::new(RubyTokenKind::Punct, "::", line, col));
                }
                ':' if self.cursor.peek_at(1).is_some_and(is_ident_start) => {
                    self.cursor.bump();
                    let name = self.cursor.eat_while(is_ident_continue);
                    return Some(Token::new(RubyTokenKind::Symbol, name, line, col));
                }
                ':' if matches!(self.cursor.peek_at(1), Some('"') | Some('\'')) => {
                    self.cursor.bump();
                    let quote = self.cursor.bump().unwrap_or('"');
                    let name = self.cursor.read_string(quote);
                    return Some(Token::new(RubyTokenKind::Symbol, name, line, col));
                }
                '@' => {
                    let sigil = self.cursor.eat_while(|c| c == '@');
                    let name = self.cursor.eat_while(is_ident_continue);
                    return Some(Token::new(
                        RubyTokenKind::InstanceVar,
                        format!("{sigil}{name}"),
                        line,
                        col,
                    ));
                }
                '$' if self.cursor.peek_at(1).is_some_and(is_ident_start) => {
                    self.cursor.bump();
                    let name = self.cursor.eat_while(is_ident_continue);
                    return Some(Token::new(RubyTokenKind::GlobalVar, format!("${name}"), line, col));
                }
                c if is_ident_start(c) => {
                    let mut word = self.cursor.eat_while(is_ident_continue);
                    // predicate/bang method names, but not `!=`
                    if let Some(suffix @ ('?' | '!')) = self.cursor.peek() {
                        if self.cursor.peek_at(1) != Some('=') {
                            word.push(suffix);
                            self.cursor.bump();
                        }
                    }
                    let kind = if KEYWORDS.contains(&word.as_str()) {
                        RubyTokenKind::Keyword
                    } else if word.starts_with(|c: char| c.is_uppercase()) {
                        RubyTokenKind::Constant
                    } else {
                        RubyTokenKind::Ident
                    };
                    return Some(Token::new(kind, word, line, col));
                }
                c if c.is_ascii_digit() => {
                    let num = self
                        .cursor
                        .eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                    return Some(Token::new(RubyTokenKind::Number, num, line, col));
                }
                c if c.is_ascii_punctuation() => {
                    self.cursor.bump();
                    return Some(Token::new(RubyTokenKind::Punct, c.to_string(), line, col));
                }
                other => {
                    self.cursor.bump();
                    return Some(Token::new(RubyTokenKind::Unknown, other.to_string(), line, col));
                }
            }
        }
    }
}

/// Tokenize `source` into a vector ending with an `Eof` token.
pub fn tokenize_ruby(source: &str) -> Vec<RubyToken> {
    RubyLexer::new(source).collect()
}
