//! Tokenizer for the Starlark dialect found in BUILD files.
//!
//! The scanner walks the file content byte by byte, skipping whitespace and
//! `#` comments, and hands out [`Token`]s whose `text` is always a substring
//! of the original content. It records every newline it passes into a
//! [`LineColumnMap`] so positions can be recovered from any token later.
//!
//! One token of lookahead is available through [`Scanner::peek`].

use std::collections::VecDeque;
use std::fmt;

use memchr::memchr;

use crate::line_map::{LineColumnMap, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens.
    OpenParen,
    CloseParen,
    OpenSquare,
    CloseSquare,
    OpenBrace,
    CloseBrace,
    Comma,
    Colon,
    Plus,
    Minus,
    Multiply,
    Divide,
    Dot,
    Percent,
    Assign,
    LessThan,
    GreaterThan,
    Not, // both `!` and the keyword `not`

    // Two-character relational tokens.
    Equals,
    NotEquals,
    LessEqual,
    GreaterEqual,

    Identifier,
    StringLiteral,
    RawStringLiteral,
    NumberLiteral,

    // Keywords.
    For,
    In,
    NotIn, // the word sequence `not in`, merged by the scanner
    If,
    Else,

    Error, // unexpected or malformed input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenSquare => "[",
            TokenKind::CloseSquare => "]",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Multiply => "*",
            TokenKind::Divide => "/",
            TokenKind::Dot => ".",
            TokenKind::Percent => "%",
            TokenKind::Assign => "=",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::Not => "not",
            TokenKind::Equals => "==",
            TokenKind::NotEquals => "!=",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Identifier => "ident",
            TokenKind::StringLiteral => "string",
            TokenKind::RawStringLiteral => "rawstring",
            TokenKind::NumberLiteral => "number",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::NotIn => "not in",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Error => "<<ERROR>>",
            TokenKind::Eof => "<<EOF>>",
        };
        f.write_str(s)
    }
}

/// A token: kind plus the exact slice of content it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')", self.kind, self.text)
    }
}

fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Tokenizer with one-token lookahead over a single file's content.
pub struct Scanner<'a> {
    content: &'a str,
    pos: usize,
    /// One token of caller-visible lookahead, filled by [`Scanner::peek`].
    upcoming: Option<Token<'a>>,
    /// Followers stashed by the `not in` merge when they turned out not to
    /// be `in`; drained in order before scanning fresh input. Adjacent
    /// `not`s stack one entry per merge, so this must be a queue.
    pending: VecDeque<Token<'a>>,
    line_map: LineColumnMap,
}

impl<'a> Scanner<'a> {
    pub fn new(content: &'a str) -> Self {
        Scanner {
            content,
            pos: 0,
            upcoming: None,
            pending: VecDeque::new(),
            line_map: LineColumnMap::new(),
        }
    }

    /// The line map accumulated so far. Complete up to the last token
    /// handed out; complete for the whole file once `Eof` was returned.
    pub fn line_map(&self) -> &LineColumnMap {
        &self.line_map
    }

    /// Give up the scanner, keeping the accumulated line map.
    pub fn into_line_map(self) -> LineColumnMap {
        self.line_map
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'a> {
        if self.upcoming.is_none() {
            let token = self.next_token();
            self.upcoming = Some(token);
        }
        self.upcoming.expect("filled above")
    }

    /// Return the next token. Idempotently returns `Eof` at end of input.
    pub fn next(&mut self) -> Token<'a> {
        if let Some(token) = self.upcoming.take() {
            return token;
        }
        self.next_token()
    }

    fn bytes(&self) -> &'a [u8] {
        self.content.as_bytes()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.content[start..self.pos],
            span: Span::new(start, self.pos),
        }
    }

    /// Skip whitespace and `#` comments, recording newlines.
    fn skip_space(&mut self) {
        let bytes = self.bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                if bytes[self.pos] == b'\n' {
                    self.line_map.push_newline(self.pos + 1);
                }
                self.pos += 1;
            }
            if self.pos < bytes.len() && bytes[self.pos] == b'#' {
                match memchr(b'\n', &bytes[self.pos..]) {
                    Some(offset) => self.pos += offset, // newline handled above
                    None => self.pos = bytes.len(),
                }
            } else {
                return;
            }
        }
    }

    fn next_token(&mut self) -> Token<'a> {
        if let Some(token) = self.pending.pop_front() {
            return token;
        }
        self.skip_space();
        let bytes = self.bytes();
        if self.pos >= bytes.len() {
            return self.token(TokenKind::Eof, self.pos);
        }

        let start = self.pos;
        match bytes[self.pos] {
            b'(' => self.single(TokenKind::OpenParen),
            b')' => self.single(TokenKind::CloseParen),
            b'[' => self.single(TokenKind::OpenSquare),
            b']' => self.single(TokenKind::CloseSquare),
            b'{' => self.single(TokenKind::OpenBrace),
            b'}' => self.single(TokenKind::CloseBrace),
            b',' => self.single(TokenKind::Comma),
            b':' => self.single(TokenKind::Colon),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Multiply),
            b'/' => self.single(TokenKind::Divide),
            b'.' => self.single(TokenKind::Dot),
            b'%' => self.single(TokenKind::Percent),
            b'=' => self.one_or_two(TokenKind::Assign, TokenKind::Equals),
            b'<' => self.one_or_two(TokenKind::LessThan, TokenKind::LessEqual),
            b'>' => self.one_or_two(TokenKind::GreaterThan, TokenKind::GreaterEqual),
            b'!' => self.one_or_two(TokenKind::Not, TokenKind::NotEquals),
            b'0'..=b'9' => self.handle_number(),
            b'"' | b'\'' => self.handle_string(TokenKind::StringLiteral, start),
            _ => self.handle_identifier_keyword_raw_string_or_invalid(),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.pos;
        self.pos += 1;
        self.token(kind, start)
    }

    /// `=`, `<`, `>`, `!`, optionally followed by `=`.
    fn one_or_two(&mut self, single: TokenKind, with_equals: TokenKind) -> Token<'a> {
        let start = self.pos;
        self.pos += 1;
        if self.pos < self.bytes().len() && self.bytes()[self.pos] == b'=' {
            self.pos += 1;
            return self.token(with_equals, start);
        }
        self.token(single, start)
    }

    /// Digits with at most one embedded dot; a second dot is an error.
    fn handle_number(&mut self) -> Token<'a> {
        let bytes = self.bytes();
        let start = self.pos;
        let mut dot_seen = false;
        self.pos += 1;
        while self.pos < bytes.len() && (bytes[self.pos].is_ascii_digit() || bytes[self.pos] == b'.')
        {
            if bytes[self.pos] == b'.' {
                if dot_seen {
                    return self.token(TokenKind::Error, start);
                }
                dot_seen = true;
            }
            self.pos += 1;
        }
        self.token(TokenKind::NumberLiteral, start)
    }

    /// String scanning; `self.pos` is at the opening quote, `text_start`
    /// at the first byte of the token (differs for raw strings, whose `r`
    /// prefix is part of the token text).
    ///
    /// A backslash suppresses the closing effect of the very next quote.
    /// Triple-quoted strings close on three consecutive quotes. Unterminated
    /// strings at end of input become `Error` tokens.
    fn handle_string(&mut self, kind: TokenKind, text_start: usize) -> Token<'a> {
        let bytes = self.bytes();
        let quote = bytes[self.pos];
        self.pos += 1;

        let mut triple = false;
        if self.pos + 1 < bytes.len() && bytes[self.pos] == quote && bytes[self.pos + 1] == quote {
            triple = true;
            self.pos += 2;
        }

        let full_close = if triple { 3 } else { 1 };
        let mut close_quotes_needed = full_close;
        let mut last_was_escape = false;
        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            if c == quote && !last_was_escape {
                close_quotes_needed -= 1;
                if close_quotes_needed == 0 {
                    break;
                }
            } else {
                close_quotes_needed = full_close;
            }
            last_was_escape = c == b'\\';
            if c == b'\n' {
                self.line_map.push_newline(self.pos + 1);
            }
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return self.token(TokenKind::Error, text_start);
        }
        self.pos += 1; // consume final quote
        self.token(kind, text_start)
    }

    fn handle_identifier_keyword_raw_string_or_invalid(&mut self) -> Token<'a> {
        let bytes = self.bytes();
        let start = self.pos;

        // Raw string literals r"foo" start out looking like an identifier,
        // but the following quote gives it away.
        if (bytes[start] == b'r' || bytes[start] == b'R')
            && start + 1 < bytes.len()
            && (bytes[start + 1] == b'"' || bytes[start + 1] == b'\'')
        {
            self.pos += 1;
            return self.handle_string(TokenKind::RawStringLiteral, start);
        }

        // Leading digits were already routed to handle_number. Unexpected
        // characters become one-codepoint error tokens (full codepoint so
        // the token text stays a valid slice).
        if !is_identifier_char(bytes[start]) {
            let char_len = self.content[start..]
                .chars()
                .next()
                .map_or(1, |c| c.len_utf8());
            self.pos += char_len;
            return self.token(TokenKind::Error, start);
        }
        while self.pos < bytes.len() && is_identifier_char(bytes[self.pos]) {
            self.pos += 1;
        }

        match &self.content[start..self.pos] {
            "in" => self.token(TokenKind::In, start),
            "for" => self.token(TokenKind::For, start),
            "if" => self.token(TokenKind::If, start),
            "else" => self.token(TokenKind::Else, start),
            "not" => self.merge_optional_in(start),
            _ => self.token(TokenKind::Identifier, start),
        }
    }

    /// `not` directly followed by `in` folds into a single `not in` token
    /// spanning both words; otherwise the follower becomes pending. The
    /// follower scan may itself have been a `not` that stashed its own
    /// follower, so ours goes to the front of the queue to keep order.
    fn merge_optional_in(&mut self, start: usize) -> Token<'a> {
        let not_token = self.token(TokenKind::Not, start);
        let follower = self.next_token();
        if follower.kind == TokenKind::In {
            let span = Span::new(start, follower.span.end);
            return Token {
                kind: TokenKind::NotIn,
                text: span.text(self.content),
                span,
            };
        }
        self.pending.push_front(follower);
        not_token
    }
}
