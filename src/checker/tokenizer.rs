use crate::language::{Opener, Syntax};
use crate::span::{Position, Span};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Comment,
    StringLiteral,
    NumericLiteral,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

/// Single-pass scanner over a whole buffer.
///
/// Yields tokens that cover the buffer with no gaps and no overlaps, so
/// concatenating every token's text gives back the input. Unterminated
/// comments and strings run to the end of the buffer. Cloning the
/// tokenizer restarts nothing: the clone continues from the same position.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    text: &'a str,
    syntax: &'a Syntax,
    pos: Position,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str, syntax: &'a Syntax) -> Self {
        Self {
            text,
            syntax,
            pos: Position::origin(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos = self.pos.advance(ch);
        Some(ch)
    }

    fn bump_str(&mut self, len: usize) {
        let consumed = &self.text[self.pos.offset..self.pos.offset + len];
        self.pos = self.pos.advance_str(consumed);
    }

    /// The opener at the current position, with the number of bytes to
    /// consume. Char-literal quotes count only when the literal closes.
    fn opener(&self) -> Option<(usize, &'a Opener)> {
        let syntax: &'a Syntax = self.syntax;
        let (len, opener) = syntax.opener_at(self.text, self.pos.offset)?;
        match opener {
            Opener::Char { quote, escape } => {
                Opener::char_literal_len(self.rest(), *quote, *escape).map(|len| (len, opener))
            }
            _ => Some((len, opener)),
        }
    }

    fn starts_identifier(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn identifier(&mut self) {
        self.bump();
        while let Some(ch) = self.peek() {
            if !self.syntax.is_identifier_char(ch) {
                break;
            }
            self.bump();
        }
    }

    fn number(&mut self) {
        self.bump();
        while let Some(ch) = self.peek() {
            let fraction = ch == '.'
                && self
                    .rest()
                    .as_bytes()
                    .get(1)
                    .is_some_and(|b| b.is_ascii_digit());
            if !(ch.is_alphanumeric() || ch == '_' || fraction) {
                break;
            }
            self.bump();
        }
    }

    fn other(&mut self) {
        self.bump();
        while let Some(ch) = self.peek() {
            if Self::starts_identifier(ch) || ch.is_numeric() || self.opener().is_some() {
                break;
            }
            self.bump();
        }
    }

    fn line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn block_comment(&mut self, open: &str, close: &str, nested: bool) {
        let mut depth = 1usize;
        while !self.rest().is_empty() {
            if self.rest().starts_with(close) {
                self.bump_str(close.len());
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else if nested && self.rest().starts_with(open) {
                self.bump_str(open.len());
                depth += 1;
            } else {
                self.bump();
            }
        }
    }

    fn string(&mut self, close: &str, escape: Option<char>, multiline: bool) {
        while let Some(ch) = self.peek() {
            if Some(ch) == escape {
                self.bump();
                self.bump();
            } else if self.rest().starts_with(close) {
                self.bump_str(close.len());
                return;
            } else if ch == '\n' && !multiline {
                return;
            } else {
                self.bump();
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let start = self.pos;
        let ch = self.peek()?;

        let kind = if let Some((len, opener)) = self.opener() {
            self.bump_str(len);
            match opener {
                Opener::LineComment => {
                    self.line_comment();
                    TokenKind::Comment
                }
                Opener::BlockComment {
                    open,
                    close,
                    nested,
                } => {
                    self.block_comment(open, close, *nested);
                    TokenKind::Comment
                }
                Opener::String {
                    close,
                    escape,
                    multiline,
                } => {
                    self.string(close, *escape, *multiline);
                    TokenKind::StringLiteral
                }
                Opener::Char { .. } => TokenKind::StringLiteral,
            }
        } else if Self::starts_identifier(ch) {
            self.identifier();
            TokenKind::Identifier
        } else if ch.is_numeric() {
            self.number();
            TokenKind::NumericLiteral
        } else {
            self.other();
            TokenKind::Other
        };

        let span = Span::new(start, self.pos);
        Some(Token {
            kind,
            text: &self.text[span.byte_range()],
            span,
        })
    }
}

/// Tokenize `text` with `syntax`.
pub fn tokenize<'a>(text: &'a str, syntax: &'a Syntax) -> Tokenizer<'a> {
    Tokenizer::new(text, syntax)
}
