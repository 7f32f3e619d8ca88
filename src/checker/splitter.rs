use crate::checker::tokenizer::{Token, TokenKind};
use crate::span::{Position, Span};

/// A sub-word of a token, located in the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'a> {
    /// Original-case text, borrowed from the buffer.
    pub text: &'a str,
    pub normalized: String,
    pub span: Span,
    /// False for numeric runs and for single letters glued to digits
    /// (the `v` in `v2`). Those are never looked up.
    pub checkable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Upper,
    Lower,
    Digit,
    Joiner,
    Separator,
}

impl Class {
    fn is_letter(self) -> bool {
        matches!(self, Class::Upper | Class::Lower)
    }
}

fn is_apostrophe(ch: char) -> bool {
    ch == '\'' || ch == '\u{2019}'
}

fn classify(ch: char) -> Class {
    if ch.is_uppercase() {
        Class::Upper
    } else if ch.is_alphabetic() {
        Class::Lower
    } else if ch.is_numeric() {
        Class::Digit
    } else {
        Class::Separator
    }
}

/// Split a token into words.
///
/// Boundaries fall on lower→upper transitions (`camel|Case`), before the
/// last capital of an acronym that runs into a lowercase letter
/// (`HTTP|Server`, `IO|Error`), between letters and digits in either
/// direction, and on every separator character, which is dropped.
/// Comment and string text also keeps apostrophes that sit between two
/// letters, so `don't` stays one word.
pub fn split<'a>(token: &Token<'a>) -> Vec<Word<'a>> {
    let prose = matches!(token.kind, TokenKind::Comment | TokenKind::StringLiteral);
    split_text(token.text, token.span.start, prose)
}

pub(crate) fn split_text(text: &str, start: Position, prose: bool) -> Vec<Word<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut classes: Vec<Class> = chars.iter().map(|&(_, ch)| classify(ch)).collect();

    if prose {
        for i in 1..chars.len().saturating_sub(1) {
            if is_apostrophe(chars[i].1)
                && classes[i - 1].is_letter()
                && classes[i + 1].is_letter()
            {
                classes[i] = Class::Joiner;
            }
        }
    }

    let mut words = Vec::new();
    let mut pos = start;
    let mut word_start: Option<(usize, Position)> = None;

    for i in 0..chars.len() {
        let (offset, ch) = chars[i];
        let class = classes[i];

        let boundary = match word_start {
            None => false,
            Some(_) => {
                let prev = classes[i - 1];
                let next = classes.get(i + 1).copied();
                match (prev, class) {
                    (_, Class::Separator) => true,
                    (Class::Lower, Class::Upper) => true,
                    (Class::Upper, Class::Upper) => next == Some(Class::Lower),
                    (Class::Digit, c) if c.is_letter() => true,
                    (p, Class::Digit) if p.is_letter() => true,
                    _ => false,
                }
            }
        };

        if boundary {
            if let Some((from, from_pos)) = word_start.take() {
                words.push(make_word(text, from, offset, from_pos, pos));
            }
        }

        if class != Class::Separator && word_start.is_none() {
            word_start = Some((offset, pos));
        }

        pos = pos.advance(ch);
    }

    if let Some((from, from_pos)) = word_start {
        words.push(make_word(text, from, text.len(), from_pos, pos));
    }

    for i in 0..words.len() {
        if !words[i].checkable || words[i].text.chars().count() != 1 {
            continue;
        }
        let span = words[i].span;
        let digit_before = i > 0
            && is_numeric(words[i - 1].text)
            && words[i - 1].span.end.offset == span.start.offset;
        let digit_after = words
            .get(i + 1)
            .is_some_and(|w| is_numeric(w.text) && w.span.start.offset == span.end.offset);
        if digit_before || digit_after {
            words[i].checkable = false;
        }
    }

    words
}

fn is_numeric(text: &str) -> bool {
    text.chars().all(char::is_numeric)
}

fn make_word(text: &str, from: usize, to: usize, start: Position, end: Position) -> Word<'_> {
    let slice = &text[from..to];
    Word {
        text: slice,
        normalized: slice.to_lowercase(),
        span: Span::new(start, end),
        checkable: !is_numeric(slice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::tokenizer::tokenize;
    use crate::language::Syntax;

    fn identifier(text: &str) -> Token<'_> {
        Token {
            kind: TokenKind::Identifier,
            text,
            span: Span::new(Position::origin(), Position::origin().advance_str(text)),
        }
    }

    fn normalized(text: &str) -> Vec<String> {
        split(&identifier(text))
            .into_iter()
            .map(|w| w.normalized)
            .collect()
    }

    #[test]
    fn test_camel_case() {
        let words = split(&identifier("camelCaseExample"));
        let texts: Vec<_> = words.iter().map(|w| w.normalized.as_str()).collect();
        assert_eq!(texts, vec!["camel", "case", "example"]);
        assert_eq!(words[0].span.byte_range(), 0..5);
        assert_eq!(words[1].span.byte_range(), 5..9);
        assert_eq!(words[2].span.byte_range(), 9..16);
        assert_eq!(words[1].text, "Case");
    }

    #[test]
    fn test_acronyms() {
        assert_eq!(normalized("HTTPServerError"), vec!["http", "server", "error"]);
        assert_eq!(normalized("IOError"), vec!["io", "error"]);
        assert_eq!(normalized("parseJSON"), vec!["parse", "json"]);
        assert_eq!(normalized("XMLHttpRequest"), vec!["xml", "http", "request"]);
    }

    #[test]
    fn test_screaming_and_snake_case() {
        assert_eq!(normalized("MAX_BUFFER_SIZE"), vec!["max", "buffer", "size"]);
        assert_eq!(normalized("__init__"), vec!["init"]);
        assert_eq!(normalized("kebab-case-name"), vec!["kebab", "case", "name"]);
    }

    #[test]
    fn test_snake_case_with_digits() {
        let words = split(&identifier("snake_case_word_123"));
        let texts: Vec<_> = words.iter().map(|w| w.normalized.as_str()).collect();
        assert_eq!(texts, vec!["snake", "case", "word", "123"]);
        assert!(words[..3].iter().all(|w| w.checkable));
        assert!(!words[3].checkable);
    }

    #[test]
    fn test_letter_digit_transitions() {
        assert_eq!(normalized("abc123"), vec!["abc", "123"]);
        assert_eq!(normalized("123abc"), vec!["123", "abc"]);
        let words = split(&identifier("sha256sum"));
        assert_eq!(words.len(), 3);
        assert!(!words[1].checkable);
    }

    #[test]
    fn test_digit_adjacent_single_letter() {
        let words = split(&identifier("v2_api"));
        assert_eq!(words[0].text, "v");
        assert!(!words[0].checkable);
        assert!(words[2].checkable);

        // A lone letter not touching a digit stays checkable.
        let words = split(&identifier("a_b"));
        assert!(words.iter().all(|w| w.checkable));
    }

    #[test]
    fn test_comment_words() {
        let text = "// Don't parse the\n// HTTPHeader, ok?";
        let token = Token {
            kind: TokenKind::Comment,
            text,
            span: Span::new(Position::origin(), Position::origin().advance_str(text)),
        };
        let words = split(&token);
        let texts: Vec<_> = words.iter().map(|w| w.text).collect();
        assert_eq!(texts, vec!["Don't", "parse", "the", "HTTP", "Header", "ok"]);
        assert_eq!(words[3].span.start.line, 2);
        assert_eq!(words[3].span.start.column, 4);
    }

    #[test]
    fn test_apostrophe_in_identifier_is_separator() {
        assert_eq!(normalized("don't"), vec!["don", "t"]);
    }

    #[test]
    fn test_words_are_relative_to_token_start() {
        let text = "let fooBar = 1;";
        let syntax = Syntax::plain();
        let token = tokenize(text, &syntax).find(|t| t.text == "fooBar").unwrap();
        let words = split(&token);
        assert_eq!(words[0].span.start.offset, 4);
        assert_eq!(words[1].span.start.offset, 7);
        assert_eq!(words[1].span.start.column, 8);
        assert_eq!(&text[words[1].span.byte_range()], "Bar");
    }

    #[test]
    fn test_split_is_idempotent() {
        let token = identifier("getHTTPResponseCode2xx");
        assert_eq!(split(&token), split(&token));
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(normalized("straßeName"), vec!["straße", "name"]);
        assert_eq!(normalized("ÉcoleNormale"), vec!["école", "normale"]);
    }

    #[test]
    fn test_only_separators() {
        assert!(split(&identifier("___")).is_empty());
    }
}
