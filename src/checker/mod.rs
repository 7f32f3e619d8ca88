pub mod dictionary;
pub mod splitter;
pub mod suggestions;
pub mod tokenizer;

use crate::error::DecodeError;
use crate::language::Syntax;
use crate::Diagnostic;
use dictionary::Dictionary;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use splitter::Word;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;
use tokenizer::{Token, TokenKind, Tokenizer};
use tracing::warn;

lazy_static! {
    static ref DEFAULT_PATTERNS: Vec<Regex> = [
        r"https?://\S+",                                   // URLs
        r"\b[a-fA-F0-9]{32,}\b",                           // Hashes
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}", // Emails
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Attach suggestions to each unknown word.
    pub suggest: bool,
    pub max_suggestions: usize,
    pub max_distance: usize,
    /// Words shorter than this many characters are never reported. Values
    /// below 2 are treated as 2.
    pub min_word_length: usize,
    /// Also check the contents of string literals.
    pub check_strings: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            suggest: false,
            max_suggestions: 3,
            max_distance: 2,
            min_word_length: 2,
            check_strings: false,
        }
    }
}

/// Words and patterns that are never reported, on top of the dictionary.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    words: HashSet<String>,
    patterns: Vec<Regex>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs, e-mail addresses and long hex hashes.
    pub fn with_default_patterns() -> Self {
        Self {
            words: HashSet::new(),
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    pub fn add_word(&mut self, word: &str) {
        let word = word.trim();
        if !word.is_empty() {
            self.words.insert(word.to_lowercase());
        }
    }

    pub fn extend_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.add_word(word.as_ref());
        }
    }

    /// Compile and add a pattern. Invalid patterns are logged and skipped.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        match Regex::new(pattern) {
            Ok(re) => {
                self.patterns.push(re);
                true
            }
            Err(e) => {
                warn!(pattern, error = %e, "invalid ignore pattern");
                false
            }
        }
    }

    /// Add every word of a personal word list (one per line, `#` comments).
    pub fn load_words_file(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let before = self.words.len();
        for line in content.lines() {
            let word = line.trim();
            if !word.is_empty() && !word.starts_with('#') {
                self.add_word(word);
            }
        }
        Ok(self.words.len() - before)
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.words.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.patterns.is_empty()
    }

    /// Absolute byte ranges of `token` matched by an ignore pattern.
    fn masked_ranges(&self, token: &Token<'_>) -> Vec<Range<usize>> {
        let base = token.span.start.offset;
        self.patterns
            .iter()
            .flat_map(|re| re.find_iter(token.text))
            .map(|m| base + m.start()..base + m.end())
            .collect()
    }
}

/// Checks one buffer at a time against a shared dictionary.
///
/// A checker only borrows its collaborators, so creating one per file or
/// per thread is free.
#[derive(Debug, Clone, Copy)]
pub struct Checker<'a> {
    dictionary: &'a Dictionary,
    ignore: &'a IgnoreList,
    options: &'a CheckOptions,
}

impl<'a> Checker<'a> {
    pub fn new(dictionary: &'a Dictionary, ignore: &'a IgnoreList, options: &'a CheckOptions) -> Self {
        Self {
            dictionary,
            ignore,
            options,
        }
    }

    /// Check a raw buffer. Fails only when the buffer is not UTF-8; the
    /// diagnostics themselves are produced lazily.
    pub fn check_file<'b>(
        &self,
        buffer: &'b [u8],
        syntax: &'b Syntax,
    ) -> Result<Diagnostics<'b>, DecodeError>
    where
        'a: 'b,
    {
        let text = std::str::from_utf8(buffer)?;
        Ok(self.check_str(text, syntax))
    }

    pub fn check_str<'b>(&self, text: &'b str, syntax: &'b Syntax) -> Diagnostics<'b>
    where
        'a: 'b,
    {
        Diagnostics {
            checker: *self,
            tokens: Tokenizer::new(text, syntax),
            words: Vec::new().into_iter(),
            masked: Vec::new(),
        }
    }

    fn checks(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Identifier | TokenKind::Comment => true,
            TokenKind::StringLiteral => self.options.check_strings,
            TokenKind::NumericLiteral | TokenKind::Other => false,
        }
    }

    fn is_known(&self, normalized: &str) -> bool {
        if self.dictionary.contains(normalized) || self.ignore.contains(normalized) {
            return true;
        }
        // Possessives: "parser's" is fine when "parser" is.
        let stem = normalized
            .strip_suffix("'s")
            .or_else(|| normalized.strip_suffix("\u{2019}s"));
        stem.is_some_and(|stem| self.dictionary.contains(stem) || self.ignore.contains(stem))
    }

    fn judge(&self, word: Word<'_>, masked: &[Range<usize>]) -> Option<Diagnostic> {
        if !word.checkable {
            return None;
        }
        if word.text.chars().count() < self.options.min_word_length.max(2) {
            return None;
        }
        let range = word.span.byte_range();
        if masked
            .iter()
            .any(|m| m.start <= range.start && range.end <= m.end)
        {
            return None;
        }
        if self.is_known(&word.normalized) {
            return None;
        }

        let suggestions = if self.options.suggest {
            let mut suggestions = self
                .dictionary
                .suggest(&word.normalized, self.options.max_distance);
            suggestions.truncate(self.options.max_suggestions);
            suggestions
        } else {
            Vec::new()
        };

        Some(Diagnostic {
            word: word.text.to_string(),
            normalized: word.normalized,
            span: word.span,
            suggestions,
        })
    }
}

/// Lazy stream of unknown words in one buffer, in discovery order.
#[derive(Debug, Clone)]
pub struct Diagnostics<'a> {
    checker: Checker<'a>,
    tokens: Tokenizer<'a>,
    words: std::vec::IntoIter<Word<'a>>,
    masked: Vec<Range<usize>>,
}

impl<'a> Iterator for Diagnostics<'a> {
    type Item = Diagnostic;

    fn next(&mut self) -> Option<Diagnostic> {
        loop {
            if let Some(word) = self.words.next() {
                if let Some(diagnostic) = self.checker.judge(word, &self.masked) {
                    return Some(diagnostic);
                }
                continue;
            }

            let token = self.tokens.next()?;
            if !self.checker.checks(token.kind) {
                continue;
            }
            if token.kind == TokenKind::Identifier
                && self.checker.ignore.contains(&token.text.to_lowercase())
            {
                continue;
            }
            self.masked = self.checker.ignore.masked_ranges(&token);
            self.words = splitter::split(&token).into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{builtin_descriptors, Languages};
    use std::path::PathBuf;

    fn english() -> Dictionary {
        Dictionary::from_words([
            "function", "return", "test", "text", "the", "this", "is", "a", "comment", "parse",
            "value", "http", "server", "error", "let", "fn", "main",
        ])
        .unwrap()
    }

    fn js() -> Syntax {
        let languages = Languages::builtin().unwrap();
        let syntax = languages.for_path(&PathBuf::from("x.js")).unwrap();
        (*syntax).clone()
    }

    fn words(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.word.as_str()).collect()
    }

    #[test]
    fn test_single_unknown_identifier() {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        let syntax = js();

        let buffer = b"function tset() {}";
        let diagnostics: Vec<_> = checker.check_file(buffer, &syntax).unwrap().collect();

        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.word, "tset");
        assert_eq!(d.normalized, "tset");
        assert_eq!(d.span.start.offset, 9);
        assert_eq!(d.span.len(), 4);
        assert_eq!(d.span.start.line, 1);
        assert_eq!(d.span.start.column, 10);
        assert!(d.suggestions.is_empty());
    }

    #[test]
    fn test_suggestions_when_enabled() {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions {
            suggest: true,
            max_suggestions: 1,
            ..Default::default()
        };
        let checker = Checker::new(&dict, &ignore, &options);
        let syntax = js();

        let diagnostics: Vec<_> = checker.check_str("let tset = 1;", &syntax).collect();
        assert_eq!(diagnostics[0].suggestions, vec!["test"]);
    }

    #[test]
    fn test_comments_and_positions() {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        let syntax = js();

        let text = "let value = 1;\n/* this is a\n   coment */\nparseVaule(value);";
        let diagnostics: Vec<_> = checker.check_str(text, &syntax).collect();
        assert_eq!(words(&diagnostics), vec!["coment", "Vaule"]);

        assert_eq!(diagnostics[0].span.start.line, 3);
        assert_eq!(diagnostics[0].span.start.column, 4);
        assert_eq!(&text[diagnostics[0].span.byte_range()], "coment");

        assert_eq!(diagnostics[1].span.start.line, 4);
        assert_eq!(diagnostics[1].span.start.column, 6);
        assert_eq!(diagnostics[1].normalized, "vaule");
    }

    #[test]
    fn test_strings_skipped_unless_enabled() {
        let dict = english();
        let ignore = IgnoreList::new();
        let syntax = js();
        let text = "let x = \"mispeled\";";

        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        assert_eq!(checker.check_str(text, &syntax).count(), 0);

        let options = CheckOptions {
            check_strings: true,
            ..Default::default()
        };
        let checker = Checker::new(&dict, &ignore, &options);
        let diagnostics: Vec<_> = checker.check_str(text, &syntax).collect();
        assert_eq!(words(&diagnostics), vec!["mispeled"]);
        assert_eq!(diagnostics[0].span.start.offset, 9);
    }

    #[test]
    fn test_exempt_words() {
        let dict = english();
        let options = CheckOptions::default();
        let syntax = js();

        let mut ignore = IgnoreList::new();
        ignore.add_word("Tset");
        let checker = Checker::new(&dict, &ignore, &options);
        let text = "let tset = x + v2 + 0xFFFF + i18n;";
        let diagnostics: Vec<_> = checker.check_str(text, &syntax).collect();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_ignored_identifier_skips_all_words() {
        let dict = english();
        let options = CheckOptions::default();
        let syntax = js();
        let mut ignore = IgnoreList::new();
        ignore.add_word("getElemntById");
        let checker = Checker::new(&dict, &ignore, &options);
        assert_eq!(checker.check_str("getElemntById(x)", &syntax).count(), 0);
    }

    #[test]
    fn test_ignore_patterns_mask_urls() {
        let dict = english();
        let options = CheckOptions::default();
        let syntax = js();
        let ignore = IgnoreList::with_default_patterns();
        let checker = Checker::new(&dict, &ignore, &options);

        let text = "// see https://exmple.org/pth for the tset";
        let diagnostics: Vec<_> = checker.check_str(text, &syntax).collect();
        assert_eq!(words(&diagnostics), vec!["see", "for", "tset"]);
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let mut ignore = IgnoreList::new();
        assert!(!ignore.add_pattern("(unclosed"));
        assert!(ignore.add_pattern(r"\bTODO\b"));
    }

    #[test]
    fn test_possessive() {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        let syntax = js();
        assert_eq!(checker.check_str("// the server's error", &syntax).count(), 0);
    }

    #[test]
    fn test_decode_error() {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        let syntax = Syntax::new(&builtin_descriptors()[0]).unwrap();

        let err = checker.check_file(b"fn main() {\xff}", &syntax).unwrap_err();
        assert_eq!(err.valid_up_to, 11);
    }

    #[test]
    fn test_diagnostics_are_restartable() {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        let syntax = js();

        let first: Vec<_> = checker.check_str("let foo = bar;", &syntax).collect();
        let second: Vec<_> = checker.check_str("let foo = bar;", &syntax).collect();
        assert_eq!(first, second);
        assert_eq!(words(&first), vec!["foo", "bar"]);
    }

    fn reported(text: &str, ext: &str) -> Vec<String> {
        let dict = english();
        let ignore = IgnoreList::new();
        let options = CheckOptions::default();
        let checker = Checker::new(&dict, &ignore, &options);
        let languages = Languages::builtin().unwrap();
        let syntax = languages.for_extension(ext).unwrap();
        let words = checker
            .check_str(text, &syntax)
            .map(|d| d.normalized)
            .collect();
        words
    }

    #[test]
    fn test_rust_char_literal_does_not_hide_code() {
        let text = "if ch == '\"' { do_it(); }\nlet mispeled = 1;\nfn main() {}\n";
        assert!(reported(text, "rs").contains(&"mispeled".to_string()));

        let text = "let s = r\"C:\\\";\nlet mispeled = 1;";
        assert!(reported(text, "rs").contains(&"mispeled".to_string()));
    }

    #[test]
    fn test_apostrophe_in_yaml_does_not_hide_lines() {
        let text = "description: Don't do this\nname: value\nkey: mispeled\n";
        let words = reported(text, "yaml");
        assert!(words.contains(&"mispeled".to_string()), "{:?}", words);

        let text = "<p>Don't stop</p>\n<p>mispeled</p>\n";
        assert!(reported(text, "html").contains(&"mispeled".to_string()));
    }

    #[test]
    fn test_personal_word_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("personal.txt");
        fs::write(&path, "# mine\nfoo\nBar\n\n").unwrap();

        let mut ignore = IgnoreList::new();
        assert_eq!(ignore.load_words_file(&path).unwrap(), 2);
        assert!(ignore.contains("bar"));
    }
}
