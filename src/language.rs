use crate::error::SyntaxError;
use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Comment and string syntax of a source language, as plain data.
///
/// Descriptors are compiled into a [`Syntax`] before tokenizing. New
/// languages are added by writing a descriptor (for instance in the
/// `[languages]` table of the config file), never by adding code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    pub name: String,

    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub line_comments: Vec<String>,

    #[serde(default)]
    pub block_comments: Vec<BlockComment>,

    #[serde(default)]
    pub strings: Vec<StringDelimiter>,

    /// Quote characters that delimit one-character literals such as `'x'`
    /// or `'\n'`. A quote that does not close right after one (possibly
    /// escaped) character is left alone, so `'a` lifetimes are not strings.
    #[serde(default)]
    pub char_literals: Vec<CharLiteral>,

    /// Characters besides letters, digits and `_` that continue an identifier.
    #[serde(default)]
    pub identifier_chars: Vec<char>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockComment {
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub nested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringDelimiter {
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub escape: Option<char>,
    /// When false, the literal also ends before a newline.
    #[serde(default = "default_multiline")]
    pub multiline: bool,
}

fn default_multiline() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharLiteral {
    pub quote: char,
    #[serde(default)]
    pub escape: Option<char>,
}

impl LanguageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensions: Vec::new(),
            line_comments: Vec::new(),
            block_comments: Vec::new(),
            strings: Vec::new(),
            char_literals: Vec::new(),
            identifier_chars: Vec::new(),
        }
    }

    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn line_comment(mut self, marker: &str) -> Self {
        self.line_comments.push(marker.to_string());
        self
    }

    pub fn block_comment(mut self, open: &str, close: &str, nested: bool) -> Self {
        self.block_comments.push(BlockComment {
            open: open.to_string(),
            close: close.to_string(),
            nested,
        });
        self
    }

    pub fn string(mut self, open: &str, close: &str, escape: Option<char>, multiline: bool) -> Self {
        self.strings.push(StringDelimiter {
            open: open.to_string(),
            close: close.to_string(),
            escape,
            multiline,
        });
        self
    }

    pub fn char_literal(mut self, quote: char, escape: Option<char>) -> Self {
        self.char_literals.push(CharLiteral { quote, escape });
        self
    }

    pub fn identifier_char(mut self, ch: char) -> Self {
        self.identifier_chars.push(ch);
        self
    }
}

/// What an opener found by [`Syntax::opener_at`] starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opener {
    LineComment,
    BlockComment {
        open: String,
        close: String,
        nested: bool,
    },
    String {
        close: String,
        escape: Option<char>,
        multiline: bool,
    },
    Char {
        quote: char,
        escape: Option<char>,
    },
}

/// Longest escape sequence accepted inside a char literal, `\u{10FFFF}`.
const MAX_CHAR_ESCAPE: usize = 10;

impl Opener {
    /// Byte length of the char literal at the start of `text`, if one is
    /// there. `text` starts with the opening quote.
    pub fn char_literal_len(text: &str, quote: char, escape: Option<char>) -> Option<usize> {
        let mut chars = text.char_indices().skip(1);
        let (_, first) = chars.next()?;
        if first == quote || first == '\n' {
            return None;
        }
        if Some(first) == escape {
            let (_, escaped) = chars.next()?;
            if escaped == '\n' {
                return None;
            }
            return chars
                .take(MAX_CHAR_ESCAPE)
                .take_while(|&(_, ch)| ch != '\n')
                .find(|&(_, ch)| ch == quote)
                .map(|(i, ch)| i + ch.len_utf8());
        }
        match chars.next()? {
            (i, ch) if ch == quote => Some(i + ch.len_utf8()),
            _ => None,
        }
    }
}

/// A [`LanguageDescriptor`] compiled for the tokenizer.
#[derive(Debug, Clone)]
pub struct Syntax {
    name: String,
    matcher: Option<AhoCorasick>,
    openers: Vec<Opener>,
    identifier_chars: Vec<char>,
}

impl Syntax {
    pub fn new(descriptor: &LanguageDescriptor) -> Result<Self, SyntaxError> {
        let invalid = |reason: &str| SyntaxError {
            language: descriptor.name.clone(),
            reason: reason.to_string(),
        };

        let mut patterns = Vec::new();
        let mut openers = Vec::new();

        for marker in &descriptor.line_comments {
            if marker.is_empty() {
                return Err(invalid("empty line comment marker"));
            }
            patterns.push(marker.clone());
            openers.push(Opener::LineComment);
        }

        for block in &descriptor.block_comments {
            if block.open.is_empty() || block.close.is_empty() {
                return Err(invalid("empty block comment delimiter"));
            }
            patterns.push(block.open.clone());
            openers.push(Opener::BlockComment {
                open: block.open.clone(),
                close: block.close.clone(),
                nested: block.nested,
            });
        }

        for string in &descriptor.strings {
            if string.open.is_empty() || string.close.is_empty() {
                return Err(invalid("empty string delimiter"));
            }
            patterns.push(string.open.clone());
            openers.push(Opener::String {
                close: string.close.clone(),
                escape: string.escape,
                multiline: string.multiline,
            });
        }

        for literal in &descriptor.char_literals {
            patterns.push(literal.quote.to_string());
            openers.push(Opener::Char {
                quote: literal.quote,
                escape: literal.escape,
            });
        }

        let matcher = if patterns.is_empty() {
            None
        } else {
            let ac = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostLongest)
                .start_kind(StartKind::Anchored)
                .build(&patterns)
                .map_err(|e| invalid(&e.to_string()))?;
            Some(ac)
        };

        Ok(Self {
            name: descriptor.name.clone(),
            matcher,
            openers,
            identifier_chars: descriptor.identifier_chars.clone(),
        })
    }

    /// A syntax with no comments or strings: everything is identifiers,
    /// numbers and punctuation.
    pub fn plain() -> Self {
        Self {
            name: "plain".to_string(),
            matcher: None,
            openers: Vec::new(),
            identifier_chars: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Longest comment or string opener starting exactly at byte `pos`,
    /// returned with its length in bytes. For [`Opener::Char`] the length
    /// is that of the quote alone; see [`Opener::char_literal_len`].
    pub fn opener_at(&self, text: &str, pos: usize) -> Option<(usize, &Opener)> {
        let matcher = self.matcher.as_ref()?;
        let input = Input::new(text)
            .span(pos..text.len())
            .anchored(Anchored::Yes);
        let found = matcher.find(input)?;
        Some((found.len(), &self.openers[found.pattern().as_usize()]))
    }

    pub fn is_identifier_char(&self, ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || self.identifier_chars.contains(&ch)
    }
}

/// Registry of compiled syntaxes, keyed by file extension.
#[derive(Debug, Clone, Default)]
pub struct Languages {
    by_extension: HashMap<String, Arc<Syntax>>,
}

impl Languages {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, SyntaxError> {
        let mut languages = Self::empty();
        for descriptor in builtin_descriptors() {
            languages.insert(&descriptor)?;
        }
        Ok(languages)
    }

    /// Compile and register a descriptor. Later registrations win for
    /// extensions that were already claimed.
    pub fn insert(&mut self, descriptor: &LanguageDescriptor) -> Result<(), SyntaxError> {
        let syntax = Arc::new(Syntax::new(descriptor)?);
        for ext in &descriptor.extensions {
            self.by_extension
                .insert(ext.trim_start_matches('.').to_lowercase(), Arc::clone(&syntax));
        }
        Ok(())
    }

    pub fn for_extension(&self, ext: &str) -> Option<Arc<Syntax>> {
        self.by_extension.get(&ext.to_lowercase()).cloned()
    }

    /// Detect the syntax of a file from its extension
    pub fn for_path(&self, path: &Path) -> Option<Arc<Syntax>> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.for_extension(ext)
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

pub fn builtin_descriptors() -> Vec<LanguageDescriptor> {
    vec![
        LanguageDescriptor::new("rust")
            .extensions(&["rs"])
            .line_comment("//")
            .block_comment("/*", "*/", true)
            .string("\"", "\"", Some('\\'), true)
            .string("b\"", "\"", Some('\\'), true)
            .string("r\"", "\"", None, true)
            .string("r#\"", "\"#", None, true)
            .string("r##\"", "\"##", None, true)
            .string("br\"", "\"", None, true)
            .string("br#\"", "\"#", None, true)
            .char_literal('\'', Some('\\')),
        LanguageDescriptor::new("c")
            .extensions(&[
                "c", "h", "cpp", "cc", "cxx", "hpp", "hh", "java", "cs", "kt", "kts", "scala",
                "swift", "dart", "proto",
            ])
            .line_comment("//")
            .block_comment("/*", "*/", false)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", Some('\\'), false),
        LanguageDescriptor::new("javascript")
            .extensions(&["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"])
            .line_comment("//")
            .block_comment("/*", "*/", false)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", Some('\\'), false)
            .string("`", "`", Some('\\'), true),
        LanguageDescriptor::new("go")
            .extensions(&["go"])
            .line_comment("//")
            .block_comment("/*", "*/", false)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", Some('\\'), false)
            .string("`", "`", None, true),
        LanguageDescriptor::new("python")
            .extensions(&["py", "pyw", "pyi"])
            .line_comment("#")
            .string("\"\"\"", "\"\"\"", Some('\\'), true)
            .string("'''", "'''", Some('\\'), true)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", Some('\\'), false),
        LanguageDescriptor::new("shell")
            .extensions(&["sh", "bash", "zsh", "fish", "dockerfile"])
            .line_comment("#")
            .string("\"", "\"", Some('\\'), true)
            .string("'", "'", None, true),
        LanguageDescriptor::new("toml")
            .extensions(&["toml"])
            .line_comment("#")
            .string("\"\"\"", "\"\"\"", Some('\\'), true)
            .string("'''", "'''", None, true)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", None, false),
        LanguageDescriptor::new("yaml")
            .extensions(&["yaml", "yml"])
            .line_comment("#")
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", None, false),
        LanguageDescriptor::new("ruby")
            .extensions(&["rb", "rake", "gemspec"])
            .line_comment("#")
            .block_comment("=begin", "=end", false)
            .string("\"", "\"", Some('\\'), true)
            .string("'", "'", Some('\\'), true),
        LanguageDescriptor::new("lua")
            .extensions(&["lua"])
            .line_comment("--")
            .block_comment("--[[", "]]", false)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", Some('\\'), false)
            .string("[[", "]]", None, true),
        LanguageDescriptor::new("sql")
            .extensions(&["sql"])
            .line_comment("--")
            .block_comment("/*", "*/", false)
            .string("'", "'", None, true),
        LanguageDescriptor::new("markup")
            .extensions(&["html", "htm", "xml", "svg", "xhtml", "vue"])
            .block_comment("<!--", "-->", false)
            .string("\"", "\"", None, true)
            .string("'", "'", None, false)
            .identifier_char('-'),
        LanguageDescriptor::new("css")
            .extensions(&["css", "scss", "less"])
            .line_comment("//")
            .block_comment("/*", "*/", false)
            .string("\"", "\"", Some('\\'), false)
            .string("'", "'", Some('\\'), false)
            .identifier_char('-'),
    ]
}
