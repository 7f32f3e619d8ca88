use crate::checker::suggestions;
use crate::error::DictionaryLoadError;
use flate2::read::GzDecoder;
use fst::{Set, SetBuilder, Streamer};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

const BUILTIN_WORDS: &str = include_str!("../../dictionaries/base.txt");

/// Where a word list comes from.
///
/// Paths ending in `.dict` are compiled FST sets (see
/// [`Dictionary::write_to`]), paths ending in `.gz` are gzipped word lists,
/// anything else is a plain word list with one word per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSource {
    Path(PathBuf),
    Inline { name: String, words: String },
}

impl WordSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        WordSource::Path(path.into())
    }

    pub fn inline(name: impl Into<String>, words: impl Into<String>) -> Self {
        WordSource::Inline {
            name: name.into(),
            words: words.into(),
        }
    }

    /// The embedded base list of common English and programming words.
    pub fn builtin() -> Self {
        Self::inline("builtin", BUILTIN_WORDS)
    }

    pub fn name(&self) -> String {
        match self {
            WordSource::Path(path) => path.display().to_string(),
            WordSource::Inline { name, .. } => name.clone(),
        }
    }

    /// Add this source's normalized words to `out`, returning how many
    /// words the source contributed (duplicates included).
    fn read_into(&self, out: &mut BTreeSet<String>) -> Result<usize, DictionaryLoadError> {
        let io_error = |error| DictionaryLoadError::Io {
            source_name: self.name(),
            error,
        };

        match self {
            WordSource::Inline { words, .. } => Ok(parse_word_list(words, out)),
            WordSource::Path(path) => match extension(path).as_deref() {
                Some("dict") => {
                    let bytes = fs::read(path).map_err(io_error)?;
                    let set = Set::new(bytes).map_err(|error| DictionaryLoadError::Fst {
                        source_name: self.name(),
                        error,
                    })?;
                    let mut count = 0;
                    let mut stream = set.stream();
                    while let Some(key) = stream.next() {
                        if let Ok(word) = std::str::from_utf8(key) {
                            out.insert(word.to_lowercase());
                            count += 1;
                        }
                    }
                    Ok(count)
                }
                Some("gz") => {
                    let file = File::open(path).map_err(io_error)?;
                    let mut content = String::new();
                    GzDecoder::new(file)
                        .read_to_string(&mut content)
                        .map_err(io_error)?;
                    Ok(parse_word_list(&content, out))
                }
                _ => {
                    let content = fs::read_to_string(path).map_err(io_error)?;
                    Ok(parse_word_list(&content, out))
                }
            },
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// One word per line. Blank lines and `#` comments are skipped, and a
/// Hunspell-style `/FLAGS` suffix is dropped.
fn parse_word_list(content: &str, out: &mut BTreeSet<String>) -> usize {
    let mut count = 0;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let word = line.split('/').next().unwrap_or(line).trim();
        if word.is_empty() {
            continue;
        }
        out.insert(word.to_lowercase());
        count += 1;
    }
    count
}

/// Immutable set of known words, normalized to lower case.
///
/// Backed by an FST so lookups cost O(word length) no matter how many
/// words are loaded. Share it across threads behind an `Arc`.
pub struct Dictionary {
    set: Set<Vec<u8>>,
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("words", &self.set.len())
            .finish()
    }
}

impl Dictionary {
    /// Build the union of every source.
    pub fn build(sources: &[WordSource]) -> Result<Self, DictionaryLoadError> {
        if sources.is_empty() {
            return Err(DictionaryLoadError::Empty {
                source_name: "(no word lists)".to_string(),
            });
        }

        let started = Instant::now();
        let mut words = BTreeSet::new();

        for source in sources {
            let count = source.read_into(&mut words)?;
            if count == 0 {
                return Err(DictionaryLoadError::Empty {
                    source_name: source.name(),
                });
            }
            debug!(source = %source.name(), words = count, "loaded word list");
        }

        let set = Set::from_iter(words.iter()).map_err(|error| DictionaryLoadError::Fst {
            source_name: sources
                .iter()
                .map(WordSource::name)
                .collect::<Vec<_>>()
                .join(", "),
            error,
        })?;

        debug!(
            words = set.len(),
            elapsed = ?started.elapsed(),
            "dictionary built"
        );

        Ok(Self { set })
    }

    /// Build from an in-memory word list.
    pub fn from_words<I, S>(words: I) -> Result<Self, DictionaryLoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .collect();
        Self::build(&[WordSource::inline("inline", words.join("\n"))])
    }

    /// Load a compiled dictionary written by [`Dictionary::write_to`].
    pub fn open(path: &Path) -> Result<Self, DictionaryLoadError> {
        let source_name = path.display().to_string();
        let bytes = fs::read(path).map_err(|error| DictionaryLoadError::Io {
            source_name: source_name.clone(),
            error,
        })?;
        let set = Set::new(bytes).map_err(|error| DictionaryLoadError::Fst {
            source_name: source_name.clone(),
            error,
        })?;
        if set.is_empty() {
            return Err(DictionaryLoadError::Empty { source_name });
        }
        Ok(Self { set })
    }

    /// Write the compiled FST so later runs can skip parsing word lists.
    pub fn write_to(&self, output_path: &Path) -> Result<(), DictionaryLoadError> {
        let source_name = output_path.display().to_string();
        let fst_error = |error| DictionaryLoadError::Fst {
            source_name: source_name.clone(),
            error,
        };

        let file = File::create(output_path).map_err(|error| DictionaryLoadError::Io {
            source_name: source_name.clone(),
            error,
        })?;
        let mut builder = SetBuilder::new(BufWriter::new(file)).map_err(fst_error)?;
        let mut stream = self.set.stream();
        while let Some(key) = stream.next() {
            builder.insert(key).map_err(fst_error)?;
        }
        builder.finish().map_err(fst_error)?;

        Ok(())
    }

    /// Check if a word exists in the dictionary, ignoring case
    pub fn contains(&self, word: &str) -> bool {
        let normalized = if word.chars().any(char::is_uppercase) {
            Cow::Owned(word.to_lowercase())
        } else {
            Cow::Borrowed(word)
        };
        self.set.contains(normalized.as_bytes())
    }

    /// Dictionary words within `max_distance` edits of `word`, closest
    /// first and alphabetical among equals.
    ///
    /// This scans the whole dictionary, so only call it for words already
    /// known to be misspelled.
    pub fn suggest(&self, word: &str, max_distance: usize) -> Vec<String> {
        suggestions::generate(self, &word.to_lowercase(), max_distance)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub(crate) fn set(&self) -> &Set<Vec<u8>> {
        &self.set
    }
}
