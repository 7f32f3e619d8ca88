use crate::checker::dictionary::{Dictionary, WordSource};
use crate::checker::{CheckOptions, IgnoreList};
use crate::language::{LanguageDescriptor, Languages};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LOCAL_CONFIG_FILE: &str = ".spellcode.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra word lists (plain, `.gz` or compiled `.dict`).
    pub dictionaries: Vec<PathBuf>,
    pub use_builtin_dictionary: bool,
    pub personal_dictionary: Option<PathBuf>,
    pub ignore_words: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub use_default_patterns: bool,
    pub suggest: bool,
    pub max_suggestions: usize,
    pub max_distance: usize,
    pub min_word_length: usize,
    pub check_strings: bool,
    pub threads: Option<usize>,
    /// Extra language descriptors. They take over any builtin extension they list.
    pub languages: Vec<LanguageDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        let options = CheckOptions::default();
        Self {
            dictionaries: Vec::new(),
            use_builtin_dictionary: true,
            personal_dictionary: None,
            ignore_words: Vec::new(),
            ignore_patterns: Vec::new(),
            use_default_patterns: true,
            suggest: options.suggest,
            max_suggestions: options.max_suggestions,
            max_distance: options.max_distance,
            min_word_length: options.min_word_length,
            check_strings: options.check_strings,
            threads: None,
            languages: Vec::new(),
        }
    }
}

/// One config file as written. Scalars stay `None` unless the file sets
/// them, so a later layer can put a value back to its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    dictionaries: Vec<PathBuf>,
    use_builtin_dictionary: Option<bool>,
    personal_dictionary: Option<PathBuf>,
    ignore_words: Vec<String>,
    ignore_patterns: Vec<String>,
    use_default_patterns: Option<bool>,
    suggest: Option<bool>,
    max_suggestions: Option<usize>,
    max_distance: Option<usize>,
    min_word_length: Option<usize>,
    check_strings: Option<bool>,
    threads: Option<usize>,
    languages: Vec<LanguageDescriptor>,
}

impl ConfigLayer {
    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Load configuration with priority: local config > global config > defaults.
    /// CLI overrides are applied by the caller afterwards.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                config = config.apply(ConfigLayer::read(&global_path)?);
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            debug!(path = %local_path.display(), "loading local config");
            config = config.apply(ConfigLayer::read(&local_path)?);
        }

        if config.personal_dictionary.is_none() {
            config.personal_dictionary = Self::default_personal_dict_path().filter(|p| p.exists());
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::default().apply(ConfigLayer::read(path)?))
    }

    /// Lists accumulate; every scalar the layer sets replaces ours.
    fn apply(mut self, layer: ConfigLayer) -> Self {
        self.dictionaries.extend(layer.dictionaries);
        self.ignore_words.extend(layer.ignore_words);
        self.ignore_patterns.extend(layer.ignore_patterns);
        self.languages.extend(layer.languages);

        if let Some(path) = layer.personal_dictionary {
            self.personal_dictionary = Some(path);
        }
        if let Some(threads) = layer.threads {
            self.threads = Some(threads);
        }
        self.use_builtin_dictionary = layer.use_builtin_dictionary.unwrap_or(self.use_builtin_dictionary);
        self.use_default_patterns = layer.use_default_patterns.unwrap_or(self.use_default_patterns);
        self.suggest = layer.suggest.unwrap_or(self.suggest);
        self.max_suggestions = layer.max_suggestions.unwrap_or(self.max_suggestions);
        self.max_distance = layer.max_distance.unwrap_or(self.max_distance);
        self.min_word_length = layer.min_word_length.unwrap_or(self.min_word_length);
        self.check_strings = layer.check_strings.unwrap_or(self.check_strings);
        self
    }

    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            suggest: self.suggest,
            max_suggestions: self.max_suggestions,
            max_distance: self.max_distance,
            min_word_length: self.min_word_length,
            check_strings: self.check_strings,
        }
    }

    pub fn word_sources(&self) -> Vec<WordSource> {
        let mut sources = Vec::new();
        if self.use_builtin_dictionary {
            sources.push(WordSource::builtin());
        }
        sources.extend(self.dictionaries.iter().map(WordSource::path));
        sources
    }

    pub fn build_dictionary(&self) -> Result<Dictionary> {
        Dictionary::build(&self.word_sources()).context("Failed to load dictionary")
    }

    pub fn build_ignore_list(&self) -> Result<IgnoreList> {
        let mut ignore = if self.use_default_patterns {
            IgnoreList::with_default_patterns()
        } else {
            IgnoreList::new()
        };

        ignore.extend_words(&self.ignore_words);
        for pattern in &self.ignore_patterns {
            ignore.add_pattern(pattern);
        }

        if let Some(path) = &self.personal_dictionary {
            match ignore.load_words_file(path) {
                Ok(count) => debug!(path = %path.display(), words = count, "loaded personal dictionary"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "personal dictionary not found");
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to read personal dictionary: {}", path.display())
                    })
                }
            }
        }

        Ok(ignore)
    }

    pub fn build_languages(&self) -> Result<Languages> {
        let mut languages = Languages::builtin().context("Invalid builtin language")?;
        for descriptor in &self.languages {
            languages
                .insert(descriptor)
                .with_context(|| format!("Invalid language '{}' in config", descriptor.name))?;
        }
        Ok(languages)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellcode").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn default_personal_dict_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellcode").map(|dirs| dirs.config_dir().join("personal.txt"))
    }
}
