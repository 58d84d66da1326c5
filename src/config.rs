//! Configuration file parser for `goodreads-cleaner.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`,
//! which is the production setup (one Goodreads feed, Twitter and Threads
//! variants). Unknown keys are ignored by serde, with a warning logged for
//! likely typos.
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "goodreads-cleaner.toml";

const DEFAULT_SOURCE_URL: &str = "https://www.goodreads.com/user/updates_rss/14857928";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Goodreads updates feed to clean.
    pub source_url: String,

    /// Name Goodreads uses in activity titles ("Julien finished reading '...").
    pub reader_name: String,

    /// Author recorded on the generated feeds.
    pub author_name: String,

    /// `xml:lang` of the generated feeds.
    pub language: String,

    /// Append `?nocache=<unix seconds>` to the fetch URL to defeat CDN caching.
    pub cache_bust: bool,

    /// Whole-request timeout for the fetch.
    pub timeout_secs: u64,

    /// Drop entries that are not a recognized reading activity instead of
    /// publishing them as generic updates.
    pub skip_unrecognized: bool,

    /// One output feed per variant.
    pub variants: Vec<Variant>,
}

/// A downstream consumer and its formatting limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variant {
    /// Short name used in logs ("twitter").
    pub name: String,

    /// File the cleaned feed is written to.
    pub output: PathBuf,

    /// `<title>` of the generated feed.
    pub feed_title: String,

    /// Appended to source entry ids so each variant has distinct entry ids.
    pub id_suffix: String,

    /// Maximum characters of review/description text before "..." is added.
    pub snippet_limit: usize,

    /// Hard cap on the characters of a rendered post.
    pub post_limit: usize,

    /// `rel="self"` link of the generated feed. Defaults to the output file name.
    #[serde(default)]
    pub self_link: Option<String>,
}

impl Variant {
    /// The `rel="self"` href: explicit `self_link`, else the output file name.
    pub fn self_href(&self) -> String {
        if let Some(link) = &self.self_link {
            return link.clone();
        }
        self.output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output.display().to_string())
    }

    pub fn twitter() -> Self {
        Self {
            name: "twitter".to_string(),
            output: PathBuf::from("cleaned_goodreads_twitter.xml"),
            feed_title: "Julien’s Goodreads → Twitter Feed".to_string(),
            id_suffix: "-tw".to_string(),
            snippet_limit: 200,
            post_limit: 280,
            self_link: None,
        }
    }

    pub fn threads() -> Self {
        Self {
            name: "threads".to_string(),
            output: PathBuf::from("cleaned_goodreads_threads.xml"),
            feed_title: "Julien’s Goodreads → Threads Feed".to_string(),
            id_suffix: "-th".to_string(),
            snippet_limit: 500,
            post_limit: 500,
            self_link: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            reader_name: "Julien".to_string(),
            author_name: "Julien".to_string(),
            language: "en".to_string(),
            cache_bust: true,
            timeout_secs: 30,
            skip_unrecognized: false,
            variants: vec![Variant::twitter(), Variant::threads()],
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "source_url",
        "reader_name",
        "author_name",
        "language",
        "cache_bust",
        "timeout_secs",
        "skip_unrecognized",
        "variants",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    /// - Semantically invalid values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            source = %config.source_url,
            variants = config.variants.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_url.trim().is_empty() {
            return Err(ConfigError::Invalid("source_url is empty".to_string()));
        }
        if self.variants.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[variants]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut outputs = HashSet::new();
        for variant in &self.variants {
            if !names.insert(variant.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate variant name '{}'",
                    variant.name
                )));
            }
            if !outputs.insert(variant.output.as_path()) {
                return Err(ConfigError::Invalid(format!(
                    "variants share output path '{}'",
                    variant.output.display()
                )));
            }
            if variant.post_limit == 0 {
                return Err(ConfigError::Invalid(format!(
                    "variant '{}' has post_limit = 0",
                    variant.name
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goodreads-cleaner.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.reader_name, "Julien");
        assert!(config.cache_bust);
        assert!(!config.skip_unrecognized);
        assert_eq!(config.variants.len(), 2);
        assert_eq!(config.variants[0].name, "twitter");
        assert_eq!(config.variants[0].snippet_limit, 200);
        assert_eq!(config.variants[1].name, "threads");
        assert_eq!(config.variants[1].snippet_limit, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (_dir, path) = write_config("   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.variants.len(), 2);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (_dir, path) = write_config("reader_name = \"Ada\"\ncache_bust = false\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.reader_name, "Ada");
        assert!(!config.cache_bust);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.variants, vec![Variant::twitter(), Variant::threads()]);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
source_url = "https://example.com/feed.xml"
reader_name = "Ada"
author_name = "Ada L."
language = "fr"
timeout_secs = 5
skip_unrecognized = true

[[variants]]
name = "mastodon"
output = "out/mastodon.xml"
feed_title = "Ada → Mastodon"
id_suffix = "-md"
snippet_limit = 300
post_limit = 500
self_link = "https://example.com/mastodon.xml"
"#;
        let (_dir, path) = write_config(content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.source_url, "https://example.com/feed.xml");
        assert_eq!(config.author_name, "Ada L.");
        assert_eq!(config.language, "fr");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.skip_unrecognized);
        assert_eq!(config.variants.len(), 1);
        let variant = &config.variants[0];
        assert_eq!(variant.output, PathBuf::from("out/mastodon.xml"));
        assert_eq!(variant.self_href(), "https://example.com/mastodon.xml");
    }

    #[test]
    fn test_self_href_defaults_to_file_name() {
        let mut variant = Variant::twitter();
        variant.output = PathBuf::from("/srv/feeds/cleaned_goodreads_twitter.xml");
        assert_eq!(variant.self_href(), "cleaned_goodreads_twitter.xml");
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (_dir, path) = write_config("this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (_dir, path) = write_config("timeout_secs = \"soon\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (_dir, path) = write_config("reader_name = \"Ada\"\ntotally_fake_key = 42\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.reader_name, "Ada");
    }

    #[test]
    fn test_empty_variant_list_rejected() {
        let (_dir, path) = write_config("variants = []\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let mut config = Config::default();
        config.variants[1].output = config.variants[0].output.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("share output path"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut config = Config::default();
        config.variants[1].name = "twitter".to_string();
        config.variants[1].output = PathBuf::from("other.xml");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate variant name"));
    }

    #[test]
    fn test_zero_post_limit_rejected() {
        let mut config = Config::default();
        config.variants[0].post_limit = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (_dir, path) = write_config(&"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
    }
}
