//! One cleaning run: fetch → transform → serialize → write.
//!
//! Every variant's document is built in memory before any file is touched,
//! so a failure anywhere before the write phase leaves all outputs as they
//! were.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::clean::Cleaner;
use crate::config::{Config, Variant};
use crate::feed::{self, FeedMeta, FetchError, RawFeed, SerializationError, WriteOutcome};

/// Errors that abort a run. None are retried.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid reader name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to fetch source feed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to build '{variant}' feed: {source}")]
    Serialize {
        variant: String,
        #[source]
        source: SerializationError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one variant's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantReport {
    pub name: String,
    pub path: PathBuf,
    pub entries: usize,
    pub outcome: WriteOutcome,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Entries in the source feed.
    pub fetched: usize,
    pub variants: Vec<VariantReport>,
}

/// A serialized output waiting to be written.
struct Rendered<'a> {
    variant: &'a Variant,
    entries: usize,
    document: String,
}

/// Runs the whole pipeline once.
///
/// # Errors
///
/// - [`RunError::Fetch`] - the source could not be fetched or parsed; no file is touched
/// - [`RunError::Serialize`] - an output document could not be built; no file is touched
/// - [`RunError::Write`] - an output file could not be replaced; outputs of
///   variants listed earlier in the config may already be updated
pub async fn run(config: &Config, client: &reqwest::Client) -> Result<RunReport, RunError> {
    let cleaner = Cleaner::new(&config.reader_name, config.skip_unrecognized)?;

    let cache_bust = config.cache_bust.then(|| Utc::now().timestamp());
    let url = feed::source_url(&config.source_url, cache_bust)?;
    let raw = feed::fetch(client, &url).await?;
    tracing::info!(
        title = raw.title.as_deref().unwrap_or_default(),
        entries = raw.entries.len(),
        "Fetched source feed"
    );

    let rendered = render_all(config, &cleaner, &raw)?;

    let mut variants = Vec::with_capacity(rendered.len());
    for Rendered {
        variant,
        entries,
        document,
    } in rendered
    {
        let outcome = feed::write(&document, &variant.output).map_err(|source| RunError::Write {
            path: variant.output.clone(),
            source,
        })?;
        tracing::info!(
            variant = %variant.name,
            path = %variant.output.display(),
            entries = entries,
            outcome = ?outcome,
            "Output feed updated"
        );
        variants.push(VariantReport {
            name: variant.name.clone(),
            path: variant.output.clone(),
            entries,
            outcome,
        });
    }

    Ok(RunReport {
        fetched: raw.entries.len(),
        variants,
    })
}

fn render_all<'a>(
    config: &'a Config,
    cleaner: &Cleaner,
    raw: &RawFeed,
) -> Result<Vec<Rendered<'a>>, RunError> {
    let source_url = config.source_url.trim();
    let updated = raw
        .entries
        .first()
        .and_then(|e| e.published)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    config
        .variants
        .iter()
        .map(|variant| {
            let entries = cleaner.transform(raw, variant);
            let meta = FeedMeta {
                id: source_url.to_string(),
                title: variant.feed_title.clone(),
                author: config.author_name.clone(),
                alternate: source_url.to_string(),
                self_link: variant.self_href(),
                language: config.language.clone(),
                updated,
            };
            let document =
                feed::serialize(&meta, &entries).map_err(|source| RunError::Serialize {
                    variant: variant.name.clone(),
                    source,
                })?;
            tracing::debug!(variant = %variant.name, entries = entries.len(), "Rendered variant");
            Ok(Rendered {
                variant,
                entries: entries.len(),
                document,
            })
        })
        .collect()
}
