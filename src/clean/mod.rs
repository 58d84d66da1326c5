//! Turns raw Goodreads entries into posts for one consumer variant.
//!
//! - [`html`] - tolerant reading of the HTML fragments in entry bodies
//! - [`activity`] - recognizing what an entry reports and rendering the post
//!
//! [`Cleaner::transform`] is pure: the same [`RawFeed`] and [`Variant`]
//! always yield the same entries, in source order.
//!
//! # Example
//!
//! ```ignore
//! let cleaner = Cleaner::new("Julien", false)?;
//! let posts = cleaner.transform(&raw_feed, &Variant::twitter());
//! ```

pub mod activity;
pub mod html;

use chrono::{DateTime, Utc};

use crate::config::Variant;
use crate::feed::{RawEntry, RawFeed};
use crate::util::{cap_chars, normalize_whitespace, strip_xml_invalid, truncate_chars, ELLIPSIS};
use activity::{Activity, ActivityMatcher, BookRef, Review};
use html::Fragment;

/// A source entry rewritten for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedEntry {
    /// Source guid plus the variant's id suffix.
    pub id: String,
    pub title: String,
    pub link: String,
    pub updated: DateTime<Utc>,
    /// Entry body as plain text, cut to the variant's snippet limit.
    pub summary: String,
    /// The rendered post, at most the variant's post limit in characters.
    pub content: String,
}

/// Applies the cleaning rules for one reader.
#[derive(Debug, Clone)]
pub struct Cleaner {
    matcher: ActivityMatcher,
    skip_unrecognized: bool,
}

impl Cleaner {
    pub fn new(reader_name: &str, skip_unrecognized: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            matcher: ActivityMatcher::new(reader_name)?,
            skip_unrecognized,
        })
    }

    /// Cleans every entry of `feed` for `variant`, preserving order.
    ///
    /// Entries without a title or link are dropped, as are unrecognized
    /// activities when `skip_unrecognized` is set. Everything else yields
    /// exactly one [`CleanedEntry`].
    pub fn transform(&self, feed: &RawFeed, variant: &Variant) -> Vec<CleanedEntry> {
        let cleaned: Vec<CleanedEntry> = feed
            .entries
            .iter()
            .filter_map(|entry| self.clean_entry(entry, variant))
            .collect();

        let dropped = feed.entries.len() - cleaned.len();
        if dropped > 0 {
            tracing::info!(
                variant = %variant.name,
                dropped = dropped,
                kept = cleaned.len(),
                "Entries excluded from variant"
            );
        }

        cleaned
    }

    fn clean_entry(&self, entry: &RawEntry, variant: &Variant) -> Option<CleanedEntry> {
        let title = normalize_whitespace(&strip_xml_invalid(&entry.title));
        let link = entry.link.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            tracing::warn!(guid = %entry.guid, "Skipping entry without title or link");
            return None;
        }

        let kind = self.matcher.classify(&title);
        if kind == Activity::Other && self.skip_unrecognized {
            tracing::info!(title = %title, "Skipping unrecognized entry");
            return None;
        }

        let frag = Fragment::parse(&entry.html);
        let summary = truncate_chars(&frag.plain_text(), variant.snippet_limit).into_owned();

        let content = match kind {
            Activity::Finished => activity::render_finished(&BookRef::from_anchors(&frag), link),
            Activity::Started => activity::render_started(&BookRef::from_anchors(&frag), link),
            Activity::Progress { percent } => {
                activity::render_progress(&BookRef::from_progress(&frag), percent, link)
            }
            Activity::Review => self.render_review_within(&frag, variant),
            Activity::Other => activity::render_other(&title, &summary, link),
        };

        Some(CleanedEntry {
            id: format!("{}{}", entry.guid, variant.id_suffix),
            title,
            link: link.to_string(),
            updated: entry.published.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            summary,
            content: cap_chars(&content, variant.post_limit).into_owned(),
        })
    }

    /// Renders a review, shortening the snippet by however much the post
    /// runs past the variant's post limit.
    fn render_review_within(&self, frag: &Fragment, variant: &Variant) -> String {
        let review = Review::parse(frag, &self.matcher, variant.snippet_limit);
        let post = activity::render_review(&review);

        let overflow = post.chars().count().saturating_sub(variant.post_limit);
        if overflow == 0 || review.snippet.is_empty() {
            return post;
        }

        // the re-cut snippet may gain an ellipsis
        let shorter = review
            .snippet
            .chars()
            .count()
            .saturating_sub(overflow + ELLIPSIS.chars().count());
        let mut review = Review::parse(frag, &self.matcher, shorter);
        if shorter == 0 {
            review.snippet.clear();
        }
        activity::render_review(&review)
    }
}
