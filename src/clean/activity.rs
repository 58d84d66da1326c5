//! Goodreads activity recognition and post rendering.
//!
//! The updates feed mixes several kinds of activity, told apart only by the
//! entry title ("Julien finished reading 'Dune'", "Julien is 35% done with
//! Dune", ...). Each kind is rendered into a short emoji-prefixed post.

use regex::Regex;

use super::html::Fragment;
use crate::util::{normalize_whitespace, strip_parenthetical, truncate_chars};

const PROGRESS_BAR_CELLS: usize = 20;

/// What a feed entry reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Finished,
    Started,
    Progress { percent: u32 },
    Review,
    Other,
}

/// Title and rating patterns for one reader.
#[derive(Debug, Clone)]
pub struct ActivityMatcher {
    finished: Regex,
    started: Regex,
    progress: Regex,
    review: Regex,
    rating: Regex,
}

impl ActivityMatcher {
    /// Compiles the patterns for titles written about `reader_name`.
    pub fn new(reader_name: &str) -> Result<Self, regex::Error> {
        let name = regex::escape(reader_name);
        Ok(Self {
            finished: Regex::new(&format!("^{} finished reading '", name))?,
            started: Regex::new(&format!("^{} (?:is currently|started) reading '", name))?,
            progress: Regex::new(r"(\d+)% done with (.+)")?,
            review: Regex::new(&format!("^{} added '", name))?,
            rating: Regex::new(r"gave (\d+) stars")?,
        })
    }

    /// Classifies an entry by its title. Patterns are tried in a fixed order;
    /// the first match wins.
    pub fn classify(&self, title: &str) -> Activity {
        if self.finished.is_match(title) {
            return Activity::Finished;
        }
        if self.started.is_match(title) {
            return Activity::Started;
        }
        if let Some(caps) = self.progress.captures(title) {
            if let Ok(percent) = caps[1].parse() {
                return Activity::Progress { percent };
            }
        }
        if self.review.is_match(title) {
            return Activity::Review;
        }
        Activity::Other
    }

    /// Star rating from "... gave 4 stars to ..." in a review body.
    fn rating(&self, text: &str) -> Option<u32> {
        self.rating
            .captures(text)
            .and_then(|caps| caps[1].parse().ok())
    }
}

/// A book and its author as named in an entry body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookRef {
    pub book: String,
    pub author: String,
}

impl BookRef {
    /// From the `bookTitle`/`authorName` anchors Goodreads puts in every body.
    pub fn from_anchors(frag: &Fragment) -> Self {
        Self {
            book: frag
                .anchor_text("bookTitle")
                .map(|t| strip_parenthetical(&t))
                .unwrap_or_default(),
            author: frag.anchor_text("authorName").unwrap_or_default(),
        }
    }

    /// Progress updates often lack the anchors but carry a cover image whose
    /// alt text reads "<book> by <author>".
    pub fn from_progress(frag: &Fragment) -> Self {
        if let Some((book, author)) = frag
            .img_alt_containing(" by ")
            .and_then(|alt| alt.split_once(" by "))
        {
            return Self {
                book: strip_parenthetical(book),
                author: author.trim().to_string(),
            };
        }
        Self::from_anchors(frag)
    }

    /// Author name without spaces, or `None` when the author is unknown.
    fn hashtag(&self) -> Option<String> {
        let tag: String = self.author.chars().filter(|c| *c != ' ').collect();
        (!tag.is_empty()).then(|| format!("#{}", tag))
    }

    fn headline(&self) -> String {
        format!("“{}” by {}", self.book, self.author)
    }
}

/// A review, with the snippet already cut to the requested limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub book: BookRef,
    pub rating: Option<u32>,
    pub snippet: String,
}

impl Review {
    pub fn parse(frag: &Fragment, matcher: &ActivityMatcher, snippet_limit: usize) -> Self {
        let snippet = normalize_whitespace(&frag.text_after_first_br());
        Self {
            book: BookRef::from_anchors(frag),
            rating: matcher.rating(&frag.text("\n")),
            snippet: truncate_chars(&snippet, snippet_limit).into_owned(),
        }
    }
}

pub fn render_finished(book: &BookRef, link: &str) -> String {
    let mut lines = vec![
        format!("📘 Finished {}", book.headline()),
        format!("🔗 {}", link),
    ];
    if let Some(tag) = book.hashtag() {
        lines.push(format!("🏷️ {}", tag));
    }
    lines.join("\n")
}

pub fn render_started(book: &BookRef, link: &str) -> String {
    [
        format!("🚀 Starting {}", book.headline()),
        format!("🔗 Follow my progress: {}", link),
        tag_line(book, "#NowReading"),
    ]
    .join("\n")
}

pub fn render_progress(book: &BookRef, percent: u32, link: &str) -> String {
    [
        format!("📈 I’ve read {}% of {}", percent, book.headline()),
        progress_bar(percent),
        format!("🔗 Progress: {}", link),
        tag_line(book, "#ReadingProgress"),
    ]
    .join("\n")
}

pub fn render_review(review: &Review) -> String {
    let mut lines = vec![format!("📚 {}", review.book.headline())];
    if let Some(rating) = review.rating {
        lines.push(format!("⭐️ Rated: {}/5", rating));
    }
    if !review.snippet.is_empty() {
        lines.push(format!("📝 \"{}\"", review.snippet));
    }
    if let Some(tag) = review.book.hashtag() {
        lines.push(format!("🏷️ {}", tag));
    }
    lines.join("\n")
}

/// Fallback for entries that are not a recognized reading activity.
pub fn render_other(title: &str, summary: &str, link: &str) -> String {
    let mut lines = vec![format!("📰 {}", title)];
    if !summary.is_empty() {
        lines.push(format!("📝 \"{}\"", summary));
    }
    lines.push(format!("🔗 {}", link));
    lines.join("\n")
}

fn tag_line(book: &BookRef, fixed: &str) -> String {
    match book.hashtag() {
        Some(tag) => format!("🏷️ {} {}", tag, fixed),
        None => format!("🏷️ {}", fixed),
    }
}

/// Twenty-cell bar: `▓` per full 5%, `░` for the rest, then the percentage.
pub fn progress_bar(percent: u32) -> String {
    let filled = ((percent as usize) * PROGRESS_BAR_CELLS / 100).min(PROGRESS_BAR_CELLS);
    format!(
        "{}{}  {:.2}%",
        "▓".repeat(filled),
        "░".repeat(PROGRESS_BAR_CELLS - filled),
        f64::from(percent)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matcher() -> ActivityMatcher {
        ActivityMatcher::new("Julien").unwrap()
    }

    fn dune() -> BookRef {
        BookRef {
            book: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
        }
    }

    #[test]
    fn test_classify() {
        let m = matcher();
        assert_eq!(m.classify("Julien finished reading 'Dune'"), Activity::Finished);
        assert_eq!(m.classify("Julien started reading 'Dune'"), Activity::Started);
        assert_eq!(
            m.classify("Julien is currently reading 'Dune'"),
            Activity::Started
        );
        assert_eq!(
            m.classify("Julien is 35% done with Dune"),
            Activity::Progress { percent: 35 }
        );
        assert_eq!(m.classify("Julien added 'Dune'"), Activity::Review);
        assert_eq!(m.classify("Julien liked a quote"), Activity::Other);
    }

    #[test]
    fn test_classify_is_anchored_to_reader() {
        let m = matcher();
        assert_eq!(m.classify("Marie finished reading 'Dune'"), Activity::Other);
        assert_eq!(m.classify("Re: Julien added 'Dune'"), Activity::Other);
        // progress is matched anywhere in the title
        assert_eq!(
            m.classify("Marie is 10% done with Dune"),
            Activity::Progress { percent: 10 }
        );
    }

    #[test]
    fn test_reader_name_is_escaped() {
        let m = ActivityMatcher::new("J.R. (Bob)").unwrap();
        assert_eq!(m.classify("J.R. (Bob) added 'Emma'"), Activity::Review);
        assert_eq!(m.classify("JxR. (Bob) added 'Emma'"), Activity::Other);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), format!("{}  0.00%", "░".repeat(20)));
        assert_eq!(
            progress_bar(35),
            format!("{}{}  35.00%", "▓".repeat(7), "░".repeat(13))
        );
        assert_eq!(progress_bar(100), format!("{}  100.00%", "▓".repeat(20)));
        assert_eq!(progress_bar(250), format!("{}  250.00%", "▓".repeat(20)));
    }

    #[test]
    fn test_render_finished() {
        assert_eq!(
            render_finished(&dune(), "https://gr/1"),
            "📘 Finished “Dune” by Frank Herbert\n🔗 https://gr/1\n🏷️ #FrankHerbert"
        );
    }

    #[test]
    fn test_render_started_and_progress() {
        assert_eq!(
            render_started(&dune(), "https://gr/1"),
            "🚀 Starting “Dune” by Frank Herbert\n🔗 Follow my progress: https://gr/1\n🏷️ #FrankHerbert #NowReading"
        );
        let progress = render_progress(&dune(), 35, "https://gr/2");
        let lines: Vec<_> = progress.lines().collect();
        assert_eq!(lines[0], "📈 I’ve read 35% of “Dune” by Frank Herbert");
        assert_eq!(lines[1], progress_bar(35));
        assert_eq!(lines[2], "🔗 Progress: https://gr/2");
        assert_eq!(lines[3], "🏷️ #FrankHerbert #ReadingProgress");
    }

    #[test]
    fn test_unknown_author_drops_hashtag() {
        let book = BookRef {
            book: "Dune".to_string(),
            author: String::new(),
        };
        assert!(!render_finished(&book, "l").contains("🏷️"));
        assert!(render_started(&book, "l").ends_with("🏷️ #NowReading"));
    }

    #[test]
    fn test_review_parse_and_render() {
        let html = r#"<a class="bookTitle" href="/b">Dune (Dune, #1)</a> by <a class="authorName" href="/a">Frank Herbert</a>
Julien gave 4 stars<br/>A sprawling   epic about spice, politics and ecology."#;
        let frag = Fragment::parse(html);

        let review = Review::parse(&frag, &matcher(), 200);
        assert_eq!(review.book, dune());
        assert_eq!(review.rating, Some(4));
        assert_eq!(review.snippet, "A sprawling epic about spice, politics and ecology.");
        assert_eq!(
            render_review(&review),
            "📚 “Dune” by Frank Herbert\n⭐️ Rated: 4/5\n📝 \"A sprawling epic about spice, politics and ecology.\"\n🏷️ #FrankHerbert"
        );

        let short = Review::parse(&frag, &matcher(), 11);
        assert_eq!(short.snippet, "A sprawling...");
    }

    #[test]
    fn test_review_without_rating_or_snippet() {
        let frag = Fragment::parse(r#"<a class="bookTitle">Emma</a> by <a class="authorName">Jane Austen</a>"#);
        let review = Review::parse(&frag, &matcher(), 200);
        assert_eq!(review.rating, None);
        assert_eq!(render_review(&review), "📚 “Emma” by Jane Austen\n🏷️ #JaneAusten");
    }

    #[test]
    fn test_book_from_progress_prefers_img_alt() {
        let frag = Fragment::parse(
            r#"<img alt="Project Hail Mary (Hardcover) by Andy Weir " src="x.jpg"><a class="bookTitle">Other</a>"#,
        );
        assert_eq!(
            BookRef::from_progress(&frag),
            BookRef {
                book: "Project Hail Mary".to_string(),
                author: "Andy Weir".to_string(),
            }
        );

        let fallback = Fragment::parse(r#"<a class="bookTitle">Emma</a><a class="authorName">Jane Austen</a>"#);
        assert_eq!(BookRef::from_progress(&fallback).book, "Emma");
    }
}
