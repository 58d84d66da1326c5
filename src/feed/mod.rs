//! Source feed retrieval and output feed generation.
//!
//! - **Fetching**: one HTTP GET with size and timeout limits, no retries
//! - **Parsing**: RSS/Atom into [`RawFeed`] using the `feed-rs` crate
//! - **Atom output**: [`serialize`] cleaned entries and [`write`] them atomically
//!
//! # Architecture
//!
//! - [`fetcher`] - HTTP client setup, cache-busting URL, body limits
//! - [`parser`] - `feed-rs` model to [`RawFeed`], stable ids for id-less entries
//! - [`atom`] - `quick-xml` Atom writer and write-to-temp-then-rename

mod atom;
mod fetcher;
mod parser;

pub use atom::{serialize, write, FeedMeta, SerializationError, WriteOutcome};
pub use fetcher::{build_client, fetch, source_url, FetchError};
pub use parser::{parse_feed, ParseError, RawEntry, RawFeed};
