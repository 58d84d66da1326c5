//! Regenerates cleaned Goodreads activity feeds for auto-posting services.
//!
//! A run fetches the Goodreads updates feed, rewrites each activity
//! ("finished reading", "is 35% done with", reviews, ...) into a short post
//! sized for each configured consumer, and atomically replaces one Atom file
//! per consumer. See [`pipeline::run`].

pub mod clean;
pub mod config;
pub mod feed;
pub mod pipeline;
pub mod util;
