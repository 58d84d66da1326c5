//! Text utilities shared by the cleaner and the Atom writer.
//!
//! - **Whitespace**: collapse runs of whitespace the way feed consumers expect
//! - **Truncation**: character-counted cuts for platform post limits
//! - **XML safety**: drop characters that XML 1.0 forbids
//!
//! # Examples
//!
//! ```
//! use goodreads_cleaner::util::{cap_chars, normalize_whitespace, strip_parenthetical};
//!
//! assert_eq!(normalize_whitespace(" a \n b "), "a b");
//! assert_eq!(strip_parenthetical("Dune (Dune, #1)"), "Dune");
//! assert_eq!(cap_chars("Hello World", 8), "Hello...");
//! ```

mod text;

pub use text::{
    cap_chars, normalize_whitespace, strip_parenthetical, strip_xml_invalid, truncate_chars,
    ELLIPSIS,
};
