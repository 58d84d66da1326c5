use std::borrow::Cow;

/// Marker appended to text that was cut short.
pub const ELLIPSIS: &str = "...";
/// Length of [`ELLIPSIS`] in characters.
const ELLIPSIS_LEN: usize = 3;

/// Collapses every run of whitespace into a single space and trims both ends.
///
/// Unicode whitespace counts, so non-breaking spaces decoded from `&nbsp;`
/// collapse the same way as ASCII spaces and newlines.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates a string to `max_chars` characters, appending "..." when cut.
///
/// The kept prefix is right-trimmed before the ellipsis is added, so the
/// result may be up to `max_chars + 3` characters long. Counting is by
/// `char`, matching how posting platforms count text (not bytes, not
/// terminal columns).
///
/// # Examples
///
/// ```
/// use goodreads_cleaner::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 6), "Hello...");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => Cow::Owned(format!("{}{}", s[..cut].trim_end(), ELLIPSIS)),
    }
}

/// Caps a string at `limit` characters, ellipsis included.
///
/// Unlike [`truncate_chars`] the result never exceeds `limit`. For limits too
/// small to hold the ellipsis, the first `limit` characters are returned as-is.
pub fn cap_chars(s: &str, limit: usize) -> Cow<'_, str> {
    if s.chars().count() <= limit {
        return Cow::Borrowed(s);
    }
    if limit <= ELLIPSIS_LEN {
        return Cow::Owned(s.chars().take(limit).collect());
    }
    truncate_chars(s, limit - ELLIPSIS_LEN)
}

/// Removes every `(...)` segment and the whitespace leading into it.
///
/// Goodreads appends series information to titles ("Dune (Dune, #1)"),
/// which is noise in a post. Segments are matched lazily up to the first
/// closing parenthesis; an unclosed "(" is left alone.
pub fn strip_parenthetical(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut rest = title;

    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        out.push_str(rest[..open].trim_end());
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Strips characters that are not allowed in an XML 1.0 document.
///
/// Drops C0 control characters other than tab, newline and carriage return,
/// plus the non-characters U+FFFE and U+FFFF. Feed bodies occasionally carry
/// stray control bytes; written verbatim they would make the output feed
/// unparseable.
///
/// Returns `Cow::Borrowed` when nothing needs removing (the common case).
pub fn strip_xml_invalid(s: &str) -> Cow<'_, str> {
    fn is_invalid(c: char) -> bool {
        (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
    }

    if !s.chars().any(is_invalid) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().filter(|&c| !is_invalid(c)).collect())
}
