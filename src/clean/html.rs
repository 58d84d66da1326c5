//! Queries over the HTML fragments embedded in feed descriptions.
//!
//! Feed bodies are HTML, not XML: `<br>` is never closed, named entities
//! like `&nbsp;` are common and attributes may be unquoted. Fragments are
//! parsed with `scraper`, which never fails on malformed markup.

use scraper::{CaseSensitivity, ElementRef, Html, Selector};

use crate::util::normalize_whitespace;

/// Elements whose content is not document text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A parsed HTML fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    html: Html,
}

impl Fragment {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// All text nodes, each trimmed, empty ones dropped, joined by `separator`.
    pub fn text(&self, separator: &str) -> String {
        visible_text(self.html.root_element())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// The fragment as one line of plain text.
    pub fn plain_text(&self) -> String {
        normalize_whitespace(&self.text(" "))
    }

    /// Text inside the first `<a>` carrying `class`.
    ///
    /// Nested text is trimmed piecewise and joined without separators.
    pub fn anchor_text(&self, class: &str) -> Option<String> {
        let anchors = Selector::parse("a[class]").ok()?;
        let anchor = self
            .html
            .select(&anchors)
            .find(|a| a.value().has_class(class, CaseSensitivity::CaseSensitive))?;

        Some(
            visible_text(anchor)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// The `alt` text of the first `<img>` whose alt contains `needle`.
    pub fn img_alt_containing(&self, needle: &str) -> Option<&str> {
        let images = Selector::parse("img[alt]").ok()?;
        self.html
            .select(&images)
            .filter_map(|img| img.value().attr("alt"))
            .find(|alt| alt.contains(needle))
    }

    /// Text of the siblings that follow the first `<br>`.
    ///
    /// Only siblings are read, so collection ends where the `<br>`'s parent
    /// closes. Returns an empty string when the fragment has no `<br>`.
    pub fn text_after_first_br(&self) -> String {
        let Ok(br) = Selector::parse("br") else {
            return String::new();
        };
        let Some(first_br) = self.html.select(&br).next() else {
            return String::new();
        };

        let mut pieces = Vec::new();
        for sibling in first_br.next_siblings() {
            if let Some(text) = sibling.value().as_text() {
                pieces.push(&**text);
            } else if let Some(element) = ElementRef::wrap(sibling) {
                pieces.extend(visible_text(element));
            }
        }

        let pieces: Vec<&str> = pieces
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        normalize_whitespace(&pieces.join(" "))
    }
}

/// Text nodes under `element` in document order, skipping script and style bodies.
fn visible_text<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .is_some_and(|parent| RAW_TEXT_ELEMENTS.contains(&parent.name()));
        (!hidden).then_some(&**text)
    })
}
