use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;

pub fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|err| ExtractError::InvalidSelector {
        selector: css,
        message: err.to_string(),
    })
}

/// All descendant text, concatenated and trimmed.
pub fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

pub fn href(element: ElementRef<'_>) -> Option<String> {
    element.value().attr("href").map(|href| href.trim().to_owned())
}

/// Trimmed text of every `p` under `element`, in document order.
pub fn paragraphs(element: ElementRef<'_>, p: &Selector) -> Vec<String> {
    element.select(p).map(text).collect()
}

/// First element matching `target` that comes after `anchor` in document
/// order (descendants of `anchor` included).
pub fn find_next<'a>(
    document: &'a Html,
    anchor: ElementRef<'a>,
    target: &Selector,
) -> Option<ElementRef<'a>> {
    let mut seen_anchor = false;
    for node in document.root_element().descendants() {
        if node.id() == anchor.id() {
            seen_anchor = true;
            continue;
        }
        if !seen_anchor {
            continue;
        }
        if let Some(element) = ElementRef::wrap(node)
            && target.matches(&element)
        {
            return Some(element);
        }
    }
    None
}
