//! Helper functions shared by the source parsers
//!
//! - DOM text extraction (full text, own text, first attribute, comma-joined lists)
//! - Canonical path normalization
//! - Small string clean-ups applied to scraped fields
//!
//! # Examples
//!
//! ```
//! use scanmanga::helpers::{strip_trailing_comma, url_without_domain};
//!
//! assert_eq!(url_without_domain("https://www.scan-manga.com/a/b.html?x=1"), "/a/b.html?x=1");
//! assert_eq!(strip_trailing_comma("Une histoire,"), "Une histoire");
//! ```

use reqwest::Url;
use scraper::{ElementRef, Selector};

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the element and all its descendants.
pub fn element_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Text of the element's direct text children only, nested element text excluded.
pub fn own_text(element: ElementRef) -> String {
    let text: String = element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect();
    normalize_whitespace(&text)
}

/// Text of every match, space separated.
pub fn select_text(root: ElementRef, selector: &Selector) -> String {
    let texts: Vec<String> = root
        .select(selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    texts.join(" ")
}

/// Value of `attr` on the first match that carries it, or an empty string.
pub fn select_attr(root: ElementRef, selector: &Selector, attr: &str) -> String {
    root.select(selector)
        .find_map(|element| element.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}

/// Text of every match, joined with ", ".
pub fn join_texts(root: ElementRef, selector: &Selector) -> String {
    root.select(selector)
        .map(element_text)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Strip scheme and host from an absolute URL, keeping path, query and fragment.
/// Relative URLs are returned unchanged.
pub fn url_without_domain(href: &str) -> String {
    let href = href.trim();
    match Url::parse(href) {
        Ok(url) => {
            let mut out = url.path().to_string();
            if let Some(query) = url.query() {
                out.push('?');
                out.push_str(query);
            }
            if let Some(fragment) = url.fragment() {
                out.push('#');
                out.push_str(fragment);
            }
            out
        }
        Err(_) => href.to_string(),
    }
}

/// Remove a single trailing comma left over by the site's description markup.
pub fn strip_trailing_comma(description: &str) -> &str {
    description.strip_suffix(',').unwrap_or(description)
}

pub fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_own_text_skips_nested_elements() {
        let html = Html::parse_fragment(r#"<a class="infoBulle"> Action <span>12</span> </a>"#);
        let selector = Selector::parse("a").unwrap();
        let anchor = html.select(&selector).next().unwrap();
        assert_eq!(own_text(anchor), "Action");
        assert_eq!(element_text(anchor), "Action 12");
    }

    #[test]
    fn test_select_attr_uses_first_element_with_attribute() {
        let html = Html::parse_document(
            r#"<div><img src="a.jpg"><img data-original="b.jpg"><img data-original="c.jpg"></div>"#,
        );
        let selector = Selector::parse("img").unwrap();
        assert_eq!(select_attr(html.root_element(), &selector, "data-original"), "b.jpg");
        assert_eq!(select_attr(html.root_element(), &selector, "title"), "");
    }

    #[test]
    fn test_join_texts() {
        let html = Html::parse_document(
            r#"<ul><li><a>Oda</a></li><li><a> Eiichiro  Oda </a></li></ul>"#,
        );
        let selector = Selector::parse("li a").unwrap();
        assert_eq!(join_texts(html.root_element(), &selector), "Oda, Eiichiro Oda");
    }

    #[test]
    fn test_url_without_domain() {
        assert_eq!(
            url_without_domain("https://www.scan-manga.com/10/One-Piece.html"),
            "/10/One-Piece.html"
        );
        assert_eq!(
            url_without_domain("https://m.scan-manga.com/lecture/1.html#top"),
            "/lecture/1.html#top"
        );
        assert_eq!(url_without_domain("/deja/relatif.html"), "/deja/relatif.html");
    }

    #[test]
    fn test_strip_trailing_comma_only_once() {
        assert_eq!(strip_trailing_comma("Résumé,"), "Résumé");
        assert_eq!(strip_trailing_comma("Résumé,,"), "Résumé,");
        assert_eq!(strip_trailing_comma("Résumé"), "Résumé");
        let once = strip_trailing_comma("Résumé,");
        assert_eq!(strip_trailing_comma(once), once);
    }
}
