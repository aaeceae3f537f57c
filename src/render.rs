//! HTML rendering of publication entries.
//!
//! Each item becomes one `<li>` holding a `title` div (linked when the item
//! has a URL) and a `meta` div listing year, type and DOI link in that order.
//! Absent fields are left out entirely.

use std::fmt::Write as _;

use crate::publication::{PublicationItem, UNTITLED};

/// Text of the entry shown when publications cannot be loaded.
pub const UNAVAILABLE_MESSAGE: &str = "Publications are unavailable right now.";

/// Renders one `<li>` per item, in order.
#[must_use]
pub fn render_entries(items: &[PublicationItem]) -> String {
    let mut out = String::new();
    for item in items {
        render_entry(&mut out, item);
    }
    out
}

/// The single muted entry used in place of the list after a failed load.
#[must_use]
pub fn render_unavailable() -> String {
    format!("<li class=\"muted\">{UNAVAILABLE_MESSAGE}</li>")
}

/// Work type as displayed: hyphens become spaces.
#[must_use]
pub fn display_kind(kind: &str) -> String {
    kind.replace('-', " ")
}

fn render_entry(out: &mut String, item: &PublicationItem) {
    let title = if item.title.is_empty() {
        UNTITLED
    } else {
        item.title.as_str()
    };

    out.push_str("<li><div class=\"title\">");
    if item.url.is_empty() {
        out.push_str(&escape_html(title));
    } else {
        let _ = write!(
            out,
            "<a href=\"{}\" rel=\"noopener\">{}</a>",
            escape_html(&item.url),
            escape_html(title)
        );
    }
    out.push_str("</div><div class=\"meta\">");

    if !item.year.is_empty() {
        let _ = write!(out, "<span>{}</span>", escape_html(&item.year));
    }
    if !item.kind.is_empty() {
        let _ = write!(out, "<span>{}</span>", escape_html(&display_kind(&item.kind)));
    }
    if let Some(doi_url) = item.doi_url() {
        let _ = write!(
            out,
            "<a href=\"{}\">doi:{}</a>",
            escape_html(&doi_url),
            escape_html(&item.doi)
        );
    }

    out.push_str("</div></li>");
}

/// Escapes text for use in element content and double-quoted attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_title_with_full_meta() {
        let item = PublicationItem::new("A")
            .with_year("2020")
            .with_kind("journal-article")
            .with_url("http://x")
            .with_doi("10.1000/a");
        assert_eq!(
            render_entries(&[item]),
            "<li><div class=\"title\"><a href=\"http://x\" rel=\"noopener\">A</a></div>\
             <div class=\"meta\"><span>2020</span><span>journal article</span>\
             <a href=\"https://doi.org/10.1000/a\">doi:10.1000/a</a></div></li>"
        );
    }

    #[test]
    fn test_plain_title_and_year_only() {
        let item = PublicationItem::new("B").with_year("2019");
        assert_eq!(
            render_entries(&[item]),
            "<li><div class=\"title\">B</div><div class=\"meta\"><span>2019</span></div></li>"
        );
    }

    #[test]
    fn test_meta_order_year_type_doi() {
        let item = PublicationItem::new("C")
            .with_doi("10.1/z")
            .with_kind("book-chapter")
            .with_year("2018");
        let html = render_entries(&[item]);
        let year = html.find("2018").unwrap_or(usize::MAX);
        let kind = html.find("book chapter").unwrap_or(usize::MAX);
        let doi = html.find("doi:10.1/z").unwrap_or(usize::MAX);
        assert!(year < kind && kind < doi, "unexpected order in {html}");
    }

    #[test]
    fn test_no_empty_sub_elements() {
        let html = render_entries(&[PublicationItem::new("D")]);
        assert!(!html.contains("<span></span>"));
        assert!(!html.contains("<span>"));
        assert!(!html.contains("doi:"));
        assert!(html.contains("<div class=\"meta\"></div>"));
    }

    #[test]
    fn test_one_entry_per_item() {
        let items: Vec<PublicationItem> =
            (0..7).map(|i| PublicationItem::new(format!("T{i}"))).collect();
        assert_eq!(render_entries(&items).matches("<li>").count(), 7);
    }

    #[test]
    fn test_blank_title_renders_untitled() {
        let mut item = PublicationItem::new("x");
        item.title = String::new();
        assert!(render_entries(&[item]).contains(">Untitled<"));
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let item = PublicationItem::new("<script>&\"")
            .with_url("http://x/?a=1&b=\"2\"");
        let html = render_entries(&[item]);
        assert!(html.contains("&lt;script&gt;&amp;&quot;"));
        assert!(html.contains("href=\"http://x/?a=1&amp;b=&quot;2&quot;\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_unavailable_entry() {
        assert_eq!(
            render_unavailable(),
            "<li class=\"muted\">Publications are unavailable right now.</li>"
        );
    }

    #[test]
    fn test_display_kind_replaces_every_hyphen() {
        assert_eq!(display_kind("dissertation-thesis-draft"), "dissertation thesis draft");
        assert_eq!(display_kind(""), "");
    }
}
