//! Page model: an HTML template with optional hook elements.
//!
//! The tool writes into four elements located by ID:
//!
//! - `pubs-list` - full list container
//! - `pubs-preview-list` - preview container (first five items)
//! - `year-filter` - year `<select>`, populated with the years present
//! - `type-filter` - type `<select>`, used as-is
//!
//! Every hook is optional. A missing hook disables its feature: no preview,
//! no year options, and the missing selector's value counts as empty.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::filter::{FilterSelection, distinct_years};
use crate::publication::PublicationItem;
use crate::render::{escape_html, render_entries, render_unavailable};

/// Number of items shown in the preview container.
pub const PREVIEW_LIMIT: usize = 5;

/// Template used when none is supplied.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Publications</title>
</head>
<body>
<section id="publications">
<h1>Publications</h1>
<div class="filters">
<label>Year <select id="year-filter"><option value="">All</option></select></label>
<label>Type <select id="type-filter"><option value="">All</option><option value="journal-article">Journal article</option><option value="conference-paper">Conference paper</option><option value="book-chapter">Book chapter</option><option value="preprint">Preprint</option><option value="dissertation-thesis">Thesis</option></select></label>
</div>
<ul id="pubs-list"></ul>
</section>
</body>
</html>
"#;

/// An element the tool writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    List,
    Preview,
    YearFilter,
    TypeFilter,
}

impl Hook {
    pub const ALL: [Hook; 4] = [
        Hook::List,
        Hook::Preview,
        Hook::YearFilter,
        Hook::TypeFilter,
    ];

    /// The element ID this hook is located by.
    #[must_use]
    pub fn element_id(self) -> &'static str {
        match self {
            Self::List => "pubs-list",
            Self::Preview => "pubs-preview-list",
            Self::YearFilter => "year-filter",
            Self::TypeFilter => "type-filter",
        }
    }
}

/// Inner-HTML byte range of a hook in the template, plus its current content.
#[derive(Debug, Clone)]
struct Slot {
    start: usize,
    end: usize,
    /// Content the slot is rebuilt from (template content, plus generated
    /// year options for the year select).
    base: String,
    content: String,
}

/// A parsed template with located hooks.
#[derive(Debug, Clone)]
pub struct Page {
    template: String,
    slots: HashMap<Hook, Slot>,
}

impl Default for Page {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE)
    }
}

impl Page {
    /// Locates every hook in `template`. Hooks that are missing, unclosed or
    /// nested inside another hook are left out.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        let mut slots: HashMap<Hook, Slot> = HashMap::new();

        for hook in Hook::ALL {
            let Some((start, end)) = locate_inner(template, hook.element_id()) else {
                debug!(id = hook.element_id(), "hook not present in template");
                continue;
            };
            if slots
                .values()
                .any(|other| start < other.end && other.start < end)
            {
                warn!(id = hook.element_id(), "hook overlaps another hook; ignoring");
                continue;
            }
            let original = template[start..end].to_string();
            slots.insert(
                hook,
                Slot {
                    start,
                    end,
                    base: original.clone(),
                    content: original,
                },
            );
        }

        Self {
            template: template.to_string(),
            slots,
        }
    }

    /// Whether the template contains the hook.
    #[must_use]
    pub fn has(&self, hook: Hook) -> bool {
        self.slots.contains_key(&hook)
    }

    /// Current inner HTML of a hook.
    #[must_use]
    pub fn content(&self, hook: Hook) -> Option<&str> {
        self.slots.get(&hook).map(|slot| slot.content.as_str())
    }

    /// Populates the page from freshly loaded items.
    ///
    /// Adds one option per distinct year to the year select, renders the full
    /// list with `selection` applied, and renders the preview from the
    /// unfiltered list.
    pub fn mount(&mut self, items: &[PublicationItem], selection: &FilterSelection) {
        if let Some(slot) = self.slots.get_mut(&Hook::YearFilter) {
            for year in distinct_years(items) {
                let year = escape_html(&year);
                let _ = write!(slot.base, "<option value=\"{year}\">{year}</option>");
            }
            slot.content = slot.base.clone();
        }

        self.apply_filters(items, selection);

        if let Some(slot) = self.slots.get_mut(&Hook::Preview) {
            let end = items.len().min(PREVIEW_LIMIT);
            slot.content = render_entries(&items[..end]);
        }
    }

    /// Re-renders the full list for a new selection. The preview is untouched.
    ///
    /// Returns the number of entries rendered, or `None` when the page has no
    /// full list container.
    pub fn apply_filters(
        &mut self,
        items: &[PublicationItem],
        selection: &FilterSelection,
    ) -> Option<usize> {
        let effective = self.effective_selection(selection);

        for (hook, value) in [
            (Hook::YearFilter, &effective.year),
            (Hook::TypeFilter, &effective.kind),
        ] {
            if let Some(slot) = self.slots.get_mut(&hook) {
                slot.content = if value.is_empty() {
                    slot.base.clone()
                } else {
                    mark_selected(&slot.base, value)
                };
            }
        }

        let slot = self.slots.get_mut(&Hook::List)?;
        let filtered = effective.apply(items);
        slot.content = render_entries(&filtered);
        debug!(
            year = %effective.year,
            kind = %effective.kind,
            shown = filtered.len(),
            total = items.len(),
            "rendered full list"
        );
        Some(filtered.len())
    }

    /// Replaces the full list (or the preview, when there is no full list)
    /// with the single "unavailable" entry.
    ///
    /// Returns which hook received the message.
    pub fn show_unavailable(&mut self) -> Option<Hook> {
        let hook = [Hook::List, Hook::Preview]
            .into_iter()
            .find(|hook| self.slots.contains_key(hook))?;
        if let Some(slot) = self.slots.get_mut(&hook) {
            slot.content = render_unavailable();
        }
        Some(hook)
    }

    /// Serializes the template with every hook's current content.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.start);

        let mut out = String::with_capacity(self.template.len());
        let mut cursor = 0;
        for slot in slots {
            out.push_str(&self.template[cursor..slot.start]);
            out.push_str(&slot.content);
            cursor = slot.end;
        }
        out.push_str(&self.template[cursor..]);
        out
    }

    /// A selector that is not on the page contributes no constraint.
    fn effective_selection(&self, selection: &FilterSelection) -> FilterSelection {
        let mut effective = selection.clone();
        if !self.has(Hook::YearFilter) && !effective.year.is_empty() {
            debug!(year = %effective.year, "page has no year filter; ignoring year selection");
            effective.year.clear();
        }
        if !self.has(Hook::TypeFilter) && !effective.kind.is_empty() {
            debug!(kind = %effective.kind, "page has no type filter; ignoring type selection");
            effective.kind.clear();
        }
        effective
    }
}

#[allow(clippy::expect_used)]
static OPTION_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<option\b([^>]*)>").expect("option regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static SELECTED_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+selected(\s*=\s*("[^"]*"|'[^']*'|[^\s>]+))?"#)
        .expect("selected regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static VALUE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\svalue\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("value regex is valid") // Static pattern, safe to panic
});

/// Marks the option whose value equals `value` as selected, clearing any
/// other `selected` attribute.
fn mark_selected(options_html: &str, value: &str) -> String {
    let wanted = escape_html(value);
    OPTION_TAG_RE
        .replace_all(options_html, |caps: &regex::Captures<'_>| {
            let attrs = SELECTED_ATTR_RE.replace_all(&caps[1], "");
            let is_match = VALUE_ATTR_RE.captures(&attrs).is_some_and(|v| {
                v.get(1)
                    .or_else(|| v.get(2))
                    .or_else(|| v.get(3))
                    .is_some_and(|m| m.as_str() == wanted)
            });
            if is_match {
                format!("<option{attrs} selected>")
            } else {
                format!("<option{attrs}>")
            }
        })
        .into_owned()
}

/// Byte range of the inner HTML of the element with the given ID.
fn locate_inner(template: &str, id: &str) -> Option<(usize, usize)> {
    let escaped = regex::escape(id);
    let open_re = Regex::new(&format!(
        r#"(?i)<([a-z][a-z0-9-]*)\b[^>]*\sid\s*=\s*(?:"{escaped}"|'{escaped}')[^>]*>"#
    ))
    .ok()?;
    let open = open_re.captures(template)?;
    let whole = open.get(0)?;
    let tag = open.get(1)?.as_str().to_ascii_lowercase();

    let start = whole.end();
    let tag_re = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(&tag))).ok()?;

    let mut depth = 1usize;
    for m in tag_re.captures_iter(&template[start..]) {
        let full = m.get(0)?;
        if m.get(1).is_some_and(|slash| !slash.as_str().is_empty()) {
            depth -= 1;
            if depth == 0 {
                return Some((start, start + full.start()));
            }
        } else if !full.as_str().ends_with("/>") {
            depth += 1;
        }
    }

    warn!(id, tag = %tag, "hook element is never closed; ignoring");
    None
}
