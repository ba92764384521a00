use crate::filters::SortKey;
use crate::models::Book;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Reorders one fetched page for display. Stable, so sorting twice changes
/// nothing.
pub fn sort_page(books: &mut [Book], key: SortKey) {
    match key {
        SortKey::Server => {}
        SortKey::TitleAsc => books.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortKey::TitleDesc => books.sort_by(|a, b| compare_titles(&b.title, &a.title)),
    }
}

/// Accent- and case-insensitive first, raw text as tie-break, so "Émile"
/// sits next to "emile" instead of after "zebra".
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}
