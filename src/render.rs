use crate::models::{Book, BooksResponse, Statistics};
use crate::session::PageView;
use std::fmt::Write;

pub fn book_line(book: &Book) -> String {
    let authors = if book.authors.is_empty() {
        "unknown author".to_string()
    } else {
        book.authors.join(", ")
    };
    format!(
        "[{:<11}] {} - {} ({})",
        book.reading_status.label(),
        non_empty_or(&book.title, "untitled"),
        authors,
        book.isbn
    )
}

pub fn book_details(book: &Book) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", non_empty_or(&book.title, "untitled"));
    let _ = writeln!(out, "  ISBN:        {}", book.isbn);
    let _ = writeln!(out, "  Authors:     {}", book.authors.join(", "));
    let _ = writeln!(out, "  Status:      {}", book.reading_status.label());
    if !book.categories.is_empty() {
        let _ = writeln!(out, "  Categories:  {}", book.categories.join(", "));
    }
    if let Some(pages) = book.page_count {
        let _ = writeln!(out, "  Pages:       {}", pages);
    }
    for (label, value) in [
        ("Publisher", &book.publisher),
        ("Published", &book.published_date),
        ("Language", &book.language),
        ("Cover", &book.cover_image),
    ] {
        if !value.trim().is_empty() {
            let _ = writeln!(out, "  {:<12} {}", format!("{}:", label), value);
        }
    }
    if !book.description.trim().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", book.description.trim());
    }
    out
}

pub fn page_view(view: &PageView) -> String {
    let mut out = String::new();
    if !view.message.is_empty() {
        let _ = writeln!(out, "{}", view.message);
    }
    if view.books.is_empty() {
        let _ = writeln!(out, "No books found.");
    }
    for book in &view.books {
        let _ = writeln!(out, "{}", book_line(book));
    }
    if view.total_pages > 1 {
        let _ = writeln!(
            out,
            "Page {} of {}{}{}",
            view.page + 1,
            view.total_pages,
            if view.has_prev { "  [prev]" } else { "" },
            if view.has_next { "  [next]" } else { "" }
        );
    }
    out
}

/// Listing from the author/category endpoints, which bypass the session's
/// pager.
pub fn books_response(response: &BooksResponse) -> String {
    let mut out = String::new();
    if !response.message.is_empty() {
        let _ = writeln!(out, "{}", response.message);
    }
    if response.books.is_empty() {
        let _ = writeln!(out, "No books found.");
    }
    for book in &response.books {
        let _ = writeln!(out, "{}", book_line(book));
    }
    out
}

pub fn statistics(stats: &Statistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total books:  {}", stats.total_books);
    let _ = writeln!(
        out,
        "Read:         {} ({:.1}%)",
        stats.read, stats.reading_percentage
    );
    let _ = writeln!(
        out,
        "In progress:  {} ({:.1}%)",
        stats.in_progress, stats.progress_percentage
    );
    let _ = writeln!(out, "Unread:       {}", stats.unread);
    out
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
