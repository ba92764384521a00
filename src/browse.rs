//! Line-oriented browsing loop over a single session, so paging and filter
//! changes reuse cached pages the way a long-lived client would.

use crate::api::LibraryBackend;
use crate::error::LibraryError;
use crate::filters::{SearchFilters, SortKey};
use crate::render;
use crate::session::LibrarySession;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  next | prev | page N         move through results
  search key=value ...         query, title, author, category, status, sort
  clear                        drop all filters
  sort title_asc|title_desc|none
  show ISBN | cycle ISBN | toggle ISBN
  stats | refresh | help | quit";

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Show,
    Next,
    Prev,
    Page(usize),
    Search(Vec<(String, String)>),
    Clear,
    Sort(SortKey),
    Book(String),
    Cycle(String),
    Toggle(String),
    Stats,
    Refresh,
    Help,
    Quit,
}

fn parse_action(line: &str) -> Result<Action, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Action::Show);
    };
    let rest = words.collect::<Vec<_>>();
    let single = |name: &str| -> Result<String, String> {
        match rest.as_slice() {
            [value] => Ok(value.to_string()),
            _ => Err(format!("usage: {} ISBN", name)),
        }
    };
    match command.to_ascii_lowercase().as_str() {
        "n" | "next" => Ok(Action::Next),
        "p" | "prev" => Ok(Action::Prev),
        "page" => match rest.as_slice() {
            [value] => value
                .parse::<usize>()
                .ok()
                .filter(|page| *page > 0)
                .map(Action::Page)
                .ok_or_else(|| format!("not a page number: {}", value)),
            _ => Err("usage: page N".to_string()),
        },
        "search" | "filter" => {
            let mut pairs = vec![];
            for part in &rest {
                let (key, value) = part
                    .split_once('=')
                    .ok_or_else(|| format!("expected key=value, got \"{}\"", part))?;
                pairs.push((key.to_string(), value.replace('+', " ")));
            }
            Ok(Action::Search(pairs))
        }
        "clear" => Ok(Action::Clear),
        "sort" => match rest.as_slice() {
            [value] => value.parse().map(Action::Sort),
            [] => Ok(Action::Sort(SortKey::Server)),
            _ => Err("usage: sort title_asc|title_desc|none".to_string()),
        },
        "show" => single("show").map(Action::Book),
        "cycle" => single("cycle").map(Action::Cycle),
        "toggle" => single("toggle").map(Action::Toggle),
        "stats" => Ok(Action::Stats),
        "refresh" | "r" => Ok(Action::Refresh),
        "help" | "?" => Ok(Action::Help),
        "quit" | "exit" | "q" => Ok(Action::Quit),
        other => Err(format!("unknown command \"{}\" (try help)", other)),
    }
}

pub fn run_browse<B, R, W>(
    session: &mut LibrarySession<B>,
    input: R,
    output: &mut W,
) -> io::Result<()>
where
    B: LibraryBackend,
    R: BufRead,
    W: Write,
{
    show_page(session, output)?;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let action = match parse_action(&line) {
            Ok(action) => action,
            Err(message) => {
                writeln!(output, "{}", message)?;
                write!(output, "> ")?;
                output.flush()?;
                continue;
            }
        };
        if action == Action::Quit {
            break;
        }
        handle(session, action, output)?;
        write!(output, "> ")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

fn handle<B: LibraryBackend, W: Write>(
    session: &mut LibrarySession<B>,
    action: Action,
    output: &mut W,
) -> io::Result<()> {
    match action {
        Action::Show => show_page(session, output),
        Action::Next => {
            if session.next_page() {
                show_page(session, output)
            } else {
                writeln!(output, "already on the last page")
            }
        }
        Action::Prev => {
            if session.prev_page() {
                show_page(session, output)
            } else {
                writeln!(output, "already on the first page")
            }
        }
        Action::Page(page) => match session.jump_to(page - 1) {
            Ok(()) => show_page(session, output),
            Err(err) => notify(output, &err),
        },
        Action::Search(pairs) => {
            let mut filters = session.filters().clone();
            for (key, value) in &pairs {
                if let Err(message) = filters.set(key, value) {
                    return writeln!(output, "{}", message);
                }
            }
            session.apply_filters(filters);
            show_page(session, output)
        }
        Action::Clear => {
            session.apply_filters(SearchFilters::default());
            show_page(session, output)
        }
        Action::Sort(sort) => {
            session.set_sort(sort);
            show_page(session, output)
        }
        Action::Book(isbn) => match session.book(&isbn) {
            Ok(book) => write!(output, "{}", render::book_details(&book)),
            Err(err) => notify(output, &err),
        },
        Action::Cycle(isbn) => match session.cycle_status(&isbn) {
            Ok(status) => {
                writeln!(output, "{} is now {}", isbn, status.label())?;
                show_page(session, output)
            }
            Err(err) => notify(output, &err),
        },
        Action::Toggle(isbn) => match session.toggle_read(&isbn) {
            Ok(status) => {
                writeln!(output, "{} is now {}", isbn, status.label())?;
                show_page(session, output)
            }
            Err(err) => notify(output, &err),
        },
        Action::Stats => match session.statistics() {
            Ok(stats) => write!(output, "{}", render::statistics(&stats)),
            Err(err) => notify(output, &err),
        },
        Action::Refresh => {
            session.refresh();
            show_page(session, output)
        }
        Action::Help => writeln!(output, "{}", HELP),
        Action::Quit => Ok(()),
    }
}

fn show_page<B: LibraryBackend, W: Write>(
    session: &mut LibrarySession<B>,
    output: &mut W,
) -> io::Result<()> {
    let active = session.filters().active_count();
    if active > 0 {
        let plural = if active == 1 { "" } else { "s" };
        writeln!(output, "({} filter{} active)", active, plural)?;
    }
    match session.current_page() {
        Ok(view) => write!(output, "{}", render::page_view(&view)),
        Err(err) => notify(output, &err),
    }
}

fn notify<W: Write>(output: &mut W, err: &LibraryError) -> io::Result<()> {
    log::debug!("browse action failed: {:?}", err);
    writeln!(output, "error: {}", err)
}
