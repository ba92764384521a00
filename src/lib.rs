use clap::Parser;
use rusqlite::Connection;
use std::io;
use std::process::ExitCode;

pub mod api;
pub mod auth;
pub mod browse;
pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod filters;
pub mod isbn;
pub mod models;
pub mod pagination;
pub mod render;
pub mod session;
pub mod sorter;
pub mod status;

use crate::api::LibraryApi;
use crate::auth::{display_name, AccessPolicy};
use crate::cli::{Cli, Command, ListArgs, LoginArgs};
use crate::config::Config;
use crate::error::{LibraryError, Result};
use crate::models::UserProfile;
use crate::session::LibrarySession;

fn resolve_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        config.api_base_url = url.to_string();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

fn open_store(config: &Config) -> Result<Connection> {
    db::open_db(&config.db_path())
}

fn open_session(config: &Config, conn: &Connection) -> Result<LibrarySession<LibraryApi>> {
    let api = LibraryApi::new(&config.api_base_url, config.http_timeout)?;
    let viewer = db::load_profile(conn)?.map(|stored| stored.profile);
    let policy = AccessPolicy::new(&config.authorized_emails);
    log::debug!(
        "session api={} viewer={}",
        api.base_url(),
        viewer.as_ref().map(|profile| profile.email.as_str()).unwrap_or("-")
    );
    Ok(LibrarySession::new(api, config.page_size).with_access(viewer, policy))
}

fn list_books(session: &mut LibrarySession<LibraryApi>, args: &ListArgs) -> Result<()> {
    session.apply_filters(args.filters());
    if args.page > 1 {
        // The page count is only known after the first response.
        session.current_page()?;
        session.jump_to(args.page - 1)?;
    }
    let view = session.current_page()?;
    print!("{}", render::page_view(&view));
    Ok(())
}

fn login(conn: &Connection, config: &Config, args: LoginArgs) -> Result<()> {
    let profile = UserProfile {
        id: args.id.trim().to_string(),
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        picture: args.picture.trim().to_string(),
    };
    if profile.id.is_empty() || profile.email.is_empty() {
        return Err(LibraryError::NotSignedIn);
    }
    db::save_profile(conn, &profile)?;
    println!("Signed in as {} <{}>", display_name(&profile), profile.email);
    if !AccessPolicy::new(&config.authorized_emails).is_email_authorized(&profile.email) {
        println!("This account can browse but not change the library.");
    }
    Ok(())
}

fn whoami(conn: &Connection, config: &Config) -> Result<()> {
    match db::load_profile(conn)? {
        Some(stored) => {
            let policy = AccessPolicy::new(&config.authorized_emails);
            println!(
                "{} <{}> signed in {}{}",
                display_name(&stored.profile),
                stored.profile.email,
                stored.signed_in_at.format("%Y-%m-%d %H:%M UTC"),
                if policy.is_email_authorized(&stored.profile.email) {
                    ""
                } else {
                    " (read-only)"
                }
            );
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

fn execute(cli: Cli, config: &Config) -> Result<()> {
    let conn = open_store(config)?;
    match cli.command {
        Command::Login(args) => return login(&conn, config, args),
        Command::Logout => {
            if db::clear_profile(&conn)? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
            return Ok(());
        }
        Command::Whoami => return whoami(&conn, config),
        _ => {}
    }

    let mut session = open_session(config, &conn)?;
    match cli.command {
        Command::List(args) => list_books(&mut session, &args)?,
        Command::Show { isbn } => print!("{}", render::book_details(&session.book(&isbn)?)),
        Command::Add { isbn } => {
            let book = session.add_book(&isbn)?;
            println!("Added {}", render::book_line(&book));
        }
        Command::Edit(args) => {
            let book = session.update_book(&args.isbn, &args.update())?;
            println!("Updated {}", render::book_line(&book));
        }
        Command::Delete { isbn } => {
            let message = session.delete_book(&isbn)?;
            println!("{}", if message.is_empty() { "Deleted." } else { message.as_str() });
        }
        Command::Cycle { isbn } => {
            let status = session.cycle_status(&isbn)?;
            println!("{} is now {}", isbn.trim(), status.label());
        }
        Command::Toggle { isbn } => {
            let status = session.toggle_read(&isbn)?;
            println!("{} is now {}", isbn.trim(), status.label());
        }
        Command::SetStatus { isbn, status } => {
            let status = session.set_status(&isbn, status)?;
            println!("{} is now {}", isbn.trim(), status.label());
        }
        Command::Stats => print!("{}", render::statistics(&session.statistics()?)),
        Command::ByAuthor { author, page } => {
            let response = session.books_by_author(&author, page.saturating_sub(1))?;
            print!("{}", render::books_response(&response));
        }
        Command::ByCategory { category, page } => {
            let response = session.books_by_category(&category, page.saturating_sub(1))?;
            print!("{}", render::books_response(&response));
        }
        Command::Browse => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            browse::run_browse(&mut session, stdin.lock(), &mut stdout)?;
        }
        Command::Login(_) | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = resolve_config(&cli);
    match execute(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("command failed: {:?}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
