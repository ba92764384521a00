use crate::models::{
    BookResponse, BookUpdate, BooksResponse, ErrorResponse, MessageResponse, ReadingStatus,
    SearchCriteria, StatisticsResponse, StatusUpdateResponse,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api/v1";
const HTTP_USER_AGENT: &str = "biblio/0.1";
const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";
const UNREADABLE_ERROR_MESSAGE: &str = "Network error";
static HTTP_DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Every failed backend call ends up here, carrying a message fit for a
/// one-line notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        ApiError {
            message: message.into(),
            status: None,
        }
    }

    fn with_status(message: impl Into<String>, status: u16) -> Self {
        ApiError {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError {
            message: err.to_string(),
            status: err.status().map(|status| status.as_u16()),
        }
    }
}

/// Remote operations the library session depends on.
pub trait LibraryBackend {
    fn list_books(&self, limit: usize, skip: usize) -> Result<BooksResponse, ApiError>;
    fn search_books(
        &self,
        criteria: &SearchCriteria,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError>;
    fn books_by_status(
        &self,
        status: ReadingStatus,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError>;
    fn books_by_author(
        &self,
        author: &str,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError>;
    fn books_by_category(
        &self,
        category: &str,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError>;
    fn get_book(&self, isbn: &str) -> Result<BookResponse, ApiError>;
    fn add_book(&self, isbn: &str) -> Result<BookResponse, ApiError>;
    fn update_book(&self, isbn: &str, update: &BookUpdate) -> Result<BookResponse, ApiError>;
    fn delete_book(&self, isbn: &str) -> Result<MessageResponse, ApiError>;
    fn update_reading_status(
        &self,
        isbn: &str,
        status: ReadingStatus,
    ) -> Result<StatusUpdateResponse, ApiError>;
    fn statistics(&self) -> Result<StatisticsResponse, ApiError>;
}

/// Blocking JSON client for the `/api/v1` book service.
#[derive(Debug, Clone)]
pub struct LibraryApi {
    client: Client,
    base_url: String,
}

impl LibraryApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(HTTP_USER_AGENT)
            .build()?;
        Ok(LibraryApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn builder(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(endpoint))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let debug_enabled = http_debug_enabled();
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().to_string();
        if debug_enabled {
            log::info!("[http-debug] start method={} url={}", method, url);
        }

        let response = match self.client.execute(request) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{} {} failed: {}", method, url, err);
                return Err(err.into());
            }
        };

        let status = response.status();
        if debug_enabled {
            log::info!(
                "[http-debug] done method={} url={} status={}",
                method,
                url,
                status
            );
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = error_message_from_body(&body);
            log::warn!("{} {} returned {}: {}", method, url, status, message);
            return Err(ApiError::with_status(message, status.as_u16()));
        }

        response.json::<T>().map_err(|err| {
            log::warn!("{} {} response parse failed: {}", method, url, err);
            ApiError::new(format!("invalid response from server: {}", err))
        })
    }

    fn get_paged<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        limit: usize,
        skip: usize,
    ) -> Result<T, ApiError> {
        self.send(
            self.builder(Method::GET, endpoint)
                .query(&[("limit", limit), ("skip", skip)]),
        )
    }
}

impl LibraryBackend for LibraryApi {
    fn list_books(&self, limit: usize, skip: usize) -> Result<BooksResponse, ApiError> {
        self.get_paged("/books/", limit, skip)
    }

    fn search_books(
        &self,
        criteria: &SearchCriteria,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError> {
        let mut params: Vec<(&str, String)> = vec![];
        let fields = [
            ("query", &criteria.query),
            ("title", &criteria.title),
            ("author", &criteria.author),
            ("category", &criteria.category),
            ("reading_status", &criteria.reading_status),
        ];
        for (key, value) in fields {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                params.push((key, value.to_string()));
            }
        }
        params.push(("limit", limit.to_string()));
        params.push(("skip", skip.to_string()));
        self.send(self.builder(Method::GET, "/books/search").query(&params))
    }

    fn books_by_status(
        &self,
        status: ReadingStatus,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError> {
        self.get_paged(&format!("/books/status/{}", status.as_str()), limit, skip)
    }

    fn books_by_author(
        &self,
        author: &str,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError> {
        self.get_paged(
            &format!("/books/authors/{}", urlencoding::encode(author)),
            limit,
            skip,
        )
    }

    fn books_by_category(
        &self,
        category: &str,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError> {
        self.get_paged(
            &format!("/books/categories/{}", urlencoding::encode(category)),
            limit,
            skip,
        )
    }

    fn get_book(&self, isbn: &str) -> Result<BookResponse, ApiError> {
        self.send(self.builder(Method::GET, &book_path(isbn)))
    }

    fn add_book(&self, isbn: &str) -> Result<BookResponse, ApiError> {
        self.send(
            self.builder(Method::POST, "/books/")
                .json(&json!({ "isbn": isbn })),
        )
    }

    fn update_book(&self, isbn: &str, update: &BookUpdate) -> Result<BookResponse, ApiError> {
        self.send(self.builder(Method::PUT, &book_path(isbn)).json(update))
    }

    fn delete_book(&self, isbn: &str) -> Result<MessageResponse, ApiError> {
        self.send(self.builder(Method::DELETE, &book_path(isbn)))
    }

    fn update_reading_status(
        &self,
        isbn: &str,
        status: ReadingStatus,
    ) -> Result<StatusUpdateResponse, ApiError> {
        self.send(
            self.builder(Method::PUT, &format!("{}/status", book_path(isbn)))
                .json(&json!({ "reading_status": status })),
        )
    }

    fn statistics(&self) -> Result<StatisticsResponse, ApiError> {
        self.send(self.builder(Method::GET, "/books/statistics"))
    }
}

fn book_path(isbn: &str) -> String {
    format!("/books/{}", urlencoding::encode(isbn))
}

/// Prefers the server's `message`, then its `error`. A body that is not JSON
/// at all reads as a network failure.
pub(crate) fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed
            .message
            .filter(|value| !value.trim().is_empty())
            .or(parsed.error.filter(|value| !value.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
        Err(_) => UNREADABLE_ERROR_MESSAGE.to_string(),
    }
}

fn http_debug_enabled() -> bool {
    *HTTP_DEBUG_ENABLED.get_or_init(|| crate::config::env_flag("BIBLIO_HTTP_DEBUG"))
}
