use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("sign in to change the library")]
    NotSignedIn,

    #[error("{email} is not allowed to change this library")]
    NotAuthorized { email: String },

    #[error("\"{value}\" is not a valid ISBN-10 or ISBN-13")]
    InvalidIsbn { value: String },

    #[error("page {requested} is out of range (1-{total})")]
    PageOutOfRange { requested: usize, total: usize },

    #[error("page {requested} is too large")]
    PageTooLarge { requested: usize },

    #[error("nothing to update")]
    EmptyUpdate,

    #[error("local store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("local store error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
