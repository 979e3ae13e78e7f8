//! Typed failures raised at the collaborator boundary.
//!
//! The engine itself never fails; these errors describe what went wrong
//! upstream so the session can pick a fallback and log the cause.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page size must be positive")]
    ZeroPageSize,
    #[error("current page {current} is outside 1..={total_pages}")]
    PageOutOfRange { current: usize, total_pages: usize },
    #[error("server reported {reported} page(s) but {total_rows} row(s) at {page_size} per page needs {expected}")]
    TotalPagesMismatch {
        reported: usize,
        expected: usize,
        total_rows: usize,
        page_size: usize,
    },
    #[error("page holds {rows} row(s) but the page size is {page_size}")]
    PageOverflow { rows: usize, page_size: usize },
}
