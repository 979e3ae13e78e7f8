//! Page window over the preview rows.
//!
//! In client mode the paginator slices the in-memory rows itself. In server
//! mode each page arrives from the backend with its own counts, and the
//! paginator only checks those numbers before adopting them.

use log::debug;

use crate::{error::PaginationError, value::Row};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// `max(1, ceil(total_rows / page_size))`; a zero page size counts as one.
pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    total_rows.div_ceil(page_size.max(1)).max(1)
}

/// Rows of the 1-based page `page_index`; empty when the page is past the end.
pub fn page(rows: &[Row], page_index: usize, page_size: usize) -> &[Row] {
    let page_size = page_size.max(1);
    let start = page_index.saturating_sub(1).saturating_mul(page_size);
    if start >= rows.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    #[default]
    Client,
    Server,
}

/// Counts reported by the backend alongside one page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerPagination {
    pub total_rows: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl ServerPagination {
    pub fn validate(&self, page_size: usize, rows_on_page: usize) -> Result<(), PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        let expected = total_pages(self.total_rows, page_size);
        if self.total_pages != expected {
            return Err(PaginationError::TotalPagesMismatch {
                reported: self.total_pages,
                expected,
                total_rows: self.total_rows,
                page_size,
            });
        }
        if self.current_page == 0 || self.current_page > self.total_pages {
            return Err(PaginationError::PageOutOfRange {
                current: self.current_page,
                total_pages: self.total_pages,
            });
        }
        if rows_on_page > page_size {
            return Err(PaginationError::PageOverflow {
                rows: rows_on_page,
                page_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    mode: PaginationMode,
    page_size: usize,
    current_page: usize,
    total_rows: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            mode: PaginationMode::Client,
            page_size: page_size.max(1),
            current_page: 1,
            total_rows: 0,
        }
    }

    pub fn server(page_size: usize) -> Self {
        Self {
            mode: PaginationMode::Server,
            ..Self::new(page_size)
        }
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_rows, self.page_size)
    }

    pub fn contains_page(&self, page: usize) -> bool {
        (1..=self.total_pages()).contains(&page)
    }

    fn clamp(&mut self) {
        let last = self.total_pages();
        if self.current_page > last {
            debug!("Clamping page {} to last page {last}", self.current_page);
            self.current_page = last;
        }
        self.current_page = self.current_page.max(1);
    }

    pub fn set_total_rows(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
        self.clamp();
    }

    /// Ignores a zero size; returns whether the size was applied.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if page_size == 0 {
            return false;
        }
        self.page_size = page_size;
        self.clamp();
        true
    }

    /// Moves to `page` when it lies within `1..=total_pages`; otherwise leaves
    /// the current page unchanged and returns `false`.
    pub fn change_page(&mut self, page: usize) -> bool {
        if !self.contains_page(page) {
            debug!(
                "Ignoring page {page} outside 1..={}",
                self.total_pages()
            );
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
        self.clamp();
    }

    /// Rows visible on the current page. Server pages are already windowed.
    pub fn window<'a>(&self, rows: &'a [Row]) -> &'a [Row] {
        match self.mode {
            PaginationMode::Client => page(rows, self.current_page, self.page_size),
            PaginationMode::Server => rows,
        }
    }

    /// Adopts counts reported by the server after validating them against
    /// the local page size.
    pub fn apply_server(
        &mut self,
        pagination: &ServerPagination,
        rows_on_page: usize,
    ) -> Result<(), PaginationError> {
        pagination.validate(self.page_size, rows_on_page)?;
        self.total_rows = pagination.total_rows;
        self.current_page = pagination.current_page;
        Ok(())
    }
}
