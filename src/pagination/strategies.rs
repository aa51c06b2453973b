//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{extract_cursor, PaginationConfig, PaginationState, PaginationType, Paginator};
use serde_json::Value;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// Common patterns:
/// - `?offset=100&limit=50`
/// - `?skip=100&take=50`
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter name for offset
    pub offset_param: String,
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(offset_param: impl Into<String>) -> Self {
        Self {
            offset_param: offset_param.into(),
        }
    }
}

impl Paginator for OffsetPaginator {
    fn position_param(&self, state: &PaginationState) -> Option<(String, String)> {
        Some((self.offset_param.clone(), state.offset.to_string()))
    }

    fn advance(&self, _body: &Value, results_len: usize, state: &mut PaginationState) {
        state.offset += state.limit;
        state.more_pages = match state.total_count {
            Some(total) => state.offset < total,
            // A short page is the end of the data
            None => results_len as u64 == state.limit,
        };
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination, first page is 1
///
/// Common patterns:
/// - `?page=2`
/// - `?page=2&per_page=50`
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
}

impl PageNumberPaginator {
    /// Create a new page number paginator
    pub fn new(page_param: impl Into<String>) -> Self {
        Self {
            page_param: page_param.into(),
        }
    }
}

impl Paginator for PageNumberPaginator {
    fn position_param(&self, state: &PaginationState) -> Option<(String, String)> {
        Some((self.page_param.clone(), state.page.to_string()))
    }

    fn advance(&self, _body: &Value, results_len: usize, state: &mut PaginationState) {
        state.page += 1;
        state.more_pages = match state.total_count {
            Some(total) => (state.page - 1) * state.limit < total,
            None => results_len as u64 == state.limit,
        };
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination
///
/// The first request carries no cursor; each response names the cursor of
/// the next page. Pagination stops as soon as a response carries none.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Query parameter name for cursor
    pub cursor_param: String,
    /// Dot path to the next cursor in the response
    pub cursor_path: String,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(cursor_param: impl Into<String>, cursor_path: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
        }
    }
}

impl Paginator for CursorPaginator {
    fn position_param(&self, state: &PaginationState) -> Option<(String, String)> {
        state
            .cursor
            .as_ref()
            .map(|cursor| (self.cursor_param.clone(), cursor.clone()))
    }

    fn advance(&self, body: &Value, _results_len: usize, state: &mut PaginationState) {
        match extract_cursor(body, &self.cursor_path) {
            Some(cursor) => {
                state.cursor = Some(cursor);
                state.more_pages = true;
            }
            None => {
                state.cursor = None;
                state.mark_done();
            }
        }
    }
}

/// Build the strategy for a pagination config
pub fn build_paginator(config: &PaginationConfig) -> Box<dyn Paginator> {
    let param = config.position_param();
    match config.pagination_type {
        PaginationType::Offset => Box::new(OffsetPaginator::new(param)),
        PaginationType::Page => Box::new(PageNumberPaginator::new(param)),
        PaginationType::Cursor => Box::new(CursorPaginator::new(
            param,
            config.next_cursor_path.clone(),
        )),
    }
}
