//! Pagination module
//!
//! Supports: Offset, Page Number, Cursor
//!
//! # Overview
//!
//! The pagination module walks a paginated HTTP endpoint until every page
//! has been fetched. Each strategy knows where its position lives in the
//! query string and how to advance it from a response; [`paginate`] drives
//! a strategy and yields the result array of every page as a stream.

mod stream;
mod strategies;
mod types;

pub use stream::{paginate, PageStream};
pub use strategies::{build_paginator, CursorPaginator, OffsetPaginator, PageNumberPaginator};
pub use types::{
    extract_count, extract_cursor, extract_path, extract_results, to_query_pairs,
    PaginationConfig, PaginationState, PaginationType, Paginator, DEFAULT_LIMIT,
};
