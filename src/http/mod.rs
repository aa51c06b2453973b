//! HTTP client module
//!
//! Provides the per-connector HTTP session with retry, rate limiting and
//! backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: 429/500/502/503/504 and transport errors are retried
//! - **Rate Limiting**: Minimum interval between requests using governor
//! - **Backoff Strategies**: Constant and exponential backoff
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{join_url, HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
