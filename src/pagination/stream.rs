//! Lazy page traversal
//!
//! [`paginate`] turns a pagination config into a stream of result pages.
//! Each poll issues at most one request, so a consumer that stops polling
//! never pays for pages it did not ask for.

use super::strategies::build_paginator;
use super::types::{
    extract_count, extract_results, to_query_pairs, PaginationConfig, PaginationState, Paginator,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::{JsonObject, JsonValue};
use futures::Stream;
use std::pin::Pin;
use tracing::{debug, info, warn};

/// Stream of result pages yielded by [`paginate`]
pub type PageStream<'a> = Pin<Box<dyn Stream<Item = Result<Vec<JsonValue>>> + Send + 'a>>;

/// Everything one traversal needs besides its mutable state
struct Traversal<'a> {
    client: &'a HttpClient,
    url: String,
    params: JsonObject,
    config: &'a PaginationConfig,
    paginator: Box<dyn Paginator>,
}

impl Traversal<'_> {
    async fn fetch(&self, state: &mut PaginationState) -> Result<Vec<JsonValue>> {
        let mut query = to_query_pairs(&self.params);
        if let Some((key, value)) = self.paginator.position_param(state) {
            query.retain(|(k, _)| k != &key);
            query.push((key, value));
        }

        info!(
            "Fetching page {} from {} with params: {:?}",
            state.requests + 1,
            self.url,
            query
        );
        let body = self
            .client
            .get_json(
                &self.url,
                RequestConfig {
                    query,
                    ..Default::default()
                },
            )
            .await?;

        let results = extract_results(&body, &self.config.results_path);

        if state.is_first_page() && !self.config.total_count_path.is_empty() {
            state.total_count = extract_count(&body, &self.config.total_count_path);
            if state.total_count.is_none() {
                warn!(
                    "Failed to extract total count from response using path: {}",
                    self.config.total_count_path
                );
            }
        }

        state.requests += 1;
        self.paginator.advance(&body, results.len(), state);
        debug!(
            "Page returned {} results, more pages: {}",
            results.len(),
            state.more_pages
        );

        Ok(results)
    }
}

/// Traverse a paginated endpoint
///
/// `params` are the merged request parameters; the page size is read from
/// `config.limit_param` (default 100) and added to the query when absent.
/// Any non-2xx response ends the stream with an error.
pub fn paginate<'a>(
    client: &'a HttpClient,
    url: impl Into<String>,
    mut params: JsonObject,
    config: &'a PaginationConfig,
) -> Result<PageStream<'a>> {
    let limit = config.limit_from(&params)?;
    params
        .entry(config.limit_param.clone())
        .or_insert_with(|| JsonValue::from(limit));

    let traversal = Traversal {
        client,
        url: url.into(),
        params,
        config,
        paginator: build_paginator(config),
    };
    let state = PaginationState::new(config.pagination_type, limit);

    let stream = futures::stream::try_unfold(
        (traversal, Some(state)),
        |(traversal, state)| async move {
            let Some(mut state) = state else {
                return Ok(None);
            };

            let results = traversal.fetch(&mut state).await?;
            let next = state.more_pages.then_some(state);
            Ok::<_, Error>(Some((results, (traversal, next))))
        },
    );

    Ok(Box::pin(stream))
}
