//! Shopify Admin API client for the customer directory feed.
//!
//! The directory is polled, never pushed from: [`FeedClient`] pages through
//! the Admin GraphQL customers query and returns a complete snapshot, or an
//! error. A failure anywhere mid-feed aborts the whole snapshot; the API
//! exposes no resumption semantics, so a partial page list is never handed
//! to the reconciler.
//!
//! Queries are static documents sent with JSON `variables`; no request is
//! ever assembled by string interpolation.

mod feed;
pub mod types;

pub use feed::{CustomerFeed, FeedClient};
pub use types::{ExternalAddress, ExternalCustomer};

use thiserror::Error;

/// Errors that can occur when reading the directory feed.
///
/// Every variant aborts the reconciliation pass that triggered the read:
/// the feed is either delivered whole or not at all.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected HTTP status from the API.
    #[error("unexpected status {0}")]
    Status(u16),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// The response body did not match the expected page shape.
    #[error("malformed page: {0}")]
    MalformedPage(String),

    /// Rate limited by Shopify.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User error from a mutation (e.g., invalid input).
    #[error("user error: {0}")]
    UserError(String),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_display() {
        let err = FeedError::RateLimited(60);
        assert_eq!(err.to_string(), "rate limited, retry after 60 seconds");

        let err = FeedError::Status(503);
        assert_eq!(err.to_string(), "unexpected status 503");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                path: vec![],
            },
            GraphQLError {
                message: "Invalid cursor".to_string(),
                path: vec![],
            },
        ];
        let err = FeedError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid cursor"
        );
    }
}
