//! Integration tests for Clientele.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and the server
//! cargo run -p clientele-server
//!
//! # Run integration tests (they are #[ignore]d by default)
//! cargo test -p clientele-integration-tests -- --ignored
//! ```
//!
//! The sync tests additionally require valid Shopify credentials in the
//! server's environment; everything else only needs the database.

/// Base URL for the server API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("CLIENTELE_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}
