//! Integration tests for friend-crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! crawl, registration and ingestion jobs end-to-end against a temporary
//! SQLite database.

mod common;
mod crawl_tests;
mod feed_tests;
