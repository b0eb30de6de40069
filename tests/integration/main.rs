//! Integration tests for Ripple-Pipeline
//!
//! These tests run the crawler against wiremock servers and push the
//! fetched pages through pipelines built from configuration files.

mod crawl_tests;
mod pipeline_tests;
