//! Integration tests for Campus-Scout
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! crawls against them.

mod common;
mod crawl_tests;
mod extraction_tests;
mod session_tests;
