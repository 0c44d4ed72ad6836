//! Integration tests
//!
//! Everything except `api_tests` runs in process against the memory store.
//! `api_tests` needs a live server and is ignored by default.

mod api_tests;
mod common;
mod http;
mod scenarios;
