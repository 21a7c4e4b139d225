//! Property-based tests for the quota pipeline

mod error_tests;
mod metrics_tests;
