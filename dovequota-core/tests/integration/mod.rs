//! Integration test modules

mod refresh_tests;
#[cfg(unix)]
mod ssh_client_tests;
