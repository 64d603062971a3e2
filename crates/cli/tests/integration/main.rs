//! CLI integration tests running cmkx against a fake build tool.

#![cfg(unix)]

mod build_tests;
mod common;
mod deps_tests;
