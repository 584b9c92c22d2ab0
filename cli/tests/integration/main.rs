//! Integration tests for the rebox CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them touch a virtualization host.

mod cli_tests;
mod client_setup;
