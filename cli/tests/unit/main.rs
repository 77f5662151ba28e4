//! Unit tests for sitebox CLI
//!
//! These tests use mocked network, container and registry ports and run
//! fast against temp directories.

mod architecture;
mod install_service;
mod pipeline;
