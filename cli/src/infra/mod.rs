//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, docker
//! compose, HTTP downloads, archive extraction, filesystem access, embedded
//! templates, site records and file locks.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod command_runner;
pub mod compose;
pub mod config;
pub mod download;
pub mod fs;
pub mod lock;
pub mod site_store;
pub mod templates;
