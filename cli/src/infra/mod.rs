//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! Proxmox host adapter, local file edits, configuration loading, and the
//! terminal prompt.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod blocks;
pub mod command_runner;
pub mod config;
pub mod exec_context;
pub mod prompt;
pub mod proxmox;
