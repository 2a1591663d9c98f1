//! depsentry - Multi-ecosystem dependency inventory and update library
//!
//! This library provides the core functionality for tracking and
//! updating a project's dependencies across ecosystems:
//! - Python (pyproject.toml, requirements files, pip)
//! - Node.js (package.json, npm/yarn/pnpm)
//! - System binaries and globally installed tooling

pub mod backup;
pub mod cli;
pub mod command;
pub mod domain;
pub mod error;
pub mod installer;
pub mod inventory;
pub mod manifest;
pub mod output;
pub mod persist;
pub mod probe;
pub mod progress;
pub mod report;
pub mod update;
pub mod version;
