//! Test utilities and fixtures for AMXXPack
//!
//! This crate provides shared test helpers for the integration tests
//! (tests/ directory) of the other workspace crates.

pub mod fixtures;
pub mod mocks;
pub mod project;

pub use mocks::MockCompiler;
pub use project::TestProject;
