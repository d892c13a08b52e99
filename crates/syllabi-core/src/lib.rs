//! Core library for Syllabi: curriculum generation sessions with per-user
//! history, feedback-driven regeneration, and document export.
//!
//! Front-ends hold a [`Workbench`](workbench::Workbench), which wires the
//! identity manager, history manager, and curriculum session over one
//! [`Storage`](storage::Storage) backend and one
//! [`Generator`](generation::Generator).

pub mod advisory;
pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod history;
pub mod identity;
pub mod llm;
pub mod model;
pub mod session;
pub mod storage;
pub mod store;
pub mod workbench;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{GenerationError, Result, SyllabiError};
pub use workbench::Workbench;
