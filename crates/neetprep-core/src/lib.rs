//! neetprep-core — Quiz session, scoring and recommendation core.
//!
//! This crate defines the data model, the collaborator traits for the
//! question bank, result history and auth provider, and the quiz logic that
//! runs on top of them: timed sessions, scoring and weak-chapter analysis.

pub mod bank;
pub mod driver;
pub mod error;
pub mod model;
pub mod persist;
pub mod recommend;
pub mod report;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
