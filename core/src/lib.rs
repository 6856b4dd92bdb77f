//! Multi-layer standard resolution and scoring for competency assessments.
//!
//! Layers, highest priority first: session adjustments, the institution's
//! selected custom standard, the template baseline. `StandardsEngine` is the
//! entry point; the modules below are usable on their own for tests and tools.

pub mod assessment;
pub mod catalog;
pub mod config;
pub mod context;
pub mod custom_standard;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod import;
pub mod individual;
pub mod layer;
pub mod ranking;
pub mod resolver;
pub mod result_cache;
pub mod scoring;
pub mod session;
pub mod source;
pub mod statistics;
pub mod store;
pub mod types;
