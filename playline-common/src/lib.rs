//! # Playline Common Library
//!
//! Shared code for the Playline analytics pipeline including:
//! - Stream record and stage result models
//! - Wire request/response types for the transport bindings
//! - Error taxonomy (`Error` enum)
//! - Pipeline configuration loading
//! - Diagnostics metrics sink

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;

pub use error::{Error, Result, TransportKind};
pub use model::{AccumulatedResult, StageName, StageResult, StreamRecord};
