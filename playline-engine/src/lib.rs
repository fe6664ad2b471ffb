//! # Playline Aggregation Engine
//!
//! The pipeline core: the four stage algorithms, the transport-adapter
//! contract they are invoked through, and the caller-driven orchestrator.
//!
//! Stages are pure functions of their declared inputs. Everything network-
//! shaped lives behind the narrow [`adapter::StageTransport`] interface;
//! nothing in this crate knows about a wire format.

pub mod adapter;
pub mod orchestrator;
pub mod stages;

pub use adapter::{execute, InProcessTransport, StagePayload, StageTransport};
pub use orchestrator::{run_star, RunOutcome, RunState, StageFailure};
