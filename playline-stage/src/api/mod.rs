//! HTTP API handlers for playline-stage

pub mod chain;
pub mod error;
pub mod health;
pub mod rpc;
pub mod stage;

pub use error::ApiError;
pub use health::health_routes;
