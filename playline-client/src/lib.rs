//! playline-client library - the pipeline driver
//!
//! Loads play records from CSV, invokes the pipeline through one of the
//! transport bindings (in-process, HTTP+JSON, JSON-RPC, or the forwarding
//! chain), and reports/persists the combined metrics.

pub mod loader;
pub mod report;
pub mod transport;
