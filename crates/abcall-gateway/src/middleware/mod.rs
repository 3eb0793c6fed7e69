//! # Middleware
//!
//! Request counters and request tracing. The credential middleware lives in
//! [`crate::auth`] next to the codec it drives.

pub mod metrics;
pub mod tracing_layer;
