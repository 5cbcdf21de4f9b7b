//! One-byte synchronization triggers for external recording equipment.
//!
//! Every transport honours the same contract: send one byte, fire and forget.

pub mod backend;
pub mod error;
pub mod parallel;
pub mod serial;

pub use backend::{open, NullPort, TtlBackend, TtlPort};
pub use error::TtlError;
