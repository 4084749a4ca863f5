//! Stat Source Port
//!
//! Defines the interface for obtaining raw TCP metrics text.

use crate::error::ExecutionError;

/// Source of the kernel's TCP metrics dump.
///
/// `fetch` blocks the caller until the whole dump is in memory. The dump is
/// bounded by the number of cached peers, so it is never streamed.
pub trait StatSource: Send + Sync {
    /// Produce the current dump as text.
    fn fetch(&self) -> Result<String, ExecutionError>;
}
