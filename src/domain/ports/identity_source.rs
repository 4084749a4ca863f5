//! Identity Source Port
//!
//! Defines the interface for list+watch streams of IP-addressable objects.

use crate::domain::entities::{IdentityEvent, IdentityKind};
use crate::error::IdentitySourceError;
use futures::stream::BoxStream;

/// A push-based feed of identity changes for one resource kind.
///
/// The stream is expected to start with a full listing (`Init`,
/// `InitApply`.., `InitDone`) and continue with incremental events for the
/// lifetime of the process. Errors are reported in-band; the stream keeps
/// going after them.
pub trait IdentitySource: Send + Sync {
    /// Which index this source feeds.
    fn kind(&self) -> IdentityKind;

    /// Open the event stream.
    fn events(&self) -> BoxStream<'static, Result<IdentityEvent, IdentitySourceError>>;
}
