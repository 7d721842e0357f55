//! Operator-error tier of the engine.
//!
//! These are recoverable precondition failures: the scale operation that
//! raised one is a no-op and the caller keeps its original device.
//! Structural violations (duplicate keys, unknown ids on resolved paths,
//! impossible re-selections) are programming errors and panic instead.

use thiserror::Error;

/// A specialized `Result` for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Recoverable topology precondition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Scale-out named an MG id that is already present.
    #[error("migration group {0} already exists")]
    MgExists(u32),

    /// A scale operation named an MG id that is not present.
    #[error("migration group {0} does not exist")]
    MgNotFound(u32),

    /// Scale-up named a PE id already present in the target MG.
    #[error("placement element {pe_id} already exists in migration group {mg_id}")]
    PeExists {
        /// The target migration group.
        mg_id: u32,
        /// The duplicate placement element id.
        pe_id: u32,
    },

    /// Scale-in would remove the only MG, leaving every key unplaceable.
    #[error("cannot scale in migration group {0}: it is the last one")]
    LastMg(u32),

    /// Id 0 is the no-selection sentinel and never names an MG or a PE.
    #[error("id 0 is reserved and cannot name a migration group or placement element")]
    ReservedId,
}
