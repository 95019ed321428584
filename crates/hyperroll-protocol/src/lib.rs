//! Shared value types for the HyperRoll engine: ids, game enums, the
//! client→sim command set, the sim→client event stream, and snapshots.
//!
//! Everything here is plain serializable data; all rules live in
//! `hyperroll-core`.

mod command;
mod event;
mod ids;
mod snapshot;
mod types;

pub use crate::command::*;
pub use crate::event::*;
pub use crate::ids::*;
pub use crate::snapshot::*;
pub use crate::types::*;
