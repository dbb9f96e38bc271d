//! The synchronization engine proper.
//!
//! - `shared`: the context object poller and reconciler converge on
//!   (gateway + store + bus + throttle + visibility)
//! - `poller`: adaptive interval loop with bounded exponential backoff
//! - `reconciler`: optimistic mutations with forced-resync rollback
//! - `activity`: user input / visibility signals tuning the cadence

mod activity;
mod poller;
mod reconciler;
mod shared;

pub use activity::{ActivitySignal, ActivityTracker};
pub use poller::{AdaptivePoller, PollPolicy};
pub use reconciler::{Mutation, Reconciler};

pub(crate) use poller::{PollSignal, PollSignals};
pub(crate) use shared::SyncShared;
