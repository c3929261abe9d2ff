//! Start/goal placement
//!
//! Sampling of free positions and the retry policy that turns them into a
//! validated start/goal pair.

mod policy;
mod sampler;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use policy::{
    DEFAULT_MAX_TRIES, GOAL_CLEARANCE_FACTOR, MoveRobot, PlacementContext, PlacementPolicy,
    PlacementResult, START_CLEARANCE_FACTOR, ValidateGoal,
};
pub use sampler::{RandomPositionSampler, sample_free_pose};

/// Cooperative cancellation flag, shared between the episode loop and
/// whoever decides to abort the episode
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that is not cancelled
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation; takes effect before the next attempt
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation so the token can be reused
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
