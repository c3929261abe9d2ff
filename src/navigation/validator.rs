// src/navigation/validator.rs

// Checks that the global planner can reach a freshly published goal. The goal
// is published, then the caller blocks on a condition variable until either a
// path newer than the one known at publication arrives, or the timeout fires.
// Paths are delivered from another thread through `PathListener`.

use log::{debug, warn};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::PlacementError;
use crate::placement::ValidateGoal;
use crate::pose::Pose2D;
use crate::ros_interface::{GlobalPath, GoalPublisher, PathSink};

/// Default wait for a path after publishing a goal
pub const DEFAULT_PATH_TIMEOUT: Duration = Duration::from_millis(100);

/// Progress of the most recent validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationState {
    /// No goal published yet
    Idle,
    /// Goal published, waiting for a path
    GoalPublished,
    /// A fresh path arrived for the last goal
    PathConfirmed,
    /// No fresh path arrived in time
    TimedOut,
}

// Everything the waiting thread and the path callback share
#[derive(Debug)]
struct PathTracking {
    state: ValidationState,
    last_path: Option<GlobalPath>,
    last_path_stamp: Option<Duration>,
    // Stamp of the newest path known when the current goal was published
    baseline_stamp: Option<Duration>,
    new_path_generated: bool,
    last_goal_published_at: Option<Instant>,
}

#[derive(Debug)]
struct Shared {
    tracking: Mutex<PathTracking>,
    path_ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PathTracking> {
        self.tracking.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Publishes goals and waits for the planner to confirm them
pub struct GoalValidator {
    shared: Arc<Shared>,
    publisher: Arc<dyn GoalPublisher>,
    timeout: Duration,
}

impl GoalValidator {
    /// Creates a validator publishing through `publisher`
    pub fn new(publisher: Arc<dyn GoalPublisher>, timeout: Duration) -> Self {
        let tracking = PathTracking {
            state: ValidationState::Idle,
            last_path: None,
            last_path_stamp: None,
            baseline_stamp: None,
            new_path_generated: false,
            last_goal_published_at: None,
        };

        GoalValidator {
            shared: Arc::new(Shared {
                tracking: Mutex::new(tracking),
                path_ready: Condvar::new(),
            }),
            publisher,
            timeout,
        }
    }

    /// Handle for the path subscription to deliver plans into
    pub fn listener(&self) -> PathListener {
        PathListener {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current state of the validation state machine
    pub fn state(&self) -> ValidationState {
        self.shared.lock().state
    }

    /// Configured wait per validation
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Most recent path received, fresh or not
    pub fn last_path(&self) -> Option<GlobalPath> {
        self.shared.lock().last_path.clone()
    }

    /// When the last goal went out
    pub fn last_goal_published_at(&self) -> Option<Instant> {
        self.shared.lock().last_goal_published_at
    }

    /// Publishes `goal` and blocks until a fresh path arrives or the timeout elapses
    pub fn publish_and_wait(&self, goal: &Pose2D) -> Result<(), PlacementError> {
        {
            let mut tracking = self.shared.lock();
            tracking.baseline_stamp = tracking.last_path_stamp;
            // a confirmation left over from an earlier goal must not count
            tracking.new_path_generated = false;
            tracking.last_goal_published_at = Some(Instant::now());
            tracking.state = ValidationState::GoalPublished;
        }

        // Lock released while publishing: a planner may answer synchronously
        if let Err(e) = self.publisher.publish_goal(goal) {
            self.shared.lock().state = ValidationState::Idle;
            return Err(e.into());
        }

        let guard = self.shared.lock();
        let (mut tracking, _) = self
            .shared
            .path_ready
            .wait_timeout_while(guard, self.timeout, |t| !t.new_path_generated)
            .unwrap_or_else(PoisonError::into_inner);

        if tracking.new_path_generated {
            tracking.new_path_generated = false;
            tracking.state = ValidationState::PathConfirmed;
            debug!(
                "Path confirmed for goal x={:.2}, y={:.2}",
                goal.x, goal.y
            );
            Ok(())
        } else {
            tracking.state = ValidationState::TimedOut;
            warn!(
                "No path for goal x={:.2}, y={:.2} within {:?}",
                goal.x, goal.y, self.timeout
            );
            Err(PlacementError::PathNotFound(self.timeout))
        }
    }
}

impl ValidateGoal for GoalValidator {
    fn publish_and_wait(&self, goal: &Pose2D) -> Result<(), PlacementError> {
        GoalValidator::publish_and_wait(self, goal)
    }
}

/// Delivers planner output into a [`GoalValidator`]; cheap to clone
#[derive(Clone)]
pub struct PathListener {
    shared: Arc<Shared>,
}

impl PathSink for PathListener {
    fn on_path(&self, path: GlobalPath) {
        let mut tracking = self.shared.lock();
        let stamp = path.stamp;

        if tracking.state == ValidationState::GoalPublished
            && tracking.baseline_stamp.is_none_or(|baseline| stamp > baseline)
        {
            tracking.new_path_generated = true;
        } else {
            debug!("Ignoring path stamped {:?}", stamp);
        }

        tracking.last_path_stamp = Some(tracking.last_path_stamp.map_or(stamp, |s| s.max(stamp)));
        tracking.last_path = Some(path);
        self.shared.path_ready.notify_all();
    }
}
