// src/loopback.rs

// In-process stand-ins for the simulator and the global planner. The
// simulator records every move and world step; the planner answers each
// published goal from its own thread, like a real planner callback would,
// unless the goal is deemed unreachable.

use log::{debug, trace};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ServiceError;
use crate::pose::Pose2D;
use crate::ros_interface::{GlobalPath, GoalPublisher, PathSink, SimulatorServices};

const SERVICE_POLL_INTERVAL: Duration = Duration::from_millis(10);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulator that only records what it was asked to do
#[derive(Debug)]
pub struct LoopbackSimulator {
    moves: Mutex<Vec<(String, Pose2D)>>,
    steps: AtomicUsize,
    available: AtomicBool,
}

impl Default for LoopbackSimulator {
    fn default() -> Self {
        LoopbackSimulator::new()
    }
}

impl LoopbackSimulator {
    /// A simulator whose services are up
    pub fn new() -> Self {
        LoopbackSimulator {
            moves: Mutex::new(Vec::new()),
            steps: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// A simulator whose services never come up
    pub fn unavailable() -> Self {
        let simulator = LoopbackSimulator::new();
        simulator.set_available(false);
        simulator
    }

    /// Brings the services up or down
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every model move so far, oldest first
    pub fn moves(&self) -> Vec<(String, Pose2D)> {
        lock(&self.moves).clone()
    }

    /// Where the named model was last moved to
    pub fn last_pose(&self, name: &str) -> Option<Pose2D> {
        lock(&self.moves)
            .iter()
            .rev()
            .find(|(model, _)| model == name)
            .map(|(_, pose)| *pose)
    }

    /// World steps so far
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    fn ensure_available(&self, service: &str) -> Result<(), ServiceError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ServiceError::CallFailed {
                service: service.to_string(),
                reason: "simulator is down".to_string(),
            })
        }
    }
}

impl SimulatorServices for LoopbackSimulator {
    fn wait_for_service(&self, service: &str, timeout: Duration) -> Result<(), ServiceError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.available.load(Ordering::SeqCst) {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ServiceError::Unavailable {
                    service: service.to_string(),
                    waited: timeout,
                });
            }
            thread::sleep(SERVICE_POLL_INTERVAL.min(deadline - now));
        }
    }

    fn move_model(&self, name: &str, pose: &Pose2D) -> Result<(), ServiceError> {
        self.ensure_available(crate::ros_interface::MOVE_MODEL_SERVICE)?;
        lock(&self.moves).push((name.to_string(), *pose));
        Ok(())
    }

    fn step_world(&self) -> Result<(), ServiceError> {
        self.ensure_available(crate::ros_interface::STEP_WORLD_SERVICE)?;
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

type Reachability = Box<dyn Fn(&Pose2D) -> bool + Send + Sync>;

/// Planner that answers every reachable goal with a one-waypoint path
pub struct LoopbackPlanner {
    delay: Duration,
    clock: AtomicU64,
    published: Mutex<Vec<Pose2D>>,
    reachable: Reachability,
    sink: Mutex<Option<Arc<dyn PathSink>>>,
}

impl LoopbackPlanner {
    /// Answers every goal after `delay`
    pub fn new(delay: Duration) -> Self {
        LoopbackPlanner::with_reachability(delay, |_| true)
    }

    /// Answers only goals for which `reachable` holds; the rest get no path
    pub fn with_reachability(
        delay: Duration,
        reachable: impl Fn(&Pose2D) -> bool + Send + Sync + 'static,
    ) -> Self {
        LoopbackPlanner {
            delay,
            clock: AtomicU64::new(0),
            published: Mutex::new(Vec::new()),
            reachable: Box::new(reachable),
            sink: Mutex::new(None),
        }
    }

    /// Routes future paths to `sink`
    pub fn attach(&self, sink: Arc<dyn PathSink>) {
        *lock(&self.sink) = Some(sink);
    }

    /// Goals received so far, oldest first
    pub fn published(&self) -> Vec<Pose2D> {
        lock(&self.published).clone()
    }
}

impl GoalPublisher for LoopbackPlanner {
    fn publish_goal(&self, goal: &Pose2D) -> Result<(), ServiceError> {
        lock(&self.published).push(*goal);

        if !(self.reachable)(goal) {
            debug!("Loopback planner: no path to x={:.2}, y={:.2}", goal.x, goal.y);
            return Ok(());
        }
        let Some(sink) = lock(&self.sink).clone() else {
            debug!("Loopback planner: goal published with nobody listening");
            return Ok(());
        };

        // Stamps are strictly increasing across goals
        let stamp = Duration::from_millis(self.clock.fetch_add(1, Ordering::SeqCst) + 1);
        let delay = self.delay;
        let goal = *goal;
        thread::spawn(move || {
            thread::sleep(delay);
            trace!("Loopback planner: delivering path stamped {:?}", stamp);
            sink.on_path(GlobalPath::new(stamp, vec![goal]));
        });
        Ok(())
    }
}
