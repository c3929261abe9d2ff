// src/robot/manager.rs

// Outer API used by the episode controller. Owns the robot description, the
// current map snapshot, and the gateways to the simulator and planner, and
// wires them into the placement policy. All methods take `&self`: the map is
// swapped behind an RwLock so a planner callback thread and the episode loop
// can share one manager.

use log::info;
use std::sync::{Arc, PoisonError, RwLock};

use crate::TaskConfig;
use crate::error::PlacementError;
use crate::map::{MapSnapshot, OccupancyGrid};
use crate::navigation::{GoalValidator, MotionGateway, PathListener};
use crate::placement::{
    CancelToken, PlacementContext, PlacementPolicy, PlacementResult, RandomPositionSampler,
};
use crate::pose::Pose2D;
use crate::ros_interface::{GoalPublisher, SimulatorServices};

use super::RobotConfig;

/// Places one robot and its goals on the current map
pub struct RobotManager {
    robot: RobotConfig,
    map: RwLock<Arc<MapSnapshot>>,
    motion: MotionGateway,
    validator: GoalValidator,
    sampler: RandomPositionSampler,
    policy: PlacementPolicy,
    min_dist: f64,
}

impl RobotManager {
    /// Connects to the simulator (bounded by `config.service_timeout()`) and
    /// indexes the initial map
    pub fn new(
        map: OccupancyGrid,
        robot: RobotConfig,
        config: &TaskConfig,
        simulator: Arc<dyn SimulatorServices>,
        goal_publisher: Arc<dyn GoalPublisher>,
    ) -> Result<Self, PlacementError> {
        let motion = MotionGateway::connect(
            simulator,
            &robot,
            config.training_mode,
            &config.topics.move_model_service,
            config.service_timeout(),
        )?;
        let validator = GoalValidator::new(goal_publisher, config.path_timeout());
        let policy = PlacementPolicy::new(robot.radius(), config.max_tries);

        let manager = RobotManager {
            robot,
            map: RwLock::new(Arc::new(MapSnapshot::new(map))),
            motion,
            validator,
            sampler: RandomPositionSampler::new(config.seed),
            policy,
            min_dist: config.min_dist,
        };
        info!(
            "Robot manager ready for {} ({} mode, {} free cells)",
            manager.robot.name(),
            if manager.motion.is_training_mode() { "training" } else { "evaluation" },
            manager.map().free_space().len()
        );
        Ok(manager)
    }

    /// The managed robot
    pub fn robot(&self) -> &RobotConfig {
        &self.robot
    }

    /// Configured default minimum start/goal distance
    pub fn min_dist(&self) -> f64 {
        self.min_dist
    }

    /// Handle the path subscription delivers plans into
    pub fn path_listener(&self) -> PathListener {
        self.validator.listener()
    }

    /// The goal validator, for inspecting its state
    pub fn validator(&self) -> &GoalValidator {
        &self.validator
    }

    /// Current map and its free-space index, consistent with each other
    pub fn map(&self) -> Arc<MapSnapshot> {
        let guard = self.map.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the map. The index is built before the swap so readers see
    /// either the old pair or the new one.
    pub fn update_map(&self, grid: OccupancyGrid) {
        let snapshot = Arc::new(MapSnapshot::new(grid));
        let free_cells = snapshot.free_space().len();
        *self.map.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        info!("Map updated: {} free cells", free_cells);
    }

    /// Moves the robot to `pose`
    pub fn move_robot(&self, pose: &Pose2D) -> Result<(), PlacementError> {
        self.motion.move_robot(pose)?;
        Ok(())
    }

    /// Moves the robot to a random free position and returns it
    pub fn set_random_start_position(&self) -> Result<Pose2D, PlacementError> {
        let snapshot = self.map();
        let start = self.sampler.sample(&snapshot, self.robot.radius())?;
        self.move_robot(&start)?;
        Ok(start)
    }

    /// Publishes a goal and waits for the planner to confirm it
    pub fn publish_goal(&self, goal: &Pose2D) -> Result<(), PlacementError> {
        self.validator.publish_and_wait(goal)
    }

    /// Places the robot and a goal at least `min_dist` apart. Poses left as
    /// `None` are sampled; the pair is only returned once the planner found a path.
    pub fn set_start_and_goal(
        &self,
        start: Option<Pose2D>,
        goal: Option<Pose2D>,
        min_dist: f64,
    ) -> Result<PlacementResult, PlacementError> {
        self.set_start_and_goal_cancellable(start, goal, min_dist, &CancelToken::new())
    }

    /// Same as [`Self::set_start_and_goal`], aborting between attempts once `cancel` fires
    pub fn set_start_and_goal_cancellable(
        &self,
        start: Option<Pose2D>,
        goal: Option<Pose2D>,
        min_dist: f64,
        cancel: &CancelToken,
    ) -> Result<PlacementResult, PlacementError> {
        let snapshot = self.map();
        let ctx = PlacementContext {
            snapshot: &snapshot,
            sampler: &self.sampler,
            mover: &self.motion,
            validator: &self.validator,
            cancel,
        };
        self.policy.resolve(&ctx, start, goal, min_dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::ros_interface::{MockGoalPublisher, MockSimulatorServices};
    use std::time::Duration;

    fn grid(rows: &[&str]) -> OccupancyGrid {
        OccupancyGrid::from_ascii(0.5, Pose2D::default(), rows).unwrap()
    }

    fn robot() -> RobotConfig {
        RobotConfig::new("myrobot", 0.2, 2).unwrap()
    }

    #[test]
    fn test_construction_requires_move_service() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_wait_for_service().returning(|service, waited| {
            Err(ServiceError::Unavailable {
                service: service.to_string(),
                waited,
            })
        });
        let publisher = MockGoalPublisher::new();

        let result = RobotManager::new(
            grid(&["..."]),
            robot(),
            &TaskConfig::default(),
            Arc::new(simulator),
            Arc::new(publisher),
        );
        assert!(matches!(result, Err(PlacementError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_random_start_moves_robot_and_steps_world() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_wait_for_service().returning(|_, _| Ok(()));
        simulator.expect_move_model().times(1).returning(|_, _| Ok(()));
        // laser_update_rate 2 -> three steps in training mode
        simulator.expect_step_world().times(3).returning(|| Ok(()));

        let config = TaskConfig {
            seed: Some(1),
            ..TaskConfig::default()
        };
        let manager = RobotManager::new(
            grid(&["#.", ".#"]),
            robot(),
            &config,
            Arc::new(simulator),
            Arc::new(MockGoalPublisher::new()),
        )
        .unwrap();

        let start = manager.set_random_start_position().unwrap();
        let snapshot = manager.map();
        let (row, col) = snapshot.grid().world_to_cell(start.x, start.y).unwrap();
        assert!(snapshot.grid().is_free(row, col));
    }

    #[test]
    fn test_update_map_replaces_snapshot() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_wait_for_service().returning(|_, _| Ok(()));
        let manager = RobotManager::new(
            grid(&["..", ".."]),
            robot(),
            &TaskConfig::default(),
            Arc::new(simulator),
            Arc::new(MockGoalPublisher::new()),
        )
        .unwrap();
        let before = manager.map();

        manager.update_map(grid(&["###", "#.#"]));

        let after = manager.map();
        assert_eq!(before.free_space().len(), 4);
        assert_eq!(after.free_space().len(), 1);
        assert_eq!(after.grid().width(), 3);
    }

    #[test]
    fn test_empty_map_surfaces_unplaceable() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_wait_for_service().returning(|_, _| Ok(()));
        simulator.expect_move_model().never();
        let mut publisher = MockGoalPublisher::new();
        publisher.expect_publish_goal().never();

        let manager = RobotManager::new(
            grid(&["##"]),
            robot(),
            &TaskConfig::default(),
            Arc::new(simulator),
            Arc::new(publisher),
        )
        .unwrap();

        assert_eq!(
            manager.set_start_and_goal(None, None, 1.0),
            Err(PlacementError::UnplaceableMap)
        );
        assert_eq!(
            manager.set_random_start_position(),
            Err(PlacementError::UnplaceableMap)
        );
    }

    #[test]
    fn test_fixed_pair_uses_configured_timeout() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_wait_for_service().returning(|_, _| Ok(()));
        simulator.expect_move_model().times(1).returning(|_, _| Ok(()));
        let mut publisher = MockGoalPublisher::new();
        publisher.expect_publish_goal().times(1).returning(|_| Ok(()));

        let config = TaskConfig {
            training_mode: false,
            path_timeout_ms: 15,
            ..TaskConfig::default()
        };
        let manager = RobotManager::new(
            grid(&["....", "...."]),
            robot(),
            &config,
            Arc::new(simulator),
            Arc::new(publisher),
        )
        .unwrap();

        let result = manager.set_start_and_goal(
            Some(Pose2D::new(0.0, 0.0, 0.0)),
            Some(Pose2D::new(1.5, 0.5, 0.0)),
            manager.min_dist(),
        );
        assert_eq!(result, Err(PlacementError::Exhausted { attempts: 1 }));
        assert_eq!(manager.validator().timeout(), Duration::from_millis(15));
    }
}
