// src/navigation/controller.rs
// Moves the robot in the simulator and, during training, steps the world far
// enough for the laser and odometry transforms to be republished before a
// goal is sent.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ServiceError;
use crate::placement::MoveRobot;
use crate::pose::Pose2D;
use crate::robot::RobotConfig;
use crate::ros_interface::SimulatorServices;

/// Gateway to the simulator's move/step services for one robot
pub struct MotionGateway {
    simulator: Arc<dyn SimulatorServices>,
    robot_name: String,
    laser_update_rate: u32,
    training_mode: bool,
}

impl MotionGateway {
    /// Creates a gateway without checking that the simulator is up
    pub fn new(simulator: Arc<dyn SimulatorServices>, robot: &RobotConfig, training_mode: bool) -> Self {
        MotionGateway {
            simulator,
            robot_name: robot.name().to_string(),
            laser_update_rate: robot.laser_update_rate(),
            training_mode,
        }
    }

    /// Waits up to `timeout` for the move service, then creates the gateway
    pub fn connect(
        simulator: Arc<dyn SimulatorServices>,
        robot: &RobotConfig,
        training_mode: bool,
        move_service: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        simulator.wait_for_service(move_service, timeout)?;
        info!("Connected to {} for robot {}", move_service, robot.name());
        Ok(MotionGateway::new(simulator, robot, training_mode))
    }

    /// World steps issued after each move in training mode
    pub fn ticks_per_move(&self) -> u32 {
        self.laser_update_rate.saturating_add(1)
    }

    /// Whether moves are followed by world steps
    pub fn is_training_mode(&self) -> bool {
        self.training_mode
    }

    /// Teleports the robot and, in training mode, steps the world
    /// `laser_update_rate + 1` times. Returns once the simulator has answered.
    pub fn move_robot(&self, pose: &Pose2D) -> Result<(), ServiceError> {
        self.simulator.move_model(&self.robot_name, pose)?;
        debug!(
            "Moved {} to x={:.2}, y={:.2}, theta={:.2}",
            self.robot_name, pose.x, pose.y, pose.theta
        );

        if self.training_mode {
            for _ in 0..self.ticks_per_move() {
                self.simulator.step_world()?;
            }
        }
        Ok(())
    }
}

impl MoveRobot for MotionGateway {
    fn move_robot(&self, pose: &Pose2D) -> Result<(), ServiceError> {
        MotionGateway::move_robot(self, pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ros_interface::{MOVE_MODEL_SERVICE, MockSimulatorServices};
    use mockall::predicate::{always, eq};
    use rstest::rstest;

    fn robot(rate: u32) -> RobotConfig {
        RobotConfig::new("myrobot", 0.3, rate).unwrap()
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 2)]
    #[case(10, 11)]
    fn test_training_mode_steps_world(#[case] rate: u32, #[case] steps: usize) {
        let mut simulator = MockSimulatorServices::new();
        simulator
            .expect_move_model()
            .with(eq("myrobot"), always())
            .times(1)
            .returning(|_, _| Ok(()));
        simulator.expect_step_world().times(steps).returning(|| Ok(()));

        let gateway = MotionGateway::new(Arc::new(simulator), &robot(rate), true);
        assert!(gateway.move_robot(&Pose2D::new(1.0, 2.0, 0.5)).is_ok());
    }

    #[test]
    fn test_evaluation_mode_never_steps() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_move_model().times(1).returning(|_, _| Ok(()));
        simulator.expect_step_world().never();

        let gateway = MotionGateway::new(Arc::new(simulator), &robot(10), false);
        assert!(gateway.move_robot(&Pose2D::default()).is_ok());
    }

    #[test]
    fn test_failed_move_skips_stepping() {
        let mut simulator = MockSimulatorServices::new();
        simulator.expect_move_model().returning(|_, _| {
            Err(ServiceError::CallFailed {
                service: "move_model".to_string(),
                reason: "model not found".to_string(),
            })
        });
        simulator.expect_step_world().never();

        let gateway = MotionGateway::new(Arc::new(simulator), &robot(3), true);
        assert!(matches!(
            gateway.move_robot(&Pose2D::default()),
            Err(ServiceError::CallFailed { .. })
        ));
    }

    #[test]
    fn test_connect_fails_fast_when_unavailable() {
        let mut simulator = MockSimulatorServices::new();
        simulator
            .expect_wait_for_service()
            .with(eq(MOVE_MODEL_SERVICE), eq(Duration::from_millis(5)))
            .returning(|service, waited| {
                Err(ServiceError::Unavailable {
                    service: service.to_string(),
                    waited,
                })
            });

        let result = MotionGateway::connect(
            Arc::new(simulator),
            &robot(1),
            true,
            MOVE_MODEL_SERVICE,
            Duration::from_millis(5),
        );
        assert!(matches!(result, Err(ServiceError::Unavailable { .. })));
    }
}
