// src/main.rs
// Runs a few placement episodes on a demo map, against either the in-process
// simulator or a ROS 2 simulation.

use log::{error, info, warn};
use robot_placement::{
    Backend, GoalPublisher, LoopbackPlanner, LoopbackSimulator, OccupancyGrid, PlacementError,
    Pose2D, RobotConfig, RobotManager, SimulatorServices, TaskConfig,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

const EPISODES: usize = 5;
const LOOPBACK_PLANNER_DELAY: Duration = Duration::from_millis(10);

// L-shaped corridor, 0.5 m cells
const DEMO_MAP: [&str; 10] = [
    "##########",
    "#...######",
    "#...######",
    "#...######",
    "#...######",
    "#...######",
    "#........#",
    "#........#",
    "#........#",
    "##########",
];

fn demo_map() -> Result<OccupancyGrid, Box<dyn Error>> {
    // First ascii row is grid row 0, which sits at the map origin
    let rows: Vec<&str> = DEMO_MAP.iter().rev().copied().collect();
    Ok(OccupancyGrid::from_ascii(0.5, Pose2D::default(), &rows)?)
}

fn run_episodes(manager: &RobotManager) -> Result<(), PlacementError> {
    for episode in 1..=EPISODES {
        match manager.set_start_and_goal(None, None, manager.min_dist()) {
            Ok(placement) => info!(
                "Episode {}: start ({:.2}, {:.2}) goal ({:.2}, {:.2}), {:.2} m apart",
                episode,
                placement.start.x,
                placement.start.y,
                placement.goal.x,
                placement.goal.y,
                placement.start.distance(&placement.goal)
            ),
            Err(e @ PlacementError::Exhausted { .. }) => warn!("Episode {}: {}", episode, e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TaskConfig::from_yaml_file(&path)?,
        None => TaskConfig::default(),
    };
    let robot = match &config.robot_description {
        Some(path) => RobotConfig::from_yaml_file(path)?,
        None => RobotConfig::new("myrobot", 0.2, 1)?,
    };
    info!("Starting task generator ({:?} backend)", config.backend);

    let map = demo_map()?;
    let manager = match config.backend {
        Backend::Loopback => {
            let simulator = Arc::new(LoopbackSimulator::new());
            let planner = Arc::new(LoopbackPlanner::new(LOOPBACK_PLANNER_DELAY));
            let manager = RobotManager::new(
                map,
                robot,
                &config,
                Arc::clone(&simulator) as Arc<dyn SimulatorServices>,
                Arc::clone(&planner) as Arc<dyn GoalPublisher>,
            )?;
            planner.attach(Arc::new(manager.path_listener()));
            manager
        }
        #[cfg(feature = "ros")]
        Backend::Ros => {
            let bridge = Arc::new(robot_placement::ros_interface::RosBridge::new(&config.topics)?);
            let manager = RobotManager::new(
                map,
                robot,
                &config,
                Arc::clone(&bridge) as Arc<dyn SimulatorServices>,
                Arc::clone(&bridge) as Arc<dyn GoalPublisher>,
            )?;
            bridge.attach(Arc::new(manager.path_listener()));
            manager
        }
        #[cfg(not(feature = "ros"))]
        Backend::Ros => {
            return Err("the ros backend needs the `ros` feature".into());
        }
    };

    if let Err(e) = run_episodes(&manager) {
        error!("Placement failed: {}", e);
        return Err(e.into());
    }
    info!("Task generator finished");
    Ok(())
}
