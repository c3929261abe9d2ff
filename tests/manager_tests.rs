// tests/manager_tests.rs
// RobotManager construction and map replacement under concurrent readers.

use robot_placement::{
    GoalPublisher, LoopbackPlanner, LoopbackSimulator, OccupancyGrid, PlacementError, Pose2D,
    RobotConfig, RobotManager, ServiceError, SimulatorServices, TaskConfig,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn open_grid(size: usize) -> OccupancyGrid {
    let row = ".".repeat(size);
    let rows: Vec<&str> = (0..size).map(|_| row.as_str()).collect();
    OccupancyGrid::from_ascii(0.5, Pose2D::default(), &rows).unwrap()
}

fn walled_grid() -> OccupancyGrid {
    OccupancyGrid::from_ascii(
        0.5,
        Pose2D::new(-1.0, -1.0, 0.0),
        &["#####", "#.#.#", "#####"],
    )
    .unwrap()
}

fn manager(simulator: LoopbackSimulator, config: &TaskConfig) -> Result<RobotManager, PlacementError> {
    RobotManager::new(
        open_grid(4),
        RobotConfig::new("myrobot", 0.2, 1).unwrap(),
        config,
        Arc::new(simulator) as Arc<dyn SimulatorServices>,
        Arc::new(LoopbackPlanner::new(Duration::ZERO)) as Arc<dyn GoalPublisher>,
    )
}

#[test]
fn test_construction_fails_fast_without_simulator() {
    let config = TaskConfig {
        service_timeout_s: 0,
        ..TaskConfig::default()
    };

    let result = manager(LoopbackSimulator::unavailable(), &config);

    match result {
        Err(PlacementError::ServiceUnavailable(ServiceError::Unavailable { service, .. })) => {
            assert_eq!(service, "move_model")
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("construction should fail"),
    }
}

#[test]
fn test_readers_never_see_mismatched_snapshot() {
    let manager = Arc::new(manager(LoopbackSimulator::new(), &TaskConfig::default()).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checked = 0usize;
                loop {
                    let snapshot = manager.map();
                    let grid = snapshot.grid();
                    let expected = grid.data().iter().filter(|&&v| v == 0).count();
                    assert_eq!(snapshot.free_space().len(), expected);
                    for (row, col) in snapshot.free_space().iter() {
                        assert!(grid.is_free(row, col));
                    }
                    checked += 1;
                    if done.load(Ordering::SeqCst) {
                        break checked;
                    }
                }
            })
        })
        .collect();

    for i in 0..200 {
        if i % 2 == 0 {
            manager.update_map(walled_grid());
        } else {
            manager.update_map(open_grid(6 + i % 5));
        }
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
}

#[test]
fn test_placement_follows_map_update() {
    let manager = manager(LoopbackSimulator::new(), &TaskConfig::default()).unwrap();

    manager.update_map(walled_grid());

    // Only two free cells remain
    for _ in 0..10 {
        let start = manager.set_random_start_position().unwrap();
        let map = manager.map();
        let (row, col) = map.grid().world_to_cell(start.x, start.y).unwrap();
        assert_eq!(row, 1);
        assert!(col == 1 || col == 3);
    }

    manager.update_map(OccupancyGrid::from_ascii(1.0, Pose2D::default(), &["#?#"]).unwrap());
    assert_eq!(
        manager.set_random_start_position(),
        Err(PlacementError::UnplaceableMap)
    );
}
