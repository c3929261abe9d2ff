// src/ros_interface/bridge.rs
// ROS 2 implementation of the simulator and planner boundary. One node owns
// the flatland service clients, the latched goal publisher and the global
// path subscription; a spinner thread drives it while callers block on
// individual requests.

use futures::StreamExt;
use futures::executor::block_on;
use log::{debug, error, info};
use nalgebra::{Quaternion, UnitQuaternion};
use r2r::builtin_interfaces::msg::Time;
use r2r::flatland_msgs::srv::{MoveModel, StepWorld};
use r2r::geometry_msgs::msg::{Point, Pose, PoseStamped};
use r2r::nav_msgs::msg::Path;
use r2r::std_msgs::msg::Header;
use r2r::{Client, Clock, ClockType, Context, Node, Publisher, QosProfile};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{GlobalPath, GoalPublisher, PathSink, SimulatorServices};
use crate::TopicConfig;
use crate::error::ServiceError;
use crate::pose::Pose2D;

const SPIN_PERIOD: Duration = Duration::from_millis(10);
const MAP_FRAME: &str = "map";

type SinkSlot = Arc<Mutex<Option<Arc<dyn PathSink>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_duration(stamp: &Time) -> Duration {
    Duration::new(stamp.sec.max(0) as u64, stamp.nanosec)
}

fn to_pose2d(pose: &Pose) -> Pose2D {
    let q = &pose.orientation;
    let orientation = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z));
    Pose2D::with_orientation(pose.position.x, pose.position.y, &orientation)
}

/// ROS 2 node implementing [`SimulatorServices`] and [`GoalPublisher`]
pub struct RosBridge {
    topics: TopicConfig,
    move_client: Mutex<Client<MoveModel::Service>>,
    step_client: Mutex<Client<StepWorld::Service>>,
    goal_publisher: Mutex<Publisher<PoseStamped>>,
    clock: Mutex<Clock>,
    available: HashMap<String, Arc<AtomicBool>>,
    sink: SinkSlot,
    running: Arc<AtomicBool>,
    spinner: Option<JoinHandle<()>>,
}

impl RosBridge {
    /// Creates the node, its clients and topics, and starts spinning
    pub fn new(topics: &TopicConfig) -> Result<Self, r2r::Error> {
        let context = Context::create()?;
        let mut node = Node::create(context, &topics.node_name, "")?;

        let move_client =
            node.create_client::<MoveModel::Service>(&topics.move_model_service, QosProfile::default())?;
        let step_client =
            node.create_client::<StepWorld::Service>(&topics.step_world_service, QosProfile::default())?;
        // Latched, so a planner started after us still sees the last goal
        let goal_publisher = node.create_publisher::<PoseStamped>(
            &topics.goal_topic,
            QosProfile::default().keep_last(1).transient_local(),
        )?;
        let paths = node.subscribe::<Path>(&topics.path_topic, QosProfile::default())?;

        let mut available = HashMap::new();
        for (service, ready) in [
            (&topics.move_model_service, node.is_available(&move_client)?),
            (&topics.step_world_service, node.is_available(&step_client)?),
        ] {
            let flag = Arc::new(AtomicBool::new(false));
            let set = Arc::clone(&flag);
            let name = service.clone();
            thread::spawn(move || {
                if block_on(ready).is_ok() {
                    info!("Service {} is available", name);
                    set.store(true, Ordering::SeqCst);
                }
            });
            available.insert(service.clone(), flag);
        }

        let sink: SinkSlot = Arc::new(Mutex::new(None));
        let path_sink = Arc::clone(&sink);
        thread::spawn(move || {
            block_on(paths.for_each(|msg| {
                let path = GlobalPath::new(
                    to_duration(&msg.header.stamp),
                    msg.poses.iter().map(|p| to_pose2d(&p.pose)).collect(),
                );
                match lock(&path_sink).as_ref() {
                    Some(sink) => sink.on_path(path),
                    None => debug!("Dropping path stamped {:?}: no listener", path.stamp),
                }
                futures::future::ready(())
            }));
        });

        let running = Arc::new(AtomicBool::new(true));
        let spinning = Arc::clone(&running);
        let spinner = thread::spawn(move || {
            while spinning.load(Ordering::SeqCst) {
                node.spin_once(SPIN_PERIOD);
            }
        });

        info!("ROS bridge {} started", topics.node_name);
        Ok(RosBridge {
            topics: topics.clone(),
            move_client: Mutex::new(move_client),
            step_client: Mutex::new(step_client),
            goal_publisher: Mutex::new(goal_publisher),
            clock: Mutex::new(Clock::create(ClockType::RosTime)?),
            available,
            sink,
            running,
            spinner: Some(spinner),
        })
    }

    /// Routes incoming global paths to `sink`
    pub fn attach(&self, sink: Arc<dyn PathSink>) {
        *lock(&self.sink) = Some(sink);
    }

    fn now(&self) -> Time {
        match lock(&self.clock).get_now() {
            Ok(now) => Clock::to_builtin_time(&now),
            Err(e) => {
                error!("Failed to read ROS time: {}", e);
                Time::default()
            }
        }
    }
}

impl SimulatorServices for RosBridge {
    fn wait_for_service(&self, service: &str, timeout: Duration) -> Result<(), ServiceError> {
        let flag = self.available.get(service).ok_or_else(|| ServiceError::CallFailed {
            service: service.to_string(),
            reason: "no client for this service".to_string(),
        })?;

        let deadline = Instant::now() + timeout;
        while !flag.load(Ordering::SeqCst) {
            if Instant::now() >= deadline {
                return Err(ServiceError::Unavailable {
                    service: service.to_string(),
                    waited: timeout,
                });
            }
            thread::sleep(SPIN_PERIOD);
        }
        Ok(())
    }

    fn move_model(&self, name: &str, pose: &Pose2D) -> Result<(), ServiceError> {
        let service = &self.topics.move_model_service;
        let call_failed = |reason: String| ServiceError::CallFailed {
            service: service.clone(),
            reason,
        };

        let request = MoveModel::Request {
            name: name.to_string(),
            pose: r2r::geometry_msgs::msg::Pose2D {
                x: pose.x,
                y: pose.y,
                theta: pose.theta,
            },
            ..Default::default()
        };
        let response = lock(&self.move_client)
            .request(&request)
            .map_err(|e| call_failed(e.to_string()))?;
        let response = block_on(response).map_err(|e| call_failed(e.to_string()))?;

        if response.success {
            Ok(())
        } else {
            Err(call_failed(response.message))
        }
    }

    fn step_world(&self) -> Result<(), ServiceError> {
        let call_failed = |reason: String| ServiceError::CallFailed {
            service: self.topics.step_world_service.clone(),
            reason,
        };

        let response = lock(&self.step_client)
            .request(&StepWorld::Request::default())
            .map_err(|e| call_failed(e.to_string()))?;
        block_on(response).map_err(|e| call_failed(e.to_string()))?;
        Ok(())
    }
}

impl GoalPublisher for RosBridge {
    fn publish_goal(&self, goal: &Pose2D) -> Result<(), ServiceError> {
        let q = goal.orientation();
        let msg = PoseStamped {
            header: Header {
                stamp: self.now(),
                frame_id: MAP_FRAME.to_string(),
            },
            pose: Pose {
                position: Point {
                    x: goal.x,
                    y: goal.y,
                    z: 0.0,
                },
                orientation: r2r::geometry_msgs::msg::Quaternion {
                    x: q.i,
                    y: q.j,
                    z: q.k,
                    w: q.w,
                },
            },
        };

        lock(&self.goal_publisher)
            .publish(&msg)
            .map_err(|e| ServiceError::PublishFailed {
                topic: self.topics.goal_topic.clone(),
                reason: e.to_string(),
            })
    }
}

impl Drop for RosBridge {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(spinner) = self.spinner.take() {
            if spinner.join().is_err() {
                error!("ROS spinner thread panicked");
            }
        }
    }
}
