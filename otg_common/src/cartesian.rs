//! Cartesian state ↔ 6-DOF joint record conversions.
//!
//! A Cartesian pose is generated as six independent DOFs named
//! [`CARTESIAN_DOF_NAMES`]: `x, y, z` for position and `rot_x, rot_y, rot_z`
//! for orientation as roll/pitch/yaw Euler angles. Linear and angular
//! velocity/acceleration map onto the same six slots.
//!
//! Euler angles wrap at ±π; targets across the wrap are generated the long
//! way round.

use nalgebra::{UnitQuaternion, Vector3};

use crate::consts::CARTESIAN_DOF_NAMES;
use crate::constraint::NameNotFound;
use crate::samples::{ConstrainedJointsCommand, JointState, JointsCommand, JointsSample};

/// Pose and its derivatives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianState {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    pub angular_acceleration: Vector3<f64>,
}

impl Default for CartesianState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            angular_acceleration: Vector3::zeros(),
        }
    }
}

/// Roll/pitch/yaw of a unit quaternion.
pub fn quaternion_to_euler(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = q.euler_angles();
    Vector3::new(roll, pitch, yaw)
}

/// Unit quaternion from roll/pitch/yaw.
pub fn euler_to_quaternion(euler: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(euler.x, euler.y, euler.z)
}

fn dof_names() -> Vec<String> {
    CARTESIAN_DOF_NAMES.iter().map(|n| n.to_string()).collect()
}

impl CartesianState {
    pub fn from_pose(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
            ..Default::default()
        }
    }

    /// Six per-DOF `(position, speed, acceleration)` triples.
    fn dof_values(&self) -> [(f64, f64, f64); 6] {
        let euler = quaternion_to_euler(&self.orientation);
        let mut out = [(0.0, 0.0, 0.0); 6];
        for i in 0..3 {
            out[i] = (self.position[i], self.velocity[i], self.acceleration[i]);
            out[i + 3] = (
                euler[i],
                self.angular_velocity[i],
                self.angular_acceleration[i],
            );
        }
        out
    }

    /// Full state as a 6-DOF sensor sample.
    pub fn to_joints_sample(&self) -> JointsSample {
        JointsSample {
            names: dof_names(),
            elements: self
                .dof_values()
                .iter()
                .map(|(p, v, a)| JointState::new(*p, *v, *a))
                .collect(),
        }
    }

    /// Pose and velocity as a 6-DOF position target.
    pub fn to_target_command(&self) -> ConstrainedJointsCommand {
        ConstrainedJointsCommand {
            names: dof_names(),
            elements: self
                .dof_values()
                .iter()
                .map(|(p, v, _)| JointState {
                    position: Some(*p),
                    speed: Some(*v),
                    acceleration: None,
                })
                .collect(),
            motion_constraints: Vec::new(),
        }
    }

    /// Rebuild a Cartesian state from a 6-DOF command. Unset values read as 0.
    pub fn from_command(command: &JointsCommand) -> Result<Self, NameNotFound> {
        let mut pos = [0.0; 6];
        let mut vel = [0.0; 6];
        let mut acc = [0.0; 6];
        for (i, name) in CARTESIAN_DOF_NAMES.iter().enumerate() {
            let state = command
                .get(name)
                .ok_or_else(|| NameNotFound(name.to_string()))?;
            pos[i] = state.position().unwrap_or(0.0);
            vel[i] = state.speed().unwrap_or(0.0);
            acc[i] = state.acceleration().unwrap_or(0.0);
        }
        Ok(Self {
            position: Vector3::new(pos[0], pos[1], pos[2]),
            orientation: euler_to_quaternion(&Vector3::new(pos[3], pos[4], pos[5])),
            velocity: Vector3::new(vel[0], vel[1], vel[2]),
            angular_velocity: Vector3::new(vel[3], vel[4], vel[5]),
            acceleration: Vector3::new(acc[0], acc[1], acc[2]),
            angular_acceleration: Vector3::new(acc[3], acc[4], acc[5]),
        })
    }
}
