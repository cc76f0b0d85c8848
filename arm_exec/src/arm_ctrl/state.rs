//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// Internal
use super::{
    forward_kinematics, inverse_kinematics, joint_driver, ArmCtrlError, DriveParams, IkSolution,
    JointAngles, Params, NUM_ROT_AXES,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Debug, Default)]
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    current: JointAngles,

    target: JointAngles,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Set for each rotational axis whose target was clamped to the axis
    /// limits.
    pub abs_pos_limited: [bool; NUM_ROT_AXES],

    /// Set if the gripper target was clamped into `[0, 1]`.
    pub gripper_limited: bool,

    /// Set if an IK target was out of reach and the closest reachable point
    /// was used instead.
    pub reach_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrl {
    /// Create a new arm controller resting at the home position.
    pub fn new(params: Params) -> Result<Self, ArmCtrlError> {
        params.validate()?;

        let mut arm_ctrl = Self {
            params,
            ..Default::default()
        };
        arm_ctrl.reset();

        Ok(arm_ctrl)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The joint angles the arm is currently at.
    pub fn current(&self) -> &JointAngles {
        &self.current
    }

    /// The joint angles the arm is moving towards.
    pub fn target(&self) -> &JointAngles {
        &self.target
    }

    /// Return the status report accumulated since the last call and clear it.
    pub fn take_report(&mut self) -> StatusReport {
        std::mem::take(&mut self.report)
    }

    /// Set a new target configuration, limited to the arm's capabilities.
    ///
    /// The base is sent the shortest way round to the target heading, as far
    /// as the base limits allow.
    pub fn set_target(&mut self, target: JointAngles) {
        self.target = target;
        self.unwrap_base_target();
        self.enforce_limits();
    }

    /// Set the target so that the grip point reaches `position`, with the
    /// given gripper opening.
    pub fn set_target_position(&mut self, position: &Point3<f64>, gripper_open: f64) -> IkSolution {
        let solution = inverse_kinematics::solve(position, &self.params.geometry);

        if solution.reach_limited {
            self.report.reach_limited = true;
        }

        debug!("IK target {} -> {:?}", position, solution);

        self.set_target(solution.with_gripper(gripper_open));

        solution
    }

    /// Change only the gripper target, leaving the rotational axes where
    /// they are aimed.
    pub fn set_gripper_target(&mut self, gripper_open: f64) {
        let mut target = self.target;
        target.gripper_open = gripper_open;
        self.set_target(target);
    }

    /// Move the current angles one cycle towards the target.
    pub fn step(&mut self, drive: &DriveParams) {
        self.current = joint_driver::advance(&self.current, &self.target, drive);
    }

    /// Returns true if all joints are within the arrival tolerance of the
    /// target.
    pub fn arrived(&self) -> bool {
        joint_driver::arrived(&self.current, &self.target, &self.params.arrival_tolerance)
    }

    /// Returns true if the gripper is within the arrival tolerance of its
    /// target.
    pub fn gripper_arrived(&self) -> bool {
        joint_driver::gripper_arrived(
            &self.current,
            &self.target,
            &self.params.arrival_tolerance,
        )
    }

    /// Transform from the grip point frame to the world frame.
    pub fn end_effector_transform(&self) -> Isometry3<f64> {
        forward_kinematics::end_effector_transform(&self.current, &self.params.geometry)
    }

    /// World position of the grip point.
    pub fn end_effector(&self) -> Point3<f64> {
        forward_kinematics::compute_end_effector(&self.current, &self.params.geometry)
    }

    /// Function called when entering safe mode.
    ///
    /// The target is replaced with the current angles, so the arm holds
    /// still where it is.
    pub fn make_safe(&mut self) {
        self.target = self.current;
    }

    /// Put the arm straight back at its home position, without driving
    /// there.
    pub fn reset(&mut self) {
        self.current = self.params.home;
        self.target = self.params.home;
        self.report = StatusReport::default();
    }

    /// Replace the base target with the equivalent heading, a whole turn
    /// either way, which is closest to the current base angle and within the
    /// base limits. Left alone if no turn of it is within the limits.
    fn unwrap_base_target(&mut self) {
        let current = self.current.base_deg;
        let target = self.target.base_deg;
        let min = self.params.min_abs_pos_deg[0];
        let max = self.params.max_abs_pos_deg[0];

        let closest = [target, target - 360.0, target + 360.0]
            .iter()
            .copied()
            .filter(|b| *b >= min && *b <= max)
            .min_by(|a, b| {
                (a - current)
                    .abs()
                    .partial_cmp(&(b - current).abs())
                    .unwrap_or(Ordering::Equal)
            });

        if let Some(base_deg) = closest {
            self.target.base_deg = base_deg;
        }
    }

    /// Enforce the limits in the arm's hardware capabilities.
    ///
    /// This function shall modify the current target configuration to ensure
    /// that no capability of the arm is exceeded.
    ///
    /// If a limit is reached the corresponding flag in the status report will
    /// be raised.
    fn enforce_limits(&mut self) {
        let max = self.params.max_abs_pos_deg;
        let min = self.params.min_abs_pos_deg;

        for (i, axis) in self.target.rot_axes_deg_mut().iter_mut().enumerate() {
            if **axis > max[i] {
                **axis = max[i];
                self.report.abs_pos_limited[i] = true;
            }
            if **axis < min[i] {
                **axis = min[i];
                self.report.abs_pos_limited[i] = true;
            }
        }

        if !(0.0..=1.0).contains(&self.target.gripper_open) {
            self.target.gripper_open = self.target.gripper_open.max(0.0).min(1.0);
            self.report.gripper_limited = true;
        }
    }
}
