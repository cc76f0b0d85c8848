//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{ArmCtrlError, JointAngles, NUM_ROT_AXES};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Dimensions of the arm.
    pub geometry: ArmGeometry,

    // ---- CAPABILITIES ----
    /// Maximum rotational axis absolute position (highest positive value), in
    /// the order base, shoulder, elbow.
    ///
    /// Units: degrees
    pub max_abs_pos_deg: [f64; NUM_ROT_AXES],

    /// Minimum rotational axis absolute position (lowest negative value), in
    /// the order base, shoulder, elbow.
    ///
    /// Units: degrees
    pub min_abs_pos_deg: [f64; NUM_ROT_AXES],

    /// Default SAFE position of the arm, used at start up and on reset.
    pub home: JointAngles,

    // ---- DRIVING ----
    /// How the joints move while under manual control.
    pub manual_drive: DriveParams,

    /// How the joints move while the task sequencer is running.
    pub task_drive: DriveParams,

    /// How close the joints must be to their targets to count as arrived.
    pub arrival_tolerance: ArrivalTolerance,
}

/// Dimensions of the arm.
///
/// Units: scene units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    /// Height of the shoulder joint above the floor.
    pub base_height: f64,

    /// Length of the lower link, shoulder to elbow.
    pub lower_link_length: f64,

    /// Length of the upper link, elbow to wrist.
    pub upper_link_length: f64,

    /// Distance from the wrist to the grip point, along the upper link.
    pub wrist_reach_offset: f64,
}

/// Joint motion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveParams {
    pub mode: DriveMode,

    /// Rate for the rotational axes. In `Proportional` mode this is the
    /// fraction of the remaining error removed each cycle, in `FixedStep`
    /// mode the maximum change per cycle in degrees.
    pub arm_rate: f64,

    /// Rate for the gripper, with the same meaning as `arm_rate` but in
    /// opening units.
    pub gripper_rate: f64,

    /// Rotational axes closer than this to their target snap onto it.
    ///
    /// Units: degrees
    pub arm_snap_deg: f64,

    /// Gripper closer than this to its target snaps onto it.
    pub gripper_snap: f64,
}

/// Tolerances used to decide whether the joints have reached their targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrivalTolerance {
    /// Units: degrees
    pub angle_deg: f64,

    pub gripper: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The way joints approach their targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveMode {
    /// Ease towards the target, removing a fixed fraction of the error each
    /// cycle.
    Proportional,

    /// Move a fixed amount per cycle until the target is reached.
    FixedStep,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check that the parameters describe a physically meaningful arm.
    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        self.geometry.validate()?;
        self.manual_drive.validate()?;
        self.task_drive.validate()?;

        for i in 0..NUM_ROT_AXES {
            if self.min_abs_pos_deg[i] > self.max_abs_pos_deg[i] {
                return Err(ArmCtrlError::InvalidLimits(format!(
                    "axis {} has min {} above max {}",
                    i, self.min_abs_pos_deg[i], self.max_abs_pos_deg[i]
                )));
            }
        }

        if !(self.arrival_tolerance.angle_deg > 0.0 && self.arrival_tolerance.gripper > 0.0) {
            return Err(ArmCtrlError::InvalidDrive(format!(
                "arrival tolerances must be positive, found {:?}",
                self.arrival_tolerance
            )));
        }

        if !self.home.is_finite() {
            return Err(ArmCtrlError::InvalidLimits(format!(
                "home position is not finite: {:?}",
                self.home
            )));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            geometry: ArmGeometry::default(),
            max_abs_pos_deg: [360.0, 180.0, 180.0],
            min_abs_pos_deg: [-360.0, -180.0, -180.0],
            home: JointAngles::new(0.0, 0.0, 0.0, 0.8),
            manual_drive: DriveParams {
                mode: DriveMode::Proportional,
                arm_rate: 0.1,
                gripper_rate: 0.1,
                arm_snap_deg: 0.05,
                gripper_snap: 0.005,
            },
            task_drive: DriveParams {
                mode: DriveMode::FixedStep,
                arm_rate: 1.0,
                gripper_rate: 0.05,
                arm_snap_deg: 0.05,
                gripper_snap: 0.005,
            },
            arrival_tolerance: ArrivalTolerance {
                angle_deg: 0.5,
                gripper: 0.02,
            },
        }
    }
}

impl ArmGeometry {
    /// Length of the second link of the planar chain, which runs from the
    /// elbow to the grip point since the wrist is collinear with the upper
    /// link.
    pub fn upper_reach(&self) -> f64 {
        self.upper_link_length + self.wrist_reach_offset
    }

    /// Furthest distance from the shoulder the grip point can reach.
    pub fn max_reach(&self) -> f64 {
        self.lower_link_length + self.upper_reach()
    }

    /// Closest distance from the shoulder the grip point can reach.
    pub fn min_reach(&self) -> f64 {
        (self.lower_link_length - self.upper_reach()).abs()
    }

    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        let lengths = [
            ("base_height", self.base_height),
            ("lower_link_length", self.lower_link_length),
            ("upper_link_length", self.upper_link_length),
            ("wrist_reach_offset", self.wrist_reach_offset),
        ];

        for (name, value) in lengths.iter() {
            // Written this way so that NAN is rejected too
            if !(*value > 0.0 && value.is_finite()) {
                return Err(ArmCtrlError::InvalidGeometry(format!(
                    "{} must be positive, found {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            base_height: 2.0,
            lower_link_length: 20.0,
            upper_link_length: 15.0,
            wrist_reach_offset: 2.4,
        }
    }
}

impl DriveParams {
    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        let rates_ok = match self.mode {
            DriveMode::Proportional => {
                self.arm_rate > 0.0
                    && self.arm_rate <= 1.0
                    && self.gripper_rate > 0.0
                    && self.gripper_rate <= 1.0
            }
            DriveMode::FixedStep => self.arm_rate > 0.0 && self.gripper_rate > 0.0,
        };

        if !rates_ok {
            return Err(ArmCtrlError::InvalidDrive(format!(
                "rates out of range for {:?} mode: arm {}, gripper {}",
                self.mode, self.arm_rate, self.gripper_rate
            )));
        }

        if !(self.arm_snap_deg > 0.0 && self.gripper_snap > 0.0) {
            return Err(ArmCtrlError::InvalidDrive(format!(
                "snap epsilons must be positive: arm {}, gripper {}",
                self.arm_snap_deg, self.gripper_snap
            )));
        }

        Ok(())
    }
}
