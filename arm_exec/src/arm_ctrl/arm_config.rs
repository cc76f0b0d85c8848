//! Arm configuration structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::NUM_ROT_AXES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stores an arm configuration - the positions of all rotational axes and the
/// opening of the gripper.
///
/// The same structure is used for both the current angles (written only by
/// the joint driver) and the target angles (written by manual commands or
/// the task sequencer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Rotation of the base about the world up axis.
    ///
    /// Units: degrees
    pub base_deg: f64,

    /// Rotation of the lower link about the lateral axis, zero pointing
    /// straight up.
    ///
    /// Units: degrees
    pub shoulder_deg: f64,

    /// Rotation of the upper link about the lateral axis, relative to the
    /// lower link.
    ///
    /// Units: degrees
    pub elbow_deg: f64,

    /// Opening of the gripper, 0 is closed and 1 is fully open.
    pub gripper_open: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointAngles {
    pub fn new(base_deg: f64, shoulder_deg: f64, elbow_deg: f64, gripper_open: f64) -> Self {
        Self {
            base_deg,
            shoulder_deg,
            elbow_deg,
            gripper_open,
        }
    }

    /// Positions of the rotational axes in the order base, shoulder, elbow.
    pub fn rot_axes_deg(&self) -> [f64; NUM_ROT_AXES] {
        [self.base_deg, self.shoulder_deg, self.elbow_deg]
    }

    /// Mutable references to the rotational axes in the order base,
    /// shoulder, elbow.
    pub fn rot_axes_deg_mut(&mut self) -> [&mut f64; NUM_ROT_AXES] {
        [&mut self.base_deg, &mut self.shoulder_deg, &mut self.elbow_deg]
    }

    /// True if every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.rot_axes_deg().iter().all(|a| a.is_finite()) && self.gripper_open.is_finite()
    }
}
