//! # Arm simulation commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be given to the arm simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum ArmCmd {
    /// Move each joint to the given angle.
    ///
    /// Ignored while the pick-and-place task is running.
    #[structopt(name = "joints")]
    Joints {
        /// Angle of the base in degrees.
        base_deg: f64,

        /// Angle of the shoulder in degrees, zero is straight up.
        shoulder_deg: f64,

        /// Angle of the elbow relative to the shoulder in degrees.
        elbow_deg: f64,

        /// Gripper opening, 0 is closed and 1 is fully open.
        gripper_open: f64,
    },

    /// Move the grip point to the given world position.
    ///
    /// Ignored while the pick-and-place task is running.
    #[structopt(name = "reach")]
    Reach {
        x: f64,
        y: f64,
        z: f64,

        /// Gripper opening, 0 is closed and 1 is fully open.
        gripper_open: f64,
    },

    /// Start the pick-and-place task.
    #[structopt(name = "start")]
    Start,

    /// Stop the task, send the arm home and place the object at the given
    /// position.
    #[structopt(name = "reset")]
    Reset { x: f64, y: f64, z: f64 },

    /// Stop the arm where it is, maintaining the current joint angles, and
    /// abort the task.
    #[structopt(name = "stop")]
    Stop,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmCmd {
    /// Determine if the command is valid (i.e. all values are finite).
    pub fn is_valid(&self) -> bool {
        match self {
            ArmCmd::Joints {
                base_deg,
                shoulder_deg,
                elbow_deg,
                gripper_open,
            } => [base_deg, shoulder_deg, elbow_deg, gripper_open]
                .iter()
                .all(|v| v.is_finite()),
            ArmCmd::Reach {
                x,
                y,
                z,
                gripper_open,
            } => [x, y, z, gripper_open].iter().all(|v| v.is_finite()),
            ArmCmd::Reset { x, y, z } => [x, y, z].iter().all(|v| v.is_finite()),
            ArmCmd::Start | ArmCmd::Stop => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_json_forms() {
        let start: ArmCmd = serde_json::from_str("\"Start\"").unwrap();
        assert_eq!(start, ArmCmd::Start);

        let reset: ArmCmd =
            serde_json::from_str(r#"{"Reset": {"x": 15.0, "y": 0.75, "z": 0.0}}"#).unwrap();
        assert_eq!(
            reset,
            ArmCmd::Reset {
                x: 15.0,
                y: 0.75,
                z: 0.0
            }
        );
    }

    #[test]
    fn test_cli_form() {
        let cmd = ArmCmd::from_iter_safe(&["arm", "reach", "10", "5", "3", "0.5"]).unwrap();
        assert_eq!(
            cmd,
            ArmCmd::Reach {
                x: 10.0,
                y: 5.0,
                z: 3.0,
                gripper_open: 0.5
            }
        );
    }

    #[test]
    fn test_validity() {
        assert!(ArmCmd::Start.is_valid());
        assert!(ArmCmd::Joints {
            base_deg: 0.0,
            shoulder_deg: -45.0,
            elbow_deg: 10.0,
            gripper_open: 1.0
        }
        .is_valid());
        assert!(!ArmCmd::Reset {
            x: std::f64::NAN,
            y: 0.0,
            z: 0.0
        }
        .is_valid());
    }
}
