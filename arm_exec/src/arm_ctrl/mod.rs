//! Arm control module
//!
//! Holds the arm's current and target joint angles, converts between joint
//! space and the grip point position, and drives the joints towards their
//! targets once per cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm_config;
pub mod forward_kinematics;
pub mod inverse_kinematics;
pub mod joint_driver;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use arm_config::*;
pub use forward_kinematics::{compute_end_effector, end_effector_transform};
pub use inverse_kinematics::{solve, IkSolution};
pub use joint_driver::{advance, arrived};
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of rotational axes on the arm (base, shoulder, elbow).
pub const NUM_ROT_AXES: usize = 3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while setting up ArmCtrl.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Invalid arm geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid drive parameters: {0}")]
    InvalidDrive(String),

    #[error("Invalid joint limits: {0}")]
    InvalidLimits(String),
}
