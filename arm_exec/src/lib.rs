//! # Arm library.
//!
//! Kinematics, joint driving, grasping and task sequencing for a pick and place arm. The
//! `arm_exec` executable and the benchmarks access the arm through this library.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - joint angles, forward and inverse kinematics and the joint driver
pub mod arm_ctrl;

/// Grasp model - attaches the object to the gripper and lets it go again
pub mod grasp;

/// Simulation module - owns the arm, object and task and runs them once per cycle
pub mod sim;

/// Task sequencer - steps the arm through picking up the object and putting it down
pub mod task_seq;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one cycle.
pub const CYCLE_PERIOD_S: f64 = 0.1;

/// Number of cycles per second.
pub const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;
