//! Parameters for the task sequencer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::{TaskPhase, TaskSeqError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pick-and-place task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskSeqParams {
    /// Where the object is put down, as the position of its origin.
    pub drop_pos: [f64; 3],

    /// Height above the object the grip point approaches to before
    /// descending.
    pub approach_height: f64,

    /// Height above the pick and drop positions the object is carried at.
    pub lift_height: f64,

    /// Height above the object's origin the grip point is placed at to grasp
    /// or release it.
    pub grasp_height_offset: f64,

    /// Gripper opening used to approach and release the object.
    pub gripper_open: f64,

    /// Gripper opening used to hold the object.
    pub gripper_closed: f64,

    /// The grasp (or release) happens once the gripper is this close to its
    /// closed (or open) target.
    pub grasp_trigger: f64,

    /// Number of cycles each phase waits after it is entered before checking
    /// whether it is complete.
    pub settle_ticks: SettleTicks,

    /// What to do when the object is not within reach of the gripper.
    pub missed_grasp_policy: MissedGraspPolicy,
}

/// Settle countdown for each phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettleTicks {
    pub approach: u32,
    pub descend: u32,
    pub grip: u32,
    pub lift: u32,
    pub traverse: u32,
    pub lower: u32,
    pub release: u32,
    pub home: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reaction of the sequencer to a grasp attempt which misses the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissedGraspPolicy {
    /// Stop the task immediately and return to `Idle`.
    Abort,

    /// Carry on with the gripper closed on nothing.
    Proceed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskSeqParams {
    pub fn drop_point(&self) -> Point3<f64> {
        Point3::new(self.drop_pos[0], self.drop_pos[1], self.drop_pos[2])
    }

    pub fn validate(&self) -> Result<(), TaskSeqError> {
        let finite = self.drop_pos.iter().all(|v| v.is_finite())
            && self.approach_height.is_finite()
            && self.lift_height.is_finite()
            && self.grasp_height_offset.is_finite();

        if !finite {
            return Err(TaskSeqError::InvalidParams(format!(
                "positions and heights must be finite: {:?}",
                self
            )));
        }

        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_range(self.gripper_open) && in_range(self.gripper_closed)) {
            return Err(TaskSeqError::InvalidParams(format!(
                "gripper targets must be within [0, 1], found open {} closed {}",
                self.gripper_open, self.gripper_closed
            )));
        }

        if !(self.grasp_trigger > 0.0) {
            return Err(TaskSeqError::InvalidParams(format!(
                "grasp trigger must be positive, found {}",
                self.grasp_trigger
            )));
        }

        Ok(())
    }
}

impl Default for TaskSeqParams {
    fn default() -> Self {
        Self {
            drop_pos: [0.0, 0.75, -12.0],
            approach_height: 8.0,
            lift_height: 8.0,
            grasp_height_offset: 0.0,
            gripper_open: 1.0,
            gripper_closed: 0.0,
            grasp_trigger: 0.1,
            settle_ticks: SettleTicks::default(),
            missed_grasp_policy: MissedGraspPolicy::Abort,
        }
    }
}

impl SettleTicks {
    pub fn for_phase(&self, phase: TaskPhase) -> u32 {
        match phase {
            TaskPhase::Idle => 0,
            TaskPhase::Approach => self.approach,
            TaskPhase::Descend => self.descend,
            TaskPhase::Grip => self.grip,
            TaskPhase::Lift => self.lift,
            TaskPhase::Traverse => self.traverse,
            TaskPhase::Lower => self.lower,
            TaskPhase::Release => self.release,
            TaskPhase::Home => self.home,
        }
    }
}

impl Default for SettleTicks {
    fn default() -> Self {
        Self {
            approach: 10,
            descend: 10,
            grip: 15,
            lift: 10,
            traverse: 10,
            lower: 10,
            release: 15,
            home: 10,
        }
    }
}
