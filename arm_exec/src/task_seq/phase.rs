//! Phases of the pick-and-place task

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A phase of the pick-and-place task.
///
/// The task is cyclic, starting and ending in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    /// Not running.
    Idle,
    /// Move above the object with the gripper open.
    Approach,
    /// Lower the grip point onto the object.
    Descend,
    /// Close the gripper and grasp the object.
    Grip,
    /// Raise the object clear of the floor.
    Lift,
    /// Carry the object above the drop position.
    Traverse,
    /// Lower the object onto the drop position.
    Lower,
    /// Open the gripper and let go of the object.
    Release,
    /// Return the arm to its home position.
    Home,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskPhase {
    /// The phase which follows this one on normal completion.
    pub fn next(self) -> Self {
        use TaskPhase::*;

        match self {
            Idle => Idle,
            Approach => Descend,
            Descend => Grip,
            Grip => Lift,
            Lift => Traverse,
            Traverse => Lower,
            Lower => Release,
            Release => Home,
            Home => Idle,
        }
    }

    /// True for phases which complete when the whole arm reaches its target,
    /// rather than just the gripper.
    pub fn is_positional(self) -> bool {
        !matches!(self, TaskPhase::Idle | TaskPhase::Grip | TaskPhase::Release)
    }
}

impl Default for TaskPhase {
    fn default() -> Self {
        TaskPhase::Idle
    }
}

impl Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
