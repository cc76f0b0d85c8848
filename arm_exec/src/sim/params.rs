//! Parameters for the arm simulation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::ArmSimError;
use crate::{arm_ctrl, grasp::GraspParams, task_seq::TaskSeqParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the arm simulation and all its modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmSimParams {
    /// Where the object lies when the simulation starts.
    pub object_start_pos: [f64; 3],

    pub arm_ctrl: arm_ctrl::Params,

    pub grasp: GraspParams,

    pub task_seq: TaskSeqParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmSimParams {
    /// Check the parameters of every module in the simulation.
    pub fn validate(&self) -> Result<(), ArmSimError> {
        if !self.object_start_pos.iter().all(|v| v.is_finite()) {
            return Err(ArmSimError::InvalidObjectStart(self.object_start_pos));
        }

        self.arm_ctrl.validate()?;
        self.grasp.validate()?;
        self.task_seq.validate()?;

        Ok(())
    }

    pub fn object_start_point(&self) -> Point3<f64> {
        Point3::new(
            self.object_start_pos[0],
            self.object_start_pos[1],
            self.object_start_pos[2],
        )
    }
}

impl Default for ArmSimParams {
    fn default() -> Self {
        Self {
            object_start_pos: [15.0, 0.75, 0.0],
            arm_ctrl: arm_ctrl::Params::default(),
            grasp: GraspParams::default(),
            task_seq: TaskSeqParams::default(),
        }
    }
}
