//! # Task sequencer module
//!
//! This module implements the [`TaskSeq`] state machine, which runs the
//! pick-and-place task one cycle at a time. Each phase writes the arm's target
//! angles when it is entered, waits out a settle countdown, and then checks
//! once per cycle whether it is complete. The phases are described in
//! [`TaskPhase`].
//!
//! The sequencer never writes the arm's current angles, only its targets. The
//! grasp model is driven from the `Grip` and `Release` phases.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod phase;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use nalgebra::{Point3, Vector3};

pub use self::{
    params::{MissedGraspPolicy, SettleTicks, TaskSeqParams},
    phase::TaskPhase,
};
use crate::{arm_ctrl::ArmCtrl, grasp::GraspModel};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Task sequencer
#[derive(Debug, Clone)]
pub struct TaskSeq {
    /// The phase currently being executed.
    phase: TaskPhase,

    /// Number of cycles left before the current phase is evaluated.
    settle_remaining: u32,

    /// Position of the object when the task was started.
    pick_pos: Point3<f64>,

    /// True once the current `Grip` or `Release` phase has acted on the
    /// grasp model.
    grasp_actioned: bool,
}

/// Outcome of one cycle of the sequencer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskStepReport {
    /// The phase changed during this cycle.
    pub phase_changed: bool,

    /// A grasp was attempted this cycle and missed the object.
    pub grasp_missed: bool,

    /// The task ran to completion this cycle.
    pub completed: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur setting up the task sequencer.
#[derive(Debug, thiserror::Error)]
pub enum TaskSeqError {
    #[error("Invalid task parameters: {0}")]
    InvalidParams(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TaskSeq {
    fn default() -> Self {
        Self {
            phase: TaskPhase::Idle,
            settle_remaining: 0,
            pick_pos: Point3::origin(),
            grasp_actioned: false,
        }
    }
}

impl TaskSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TaskPhase::Idle
    }

    pub fn settle_remaining(&self) -> u32 {
        self.settle_remaining
    }

    pub fn pick_pos(&self) -> Point3<f64> {
        self.pick_pos
    }

    /// Start the task, picking up the object from where it currently lies.
    ///
    /// Only accepted while idle with the object free. Returns true if the
    /// task was started.
    pub fn start(&mut self, params: &TaskSeqParams, arm: &mut ArmCtrl, grasp: &GraspModel) -> bool {
        if !self.is_idle() {
            warn!("Cannot start the task while in {}, ignored", self.phase);
            return false;
        }

        let pick_pos = match grasp.free_position() {
            Some(p) => p,
            None => {
                warn!("Cannot start the task while the object is held, ignored");
                return false;
            }
        };

        info!(
            "Starting pick and place from {} to {}",
            pick_pos,
            params.drop_point()
        );

        self.pick_pos = pick_pos;
        self.enter(TaskPhase::Approach, params, arm);

        true
    }

    /// Force the sequencer back to `Idle`. Valid from any phase.
    pub fn reset(&mut self) {
        if !self.is_idle() {
            info!("TaskSeq reset from {}", self.phase);
        }

        *self = Self::default();
    }

    /// Run one cycle of the sequencer.
    ///
    /// Should be called before the arm is stepped, so the targets it writes
    /// take effect in the same cycle.
    pub fn step(
        &mut self,
        params: &TaskSeqParams,
        arm: &mut ArmCtrl,
        grasp: &mut GraspModel,
    ) -> TaskStepReport {
        let mut report = TaskStepReport::default();

        if self.is_idle() {
            return report;
        }

        if self.settle_remaining > 0 {
            self.settle_remaining -= 1;
            return report;
        }

        // Keep the phase's targets applied while it is evaluated
        self.apply_targets(params, arm);

        let phase_done = match self.phase {
            TaskPhase::Idle => false,
            TaskPhase::Grip => {
                if !self.grasp_actioned && self.gripper_near(params.gripper_closed, params, arm) {
                    self.grasp_actioned = true;

                    if !grasp.attempt_grasp(&arm.end_effector_transform()) {
                        report.grasp_missed = true;

                        match params.missed_grasp_policy {
                            MissedGraspPolicy::Abort => {
                                warn!("Grasp missed the object, aborting the task");
                                self.enter(TaskPhase::Idle, params, arm);
                                report.phase_changed = true;
                                return report;
                            }
                            MissedGraspPolicy::Proceed => {
                                warn!("Grasp missed the object, continuing with nothing held")
                            }
                        }
                    }
                }

                self.grasp_actioned && arm.gripper_arrived()
            }
            TaskPhase::Release => {
                if !self.grasp_actioned && self.gripper_near(params.gripper_open, params, arm) {
                    self.grasp_actioned = true;
                    grasp.release(&arm.end_effector_transform());
                }

                self.grasp_actioned && arm.gripper_arrived()
            }
            p if p.is_positional() => arm.arrived(),
            _ => false,
        };

        if phase_done {
            let next = self.phase.next();

            if next == TaskPhase::Idle {
                info!("Pick and place task complete");
                report.completed = true;
            }

            self.enter(next, params, arm);
            report.phase_changed = true;
        }

        report
    }

    /// Switch to a new phase, writing its targets and starting its settle
    /// countdown.
    fn enter(&mut self, phase: TaskPhase, params: &TaskSeqParams, arm: &mut ArmCtrl) {
        self.phase = phase;
        self.settle_remaining = params.settle_ticks.for_phase(phase);
        self.grasp_actioned = false;

        info!("TaskSeq phase change to: {}", phase);

        self.apply_targets(params, arm);
    }

    /// Write the targets for the current phase into the arm.
    fn apply_targets(&self, params: &TaskSeqParams, arm: &mut ArmCtrl) {
        let up = Vector3::y();
        let drop_pos = params.drop_point();

        match self.phase {
            TaskPhase::Idle => (),
            TaskPhase::Approach => {
                arm.set_target_position(
                    &(self.pick_pos + up * params.approach_height),
                    params.gripper_open,
                );
            }
            TaskPhase::Descend => {
                arm.set_target_position(
                    &(self.pick_pos + up * params.grasp_height_offset),
                    params.gripper_open,
                );
            }
            TaskPhase::Grip => arm.set_gripper_target(params.gripper_closed),
            TaskPhase::Lift => {
                arm.set_target_position(
                    &(self.pick_pos + up * params.lift_height),
                    params.gripper_closed,
                );
            }
            TaskPhase::Traverse => {
                arm.set_target_position(&(drop_pos + up * params.lift_height), params.gripper_closed);
            }
            TaskPhase::Lower => {
                arm.set_target_position(
                    &(drop_pos + up * params.grasp_height_offset),
                    params.gripper_closed,
                );
            }
            TaskPhase::Release => arm.set_gripper_target(params.gripper_open),
            TaskPhase::Home => {
                let mut home = arm.params().home;
                home.gripper_open = params.gripper_open;
                arm.set_target(home);
            }
        }

        debug!("{} target: {:?}", self.phase, arm.target());
    }

    /// True if the gripper is within the grasp trigger of `gripper_target`.
    fn gripper_near(&self, gripper_target: f64, params: &TaskSeqParams, arm: &ArmCtrl) -> bool {
        (arm.current().gripper_open - gripper_target).abs() <= params.grasp_trigger
            || arm.gripper_arrived()
    }
}
