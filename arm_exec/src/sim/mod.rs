//! # Arm simulation module
//!
//! [`ArmSim`] is the simulation context, owning all mutable state of the arm,
//! the object and the task. One call to `proc` is one simulation cycle:
//!
//! 1. Handle the cycle's command, if any.
//! 2. Step the task sequencer, which writes the arm's targets and acts on the
//!    grasp model.
//! 3. Step the joint driver, moving the current angles towards the targets.
//! 4. Build the frame a renderer needs from the new state.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cmd;
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use nalgebra::Point3;
use serde::Serialize;
use util::module::State;

pub use self::{cmd::ArmCmd, params::ArmSimParams};
use crate::{
    arm_ctrl::{self, ArmCtrl, ArmCtrlError, JointAngles},
    grasp::{GraspError, GraspModel},
    task_seq::{TaskPhase, TaskSeq, TaskSeqError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The arm simulation context.
#[derive(Debug, Default)]
pub struct ArmSim {
    params: ArmSimParams,
    arm: ArmCtrl,
    grasp: GraspModel,
    task_seq: TaskSeq,
    num_cycles: u64,
}

/// Input data to the arm simulation.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<ArmCmd>,
}

/// Everything a renderer reads after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmFrame {
    /// Number of cycles completed, including this one.
    pub cycle: u64,

    pub angles: JointAngles,

    pub target: JointAngles,

    pub end_effector: [f64; 3],

    pub object_pos: [f64; 3],

    pub object_held: bool,

    pub phase: TaskPhase,
}

/// Status report for a cycle of the arm simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub arm: arm_ctrl::StatusReport,

    /// The command given this cycle could not be acted on in the current
    /// state.
    pub cmd_ignored: bool,

    /// A grasp was attempted this cycle and missed the object.
    pub grasp_missed: bool,

    /// The task ran to completion this cycle.
    pub task_completed: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the arm simulation.
#[derive(Debug, thiserror::Error)]
pub enum ArmSimError {
    #[error("Failed to load ArmSimParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid ArmCtrl parameters: {0}")]
    ArmCtrlError(#[from] ArmCtrlError),

    #[error("Invalid TaskSeq parameters: {0}")]
    TaskSeqError(#[from] TaskSeqError),

    #[error("Invalid grasp parameters: {0}")]
    GraspError(#[from] GraspError),

    #[error("Invalid object start position: {0:?}")]
    InvalidObjectStart([f64; 3]),

    #[error("Recieved an invalid arm command: {0:?}")]
    InvalidCmd(ArmCmd),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl State for ArmSim {
    type InitData = String;
    type InitError = ArmSimError;

    type InputData = InputData;
    type OutputData = ArmFrame;
    type StatusReport = StatusReport;
    type ProcError = ArmSimError;

    /// Initialise the arm simulation.
    ///
    /// Expected init data is the path to the parameter file, relative to the
    /// params directory.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: ArmSimParams =
            util::params::load(&init_data).map_err(ArmSimError::ParamLoadError)?;

        *self = Self::new(params)?;

        Ok(())
    }

    /// Perform one cycle of the simulation.
    ///
    /// An invalid command is rejected before anything else happens, in which
    /// case the cycle is not run.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        // Check to see if there's a new command
        if let Some(cmd) = &input_data.cmd {
            if !cmd.is_valid() {
                return Err(ArmSimError::InvalidCmd(cmd.clone()));
            }

            debug!("New ArmSim ArmCmd::{:?}", cmd);

            report.cmd_ignored = !self.handle_cmd(cmd);
        }

        let seq_report = self
            .task_seq
            .step(&self.params.task_seq, &mut self.arm, &mut self.grasp);
        report.grasp_missed = seq_report.grasp_missed;
        report.task_completed = seq_report.completed;

        let drive = match self.task_seq.is_idle() {
            true => self.params.arm_ctrl.manual_drive,
            false => self.params.arm_ctrl.task_drive,
        };
        self.arm.step(&drive);

        self.num_cycles += 1;
        report.arm = self.arm.take_report();

        Ok((self.frame(), report))
    }
}

impl ArmSim {
    /// Create a new simulation with the arm at home and the object at its
    /// start position.
    pub fn new(params: ArmSimParams) -> Result<Self, ArmSimError> {
        params.validate()?;

        let arm = ArmCtrl::new(params.arm_ctrl.clone())?;
        let grasp = GraspModel::new(params.grasp, params.object_start_point());

        Ok(Self {
            params,
            arm,
            grasp,
            task_seq: TaskSeq::new(),
            num_cycles: 0,
        })
    }

    pub fn params(&self) -> &ArmSimParams {
        &self.params
    }

    pub fn arm(&self) -> &ArmCtrl {
        &self.arm
    }

    pub fn grasp(&self) -> &GraspModel {
        &self.grasp
    }

    pub fn phase(&self) -> TaskPhase {
        self.task_seq.phase()
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn is_gripped(&self) -> bool {
        self.grasp.is_gripped()
    }

    /// World position the object is rendered at.
    pub fn object_position(&self) -> Point3<f64> {
        self.grasp
            .render_position(&self.arm.end_effector_transform())
    }

    /// Return the task, object and arm to their starting state, with the
    /// object placed at `object_pos`. Valid at any time.
    pub fn reset(&mut self, object_pos: Point3<f64>) {
        info!("Resetting ArmSim, object placed at {}", object_pos);

        self.task_seq.reset();
        self.grasp.reset(object_pos);
        self.arm.reset();
    }

    /// Build the renderer's view of the current state.
    pub fn frame(&self) -> ArmFrame {
        let end_effector = self.arm.end_effector_transform();
        let grip_point = end_effector.translation.vector;
        let object_pos = self.grasp.render_position(&end_effector);

        ArmFrame {
            cycle: self.num_cycles,
            angles: *self.arm.current(),
            target: *self.arm.target(),
            end_effector: [grip_point.x, grip_point.y, grip_point.z],
            object_pos: [object_pos.x, object_pos.y, object_pos.z],
            object_held: self.grasp.is_gripped(),
            phase: self.task_seq.phase(),
        }
    }

    /// Act on a command. Returns false if the command was ignored.
    fn handle_cmd(&mut self, cmd: &ArmCmd) -> bool {
        match cmd {
            ArmCmd::Joints {
                base_deg,
                shoulder_deg,
                elbow_deg,
                gripper_open,
            } => {
                if !self.task_seq.is_idle() {
                    warn!("Manual joint command ignored while the task is running");
                    return false;
                }

                self.arm.set_target(JointAngles::new(
                    *base_deg,
                    *shoulder_deg,
                    *elbow_deg,
                    *gripper_open,
                ));
            }
            ArmCmd::Reach {
                x,
                y,
                z,
                gripper_open,
            } => {
                if !self.task_seq.is_idle() {
                    warn!("Manual reach command ignored while the task is running");
                    return false;
                }

                self.arm
                    .set_target_position(&Point3::new(*x, *y, *z), *gripper_open);
            }
            ArmCmd::Start => {
                return self
                    .task_seq
                    .start(&self.params.task_seq, &mut self.arm, &self.grasp)
            }
            ArmCmd::Reset { x, y, z } => self.reset(Point3::new(*x, *y, *z)),
            ArmCmd::Stop => {
                info!("Stopping the arm");
                self.task_seq.reset();
                self.arm.make_safe();

                // Nothing keeps hold of the object once the task is gone
                if self.grasp.is_gripped() {
                    self.grasp.release(&self.arm.end_effector_transform());
                }
            }
        }

        true
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        grasp::{GraspParams, ObjectState},
        task_seq::TaskSeqParams,
    };

    const MAX_CYCLES: usize = 5000;

    fn dist(a: &[f64; 3], b: &[f64; 3]) -> f64 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
    }

    fn tick(sim: &mut ArmSim, cmd: Option<ArmCmd>) -> (ArmFrame, StatusReport) {
        sim.proc(&InputData { cmd }).unwrap()
    }

    /// Start the task and run until it completes, returning every frame.
    fn run_task(sim: &mut ArmSim) -> Vec<ArmFrame> {
        let mut frames = vec![sim.frame()];

        let (frame, report) = tick(sim, Some(ArmCmd::Start));
        assert!(!report.cmd_ignored);
        frames.push(frame);

        for _ in 0..MAX_CYCLES {
            let (frame, report) = tick(sim, None);
            frames.push(frame);

            if report.task_completed {
                return frames;
            }
        }

        panic!("Task did not complete within {} cycles", MAX_CYCLES);
    }

    #[test]
    fn test_pick_and_place() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        assert_eq!(sim.object_position(), Point3::new(15.0, 0.75, 0.0));

        let frames = run_task(&mut sim);

        assert_eq!(sim.phase(), TaskPhase::Idle);
        assert!(!sim.is_gripped());

        let final_pos = match sim.grasp().state() {
            ObjectState::Free { world_pos } => *world_pos,
            s => panic!("Object should be free, found {:?}", s),
        };
        assert!((final_pos - Point3::new(0.0, 0.75, -12.0)).norm() < 1e-6);
        assert!(final_pos.y >= 0.75);

        // Every phase of the task was visited in order
        let mut phases: Vec<TaskPhase> = Vec::new();
        for f in frames.iter() {
            if phases.last() != Some(&f.phase) {
                phases.push(f.phase);
            }
        }
        assert_eq!(
            phases,
            vec![
                TaskPhase::Idle,
                TaskPhase::Approach,
                TaskPhase::Descend,
                TaskPhase::Grip,
                TaskPhase::Lift,
                TaskPhase::Traverse,
                TaskPhase::Lower,
                TaskPhase::Release,
                TaskPhase::Home,
                TaskPhase::Idle,
            ]
        );

        // The arm ends up back at home with the gripper open
        assert!(sim.arm().arrived());
        assert_eq!(
            sim.arm().target().rot_axes_deg(),
            sim.params().arm_ctrl.home.rot_axes_deg()
        );
        assert_eq!(sim.arm().target().gripper_open, 1.0);
    }

    #[test]
    fn test_object_motion_is_continuous() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        let frames = run_task(&mut sim);

        // At one degree per cycle per axis the grip point cannot move further
        // than this in a cycle, so neither can the object
        for pair in frames.windows(2) {
            let d = dist(&pair[0].object_pos, &pair[1].object_pos);
            assert!(
                d < 2.0,
                "Object jumped {} between cycles {} and {}",
                d,
                pair[0].cycle,
                pair[1].cycle
            );
        }

        // Object follows the grip point exactly while held
        for f in frames.iter().filter(|f| f.object_held) {
            assert!(dist(&f.object_pos, &f.end_effector) < 1e-6);
        }
    }

    #[test]
    fn test_grasp_with_offset_keeps_position() {
        let mut params = ArmSimParams::default();
        params.task_seq.grasp_height_offset = 3.0;
        let mut sim = ArmSim::new(params).unwrap();

        let frames = run_task(&mut sim);

        let grasp_idx = frames
            .windows(2)
            .position(|p| !p[0].object_held && p[1].object_held)
            .unwrap();
        let release_idx = frames
            .windows(2)
            .position(|p| p[0].object_held && !p[1].object_held)
            .unwrap();

        // No jump at the moment of attachment
        let before = &frames[grasp_idx];
        let after = &frames[grasp_idx + 1];
        assert!(dist(&before.object_pos, &after.object_pos) < 1e-6);

        // Detachment only ever moves the object vertically, onto the floor
        let before = &frames[release_idx];
        let after = &frames[release_idx + 1];
        assert!((before.object_pos[0] - after.object_pos[0]).abs() < 1e-6);
        assert!((before.object_pos[2] - after.object_pos[2]).abs() < 1e-6);
        assert!(after.object_pos[1] >= 0.75);

        assert_eq!(sim.phase(), TaskPhase::Idle);
        assert!(!sim.is_gripped());
    }

    #[test]
    fn test_reset_mid_task() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        tick(&mut sim, Some(ArmCmd::Start));
        for _ in 0..50 {
            tick(&mut sim, None);
        }
        assert_ne!(sim.phase(), TaskPhase::Idle);

        let (frame, report) = tick(
            &mut sim,
            Some(ArmCmd::Reset {
                x: 10.0,
                y: 0.75,
                z: 5.0,
            }),
        );

        assert!(!report.cmd_ignored);
        assert_eq!(frame.phase, TaskPhase::Idle);
        assert!(!frame.object_held);
        assert_eq!(frame.object_pos, [10.0, 0.75, 5.0]);
        assert_eq!(frame.angles, sim.params().arm_ctrl.home);
        assert_eq!(frame.target, sim.params().arm_ctrl.home);
    }

    #[test]
    fn test_manual_cmds_ignored_while_running() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        tick(&mut sim, Some(ArmCmd::Start));

        let (frame, report) = tick(
            &mut sim,
            Some(ArmCmd::Joints {
                base_deg: 90.0,
                shoulder_deg: 0.0,
                elbow_deg: 0.0,
                gripper_open: 0.0,
            }),
        );
        assert!(report.cmd_ignored);
        assert_eq!(frame.phase, TaskPhase::Approach);
        assert!(frame.target.base_deg.abs() < 1e-9);

        let (_, report) = tick(
            &mut sim,
            Some(ArmCmd::Reach {
                x: 0.0,
                y: 10.0,
                z: 10.0,
                gripper_open: 0.0,
            }),
        );
        assert!(report.cmd_ignored);

        // A second start is also ignored
        let (_, report) = tick(&mut sim, Some(ArmCmd::Start));
        assert!(report.cmd_ignored);
    }

    #[test]
    fn test_manual_joints_converge() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        let target = JointAngles::new(30.0, -20.0, 40.0, 0.5);

        let (frame, _) = tick(
            &mut sim,
            Some(ArmCmd::Joints {
                base_deg: target.base_deg,
                shoulder_deg: target.shoulder_deg,
                elbow_deg: target.elbow_deg,
                gripper_open: target.gripper_open,
            }),
        );
        assert_eq!(frame.target, target);

        // Proportional drive eases in, so the first step is a fraction of the
        // error
        assert!((frame.angles.base_deg - 3.0).abs() < 1e-9);

        for _ in 0..200 {
            tick(&mut sim, None);
        }

        assert!(sim.arm().arrived());
        assert_eq!(sim.arm().current(), &target);
        assert_eq!(sim.phase(), TaskPhase::Idle);
    }

    #[test]
    fn test_manual_reach() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        let goal = [10.0, 12.0, -6.0];

        tick(
            &mut sim,
            Some(ArmCmd::Reach {
                x: goal[0],
                y: goal[1],
                z: goal[2],
                gripper_open: 1.0,
            }),
        );
        let mut frame = sim.frame();
        for _ in 0..300 {
            frame = tick(&mut sim, None).0;
        }

        assert!(dist(&frame.end_effector, &goal) < 1e-6);
    }

    #[test]
    fn test_stop_holds_arm() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        tick(&mut sim, Some(ArmCmd::Start));
        for _ in 0..20 {
            tick(&mut sim, None);
        }

        let (frame, report) = tick(&mut sim, Some(ArmCmd::Stop));
        assert!(!report.cmd_ignored);
        assert_eq!(frame.phase, TaskPhase::Idle);
        assert_eq!(frame.angles, frame.target);

        let (next, _) = tick(&mut sim, None);
        assert_eq!(next.angles, frame.angles);
    }

    #[test]
    fn test_stop_while_holding_releases() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();
        tick(&mut sim, Some(ArmCmd::Start));

        let mut last = sim.frame();
        for _ in 0..MAX_CYCLES {
            if last.phase == TaskPhase::Lift && last.object_held {
                break;
            }
            last = tick(&mut sim, None).0;
        }
        assert_eq!(last.phase, TaskPhase::Lift);
        assert!(sim.is_gripped());

        let (frame, report) = tick(&mut sim, Some(ArmCmd::Stop));
        assert!(!report.cmd_ignored);
        assert_eq!(frame.phase, TaskPhase::Idle);
        assert!(!frame.object_held);
        assert!(!sim.is_gripped());

        // Let go where it was held, raised onto the floor at most
        assert!((frame.object_pos[0] - last.object_pos[0]).abs() < 1e-6);
        assert!((frame.object_pos[2] - last.object_pos[2]).abs() < 1e-6);
        assert!(frame.object_pos[1] >= last.object_pos[1] - 1e-6);

        // Opening the gripper leaves the object where it is
        let (open, report) = tick(
            &mut sim,
            Some(ArmCmd::Joints {
                base_deg: frame.angles.base_deg,
                shoulder_deg: frame.angles.shoulder_deg,
                elbow_deg: frame.angles.elbow_deg,
                gripper_open: 1.0,
            }),
        );
        assert!(!report.cmd_ignored);
        assert_eq!(open.object_pos, frame.object_pos);

        // And the task can be run again from where the object now lies
        let (restart, report) = tick(&mut sim, Some(ArmCmd::Start));
        assert!(!report.cmd_ignored);
        assert_eq!(restart.phase, TaskPhase::Approach);
    }

    #[test]
    fn test_invalid_cmd() {
        let mut sim = ArmSim::new(ArmSimParams::default()).unwrap();

        let res = sim.proc(&InputData {
            cmd: Some(ArmCmd::Reset {
                x: f64::NAN,
                y: 0.0,
                z: 0.0,
            }),
        });

        assert!(matches!(res, Err(ArmSimError::InvalidCmd(_))));
        assert_eq!(sim.num_cycles(), 0);
        assert_eq!(sim.object_position(), Point3::new(15.0, 0.75, 0.0));
    }

    #[test]
    fn test_invalid_params() {
        let mut params = ArmSimParams::default();
        params.arm_ctrl.geometry.lower_link_length = -1.0;
        assert!(matches!(
            ArmSim::new(params),
            Err(ArmSimError::ArmCtrlError(_))
        ));

        let mut params = ArmSimParams::default();
        params.grasp.threshold = 0.0;
        assert!(matches!(
            ArmSim::new(params),
            Err(ArmSimError::GraspError(_))
        ));

        let mut params = ArmSimParams::default();
        params.grasp.floor_level = Some(f64::NAN);
        assert!(matches!(
            ArmSim::new(params),
            Err(ArmSimError::GraspError(_))
        ));

        let mut params = ArmSimParams::default();
        params.object_start_pos = [15.0, f64::NAN, 0.0];
        assert!(matches!(
            ArmSim::new(params),
            Err(ArmSimError::InvalidObjectStart(_))
        ));

        let mut params = ArmSimParams::default();
        params.task_seq.drop_pos = [f64::INFINITY, 0.75, -12.0];
        assert!(matches!(
            ArmSim::new(params),
            Err(ArmSimError::TaskSeqError(_))
        ));
    }

    #[test]
    fn test_shipped_params() {
        let params: ArmSimParams =
            util::params::load_str(include_str!("../../../params/arm_sim.toml")).unwrap();

        assert_eq!(params.object_start_pos, [15.0, 0.75, 0.0]);
        assert_eq!(params.grasp, GraspParams::default());
        assert_eq!(params.task_seq, TaskSeqParams::default());
        assert_eq!(params.arm_ctrl.geometry, arm_ctrl::ArmGeometry::default());

        assert!(ArmSim::new(params).is_ok());
    }
}
