//! # Grasp module
//!
//! Tracks whether the manipulated object is lying free in the world or held
//! by the gripper. Grasping re-parents the object onto the grip point frame by
//! recording its pose relative to that frame at the moment of the grasp, so
//! the object never jumps when it is picked up or put down.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the grasp model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraspParams {
    /// Maximum distance between the grip point and the object's origin for a
    /// grasp to succeed.
    ///
    /// Units: scene units
    pub threshold: f64,

    /// Lowest height the object's origin may rest at once released, or
    /// `None` to leave released objects where they are.
    ///
    /// Units: scene units
    pub floor_level: Option<f64>,
}

/// The grasp model.
#[derive(Debug, Clone)]
pub struct GraspModel {
    params: GraspParams,
    state: ObjectState,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Where the object is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectState {
    /// Lying in the world at the given position.
    Free { world_pos: Point3<f64> },

    /// Held by the gripper, with its pose given relative to the grip point
    /// frame.
    Held { offset: Isometry3<f64> },
}

/// Errors that can occur setting up the grasp model.
#[derive(Debug, thiserror::Error)]
pub enum GraspError {
    #[error("Invalid grasp parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GraspParams {
    fn default() -> Self {
        Self {
            threshold: 12.0,
            floor_level: Some(0.75),
        }
    }
}

impl GraspParams {
    pub fn validate(&self) -> Result<(), GraspError> {
        if !(self.threshold > 0.0) || self.threshold.is_infinite() {
            return Err(GraspError::InvalidParams(format!(
                "threshold must be positive and finite, found {}",
                self.threshold
            )));
        }

        if let Some(floor) = self.floor_level {
            if !floor.is_finite() {
                return Err(GraspError::InvalidParams(format!(
                    "floor level must be finite, found {}",
                    floor
                )));
            }
        }

        Ok(())
    }
}

impl GraspModel {
    /// Create a new model with the object lying free at `world_pos`.
    pub fn new(params: GraspParams, world_pos: Point3<f64>) -> Self {
        Self {
            params,
            state: ObjectState::Free { world_pos },
        }
    }

    pub fn params(&self) -> &GraspParams {
        &self.params
    }

    pub fn state(&self) -> &ObjectState {
        &self.state
    }

    pub fn is_gripped(&self) -> bool {
        matches!(self.state, ObjectState::Held { .. })
    }

    /// Position of the object if it is lying free.
    pub fn free_position(&self) -> Option<Point3<f64>> {
        match self.state {
            ObjectState::Free { world_pos } => Some(world_pos),
            ObjectState::Held { .. } => None,
        }
    }

    /// Try to grasp the object with the gripper at `end_effector`.
    ///
    /// Succeeds if the object lies within the grasp threshold of the grip
    /// point. On success the object's pose relative to the grip point is
    /// recorded, so it is rendered exactly where it was. Grasping an object
    /// already held succeeds without changing anything.
    pub fn attempt_grasp(&mut self, end_effector: &Isometry3<f64>) -> bool {
        let world_pos = match self.state {
            ObjectState::Free { world_pos } => world_pos,
            ObjectState::Held { .. } => return true,
        };

        let grip_point = Point3::from(end_effector.translation.vector);
        let distance = (world_pos - grip_point).norm();

        if distance >= self.params.threshold {
            debug!(
                "Grasp missed: object at {} is {:.3} from the grip point, threshold {:.3}",
                world_pos, distance, self.params.threshold
            );
            return false;
        }

        let offset = end_effector.inverse() * object_frame(&world_pos);

        info!(
            "Object grasped at {} ({:.3} from the grip point)",
            world_pos, distance
        );

        self.state = ObjectState::Held { offset };

        true
    }

    /// Pose of the object in the world given the current grip point frame.
    pub fn render_transform(&self, end_effector: &Isometry3<f64>) -> Isometry3<f64> {
        match self.state {
            ObjectState::Free { world_pos } => object_frame(&world_pos),
            ObjectState::Held { offset } => end_effector * offset,
        }
    }

    /// Position of the object in the world given the current grip point
    /// frame.
    pub fn render_position(&self, end_effector: &Isometry3<f64>) -> Point3<f64> {
        match self.state {
            ObjectState::Free { world_pos } => world_pos,
            ObjectState::Held { .. } => {
                Point3::from(self.render_transform(end_effector).translation.vector)
            }
        }
    }

    /// Let go of the object, leaving it where the gripper currently holds it.
    ///
    /// If a floor level is set the object is raised onto it when released
    /// below it. Releasing an object which is not held leaves it where it is.
    /// Returns the object's new world position.
    pub fn release(&mut self, end_effector: &Isometry3<f64>) -> Point3<f64> {
        let mut world_pos = self.render_position(end_effector);

        if !self.is_gripped() {
            debug!("Release with nothing held, object stays at {}", world_pos);
            return world_pos;
        }

        if let Some(floor) = self.params.floor_level {
            if world_pos.y < floor {
                world_pos.y = floor;
            }
        }

        info!("Object released at {}", world_pos);

        self.state = ObjectState::Free { world_pos };

        world_pos
    }

    /// Force the object to lie free at `world_pos`, whatever its state.
    pub fn reset(&mut self, world_pos: Point3<f64>) {
        self.state = ObjectState::Free { world_pos };
    }
}

impl Default for GraspModel {
    fn default() -> Self {
        Self::new(GraspParams::default(), Point3::origin())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Frame of a free object, which keeps the world's orientation.
fn object_frame(world_pos: &Point3<f64>) -> Isometry3<f64> {
    Isometry3::translation(world_pos.x, world_pos.y, world_pos.z)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::{end_effector_transform, ArmGeometry, JointAngles};
    use nalgebra::Vector3;

    fn assert_point_near(a: &Point3<f64>, b: &Point3<f64>, tol: f64) {
        assert!((a - b).norm() < tol, "{} is not within {} of {}", a, tol, b);
    }

    fn gripper_at(base: f64, shoulder: f64, elbow: f64) -> Isometry3<f64> {
        end_effector_transform(
            &JointAngles::new(base, shoulder, elbow, 0.0),
            &ArmGeometry::default(),
        )
    }

    #[test]
    fn test_params_validation() {
        assert!(GraspParams::default().validate().is_ok());

        let no_floor = GraspParams {
            floor_level: None,
            ..Default::default()
        };
        assert!(no_floor.validate().is_ok());

        for threshold in [0.0, -1.0, f64::NAN, f64::INFINITY].iter() {
            let p = GraspParams {
                threshold: *threshold,
                ..Default::default()
            };
            assert!(p.validate().is_err(), "threshold {} accepted", threshold);
        }

        let nan_floor = GraspParams {
            floor_level: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            nan_floor.validate(),
            Err(GraspError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_grasp_continuity() {
        let e0 = gripper_at(20.0, -70.0, -50.0);
        let grip_point = Point3::from(e0.translation.vector);
        let p = grip_point + Vector3::new(1.5, -2.0, 0.5);

        let mut grasp = GraspModel::new(GraspParams::default(), p);
        let before = grasp.render_position(&e0);

        assert!(grasp.attempt_grasp(&e0));
        assert!(grasp.is_gripped());

        assert_point_near(&grasp.render_position(&e0), &before, 1e-12);
        assert_point_near(&grasp.render_position(&e0), &p, 1e-12);
    }

    #[test]
    fn test_held_object_follows_gripper() {
        let e0 = gripper_at(0.0, -60.0, -60.0);
        let e1 = gripper_at(90.0, -20.0, -30.0);
        let p = Point3::from(e0.translation.vector) + Vector3::new(0.0, -1.0, 0.0);

        let mut grasp = GraspModel::new(GraspParams::default(), p);
        assert!(grasp.attempt_grasp(&e0));

        // The offset is fixed in the gripper frame, so the object keeps the
        // same distance from the grip point wherever the arm goes
        let moved = grasp.render_position(&e1);
        let grip_point = Point3::from(e1.translation.vector);
        assert!(((moved - grip_point).norm() - 1.0).abs() < 1e-9);
        assert_point_near(&moved, &(e1 * (e0.inverse() * p)), 1e-9);
    }

    #[test]
    fn test_missed_grasp() {
        let e0 = gripper_at(0.0, 0.0, 0.0);
        let far = Point3::new(30.0, 0.75, 0.0);

        let mut grasp = GraspModel::new(GraspParams::default(), far);

        assert!(!grasp.attempt_grasp(&e0));
        assert!(!grasp.is_gripped());
        assert_eq!(grasp.free_position(), Some(far));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let e0 = Isometry3::translation(0.0, 10.0, 0.0);
        let params = GraspParams {
            threshold: 3.0,
            floor_level: None,
        };

        let mut grasp = GraspModel::new(params, Point3::new(0.0, 7.0, 0.0));
        assert!(!grasp.attempt_grasp(&e0));

        grasp.reset(Point3::new(0.0, 7.5, 0.0));
        assert!(grasp.attempt_grasp(&e0));
    }

    #[test]
    fn test_release_continuity() {
        let params = GraspParams {
            threshold: 12.0,
            floor_level: None,
        };
        let e0 = gripper_at(0.0, -60.0, -60.0);
        let e1 = gripper_at(-45.0, -30.0, -80.0);
        let p = Point3::from(e0.translation.vector) + Vector3::new(0.2, 0.3, -0.1);

        let mut grasp = GraspModel::new(params, p);
        assert!(grasp.attempt_grasp(&e0));

        let held = grasp.render_position(&e1);
        let released = grasp.release(&e1);

        assert_eq!(released, held);
        assert!(!grasp.is_gripped());

        // Idempotent while free and motionless, even if the arm then moves
        assert_eq!(grasp.render_position(&e1), released);
        assert_eq!(grasp.render_position(&e0), released);
        assert_eq!(grasp.release(&e0), released);
    }

    #[test]
    fn test_release_drops_to_floor() {
        let e0 = Isometry3::translation(5.0, 3.0, 0.0);
        let e1 = Isometry3::translation(5.0, 0.25, -2.0);

        let mut grasp = GraspModel::new(GraspParams::default(), Point3::new(5.0, 3.0, 0.0));
        assert!(grasp.attempt_grasp(&e0));

        let released = grasp.release(&e1);
        assert_point_near(&released, &Point3::new(5.0, 0.75, -2.0), 1e-12);
        assert_eq!(grasp.free_position(), Some(released));
    }

    #[test]
    fn test_reset_from_held() {
        let e0 = Isometry3::translation(1.0, 1.0, 1.0);
        let mut grasp = GraspModel::new(GraspParams::default(), Point3::new(1.0, 1.0, 1.0));
        assert!(grasp.attempt_grasp(&e0));

        grasp.reset(Point3::new(10.0, 0.5, 0.0));
        assert!(!grasp.is_gripped());
        assert_eq!(grasp.render_position(&e0), Point3::new(10.0, 0.5, 0.0));
    }
}
