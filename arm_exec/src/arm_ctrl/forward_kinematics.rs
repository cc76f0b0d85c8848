//! Arm forward kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry3, Point3, Vector3};

// Internal imports
use super::{ArmGeometry, JointAngles};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the transform from the grip point frame to the world frame.
///
/// The chain is fixed: base yaw about world up, lift to the shoulder, shoulder
/// pitch and lower link, elbow pitch and upper link, then the wrist reach. In
/// the zero configuration every link points straight up (+Y) and positive
/// pitch leans the arm towards -X.
pub fn end_effector_transform(angles: &JointAngles, geometry: &ArmGeometry) -> Isometry3<f64> {
    let base = Isometry3::rotation(Vector3::y() * angles.base_deg.to_radians());

    let shoulder_mount = Isometry3::translation(0.0, geometry.base_height, 0.0);

    let lower_link = Isometry3::rotation(Vector3::z() * angles.shoulder_deg.to_radians())
        * Isometry3::translation(0.0, geometry.lower_link_length, 0.0);

    let upper_link = Isometry3::rotation(Vector3::z() * angles.elbow_deg.to_radians())
        * Isometry3::translation(0.0, geometry.upper_link_length, 0.0);

    let wrist = Isometry3::translation(0.0, geometry.wrist_reach_offset, 0.0);

    base * shoulder_mount * lower_link * upper_link * wrist
}

/// Calculate the world position of the grip point.
pub fn compute_end_effector(angles: &JointAngles, geometry: &ArmGeometry) -> Point3<f64> {
    let (height, radius) = planar_reach(angles, geometry);
    let base_rad = angles.base_deg.to_radians();

    Point3::new(radius * base_rad.cos(), height, -radius * base_rad.sin())
}

/// Height and signed horizontal radius of the grip point in the plane of the
/// arm, before the base yaw is applied.
pub fn planar_reach(angles: &JointAngles, geometry: &ArmGeometry) -> (f64, f64) {
    let shoulder_rad = angles.shoulder_deg.to_radians();
    let outer_rad = (angles.shoulder_deg + angles.elbow_deg).to_radians();

    let height = geometry.base_height
        + geometry.lower_link_length * shoulder_rad.cos()
        + geometry.upper_reach() * outer_rad.cos();

    let radius =
        -geometry.lower_link_length * shoulder_rad.sin() - geometry.upper_reach() * outer_rad.sin();

    (height, radius)
}
