//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Point3;
use serde::Serialize;
use util::maths::acos_clamped;

// Internal imports
use super::{ArmGeometry, JointAngles};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance kept between a clamped target and the edge of the reachable
/// shell.
pub const REACH_MARGIN: f64 = 0.01;

/// Rounding allowance on the shell boundaries, so that a pose produced by the
/// forward kinematics at full stretch is not treated as out of reach.
const REACH_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint angles which place the grip point on a target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IkSolution {
    /// Units: degrees
    pub base_deg: f64,

    /// Units: degrees
    pub shoulder_deg: f64,

    /// Units: degrees
    pub elbow_deg: f64,

    /// True if the target was outside the reachable shell and the solution
    /// reaches for the closest point on it instead.
    pub reach_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IkSolution {
    /// Build a full set of joint angles from this solution and a gripper
    /// opening.
    pub fn with_gripper(&self, gripper_open: f64) -> JointAngles {
        JointAngles::new(self.base_deg, self.shoulder_deg, self.elbow_deg, gripper_open)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Perform the inverse kinematics calculations.
///
/// The base yaw points the arm's plane at the target, leaving a planar
/// two-link problem from the shoulder to the grip point. That is solved with
/// the law of cosines, always keeping the elbow on the upper side of the
/// shoulder-to-target line.
///
/// A target outside the reachable shell is never an error: its distance from
/// the shoulder is clamped to just inside the shell, keeping its direction, so
/// the arm reaches as close as it can.
pub fn solve(target: &Point3<f64>, geometry: &ArmGeometry) -> IkSolution {
    let base_rad = (-target.z).atan2(target.x);

    // Planar problem relative to the shoulder
    let radius = target.x.hypot(target.z);
    let height = target.y - geometry.base_height;
    let mut dist = radius.hypot(height);

    let lower = geometry.lower_link_length;
    let upper = geometry.upper_reach();

    // Limit target distance to be within range of arm
    let mut reach_limited = false;
    if dist > geometry.max_reach() + REACH_TOLERANCE {
        debug!(
            "IK target {} is {:.3} from the shoulder, beyond reach of {:.3}",
            target,
            dist,
            geometry.max_reach()
        );
        dist = geometry.max_reach() - REACH_MARGIN;
        reach_limited = true;
    } else if dist < geometry.min_reach() - REACH_TOLERANCE || dist <= 0.0 {
        debug!(
            "IK target {} is {:.3} from the shoulder, inside minimum reach of {:.3}",
            target,
            dist,
            geometry.min_reach()
        );
        dist = geometry.min_reach() + REACH_MARGIN;
        reach_limited = true;
    }

    // Angle between the lower link and the shoulder-to-target line
    let shoulder_interior_rad =
        acos_clamped((lower.powi(2) + dist.powi(2) - upper.powi(2)) / (2.0 * lower * dist));

    // Angle between the two links at the elbow
    let elbow_interior_rad =
        acos_clamped((lower.powi(2) + upper.powi(2) - dist.powi(2)) / (2.0 * lower * upper));

    // Elevation of the target above the shoulder's horizontal
    let elevation_rad = height.atan2(radius);

    // Joint angles are measured from straight up, so shift the elevation
    // based angles into that convention.
    let shoulder_deg = (elevation_rad + shoulder_interior_rad).to_degrees() - 90.0;
    let elbow_deg = elbow_interior_rad.to_degrees() - 180.0;

    IkSolution {
        base_deg: base_rad.to_degrees(),
        shoulder_deg,
        elbow_deg,
        reach_limited,
    }
}
