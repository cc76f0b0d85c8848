//! Joint driver - moves the current joint angles towards their targets

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::step_towards;

// Internal imports
use super::{ArrivalTolerance, DriveMode, DriveParams, JointAngles};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance the current angles one cycle towards the target angles.
///
/// Each field snaps onto its target once within the snap epsilon, so the
/// joints always settle exactly rather than creeping forever.
pub fn advance(current: &JointAngles, target: &JointAngles, drive: &DriveParams) -> JointAngles {
    let mut next = *current;

    let mut arm_axes = next.rot_axes_deg_mut();
    let target_axes = target.rot_axes_deg();
    for (axis, target_deg) in arm_axes.iter_mut().zip(target_axes.iter()) {
        **axis = advance_field(
            **axis,
            *target_deg,
            drive.mode,
            drive.arm_rate,
            drive.arm_snap_deg,
        );
    }

    next.gripper_open = advance_field(
        current.gripper_open,
        target.gripper_open,
        drive.mode,
        drive.gripper_rate,
        drive.gripper_snap,
    );

    next
}

/// Returns true if every field of `current` is within tolerance of `target`.
pub fn arrived(current: &JointAngles, target: &JointAngles, tolerance: &ArrivalTolerance) -> bool {
    current
        .rot_axes_deg()
        .iter()
        .zip(target.rot_axes_deg().iter())
        .all(|(c, t)| (t - c).abs() < tolerance.angle_deg)
        && gripper_arrived(current, target, tolerance)
}

/// Returns true if only the gripper is within tolerance of its target.
pub fn gripper_arrived(
    current: &JointAngles,
    target: &JointAngles,
    tolerance: &ArrivalTolerance,
) -> bool {
    (target.gripper_open - current.gripper_open).abs() < tolerance.gripper
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn advance_field(current: f64, target: f64, mode: DriveMode, rate: f64, snap: f64) -> f64 {
    if (target - current).abs() < snap {
        return target;
    }

    match mode {
        DriveMode::Proportional => current + (target - current) * rate,
        DriveMode::FixedStep => step_towards(current, target, rate),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::Params;

    /// Run the driver until arrival, returning the number of cycles taken.
    fn cycles_to_arrive(
        start: JointAngles,
        target: JointAngles,
        drive: &DriveParams,
        tol: &ArrivalTolerance,
        limit: usize,
    ) -> Option<usize> {
        let mut current = start;
        for i in 0..limit {
            if arrived(&current, &target, tol) {
                return Some(i);
            }
            current = advance(&current, &target, drive);
        }
        None
    }

    #[test]
    fn test_fixed_step_moves_by_rate() {
        let drive = Params::default().task_drive;
        let current = JointAngles::new(0.0, 0.0, 0.0, 0.0);
        let target = JointAngles::new(10.0, -10.0, 0.5, 1.0);

        let next = advance(&current, &target, &drive);
        assert_eq!(next, JointAngles::new(1.0, -1.0, 0.5, 0.05));
    }

    #[test]
    fn test_proportional_eases() {
        let drive = Params::default().manual_drive;
        let current = JointAngles::new(0.0, 0.0, 0.0, 0.0);
        let target = JointAngles::new(10.0, -20.0, 0.0, 1.0);

        let next = advance(&current, &target, &drive);
        assert!((next.base_deg - 1.0).abs() < 1e-12);
        assert!((next.shoulder_deg + 2.0).abs() < 1e-12);
        assert_eq!(next.elbow_deg, 0.0);
        assert!((next.gripper_open - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_snap() {
        let drive = Params::default().manual_drive;
        let current = JointAngles::new(9.97, 0.0, 0.0, 0.998);
        let target = JointAngles::new(10.0, 0.0, 0.0, 1.0);

        assert_eq!(advance(&current, &target, &drive), target);
    }

    #[test]
    fn test_arrival_convergence() {
        let params = Params::default();
        let starts = [
            JointAngles::new(0.0, 0.0, 0.0, 0.8),
            JointAngles::new(-180.0, 180.0, -180.0, 0.0),
            JointAngles::new(45.3, -12.7, 99.1, 1.0),
        ];
        let target = JointAngles::new(90.0, -75.5, -101.25, 0.0);

        for drive in [params.manual_drive, params.task_drive].iter() {
            for start in starts.iter() {
                let cycles = cycles_to_arrive(
                    *start,
                    target,
                    drive,
                    &params.arrival_tolerance,
                    2000,
                );
                assert!(cycles.is_some(), "{:?} never arrived from {:?}", drive.mode, start);
            }
        }
    }

    #[test]
    fn test_no_overshoot_and_exact_settle() {
        let params = Params::default();
        let target = JointAngles::new(33.3, -66.6, 12.0, 0.37);

        for drive in [params.manual_drive, params.task_drive].iter() {
            let mut current = JointAngles::new(-20.0, 10.0, 80.0, 1.0);

            for _ in 0..2000 {
                let next = advance(&current, &target, drive);

                // Each field only ever moves towards its target
                for ((c, n), t) in current
                    .rot_axes_deg()
                    .iter()
                    .zip(next.rot_axes_deg().iter())
                    .zip(target.rot_axes_deg().iter())
                {
                    assert!((t - n).abs() <= (t - c).abs());
                    assert!((t - c) * (t - n) >= 0.0, "overshot {} heading for {}", n, t);
                }

                current = next;
            }

            assert_eq!(current, target);
        }
    }

    #[test]
    fn test_gripper_only_arrival() {
        let tol = Params::default().arrival_tolerance;
        let current = JointAngles::new(0.0, 0.0, 0.0, 0.99);
        let target = JointAngles::new(45.0, 0.0, 0.0, 1.0);

        assert!(gripper_arrived(&current, &target, &tol));
        assert!(!arrived(&current, &target, &tol));
    }
}
