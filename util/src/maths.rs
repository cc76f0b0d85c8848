//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to lie within `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Inverse cosine with the argument first clamped into `[-1, 1]`.
///
/// Rounding in law-of-cosines ratios can push the argument a hair outside the
/// domain of `acos`, which would otherwise return `NAN`.
pub fn acos_clamped<T>(value: T) -> T
where
    T: Float,
{
    clamp(&value, &-T::one(), &T::one()).acos()
}

/// Move `value` towards `target` by at most `max_step`, never passing it.
pub fn step_towards<T>(value: T, target: T, max_step: T) -> T
where
    T: Float,
{
    let diff = target - value;

    if diff.abs() <= max_step {
        target
    } else {
        value + max_step * diff.signum()
    }
}
