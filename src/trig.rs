//! Table-driven, deterministic trigonometry and integer square roots.
//!
//! sin/cos/tan are looked up from a 91-entry table covering one degree
//! per entry over `[0, 90]`, baked in at build time (see `build.rs`);
//! the remaining three quadrants are derived by reflection and sign
//! flips rather than stored, since they're exact mirror images. Inverse
//! trig functions binary-search the same forward tables. None of this
//! ever touches a host float at runtime.

use crate::fixed::FixedNum;

include!(concat!(env!("OUT_DIR"), "/trig_tables.rs"));

/// Ratio of circumference to diameter, to the engine's fixed precision.
pub const PI: FixedNum = FixedNum::from_raw(3217);
/// Half of [`PI`].
pub const PI_HALF: FixedNum = FixedNum::from_raw(1608);
/// Multiply a radian value by this to get degrees.
pub const RADIAN_TO_DEGREE: FixedNum = FixedNum::from_raw(58671); // 180/pi * 1024, rounded
/// Multiply a degree value by this to get radians.
pub const DEGREE_TO_RADIAN: FixedNum = FixedNum::from_raw(18); // pi/180 * 1024, rounded
/// Default epsilon for general-purpose near-zero comparisons.
pub const DEFAULT_EPSILON: FixedNum = FixedNum::from_raw(1);
/// Epsilon for velocity comparisons (sleep bookkeeping and the like).
pub const VELOCITY_EPSILON: FixedNum = FixedNum::from_raw(10);
/// Epsilon for distance comparisons (AABB degeneracy, GJK termination).
pub const DISTANCE_EPSILON: FixedNum = FixedNum::from_raw(10);

/// Wraps an arbitrary degree value into `[0, 360)`.
pub fn format_angle(degrees: FixedNum) -> FixedNum {
    let full = FixedNum::from_int(360);
    let mut d = degrees;
    while d.raw() < 0 {
        d += full;
    }
    while d >= full {
        d -= full;
    }
    d
}

fn table_lookup(table: &[i64; TRIG_TABLE_COUNT], degree_0_90: i32) -> FixedNum {
    let idx = degree_0_90.clamp(0, (TRIG_TABLE_COUNT - 1) as i32) as usize;
    // table entries are stored at TRIG_ENLARGE scale; narrow to the
    // runtime FixedNum scale (PRECISION) with a single widened shift.
    let wide = table[idx] * i64::from(crate::fixed::PRECISION);
    FixedNum::from_raw((wide / TRIG_ENLARGE) as i32)
}

/// Sine of a value given in degrees.
pub fn sin_deg(degrees: FixedNum) -> FixedNum {
    let d = format_angle(degrees);
    let deg_int = d.to_int();
    match deg_int {
        0..=90 => table_lookup(&SIN_TABLE, deg_int),
        91..=180 => table_lookup(&SIN_TABLE, 180 - deg_int),
        181..=270 => -table_lookup(&SIN_TABLE, deg_int - 180),
        _ => -table_lookup(&SIN_TABLE, 360 - deg_int),
    }
}

/// Cosine of a value given in degrees.
pub fn cos_deg(degrees: FixedNum) -> FixedNum {
    sin_deg(degrees + FixedNum::from_int(90))
}

/// Tangent of a value given in degrees.
pub fn tan_deg(degrees: FixedNum) -> FixedNum {
    let d = format_angle(degrees);
    let deg_int = d.to_int();
    match deg_int {
        0..=90 => table_lookup(&TAN_TABLE, deg_int),
        91..=180 => -table_lookup(&TAN_TABLE, 180 - deg_int),
        181..=270 => table_lookup(&TAN_TABLE, deg_int - 180),
        _ => -table_lookup(&TAN_TABLE, 360 - deg_int),
    }
}

/// Finds the table index whose entry is closest to `target`, within
/// `[0, TRIG_TABLE_COUNT)`, via binary search over the (monotonic)
/// forward table. Used by the inverse trig functions.
fn find_table_index(table: &[i64; TRIG_TABLE_COUNT], target: FixedNum) -> i32 {
    let target_wide = (target.raw() as i64) * TRIG_ENLARGE / i64::from(crate::fixed::PRECISION);
    let mut lo: i32 = 0;
    let mut hi: i32 = (TRIG_TABLE_COUNT - 1) as i32;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if table[mid as usize] <= target_wide {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Arcsine, in degrees. `value` is clamped to `[-1, 1]`.
pub fn asin_deg(value: FixedNum) -> FixedNum {
    let clamped = value.clamp(-FixedNum::ONE, FixedNum::ONE);
    let sign = clamped.raw() < 0;
    let idx = find_table_index(&SIN_TABLE, clamped.abs());
    let result = FixedNum::from_int(idx);
    if sign {
        -result
    } else {
        result
    }
}

/// Arccosine, in degrees.
pub fn acos_deg(value: FixedNum) -> FixedNum {
    FixedNum::from_int(90) - asin_deg(value)
}

/// Arctangent, in degrees.
pub fn atan_deg(value: FixedNum) -> FixedNum {
    let sign = value.raw() < 0;
    let idx = find_table_index(&TAN_TABLE, value.abs());
    let result = FixedNum::from_int(idx);
    if sign {
        -result
    } else {
        result
    }
}

/// Two-argument arctangent, in degrees, with full quadrant resolution
/// from the signs of `y` and `x` — composes `atan(y/x)` the same way
/// the reference source does rather than providing an independent table.
pub fn atan2_deg(y: FixedNum, x: FixedNum) -> FixedNum {
    if x.is_zero() {
        if y.raw() > 0 {
            return FixedNum::from_int(90);
        } else if y.raw() < 0 {
            return FixedNum::from_int(270);
        }
        return FixedNum::ZERO;
    }

    let base = atan_deg(y / x);
    if x.raw() > 0 {
        if y.raw() >= 0 {
            base
        } else {
            base + FixedNum::from_int(360)
        }
    } else {
        base + FixedNum::from_int(180)
    }
}

/// Integer square root via the digit-by-digit binary algorithm, 16
/// iterations (32-bit domain).
pub fn sqrt32(value: u32) -> u32 {
    let mut remainder: u32 = value;
    let mut root: u32 = 0;
    let mut bit: u32 = 1 << 30;
    while bit > remainder {
        bit >>= 2;
    }
    while bit != 0 {
        if remainder >= root + bit {
            remainder -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

/// Integer square root via the digit-by-digit binary algorithm, 32
/// iterations (64-bit domain).
pub fn sqrt64(value: u64) -> u64 {
    let mut remainder: u64 = value;
    let mut root: u64 = 0;
    let mut bit: u64 = 1 << 62;
    while bit > remainder {
        bit >>= 2;
    }
    while bit != 0 {
        if remainder >= root + bit {
            remainder -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

/// Square root of a `FixedNum`, upscaling by `2^SHIFT` before the
/// integer sqrt so precision below 1.0 is not lost (`sqrt(1024*x) =
/// sqrt(x) * 32`, so we upscale by `PRECISION` then narrow again).
pub fn sqrt(value: FixedNum) -> FixedNum {
    if value.raw() <= 0 {
        return FixedNum::ZERO;
    }
    let widened = (value.raw() as u64) << crate::fixed::SHIFT;
    FixedNum::from_raw(sqrt64(widened) as i32)
}

/// Linear interpolation of `current` toward `target`, advancing by at
/// most `max_delta` this call. Used for framerate-independent easing
/// of exposed parameters; not part of the tick's core math.
pub fn advance_value(current: FixedNum, target: FixedNum, max_delta: FixedNum) -> FixedNum {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else if diff.raw() > 0 {
        current + max_delta
    } else {
        current - max_delta
    }
}

/// Converts a yaw (clockwise around the vertical axis) to an angle
/// (counter-clockwise in the X-Z plane), the convention reconciliation
/// a 2D engine embedded in a 3D renderer needs.
pub fn yaw_to_angle(yaw: FixedNum) -> FixedNum {
    format_angle(FixedNum::from_int(90) - yaw)
}

/// Inverse of [`yaw_to_angle`].
pub fn angle_to_yaw(angle: FixedNum) -> FixedNum {
    format_angle(FixedNum::from_int(90) - angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_is_approximately_3_142() {
        approx::assert_abs_diff_eq!(PI.to_f64(), 3.142, epsilon = 0.001);
    }

    #[test]
    fn sin_cos_identity_on_table_degrees() {
        for d in 0..360 {
            let deg = FixedNum::from_int(d);
            let s = sin_deg(deg).to_f64();
            let c = cos_deg(deg).to_f64();
            assert!((s * s + c * c - 1.0).abs() < 0.01, "failed at {d}");
        }
    }

    #[test]
    fn sqrt32_matches_perfect_squares() {
        for n in 0u32..2000 {
            let r = sqrt32(n * n);
            assert_eq!(r, n);
        }
    }

    #[test]
    fn sqrt_bounds_hold() {
        for n in [0i32, 1, 2, 5, 1000, 123456] {
            let x = FixedNum::from_int(n);
            let r = sqrt(x);
            let r_sq = r * r;
            assert!(r_sq <= x);
            let next = r + FixedNum::from_raw(crate::fixed::PRECISION);
            assert!(x < next * next);
        }
    }

    #[test]
    fn atan2_quadrants() {
        let one = FixedNum::ONE;
        let zero = FixedNum::ZERO;
        assert_eq!(atan2_deg(zero, one).to_int(), 0);
        assert_eq!(atan2_deg(one, zero).to_int(), 90);
        assert_eq!(atan2_deg(zero, -one).to_int(), 180);
        assert_eq!(atan2_deg(-one, zero).to_int(), 270);
    }
}
