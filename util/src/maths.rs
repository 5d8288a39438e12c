//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between two bounds.
///
/// Unlike `f64::clamp` this does not panic if the bounds are given in the wrong order, they are
/// sorted first.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
    let mut ret = *value;

    if ret > hi {
        ret = hi
    }
    if ret < lo {
        ret = lo
    }

    ret
}

/// Get the signed angular distance between two angles in the range of [0, 2pi].
///
/// This function will return the shortest signed distance between a and b accounting for wrapping
/// between 0 and 2pi.
pub fn get_ang_dist_2pi<T>(a: T, b: T) -> T
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();
    
    let c = rem_euclid(a - b, tau_t);
    let d = rem_euclid(b - a, tau_t);

    if c < d {
        -c
    }
    else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Map a value in the range [-pi, pi] to [0, 2pi]
pub fn map_pi_to_2pi<T>(value: T) -> T 
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    if value < T::zero() {
        tau_t + value
    }
    else {
        value
    }
}

/// `sin(x)/x`, taking its limit value of 1 around zero.
pub fn sinc<T>(x: T) -> T
where
    T: Float
{
    if x.abs() < T::epsilon() {
        T::one()
    }
    else {
        x.sin() / x
    }
}
