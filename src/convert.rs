//! # Coordinate Conversion Module
//!
//! Pure, stateless conversion functions between Cartesian and spherical
//! coordinates. These are the single source of truth for every derived-field
//! materialization in [`crate::vector`]; no other code path computes
//! coordinates differently.
//!
//! ## Conventions
//!
//! - **r**: radial distance from the origin, always >= 0
//! - **lat**: latitude in radians, range [-pi/2, pi/2], measured from the
//!   XY plane toward +Z
//! - **lon**: longitude in radians, range (-pi, pi], measured from +X
//!   toward +Y
//!
//! Latitude divides by the radius, so [`lat_from_cartesian`] takes the
//! already-computed radius rather than recomputing it. At the origin the
//! radius is zero and both angles are conventionally zero.

/// Converts spherical coordinates to a Cartesian triple
///
/// # Mathematical Conversion
///
/// - `x = cos(lon) * cos(lat) * r`
/// - `y = sin(lon) * cos(lat) * r`
/// - `z = sin(lat) * r`
///
/// # Examples
///
/// ```rust
/// use sphvec::convert::spherical_to_cartesian;
/// use std::f64::consts::FRAC_PI_2;
///
/// let (x, y, z) = spherical_to_cartesian(1.0, FRAC_PI_2, 0.0);
/// assert!(x.abs() < 1e-15);
/// assert!(y.abs() < 1e-15);
/// assert!((z - 1.0).abs() < 1e-15);
/// ```
pub fn spherical_to_cartesian(r: f64, lat: f64, lon: f64) -> (f64, f64, f64) {
    let cos_lat = lat.cos();
    (
        lon.cos() * cos_lat * r,
        lon.sin() * cos_lat * r,
        lat.sin() * r,
    )
}

/// Radial distance of a Cartesian triple: `sqrt(x^2 + y^2 + z^2)`, always >= 0
pub fn r_from_cartesian(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Latitude of a Cartesian triple, given its radius
///
/// Takes the radius as an argument so callers that already materialized it
/// do not pay for a recomputation. A zero radius yields latitude 0 rather
/// than dividing by zero.
pub fn lat_from_cartesian(z: f64, r: f64) -> f64 {
    if r == 0.0 {
        0.0
    } else {
        (z / r).asin()
    }
}

/// Longitude of a Cartesian triple: `atan2(y, x)`, range (-pi, pi]
///
/// Longitude depends only on X and Y. On the Z axis (x = y = 0) the value
/// is conventionally 0, which `atan2` already produces.
pub fn lon_from_cartesian(x: f64, y: f64) -> f64 {
    y.atan2(x)
}
