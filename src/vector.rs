//! # Vector Module
//!
//! The [`Vector`] type stores a canonical Cartesian triple and a per-field
//! cache of the equivalent spherical coordinates. The Cartesian triple is
//! always valid and authoritative; each spherical field (radius, latitude,
//! longitude) is independently either valid or stale and is materialized on
//! demand through [`crate::convert`].
//!
//! ## Cache coherence
//!
//! - Writing any Cartesian component (whole triple or a single axis)
//!   invalidates all three spherical fields.
//! - Writing the whole spherical triple marks all three fields valid and
//!   recomputes the Cartesian triple from it.
//! - Writing a single spherical field first materializes all three fields,
//!   so the two untouched ones keep their correct prior values, then
//!   recomputes the Cartesian triple from the complete spherical triple.
//!
//! The cache lives in [`Cell`]s so that read paths stay `&self`; staleness
//! is internal bookkeeping that getters never expose. The `Cell`s also make
//! `Vector` `!Sync`, which encodes the exclusive-access requirement: a host
//! binding that shares one instance across threads must add its own
//! synchronization.
//!
//! ## Equality and hashing
//!
//! Both operate on the Cartesian triple only. Cache warmth never affects
//! equality or hash: two vectors built from the same triple are equal
//! whether or not spherical coordinates were ever read on either.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};

use log::trace;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::convert;

/// Per-field spherical cache: `None` marks a stale field.
#[derive(Debug, Default, Clone)]
struct SphCache {
    r: Cell<Option<f64>>,
    lat: Cell<Option<f64>>,
    lon: Cell<Option<f64>>,
}

impl SphCache {
    fn clear(&self) {
        self.r.set(None);
        self.lat.set(None);
        self.lon.set(None);
    }
}

/// A 3D vector with canonical Cartesian storage and lazily derived
/// spherical coordinates
///
/// # Examples
///
/// ```rust
/// use sphvec::Vector;
/// use std::f64::consts::FRAC_PI_2;
///
/// let v = Vector::new(0.0, 0.0, 1.0);
/// let (r, lat, lon) = v.sph();
/// assert!((r - 1.0).abs() < 1e-15);
/// assert!((lat - FRAC_PI_2).abs() < 1e-15);
/// assert_eq!(lon, 0.0);
/// ```
#[derive(Clone, Default)]
pub struct Vector {
    cart: [f64; 3],
    sph: SphCache,
}

impl Vector {
    /// Creates a vector from Cartesian components; the spherical cache
    /// starts fully stale.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector {
            cart: [x, y, z],
            sph: SphCache::default(),
        }
    }

    /// The stored Cartesian triple. No side effects.
    pub fn cart(&self) -> (f64, f64, f64) {
        (self.cart[0], self.cart[1], self.cart[2])
    }

    /// Cartesian X component
    pub fn x(&self) -> f64 {
        self.cart[0]
    }

    /// Cartesian Y component
    pub fn y(&self) -> f64 {
        self.cart[1]
    }

    /// Cartesian Z component
    pub fn z(&self) -> f64 {
        self.cart[2]
    }

    /// Replaces the Cartesian triple and invalidates the spherical cache.
    pub fn set_cart(&mut self, x: f64, y: f64, z: f64) {
        self.cart = [x, y, z];
        self.invalidate_sph();
    }

    /// Sets the Cartesian X component, invalidating the spherical cache.
    pub fn set_x(&mut self, x: f64) {
        self.cart[0] = x;
        self.invalidate_sph();
    }

    /// Sets the Cartesian Y component, invalidating the spherical cache.
    pub fn set_y(&mut self, y: f64) {
        self.cart[1] = y;
        self.invalidate_sph();
    }

    /// Sets the Cartesian Z component, invalidating the spherical cache.
    pub fn set_z(&mut self, z: f64) {
        self.cart[2] = z;
        self.invalidate_sph();
    }

    pub(crate) fn invalidate_sph(&self) {
        trace!("cartesian write, spherical cache cleared");
        self.sph.clear();
    }

    fn fill_r(&self) -> f64 {
        match self.sph.r.get() {
            Some(r) => r,
            None => {
                let r = convert::r_from_cartesian(self.cart[0], self.cart[1], self.cart[2]);
                trace!("materialized r = {}", r);
                self.sph.r.set(Some(r));
                r
            }
        }
    }

    fn fill_lat(&self) -> f64 {
        match self.sph.lat.get() {
            Some(lat) => lat,
            None => {
                // Latitude needs the radius first
                let r = self.fill_r();
                let lat = convert::lat_from_cartesian(self.cart[2], r);
                trace!("materialized lat = {}", lat);
                self.sph.lat.set(Some(lat));
                lat
            }
        }
    }

    fn fill_lon(&self) -> f64 {
        match self.sph.lon.get() {
            Some(lon) => lon,
            None => {
                let lon = convert::lon_from_cartesian(self.cart[0], self.cart[1]);
                trace!("materialized lon = {}", lon);
                self.sph.lon.set(Some(lon));
                lon
            }
        }
    }

    /// The spherical triple `(r, lat, lon)`, materializing any stale field.
    pub fn sph(&self) -> (f64, f64, f64) {
        let r = self.fill_r();
        let lat = self.fill_lat();
        let lon = self.fill_lon();
        (r, lat, lon)
    }

    /// Radial distance, materializing it if stale.
    pub fn r(&self) -> f64 {
        self.fill_r()
    }

    /// Latitude in radians, materializing the radius and latitude if stale.
    pub fn lat(&self) -> f64 {
        self.fill_lat()
    }

    /// Longitude in radians, materializing it if stale. Longitude depends
    /// only on X and Y, so this never touches the radius or latitude.
    pub fn lon(&self) -> f64 {
        self.fill_lon()
    }

    /// Replaces the spherical triple, marking all three fields valid, and
    /// recomputes the Cartesian triple from it.
    pub fn set_sph(&mut self, r: f64, lat: f64, lon: f64) {
        self.sph.r.set(Some(r));
        self.sph.lat.set(Some(lat));
        self.sph.lon.set(Some(lon));
        let (x, y, z) = convert::spherical_to_cartesian(r, lat, lon);
        trace!("spherical write, cartesian recomputed");
        self.cart = [x, y, z];
    }

    /// Sets the radius, preserving latitude and longitude.
    pub fn set_r(&mut self, r: f64) {
        let (_, lat, lon) = self.sph();
        self.set_sph(r, lat, lon);
    }

    /// Sets the latitude, preserving radius and longitude.
    pub fn set_lat(&mut self, lat: f64) {
        let (r, _, lon) = self.sph();
        self.set_sph(r, lat, lon);
    }

    /// Sets the longitude, preserving radius and latitude.
    pub fn set_lon(&mut self, lon: f64) {
        let (r, lat, _) = self.sph();
        self.set_sph(r, lat, lon);
    }

    /// Magnitude of the vector; identical to [`Vector::r`] and shares its
    /// cache entry.
    pub fn magnitude(&self) -> f64 {
        self.r()
    }

    /// Dot product over the Cartesian components
    ///
    /// Accumulation runs in single precision (`f32`) even though components
    /// are stored as `f64`; see DESIGN.md. Callers needing full
    /// double-precision sums should sum the component products themselves.
    pub fn dot(&self, other: &Vector) -> f64 {
        let mut acc = 0.0_f32;
        for i in 0..3 {
            acc = (f64::from(acc) + self.cart[i] * other.cart[i]) as f32;
        }
        f64::from(acc)
    }

    /// Cross product, right-handed: `x cross y = z`.
    pub fn cross(&self, other: &Vector) -> Vector {
        let a = &self.cart;
        let b = &other.cart;
        Vector::new(
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        )
    }

    /// Converts to a nalgebra `Vector3<f64>` for linear algebra work.
    pub fn to_vector3(&self) -> Vector3<f64> {
        Vector3::new(self.cart[0], self.cart[1], self.cart[2])
    }

    /// Creates a vector from a nalgebra `Vector3<f64>`.
    pub fn from_vector3(vec: Vector3<f64>) -> Self {
        Vector::new(vec.x, vec.y, vec.z)
    }

    /// Snapshots the raw stored values, staleness preserved verbatim
    ///
    /// Stale spherical fields serialize as `None`; nothing is materialized.
    /// Restored instances are exactly as "cold" as the snapshot was.
    pub fn get_state(&self) -> VectorState {
        VectorState {
            cart: self.cart,
            sph: [self.sph.r.get(), self.sph.lat.get(), self.sph.lon.get()],
        }
    }

    /// Restores both triples verbatim, bypassing validation and
    /// invalidation. Trusted round-trip path for persistence.
    pub fn set_state(&mut self, state: &VectorState) {
        self.cart = state.cart;
        self.sph.r.set(state.sph[0]);
        self.sph.lat.set(state.sph[1]);
        self.sph.lon.set(state.sph[2]);
    }
}

/// Serializable snapshot of a vector's raw stored values
///
/// `sph` entries are `None` where the cache field was stale at snapshot
/// time. Round-trips through [`Vector::get_state`] / [`Vector::set_state`]
/// are bit-for-bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorState {
    /// Stored Cartesian triple
    pub cart: [f64; 3],
    /// Stored spherical cache fields `(r, lat, lon)`, `None` = stale
    pub sph: [Option<f64>; 3],
}

// Equality and hashing exclude the spherical cache. Components compare by
// IEEE `==` (so 0.0 == -0.0, as algebra over signed zeros requires),
// extended with bit-identity so that bit-identical NaNs compare equal and
// `Eq` stays reflexive. The hash canonicalizes signed zeros to keep it
// consistent with equality.
fn component_eq(a: f64, b: f64) -> bool {
    a == b || a.to_bits() == b.to_bits()
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.cart
            .iter()
            .zip(&other.cart)
            .all(|(&a, &b)| component_eq(a, b))
    }
}

impl Eq for Vector {}

impl Hash for Vector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &c in &self.cart {
            canonical_bits(c).hash(state);
        }
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vector([{:.6}, {:.6}, {:.6}])",
            self.cart[0], self.cart[1], self.cart[2]
        )
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}>",
            self.cart[0], self.cart[1], self.cart[2]
        )
    }
}

// Algebra over references: operands are never mutated, results start with a
// stale spherical cache.
impl Add for &Vector {
    type Output = Vector;

    fn add(self, other: &Vector) -> Vector {
        Vector::new(
            self.cart[0] + other.cart[0],
            self.cart[1] + other.cart[1],
            self.cart[2] + other.cart[2],
        )
    }
}

impl Sub for &Vector {
    type Output = Vector;

    fn sub(self, other: &Vector) -> Vector {
        Vector::new(
            self.cart[0] - other.cart[0],
            self.cart[1] - other.cart[1],
            self.cart[2] - other.cart[2],
        )
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    fn mul(self, scalar: f64) -> Vector {
        Vector::new(
            self.cart[0] * scalar,
            self.cart[1] * scalar,
            self.cart[2] * scalar,
        )
    }
}

impl Mul<&Vector> for &Vector {
    type Output = Vector;

    /// Vector-by-vector multiplication is the cross product.
    fn mul(self, other: &Vector) -> Vector {
        self.cross(other)
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.cart[0], -self.cart[1], -self.cart[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::f64::consts::FRAC_PI_2;

    fn hash_of(v: &Vector) -> u64 {
        let mut hasher = DefaultHasher::new();
        v.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_construction_and_accessors() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(v.cart(), (1.0, 2.0, 3.0));
        assert_eq!(v.x(), 1.0);
        assert_eq!(v.y(), 2.0);
        assert_eq!(v.z(), 3.0);
    }

    #[test]
    fn test_default_is_origin() {
        let v = Vector::default();
        assert_eq!(v.cart(), (0.0, 0.0, 0.0));
        // Fully stale cache
        assert_eq!(v.get_state().sph, [None, None, None]);
        // The origin's spherical triple is all zeros by convention
        assert_eq!(v.sph(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_lazy_materialization() {
        let v = Vector::new(0.0, 0.0, 1.0);
        let (r, lat, lon) = v.sph();
        assert_relative_eq!(r, 1.0);
        assert_relative_eq!(lat, FRAC_PI_2);
        assert_eq!(lon, 0.0);
        // Repeated reads return identical values
        assert_eq!(v.sph(), (r, lat, lon));
    }

    #[test]
    fn test_partial_materialization() {
        let v = Vector::new(1.0, 1.0, 0.0);
        assert_relative_eq!(v.r(), 2.0_f64.sqrt());
        let state = v.get_state();
        assert!(state.sph[0].is_some());
        assert!(state.sph[1].is_none());
        assert!(state.sph[2].is_none());

        // Longitude materializes alone, without touching r or lat
        let v2 = Vector::new(0.0, 1.0, 0.0);
        assert_relative_eq!(v2.lon(), FRAC_PI_2);
        let state = v2.get_state();
        assert!(state.sph[0].is_none());
        assert!(state.sph[1].is_none());
        assert!(state.sph[2].is_some());
    }

    #[test]
    fn test_cartesian_write_invalidates() {
        let mut v = Vector::new(1.0, 0.0, 0.0);
        let _ = v.sph();
        v.set_x(0.0);
        v.set_z(1.0);
        // A stale cache would still report the +X direction here
        let (r, lat, lon) = v.sph();
        assert_relative_eq!(r, 1.0);
        assert_relative_eq!(lat, FRAC_PI_2);
        assert_eq!(lon, 0.0);
    }

    #[test]
    fn test_set_cart_invalidates() {
        let mut v = Vector::new(1.0, 2.0, 3.0);
        let _ = v.sph();
        v.set_cart(3.0, 4.0, 0.0);
        assert_eq!(v.cart(), (3.0, 4.0, 0.0));
        assert_relative_eq!(v.r(), 5.0);
    }

    #[test]
    fn test_set_sph_recomputes_cartesian() {
        let mut v = Vector::new(9.0, 9.0, 9.0);
        v.set_sph(1.0, 0.0, 0.0);
        let (x, y, z) = v.cart();
        assert_relative_eq!(x, 1.0);
        assert!(y.abs() < 1e-15);
        assert!(z.abs() < 1e-15);
    }

    #[test]
    fn test_set_r_preserves_angles() {
        let mut v = Vector::new(1.0, 2.0, 3.0);
        let (_, lat, lon) = v.sph();
        v.set_r(4.0);
        assert_eq!(v.r(), 4.0);
        assert_eq!(v.lat(), lat);
        assert_eq!(v.lon(), lon);
        // Cartesian was rebuilt to match
        let (x, y, z) = v.cart();
        assert_relative_eq!(convert::r_from_cartesian(x, y, z), 4.0, max_relative = 1e-12);
    }

    #[test]
    fn test_set_lat_on_cold_cache() {
        // The other two fields must materialize from the prior Cartesian
        // values before the overwrite
        let mut v = Vector::new(0.1, 0.2, 0.3);
        let r_before = convert::r_from_cartesian(0.1, 0.2, 0.3);
        let lon_before = convert::lon_from_cartesian(0.1, 0.2);
        v.set_lat(1.5);
        assert_eq!(v.lat(), 1.5);
        assert_eq!(v.r(), r_before);
        assert_eq!(v.lon(), lon_before);
    }

    #[test]
    fn test_set_lon_on_cold_cache() {
        let mut v = Vector::new(0.1, 0.2, 0.3);
        let r_before = v.get_state().cart;
        let expected_r = convert::r_from_cartesian(r_before[0], r_before[1], r_before[2]);
        v.set_lon(1.5);
        assert_eq!(v.lon(), 1.5);
        assert_relative_eq!(v.r(), expected_r, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_radius_latitude() {
        let v = Vector::new(0.0, 0.0, 0.0);
        assert_eq!(v.lat(), 0.0);
    }

    #[test]
    fn test_add_sub_neg() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(3.0, 3.0, 3.0);
        assert_eq!((&a + &b).cart(), (4.0, 5.0, 6.0));
        assert_eq!((&a - &b).cart(), (-2.0, -1.0, 0.0));
        assert_eq!((-&a).cart(), (-1.0, -2.0, -3.0));
        // Operands untouched
        assert_eq!(a.cart(), (1.0, 2.0, 3.0));
        assert_eq!(b.cart(), (3.0, 3.0, 3.0));
    }

    #[test]
    fn test_scalar_multiply() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!((&v * 2.0).cart(), (2.0, 4.0, 6.0));
    }

    #[test]
    fn test_cross_product() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(4.0, -6.0, 1.0);
        let cross = &a * &b;
        assert_eq!(cross.cart(), (20.0, 11.0, -14.0));

        // Anti-commutativity: a * b == -(b * a)
        assert_eq!(&a * &b, -&(&b * &a));
    }

    #[test]
    fn test_dot() {
        let v1 = Vector::new(1.0, 2.0, 3.0);
        let v2 = Vector::new(0.5, 2.0, 1.0);
        assert_eq!(v1.dot(&v2), v2.dot(&v1));
        assert_eq!(v1.dot(&v2), 7.5);

        let x = Vector::new(1.0, 0.0, 0.0);
        let y = Vector::new(0.0, 1.0, 0.0);
        assert_eq!(x.dot(&y), 0.0);
    }

    #[test]
    fn test_dot_single_precision_accumulation() {
        // 1 + 2^-40 is representable in f64 but rounds away in f32
        let a = Vector::new(1.0, 1.0, 0.0);
        let b = Vector::new(1.0, 2.0_f64.powi(-40), 0.0);
        assert_eq!(a.dot(&b), 1.0);
    }

    #[test]
    fn test_magnitude() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(v.magnitude(), 14.0_f64.sqrt());
    }

    #[test]
    fn test_equality_ignores_cache_state() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(1.0, 2.0, 3.0);
        let _ = a.sph(); // warm one cache only
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, Vector::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn test_signed_zero_equality() {
        // Negation of a zero component flips its sign bit; the vectors must
        // still compare and hash as equal
        let a = Vector::new(0.0, 0.0, 1.0);
        let b = -&Vector::new(0.0, 0.0, -1.0);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_hash_set_dedup() {
        let set: HashSet<Vector> = [
            Vector::new(1.0, 2.0, 3.0),
            Vector::new(2.0, 2.0, 3.0),
            Vector::new(1.0, 2.0, 3.0),
            Vector::new(2.0, 2.0, 3.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_formatting() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(format!("{:?}", v), "Vector([1.000000, 2.000000, 3.000000])");
        assert_eq!(format!("{}", v), "[1.000000, 2.000000, 3.000000>");
    }

    #[test]
    fn test_state_round_trip_preserves_staleness() {
        let v = Vector::new(1.0, 2.0, 3.0);
        let _ = v.r(); // only r is warm
        let state = v.get_state();
        assert_eq!(state.cart, [1.0, 2.0, 3.0]);
        assert!(state.sph[0].is_some());
        assert!(state.sph[1].is_none());

        let mut restored = Vector::default();
        restored.set_state(&state);
        assert_eq!(restored.get_state(), state);
        assert_eq!(restored, v);
    }

    #[test]
    fn test_vector3_interop() {
        let v = Vector::new(1.0, 2.0, 3.0);
        let nv = v.to_vector3();
        assert_eq!((nv.x, nv.y, nv.z), (1.0, 2.0, 3.0));
        assert_eq!(Vector::from_vector3(nv), v);
    }
}
