//! Plain 3-D math primitives shared by every posekit crate.
//!
//! The core works on exactly one representation: [`Vec3`] for vectors,
//! [`Quaternion`] (w, x, y, z convention) for rotations and [`Pose`] for rigid
//! transforms.  Hosts that store components in a different order convert at
//! the boundary with the explicit constructors ([`Quaternion::from_xyzw`],
//! `From<[f32; 3]>`, …); nothing converts implicitly.
//!
//! # Example
//!
//! ```rust
//! use posekit_types::{Pose, Quaternion, Vec3};
//! use std::f32::consts::FRAC_PI_2;
//!
//! let yaw = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
//! let base = Pose::new(Vec3::new(1.0, 0.0, 0.0), yaw);
//! let camera = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity());
//!
//! let p = base.compose(camera).position;
//! assert!((p.x - 1.0).abs() < 1e-5);
//! assert!((p.y - 1.0).abs() < 1e-5);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Below this vector-part magnitude a quaternion is treated as the identity
/// rotation and has no well-defined axis.
pub const AXIS_EPSILON: f32 = 1e-7;

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector (positions, velocities, angular rates, accelerations).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector when `self` has
    /// (near) zero length.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::zero()
        } else {
            self / len
        }
    }

    /// `true` when every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<(f32, f32, f32)> for Vec3 {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A quaternion representing a 3-D rotation (w, x, y, z convention).
///
/// Rotation helpers assume a unit quaternion; nothing here renormalizes
/// behind the caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Build from components stored in `x, y, z, w` order (the layout most
    /// game engines use).
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self::new(w, x, y, z)
    }

    /// Components in `x, y, z, w` order.
    pub fn to_xyzw(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// The identity rotation (no rotation).
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` radians about `axis` (right-handed).
    ///
    /// A zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalized();
        if axis == Vec3::zero() {
            return Self::identity();
        }
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Multiplicative inverse, `q* / |q|²`.
    ///
    /// Equal to [`conjugate`](Self::conjugate) for unit quaternions.  The zero
    /// quaternion has no inverse and maps to itself.
    pub fn inverse(self) -> Self {
        let n2 = self.dot(self);
        if n2 <= f32::EPSILON {
            return self;
        }
        let c = self.conjugate();
        Self::new(c.w / n2, c.x / n2, c.y / n2, c.z / n2)
    }

    /// Four-component dot product.
    pub fn dot(self, rhs: Self) -> f32 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit quaternion in the same direction; the zero quaternion maps to the
    /// identity.
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if n <= f32::EPSILON {
            Self::identity()
        } else {
            Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
        }
    }

    /// All four components negated; the same rotation under double cover.
    pub fn negated(self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Decompose into `(angle_degrees, unit_axis)`.
    ///
    /// The angle lies in `[0, 360]`: a negative scalar part yields an angle
    /// above 180°.  When the vector part is (near) zero the rotation is the
    /// identity and `(0.0, Vec3::zero())` is returned instead of an arbitrary
    /// axis.
    pub fn to_axis_angle(self) -> (f32, Vec3) {
        let v = Vec3::new(self.x, self.y, self.z);
        let s = v.length();
        if s < AXIS_EPSILON {
            return (0.0, Vec3::zero());
        }
        let angle_rad = 2.0 * s.atan2(self.w);
        (angle_rad.to_degrees(), v / s)
    }

    /// `true` when both quaternions describe (nearly) the same rotation,
    /// i.e. `1 − |q₁·q₂| < tolerance`.  Sign-insensitive.
    pub fn approx_eq(self, other: Self, tolerance: f32) -> bool {
        1.0 - self.dot(other).abs() < tolerance
    }

    pub fn is_finite(self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.w, self.x, self.y, self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body transform: rotation followed by translation.
///
/// Represents the pose of frame B relative to frame A: to convert a point
/// expressed in frame B into frame A, rotate it by `orientation` then add
/// `position`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Compose two transforms: `self` applied first, then `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let position = self.position + self.orientation.rotate(other.position);
        let orientation = self.orientation.mul(other.orientation);
        Self::new(position, orientation)
    }

    /// The inverse transform: if `self` = T_A_B the result is T_B_A.
    pub fn inverse(self) -> Self {
        let inv = self.orientation.inverse();
        Self::new(-inv.rotate(self.position), inv)
    }

    /// `other` expressed relative to `self`, i.e. `inverse(self) ∘ other`.
    pub fn relative_to(self, other: Self) -> Self {
        self.inverse().compose(other)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
