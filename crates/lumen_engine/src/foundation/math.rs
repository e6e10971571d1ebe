//! Math utilities and types
//!
//! Provides the vector, quaternion and matrix types used by the scene graph and
//! the renderer. All types are nalgebra aliases; the engine-specific factories
//! live on the [`Mat4Ext`] and [`QuatExt`] extension traits.
//!
//! Matrices follow the column-vector convention: `a * b` applies `b` first.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit, UnitQuaternion,
    Rotation3,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Lengths at or below this are treated as zero by the normalizing helpers
    pub const DEGENERATE_LENGTH: f32 = 1.0e-6;
}

/// Math utility functions
///
/// The normalizing helpers never fail; degenerate inputs resolve to a fixed fallback.
pub mod utils {
    use super::{constants, Quat, QuatExt, Quaternion, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Normalize a vector, treating a zero length as 1.
    ///
    /// A zero vector therefore comes back unchanged.
    pub fn safe_normalize(v: &Vec3) -> Vec3 {
        let length = v.norm();
        if length <= constants::DEGENERATE_LENGTH {
            *v
        } else {
            v / length
        }
    }

    /// Normalize a raw quaternion into a rotation.
    ///
    /// A zero quaternion has no meaningful direction, so it maps to identity.
    pub fn normalize_quaternion(q: Quaternion<f32>) -> Quat {
        if q.norm() <= constants::DEGENERATE_LENGTH {
            Quat::identity()
        } else {
            Quat::new_normalize(q)
        }
    }

    /// Rotate `v` by `angle` radians about `axis`
    pub fn rotate_vector(v: &Vec3, axis: &Vec3, angle: f32) -> Vec3 {
        <Quat as QuatExt>::rotation_quaternion(axis, angle) * v
    }
}

/// Extension trait for Mat4 with the engine's named factories
pub trait Mat4Ext {
    /// Translation by `t`
    fn translation(t: &Vec3) -> Mat4;

    /// Rotation matrix of a quaternion
    fn rotation(q: &Quat) -> Mat4;

    /// Non-uniform scale
    fn scale(s: &Vec3) -> Mat4;

    /// `T * R * S`
    fn trs(t: &Vec3, r: &Quat, s: &Vec3) -> Mat4;

    /// Perspective projection
    ///
    /// # Arguments
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect` - Width divided by height
    /// * `near` / `far` - Clip plane distances
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Orthographic projection for the box `[left, right] x [bottom, top] x [near, far]`
    fn orthogonal(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Rotation whose rows are the right, up and forward axes of a camera
    /// looking along `forward`
    fn camera(forward: &Vec3, up: &Vec3) -> Mat4;

    /// Inverse, or identity when the matrix is singular
    fn inverse_or_identity(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn translation(t: &Vec3) -> Mat4 {
        Mat4::new_translation(t)
    }

    fn rotation(q: &Quat) -> Mat4 {
        q.to_homogeneous()
    }

    fn scale(s: &Vec3) -> Mat4 {
        Mat4::new_nonuniform_scaling(s)
    }

    fn trs(t: &Vec3, r: &Quat, s: &Vec3) -> Mat4 {
        <Mat4 as Mat4Ext>::translation(t)
            * <Mat4 as Mat4Ext>::rotation(r)
            * <Mat4 as Mat4Ext>::scale(s)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fov = (fov_y * 0.5).tan();
        let z_range = near - far;

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (tan_half_fov * aspect);
        result[(1, 1)] = 1.0 / tan_half_fov;
        result[(2, 2)] = (-near - far) / z_range;
        result[(2, 3)] = 2.0 * far * near / z_range;
        result[(3, 2)] = 1.0;
        result
    }

    fn orthogonal(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;

        Mat4::new(
            2.0 / width, 0.0, 0.0, -(right + left) / width,
            0.0, 2.0 / height, 0.0, -(top + bottom) / height,
            0.0, 0.0, -2.0 / depth, -(far + near) / depth,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn camera(forward: &Vec3, up: &Vec3) -> Mat4 {
        let f = utils::safe_normalize(forward);
        let r = utils::safe_normalize(up).cross(&f);
        let u = f.cross(&r);

        Mat4::new(
            r.x, r.y, r.z, 0.0,
            u.x, u.y, u.z, 0.0,
            f.x, f.y, f.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn inverse_or_identity(&self) -> Mat4 {
        self.try_inverse().unwrap_or_else(Mat4::identity)
    }
}

/// Extension trait for rotations
pub trait QuatExt {
    /// Rotation of `angle` radians about `axis`; the axis need not be unit length
    fn rotation_quaternion(axis: &Vec3, angle: f32) -> Quat;

    /// Rotation whose forward axis points along `forward` with `up` as the
    /// reference up vector.
    ///
    /// Returns `None` when `forward` has zero length. When `forward` is
    /// parallel to `up` the world axis least aligned with `forward` is used as
    /// the up vector instead.
    fn look_rotation(forward: &Vec3, up: &Vec3) -> Option<Quat>;

    /// Local +Z
    fn forward(&self) -> Vec3;
    /// Local -Z
    fn back(&self) -> Vec3;
    /// Local +Y
    fn up(&self) -> Vec3;
    /// Local -Y
    fn down(&self) -> Vec3;
    /// Local +X
    fn right(&self) -> Vec3;
    /// Local -X
    fn left(&self) -> Vec3;

    /// Spherical interpolation that falls back to nlerp for opposite rotations
    fn slerp_to(&self, target: &Quat, t: f32) -> Quat;
}

impl QuatExt for Quat {
    fn rotation_quaternion(axis: &Vec3, angle: f32) -> Quat {
        let axis = utils::safe_normalize(axis);
        let half = angle * 0.5;
        let sin_half = half.sin();
        utils::normalize_quaternion(Quaternion::new(
            half.cos(),
            axis.x * sin_half,
            axis.y * sin_half,
            axis.z * sin_half,
        ))
    }

    fn look_rotation(forward: &Vec3, up: &Vec3) -> Option<Quat> {
        if forward.norm() <= constants::DEGENERATE_LENGTH {
            return None;
        }
        let f = forward.normalize();

        let mut reference = utils::safe_normalize(up);
        if reference.cross(&f).norm() <= constants::DEGENERATE_LENGTH {
            reference = least_aligned_axis(&f);
        }

        let r = reference.cross(&f).normalize();
        let u = f.cross(&r);
        let basis = Rotation3::from_basis_unchecked(&[r, u, f]);
        Some(Quat::from_rotation_matrix(&basis))
    }

    fn forward(&self) -> Vec3 {
        self * Vec3::z()
    }

    fn back(&self) -> Vec3 {
        self * -Vec3::z()
    }

    fn up(&self) -> Vec3 {
        self * Vec3::y()
    }

    fn down(&self) -> Vec3 {
        self * -Vec3::y()
    }

    fn right(&self) -> Vec3 {
        self * Vec3::x()
    }

    fn left(&self) -> Vec3 {
        self * -Vec3::x()
    }

    fn slerp_to(&self, target: &Quat, t: f32) -> Quat {
        self.try_slerp(target, t, constants::DEGENERATE_LENGTH)
            .unwrap_or_else(|| self.nlerp(target, t))
    }
}

fn least_aligned_axis(direction: &Vec3) -> Vec3 {
    let abs = direction.abs();
    if abs.x <= abs.y && abs.x <= abs.z {
        Vec3::x()
    } else if abs.y <= abs.z {
        Vec3::y()
    } else {
        Vec3::z()
    }
}
