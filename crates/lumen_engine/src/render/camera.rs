//! # Camera math
//!
//! Projection parameters and the view-projection computation. The scene-side
//! [`Camera`](crate::components::Camera) component publishes a [`MainCamera`]
//! into the shared registry; the rendering engine reads it back each frame.
//!
//! ## Failure semantics
//! A camera without a projection is a configuration error: computing its
//! view-projection yields [`RenderError::ProjectionNotConfigured`] instead of a
//! garbage matrix.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Vec3};
use crate::render::RenderError;
use crate::scene::{TransformId, Transforms};

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width divided by height
    pub aspect: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Projection {
    /// Create a perspective projection
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Width divided by height
    /// * `near` / `far` - Clip plane distances
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Same projection with a new aspect ratio
    pub fn with_aspect(self, aspect: f32) -> Self {
        Self { aspect, ..self }
    }

    /// Projection matrix
    pub fn matrix(&self) -> Mat4 {
        <Mat4 as Mat4Ext>::perspective(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// `projection * conj(rotation) * Translation(-position)`
pub fn view_projection(
    projection: Option<&Projection>,
    position: &Vec3,
    rotation: &Quat,
) -> Result<Mat4, RenderError> {
    let projection = projection.ok_or(RenderError::ProjectionNotConfigured)?;
    let camera_rotation = <Mat4 as Mat4Ext>::rotation(&rotation.conjugate());
    let camera_translation = <Mat4 as Mat4Ext>::translation(&-position);
    log::trace!("View-projection for camera at {:?}", position);
    Ok(projection.matrix() * camera_rotation * camera_translation)
}

/// Camera registered as the scene's viewpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainCamera {
    /// Node the camera is attached to
    pub transform: TransformId,
    /// Projection, if configured
    pub projection: Option<Projection>,
}

impl MainCamera {
    /// World-space eye position
    pub fn eye_position(&self, transforms: &mut Transforms) -> Vec3 {
        transforms.transformed_position(self.transform)
    }

    /// View-projection from the camera node's world position and rotation
    pub fn view_projection(&self, transforms: &mut Transforms) -> Result<Mat4, RenderError> {
        let projection = self.projection.as_ref().ok_or(RenderError::ProjectionNotConfigured)?;
        let position = transforms.transformed_position(self.transform);
        let rotation = transforms.transformed_rotation(self.transform);
        view_projection(Some(projection), &position, &rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::scene::Transform;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_projection_fails() {
        let result = view_projection(None, &Vec3::zeros(), &Quat::identity());
        assert!(matches!(result, Err(RenderError::ProjectionNotConfigured)));

        let mut transforms = Transforms::new();
        let camera = MainCamera {
            transform: transforms.insert(Transform::default()),
            projection: None,
        };
        assert!(matches!(
            camera.view_projection(&mut transforms),
            Err(RenderError::ProjectionNotConfigured)
        ));
    }

    #[test]
    fn test_point_ahead_lands_in_front() {
        let mut transforms = Transforms::new();
        let camera = MainCamera {
            transform: transforms.insert(Transform::from_translation(Vec3::new(0.0, 0.0, -5.0))),
            projection: Some(Projection::perspective(70.0, 1.0, 0.1, 1000.0)),
        };
        let vp = camera.view_projection(&mut transforms).unwrap();

        let clip = vp * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
        assert_relative_eq!(clip.x, 0.0, epsilon = 1.0e-6);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1.0e-6);
        assert_relative_eq!(clip.w, 5.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_with_aspect_keeps_other_parameters() {
        let projection = Projection::perspective(90.0, 1.0, 0.1, 100.0).with_aspect(2.0);
        assert_eq!(projection.aspect, 2.0);
        assert_relative_eq!(projection.matrix()[(0, 0)], 0.5, epsilon = 1.0e-6);
    }
}
