//! Camera & Frustum

use glam::{Affine3A, Mat4, Vec3, Vec4};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// Viewpoint of a frame: projection parameters plus the derived matrices
/// the renderer pushes per draw. The world matrix is owned here (a
/// camera is positioned directly, not through the scene arena); the view
/// matrix is always its inverse.
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,

    pub projection_type: ProjectionType,
    /// Vertical field of view in radians (perspective only).
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Half-height of the view volume (orthographic only).
    pub ortho_size: f32,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
    pub(crate) frustum: Frustum,
}

impl Camera {
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            uuid: Uuid::new_v4(),
            projection_type: ProjectionType::Perspective,
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            ortho_size: 10.0,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
        };
        camera.update_projection_matrix();
        camera
    }

    #[must_use]
    pub fn new_orthographic(ortho_size: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            uuid: Uuid::new_v4(),
            projection_type: ProjectionType::Orthographic,
            fov: 0.0,
            aspect,
            near,
            far,
            ortho_size,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection_type {
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let w = self.ortho_size * self.aspect;
                let h = self.ortho_size;
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        };
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(self.view_projection_matrix);
    }

    /// Places the camera in the world. Derived matrices refresh on the
    /// next [`Self::update_view_projection`].
    pub fn set_world_matrix(&mut self, world: Affine3A) {
        self.world_matrix = world;
    }

    /// Positions the camera at `eye`, looking at `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        let view = Mat4::look_at_rh(eye, target, up);
        self.world_matrix = Affine3A::from_mat4(view.inverse());
    }

    /// Recomputes view, view-projection and the frustum from the current
    /// world matrix. The renderer calls this while classifying.
    pub fn update_view_projection(&mut self) {
        self.view_matrix = Mat4::from(self.world_matrix).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(self.view_projection_matrix);
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }

    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    #[must_use]
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }
}

/// Six view-frustum planes extracted from a view-projection matrix with
/// the Gribb–Hartmann method, normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[0] = rows[3] + rows[0]; // Left
        planes[1] = rows[3] - rows[0]; // Right
        planes[2] = rows[3] + rows[1]; // Bottom
        planes[3] = rows[3] - rows[1]; // Top
        planes[4] = rows[2]; // Near ([0, 1] depth range)
        planes[5] = rows[3] - rows[2]; // Far

        for plane in &mut planes {
            let length = Vec3::new(plane.x, plane.y, plane.z).length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    /// Conservative sphere test: false only when the sphere is entirely
    /// outside at least one plane.
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            let dist = plane.x * center.x + plane.y * center.y + plane.z * center.z + plane.w;
            if dist < -radius {
                return false;
            }
        }
        true
    }
}
