use glam::Vec3;

use crate::{scene::Bounds, Dimensions};

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

pub struct Camera {
    /// width of the sensor, in pixel
    pub width: u32,
    /// height of the sensor, in pixel
    pub height: u32,
    /// Vertical field of view, radians.
    pub vfov: f32,

    pub position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    /// A camera at the origin looking down -Z.
    pub fn new(dimensions: Dimensions, vfov: f32) -> Self {
        Self {
            width: dimensions.width,
            height: dimensions.height,
            vfov,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn look_at(&mut self, eye: Vec3, center: Vec3, world_up: Vec3) {
        let forward = (center - eye).normalize_or_zero();
        if forward == Vec3::ZERO {
            return;
        }
        let mut right = forward.cross(world_up).normalize_or_zero();
        if right == Vec3::ZERO {
            // looking straight along `world_up`
            right = forward.cross(Vec3::X).normalize_or_zero();
        }
        self.position = eye;
        self.forward = forward;
        self.right = right;
        self.up = right.cross(forward);
    }

    /// Move back along the current view direction until `bounds` fills the
    /// frame, keeping the orientation.
    pub fn frame_bounds(&mut self, bounds: &Bounds) {
        let center = bounds.center();
        let radius = bounds.radius().max(1e-3);

        let aspect = self.width as f32 / self.height as f32;
        // the narrower field of view is the limit
        let half = if aspect < 1.0 {
            f32::atan(f32::tan(0.5 * self.vfov) * aspect)
        } else {
            0.5 * self.vfov
        };

        let distance = radius / f32::sin(half);
        self.position = center - distance * self.forward;
    }

    /// Generate a ray through the given [ViewportCoord].
    pub fn ray(&self, coords: ViewportCoord) -> Ray {
        let half_h = f32::tan(0.5 * self.vfov);
        let half_w = half_h * self.width as f32 / self.height as f32;

        let direction =
            self.forward + coords.vx * half_w * self.right - coords.vy * half_h * self.up;
        Ray::new(self.position, direction)
    }
}

/// A coordinate in pixel space, possibly jittered inside the pixel.
#[derive(Debug, Clone, Copy)]
pub struct PixelCoord {
    pub x: f32,
    pub y: f32,
}

/// A coordinate in viewport space.
///
/// The viewport is mapped to the range `[-1, 1]` for both `vx` and `vy`;
/// `(-1, -1)` is the top left corner.
#[derive(Debug, Clone, Copy)]
pub struct ViewportCoord {
    pub vx: f32,
    pub vy: f32,
}

impl ViewportCoord {
    // Convert a coordinate in pixel space into viewport space
    pub fn from_pixel_coord(camera: &Camera, coord: PixelCoord) -> Self {
        Self {
            vx: 2. * (coord.x / (camera.width - 1) as f32) - 1.,
            vy: 2. * (coord.y / (camera.height - 1) as f32) - 1.,
        }
    }
}
