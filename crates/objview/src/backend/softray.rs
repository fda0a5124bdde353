//! Built-in software device: jittered supersampling over direct lambert
//! shading with a camera headlight, a flat ambient term with stochastic
//! occlusion, and an auxiliary-guided smoothing pass as the denoiser.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec3;
use image::Rgb;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::{
    camera::{Camera, PixelCoord, Ray, ViewportCoord},
    frame::FrameBuffer,
    scene::Scene,
};

use super::{filter, PbrBackend};

/// Ambient light contribution at intensity 1.0.
const AMBIENT_BASE: f32 = 0.25;

/// Lower bound on accepted hit distances, against self intersection.
const T_MIN: f32 = 1e-4;

pub struct Softray {
    samples_per_pixel: u32,
    denoiser: bool,
    ambient_intensity: f32,
    ambient_samples: u32,
    light_falloff: f32,
    seed: u64,
}

impl Softray {
    pub fn new() -> Self {
        Self {
            samples_per_pixel: 1,
            denoiser: false,
            ambient_intensity: 1.0,
            ambient_samples: 1,
            light_falloff: 0.5,
            seed: 0,
        }
    }
}

impl Default for Softray {
    fn default() -> Self {
        Self::new()
    }
}

impl PbrBackend for Softray {
    fn name(&self) -> &'static str {
        "softray"
    }

    fn set_samples_per_pixel(&mut self, spp: u32) {
        self.samples_per_pixel = spp.max(1);
    }

    fn set_denoiser(&mut self, enabled: bool) {
        self.denoiser = enabled;
    }

    fn set_ambient_intensity(&mut self, intensity: f32) {
        self.ambient_intensity = intensity.max(0.0);
    }

    fn set_ambient_samples(&mut self, samples: u32) {
        self.ambient_samples = samples;
    }

    fn set_light_falloff(&mut self, falloff: f32) {
        self.light_falloff = falloff.max(0.0);
    }

    fn render(
        &self,
        scene: &Scene,
        camera: &Camera,
        frame: &mut FrameBuffer,
    ) -> anyhow::Result<()> {
        let width = frame.width();
        let height = frame.height();
        anyhow::ensure!(
            camera.width == width && camera.height == height,
            "camera sensor is {}x{} but the frame buffer is {}x{}",
            camera.width,
            camera.height,
            width,
            height
        );

        // light falloff is measured relative to the scene scale
        let scale = scene.bounds().map(|b| b.radius()).unwrap_or(1.0).max(1e-3);

        let mut shaded = vec![Shaded::default(); (width * height) as usize];
        shaded
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    *out = self.shade_pixel(scene, camera, scale, x as u32, y as u32);
                }
            });

        for (i, s) in shaded.iter().enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            frame.color.put_pixel(x, y, Rgb(s.color.to_array()));
            frame.normal.put_pixel(x, y, Rgb(s.normal.to_array()));
            frame.albedo.put_pixel(x, y, Rgb(s.albedo.to_array()));
        }

        if self.denoiser {
            filter::denoise(frame);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Shaded {
    color: Vec3,
    normal: Vec3,
    albedo: Vec3,
}

impl Softray {
    fn shade_pixel(
        &self,
        scene: &Scene,
        camera: &Camera,
        scale: f32,
        x: u32,
        y: u32,
    ) -> Shaded {
        let mut rng = self.pixel_rng(x, y);

        let mut acc = Shaded::default();
        for _ in 0..self.samples_per_pixel {
            let coord = PixelCoord {
                x: x as f32 + rng.gen::<f32>(),
                y: y as f32 + rng.gen::<f32>(),
            };
            let ray = camera.ray(ViewportCoord::from_pixel_coord(camera, coord));
            let sample = self.shade_ray(scene, ray, scale, &mut rng);

            acc.color += sample.color;
            acc.normal += sample.normal;
            acc.albedo += sample.albedo;
        }

        let inv = 1.0 / self.samples_per_pixel as f32;
        Shaded {
            color: inv * acc.color,
            normal: inv * acc.normal,
            albedo: inv * acc.albedo,
        }
    }

    fn shade_ray(
        &self,
        scene: &Scene,
        ray: Ray,
        scale: f32,
        rng: &mut Xoshiro256StarStar,
    ) -> Shaded {
        let Some(hit) = intersect_scene(scene, &ray, f32::INFINITY) else {
            return Shaded {
                color: scene.background,
                normal: Vec3::ZERO,
                albedo: Vec3::ZERO,
            };
        };

        let facing = if hit.normal.dot(ray.direction) > 0.0 {
            -hit.normal
        } else {
            hit.normal
        };

        // headlight at the camera, falling off with distance
        let falloff = {
            let d = hit.t / scale;
            (1.0 + self.light_falloff * d * d).recip()
        };
        let diffuse = facing.dot(-ray.direction).max(0.0) * falloff;

        let ambient = self.ambient_intensity
            * AMBIENT_BASE
            * self.occlusion(scene, ray.at(hit.t) + 1e-3 * facing, facing, scale, rng);

        Shaded {
            color: (ambient + diffuse) * hit.albedo,
            normal: facing,
            albedo: hit.albedo,
        }
    }

    /// Fraction of `ambient_samples` hemisphere rays that escape the scene.
    fn occlusion(
        &self,
        scene: &Scene,
        origin: Vec3,
        normal: Vec3,
        scale: f32,
        rng: &mut Xoshiro256StarStar,
    ) -> f32 {
        if self.ambient_samples == 0 {
            return 1.0;
        }

        let mut open = 0u32;
        for _ in 0..self.ambient_samples {
            let dir = hemisphere_dir(normal, rng);
            let probe = Ray::new(origin, dir);
            if intersect_scene(scene, &probe, scale).is_none() {
                open += 1;
            }
        }
        open as f32 / self.ambient_samples as f32
    }

    /// A frame is a pure function of scene, settings and pixel position.
    fn pixel_rng(&self, x: u32, y: u32) -> Xoshiro256StarStar {
        let mut hasher = DefaultHasher::new();
        (self.seed, x, y).hash(&mut hasher);
        Xoshiro256StarStar::seed_from_u64(hasher.finish())
    }
}

struct Hit {
    t: f32,
    normal: Vec3,
    albedo: Vec3,
}

fn intersect_scene(scene: &Scene, ray: &Ray, t_max: f32) -> Option<Hit> {
    let mut closest = t_max;
    let mut best = None;

    for mesh in &scene.meshes {
        match mesh.bounds() {
            Some(bounds) if bounds.hit_by(ray, closest) => {}
            _ => continue,
        }
        for tri in mesh.triangles() {
            if let Some((t, normal)) = intersect_triangle(tri, ray) {
                if t < closest {
                    closest = t;
                    best = Some(Hit {
                        t,
                        normal,
                        albedo: mesh.albedo,
                    });
                }
            }
        }
    }

    best
}

/// Möller-Trumbore, returning distance and the (unnormalized winding) face
/// normal on a hit in front of the ray.
fn intersect_triangle(vertices: [Vec3; 3], ray: &Ray) -> Option<(f32, Vec3)> {
    let e1 = vertices[1] - vertices[0];
    let e2 = vertices[2] - vertices[0];

    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = det.recip();

    let s = ray.origin - vertices[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t > T_MIN).then(|| (t, e1.cross(e2).normalize_or_zero()))
}

fn hemisphere_dir(normal: Vec3, rng: &mut Xoshiro256StarStar) -> Vec3 {
    // rejection-sample the unit ball, flip into the upper hemisphere
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0f32),
            rng.gen_range(-1.0..1.0f32),
            rng.gen_range(-1.0..1.0f32),
        );
        let len2 = v.length_squared();
        if len2 > 1e-4 && len2 <= 1.0 {
            let v = v / len2.sqrt();
            return if v.dot(normal) < 0.0 { -v } else { v };
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::scene::TriangleMesh;
    use crate::Dimensions;

    use super::*;

    const DIM: Dimensions = Dimensions {
        width: 16,
        height: 12,
    };

    fn red_triangle_scene() -> Scene {
        let mut scene = Scene::default();
        scene.add_mesh(TriangleMesh::new(
            "tri".into(),
            vec![
                Vec3::new(-1.0, -1.0, -2.0),
                Vec3::new(1.0, -1.0, -2.0),
                Vec3::new(0.0, 1.0, -2.0),
            ],
            vec![0, 1, 2],
            Vec3::new(1.0, 0.0, 0.0),
        ));
        scene
    }

    fn device() -> Softray {
        let mut device = Softray::new();
        device.set_samples_per_pixel(2);
        device
    }

    #[test]
    fn triangle_covers_the_center_not_the_corner() {
        let scene = red_triangle_scene();
        let camera = Camera::new(DIM, f32::to_radians(70.));
        let mut frame = FrameBuffer::new(DIM);

        device().render(&scene, &camera, &mut frame).unwrap();

        let center = frame.albedo.get_pixel(DIM.width / 2, DIM.height / 2).0;
        assert!((center[0] - 1.0).abs() < 1e-5, "center albedo: {center:?}");
        assert_eq!(center[1], 0.0);

        let center_color = frame.color.get_pixel(DIM.width / 2, DIM.height / 2).0;
        assert!(center_color[0] > 0.0);
        assert_eq!(center_color[1], 0.0);

        let corner = frame.color.get_pixel(0, 0).0;
        assert_eq!(Vec3::from_slice(&corner), scene.background);
    }

    #[test]
    fn empty_scene_is_all_background() {
        let scene = Scene::default();
        let camera = Camera::new(DIM, f32::to_radians(70.));
        let mut frame = FrameBuffer::new(DIM);

        device().render(&scene, &camera, &mut frame).unwrap();

        for pixel in frame.color.pixels() {
            assert_eq!(Vec3::from_slice(&pixel.0), scene.background);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let scene = red_triangle_scene();
        let camera = Camera::new(DIM, f32::to_radians(70.));

        let mut a = FrameBuffer::new(DIM);
        let mut b = FrameBuffer::new(DIM);
        let device = device();
        device.render(&scene, &camera, &mut a).unwrap();
        device.render(&scene, &camera, &mut b).unwrap();

        assert_eq!(a.color.as_raw(), b.color.as_raw());
    }

    #[test]
    fn mismatched_frame_size_is_rejected() {
        let scene = Scene::default();
        let camera = Camera::new(DIM, f32::to_radians(70.));
        let mut frame = FrameBuffer::new(Dimensions {
            width: 8,
            height: 8,
        });

        assert!(device().render(&scene, &camera, &mut frame).is_err());
    }
}
