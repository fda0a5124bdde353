use glam::Vec3;

use crate::camera::Ray;

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds { min: p, max: p },
                Some(b) => Bounds {
                    min: b.min.min(p),
                    max: b.max.max(p),
                },
            })
        })
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    /// Half the diagonal, the radius of the enclosing sphere.
    pub fn radius(&self) -> f32 {
        0.5 * (self.max - self.min).length()
    }

    pub fn is_degenerate(&self) -> bool {
        self.radius() <= f32::EPSILON
    }

    /// Slab test. Conservative: in the degenerate cases where a slab division
    /// produces NaN this reports a hit rather than a miss.
    pub fn hit_by(&self, ray: &Ray, t_max: f32) -> bool {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;

        let t_enter = t0.min(t1).max_element();
        let t_exit = t0.max(t1).min_element();

        !(t_exit < t_enter.max(0.0) || t_enter > t_max)
    }
}

/// A triangle soup with a single diffuse color, the unit the loader emits.
pub struct TriangleMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Flat triangle list, three indices per face.
    pub indices: Vec<u32>,
    pub albedo: Vec3,
    bounds: Option<Bounds>,
}

impl TriangleMesh {
    pub fn new(name: String, positions: Vec<Vec3>, indices: Vec<u32>, albedo: Vec3) -> Self {
        let bounds = Bounds::from_points(positions.iter().copied());
        Self {
            name,
            positions,
            indices,
            albedo,
            bounds,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

pub struct Scene {
    pub meshes: Vec<TriangleMesh>,
    /// Flat sky color behind the geometry.
    pub background: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            background: Vec3::new(0.3, 0.3, 0.4),
        }
    }
}

impl Scene {
    pub fn add_mesh(&mut self, mesh: TriangleMesh) {
        self.meshes.push(mesh);
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.iter().all(|m| m.triangle_count() == 0)
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.meshes
            .iter()
            .filter_map(|m| m.bounds())
            .reduce(Bounds::union)
    }
}
