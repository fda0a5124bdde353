//! OBJ import through `tobj`, flattened into [TriangleMesh]es.

use std::path::Path;

use glam::Vec3;

use crate::{
    error::ViewerError,
    scene::{Scene, TriangleMesh},
};

const DEFAULT_ALBEDO: Vec3 = Vec3::new(0.7, 0.7, 0.7);

pub fn load_obj(path: &Path) -> Result<Scene, ViewerError> {
    let (models, materials) =
        tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| {
            ViewerError::GeometryLoad {
                path: path.to_owned(),
                source,
            }
        })?;

    // Diffuse colors when a material library resolves, a neutral gray otherwise.
    let diffuse: Vec<Vec3> = match materials {
        Ok(materials) => materials
            .iter()
            .map(|m| Vec3::new(m.diffuse[0], m.diffuse[1], m.diffuse[2]))
            .collect(),
        Err(err) => {
            log::debug!("no usable material library for {path:?}: {err}");
            Vec::new()
        }
    };

    let mut scene = Scene::default();
    for model in models {
        let mesh = model.mesh;
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            log::debug!("skipping empty model {:?}", model.name);
            continue;
        }

        let albedo = mesh
            .material_id
            .and_then(|id| diffuse.get(id).copied())
            .unwrap_or(DEFAULT_ALBEDO);

        let positions: &[Vec3] = bytemuck::cast_slice(&mesh.positions);
        scene.add_mesh(TriangleMesh::new(
            model.name,
            positions.to_vec(),
            mesh.indices,
            albedo,
        ));
    }

    log::info!(
        "loaded {} meshes / {} triangles from {path:?}",
        scene.meshes.len(),
        scene.triangle_count()
    );

    Ok(scene)
}
