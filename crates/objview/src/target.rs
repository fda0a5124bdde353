use std::time::Instant;

use crate::{
    backend::PbrBackend, camera::Camera, error::ViewerError, frame::FrameBuffer, scene::Scene,
    Dimensions,
};

const VFOV_DEGREES: f32 = 70.0;

/// The offscreen surface and everything needed to refill it: scene, camera
/// and the device doing the actual work.
pub struct RenderTarget {
    scene: Scene,
    camera: Camera,
    backend: Box<dyn PbrBackend>,
    frame: FrameBuffer,
}

impl RenderTarget {
    pub fn new(scene: Scene, dimensions: Dimensions, backend: Box<dyn PbrBackend>) -> Self {
        let mut camera = Camera::new(dimensions, f32::to_radians(VFOV_DEGREES));
        // a fresh target frames its scene right away
        if let Some(bounds) = scene.bounds() {
            camera.frame_bounds(&bounds);
        }

        Self {
            scene,
            camera,
            backend,
            frame: FrameBuffer::new(dimensions),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn backend_mut(&mut self) -> &mut dyn PbrBackend {
        self.backend.as_mut()
    }

    /// Re-render the scene into the frame buffer.
    pub fn render(&mut self) -> Result<(), ViewerError> {
        let start = Instant::now();
        self.backend
            .render(&self.scene, &self.camera, &mut self.frame)
            .map_err(ViewerError::Render)?;
        log::debug!(
            "frame rendered in {:.1} ms",
            start.elapsed().as_secs_f32() * 1000.0
        );
        Ok(())
    }

    /// Reposition the camera to frame all geometry. A no-op on an empty scene.
    pub fn reset_camera(&mut self) {
        match self.scene.bounds() {
            Some(bounds) => self.camera.frame_bounds(&bounds),
            None => log::debug!("reset view on an empty scene does nothing"),
        }
    }
}
