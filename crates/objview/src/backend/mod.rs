//! The seam between the viewer and a physically-based render device.
//!
//! Devices are picked by library name: a registry of known names, with
//! `"environment"` deferring to the [LIBRARY_ENV] environment variable and
//! falling back to the built-in device. Unknown names fail construction.

mod filter;
mod softray;

pub use softray::Softray;

use crate::{camera::Camera, error::ViewerError, frame::FrameBuffer, scene::Scene};

/// Environment variable consulted when the library name is `"environment"`.
pub const LIBRARY_ENV: &str = "OBJVIEW_LIBRARY";

/// Library used when `"environment"` resolves to nothing.
pub const DEFAULT_LIBRARY: &str = "softray";

/// Parameter surface of a physically-based render device.
pub trait PbrBackend {
    fn name(&self) -> &'static str;

    fn set_samples_per_pixel(&mut self, spp: u32);
    fn set_denoiser(&mut self, enabled: bool);
    fn set_ambient_intensity(&mut self, intensity: f32);
    fn set_ambient_samples(&mut self, samples: u32);
    fn set_light_falloff(&mut self, falloff: f32);

    /// Render one frame of `scene` as seen by `camera` into `frame`.
    fn render(&self, scene: &Scene, camera: &Camera, frame: &mut FrameBuffer)
        -> anyhow::Result<()>;
}

/// Construct the device registered under `name`.
pub fn resolve(name: &str) -> Result<Box<dyn PbrBackend>, ViewerError> {
    let resolved = if name == "environment" {
        match std::env::var(LIBRARY_ENV) {
            Ok(name) if !name.is_empty() => name,
            _ => DEFAULT_LIBRARY.to_owned(),
        }
    } else {
        name.to_owned()
    };

    match resolved.as_str() {
        "softray" => {
            log::info!("using render library {resolved:?}");
            Ok(Box::new(Softray::new()))
        }
        other => Err(ViewerError::BackendInit(format!(
            "no render library named {other:?} (known: \"softray\", \"environment\")"
        ))),
    }
}
