//! Core of the objview viewer: an OBJ scene, a pluggable physically-based
//! render device behind a library-name seam, and a reactive controller that
//! keeps a streamed remote view in sync with a handful of user parameters.

pub mod backend;
pub mod camera;
pub mod controller;
pub mod error;
pub mod frame;
pub mod loader;
pub mod params;
pub mod refresh;
pub mod scene;
pub mod target;
pub mod view;

pub use controller::RenderController;
pub use error::ViewerError;
pub use frame::FrameBuffer;
pub use params::ParamValue;
pub use refresh::{shutdown_channel, ControlEvent, EventLoop, Shutdown, ShutdownHandle};
pub use target::RenderTarget;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::str::FromStr for Dimensions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split_it = s.split('x');
        let (Some(a), Some(b)) = (split_it.next(), split_it.next()) else {
            return Err(anyhow::anyhow!("expected `width`x`height`"));
        };
        let width: u32 = a.parse()?;
        let height: u32 = b.parse()?;

        Ok(Dimensions { width, height })
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}x{}", self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::Dimensions;

    #[test]
    fn dimensions_roundtrip() {
        let dim: Dimensions = "800x600".parse().unwrap();
        assert_eq!(
            dim,
            Dimensions {
                width: 800,
                height: 600
            }
        );
        assert_eq!(dim.to_string(), "800x600");
    }

    #[test]
    fn dimensions_rejects_garbage() {
        assert!("800".parse::<Dimensions>().is_err());
        assert!("800xtall".parse::<Dimensions>().is_err());
    }
}
