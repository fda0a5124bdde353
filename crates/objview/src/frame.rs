use image::{buffer::ConvertBuffer, ImageBuffer, Rgb32FImage, RgbImage};

use crate::Dimensions;

/// Offscreen color plane plus the auxiliary planes a denoiser wants.
pub struct FrameBuffer {
    pub color: Rgb32FImage,
    pub normal: Rgb32FImage,
    pub albedo: Rgb32FImage,
}

impl FrameBuffer {
    pub fn new(dimensions: Dimensions) -> Self {
        let Dimensions { width, height } = dimensions;
        Self {
            color: ImageBuffer::new(width, height),
            normal: ImageBuffer::new(width, height),
            albedo: ImageBuffer::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// 8-bit copy of the color plane, for snapshots.
    pub fn to_ldr(&self) -> RgbImage {
        self.color.convert()
    }
}
