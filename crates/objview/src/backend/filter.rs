//! Edge-preserving smoothing of the color plane, guided by the normal and
//! albedo planes so silhouettes and material borders stay crisp.

use glam::Vec3;
use image::Rgb;

use crate::frame::FrameBuffer;

const RADIUS: i32 = 2;

/// Weight sharpness for normal disagreement.
const NORMAL_K: f32 = 8.0;
/// Weight sharpness for albedo disagreement.
const ALBEDO_K: f32 = 16.0;

pub fn denoise(frame: &mut FrameBuffer) {
    let width = frame.width() as i32;
    let height = frame.height() as i32;

    let source = frame.color.clone();
    let at = |img: &image::Rgb32FImage, x: i32, y: i32| -> Vec3 {
        let x = x.clamp(0, width - 1) as u32;
        let y = y.clamp(0, height - 1) as u32;
        Vec3::from_slice(&img.get_pixel(x, y).0)
    };

    for y in 0..height {
        for x in 0..width {
            let n0 = at(&frame.normal, x, y);
            let a0 = at(&frame.albedo, x, y);

            let mut sum = Vec3::ZERO;
            let mut weight = 0.0;
            for dy in -RADIUS..=RADIUS {
                for dx in -RADIUS..=RADIUS {
                    let n = at(&frame.normal, x + dx, y + dy);
                    let a = at(&frame.albedo, x + dx, y + dy);

                    let w = f32::exp(-NORMAL_K * (1.0 - n0.dot(n)).max(0.0))
                        * f32::exp(-ALBEDO_K * (a0 - a).length_squared());

                    sum += w * at(&source, x + dx, y + dy);
                    weight += w;
                }
            }

            // the center tap always contributes, so weight > 0
            let filtered = sum / weight;
            frame
                .color
                .put_pixel(x as u32, y as u32, Rgb(filtered.to_array()));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Dimensions;

    use super::*;

    fn flat_frame(color: Vec3, normal: Vec3, albedo: Vec3) -> FrameBuffer {
        let mut frame = FrameBuffer::new(Dimensions {
            width: 8,
            height: 8,
        });
        for y in 0..8 {
            for x in 0..8 {
                frame.color.put_pixel(x, y, Rgb(color.to_array()));
                frame.normal.put_pixel(x, y, Rgb(normal.to_array()));
                frame.albedo.put_pixel(x, y, Rgb(albedo.to_array()));
            }
        }
        frame
    }

    #[test]
    fn uniform_region_is_unchanged() {
        let color = Vec3::new(0.2, 0.4, 0.6);
        let mut frame = flat_frame(color, Vec3::Z, Vec3::splat(0.7));

        denoise(&mut frame);

        for pixel in frame.color.pixels() {
            assert!(Vec3::from_slice(&pixel.0).distance(color) < 1e-4);
        }
    }

    #[test]
    fn speckle_is_smoothed_within_a_flat_region() {
        let mut frame = flat_frame(Vec3::splat(0.5), Vec3::Z, Vec3::splat(0.7));
        frame.color.put_pixel(4, 4, Rgb([5.0, 5.0, 5.0]));

        denoise(&mut frame);

        let center = frame.color.get_pixel(4, 4).0[0];
        assert!(center < 1.0, "speckle should flatten, got {center}");
    }

    #[test]
    fn albedo_edge_is_preserved() {
        let mut frame = flat_frame(Vec3::splat(0.1), Vec3::Z, Vec3::splat(0.1));
        // right half: different material, much brighter
        for y in 0..8 {
            for x in 4..8 {
                frame.color.put_pixel(x, y, Rgb([1.0, 1.0, 1.0]));
                frame.albedo.put_pixel(x, y, Rgb([1.0, 1.0, 1.0]));
            }
        }

        denoise(&mut frame);

        let left = frame.color.get_pixel(2, 4).0[0];
        let right = frame.color.get_pixel(5, 4).0[0];
        assert!(left < 0.2, "left of the edge bled: {left}");
        assert!(right > 0.9, "right of the edge bled: {right}");
    }
}
