//! The output raster buffer.
//!
//! Exactly one actor (the assembly consumer) holds the canvas and pastes
//! tiles into it; nothing else reads or writes it while the pipeline runs.

use image::{imageops, RgbImage};

use crate::target::CellBox;

/// A single mutable output raster, assembled by pasting matched tiles.
#[derive(Debug)]
pub struct MosaicCanvas {
    image: RgbImage,
}

impl MosaicCanvas {
    /// Create a blank (black) canvas of the final mosaic dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbImage::new(width, height) }
    }

    /// Overwrite the given box with a tile's pixel buffer.
    pub fn paste(&mut self, pixels: &RgbImage, bounds: &CellBox) {
        imageops::replace(&mut self.image, pixels, bounds.x0 as i64, bounds.y0 as i64);
    }

    /// Canvas dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Hand the finished buffer to the encoder.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_new_canvas_is_blank() {
        let canvas = MosaicCanvas::new(4, 4);
        assert_eq!(canvas.dimensions(), (4, 4));
        assert!(canvas.into_image().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_paste_fills_exactly_the_box() {
        let mut canvas = MosaicCanvas::new(4, 4);
        let tile = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        canvas.paste(&tile, &CellBox { x0: 2, y0: 0, x1: 4, y1: 2 });

        let image = canvas.into_image();
        assert_eq!(image.get_pixel(2, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(3, 1).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0]);
    }

    #[test]
    fn test_paste_overwrites_previous_content() {
        let mut canvas = MosaicCanvas::new(2, 2);
        let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let blue = RgbImage::from_pixel(2, 2, Rgb([0, 0, 255]));
        let bounds = CellBox { x0: 0, y0: 0, x1: 2, y1: 2 };
        canvas.paste(&red, &bounds);
        canvas.paste(&blue, &bounds);
        assert!(canvas.into_image().pixels().all(|p| p.0 == [0, 0, 255]));
    }
}
