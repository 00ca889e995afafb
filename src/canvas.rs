use image::RgbaImage;
use log::debug;

use crate::scanner::{RowBatch, RowSink};

/// Fixed-size RGBA bitmap that scanned lines are painted into as they arrive.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Canvas {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn reset(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Paints `batch` starting at its line offset. Rows and columns outside
    /// the canvas are clipped.
    pub fn put_image_data(&mut self, batch: &RowBatch) {
        let width = self.image.width() as usize;
        let height = self.image.height() as usize;

        if batch.line >= height {
            debug!(
                "rows {}..{} fall outside a {} line canvas",
                batch.line,
                batch.line + batch.height,
                height
            );
            return;
        }

        let stride = width * 4;
        let batch_stride = batch.width * 4;

        if stride == 0 || batch_stride == 0 {
            return;
        }

        let copy = stride.min(batch_stride);
        let rows = batch.height.min(height - batch.line);

        let buffer: &mut [u8] = &mut self.image;

        for (src, dst) in batch
            .pixels
            .chunks_exact(batch_stride)
            .zip(buffer[batch.line * stride..].chunks_exact_mut(stride))
            .take(rows)
        {
            dst[..copy].copy_from_slice(&src[..copy]);
        }
    }
}

impl RowSink for Canvas {
    fn on_start(&mut self, width: usize, height: usize) {
        self.reset(width as u32, height as u32);
    }

    fn on_row_batch(&mut self, batch: RowBatch) {
        self.put_image_data(&batch);
    }
}

#[cfg(test)]
use image::Rgba;

#[cfg(test)]
fn batch(line: usize, width: usize, height: usize, value: u8) -> RowBatch {
    RowBatch {
        line,
        width,
        height,
        pixels: vec![value; width * height * 4],
    }
}

#[test]
fn put_image_data_test() {
    let mut canvas = Canvas::new(2, 4);

    canvas.put_image_data(&batch(1, 2, 2, 9));

    assert_eq!(*canvas.image().get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    assert_eq!(*canvas.image().get_pixel(1, 1), Rgba([9, 9, 9, 9]));
    assert_eq!(*canvas.image().get_pixel(0, 2), Rgba([9, 9, 9, 9]));
    assert_eq!(*canvas.image().get_pixel(1, 3), Rgba([0, 0, 0, 0]));
}

#[test]
fn put_image_data_clips_test() {
    let mut canvas = Canvas::new(2, 3);

    canvas.put_image_data(&batch(2, 3, 2, 7));
    canvas.put_image_data(&batch(5, 2, 1, 8));

    assert_eq!(*canvas.image().get_pixel(1, 2), Rgba([7, 7, 7, 7]));
    assert_eq!(*canvas.image().get_pixel(1, 1), Rgba([0, 0, 0, 0]));
    assert_eq!(canvas.height(), 3);
}

#[test]
fn sink_reset_test() {
    let mut canvas = Canvas::new(1, 1);

    canvas.on_start(3, 2);
    canvas.on_row_batch(batch(0, 3, 2, 5));

    let image = canvas.into_image();
    assert_eq!(image.dimensions(), (3, 2));
    assert!(image.pixels().all(|pixel| *pixel == Rgba([5, 5, 5, 5])));
}

#[test]
fn put_image_data_empty_width_test() {
    let mut canvas = Canvas::new(0, 3);
    canvas.put_image_data(&batch(0, 2, 1, 1));
    assert_eq!(canvas.image().dimensions(), (0, 3));

    let mut canvas = Canvas::new(2, 2);
    canvas.put_image_data(&batch(0, 0, 1, 1));
    assert!(canvas.image().pixels().all(|pixel| *pixel == Rgba([0, 0, 0, 0])));
}
