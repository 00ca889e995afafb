use log::{debug, warn};

use crate::error::UnsupportedEncoding;
use crate::parameters::{Encoding, Layout, Parameters};

#[cfg(test)]
use crate::parameters::FrameFormat;

const OPAQUE: u8 = 0xFF;
const BLACK: u8 = 0x00;
const WHITE: u8 = 0xFF;

const RGBA: usize = 4;

/// Whole RGBA lines decoded from one call to [`ImageScanner::consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBatch {
    /// Vertical offset of the first line in the final image.
    pub line: usize,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

pub trait RowSink {
    fn on_start(&mut self, _width: usize, _height: usize) {}

    fn on_row_batch(&mut self, batch: RowBatch);

    fn on_rejected(&mut self, _reason: &UnsupportedEncoding) {}
}

impl RowSink for Vec<RowBatch> {
    fn on_row_batch(&mut self, batch: RowBatch) {
        self.push(batch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: usize,
    pub expected_lines: usize,
    pub leftover: usize,
    pub cancelled: bool,
}

/// Turns an arbitrarily chunked raw scan stream into whole RGBA lines.
#[derive(Debug)]
pub struct ImageScanner {
    layout: Layout,
    line: usize,
    remainder: Vec<u8>,
}

impl ImageScanner {
    pub fn initialize(parameters: &Parameters) -> Result<Self, UnsupportedEncoding> {
        let layout = parameters.validate()?;

        Ok(ImageScanner {
            layout,
            line: 0,
            remainder: Vec::with_capacity(layout.bytes_per_line),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn remainder(&self) -> &[u8] {
        &self.remainder
    }

    pub fn consume(&mut self, data: &[u8]) -> Option<RowBatch> {
        let bytes_per_line = self.layout.bytes_per_line;
        let line_count = (self.remainder.len() + data.len()) / bytes_per_line;

        if line_count == 0 {
            self.remainder.extend_from_slice(data);
            return None;
        }

        let stride = self.layout.pixels_per_line * RGBA;
        let mut pixels = vec![0; line_count * stride];
        let mut rows = pixels.chunks_exact_mut(stride);
        let mut data = data;

        // the carried bytes always start the first line
        if !self.remainder.is_empty() {
            let head = bytes_per_line - self.remainder.len();
            self.remainder.extend_from_slice(&data[..head]);

            if let Some(dst) = rows.next() {
                decode_line(self.layout.encoding, &self.remainder, dst);
            }

            self.remainder.clear();
            data = &data[head..];
        }

        let whole = data.len() / bytes_per_line * bytes_per_line;

        for (src, dst) in data[..whole].chunks_exact(bytes_per_line).zip(rows) {
            decode_line(self.layout.encoding, src, dst);
        }

        self.remainder.extend_from_slice(&data[whole..]);

        let batch = RowBatch {
            line: self.line,
            width: self.layout.pixels_per_line,
            height: line_count,
            pixels,
        };

        debug!(
            "decoded lines {}..{} ({} bytes carried)",
            self.line,
            self.line + line_count,
            self.remainder.len()
        );

        self.line += line_count;

        Some(batch)
    }

    pub fn consume_into<S: RowSink + ?Sized>(&mut self, data: &[u8], sink: &mut S) {
        if let Some(batch) = self.consume(data) {
            sink.on_row_batch(batch);
        }
    }

    pub fn finish(self) -> ScanStats {
        if !self.remainder.is_empty() {
            warn!(
                "dropping {} trailing bytes of an incomplete line",
                self.remainder.len()
            );
        }

        ScanStats {
            lines: self.line,
            expected_lines: self.layout.lines,
            leftover: self.remainder.len(),
            cancelled: false,
        }
    }
}

fn decode_line(encoding: Encoding, src: &[u8], dst: &mut [u8]) {
    match encoding {
        Encoding::Gray8 => {
            for (pixel, &value) in dst.chunks_exact_mut(RGBA).zip(src) {
                pixel.copy_from_slice(&[value, value, value, OPAQUE]);
            }
        }

        Encoding::Rgb8 => {
            for (pixel, rgb) in dst.chunks_exact_mut(RGBA).zip(src.chunks_exact(3)) {
                pixel[..3].copy_from_slice(rgb);
                pixel[3] = OPAQUE;
            }
        }

        Encoding::Gray1 => {
            for (p, pixel) in dst.chunks_exact_mut(RGBA).enumerate() {
                let value = if src[p / 8] & mask(p) != 0 {
                    BLACK
                } else {
                    WHITE
                };

                pixel.copy_from_slice(&[value, value, value, OPAQUE]);
            }
        }

        // planes are interleaved byte by byte, so every 3 bytes hold
        // the red, green and blue bits of 8 pixels
        Encoding::Rgb1 => {
            for (p, pixel) in dst.chunks_exact_mut(RGBA).enumerate() {
                let group = p / 8 * 3;

                for (c, channel) in pixel[..3].iter_mut().enumerate() {
                    let byte = src.get(group + c).copied().unwrap_or(0);

                    *channel = if byte & mask(p) != 0 { 0xFF } else { 0x00 };
                }

                pixel[3] = OPAQUE;
            }
        }
    }
}

fn mask(pixel: usize) -> u8 {
    0x80 >> (pixel % 8)
}

#[cfg(test)]
fn scanner(
    format: FrameFormat,
    depth: i32,
    bytes_per_line: i32,
    pixels_per_line: i32,
) -> ImageScanner {
    ImageScanner::initialize(&Parameters {
        format,
        last_frame: true,
        bytes_per_line,
        pixels_per_line,
        lines: 4,
        depth,
    })
    .unwrap()
}

#[cfg(test)]
fn collect_pixels(scanner: &mut ImageScanner, chunks: &[&[u8]]) -> Vec<u8> {
    let mut batches: Vec<RowBatch> = Vec::new();

    for chunk in chunks {
        scanner.consume_into(chunk, &mut batches);
    }

    batches.into_iter().flat_map(|batch| batch.pixels).collect()
}

#[test]
fn consume_two_gray_lines_test() {
    let mut scanner = scanner(FrameFormat::Gray, 8, 4, 4);

    assert_eq!(scanner.consume(&[10, 20, 30, 40, 50]), Some(RowBatch {
        line: 0,
        width: 4,
        height: 1,
        pixels: vec![
            10, 10, 10, 255, 20, 20, 20, 255, 30, 30, 30, 255, 40, 40, 40, 255,
        ],
    }));
    assert_eq!(scanner.remainder(), &[50]);
    assert_eq!(scanner.line(), 1);
}

#[test]
fn consume_scenario_test() {
    let mut scanner = ImageScanner::initialize(&Parameters {
        format: FrameFormat::Gray,
        last_frame: true,
        bytes_per_line: 4,
        pixels_per_line: 4,
        lines: 2,
        depth: 8,
    })
    .unwrap();

    assert_eq!(scanner.consume(&[10, 20, 30]), None);
    assert_eq!(scanner.remainder(), &[10, 20, 30]);

    let batch = scanner.consume(&[40, 50, 60, 70, 80]).unwrap();
    assert_eq!(batch.line, 0);
    assert_eq!(batch.height, 2);
    assert_eq!(
        batch.pixels,
        vec![
            10, 10, 10, 255, 20, 20, 20, 255, 30, 30, 30, 255, 40, 40, 40, 255, 50, 50, 50,
            255, 60, 60, 60, 255, 70, 70, 70, 255, 80, 80, 80, 255,
        ]
    );
    assert!(scanner.remainder().is_empty());
    assert_eq!(scanner.line(), 2);
}

#[test]
fn no_emission_until_full_line_test() {
    let mut scanner = scanner(FrameFormat::Rgb, 8, 16, 5);

    assert_eq!(scanner.consume(&[]), None);
    assert_eq!(scanner.consume(&[1, 2, 3]), None);
    assert_eq!(scanner.consume(&[]), None);
    assert_eq!(scanner.consume(&[4, 5, 6, 7, 8, 9, 10, 11, 12]), None);
    assert_eq!(scanner.consume(&[13, 14, 15]), None);

    assert_eq!(
        scanner.remainder(),
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
    );
    assert_eq!(scanner.line(), 0);
}

#[test]
fn chunk_boundary_invariance_test() {
    let stream: Vec<u8> = (0..=255).cycle().take(7 * 10 + 3).collect();

    let one_shot = collect_pixels(&mut scanner(FrameFormat::Rgb, 8, 10, 3), &[&stream[..]]);

    let bytes: Vec<&[u8]> = stream.chunks(1).collect();
    let byte_at_a_time = collect_pixels(&mut scanner(FrameFormat::Rgb, 8, 10, 3), &bytes);

    let odd: Vec<&[u8]> = stream.chunks(7).collect();
    let odd_chunks = collect_pixels(&mut scanner(FrameFormat::Rgb, 8, 10, 3), &odd);

    let uneven = collect_pixels(
        &mut scanner(FrameFormat::Rgb, 8, 10, 3),
        &[&stream[..9], &stream[9..9], &stream[9..31], &stream[31..]],
    );

    assert_eq!(one_shot.len(), 7 * 3 * 4);
    assert_eq!(one_shot, byte_at_a_time);
    assert_eq!(one_shot, odd_chunks);
    assert_eq!(one_shot, uneven);
}

#[test]
fn line_cursor_order_test() {
    let mut scanner = scanner(FrameFormat::Gray, 8, 2, 2);
    let mut batches: Vec<RowBatch> = Vec::new();

    for chunk in [1usize, 3, 0, 4, 1, 5].iter() {
        scanner.consume_into(&vec![0; *chunk], &mut batches);
    }

    let mut next = 0;
    for batch in &batches {
        assert_eq!(batch.line, next);
        assert_eq!(batch.pixels.len(), batch.height * 2 * 4);
        next += batch.height;
    }

    assert_eq!(next, 7);
    assert_eq!(scanner.line(), 7);
    assert_eq!(scanner.remainder().len(), 0);
}

#[test]
fn rgb8_round_trip_test() {
    let pixels: Vec<[u8; 3]> = (0..6u8)
        .map(|i| [i * 40, 255 - i * 40, i * 7 + 1])
        .collect();

    // 3 pixels per line, 2 bytes of padding each
    let mut stream = Vec::new();
    for line in pixels.chunks(3) {
        for pixel in line {
            stream.extend_from_slice(pixel);
        }
        stream.extend_from_slice(&[0, 0]);
    }

    let mut scanner = scanner(FrameFormat::Rgb, 8, 11, 3);
    let batch = scanner.consume(&stream).unwrap();

    assert_eq!(batch.height, 2);
    for (pixel, rgba) in pixels.iter().zip(batch.pixels.chunks(4)) {
        assert_eq!(&rgba[..3], &pixel[..]);
        assert_eq!(rgba[3], 0xFF);
    }
}

#[test]
fn gray1_polarity_test() {
    let mut scanner = scanner(FrameFormat::Gray, 1, 1, 8);

    let black = scanner.consume(&[0xFF]).unwrap();
    assert_eq!(black.pixels, [0x00, 0x00, 0x00, 0xFF].repeat(8));

    let white = scanner.consume(&[0x00]).unwrap();
    assert_eq!(white.pixels, [0xFF, 0xFF, 0xFF, 0xFF].repeat(8));
    assert_eq!(white.line, 1);
}

#[test]
fn gray1_bit_order_test() {
    // 10 pixels, trailing 6 bits of the second byte are not pixels
    let mut scanner = scanner(FrameFormat::Gray, 1, 2, 10);
    let batch = scanner.consume(&[0b1010_0000, 0b0111_1111]).unwrap();

    let gray: Vec<u8> = batch.pixels.chunks(4).map(|pixel| pixel[0]).collect();
    assert_eq!(
        gray,
        vec![0x00, 0xFF, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]
    );
}

#[test]
fn rgb1_planes_test() {
    let mut scanner = scanner(FrameFormat::Rgb, 1, 3, 8);

    // red plane, green plane, blue plane for 8 pixels
    let batch = scanner.consume(&[0b1000_0001, 0b0100_0001, 0b0010_0000]).unwrap();
    let pixels: Vec<&[u8]> = batch.pixels.chunks(4).collect();

    assert_eq!(pixels[0], &[0xFF, 0x00, 0x00, 0xFF]);
    assert_eq!(pixels[1], &[0x00, 0xFF, 0x00, 0xFF]);
    assert_eq!(pixels[2], &[0x00, 0x00, 0xFF, 0xFF]);
    assert_eq!(pixels[3], &[0x00, 0x00, 0x00, 0xFF]);
    assert_eq!(pixels[7], &[0xFF, 0xFF, 0x00, 0xFF]);
}

#[test]
fn rgb1_short_planes_test() {
    // 2 pixels need 6 bits, so a single byte per line passes validation
    let mut scanner = scanner(FrameFormat::Rgb, 1, 1, 2);
    let batch = scanner.consume(&[0b1100_0000, 0xFF]).unwrap();

    assert_eq!(batch.height, 2);
    assert_eq!(
        batch.pixels[..8],
        [0xFF, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF]
    );
}

#[test]
fn padding_is_ignored_test() {
    let mut padded = scanner(FrameFormat::Gray, 8, 6, 3);
    let mut tight = scanner(FrameFormat::Gray, 8, 3, 3);

    let padded_pixels = collect_pixels(
        &mut padded,
        &[&[1, 2, 3, 99, 99, 99, 4, 5, 6, 77, 77, 77]],
    );
    let tight_pixels = collect_pixels(&mut tight, &[&[1, 2, 3, 4, 5, 6]]);

    assert_eq!(padded_pixels, tight_pixels);
    assert!(!padded_pixels.contains(&99));
    assert!(!padded_pixels.contains(&77));
}

#[test]
fn finish_reports_leftover_test() {
    let mut scanner = scanner(FrameFormat::Gray, 8, 4, 4);

    assert!(scanner.consume(&[1, 2, 3, 4, 5, 6]).is_some());

    assert_eq!(
        scanner.finish(),
        ScanStats {
            lines: 1,
            expected_lines: 4,
            leftover: 2,
            cancelled: false,
        }
    );
}

#[test]
fn carry_stays_within_one_line_test() {
    let mut scanner = scanner(FrameFormat::Gray, 8, 4, 4);

    assert!(scanner.consume(&[7, 7]).is_none());

    let batch = scanner.consume(&vec![9; 4_000_001]).unwrap();
    assert_eq!(batch.height, 1_000_000);
    assert_eq!(&batch.pixels[..8], &[7, 7, 7, 255, 7, 7, 7, 255]);
    assert_eq!(&batch.pixels[8..12], &[9, 9, 9, 255]);

    assert_eq!(scanner.remainder(), &[9, 9, 9]);
    assert!(scanner.remainder.capacity() < 64);
}
