use image::{DynamicImage, ImageOutputFormat, RgbaImage};

use crate::error::{Error, Result};

pub const DEFAULT_QUALITY: u8 = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
}

impl Default for ImageType {
    fn default() -> Self {
        ImageType::Jpeg
    }
}

impl ImageType {
    pub const ALL: [ImageType; 2] = [ImageType::Png, ImageType::Jpeg];

    pub fn from_mime(mime: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|image_type| image_type.mime() == mime)
            .ok_or_else(|| Error::UnknownType(mime.to_string()))
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Png => ".png",
            ImageType::Jpeg => ".jpg",
        }
    }

    pub fn lossless(self) -> bool {
        match self {
            ImageType::Png => true,
            ImageType::Jpeg => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Zip,
    Pdf,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Zip => ".zip",
            Container::Pdf => ".pdf",
        }
    }
}

/// File name for an exported scan, e.g. `webscan-1700000000000-92.jpg` or
/// `webscan-page-1700000000000-png.zip`.
pub fn export_name(
    image_type: ImageType,
    quality: u8,
    timestamp_ms: u128,
    extra: Option<&str>,
    container: Option<Container>,
) -> String {
    let mut name = String::from("webscan");

    if let Some(extra) = extra.filter(|extra| !extra.is_empty()) {
        name.push('-');
        name.push_str(extra);
    }

    name.push_str(&format!("-{}", timestamp_ms));

    if container.is_some() {
        name.push('-');
        name.push_str(&image_type.extension()[1..]);
    }

    if !image_type.lossless() {
        name.push_str(&format!("-{}", quality));
    }

    match container {
        Some(container) => name.push_str(container.extension()),
        None => name.push_str(image_type.extension()),
    }

    name
}

pub fn encode(image: &RgbaImage, image_type: ImageType, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();

    match image_type {
        ImageType::Png => DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut bytes, ImageOutputFormat::Png)?,

        // no alpha in JPEG
        ImageType::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

            DynamicImage::ImageRgb8(rgb)
                .write_to(&mut bytes, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?
        }
    }

    Ok(bytes)
}

#[cfg(test)]
use image::Rgba;

#[test]
fn image_type_test() {
    assert_eq!(ImageType::from_mime("image/png").unwrap(), ImageType::Png);
    assert_eq!(ImageType::from_mime("image/jpeg").unwrap(), ImageType::Jpeg);
    assert!(matches!(
        ImageType::from_mime("image/webp"),
        Err(Error::UnknownType(_))
    ));
    assert_eq!(ImageType::default(), ImageType::Jpeg);
}

#[test]
fn export_name_test() {
    assert_eq!(
        export_name(ImageType::Png, 92, 1700000000000, None, None),
        "webscan-1700000000000.png"
    );
    assert_eq!(
        export_name(ImageType::Jpeg, 75, 1700000000000, None, None),
        "webscan-1700000000000-75.jpg"
    );
    assert_eq!(
        export_name(ImageType::Jpeg, 75, 42, Some("page"), Some(Container::Zip)),
        "webscan-page-42-jpg-75.zip"
    );
    assert_eq!(
        export_name(ImageType::Png, 75, 42, Some(""), Some(Container::Pdf)),
        "webscan-42-png.pdf"
    );
}

#[test]
fn encode_png_test() {
    let original = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 80, y as u8 * 100, 7, 255]));

    let bytes = encode(&original, ImageType::Png, DEFAULT_QUALITY).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();

    assert_eq!(decoded, original);
}

#[test]
fn encode_jpeg_test() {
    let original = RgbaImage::from_pixel(16, 8, Rgba([200, 200, 200, 255]));

    let bytes = encode(&original, ImageType::Jpeg, DEFAULT_QUALITY).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 8));
}
