pub mod canvas;
pub mod error;
pub mod export;
pub mod paper;
pub mod parameters;
pub mod scanner;
pub mod session;

use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;

use crate::canvas::Canvas;
use crate::export::ImageType;
use crate::parameters::{FrameFormat, Parameters};
use crate::scanner::{ImageScanner, RowBatch};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());

    Ok(())
}

fn js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
pub struct Rows {
    batch: RowBatch,
}

#[wasm_bindgen]
impl Rows {
    #[wasm_bindgen(getter)]
    pub fn line(&self) -> u32 {
        self.batch.line as u32
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.batch.width as u32
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.batch.height as u32
    }

    pub fn pixels(&self) -> Clamped<Vec<u8>> {
        Clamped(self.batch.pixels.clone())
    }
}

#[wasm_bindgen]
pub struct Scanner {
    scanner: ImageScanner,
    canvas: Canvas,
}

#[wasm_bindgen]
impl Scanner {
    #[wasm_bindgen(constructor)]
    pub fn new(
        format: i32,
        depth: i32,
        bytes_per_line: i32,
        pixels_per_line: i32,
        lines: i32,
        last_frame: bool,
    ) -> Result<Scanner, JsValue> {
        let format = FrameFormat::from_code(format)
            .ok_or_else(|| JsValue::from_str(&format!("invalid format ({})", format)))?;

        let parameters = Parameters {
            format,
            last_frame,
            bytes_per_line,
            pixels_per_line,
            lines,
            depth,
        };

        let scanner = ImageScanner::initialize(&parameters).map_err(js_error)?;
        let layout = *scanner.layout();

        Ok(Scanner {
            scanner,
            canvas: Canvas::new(layout.pixels_per_line as u32, layout.lines as u32),
        })
    }

    /// Feeds raw device bytes, returning the whole lines they completed.
    pub fn consume(&mut self, data: &[u8]) -> Option<Rows> {
        let batch = self.scanner.consume(data)?;
        self.canvas.put_image_data(&batch);

        Some(Rows { batch })
    }

    #[wasm_bindgen(getter)]
    pub fn line(&self) -> u32 {
        self.scanner.line() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn leftover(&self) -> u32 {
        self.scanner.remainder().len() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn pixels(&self) -> Clamped<Vec<u8>> {
        Clamped(self.canvas.image().as_raw().clone())
    }

    pub fn export(&self, mime: &str, quality: u8) -> Result<Vec<u8>, JsValue> {
        let image_type = ImageType::from_mime(mime).map_err(js_error)?;

        export::encode(self.canvas.image(), image_type, quality).map_err(js_error)
    }
}

#[wasm_bindgen]
pub fn export_name(mime: &str, quality: u8, timestamp_ms: f64, extra: Option<String>) -> Result<String, JsValue> {
    let image_type = ImageType::from_mime(mime).map_err(js_error)?;

    Ok(export::export_name(
        image_type,
        quality,
        timestamp_ms as u128,
        extra.as_deref(),
        None,
    ))
}
