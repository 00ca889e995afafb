use std::fmt;

use crate::error::UnsupportedEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Gray,
    Rgb,
    Red,
    Green,
    Blue,
}

impl FrameFormat {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Gray),
            1 => Some(Self::Rgb),
            2 => Some(Self::Red),
            3 => Some(Self::Green),
            4 => Some(Self::Blue),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Gray => 0,
            Self::Rgb => 1,
            Self::Red => 2,
            Self::Green => 3,
            Self::Blue => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Rgb => "rgb",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image description reported by the device once a scan has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    pub format: FrameFormat,
    pub last_frame: bool,
    pub bytes_per_line: i32,
    pub pixels_per_line: i32,
    pub lines: i32,
    pub depth: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gray8,
    Rgb8,
    Gray1,
    Rgb1,
}

/// Geometry of a scan that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub encoding: Encoding,
    pub bytes_per_line: usize,
    pub pixels_per_line: usize,
    pub lines: usize,
}

impl Parameters {
    pub fn channels(&self) -> i32 {
        match self.format {
            FrameFormat::Gray => 1,
            _ => 3,
        }
    }

    pub fn validate(&self) -> Result<Layout, UnsupportedEncoding> {
        if self.format != FrameFormat::Gray && self.format != FrameFormat::Rgb {
            return Err(UnsupportedEncoding::Format(self.format));
        }

        if self.depth != 1 && self.depth != 8 {
            return Err(UnsupportedEncoding::Depth(self.depth));
        }

        if !self.last_frame {
            return Err(UnsupportedEncoding::MultiPass);
        }

        if self.lines < 0 {
            return Err(UnsupportedEncoding::UnknownHeight(self.lines));
        }

        if self.bytes_per_line <= 0 || self.pixels_per_line <= 0 || self.lines <= 0 {
            return Err(UnsupportedEncoding::ImageSize {
                bytes_per_line: self.bytes_per_line,
                pixels_per_line: self.pixels_per_line,
                lines: self.lines,
            });
        }

        let bits = i64::from(self.pixels_per_line)
            * i64::from(self.depth)
            * i64::from(self.channels());

        if i64::from(self.bytes_per_line) * 8 < bits {
            return Err(UnsupportedEncoding::ByteCount {
                bytes_per_line: self.bytes_per_line,
                bits,
            });
        }

        let encoding = match (self.format, self.depth) {
            (FrameFormat::Gray, 8) => Encoding::Gray8,
            (FrameFormat::Gray, _) => Encoding::Gray1,
            (_, 8) => Encoding::Rgb8,
            _ => Encoding::Rgb1,
        };

        Ok(Layout {
            encoding,
            bytes_per_line: self.bytes_per_line as usize,
            pixels_per_line: self.pixels_per_line as usize,
            lines: self.lines as usize,
        })
    }
}

#[cfg(test)]
fn parameters(
    format: FrameFormat,
    depth: i32,
    bytes_per_line: i32,
    pixels_per_line: i32,
) -> Parameters {
    Parameters {
        format,
        last_frame: true,
        bytes_per_line,
        pixels_per_line,
        lines: 10,
        depth,
    }
}

#[test]
fn frame_format_codes_test() {
    for code in 0..5 {
        assert_eq!(FrameFormat::from_code(code).unwrap().code(), code);
    }

    assert_eq!(FrameFormat::from_code(5), None);
    assert_eq!(FrameFormat::from_code(-1), None);
    assert_eq!(FrameFormat::Rgb.to_string(), "rgb");
}

#[test]
fn validate_test() {
    assert_eq!(
        parameters(FrameFormat::Gray, 8, 4, 4).validate(),
        Ok(Layout {
            encoding: Encoding::Gray8,
            bytes_per_line: 4,
            pixels_per_line: 4,
            lines: 10,
        })
    );

    assert_eq!(
        parameters(FrameFormat::Rgb, 8, 32, 10).validate().map(|layout| layout.encoding),
        Ok(Encoding::Rgb8)
    );
    assert_eq!(
        parameters(FrameFormat::Gray, 1, 2, 10).validate().map(|layout| layout.encoding),
        Ok(Encoding::Gray1)
    );
    assert_eq!(
        parameters(FrameFormat::Rgb, 1, 6, 16).validate().map(|layout| layout.encoding),
        Ok(Encoding::Rgb1)
    );
}

#[test]
fn validate_rejects_test() {
    assert_eq!(
        parameters(FrameFormat::Red, 8, 4, 4).validate(),
        Err(UnsupportedEncoding::Format(FrameFormat::Red))
    );

    assert_eq!(
        parameters(FrameFormat::Gray, 16, 8, 4).validate(),
        Err(UnsupportedEncoding::Depth(16))
    );

    let mut multi_pass = parameters(FrameFormat::Rgb, 8, 12, 4);
    multi_pass.last_frame = false;
    assert_eq!(multi_pass.validate(), Err(UnsupportedEncoding::MultiPass));

    let mut hand_scanner = parameters(FrameFormat::Gray, 8, 4, 4);
    hand_scanner.lines = -1;
    assert_eq!(
        hand_scanner.validate(),
        Err(UnsupportedEncoding::UnknownHeight(-1))
    );

    assert_eq!(
        parameters(FrameFormat::Gray, 8, 0, 4).validate(),
        Err(UnsupportedEncoding::ImageSize {
            bytes_per_line: 0,
            pixels_per_line: 4,
            lines: 10,
        })
    );

    let mut empty = parameters(FrameFormat::Gray, 8, 4, 4);
    empty.lines = 0;
    assert!(matches!(
        empty.validate(),
        Err(UnsupportedEncoding::ImageSize { lines: 0, .. })
    ));
}

#[test]
fn validate_byte_count_test() {
    // one byte short of the minimum for each encoding
    assert_eq!(
        parameters(FrameFormat::Gray, 8, 3, 4).validate(),
        Err(UnsupportedEncoding::ByteCount {
            bytes_per_line: 3,
            bits: 32,
        })
    );
    assert_eq!(
        parameters(FrameFormat::Rgb, 8, 29, 10).validate(),
        Err(UnsupportedEncoding::ByteCount {
            bytes_per_line: 29,
            bits: 240,
        })
    );
    assert_eq!(
        parameters(FrameFormat::Gray, 1, 1, 10).validate(),
        Err(UnsupportedEncoding::ByteCount {
            bytes_per_line: 1,
            bits: 10,
        })
    );
    assert_eq!(
        parameters(FrameFormat::Rgb, 1, 5, 16).validate(),
        Err(UnsupportedEncoding::ByteCount {
            bytes_per_line: 5,
            bits: 48,
        })
    );
}

#[test]
fn validate_order_test() {
    // format is checked before depth, depth before pass count
    let mut parameters = parameters(FrameFormat::Blue, 16, 0, 4);
    parameters.last_frame = false;
    assert_eq!(
        parameters.validate(),
        Err(UnsupportedEncoding::Format(FrameFormat::Blue))
    );

    parameters.format = FrameFormat::Gray;
    assert_eq!(parameters.validate(), Err(UnsupportedEncoding::Depth(16)));

    parameters.depth = 8;
    assert_eq!(parameters.validate(), Err(UnsupportedEncoding::MultiPass));
}
