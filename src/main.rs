use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use structopt::StructOpt;

use webscan::canvas::Canvas;
use webscan::export::{self, ImageType, DEFAULT_QUALITY};
use webscan::paper;
use webscan::parameters::{FrameFormat, Parameters};
use webscan::session::{run_scan, RawSession};

fn parse_format(format: &str) -> anyhow::Result<FrameFormat> {
    match format {
        "gray" => Ok(FrameFormat::Gray),
        "rgb" => Ok(FrameFormat::Rgb),
        "red" => Ok(FrameFormat::Red),
        "green" => Ok(FrameFormat::Green),
        "blue" => Ok(FrameFormat::Blue),
        _ => Err(anyhow!("unknown frame format {:?}", format)),
    }
}

fn parse_type(mime: &str) -> anyhow::Result<ImageType> {
    Ok(ImageType::from_mime(mime)?)
}

#[derive(StructOpt)]
#[structopt(
    name = "webscan",
    about = "Decodes a raw scanner dump into an image."
)]
struct Opt {
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    #[structopt(long, default_value = "rgb", parse(try_from_str = parse_format))]
    format: FrameFormat,

    #[structopt(long, default_value = "8")]
    depth: i32,

    #[structopt(long)]
    bytes_per_line: i32,

    #[structopt(long)]
    pixels_per_line: i32,

    #[structopt(long)]
    lines: i32,

    #[structopt(long)]
    multi_pass: bool,

    #[structopt(long, default_value = "4096")]
    chunk_size: usize,

    #[structopt(long = "type", parse(try_from_str = parse_type))]
    image_type: Option<ImageType>,

    #[structopt(long, default_value = "92")]
    quality: u8,

    #[structopt(long)]
    dpi: Option<f64>,

    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init()?;

    let parameters = Parameters {
        format: opt.format,
        last_frame: !opt.multi_pass,
        bytes_per_line: opt.bytes_per_line,
        pixels_per_line: opt.pixels_per_line,
        lines: opt.lines,
        depth: opt.depth,
    };

    let input = File::open(&opt.input)
        .with_context(|| format!("failed to open {}", opt.input.display()))?;
    let mut session = RawSession::new(BufReader::new(input), parameters, opt.chunk_size);
    let mut canvas = Canvas::new(0, 0);

    let stats = run_scan(&mut session, &mut canvas)?;

    if let Some(dpi) = opt.dpi {
        println!(
            "page {}",
            paper::describe_page(canvas.width(), canvas.height(), dpi)
        );
    }

    let quality = if opt.quality == 0 {
        DEFAULT_QUALITY
    } else {
        opt.quality
    };

    let image_type = opt.image_type.unwrap_or_default();

    let output = match opt.output {
        Some(output) => output,
        None => {
            let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();

            PathBuf::from(export::export_name(
                image_type,
                quality,
                timestamp,
                None,
                None,
            ))
        }
    };

    let bytes = export::encode(canvas.image(), image_type, quality)?;
    fs::write(&output, bytes).with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} ({} of {} lines)",
        output.display(),
        stats.lines,
        stats.expected_lines
    );

    Ok(())
}

#[test]
fn image_type_defaults_to_jpeg_test() {
    let opt = Opt::from_iter(&[
        "webscan",
        "scan.raw",
        "--bytes-per-line",
        "3",
        "--pixels-per-line",
        "1",
        "--lines",
        "1",
    ]);

    assert_eq!(opt.image_type.unwrap_or_default(), ImageType::Jpeg);
    assert_eq!(opt.format, FrameFormat::Rgb);

    let opt = Opt::from_iter(&[
        "webscan",
        "scan.raw",
        "--bytes-per-line",
        "3",
        "--pixels-per-line",
        "1",
        "--lines",
        "1",
        "--type",
        "image/png",
    ]);

    assert_eq!(opt.image_type, Some(ImageType::Png));
}
