//! jpegll CLI - inspect JPEG segments and decode lossless JPEG images.

use byteorder::{BigEndian, WriteBytesExt};
use clap::{Parser, Subcommand, ValueEnum};
use jpeg_lossless_rs::jpeg_marker_code::{APP0, marker_name};
use jpeg_lossless_rs::segment::{Application, Segment};
use jpeg_lossless_rs::{
    AppSegmentFilter, ChannelOrder, DecoderOptions, Image, LosslessJpegReader, PixelBuffer,
    SegmentImageInput, Slices, WarningFn, pixels,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Lossless JPEG decoder and segment inspector
#[derive(Parser)]
#[command(name = "jpegll")]
#[command(version)]
#[command(about = "Inspect JPEG marker segments and decode lossless JPEG (SOF3) images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jpegll info -i image.jpg
    jpegll segments -i image.jpg
    jpegll decode -i image.ljpg -o image.pgm -f pnm
    jpegll decode -i raw.ljpg -o sensor.raw --slices 2,1728,1904
    jpegll filter -i image.jpg -o clean.jpg --keep APP0:JFIF

Set RUST_LOG=trace for a segment-by-segment log.")]
struct Cli {
    /// Dump tables and scan parameters while decoding
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a lossless JPEG image to raw samples or PGM/PPM
    #[command(visible_alias = "d")]
    Decode {
        #[arg(short, long, help = "Path to the input JPEG file")]
        input: PathBuf,

        #[arg(short, long, help = "Path for the output file")]
        output: PathBuf,

        /// Output format: raw (samples, 16-bit big-endian above 8 bits) or pnm
        #[arg(short, long, default_value = "raw", value_enum)]
        format: OutputFormat,

        /// Write three-component images as BGR instead of RGB (raw output only)
        #[arg(long)]
        bgr: bool,

        /// CR2 slice geometry: slice count, slice width, last slice width
        #[arg(long, value_parser = parse_slices)]
        slices: Option<Slices>,
    },

    /// Show frame, color space and metadata information
    #[command(visible_alias = "i")]
    Info {
        #[arg(short, long, help = "Path to the JPEG file to inspect")]
        input: PathBuf,

        /// Also list Huffman and quantization tables
        #[arg(short, long)]
        extended: bool,
    },

    /// List the physical marker segments, including filtered ones
    #[command(visible_alias = "s")]
    Segments {
        #[arg(short, long, help = "Path to the JPEG file to inspect")]
        input: PathBuf,
    },

    /// Write the filtered stream: unwanted APPn segments removed, broken segments repaired
    #[command(visible_alias = "f")]
    Filter {
        #[arg(short, long, help = "Path to the input JPEG file")]
        input: PathBuf,

        #[arg(short, long, help = "Path for the filtered JPEG file")]
        output: PathBuf,

        /// Additional APPn segments to keep, as APPn:identifier (Exif and Adobe are always kept)
        #[arg(long, value_parser = parse_app_segment)]
        keep: Vec<(u16, String)>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Raw sample data
    Raw,
    /// Portable anymap (PGM for gray, PPM for RGB)
    Pnm,
}

fn parse_slices(value: &str) -> Result<Slices, String> {
    let parts: Vec<usize> = value
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid slice geometry '{value}': {e}"))?;
    match parts.as_slice() {
        [count, width, last_width] => Ok(Slices::new(*count, *width, *last_width)),
        _ => Err(format!("expected N,W,L slice geometry, got '{value}'")),
    }
}

fn parse_app_segment(value: &str) -> Result<(u16, String), String> {
    let (app, identifier) = value
        .split_once(':')
        .ok_or_else(|| format!("expected APPn:identifier, got '{value}'"))?;
    let index: u16 = app
        .strip_prefix("APP")
        .and_then(|n| n.parse().ok())
        .filter(|n| *n < 16)
        .ok_or_else(|| format!("invalid APP marker '{app}'"))?;
    Ok((APP0 + index, identifier.to_owned()))
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "error" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let options = DecoderOptions::default().with_debug(cli.debug);
    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            format,
            bgr,
            slices,
        } => decode_image(&input, &output, &format, bgr, slices, options),
        Commands::Info { input, extended } => show_info(&input, extended, options),
        Commands::Segments { input } => list_segments(&input),
        Commands::Filter {
            input,
            output,
            keep,
        } => filter_stream(&input, &output, keep),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_warning(input: &Path) -> WarningFn<impl FnMut(&str) + '_> {
    WarningFn(move |message: &str| eprintln!("Warning: {}: {message}", input.display()))
}

fn open(
    input: &Path,
    options: DecoderOptions,
) -> Result<LosslessJpegReader<BufReader<File>>, Box<dyn std::error::Error>> {
    let file = BufReader::new(File::open(input)?);
    Ok(LosslessJpegReader::new(file, options, &mut print_warning(input))?)
}

fn decode_image(
    input: &Path,
    output: &Path,
    format: &OutputFormat,
    bgr: bool,
    slices: Option<Slices>,
    options: DecoderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open(input, options)?;
    let mut warnings = print_warning(input);
    let order = match (format, bgr) {
        (OutputFormat::Raw, true) => ChannelOrder::Bgr,
        _ => ChannelOrder::Rgb,
    };

    let image = match slices {
        Some(slices) => pixels::assemble(&reader.unslice(&slices, &mut warnings)?, order)?,
        None => reader.read_image(order, &mut warnings)?,
    };

    let mut file = BufWriter::new(File::create(output)?);
    match format {
        OutputFormat::Raw => write_samples(&mut file, &image)?,
        OutputFormat::Pnm => write_pnm(&mut file, &image)?,
    }
    file.flush()?;

    println!(
        "✓ Decoded {}x{} image ({} components, {} bits) to {:?}",
        image.width,
        image.height,
        image.component_count(),
        image.bits_per_sample(),
        output
    );
    Ok(())
}

fn write_samples(out: &mut impl Write, image: &Image) -> io::Result<()> {
    match &image.buffer {
        PixelBuffer::Gray8(data) | PixelBuffer::Rgb24 { data, .. } => out.write_all(data),
        PixelBuffer::Gray16 { data, .. } => {
            for &sample in data {
                out.write_u16::<BigEndian>(sample)?;
            }
            Ok(())
        }
    }
}

fn write_pnm(out: &mut impl Write, image: &Image) -> io::Result<()> {
    let magic = if image.component_count() == 1 { "P5" } else { "P6" };
    let max_value = (1u32 << image.bits_per_sample()) - 1;
    writeln!(out, "{magic}")?;
    writeln!(out, "{} {}", image.width, image.height)?;
    writeln!(out, "{max_value}")?;
    write_samples(out, image)
}

fn show_info(
    input: &Path,
    extended: bool,
    options: DecoderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = open(input, options)?;
    let mut warnings = print_warning(input);

    println!("File: {:?}", input);
    println!("Size: {} bytes", fs::metadata(input)?.len());
    println!();

    let frame = reader.frame()?;
    println!("Format: JPEG {}", marker_name(frame.marker));
    println!(
        "  Mode:        {}",
        if frame.is_lossless() { "Lossless" } else { "DCT" }
    );
    println!("  Dimensions:  {}x{}", frame.samples_per_line, frame.lines);
    println!("  Bit depth:   {} bits", frame.precision);
    println!("  Components:  {}", frame.component_count());
    for component in &frame.components {
        println!(
            "    id {:3}  sampling {}x{}  quantization table {}",
            component.id, component.h_sampling, component.v_sampling, component.quant_table_selector
        );
    }
    match reader.color_space(&mut warnings) {
        Ok(color_space) => println!("  Color space: {:?}", color_space),
        Err(e) => println!("  Color space: unknown ({e})"),
    }
    if let Some(quality) = reader.quality() {
        println!("  Quality:     ~{quality}");
    }
    if let Some(profile) = reader.icc_profile(&mut warnings) {
        println!("  ICC profile: {} bytes", profile.len());
    }

    for segment in reader.segments() {
        match segment {
            Segment::Scan(scan) => {
                println!(
                    "  Scan:        {} component(s), predictor {}, point transform {}",
                    scan.components.len(),
                    scan.predictor_selector(),
                    scan.point_transform()
                );
            }
            Segment::RestartInterval(interval) if *interval > 0 => {
                println!("  Restart:     every {interval} units");
            }
            Segment::Application(app) => print_application(app),
            Segment::Comment(text) => {
                println!("  Comment:     {}", String::from_utf8_lossy(text));
            }
            Segment::HuffmanTable(tables) if extended => {
                for table in tables {
                    println!(
                        "  DHT {} {}:    {} symbols, lengths {:?}",
                        table.class.name(),
                        table.id,
                        table.values.len(),
                        table.lengths
                    );
                }
            }
            Segment::QuantizationTable(tables) if extended => {
                for table in tables {
                    println!(
                        "  DQT {} ({:?}): {:?}",
                        table.id,
                        table.precision,
                        &table.values()[..8]
                    );
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn print_application(app: &Application) {
    println!(
        "  {:<12} {} ({} bytes)",
        format!("{}:", marker_name(app.marker)),
        app.identifier().unwrap_or("<no identifier>"),
        app.data.len()
    );
}

fn list_segments(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = BufReader::new(File::open(input)?);
    let mut stream = SegmentImageInput::with_listener(file, print_warning(input));
    stream.scan_all()?;

    println!("{:<8} {:>10} {:>8}", "Marker", "Offset", "Length");
    for segment in stream.physical_segments() {
        println!(
            "{:<8} {:>10} {:>8}",
            marker_name(segment.marker),
            segment.offset,
            segment.length
        );
    }
    Ok(())
}

fn filter_stream(
    input: &Path,
    output: &Path,
    keep: Vec<(u16, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = keep
        .into_iter()
        .fold(AppSegmentFilter::default(), |filter, (marker, identifier)| {
            filter.with(marker, identifier)
        });
    let file = BufReader::new(File::open(input)?);
    let mut stream = SegmentImageInput::with_listener(file, print_warning(input)).with_filter(filter);
    let mut out = BufWriter::new(File::create(output)?);
    let written = io::copy(&mut stream, &mut out)?;
    out.flush()?;

    let scanned = stream.physical_segments().len();
    println!("✓ Wrote {written} bytes to {:?} ({scanned} segments scanned)", output);
    Ok(())
}
