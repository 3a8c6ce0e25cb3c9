use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use serde::Serialize;

use platerect::config::RectifyConfig;
use platerect::detect::corners::{CornerSource, FallbackReason};
use platerect::geometry::Corners;
use platerect::image::ImageRgba8;
use platerect::pipeline::PlateRectifier;

/// License-plate rectification CLI: straighten plates in PNG/JPEG images
#[derive(Parser)]
#[command(name = "platerect", version)]
struct Args {
    /// Input image files (PNG or JPEG)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Plate corners as x,y pairs in TL,TR,BR,BL order (skips detection)
    #[arg(short, long, value_parser = parse_corners, allow_hyphen_values = true)]
    corners: Option<Corners>,

    /// Directory for rectified PNGs (default: next to each input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// TOML file with rectifier settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Edge threshold as a fraction of the strongest gradient
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Minimum edge pixels before falling back to the default rectangle
    #[arg(long)]
    min_edge_points: Option<usize>,

    /// Margin of the default rectangle as a fraction of each dimension
    #[arg(long)]
    margin: Option<f64>,

    /// Downscale images whose longest side exceeds this before detection (0 = never)
    #[arg(long)]
    detect_max_dim: Option<u32>,

    /// Edge points kept before convex hull construction
    #[arg(long)]
    max_hull_points: Option<usize>,

    /// RGBA colour for output pixels outside the source, as r,g,b,a
    #[arg(long, value_parser = parse_fill)]
    fill: Option<[u8; 4]>,

    /// Coverage below this fraction marks a result as suspect
    #[arg(long)]
    min_coverage: Option<f64>,

    /// Only report corners; do not write rectified images
    #[arg(long)]
    detect_only: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Suppress non-JSON output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct OutputResult {
    file: String,
    image_width: u32,
    image_height: u32,
    corners: [[f64; 2]; 4],
    corner_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback: Option<FallbackReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rectified: Option<OutputRectified>,
}

#[derive(Serialize)]
struct OutputRectified {
    path: String,
    width: u32,
    height: u32,
    coverage: f64,
    suspect: bool,
}

fn parse_corners(s: &str) -> Result<Corners, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {e}"))?;
    if values.len() != 8 {
        return Err(format!("expected 8 numbers (4 x,y pairs), got {}", values.len()));
    }
    let mut pts = [[0.0f64; 2]; 4];
    for (pt, xy) in pts.iter_mut().zip(values.chunks_exact(2)) {
        *pt = [xy[0], xy[1]];
    }
    Ok(Corners::from_array(pts))
}

fn parse_fill(s: &str) -> Result<[u8; 4], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid channel value: {e}"))?;
    <[u8; 4]>::try_from(values.as_slice())
        .map_err(|_| format!("expected 4 channels (r,g,b,a), got {}", values.len()))
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(args: &Args) -> Result<RectifyConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            RectifyConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => RectifyConfig::default(),
    };

    if let Some(t) = args.threshold {
        config.edge_threshold = t;
    }
    if let Some(n) = args.min_edge_points {
        config.min_edge_points = n;
    }
    if let Some(m) = args.margin {
        config.default_margin = m;
    }
    if let Some(d) = args.detect_max_dim {
        config.detect_max_dim = d;
    }
    if let Some(n) = args.max_hull_points {
        config.max_hull_points = n;
    }
    if let Some(f) = args.fill {
        config.fill = f;
    }
    if let Some(c) = args.min_coverage {
        config.min_coverage = c;
    }
    config.validate()?;
    Ok(config)
}

fn load_image(path: &Path) -> Result<ImageRgba8> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image: {}", path.display()))?
        .into_rgba8();

    let width = img.width();
    let height = img.height();
    Ok(ImageRgba8::from_rgba(width, height, img.into_raw())?)
}

fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plate".to_string());
    let name = format!("{stem}.rectified.png");
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn save_image(img: ImageRgba8, path: &Path) -> Result<()> {
    let (w, h) = (img.width, img.height);
    let out = image::RgbaImage::from_raw(w, h, img.into_packed())
        .context("rectified buffer does not match its dimensions")?;
    out.save(path)
        .with_context(|| format!("failed to write image: {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let rectifier = PlateRectifier::new(load_config(&args)?);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    }

    // Process each image
    for image_path in &args.images {
        let img = load_image(image_path)?;
        info!("processing {} ({}x{})", image_path.display(), img.width, img.height);

        let (corners, source, fallback) = match args.corners {
            Some(c) => (c, "user", None),
            None => {
                let est = rectifier.detect_corners(&img);
                match est.source {
                    CornerSource::Detected => (est.corners, "detected", None),
                    CornerSource::Fallback(reason) => {
                        warn!("{}: no plate outline found, using default rectangle", image_path.display());
                        (est.corners, "fallback", Some(reason))
                    }
                }
            }
        };

        let rectified = if args.detect_only {
            None
        } else {
            let out = rectifier
                .rectify(&img, &corners)
                .with_context(|| format!("failed to rectify {}", image_path.display()))?;
            let path = output_path(image_path, args.out_dir.as_deref());
            let report = OutputRectified {
                path: path.display().to_string(),
                width: out.image.width,
                height: out.image.height,
                coverage: out.coverage.fraction(),
                suspect: out.is_suspect(rectifier.config().min_coverage),
            };
            save_image(out.image, &path)?;
            info!("  wrote {}x{} to {}", report.width, report.height, report.path);
            Some(report)
        };

        let result = OutputResult {
            file: image_path.display().to_string(),
            image_width: img.width,
            image_height: img.height,
            corners: corners.to_array(),
            corner_source: source,
            fallback,
            rectified,
        };

        let json = if args.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{json}");
    }

    Ok(())
}
