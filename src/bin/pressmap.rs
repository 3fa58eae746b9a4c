use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pressmap::{
    CalibrationRecord, Calibrator, Canvas, DirAssets, Layout, PressId, PressRender,
    ProjectorConfig, RenderPipeline, Scene, SvgRasterizer, WarpMode, resolve_layout_images,
    to_absolute,
};

#[derive(Parser, Debug)]
#[command(name = "pressmap", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one press layout into a projector frame PNG.
    Frame(FrameArgs),
    /// Check a calibration by round-tripping the press corners.
    Validate(ValidateArgs),
    /// Render several presses into one production frame PNG.
    Production(ProductionArgs),
    /// Convert a point between projector pixels and press millimeters.
    Map(MapArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Projector config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width in pixels (overrides the config).
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (overrides the config).
    #[arg(long)]
    height: Option<u32>,

    /// Stretch the canonical raster instead of pre-warping it.
    #[arg(long)]
    bypass_warp: bool,

    /// Overlay the press boundary pattern.
    #[arg(long)]
    boundary: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Calibration record JSON.
    #[arg(long)]
    calibration: PathBuf,

    /// Layout or scene JSON.
    #[arg(long)]
    layout: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Calibration record JSON.
    #[arg(long)]
    calibration: PathBuf,

    /// Margin around the press in millimeters.
    #[arg(long, default_value_t = 0.0)]
    margin: f64,

    /// Projector config JSON (for the raster density).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProductionArgs {
    /// `calibration.json=scene.json` pair; repeat once per press.
    #[arg(long = "press", required = true, value_parser = parse_press_pair)]
    presses: Vec<(PathBuf, PathBuf)>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct MapArgs {
    /// Calibration record JSON.
    #[arg(long)]
    calibration: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    x: f64,

    #[arg(long, allow_negative_numbers = true)]
    y: f64,

    /// Treat the input as press millimeters and output projector pixels.
    #[arg(long)]
    to_projector: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Production(args) => cmd_production(args),
        Command::Map(args) => cmd_map(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_press_pair(s: &str) -> Result<(PathBuf, PathBuf), String> {
    let (cal, scene) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CALIBRATION=SCENE, got '{s}'"))?;
    if cal.is_empty() || scene.is_empty() {
        return Err(format!("expected CALIBRATION=SCENE, got '{s}'"));
    }
    Ok((PathBuf::from(cal), PathBuf::from(scene)))
}

fn open(path: &Path, what: &str) -> anyhow::Result<BufReader<File>> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    Ok(BufReader::new(f))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ProjectorConfig> {
    Ok(match path {
        Some(p) => ProjectorConfig::from_path(p)?,
        None => ProjectorConfig::default(),
    })
}

fn load_calibrator(path: &Path, density: f64) -> anyhow::Result<Calibrator> {
    let record: CalibrationRecord = serde_json::from_reader(open(path, "calibration")?)
        .with_context(|| format!("parse calibration JSON '{}'", path.display()))?;
    Ok(Calibrator::from_record(&record, density)?)
}

fn load_layout(path: &Path) -> anyhow::Result<Layout> {
    let scene = Scene::from_reader(open(path, "layout")?)?;
    Ok(to_absolute(&scene, None))
}

fn asset_root(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn resolve_output(args: &OutputArgs) -> anyhow::Result<(ProjectorConfig, RenderPipeline)> {
    let mut cfg = load_config(args.config.as_deref())?;
    cfg.output = Canvas::new(
        args.width.unwrap_or(cfg.output.width),
        args.height.unwrap_or(cfg.output.height),
    )?;
    if args.bypass_warp {
        cfg.warp = WarpMode::Bypass;
    }
    cfg.show_boundary |= args.boundary;
    cfg.validate()?;
    let pipeline = RenderPipeline::with_rasterizer(SvgRasterizer::new(), cfg.render_options());
    Ok((cfg, pipeline))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (cfg, pipeline) = resolve_output(&args.output)?;
    let calibrator = load_calibrator(&args.calibration, cfg.raster_density_px_per_mm)?;
    let layout = load_layout(&args.layout)?;
    let images = resolve_layout_images(&DirAssets::new(asset_root(&args.layout)), &layout);

    let frame = pipeline.render_single(&layout, &calibrator, cfg.output, &images)?;
    frame.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let calibrator = load_calibrator(&args.calibration, cfg.raster_density_px_per_mm)?;
    let report = calibrator.validate_round_trip(args.margin)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.valid {
        anyhow::bail!(
            "round-trip error {:.4} mm exceeds tolerance",
            report.max_error_mm
        );
    }
    Ok(())
}

fn cmd_production(args: ProductionArgs) -> anyhow::Result<()> {
    let (cfg, pipeline) = resolve_output(&args.output)?;

    let mut loaded = Vec::with_capacity(args.presses.len());
    for (cal_path, scene_path) in &args.presses {
        let press = PressId::new(
            cal_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| cal_path.display().to_string()),
        );
        let calibrator = load_calibrator(cal_path, cfg.raster_density_px_per_mm)?;
        let layout = load_layout(scene_path)?;
        let assets = DirAssets::new(asset_root(scene_path));
        let images = resolve_layout_images(&assets, &layout);
        loaded.push((press, layout, calibrator, images));
    }

    let presses: Vec<PressRender<'_>> = loaded
        .iter()
        .map(|(press, layout, calibrator, images)| PressRender {
            press,
            layout,
            calibrator,
            images,
        })
        .collect();
    let frame = pipeline.render_production(&presses, cfg.output)?;
    frame.save_png(&args.out)?;
    eprintln!("wrote {} ({} presses)", args.out.display(), presses.len());
    Ok(())
}

fn cmd_map(args: MapArgs) -> anyhow::Result<()> {
    let calibrator = load_calibrator(
        &args.calibration,
        pressmap::foundation::config::DEFAULT_RASTER_DENSITY,
    )?;
    let p = if args.to_projector {
        calibrator.press_to_projector(args.x, args.y)?
    } else {
        calibrator.projector_to_press(args.x, args.y)?
    };
    println!("{}", serde_json::json!({ "x": p.x, "y": p.y }));
    Ok(())
}

