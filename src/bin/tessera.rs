use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a document and write the projection as a PNG.
    Render(RenderArgs),
    /// Print the composited color of one pixel.
    Probe(ProbeArgs),
    /// Build the whole projection and print tile statistics and a fingerprint.
    Stats(StatsArgs),
    /// List the supported blend modes.
    Modes,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override the resident tile budget in bytes (0 = unbounded).
    #[arg(long)]
    max_resident_bytes: Option<usize>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    x: i32,

    #[arg(long, allow_negative_numbers = true)]
    y: i32,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the resident tile budget in bytes (0 = unbounded).
    #[arg(long)]
    max_resident_bytes: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Probe(args) => cmd_probe(args),
        Command::Stats(args) => cmd_stats(args),
        Command::Modes => {
            for mode in tessera::BlendMode::ALL {
                println!("{mode}");
            }
            Ok(())
        }
    }
}

fn load_canvas(path: &Path, max_resident_bytes: Option<usize>) -> anyhow::Result<tessera::Canvas> {
    let mut doc = tessera::Document::from_path(path)
        .with_context(|| format!("read document '{}'", path.display()))?;
    if max_resident_bytes.is_some() {
        doc.max_resident_bytes = max_resident_bytes;
    }
    let canvas = doc
        .build()
        .with_context(|| format!("build canvas from '{}'", path.display()))?;
    Ok(canvas)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut canvas = load_canvas(&args.in_path, args.max_resident_bytes)?;
    let (width, height) = (canvas.width(), canvas.height());
    let rgba = canvas.projection()?.flatten_rgba8()?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let mut canvas = load_canvas(&args.in_path, None)?;
    let Some(px) = canvas.projection_pixel_at(args.x, args.y)? else {
        anyhow::bail!(
            "({}, {}) lies outside the {}x{} canvas",
            args.x,
            args.y,
            canvas.width(),
            canvas.height()
        );
    };
    println!("{} {} {} {}", px.r, px.g, px.b, px.a);
    Ok(())
}

fn cmd_stats(args: StatsArgs) -> anyhow::Result<()> {
    let mut canvas = load_canvas(&args.in_path, args.max_resident_bytes)?;
    let mut projection = canvas.projection()?;
    let fingerprint = projection.fingerprint()?;
    let stats = projection.stats();

    println!("size={}x{}", projection.width(), projection.height());
    println!("format={:?}", projection.format());
    println!("resident_tiles={}", stats.resident_tiles);
    println!("resident_bytes={}", stats.resident_bytes);
    println!("alloc_tiles={}", stats.alloc_tiles);
    println!("produced={}", stats.produced);
    println!("evicted={}", stats.evicted);
    println!("fingerprint={fingerprint:016x}");
    Ok(())
}
