use std::path::PathBuf;

use anyhow::Context as _;
use tessera::{
    BlendMode, Canvas, Channel, ColorModel, ConstructProgress, Layer, LayerMask, PixelBuffer,
    PixelFormat, Rect, Rgba8,
};

/// Logs every batched construct pass.
#[derive(Default)]
struct PassLog {
    passes: usize,
    pixels: usize,
}

impl ConstructProgress for PassLog {
    fn started(&mut self, area: Rect) {
        self.passes += 1;
        self.pixels += area.area();
    }

    fn finished(&mut self, area: Rect) {
        tracing::info!(?area, "construct pass finished");
    }
}

fn gradient(width: u32, height: u32) -> anyhow::Result<PixelBuffer> {
    let mut buf = PixelBuffer::new(width, height, PixelFormat::Rgb)?;
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / (width - 1)) as u8;
            let b = (y * 255 / (height - 1)) as u8;
            buf.pixel_mut(x, y).copy_from_slice(&[r, 96, b]);
        }
    }
    Ok(buf)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let (width, height) = (320, 200);
    let mut canvas = Canvas::new(width, height, ColorModel::Rgb)?;
    canvas.add_layer(Layer::new("gradient", gradient(width, height)?));

    let modes = [
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Difference,
        BlendMode::Hue,
        BlendMode::Dissolve,
    ];
    for (i, mode) in modes.into_iter().enumerate() {
        let swatch = PixelBuffer::filled(56, 120, PixelFormat::Rgba, &[240, 200, 40, 255])?;
        let layer = Layer::new(mode.name(), swatch)
            .with_offset(8 + i as i32 * 62, 40)
            .with_opacity(0.8)
            .with_mode(mode);
        canvas.add_layer(layer);
    }

    let mut vignette = Layer::new(
        "vignette",
        PixelBuffer::filled(width, height, PixelFormat::Rgb, &[0, 0, 0])?,
    );
    let mut edge = PixelBuffer::filled(width, height, PixelFormat::Gray, &[160])?;
    edge.fill_rect(Rect::new(20, 20, width - 40, height - 40), &[0])?;
    let mask = LayerMask::new(edge)?;
    vignette.set_mask(mask)?;
    canvas.add_layer(vignette);

    let mut selection = PixelBuffer::new(width, height, PixelFormat::Gray)?;
    selection.fill_rect(Rect::new(0, 180, width, 20), &[255])?;
    canvas.add_channel(
        Channel::new("selection", selection)?.with_tint(Rgba8::new(255, 0, 0, 255)),
    )?;

    let mut log = PassLog::default();
    let report = canvas.invalidate_with_progress(canvas.bounds(), None, &mut log)?;
    tracing::info!(
        passes = log.passes,
        pixels = log.pixels,
        tiles = report.invalidated_tiles,
        "projection rebuilt"
    );

    let rgba = canvas.projection()?.flatten_rgba8()?;
    let out = PathBuf::from("target").join("render_layers.png");
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &out,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;

    println!("wrote {}", out.display());
    Ok(())
}
