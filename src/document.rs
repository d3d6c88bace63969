use crate::composite::{
    blend::BlendMode,
    convert::{Expanded, encode},
};
use crate::foundation::{
    core::{Rect, Rgba8},
    error::{TesseraError, TesseraResult},
};
use crate::model::{
    canvas::Canvas,
    channel::Channel,
    colormap::{Colormap, NearestColorCache},
    floating::{DrawableRef, FloatingSelection},
    layer::{Layer, LayerMask},
    pixel::{ColorModel, PixelBuffer, PixelFormat},
};
use crate::projection::view::ProjectionOpts;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON description of a canvas built from solid fills.
///
/// Layers and channels are listed bottom to top. Drawables are referenced by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colormap: Vec<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating: Option<FloatingSpec>,
    /// Per-component visibility; missing entries stay active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_resident_bytes: Option<usize>,
}

/// Solid paint: an RGBA color or a colormap index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSpec {
    Color([u8; 4]),
    Index(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RectFill<T> {
    pub rect: Rect,
    pub fill: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    /// Defaults to the canvas size.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Defaults to the canvas color model without alpha.
    #[serde(default)]
    pub format: Option<PixelFormat>,
    /// Base fill; without one the layer starts zeroed (transparent when it has alpha).
    #[serde(default)]
    pub fill: Option<FillSpec>,
    #[serde(default)]
    pub rects: Vec<RectFill<FillSpec>>,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub mode: BlendMode,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub mask: Option<MaskSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaskSpec {
    #[serde(default = "opaque_value")]
    pub fill: u8,
    #[serde(default)]
    pub rects: Vec<RectFill<u8>>,
    #[serde(default = "yes")]
    pub apply: bool,
    #[serde(default)]
    pub show: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSpec {
    pub name: String,
    #[serde(default)]
    pub fill: u8,
    #[serde(default)]
    pub rects: Vec<RectFill<u8>>,
    #[serde(default = "half")]
    pub opacity: f32,
    /// RGBA overlay color; alpha scales the overlay strength.
    #[serde(default = "black")]
    pub tint: [u8; 4],
    #[serde(default)]
    pub show_masked: bool,
    #[serde(default = "yes")]
    pub visible: bool,
}

/// Named drawable a floating selection attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawableSpec {
    Layer(String),
    LayerMask(String),
    Channel(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloatingSpec {
    pub layer: LayerSpec,
    pub target: DrawableSpec,
}

fn one() -> f32 {
    1.0
}

fn half() -> f32 {
    0.5
}

fn yes() -> bool {
    true
}

fn opaque_value() -> u8 {
    255
}

fn black() -> [u8; 4] {
    [0, 0, 0, 255]
}

impl Document {
    pub fn from_reader<R: std::io::Read>(r: R) -> TesseraResult<Self> {
        let doc: Self = serde_json::from_reader(r)?;
        Ok(doc)
    }

    pub fn from_json_str(s: &str) -> TesseraResult<Self> {
        let doc: Self = serde_json::from_str(s)?;
        Ok(doc)
    }

    pub fn from_path(path: impl AsRef<Path>) -> TesseraResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TesseraError::validation(format!("open document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_json_pretty(&self) -> TesseraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the canvas. The projection is allocated but every tile starts invalid.
    #[tracing::instrument(skip(self), fields(width = self.width, height = self.height))]
    pub fn build(&self) -> TesseraResult<Canvas> {
        let mut opts = ProjectionOpts::default();
        if let Some(cap) = self.max_resident_bytes {
            opts.max_resident_bytes = cap;
        }
        let mut canvas = Canvas::with_opts(self.width, self.height, self.color_model, opts)?;
        let colormap = Colormap::new(self.colormap.clone())?;
        canvas.set_colormap(colormap.clone());

        let mut painter = Painter {
            colormap: &colormap,
            nearest: NearestColorCache::default(),
            color_model: self.color_model,
        };
        for spec in &self.layers {
            let layer = painter.layer(spec, &canvas)?;
            canvas.add_layer(layer);
        }
        for spec in &self.channels {
            let channel = painter.channel(spec, &canvas)?;
            canvas.add_channel(channel)?;
        }
        if let Some(spec) = &self.floating {
            let layer = painter.layer(&spec.layer, &canvas)?;
            let target = resolve_target(&canvas, &spec.target)?;
            canvas.set_floating_selection(FloatingSelection::new(layer, target))?;
        }
        if let Some(active) = &self.active {
            for (component, &on) in active.iter().enumerate() {
                canvas.set_component_active(component, on)?;
            }
        }
        tracing::debug!(
            layers = canvas.layers().len(),
            channels = canvas.channels().len(),
            "document built"
        );
        Ok(canvas)
    }
}

fn resolve_target(canvas: &Canvas, spec: &DrawableSpec) -> TesseraResult<DrawableRef> {
    let layer_named = |name: &str| {
        canvas
            .layers()
            .iter()
            .find(|l| l.name == name)
            .map(Layer::id)
            .ok_or_else(|| TesseraError::validation(format!("no layer named '{name}'")))
    };
    match spec {
        DrawableSpec::Layer(name) => Ok(DrawableRef::Layer(layer_named(name)?)),
        DrawableSpec::LayerMask(name) => Ok(DrawableRef::LayerMask(layer_named(name)?)),
        DrawableSpec::Channel(name) => canvas
            .channels()
            .iter()
            .find(|c| c.name == *name)
            .map(|c| DrawableRef::Channel(c.id()))
            .ok_or_else(|| TesseraError::validation(format!("no channel named '{name}'"))),
    }
}

/// Turns fill specs into drawable pixels.
struct Painter<'a> {
    colormap: &'a Colormap,
    nearest: NearestColorCache,
    color_model: ColorModel,
}

impl Painter<'_> {
    fn layer(&mut self, spec: &LayerSpec, canvas: &Canvas) -> TesseraResult<Layer> {
        let width = spec.width.unwrap_or(canvas.width());
        let height = spec.height.unwrap_or(canvas.height());
        let format = spec
            .format
            .unwrap_or_else(|| self.color_model.layer_format(false));
        let mut pixels = PixelBuffer::new(width, height, format)?;
        if let Some(fill) = spec.fill {
            let px = self.encode_fill(format, fill)?;
            pixels.fill_rect(pixels.bounds(), &px)?;
        }
        for r in &spec.rects {
            let px = self.encode_fill(format, r.fill)?;
            pixels.fill_rect(r.rect, &px)?;
        }

        let mut layer = Layer::new(spec.name.clone(), pixels)
            .with_offset(spec.x, spec.y)
            .with_opacity(spec.opacity)
            .with_mode(spec.mode);
        layer.visible = spec.visible;
        if let Some(m) = &spec.mask {
            let mut values = PixelBuffer::filled(width, height, PixelFormat::Gray, &[m.fill])?;
            for r in &m.rects {
                values.fill_rect(r.rect, &[r.fill])?;
            }
            let mut mask = LayerMask::new(values)?;
            mask.apply = m.apply;
            mask.show = m.show;
            layer.set_mask(mask)?;
        }
        Ok(layer)
    }

    fn channel(&mut self, spec: &ChannelSpec, canvas: &Canvas) -> TesseraResult<Channel> {
        let mut values =
            PixelBuffer::filled(canvas.width(), canvas.height(), PixelFormat::Gray, &[spec.fill])?;
        for r in &spec.rects {
            values.fill_rect(r.rect, &[r.fill])?;
        }
        let mut channel = Channel::new(spec.name.clone(), values)?
            .with_opacity(spec.opacity)
            .with_tint(Rgba8::from_array(spec.tint));
        channel.show_masked = spec.show_masked;
        channel.visible = spec.visible;
        Ok(channel)
    }

    fn encode_fill(&mut self, format: PixelFormat, fill: FillSpec) -> TesseraResult<Vec<u8>> {
        let mut px = vec![0u8; format.bpp()];
        if let FillSpec::Index(i) = fill
            && usize::from(i) >= self.colormap.len()
        {
            return Err(TesseraError::validation(format!(
                "colormap index {i} past {} entries",
                self.colormap.len()
            )));
        }
        match (fill, format.is_indexed()) {
            (FillSpec::Index(i), true) => {
                px[0] = i;
                if format.has_alpha() {
                    px[1] = 255;
                }
            }
            (FillSpec::Index(i), false) => {
                let expanded = Expanded {
                    color: self.colormap.color(i),
                    alpha: 255,
                };
                encode(format, &mut px, expanded, self.colormap, &mut self.nearest);
            }
            (FillSpec::Color([r, g, b, a]), indexed) => {
                if indexed && self.colormap.is_empty() {
                    return Err(TesseraError::validation(
                        "indexed color fill needs a colormap",
                    ));
                }
                let expanded = Expanded {
                    color: [r, g, b],
                    alpha: a,
                };
                encode(format, &mut px, expanded, self.colormap, &mut self.nearest);
            }
        }
        Ok(px)
    }
}

#[cfg(test)]
#[path = "../tests/unit/document.rs"]
mod tests;
