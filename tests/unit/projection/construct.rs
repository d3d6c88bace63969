use super::*;
use crate::foundation::core::{Rgba8, Size};
use crate::model::{
    canvas::Canvas,
    colormap::Colormap,
    floating::FloatingSelection,
    layer::{LayerId, LayerMask},
    pixel::ColorModel,
};

fn solid(w: u32, h: u32, format: PixelFormat, px: &[u8]) -> PixelBuffer {
    PixelBuffer::filled(w, h, format, px).unwrap()
}

fn rgb_canvas(w: u32, h: u32, bg: [u8; 3]) -> (Canvas, LayerId) {
    let mut canvas = Canvas::new(w, h, ColorModel::Rgb).unwrap();
    let id = canvas.add_layer(Layer::new("bg", solid(w, h, PixelFormat::Rgb, &bg)));
    (canvas, id)
}

fn at(canvas: &mut Canvas, x: i32, y: i32) -> Rgba8 {
    canvas.projection_pixel_at(x, y).unwrap().unwrap()
}

#[test]
fn rejects_region_with_wrong_pixel_width() {
    let stack = Stack::new(Size::new(2, 2).unwrap(), ColorModel::Rgb);
    let mut buf = vec![0u8; 2 * 2 * 2];
    let mut region = RegionMut::new(&mut buf, Rect::new(0, 0, 2, 2), 2).unwrap();
    let err = Construct::new(&stack, None).run(&mut region).unwrap_err();
    assert!(matches!(err, TesseraError::Invariant(_)));
}

#[test]
fn empty_stack_renders_transparent() {
    let mut canvas = Canvas::new(3, 3, ColorModel::Rgb).unwrap();
    assert_eq!(at(&mut canvas, 1, 1), Rgba8::TRANSPARENT);
}

#[test]
fn half_opaque_layer_over_opaque_background() {
    let (mut canvas, _) = rgb_canvas(2, 2, [255, 0, 0]);
    canvas.add_layer(
        Layer::new("blue", solid(1, 2, PixelFormat::Rgb, &[0, 0, 255])).with_opacity(0.5),
    );
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(127, 0, 127, 255));
    assert_eq!(at(&mut canvas, 0, 1), Rgba8::new(127, 0, 127, 255));
    assert_eq!(at(&mut canvas, 1, 0), Rgba8::new(255, 0, 0, 255));
}

#[test]
fn opaque_cover_overwrites_stale_tile_bytes() {
    let (mut canvas, _) = rgb_canvas(2, 2, [10, 20, 30]);
    {
        let mut projection = canvas.projection().unwrap();
        projection.tile_mut(0, 0).unwrap().data_mut().fill(9);
    }
    canvas.invalidate_no_render(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 1, 1), Rgba8::new(10, 20, 30, 255));
}

#[test]
fn translucent_stack_clears_before_compositing() {
    let mut canvas = Canvas::new(2, 2, ColorModel::Rgb).unwrap();
    canvas.add_layer(Layer::new("a", solid(1, 1, PixelFormat::Rgba, &[0, 255, 0, 255])));
    {
        let mut projection = canvas.projection().unwrap();
        projection.tile_mut(0, 0).unwrap().data_mut().fill(9);
    }
    canvas.invalidate_no_render(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(0, 255, 0, 255));
    assert_eq!(at(&mut canvas, 1, 1), Rgba8::TRANSPARENT);
}

#[test]
fn applied_mask_scales_coverage() {
    let (mut canvas, _) = rgb_canvas(2, 1, [255, 0, 0]);
    let mut top = Layer::new("top", solid(2, 1, PixelFormat::Rgb, &[0, 255, 0]));
    let mut mask = LayerMask::new(PixelBuffer::new(2, 1, PixelFormat::Gray).unwrap()).unwrap();
    mask.values_mut()[1] = 255;
    top.set_mask(mask).unwrap();
    canvas.add_layer(top);

    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));
    assert_eq!(at(&mut canvas, 1, 0), Rgba8::new(0, 255, 0, 255));
}

#[test]
fn shown_mask_renders_as_gray() {
    let (mut canvas, _) = rgb_canvas(1, 1, [255, 0, 0]);
    let mut top = Layer::new("top", solid(1, 1, PixelFormat::Rgb, &[0, 255, 0]));
    let mut mask = LayerMask::new(solid(1, 1, PixelFormat::Gray, &[200])).unwrap();
    mask.show = true;
    top.set_mask(mask).unwrap();
    canvas.add_layer(top);
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(200, 200, 200, 255));
}

#[test]
fn hidden_layers_are_skipped() {
    let (mut canvas, _) = rgb_canvas(1, 1, [1, 2, 3]);
    let mut top = Layer::new("top", solid(1, 1, PixelFormat::Rgb, &[9, 9, 9]));
    top.visible = false;
    canvas.add_layer(top);
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(1, 2, 3, 255));
}

fn indexed_canvas() -> Canvas {
    let mut canvas = Canvas::new(1, 1, ColorModel::Indexed).unwrap();
    canvas.set_colormap(Colormap::new(vec![[0, 0, 0], [255, 0, 0], [0, 0, 255]]).unwrap());
    canvas.add_layer(Layer::new("base", solid(1, 1, PixelFormat::Indexed, &[1])));
    canvas
}

#[test]
fn indexed_layers_threshold_alpha() {
    let mut canvas = indexed_canvas();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));

    let faint = canvas.add_layer(
        Layer::new("faint", solid(1, 1, PixelFormat::IndexedA, &[2, 255])).with_opacity(0.4),
    );
    canvas.invalidate(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));

    canvas.layer_mut(faint).unwrap().opacity = 0.6;
    canvas.invalidate(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(0, 0, 255, 255));
}

#[test]
fn indexed_layer_without_alpha_must_come_first() {
    let mut canvas = indexed_canvas();
    canvas.add_layer(Layer::new("second", solid(1, 1, PixelFormat::Indexed, &[2])));
    let err = canvas.projection_pixel_at(0, 0).unwrap_err();
    assert!(matches!(err, TesseraError::Invariant(_)));
}

#[test]
fn gray_canvas_reduces_color_sources_to_luminance() {
    let mut canvas = Canvas::new(1, 1, ColorModel::Gray).unwrap();
    canvas.add_layer(Layer::new("red", solid(1, 1, PixelFormat::Rgb, &[255, 0, 0])));
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(76, 76, 76, 255));
}

#[test]
fn channels_tint_on_top_of_layers() {
    let (mut canvas, _) = rgb_canvas(2, 1, [255, 0, 0]);
    let mut values = PixelBuffer::new(2, 1, PixelFormat::Gray).unwrap();
    values.data_mut()[0] = 255;
    let blue = Channel::new("sel", values)
        .unwrap()
        .with_tint(Rgba8::new(0, 0, 255, 255))
        .with_opacity(1.0);
    let id = canvas.add_channel(blue).unwrap();

    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(0, 0, 255, 255));
    assert_eq!(at(&mut canvas, 1, 0), Rgba8::new(255, 0, 0, 255));

    canvas.channel_mut(id).unwrap().show_masked = true;
    canvas.invalidate(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));
    assert_eq!(at(&mut canvas, 1, 0), Rgba8::new(0, 0, 255, 255));
}

#[test]
fn channel_alone_paints_its_tint() {
    let mut canvas = Canvas::new(1, 1, ColorModel::Rgb).unwrap();
    let ch = Channel::new("sel", solid(1, 1, PixelFormat::Gray, &[255])).unwrap();
    canvas.add_channel(ch).unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(0, 0, 0, 128));
}

#[test]
fn floating_selection_composites_into_target_layer() {
    let (mut canvas, bg) = rgb_canvas(2, 2, [255, 0, 0]);
    let paste = Layer::new("paste", solid(1, 1, PixelFormat::Rgb, &[0, 0, 255])).with_offset(1, 1);
    canvas
        .set_floating_selection(FloatingSelection::new(paste, DrawableRef::Layer(bg)))
        .unwrap();

    assert_eq!(at(&mut canvas, 1, 1), Rgba8::new(0, 0, 255, 255));
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));
    assert_eq!(canvas.layer(bg).unwrap().pixels().pixel(1, 1), &[255, 0, 0]);
}

#[test]
fn floating_selection_stays_under_layers_above_its_target() {
    let (mut canvas, bg) = rgb_canvas(1, 1, [255, 0, 0]);
    canvas.add_layer(Layer::new("cover", solid(1, 1, PixelFormat::Rgb, &[0, 255, 0])));
    let paste = Layer::new("paste", solid(1, 1, PixelFormat::Rgb, &[0, 0, 255]));
    canvas
        .set_floating_selection(FloatingSelection::new(paste, DrawableRef::Layer(bg)))
        .unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(0, 255, 0, 255));
}

#[test]
fn floating_selection_edits_mask_and_channel_targets() {
    let (mut canvas, _) = rgb_canvas(2, 1, [255, 0, 0]);
    let mut top = Layer::new("top", solid(2, 1, PixelFormat::Rgb, &[0, 255, 0]));
    top.set_mask(LayerMask::new(PixelBuffer::new(2, 1, PixelFormat::Gray).unwrap()).unwrap())
        .unwrap();
    let top = canvas.add_layer(top);
    let white = Layer::new("white", solid(1, 1, PixelFormat::Rgb, &[255, 255, 255]));
    canvas
        .set_floating_selection(FloatingSelection::new(white.clone(), DrawableRef::LayerMask(top)))
        .unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(0, 255, 0, 255));
    assert_eq!(at(&mut canvas, 1, 0), Rgba8::new(255, 0, 0, 255));

    let ch = Channel::new("sel", PixelBuffer::new(2, 1, PixelFormat::Gray).unwrap())
        .unwrap()
        .with_tint(Rgba8::new(0, 0, 255, 255))
        .with_opacity(1.0);
    let ch = canvas.add_channel(ch).unwrap();
    canvas
        .set_floating_selection(FloatingSelection::new(
            white.with_offset(1, 0),
            DrawableRef::Channel(ch),
        ))
        .unwrap();
    canvas.invalidate(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));
    assert_eq!(at(&mut canvas, 1, 0), Rgba8::new(0, 0, 255, 255));
}

#[test]
fn inactive_components_keep_previous_bytes() {
    let (mut canvas, bg) = rgb_canvas(2, 2, [255, 0, 0]);
    assert_eq!(at(&mut canvas, 0, 0), Rgba8::new(255, 0, 0, 255));

    canvas.set_component_active(0, false).unwrap();
    canvas
        .layer_mut(bg)
        .unwrap()
        .set_pixels(solid(2, 2, PixelFormat::Rgb, &[0, 0, 255]))
        .unwrap();
    canvas.invalidate(canvas.bounds(), None).unwrap();
    assert_eq!(at(&mut canvas, 1, 1), Rgba8::new(255, 0, 255, 255));
}

#[test]
fn cells_follow_the_tile_grid() {
    let cells: Vec<Rect> = tile_cells(Rect::new(60, 0, 80, 10)).collect();
    assert_eq!(
        cells,
        [
            Rect::new(60, 0, 4, 10),
            Rect::new(64, 0, 64, 10),
            Rect::new(128, 0, 12, 10),
        ]
    );
    assert_eq!(tile_cells(Rect::new(5, 5, 0, 3)).count(), 0);
}

#[test]
fn wide_region_paints_each_tile_independently() {
    let mut stack = Stack::new(Size::new(128, 1).unwrap(), ColorModel::Indexed);
    stack.colormap = Colormap::new(vec![[255, 0, 0], [0, 0, 255]]).unwrap();
    stack.layers.push(Layer::new("left", solid(64, 1, PixelFormat::Indexed, &[0])));
    stack.layers.push(
        Layer::new("right", solid(64, 1, PixelFormat::Indexed, &[1])).with_offset(64, 0),
    );

    let rect = stack.bounds();
    let mut buf = vec![0u8; rect.area() * 4];
    let mut region = RegionMut::new(&mut buf, rect, 4).unwrap();
    Construct::new(&stack, None).run(&mut region).unwrap();

    assert_eq!(&buf[..4], &[255, 0, 0, 255]);
    assert_eq!(&buf[64 * 4..65 * 4], &[0, 0, 255, 255]);
}
