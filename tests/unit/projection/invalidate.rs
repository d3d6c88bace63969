use super::*;
use crate::foundation::core::Rgba8;
use crate::model::{
    canvas::Canvas,
    layer::Layer,
    pixel::{ColorModel, PixelBuffer, PixelFormat},
};
use crate::projection::progress::ConstructProgress;

#[derive(Default)]
struct Recorder {
    started: Vec<Rect>,
    finished: usize,
}

impl ConstructProgress for Recorder {
    fn started(&mut self, area: Rect) {
        self.started.push(area);
    }

    fn finished(&mut self, _area: Rect) {
        self.finished += 1;
    }
}

fn red_canvas(w: u32, h: u32) -> Canvas {
    let mut canvas = Canvas::new(w, h, ColorModel::Rgb).unwrap();
    canvas.add_layer(Layer::new(
        "bg",
        PixelBuffer::filled(w, h, PixelFormat::Rgb, &[255, 0, 0]).unwrap(),
    ));
    canvas
}

fn valid_tiles(canvas: &mut Canvas) -> usize {
    let projection = canvas.projection().unwrap();
    let mut n = 0;
    for row in 0..projection.height().div_ceil(64) {
        for col in 0..projection.width().div_ceil(64) {
            if projection.is_tile_valid((col * 64) as i32, (row * 64) as i32) {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn degenerate_rect_does_nothing() {
    let mut canvas = red_canvas(10, 10);
    let mut rec = Recorder::default();
    let report = canvas
        .invalidate_with_progress(Rect::new(3, 3, 0, 4), None, &mut rec)
        .unwrap();
    assert_eq!(report, InvalidateReport::default());
    assert!(rec.started.is_empty());

    let outside = canvas.invalidate(Rect::new(50, 50, 5, 5), None).unwrap();
    assert_eq!(outside, InvalidateReport::default());
}

#[test]
fn full_invalidate_rebuilds_in_one_pass() {
    let mut canvas = red_canvas(130, 130);
    let mut rec = Recorder::default();
    let report = canvas
        .invalidate_with_progress(canvas.bounds(), None, &mut rec)
        .unwrap();

    assert_eq!(report.invalidated_tiles, 9);
    assert_eq!(report.deferred_tiles, 0);
    assert_eq!(report.constructed, Some(Rect::new(0, 0, 130, 130)));
    assert_eq!(rec.started, vec![Rect::new(0, 0, 130, 130)]);
    assert_eq!(rec.finished, 1);
    assert_eq!(valid_tiles(&mut canvas), 9);
}

#[test]
fn no_render_defers_everything() {
    let mut canvas = red_canvas(130, 130);
    canvas.invalidate(canvas.bounds(), None).unwrap();
    let report = canvas
        .invalidate_no_render(Rect::new(10, 10, 60, 10), None)
        .unwrap();
    assert_eq!(report.invalidated_tiles, 2);
    assert_eq!(report.deferred_tiles, 2);
    assert_eq!(report.constructed, None);
    assert_eq!(valid_tiles(&mut canvas), 7);

    assert_eq!(
        canvas.projection_pixel_at(65, 0).unwrap(),
        Some(Rgba8::new(255, 0, 0, 255))
    );
    assert_eq!(valid_tiles(&mut canvas), 8);
}

#[test]
fn valid_sub_region_is_left_alone() {
    let mut canvas = red_canvas(130, 130);
    canvas.invalidate(canvas.bounds(), None).unwrap();

    let report = canvas
        .invalidate(canvas.bounds(), Some(Rect::new(0, 0, 64, 64)))
        .unwrap();
    assert_eq!(report.invalidated_tiles, 8);
    assert_eq!(report.deferred_tiles, 8);
    assert_eq!(report.constructed, None);
    assert_eq!(valid_tiles(&mut canvas), 1);
}

#[test]
fn tiles_straddling_valid_sub_region_are_rebuilt() {
    let mut canvas = red_canvas(130, 130);
    canvas.invalidate(canvas.bounds(), None).unwrap();

    let report = canvas
        .invalidate(canvas.bounds(), Some(Rect::new(0, 0, 100, 100)))
        .unwrap();
    assert_eq!(report.invalidated_tiles, 8);
    assert_eq!(report.deferred_tiles, 5);
    assert_eq!(report.constructed, Some(Rect::new(0, 0, 128, 128)));
    assert_eq!(valid_tiles(&mut canvas), 4);
}

#[test]
fn grown_canvas_keeps_surviving_tile() {
    let mut canvas = red_canvas(100, 100);
    canvas.invalidate(canvas.bounds(), None).unwrap();
    canvas.resize(200, 200).unwrap();
    assert_eq!(valid_tiles(&mut canvas), 1);

    let mut rec = Recorder::default();
    let report = canvas
        .invalidate_with_progress(canvas.bounds(), Some(Rect::new(0, 0, 100, 100)), &mut rec)
        .unwrap();
    assert_eq!(report.invalidated_tiles, 15);
    assert_eq!(report.deferred_tiles, 12);
    assert_eq!(report.constructed, Some(Rect::new(0, 0, 128, 128)));
    assert_eq!(rec.started.len(), 1);
    assert_eq!(valid_tiles(&mut canvas), 4);

    assert_eq!(
        canvas.projection_pixel_at(99, 99).unwrap(),
        Some(Rgba8::new(255, 0, 0, 255))
    );
    assert_eq!(
        canvas.projection_pixel_at(150, 150).unwrap(),
        Some(Rgba8::TRANSPARENT)
    );
}
