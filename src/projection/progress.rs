use crate::foundation::core::Rect;

/// Observer for long construct passes. Purely informational.
pub trait ConstructProgress {
    fn started(&mut self, area: Rect);
    fn finished(&mut self, area: Rect);
}

/// Progress observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ConstructProgress for NoProgress {
    fn started(&mut self, _area: Rect) {}
    fn finished(&mut self, _area: Rect) {}
}
