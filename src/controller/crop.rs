// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Crop rectangle editing.
//!
//! The rectangle always stays inside the surface. With a fixed aspect ratio
//! the height is derived from the width on every scale tick.

use crate::models::marker::Point;
use crate::util::geometry::Rect;

/// Size of the corner handle in surface pixels.
pub const HANDLE_SIZE: f64 = 12.0;

/// Smallest crop edge in surface pixels.
pub const MIN_CROP: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CropDrag {
    Move { last: Point },
    Scale,
}

#[derive(Debug, Clone, Default)]
pub struct CropController {
    rect: Option<Rect>,
    /// Width divided by height.
    aspect_ratio: Option<f64>,
    drag: Option<CropDrag>,
}

impl CropController {
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect_ratio
    }

    pub fn is_active(&self) -> bool {
        self.rect.is_some()
    }

    /// Fix the aspect ratio, or free it with `None`. Applied to the current
    /// rectangle immediately.
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>, bounds: &Rect) {
        self.aspect_ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
        if let Some(rect) = self.rect {
            self.rect = Some(self.constrain_size(rect, bounds));
        }
    }

    /// Start cropping with a centered rectangle covering most of the surface.
    pub fn begin(&mut self, bounds: &Rect) {
        let w = bounds.width * 0.8;
        let h = bounds.height * 0.8;
        let initial = Rect::new(
            bounds.x + (bounds.width - w) / 2.0,
            bounds.y + (bounds.height - h) / 2.0,
            w,
            h,
        );
        let rect = self.constrain_size(initial, bounds);
        let (dx, dy) = rect.offset_into(bounds);
        self.rect = Some(Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height));
        self.drag = None;
        log::debug!("Crop started at {:?}", self.rect);
    }

    pub fn cancel(&mut self) {
        self.rect = None;
        self.drag = None;
    }

    /// Finish cropping and hand out the selected rectangle.
    pub fn take(&mut self) -> Option<Rect> {
        self.drag = None;
        self.rect.take()
    }

    /// Grab the corner handle or the body of the rectangle.
    pub fn pointer_down(&mut self, p: Point) -> bool {
        let Some(rect) = self.rect else {
            return false;
        };
        let corner = Point::new(rect.right(), rect.bottom());
        self.drag = if (p.x - corner.x).abs() <= HANDLE_SIZE && (p.y - corner.y).abs() <= HANDLE_SIZE
        {
            Some(CropDrag::Scale)
        } else if rect.contains(p) {
            Some(CropDrag::Move { last: p })
        } else {
            None
        };
        self.drag.is_some()
    }

    pub fn pointer_move(&mut self, p: Point, bounds: &Rect) {
        let Some(rect) = self.rect else {
            return;
        };
        match self.drag {
            Some(CropDrag::Move { last }) => {
                self.move_by(p.x - last.x, p.y - last.y, bounds);
                self.drag = Some(CropDrag::Move { last: p });
            }
            Some(CropDrag::Scale) => {
                self.scale_to(p.x - rect.x, p.y - rect.y, bounds);
            }
            None => {}
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Move the rectangle, keeping it inside `bounds`.
    pub fn move_by(&mut self, dx: f64, dy: f64, bounds: &Rect) {
        if let Some(rect) = self.rect {
            let moved = Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height);
            let (cx, cy) = moved.offset_into(bounds);
            self.rect = Some(Rect::new(moved.x + cx, moved.y + cy, moved.width, moved.height));
        }
    }

    /// Resize from the top-left anchor. With a fixed ratio only the width is
    /// taken from the pointer.
    pub fn scale_to(&mut self, width: f64, height: f64, bounds: &Rect) {
        if let Some(rect) = self.rect {
            let scaled = Rect::new(rect.x, rect.y, width, height);
            self.rect = Some(self.constrain_size(scaled, bounds));
        }
    }

    fn constrain_size(&self, rect: Rect, bounds: &Rect) -> Rect {
        let max_w = (bounds.right() - rect.x).max(MIN_CROP);
        let max_h = (bounds.bottom() - rect.y).max(MIN_CROP);
        let mut width = rect.width.clamp(MIN_CROP, max_w);
        let mut height = rect.height.clamp(MIN_CROP, max_h);

        if let Some(ratio) = self.aspect_ratio {
            height = (width / ratio).clamp(MIN_CROP, max_h);
            width = height * ratio;
            if width > max_w {
                width = max_w;
                height = (width / ratio).max(MIN_CROP).min(max_h);
            }
        }
        Rect::new(rect.x, rect.y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 300.0)
    }

    #[test]
    fn test_begin_inside_bounds() {
        let mut crop = CropController::default();
        crop.begin(&bounds());
        let r = crop.rect().unwrap();
        assert!((r.x - 40.0).abs() < 1e-9);
        assert!((r.width - 320.0).abs() < 1e-9);
        assert!((r.height - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_is_clamped() {
        let mut crop = CropController::default();
        crop.begin(&bounds());
        crop.move_by(1000.0, -1000.0, &bounds());
        let r = crop.rect().unwrap();
        assert!((r.right() - 400.0).abs() < 1e-9);
        assert!(r.y.abs() < 1e-9);
    }

    #[test]
    fn test_aspect_ratio_recomputes_height() {
        let mut crop = CropController::default();
        crop.begin(&bounds());
        crop.set_aspect_ratio(Some(2.0), &bounds());
        crop.scale_to(200.0, 10.0, &bounds());
        let r = crop.rect().unwrap();
        assert!((r.width - 200.0).abs() < 1e-9);
        assert!((r.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_aspect_ratio_respects_bottom_edge() {
        let mut crop = CropController::default();
        crop.begin(&bounds());
        crop.set_aspect_ratio(Some(0.5), &bounds());
        crop.scale_to(300.0, 0.0, &bounds());
        let r = crop.rect().unwrap();
        assert!(r.bottom() <= 300.0 + 1e-9);
        assert!((r.width / r.height - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_wide_ratio_keeps_min_height() {
        let narrow = Rect::new(0.0, 0.0, 40.0, 300.0);
        let mut crop = CropController::default();
        crop.begin(&narrow);
        crop.set_aspect_ratio(Some(2.0), &narrow);
        crop.scale_to(10.0, 0.0, &narrow);
        let r = crop.rect().unwrap();
        assert!((r.height - MIN_CROP).abs() < 1e-9);
        assert!((r.width - 2.0 * MIN_CROP).abs() < 1e-9);
        assert!(r.right() <= narrow.right() + 1e-9);
    }

    #[test]
    fn test_drag_handle_and_body() {
        let mut crop = CropController::default();
        crop.begin(&bounds());
        let r = crop.rect().unwrap();

        assert!(crop.pointer_down(Point::new(r.right(), r.bottom())));
        crop.pointer_move(Point::new(r.x + 100.0, r.y + 50.0), &bounds());
        crop.pointer_up();
        let scaled = crop.rect().unwrap();
        assert!((scaled.width - 100.0).abs() < 1e-9);
        assert!((scaled.height - 50.0).abs() < 1e-9);

        assert!(crop.pointer_down(Point::new(scaled.x + 10.0, scaled.y + 10.0)));
        crop.pointer_move(Point::new(scaled.x + 20.0, scaled.y + 15.0), &bounds());
        let moved = crop.rect().unwrap();
        assert!((moved.x - scaled.x - 10.0).abs() < 1e-9);
        assert!((moved.y - scaled.y - 5.0).abs() < 1e-9);

        assert!(!crop.pointer_down(Point::new(1.0, 1.0)));
        assert!(crop.take().is_some());
        assert!(!crop.is_active());
    }
}
