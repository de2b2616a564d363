// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Midline adjustment. The line spans the full width; only its Y moves.

use crate::models::image::ImageRecord;
use crate::models::marker::Point;

/// Grab distance around the midline in surface pixels.
pub const GRAB_TOLERANCE: f64 = 8.0;

#[derive(Debug, Clone, Default)]
pub struct MidlineController {
    /// Pointer Y minus line Y at grab time.
    grab_offset: Option<f64>,
}

impl MidlineController {
    pub fn hit(image: &ImageRecord, p: Point) -> bool {
        let (w, _) = image.space();
        (0.0..=w).contains(&p.x) && (p.y - image.midline_y()).abs() <= GRAB_TOLERANCE
    }

    /// Start a drag if `p` is on the line. A press elsewhere jumps the line
    /// to the pointer.
    pub fn pointer_down(&mut self, image: &mut ImageRecord, p: Point) {
        if Self::hit(image, p) {
            self.grab_offset = Some(p.y - image.midline_y());
        } else {
            self.grab_offset = Some(0.0);
            Self::place(image, p.y);
        }
    }

    /// Follow the pointer vertically. X is ignored.
    pub fn pointer_move(&mut self, image: &mut ImageRecord, p: Point) {
        if let Some(offset) = self.grab_offset {
            Self::place(image, p.y - offset);
        }
    }

    pub fn pointer_up(&mut self) {
        self.grab_offset = None;
    }

    fn place(image: &mut ImageRecord, y: f64) {
        let (_, h) = image.space();
        image.set_midline_y(y.clamp(0.0, h.max(0.0)));
    }
}
