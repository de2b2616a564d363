// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Clamping, color parsing, the logarithmic size-slider mapping and the
//! fit-to-container computation used whenever a surface is (re)sized.

use crate::models::marker::Point;
use serde::{Deserialize, Serialize};

/// Clamp `value` into `[lo, hi]`. If the range is inverted, `lo` wins.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value < lo || hi < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Parse `#rrggbb` or `#rgb` into RGBA bytes with the given alpha (0.0 to 1.0).
pub fn hex_to_rgba(hex: &str, alpha: f64) -> Option<[u8; 4]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.is_ascii() {
        return None;
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    let a = (clamp(alpha, 0.0, 1.0) * 255.0).round() as u8;
    Some([channel(0)?, channel(2)?, channel(4)?, a])
}

/// Map a size-slider position to a size multiplier (`2^s`).
///
/// Slider `0` is natural size, negative values shrink, positive values grow.
pub fn slider_to_multiplier(slider: f64) -> f64 {
    slider.exp2()
}

/// Inverse of [`slider_to_multiplier`]. Non-positive multipliers map to `0`.
pub fn multiplier_to_slider(multiplier: f64) -> f64 {
    if multiplier > 0.0 && multiplier.is_finite() {
        multiplier.log2()
    } else {
        0.0
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Offset needed to move this rectangle fully inside `bounds`.
    ///
    /// When the rectangle is larger than the bounds, its top-left corner is
    /// pinned to the bounds' top-left corner.
    pub fn offset_into(&self, bounds: &Rect) -> (f64, f64) {
        let dx = if self.x < bounds.x || self.width > bounds.width {
            bounds.x - self.x
        } else if self.right() > bounds.right() {
            bounds.right() - self.right()
        } else {
            0.0
        };
        let dy = if self.y < bounds.y || self.height > bounds.height {
            bounds.y - self.y
        } else if self.bottom() > bounds.bottom() {
            bounds.bottom() - self.bottom()
        } else {
            0.0
        };
        (dx, dy)
    }
}

/// Result of fitting an image into a container while preserving aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitGeometry {
    pub scale: f64,
    pub target_w: f64,
    pub target_h: f64,
}

/// Fit `natural` pixel dimensions into `container` (both width, height).
///
/// Returns `None` if either size is degenerate.
pub fn fit_to_container(natural: (u32, u32), container: (f64, f64)) -> Option<FitGeometry> {
    let (nw, nh) = (natural.0 as f64, natural.1 as f64);
    let (cw, ch) = container;
    if nw <= 0.0 || nh <= 0.0 || cw <= 0.0 || ch <= 0.0 {
        return None;
    }

    let scale = (cw / nw).min(ch / nh);
    Some(FitGeometry {
        scale,
        target_w: nw * scale,
        target_h: nh * scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_mapping() {
        assert_eq!(slider_to_multiplier(0.0), 1.0);
        assert_eq!(slider_to_multiplier(1.0), 2.0);
        assert_eq!(slider_to_multiplier(-1.0), 0.5);
        assert!((multiplier_to_slider(4.0) - 2.0).abs() < 1e-12);
        assert_eq!(multiplier_to_slider(0.0), 0.0);
        assert_eq!(multiplier_to_slider(-3.0), 0.0);
    }

    #[test]
    fn test_hex_to_rgba() {
        assert_eq!(hex_to_rgba("#ff8000", 1.0), Some([255, 128, 0, 255]));
        assert_eq!(hex_to_rgba("#fff", 0.0), Some([255, 255, 255, 0]));
        assert_eq!(hex_to_rgba("#12", 1.0), None);
        assert_eq!(hex_to_rgba("#gggggg", 1.0), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 3.0), 3.0);
        assert_eq!(clamp(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 3.0), 2.0);
    }

    #[test]
    fn test_fit_to_container() {
        let fit = fit_to_container((2000, 1000), (1000.0, 1000.0)).unwrap();
        assert!((fit.scale - 0.5).abs() < 1e-12);
        assert!((fit.target_w - 1000.0).abs() < 1e-9);
        assert!((fit.target_h - 500.0).abs() < 1e-9);
        assert!(fit_to_container((0, 10), (100.0, 100.0)).is_none());
    }

    #[test]
    fn test_offset_into_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r = Rect::new(90.0, -5.0, 20.0, 20.0);
        assert_eq!(r.offset_into(&bounds), (-10.0, 5.0));
        let inside = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert_eq!(inside.offset_into(&bounds), (0.0, 0.0));
    }
}
