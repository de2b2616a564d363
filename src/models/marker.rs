// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker data structures.
//!
//! A [`Marker`] is a typed vector shape placed on an image surface. Its
//! geometry is stored in surface pixels; its [`NormalizedForm`] keeps the same
//! dimensions as fractions of the surface height so the marker can be re-derived
//! after any resize.

use super::palette::{MarkerType, ShapeKind};
use super::scale;
use crate::util::geometry::Rect;
use serde::{Deserialize, Serialize};

/// A 2D point in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Which glyph a text marker shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Question,
    Exclamation,
}

impl GlyphKind {
    pub fn text(self) -> &'static str {
        match self {
            GlyphKind::Question => "?",
            GlyphKind::Exclamation => "!",
        }
    }
}

/// Size of an oval the user resized by hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsoluteSize {
    pub rx: f64,
    pub ry: f64,
    pub stroke_width: f64,
}

/// Shape-specific geometry, in surface pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point {
        center: Point,
        radius: f64,
    },
    /// Two diagonal strokes; `half_size` is the distance from center to a tip.
    Cross {
        center: Point,
        half_size: f64,
        stroke_width: f64,
    },
    Line {
        start: Point,
        end: Point,
        stroke_width: f64,
    },
    Oval {
        center: Point,
        rx: f64,
        ry: f64,
        stroke_width: f64,
        /// Set once the oval was resized through its own handles.
        manual: Option<AbsoluteSize>,
    },
    Glyph {
        kind: GlyphKind,
        center: Point,
        font_size: f64,
    },
    /// Captured stroke. `path` is relative to (`left`, `top`) and is never
    /// rewritten; only the transform and stroke change.
    Freehand {
        path: Vec<Point>,
        left: f64,
        top: f64,
        scale_x: f64,
        scale_y: f64,
        stroke_width: f64,
    },
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Point { .. } => ShapeKind::Point,
            Geometry::Cross { .. } => ShapeKind::Cross,
            Geometry::Line { .. } => ShapeKind::Line,
            Geometry::Oval { .. } => ShapeKind::Oval,
            Geometry::Glyph {
                kind: GlyphKind::Question,
                ..
            } => ShapeKind::Question,
            Geometry::Glyph {
                kind: GlyphKind::Exclamation,
                ..
            } => ShapeKind::Exclamation,
            Geometry::Freehand { .. } => ShapeKind::Freehand,
        }
    }
}

/// Dimensions as fractions of surface height, plus the applied size factor.
///
/// A field is `None` until it has been captured for the marker's shape kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedForm {
    pub radius: Option<f64>,
    pub stroke_width: Option<f64>,
    pub rx: Option<f64>,
    pub ry: Option<f64>,
    pub font_size: Option<f64>,
    pub scale_factor: f64,
}

impl Default for NormalizedForm {
    fn default() -> Self {
        Self {
            radius: None,
            stroke_width: None,
            rx: None,
            ry: None,
            font_size: None,
            scale_factor: 1.0,
        }
    }
}

/// A typed marker on an image surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub marker_type: MarkerType,
    pub geometry: Geometry,
    pub normalized: NormalizedForm,
    /// Last applied size multiplier (`sz` on the wire).
    pub last_size_multiplier: f64,
}

impl Marker {
    /// Wrap geometry drawn on a surface of the given height.
    ///
    /// Returns `None` if the geometry does not match the marker type's shape
    /// or the height is not positive.
    pub fn new(
        marker_type: MarkerType,
        geometry: Geometry,
        surface_height: f64,
        size_multiplier: f64,
    ) -> Option<Self> {
        if geometry.kind() != marker_type.shape {
            log::debug!(
                "Geometry {:?} does not match marker type {}",
                geometry.kind(),
                marker_type
            );
            return None;
        }
        let normalized = scale::capture_normalized(&geometry, surface_height, size_multiplier)?;
        Some(Self {
            marker_type,
            geometry,
            normalized,
            last_size_multiplier: normalized.scale_factor,
        })
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn manually_scaled(&self) -> bool {
        matches!(self.geometry, Geometry::Oval { manual: Some(_), .. })
    }

    /// Anchor point used for jaw classification and hit feedback.
    pub fn center(&self) -> Point {
        match &self.geometry {
            Geometry::Point { center, .. }
            | Geometry::Cross { center, .. }
            | Geometry::Oval { center, .. }
            | Geometry::Glyph { center, .. } => *center,
            Geometry::Line { start, end, .. } => {
                Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0)
            }
            Geometry::Freehand { .. } => self.bounding_box().center(),
        }
    }

    /// Bounding box in surface pixels, including stroke.
    pub fn bounding_box(&self) -> Rect {
        match &self.geometry {
            Geometry::Point { center, radius } => around(*center, *radius, *radius),
            Geometry::Cross {
                center,
                half_size,
                stroke_width,
            } => {
                let r = half_size + stroke_width / 2.0;
                around(*center, r, r)
            }
            Geometry::Line {
                start,
                end,
                stroke_width,
            } => {
                let pad = stroke_width / 2.0;
                let r = Rect::from_corners(*start, *end);
                Rect::new(r.x - pad, r.y - pad, r.width + 2.0 * pad, r.height + 2.0 * pad)
            }
            Geometry::Oval {
                center,
                rx,
                ry,
                stroke_width,
                ..
            } => around(*center, rx + stroke_width / 2.0, ry + stroke_width / 2.0),
            Geometry::Glyph {
                center, font_size, ..
            } => around(*center, font_size * 0.3, font_size * 0.5),
            Geometry::Freehand {
                path,
                left,
                top,
                scale_x,
                scale_y,
                stroke_width,
            } => {
                let pad = stroke_width / 2.0;
                let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
                let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
                for p in path {
                    min_x = min_x.min(p.x);
                    min_y = min_y.min(p.y);
                    max_x = max_x.max(p.x);
                    max_y = max_y.max(p.y);
                }
                if path.is_empty() {
                    return Rect::new(*left, *top, 0.0, 0.0);
                }
                Rect::new(
                    left + min_x * scale_x - pad,
                    top + min_y * scale_y - pad,
                    (max_x - min_x) * scale_x + 2.0 * pad,
                    (max_y - min_y) * scale_y + 2.0 * pad,
                )
            }
        }
    }

    /// Absolute points of a freehand stroke (empty for other shapes).
    pub fn stroke_points(&self) -> Vec<Point> {
        match &self.geometry {
            Geometry::Freehand {
                path,
                left,
                top,
                scale_x,
                scale_y,
                ..
            } => path
                .iter()
                .map(|p| Point::new(left + p.x * scale_x, top + p.y * scale_y))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Move the marker by an offset in surface pixels.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.geometry {
            Geometry::Point { center, .. }
            | Geometry::Cross { center, .. }
            | Geometry::Oval { center, .. }
            | Geometry::Glyph { center, .. } => {
                center.x += dx;
                center.y += dy;
            }
            Geometry::Line { start, end, .. } => {
                start.x += dx;
                start.y += dy;
                end.x += dx;
                end.y += dy;
            }
            Geometry::Freehand { left, top, .. } => {
                *left += dx;
                *top += dy;
            }
        }
    }

    /// Scale anchor positions (not sizes) after the surface changed size.
    pub fn scale_positions(&mut self, sx: f64, sy: f64) {
        match &mut self.geometry {
            Geometry::Point { center, .. }
            | Geometry::Cross { center, .. }
            | Geometry::Oval { center, .. }
            | Geometry::Glyph { center, .. } => {
                center.x *= sx;
                center.y *= sy;
            }
            Geometry::Line { start, end, .. } => {
                start.x *= sx;
                start.y *= sy;
                end.x *= sx;
                end.y *= sy;
            }
            Geometry::Freehand {
                left,
                top,
                scale_x,
                scale_y,
                ..
            } => {
                *left *= sx;
                *top *= sy;
                *scale_x *= sx;
                *scale_y *= sy;
            }
        }
    }

    /// Whether `p` lies on the marker, with `tolerance` pixels of slack.
    pub fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        let b = self.bounding_box();
        let grown = Rect::new(
            b.x - tolerance,
            b.y - tolerance,
            b.width + 2.0 * tolerance,
            b.height + 2.0 * tolerance,
        );
        if !grown.contains(p) {
            return false;
        }

        match &self.geometry {
            Geometry::Line {
                start,
                end,
                stroke_width,
            } => distance_to_segment(p, *start, *end) <= stroke_width / 2.0 + tolerance,
            _ => true,
        }
    }
}

fn around(center: Point, half_w: f64, half_h: f64) -> Rect {
    Rect::new(center.x - half_w, center.y - half_h, half_w * 2.0, half_h * 2.0)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::palette::MarkerColor;

    fn line_marker() -> Marker {
        Marker::new(
            MarkerType::new(MarkerColor::Blue, ShapeKind::Line).unwrap(),
            Geometry::Line {
                start: Point::new(10.0, 10.0),
                end: Point::new(50.0, 10.0),
                stroke_width: 4.0,
            },
            500.0,
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_geometry() {
        let t = MarkerType::new(MarkerColor::Blue, ShapeKind::Point).unwrap();
        let geometry = Geometry::Line {
            start: Point::new(0.0, 0.0),
            end: Point::new(1.0, 1.0),
            stroke_width: 1.0,
        };
        assert!(Marker::new(t, geometry, 100.0, 1.0).is_none());
    }

    #[test]
    fn test_line_center_and_bbox() {
        let m = line_marker();
        assert_eq!(m.center(), Point::new(30.0, 10.0));
        let b = m.bounding_box();
        assert_eq!(b, Rect::new(8.0, 8.0, 44.0, 4.0));
    }

    #[test]
    fn test_line_hit_test_uses_segment_distance() {
        let m = line_marker();
        assert!(m.hit_test(Point::new(30.0, 11.0), 1.0));
        assert!(!m.hit_test(Point::new(30.0, 20.0), 1.0));
    }

    #[test]
    fn test_freehand_translate_and_scale() {
        let t = MarkerType::new(MarkerColor::Red, ShapeKind::Freehand).unwrap();
        let mut m = Marker::new(
            t,
            Geometry::Freehand {
                path: vec![Point::new(0.0, 0.0), Point::new(10.0, 20.0)],
                left: 5.0,
                top: 5.0,
                scale_x: 1.0,
                scale_y: 1.0,
                stroke_width: 2.0,
            },
            100.0,
            1.0,
        )
        .unwrap();

        m.translate(5.0, 0.0);
        m.scale_positions(2.0, 2.0);
        assert_eq!(
            m.stroke_points(),
            vec![Point::new(20.0, 10.0), Point::new(40.0, 50.0)]
        );
    }
}
