// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker construction.
//!
//! New markers are proportioned to the surface height with fixed design
//! ratios, so a dot placed on a small preview and one placed in fullscreen
//! cover the same share of the image.

use super::marker::{Geometry, GlyphKind, Marker, Point};
use super::palette::{MarkerColor, MarkerType, ShapeKind};
use crate::config::Settings;
use std::collections::BTreeMap;

/// Design sizes as fractions of surface height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignRatios {
    pub point_radius: f64,
    pub cross_half_size: f64,
    pub cross_stroke: f64,
    pub line_stroke: f64,
    /// Offset of the default line end from its anchor, on both axes.
    pub line_default_offset: f64,
    pub oval_rx: f64,
    pub oval_ry: f64,
    pub oval_stroke: f64,
    pub glyph_font: f64,
    pub freehand_stroke: f64,
}

impl Default for DesignRatios {
    fn default() -> Self {
        Self {
            point_radius: 0.011,
            cross_half_size: 0.016,
            cross_stroke: 0.004,
            line_stroke: 0.005,
            line_default_offset: 0.035,
            oval_rx: 0.03,
            oval_ry: 0.02,
            oval_stroke: 0.004,
            glyph_font: 0.045,
            freehand_stroke: 0.004,
        }
    }
}

/// Builds markers for pointer input.
#[derive(Debug, Clone)]
pub struct MarkerFactory {
    ratios: DesignRatios,
    size_factors: BTreeMap<ShapeKind, f64>,
}

impl Default for MarkerFactory {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl MarkerFactory {
    pub fn new(settings: &Settings) -> Self {
        let size_factors = ShapeKind::ALL
            .into_iter()
            .map(|shape| (shape, settings.size_factor(shape)))
            .collect();
        Self {
            ratios: DesignRatios::default(),
            size_factors,
        }
    }

    fn factor(&self, shape: ShapeKind) -> f64 {
        self.size_factors.get(&shape).copied().unwrap_or(1.0)
    }

    /// Create a marker at `at` on a surface of height `height`.
    ///
    /// Returns `None` for color/shape pairs outside the capability table, for a
    /// non-positive height, and for freehand (strokes go through
    /// [`MarkerFactory::create_freehand`]).
    pub fn create(
        &self,
        shape: ShapeKind,
        color: MarkerColor,
        at: Point,
        height: f64,
    ) -> Option<Marker> {
        let marker_type = self.checked_type(shape, color, height)?;
        let h = height * self.factor(shape);
        let r = &self.ratios;

        let geometry = match shape {
            ShapeKind::Point => Geometry::Point {
                center: at,
                radius: r.point_radius * h,
            },
            ShapeKind::Cross => Geometry::Cross {
                center: at,
                half_size: r.cross_half_size * h,
                stroke_width: r.cross_stroke * h,
            },
            ShapeKind::Line => return self.begin_line(color, at, height)?.commit(),
            ShapeKind::Oval => Geometry::Oval {
                center: at,
                rx: r.oval_rx * h,
                ry: r.oval_ry * h,
                stroke_width: r.oval_stroke * h,
                manual: None,
            },
            ShapeKind::Question | ShapeKind::Exclamation => Geometry::Glyph {
                kind: if shape == ShapeKind::Question {
                    GlyphKind::Question
                } else {
                    GlyphKind::Exclamation
                },
                center: at,
                font_size: r.glyph_font * h,
            },
            ShapeKind::Freehand => {
                log::debug!("Freehand markers are created from captured strokes");
                return None;
            }
        };

        Marker::new(marker_type, geometry, height, 1.0)
    }

    /// Start a line at `at` with a short default diagonal.
    pub fn begin_line(&self, color: MarkerColor, at: Point, height: f64) -> Option<LineDraft> {
        let marker_type = self.checked_type(ShapeKind::Line, color, height)?;
        let h = height * self.factor(ShapeKind::Line);
        let offset = self.ratios.line_default_offset * h;
        Some(LineDraft {
            marker_type,
            start: at,
            end: Point::new(at.x + offset, at.y + offset),
            stroke_width: self.ratios.line_stroke * h,
            height,
        })
    }

    /// Build a freehand marker from captured absolute points.
    pub fn create_freehand(
        &self,
        color: MarkerColor,
        points: &[Point],
        height: f64,
    ) -> Option<Marker> {
        let marker_type = self.checked_type(ShapeKind::Freehand, color, height)?;
        if points.len() < 2 {
            return None;
        }

        let left = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let top = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let path = points
            .iter()
            .map(|p| Point::new(p.x - left, p.y - top))
            .collect();
        let stroke_width =
            self.ratios.freehand_stroke * height * self.factor(ShapeKind::Freehand);

        Marker::new(
            marker_type,
            Geometry::Freehand {
                path,
                left,
                top,
                scale_x: 1.0,
                scale_y: 1.0,
                stroke_width,
            },
            height,
            1.0,
        )
    }

    fn checked_type(&self, shape: ShapeKind, color: MarkerColor, height: f64) -> Option<MarkerType> {
        if !(height.is_finite() && height > 0.0) {
            log::debug!("Refusing {:?} marker on surface of height {}", shape, height);
            return None;
        }
        let marker_type = MarkerType::new(color, shape);
        if marker_type.is_none() {
            log::debug!("{} markers cannot be drawn as {:?}", color.name(), shape);
        }
        marker_type
    }
}

/// A line being dragged out; becomes a [`Marker`] on commit.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDraft {
    marker_type: MarkerType,
    start: Point,
    end: Point,
    stroke_width: f64,
    height: f64,
}

impl LineDraft {
    /// Move the free endpoint.
    pub fn update(&mut self, end: Point) {
        self.end = end;
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn marker_type(&self) -> MarkerType {
        self.marker_type
    }

    pub fn commit(self) -> Option<Marker> {
        Marker::new(
            self.marker_type,
            Geometry::Line {
                start: self.start,
                end: self.end,
                stroke_width: self.stroke_width,
            },
            self.height,
            1.0,
        )
    }
}
