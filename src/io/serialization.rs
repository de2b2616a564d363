// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker serialization and reconstruction.
//!
//! Markers are written in the native pixel space of the original raster:
//! every on-surface coordinate is multiplied by `original_width /
//! surface_width`. [`Meta`] records that native size, so a reader can
//! rebuild the markers on a surface of any size by multiplying with
//! `current_width / meta.w`.
//!
//! Manually scaled ovals are the exception: their radii and stroke are
//! absolute and written unscaled.

use crate::models::image::ImageRecord;
use crate::models::marker::{AbsoluteSize, Geometry, GlyphKind, Marker, Point};
use crate::models::palette::MarkerType;
use crate::models::scale::sanitize_multiplier;
use serde::{Deserialize, Serialize};

/// Version stamped on every shape record.
pub const RECORD_VERSION: u8 = 2;

fn record_version() -> u8 {
    RECORD_VERSION
}

fn unit() -> f64 {
    1.0
}

/// One serialized marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    #[serde(default = "record_version")]
    pub v: u8,
    /// Marker type, e.g. `blue_dot`.
    pub m: MarkerType,
    /// Last applied size multiplier.
    #[serde(default = "unit")]
    pub sz: f64,
    #[serde(flatten)]
    pub shape: ShapeData,
}

/// Shape-specific fields, tagged by `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ShapeData {
    #[serde(rename = "point")]
    Point { cx: f64, cy: f64, radius: f64 },
    /// `radius` is the distance from center to a tip.
    #[serde(rename = "cross")]
    Cross {
        cx: f64,
        cy: f64,
        radius: f64,
        #[serde(rename = "strokeWidth")]
        stroke_width: f64,
    },
    #[serde(rename = "line")]
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        #[serde(rename = "strokeWidth")]
        stroke_width: f64,
    },
    #[serde(rename = "oval")]
    Oval {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        #[serde(rename = "strokeWidth")]
        stroke_width: f64,
        #[serde(default)]
        manual: bool,
    },
    #[serde(rename = "q")]
    Question {
        cx: f64,
        cy: f64,
        #[serde(rename = "fontSize")]
        font_size: f64,
    },
    #[serde(rename = "exc")]
    Exclamation {
        cx: f64,
        cy: f64,
        #[serde(rename = "fontSize")]
        font_size: f64,
    },
    #[serde(rename = "free")]
    Freehand {
        path: Vec<Point>,
        left: f64,
        top: f64,
        #[serde(rename = "scaleX", default = "unit")]
        scale_x: f64,
        #[serde(rename = "scaleY", default = "unit")]
        scale_y: f64,
        #[serde(rename = "strokeWidth")]
        stroke_width: f64,
    },
}

/// Native raster size the records are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub w: f64,
    pub h: f64,
    /// Midline Y in native pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<f64>,
}

/// Output of [`serialize_image_markers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMarkers {
    pub items: Vec<ShapeRecord>,
    pub meta: Meta,
}

impl SerializedMarkers {
    /// Scale that maps these records onto a surface `surface_width` wide.
    pub fn scale_for(&self, surface_width: f64) -> Option<f64> {
        (self.meta.w > 0.0 && surface_width > 0.0).then(|| surface_width / self.meta.w)
    }

    /// Rebuild all markers on a surface of the given size, skipping records
    /// that cannot be reconstructed.
    pub fn restore(&self, surface_width: f64, surface_height: f64) -> Vec<Marker> {
        let Some(scale) = self.scale_for(surface_width) else {
            log::warn!(
                "Cannot restore markers: native width {}, surface width {}",
                self.meta.w,
                surface_width
            );
            return Vec::new();
        };
        self.items
            .iter()
            .filter_map(|record| create_marker_from_data(record, scale, surface_height))
            .collect()
    }

    /// Midline as a fraction of image height.
    pub fn midline_fraction(&self) -> Option<f64> {
        let mid = self.meta.mid?;
        (self.meta.h > 0.0).then(|| (mid / self.meta.h).clamp(0.0, 1.0))
    }
}

/// Serialize every marker of an image shown on a `surface_width` ×
/// `surface_height` surface.
pub fn serialize_image_markers(
    record: &ImageRecord,
    surface_width: f64,
    surface_height: f64,
) -> SerializedMarkers {
    let (native_w, native_h) = (
        record.natural_width() as f64,
        record.natural_height() as f64,
    );
    let factor = if surface_width > 0.0 && native_w > 0.0 {
        native_w / surface_width
    } else {
        log::warn!(
            "Serializing image {} with degenerate size {}x{}",
            record.id,
            surface_width,
            surface_height
        );
        1.0
    };

    SerializedMarkers {
        items: record
            .markers()
            .iter()
            .map(|m| marker_to_record(m, factor))
            .collect(),
        meta: Meta {
            w: native_w,
            h: native_h,
            mid: record.midline_fraction().map(|f| f * native_h),
        },
    }
}

/// Convert one marker, multiplying surface pixels by `factor`.
pub fn marker_to_record(marker: &Marker, factor: f64) -> ShapeRecord {
    let shape = match &marker.geometry {
        Geometry::Point { center, radius } => ShapeData::Point {
            cx: center.x * factor,
            cy: center.y * factor,
            radius: radius * factor,
        },
        Geometry::Cross {
            center,
            half_size,
            stroke_width,
        } => ShapeData::Cross {
            cx: center.x * factor,
            cy: center.y * factor,
            radius: half_size * factor,
            stroke_width: stroke_width * factor,
        },
        Geometry::Line {
            start,
            end,
            stroke_width,
        } => ShapeData::Line {
            x1: start.x * factor,
            y1: start.y * factor,
            x2: end.x * factor,
            y2: end.y * factor,
            stroke_width: stroke_width * factor,
        },
        Geometry::Oval {
            center,
            rx,
            ry,
            stroke_width,
            manual,
        } => match manual {
            Some(abs) => ShapeData::Oval {
                cx: center.x * factor,
                cy: center.y * factor,
                rx: abs.rx,
                ry: abs.ry,
                stroke_width: abs.stroke_width,
                manual: true,
            },
            None => ShapeData::Oval {
                cx: center.x * factor,
                cy: center.y * factor,
                rx: rx * factor,
                ry: ry * factor,
                stroke_width: stroke_width * factor,
                manual: false,
            },
        },
        Geometry::Glyph {
            kind,
            center,
            font_size,
        } => {
            let (cx, cy, font_size) = (center.x * factor, center.y * factor, font_size * factor);
            match kind {
                GlyphKind::Question => ShapeData::Question { cx, cy, font_size },
                GlyphKind::Exclamation => ShapeData::Exclamation { cx, cy, font_size },
            }
        }
        Geometry::Freehand {
            path,
            left,
            top,
            scale_x,
            scale_y,
            stroke_width,
        } => ShapeData::Freehand {
            path: path.clone(),
            left: left * factor,
            top: top * factor,
            scale_x: scale_x * factor,
            scale_y: scale_y * factor,
            stroke_width: stroke_width * factor,
        },
    };

    ShapeRecord {
        v: RECORD_VERSION,
        m: marker.marker_type,
        sz: marker.last_size_multiplier,
        shape,
    }
}

/// Rebuild a marker from a record.
///
/// `scale` maps native pixels to the current surface (`current_width /
/// meta.w`). The rebuilt marker gets a fresh normalized form captured at
/// `current_height` and the record's size multiplier, so it behaves like a
/// freshly drawn one. Returns `None` for a non-positive scale or height, or if
/// the record's tag and marker type disagree.
pub fn create_marker_from_data(
    record: &ShapeRecord,
    scale: f64,
    current_height: f64,
) -> Option<Marker> {
    if !(scale.is_finite() && scale > 0.0) {
        log::debug!("Refusing record with scale {}", scale);
        return None;
    }
    let s = scale;
    let at = |x: f64, y: f64| Point::new(x * s, y * s);

    let geometry = match &record.shape {
        ShapeData::Point { cx, cy, radius } => Geometry::Point {
            center: at(*cx, *cy),
            radius: radius * s,
        },
        ShapeData::Cross {
            cx,
            cy,
            radius,
            stroke_width,
        } => Geometry::Cross {
            center: at(*cx, *cy),
            half_size: radius * s,
            stroke_width: stroke_width * s,
        },
        ShapeData::Line {
            x1,
            y1,
            x2,
            y2,
            stroke_width,
        } => Geometry::Line {
            start: at(*x1, *y1),
            end: at(*x2, *y2),
            stroke_width: stroke_width * s,
        },
        ShapeData::Oval {
            cx,
            cy,
            rx,
            ry,
            stroke_width,
            manual: true,
        } => Geometry::Oval {
            center: at(*cx, *cy),
            rx: *rx,
            ry: *ry,
            stroke_width: *stroke_width,
            manual: Some(AbsoluteSize {
                rx: *rx,
                ry: *ry,
                stroke_width: *stroke_width,
            }),
        },
        ShapeData::Oval {
            cx,
            cy,
            rx,
            ry,
            stroke_width,
            manual: false,
        } => Geometry::Oval {
            center: at(*cx, *cy),
            rx: rx * s,
            ry: ry * s,
            stroke_width: stroke_width * s,
            manual: None,
        },
        ShapeData::Question { cx, cy, font_size } => Geometry::Glyph {
            kind: GlyphKind::Question,
            center: at(*cx, *cy),
            font_size: font_size * s,
        },
        ShapeData::Exclamation { cx, cy, font_size } => Geometry::Glyph {
            kind: GlyphKind::Exclamation,
            center: at(*cx, *cy),
            font_size: font_size * s,
        },
        ShapeData::Freehand {
            path,
            left,
            top,
            scale_x,
            scale_y,
            stroke_width,
        } => Geometry::Freehand {
            path: path.clone(),
            left: left * s,
            top: top * s,
            scale_x: scale_x * s,
            scale_y: scale_y * s,
            stroke_width: stroke_width * s,
        },
    };

    Marker::new(
        record.m,
        geometry,
        current_height,
        sanitize_multiplier(record.sz),
    )
}

/// Parse a single record from loose JSON, logging and skipping bad ones.
pub fn record_from_value(value: serde_json::Value) -> Option<ShapeRecord> {
    match serde_json::from_value::<ShapeRecord>(value) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Skipping unreadable marker record: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::factory::MarkerFactory;
    use crate::models::image::{ImageRecord, NewImage};
    use crate::models::marker::Marker;
    use crate::models::palette::{MarkerColor, ShapeKind};
    use crate::models::scale::{apply_size_by_slider, mark_manually_scaled};

    const EPS: f64 = 1e-6;

    fn record(width: u32, height: u32) -> ImageRecord {
        ImageRecord::new(
            NewImage {
                image_url: "mem://pano.png".to_string(),
                description: "pano".to_string(),
                natural_size: (width, height),
            },
            crate::models::image::WorkMode::Panoramic,
            50,
        )
    }

    fn all_shapes(h: f64) -> Vec<Marker> {
        let f = MarkerFactory::default();
        let mut out = Vec::new();
        let at = Point::new(120.0, 80.0);
        for shape in [
            ShapeKind::Point,
            ShapeKind::Cross,
            ShapeKind::Line,
            ShapeKind::Oval,
            ShapeKind::Question,
            ShapeKind::Exclamation,
        ] {
            out.push(f.create(shape, MarkerColor::Blue, at, h).unwrap());
        }
        let pts = [Point::new(10.0, 10.0), Point::new(40.0, 30.0), Point::new(60.0, 5.0)];
        out.push(f.create_freehand(MarkerColor::Blue, &pts, h).unwrap());
        out
    }

    fn assert_geometry_close(a: &Geometry, b: &Geometry, k: f64) {
        let close = |x: f64, y: f64| assert!((x * k - y).abs() < EPS, "{} vs {}", x * k, y);
        let close_pt = |p: &Point, q: &Point| {
            close(p.x, q.x);
            close(p.y, q.y);
        };
        match (a, b) {
            (Geometry::Point { center: c1, radius: r1 }, Geometry::Point { center: c2, radius: r2 }) => {
                close_pt(c1, c2);
                close(*r1, *r2);
            }
            (
                Geometry::Cross { center: c1, half_size: h1, stroke_width: s1 },
                Geometry::Cross { center: c2, half_size: h2, stroke_width: s2 },
            ) => {
                close_pt(c1, c2);
                close(*h1, *h2);
                close(*s1, *s2);
            }
            (
                Geometry::Line { start: a1, end: b1, stroke_width: s1 },
                Geometry::Line { start: a2, end: b2, stroke_width: s2 },
            ) => {
                close_pt(a1, a2);
                close_pt(b1, b2);
                close(*s1, *s2);
            }
            (
                Geometry::Oval { center: c1, rx: x1, ry: y1, stroke_width: s1, .. },
                Geometry::Oval { center: c2, rx: x2, ry: y2, stroke_width: s2, .. },
            ) => {
                close_pt(c1, c2);
                close(*x1, *x2);
                close(*y1, *y2);
                close(*s1, *s2);
            }
            (
                Geometry::Glyph { kind: k1, center: c1, font_size: f1 },
                Geometry::Glyph { kind: k2, center: c2, font_size: f2 },
            ) => {
                assert_eq!(k1, k2);
                close_pt(c1, c2);
                close(*f1, *f2);
            }
            (
                Geometry::Freehand { path: p1, left: l1, top: t1, scale_x: x1, scale_y: y1, stroke_width: s1 },
                Geometry::Freehand { path: p2, left: l2, top: t2, scale_x: x2, scale_y: y2, stroke_width: s2 },
            ) => {
                assert_eq!(p1, p2);
                close(*l1, *l2);
                close(*t1, *t2);
                close(*x1, *x2);
                close(*y1, *y2);
                close(*s1, *s2);
            }
            _ => panic!("shape kind changed: {:?} vs {:?}", a, b),
        }
    }

    #[test]
    fn test_roundtrip_at_fixed_size() {
        let (w, h) = (800.0, 600.0);
        let mut img = record(800, 600);
        for m in all_shapes(h) {
            img.push_marker(m);
        }
        apply_size_by_slider(&mut img.markers_mut()[0], 1.5, h);

        let out = serialize_image_markers(&img, w, h);
        assert_eq!(out.items.len(), img.markers().len());

        for (rec, original) in out.items.iter().zip(img.markers()) {
            let back = create_marker_from_data(rec, 1.0, h).unwrap();
            assert_eq!(back.marker_type, original.marker_type);
            assert_geometry_close(&original.geometry, &back.geometry, 1.0);
            assert!((back.last_size_multiplier - original.last_size_multiplier).abs() < EPS);
        }
    }

    #[test]
    fn test_roundtrip_across_resize_doubles_geometry() {
        let (w1, h1) = (400.0, 300.0);
        let mut img = record(1600, 1200);
        for m in all_shapes(h1) {
            img.push_marker(m);
        }

        let out = serialize_image_markers(&img, w1, h1);
        assert_eq!(out.meta.w, 1600.0);
        let scale = out.scale_for(2.0 * w1).unwrap();
        for (rec, original) in out.items.iter().zip(img.markers()) {
            let back = create_marker_from_data(rec, scale, 2.0 * h1).unwrap();
            assert_geometry_close(&original.geometry, &back.geometry, 2.0);
        }
    }

    #[test]
    fn test_manual_oval_keeps_absolute_size_across_resize() {
        let f = MarkerFactory::default();
        let mut img = record(1000, 1000);
        let mut oval = f
            .create(ShapeKind::Oval, MarkerColor::Red, Point::new(100.0, 100.0), 500.0)
            .unwrap();
        mark_manually_scaled(&mut oval, 40.0, 25.0, 3.0);
        img.push_marker(oval);

        let out = serialize_image_markers(&img, 500.0, 500.0);
        match out.items[0].shape {
            ShapeData::Oval { cx, rx, manual, .. } => {
                assert!(manual);
                assert!((cx - 200.0).abs() < EPS);
                assert_eq!(rx, 40.0);
            }
            _ => panic!("expected oval"),
        }

        let back = create_marker_from_data(&out.items[0], 2.0, 2000.0).unwrap();
        assert!(back.manually_scaled());
        match back.geometry {
            Geometry::Oval { center, rx, ry, stroke_width, .. } => {
                assert!((center.x - 400.0).abs() < EPS);
                assert_eq!((rx, ry, stroke_width), (40.0, 25.0, 3.0));
            }
            _ => panic!("expected oval"),
        }
    }

    #[test]
    fn test_restored_marker_rescales_like_fresh_one() {
        let f = MarkerFactory::default();
        let fresh = f
            .create(ShapeKind::Point, MarkerColor::Green, Point::new(50.0, 50.0), 1000.0)
            .unwrap();
        let rec = marker_to_record(&fresh, 1.0);
        let back = create_marker_from_data(&rec, 1.0, 1000.0).unwrap();
        assert_eq!(back.normalized, fresh.normalized);
    }

    #[test]
    fn test_wire_shape_of_record() {
        let rec = ShapeRecord {
            v: RECORD_VERSION,
            m: "blue_dot".parse().unwrap(),
            sz: 1.0,
            shape: ShapeData::Point {
                cx: 1.0,
                cy: 2.0,
                radius: 3.0,
            },
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["t"], "point");
        assert_eq!(json["v"], 2);
        assert_eq!(json["m"], "blue_dot");
        assert_eq!(json["radius"], 3.0);

        let line: ShapeRecord = serde_json::from_str(
            r#"{"t":"line","v":2,"m":"violet_line","sz":2,"x1":0,"y1":0,"x2":10,"y2":5,"strokeWidth":2}"#,
        )
        .unwrap();
        assert_eq!(line.sz, 2.0);
        assert!(matches!(line.shape, ShapeData::Line { x2, .. } if x2 == 10.0));
    }

    #[test]
    fn test_mismatched_tag_and_type_refused() {
        let rec: ShapeRecord = serde_json::from_str(
            r#"{"t":"line","v":2,"m":"blue_dot","sz":1,"x1":0,"y1":0,"x2":10,"y2":5,"strokeWidth":2}"#,
        )
        .unwrap();
        assert!(create_marker_from_data(&rec, 1.0, 100.0).is_none());
    }

    #[test]
    fn test_unknown_marker_type_skipped() {
        let bad = serde_json::json!({"t":"cross","m":"white_cross","cx":1,"cy":1,"radius":2,"strokeWidth":1});
        assert!(record_from_value(bad).is_none());
    }

    #[test]
    fn test_bad_scale_refused() {
        let rec = marker_to_record(&all_shapes(100.0)[0], 1.0);
        assert!(create_marker_from_data(&rec, 0.0, 100.0).is_none());
        assert!(create_marker_from_data(&rec, 1.0, 0.0).is_none());
    }
}
