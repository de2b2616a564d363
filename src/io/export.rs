// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattened exports.
//!
//! Each image is rendered at its native resolution with its markers baked
//! in. Markers are rebuilt from their native-pixel records, so the result
//! does not depend on the size the surface had while editing.

use super::media::{MediaError, RasterLoader};
use crate::models::calculation::{counts_for_calculation, jaw_splits_for_calculation};
use crate::models::image::{ImageRecord, Jaw};
use crate::models::marker::{Geometry, GlyphKind, Marker, Point};
use crate::models::session::Session;
use crate::util::geometry::hex_to_rgba;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_ellipse_mut, draw_polygon_mut,
};
use imageproc::rect::Rect as PixelRect;
use std::fmt::Write as _;
use std::path::Path;

/// One rendered image ready for a report page.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub id: String,
    pub description: String,
    pub jaw: Option<Jaw>,
    pub pixels: RgbaImage,
}

/// Render one image with its markers at native resolution.
pub fn render_image_for_export(
    record: &ImageRecord,
    loader: &dyn RasterLoader,
) -> Result<RgbaImage, MediaError> {
    let mut canvas = loader.load(&record.image_url)?.pixels;
    let (w, h) = (canvas.width() as f64, canvas.height() as f64);

    let markers = record.serialize_markers().restore(w, h);
    if markers.len() != record.markers().len() {
        log::warn!(
            "Export of {} dropped {} markers",
            record.id,
            record.markers().len() - markers.len()
        );
    }
    for marker in &markers {
        draw_marker(&mut canvas, marker);
    }
    Ok(canvas)
}

/// Render every image in order. An image that fails is left out.
pub fn get_all_images_for_export(
    session: &Session,
    loader: &dyn RasterLoader,
) -> Vec<ExportedImage> {
    session
        .images()
        .iter()
        .filter_map(|record| match render_image_for_export(record, loader) {
            Ok(pixels) => Some(ExportedImage {
                id: record.id.clone(),
                description: record.description.clone(),
                jaw: record.jaw,
                pixels,
            }),
            Err(e) => {
                log::warn!("Skipping image {} in export: {}", record.id, e);
                None
            }
        })
        .collect()
}

/// Write a rendered image as PNG.
pub fn write_png(pixels: &RgbaImage, path: &Path) -> Result<(), MediaError> {
    pixels.save_with_format(path, ImageFormat::Png)?;
    log::info!("Wrote {}x{} PNG to {:?}", pixels.width(), pixels.height(), path);
    Ok(())
}

/// Plain-text summary of marker counts for the TXT report.
pub fn marker_summary_text(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Work mode: {:?}", session.work_mode());
    let _ = writeln!(out, "Images: {}", session.images().len());

    for (i, image) in session.images().iter().enumerate() {
        let label = if image.description.is_empty() {
            image.id.as_str()
        } else {
            image.description.as_str()
        };
        let jaw = match image.jaw {
            Some(Jaw::Upper) => " [upper]",
            Some(Jaw::Lower) => " [lower]",
            None => "",
        };
        let _ = writeln!(
            out,
            "{}. {}{}: {} markers{}",
            i + 1,
            label,
            jaw,
            image.markers().len(),
            if image.used_in_calculations {
                ""
            } else {
                " (reference)"
            }
        );
    }

    let _ = writeln!(out, "\nCounts:");
    for (marker_type, count) in counts_for_calculation(session) {
        if count > 0 {
            let _ = writeln!(out, "  {}: {}", marker_type, count);
        }
    }

    let _ = writeln!(out, "\nJaw presence:");
    for (color, split) in jaw_splits_for_calculation(session) {
        if split.top_units + split.bottom_units > 0 {
            let _ = writeln!(
                out,
                "  {}: top {}, bottom {}",
                color.name(),
                split.top_units,
                split.bottom_units
            );
        }
    }
    out
}

fn marker_color(marker: &Marker) -> Rgba<u8> {
    Rgba(hex_to_rgba(marker.marker_type.color.hex(), 1.0).unwrap_or([255, 0, 0, 255]))
}

fn draw_marker(canvas: &mut RgbaImage, marker: &Marker) {
    let color = marker_color(marker);
    match &marker.geometry {
        Geometry::Point { center, radius } => {
            draw_filled_circle_mut(canvas, px(*center), radius.round().max(1.0) as i32, color);
        }
        Geometry::Cross {
            center,
            half_size,
            stroke_width,
        } => {
            let d = half_size / std::f64::consts::SQRT_2;
            let (c, sw) = (*center, *stroke_width);
            draw_thick_line(canvas, offset(c, -d, -d), offset(c, d, d), sw, color);
            draw_thick_line(canvas, offset(c, -d, d), offset(c, d, -d), sw, color);
        }
        Geometry::Line {
            start,
            end,
            stroke_width,
        } => draw_thick_line(canvas, *start, *end, *stroke_width, color),
        Geometry::Oval {
            center,
            rx,
            ry,
            stroke_width,
            ..
        } => {
            // Concentric rings across the stroke width.
            let rings = stroke_width.round().max(1.0) as i32;
            let (rx, ry) = (rx.round() as i32, ry.round() as i32);
            for i in 0..rings {
                let d = i - rings / 2;
                if rx + d > 0 && ry + d > 0 {
                    draw_hollow_ellipse_mut(canvas, px(*center), rx + d, ry + d, color);
                }
            }
        }
        Geometry::Glyph {
            kind,
            center,
            font_size,
        } => draw_glyph(canvas, *kind, *center, *font_size, color),
        Geometry::Freehand { stroke_width, .. } => {
            let points = marker.stroke_points();
            for pair in points.windows(2) {
                draw_thick_line(canvas, pair[0], pair[1], *stroke_width, color);
            }
        }
    }
}

/// Glyphs are drawn as strokes so export does not need a font.
fn draw_glyph(canvas: &mut RgbaImage, kind: GlyphKind, center: Point, size: f64, color: Rgba<u8>) {
    let stroke = (size * 0.12).max(1.0);
    let dot = px(offset(center, 0.0, size * 0.38));
    let dot_radius = (stroke * 0.6).round().max(1.0) as i32;
    match kind {
        GlyphKind::Exclamation => {
            draw_thick_line(
                canvas,
                offset(center, 0.0, -size * 0.4),
                offset(center, 0.0, size * 0.2),
                stroke,
                color,
            );
        }
        GlyphKind::Question => {
            let r = size * 0.2;
            let hook = offset(center, 0.0, -size * 0.2);
            let arc: Vec<Point> = (0..=8)
                .map(|i| {
                    let a = std::f64::consts::PI * (1.0 + i as f64 / 6.0);
                    offset(hook, r * a.cos(), r * a.sin())
                })
                .collect();
            for pair in arc.windows(2) {
                draw_thick_line(canvas, pair[0], pair[1], stroke, color);
            }
            if let Some(&tail) = arc.last() {
                draw_thick_line(canvas, tail, offset(center, 0.0, size * 0.2), stroke, color);
            }
        }
    }
    draw_filled_circle_mut(canvas, dot, dot_radius, color);
}

/// Segment of the given width as a filled quad with round caps.
fn draw_thick_line(canvas: &mut RgbaImage, a: Point, b: Point, width: f64, color: Rgba<u8>) {
    let half = (width / 2.0).max(0.5);
    let cap = half.round().max(1.0) as i32;
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = (dx * dx + dy * dy).sqrt();

    let corners: Vec<imageproc::point::Point<i32>> = if len > f64::EPSILON {
        let (nx, ny) = (-dy / len * half, dx / len * half);
        [
            offset(a, nx, ny),
            offset(b, nx, ny),
            offset(b, -nx, -ny),
            offset(a, -nx, -ny),
        ]
        .iter()
        .map(|p| imageproc::point::Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
    } else {
        Vec::new()
    };

    // draw_polygon_mut rejects closed or collapsed outlines.
    let distinct = corners.len() == 4 && corners[0] != corners[3] && corners[0] != corners[1];
    if distinct {
        draw_polygon_mut(canvas, &corners, color);
    } else if len > f64::EPSILON {
        let (x0, y0) = (a.x.min(b.x), a.y.min(b.y));
        let rect = PixelRect::at(x0.round() as i32, y0.round() as i32)
            .of_size(dx.abs().round().max(1.0) as u32, dy.abs().round().max(1.0) as u32);
        draw_filled_rect_mut(canvas, rect, color);
    }
    draw_filled_circle_mut(canvas, px(a), cap, color);
    draw_filled_circle_mut(canvas, px(b), cap, color);
}

fn offset(p: Point, dx: f64, dy: f64) -> Point {
    Point::new(p.x + dx, p.y + dy)
}

fn px(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}
