// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker size and rescale engine.
//!
//! Every marker carries its dimensions as fractions of the surface height
//! (see [`NormalizedForm`]). On-surface geometry is always
//! `fraction × height × scale_factor`, so a marker keeps its relative size
//! through container resizes, fullscreen transitions and crops.
//!
//! The size control is logarithmic: slider value `s` means a multiplier of
//! `2^s`, with `0` as natural size.

use super::marker::{AbsoluteSize, Geometry, Marker, NormalizedForm};
use crate::util::geometry::slider_to_multiplier;

/// Sanitize a stored multiplier; anything non-finite or non-positive is 1.
pub fn sanitize_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    }
}

/// Capture the normalized form of geometry drawn at `height` with a size
/// multiplier already applied.
pub fn capture_normalized(
    geometry: &Geometry,
    height: f64,
    multiplier: f64,
) -> Option<NormalizedForm> {
    if !(height.is_finite() && height > 0.0) {
        return None;
    }
    let mut form = NormalizedForm {
        scale_factor: sanitize_multiplier(multiplier),
        ..NormalizedForm::default()
    };
    fill_missing(&mut form, geometry, height);
    Some(form)
}

/// Fill any fraction the shape needs but the form lacks, from the current
/// geometry. The current scale factor is divided out so the captured value is
/// the natural size.
fn fill_missing(form: &mut NormalizedForm, geometry: &Geometry, height: f64) {
    let base = height * sanitize_multiplier(form.scale_factor);
    let frac = |v: f64| v / base;

    match geometry {
        Geometry::Point { radius, .. } => {
            form.radius.get_or_insert(frac(*radius));
        }
        Geometry::Cross {
            half_size,
            stroke_width,
            ..
        } => {
            form.radius.get_or_insert(frac(*half_size));
            form.stroke_width.get_or_insert(frac(*stroke_width));
        }
        Geometry::Line { stroke_width, .. } | Geometry::Freehand { stroke_width, .. } => {
            form.stroke_width.get_or_insert(frac(*stroke_width));
        }
        Geometry::Oval {
            rx,
            ry,
            stroke_width,
            ..
        } => {
            form.rx.get_or_insert(frac(*rx));
            form.ry.get_or_insert(frac(*ry));
            form.stroke_width.get_or_insert(frac(*stroke_width));
        }
        Geometry::Glyph { font_size, .. } => {
            form.font_size.get_or_insert(frac(*font_size));
        }
    }
}

/// Set a marker's size from the slider and re-derive its geometry.
///
/// Returns `false` (and leaves the marker untouched) for a non-positive
/// height or a non-finite slider value. A manually scaled oval keeps its
/// hand-set size; only its coordinates are re-asserted.
pub fn apply_size_by_slider(marker: &mut Marker, slider: f64, height: f64) -> bool {
    if !(height.is_finite() && height > 0.0) || !slider.is_finite() {
        log::debug!("Ignoring size change: height {}, slider {}", height, slider);
        return false;
    }

    let geometry = marker.geometry.clone();
    fill_missing(&mut marker.normalized, &geometry, height);

    if marker.manually_scaled() {
        reassert_manual_oval(marker);
        return true;
    }

    let factor = slider_to_multiplier(slider);
    marker.normalized.scale_factor = factor;
    marker.last_size_multiplier = factor;
    derive_geometry(marker, height);
    true
}

/// Re-derive geometry from the stored fractions at a new surface height.
///
/// Positions are not touched here; the caller scales those with the surface.
pub fn rescale_marker(marker: &mut Marker, height: f64) -> bool {
    if !(height.is_finite() && height > 0.0) {
        return false;
    }
    if marker.manually_scaled() {
        reassert_manual_oval(marker);
    } else {
        derive_geometry(marker, height);
    }
    true
}

/// Freeze an oval at a hand-set size. No-op for other shapes.
pub fn mark_manually_scaled(marker: &mut Marker, rx: f64, ry: f64, stroke_width: f64) -> bool {
    match &mut marker.geometry {
        Geometry::Oval {
            rx: cur_rx,
            ry: cur_ry,
            stroke_width: cur_sw,
            manual,
            ..
        } => {
            *manual = Some(AbsoluteSize {
                rx,
                ry,
                stroke_width,
            });
            *cur_rx = rx;
            *cur_ry = ry;
            *cur_sw = stroke_width;
            true
        }
        _ => false,
    }
}

fn reassert_manual_oval(marker: &mut Marker) {
    if let Geometry::Oval {
        rx,
        ry,
        stroke_width,
        manual: Some(abs),
        ..
    } = &mut marker.geometry
    {
        *rx = abs.rx;
        *ry = abs.ry;
        *stroke_width = abs.stroke_width;
    }
}

fn derive_geometry(marker: &mut Marker, height: f64) {
    let form = marker.normalized;
    let k = height * form.scale_factor.max(0.0);
    let set = |target: &mut f64, fraction: Option<f64>| {
        if let Some(f) = fraction {
            *target = f * k;
        }
    };

    match &mut marker.geometry {
        Geometry::Point { radius, .. } => set(radius, form.radius),
        Geometry::Cross {
            half_size,
            stroke_width,
            ..
        } => {
            set(half_size, form.radius);
            set(stroke_width, form.stroke_width);
        }
        Geometry::Line { stroke_width, .. } | Geometry::Freehand { stroke_width, .. } => {
            set(stroke_width, form.stroke_width)
        }
        // Center is stored directly, so it survives rx/ry changing independently.
        Geometry::Oval {
            rx,
            ry,
            stroke_width,
            ..
        } => {
            set(rx, form.rx);
            set(ry, form.ry);
            set(stroke_width, form.stroke_width);
        }
        Geometry::Glyph { font_size, .. } => set(font_size, form.font_size),
    }
}
