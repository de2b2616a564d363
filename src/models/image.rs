// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Loaded images and their drawing surfaces.
//!
//! An [`ImageRecord`] owns its marker list, its undo history and (once it has
//! been shown) a dedicated [`Surface`]. Marker geometry is always expressed in
//! the record's current pixel space: the surface size once the surface exists,
//! the raster's natural size before that.

use super::history::History;
use super::marker::{Marker, Point};
use super::scale;
use crate::io::serialization::{serialize_image_markers, SerializedMarkers};
use crate::util::geometry::{fit_to_container, FitGeometry, Rect};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How images participate in the cost calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkMode {
    /// One panoramic photo carries every marker.
    Panoramic,
    /// One photo per jaw.
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jaw {
    Upper,
    Lower,
}

/// Input for adding an image: an already corrected raster and its size.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub image_url: String,
    pub description: String,
    pub natural_size: (u32, u32),
}

/// Drawing area bound to one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    /// View zoom; does not affect marker coordinates.
    pub zoom: f64,
    /// View offset in screen pixels.
    pub pan: Point,
    pub visible: bool,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            zoom: 1.0,
            pan: Point::default(),
            visible: true,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn screen_to_surface(&self, p: Point) -> Point {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        Point::new((p.x - self.pan.x) / zoom, (p.y - self.pan.y) / zoom)
    }

    pub fn surface_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }
}

/// Full surface state saved when an image is switched away from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSnapshot {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub pan: Point,
    pub markers: SerializedMarkers,
}

impl SurfaceSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: SurfaceSnapshot = serde_json::from_str(json)?;
        if !(snapshot.width > 0.0 && snapshot.height > 0.0) {
            anyhow::bail!(
                "snapshot has degenerate size {}x{}",
                snapshot.width,
                snapshot.height
            );
        }
        Ok(snapshot)
    }
}

/// One loaded dental photo with its own markers and surface.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: String,
    pub image_url: String,
    pub description: String,
    pub jaw: Option<Jaw>,
    /// Work mode at creation time (`type` on the wire).
    pub kind: WorkMode,
    /// Typed markers may be added or edited.
    pub can_mark: bool,
    /// Freehand strokes may be drawn.
    pub can_draw: bool,
    pub used_in_calculations: bool,
    /// Last full-surface snapshot, JSON.
    pub serialized: Option<String>,
    pub fit: FitGeometry,
    natural_width: u32,
    natural_height: u32,
    markers: Vec<Marker>,
    surface: Option<Surface>,
    /// Midline Y as a fraction of image height.
    midline: Option<f64>,
    history: History<SerializedMarkers>,
}

impl ImageRecord {
    pub fn new(image: NewImage, kind: WorkMode, history_limit: usize) -> Self {
        Self {
            id: generate_image_id(),
            image_url: image.image_url,
            description: image.description,
            jaw: None,
            kind,
            can_mark: true,
            can_draw: true,
            used_in_calculations: false,
            serialized: None,
            fit: FitGeometry::default(),
            natural_width: image.natural_size.0,
            natural_height: image.natural_size.1,
            markers: Vec::new(),
            surface: None,
            midline: None,
            history: History::new(history_limit),
        }
    }

    pub fn natural_width(&self) -> u32 {
        self.natural_width
    }

    pub fn natural_height(&self) -> u32 {
        self.natural_height
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub(crate) fn markers_mut(&mut self) -> &mut [Marker] {
        &mut self.markers
    }

    /// Append without recording history. Callers that act for the user go
    /// through the session, which records history first.
    pub(crate) fn push_marker(&mut self, marker: Marker) -> usize {
        self.markers.push(marker);
        self.markers.len() - 1
    }

    pub(crate) fn take_marker(&mut self, index: usize) -> Option<Marker> {
        (index < self.markers.len()).then(|| self.markers.remove(index))
    }

    pub(crate) fn replace_markers(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub(crate) fn surface_mut(&mut self) -> Option<&mut Surface> {
        self.surface.as_mut()
    }

    /// Current pixel space of the marker geometry.
    pub fn space(&self) -> (f64, f64) {
        match &self.surface {
            Some(s) => (s.width, s.height),
            None => (self.natural_width as f64, self.natural_height as f64),
        }
    }

    pub fn midline_fraction(&self) -> Option<f64> {
        self.midline
    }

    /// Midline Y in current pixels; defaults to the vertical center.
    pub fn midline_y(&self) -> f64 {
        let (_, h) = self.space();
        self.midline.unwrap_or(0.5) * h
    }

    pub fn set_midline_fraction(&mut self, fraction: Option<f64>) {
        self.midline = fraction.map(|f| f.clamp(0.0, 1.0));
    }

    /// Place the midline at a Y in current pixels.
    pub fn set_midline_y(&mut self, y: f64) {
        let (_, h) = self.space();
        if h > 0.0 {
            self.midline = Some((y / h).clamp(0.0, 1.0));
        }
    }

    pub(crate) fn history(&self) -> &History<SerializedMarkers> {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut History<SerializedMarkers> {
        &mut self.history
    }

    /// Markers in native pixel space, for history and snapshots.
    pub fn serialize_markers(&self) -> SerializedMarkers {
        let (w, h) = self.space();
        serialize_image_markers(self, w, h)
    }

    /// Rebuild markers from native-space records at the current size.
    pub(crate) fn restore_markers(&mut self, saved: &SerializedMarkers) {
        let (w, h) = self.space();
        self.markers = saved.restore(w, h);
    }

    /// Snapshot the whole surface. `None` until the surface exists.
    pub fn snapshot(&self) -> Option<SurfaceSnapshot> {
        let surface = self.surface.as_ref()?;
        Some(SurfaceSnapshot {
            width: surface.width,
            height: surface.height,
            zoom: surface.zoom,
            pan: surface.pan,
            markers: self.serialize_markers(),
        })
    }

    /// Restore a snapshot taken by [`ImageRecord::snapshot`].
    pub(crate) fn restore_snapshot(&mut self, snapshot: &SurfaceSnapshot) {
        let mut surface = Surface::new(snapshot.width, snapshot.height);
        surface.zoom = snapshot.zoom;
        surface.pan = snapshot.pan;
        self.surface = Some(surface);
        self.markers = snapshot.markers.restore(snapshot.width, snapshot.height);
        if let Some(mid) = snapshot.markers.midline_fraction() {
            self.midline = Some(mid);
        }
    }

    /// Create the dedicated surface at natural size. Returns `false` if the
    /// natural size is unknown.
    pub(crate) fn create_surface(&mut self) -> bool {
        if self.natural_width == 0 || self.natural_height == 0 {
            return false;
        }
        self.surface = Some(Surface::new(
            self.natural_width as f64,
            self.natural_height as f64,
        ));
        true
    }

    pub(crate) fn drop_surface(&mut self) {
        let (w, h) = (self.natural_width as f64, self.natural_height as f64);
        if self.surface.is_some() && w > 0.0 && h > 0.0 {
            self.resize_surface(w, h);
        }
        self.surface = None;
    }

    /// Update the natural raster size (after a reload or crop). Markers are
    /// carried over proportionally when no surface exists yet.
    pub(crate) fn set_natural_size(&mut self, width: u32, height: u32) {
        if self.surface.is_none() && self.natural_width > 0 && self.natural_height > 0 {
            let sx = width as f64 / self.natural_width as f64;
            let sy = height as f64 / self.natural_height as f64;
            for m in &mut self.markers {
                m.scale_positions(sx, sy);
                scale::rescale_marker(m, height as f64);
            }
        }
        self.natural_width = width;
        self.natural_height = height;
    }

    /// Resize the surface, carrying marker positions and sizes along.
    ///
    /// Returns `false` for a degenerate size or a missing surface.
    pub fn resize_surface(&mut self, width: f64, height: f64) -> bool {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            log::warn!("Ignoring resize of image {} to {}x{}", self.id, width, height);
            return false;
        }
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if surface.width <= 0.0 || surface.height <= 0.0 {
            surface.width = width;
            surface.height = height;
            return true;
        }

        let sx = width / surface.width;
        let sy = height / surface.height;
        surface.width = width;
        surface.height = height;

        for m in &mut self.markers {
            m.scale_positions(sx, sy);
            scale::rescale_marker(m, height);
        }
        log::debug!(
            "Resized surface of {} to {:.1}x{:.1} ({} markers)",
            self.id,
            width,
            height,
            self.markers.len()
        );
        true
    }

    /// Fit the surface into a container, creating it if needed.
    pub fn fit_into(&mut self, container: (f64, f64)) -> bool {
        let Some(fit) = fit_to_container((self.natural_width, self.natural_height), container)
        else {
            log::warn!(
                "Cannot fit image {} ({}x{}) into {:?}",
                self.id,
                self.natural_width,
                self.natural_height,
                container
            );
            return false;
        };
        if self.surface.is_none() && !self.create_surface() {
            return false;
        }
        self.fit = fit;
        self.resize_surface(fit.target_w, fit.target_h)
    }
}

/// Unique image id backed by a random UUID.
pub fn generate_image_id() -> String {
    format!("img_{}", Uuid::new_v4().simple())
}
