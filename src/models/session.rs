// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session state.
//!
//! The [`Session`] owns every loaded image, the active-image index, the tool
//! selection and the interaction-mode flags the surface controller consults.
//! Marker lists are only changed through session methods so that every user
//! edit records an undo snapshot first.

use super::image::{ImageRecord, Jaw, NewImage, SurfaceSnapshot, WorkMode};
use super::marker::Marker;
use super::palette::{MarkerColor, ShapeKind};
use crate::config::Settings;
use crate::io::document::{Document, DocumentImage, DocumentV3, LegacyDocument};
use crate::io::media::{crop_to_data_url, RasterLoader};
use crate::io::serialization::SerializedMarkers;
use crate::util::geometry::Rect;

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolState {
    pub color: MarkerColor,
    pub shape: ShapeKind,
    /// Logarithmic size slider; `0` is natural size.
    pub size_slider: f64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            color: MarkerColor::Blue,
            shape: ShapeKind::Point,
            size_slider: 0.0,
        }
    }
}

/// Interaction flags shared between the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
    pub marking: bool,
    pub drawing: bool,
    pub midline: bool,
    pub cropping: bool,
    pub panning: bool,
}

/// All images and tool state of one annotation session.
#[derive(Debug)]
pub struct Session {
    work_mode: WorkMode,
    images: Vec<ImageRecord>,
    active: Option<usize>,
    container: (f64, f64),
    history_limit: usize,
    /// Set while an undo/redo is applied, to suppress history pushes.
    restoring_history: bool,
    pub tool: ToolState,
    pub modes: ModeFlags,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self {
            work_mode: WorkMode::Panoramic,
            images: Vec::new(),
            active: None,
            container: (
                settings.default_container.width,
                settings.default_container.height,
            ),
            history_limit: settings.effective_history_limit(),
            restoring_history: false,
            tool: ToolState::default(),
            modes: ModeFlags::default(),
        }
    }

    pub fn work_mode(&self) -> WorkMode {
        self.work_mode
    }

    /// Switch work mode. Always discards every image, even for the same mode.
    pub fn set_work_mode(&mut self, mode: WorkMode) {
        log::info!(
            "Work mode set to {:?}, discarding {} images",
            mode,
            self.images.len()
        );
        self.work_mode = mode;
        self.images.clear();
        self.active = None;
        self.modes = ModeFlags::default();
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn image(&self, index: usize) -> Option<&ImageRecord> {
        self.images.get(index)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn current_image(&self) -> Option<&ImageRecord> {
        self.active.and_then(|i| self.images.get(i))
    }

    pub(crate) fn current_image_mut(&mut self) -> Option<&mut ImageRecord> {
        self.active.and_then(|i| self.images.get_mut(i))
    }

    pub fn container(&self) -> (f64, f64) {
        self.container
    }

    /// Add an image, applying the work-mode rules for jaw and calculation
    /// flags. The first image becomes active (its surface is created on the
    /// first [`Session::switch_image`]).
    pub fn add_image(&mut self, image: NewImage) -> usize {
        let position = self.images.len();
        let mut record = ImageRecord::new(image, self.work_mode, self.history_limit);

        match self.work_mode {
            WorkMode::Panoramic => {
                record.used_in_calculations = position == 0;
            }
            WorkMode::Simple => {
                record.jaw = match position {
                    0 => Some(Jaw::Upper),
                    1 => Some(Jaw::Lower),
                    _ => None,
                };
                record.used_in_calculations = position < 2;
                // Additional photos are reference only.
                record.can_mark = position < 2;
            }
        }

        log::info!(
            "Added image {} ({}x{}) at position {}, used in calculations: {}",
            record.id,
            record.natural_width(),
            record.natural_height(),
            position,
            record.used_in_calculations
        );
        self.images.push(record);
        if self.active.is_none() {
            self.active = Some(position);
        }
        position
    }

    /// Remove an image after the user confirms.
    ///
    /// Removing the active image keeps the same index active if it still
    /// exists, otherwise the new last image.
    pub fn remove_image(&mut self, index: usize, confirm: &dyn Confirm) -> bool {
        let Some(image) = self.images.get(index) else {
            return false;
        };
        let message = format!(
            "Remove image \"{}\" and all of its markers?",
            if image.description.is_empty() {
                &image.id
            } else {
                &image.description
            }
        );
        if !confirm.confirm(&message) {
            log::debug!("Removal of image {} cancelled", index);
            return false;
        }

        let removed = self.images.remove(index);
        log::info!(
            "Removed image {} with {} markers",
            removed.id,
            removed.markers().len()
        );

        self.active = match self.active {
            _ if self.images.is_empty() => None,
            Some(a) if a > index => Some(a - 1),
            Some(a) if a == index => Some(a.min(self.images.len() - 1)),
            other => other,
        };
        if self.active.is_some() && self.current_image().is_some_and(|i| i.surface().is_some()) {
            if let Some(img) = self.current_image_mut() {
                if let Some(surface) = img.surface_mut() {
                    surface.visible = true;
                }
            }
            self.sync_mode_flags();
        }
        true
    }

    /// Make `index` the active image.
    ///
    /// The outgoing surface is snapshotted and hidden before anything about
    /// the incoming image is loaded. The incoming surface is created on first
    /// visit, or restored from its snapshot; a snapshot that cannot be read
    /// falls back to reloading the raster. Never fails past the caller:
    /// returns `false` if the image ends up without a surface.
    pub fn switch_image(&mut self, index: usize, loader: &dyn RasterLoader) -> bool {
        if index >= self.images.len() {
            log::warn!("Cannot switch to image {}: only {}", index, self.images.len());
            return false;
        }
        if self.active == Some(index) && self.images[index].surface().is_some() {
            return true;
        }

        if let Some(outgoing) = self.current_image_mut() {
            if let Some(snapshot) = outgoing.snapshot() {
                match snapshot.to_json() {
                    Ok(json) => outgoing.serialized = Some(json),
                    Err(e) => log::warn!("Failed to snapshot image {}: {}", outgoing.id, e),
                }
            }
            if let Some(surface) = outgoing.surface_mut() {
                surface.visible = false;
            }
        }

        self.active = Some(index);
        let container = self.container;
        let image = &mut self.images[index];

        let ready = if image.surface().is_none() {
            load_surface(image, container, loader)
        } else {
            match image.serialized.as_deref().map(SurfaceSnapshot::from_json) {
                Some(Ok(snapshot)) => {
                    image.restore_snapshot(&snapshot);
                    image.fit_into(container)
                }
                Some(Err(e)) => {
                    log::warn!(
                        "Snapshot of image {} is unusable ({}), reloading from source",
                        image.id,
                        e
                    );
                    image.drop_surface();
                    load_surface(image, container, loader)
                }
                None => image.fit_into(container),
            }
        };

        if let Some(surface) = image.surface_mut() {
            surface.visible = true;
        }
        log::info!("Switched to image {} ({})", index, image.id);
        self.sync_mode_flags();
        ready
    }

    /// Re-assert marking/drawing from the active image's flags.
    fn sync_mode_flags(&mut self) {
        let (can_mark, can_draw) = self
            .current_image()
            .map_or((false, false), |i| (i.can_mark, i.can_draw));
        self.modes.marking = can_mark;
        self.modes.drawing = can_draw;
    }

    /// Change the container the active image is fitted into (window resize,
    /// fullscreen). Other images refit when they are switched to.
    pub fn set_container(&mut self, width: f64, height: f64) -> bool {
        if !(width > 0.0 && height > 0.0) {
            return false;
        }
        self.container = (width, height);
        match self.current_image_mut() {
            Some(image) if image.surface().is_some() => image.fit_into((width, height)),
            _ => false,
        }
    }

    /// Record an undo snapshot of the active image's markers.
    pub fn push_history(&mut self) {
        if self.restoring_history {
            return;
        }
        if let Some(image) = self.current_image_mut() {
            let snapshot = image.serialize_markers();
            image.history_mut().push(snapshot);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current_image().is_some_and(|i| i.history().can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.current_image().is_some_and(|i| i.history().can_redo())
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(|history, current| history.undo(current))
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(|history, current| history.redo(current))
    }

    fn step_history(
        &mut self,
        step: impl FnOnce(
            &mut super::history::History<SerializedMarkers>,
            SerializedMarkers,
        ) -> Option<SerializedMarkers>,
    ) -> bool {
        self.restoring_history = true;
        let applied = match self.current_image_mut() {
            Some(image) => {
                let current = image.serialize_markers();
                match step(image.history_mut(), current) {
                    Some(saved) => {
                        image.restore_markers(&saved);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };
        self.restoring_history = false;
        applied
    }

    pub fn is_restoring_history(&self) -> bool {
        self.restoring_history
    }

    /// Add a marker to the active image, recording history first.
    pub fn add_marker(&mut self, marker: Marker) -> Option<usize> {
        self.current_image()?;
        self.push_history();
        let image = self.current_image_mut()?;
        let index = image.push_marker(marker);
        log::debug!(
            "Added {} marker, total: {}",
            image.markers()[index].marker_type,
            image.markers().len()
        );
        Some(index)
    }

    /// Remove one marker from the active image, recording history first.
    pub fn remove_marker(&mut self, index: usize) -> Option<Marker> {
        if index >= self.current_image()?.markers().len() {
            return None;
        }
        self.push_history();
        self.current_image_mut()?.take_marker(index)
    }

    /// Remove several markers as one undo step. Returns how many were removed.
    pub fn remove_markers(&mut self, indices: &[usize]) -> usize {
        let Some(len) = self.current_image().map(|i| i.markers().len()) else {
            return 0;
        };
        let mut sorted: Vec<usize> = indices.iter().copied().filter(|&i| i < len).collect();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() {
            return 0;
        }

        self.push_history();
        let Some(image) = self.current_image_mut() else {
            return 0;
        };
        sorted
            .into_iter()
            .rev()
            .filter_map(|i| image.take_marker(i))
            .count()
    }

    /// Mutate one marker in place without recording history (drag ticks).
    /// Call [`Session::push_history`] once when the gesture starts.
    pub fn with_marker_mut<R>(&mut self, index: usize, f: impl FnOnce(&mut Marker) -> R) -> Option<R> {
        let image = self.current_image_mut()?;
        image.markers_mut().get_mut(index).map(f)
    }

    /// Crop the active image to a rectangle in surface pixels.
    ///
    /// The raster is re-encoded through the loader, markers are moved into
    /// the cropped frame (those whose center falls outside are dropped), and
    /// the surface is refitted. The image's history is cleared: older
    /// snapshots belong to the uncropped raster.
    pub fn apply_crop(&mut self, rect: Rect, loader: &dyn RasterLoader) -> bool {
        let container = self.container;
        let Some(image) = self.current_image() else {
            return false;
        };
        let Some(surface) = image.surface() else {
            return false;
        };
        let bounds = surface.bounds();
        let rect = Rect::new(
            rect.x.max(0.0),
            rect.y.max(0.0),
            rect.width.min(bounds.width - rect.x.max(0.0)),
            rect.height.min(bounds.height - rect.y.max(0.0)),
        );
        if rect.width < 1.0 || rect.height < 1.0 {
            log::warn!("Ignoring degenerate crop {:?}", rect);
            return false;
        }

        let to_native = image.natural_width() as f64 / surface.width;
        let (nx, ny) = ((rect.x * to_native).round(), (rect.y * to_native).round());
        let nw = (rect.width * to_native)
            .round()
            .min(image.natural_width() as f64 - nx);
        let nh = (rect.height * to_native)
            .round()
            .min(image.natural_height() as f64 - ny);
        let cropped = crop_to_data_url(
            loader,
            &image.image_url,
            nx as u32,
            ny as u32,
            nw as u32,
            nh as u32,
        );
        let (url, width, height) = match cropped {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Crop of image {} failed: {}", image.id, e);
                return false;
            }
        };
        let midline_y = image.midline_fraction().map(|_| image.midline_y());

        let Some(image) = self.current_image_mut() else {
            return false;
        };

        let kept: Vec<Marker> = image
            .markers()
            .iter()
            .filter(|m| rect.contains(m.center()))
            .cloned()
            .map(|mut m| {
                m.translate(-rect.x, -rect.y);
                m
            })
            .collect();
        image.replace_markers(kept);
        if let Some(surface) = image.surface_mut() {
            surface.width = rect.width;
            surface.height = rect.height;
        }
        image.set_natural_size(width, height);
        image.image_url = url;
        image.serialized = None;
        image.history_mut().clear();
        image.set_midline_fraction(midline_y.map(|y| (y - rect.y) / rect.height));
        log::info!("Cropped image {} to {}x{}", image.id, width, height);
        image.fit_into(container)
    }

    /// Build a v3 document of the whole session.
    pub fn to_document(&self) -> DocumentV3 {
        DocumentV3 {
            images: self
                .images
                .iter()
                .map(|image| {
                    let markers = image.serialize_markers();
                    DocumentImage {
                        id: image.id.clone(),
                        image_url: image.image_url.clone(),
                        description: image.description.clone(),
                        jaw: image.jaw,
                        can_mark: image.can_mark,
                        can_draw: image.can_draw,
                        kind: image.kind,
                        items: markers.items,
                        meta: markers.meta,
                    }
                })
                .collect(),
            active_image_index: self.active.unwrap_or(0),
            work_mode: self.work_mode,
        }
    }

    /// Load a decoded document. Returns `false` (state unchanged) if there is
    /// nothing to apply it to.
    pub fn load_document(&mut self, doc: &Document, loader: &dyn RasterLoader) -> bool {
        match doc {
            Document::Current(doc) => self.load_v3(doc, loader),
            Document::Legacy(doc) => self.load_legacy(doc),
        }
    }

    fn load_v3(&mut self, doc: &DocumentV3, loader: &dyn RasterLoader) -> bool {
        self.set_work_mode(doc.work_mode);

        for entry in &doc.images {
            let natural = native_size(entry, loader);
            let index = self.add_image(NewImage {
                image_url: entry.image_url.clone(),
                description: entry.description.clone(),
                natural_size: natural,
            });
            let image = &mut self.images[index];
            image.id = entry.id.clone();
            image.jaw = entry.jaw;
            image.can_mark = entry.can_mark;
            image.can_draw = entry.can_draw;
            image.kind = entry.kind;

            // Held at natural size until the image is shown.
            let markers = entry.markers();
            image.set_midline_fraction(markers.midline_fraction());
            image.restore_markers(&markers);
        }

        log::info!(
            "Loaded v3 document with {} images",
            self.images.len()
        );
        if self.images.is_empty() {
            return true;
        }
        let active = doc.active_image_index.min(self.images.len() - 1);
        self.active = None;
        self.switch_image(active, loader);
        true
    }

    fn load_legacy(&mut self, doc: &LegacyDocument) -> bool {
        let Some(image) = self.current_image() else {
            log::warn!("Legacy document needs an active image, ignoring");
            return false;
        };
        let (w, h) = image.space();
        let Some(scale) = doc.markers.scale_for(w) else {
            log::warn!("Legacy document has unusable meta {:?}", doc.markers.meta);
            return false;
        };

        self.push_history();
        let Some(image) = self.current_image_mut() else {
            return false;
        };
        let markers: Vec<Marker> = doc
            .markers
            .items
            .iter()
            .filter_map(|r| crate::io::serialization::create_marker_from_data(r, scale, h))
            .collect();
        log::info!(
            "Loaded {} of {} legacy markers into image {}",
            markers.len(),
            doc.markers.items.len(),
            image.id
        );
        image.replace_markers(markers);
        if let Some(mid) = doc.markers.midline_fraction() {
            image.set_midline_fraction(Some(mid));
        }
        true
    }
}

/// Native size of a document image: its meta, else the raster itself.
fn native_size(entry: &DocumentImage, loader: &dyn RasterLoader) -> (u32, u32) {
    let (w, h) = (entry.meta.w.round(), entry.meta.h.round());
    if w >= 1.0 && h >= 1.0 {
        return (w as u32, h as u32);
    }
    loader.dimensions(&entry.image_url).unwrap_or_else(|e| {
        log::warn!("Cannot size image {}: {}", entry.id, e);
        (0, 0)
    })
}

/// Create an image's surface from its raster and fit it.
fn load_surface(
    image: &mut ImageRecord,
    container: (f64, f64),
    loader: &dyn RasterLoader,
) -> bool {
    match loader.dimensions(&image.image_url) {
        Ok((w, h)) => {
            if (w, h) != (image.natural_width(), image.natural_height()) {
                log::debug!("Image {} decodes at {}x{}", image.id, w, h);
                image.set_natural_size(w, h);
            }
        }
        Err(e) => {
            log::warn!("Failed to load image {}: {}", image.id, e);
        }
    }
    image.fit_into(container)
}
