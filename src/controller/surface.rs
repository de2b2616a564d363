// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer handling for the active surface.
//!
//! The controller turns pointer events (already converted to surface
//! coordinates) into session edits. Interaction modes are mutually exclusive:
//! entering one suppresses marker creation and the other gestures.

use super::crop::CropController;
use super::midline::MidlineController;
use crate::config::Settings;
use crate::io::media::RasterLoader;
use crate::models::factory::{LineDraft, MarkerFactory};
use crate::models::marker::{Geometry, Point};
use crate::models::palette::ShapeKind;
use crate::models::scale;
use crate::models::session::Session;
use crate::util::debounce::{Debouncer, MinInterval};
use crate::util::geometry::clamp;
use std::time::{Duration, Instant};

/// Hit-test slack in surface pixels.
pub const HIT_TOLERANCE: f64 = 4.0;

/// Zoom limits for the view transform.
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Marking,
    MidlineAdjust,
    Cropping,
    Panning,
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    /// A marker was added at this index.
    Created(usize),
    /// A line or freehand gesture is in progress.
    Drafting,
    Selected(usize),
    Deselected,
    Moved,
    Adjusted,
}

#[derive(Debug, Clone)]
enum Gesture {
    Line(LineDraft),
    Freehand(Vec<Point>),
    Move { index: usize, last: Point, recorded: bool },
    Pan { last: Point },
    Midline,
    Crop,
}

#[derive(Debug)]
pub struct SurfaceController {
    factory: MarkerFactory,
    creation_gate: MinInterval,
    resize: Debouncer<(f64, f64)>,
    gesture: Option<Gesture>,
    selection: Vec<usize>,
    delete_enabled: bool,
    preview: Option<(Point, Point)>,
    preview_dirty: bool,
    pub crop: CropController,
    pub midline: MidlineController,
}

impl SurfaceController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            factory: MarkerFactory::new(settings),
            creation_gate: MinInterval::new(Duration::from_millis(settings.marker_debounce_ms)),
            resize: Debouncer::new(Duration::from_millis(settings.resize_debounce_ms)),
            gesture: None,
            selection: Vec::new(),
            delete_enabled: false,
            preview: None,
            preview_dirty: false,
            crop: CropController::default(),
            midline: MidlineController::default(),
        }
    }

    pub fn mode(session: &Session) -> Mode {
        let m = session.modes;
        if m.cropping {
            Mode::Cropping
        } else if m.midline {
            Mode::MidlineAdjust
        } else if m.panning {
            Mode::Panning
        } else if m.marking || m.drawing {
            Mode::Marking
        } else {
            Mode::Idle
        }
    }

    /// Switch interaction mode. Leaving cropping discards the crop rectangle;
    /// use [`SurfaceController::apply_crop`] to keep it.
    pub fn set_mode(&mut self, session: &mut Session, mode: Mode) {
        self.gesture = None;
        self.preview = None;
        self.midline.pointer_up();
        if mode != Mode::Cropping {
            self.crop.cancel();
        }

        let (can_mark, can_draw) = session
            .current_image()
            .map_or((false, false), |i| (i.can_mark, i.can_draw));
        let modes = &mut session.modes;
        modes.marking = mode == Mode::Marking && can_mark;
        modes.drawing = mode == Mode::Marking && can_draw;
        modes.midline = mode == Mode::MidlineAdjust;
        modes.cropping = mode == Mode::Cropping;
        modes.panning = mode == Mode::Panning;

        if mode == Mode::Cropping {
            match session.current_image().and_then(|i| i.surface()) {
                Some(surface) => self.crop.begin(&surface.bounds()),
                None => session.modes.cropping = false,
            }
        }
        log::debug!("Surface mode: {:?}", Self::mode(session));
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    pub fn delete_enabled(&self) -> bool {
        self.delete_enabled
    }

    fn refresh_delete_enabled(&mut self, session: &Session) {
        let len = session.current_image().map_or(0, |i| i.markers().len());
        self.selection.retain(|&i| i < len);
        self.delete_enabled = !self.selection.is_empty();
    }

    pub fn select(&mut self, session: &Session, indices: &[usize]) {
        self.selection = indices.to_vec();
        self.selection.sort_unstable();
        self.selection.dedup();
        self.refresh_delete_enabled(session);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.delete_enabled = false;
    }

    /// Topmost marker under `p`.
    pub fn hit(session: &Session, p: Point) -> Option<usize> {
        let image = session.current_image()?;
        image
            .markers()
            .iter()
            .rposition(|m| m.hit_test(p, HIT_TOLERANCE))
    }

    pub fn pointer_down(&mut self, session: &mut Session, p: Point, now: Instant) -> PointerOutcome {
        let Some(image) = session.current_image() else {
            return PointerOutcome::Ignored;
        };
        let Some(surface) = image.surface() else {
            return PointerOutcome::Ignored;
        };
        let height = surface.height;
        let modes = session.modes;

        if modes.cropping {
            if self.crop.pointer_down(p) {
                self.gesture = Some(Gesture::Crop);
                return PointerOutcome::Adjusted;
            }
            return PointerOutcome::Ignored;
        }
        if modes.midline {
            if let Some(image) = session.current_image_mut() {
                self.midline.pointer_down(image, p);
                self.gesture = Some(Gesture::Midline);
                return PointerOutcome::Adjusted;
            }
            return PointerOutcome::Ignored;
        }
        if modes.panning {
            self.gesture = Some(Gesture::Pan { last: p });
            return PointerOutcome::Ignored;
        }

        let tool = session.tool;
        if tool.shape == ShapeKind::Freehand {
            if modes.drawing {
                self.gesture = Some(Gesture::Freehand(vec![p]));
                return PointerOutcome::Drafting;
            }
        } else if modes.marking {
            if !self.creation_gate.ready(now) {
                log::debug!("Marker creation debounced");
                return PointerOutcome::Ignored;
            }
            if tool.shape == ShapeKind::Line {
                return match self.factory.begin_line(tool.color, p, height) {
                    Some(draft) => {
                        self.preview = Some((draft.start(), draft.end()));
                        self.preview_dirty = true;
                        self.gesture = Some(Gesture::Line(draft));
                        PointerOutcome::Drafting
                    }
                    None => PointerOutcome::Ignored,
                };
            }
            let Some(mut marker) = self.factory.create(tool.shape, tool.color, p, height) else {
                return PointerOutcome::Ignored;
            };
            if tool.size_slider != 0.0 {
                scale::apply_size_by_slider(&mut marker, tool.size_slider, height);
            }
            self.creation_gate.mark(now);
            return match session.add_marker(marker) {
                Some(index) => {
                    self.refresh_delete_enabled(session);
                    PointerOutcome::Created(index)
                }
                None => PointerOutcome::Ignored,
            };
        }

        match Self::hit(session, p) {
            Some(index) => {
                if !self.selection.contains(&index) {
                    self.select(session, &[index]);
                }
                self.gesture = Some(Gesture::Move {
                    index,
                    last: p,
                    recorded: false,
                });
                PointerOutcome::Selected(index)
            }
            None => {
                self.clear_selection();
                PointerOutcome::Deselected
            }
        }
    }

    pub fn pointer_move(&mut self, session: &mut Session, p: Point) -> PointerOutcome {
        let Some(gesture) = self.gesture.as_mut() else {
            return PointerOutcome::Ignored;
        };
        match gesture {
            Gesture::Line(draft) => {
                draft.update(p);
                self.preview = Some((draft.start(), draft.end()));
                self.preview_dirty = true;
                PointerOutcome::Drafting
            }
            Gesture::Freehand(points) => {
                if points.last() != Some(&p) {
                    points.push(p);
                }
                PointerOutcome::Drafting
            }
            Gesture::Move {
                index,
                last,
                recorded,
            } => {
                let (index, dx, dy) = (*index, p.x - last.x, p.y - last.y);
                *last = p;
                if !*recorded {
                    *recorded = true;
                    session.push_history();
                }
                if self.move_marker(session, index, dx, dy) {
                    PointerOutcome::Moved
                } else {
                    PointerOutcome::Ignored
                }
            }
            Gesture::Pan { last } => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                *last = p;
                self.pan_by(session, dx, dy);
                PointerOutcome::Adjusted
            }
            Gesture::Midline => match session.current_image_mut() {
                Some(image) => {
                    self.midline.pointer_move(image, p);
                    PointerOutcome::Adjusted
                }
                None => PointerOutcome::Ignored,
            },
            Gesture::Crop => {
                match session.current_image().and_then(|i| i.surface()) {
                    Some(surface) => self.crop.pointer_move(p, &surface.bounds()),
                    None => return PointerOutcome::Ignored,
                }
                PointerOutcome::Adjusted
            }
        }
    }

    pub fn pointer_up(&mut self, session: &mut Session, p: Point, now: Instant) -> PointerOutcome {
        let gesture = self.gesture.take();
        self.preview = None;
        self.preview_dirty = false;

        match gesture {
            Some(Gesture::Line(mut draft)) => {
                draft.update(p);
                let Some(marker) = draft.commit() else {
                    return PointerOutcome::Ignored;
                };
                self.creation_gate.mark(now);
                let outcome = session
                    .add_marker(marker)
                    .map_or(PointerOutcome::Ignored, PointerOutcome::Created);
                self.refresh_delete_enabled(session);
                outcome
            }
            Some(Gesture::Freehand(mut points)) => {
                if points.last() != Some(&p) {
                    points.push(p);
                }
                let Some(height) = session.current_image().map(|i| i.space().1) else {
                    return PointerOutcome::Ignored;
                };
                let color = session.tool.color;
                match self.factory.create_freehand(color, &points, height) {
                    Some(marker) => session
                        .add_marker(marker)
                        .map_or(PointerOutcome::Ignored, PointerOutcome::Created),
                    None => PointerOutcome::Ignored,
                }
            }
            Some(Gesture::Midline) => {
                self.midline.pointer_up();
                PointerOutcome::Adjusted
            }
            Some(Gesture::Crop) => {
                self.crop.pointer_up();
                PointerOutcome::Adjusted
            }
            Some(Gesture::Move { recorded, .. }) => {
                if recorded {
                    PointerOutcome::Moved
                } else {
                    PointerOutcome::Ignored
                }
            }
            Some(Gesture::Pan { .. }) | None => PointerOutcome::Ignored,
        }
    }

    /// Line preview to draw this frame, if it changed since the last call.
    pub fn take_preview(&mut self) -> Option<(Point, Point)> {
        if !self.preview_dirty {
            return None;
        }
        self.preview_dirty = false;
        self.preview
    }

    /// Current line preview regardless of whether it changed.
    pub fn preview(&self) -> Option<(Point, Point)> {
        self.preview
    }

    /// Points of an in-progress freehand stroke.
    pub fn freehand_points(&self) -> &[Point] {
        match &self.gesture {
            Some(Gesture::Freehand(points)) => points,
            _ => &[],
        }
    }

    /// Move one marker, keeping its bounding box inside the surface.
    fn move_marker(&mut self, session: &mut Session, index: usize, dx: f64, dy: f64) -> bool {
        let Some(bounds) = session
            .current_image()
            .and_then(|i| i.surface())
            .map(|s| s.bounds())
        else {
            return false;
        };
        session
            .with_marker_mut(index, |m| {
                m.translate(dx, dy);
                let (cx, cy) = m.bounding_box().offset_into(&bounds);
                if cx != 0.0 || cy != 0.0 {
                    m.translate(cx, cy);
                }
            })
            .is_some()
    }

    /// Delete the selected markers as one undo step.
    pub fn delete_selection(&mut self, session: &mut Session) -> usize {
        let removed = match self.selection.as_slice() {
            [] => 0,
            [single] => usize::from(session.remove_marker(*single).is_some()),
            many => session.remove_markers(many),
        };
        self.selection.clear();
        self.refresh_delete_enabled(session);
        if removed > 0 {
            log::info!("Deleted {} selected markers", removed);
        }
        removed
    }

    /// Double-click deletes the marker under the pointer, but not while an
    /// editing mode is active.
    pub fn double_click(&mut self, session: &mut Session, p: Point) -> bool {
        let modes = session.modes;
        if modes.marking || modes.midline || modes.cropping {
            return false;
        }
        let Some(index) = Self::hit(session, p) else {
            return false;
        };
        let removed = session.remove_marker(index).is_some();
        self.selection.clear();
        self.refresh_delete_enabled(session);
        removed
    }

    /// Set the tool size slider and apply it to the selection.
    pub fn apply_size_slider(&mut self, session: &mut Session, slider: f64) -> usize {
        session.tool.size_slider = slider;
        let Some(height) = session.current_image().map(|i| i.space().1) else {
            return 0;
        };
        if self.selection.is_empty() {
            return 0;
        }
        session.push_history();
        self.selection
            .iter()
            .filter(|&&i| {
                session
                    .with_marker_mut(i, |m| scale::apply_size_by_slider(m, slider, height))
                    .unwrap_or(false)
            })
            .count()
    }

    /// Resize a selected oval by hand. Its size is frozen from then on.
    pub fn resize_oval(&mut self, session: &mut Session, index: usize, rx: f64, ry: f64) -> bool {
        let is_oval = session
            .current_image()
            .and_then(|i| i.markers().get(index))
            .is_some_and(|m| matches!(m.geometry, Geometry::Oval { .. }));
        if !is_oval || !(rx > 0.0 && ry > 0.0) {
            return false;
        }
        session.push_history();
        session
            .with_marker_mut(index, |m| {
                let stroke = match m.geometry {
                    Geometry::Oval { stroke_width, .. } => stroke_width,
                    _ => 0.0,
                };
                scale::mark_manually_scaled(m, rx, ry, stroke)
            })
            .unwrap_or(false)
    }

    /// Zoom the view around an anchor in screen coordinates.
    pub fn zoom_at(&mut self, session: &mut Session, factor: f64, anchor: Point) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }
        let Some(surface) = session.current_image_mut().and_then(|i| i.surface_mut()) else {
            return false;
        };
        let zoom = clamp(surface.zoom * factor, MIN_ZOOM, MAX_ZOOM);
        let fixed = surface.screen_to_surface(anchor);
        surface.zoom = zoom;
        surface.pan = Point::new(anchor.x - fixed.x * zoom, anchor.y - fixed.y * zoom);
        true
    }

    pub fn pan_by(&mut self, session: &mut Session, dx: f64, dy: f64) {
        if let Some(surface) = session.current_image_mut().and_then(|i| i.surface_mut()) {
            surface.pan.x += dx;
            surface.pan.y += dy;
        }
    }

    pub fn reset_view(&mut self, session: &mut Session) {
        if let Some(surface) = session.current_image_mut().and_then(|i| i.surface_mut()) {
            surface.zoom = 1.0;
            surface.pan = Point::default();
        }
    }

    /// Crop to the current rectangle and return to idle.
    pub fn apply_crop(&mut self, session: &mut Session, loader: &dyn RasterLoader) -> bool {
        let Some(rect) = self.crop.take() else {
            return false;
        };
        let applied = session.apply_crop(rect, loader);
        self.set_mode(session, Mode::Idle);
        self.clear_selection();
        applied
    }

    /// Record a container size; applied by [`SurfaceController::tick`] after
    /// the resize burst settles.
    pub fn on_resize(&mut self, width: f64, height: f64, now: Instant) {
        self.resize.submit((width, height), now);
    }

    pub fn resize_pending(&self) -> bool {
        self.resize.is_pending()
    }

    /// Apply a settled resize. Returns `true` if the surface was refitted.
    pub fn tick(&mut self, session: &mut Session, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some((w, h)) => session.set_container(w, h),
            None => false,
        }
    }

    /// Forget per-image gesture state after an image switch.
    pub fn reset(&mut self) {
        self.gesture = None;
        self.preview = None;
        self.preview_dirty = false;
        self.crop.cancel();
        self.midline.pointer_up();
        self.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::MemoryLoader;
    use crate::models::image::NewImage;
    use crate::models::palette::MarkerColor;

    fn setup() -> (Session, SurfaceController, Instant) {
        let settings = Settings::default();
        let loader = MemoryLoader::default().with("mem://s", 1000, 500);
        let mut s = Session::new(&settings);
        s.add_image(NewImage {
            image_url: "mem://s".to_string(),
            description: String::new(),
            natural_size: (1000, 500),
        });
        s.set_container(1000.0, 500.0);
        s.switch_image(0, &loader);
        let c = SurfaceController::new(&settings);
        (s, c, Instant::now())
    }

    fn marker_count(s: &Session) -> usize {
        s.current_image().unwrap().markers().len()
    }

    #[test]
    fn test_marking_creates_and_debounces() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        assert_eq!(
            c.pointer_down(&mut s, Point::new(100.0, 100.0), t0),
            PointerOutcome::Created(0)
        );
        let soon = t0 + Duration::from_millis(100);
        assert_eq!(
            c.pointer_down(&mut s, Point::new(200.0, 100.0), soon),
            PointerOutcome::Ignored
        );
        let later = t0 + Duration::from_millis(350);
        assert_eq!(
            c.pointer_down(&mut s, Point::new(200.0, 100.0), later),
            PointerOutcome::Created(1)
        );
        assert_eq!(marker_count(&s), 2);
    }

    #[test]
    fn test_no_creation_outside_marking() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Idle);
        c.pointer_down(&mut s, Point::new(100.0, 100.0), t0);
        c.set_mode(&mut s, Mode::MidlineAdjust);
        c.pointer_down(&mut s, Point::new(100.0, 100.0), t0);
        assert_eq!(marker_count(&s), 0);
    }

    #[test]
    fn test_unsupported_pair_adds_nothing() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        s.tool.color = MarkerColor::White;
        s.tool.shape = ShapeKind::Cross;
        assert_eq!(
            c.pointer_down(&mut s, Point::new(10.0, 10.0), t0),
            PointerOutcome::Ignored
        );
        assert_eq!(marker_count(&s), 0);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_line_commits_on_pointer_up() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        s.tool.shape = ShapeKind::Line;
        assert_eq!(
            c.pointer_down(&mut s, Point::new(10.0, 10.0), t0),
            PointerOutcome::Drafting
        );
        assert!(c.take_preview().is_some());
        assert!(c.take_preview().is_none());

        c.pointer_move(&mut s, Point::new(50.0, 50.0));
        c.pointer_move(&mut s, Point::new(80.0, 60.0));
        assert_eq!(
            c.take_preview(),
            Some((Point::new(10.0, 10.0), Point::new(80.0, 60.0)))
        );
        assert_eq!(marker_count(&s), 0);

        assert_eq!(
            c.pointer_up(&mut s, Point::new(90.0, 60.0), t0),
            PointerOutcome::Created(0)
        );
        assert!(c.preview().is_none());
        match s.current_image().unwrap().markers()[0].geometry {
            Geometry::Line { end, .. } => assert_eq!(end, Point::new(90.0, 60.0)),
            _ => panic!("expected line"),
        }
        assert!(s.can_undo());
    }

    #[test]
    fn test_freehand_stroke() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        s.tool.shape = ShapeKind::Freehand;
        s.tool.color = MarkerColor::Orange;
        c.pointer_down(&mut s, Point::new(10.0, 10.0), t0);
        c.pointer_move(&mut s, Point::new(20.0, 30.0));
        assert_eq!(c.freehand_points().len(), 2);
        assert_eq!(
            c.pointer_up(&mut s, Point::new(40.0, 5.0), t0),
            PointerOutcome::Created(0)
        );
        let b = s.current_image().unwrap().markers()[0].bounding_box();
        assert!(b.x < 10.0 && b.right() > 40.0);
    }

    #[test]
    fn test_move_is_clamped_to_surface() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        c.pointer_down(&mut s, Point::new(100.0, 100.0), t0);
        c.set_mode(&mut s, Mode::Idle);

        assert_eq!(
            c.pointer_down(&mut s, Point::new(100.0, 100.0), t0),
            PointerOutcome::Selected(0)
        );
        assert!(c.delete_enabled());
        c.pointer_move(&mut s, Point::new(-500.0, 100.0));
        c.pointer_up(&mut s, Point::new(-500.0, 100.0), t0);

        let b = s.current_image().unwrap().markers()[0].bounding_box();
        assert!(b.x.abs() < 1e-9);
        assert!((b.center().y - 100.0).abs() < 1e-9);
        assert!(s.undo());
        assert!((s.current_image().unwrap().markers()[0].center().x - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_delete_selection_single_and_multi() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        for i in 0..3 {
            let t = t0 + Duration::from_millis(400 * i);
            c.pointer_down(&mut s, Point::new(100.0 + 100.0 * i as f64, 100.0), t);
        }
        c.set_mode(&mut s, Mode::Idle);

        c.select(&s, &[1]);
        assert_eq!(c.delete_selection(&mut s), 1);
        assert!(!c.delete_enabled());

        c.select(&s, &[0, 1]);
        assert!(c.delete_enabled());
        assert_eq!(c.delete_selection(&mut s), 2);
        assert_eq!(marker_count(&s), 0);
        assert!(s.undo());
        assert_eq!(marker_count(&s), 2);
    }

    #[test]
    fn test_double_click_guarded_by_modes() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        c.pointer_down(&mut s, Point::new(100.0, 100.0), t0);
        assert!(!c.double_click(&mut s, Point::new(100.0, 100.0)));
        c.set_mode(&mut s, Mode::Cropping);
        assert!(!c.double_click(&mut s, Point::new(100.0, 100.0)));
        c.set_mode(&mut s, Mode::Idle);
        assert!(!c.double_click(&mut s, Point::new(700.0, 400.0)));
        assert!(c.double_click(&mut s, Point::new(100.0, 100.0)));
        assert_eq!(marker_count(&s), 0);
    }

    #[test]
    fn test_size_slider_applies_to_selection() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        c.pointer_down(&mut s, Point::new(100.0, 100.0), t0);
        c.set_mode(&mut s, Mode::Idle);
        c.select(&s, &[0]);

        assert_eq!(c.apply_size_slider(&mut s, 1.0), 1);
        match s.current_image().unwrap().markers()[0].geometry {
            Geometry::Point { radius, .. } => assert!((radius - 11.0).abs() < 1e-9),
            _ => panic!("expected point"),
        }
        c.apply_size_slider(&mut s, 0.0);
        match s.current_image().unwrap().markers()[0].geometry {
            Geometry::Point { radius, .. } => assert!((radius - 5.5).abs() < 1e-9),
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn test_resize_oval_freezes_size() {
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Marking);
        s.tool.shape = ShapeKind::Oval;
        c.pointer_down(&mut s, Point::new(300.0, 200.0), t0);
        assert!(c.resize_oval(&mut s, 0, 40.0, 20.0));
        assert!(s.current_image().unwrap().markers()[0].manually_scaled());
        assert!(s.set_container(500.0, 250.0));
        match s.current_image().unwrap().markers()[0].geometry {
            Geometry::Oval { rx, ry, .. } => assert_eq!((rx, ry), (40.0, 20.0)),
            _ => panic!("expected oval"),
        }
    }

    #[test]
    fn test_resize_is_debounced() {
        let (mut s, mut c, t0) = setup();
        c.on_resize(800.0, 600.0, t0);
        c.on_resize(500.0, 500.0, t0 + Duration::from_millis(50));
        assert!(!c.tick(&mut s, t0 + Duration::from_millis(100)));
        assert!(c.tick(&mut s, t0 + Duration::from_millis(300)));
        assert_eq!(s.current_image().unwrap().space(), (500.0, 250.0));
        assert!(!c.tick(&mut s, t0 + Duration::from_millis(600)));
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let (mut s, mut c, _) = setup();
        let anchor = Point::new(200.0, 100.0);
        assert!(c.zoom_at(&mut s, 2.0, anchor));
        let surface = s.current_image().unwrap().surface().unwrap();
        assert_eq!(surface.zoom, 2.0);
        let back = surface.surface_to_screen(surface.screen_to_surface(anchor));
        assert!((back.x - anchor.x).abs() < 1e-9);
        assert_eq!(surface.screen_to_surface(anchor), Point::new(200.0, 100.0));
    }

    #[test]
    fn test_crop_through_controller() {
        let loader = MemoryLoader::default().with("mem://s", 1000, 500);
        let (mut s, mut c, t0) = setup();
        c.set_mode(&mut s, Mode::Cropping);
        assert_eq!(SurfaceController::mode(&s), Mode::Cropping);
        assert!(c.crop.is_active());
        assert_eq!(
            c.pointer_down(&mut s, Point::new(100.0, 100.0), t0),
            PointerOutcome::Adjusted
        );
        c.pointer_up(&mut s, Point::new(100.0, 100.0), t0);
        assert!(c.apply_crop(&mut s, &loader));
        assert_eq!(SurfaceController::mode(&s), Mode::Idle);
        let img = s.current_image().unwrap();
        assert_eq!((img.natural_width(), img.natural_height()), (800, 400));
    }
}
