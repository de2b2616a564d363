// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the active image and its markers.
//!
//! The canvas only paints and reports pointer events in surface
//! coordinates; the application forwards them to the surface controller.

use dentmark::controller::surface::SurfaceController;
use dentmark::models::image::{ImageRecord, Surface};
use dentmark::models::marker::{Geometry, Marker, Point};
use dentmark::models::session::Session;
use dentmark::util::geometry::hex_to_rgba;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    DoubleClick(Point),
    /// Zoom factor and anchor in surface-local screen coordinates.
    Zoom(f64, Point),
}

/// Display the canvas and collect at most one pointer action.
///
/// Returns the action and the size available for the surface.
pub fn show(
    ui: &mut egui::Ui,
    session: &Session,
    controller: &SurfaceController,
    texture: Option<&egui::TextureHandle>,
) -> (CanvasAction, egui::Vec2) {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
    let available = ui.available_size() - egui::vec2(0.0, 24.0);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available);
        let origin = ui.min_rect().min;

        let Some(image) = session.current_image() else {
            welcome(ui);
            return;
        };
        let Some(surface) = image.surface() else {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new("Loading image...").color(egui::Color32::WHITE));
            });
            return;
        };

        let to_screen = |p: Point| {
            let s = surface.surface_to_screen(p);
            origin + egui::vec2(s.x as f32, s.y as f32)
        };
        let image_rect = egui::Rect::from_min_max(
            to_screen(Point::new(0.0, 0.0)),
            to_screen(Point::new(surface.width, surface.height)),
        );
        let frame_rect = egui::Rect::from_min_size(origin, available);

        let painter = ui.painter_at(frame_rect);
        if let Some(texture) = texture {
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        let zoom = surface.zoom as f32;
        for (i, marker) in image.markers().iter().enumerate() {
            draw_marker(&painter, marker, &to_screen, zoom);
            if controller.selection().contains(&i) {
                let b = marker.bounding_box();
                painter.rect_stroke(
                    egui::Rect::from_min_max(
                        to_screen(Point::new(b.x, b.y)),
                        to_screen(Point::new(b.right(), b.bottom())),
                    ),
                    0.0,
                    egui::Stroke::new(1.0, egui::Color32::LIGHT_BLUE),
                );
            }
        }
        draw_overlays(&painter, session, image, surface, controller, &to_screen);

        let response = ui.allocate_rect(frame_rect, egui::Sense::click_and_drag());
        let to_surface = |pos: egui::Pos2| {
            let local = pos - origin;
            surface.screen_to_surface(Point::new(local.x as f64, local.y as f64))
        };

        let (pressed, released, pointer) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });
        if let Some(pos) = pointer {
            if response.double_clicked() {
                action = CanvasAction::DoubleClick(to_surface(pos));
            } else if pressed && response.hovered() {
                action = CanvasAction::PointerDown(to_surface(pos));
            } else if released {
                action = CanvasAction::PointerUp(to_surface(pos));
            } else if response.dragged() {
                action = CanvasAction::PointerMove(to_surface(pos));
            }
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    let local = pos - origin;
                    action = CanvasAction::Zoom(
                        (scroll as f64 / 200.0).exp(),
                        Point::new(local.x as f64, local.y as f64),
                    );
                }
            }
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Mode: {:?}", SurfaceController::mode(session)));
        ui.separator();
        match session.current_image() {
            Some(image) => {
                let (w, h) = image.space();
                ui.label(format!(
                    "{} markers | surface {:.0}x{:.0} | native {}x{}",
                    image.markers().len(),
                    w,
                    h,
                    image.natural_width(),
                    image.natural_height()
                ));
            }
            None => {
                ui.label("No image loaded");
            }
        }
    });

    (action, available)
}

fn welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("DENTMARK")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Dental marker annotation")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("File > Add Image... to begin")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

fn marker_color(marker: &Marker) -> egui::Color32 {
    let [r, g, b, a] = hex_to_rgba(marker.marker_type.color.hex(), 1.0).unwrap_or([255, 0, 0, 255]);
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn draw_marker(
    painter: &egui::Painter,
    marker: &Marker,
    to_screen: &impl Fn(Point) -> egui::Pos2,
    zoom: f32,
) {
    let color = marker_color(marker);
    let stroke = |w: f64| egui::Stroke::new((w as f32 * zoom).max(1.0), color);

    match &marker.geometry {
        Geometry::Point { center, radius } => {
            painter.circle_filled(to_screen(*center), *radius as f32 * zoom, color);
        }
        Geometry::Cross {
            center,
            half_size,
            stroke_width,
        } => {
            let d = half_size / std::f64::consts::SQRT_2;
            let at = |dx: f64, dy: f64| to_screen(Point::new(center.x + dx, center.y + dy));
            painter.line_segment([at(-d, -d), at(d, d)], stroke(*stroke_width));
            painter.line_segment([at(-d, d), at(d, -d)], stroke(*stroke_width));
        }
        Geometry::Line {
            start,
            end,
            stroke_width,
        } => {
            painter.line_segment([to_screen(*start), to_screen(*end)], stroke(*stroke_width));
        }
        Geometry::Oval {
            center,
            rx,
            ry,
            stroke_width,
            ..
        } => {
            let points = (0..48)
                .map(|i| {
                    let a = i as f64 / 48.0 * std::f64::consts::TAU;
                    to_screen(Point::new(center.x + rx * a.cos(), center.y + ry * a.sin()))
                })
                .collect();
            painter.add(egui::Shape::closed_line(points, stroke(*stroke_width)));
        }
        Geometry::Glyph {
            kind,
            center,
            font_size,
        } => {
            painter.text(
                to_screen(*center),
                egui::Align2::CENTER_CENTER,
                kind.text(),
                egui::FontId::proportional((*font_size as f32 * zoom).max(6.0)),
                color,
            );
        }
        Geometry::Freehand { stroke_width, .. } => {
            let points = marker.stroke_points().into_iter().map(to_screen).collect();
            painter.add(egui::Shape::line(points, stroke(*stroke_width)));
        }
    }
}

fn draw_overlays(
    painter: &egui::Painter,
    session: &Session,
    image: &ImageRecord,
    surface: &Surface,
    controller: &SurfaceController,
    to_screen: &impl Fn(Point) -> egui::Pos2,
) {
    let modes = session.modes;
    if modes.midline || image.midline_fraction().is_some() {
        let y = image.midline_y();
        let color = if modes.midline {
            egui::Color32::from_rgb(255, 80, 80)
        } else {
            egui::Color32::from_rgba_unmultiplied(255, 80, 80, 120)
        };
        painter.extend(egui::Shape::dashed_line(
            &[to_screen(Point::new(0.0, y)), to_screen(Point::new(surface.width, y))],
            egui::Stroke::new(2.0, color),
            8.0,
            6.0,
        ));
    }

    if let Some((start, end)) = controller.preview() {
        painter.line_segment(
            [to_screen(start), to_screen(end)],
            egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
        );
    }

    let stroke: Vec<egui::Pos2> = controller
        .freehand_points()
        .iter()
        .map(|p| to_screen(*p))
        .collect();
    if stroke.len() > 1 {
        painter.add(egui::Shape::line(
            stroke,
            egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
        ));
    }

    if let Some(rect) = controller.crop.rect() {
        let r = egui::Rect::from_min_max(
            to_screen(Point::new(rect.x, rect.y)),
            to_screen(Point::new(rect.right(), rect.bottom())),
        );
        painter.rect_stroke(r, 0.0, egui::Stroke::new(2.0, egui::Color32::YELLOW));
        painter.rect_filled(
            egui::Rect::from_center_size(r.max, egui::vec2(10.0, 10.0)),
            0.0,
            egui::Color32::YELLOW,
        );
    }
}
