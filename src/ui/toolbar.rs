// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar: marker color and shape, interaction mode and size slider.

use dentmark::controller::surface::{Mode, SurfaceController};
use dentmark::models::palette::{MarkerColor, ShapeKind};
use dentmark::models::session::Session;

/// Toolbar requests that need the controller.
pub enum ToolbarAction {
    None,
    SetMode(Mode),
    SizeSlider(f64),
    ApplyCrop,
    AspectRatio(Option<f64>),
}

fn shape_label(shape: ShapeKind) -> &'static str {
    match shape {
        ShapeKind::Point => "● Point",
        ShapeKind::Cross => "✕ Cross",
        ShapeKind::Line => "⟋ Line",
        ShapeKind::Oval => "⬭ Oval",
        ShapeKind::Question => "? Question",
        ShapeKind::Exclamation => "! Exclamation",
        ShapeKind::Freehand => "✎ Freehand",
    }
}

fn swatch(color: MarkerColor) -> egui::Color32 {
    let [r, g, b, _] =
        dentmark::util::geometry::hex_to_rgba(color.hex(), 1.0).unwrap_or([128, 128, 128, 255]);
    egui::Color32::from_rgb(r, g, b)
}

/// Display the toolbar. Color and shape are edited in place.
pub fn show(ui: &mut egui::Ui, session: &mut Session, slider: &mut f64) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let mode = SurfaceController::mode(session);

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Mode:");
        for (m, label) in [
            (Mode::Idle, "⬆ Select"),
            (Mode::Marking, "✚ Mark"),
            (Mode::MidlineAdjust, "═ Midline"),
            (Mode::Cropping, "⛶ Crop"),
            (Mode::Panning, "✋ Pan"),
        ] {
            if ui.selectable_label(mode == m, label).clicked() {
                action = ToolbarAction::SetMode(if mode == m { Mode::Idle } else { m });
            }
        }

        ui.separator();
        ui.label("Size:");
        if ui
            .add(egui::Slider::new(slider, -2.0..=2.0).step_by(0.1))
            .changed()
        {
            action = ToolbarAction::SizeSlider(*slider);
        }

        if mode == Mode::Cropping {
            ui.separator();
            for (label, ratio) in [("Free", None), ("1:1", Some(1.0)), ("2:1", Some(2.0))] {
                if ui.button(label).clicked() {
                    action = ToolbarAction::AspectRatio(ratio);
                }
            }
            if ui.button("✔ Apply crop").clicked() {
                action = ToolbarAction::ApplyCrop;
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Color:");
        for color in MarkerColor::ALL {
            let selected = session.tool.color == color;
            let text = egui::RichText::new(color.name()).color(swatch(color));
            if ui.selectable_label(selected, text).clicked() {
                session.tool.color = color;
                if !color.supports(session.tool.shape) {
                    session.tool.shape = ShapeKind::Point;
                }
            }
        }

        ui.separator();
        ui.label("Shape:");
        for shape in ShapeKind::ALL {
            let enabled = session.tool.color.supports(shape);
            let selected = session.tool.shape == shape;
            if ui
                .add_enabled(enabled, egui::SelectableLabel::new(selected, shape_label(shape)))
                .clicked()
            {
                session.tool.shape = shape;
            }
        }
    });

    action
}
