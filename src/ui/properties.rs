// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image list and calculation summary panel.

use dentmark::models::calculation::{counts_for_calculation, jaw_splits_for_calculation};
use dentmark::models::image::{Jaw, WorkMode};
use dentmark::models::session::Session;

/// Result of panel interaction.
pub enum PropertiesAction {
    None,
    SelectImage(usize),
    RemoveImage(usize),
    SetWorkMode(WorkMode),
}

/// Display the image panel.
pub fn show(ui: &mut egui::Ui, session: &Session) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Work mode");
    ui.horizontal(|ui| {
        for (mode, label) in [(WorkMode::Panoramic, "Panoramic"), (WorkMode::Simple, "Simple")] {
            if ui
                .selectable_label(session.work_mode() == mode, label)
                .on_hover_text("Switching mode removes all images")
                .clicked()
            {
                action = PropertiesAction::SetWorkMode(mode);
            }
        }
    });

    ui.separator();
    ui.heading("Images");

    if session.images().is_empty() {
        ui.label(egui::RichText::new("No images").weak());
    }

    egui::ScrollArea::vertical()
        .id_source("image_list")
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            for (i, image) in session.images().iter().enumerate() {
                let active = session.active_index() == Some(i);
                ui.horizontal(|ui| {
                    let jaw = match image.jaw {
                        Some(Jaw::Upper) => " (upper)",
                        Some(Jaw::Lower) => " (lower)",
                        None => "",
                    };
                    let name = if image.description.is_empty() {
                        image.id.as_str()
                    } else {
                        image.description.as_str()
                    };
                    let mut text = egui::RichText::new(format!(
                        "{}{} [{}]",
                        name,
                        jaw,
                        image.markers().len()
                    ));
                    if !image.used_in_calculations {
                        text = text.italics();
                    }
                    if ui.selectable_label(active, text).clicked() && !active {
                        action = PropertiesAction::SelectImage(i);
                    }
                    if ui.small_button("🗑").on_hover_text("Remove image").clicked() {
                        action = PropertiesAction::RemoveImage(i);
                    }
                });
            }
        });

    ui.separator();
    ui.heading("Calculation");

    let counts = counts_for_calculation(session);
    let used: Vec<_> = counts.iter().filter(|(_, &n)| n > 0).collect();
    if used.is_empty() {
        ui.label(egui::RichText::new("No markers counted").weak());
    }
    egui::Grid::new("counts_grid").striped(true).show(ui, |ui| {
        for (marker_type, count) in used {
            ui.label(marker_type.to_string());
            ui.label(count.to_string());
            ui.end_row();
        }
    });

    ui.add_space(6.0);
    egui::Grid::new("jaw_grid").striped(true).show(ui, |ui| {
        for (color, split) in jaw_splits_for_calculation(session) {
            if split.top_units + split.bottom_units == 0 {
                continue;
            }
            ui.label(color.name());
            ui.label(format!("top {}", split.top_units));
            ui.label(format!("bottom {}", split.bottom_units));
            ui.end_row();
        }
    });

    action
}
